//! Central canvas: the preview raster and pointer input for the session.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};
use masquerade::compositor;
use masquerade::geometry::Point;
use masquerade::session::{InputEvent, InteractionMode, WheelStep};

use crate::editor::Document;

use super::DialogState;

/// Texture holding the latest preview render
#[derive(Resource, Default)]
pub struct CanvasTexture {
    pub handle: Option<egui::TextureHandle>,
}

/// Shrink the display footprint to fit the available panel, keeping aspect.
pub fn fit_within(display: (f32, f32), available: (f32, f32)) -> (f32, f32) {
    let (w, h) = display;
    if w <= 0.0 || h <= 0.0 {
        return (0.0, 0.0);
    }
    let scale = (available.0 / w).min(available.1 / h).min(1.0).max(0.0);
    (w * scale, h * scale)
}

/// Wheel up grows, wheel down shrinks
pub fn wheel_step(scroll_y: f32) -> Option<WheelStep> {
    if scroll_y > 0.0 {
        Some(WheelStep::Grow)
    } else if scroll_y < 0.0 {
        Some(WheelStep::Shrink)
    } else {
        None
    }
}

/// Re-render the preview when the session changed since the last upload
fn refresh_texture(ctx: &egui::Context, document: &mut Document, texture: &mut CanvasTexture) {
    if !document.needs_redraw() {
        return;
    }
    let (Some(image), Some(session)) = (document.image.as_ref(), document.session.as_ref()) else {
        return;
    };

    let preview = compositor::render_preview(image, session.current_regions(), session.selected());
    let size = [preview.width() as usize, preview.height() as usize];
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, preview.as_raw());

    match texture.handle.as_mut() {
        Some(handle) => handle.set(color_image, egui::TextureOptions::LINEAR),
        None => {
            texture.handle = Some(ctx.load_texture("masquerade_canvas", color_image, egui::TextureOptions::LINEAR));
        }
    }
    document.rendered_revision = Some(session.revision());
}

/// Primary pointer state for one frame, in canvas-local coordinates
#[derive(Debug, Clone, Copy, Default)]
struct PointerFrame {
    /// Pointer position, `None` when it is outside the canvas
    pos: Option<Point>,
    pressed: bool,
    released: bool,
    moved: bool,
}

/// Session events for one frame of primary pointer input. Moves are only
/// reported when the pointer actually moved.
fn pointer_events(frame: &PointerFrame, interacting: bool) -> Vec<InputEvent> {
    let mut events = Vec::new();
    match frame.pos {
        Some(pos) if frame.pressed => events.push(InputEvent::PointerDown(pos)),
        Some(pos) if interacting => {
            if frame.moved {
                events.push(InputEvent::PointerMove(pos));
            }
        }
        None if interacting => events.push(InputEvent::PointerLeave),
        _ => {}
    }
    if frame.released {
        events.push(InputEvent::PointerUp);
    }
    events
}

pub fn canvas_ui(
    mut contexts: EguiContexts,
    mut document: ResMut<Document>,
    mut texture: ResMut<CanvasTexture>,
    dialog_state: Res<DialogState>,
) -> Result {
    let ctx = contexts.ctx_mut()?;
    refresh_texture(ctx, &mut document, &mut texture);

    egui::CentralPanel::default().show(ctx, |ui| {
        let (Some(session), Some(handle)) = (document.session.as_mut(), texture.handle.as_ref()) else {
            ui.centered_and_justified(|ui| {
                ui.label(
                    egui::RichText::new("Open an image to start masking")
                        .size(18.0)
                        .color(egui::Color32::GRAY),
                );
            });
            return;
        };

        let available = ui.available_size();
        let size = fit_within(session.mapper().display_size(), (available.x, available.y));

        let mut events = Vec::new();
        ui.vertical_centered(|ui| {
            let (rect, response) = ui.allocate_exact_size(egui::vec2(size.0, size.1), egui::Sense::click_and_drag());
            ui.painter().image(
                handle.id(),
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
            session.mapper_mut().set_rendered_size(rect.width(), rect.height());

            if dialog_state.any_modal_open {
                return;
            }

            let local = |pos: egui::Pos2| Point::new(pos.x - rect.min.x, pos.y - rect.min.y);
            let (frame, latest, scroll) = ui.ctx().input(|i| {
                let latest = i.pointer.latest_pos();
                let frame = PointerFrame {
                    pos: latest.filter(|pos| rect.contains(*pos)).map(local),
                    pressed: i.pointer.primary_pressed(),
                    released: i.pointer.primary_released(),
                    moved: i.pointer.delta() != egui::Vec2::ZERO,
                };
                (frame, latest, i.raw_scroll_delta.y)
            });

            events.extend(pointer_events(&frame, session.mode() != InteractionMode::Idle));
            if response.secondary_clicked()
                && let Some(pos) = response.interact_pointer_pos()
            {
                events.push(InputEvent::ContextMenu(local(pos)));
            }
            if response.hovered()
                && let Some(step) = wheel_step(scroll)
                && let Some(pos) = latest
            {
                events.push(InputEvent::Wheel { at: local(pos), step });
            }
        });

        for event in events {
            session.dispatch(event);
        }
    });

    Ok(())
}

/// Bottom bar with region count, selection and usage hints
pub fn status_bar_ui(mut contexts: EguiContexts, document: Res<Document>) -> Result {
    egui::TopBottomPanel::bottom("status_bar").show(contexts.ctx_mut()?, |ui| {
        ui.horizontal(|ui| {
            let Some(session) = document.session.as_ref() else {
                ui.label("No image");
                return;
            };

            let (width, height) = session.mapper().image_size();
            ui.label(format!(
                "{} · {}x{} · {} masks",
                document.file_name().unwrap_or("untitled"),
                width,
                height,
                session.current_regions().len()
            ));
            if let Some(region) = session.selected_region() {
                ui.separator();
                ui.label(format!("{} · radius {:.0}", region.id(), region.radius()));
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(
                    egui::RichText::new("Right-click adds a mask · drag moves · handle or wheel resizes · Del removes")
                        .weak(),
                );
            });
        });
    });
    Ok(())
}
