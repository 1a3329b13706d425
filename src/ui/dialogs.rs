use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};
use std::path::Path;

use crate::config::ConfigResetNotification;
use crate::editor::{AsyncOperation, DocumentError, ExportError, LastExport, OpenImageError};

/// Shorten long paths from the left so the file name stays visible
pub fn display_path(path: &Path) -> String {
    let path_str = path.to_string_lossy();
    let chars: Vec<char> = path_str.chars().collect();
    if chars.len() > 50 {
        let tail: String = chars[chars.len() - 47..].iter().collect();
        format!("...{}", tail)
    } else {
        path_str.to_string()
    }
}

fn error_window(ctx: &egui::Context, title: &str, message: &mut Option<String>) {
    let Some(text) = message.clone() else {
        return;
    };

    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().max_height(200.0).show(ui, |ui| {
                ui.colored_label(egui::Color32::RED, text);
            });
            ui.add_space(8.0);
            if ui.button("OK").clicked() {
                *message = None;
            }
        });
}

/// Renders open, export and document error dialogs
pub fn error_dialogs_ui(
    mut contexts: EguiContexts,
    mut open_error: ResMut<OpenImageError>,
    mut export_error: ResMut<ExportError>,
    mut document_error: ResMut<DocumentError>,
) -> Result {
    let ctx = contexts.ctx_mut()?;
    error_window(ctx, "Open Failed", &mut open_error.message);
    error_window(ctx, "Export Failed", &mut export_error.message);
    error_window(ctx, "Masks", &mut document_error.message);
    Ok(())
}

/// Blocking modal while an image is opened or exported
pub fn async_operation_modal_ui(mut contexts: EguiContexts, async_op: Res<AsyncOperation>) -> Result {
    if !async_op.is_busy() {
        return Ok(());
    }

    egui::Window::new("Working")
        .collapsible(false)
        .resizable(false)
        .title_bar(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(async_op.operation_description.as_deref().unwrap_or("Working..."));
            });
        });

    Ok(())
}

/// Confirms where the last export went
pub fn export_done_ui(mut contexts: EguiContexts, mut last_export: ResMut<LastExport>) -> Result {
    let Some(path) = last_export.path.clone() else {
        return Ok(());
    };

    egui::Window::new("Export Complete")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.label("Redacted image saved to:");
            ui.label(egui::RichText::new(display_path(&path)).weak())
                .on_hover_text(path.to_string_lossy());
            ui.add_space(8.0);
            if ui.button("OK").clicked() {
                last_export.path = None;
            }
        });

    Ok(())
}

/// Tells the user their config file was unreadable and defaults are in use
pub fn config_reset_notification_ui(
    mut contexts: EguiContexts,
    mut notification: ResMut<ConfigResetNotification>,
) -> Result {
    if !notification.show {
        return Ok(());
    }

    egui::Window::new("Settings Reset")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.label("Your settings could not be loaded and were reset to defaults.");
            if let Some(reason) = &notification.reason {
                ui.add_space(5.0);
                ui.label(egui::RichText::new(reason).weak());
            }
            ui.add_space(10.0);
            if ui.button("OK").clicked() {
                notification.show = false;
                notification.reason = None;
            }
        });

    Ok(())
}
