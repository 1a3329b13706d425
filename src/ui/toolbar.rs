use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};
use std::path::{Path, PathBuf};

use crate::config::{AppConfig, AppConfigData, ExportKind, UpdateExportSettingsRequest};
use crate::constants::{DEFAULT_SESSION_FILE, IMAGE_EXTENSIONS};
use crate::editor::{
    Document, ExportRequest, FillChoice, ImportDetectionsRequest, LoadSessionRequest,
    OpenImageRequest, RegionSource, SaveSessionRequest, SetFillRequest,
};

/// Editable copy of the export settings shown in the settings window
#[derive(Resource, Default)]
pub struct ExportSettingsDialog {
    pub is_open: bool,
    pub format: ExportKind,
    pub jpeg_quality: u8,
    pub outline: bool,
}

/// Message writers used by the toolbar buttons
#[derive(SystemParam)]
pub struct ToolbarRequests<'w> {
    open: MessageWriter<'w, OpenImageRequest>,
    import: MessageWriter<'w, ImportDetectionsRequest>,
    export: MessageWriter<'w, ExportRequest>,
    save_session: MessageWriter<'w, SaveSessionRequest>,
    load_session: MessageWriter<'w, LoadSessionRequest>,
    fill: MessageWriter<'w, SetFillRequest>,
}

fn start_dir(config: &AppConfigData) -> Option<PathBuf> {
    config.last_image_dir.clone().or_else(crate::paths::pictures_dir)
}

fn image_dialog(config: &AppConfigData, title: &str) -> rfd::FileDialog {
    let dialog = rfd::FileDialog::new()
        .add_filter("Images", IMAGE_EXTENSIONS)
        .set_title(title);
    match start_dir(config) {
        Some(dir) => dialog.set_directory(dir),
        None => dialog,
    }
}

fn json_dialog(config: &AppConfigData, title: &str) -> rfd::FileDialog {
    let dialog = rfd::FileDialog::new()
        .add_filter("JSON", &["json"])
        .set_title(title);
    match start_dir(config) {
        Some(dir) => dialog.set_directory(dir),
        None => dialog,
    }
}

/// Label for a substitute preset in the fill menu
fn preset_label(path: &Path) -> String {
    path.file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or("image")
        .to_string()
}

/// Main toolbar: file operations, fill mode and editing commands
pub fn toolbar_ui(
    mut contexts: EguiContexts,
    mut document: ResMut<Document>,
    config: Res<AppConfig>,
    mut requests: ToolbarRequests,
    mut settings: ResMut<ExportSettingsDialog>,
) -> Result {
    let is_open = document.is_open();

    egui::TopBottomPanel::top("main_toolbar")
        .frame(
            egui::Frame::side_top_panel(&contexts.ctx_mut()?.style())
                .inner_margin(egui::Margin::symmetric(12, 8)),
        )
        .show(contexts.ctx_mut()?, |ui| {
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = 4.0;

                if ui.button("Open Image...").clicked()
                    && let Some(path) = image_dialog(&config.data, "Open Image").pick_file()
                {
                    requests.open.write(OpenImageRequest {
                        path,
                        regions: RegionSource::Empty,
                    });
                }

                ui.add_enabled_ui(!config.data.recent_images.is_empty(), |ui| {
                    ui.menu_button("Recent", |ui| {
                        for path in &config.data.recent_images {
                            let label = path
                                .file_name()
                                .and_then(|n| n.to_str())
                                .unwrap_or("image");
                            if ui.button(label).on_hover_text(path.to_string_lossy()).clicked() {
                                requests.open.write(OpenImageRequest {
                                    path: path.clone(),
                                    regions: RegionSource::Empty,
                                });
                                ui.close();
                            }
                        }
                    });
                });

                ui.add_enabled_ui(is_open, |ui| {
                    if ui
                        .button("Import Detections...")
                        .on_hover_text("Place one mask per face from a saved detector response")
                        .clicked()
                        && let Some(path) = json_dialog(&config.data, "Import Detections").pick_file()
                    {
                        requests.import.write(ImportDetectionsRequest { path });
                    }
                });

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                fill_menu(ui, &document, &config.data, &mut requests);

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                let Some(session) = document.session.as_mut() else {
                    return;
                };

                if ui
                    .add_enabled(session.selected().is_some(), egui::Button::new("Delete"))
                    .on_hover_text("Delete / Backspace")
                    .clicked()
                {
                    session.delete_selected();
                }
                if ui
                    .add_enabled(session.can_undo(), egui::Button::new("Undo"))
                    .on_hover_text("Ctrl+Z")
                    .clicked()
                {
                    session.undo();
                }
                if ui
                    .add_enabled(session.can_redo(), egui::Button::new("Redo"))
                    .on_hover_text("Ctrl+Y / Ctrl+Shift+Z")
                    .clicked()
                {
                    session.redo();
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Export...").clicked() {
                        let extension = config.data.export_format().extension();
                        let mut dialog = rfd::FileDialog::new()
                            .add_filter("PNG", &["png"])
                            .add_filter("JPEG", &["jpg", "jpeg"])
                            .set_file_name(document.export_file_name(extension))
                            .set_title("Export Redacted Image");
                        if let Some(dir) = start_dir(&config.data) {
                            dialog = dialog.set_directory(dir);
                        }
                        if let Some(path) = dialog.save_file() {
                            requests.export.write(ExportRequest { path });
                        }
                    }
                    if ui.button("Export Settings").clicked() {
                        settings.is_open = true;
                        settings.format = config.data.export_format;
                        settings.jpeg_quality = config.data.jpeg_quality;
                        settings.outline = config.data.export_outline;
                    }

                    ui.separator();

                    if ui.button("Load Masks...").clicked()
                        && let Some(path) = json_dialog(&config.data, "Load Masks").pick_file()
                    {
                        requests.load_session.write(LoadSessionRequest { path });
                    }
                    if ui.button("Save Masks...").clicked()
                        && let Some(path) = json_dialog(&config.data, "Save Masks")
                            .set_file_name(DEFAULT_SESSION_FILE)
                            .save_file()
                    {
                        requests.save_session.write(SaveSessionRequest { path });
                    }
                });
            });
        });
    Ok(())
}

/// Fill selector: solid disc, stored presets, or a custom substitute image
fn fill_menu(ui: &mut egui::Ui, document: &Document, config: &AppConfigData, requests: &mut ToolbarRequests) {
    let current = document.session.as_ref().map(|s| s.default_fill());
    let current_source = current.and_then(|fill| match fill {
        masquerade::FillMode::SubstituteImage(substitute) => substitute.source.clone(),
        masquerade::FillMode::SolidColor(_) => None,
    });
    let selected_text = match (&current, &current_source) {
        (_, Some(path)) => preset_label(path),
        (Some(fill), None) => fill.display_name().to_string(),
        (None, None) => "Solid disc".to_string(),
    };

    ui.label("Fill:");
    ui.add_enabled_ui(document.is_open(), |ui| {
        egui::ComboBox::from_id_salt("fill_mode_select")
            .selected_text(selected_text)
            .show_ui(ui, |ui| {
                let solid = current.is_some_and(|fill| !fill.is_substitute());
                if ui.selectable_label(solid, "Solid disc").clicked() {
                    requests.fill.write(SetFillRequest {
                        choice: FillChoice::Solid,
                    });
                }

                for preset in &config.substitute_presets {
                    let selected = current_source.as_ref() == Some(preset);
                    if ui
                        .selectable_label(selected, preset_label(preset))
                        .on_hover_text(preset.to_string_lossy())
                        .clicked()
                    {
                        requests.fill.write(SetFillRequest {
                            choice: FillChoice::Substitute(preset.clone()),
                        });
                    }
                }

                ui.separator();
                if ui.button("Custom image...").clicked()
                    && let Some(path) = image_dialog(config, "Choose Substitute Image").pick_file()
                {
                    requests.fill.write(SetFillRequest {
                        choice: FillChoice::Substitute(path),
                    });
                }
            });
    });
}

/// Export format, quality and outline settings
pub fn export_settings_ui(
    mut contexts: EguiContexts,
    mut settings: ResMut<ExportSettingsDialog>,
    mut update_events: MessageWriter<UpdateExportSettingsRequest>,
) -> Result {
    if !settings.is_open {
        return Ok(());
    }

    egui::Window::new("Export Settings")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(contexts.ctx_mut()?, |ui| {
            ui.horizontal(|ui| {
                ui.label("Format:");
                for kind in [ExportKind::Png, ExportKind::Jpeg] {
                    ui.radio_value(&mut settings.format, kind, kind.display_name());
                }
            });

            ui.add_enabled_ui(settings.format == ExportKind::Jpeg, |ui| {
                ui.add(egui::Slider::new(&mut settings.jpeg_quality, 1..=100).text("JPEG quality"));
            });

            ui.checkbox(&mut settings.outline, "Outline solid discs");

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Save").clicked() {
                    update_events.write(UpdateExportSettingsRequest {
                        format: settings.format,
                        jpeg_quality: settings.jpeg_quality,
                        outline: settings.outline,
                    });
                    settings.is_open = false;
                }
                if ui.button("Cancel").clicked() {
                    settings.is_open = false;
                }
            });
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_label_uses_file_stem() {
        assert_eq!(preset_label(Path::new("/presets/smiley.png")), "smiley");
        assert_eq!(preset_label(Path::new("")), "image");
    }

    #[test]
    fn test_start_dir_prefers_last_image_dir() {
        let config = AppConfigData {
            last_image_dir: Some(PathBuf::from("/photos")),
            ..AppConfigData::default()
        };
        assert_eq!(start_dir(&config), Some(PathBuf::from("/photos")));
    }
}
