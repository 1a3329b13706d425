mod canvas;
mod dialogs;
mod toolbar;

use bevy::prelude::*;
use bevy_egui::EguiPrimaryContextPass;

use crate::config::ConfigResetNotification;
use crate::editor::{AsyncOperation, DocumentError, ExportError, LastExport, OpenImageError};

/// Resource that tracks whether any modal dialog is currently open.
/// Editor input handlers should check this to avoid processing input
/// when the user is interacting with a dialog.
#[derive(Resource, Default)]
pub struct DialogState {
    /// True when any modal dialog is open that should block editor input
    pub any_modal_open: bool,
}

/// System to aggregate all dialog open states into a single resource.
/// Runs in First schedule before input handlers.
#[allow(clippy::too_many_arguments)]
fn update_dialog_state(
    export_settings: Res<toolbar::ExportSettingsDialog>,
    config_reset: Res<ConfigResetNotification>,
    open_error: Res<OpenImageError>,
    export_error: Res<ExportError>,
    document_error: Res<DocumentError>,
    last_export: Res<LastExport>,
    async_op: Res<AsyncOperation>,
    mut dialog_state: ResMut<DialogState>,
) {
    dialog_state.any_modal_open = export_settings.is_open
        || config_reset.show
        || open_error.message.is_some()
        || export_error.message.is_some()
        || document_error.message.is_some()
        || last_export.path.is_some()
        || async_op.is_busy();
}

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DialogState>()
            .init_resource::<canvas::CanvasTexture>()
            .init_resource::<toolbar::ExportSettingsDialog>()
            // Edge panels must render before the central canvas claims the rest
            .add_systems(
                EguiPrimaryContextPass,
                (toolbar::toolbar_ui, canvas::status_bar_ui, canvas::canvas_ui).chain(),
            )
            .add_systems(
                EguiPrimaryContextPass,
                (
                    dialogs::error_dialogs_ui,
                    dialogs::async_operation_modal_ui,
                    dialogs::export_done_ui,
                    dialogs::config_reset_notification_ui,
                    toolbar::export_settings_ui,
                )
                    .after(canvas::canvas_ui),
            )
            .add_systems(First, update_dialog_state);
    }
}
