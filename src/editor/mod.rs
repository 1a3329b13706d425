//! Editor plugin: the open document, its session, and file operations.
//!
//! ## Module Structure
//!
//! - [`document`] - the image plus its editing session
//! - [`messages`] - requests raised by the UI
//! - [`resources`] - async state and error resources
//! - [`results`] - results of async tasks
//! - [`open`] - open system and task polling
//! - [`export`] - export system and task polling
//! - [`regions`] - import, session files and fill switching
//! - [`input`] - keyboard forwarding

pub mod document;
mod export;
mod input;
pub mod messages;
mod open;
mod regions;
pub mod resources;
mod results;

pub use document::{Document, EditorKeyboard};
pub use messages::{
    ExportRequest, FillChoice, ImportDetectionsRequest, LoadSessionRequest, OpenImageRequest,
    RegionSource, SaveSessionRequest, SetFillRequest,
};
pub use resources::{AsyncOperation, DocumentError, ExportError, LastExport, OpenImageError};

use bevy::prelude::*;
use std::path::PathBuf;

use crate::config::ConfigLoaded;

/// Image to open once config is loaded, from the command line
#[derive(Resource, Default)]
pub struct InitialDocument {
    pub path: Option<PathBuf>,
    pub regions: RegionSource,
}

fn open_initial_document(
    mut initial: ResMut<InitialDocument>,
    mut open_events: MessageWriter<OpenImageRequest>,
) {
    if let Some(path) = initial.path.take() {
        open_events.write(OpenImageRequest {
            path,
            regions: std::mem::take(&mut initial.regions),
        });
    }
}

pub struct EditorPlugin;

impl Plugin for EditorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Document>()
            .init_resource::<EditorKeyboard>()
            .init_resource::<InitialDocument>()
            .init_resource::<AsyncOperation>()
            .init_resource::<OpenImageError>()
            .init_resource::<ExportError>()
            .init_resource::<DocumentError>()
            .init_resource::<LastExport>()
            .add_message::<OpenImageRequest>()
            .add_message::<ImportDetectionsRequest>()
            .add_message::<ExportRequest>()
            .add_message::<SaveSessionRequest>()
            .add_message::<LoadSessionRequest>()
            .add_message::<SetFillRequest>()
            .add_systems(Startup, open_initial_document.after(ConfigLoaded))
            .add_systems(
                Update,
                (
                    open::open_image_system.run_if(on_message::<OpenImageRequest>),
                    open::poll_open_tasks,
                    export::export_system.run_if(on_message::<ExportRequest>),
                    export::poll_export_tasks,
                ),
            )
            .add_systems(
                Update,
                (
                    regions::import_detections_system.run_if(on_message::<ImportDetectionsRequest>),
                    regions::save_session_system.run_if(on_message::<SaveSessionRequest>),
                    regions::load_session_system.run_if(on_message::<LoadSessionRequest>),
                    regions::set_fill_system.run_if(on_message::<SetFillRequest>),
                    input::forward_keyboard,
                ),
            );
    }
}
