//! Resource types tracking async work and errors shown to the user.

use bevy::prelude::*;
use bevy::tasks::Task;

use super::results::{ExportResult, OpenResult};

/// Resource tracking async document I/O for the modal dialog
#[derive(Resource, Default)]
pub struct AsyncOperation {
    pub is_opening: bool,
    pub is_exporting: bool,
    /// Description of the current operation
    pub operation_description: Option<String>,
}

impl AsyncOperation {
    pub fn is_busy(&self) -> bool {
        self.is_opening || self.is_exporting
    }
}

#[derive(Resource, Default)]
pub struct OpenImageError {
    pub message: Option<String>,
}

#[derive(Resource, Default)]
pub struct ExportError {
    pub message: Option<String>,
}

/// Failures from importing detections, session files and substitute images
#[derive(Resource, Default)]
pub struct DocumentError {
    pub message: Option<String>,
}

/// Set after a successful export so the UI can say where the file went
#[derive(Resource, Default)]
pub struct LastExport {
    pub path: Option<std::path::PathBuf>,
}

#[derive(Component)]
pub struct OpenImageTask(pub Task<OpenResult>);

#[derive(Component)]
pub struct ExportTask(pub Task<ExportResult>);
