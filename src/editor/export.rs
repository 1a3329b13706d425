//! Export system and task polling.

use std::path::Path;

use bevy::prelude::*;
use bevy::tasks::IoTaskPool;
use futures_lite::future;
use image::RgbaImage;
use masquerade::compositor::{self, ExportFormat, RenderOptions};
use masquerade::mask::MaskRegion;

use crate::config::AppConfig;

use super::document::Document;
use super::messages::ExportRequest;
use super::resources::{AsyncOperation, ExportError, ExportTask, LastExport};
use super::results::ExportResult;

/// Render the export raster (no selection marks) and write it to `path`.
pub fn export_image(
    image: &RgbaImage,
    regions: &[MaskRegion],
    options: &RenderOptions,
    format: ExportFormat,
    path: &Path,
) -> masquerade::Result<()> {
    let rendered = compositor::render(image, regions, options);
    let bytes = compositor::encode(&rendered, format)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Starts an async export of the current document
pub fn export_system(
    mut commands: Commands,
    mut events: MessageReader<ExportRequest>,
    document: Res<Document>,
    config: Res<AppConfig>,
    mut async_op: ResMut<AsyncOperation>,
) {
    for event in events.read() {
        if async_op.is_busy() {
            warn!("Another operation is in progress, ignoring export request");
            continue;
        }
        let (Some(image), Some(session)) = (document.image.clone(), document.session.as_ref()) else {
            warn!("Nothing to export, no image is open");
            continue;
        };

        let path = event.path.clone();
        let regions = session.current_regions().to_vec();
        let options = config.data.render_options();
        let format = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ExportFormat::from_extension(ext, config.data.jpeg_quality),
            None => config.data.export_format(),
        };

        async_op.is_exporting = true;
        async_op.operation_description = Some(format!("Exporting {} regions...", regions.len()));

        let task = IoTaskPool::get().spawn(async move {
            match export_image(&image, &regions, &options, format, &path) {
                Ok(()) => ExportResult {
                    path,
                    success: true,
                    error: None,
                },
                Err(e) => {
                    error!("Export to {:?} failed: {}", path, e);
                    ExportResult {
                        path,
                        success: false,
                        error: Some(e.user_message()),
                    }
                }
            }
        });

        commands.spawn(ExportTask(task));
    }
}

/// Polls export tasks and reports the outcome
pub fn poll_export_tasks(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut ExportTask)>,
    mut async_op: ResMut<AsyncOperation>,
    mut export_error: ResMut<ExportError>,
    mut last_export: ResMut<LastExport>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        if let Some(result) = future::block_on(future::poll_once(&mut task.0)) {
            async_op.is_exporting = false;
            async_op.operation_description = None;

            if result.success {
                info!("Exported to {:?}", result.path);
                export_error.message = None;
                last_export.path = Some(result.path);
            } else if let Some(error) = result.error {
                export_error.message = Some(error);
            }

            commands.entity(entity).despawn();
        }
    }
}
