//! Image open system and task polling.

use std::path::Path;

use bevy::prelude::*;
use bevy::tasks::IoTaskPool;
use futures_lite::future;
use masquerade::compositor;
use masquerade::detection::RecordedDetections;
use masquerade::mask::FillMode;
use masquerade::persistence::{load_image_file, SavedSession};
use masquerade::pipeline;

use crate::config::{AddRecentImageRequest, AppConfig};

use super::document::{Document, EditorKeyboard};
use super::messages::{OpenImageRequest, RegionSource};
use super::resources::{AsyncOperation, OpenImageError, OpenImageTask};
use super::results::{OpenResult, OpenedImage};

/// Read and decode an image, placing its initial regions.
pub fn open_image(path: &Path, source: &RegionSource, fill: &FillMode) -> masquerade::Result<OpenedImage> {
    let bytes = std::fs::read(path)?;

    match source {
        RegionSource::Empty => Ok(OpenedImage {
            image: compositor::decode(&bytes)?,
            regions: Vec::new(),
        }),
        RegionSource::Detections(detections) => {
            let detector = RecordedDetections::load(detections)?;
            let prepared = pipeline::prepare_faces(&bytes, &detector, fill)?;
            Ok(OpenedImage {
                image: prepared.image,
                regions: prepared.regions,
            })
        }
        RegionSource::SavedSession(session) => {
            let image = compositor::decode(&bytes)?;
            let saved = SavedSession::load(session)?;
            if (saved.image_width, saved.image_height) != image.dimensions() {
                warn!(
                    "Session {:?} was saved for a {}x{} image, {:?} is {}x{}",
                    session,
                    saved.image_width,
                    saved.image_height,
                    path,
                    image.width(),
                    image.height()
                );
            }
            Ok(OpenedImage {
                image,
                regions: saved.into_regions(load_image_file),
            })
        }
    }
}

/// Starts an async open operation
pub fn open_image_system(
    mut commands: Commands,
    mut events: MessageReader<OpenImageRequest>,
    config: Res<AppConfig>,
    mut async_op: ResMut<AsyncOperation>,
) {
    for event in events.read() {
        if async_op.is_busy() {
            warn!("Another operation is in progress, ignoring open request");
            continue;
        }

        let path = event.path.clone();
        let source = event.regions.clone();
        let fill = config.data.solid_fill();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();

        async_op.is_opening = true;
        async_op.operation_description = Some(format!("Opening {}...", name));

        let task = IoTaskPool::get().spawn(async move {
            match open_image(&path, &source, &fill) {
                Ok(opened) => OpenResult {
                    path,
                    opened: Some(opened),
                    error: None,
                },
                Err(e) => {
                    error!("Failed to open {:?}: {}", path, e);
                    OpenResult {
                        path,
                        opened: None,
                        error: Some(e.user_message()),
                    }
                }
            }
        });

        commands.spawn(OpenImageTask(task));
    }
}

/// Polls open tasks and installs the new document
#[allow(clippy::too_many_arguments)]
pub fn poll_open_tasks(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut OpenImageTask)>,
    mut async_op: ResMut<AsyncOperation>,
    mut document: ResMut<Document>,
    keyboard: Res<EditorKeyboard>,
    config: Res<AppConfig>,
    mut open_error: ResMut<OpenImageError>,
    mut recent_events: MessageWriter<AddRecentImageRequest>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        if let Some(result) = future::block_on(future::poll_once(&mut task.0)) {
            async_op.is_opening = false;
            async_op.operation_description = None;

            match (result.opened, result.error) {
                (Some(opened), _) => {
                    open_error.message = None;
                    document.open(
                        result.path.clone(),
                        opened.image,
                        opened.regions,
                        config.data.max_display(),
                        &keyboard,
                    );
                    recent_events.write(AddRecentImageRequest { path: result.path });
                }
                (None, error) => {
                    open_error.message =
                        Some(error.unwrap_or_else(|| "The image could not be opened.".to_string()));
                }
            }

            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use masquerade::compositor::ExportFormat;
    use masquerade::geometry::Point;
    use masquerade::mask::{MaskRegion, RegionId};
    use masquerade::RedactError;
    use std::path::PathBuf;

    fn write_png(dir: &Path, width: u32, height: u32) -> PathBuf {
        let path = dir.join("photo.png");
        let image = RgbaImage::from_pixel(width, height, Rgba([20, 20, 20, 255]));
        std::fs::write(&path, compositor::encode(&image, ExportFormat::Png).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_open_without_regions() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), 40, 30);
        let opened = open_image(&path, &RegionSource::Empty, &FillMode::default()).unwrap();

        assert_eq!(opened.image.dimensions(), (40, 30));
        assert!(opened.regions.is_empty());
    }

    #[test]
    fn test_open_with_detections_places_face_discs() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), 200, 100);
        let detections = dir.path().join("vision.json");
        std::fs::write(
            &detections,
            r#"{"responses": [{"faceAnnotations": [{"boundingPoly": {"vertices": [
                {"x": 10, "y": 10}, {"x": 50, "y": 10}, {"x": 50, "y": 50}, {"x": 10, "y": 50}
            ]}}]}]}"#,
        )
        .unwrap();

        let opened = open_image(&path, &RegionSource::Detections(detections), &FillMode::default()).unwrap();

        assert_eq!(opened.regions.len(), 1);
        assert_eq!(opened.regions[0].id().as_str(), "face-0");
        assert_eq!(opened.regions[0].center, Point::new(30.0, 30.0));
    }

    #[test]
    fn test_open_with_saved_session_restores_regions() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), 64, 64);
        let session = dir.path().join("regions.json");
        let region = MaskRegion::new(RegionId::new("mask-3"), Point::new(20.0, 20.0), 15.0, FillMode::default());
        SavedSession::new(&[region], 64, 64).save(&session).unwrap();

        let opened = open_image(&path, &RegionSource::SavedSession(session), &FillMode::default()).unwrap();

        assert_eq!(opened.regions.len(), 1);
        assert_eq!(opened.regions[0].id().as_str(), "mask-3");
    }

    #[test]
    fn test_open_garbage_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-an-image.png");
        std::fs::write(&path, b"hello").unwrap();
        let result = open_image(&path, &RegionSource::Empty, &FillMode::default());

        assert!(matches!(result, Err(RedactError::Decode(_))));
    }
}
