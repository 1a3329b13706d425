//! Systems that replace or restyle the open document's regions.

use bevy::prelude::*;
use masquerade::detection::RecordedDetections;
use masquerade::geometry;
use masquerade::mask::{FillMode, MaskRegion, SubstituteImage};
use masquerade::persistence::{load_image_file, SavedSession};

use crate::config::{AddSubstitutePresetRequest, AppConfig, AppConfigData};

use super::document::{Document, EditorKeyboard};
use super::messages::{
    FillChoice, ImportDetectionsRequest, LoadSessionRequest, SaveSessionRequest, SetFillRequest,
};
use super::resources::DocumentError;

/// Resolve a fill choice into a fill, loading the substitute raster if needed.
pub fn resolve_fill(choice: &FillChoice, config: &AppConfigData) -> masquerade::Result<FillMode> {
    match choice {
        FillChoice::Solid => Ok(config.solid_fill()),
        FillChoice::Substitute(path) => Ok(FillMode::SubstituteImage(SubstituteImage::new(
            load_image_file(path)?,
            Some(path.clone()),
        ))),
    }
}

pub fn import_detections_system(
    mut events: MessageReader<ImportDetectionsRequest>,
    mut document: ResMut<Document>,
    keyboard: Res<EditorKeyboard>,
    mut document_error: ResMut<DocumentError>,
) {
    for event in events.read() {
        let Some(session) = document.session.as_ref() else {
            warn!("Open an image before importing detections");
            continue;
        };
        let fill = session.default_fill().clone();

        match RecordedDetections::load(&event.path) {
            Ok(recorded) => {
                let regions =
                    geometry::faces_to_regions_with_fill(&recorded.payload().face_annotations, &fill);
                info!("Imported {} face regions from {:?}", regions.len(), event.path);
                document.replace_regions(regions, &keyboard);
                document_error.message = None;
            }
            Err(e) => {
                error!("Failed to import detections {:?}: {}", event.path, e);
                document_error.message = Some(e.user_message());
            }
        }
    }
}

pub fn save_session_system(
    mut events: MessageReader<SaveSessionRequest>,
    document: Res<Document>,
    mut document_error: ResMut<DocumentError>,
) {
    for event in events.read() {
        let (Some(image), Some(session)) = (document.image.as_ref(), document.session.as_ref()) else {
            warn!("Nothing to save, no image is open");
            continue;
        };

        let saved = SavedSession::new(session.current_regions(), image.width(), image.height())
            .with_image_path(document.path.clone());
        if let Err(e) = saved.save(&event.path) {
            error!("Failed to save regions to {:?}: {}", event.path, e);
            document_error.message = Some(e.user_message());
        }
    }
}

pub fn load_session_system(
    mut events: MessageReader<LoadSessionRequest>,
    mut document: ResMut<Document>,
    keyboard: Res<EditorKeyboard>,
    mut document_error: ResMut<DocumentError>,
) {
    for event in events.read() {
        if !document.is_open() {
            warn!("Open an image before loading regions");
            continue;
        }

        match SavedSession::load(&event.path) {
            Ok(saved) => {
                let regions: Vec<MaskRegion> = saved.into_regions(load_image_file);
                document.replace_regions(regions, &keyboard);
                document_error.message = None;
            }
            Err(e) => {
                error!("Failed to load regions from {:?}: {}", event.path, e);
                document_error.message = Some(e.user_message());
            }
        }
    }
}

pub fn set_fill_system(
    mut events: MessageReader<SetFillRequest>,
    mut document: ResMut<Document>,
    config: Res<AppConfig>,
    mut document_error: ResMut<DocumentError>,
    mut preset_events: MessageWriter<AddSubstitutePresetRequest>,
) {
    for event in events.read() {
        let fill = match resolve_fill(&event.choice, &config.data) {
            Ok(fill) => fill,
            Err(e) => {
                error!("Failed to load fill {:?}: {}", event.choice, e);
                document_error.message = Some(e.user_message());
                continue;
            }
        };

        if let FillChoice::Substitute(path) = &event.choice {
            preset_events.write(AddSubstitutePresetRequest { path: path.clone() });
        }

        if let Some(session) = document.session.as_mut() {
            session.set_default_fill(fill, true);
            debug!("Fill switched to {}", session.default_fill().display_name());
        }
    }
}
