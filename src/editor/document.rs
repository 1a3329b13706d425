//! The image being edited and its editing session.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bevy::prelude::*;
use image::RgbaImage;
use masquerade::mask::MaskRegion;
use masquerade::session::KeyboardHub;
use masquerade::viewport::CoordinateMapper;
use masquerade::EditingSession;

/// Key presses forwarded from bevy input to whichever session is subscribed
#[derive(Resource, Default, Clone)]
pub struct EditorKeyboard(pub KeyboardHub);

/// Currently open image plus the session editing its masks
#[derive(Resource, Default)]
pub struct Document {
    pub image: Option<Arc<RgbaImage>>,
    pub path: Option<PathBuf>,
    pub session: Option<EditingSession>,
    /// Session revision the canvas texture was last built from
    pub rendered_revision: Option<u64>,
}

impl Document {
    /// Replace the document with a freshly opened image.
    ///
    /// The previous session is dropped first so its keyboard subscription
    /// ends before the new one starts.
    pub fn open(
        &mut self,
        path: PathBuf,
        image: RgbaImage,
        regions: Vec<MaskRegion>,
        max_display: (f32, f32),
        keyboard: &EditorKeyboard,
    ) {
        self.close();

        let (width, height) = image.dimensions();
        let mapper = CoordinateMapper::with_max(width, height, max_display.0, max_display.1);
        let mut session = EditingSession::with_mapper(regions, mapper);
        session.attach_keyboard(&keyboard.0);

        info!(
            "Opened {:?} ({}x{}) with {} regions",
            path,
            width,
            height,
            session.current_regions().len()
        );
        self.image = Some(Arc::new(image));
        self.path = Some(path);
        self.session = Some(session);
    }

    /// Swap in a new region list for the open image, starting a fresh history.
    pub fn replace_regions(&mut self, regions: Vec<MaskRegion>, keyboard: &EditorKeyboard) -> bool {
        let Some(old) = self.session.take() else {
            return false;
        };
        let mapper = *old.mapper();
        drop(old);

        let mut session = EditingSession::with_mapper(regions, mapper);
        session.attach_keyboard(&keyboard.0);
        self.session = Some(session);
        self.rendered_revision = None;
        true
    }

    pub fn close(&mut self) {
        if self.session.take().is_some() {
            debug!("Closed editing session for {:?}", self.path);
        }
        self.image = None;
        self.path = None;
        self.rendered_revision = None;
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some() && self.image.is_some()
    }

    /// Whether the canvas texture is behind the session
    pub fn needs_redraw(&self) -> bool {
        match &self.session {
            Some(session) => self.rendered_revision != Some(session.revision()),
            None => false,
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.as_deref().and_then(Path::file_name).and_then(|n| n.to_str())
    }

    /// Suggested export name: `photo.png` becomes `photo-redacted.<ext>`
    pub fn export_file_name(&self, extension: &str) -> String {
        let stem = self
            .path
            .as_deref()
            .and_then(Path::file_stem)
            .and_then(|n| n.to_str())
            .unwrap_or("image");
        format!("{}-redacted.{}", stem, extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use masquerade::geometry::Point;
    use masquerade::mask::{FillMode, RegionId};

    fn region(id: &str) -> MaskRegion {
        MaskRegion::new(RegionId::new(id), Point::new(50.0, 50.0), 20.0, FillMode::default())
    }

    #[test]
    fn test_open_attaches_keyboard_and_fits_display() {
        let keyboard = EditorKeyboard::default();
        let mut document = Document::default();
        document.open(
            PathBuf::from("photos/beach.png"),
            RgbaImage::new(1600, 1200),
            vec![region("face-0")],
            (800.0, 600.0),
            &keyboard,
        );

        assert!(document.is_open());
        assert!(document.needs_redraw());
        assert_eq!(keyboard.0.subscriber_count(), 1);

        let session = document.session.as_ref().unwrap();
        assert!(session.is_keyboard_attached());
        assert_eq!(session.mapper().display_size(), (800.0, 600.0));
        assert_eq!(document.file_name(), Some("beach.png"));
        assert_eq!(document.export_file_name("jpg"), "beach-redacted.jpg");
    }

    #[test]
    fn test_reopen_drops_previous_subscription() {
        let keyboard = EditorKeyboard::default();
        let mut document = Document::default();
        document.open(PathBuf::from("a.png"), RgbaImage::new(10, 10), vec![], (800.0, 600.0), &keyboard);
        document.open(PathBuf::from("b.png"), RgbaImage::new(10, 10), vec![], (800.0, 600.0), &keyboard);
        assert_eq!(keyboard.0.subscriber_count(), 1);

        document.close();
        assert_eq!(keyboard.0.subscriber_count(), 0);
        assert!(!document.is_open());
        assert!(!document.needs_redraw());
    }

    #[test]
    fn test_replace_regions_keeps_mapper() {
        let keyboard = EditorKeyboard::default();
        let mut document = Document::default();
        assert!(!document.replace_regions(vec![region("x")], &keyboard));

        document.open(PathBuf::from("a.png"), RgbaImage::new(400, 300), vec![], (200.0, 150.0), &keyboard);
        assert!(document.replace_regions(vec![region("face-0"), region("face-1")], &keyboard));

        let session = document.session.as_ref().unwrap();
        assert_eq!(session.current_regions().len(), 2);
        assert_eq!(session.mapper().display_size(), (200.0, 150.0));
        assert_eq!(keyboard.0.subscriber_count(), 1);
    }
}
