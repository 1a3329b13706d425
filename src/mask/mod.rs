//! Mask regions: the editable discs that cover detected faces.
//!
//! - [`MaskRegion`] - one disc with an identity, center, radius and fill
//! - [`FillMode`] - how the disc is painted (solid color or a substitute image)
//! - [`store::MaskStore`] - the ordered, authoritative collection for one session

pub mod store;


use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::geometry::Point;

pub use store::MaskStore;

/// Smallest radius a region can be resized to (image pixels)
pub const MIN_RADIUS: f32 = 10.0;
/// Largest radius a region can be resized to (image pixels)
pub const MAX_RADIUS: f32 = 200.0;
/// Radius of regions added by hand
pub const DEFAULT_RADIUS: f32 = 50.0;

/// Clamp a radius into `[MIN_RADIUS, MAX_RADIUS]`. NaN collapses to the minimum.
pub fn clamp_radius(radius: f32) -> f32 {
    if radius.is_nan() {
        return MIN_RADIUS;
    }
    radius.clamp(MIN_RADIUS, MAX_RADIUS)
}

/// Opaque region identifier, stable for the lifetime of the region.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(String);

impl RegionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id given to the face at `index` in detector order
    pub fn face(index: usize) -> Self {
        Self(format!("face-{}", index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque disc fill with an optional cosmetic outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolidFill {
    pub color: Rgba<u8>,
    pub outline: Option<Rgba<u8>>,
}

impl Default for SolidFill {
    /// White disc with a light gray outline
    fn default() -> Self {
        Self {
            color: Rgba([255, 255, 255, 255]),
            outline: Some(Rgba([0xe0, 0xe0, 0xe0, 255])),
        }
    }
}

/// A loaded raster drawn inside the disc instead of a flat color.
#[derive(Clone)]
pub struct SubstituteImage {
    pub image: Arc<RgbaImage>,
    /// Where the raster came from, kept so sessions can be saved and reloaded
    pub source: Option<PathBuf>,
}

impl SubstituteImage {
    pub fn new(image: RgbaImage, source: Option<PathBuf>) -> Self {
        Self {
            image: Arc::new(image),
            source,
        }
    }
}

impl fmt::Debug for SubstituteImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubstituteImage")
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .field("source", &self.source)
            .finish()
    }
}

impl PartialEq for SubstituteImage {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.image, &other.image) && self.source == other.source
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FillMode {
    SolidColor(SolidFill),
    SubstituteImage(SubstituteImage),
}

impl Default for FillMode {
    fn default() -> Self {
        FillMode::SolidColor(SolidFill::default())
    }
}

impl FillMode {
    pub fn is_substitute(&self) -> bool {
        matches!(self, FillMode::SubstituteImage(_))
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FillMode::SolidColor(_) => "Solid disc",
            FillMode::SubstituteImage(_) => "Substitute image",
        }
    }
}

/// One disc-shaped mask in image space.
///
/// The radius is only written through [`MaskRegion::set_radius`], which clamps.
/// Construction does not clamp so detector-sized discs are kept as measured.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskRegion {
    id: RegionId,
    pub center: Point,
    radius: f32,
    pub fill: FillMode,
}

impl MaskRegion {
    pub fn new(id: RegionId, center: Point, radius: f32, fill: FillMode) -> Self {
        Self {
            id,
            center,
            radius,
            fill,
        }
    }

    pub fn id(&self) -> &RegionId {
        &self.id
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = clamp_radius(radius);
    }

    /// Point-in-disc test, boundary inclusive
    pub fn contains(&self, point: Point) -> bool {
        point.distance(self.center) <= self.radius
    }

    /// Center of the resize handle (right-middle of the disc)
    pub fn handle_position(&self) -> Point {
        Point::new(self.center.x + self.radius, self.center.y)
    }

    /// Regions that can't be drawn are skipped by the compositor
    pub fn is_degenerate(&self) -> bool {
        !(self.radius > 0.0 && self.radius.is_finite() && self.center.is_finite())
    }

    /// Put back a radius recorded earlier, as-is. Only undo/redo uses this,
    /// so a detector-sized disc comes back at its measured size.
    pub(crate) fn restore_radius(&mut self, radius: f32) {
        self.radius = radius;
    }

    pub(crate) fn with_id(mut self, id: RegionId) -> Self {
        self.id = id;
        self
    }
}
