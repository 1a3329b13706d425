//! Mapping between the scaled on-screen canvas and native image pixels.
//!
//! The canvas may be drawn smaller than requested (panel squeeze, window
//! resize), so conversions use the size the canvas was actually rendered at.

use crate::geometry::Point;

/// Default maximum on-screen footprint of the canvas
pub const DEFAULT_MAX_DISPLAY: (f32, f32) = (800.0, 600.0);

/// Uniformly downscale `(width, height)` to fit inside `(max_width, max_height)`.
///
/// Width is fitted first, then height. Never upscales.
pub fn scale_to_fit(width: f32, height: f32, max_width: f32, max_height: f32) -> (f32, f32) {
    let (mut w, mut h) = (width, height);
    if w > max_width && w > 0.0 {
        h = h * max_width / w;
        w = max_width;
    }
    if h > max_height && h > 0.0 {
        w = w * max_height / h;
        h = max_height;
    }
    (w, h)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    image_size: (f32, f32),
    display_size: (f32, f32),
    rendered_size: Option<(f32, f32)>,
}

impl CoordinateMapper {
    pub fn new(image_width: u32, image_height: u32) -> Self {
        Self::with_max(image_width, image_height, DEFAULT_MAX_DISPLAY.0, DEFAULT_MAX_DISPLAY.1)
    }

    pub fn with_max(image_width: u32, image_height: u32, max_width: f32, max_height: f32) -> Self {
        let image_size = (image_width as f32, image_height as f32);
        Self {
            image_size,
            display_size: scale_to_fit(image_size.0, image_size.1, max_width, max_height),
            rendered_size: None,
        }
    }

    pub fn image_size(&self) -> (f32, f32) {
        self.image_size
    }

    /// Requested display size
    pub fn display_size(&self) -> (f32, f32) {
        self.display_size
    }

    /// Size the canvas was last drawn at, falling back to the requested size.
    pub fn rendered_size(&self) -> (f32, f32) {
        self.rendered_size.unwrap_or(self.display_size)
    }

    /// Record the size the canvas actually occupied on screen. Non-positive
    /// sizes are ignored.
    pub fn set_rendered_size(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite() {
            self.rendered_size = Some((width, height));
        } else {
            self.rendered_size = None;
        }
    }

    /// Image pixels per rendered display pixel on each axis
    fn scale(&self) -> (f32, f32) {
        let (rw, rh) = self.rendered_size();
        let sx = if rw > 0.0 { self.image_size.0 / rw } else { 1.0 };
        let sy = if rh > 0.0 { self.image_size.1 / rh } else { 1.0 };
        (sx, sy)
    }

    pub fn to_image_space(&self, display: Point) -> Point {
        let (sx, sy) = self.scale();
        Point::new(display.x * sx, display.y * sy)
    }

    pub fn to_display_space(&self, image: Point) -> Point {
        let (sx, sy) = self.scale();
        Point::new(image.x / sx, image.y / sy)
    }

    /// Image-space length of a display-space distance (horizontal axis)
    pub fn to_image_length(&self, display_length: f32) -> f32 {
        display_length * self.scale().0
    }

    /// Whether an image-space point lies in `[0, W] x [0, H]`
    pub fn contains_image_point(&self, point: Point) -> bool {
        point.x >= 0.0 && point.y >= 0.0 && point.x <= self.image_size.0 && point.y <= self.image_size.1
    }
}
