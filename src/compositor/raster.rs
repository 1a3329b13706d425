//! Shape drawing onto an owned copy of the base image.
//!
//! Painting goes through a `tiny_skia` pixmap with anti-aliasing off, so a
//! pixel is either covered at its center or untouched and the same shapes
//! always produce the same bytes. Pixels no shape touched are copied back
//! from the base unchanged.

use image::{Rgba, RgbaImage};
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, IntSize, Mask, Paint, Path, PathBuilder, Pixmap, PixmapPaint,
    PremultipliedColorU8, Stroke, Transform,
};

use crate::geometry::Point;

/// Exclusively owned drawing surface for one render call.
pub struct Surface {
    base: RgbaImage,
    pixmap: Pixmap,
}

impl Surface {
    /// Start from a copy of `base` at native resolution. `None` for an empty image.
    pub fn new(base: &RgbaImage) -> Option<Self> {
        Some(Self {
            pixmap: to_pixmap(base)?,
            base: base.clone(),
        })
    }

    pub fn into_image(self) -> RgbaImage {
        let mut image = self.base;
        for (px, painted) in image.pixels_mut().zip(self.pixmap.pixels()) {
            if premultiply(*px) != *painted {
                let color = painted.demultiply();
                *px = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
            }
        }
        image
    }

    pub fn fill_disc(&mut self, center: Point, radius: f32, color: Rgba<u8>) {
        if let Some(path) = circle(center, radius) {
            self.pixmap
                .fill_path(&path, &solid(color), FillRule::Winding, Transform::identity(), None);
        }
    }

    /// Ring between `inner` and `outer` radius.
    pub fn stroke_ring(&mut self, center: Point, inner: f32, outer: f32, color: Rgba<u8>) {
        let inner = inner.max(0.0);
        let width = outer - inner;
        if !(width > 0.0) {
            return;
        }
        if let Some(path) = circle(center, inner + width / 2.0) {
            let stroke = Stroke {
                width,
                ..Default::default()
            };
            self.pixmap
                .stroke_path(&path, &solid(color), &stroke, Transform::identity(), None);
        }
    }

    /// Draw `source` stretched over the disc's bounding square, clipped to the disc.
    /// Nearest-neighbour sampling.
    pub fn draw_image_in_disc(&mut self, center: Point, radius: f32, source: &RgbaImage) {
        let Some(path) = circle(center, radius) else {
            return;
        };
        let Some(source) = to_pixmap(source) else {
            return;
        };
        let Some(mut clip) = Mask::new(self.pixmap.width(), self.pixmap.height()) else {
            return;
        };
        clip.fill_path(&path, FillRule::Winding, false, Transform::identity());

        let side = radius * 2.0;
        let transform = Transform::from_row(
            side / source.width() as f32,
            0.0,
            0.0,
            side / source.height() as f32,
            center.x - radius,
            center.y - radius,
        );
        let paint = PixmapPaint {
            quality: FilterQuality::Nearest,
            ..PixmapPaint::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, source.as_ref(), &paint, transform, Some(&clip));
    }

    /// Fill a closed polygon using the nonzero winding rule.
    pub fn fill_polygon(&mut self, points: &[Point], color: Rgba<u8>) {
        if let Some(path) = polygon(points) {
            self.pixmap
                .fill_path(&path, &solid(color), FillRule::Winding, Transform::identity(), None);
        }
    }

    /// Stroke the closed outline of a polygon, `width` pixels centered on each edge.
    pub fn stroke_polygon(&mut self, points: &[Point], width: f32, color: Rgba<u8>) {
        if !(width > 0.0) {
            return;
        }
        if let Some(path) = polygon(points) {
            let stroke = Stroke {
                width,
                ..Default::default()
            };
            self.pixmap
                .stroke_path(&path, &solid(color), &stroke, Transform::identity(), None);
        }
    }
}

fn solid(color: Rgba<u8>) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = false;
    paint
}

fn circle(center: Point, radius: f32) -> Option<Path> {
    if !(radius > 0.0) || !radius.is_finite() || !center.is_finite() {
        return None;
    }
    PathBuilder::from_circle(center.x, center.y, radius)
}

fn polygon(points: &[Point]) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut builder = PathBuilder::new();
    builder.move_to(first.x, first.y);
    for point in rest {
        builder.line_to(point.x, point.y);
    }
    builder.close();
    builder.finish()
}

fn premultiply(px: Rgba<u8>) -> PremultipliedColorU8 {
    ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply()
}

fn to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(image.width(), image.height())?;
    let data = image
        .pixels()
        .flat_map(|px| {
            let c = premultiply(*px);
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    Pixmap::from_vec(data, size)
}
