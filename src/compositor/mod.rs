//! Deterministic rendering of base image plus masks.
//!
//! Regions are painted in store order so later regions sit on top. Shapes that
//! cannot be drawn are skipped with a debug log; only decoding the base image
//! can fail.

pub mod raster;


use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RedactError, Result};
use crate::geometry::TextRedaction;
use crate::mask::{FillMode, MaskRegion, RegionId};
use crate::session::HANDLE_HIT_RADIUS;

pub use raster::Surface;

/// Width of the cosmetic disc outline, drawn just inside the disc edge
pub const OUTLINE_WIDTH: f32 = 2.0;
/// Width of the ring marking the selected region in previews
pub const SELECTION_WIDTH: f32 = 3.0;
pub const SELECTION_COLOR: Rgba<u8> = Rgba([0x4a, 0xde, 0x80, 255]);
pub const HANDLE_STROKE_COLOR: Rgba<u8> = Rgba([0x16, 0xa3, 0x4a, 255]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Draw the light outline around solid discs
    pub draw_outline: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { draw_outline: true }
    }
}

/// Fill and stroke used for text redactions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub fill: Rgba<u8>,
    pub stroke: Rgba<u8>,
    pub stroke_width: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            fill: Rgba([255, 0, 0, 255]),
            stroke: Rgba([255, 0, 0, 255]),
            stroke_width: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg {
        /// 1-100
        quality: u8,
    },
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg { .. } => "jpg",
        }
    }

    /// Pick a format from a file extension, falling back to PNG.
    pub fn from_extension(extension: &str, jpeg_quality: u8) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => ExportFormat::Jpeg { quality: jpeg_quality },
            _ => ExportFormat::Png,
        }
    }
}

/// Composite face regions onto `base`.
pub fn render(base: &RgbaImage, regions: &[MaskRegion], options: &RenderOptions) -> RgbaImage {
    let Some(mut surface) = Surface::new(base) else {
        return base.clone();
    };
    paint_regions(&mut surface, regions, options);
    surface.into_image()
}

/// Like [`render`] with the outline always on, plus the selection ring and
/// resize handle for the selected region. Never used for export.
pub fn render_preview(base: &RgbaImage, regions: &[MaskRegion], selected: Option<&RegionId>) -> RgbaImage {
    let Some(mut surface) = Surface::new(base) else {
        return base.clone();
    };
    paint_regions(&mut surface, regions, &RenderOptions { draw_outline: true });

    if let Some(id) = selected
        && let Some(region) = regions.iter().find(|r| r.id() == id)
        && !region.is_degenerate()
    {
        let half = SELECTION_WIDTH / 2.0;
        let radius = region.radius();
        surface.stroke_ring(region.center, radius - half, radius + half, SELECTION_COLOR);

        let handle = region.handle_position();
        surface.fill_disc(handle, HANDLE_HIT_RADIUS, SELECTION_COLOR);
        surface.stroke_ring(handle, HANDLE_HIT_RADIUS - 1.0, HANDLE_HIT_RADIUS + 1.0, HANDLE_STROKE_COLOR);
    }

    surface.into_image()
}

/// Composite text redactions onto `base`: each polygon is filled then stroked.
pub fn render_text_redactions(base: &RgbaImage, redactions: &[TextRedaction], style: &TextStyle) -> RgbaImage {
    let Some(mut surface) = Surface::new(base) else {
        return base.clone();
    };
    for redaction in redactions {
        if redaction.is_degenerate() {
            debug!("Skipping degenerate redaction for {:?}", redaction.source_text);
            continue;
        }
        surface.fill_polygon(&redaction.polygon, style.fill);
        surface.stroke_polygon(&redaction.polygon, style.stroke_width, style.stroke);
    }
    surface.into_image()
}

fn paint_regions(surface: &mut Surface, regions: &[MaskRegion], options: &RenderOptions) {
    for region in regions {
        if region.is_degenerate() {
            debug!("Skipping degenerate region {}", region.id());
            continue;
        }
        let (center, radius) = (region.center, region.radius());
        match &region.fill {
            FillMode::SolidColor(fill) => {
                surface.fill_disc(center, radius, fill.color);
                if options.draw_outline
                    && let Some(outline) = fill.outline
                {
                    surface.stroke_ring(center, radius - OUTLINE_WIDTH, radius, outline);
                }
            }
            FillMode::SubstituteImage(substitute) => {
                surface.draw_image_in_disc(center, radius, &substitute.image);
            }
        }
    }
}

/// Decode an uploaded image into RGBA pixels.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage> {
    if bytes.is_empty() {
        return Err(RedactError::input("No file uploaded. Please upload an image."));
    }
    let image = image::load_from_memory(bytes).map_err(RedactError::Decode)?;
    Ok(image.to_rgba8())
}

/// Encode a rendered image. JPEG has no alpha, so transparent pixels are
/// flattened onto white first.
pub fn encode(image: &RgbaImage, format: ExportFormat) -> Result<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    let (width, height) = image.dimensions();

    match format {
        ExportFormat::Png => {
            PngEncoder::new(&mut bytes)
                .write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(RedactError::Encode)?;
        }
        ExportFormat::Jpeg { quality } => {
            let flattened = flatten_onto_white(image);
            JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100))
                .write_image(flattened.as_raw(), width, height, ExtendedColorType::Rgb8)
                .map_err(RedactError::Encode)?;
        }
    }

    Ok(bytes.into_inner())
}

fn flatten_onto_white(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let px = image.get_pixel(x, y);
        let a = px[3] as f32 / 255.0;
        let channel = |c: u8| (c as f32 * a + 255.0 * (1.0 - a)).round() as u8;
        Rgb([channel(px[0]), channel(px[1]), channel(px[2])])
    })
}

/// Decode, composite face regions and encode in one step.
pub fn composite_faces(
    image_bytes: &[u8],
    regions: &[MaskRegion],
    options: &RenderOptions,
    format: ExportFormat,
) -> Result<Vec<u8>> {
    let base = decode(image_bytes)?;
    encode(&render(&base, regions, options), format)
}

/// Decode, composite text redactions and encode in one step.
pub fn composite_text(
    image_bytes: &[u8],
    redactions: &[TextRedaction],
    style: &TextStyle,
    format: ExportFormat,
) -> Result<Vec<u8>> {
    let base = decode(image_bytes)?;
    encode(&render_text_redactions(&base, redactions, style), format)
}
