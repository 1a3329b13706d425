//! Converts raw detector geometry into mask shapes.
//!
//! Faces become discs, sensitive text spans become quadrilaterals. Both are pure
//! functions of their input so identical detections always give identical masks.

use std::collections::HashSet;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::detection::{BoundingPoly, FaceAnnotation, TextAnnotation};
use crate::mask::{FillMode, MaskRegion, RegionId};

/// Shrink applied to the detector box: face boxes are looser than the face.
pub const FACE_RADIUS_FACTOR: f32 = 0.8;

/// A point (or offset) in floating-point pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        (self - other).length()
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// One sensitive text span to be covered by a filled polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRedaction {
    /// Vertices in detector order, not necessarily convex or axis-aligned
    pub polygon: Vec<Point>,
    /// The detected string this redaction covers
    pub source_text: String,
}

impl TextRedaction {
    /// Fewer than three distinct vertices, or any non-finite vertex.
    pub fn is_degenerate(&self) -> bool {
        if self.polygon.iter().any(|p| !p.is_finite()) {
            return true;
        }
        let mut distinct: Vec<Point> = Vec::with_capacity(3);
        for point in &self.polygon {
            if !distinct.contains(point) {
                distinct.push(*point);
                if distinct.len() == 3 {
                    return false;
                }
            }
        }
        true
    }
}

/// Vertices of a bounding polygon with missing coordinates read as 0.
pub fn polygon_points(poly: &BoundingPoly) -> Vec<Point> {
    poly.vertices
        .iter()
        .map(|v| Point::new(v.x.unwrap_or(0.0), v.y.unwrap_or(0.0)))
        .collect()
}

/// Disc center and radius for a face bounding polygon, or `None` if it has no vertices.
pub fn face_disc(poly: &BoundingPoly) -> Option<(Point, f32)> {
    let points = polygon_points(poly);
    if points.is_empty() {
        return None;
    }

    let (mut min_x, mut max_x) = (f32::INFINITY, f32::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f32::INFINITY, f32::NEG_INFINITY);
    for p in &points {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }

    let center = Point::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
    let radius = ((max_x - min_x) / 2.0).max((max_y - min_y) / 2.0) * FACE_RADIUS_FACTOR;
    Some((center, radius))
}

/// One solid white disc per face that has a bounding polygon.
pub fn faces_to_regions(faces: &[FaceAnnotation]) -> Vec<MaskRegion> {
    faces_to_regions_with_fill(faces, &FillMode::default())
}

/// Like [`faces_to_regions`] with a caller-chosen fill.
///
/// Ids are `face-{index}` using the index in detector order, so a skipped face
/// leaves a gap rather than shifting later ids. Radii are not clamped.
pub fn faces_to_regions_with_fill(faces: &[FaceAnnotation], fill: &FillMode) -> Vec<MaskRegion> {
    faces
        .iter()
        .enumerate()
        .filter_map(|(index, face)| {
            let Some((center, radius)) = face.bounding_poly.as_ref().and_then(face_disc) else {
                debug!("Face {} has no bounding polygon, skipping", index);
                return None;
            };
            Some(MaskRegion::new(RegionId::face(index), center, radius, fill.clone()))
        })
        .collect()
}

/// Polygons for every detected span that the classifier marked sensitive.
///
/// Index 0 is the detector's full-text aggregate and is never a span. A span is
/// kept when its text is in `sensitive` (exact match) and, if `excluded` is
/// given, it does not equal `excluded` ignoring case. Input order is preserved.
pub fn text_to_redactions(
    annotations: &[TextAnnotation],
    sensitive: &HashSet<String>,
    excluded: Option<&str>,
) -> Vec<TextRedaction> {
    let excluded = excluded.map(str::to_lowercase);

    annotations
        .iter()
        .enumerate()
        .skip(1)
        .filter_map(|(index, annotation)| {
            let text = annotation.description.as_deref()?;
            if !sensitive.contains(text) {
                return None;
            }
            if excluded.as_deref() == Some(text.to_lowercase().as_str()) {
                debug!("Span {} matches the excluded term, leaving it visible", index);
                return None;
            }
            let Some(poly) = annotation.bounding_poly.as_ref() else {
                debug!("Sensitive span {} has no bounding polygon, skipping", index);
                return None;
            };
            Some(TextRedaction {
                polygon: polygon_points(poly),
                source_text: text.to_string(),
            })
        })
        .collect()
}
