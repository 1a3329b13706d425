//! Hit detection for region bodies and the resize handle, in image space.

use crate::geometry::Point;
use crate::mask::MaskRegion;

/// Radius of the resize handle hit circle (image pixels)
pub const HANDLE_HIT_RADIUS: f32 = 6.0;

/// Check if a point is on the region's resize handle
pub fn handle_hit(region: &MaskRegion, point: Point) -> bool {
    point.distance(region.handle_position()) <= HANDLE_HIT_RADIUS
}

/// Topmost region whose disc contains the point.
///
/// Regions are stored in paint order, so the scan runs back to front.
pub fn topmost_region_at(regions: &[MaskRegion], point: Point) -> Option<&MaskRegion> {
    regions.iter().rev().find(|region| region.contains(point))
}
