//! Result types for async document operations.

use std::path::PathBuf;

use image::RgbaImage;
use masquerade::mask::MaskRegion;

pub struct OpenedImage {
    pub image: RgbaImage,
    pub regions: Vec<MaskRegion>,
}

/// Result of an async open operation
pub struct OpenResult {
    pub path: PathBuf,
    pub opened: Option<OpenedImage>,
    pub error: Option<String>,
}

/// Result of an async export operation
pub struct ExportResult {
    pub path: PathBuf,
    pub success: bool,
    pub error: Option<String>,
}
