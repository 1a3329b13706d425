//! Named values shared by the editor and the command line.

/// Default window width in pixels
pub const DEFAULT_WINDOW_WIDTH: f32 = 1280.0;

/// Default window height in pixels
pub const DEFAULT_WINDOW_HEIGHT: f32 = 860.0;

/// Maximum number of recently opened images remembered in config
pub const MAX_RECENT_IMAGES: usize = 5;

/// JPEG quality used when the config doesn't say otherwise
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Image types accepted by the open dialog
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp", "tif", "tiff"];

/// File name written by the session save dialog when none is chosen
pub const DEFAULT_SESSION_FILE: &str = "regions.json";
