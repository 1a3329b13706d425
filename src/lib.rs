//! Face and sensitive-text redaction engine.
//!
//! Detector output goes in as plain annotations, editable mask regions and
//! rendered rasters come out:
//!
//! - [`geometry`] - detector polygons to discs and text quads
//! - [`mask`] - regions and the per-session region store
//! - [`viewport`] - display space to image space mapping
//! - [`session`] - the interactive editing state machine
//! - [`compositor`] - deterministic rendering and encoding
//! - [`pipeline`] - one-shot face and text redaction flows
//! - [`persistence`] - region lists as JSON

pub mod compositor;
pub mod detection;
pub mod error;
pub mod geometry;
pub mod mask;
pub mod persistence;
pub mod pipeline;
pub mod session;
pub mod viewport;

pub use error::{RedactError, Result, ServiceError};
pub use geometry::{Point, TextRedaction};
pub use mask::{FillMode, MaskRegion, MaskStore, RegionId};
pub use session::EditingSession;
