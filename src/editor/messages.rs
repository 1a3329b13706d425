//! Message types for document operations.

use bevy::prelude::*;
use std::path::PathBuf;

/// Where the initial regions of an opened image come from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RegionSource {
    #[default]
    Empty,
    /// Recorded detector response; one disc per face
    Detections(PathBuf),
    /// Region list saved from an earlier session
    SavedSession(PathBuf),
}

#[derive(Message)]
pub struct OpenImageRequest {
    pub path: PathBuf,
    pub regions: RegionSource,
}

/// Replace the open image's regions with discs from a detector response
#[derive(Message)]
pub struct ImportDetectionsRequest {
    pub path: PathBuf,
}

#[derive(Message)]
pub struct ExportRequest {
    pub path: PathBuf,
}

#[derive(Message)]
pub struct SaveSessionRequest {
    pub path: PathBuf,
}

#[derive(Message)]
pub struct LoadSessionRequest {
    pub path: PathBuf,
}

/// Fill applied to every region and used for new ones
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillChoice {
    Solid,
    Substitute(PathBuf),
}

#[derive(Message)]
pub struct SetFillRequest {
    pub choice: FillChoice,
}
