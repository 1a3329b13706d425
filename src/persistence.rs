//! Saving and loading a session's regions as JSON.
//!
//! Substitute images are stored by source path and reloaded through a caller
//! supplied loader, so the file stays small and the library stays free of any
//! particular asset lookup.

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::geometry::Point;
use crate::mask::{FillMode, MaskRegion, RegionId, SolidFill, SubstituteImage};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SavedFill {
    Solid {
        color: [u8; 4],
        #[serde(default)]
        outline: Option<[u8; 4]>,
    },
    Substitute {
        #[serde(default)]
        path: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedRegion {
    pub id: RegionId,
    pub center: Point,
    pub radius: f32,
    pub fill: SavedFill,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSession {
    pub image_width: u32,
    pub image_height: u32,
    /// Original image location, if the host knows it
    #[serde(default)]
    pub image_path: Option<PathBuf>,
    #[serde(default)]
    pub regions: Vec<SavedRegion>,
}

impl SavedRegion {
    pub fn from_region(region: &MaskRegion) -> Self {
        let fill = match &region.fill {
            FillMode::SolidColor(fill) => SavedFill::Solid {
                color: fill.color.0,
                outline: fill.outline.map(|c| c.0),
            },
            FillMode::SubstituteImage(substitute) => SavedFill::Substitute {
                path: substitute.source.clone(),
            },
        };
        Self {
            id: region.id().clone(),
            center: region.center,
            radius: region.radius(),
            fill,
        }
    }

    /// Rebuild the region. A substitute that can't be loaded falls back to the
    /// default solid fill so the mask still covers its area.
    pub fn into_region(self, load_image: &mut impl FnMut(&Path) -> Result<RgbaImage>) -> MaskRegion {
        let fill = match self.fill {
            SavedFill::Solid { color, outline } => FillMode::SolidColor(SolidFill {
                color: Rgba(color),
                outline: outline.map(Rgba),
            }),
            SavedFill::Substitute { path: Some(path) } => match load_image(&path) {
                Ok(image) => FillMode::SubstituteImage(SubstituteImage::new(image, Some(path))),
                Err(e) => {
                    warn!("Failed to load substitute image {:?} for {}: {}", path, self.id, e);
                    FillMode::default()
                }
            },
            SavedFill::Substitute { path: None } => {
                warn!("Region {} has a substitute image with no source path", self.id);
                FillMode::default()
            }
        };
        MaskRegion::new(self.id, self.center, self.radius, fill)
    }
}

impl SavedSession {
    pub fn new(regions: &[MaskRegion], image_width: u32, image_height: u32) -> Self {
        Self {
            image_width,
            image_height,
            image_path: None,
            regions: regions.iter().map(SavedRegion::from_region).collect(),
        }
    }

    pub fn with_image_path(mut self, path: Option<PathBuf>) -> Self {
        self.image_path = path;
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        info!("Saved {} regions to {:?}", self.regions.len(), path);
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let session = Self::from_json(&fs::read_to_string(path)?)?;
        info!("Loaded {} regions from {:?}", session.regions.len(), path);
        Ok(session)
    }

    /// Rebuild regions in saved order.
    pub fn into_regions(self, mut load_image: impl FnMut(&Path) -> Result<RgbaImage>) -> Vec<MaskRegion> {
        self.regions
            .into_iter()
            .map(|saved| saved.into_region(&mut load_image))
            .collect()
    }
}

/// Loader for substitute images stored on disk
pub fn load_image_file(path: &Path) -> Result<RgbaImage> {
    crate::compositor::decode(&fs::read(path)?)
}
