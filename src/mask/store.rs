//! Ordered collection of mask regions for one editing session.

use std::collections::HashSet;

use tracing::debug;

use super::{FillMode, MaskRegion, RegionId};
use crate::geometry::Point;

/// Authoritative region list. Insertion order is paint order: later regions
/// draw on top of earlier ones.
///
/// Every id ever handed out is remembered so a deleted id is never given to a
/// different region.
#[derive(Debug, Default, Clone)]
pub struct MaskStore {
    regions: Vec<MaskRegion>,
    issued: HashSet<RegionId>,
    next_serial: u64,
}

impl MaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from an initial list, keeping the given order.
    pub fn from_regions(regions: impl IntoIterator<Item = MaskRegion>) -> Self {
        let mut store = Self::new();
        for region in regions {
            store.add(region);
        }
        store
    }

    /// Add a region on top of the paint order.
    ///
    /// If the region's id was already issued by this store it is replaced with
    /// a fresh one; the id actually stored is returned.
    pub fn add(&mut self, region: MaskRegion) -> RegionId {
        let region = if self.issued.contains(region.id()) {
            let fresh = self.allocate_id();
            debug!("Region id {} already issued, storing as {}", region.id(), fresh);
            region.with_id(fresh)
        } else {
            region
        };

        let id = region.id().clone();
        self.issued.insert(id.clone());
        self.regions.push(region);
        id
    }

    /// Create a new region with a freshly allocated id.
    pub fn insert_new(&mut self, center: Point, radius: f32, fill: FillMode) -> RegionId {
        let id = self.allocate_id();
        self.add(MaskRegion::new(id, center, radius, fill))
    }

    /// Remove a region. Returns false if no region has this id.
    pub fn remove(&mut self, id: &RegionId) -> bool {
        self.take(id).is_some()
    }

    /// Remove a region and hand it back along with its paint-order index.
    pub fn take(&mut self, id: &RegionId) -> Option<(usize, MaskRegion)> {
        let index = self.position(id)?;
        Some((index, self.regions.remove(index)))
    }

    /// Put a previously removed region back at its old paint-order index.
    ///
    /// Only ids this store issued and that are not currently present can be
    /// restored; anything else is refused.
    pub fn restore(&mut self, index: usize, region: MaskRegion) -> bool {
        if !self.issued.contains(region.id()) || self.position(region.id()).is_some() {
            return false;
        }
        let index = index.min(self.regions.len());
        self.regions.insert(index, region);
        true
    }

    pub fn get(&self, id: &RegionId) -> Option<&MaskRegion> {
        self.regions.iter().find(|r| r.id() == id)
    }

    /// Apply `mutator` to the region with this id. Returns false if not found.
    pub fn update(&mut self, id: &RegionId, mutator: impl FnOnce(&mut MaskRegion)) -> bool {
        match self.regions.iter_mut().find(|r| r.id() == id) {
            Some(region) => {
                mutator(region);
                true
            }
            None => false,
        }
    }

    /// Regions in paint order (oldest first)
    pub fn list(&self) -> &[MaskRegion] {
        &self.regions
    }

    pub fn position(&self, id: &RegionId) -> Option<usize> {
        self.regions.iter().position(|r| r.id() == id)
    }

    pub fn contains(&self, id: &RegionId) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn into_regions(self) -> Vec<MaskRegion> {
        self.regions
    }

    fn allocate_id(&mut self) -> RegionId {
        loop {
            let candidate = RegionId::new(format!("mask-{}", self.next_serial));
            self.next_serial += 1;
            if !self.issued.contains(&candidate) {
                return candidate;
            }
        }
    }
}
