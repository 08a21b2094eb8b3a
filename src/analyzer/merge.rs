use crate::analyzer::region::Region;
use tracing::trace;

/// Regions whose centres are closer than this are merged
pub const MERGE_DISTANCE: f64 = 60.0;

/// Greedy, order-preserving merge of nearby regions
#[derive(Debug, Default, Clone, Copy)]
pub struct RegionMerger;

impl RegionMerger {
    pub fn new() -> Self {
        Self
    }

    /// Fold each region into the first accepted region within
    /// `MERGE_DISTANCE`, or accept it as a new region.
    pub fn merge(&self, regions: &[Region]) -> Vec<Region> {
        let mut merged: Vec<Region> = Vec::with_capacity(regions.len());

        for current in regions {
            match merged
                .iter_mut()
                .find(|existing| existing.center_distance(current) < MERGE_DISTANCE)
            {
                Some(existing) => {
                    trace!("Merging {:?} into {:?}", current, existing);
                    existing.absorb(current);
                }
                None => merged.push(*current),
            }
        }

        merged
    }
}
