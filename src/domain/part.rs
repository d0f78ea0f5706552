use crate::domain::geometry::round_f32;
use crate::domain::region::{Region, StaffRegion};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Per-Part layout parameters, user-supplied or defaulted by the
/// PartitionPlanner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutParams {
    pub spacing_px: f32,
    /// Additive per-stave vertical perturbations, indexed by stave position.
    pub offsets_px: Vec<f32>,
    /// Forces a page break after the given stave index. Arrives on the wire
    /// as an array but behaves as a set — deduplicated on ingest.
    pub page_breaks_after: Vec<usize>,
}

impl LayoutParams {
    pub fn defaulted(median_stave_height: f32, stave_count: usize) -> Self {
        Self {
            spacing_px: 1.2 * median_stave_height,
            offsets_px: vec![0.0; stave_count],
            page_breaks_after: Vec::new(),
        }
    }

    /// Deduplicated, sorted break-point set, per the "set-typed user input"
    /// note: the wire array is an array but semantically a set.
    pub fn break_set(&self) -> BTreeSet<usize> {
        self.page_breaks_after.iter().copied().collect()
    }

    pub fn offset_for(&self, index: usize) -> f32 {
        self.offsets_px.get(index).copied().unwrap_or(0.0)
    }
}

/// An ordered list of StaffRegions sharing an instrument name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub name: String,
    pub staves: Vec<StaffRegion>,
    #[serde(serialize_with = "round_f32")]
    pub reference_stave_height: f32,
    /// Target width, in source-page backend pixels, every stave in this
    /// Part is scaled to before pagination and rendering.
    #[serde(serialize_with = "round_f32")]
    pub reference_width_px: f32,
    pub header: Option<Region>,
    pub markings: Vec<(usize, Region)>,
    pub layout: LayoutParams,
}

impl Part {
    pub fn staves_count(&self) -> usize {
        self.staves.len()
    }

    pub fn markings_for_stave(&self, stave_index: usize) -> impl Iterator<Item = &Region> {
        self.markings
            .iter()
            .filter(move |(i, _)| *i == stave_index)
            .map(|(_, r)| r)
    }
}
