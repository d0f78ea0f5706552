use crate::domain::geometry::round_f32;
use serde::{Deserialize, Serialize};

/// An immutable pointer into a page, in backend-pixel (300 DPI) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaffRegion {
    pub page_index: usize,
    pub top_y: f32,
    pub bottom_y: f32,
    /// Rendered height at the part's reference scale; filled in once the
    /// part's reference width is known.
    #[serde(serialize_with = "round_f32")]
    pub scaled_height: f32,
    /// Vertical margin reserved for markings that overhang the stave, in
    /// the same reference-width scale as `scaled_height`.
    #[serde(serialize_with = "round_f32")]
    pub markings_overhead_px: f32,
    /// Ratio of the part's reference width to this stave's source page
    /// width. Stored once at partition time so later stages (render)
    /// don't re-derive it from the source page.
    pub width_scale: f32,
}

impl StaffRegion {
    pub fn source_height(&self) -> f32 {
        self.bottom_y - self.top_y
    }

    pub fn centre_y(&self) -> f32 {
        (self.top_y + self.bottom_y) / 2.0
    }

    pub fn overlap(&self, other_top: f32, other_bottom: f32) -> f32 {
        let top = self.top_y.max(other_top);
        let bottom = self.bottom_y.min(other_bottom);
        (bottom - top).max(0.0)
    }
}

/// A header or marking region: a page index plus a bounding box in
/// backend-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub page_index: usize,
    pub top_y: f32,
    pub bottom_y: f32,
    pub left_x: f32,
    pub right_x: f32,
}

impl Region {
    pub fn centre_y(&self) -> f32 {
        (self.top_y + self.bottom_y) / 2.0
    }

    pub fn height(&self) -> f32 {
        self.bottom_y - self.top_y
    }
}
