use crate::domain::ids::ScoreId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Canonical rasterisation resolution. All backend-pixel coordinates in the
/// core are native to this DPI.
pub const RASTER_DPI: f32 = 300.0;

/// One rasterised page: its pixel dimensions and the grayscale raster
/// itself. The raster is wrapped in an `Arc` because a page is read by the
/// detector, the partition planner (for coordinate scaling) and the
/// renderer (for cropping) without ever being mutated.
#[derive(Clone)]
pub struct Page {
    pub index: usize,
    pub width_px: u32,
    pub height_px: u32,
    pub raster: Arc<image::GrayImage>,
}

impl Page {
    pub fn byte_len(&self) -> usize {
        (self.width_px as usize) * (self.height_px as usize)
    }
}

/// Wire-facing summary of a page, omitting the raster bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSummary {
    pub width_px: u32,
    pub height_px: u32,
}

impl From<&Page> for PageSummary {
    fn from(page: &Page) -> Self {
        PageSummary {
            width_px: page.width_px,
            height_px: page.height_px,
        }
    }
}

/// An ingested, rasterised score: an immutable collection of pages plus
/// identifying metadata. Discarded when its owning session (cache entry)
/// is evicted.
pub struct Score {
    pub id: ScoreId,
    pub pages: Vec<Page>,
}

impl Score {
    pub fn new(pages: Vec<Page>) -> Self {
        Self {
            id: ScoreId::new(),
            pages,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn total_raster_bytes(&self) -> usize {
        self.pages.iter().map(Page::byte_len).sum()
    }
}
