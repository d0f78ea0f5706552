use crate::domain::geometry::Rectangle;
use crate::domain::part::Part;
use crate::domain::score::PageSummary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct ScoreCreatedResponse {
    pub score_id: String,
    pub page_count: usize,
    pub pages: Vec<PageSummary>,
}

#[derive(Debug, Deserialize)]
pub struct PartitionRequestBody {
    pub display_width: u32,
    pub pages: BTreeMap<usize, crate::domain::divider::DividerSet>,
    #[serde(default)]
    pub header: Option<Rectangle>,
    #[serde(default)]
    pub markings: Vec<Rectangle>,
}

#[derive(Debug, Serialize)]
pub struct PartitionResponse {
    pub parts: Vec<PartSummary>,
}

#[derive(Debug, Serialize)]
pub struct PartSummary {
    pub name: String,
    pub staves_count: usize,
    pub layout: LayoutSummary,
    pub staves: Vec<StaveSummary>,
    pub header: Option<HeaderSummary>,
}

#[derive(Debug, Serialize)]
pub struct LayoutSummary {
    pub default_spacing_px: f32,
    pub title_area_px: f32,
    pub available_height_px: f32,
}

#[derive(Debug, Serialize)]
pub struct StaveSummary {
    pub source_page: usize,
    pub scaled_height: f32,
    pub markings_overhead_px: f32,
}

#[derive(Debug, Serialize)]
pub struct HeaderSummary {
    pub scaled_height: f32,
}

impl PartSummary {
    pub fn from_part(part: &Part, title_area_px: f32, available_height_px: f32) -> Self {
        PartSummary {
            name: part.name.clone(),
            staves_count: part.staves_count(),
            layout: LayoutSummary {
                default_spacing_px: part.layout.spacing_px,
                title_area_px: if part.header.is_some() { title_area_px } else { 0.0 },
                available_height_px,
            },
            staves: part
                .staves
                .iter()
                .map(|s| StaveSummary {
                    source_page: s.page_index,
                    scaled_height: s.scaled_height,
                    markings_overhead_px: s.markings_overhead_px,
                })
                .collect(),
            header: part.header.map(|h| HeaderSummary { scaled_height: h.height() }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequestBody {
    pub parts: BTreeMap<String, PartLayoutOverride>,
}

#[derive(Debug, Deserialize)]
pub struct PartLayoutOverride {
    pub spacing_mm: f32,
    #[serde(default)]
    pub offsets: Vec<i32>,
    #[serde(default)]
    pub page_breaks_after: Vec<usize>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub parts: Vec<PartPageCount>,
}

#[derive(Debug, Serialize)]
pub struct PartPageCount {
    pub name: String,
    pub page_count: usize,
}
