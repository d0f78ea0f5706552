use crate::domain::divider::DividerSet;
use crate::domain::geometry::{display_to_backend_scale, Rectangle};
use crate::domain::part::{LayoutParams, Part};
use crate::domain::region::{Region, StaffRegion};
use crate::domain::score::Score;
use std::collections::BTreeMap;

/// Request payload for one partition call: the per-page divider data the
/// caller has confirmed, plus optional header/marking rectangles, all in
/// display-pixel space.
pub struct PartitionRequest<'a> {
    pub display_width: u32,
    pub pages: &'a BTreeMap<usize, DividerSet>,
    pub header: Option<Rectangle>,
    pub markings: &'a [Rectangle],
}

/// Turns user-confirmed per-page divider data into a normalised, ordered
/// list of Parts. Deterministic: identical inputs always produce an
/// identical Part list, same order, same staves.
pub fn partition(score: &Score, request: &PartitionRequest) -> Vec<Part> {
    let mut first_seen_order: Vec<String> = Vec::new();
    let mut regions_by_name: BTreeMap<String, Vec<StaffRegion>> = BTreeMap::new();
    let mut page_order: Vec<&usize> = request.pages.keys().collect();
    page_order.sort();

    for &page_index in &page_order {
        let Some(page) = score.page(*page_index) else {
            continue;
        };
        let divider_set = &request.pages[page_index];
        if divider_set.validate().is_err() {
            continue;
        }
        let scale = display_to_backend_scale(page.width_px, request.display_width);
        let backend = divider_set.to_backend(scale);

        for strip in backend.live_strips() {
            if strip.name.is_empty() {
                continue;
            }
            let region = StaffRegion {
                page_index: *page_index,
                top_y: strip.top_y,
                bottom_y: strip.bottom_y,
                scaled_height: strip.bottom_y - strip.top_y,
                markings_overhead_px: 0.0,
                width_scale: 1.0,
            };
            let bucket = regions_by_name.entry(strip.name.clone()).or_insert_with(|| {
                first_seen_order.push(strip.name.clone());
                Vec::new()
            });
            bucket.push(region);
        }
    }

    let mut parts: Vec<Part> = Vec::new();
    for name in &first_seen_order {
        let Some(staves) = regions_by_name.get(name) else {
            continue;
        };
        if staves.is_empty() {
            continue;
        }
        let mut staves = staves.clone();

        // Scale every stave to the Part's reference width (the median
        // native page width across its staves) before any layout math
        // happens, so pagination sees heights in one consistent space even
        // when staves come from pages of differing native pixel width.
        let page_widths: Vec<f32> = staves
            .iter()
            .filter_map(|s| score.page(s.page_index).map(|p| p.width_px as f32))
            .collect();
        let reference_width_px = median(page_widths);
        for stave in staves.iter_mut() {
            let page_width = score.page(stave.page_index).map(|p| p.width_px as f32).unwrap_or(reference_width_px);
            stave.width_scale = if page_width > 0.0 { reference_width_px / page_width } else { 1.0 };
            stave.scaled_height = stave.source_height() * stave.width_scale;
        }
        let median_height = median(staves.iter().map(|s| s.scaled_height).collect());

        let header = request.header.filter(|r| !r.is_empty()).map(|r| {
            let backend = rescale_rect(&r, score, request.display_width);
            Region {
                page_index: backend.page,
                top_y: backend.y as f32,
                bottom_y: (backend.y + backend.h) as f32,
                left_x: backend.x as f32,
                right_x: (backend.x + backend.w) as f32,
            }
        });

        let markings = attach_markings(name, &staves, request, score);
        apply_markings_overhead(&mut staves, &markings);

        parts.push(Part {
            name: name.clone(),
            layout: LayoutParams::defaulted(median_height, staves.len()),
            reference_stave_height: median_height,
            reference_width_px,
            staves,
            header,
            markings,
        });
    }

    parts
}

fn rescale_rect(rect: &Rectangle, score: &Score, display_width: u32) -> Rectangle {
    let scale = score
        .page(rect.page)
        .map(|p| display_to_backend_scale(p.width_px, display_width))
        .unwrap_or(1.0);
    rect.to_backend(scale)
}

fn median(mut values: Vec<f32>) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    values[values.len() / 2]
}

/// Reserves per-stave vertical margin for markings actually attached to
/// that stave by `attach_markings` — a marking straddling two adjacent
/// staves attaches to exactly one, so only that one gets the overhead.
/// The overhang itself is measured in the stave's native page pixels, then
/// scaled by `width_scale` to land in the same reference-width space as
/// `scaled_height`, since callers (pagination) add the two directly.
fn apply_markings_overhead(staves: &mut [StaffRegion], markings: &[(usize, Region)]) {
    for (index, stave) in staves.iter_mut().enumerate() {
        let overhead = markings
            .iter()
            .filter(|(i, _)| *i == index)
            .fold(0.0f32, |acc, (_, region)| {
                acc.max((stave.top_y - region.top_y).max(0.0))
                    .max((region.bottom_y - stave.bottom_y).max(0.0))
            });
        stave.markings_overhead_px = overhead * stave.width_scale;
    }
}

/// Attaches each marking rectangle placed on one of this Part's pages to
/// the StaffRegion whose Y-range it overlaps most, ties broken by smallest
/// centre-distance. Markings outside any stave's vertical range attach as
/// a page-level decoration on the first stave of that page.
fn attach_markings(
    _part_name: &str,
    staves: &[StaffRegion],
    request: &PartitionRequest,
    score: &Score,
) -> Vec<(usize, Region)> {
    let mut out = Vec::new();
    for marking in request.markings {
        if marking.is_empty() {
            continue;
        }
        let same_page: Vec<(usize, &StaffRegion)> = staves
            .iter()
            .enumerate()
            .filter(|(_, s)| s.page_index == marking.page)
            .collect();
        if same_page.is_empty() {
            continue;
        }
        let backend = rescale_rect(marking, score, request.display_width);
        let top = backend.top();
        let bottom = backend.bottom();
        let centre = (top + bottom) / 2.0;

        let best = same_page
            .iter()
            .map(|&(i, s)| {
                let overlap = s.overlap(top, bottom);
                let dist = (s.centre_y() - centre).abs();
                (i, overlap, dist)
            })
            .max_by(|a, b| {
                a.1.partial_cmp(&b.1)
                    .unwrap()
                    .then(b.2.partial_cmp(&a.2).unwrap())
            });

        let stave_index = match best {
            Some((i, overlap, _)) if overlap > 0.0 => i,
            _ => same_page[0].0,
        };

        out.push((
            stave_index,
            Region {
                page_index: backend.page,
                top_y: top,
                bottom_y: bottom,
                left_x: backend.x as f32,
                right_x: (backend.x + backend.w) as f32,
            },
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::score::Page;
    use std::sync::Arc;

    fn score_with_pages(n: usize, width: u32, height: u32) -> Score {
        let pages = (0..n)
            .map(|i| Page {
                index: i,
                width_px: width,
                height_px: height,
                raster: Arc::new(image::GrayImage::new(width, height)),
            })
            .collect();
        Score::new(pages)
    }

    fn divider_set(names: &[&str]) -> DividerSet {
        let n = names.len();
        let mut dividers = Vec::new();
        let mut flags = Vec::new();
        for i in 0..=n {
            dividers.push((i * 100) as f32);
            flags.push(false);
        }
        DividerSet {
            dividers,
            system_flags: flags,
            strip_names: names.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn partition_round_trip_groups_by_name_across_pages() {
        let score = score_with_pages(2, 1000, 1000);
        let mut pages = BTreeMap::new();
        pages.insert(0, divider_set(&["Vln", "Vc"]));
        pages.insert(1, divider_set(&["", ""]));

        let request = PartitionRequest {
            display_width: 1000,
            pages: &pages,
            header: None,
            markings: &[],
        };
        let parts = partition(&score, &request);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].name, "Vln");
        assert_eq!(parts[0].staves.len(), 1);
        assert_eq!(parts[1].name, "Vc");
        assert_eq!(parts[1].staves.len(), 1);
    }

    #[test]
    fn partition_is_idempotent() {
        let score = score_with_pages(1, 1000, 1000);
        let mut pages = BTreeMap::new();
        pages.insert(0, divider_set(&["Vln"]));
        let request = PartitionRequest {
            display_width: 1000,
            pages: &pages,
            header: None,
            markings: &[],
        };
        let first = partition(&score, &request);
        let second = partition(&score, &request);
        assert_eq!(first.len(), second.len());
        assert_eq!(first[0].name, second[0].name);
        assert_eq!(first[0].staves.len(), second[0].staves.len());
    }

    #[test]
    fn empty_strip_names_are_dropped() {
        let score = score_with_pages(1, 1000, 1000);
        let mut pages = BTreeMap::new();
        pages.insert(0, divider_set(&["", ""]));
        let request = PartitionRequest {
            display_width: 1000,
            pages: &pages,
            header: None,
            markings: &[],
        };
        assert!(partition(&score, &request).is_empty());
    }
}
