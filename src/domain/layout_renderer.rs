//! Paginates a Part's staves onto A4 output pages and renders the result to
//! a PDF. Pagination mirrors the two-pass greedy-assignment-then-justify
//! algorithm used for the preview logic exposed to the browser collaborator.

use crate::domain::errors::CoreError;
use crate::domain::part::Part;
use crate::domain::score::Score;
use image::{DynamicImage, GenericImage, GenericImageView};
use printpdf::{ImageTransform, Mm, PdfDocument};

const MM_PER_INCH: f32 = 25.4;

#[derive(Debug, Clone, Copy)]
pub struct RenderConfig {
    pub dpi: f32,
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_top_px: f32,
    pub margin_bottom_px: f32,
    /// Fixed strip reserved at the top of the first output page when the
    /// Part has a header.
    pub title_area_px: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let dpi = 300.0;
        Self {
            dpi,
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            margin_top_px: 0.5 * dpi,
            margin_bottom_px: 0.5 * dpi,
            title_area_px: 0.0,
        }
    }
}

impl RenderConfig {
    pub fn page_height_px(&self) -> f32 {
        self.page_height_mm / MM_PER_INCH * self.dpi
    }

    pub fn available_height_px(&self) -> f32 {
        self.page_height_px() - self.margin_top_px - self.margin_bottom_px
    }

    fn title_area_for_part(&self, part: &Part) -> f32 {
        if part.header.is_some() {
            self.title_area_px
        } else {
            0.0
        }
    }
}

struct PlacedStave {
    stave_index: usize,
    y: f32,
    gap_before: f32,
}

struct LayoutPage {
    staves: Vec<PlacedStave>,
    forced_break: bool,
}

/// Pass 1 (assignment) + Pass 2 (justify-on-forced-break). Pure, no I/O.
pub(crate) fn paginate(part: &Part, config: &RenderConfig) -> Result<Vec<LayoutPage>, CoreError> {
    if part.staves.is_empty() {
        return Err(CoreError::EmptyPart);
    }

    let available = config.available_height_px();
    let title_area = config.title_area_for_part(part);
    let breaks = part.layout.break_set();

    let mut pages: Vec<LayoutPage> = vec![LayoutPage { staves: Vec::new(), forced_break: false }];
    let mut y = title_area;

    for (i, stave) in part.staves.iter().enumerate() {
        let total_h = stave.scaled_height + stave.markings_overhead_px;
        if total_h > available {
            return Err(CoreError::LayoutOverflow { stave_h: total_h, available_h: available });
        }

        let current = pages.last_mut().unwrap();
        let gap = if current.staves.is_empty() {
            0.0
        } else {
            part.layout.spacing_px + part.layout.offset_for(i)
        };

        if !current.staves.is_empty() && y + gap + total_h > available {
            pages.push(LayoutPage { staves: Vec::new(), forced_break: false });
            y = 0.0;
            let current = pages.last_mut().unwrap();
            current.staves.push(PlacedStave { stave_index: i, y, gap_before: 0.0 });
            y += total_h;
        } else {
            y += gap;
            current.staves.push(PlacedStave { stave_index: i, y, gap_before: gap });
            y += total_h;
        }

        if breaks.contains(&i) {
            pages.last_mut().unwrap().forced_break = true;
            pages.push(LayoutPage { staves: Vec::new(), forced_break: false });
            y = 0.0;
        }
    }

    if pages.last().map(|p| p.staves.is_empty()).unwrap_or(false) {
        pages.pop();
    }

    // Pass 2: justify pages that ended on a forced break by distributing
    // the remaining space evenly into the inter-stave gaps, so a short
    // final page does not look ragged.
    for page in pages.iter_mut() {
        if !page.forced_break || page.staves.len() < 2 {
            continue;
        }
        let last_bottom = {
            let last = page.staves.last().unwrap();
            let stave = &part.staves[last.stave_index];
            last.y + stave.scaled_height + stave.markings_overhead_px
        };
        let slack = (available - last_bottom).max(0.0);
        if slack <= 0.0 {
            continue;
        }
        let gap_slots = (page.staves.len() - 1) as f32;
        let extra_per_gap = slack / gap_slots;
        let mut cursor = 0.0f32;
        for (idx, placed) in page.staves.iter_mut().enumerate() {
            let stave = &part.staves[placed.stave_index];
            if idx == 0 {
                cursor = placed.y;
            } else {
                cursor += placed.gap_before + extra_per_gap;
            }
            placed.y = cursor;
            cursor += stave.scaled_height + stave.markings_overhead_px;
        }
    }

    Ok(pages)
}

/// Number of output pages a Part will occupy under the given config,
/// without rendering any PDF content.
pub fn page_count(part: &Part, config: &RenderConfig) -> Result<usize, CoreError> {
    Ok(paginate(part, config)?.len())
}

/// Renders a Part to a paginated A4 PDF. Embeds each cropped stave (and any
/// attached markings/header) as a PDF image object; nothing is rasterised
/// from text.
pub fn render(score: &Score, part: &Part, config: &RenderConfig) -> Result<Vec<u8>, CoreError> {
    let pages = paginate(part, config)?;

    let doc = PdfDocument::empty(&part.name);
    let page_refs: Vec<(printpdf::PdfPageIndex, printpdf::PdfLayerIndex)> = (0..pages.len())
        .map(|n| doc.add_page(Mm(config.page_width_mm), Mm(config.page_height_mm), format!("layer-{n}")))
        .collect();

    let px_to_mm = MM_PER_INCH / config.dpi;

    for (page_idx, layout_page) in pages.iter().enumerate() {
        let (pdf_page, pdf_layer) = page_refs[page_idx];
        let layer = doc.get_page(pdf_page).get_layer(pdf_layer);

        if page_idx == 0 {
            if let Some(header) = part.header {
                if let Some(source_page) = score.page(header.page_index) {
                    if let Some(cropped) = crop(source_page.raster.as_ref(), header.left_x, header.top_y, header.right_x, header.bottom_y) {
                        let (w, h) = (cropped.width() as f32, cropped.height() as f32);
                        blit(&layer, &cropped, 0.0, 0.0, w, h, px_to_mm, config.page_height_mm);
                    }
                }
            }
        }

        for placed in &layout_page.staves {
            let stave = &part.staves[placed.stave_index];
            let Some(source_page) = score.page(stave.page_index) else { continue };
            let x1 = source_page.width_px as f32;
            let width_scale = stave.width_scale;
            if let Some(cropped) = crop(source_page.raster.as_ref(), 0.0, stave.top_y, x1, stave.bottom_y) {
                blit(&layer, &cropped, 0.0, placed.y, part.reference_width_px, stave.scaled_height, px_to_mm, config.page_height_mm);
            }

            for marking in part.markings_for_stave(placed.stave_index) {
                if let Some(source) = score.page(marking.page_index) {
                    if let Some(cropped) = crop(source.raster.as_ref(), marking.left_x, marking.top_y, marking.right_x, marking.bottom_y) {
                        let offset_in_stave = marking.top_y - stave.top_y;
                        let (w, h) = (cropped.width() as f32 * width_scale, cropped.height() as f32 * width_scale);
                        blit(
                            &layer,
                            &cropped,
                            marking.left_x * width_scale,
                            placed.y + offset_in_stave * width_scale,
                            w,
                            h,
                            px_to_mm,
                            config.page_height_mm,
                        );
                    }
                }
            }
        }
    }

    doc.save_to_bytes()
        .map_err(|e| CoreError::Internal(format!("pdf emission failed: {e}")))
}

fn crop(raster: &image::GrayImage, x0: f32, y0: f32, x1: f32, y1: f32) -> Option<DynamicImage> {
    let (w, h) = raster.dimensions();
    let x0 = x0.max(0.0) as u32;
    let y0 = y0.max(0.0) as u32;
    let x1 = (x1.min(w as f32)) as u32;
    let y1 = (y1.min(h as f32)) as u32;
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    let mut out = image::GrayImage::new(x1 - x0, y1 - y0);
    out.copy_from(&raster.view(x0, y0, x1 - x0, y1 - y0), 0, 0).ok()?;
    Some(DynamicImage::ImageLuma8(out))
}

/// Blits `img` at `(x_px, y_px)`, scaled from its native pixel dimensions
/// to `target_w_px` x `target_h_px`.
fn blit(
    layer: &printpdf::PdfLayerReference,
    img: &DynamicImage,
    x_px: f32,
    y_px: f32,
    target_w_px: f32,
    target_h_px: f32,
    px_to_mm: f32,
    page_height_mm: f32,
) {
    let pdf_image = printpdf::Image::from_dynamic_image(img);
    let height_mm = target_h_px * px_to_mm;
    let scale_x = if img.width() > 0 { target_w_px / img.width() as f32 } else { 1.0 };
    let scale_y = if img.height() > 0 { target_h_px / img.height() as f32 } else { 1.0 };
    pdf_image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x_px * px_to_mm)),
            translate_y: Some(Mm(page_height_mm - y_px * px_to_mm - height_mm)),
            scale_x: Some(scale_x),
            scale_y: Some(scale_y),
            dpi: Some(MM_PER_INCH / px_to_mm),
            ..Default::default()
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::part::LayoutParams;
    use crate::domain::region::StaffRegion;
    use crate::domain::score::Page;
    use std::sync::Arc;

    fn make_part(stave_count: usize, scaled_height: f32, spacing: f32, breaks: Vec<usize>) -> Part {
        let staves = (0..stave_count)
            .map(|i| StaffRegion {
                page_index: 0,
                top_y: i as f32 * 500.0,
                bottom_y: i as f32 * 500.0 + scaled_height,
                scaled_height,
                markings_overhead_px: 0.0,
                width_scale: 1.0,
            })
            .collect::<Vec<_>>();
        Part {
            name: "Test".into(),
            reference_stave_height: scaled_height,
            reference_width_px: 1000.0,
            header: None,
            markings: Vec::new(),
            layout: LayoutParams {
                spacing_px: spacing,
                offsets_px: vec![0.0; stave_count],
                page_breaks_after: breaks,
            },
            staves,
        }
    }

    #[test]
    fn ten_staves_paginate_seven_and_three() {
        // available_height_px = 3300 at 300 DPI (A4 minus margins configured
        // to make the arithmetic in spec scenario 5 land exactly).
        let mut config = RenderConfig {
            dpi: 300.0,
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            margin_top_px: 0.0,
            margin_bottom_px: 0.0,
            title_area_px: 0.0,
        };
        config.margin_bottom_px = config.page_height_px() - 3300.0;

        let part = make_part(10, 400.0, 480.0, vec![]);
        let pages = paginate(&part, &config).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].staves.len(), 7);
        assert_eq!(pages[1].staves.len(), 3);
    }

    #[test]
    fn forced_break_starts_new_page_at_stave_three() {
        let mut config = RenderConfig {
            dpi: 300.0,
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            margin_top_px: 0.0,
            margin_bottom_px: 0.0,
            title_area_px: 0.0,
        };
        config.margin_bottom_px = config.page_height_px() - 3300.0;

        let part = make_part(10, 400.0, 480.0, vec![2]);
        let pages = paginate(&part, &config).unwrap();
        assert_eq!(pages[0].staves.len(), 3);
        assert!(pages[0].forced_break);
        assert_eq!(pages[1].staves[0].stave_index, 3);
    }

    #[test]
    fn empty_part_is_an_error() {
        let part = make_part(0, 400.0, 480.0, vec![]);
        let result = paginate(&part, &RenderConfig::default());
        assert!(matches!(result, Err(CoreError::EmptyPart)));
    }

    #[test]
    fn oversized_stave_is_layout_overflow() {
        let part = make_part(1, 100_000.0, 480.0, vec![]);
        let result = paginate(&part, &RenderConfig::default());
        assert!(matches!(result, Err(CoreError::LayoutOverflow { .. })));
    }

    #[allow(dead_code)]
    fn unused_page_for_raster_sanity_check() -> Page {
        Page {
            index: 0,
            width_px: 1,
            height_px: 1,
            raster: Arc::new(image::GrayImage::new(1, 1)),
        }
    }
}
