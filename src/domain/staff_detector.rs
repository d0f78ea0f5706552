//! Projection-profile staff detection (spec §4.2 of the original design
//! notes this module grew from). Never raises: adversarial or blank input
//! degrades to a low-confidence empty result rather than an error.

use image::GrayImage;
use serde::{Deserialize, Serialize};

/// How the page is binarised before projection. Spec notes this choice is
/// immaterial to downstream phases; fixed is the default for determinism
/// and speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Binarization {
    Fixed(u8),
    Otsu,
}

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub binarization: Binarization,
    /// Row ranges whose barline signal falls below this fraction of the
    /// signal's maximum are candidate system gaps.
    pub low_signal_fraction: f32,
    /// Low-signal runs closer than this multiple of the estimated stave
    /// span are merged, to bridge tapered barline ends.
    pub band_merge_factor: f32,
    /// A system band shorter than this multiple of the estimated stave
    /// span is considered spurious.
    pub min_band_factor: f32,
    /// Peak threshold: `mean + peak_k * stddev`.
    pub peak_k: f32,
    /// Minimum separation between accepted peaks, as a fraction of the
    /// expected inter-line distance estimate.
    pub peak_min_sep_factor: f32,
    /// Tolerance (as a fraction) for successive peak gaps to be considered
    /// part of the same stave.
    pub gap_tolerance: f32,
    /// Width of the left-margin strip scanned for the barline signal, as a
    /// fraction of page width.
    pub barline_strip_width_frac: f32,
    /// Half-width, in pixels, of the jitter window scanned around a
    /// candidate barline X for confirmation.
    pub barline_jitter_px: i32,
    /// Fraction of a system's height a continuous inky run must span to
    /// confirm its barline.
    pub barline_min_run_fraction: f32,
    pub weight_barline: f32,
    pub weight_gap: f32,
    pub weight_stave: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            binarization: Binarization::Fixed(128),
            low_signal_fraction: 0.05,
            band_merge_factor: 1.5,
            min_band_factor: 2.0,
            peak_k: 1.0,
            peak_min_sep_factor: 0.5,
            gap_tolerance: 0.30,
            barline_strip_width_frac: 0.03,
            barline_jitter_px: 10,
            barline_min_run_fraction: 0.8,
            weight_barline: 0.50,
            weight_gap: 0.25,
            weight_stave: 0.25,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionResult {
    pub dividers: Vec<f32>,
    pub system_flags: Vec<bool>,
    pub strip_names: Vec<String>,
    pub confidence: f32,
}

impl DetectionResult {
    fn empty() -> Self {
        Self::default()
    }
}

/// Entry point: run all four phases against one rasterised page, at
/// backend-pixel (native DPI) resolution. The caller rescales to
/// display-pixel space afterwards.
pub fn detect(page: &GrayImage, config: &DetectorConfig) -> DetectionResult {
    let threshold = resolve_threshold(page, config.binarization);
    let width = page.width() as usize;
    let height = page.height() as usize;
    if width == 0 || height == 0 {
        return DetectionResult::empty();
    }

    let h_projection = horizontal_projection(page, threshold);
    if h_projection.iter().all(|&v| v == 0) {
        return DetectionResult::empty();
    }

    let coarse_peaks = find_peaks(&h_projection, config.peak_k, estimate_min_sep(&h_projection, config));
    if coarse_peaks.is_empty() {
        return DetectionResult::empty();
    }
    let stave_span = estimate_stave_span(&coarse_peaks);

    let barline_signal = barline_vertical_signal(page, threshold, config.barline_strip_width_frac);
    let bands = segment_system_bands(&barline_signal, &coarse_peaks, stave_span, height, config);

    let mut staves: Vec<StaveCandidate> = Vec::new();
    for band in &bands {
        let band_peaks: Vec<usize> = coarse_peaks
            .iter()
            .copied()
            .filter(|&p| p >= band.start && p < band.end)
            .collect();
        let min_sep = ((stave_span / 4.0) * config.peak_min_sep_factor).max(1.0) as usize;
        let band_peaks = if band_peaks.len() >= 2 {
            band_peaks
        } else {
            find_peaks(&h_projection[band.start..band.end], config.peak_k, min_sep)
                .into_iter()
                .map(|p| p + band.start)
                .collect()
        };
        staves.extend(cluster_staves(&band_peaks, config.gap_tolerance, band.index));
    }

    if staves.is_empty() {
        return DetectionResult::empty();
    }

    let systems = assemble_systems(&staves, &bands, config);
    if systems.is_empty() {
        return DetectionResult::empty();
    }

    let confirmed = confirm_barlines(page, threshold, &systems, config);

    let (dividers, system_flags) = place_dividers(&systems);
    let strip_names = vec![String::new(); dividers.len().saturating_sub(1)];

    let confidence = blend_confidence(&systems, &confirmed, config);

    DetectionResult {
        dividers,
        system_flags,
        strip_names,
        confidence,
    }
}

fn resolve_threshold(page: &GrayImage, binarization: Binarization) -> u8 {
    match binarization {
        Binarization::Fixed(t) => t,
        Binarization::Otsu => otsu_threshold(page),
    }
}

fn otsu_threshold(page: &GrayImage) -> u8 {
    let mut histogram = [0u32; 256];
    for p in page.pixels() {
        histogram[p.0[0] as usize] += 1;
    }
    let total = page.width() as f64 * page.height() as f64;
    if total == 0.0 {
        return 128;
    }
    let sum_all: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut sum_bg = 0.0;
    let mut weight_bg = 0.0;
    let mut best_variance = 0.0;
    let mut best_threshold = 128u8;

    for t in 0..256 {
        weight_bg += histogram[t] as f64;
        if weight_bg == 0.0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg <= 0.0 {
            break;
        }
        sum_bg += t as f64 * histogram[t] as f64;
        let mean_bg = sum_bg / weight_bg;
        let mean_fg = (sum_all - sum_bg) / weight_fg;
        let variance = weight_bg * weight_fg * (mean_bg - mean_fg).powi(2);
        if variance > best_variance {
            best_variance = variance;
            best_threshold = t as u8;
        }
    }
    best_threshold
}

/// Sum of dark pixels (value < threshold) across each full row. Darker =
/// ink; "dark" means below threshold.
fn horizontal_projection(page: &GrayImage, threshold: u8) -> Vec<u32> {
    let width = page.width();
    let height = page.height();
    let mut projection = vec![0u32; height as usize];
    for y in 0..height {
        let mut count = 0u32;
        for x in 0..width {
            if page.get_pixel(x, y).0[0] < threshold {
                count += 1;
            }
        }
        projection[y as usize] = count;
    }
    projection
}

/// Sum of dark pixels within the leftmost `strip_width_frac` of the page,
/// per row — the signal that carries every system's leftmost barline.
fn barline_vertical_signal(page: &GrayImage, threshold: u8, strip_width_frac: f32) -> Vec<u32> {
    let width = page.width();
    let height = page.height();
    let strip_width = ((width as f32 * strip_width_frac).round() as u32).max(1).min(width);
    let mut signal = vec![0u32; height as usize];
    for y in 0..height {
        let mut count = 0u32;
        for x in 0..strip_width {
            if page.get_pixel(x, y).0[0] < threshold {
                count += 1;
            }
        }
        signal[y as usize] = count;
    }
    signal
}

fn estimate_min_sep(projection: &[u32], config: &DetectorConfig) -> usize {
    // A coarse pass needs some nonzero separation to avoid treating every
    // row of a thick staff line as its own peak; refined per-band once the
    // stave span is known.
    let _ = config;
    (projection.len() / 200).max(2)
}

/// Local maxima above `mean + k*stddev`, spaced at least `min_sep` apart.
fn find_peaks(projection: &[u32], k: f32, min_sep: usize) -> Vec<usize> {
    if projection.is_empty() {
        return Vec::new();
    }
    let n = projection.len() as f64;
    let mean = projection.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = projection
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    let stddev = variance.sqrt();
    let threshold = mean + (k as f64) * stddev;

    let mut candidates: Vec<(usize, u32)> = projection
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v as f64 > threshold)
        .map(|(i, &v)| (i, v))
        .collect();
    candidates.sort_by(|a, b| b.1.cmp(&a.1));

    let mut accepted: Vec<usize> = Vec::new();
    for (idx, _) in candidates {
        if accepted.iter().all(|&a| idx.abs_diff(a) >= min_sep) {
            accepted.push(idx);
        }
    }
    accepted.sort_unstable();
    accepted
}

/// Rough span of one stave (top line to bottom line) from the full-page
/// peak set: four times the median gap between consecutive peaks.
fn estimate_stave_span(peaks: &[usize]) -> f32 {
    if peaks.len() < 2 {
        return 40.0;
    }
    let mut gaps: Vec<usize> = peaks.windows(2).map(|w| w[1] - w[0]).collect();
    gaps.sort_unstable();
    let median_gap = gaps[gaps.len() / 2] as f32;
    (median_gap * 4.0).max(1.0)
}

struct Band {
    index: usize,
    start: usize,
    end: usize,
}

/// Phase A: split the page into system bands by finding barline-signal
/// low-signal runs that do not overlap a staff-line peak, merging runs
/// closer than `band_merge_factor * stave_span`.
fn segment_system_bands(
    barline_signal: &[u32],
    staff_peaks: &[usize],
    stave_span: f32,
    page_height: usize,
    config: &DetectorConfig,
) -> Vec<Band> {
    let max_signal = *barline_signal.iter().max().unwrap_or(&0);
    if max_signal == 0 {
        return vec![Band { index: 0, start: 0, end: page_height }];
    }
    let cutoff = (max_signal as f32 * config.low_signal_fraction).max(1.0);

    let mut runs: Vec<(usize, usize)> = Vec::new();
    let mut run_start: Option<usize> = None;
    for (y, &signal) in barline_signal.iter().enumerate() {
        if (signal as f32) < cutoff {
            run_start.get_or_insert(y);
        } else if let Some(start) = run_start.take() {
            runs.push((start, y));
        }
    }
    if let Some(start) = run_start {
        runs.push((start, barline_signal.len()));
    }

    // Merge runs closer than band_merge_factor * stave_span.
    let merge_gap = (stave_span * config.band_merge_factor) as usize;
    let mut merged: Vec<(usize, usize)> = Vec::new();
    for run in runs {
        if let Some(last) = merged.last_mut() {
            if run.0.saturating_sub(last.1) <= merge_gap {
                last.1 = run.1;
                continue;
            }
        }
        merged.push(run);
    }

    // Drop runs that overlap a staff-line peak: those are within-system
    // gaps, not system boundaries.
    let surviving: Vec<(usize, usize)> = merged
        .into_iter()
        .filter(|&(start, end)| !staff_peaks.iter().any(|&p| p >= start && p < end))
        .collect();

    let mut bands: Vec<Band> = Vec::new();
    let mut cursor = 0usize;
    for (start, end) in &surviving {
        if *start > cursor {
            bands.push(Band { index: 0, start: cursor, end: *start });
        }
        cursor = *end;
    }
    if cursor < page_height {
        bands.push(Band { index: 0, start: cursor, end: page_height });
    }

    let min_band_len = (stave_span * config.min_band_factor) as usize;
    let bands: Vec<Band> = bands.into_iter().filter(|b| b.end - b.start >= min_band_len).collect();

    let bands = if bands.is_empty() {
        vec![Band { index: 0, start: 0, end: page_height }]
    } else {
        bands
    };

    bands
        .into_iter()
        .enumerate()
        .map(|(i, b)| Band { index: i, start: b.start, end: b.end })
        .collect()
}

#[derive(Debug, Clone)]
struct StaveCandidate {
    top_peak_y: f32,
    bottom_peak_y: f32,
    peak_count: usize,
    band_index: usize,
}

impl StaveCandidate {
    fn centre_y(&self) -> f32 {
        (self.top_peak_y + self.bottom_peak_y) / 2.0
    }
}

/// Phase B: cluster a band's peaks into staves of ~5 roughly-equidistant
/// lines, with a single relaxed-tolerance retry ("squint rescue") when the
/// strict pass only almost succeeds.
fn cluster_staves(peaks: &[usize], tolerance: f32, band_index: usize) -> Vec<StaveCandidate> {
    let strict = cluster_staves_with_tolerance(peaks, tolerance, band_index);
    if !strict.is_empty() {
        return strict;
    }
    // Squint rescue: a band that yields only a near-miss cluster (4 peaks,
    // or 5 with one outlier gap) gets one relaxed retry.
    cluster_staves_with_tolerance(peaks, tolerance * 2.0, band_index)
}

fn cluster_staves_with_tolerance(peaks: &[usize], tolerance: f32, band_index: usize) -> Vec<StaveCandidate> {
    let mut out = Vec::new();
    if peaks.len() < 4 {
        return out;
    }
    let mut i = 0;
    while i + 1 < peaks.len() {
        let mut group = vec![peaks[i]];
        let mut j = i + 1;
        while j < peaks.len() && group.len() < 5 {
            let gap = (peaks[j] - group[group.len() - 1]) as f32;
            if group.len() == 1 {
                group.push(peaks[j]);
                j += 1;
                continue;
            }
            let prev_gap = (group[group.len() - 1] - group[group.len() - 2]) as f32;
            if prev_gap > 0.0 && ((gap - prev_gap).abs() / prev_gap) <= tolerance {
                group.push(peaks[j]);
                j += 1;
            } else {
                break;
            }
        }
        if group.len() >= 4 {
            out.push(StaveCandidate {
                top_peak_y: *group.first().unwrap() as f32,
                bottom_peak_y: *group.last().unwrap() as f32,
                peak_count: group.len(),
                band_index,
            });
            i = j;
        } else {
            i += 1;
        }
    }
    out
}

#[derive(Debug, Clone)]
struct SystemCandidate {
    staves: Vec<StaveCandidate>,
    top_y: f32,
    bottom_y: f32,
    /// Distance from the nearest boundary above this system (a Phase-A band
    /// start in the balanced path, the previous system's bottom in the
    /// gap-clustered path) down to `top_y`. `place_dividers` halves this to
    /// get the opening divider's margin, so it must come from whichever
    /// assembly path actually built the system, never from a positional
    /// re-lookup into `bands`.
    opening_gap: f32,
}

/// Phase C: assign staves to systems. Trust the per-band assembly if every
/// band has an equal, ≥2 stave count; otherwise fall back to clustering by
/// the gap between consecutive stave centres.
fn assemble_systems(staves: &[StaveCandidate], bands: &[Band], _config: &DetectorConfig) -> Vec<SystemCandidate> {
    let mut by_band: Vec<Vec<&StaveCandidate>> = vec![Vec::new(); bands.len()];
    for s in staves {
        if let Some(bucket) = by_band.get_mut(s.band_index) {
            bucket.push(s);
        }
    }

    let counts: Vec<usize> = by_band.iter().map(|b| b.len()).collect();
    let balanced = !counts.is_empty()
        && counts.iter().all(|&c| c == counts[0])
        && counts[0] >= 2;

    if balanced {
        return by_band
            .into_iter()
            .enumerate()
            .filter(|(_, b)| !b.is_empty())
            .map(|(band_index, b)| {
                let mut system = build_system(b.into_iter().cloned().collect());
                let band_start = bands.get(band_index).map(|band| band.start as f32).unwrap_or(system.top_y);
                system.opening_gap = (system.top_y - band_start).max(0.0);
                system
            })
            .collect();
    }

    cluster_by_gap(staves)
}

fn build_system(mut staves: Vec<StaveCandidate>) -> SystemCandidate {
    staves.sort_by(|a, b| a.centre_y().partial_cmp(&b.centre_y()).unwrap());
    let top_y = staves.first().map(|s| s.top_peak_y).unwrap_or(0.0);
    let bottom_y = staves.last().map(|s| s.bottom_peak_y).unwrap_or(0.0);
    SystemCandidate { staves, top_y, bottom_y, opening_gap: 0.0 }
}

/// Fallback system assembly used when band occupancy is uneven. Systems
/// here have no positional relationship to the Phase-A bands, so the
/// opening margin is derived purely from this function's own gap analysis:
/// half the gap to the previous system, or zero for the first system (no
/// earlier boundary to measure from).
fn cluster_by_gap(staves: &[StaveCandidate]) -> Vec<SystemCandidate> {
    let mut sorted: Vec<StaveCandidate> = staves.to_vec();
    sorted.sort_by(|a, b| a.centre_y().partial_cmp(&b.centre_y()).unwrap());
    if sorted.is_empty() {
        return Vec::new();
    }

    let gaps: Vec<f32> = sorted.windows(2).map(|w| w[1].centre_y() - w[0].centre_y()).collect();
    let median_gap = if gaps.is_empty() {
        0.0
    } else {
        let mut g = gaps.clone();
        g.sort_by(|a, b| a.partial_cmp(b).unwrap());
        g[g.len() / 2]
    };

    let mut systems: Vec<Vec<StaveCandidate>> = vec![vec![sorted[0].clone()]];
    for (i, gap) in gaps.iter().enumerate() {
        if median_gap > 0.0 && *gap > 2.0 * median_gap {
            systems.push(Vec::new());
        }
        systems.last_mut().unwrap().push(sorted[i + 1].clone());
    }

    let mut built: Vec<SystemCandidate> = systems.into_iter().map(build_system).collect();
    for i in 1..built.len() {
        built[i].opening_gap = (built[i].top_y - built[i - 1].bottom_y).max(0.0);
    }
    built
}

struct ConfirmedSystem {
    confirmed: bool,
}

/// Phase C (continued): confirm each system's barline by locating the
/// leftmost dense column cluster and checking for a continuous inky run
/// spanning most of the system's height.
fn confirm_barlines(
    page: &GrayImage,
    threshold: u8,
    systems: &[SystemCandidate],
    config: &DetectorConfig,
) -> Vec<ConfirmedSystem> {
    let width = page.width();
    systems
        .iter()
        .map(|system| {
            let top = system.top_y.max(0.0) as u32;
            let bottom = (system.bottom_y.min(page.height() as f32 - 1.0)).max(top as f32) as u32;
            let height = (bottom - top).max(1);

            // Vertical projection over the system's row range, to find the
            // leftmost dense column cluster.
            let scan_width = (width / 4).max(1);
            let mut col_signal = vec![0u32; scan_width as usize];
            for x in 0..scan_width {
                let mut count = 0u32;
                for y in top..=bottom {
                    if page.get_pixel(x, y).0[0] < threshold {
                        count += 1;
                    }
                }
                col_signal[x as usize] = count;
            }
            let densest = col_signal
                .iter()
                .enumerate()
                .filter(|&(_, &c)| c as f32 > 0.5 * height as f32)
                .map(|(x, _)| x)
                .next();

            let confirmed = match densest {
                Some(x0) => {
                    let jitter = config.barline_jitter_px.max(1) as u32;
                    let x_lo = x0.saturating_sub(jitter as usize) as u32;
                    let x_hi = (x0 as u32 + jitter).min(width.saturating_sub(1));
                    let mut best_run = 0u32;
                    for x in x_lo..=x_hi {
                        let mut run = 0u32;
                        let mut best_here = 0u32;
                        for y in top..=bottom {
                            if page.get_pixel(x, y).0[0] < threshold {
                                run += 1;
                                best_here = best_here.max(run);
                            } else {
                                run = 0;
                            }
                        }
                        best_run = best_run.max(best_here);
                    }
                    (best_run as f32) >= config.barline_min_run_fraction * height as f32
                }
                None => false,
            };

            ConfirmedSystem { confirmed }
        })
        .collect()
}

/// Produces the divider/system-flag arrays described in spec §4.2 Phase C:
/// a system-boundary divider above each system's first stave, a part
/// divider at the midpoint between consecutive staves of one system, and a
/// closing divider after the last stave of the last system.
fn place_dividers(systems: &[SystemCandidate]) -> (Vec<f32>, Vec<bool>) {
    let mut dividers = Vec::new();
    let mut flags = Vec::new();

    for system in systems {
        let margin = system.opening_gap / 2.0;
        dividers.push(system.top_y - margin);
        flags.push(true);

        for pair in system.staves.windows(2) {
            let midpoint = (pair[0].bottom_peak_y + pair[1].top_peak_y) / 2.0;
            dividers.push(midpoint);
            flags.push(false);
        }
    }

    if let Some(last) = systems.last() {
        dividers.push(last.bottom_y);
        flags.push(false);
    }

    (dividers, flags)
}

fn blend_confidence(systems: &[SystemCandidate], confirmed: &[ConfirmedSystem], config: &DetectorConfig) -> f32 {
    if systems.is_empty() {
        return 0.0;
    }

    let confirmed_count = confirmed.iter().filter(|c| c.confirmed).count();
    let barline_fraction = confirmed_count as f32 / systems.len() as f32;

    let gaps: Vec<f32> = systems
        .windows(2)
        .map(|w| w[1].top_y - w[0].bottom_y)
        .collect();
    let gap_consistency = if gaps.len() < 2 {
        1.0
    } else {
        let mean = gaps.iter().sum::<f32>() / gaps.len() as f32;
        if mean <= 0.0 {
            0.0
        } else {
            let variance = gaps.iter().map(|g| (g - mean).powi(2)).sum::<f32>() / gaps.len() as f32;
            let cv = variance.sqrt() / mean;
            (1.0 - cv).clamp(0.0, 1.0)
        }
    };

    let total_staves: usize = systems.iter().map(|s| s.staves.len()).sum();
    let orphans = systems
        .iter()
        .flat_map(|s| s.staves.iter())
        .filter(|st| st.peak_count < 5 || s_has_single_stave(systems, st))
        .count();
    let orphan_penalty = if total_staves == 0 { 1.0 } else { orphans as f32 / total_staves as f32 };
    let stave_quality = (1.0 - orphan_penalty).clamp(0.0, 1.0);

    (config.weight_barline * barline_fraction
        + config.weight_gap * gap_consistency
        + config.weight_stave * stave_quality)
        .clamp(0.0, 1.0)
}

fn s_has_single_stave(systems: &[SystemCandidate], candidate: &StaveCandidate) -> bool {
    systems
        .iter()
        .any(|s| s.staves.len() == 1 && s.staves.iter().any(|st| (st.centre_y() - candidate.centre_y()).abs() < 0.01))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    /// Draws `count` evenly-spaced 2px-thick horizontal lines starting at
    /// `top`, `line_gap` apart, spanning `[x0, x1)`.
    fn draw_stave(img: &mut GrayImage, top: u32, line_gap: u32, x0: u32, x1: u32) {
        for line in 0..5 {
            let y = top + line * line_gap;
            for dy in 0..2 {
                for x in x0..x1 {
                    img.put_pixel(x, y + dy, Luma([0]));
                }
            }
        }
    }

    fn draw_vline(img: &mut GrayImage, x: u32, y0: u32, y1: u32) {
        for y in y0..y1 {
            for dx in 0..3 {
                img.put_pixel(x + dx, y, Luma([0]));
            }
        }
    }

    #[test]
    fn blank_page_yields_zero_confidence() {
        let page = GrayImage::from_pixel(2480, 3508, Luma([255]));
        let result = detect(&page, &DetectorConfig::default());
        assert!(result.dividers.is_empty());
        assert!(result.system_flags.is_empty());
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn single_system_four_equal_staves() {
        let mut page = GrayImage::from_pixel(2480, 3508, Luma([255]));
        let left_margin = 150;
        let right_edge = 2330;
        let tops = [400u32, 700, 1000, 1300];
        for &top in &tops {
            draw_stave(&mut page, top, 40, left_margin, right_edge);
        }
        draw_vline(&mut page, left_margin, tops[0], tops[3] + 160);

        let result = detect(&page, &DetectorConfig::default());
        assert_eq!(result.dividers.len(), 5);
        assert!(result.system_flags.iter().filter(|&&f| f).count() >= 1);
        assert!(result.confidence >= 0.9, "confidence was {}", result.confidence);
    }

    #[test]
    fn two_systems_three_staves_each() {
        let mut page = GrayImage::from_pixel(2480, 3508, Luma([255]));
        let left_margin = 150;
        let right_edge = 2330;

        let system_a_tops = [300u32, 600, 900];
        for &top in &system_a_tops {
            draw_stave(&mut page, top, 40, left_margin, right_edge);
        }
        draw_vline(&mut page, left_margin, system_a_tops[0], system_a_tops[2] + 160);

        let system_b_tops = [1600u32, 1900, 2200];
        for &top in &system_b_tops {
            draw_stave(&mut page, top, 40, left_margin + 20, right_edge);
        }
        draw_vline(&mut page, left_margin + 20, system_b_tops[0], system_b_tops[2] + 160);

        let result = detect(&page, &DetectorConfig::default());
        assert_eq!(result.dividers.len(), 8);
        assert_eq!(
            result.system_flags,
            vec![true, false, false, false, true, false, false, false]
        );
    }
}
