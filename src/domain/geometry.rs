use serde::{Deserialize, Serialize, Serializer};

/// Rounds to 3 decimal places before serializing, so wire output is stable
/// across platforms regardless of float formatting quirks. Never round
/// earlier in a computation chain — only at the point a value leaves the
/// core.
pub fn round_f32<S>(value: &f32, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f32((value * 1000.0).round() / 1000.0)
}

/// A rectangle in display-pixel coordinates, as supplied by the external
/// collaborator (browser editor). `x`/`y` are the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub page: usize,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rectangle {
    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    pub fn top(&self) -> f32 {
        self.y as f32
    }

    pub fn bottom(&self) -> f32 {
        (self.y + self.h) as f32
    }

    /// Rescales this rectangle from display-pixel space into backend-pixel
    /// (300 DPI native) space.
    pub fn to_backend(&self, display_to_backend: f32) -> Rectangle {
        Rectangle {
            page: self.page,
            x: (self.x as f32 * display_to_backend).round() as i32,
            y: (self.y as f32 * display_to_backend).round() as i32,
            w: (self.w as f32 * display_to_backend).round() as i32,
            h: (self.h as f32 * display_to_backend).round() as i32,
        }
    }
}

/// The scale factor converting a caller's display-pixel space to backend
/// (300 DPI native) pixel space for one page: `page.width_px / display_width`.
pub fn display_to_backend_scale(page_width_px: u32, display_width: u32) -> f32 {
    page_width_px as f32 / display_width.max(1) as f32
}
