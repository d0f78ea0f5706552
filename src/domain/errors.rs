use thiserror::Error;

/// Core error taxonomy. Input faults and resource limits are surfaced to the
/// caller verbatim; `Internal` is a programmer-bug catch-all, logged with
/// full detail and returned as a generic message.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("page would exceed raster memory budget: {width_px}x{height_px} px")]
    PageTooLarge { width_px: u32, height_px: u32 },

    #[error("unknown score id: {0}")]
    UnknownScoreId(String),

    #[error("part has no live staff regions")]
    EmptyPart,

    #[error("stave height {stave_h} exceeds available page height {available_h}")]
    LayoutOverflow { stave_h: f32, available_h: f32 },

    #[error("score cache exhausted: cannot fit {requested_bytes} bytes within budget")]
    CacheExhausted { requested_bytes: usize },

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// True for client faults that should never be retried as-is.
    pub fn is_input_fault(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidInput(_) | CoreError::UnknownScoreId(_) | CoreError::EmptyPart
        )
    }

    /// True for resource limits the caller may retry after backing off.
    pub fn is_resource_limit(&self) -> bool {
        matches!(
            self,
            CoreError::PageTooLarge { .. } | CoreError::CacheExhausted { .. }
        )
    }
}
