use crate::domain::errors::CoreError;
use crate::domain::score::Page;

/// Port for turning PDF bytes into rasterised pages. Keeps the detector and
/// planner free of any concrete PDF library dependency.
pub trait PdfRasterBackend: Send + Sync {
    /// Rasterise every page of `pdf_bytes` at `dpi`, rejecting pages whose
    /// raster would exceed `max_page_bytes`.
    fn rasterize(&self, pdf_bytes: &[u8], dpi: f32, max_page_bytes: usize) -> Result<Vec<Page>, CoreError>;
}
