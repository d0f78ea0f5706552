use crate::domain::errors::CoreError;
use crate::domain::score::{Score, RASTER_DPI};
use crate::ports::raster_backend::PdfRasterBackend;

/// Given PDF bytes, produce one grayscale raster per page at the canonical
/// 300 DPI. Output is deterministic for a given input: the same bytes always
/// produce the same pixel dimensions and the same pixel data, since pdfium
/// rendering at a fixed scale factor is a pure function of the document.
pub fn rasterize(
    backend: &dyn PdfRasterBackend,
    pdf_bytes: &[u8],
    max_page_bytes: usize,
) -> Result<Score, CoreError> {
    if pdf_bytes.len() < 5 || &pdf_bytes[0..5] != b"%PDF-" {
        return Err(CoreError::InvalidInput(
            "input does not begin with a PDF header".into(),
        ));
    }
    let pages = backend.rasterize(pdf_bytes, RASTER_DPI, max_page_bytes)?;
    Ok(Score::new(pages))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_pdf_input() {
        struct NeverCalled;
        impl PdfRasterBackend for NeverCalled {
            fn rasterize(&self, _: &[u8], _: f32, _: usize) -> Result<Vec<crate::domain::score::Page>, CoreError> {
                panic!("backend should not be invoked for non-PDF input");
            }
        }
        let result = rasterize(&NeverCalled, b"not a pdf", usize::MAX);
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    }
}
