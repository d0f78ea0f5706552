use crate::domain::errors::CoreError;
use crate::domain::score::Page;
use crate::ports::raster_backend::PdfRasterBackend;
use pdfium_render::prelude::*;
use std::sync::Arc;

/// Points per inch in PDF page-space; pdfium's default render scale is 1
/// pixel per point, i.e. 72 DPI.
const POINTS_PER_INCH: f32 = 72.0;

/// Rasterises PDF pages through `pdfium-render`, converting the rendered
/// bitmap into an `image::GrayImage` via the `image` crate.
pub struct PdfiumRasterBackend {
    pdfium: Pdfium,
}

impl PdfiumRasterBackend {
    pub fn new() -> Result<Self, CoreError> {
        let bindings = Pdfium::bind_to_system_library()
            .or_else(|_| Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./")))
            .map_err(|e| CoreError::Internal(format!("failed to bind pdfium library: {e}")))?;
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl PdfRasterBackend for PdfiumRasterBackend {
    fn rasterize(&self, pdf_bytes: &[u8], dpi: f32, max_page_bytes: usize) -> Result<Vec<Page>, CoreError> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(pdf_bytes, None)
            .map_err(|e| CoreError::InvalidInput(format!("not a valid PDF: {e}")))?;

        let scale = dpi / POINTS_PER_INCH;
        let mut pages = Vec::with_capacity(document.pages().len() as usize);

        for (index, page) in document.pages().iter().enumerate() {
            let width_px = (page.width().value * scale).round() as u32;
            let height_px = (page.height().value * scale).round() as u32;

            let budget_check = width_px as usize * height_px as usize;
            if budget_check > max_page_bytes {
                return Err(CoreError::PageTooLarge { width_px, height_px });
            }

            let config = PdfRenderConfig::default().scale_page_by_factor(scale);
            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| CoreError::Internal(format!("pdfium render failed: {e}")))?;

            let gray = bitmap.as_image().into_luma8();
            pages.push(Page {
                index,
                width_px: gray.width(),
                height_px: gray.height(),
                raster: Arc::new(gray),
            });
        }

        Ok(pages)
    }
}
