//! PDF page rasterization using pdfium
//!
//! Produces one RGBA image per page at a requested DPI. This is the only
//! module that touches the pdfium library; everything downstream works on
//! plain `image` buffers.

use std::path::Path;

use image::RgbaImage;
use pdfium_render::prelude::*;

use crate::error::{Error, Result};

/// PDF points per inch - standard PostScript/PDF unit conversion factor
const PDF_POINTS_PER_INCH: f32 = 72.0;

/// Rasterizes PDF pages to RGBA images
pub struct PageRasterizer {
    pdfium: Pdfium,
}

impl PageRasterizer {
    /// Bind to the pdfium library: a copy next to the working directory is
    /// preferred, the system library is the fallback.
    pub fn new() -> Result<Self> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| Error::General(format!("pdfium library unavailable: {e}")))?;
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// Rasterize every page of the document at the given DPI.
    ///
    /// Failure to load or render any page aborts the whole operation; the
    /// caller gets either a complete page set or an error.
    pub fn rasterize(&self, path: &Path, dpi: u32) -> Result<Vec<RgbaImage>> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let document = self
            .pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| Error::UnreadableDocument {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let scale = dpi as f32 / PDF_POINTS_PER_INCH;
        let mut pages = Vec::with_capacity(document.pages().len() as usize);

        for (i, page) in document.pages().iter().enumerate() {
            let render_config = PdfRenderConfig::new()
                .set_target_width((page.width().value * scale) as i32)
                .set_target_height((page.height().value * scale) as i32);

            let bitmap =
                page.render_with_config(&render_config)
                    .map_err(|e| Error::UnreadableDocument {
                        path: path.to_path_buf(),
                        reason: format!("failed to render page {}: {e}", i + 1),
                    })?;

            pages.push(bitmap.as_image().to_rgba8());
        }

        if pages.is_empty() {
            return Err(Error::EmptyPdf(path.to_path_buf()));
        }

        Ok(pages)
    }
}
