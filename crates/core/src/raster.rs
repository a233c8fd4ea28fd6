//! Per-page raster cache at the current display scale.
//!
//! Bitmaps are keyed by 1-based page number and valid only for the scale
//! they were rendered at; a scale change drops the whole cache. A page
//! that fails to render stays uncached and the error is reported for that
//! page alone.

use crate::document::FormDocument;
use crate::geometry::Scale;
use pdf_engine::{PdfEngine, PdfEngineError, RasterRequest, RgbaImage};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct PageRasterCache {
    scale: Scale,
    bitmaps: HashMap<u16, RgbaImage>,
}

impl PageRasterCache {
    pub fn new(scale: Scale) -> Self {
        Self { scale, bitmaps: HashMap::new() }
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    /// Change the display scale. Invalidates every cached bitmap when the
    /// scale actually changes; a no-op otherwise. Returns whether it changed.
    pub fn set_scale(&mut self, scale: Scale) -> bool {
        if scale == self.scale {
            return false;
        }
        log::debug!(
            "scale changed {} -> {}, dropping {} cached raster(s)",
            self.scale.get(),
            scale.get(),
            self.bitmaps.len()
        );
        self.scale = scale;
        self.bitmaps.clear();
        true
    }

    /// Render `page` at the current scale, or return the cached bitmap.
    /// A render failure leaves the page uncached; the rest of the document
    /// is unaffected and the caller may retry or show a placeholder.
    pub fn render<E: PdfEngine>(
        &mut self,
        engine: &E,
        document: &FormDocument,
        page: u16,
    ) -> Result<&RgbaImage, PdfEngineError> {
        if page == 0 {
            return Err(PdfEngineError::PageOutOfRange {
                page: 0,
                page_count: u32::from(document.page_count()),
            });
        }
        if !self.bitmaps.contains_key(&page) {
            let request = RasterRequest::new(u32::from(page) - 1, self.scale.get());
            let bitmap = engine.render_page(document.handle(), request)?;
            self.bitmaps.insert(page, bitmap);
        }
        Ok(&self.bitmaps[&page])
    }

    /// Render every not-yet-cached page. Failures are collected per page;
    /// pages that fail simply stay missing (flattening falls back to a
    /// blank fill for them).
    pub fn render_all<E: PdfEngine>(
        &mut self,
        engine: &E,
        document: &FormDocument,
    ) -> Vec<(u16, PdfEngineError)> {
        let mut failures = Vec::new();
        for page in 1..=document.page_count() {
            if let Err(err) = self.render(engine, document, page) {
                log::warn!("page {page} failed to rasterize: {err}");
                failures.push((page, err));
            }
        }
        failures
    }

    pub fn get(&self, page: u16) -> Option<&RgbaImage> {
        self.bitmaps.get(&page)
    }

    pub fn invalidate(&mut self, page: u16) {
        self.bitmaps.remove(&page);
    }

    pub fn cached_count(&self) -> usize {
        self.bitmaps.len()
    }

    pub fn clear(&mut self) {
        self.bitmaps.clear();
    }
}
