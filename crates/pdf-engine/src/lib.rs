//! Page access seam for the form editor.
//!
//! The editor core never parses PDF bytes itself; it goes through the
//! [`PdfEngine`] trait for page counts, page sizes and page rasters. The
//! default backend parses structure with `lopdf` and paints placeholder
//! rasters; a real rasterizer can be swapped in behind the same trait.

use image::{ImageBuffer, Rgba};
use lopdf::Document;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub type RgbaImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// Opaque handle to an open document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(u64);

impl DocumentHandle {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Page dimensions in points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl PageSize {
    pub fn new(width_pt: f32, height_pt: f32) -> Self {
        Self { width_pt, height_pt }
    }
}

/// US Letter, used when a page carries no usable /MediaBox.
pub const FALLBACK_PAGE_SIZE: PageSize = PageSize { width_pt: 612.0, height_pt: 792.0 };

#[derive(Debug, Clone)]
pub enum OpenSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<PathBuf> for OpenSource {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for OpenSource {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<Vec<u8>> for OpenSource {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

/// A single page raster request. `page_index` is 0-based at this seam;
/// the editor core speaks 1-based page numbers and converts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterRequest {
    pub page_index: u32,
    /// Display pixels per document point. Non-positive values are treated
    /// as 1.0.
    pub scale: f32,
}

impl RasterRequest {
    pub fn new(page_index: u32, scale: f32) -> Self {
        Self { page_index, scale }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PdfEngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("invalid document handle {0}")]
    InvalidHandle(u64),
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("encrypted PDFs are not supported")]
    EncryptedUnsupported,
    #[error("backend error: {0}")]
    Backend(String),
}

pub trait PdfEngine {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, PdfEngineError>;
    fn page_count(&self, handle: DocumentHandle) -> Result<u32, PdfEngineError>;
    fn page_size(
        &self,
        handle: DocumentHandle,
        page_index: u32,
    ) -> Result<PageSize, PdfEngineError>;
    fn render_page(
        &self,
        handle: DocumentHandle,
        request: RasterRequest,
    ) -> Result<RgbaImage, PdfEngineError>;
    fn close(&mut self, handle: DocumentHandle) -> Result<(), PdfEngineError>;
}

#[derive(Debug, Clone)]
struct OpenDocument {
    page_sizes: Vec<PageSize>,
}

/// Default backend: structure via `lopdf`, placeholder rasters.
#[derive(Debug, Default)]
pub struct LopdfEngine {
    next_handle: u64,
    open_docs: HashMap<DocumentHandle, OpenDocument>,
}

impl LopdfEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_page_sizes(bytes: &[u8]) -> Result<Vec<PageSize>, PdfEngineError> {
        let doc = Document::load_mem(bytes)?;

        if doc.trailer.get(b"Encrypt").is_ok() {
            return Err(PdfEngineError::EncryptedUnsupported);
        }

        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(PdfEngineError::Backend("document has no pages".to_owned()));
        }

        let mut sizes = Vec::with_capacity(pages.len());
        for (_, object_id) in pages {
            let dict = doc.get_dictionary(object_id)?;
            let size = media_box_size(dict).unwrap_or(FALLBACK_PAGE_SIZE);
            sizes.push(size);
        }

        Ok(sizes)
    }

    fn doc(&self, handle: DocumentHandle) -> Result<&OpenDocument, PdfEngineError> {
        self.open_docs
            .get(&handle)
            .ok_or(PdfEngineError::InvalidHandle(handle.raw()))
    }
}

fn media_box_size(dict: &lopdf::Dictionary) -> Option<PageSize> {
    let media_box = dict.get(b"MediaBox").ok()?.as_array().ok()?;
    if media_box.len() != 4 {
        return None;
    }
    let x0 = media_box[0].as_float().ok()?;
    let y0 = media_box[1].as_float().ok()?;
    let x1 = media_box[2].as_float().ok()?;
    let y1 = media_box[3].as_float().ok()?;
    Some(PageSize::new((x1 - x0).abs(), (y1 - y0).abs()))
}

impl PdfEngine for LopdfEngine {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, PdfEngineError> {
        let bytes = match source {
            OpenSource::Path(path) => fs::read(path)?,
            OpenSource::Bytes(bytes) => bytes,
        };

        let page_sizes = Self::parse_page_sizes(&bytes)?;

        self.next_handle += 1;
        let handle = DocumentHandle(self.next_handle);
        log::debug!(
            "opened document {} with {} page(s)",
            handle.raw(),
            page_sizes.len()
        );
        self.open_docs.insert(handle, OpenDocument { page_sizes });

        Ok(handle)
    }

    fn page_count(&self, handle: DocumentHandle) -> Result<u32, PdfEngineError> {
        Ok(self.doc(handle)?.page_sizes.len() as u32)
    }

    fn page_size(
        &self,
        handle: DocumentHandle,
        page_index: u32,
    ) -> Result<PageSize, PdfEngineError> {
        let doc = self.doc(handle)?;
        doc.page_sizes
            .get(page_index as usize)
            .copied()
            .ok_or(PdfEngineError::PageOutOfRange {
                page: page_index,
                page_count: doc.page_sizes.len() as u32,
            })
    }

    fn render_page(
        &self,
        handle: DocumentHandle,
        request: RasterRequest,
    ) -> Result<RgbaImage, PdfEngineError> {
        let size = self.page_size(handle, request.page_index)?;
        let scale = if request.scale > 0.0 { request.scale } else { 1.0 };

        let width = (size.width_pt * scale).round().max(1.0) as u32;
        let height = (size.height_pt * scale).round().max(1.0) as u32;

        // White sheet with a light edge so page extents are visible.
        let mut image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        let edge = Rgba([224, 224, 224, 255]);
        if width > 2 && height > 2 {
            for x in 0..width {
                image.put_pixel(x, 0, edge);
                image.put_pixel(x, height - 1, edge);
            }
            for y in 0..height {
                image.put_pixel(0, y, edge);
                image.put_pixel(width - 1, y, edge);
            }
        }

        Ok(image)
    }

    fn close(&mut self, handle: DocumentHandle) -> Result<(), PdfEngineError> {
        self.open_docs
            .remove(&handle)
            .map(|_| ())
            .ok_or(PdfEngineError::InvalidHandle(handle.raw()))
    }
}

pub fn default_engine() -> LopdfEngine {
    LopdfEngine::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Object, Stream};

    fn sample_pdf(page_sizes: &[(i64, i64)]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids: Vec<Object> = Vec::new();
        for (w, h) in page_sizes {
            let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), (*w).into(), (*h).into()],
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("sample PDF should serialize");
        bytes
    }

    #[test]
    fn open_reads_page_count_and_sizes() {
        let mut engine = LopdfEngine::new();
        let handle = engine
            .open(OpenSource::Bytes(sample_pdf(&[(600, 800), (612, 792)])))
            .expect("open should succeed");

        assert_eq!(engine.page_count(handle).unwrap(), 2);

        let first = engine.page_size(handle, 0).unwrap();
        assert_eq!(first.width_pt, 600.0);
        assert_eq!(first.height_pt, 800.0);
    }

    #[test]
    fn page_size_out_of_range() {
        let mut engine = LopdfEngine::new();
        let handle = engine
            .open(OpenSource::Bytes(sample_pdf(&[(600, 800)])))
            .unwrap();

        let err = engine.page_size(handle, 5).expect_err("page 5 should not exist");
        assert!(matches!(
            err,
            PdfEngineError::PageOutOfRange { page: 5, page_count: 1 }
        ));
    }

    #[test]
    fn render_page_matches_scaled_dimensions() {
        let mut engine = LopdfEngine::new();
        let handle = engine
            .open(OpenSource::Bytes(sample_pdf(&[(600, 800)])))
            .unwrap();

        let image = engine
            .render_page(handle, RasterRequest::new(0, 1.5))
            .expect("render should succeed");

        assert_eq!(image.width(), 900);
        assert_eq!(image.height(), 1200);
    }

    #[test]
    fn render_page_treats_bad_scale_as_identity() {
        let mut engine = LopdfEngine::new();
        let handle = engine
            .open(OpenSource::Bytes(sample_pdf(&[(600, 800)])))
            .unwrap();

        let image = engine
            .render_page(handle, RasterRequest::new(0, -2.0))
            .unwrap();
        assert_eq!(image.width(), 600);
        assert_eq!(image.height(), 800);
    }

    #[test]
    fn garbage_bytes_fail_to_open() {
        let mut engine = LopdfEngine::new();
        let result = engine.open(OpenSource::Bytes(b"not a pdf".to_vec()));
        assert!(result.is_err());
    }

    #[test]
    fn unknown_handle_is_rejected() {
        let engine = LopdfEngine::new();
        let err = engine
            .page_count(DocumentHandle(42))
            .expect_err("unknown handle should fail");
        assert!(matches!(err, PdfEngineError::InvalidHandle(42)));
    }

    #[test]
    fn close_removes_document() {
        let mut engine = LopdfEngine::new();
        let handle = engine
            .open(OpenSource::Bytes(sample_pdf(&[(600, 800)])))
            .unwrap();

        engine.close(handle).expect("close should succeed");
        assert!(engine.page_count(handle).is_err());
        assert!(engine.close(handle).is_err());
    }
}
