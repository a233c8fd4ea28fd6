//! Editor session: one open document, its raster cache, and the active
//! pointer gesture, tied to a rendering engine.
//!
//! This is the surface a frontend drives. It owns the engine so document
//! handles cannot outlive it, and it keeps the raster cache and gesture
//! machine consistent across document swaps and viewport rescales.

use crate::document::{FormDocument, LoadError};
use crate::field::{FieldId, FieldKind};
use crate::flatten::{self, FlattenError};
use crate::geometry::{Scale, ScreenPoint};
use crate::gesture::FieldGesture;
use crate::layout::DocumentLayout;
use crate::raster::PageRasterCache;
use pdf_engine::{PdfEngine, PdfEngineError, RgbaImage};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no document is open")]
    NoDocument,
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Render(#[from] PdfEngineError),
    #[error(transparent)]
    Flatten(#[from] FlattenError),
}

pub struct EditorSession<E: PdfEngine> {
    engine: E,
    document: Option<FormDocument>,
    rasters: PageRasterCache,
    gesture: FieldGesture,
    preview: Option<Vec<u8>>,
}

impl<E: PdfEngine> EditorSession<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            document: None,
            rasters: PageRasterCache::new(Scale::default()),
            gesture: FieldGesture::new(),
            preview: None,
        }
    }

    /// Open a fresh PDF with no fields. Replaces any current document and
    /// resets cache, gesture, and preview state.
    pub fn open_pdf(&mut self, bytes: Vec<u8>) -> Result<(), SessionError> {
        let document = FormDocument::open(&mut self.engine, bytes)?;
        self.install(document);
        Ok(())
    }

    /// Open a PDF together with a saved field layout.
    pub fn open_saved(&mut self, bytes: Vec<u8>, layout: DocumentLayout) -> Result<(), SessionError> {
        let mut document = FormDocument::open(&mut self.engine, bytes)?;
        document.load_layout(layout);
        self.install(document);
        Ok(())
    }

    fn install(&mut self, document: FormDocument) {
        self.release_document();
        self.document = Some(document);
        self.rasters.clear();
        self.gesture.cancel();
        self.preview = None;
    }

    pub fn document(&self) -> Option<&FormDocument> {
        self.document.as_ref()
    }

    pub fn document_mut(&mut self) -> Option<&mut FormDocument> {
        self.document.as_mut()
    }

    pub fn scale(&self) -> Scale {
        self.rasters.scale()
    }

    /// Change the viewport zoom. Field geometry is stored in document
    /// points, so nothing moves; only the raster cache is invalidated.
    pub fn set_viewport_scale(&mut self, scale: Scale) {
        if self.rasters.set_scale(scale) {
            log::debug!("viewport scale now {}", scale.get());
        }
    }

    /// Raster for `page` at the current scale, rendering on first access.
    pub fn page_raster(&mut self, page: u16) -> Result<&RgbaImage, SessionError> {
        let document = self.document.as_ref().ok_or(SessionError::NoDocument)?;
        Ok(self.rasters.render(&self.engine, document, page)?)
    }

    /// Drop a new field of `kind` at a screen position on `page`. Drops
    /// onto pages the document does not have are ignored.
    pub fn drop_field(&mut self, page: u16, kind: FieldKind, at: ScreenPoint) -> Option<FieldId> {
        let scale = self.rasters.scale();
        let document = self.document.as_mut()?;
        let bounds = document.page_size(page)?;
        let anchor = at.to_page(scale);
        Some(document.fields_mut().create(page, kind, anchor, bounds))
    }

    pub fn begin_drag(&mut self, page: u16, id: FieldId, at: ScreenPoint) -> bool {
        let scale = self.rasters.scale();
        let Some(document) = self.document.as_ref() else {
            return false;
        };
        self.gesture.pointer_down_on_body(document.fields(), scale, page, id, at)
    }

    pub fn begin_resize(&mut self, page: u16, id: FieldId, at: ScreenPoint) -> bool {
        let Some(document) = self.document.as_ref() else {
            return false;
        };
        self.gesture.pointer_down_on_handle(document.fields(), page, id, at)
    }

    pub fn pointer_move(&mut self, at: ScreenPoint) {
        let scale = self.rasters.scale();
        let Some(page) = self.gesture.active_page() else {
            return;
        };
        let Some(document) = self.document.as_mut() else {
            return;
        };
        let Some(bounds) = document.page_size(page) else {
            return;
        };
        self.gesture.pointer_move(document.fields_mut(), bounds, scale, at);
    }

    pub fn pointer_up(&mut self) {
        self.gesture.pointer_up();
    }

    pub fn cancel_gesture(&mut self) {
        self.gesture.cancel();
    }

    /// Screen-space rectangle of a field at the current scale, for hit
    /// testing and widget layout in the frontend.
    pub fn field_screen_rect(&self, page: u16, id: FieldId) -> Option<(f32, f32, f32, f32)> {
        let document = self.document.as_ref()?;
        let field = document.fields().get(page, id)?;
        Some(field.rect.to_screen(self.rasters.scale()))
    }

    /// Flatten the document to a file. Pages are rasterized first so the
    /// output carries page backgrounds.
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), SessionError> {
        let document = self.document.as_ref().ok_or(SessionError::NoDocument)?;
        self.rasters.render_all(&self.engine, document);
        flatten::flatten_to_file(document, &self.rasters, path)?;
        Ok(())
    }

    /// Flatten in memory and hold the bytes for a preview viewer. The
    /// buffer stays alive until `close_preview` or the next document swap.
    pub fn generate_preview(&mut self) -> Result<&[u8], SessionError> {
        let document = self.document.as_ref().ok_or(SessionError::NoDocument)?;
        let bytes = flatten::flatten_to_bytes(document, &mut self.rasters, &self.engine)?;
        Ok(self.preview.insert(bytes))
    }

    pub fn preview_bytes(&self) -> Option<&[u8]> {
        self.preview.as_deref()
    }

    /// Release the preview buffer.
    pub fn close_preview(&mut self) {
        self.preview = None;
    }

    /// Discard the document and all derived state.
    pub fn reset(&mut self) {
        self.release_document();
        self.rasters.clear();
        self.gesture.cancel();
        self.preview = None;
    }

    fn release_document(&mut self) {
        if let Some(old) = self.document.take() {
            if let Err(error) = self.engine.close(old.handle()) {
                log::warn!("failed to close document handle: {error}");
            }
        }
    }
}
