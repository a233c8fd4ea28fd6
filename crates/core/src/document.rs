//! Loaded-document state: pages, fields, and the original bytes.

use crate::field::Field;
use crate::geometry::FieldRect;
use crate::layout::{DocumentLayout, FieldRecord, PageRecord};
use crate::store::FieldStore;
use pdf_engine::{DocumentHandle, OpenSource, PageSize, PdfEngine, PdfEngineError};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to load PDF: {0}")]
    Engine(#[from] PdfEngineError),
}

/// One page of the loaded document. `number` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Page {
    pub number: u16,
    pub size: PageSize,
}

/// The document being edited: ordered pages, the per-page field store, and
/// the untouched source bytes (kept for upload). Owns all field and page
/// lifetimes; discarded wholesale on reset or new-file load.
#[derive(Debug)]
pub struct FormDocument {
    handle: DocumentHandle,
    pages: Vec<Page>,
    fields: FieldStore,
    source: Vec<u8>,
}

impl FormDocument {
    /// Open a document from raw PDF bytes. On failure no partial state is
    /// left behind; the caller keeps whatever document it had.
    pub fn open<E: PdfEngine>(engine: &mut E, bytes: Vec<u8>) -> Result<Self, LoadError> {
        let handle = engine.open(OpenSource::Bytes(bytes.clone()))?;
        let page_count = engine.page_count(handle)?;

        let mut pages = Vec::with_capacity(page_count as usize);
        for index in 0..page_count {
            let size = engine.page_size(handle, index)?;
            pages.push(Page { number: (index + 1) as u16, size });
        }

        log::info!("loaded document with {page_count} page(s)");
        Ok(Self { handle, pages, fields: FieldStore::new(), source: bytes })
    }

    pub fn handle(&self) -> DocumentHandle {
        self.handle
    }

    pub fn page_count(&self) -> u16 {
        self.pages.len() as u16
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, number: u16) -> Option<&Page> {
        (number >= 1).then(|| self.pages.get(number as usize - 1)).flatten()
    }

    pub fn page_size(&self, number: u16) -> Option<PageSize> {
        self.page(number).map(|p| p.size)
    }

    pub fn fields(&self) -> &FieldStore {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut FieldStore {
        &mut self.fields
    }

    /// The unmodified bytes the document was opened from.
    pub fn source_bytes(&self) -> &[u8] {
        &self.source
    }

    /// Replace all fields from a saved layout. Records are clamped against
    /// their page bounds; records for pages the document does not have are
    /// dropped with a warning.
    pub fn load_layout(&mut self, layout: DocumentLayout) {
        self.fields.clear();
        for page_record in layout.pages {
            let Some(bounds) = self.page_size(page_record.page_number) else {
                log::warn!(
                    "layout references page {} beyond document end, dropping {} field(s)",
                    page_record.page_number,
                    page_record.fields.len()
                );
                continue;
            };

            let fields: Vec<Field> = page_record
                .fields
                .into_iter()
                .map(|record| {
                    let mut field = record.into_field();
                    // Clamp the size against the whole page before
                    // positioning; a stale origin at or past the page edge
                    // must not shrink the remaining extent to nothing.
                    let rect = field.rect;
                    let width = rect.width.max(1.0).min(bounds.width_pt);
                    let height = rect.height.max(1.0).min(bounds.height_pt);
                    field.rect = FieldRect::new(0.0, 0.0, width, height)
                        .positioned_within(rect.top_left(), bounds);
                    field
                })
                .collect();
            self.fields.replace_page(page_record.page_number, fields);
        }
    }

    /// Snapshot the current fields into the wire layout.
    pub fn layout(&self) -> DocumentLayout {
        DocumentLayout {
            pages: self
                .fields
                .pages()
                .map(|(page_number, fields)| PageRecord {
                    page_number,
                    fields: fields.iter().map(FieldRecord::from).collect(),
                })
                .collect(),
        }
    }
}
