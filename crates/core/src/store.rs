//! Authoritative per-page field collections.
//!
//! Vec order within a page is z-order: creation order, later fields render
//! on top. Every mutation is synchronous and leaves the bounds invariant
//! intact; out-of-bounds geometry is clamped, never rejected.

use crate::field::{
    Field, FieldId, FieldKind, FieldPayload, DEFAULT_FIELD_HEIGHT, DEFAULT_FIELD_WIDTH,
    MIN_FIELD_HEIGHT, MIN_FIELD_WIDTH,
};
use crate::geometry::{FieldRect, PagePoint};
use pdf_engine::PageSize;
use std::collections::BTreeMap;

/// Payload-only changes; geometry moves through [`FieldStore::move_field`]
/// and [`FieldStore::resize_field`] exclusively.
#[derive(Debug, Clone, Default)]
pub struct FieldUpdate {
    pub content: Option<String>,
    pub label: Option<String>,
    pub checked: Option<bool>,
    pub selected_option: Option<String>,
}

impl FieldUpdate {
    pub fn content(value: impl Into<String>) -> Self {
        Self { content: Some(value.into()), ..Self::default() }
    }

    pub fn label(value: impl Into<String>) -> Self {
        Self { label: Some(value.into()), ..Self::default() }
    }

    pub fn checked(value: bool) -> Self {
        Self { checked: Some(value), ..Self::default() }
    }

    pub fn selected_option(value: impl Into<String>) -> Self {
        Self { selected_option: Some(value.into()), ..Self::default() }
    }
}

/// Per-page ordered field collections, keyed by 1-based page number.
#[derive(Debug, Clone, Default)]
pub struct FieldStore {
    pages: BTreeMap<u16, Vec<Field>>,
}

impl FieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a default-size field of `kind` anchored at `anchor`,
    /// clamped fully inside the page. Returns the new field's id.
    pub fn create(
        &mut self,
        page: u16,
        kind: FieldKind,
        anchor: PagePoint,
        bounds: PageSize,
    ) -> FieldId {
        let width = DEFAULT_FIELD_WIDTH.min(bounds.width_pt);
        let height = DEFAULT_FIELD_HEIGHT.min(bounds.height_pt);
        let rect = FieldRect::new(0.0, 0.0, width, height).positioned_within(anchor, bounds);

        let field = Field::new(kind, rect);
        let id = field.id;
        log::debug!("created {:?} field {} on page {}", kind, id, page);
        self.pages.entry(page).or_default().push(field);
        id
    }

    /// Merge payload changes into a field. Geometry is never touched here.
    /// Selecting a dropdown option outside the option list is ignored; an
    /// empty string clears the selection.
    pub fn update(&mut self, page: u16, id: FieldId, changes: FieldUpdate) -> bool {
        let Some(field) = self.get_mut(page, id) else {
            return false;
        };

        match &mut field.payload {
            FieldPayload::Text { content } => {
                if let Some(value) = changes.content {
                    *content = value;
                }
            }
            FieldPayload::Checkbox { checked, label }
            | FieldPayload::Radio { checked, label, .. } => {
                if let Some(value) = changes.checked {
                    *checked = value;
                }
                if let Some(value) = changes.label {
                    *label = value;
                }
            }
            FieldPayload::Dropdown { options, selected } => {
                if let Some(value) = changes.selected_option {
                    if value.is_empty() {
                        *selected = None;
                    } else if options.contains(&value) {
                        *selected = Some(value);
                    } else {
                        log::debug!("ignoring unknown dropdown option {value:?} for field {id}");
                    }
                }
            }
        }
        true
    }

    /// Check one radio and uncheck every other radio sharing its group on
    /// the same page.
    pub fn check_radio(&mut self, page: u16, id: FieldId) -> bool {
        let Some(fields) = self.pages.get_mut(&page) else {
            return false;
        };
        let Some(group) = fields.iter().find_map(|f| match (&f.payload, f.id == id) {
            (FieldPayload::Radio { group, .. }, true) => Some(group.clone()),
            _ => None,
        }) else {
            return false;
        };

        for field in fields.iter_mut() {
            if let FieldPayload::Radio { checked, group: g, .. } = &mut field.payload {
                if *g == group {
                    *checked = field.id == id;
                }
            }
        }
        true
    }

    /// Move a field, clamping so its full extent stays on the page.
    pub fn move_field(
        &mut self,
        page: u16,
        id: FieldId,
        top_left: PagePoint,
        bounds: PageSize,
    ) -> bool {
        let Some(field) = self.get_mut(page, id) else {
            return false;
        };
        field.rect = field.rect.positioned_within(top_left, bounds);
        debug_assert!(field.rect.fits_within(bounds));
        true
    }

    /// Resize a field, clamping to `[min, page_extent - origin]` per axis.
    pub fn resize_field(
        &mut self,
        page: u16,
        id: FieldId,
        width: f32,
        height: f32,
        bounds: PageSize,
    ) -> bool {
        let Some(field) = self.get_mut(page, id) else {
            return false;
        };
        field.rect =
            field.rect.sized_within(width, height, MIN_FIELD_WIDTH, MIN_FIELD_HEIGHT, bounds);
        debug_assert!(field.rect.fits_within(bounds));
        true
    }

    /// Remove a field. Idempotent; removing an absent id is a no-op.
    pub fn remove(&mut self, page: u16, id: FieldId) -> bool {
        let Some(fields) = self.pages.get_mut(&page) else {
            return false;
        };
        let before = fields.len();
        fields.retain(|f| f.id != id);
        let removed = fields.len() != before;
        if fields.is_empty() {
            self.pages.remove(&page);
        }
        removed
    }

    pub fn get(&self, page: u16, id: FieldId) -> Option<&Field> {
        self.pages.get(&page)?.iter().find(|f| f.id == id)
    }

    fn get_mut(&mut self, page: u16, id: FieldId) -> Option<&mut Field> {
        self.pages.get_mut(&page)?.iter_mut().find(|f| f.id == id)
    }

    /// Fields on a page in z-order (bottom first).
    pub fn fields_on(&self, page: u16) -> &[Field] {
        self.pages.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Non-empty pages in ascending page order.
    pub fn pages(&self) -> impl Iterator<Item = (u16, &[Field])> {
        self.pages.iter().map(|(page, fields)| (*page, fields.as_slice()))
    }

    /// Replace a page's fields wholesale (layout load).
    pub fn replace_page(&mut self, page: u16, fields: Vec<Field>) {
        if fields.is_empty() {
            self.pages.remove(&page);
        } else {
            self.pages.insert(page, fields);
        }
    }

    pub fn total_count(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }
}
