//! PDF Form Editor Core Library
//!
//! Document state, field model, coordinate transforms, gesture handling,
//! and flattened export for the form editor.

pub mod document;
pub mod field;
pub mod flatten;
pub mod geometry;
pub mod gesture;
pub mod layout;
pub mod raster;
pub mod session;
pub mod store;

pub use document::{FormDocument, LoadError, Page};
pub use field::{
    editor_font_size, export_font_size, icon_size, Field, FieldId, FieldKind, FieldPayload,
    DEFAULT_FIELD_HEIGHT, DEFAULT_FIELD_WIDTH, MIN_FIELD_HEIGHT, MIN_FIELD_WIDTH,
};
pub use flatten::{flatten_to_bytes, flatten_to_file, FlattenError};
pub use geometry::{
    FieldRect, PagePoint, PageVec, Scale, ScreenPoint, ScreenVec, MIN_SCALE,
};
pub use gesture::FieldGesture;
pub use layout::{DocumentLayout, FieldRecord, PageRecord};
pub use raster::PageRasterCache;
pub use session::{EditorSession, SessionError};
pub use store::{FieldStore, FieldUpdate};
