//! Form field data model.
//!
//! A field is one widget placed on one page: a stable id, geometry in
//! document points, and a kind-specific payload. The kind set is closed;
//! both the interactive renderer and the flattener dispatch on the same
//! tagged enum so the two paths cannot diverge on supported types.

use crate::geometry::FieldRect;
use serde::{Deserialize, Serialize};

/// Stable across save/reload and scale changes.
pub type FieldId = uuid::Uuid;

/// Default field size in document points.
pub const DEFAULT_FIELD_WIDTH: f32 = 100.0;
pub const DEFAULT_FIELD_HEIGHT: f32 = 30.0;

/// Resize minimums; prevent degenerate zero-area fields.
pub const MIN_FIELD_WIDTH: f32 = 50.0;
pub const MIN_FIELD_HEIGHT: f32 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Checkbox,
    Radio,
    Dropdown,
}

/// Kind-specific field data.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPayload {
    Text {
        content: String,
    },
    Checkbox {
        checked: bool,
        label: String,
    },
    Radio {
        checked: bool,
        label: String,
        /// Mutual-exclusion key; radios sharing a group on a page behave
        /// as one exclusive set.
        group: String,
    },
    Dropdown {
        options: Vec<String>,
        selected: Option<String>,
    },
}

impl FieldPayload {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldPayload::Text { .. } => FieldKind::Text,
            FieldPayload::Checkbox { .. } => FieldKind::Checkbox,
            FieldPayload::Radio { .. } => FieldKind::Radio,
            FieldPayload::Dropdown { .. } => FieldKind::Dropdown,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub id: FieldId,
    pub rect: FieldRect,
    pub payload: FieldPayload,
}

impl Field {
    /// New field of the given kind with the default payload.
    pub fn new(kind: FieldKind, rect: FieldRect) -> Self {
        let id = FieldId::new_v4();
        let payload = match kind {
            FieldKind::Text => FieldPayload::Text { content: String::new() },
            FieldKind::Checkbox => FieldPayload::Checkbox {
                checked: false,
                label: "Checkbox".to_owned(),
            },
            FieldKind::Radio => FieldPayload::Radio {
                checked: false,
                label: "Radio".to_owned(),
                group: format!("radioGroup_{}", id.simple()),
            },
            FieldKind::Dropdown => FieldPayload::Dropdown {
                options: vec![
                    "Option 1".to_owned(),
                    "Option 2".to_owned(),
                    "Option 3".to_owned(),
                ],
                selected: None,
            },
        };
        Self { id, rect, payload }
    }

    pub fn with_payload(rect: FieldRect, payload: FieldPayload) -> Self {
        Self { id: FieldId::new_v4(), rect, payload }
    }

    pub fn kind(&self) -> FieldKind {
        self.payload.kind()
    }
}

/// On-screen editing font size in points: `clamp(12, height/4, 18)`.
pub fn editor_font_size(rect: &FieldRect) -> f32 {
    (rect.height / 4.0).clamp(12.0, 18.0)
}

/// Flattened-output font size in points: `clamp(8, height/4, 18)`.
///
/// The floor intentionally differs from [`editor_font_size`] (8 vs 12):
/// compact print output versus on-screen legibility. Do not unify.
pub fn export_font_size(rect: &FieldRect) -> f32 {
    (rect.height / 4.0).clamp(8.0, 18.0)
}

/// Side length of the checkbox square / radio circle diameter.
pub fn icon_size(rect: &FieldRect, font_size: f32) -> f32 {
    font_size.min(rect.width.min(rect.height) * 0.4)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(height: f32) -> FieldRect {
        FieldRect::new(0.0, 0.0, 100.0, height)
    }

    #[test]
    fn editor_font_size_floors_at_twelve() {
        assert_eq!(editor_font_size(&rect(30.0)), 12.0);
        assert_eq!(editor_font_size(&rect(60.0)), 15.0);
        assert_eq!(editor_font_size(&rect(200.0)), 18.0);
    }

    #[test]
    fn export_font_size_floors_at_eight() {
        assert_eq!(export_font_size(&rect(30.0)), 8.0);
        assert_eq!(export_font_size(&rect(60.0)), 15.0);
        assert_eq!(export_font_size(&rect(200.0)), 18.0);
    }

    #[test]
    fn icon_size_caps_at_fraction_of_short_edge() {
        let r = FieldRect::new(0.0, 0.0, 100.0, 30.0);
        // min(12, min(100, 30) * 0.4) = 12
        assert_eq!(icon_size(&r, 12.0), 12.0);

        let narrow = FieldRect::new(0.0, 0.0, 20.0, 30.0);
        // min(12, 20 * 0.4) = 8
        assert_eq!(icon_size(&narrow, 12.0), 8.0);
    }

    #[test]
    fn new_field_defaults_per_kind() {
        let r = rect(30.0);

        match Field::new(FieldKind::Text, r).payload {
            FieldPayload::Text { content } => assert!(content.is_empty()),
            other => panic!("expected text payload, got {other:?}"),
        }

        match Field::new(FieldKind::Dropdown, r).payload {
            FieldPayload::Dropdown { options, selected } => {
                assert_eq!(options.len(), 3);
                assert!(selected.is_none());
            }
            other => panic!("expected dropdown payload, got {other:?}"),
        }
    }

    #[test]
    fn radio_fields_get_distinct_groups() {
        let r = rect(30.0);
        let a = Field::new(FieldKind::Radio, r);
        let b = Field::new(FieldKind::Radio, r);

        let group = |f: &Field| match &f.payload {
            FieldPayload::Radio { group, .. } => group.clone(),
            _ => unreachable!(),
        };
        assert_ne!(group(&a), group(&b));
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&FieldKind::Dropdown).unwrap(), "\"dropdown\"");
        let parsed: FieldKind = serde_json::from_str("\"checkbox\"").unwrap();
        assert_eq!(parsed, FieldKind::Checkbox);
        assert!(serde_json::from_str::<FieldKind>("\"signature\"").is_err());
    }
}
