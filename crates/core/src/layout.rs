//! Saved field-layout wire format.
//!
//! The backend stores the original PDF bytes and this layout separately;
//! the two are linked only by the document id. Geometry here is always in
//! document points, so a layout saved at one display scale reloads
//! correctly at any other.

use crate::field::{Field, FieldKind, FieldPayload};
use crate::geometry::FieldRect;
use serde::{Deserialize, Serialize};

/// One persisted field. Optional members carry the kind-specific payload;
/// members that do not apply to a kind are omitted on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRecord {
    #[serde(rename = "type")]
    pub field_type: FieldKind,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    /// Radio group key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_option: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub page_number: u16,
    pub fields: Vec<FieldRecord>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentLayout {
    pub pages: Vec<PageRecord>,
}

impl From<&Field> for FieldRecord {
    fn from(field: &Field) -> Self {
        let mut record = FieldRecord {
            field_type: field.kind(),
            left: field.rect.left,
            top: field.rect.top,
            width: field.rect.width,
            height: field.rect.height,
            content: None,
            label: None,
            checked: None,
            name: None,
            options: None,
            selected_option: None,
        };
        match &field.payload {
            FieldPayload::Text { content } => {
                record.content = Some(content.clone());
            }
            FieldPayload::Checkbox { checked, label } => {
                record.checked = Some(*checked);
                record.label = Some(label.clone());
            }
            FieldPayload::Radio { checked, label, group } => {
                record.checked = Some(*checked);
                record.label = Some(label.clone());
                record.name = Some(group.clone());
            }
            FieldPayload::Dropdown { options, selected } => {
                record.options = Some(options.clone());
                record.selected_option = selected.clone();
            }
        }
        record
    }
}

impl FieldRecord {
    /// Rebuild a field from its persisted form. The field gets a fresh id;
    /// ids are process-local and not part of the wire format.
    pub fn into_field(self) -> Field {
        let rect = FieldRect::new(self.left, self.top, self.width, self.height);
        let payload = match self.field_type {
            FieldKind::Text => FieldPayload::Text {
                content: self.content.unwrap_or_default(),
            },
            FieldKind::Checkbox => FieldPayload::Checkbox {
                checked: self.checked.unwrap_or(false),
                label: self.label.unwrap_or_else(|| "Checkbox".to_owned()),
            },
            FieldKind::Radio => {
                let field = Field::new(FieldKind::Radio, rect);
                let fallback_group = match &field.payload {
                    FieldPayload::Radio { group, .. } => group.clone(),
                    _ => unreachable!(),
                };
                FieldPayload::Radio {
                    checked: self.checked.unwrap_or(false),
                    label: self.label.unwrap_or_else(|| "Radio".to_owned()),
                    group: self.name.unwrap_or(fallback_group),
                }
            }
            FieldKind::Dropdown => {
                let options = self.options.unwrap_or_default();
                let selected = self
                    .selected_option
                    .filter(|s| !s.is_empty() && options.contains(s));
                FieldPayload::Dropdown { options, selected }
            }
        };
        Field::with_payload(rect, payload)
    }
}
