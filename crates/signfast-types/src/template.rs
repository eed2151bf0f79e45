use serde::{Deserialize, Serialize};

use crate::field::{FieldKind, TemplateField};

/// A PDF template: the original document bytes plus the ordered field
/// placements. Immutable for the duration of a render pass; rendering
/// parses its own copy of the document and never mutates the template.
#[derive(Debug, Clone)]
pub struct Template {
    /// Field order has no effect on output (each field draws
    /// independently) but is preserved for reproducibility.
    pub fields: Vec<TemplateField>,
    /// The source PDF, never mutated.
    pub original_document: Vec<u8>,
    pub page_count: u32,
}

impl Template {
    pub fn new(fields: Vec<TemplateField>, original_document: Vec<u8>, page_count: u32) -> Self {
        Self {
            fields,
            original_document,
            page_count,
        }
    }
}

/// A declared form field as authored in the form builder: the human label
/// and its input kind. Declaration order breaks ties during normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormFieldDef {
    pub label: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: FieldKind,
}

fn default_kind() -> FieldKind {
    FieldKind::Text
}
