//! Request/response types for the SignFast fill API

use serde::{Deserialize, Serialize};
use signfast_types::{FormFieldDef, RawTemplateField};

/// Fill a template with submitted data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    /// The source PDF, base64-encoded.
    pub pdf_base64: String,
    /// Stored field records, exactly as the form builder saved them.
    #[serde(default)]
    pub fields: Vec<RawTemplateField>,
    /// Submitted values, keyed by raw or normalized label.
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// Reconcile raw submission keys against declared form fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeRequest {
    #[serde(default)]
    pub fields: Vec<FormFieldDef>,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeResponse {
    /// Values under their canonical keys.
    pub normalized: serde_json::Map<String, serde_json::Value>,
    /// How each raw entry was mapped.
    pub mappings: Vec<MappingEntry>,
    /// Labels that collapsed onto the same key.
    pub conflicts: Vec<ConflictEntry>,
    /// Values re-keyed by their declared field labels, for display.
    pub display: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingEntry {
    pub original_label: String,
    pub key: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictEntry {
    pub key: String,
    pub labels: Vec<String>,
}
