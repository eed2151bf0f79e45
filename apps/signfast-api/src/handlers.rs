//! HTTP handlers for the SignFast fill API

use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use signfast_types::{form_data_from_json, FormData, Template, TemplateField};

use crate::error::ApiError;
use crate::models::*;

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Fill a template and stream back the generated document.
pub async fn render_document(Json(req): Json<RenderRequest>) -> Result<Response, ApiError> {
    let pdf = BASE64
        .decode(&req.pdf_base64)
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid PDF base64: {}", e)))?;

    // Validates the document up front; an unparseable source aborts here.
    let page_count = pdffill_core::page_count(&pdf)?;

    let fields: Vec<TemplateField> = req.fields.into_iter().map(TemplateField::from_raw).collect();
    let template = Template::new(fields, pdf, page_count);
    let data = form_data_from_json(&req.data);

    let bytes = pdffill_core::render(&template, &data)?;
    tracing::info!(
        pages = page_count,
        fields = template.fields.len(),
        size = bytes.len(),
        "Rendered document"
    );

    Ok(([(header::CONTENT_TYPE, "application/pdf")], bytes).into_response())
}

/// Reconcile raw submission labels into canonical keys.
pub async fn normalize_submission(
    Json(req): Json<NormalizeRequest>,
) -> Result<Json<NormalizeResponse>, ApiError> {
    let raw = form_data_from_json(&req.data);
    let result = pdffill_core::normalize_form_data(&raw, &req.fields);
    let display = pdffill_core::denormalize(&result.normalized, &req.fields);

    Ok(Json(NormalizeResponse {
        normalized: to_json_map(&result.normalized),
        mappings: result
            .mappings
            .into_iter()
            .map(|m| MappingEntry {
                original_label: m.original_label,
                key: m.key,
                value: m.value.to_json(),
            })
            .collect(),
        conflicts: result
            .conflicts
            .into_iter()
            .map(|c| ConflictEntry {
                key: c.key,
                labels: c.labels,
            })
            .collect(),
        display: to_json_map(&display),
    }))
}

fn to_json_map(data: &FormData) -> serde_json::Map<String, serde_json::Value> {
    data.iter()
        .map(|(key, value)| (key.clone(), value.to_json()))
        .collect()
}
