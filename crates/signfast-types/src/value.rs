use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Declared subtype of an image data-URL. Drives the embed/transcode
/// decision: PNG and JPEG embed directly, WebP is transcoded to JPEG,
/// anything else fails at embed time and falls back to a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageMime {
    Png,
    Jpeg,
    Webp,
    Other(String),
}

impl ImageMime {
    fn from_subtype(subtype: &str) -> Self {
        match subtype.to_lowercase().as_str() {
            "png" => ImageMime::Png,
            "jpeg" | "jpg" => ImageMime::Jpeg,
            "webp" => ImageMime::Webp,
            other => ImageMime::Other(other.to_string()),
        }
    }

    pub fn subtype(&self) -> &str {
        match self {
            ImageMime::Png => "png",
            ImageMime::Jpeg => "jpeg",
            ImageMime::Webp => "webp",
            ImageMime::Other(s) => s,
        }
    }
}

/// A decoded image payload from a `data:image/<subtype>;base64,<payload>`
/// string.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub mime: ImageMime,
    pub bytes: Vec<u8>,
}

impl ImageData {
    /// Parse a data-URL. Returns `None` when the string is not an image
    /// data-URL or its payload does not base64-decode cleanly; callers
    /// keep such values as plain text, which media fields never match.
    pub fn from_data_url(s: &str) -> Option<Self> {
        let rest = s.strip_prefix("data:image/")?;
        let (subtype, payload) = rest.split_once(";base64,")?;
        let bytes = BASE64.decode(payload.trim().as_bytes()).ok()?;
        if bytes.is_empty() {
            return None;
        }
        Some(Self {
            mime: ImageMime::from_subtype(subtype),
            bytes,
        })
    }

    /// Rebuild the data-URL form, used when echoing values back over HTTP.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:image/{};base64,{}",
            self.mime.subtype(),
            BASE64.encode(&self.bytes)
        )
    }
}

/// One submitted form value. The variant is decided once, at the JSON
/// boundary, so the resolver and renderer never sniff string prefixes.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    Bool(bool),
    List(Vec<String>),
    Image(ImageData),
}

impl FormValue {
    /// Convert one JSON value. `None` means the value has no representable
    /// form (null, nested object) and is dropped from the data map.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(FormValue::Bool(*b)),
            serde_json::Value::Number(n) => Some(FormValue::Text(n.to_string())),
            serde_json::Value::String(s) => {
                if s.starts_with("data:image") {
                    if let Some(img) = ImageData::from_data_url(s) {
                        return Some(FormValue::Image(img));
                    }
                }
                Some(FormValue::Text(s.clone()))
            }
            serde_json::Value::Array(items) => Some(FormValue::List(
                items
                    .iter()
                    .filter_map(|v| match v {
                        serde_json::Value::String(s) => Some(s.clone()),
                        serde_json::Value::Number(n) => Some(n.to_string()),
                        serde_json::Value::Bool(b) => Some(b.to_string()),
                        _ => None,
                    })
                    .collect(),
            )),
            serde_json::Value::Object(_) => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FormValue::Text(s) => serde_json::Value::String(s.clone()),
            FormValue::Bool(b) => serde_json::Value::Bool(*b),
            FormValue::List(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(|s| serde_json::Value::String(s.clone()))
                    .collect(),
            ),
            FormValue::Image(img) => serde_json::Value::String(img.to_data_url()),
        }
    }

    /// Empty values are treated as absent everywhere.
    pub fn is_empty(&self) -> bool {
        match self {
            FormValue::Text(s) => s.trim().is_empty(),
            FormValue::List(items) => items.is_empty(),
            FormValue::Bool(_) | FormValue::Image(_) => false,
        }
    }

    /// Renderable text form. Images have none; lists join their entries.
    pub fn as_text(&self) -> Option<String> {
        match self {
            FormValue::Text(s) => Some(s.clone()),
            FormValue::Bool(b) => Some(b.to_string()),
            FormValue::List(items) => Some(items.join(", ")),
            FormValue::Image(_) => None,
        }
    }

    /// Checkbox truthiness: boolean true, or the strings "true" / "1".
    pub fn is_truthy(&self) -> bool {
        match self {
            FormValue::Bool(b) => *b,
            FormValue::Text(s) => matches!(s.trim(), "true" | "1"),
            _ => false,
        }
    }

    pub fn as_image(&self) -> Option<&ImageData> {
        match self {
            FormValue::Image(img) => Some(img),
            _ => None,
        }
    }
}

/// Submitted form data: label (raw or normalized) to value. BTreeMap keeps
/// iteration deterministic, which the fallback lookup steps rely on.
pub type FormData = BTreeMap<String, FormValue>;

/// Convert a JSON object into a typed data map, dropping nulls and values
/// with no representable form.
pub fn form_data_from_json(map: &serde_json::Map<String, serde_json::Value>) -> FormData {
    map.iter()
        .filter_map(|(k, v)| FormValue::from_json(v).map(|v| (k.clone(), v)))
        .collect()
}
