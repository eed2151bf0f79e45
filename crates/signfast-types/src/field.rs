use serde::{Deserialize, Serialize};

/// Field kind, driving both value resolution and the drawing routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Checkbox,
    Signature,
    Image,
}

impl FieldKind {
    /// Parse a stored type string. Unknown or missing kinds fall back to
    /// `Text` so malformed templates still render deterministically.
    pub fn from_str_lenient(s: Option<&str>) -> Self {
        match s.map(|s| s.to_lowercase()) {
            Some(ref s) => match s.as_str() {
                "number" => FieldKind::Number,
                "date" => FieldKind::Date,
                "checkbox" => FieldKind::Checkbox,
                "signature" => FieldKind::Signature,
                "image" => FieldKind::Image,
                _ => FieldKind::Text,
            },
            None => FieldKind::Text,
        }
    }

    /// Signature and image fields carry binary payloads and draw a
    /// placeholder box when their value is missing.
    pub fn is_media(&self) -> bool {
        matches!(self, FieldKind::Signature | FieldKind::Image)
    }
}

/// A template field record exactly as stored: every attribute optional and
/// loosely typed, because historical records carry nulls, strings where
/// numbers belong, and missing keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTemplateField {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub page: Option<serde_json::Value>,
    pub variable: Option<String>,
    pub x_ratio: Option<serde_json::Value>,
    pub y_ratio: Option<serde_json::Value>,
    pub width_ratio: Option<serde_json::Value>,
    pub height_ratio: Option<serde_json::Value>,
    pub font_size: Option<serde_json::Value>,
    pub font_color: Option<String>,
    pub background_color: Option<String>,
    pub required: Option<bool>,
    pub offset_x: Option<serde_json::Value>,
    pub offset_y: Option<serde_json::Value>,
}

/// One placeholder position on one page.
///
/// Position and size are ratios of the page dimensions, measured from the
/// top-left corner. Offsets are absolute points applied after conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateField {
    pub id: String,
    pub kind: FieldKind,
    /// 1-based page number. Out-of-range pages skip the field at render.
    pub page: u32,
    /// Placeholder of the form `${name}`.
    pub variable: String,
    pub x_ratio: f64,
    pub y_ratio: f64,
    pub width_ratio: f64,
    pub height_ratio: f64,
    pub font_size: f64,
    pub font_color: String,
    pub background_color: Option<String>,
    pub required: bool,
    pub offset_x: f64,
    pub offset_y: f64,
}

const DEFAULT_WIDTH_RATIO: f64 = 0.1;
const DEFAULT_HEIGHT_RATIO: f64 = 0.05;
const DEFAULT_FONT_SIZE: f64 = 12.0;
const DEFAULT_FONT_COLOR: &str = "#000000";

impl TemplateField {
    /// Build a typed field from a stored record, substituting documented
    /// defaults for missing or non-numeric attributes. This is the single
    /// place defaults are applied; draw code never re-checks them.
    pub fn from_raw(raw: RawTemplateField) -> Self {
        Self {
            id: raw.id.unwrap_or_default(),
            kind: FieldKind::from_str_lenient(raw.kind.as_deref()),
            page: numeric_or(raw.page.as_ref(), 1.0).max(0.0) as u32,
            variable: raw.variable.unwrap_or_default(),
            x_ratio: numeric_or(raw.x_ratio.as_ref(), 0.0),
            y_ratio: numeric_or(raw.y_ratio.as_ref(), 0.0),
            width_ratio: numeric_or(raw.width_ratio.as_ref(), DEFAULT_WIDTH_RATIO),
            height_ratio: numeric_or(raw.height_ratio.as_ref(), DEFAULT_HEIGHT_RATIO),
            font_size: numeric_or(raw.font_size.as_ref(), DEFAULT_FONT_SIZE),
            font_color: raw
                .font_color
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FONT_COLOR.to_string()),
            background_color: raw.background_color.filter(|c| !c.trim().is_empty()),
            required: raw.required.unwrap_or(false),
            offset_x: numeric_or(raw.offset_x.as_ref(), 0.0),
            offset_y: numeric_or(raw.offset_y.as_ref(), 0.0),
        }
    }

    /// The lookup name inside the `${...}` wrapper, or `None` when the
    /// variable is empty or degenerate.
    pub fn variable_name(&self) -> Option<&str> {
        let inner = self
            .variable
            .strip_prefix("${")
            .and_then(|s| s.strip_suffix('}'))
            .unwrap_or(&self.variable)
            .trim();
        if inner.is_empty() {
            None
        } else {
            Some(inner)
        }
    }
}

/// Accept numbers and numeric strings; everything else takes the default.
fn numeric_or(value: Option<&serde_json::Value>, default: f64) -> f64 {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(default),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(default),
        _ => default,
    }
}
