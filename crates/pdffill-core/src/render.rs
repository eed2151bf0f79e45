//! PDF generation from a template and submitted data
//!
//! Single pass over the template fields, strictly in order: each field
//! resolves its value, converts its ratio placement to page coordinates,
//! and appends drawing operators to its page. Field failures never abort
//! the pass; only an unparseable source document does.

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use signfast_types::{FieldKind, FormData, Template, TemplateField};
use tracing::{debug, warn};

use crate::coords::{fit_rect, ratio_to_page, FieldBox};
use crate::dates::format_date_value;
use crate::error::PdfFillError;
use crate::images::embed_image;
use crate::resolve::resolve;

/// Font resource name injected on pages that draw text.
const FONT_RESOURCE: &str = "FSF";
/// Left inset for text inside its field box, in points.
const TEXT_INSET: f64 = 2.0;
/// Checkbox squares never exceed this side, whatever the field size.
const CHECKBOX_MAX_SIDE: f64 = 16.0;
/// Point size of the placeholder explanatory text.
const PLACEHOLDER_FONT_SIZE: f64 = 9.0;

const SIGNATURE_PLACEHOLDER: &str = "Signature manquante";
const IMAGE_PLACEHOLDER: &str = "Image manquante";

/// Fill a template with submitted data and return the document bytes.
///
/// The template is read-only input; every call parses its own document
/// instance, so independent calls are safe to run in parallel.
pub fn render(template: &Template, data: &FormData) -> Result<Vec<u8>, PdfFillError> {
    let mut doc = Document::load_mem(&template.original_document)
        .map_err(|e| PdfFillError::ParseError(e.to_string()))?;

    let pages = doc.get_pages();
    let mut font_id = None;
    let mut image_index = 0u32;

    for field in &template.fields {
        let Some(&page_id) = pages.get(&field.page) else {
            warn!(
                field = %field.id,
                page = field.page,
                "Field references a missing page, skipping"
            );
            continue;
        };

        let (page_width, page_height) = page_dimensions(&doc, page_id);
        let rect = ratio_to_page(field, page_width, page_height);

        if let Err(e) = draw_field(&mut doc, page_id, field, &rect, data, &mut font_id, &mut image_index)
        {
            // Drawing failures are contained: one bad field must not
            // sacrifice the rest of the document.
            warn!(field = %field.id, error = %e, "Failed to draw field, skipping");
        }
    }

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfFillError::SaveError(e.to_string()))?;
    Ok(buffer)
}

#[allow(clippy::too_many_arguments)]
fn draw_field(
    doc: &mut Document,
    page_id: ObjectId,
    field: &TemplateField,
    rect: &FieldBox,
    data: &FormData,
    font_id: &mut Option<ObjectId>,
    image_index: &mut u32,
) -> Result<(), PdfFillError> {
    let value = resolve(field, data);

    match field.kind {
        FieldKind::Text | FieldKind::Number | FieldKind::Date => {
            let Some(mut text) = value.and_then(|v| v.as_text()).filter(|t| !t.trim().is_empty())
            else {
                // Empty fields are invisible, not placeholder boxes.
                debug!(field = %field.id, "No value resolved, skipping");
                return Ok(());
            };
            if field.kind == FieldKind::Date {
                text = format_date_value(&text);
            }
            let ops = text_ops(field, rect, &text);
            append_with_font(doc, page_id, font_id, ops)
        }
        FieldKind::Checkbox => {
            let Some(value) = value else {
                debug!(field = %field.id, "No value resolved, skipping");
                return Ok(());
            };
            add_content(doc, page_id, checkbox_ops(rect, value.is_truthy()))
        }
        FieldKind::Signature | FieldKind::Image => {
            let label = if field.kind == FieldKind::Signature {
                SIGNATURE_PLACEHOLDER
            } else {
                IMAGE_PLACEHOLDER
            };
            let Some(image) = value.and_then(|v| v.as_image()) else {
                return draw_placeholder(doc, page_id, rect, label, font_id);
            };
            match embed_image(doc, image) {
                Ok(embedded) => {
                    *image_index += 1;
                    let name = format!("ImSF{}", image_index);
                    ensure_page_resource(doc, page_id, "XObject", &name, embedded.xobject_id)?;
                    let fitted = fit_rect(embedded.width, embedded.height, rect);
                    add_content(doc, page_id, image_ops(&name, &fitted))
                }
                Err(e) => {
                    // Corrupt or unsupported payloads degrade to the same
                    // placeholder as a missing value.
                    warn!(field = %field.id, error = %e, "Image embed failed, drawing placeholder");
                    draw_placeholder(doc, page_id, rect, label, font_id)
                }
            }
        }
    }
}

// ---------------------------------------------------------------------
// Content stream construction
// ---------------------------------------------------------------------

fn text_ops(field: &TemplateField, rect: &FieldBox, text: &str) -> String {
    let mut ops = String::from("q\n");

    if let Some((r, g, b)) = background_fill(field.background_color.as_deref()) {
        ops += &format!(
            "{:.3} {:.3} {:.3} rg\n{:.2} {:.2} {:.2} {:.2} re f\n",
            r, g, b, rect.x, rect.y, rect.width, rect.height
        );
    }

    let (r, g, b) = parse_hex_color(&field.font_color);
    let baseline = rect.y + (rect.height - field.font_size).max(0.0) / 2.0 + field.font_size * 0.2;
    ops += &format!(
        "BT\n/{} {:.2} Tf\n{:.3} {:.3} {:.3} rg\n{:.2} {:.2} Td\n({}) Tj\nET\nQ\n",
        FONT_RESOURCE,
        field.font_size,
        r,
        g,
        b,
        rect.x + TEXT_INSET,
        baseline,
        escape_pdf_text(text)
    );
    ops
}

fn checkbox_ops(rect: &FieldBox, checked: bool) -> String {
    let side = rect.width.min(rect.height).min(CHECKBOX_MAX_SIDE).max(1.0);
    let x = rect.x;
    let y = rect.y + (rect.height - side) / 2.0;

    let mut ops = format!(
        "q\n0 0 0 RG\n1 w\n{:.2} {:.2} {:.2} {:.2} re S\n",
        x, y, side, side
    );
    if checked {
        ops += &format!(
            "1.5 w\n{:.2} {:.2} m\n{:.2} {:.2} l\n{:.2} {:.2} l\nS\n",
            x + side * 0.22,
            y + side * 0.52,
            x + side * 0.42,
            y + side * 0.28,
            x + side * 0.78,
            y + side * 0.74,
        );
    }
    ops += "Q\n";
    ops
}

fn image_ops(name: &str, rect: &FieldBox) -> String {
    format!(
        "q\n{:.2} 0 0 {:.2} {:.2} {:.2} cm\n/{} Do\nQ\n",
        rect.width, rect.height, rect.x, rect.y, name
    )
}

fn placeholder_ops(rect: &FieldBox, label: &str) -> String {
    let mut ops = format!(
        "q\n0.93 0.93 0.93 rg\n{:.2} {:.2} {:.2} {:.2} re f\n\
         0.63 0.63 0.63 RG\n0.75 w\n{:.2} {:.2} {:.2} {:.2} re S\n",
        rect.x, rect.y, rect.width, rect.height, rect.x, rect.y, rect.width, rect.height
    );
    ops += &format!(
        "BT\n/{} {:.2} Tf\n0.4 0.4 0.4 rg\n{:.2} {:.2} Td\n({}) Tj\nET\nQ\n",
        FONT_RESOURCE,
        PLACEHOLDER_FONT_SIZE,
        rect.x + 4.0,
        rect.y + (rect.height - PLACEHOLDER_FONT_SIZE).max(0.0) / 2.0,
        escape_pdf_text(label)
    );
    ops
}

/// Escape a string for a PDF literal. Characters above ASCII are written
/// as WinAnsi octal escapes; anything outside Latin-1 degrades to '?'.
fn escape_pdf_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\\' => out.push_str("\\\\"),
            '\n' | '\r' => out.push(' '),
            c if (c as u32) < 0x80 => out.push(c),
            c if (c as u32) <= 0xFF => out.push_str(&format!("\\{:03o}", c as u32)),
            _ => out.push('?'),
        }
    }
    out
}

/// Parse "#RRGGBB" into 0-1 RGB components; short or malformed input is
/// black.
fn parse_hex_color(color: &str) -> (f32, f32, f32) {
    let hex = color.trim().trim_start_matches('#');
    if hex.len() >= 6 {
        let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0) as f32 / 255.0;
        let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0) as f32 / 255.0;
        let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0) as f32 / 255.0;
        (r, g, b)
    } else {
        (0.0, 0.0, 0.0)
    }
}

/// White and transparent backgrounds draw nothing.
fn background_fill(color: Option<&str>) -> Option<(f32, f32, f32)> {
    let color = color?.trim();
    let lowered = color.to_lowercase();
    if matches!(lowered.as_str(), "" | "#fff" | "#ffffff" | "white" | "transparent") {
        return None;
    }
    Some(parse_hex_color(color))
}

// ---------------------------------------------------------------------
// Document surgery
// ---------------------------------------------------------------------

fn append_with_font(
    doc: &mut Document,
    page_id: ObjectId,
    font_id: &mut Option<ObjectId>,
    ops: String,
) -> Result<(), PdfFillError> {
    let id = *font_id.get_or_insert_with(|| {
        doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        })
    });
    ensure_page_resource(doc, page_id, "Font", FONT_RESOURCE, id)?;
    add_content(doc, page_id, ops)
}

fn draw_placeholder(
    doc: &mut Document,
    page_id: ObjectId,
    rect: &FieldBox,
    label: &str,
    font_id: &mut Option<ObjectId>,
) -> Result<(), PdfFillError> {
    let ops = placeholder_ops(rect, label);
    append_with_font(doc, page_id, font_id, ops)
}

/// Append a self-contained content stream to a page, tolerating Contents
/// stored as a single reference, an array, or missing entirely.
fn add_content(doc: &mut Document, page_id: ObjectId, ops: String) -> Result<(), PdfFillError> {
    let stream_id = doc.add_object(lopdf::Stream::new(Dictionary::new(), ops.into_bytes()));

    let page_dict = doc
        .get_object_mut(page_id)
        .and_then(|o| o.as_dict_mut())
        .map_err(|e| PdfFillError::ParseError(e.to_string()))?;

    match page_dict.remove(b"Contents") {
        Some(Object::Array(mut streams)) => {
            streams.push(Object::Reference(stream_id));
            page_dict.set("Contents", Object::Array(streams));
        }
        Some(existing) => {
            page_dict.set(
                "Contents",
                Object::Array(vec![existing, Object::Reference(stream_id)]),
            );
        }
        None => {
            page_dict.set("Contents", Object::Reference(stream_id));
        }
    }
    Ok(())
}

/// Walk the page's Parent chain for a MediaBox; fall back to A4 when the
/// document carries none.
fn page_dimensions(doc: &Document, page_id: ObjectId) -> (f64, f64) {
    let mut current = Some(page_id);
    while let Some(id) = current {
        let Ok(dict) = doc.get_object(id).and_then(|o| o.as_dict()) else {
            break;
        };
        if let Some((w, h)) = media_box_size(doc, dict) {
            return (w, h);
        }
        current = dict.get(b"Parent").and_then(|p| p.as_reference()).ok();
    }
    (595.0, 842.0)
}

fn media_box_size(doc: &Document, dict: &Dictionary) -> Option<(f64, f64)> {
    let raw = dict.get(b"MediaBox").ok()?;
    let resolved = match raw {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let arr = resolved.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let llx = object_to_f64(&arr[0])?;
    let lly = object_to_f64(&arr[1])?;
    let urx = object_to_f64(&arr[2])?;
    let ury = object_to_f64(&arr[3])?;
    Some((urx - llx, ury - lly))
}

fn object_to_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some((*f).into()),
        _ => None,
    }
}

/// Register `name => target` under the given resource category
/// (Font/XObject) of a page, tolerating Resources stored inline, behind a
/// reference, or missing entirely.
fn ensure_page_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &str,
    name: &str,
    target: ObjectId,
) -> Result<(), PdfFillError> {
    let resources = {
        let page_dict = doc
            .get_object_mut(page_id)
            .and_then(|o| o.as_dict_mut())
            .map_err(|e| PdfFillError::ParseError(e.to_string()))?;
        page_dict
            .remove(b"Resources")
            .unwrap_or_else(|| Object::Dictionary(Dictionary::new()))
    };

    let restored = match resources {
        Object::Reference(id) => {
            let mut owned = doc
                .get_object(id)
                .and_then(|o| o.as_dict())
                .map(|d| d.clone())
                .unwrap_or_else(|_| Dictionary::new());
            insert_into_category(doc, &mut owned, category, name, target);
            if let Ok(obj) = doc.get_object_mut(id) {
                *obj = Object::Dictionary(owned);
            }
            Object::Reference(id)
        }
        Object::Dictionary(mut dict) => {
            insert_into_category(doc, &mut dict, category, name, target);
            Object::Dictionary(dict)
        }
        _ => {
            let mut dict = Dictionary::new();
            insert_into_category(doc, &mut dict, category, name, target);
            Object::Dictionary(dict)
        }
    };

    let page_dict = doc
        .get_object_mut(page_id)
        .and_then(|o| o.as_dict_mut())
        .map_err(|e| PdfFillError::ParseError(e.to_string()))?;
    page_dict.set("Resources", restored);
    Ok(())
}

/// The category entry itself may be inline or a reference.
fn insert_into_category(
    doc: &mut Document,
    resources: &mut Dictionary,
    category: &str,
    name: &str,
    target: ObjectId,
) {
    match resources.remove(category.as_bytes()) {
        Some(Object::Dictionary(mut cat)) => {
            cat.set(name, Object::Reference(target));
            resources.set(category, Object::Dictionary(cat));
        }
        Some(Object::Reference(rid)) => {
            if let Ok(cat) = doc.get_object_mut(rid).and_then(|o| o.as_dict_mut()) {
                cat.set(name, Object::Reference(target));
            }
            resources.set(category, Object::Reference(rid));
        }
        _ => {
            let mut cat = Dictionary::new();
            cat.set(name, Object::Reference(target));
            resources.set(category, Object::Dictionary(cat));
        }
    }
}
