//! Ratio-coordinate conversion
//!
//! Template fields store positions as fractions of the page, measured
//! from the top-left corner (how the form builder overlays them on a
//! rendered page image). PDF user space has its origin at the bottom-left,
//! so the Y axis flips during conversion. Offsets are absolute points
//! applied after conversion as a sub-pixel alignment escape hatch.

use signfast_types::TemplateField;

/// An absolute rectangle on a page, in PDF points, bottom-left anchored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Convert a field's ratio placement to absolute page coordinates.
///
/// Ratios are not clamped: out-of-range placement simply draws off-page.
pub fn ratio_to_page(field: &TemplateField, page_width: f64, page_height: f64) -> FieldBox {
    FieldBox {
        x: field.x_ratio * page_width + field.offset_x,
        y: (1.0 - field.y_ratio - field.height_ratio) * page_height + field.offset_y,
        width: field.width_ratio * page_width,
        height: field.height_ratio * page_height,
    }
}

/// Scale an image into a box preserving aspect ratio, centered both ways.
pub fn fit_rect(image_width: u32, image_height: u32, bounds: &FieldBox) -> FieldBox {
    if image_width == 0 || image_height == 0 || bounds.width <= 0.0 || bounds.height <= 0.0 {
        return *bounds;
    }
    let scale = (bounds.width / image_width as f64).min(bounds.height / image_height as f64);
    let width = image_width as f64 * scale;
    let height = image_height as f64 * scale;
    FieldBox {
        x: bounds.x + (bounds.width - width) / 2.0,
        y: bounds.y + (bounds.height - height) / 2.0,
        width,
        height,
    }
}
