//! PDF fill engine: label normalization, value resolution, rendering
//!
//! Takes a [`Template`](signfast_types::Template) (ordered field
//! placements plus the original PDF bytes) and a
//! [`FormData`](signfast_types::FormData) map, and produces the filled
//! document as one byte buffer. Rendering is synchronous and stateless:
//! each call parses its own document instance, so callers may run
//! independent renders in parallel.

pub mod coords;
pub mod dates;
pub mod error;
pub mod images;
pub mod normalize;
pub mod render;
pub mod resolve;

pub use coords::{fit_rect, ratio_to_page, FieldBox};
pub use dates::format_date_value;
pub use error::PdfFillError;
pub use normalize::{
    denormalize, normalize_form_data, normalize_label, KeyConflict, LabelMapping,
    NormalizedFormData, FALLBACK_KEY,
};
pub use render::render;
pub use resolve::{resolve, LookupStep, MEDIA_CASCADE, SCALAR_CASCADE};

/// Parse PDF bytes and return the page count.
pub fn page_count(bytes: &[u8]) -> Result<u32, PdfFillError> {
    let doc =
        lopdf::Document::load_mem(bytes).map_err(|e| PdfFillError::ParseError(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}
