//! Shared data model for the SignFast fill engine
//!
//! This crate defines the template/field/value types exchanged between the
//! render core and the API surface. All lenient parsing of stored records
//! (field defaults, data-URL payloads) happens here, once, so downstream
//! code works with fully-typed values.

pub mod field;
pub mod template;
pub mod value;

pub use field::{FieldKind, RawTemplateField, TemplateField};
pub use template::{FormFieldDef, Template};
pub use value::{form_data_from_json, FormData, FormValue, ImageData, ImageMime};
