//! Field value resolution
//!
//! Maps one template field's `${variable}` to a submitted value. Form
//! labels and template variables are authored by different people at
//! different times, so lookup is layered: canonical key, exact key,
//! case-insensitive key, substring, and (for signature/image fields only)
//! a keyword hint. The cascade is an explicit ordered list so the
//! priority can be tested in isolation.

use signfast_types::{FieldKind, FormData, FormValue, TemplateField};

use crate::normalize::normalize_label;

/// One lookup strategy. Earlier steps always win.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStep {
    /// `data[normalize(name)]`
    NormalizedKey,
    /// `data[name]`, exact and unnormalized
    ExactKey,
    /// Case-insensitive exact key comparison
    CaseInsensitiveKey,
    /// Key contains name or name contains key
    SubstringKey,
    /// First key containing a kind-specific hint word. Fires only when
    /// the variable name is purely generic (nothing but hint words and
    /// separators): a qualified name like `signature_client` must stay
    /// absent rather than borrow another field's payload.
    KeywordHint,
}

/// Cascade for signature/image fields. Every step is gated by the media
/// type predicate so a scalar value can never fill a signature slot.
pub const MEDIA_CASCADE: &[LookupStep] = &[
    LookupStep::NormalizedKey,
    LookupStep::ExactKey,
    LookupStep::CaseInsensitiveKey,
    LookupStep::SubstringKey,
    LookupStep::KeywordHint,
];

/// Cascade for text/number/date/checkbox fields: no type predicate, no
/// keyword broadening.
pub const SCALAR_CASCADE: &[LookupStep] = &[
    LookupStep::NormalizedKey,
    LookupStep::ExactKey,
    LookupStep::CaseInsensitiveKey,
    LookupStep::SubstringKey,
];

const SIGNATURE_HINTS: &[&str] = &["signature", "sign", "signer"];
const IMAGE_HINTS: &[&str] = &["image", "photo", "picture", "img"];

/// Resolve the value for one template field, or `None` when absent.
///
/// Pure: never mutates `data`, and the same inputs always produce the
/// same result.
pub fn resolve<'a>(field: &TemplateField, data: &'a FormData) -> Option<&'a FormValue> {
    let name = field.variable_name()?;

    let (cascade, hints): (&[LookupStep], &[&str]) = match field.kind {
        FieldKind::Signature => (MEDIA_CASCADE, SIGNATURE_HINTS),
        FieldKind::Image => (MEDIA_CASCADE, IMAGE_HINTS),
        _ => (SCALAR_CASCADE, &[]),
    };
    let accepts: fn(&FormValue) -> bool = if field.kind.is_media() {
        |v| matches!(v, FormValue::Image(_))
    } else {
        |v| !v.is_empty()
    };

    cascade
        .iter()
        .find_map(|step| apply_step(*step, name, data, accepts, hints))
}

/// Run a single lookup step. Exposed to the tests so the priority order
/// is checkable one step at a time.
pub(crate) fn apply_step<'a>(
    step: LookupStep,
    name: &str,
    data: &'a FormData,
    accepts: fn(&FormValue) -> bool,
    hints: &[&str],
) -> Option<&'a FormValue> {
    match step {
        LookupStep::NormalizedKey => data.get(&normalize_label(name)).filter(|v| accepts(v)),
        LookupStep::ExactKey => data.get(name).filter(|v| accepts(v)),
        LookupStep::CaseInsensitiveKey => {
            let lower = name.to_lowercase();
            data.iter()
                .find(|(key, value)| key.to_lowercase() == lower && accepts(value))
                .map(|(_, value)| value)
        }
        LookupStep::SubstringKey => {
            let lower = name.to_lowercase();
            data.iter()
                .find(|(key, value)| {
                    let key = key.to_lowercase();
                    (key.contains(&lower) || lower.contains(&key)) && accepts(value)
                })
                .map(|(_, value)| value)
        }
        LookupStep::KeywordHint => {
            let lower = name.to_lowercase();
            if !hints.iter().any(|hint| lower.contains(hint)) || !is_generic_name(&lower, hints) {
                return None;
            }
            data.iter()
                .find(|(key, value)| {
                    let key = key.to_lowercase();
                    hints.iter().any(|hint| key.contains(hint)) && accepts(value)
                })
                .map(|(_, value)| value)
        }
    }
}

/// A name is generic when stripping the hint words leaves no letters:
/// `signature`, `photo_2`, but not `signature_client`.
fn is_generic_name(name_lower: &str, hints: &[&str]) -> bool {
    let mut remainder = name_lower.to_string();
    for hint in hints {
        remainder = remainder.replace(hint, " ");
    }
    !remainder.chars().any(|c| c.is_alphabetic())
}
