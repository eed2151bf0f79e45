//! Label normalization and form-data key reconciliation
//!
//! Free-text field labels drift between form authoring and PDF template
//! authoring ("Date de Naissance" vs "date_de_naissance"). Both the
//! submission storage path and the variable resolution path canonicalize
//! labels through [`normalize_label`] so the two sides agree on key names
//! regardless of accents, casing, or whitespace.

use std::collections::BTreeMap;

use signfast_types::{FormData, FormFieldDef, FormValue};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Key used when a label is empty or unusable.
pub const FALLBACK_KEY: &str = "champ_inconnu";

/// Canonical ASCII snake_case key for a human label.
///
/// Lowercase, NFD-decompose and drop combining marks, map everything
/// outside `[a-z0-9]` to `_`, collapse runs, trim the ends. Idempotent.
pub fn normalize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.nfd() {
        if is_combining_mark(c) {
            continue;
        }
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            out.push(c);
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        FALLBACK_KEY.to_string()
    } else {
        out
    }
}

/// How one raw entry was mapped into the canonical key space.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMapping {
    pub original_label: String,
    pub key: String,
    pub value: FormValue,
}

/// Two or more distinct labels collapsed onto the same key. The stored
/// value is whichever label was processed first; the caller decides
/// whether the collision is fatal.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyConflict {
    pub key: String,
    pub labels: Vec<String>,
}

/// Result of reconciling raw submitted data against the declared fields.
#[derive(Debug, Clone, Default)]
pub struct NormalizedFormData {
    pub normalized: FormData,
    pub mappings: Vec<LabelMapping>,
    pub conflicts: Vec<KeyConflict>,
}

/// Reconcile raw submission keys into canonical form.
///
/// Pass 1 walks the declared fields in order (order breaks ties): exact
/// label match first, then any raw key whose normalized form equals the
/// field's normalized label. Pass 2 carries over leftover raw entries so
/// data not tied to a declared field survives; empty values are skipped.
pub fn normalize_form_data(raw: &FormData, fields: &[FormFieldDef]) -> NormalizedFormData {
    let mut result = NormalizedFormData::default();
    let mut consumed: Vec<&str> = Vec::new();
    let mut labels_by_key: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for field in fields {
        let key = normalize_label(&field.label);
        let hit = raw
            .get_key_value(&field.label)
            .or_else(|| {
                raw.iter()
                    .find(|(raw_key, _)| normalize_label(raw_key) == key)
            })
            .map(|(raw_key, value)| (raw_key.as_str(), value));

        if let Some((raw_key, value)) = hit {
            if value.is_empty() {
                continue;
            }
            consumed.push(raw_key);
            let labels = labels_by_key.entry(key.clone()).or_default();
            if !labels.iter().any(|l| l == raw_key) {
                labels.push(raw_key.to_string());
            }
            result.mappings.push(LabelMapping {
                original_label: raw_key.to_string(),
                key: key.clone(),
                value: value.clone(),
            });
            result.normalized.entry(key).or_insert_with(|| value.clone());
        }
    }

    for (raw_key, value) in raw {
        if consumed.iter().any(|c| *c == raw_key.as_str()) || value.is_empty() {
            continue;
        }
        let key = normalize_label(raw_key);
        let labels = labels_by_key.entry(key.clone()).or_default();
        if !labels.iter().any(|l| l == raw_key) {
            labels.push(raw_key.clone());
        }
        result.mappings.push(LabelMapping {
            original_label: raw_key.clone(),
            key: key.clone(),
            value: value.clone(),
        });
        result.normalized.entry(key).or_insert_with(|| value.clone());
    }

    for (key, labels) in labels_by_key {
        if labels.len() > 1 {
            result.conflicts.push(KeyConflict { key, labels });
        }
    }

    result
}

/// Reverse-map normalized keys to the first declared field label that
/// produces them, for display. Keys with no matching field pass through.
pub fn denormalize(normalized: &FormData, fields: &[FormFieldDef]) -> FormData {
    normalized
        .iter()
        .map(|(key, value)| {
            let label = fields
                .iter()
                .find(|f| &normalize_label(&f.label) == key)
                .map(|f| f.label.clone())
                .unwrap_or_else(|| key.clone());
            (label, value.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use signfast_types::FieldKind;

    fn text(s: &str) -> FormValue {
        FormValue::Text(s.to_string())
    }

    fn def(label: &str) -> FormFieldDef {
        FormFieldDef {
            label: label.to_string(),
            kind: FieldKind::Text,
        }
    }

    #[test]
    fn test_normalize_strips_accents_and_case() {
        assert_eq!(normalize_label("Téléphone Mobile"), "telephone_mobile");
        assert_eq!(normalize_label("Date de Naissance"), "date_de_naissance");
        assert_eq!(normalize_label("Prénom (usuel)"), "prenom_usuel");
    }

    #[test]
    fn test_normalize_collapses_and_trims_underscores() {
        assert_eq!(normalize_label("  Nom -- du   client  "), "nom_du_client");
        assert_eq!(normalize_label("___"), FALLBACK_KEY);
    }

    #[test]
    fn test_normalize_empty_yields_fallback() {
        assert_eq!(normalize_label(""), FALLBACK_KEY);
        assert_eq!(normalize_label("  "), FALLBACK_KEY);
        assert_eq!(normalize_label("éàü"), "eau");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for label in ["Téléphone Mobile", "a  b", "NOM", "", "champ_inconnu"] {
            let once = normalize_label(label);
            assert_eq!(normalize_label(&once), once);
        }
    }

    #[test]
    fn test_declared_field_exact_match_wins() {
        let mut raw = FormData::new();
        raw.insert("Nom".to_string(), text("Dupont"));
        let result = normalize_form_data(&raw, &[def("Nom")]);
        assert_eq!(result.normalized.get("nom"), Some(&text("Dupont")));
        assert_eq!(result.mappings.len(), 1);
        assert!(result.conflicts.is_empty());
    }

    #[test]
    fn test_declared_field_matches_by_normalized_key() {
        let mut raw = FormData::new();
        raw.insert("téléphone mobile".to_string(), text("0601020304"));
        let result = normalize_form_data(&raw, &[def("Téléphone Mobile")]);
        assert_eq!(
            result.normalized.get("telephone_mobile"),
            Some(&text("0601020304"))
        );
    }

    #[test]
    fn test_extra_entries_survive_pass_two() {
        let mut raw = FormData::new();
        raw.insert("Nom".to_string(), text("Dupont"));
        raw.insert("Commentaire Libre".to_string(), text("RAS"));
        let result = normalize_form_data(&raw, &[def("Nom")]);
        assert_eq!(result.normalized.get("commentaire_libre"), Some(&text("RAS")));
    }

    #[test]
    fn test_empty_values_are_skipped() {
        let mut raw = FormData::new();
        raw.insert("Nom".to_string(), text(""));
        raw.insert("Ville".to_string(), text("Paris"));
        let result = normalize_form_data(&raw, &[def("Nom")]);
        assert!(!result.normalized.contains_key("nom"));
        assert_eq!(result.normalized.get("ville"), Some(&text("Paris")));
    }

    #[test]
    fn test_conflict_lists_all_colliding_labels() {
        let mut raw = FormData::new();
        raw.insert("Nom".to_string(), text("A"));
        raw.insert("nom".to_string(), text("B"));
        let result = normalize_form_data(&raw, &[]);

        assert_eq!(result.conflicts.len(), 1);
        let conflict = &result.conflicts[0];
        assert_eq!(conflict.key, "nom");
        assert_eq!(conflict.labels.len(), 2);
        assert!(conflict.labels.contains(&"Nom".to_string()));
        assert!(conflict.labels.contains(&"nom".to_string()));

        // First processed label wins the stored value.
        assert_eq!(result.normalized.get("nom"), Some(&text("A")));
    }

    #[test]
    fn test_denormalize_restores_field_labels() {
        let mut raw = FormData::new();
        raw.insert("Date de Naissance".to_string(), text("1990-01-01"));
        raw.insert("extra_key".to_string(), text("x"));
        let fields = vec![def("Date de Naissance")];
        let result = normalize_form_data(&raw, &fields);
        let display = denormalize(&result.normalized, &fields);

        assert_eq!(display.get("Date de Naissance"), Some(&text("1990-01-01")));
        // No matching field: key passes through unchanged.
        assert_eq!(display.get("extra_key"), Some(&text("x")));
    }
}
