//! Date reformatting for date fields
//!
//! Stored submissions carry ISO `YYYY-MM-DD` dates (HTML date inputs);
//! generated documents display `DD/MM/YYYY`. Values that don't parse are
//! drawn verbatim rather than dropped.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const OUTPUT_FORMAT: &str = "%d/%m/%Y";

/// Reformat a resolved date value for display.
///
/// `YYYY-MM-DD` rewrites to `DD/MM/YYYY`; RFC 3339 and bare
/// `YYYY-MM-DDTHH:MM:SS` timestamps reformat from their date part; any
/// other input passes through unchanged.
pub fn format_date_value(raw: &str) -> String {
    let trimmed = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.format(OUTPUT_FORMAT).to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return dt.format(OUTPUT_FORMAT).to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return dt.format(OUTPUT_FORMAT).to_string();
    }

    raw.to_string()
}
