//! Delivery status translation.

/// Shown when a status notification arrives without a code.
const MISSING_STATUS: &str = "-";

/// Translate a delivery status code to its display label.
///
/// Known codes fold to their lowercase canonical label regardless of how
/// they were cased on the wire. Unknown codes pass through unchanged so
/// nothing is lost when the platform adds a new one. Absent or empty codes
/// render as `-`.
pub fn translate_status(code: Option<&str>) -> String {
    let raw = code.unwrap_or("").trim();
    if raw.is_empty() {
        return MISSING_STATUS.to_string();
    }
    match raw.to_ascii_lowercase().as_str() {
        label @ ("sent" | "delivered" | "read" | "failed" | "deleted" | "pending") => {
            label.to_string()
        }
        _ => raw.to_string(),
    }
}
