//! Cell text to Lua literal conversion.
//!
//! Coercion never fails: malformed numbers and unknown text are passed through as-is
//! and the designer sees the result in the generated file.
use crate::schema::FieldKind;

/// Fraction digits kept when a number is re-rendered.
const NUMBER_PRECISION: usize = 3;

/// Converts raw cell text to the literal for a field of type `kind`.
pub fn coerce(kind: FieldKind, raw: &str) -> String {
    match kind {
        FieldKind::Number => coerce_number(raw),
        FieldKind::Bool => coerce_bool(raw).to_owned(),
        FieldKind::String => format!("\"{raw}\""),
        FieldKind::Array => raw.to_owned(),
    }
}

/// Normalizes numbers carrying more than three characters after the decimal point
/// to at most three fraction digits, without trailing zeros.
///
/// Empty cells become `0`. Text that does not parse is returned unchanged.
pub fn coerce_number(raw: &str) -> String {
    if let Some(dot) = raw.find('.') {
        if raw.len() - dot - 1 > NUMBER_PRECISION {
            if let Ok(value) = raw.parse::<f64>() {
                let rendered = format!("{:.*}", NUMBER_PRECISION, value);
                return rendered.trim_end_matches('0').trim_end_matches('.').to_owned();
            }
        }
    }
    if raw.is_empty() {
        "0".to_owned()
    } else {
        raw.to_owned()
    }
}

/// `1` and `true` (any case) are true, everything else is false.
pub fn coerce_bool(raw: &str) -> &'static str {
    if raw == "1" || raw.eq_ignore_ascii_case("true") {
        "true"
    } else {
        "false"
    }
}
