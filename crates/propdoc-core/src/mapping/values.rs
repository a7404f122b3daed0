//! Field-level coercions for values returned by the reasoning service.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::records::NOT_FOUND;

/// Accepted date layouts, tried in order.
const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];

/// Coerce a currency value to a float.
///
/// Numbers pass through unchanged. Strings lose `$` and thousands separators
/// before parsing; anything left that is not a number yields `None`, never zero.
pub fn clean_currency(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned = s.replace(['$', ','], "");
            cleaned.trim().parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}

/// Parse a date in `MM/DD/YYYY` or `YYYY-MM-DD` form.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date_str(s),
        Value::Null => None,
        other => {
            warn!("Invalid date value: {}", other);
            None
        }
    }
}

pub fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == NOT_FOUND {
        debug!("Date not present in document");
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    warn!("Failed to parse date: {}", raw);
    None
}

/// Integer count, or `None` when absent or not numeric.
pub fn to_int_or_none(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Text value with the `"Not Found"` sentinel and blanks treated as absent.
pub fn text_or_none(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };

    if text.is_empty() || text == NOT_FOUND {
        None
    } else {
        Some(text)
    }
}

/// Text value falling back to `default` when absent.
pub fn text_or(value: Option<&Value>, default: &str) -> String {
    text_or_none(value).unwrap_or_else(|| default.to_string())
}

/// Truthiness of a flag: `true` unless explicitly `false`, `0`, `"false"`, `"0"` or `"no"`.
pub fn flag_or_true(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_none_or(|v| v != 0.0),
        Some(Value::String(s)) => {
            !matches!(s.trim().to_lowercase().as_str(), "false" | "0" | "no")
        }
        _ => true,
    }
}

/// Flag that is only set when explicitly true.
pub fn flag_or_false(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => {
            matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes")
        }
        _ => false,
    }
}

/// `round(amount - paid, 2)`, rounding half to even on the decimal value.
pub fn remaining_balance(amount: f64, paid: f64) -> f64 {
    match (Decimal::try_from(amount), Decimal::try_from(paid)) {
        (Ok(a), Ok(p)) => (a - p).round_dp(2).to_f64().unwrap_or(amount - paid),
        _ => ((amount - paid) * 100.0).round() / 100.0,
    }
}
