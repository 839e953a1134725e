//! Numeric values: parsing user input and formatting conversion results
//!
//! Results are plain `f64`. Display follows three bands:
//! - above 1,000,000 or below 0.00001: scientific with 2 fractional digits
//! - whole numbers: integer form
//! - everything else: 5 fractional digits
//!
//! Positive results carry a leading space where a minus sign would go, so
//! columns of mixed-sign values line up.

use thiserror::Error;

/// Shown in place of a value when no formula exists or evaluation fails
pub const NOT_AVAILABLE: &str = "N/A";

const SCIENTIFIC_ABOVE: f64 = 1_000_000.0;
const SCIENTIFIC_BELOW: f64 = 0.00001;

/// Errors from parsing a user-supplied value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumberError {
    #[error("Value can't be empty")]
    Empty,

    #[error("'{0}' is not a valid number")]
    Invalid(String),
}

/// Parse a value field as a floating-point number
pub fn parse_value(text: &str) -> Result<f64, NumberError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(NumberError::Empty);
    }
    text.parse::<f64>()
        .map_err(|_| NumberError::Invalid(text.to_string()))
}

/// Format a conversion result for display.
///
/// Returns `None` for NaN and infinities; callers show [`NOT_AVAILABLE`].
pub fn format_result(result: f64) -> Option<String> {
    if !result.is_finite() {
        return None;
    }

    if result > SCIENTIFIC_ABOVE || result < SCIENTIFIC_BELOW {
        return Some(format_scientific(result, 2));
    }

    // In this band the value is at most 1e6, so the cast is exact
    if result.fract() == 0.0 {
        return Some(format!(" {}", result as i64));
    }

    Some(format!(" {:.5}", result))
}

/// Scientific notation with a sign column and a two-digit signed exponent,
/// e.g. `" 2.49e+06"`, `"-5.00e-03"`.
pub fn format_scientific(value: f64, digits: usize) -> String {
    let raw = format!("{:.*e}", digits, value.abs());
    let (mantissa, exponent) = raw.split_once('e').unwrap_or((raw.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    let sign = if value.is_sign_negative() { '-' } else { ' ' };
    let exp_sign = if exponent < 0 { '-' } else { '+' };
    format!("{}{}e{}{:02}", sign, mantissa, exp_sign, exponent.abs())
}

/// Shortest plain rendering of a value, used when echoing user input back
pub fn format_plain(value: f64) -> String {
    format!("{}", value)
}
