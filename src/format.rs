// 💲 Format Engine - Raw values ↔ display strings ↔ edit-mode numbers
// Raw percentages are stored as fractions (0.065); the ×100 presentation
// lives here and only here, on both the read and write paths.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Marker rendered for a null or missing value. Distinct from zero: "no
/// data" must never display as "$0".
pub const NOT_AVAILABLE: &str = "N/A";

// ============================================================================
// FORMAT KINDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatKind {
    /// US-dollar string, grouped, no cents: "$450,000"
    Currency,
    /// Fraction rendered as whole percent with two decimals: "5.50%"
    Percentage,
    /// Grouped integer: "1,250"
    PlainNumber,
    /// Rendered verbatim (address and calculator sentinels)
    Text,
}

/// Classify a display name when the registry declares no explicit format.
///
/// Substring heuristics: rate/ratio names are percentages, money-word names
/// are currency, everything else is a plain number.
pub fn classify(display_name: &str) -> FormatKind {
    let name = display_name.to_lowercase();

    if name.contains("rate") || name.contains("ratio") {
        return FormatKind::Percentage;
    }

    const CURRENCY_WORDS: [&str; 10] = [
        "price", "cost", "value", "fee", "rent", "income", "expense", "tax", "insurance", "cash",
    ];
    if CURRENCY_WORDS.iter().any(|w| name.contains(w)) {
        return FormatKind::Currency;
    }

    FormatKind::PlainNumber
}

// ============================================================================
// DISPLAY RENDERING
// ============================================================================

/// Render a raw value for display.
///
/// `None` or JSON null renders as the not-available marker. String values
/// render verbatim regardless of kind: the address, and the calculator's
/// "Infinite" / "No Debt to Cover" sentinels, pass straight through.
pub fn format_value(value: Option<&Value>, kind: FormatKind) -> String {
    let value = match value {
        Some(Value::Null) | None => return NOT_AVAILABLE.to_string(),
        Some(v) => v,
    };

    if let Value::String(text) = value {
        return text.clone();
    }

    let number = match value.as_f64() {
        Some(n) if n.is_finite() => n,
        _ => return NOT_AVAILABLE.to_string(),
    };

    match kind {
        FormatKind::Currency => format_currency(number),
        FormatKind::Percentage => format!("{:.2}%", number * 100.0),
        FormatKind::PlainNumber => group_thousands(number.round() as i64),
        FormatKind::Text => value.to_string(),
    }
}

fn format_currency(value: f64) -> String {
    let rounded = value.round() as i64;
    if rounded < 0 {
        format!("-${}", group_thousands(-rounded))
    } else {
        format!("${}", group_thousands(rounded))
    }
}

/// Insert comma separators into a non-negative integer, US convention.
fn group_thousands(value: i64) -> String {
    let digits = value.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

// ============================================================================
// EDIT-MODE CONVERSION
// ============================================================================

/// Convert a raw stored value into the number shown in an edit field.
///
/// Percentages edit as whole percents: raw 0.055 edits as 5.5.
pub fn to_editable_number(raw: f64, kind: FormatKind) -> f64 {
    match kind {
        FormatKind::Percentage => raw * 100.0,
        _ => raw,
    }
}

/// Convert an edited number back into the raw stored representation.
///
/// Exact inverse of `to_editable_number`: editing a percentage field to 6
/// yields raw 0.06.
pub fn from_editable_number(edited: f64, kind: FormatKind) -> f64 {
    match kind {
        FormatKind::Percentage => edited / 100.0,
        _ => edited,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_rates_and_ratios() {
        assert_eq!(classify("Vacancy Rate"), FormatKind::Percentage);
        assert_eq!(classify("Expense to Income Ratio"), FormatKind::Percentage);
        assert_eq!(classify("1st Mtg Interest Rate"), FormatKind::Percentage);
    }

    #[test]
    fn test_classify_currency_words() {
        assert_eq!(classify("Offer Price"), FormatKind::Currency);
        assert_eq!(classify("Gross Rents"), FormatKind::Currency);
        assert_eq!(classify("Property Taxes"), FormatKind::Currency);
        assert_eq!(classify("Advertising Cost per Vacancy"), FormatKind::Currency);
        assert_eq!(classify("Total Cash Required"), FormatKind::Currency);
    }

    #[test]
    fn test_classify_fallback_plain_number() {
        assert_eq!(classify("Number of Units"), FormatKind::PlainNumber);
        assert_eq!(classify("GRM"), FormatKind::PlainNumber);
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_value(Some(&json!(450000)), FormatKind::Currency), "$450,000");
        assert_eq!(format_value(Some(&json!(1234567.4)), FormatKind::Currency), "$1,234,567");
        assert_eq!(format_value(Some(&json!(0)), FormatKind::Currency), "$0");
        assert_eq!(format_value(Some(&json!(-1234.6)), FormatKind::Currency), "-$1,235");
    }

    #[test]
    fn test_format_percentage_two_decimals() {
        assert_eq!(format_value(Some(&json!(0.055)), FormatKind::Percentage), "5.50%");
        assert_eq!(format_value(Some(&json!(0.1)), FormatKind::Percentage), "10.00%");
        assert_eq!(format_value(Some(&json!(0.0325)), FormatKind::Percentage), "3.25%");
    }

    #[test]
    fn test_format_plain_number() {
        assert_eq!(format_value(Some(&json!(2)), FormatKind::PlainNumber), "2");
        assert_eq!(format_value(Some(&json!(1250)), FormatKind::PlainNumber), "1,250");
    }

    #[test]
    fn test_missing_value_renders_marker_not_zero() {
        assert_eq!(format_value(None, FormatKind::Currency), NOT_AVAILABLE);
        assert_eq!(format_value(Some(&Value::Null), FormatKind::Percentage), NOT_AVAILABLE);
    }

    #[test]
    fn test_string_values_pass_through() {
        assert_eq!(
            format_value(Some(&json!("12 Oak St, Albany, NY 12203")), FormatKind::Text),
            "12 Oak St, Albany, NY 12203"
        );
        // Calculator sentinels survive even under a numeric kind
        assert_eq!(
            format_value(Some(&json!("Infinite")), FormatKind::Percentage),
            "Infinite"
        );
        assert_eq!(
            format_value(Some(&json!("No Debt to Cover")), FormatKind::PlainNumber),
            "No Debt to Cover"
        );
    }

    #[test]
    fn test_percentage_edit_mode() {
        assert!((to_editable_number(0.055, FormatKind::Percentage) - 5.5).abs() < 1e-9);
        assert!((from_editable_number(6.0, FormatKind::Percentage) - 0.06).abs() < 1e-9);
    }

    #[test]
    fn test_percentage_edit_round_trip() {
        for raw in [0.0, 0.055, 0.1, 0.0001, 1.0, 12.5] {
            let round_tripped =
                from_editable_number(to_editable_number(raw, FormatKind::Percentage), FormatKind::Percentage);
            assert!((round_tripped - raw).abs() < 1e-9, "round trip broke for {}", raw);
        }
    }

    #[test]
    fn test_currency_edit_mode_is_identity() {
        assert_eq!(to_editable_number(450000.0, FormatKind::Currency), 450000.0);
        assert_eq!(from_editable_number(460000.0, FormatKind::Currency), 460000.0);
    }
}
