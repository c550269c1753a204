// 🔤 Name Normalizer - Display names ↔ canonical keys
// Two-stage pipeline: mechanical derivation, then per-provenance overrides

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// PROVENANCE
// ============================================================================

/// Provenance - Which value source a line item belongs to
///
/// The same display name can map to different canonical keys depending on
/// which mapping it addresses, so every normalization is provenance-tagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provenance {
    /// External property-data source (read-only fact)
    Sourced,
    /// Investor-supplied assumption
    UserInput,
    /// Server-computed metric
    Derived,
}

impl Provenance {
    /// Human-readable name for display
    pub fn name(&self) -> &str {
        match self {
            Provenance::Sourced => "Sourced",
            Provenance::UserInput => "User Input",
            Provenance::Derived => "Derived",
        }
    }
}

// ============================================================================
// KEY DERIVATION
// ============================================================================

/// Mechanically derive a snake-style key from a display name.
///
/// Lowercases, collapses every run of non-alphanumeric characters into a
/// single underscore, and trims leading/trailing underscores.
///
/// "Fair Market Value" → "fair_market_value"
/// "Laundry / Vending" → "laundry_vending"
/// "Deposit(s) Made with Offer" → "deposit_s_made_with_offer"
pub fn derive_key(display_name: &str) -> String {
    let mut key = String::with_capacity(display_name.len());
    let mut pending_sep = false;

    for ch in display_name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !key.is_empty() {
                key.push('_');
            }
            pending_sep = false;
            key.push(ch.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }

    key
}

/// Irregular display names whose mechanical derivation does not match the
/// canonical key used by the value mappings. One table per provenance.
fn override_key(derived: &str, provenance: Provenance) -> Option<&'static str> {
    match provenance {
        Provenance::Sourced => match derived {
            // "1st Mtg Interest Rate" derives a digit-led key; the sourced
            // facts use the spelled-out form.
            "1st_mtg_interest_rate" => Some("first_mtg_interest_rate"),
            _ => None,
        },
        Provenance::UserInput => match derived {
            "1st_mtg_amortization_period" => Some("first_mtg_amortization_period"),
            "1st_mtg_interest_rate" => Some("first_mtg_interest_rate"),
            "1st_mtg_cmhc_fee" => Some("first_mtg_cmhc_fee"),
            "2nd_mtg_principle_amount" => Some("second_mtg_principle"),
            "2nd_mtg_interest_rate" => Some("second_mtg_interest_rate"),
            "2nd_mtg_amortization_period" => Some("second_mtg_amortization"),
            "interest_only_principle_amount" => Some("interest_only_principle"),
            "interest_only_interest_rate" => Some("interest_only_rate"),
            "other_monthly_financing_costs" => Some("other_monthly_financing"),
            "lawn_snow_maintenance" => Some("lawn_maintenance"),
            "deposit_s_made_with_offer" => Some("deposit_with_offer"),
            _ => None,
        },
        Provenance::Derived => match derived {
            // The Cashflow Summary repeats total expenses under a second name.
            "operating_expenses" => Some("total_expenses"),
            _ => None,
        },
    }
}

/// Normalize a display name to the canonical key addressing the given
/// provenance's value mapping.
pub fn canonical_key(display_name: &str, provenance: Provenance) -> String {
    let derived = derive_key(display_name);
    match override_key(&derived, provenance) {
        Some(key) => key.to_string(),
        None => derived,
    }
}

// ============================================================================
// CASE CONVERSION
// ============================================================================

/// snake_case → camelCase
///
/// Consumes each underscore followed by an ascii lowercase letter and
/// uppercases the letter. Any other underscore is kept, which makes this an
/// exact inverse of `camel_to_snake` for the canonical key set.
pub fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '_' {
            match chars.peek() {
                Some(next) if next.is_ascii_lowercase() => {
                    out.push(next.to_ascii_uppercase());
                    chars.next();
                }
                _ => out.push('_'),
            }
        } else {
            out.push(ch);
        }
    }

    out
}

/// camelCase → snake_case
///
/// Expands each ascii uppercase letter into underscore + lowercase letter.
pub fn camel_to_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);

    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }

    out
}

// ============================================================================
// WIRE FORMAT CONVERSION
// ============================================================================

/// Convert a working-convention (snake) value into wire convention (camel),
/// walking every key of nested mappings and sequences. Scalars pass through.
pub fn to_wire_format(value: &Value) -> Value {
    rename_keys(value, &snake_to_camel)
}

/// Convert a wire-convention (camel) value into working convention (snake).
pub fn from_wire_format(value: &Value) -> Value {
    rename_keys(value, &camel_to_snake)
}

fn rename_keys(value: &Value, rename: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (rename(k), rename_keys(v, rename)))
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| rename_keys(v, rename)).collect())
        }
        scalar => scalar.clone(),
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
    fn test_derive_key_basic() {
        assert_eq!(derive_key("Fair Market Value"), "fair_market_value");
        assert_eq!(derive_key("Gross Rents"), "gross_rents");
        assert_eq!(derive_key("Address"), "address");
    }

    #[test]
    fn test_derive_key_collapses_separator_runs() {
        assert_eq!(derive_key("Laundry / Vending"), "laundry_vending");
        assert_eq!(derive_key("Water / Sewer"), "water_sewer");
        assert_eq!(derive_key("Less Pro-Ration of Rents"), "less_pro_ration_of_rents");
    }

    #[test]
    fn test_derive_key_parenthetical() {
        assert_eq!(
            derive_key("Deposit(s) Made with Offer"),
            "deposit_s_made_with_offer"
        );
    }

    #[test]
    fn test_derive_key_trims_edges() {
        assert_eq!(derive_key("  Misc.  "), "misc");
        assert_eq!(derive_key("(GRM)"), "grm");
    }

    #[test]
    fn test_canonical_key_sourced_override() {
        assert_eq!(
            canonical_key("1st Mtg Interest Rate", Provenance::Sourced),
            "first_mtg_interest_rate"
        );
        // No override needed for a regular name
        assert_eq!(
            canonical_key("Fair Market Value", Provenance::Sourced),
            "fair_market_value"
        );
    }

    #[test]
    fn test_canonical_key_user_input_overrides() {
        assert_eq!(
            canonical_key("2nd Mtg Principle Amount", Provenance::UserInput),
            "second_mtg_principle"
        );
        assert_eq!(
            canonical_key("Lawn / Snow Maintenance", Provenance::UserInput),
            "lawn_maintenance"
        );
        assert_eq!(
            canonical_key("Deposit(s) Made with Offer", Provenance::UserInput),
            "deposit_with_offer"
        );
        assert_eq!(
            canonical_key("Other Monthly Financing Costs", Provenance::UserInput),
            "other_monthly_financing"
        );
    }

    #[test]
    fn test_canonical_key_provenance_dependent() {
        // Same display name, different tables: user-input table rewrites the
        // derived key too, but "Operating Expenses" only aliases under Derived.
        assert_eq!(
            canonical_key("Operating Expenses", Provenance::Derived),
            "total_expenses"
        );
        assert_eq!(
            canonical_key("Operating Expenses", Provenance::Sourced),
            "operating_expenses"
        );
    }

    #[test]
    fn test_snake_to_camel() {
        assert_eq!(snake_to_camel("vacancy_rate"), "vacancyRate");
        assert_eq!(snake_to_camel("first_mtg_cmhc_fee"), "firstMtgCmhcFee");
        assert_eq!(snake_to_camel("address"), "address");
    }

    #[test]
    fn test_snake_to_camel_keeps_underscore_before_digit() {
        // "_1" has no letter to uppercase, so the underscore survives and the
        // round trip stays exact.
        assert_eq!(
            snake_to_camel("equity_roi_after_1_year"),
            "equityRoiAfter_1Year"
        );
    }

    #[test]
    fn test_camel_to_snake() {
        assert_eq!(camel_to_snake("vacancyRate"), "vacancy_rate");
        assert_eq!(camel_to_snake("advertisingCostPerVacancy"), "advertising_cost_per_vacancy");
        assert_eq!(camel_to_snake("equityRoiAfter_1Year"), "equity_roi_after_1_year");
    }

    #[test]
    fn test_case_round_trip_registry_keys() {
        let registry = crate::registry::FieldRegistry::new();

        for (_, items) in registry.sections() {
            for item in items {
                let key = item.canonical_key();
                assert_eq!(
                    camel_to_snake(&snake_to_camel(&key)),
                    key,
                    "round trip broke for {}",
                    key
                );
            }
        }
    }

    #[test]
    fn test_wire_format_round_trip_nested() {
        let working = json!({
            "user_inputs": {
                "vacancy_rate": 0.05,
                "water_sewer": 100.0
            },
            "sourced_facts": {
                "fair_market_value": 450000,
                "address": "12 Oak St"
            },
            "history": [
                { "cashflow_per_unit": 120.5 }
            ],
            "cashflow_per_unit": 120.5
        });

        let wire = to_wire_format(&working);
        assert!(wire.get("userInputs").is_some());
        assert_eq!(wire["userInputs"]["vacancyRate"], json!(0.05));
        assert_eq!(wire["history"][0]["cashflowPerUnit"], json!(120.5));

        // Scalars pass through unchanged
        assert_eq!(wire["sourcedFacts"]["address"], json!("12 Oak St"));

        assert_eq!(from_wire_format(&wire), working);
    }
}
