// 📋 Report Assembly - Formatted line items for the display shell
// Per-field errors are non-fatal: one broken field renders an error token
// without blocking the rest of the report.

use crate::format::{format_value, to_editable_number, FormatKind};
use crate::registry::{FieldRegistry, LineItemDefinition};
use crate::resolve::resolve;
use crate::snapshot::{PendingEdits, PropertySnapshot};
use serde::Serialize;

/// Visible token rendered in place of a value that failed to resolve.
pub const ERROR_TOKEN: &str = "#ERROR";

// ============================================================================
// REPORT TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ReportLine {
    pub display_name: String,

    /// Formatted value, the not-available marker, or the error token
    pub value: String,

    /// Edit-mode number for editable items (whole percents, raw dollars)
    pub editable: Option<f64>,

    /// Resolution failure detail, when `value` is the error token
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSection {
    pub name: String,
    pub lines: Vec<ReportLine>,
}

// ============================================================================
// ASSEMBLY
// ============================================================================

/// Render one line item against the current snapshot and pending edits.
pub fn render_line(
    item: &LineItemDefinition,
    snapshot: &PropertySnapshot,
    pending: &PendingEdits,
) -> ReportLine {
    let kind = item.format_kind();

    match resolve(item, snapshot, pending) {
        Ok(resolved) => {
            let editable = if item.is_editable() && kind != FormatKind::Text {
                let raw = resolved.as_ref().and_then(|v| v.as_f64()).unwrap_or(0.0);
                Some(to_editable_number(raw, kind))
            } else {
                None
            };

            ReportLine {
                display_name: item.display_name.clone(),
                value: format_value(resolved.as_ref(), kind),
                editable,
                error: None,
            }
        }
        Err(err) => ReportLine {
            display_name: item.display_name.clone(),
            value: ERROR_TOKEN.to_string(),
            editable: None,
            error: Some(err.to_string()),
        },
    }
}

/// Render the complete report: every (section, item) pair from the registry,
/// in declaration order.
pub fn build_report(
    registry: &FieldRegistry,
    snapshot: &PropertySnapshot,
    pending: &PendingEdits,
) -> Vec<ReportSection> {
    registry
        .sections()
        .map(|(name, items)| ReportSection {
            name: name.to_string(),
            lines: items
                .iter()
                .map(|item| render_line(item, snapshot, pending))
                .collect(),
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Provenance;
    use serde_json::json;
    use std::collections::HashMap;

    fn test_snapshot() -> PropertySnapshot {
        serde_json::from_value(json!({
            "sourced_facts": {
                "address": "12 Oak St, Albany, NY 12203",
                "fair_market_value": 450000,
                "offer_price": 440000,
                "number_of_units": 2,
                "gross_rents": 48000
            },
            "user_inputs": { "vacancy_rate": 0.055 },
            "derived_metrics": { "net_operating_income": 21500.0 },
            "cashflow_per_unit": 118.25
        }))
        .unwrap()
    }

    #[test]
    fn test_fair_market_value_renders_as_currency() {
        let registry = FieldRegistry::new();
        let snapshot = test_snapshot();
        let item = registry.find("Fair Market Value").unwrap();

        let line = render_line(item, &snapshot, &HashMap::new());
        assert_eq!(line.value, "$450,000");
        assert!(line.error.is_none());
    }

    #[test]
    fn test_percentage_line_display_and_edit_values() {
        let registry = FieldRegistry::new();
        let snapshot = test_snapshot();
        let item = registry.find("Vacancy Rate").unwrap();

        let line = render_line(item, &snapshot, &HashMap::new());
        assert_eq!(line.value, "5.50%");
        assert!((line.editable.unwrap() - 5.5).abs() < 1e-9);
    }

    #[test]
    fn test_address_renders_verbatim_without_edit_value() {
        let registry = FieldRegistry::new();
        let snapshot = test_snapshot();
        let item = registry.find("Address").unwrap();

        let line = render_line(item, &snapshot, &HashMap::new());
        assert_eq!(line.value, "12 Oak St, Albany, NY 12203");
        assert!(line.editable.is_none());
    }

    #[test]
    fn test_absent_sourced_value_renders_marker() {
        let registry = FieldRegistry::new();
        let snapshot = test_snapshot();
        let item = registry.find("Transfer Tax").unwrap();

        let line = render_line(item, &snapshot, &HashMap::new());
        assert_eq!(line.value, crate::format::NOT_AVAILABLE);
    }

    #[test]
    fn test_unmapped_field_renders_error_token() {
        let snapshot = test_snapshot();
        let rogue = LineItemDefinition::new("Gross Operating Margin", Provenance::Sourced);

        let line = render_line(&rogue, &snapshot, &HashMap::new());
        assert_eq!(line.value, ERROR_TOKEN);
        assert!(line.error.unwrap().contains("Gross Operating Margin"));
    }

    #[test]
    fn test_full_report_covers_every_registry_item() {
        let registry = FieldRegistry::new();
        let snapshot = test_snapshot();

        let report = build_report(&registry, &snapshot, &HashMap::new());

        let line_count: usize = report.iter().map(|s| s.lines.len()).sum();
        assert_eq!(line_count, registry.count());

        // Declared catalog resolves cleanly end to end
        for section in &report {
            for line in &section.lines {
                assert!(line.error.is_none(), "unexpected error on {}", line.display_name);
            }
        }
    }

    #[test]
    fn test_report_preserves_section_order() {
        let registry = FieldRegistry::new();
        let snapshot = test_snapshot();

        let report = build_report(&registry, &snapshot, &HashMap::new());
        assert_eq!(report[0].name, "Property Info");
        assert_eq!(report.last().unwrap().name, "Quick Analysis");
        assert_eq!(report[0].lines[0].display_name, "Address");
    }

    #[test]
    fn test_pending_edit_visible_in_report() {
        let registry = FieldRegistry::new();
        let snapshot = test_snapshot();
        let mut pending = HashMap::new();
        pending.insert("vacancy_rate".to_string(), 0.08);

        let item = registry.find("Vacancy Rate").unwrap();
        let line = render_line(item, &snapshot, &pending);
        assert_eq!(line.value, "8.00%");
        assert!((line.editable.unwrap() - 8.0).abs() < 1e-9);
    }
}
