// 🗂️ Field Registry - Declarative catalog of every line item
// The single source of truth for what fields exist, where they come from,
// and how they render. Resolver and controller never invent ad hoc fields.

use crate::format::{classify, FormatKind};
use crate::normalize::{canonical_key, Provenance};
use serde::{Deserialize, Serialize};

// ============================================================================
// LINE ITEM DEFINITION
// ============================================================================

/// One addressable line item of the property report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemDefinition {
    /// Human-readable name, unique within its section
    pub display_name: String,

    /// Which value source this item resolves against
    pub provenance: Provenance,

    /// Explicit format; when absent the display name is classified by
    /// the Format Engine's heuristics
    pub format: Option<FormatKind>,
}

impl LineItemDefinition {
    pub fn new(display_name: impl Into<String>, provenance: Provenance) -> Self {
        LineItemDefinition {
            display_name: display_name.into(),
            provenance,
            format: None,
        }
    }

    /// Builder: declare an explicit format where the heuristics guess wrong
    pub fn with_format(mut self, format: FormatKind) -> Self {
        self.format = Some(format);
        self
    }

    /// Effective format: explicit declaration wins, heuristics otherwise
    pub fn format_kind(&self) -> FormatKind {
        self.format.unwrap_or_else(|| classify(&self.display_name))
    }

    /// Canonical key addressing this item's provenance mapping
    pub fn canonical_key(&self) -> String {
        canonical_key(&self.display_name, self.provenance)
    }

    /// Derived metrics are read-only; everything numeric else accepts edits
    pub fn is_editable(&self) -> bool {
        self.provenance != Provenance::Derived && self.format_kind() != FormatKind::Text
    }
}

// ============================================================================
// FIELD REGISTRY
// ============================================================================

struct Section {
    name: String,
    items: Vec<LineItemDefinition>,
}

/// FieldRegistry - ordered sections of ordered line items.
///
/// Purely data: section order and item order are declaration order and are
/// preserved verbatim on render.
pub struct FieldRegistry {
    sections: Vec<Section>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        let mut registry = FieldRegistry {
            sections: Vec::new(),
        };

        registry.register_catalog();
        registry
    }

    fn register_catalog(&mut self) {
        use FormatKind::{Currency, Percentage, PlainNumber, Text};
        use Provenance::{Derived, Sourced, UserInput};

        // ====================================================================
        // PROPERTY INFO
        // ====================================================================

        self.begin_section("Property Info");
        self.register(LineItemDefinition::new("Address", Sourced).with_format(Text));
        self.register(LineItemDefinition::new("Fair Market Value", Sourced));
        self.register(LineItemDefinition::new("Number of Units", Sourced).with_format(PlainNumber));
        self.register(LineItemDefinition::new("Vacancy Rate", UserInput));
        self.register(LineItemDefinition::new("Management Rate", UserInput));
        self.register(LineItemDefinition::new("Advertising Cost per Vacancy", UserInput));
        self.register(LineItemDefinition::new("Annual Appreciation Rate", UserInput));

        // ====================================================================
        // PURCHASE INFO
        // ====================================================================

        self.begin_section("Purchase Info");
        self.register(LineItemDefinition::new("Offer Price", Sourced));
        self.register(LineItemDefinition::new("Transfer Tax", Sourced));
        self.register(LineItemDefinition::new("Repairs", UserInput).with_format(Currency));
        self.register(LineItemDefinition::new("Repairs Contingency", UserInput).with_format(Currency));
        self.register(LineItemDefinition::new("Lender Fee", UserInput));
        self.register(LineItemDefinition::new("Broker Fee", UserInput));
        self.register(LineItemDefinition::new("Environmentals", UserInput).with_format(Currency));
        self.register(LineItemDefinition::new("Inspections", UserInput).with_format(Currency));
        self.register(LineItemDefinition::new("Appraisals", UserInput).with_format(Currency));
        self.register(LineItemDefinition::new("Misc", UserInput).with_format(Currency));
        self.register(LineItemDefinition::new("Legal", UserInput).with_format(Currency));
        self.register(LineItemDefinition::new("Real Purchase Price", Derived));

        // ====================================================================
        // FINANCING
        // ====================================================================

        self.begin_section("Financing");
        self.register(LineItemDefinition::new("1st Mtg Interest Rate", Sourced));
        self.register(LineItemDefinition::new("1st Mtg Amortization Period", UserInput).with_format(PlainNumber));
        // CMHC fee is a premium rate, not a dollar fee
        self.register(LineItemDefinition::new("1st Mtg CMHC Fee", UserInput).with_format(Percentage));
        self.register(LineItemDefinition::new("2nd Mtg Principle Amount", UserInput).with_format(Currency));
        self.register(LineItemDefinition::new("2nd Mtg Interest Rate", UserInput));
        self.register(LineItemDefinition::new("2nd Mtg Amortization Period", UserInput).with_format(PlainNumber));
        self.register(LineItemDefinition::new("Interest Only Principle Amount", UserInput).with_format(Currency));
        self.register(LineItemDefinition::new("Interest Only Interest Rate", UserInput));
        self.register(LineItemDefinition::new("Other Monthly Financing Costs", UserInput));
        self.register(LineItemDefinition::new("First Mortgage Principle Borrowed", Derived).with_format(Currency));
        self.register(LineItemDefinition::new("First Mortgage Total Principle", Derived).with_format(Currency));
        self.register(LineItemDefinition::new("First Mortgage Total Monthly Payment", Derived).with_format(Currency));
        self.register(LineItemDefinition::new("Second Mortgage Total Monthly Payment", Derived).with_format(Currency));
        self.register(LineItemDefinition::new("Interest Only Total Monthly Payment", Derived).with_format(Currency));
        self.register(LineItemDefinition::new("Cash Required to Close After Financing", Derived));

        // ====================================================================
        // INCOME (ANNUAL)
        // ====================================================================

        self.begin_section("Income");
        self.register(LineItemDefinition::new("Gross Rents", Sourced));
        self.register(LineItemDefinition::new("Parking", UserInput).with_format(Currency));
        self.register(LineItemDefinition::new("Storage", UserInput).with_format(Currency));
        self.register(LineItemDefinition::new("Laundry / Vending", UserInput).with_format(Currency));
        self.register(LineItemDefinition::new("Other Income", UserInput));
        self.register(LineItemDefinition::new("Total Income", Derived));
        // Dollar loss, despite the name
        self.register(LineItemDefinition::new("Vacancy Loss Percentage", Derived).with_format(Currency));
        self.register(LineItemDefinition::new("Effective Gross Income", Derived));

        // ====================================================================
        // OPERATING EXPENSES (ANNUAL)
        // ====================================================================

        self.begin_section("Operating Expenses");
        self.register(LineItemDefinition::new("Property Taxes", Sourced));
        self.register(LineItemDefinition::new("Insurance", Sourced));
        self.register(LineItemDefinition::new("Association Fees", Sourced));
        self.register(LineItemDefinition::new("Repairs Rate", UserInput));
        self.register(LineItemDefinition::new("Electricity", UserInput).with_format(Currency));
        self.register(LineItemDefinition::new("Gas", UserInput).with_format(Currency));
        self.register(LineItemDefinition::new("Lawn / Snow Maintenance", UserInput).with_format(Currency));
        self.register(LineItemDefinition::new("Water / Sewer", UserInput).with_format(Currency));
        self.register(LineItemDefinition::new("Cable", UserInput).with_format(Currency));
        self.register(LineItemDefinition::new("Caretaking", UserInput).with_format(Currency));
        self.register(LineItemDefinition::new("Trash Removal", UserInput).with_format(Currency));
        self.register(LineItemDefinition::new("Miscellaneous", UserInput).with_format(Currency));
        self.register(LineItemDefinition::new("Common Area Maintenance", UserInput).with_format(Currency));
        self.register(LineItemDefinition::new("Capital Improvements", UserInput).with_format(Currency));
        self.register(LineItemDefinition::new("Accounting", UserInput).with_format(Currency));
        self.register(LineItemDefinition::new("Legal Expenses", UserInput));
        self.register(LineItemDefinition::new("Bad Debts", UserInput).with_format(Currency));
        self.register(LineItemDefinition::new("Other Expenses", UserInput));
        self.register(LineItemDefinition::new("Repairs Cost", Derived));
        self.register(LineItemDefinition::new("Management", Derived).with_format(Currency));
        self.register(LineItemDefinition::new("Advertising", Derived).with_format(Currency));
        self.register(LineItemDefinition::new("Pest Control", Derived).with_format(Currency));
        self.register(LineItemDefinition::new("Security", Derived).with_format(Currency));
        self.register(LineItemDefinition::new("Evictions", Derived).with_format(Currency));
        self.register(LineItemDefinition::new("Total Expenses", Derived));

        // ====================================================================
        // CASH REQUIREMENTS
        // ====================================================================

        self.begin_section("Cash Requirements");
        self.register(LineItemDefinition::new("Deposit(s) Made with Offer", UserInput).with_format(Currency));
        // "Pro-Ration" trips the ratio heuristic
        self.register(LineItemDefinition::new("Less Pro-Ration of Rents", UserInput).with_format(Currency));
        self.register(LineItemDefinition::new("Cash Required to Close", Derived));
        self.register(LineItemDefinition::new("Total Cash Required", Derived));

        // ====================================================================
        // CASHFLOW SUMMARY (ANNUAL)
        // ====================================================================

        self.begin_section("Cashflow Summary");
        self.register(LineItemDefinition::new("Effective Gross Income", Derived));
        self.register(LineItemDefinition::new("Operating Expenses", Derived).with_format(Currency));
        self.register(LineItemDefinition::new("Net Operating Income", Derived));
        self.register(LineItemDefinition::new("Debt Servicing Costs", Derived));
        self.register(LineItemDefinition::new("Annual Profit or Loss", Derived).with_format(Currency));
        self.register(LineItemDefinition::new("Total Monthly Profit or Loss", Derived).with_format(Currency));
        self.register(LineItemDefinition::new("Cashflow per Unit per Month", Derived));

        // ====================================================================
        // QUICK ANALYSIS
        // ====================================================================

        self.begin_section("Quick Analysis");
        self.register(LineItemDefinition::new("First Mortgage LTV", Derived).with_format(Percentage));
        self.register(LineItemDefinition::new("First Mortgage LTPP", Derived).with_format(Percentage));
        self.register(LineItemDefinition::new("Second Mortgage LTV", Derived).with_format(Percentage));
        self.register(LineItemDefinition::new("Second Mortgage LTPP", Derived).with_format(Percentage));
        self.register(LineItemDefinition::new("Cap Rate on PP", Derived));
        self.register(LineItemDefinition::new("Cap Rate on FMV", Derived));
        self.register(LineItemDefinition::new("Average Rent", Derived));
        self.register(LineItemDefinition::new("GRM", Derived));
        self.register(LineItemDefinition::new("DCR", Derived));
        self.register(LineItemDefinition::new("Cash on Cash ROI", Derived).with_format(Percentage));
        self.register(LineItemDefinition::new("Equity ROI after 1 Year", Derived).with_format(Percentage));
        self.register(LineItemDefinition::new("Appreciation ROI after 1 Year", Derived).with_format(Percentage));
        self.register(LineItemDefinition::new("Total ROI after 1 Year", Derived).with_format(Percentage));
        self.register(LineItemDefinition::new("Forced App ROI after 1 Year", Derived).with_format(Percentage));
        self.register(LineItemDefinition::new("Expense to Income Ratio", Derived));
    }

    fn begin_section(&mut self, name: &str) {
        self.sections.push(Section {
            name: name.to_string(),
            items: Vec::new(),
        });
    }

    fn register(&mut self, item: LineItemDefinition) {
        if let Some(section) = self.sections.last_mut() {
            debug_assert!(
                !section.items.iter().any(|i| i.display_name == item.display_name),
                "duplicate display name in section"
            );
            section.items.push(item);
        }
    }

    /// Ordered sections with their ordered line items
    pub fn sections(&self) -> impl Iterator<Item = (&str, &[LineItemDefinition])> {
        self.sections
            .iter()
            .map(|s| (s.name.as_str(), s.items.as_slice()))
    }

    /// Find an item by display name (first match in section order)
    pub fn find(&self, display_name: &str) -> Option<&LineItemDefinition> {
        self.sections
            .iter()
            .flat_map(|s| s.items.iter())
            .find(|item| item.display_name == display_name)
    }

    /// Every declared item with the given provenance, in render order.
    /// Duplicate display names across sections collapse to one entry.
    pub fn items_with_provenance(&self, provenance: Provenance) -> Vec<&LineItemDefinition> {
        let mut seen: Vec<&str> = Vec::new();
        let mut items = Vec::new();

        for section in &self.sections {
            for item in &section.items {
                if item.provenance == provenance && !seen.contains(&item.display_name.as_str()) {
                    seen.push(&item.display_name);
                    items.push(item);
                }
            }
        }

        items
    }

    /// Count total line items (duplicates across sections included)
    pub fn count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = FieldRegistry::new();
        assert!(registry.count() > 80, "catalog should be exhaustive");
    }

    #[test]
    fn test_section_order_preserved() {
        let registry = FieldRegistry::new();
        let names: Vec<&str> = registry.sections().map(|(name, _)| name).collect();

        assert_eq!(
            names,
            vec![
                "Property Info",
                "Purchase Info",
                "Financing",
                "Income",
                "Operating Expenses",
                "Cash Requirements",
                "Cashflow Summary",
                "Quick Analysis",
            ]
        );
    }

    #[test]
    fn test_item_order_within_section_preserved() {
        let registry = FieldRegistry::new();
        let (_, items) = registry.sections().next().unwrap();

        assert_eq!(items[0].display_name, "Address");
        assert_eq!(items[1].display_name, "Fair Market Value");
        assert_eq!(items[2].display_name, "Number of Units");
    }

    #[test]
    fn test_find_by_display_name() {
        let registry = FieldRegistry::new();

        let item = registry.find("Fair Market Value").unwrap();
        assert_eq!(item.provenance, Provenance::Sourced);
        assert_eq!(item.canonical_key(), "fair_market_value");

        assert!(registry.find("Gross Operating Margin").is_none());
    }

    #[test]
    fn test_explicit_format_wins_over_heuristic() {
        let registry = FieldRegistry::new();

        // "Fee" would classify as Currency; CMHC fee is declared a percentage
        let cmhc = registry.find("1st Mtg CMHC Fee").unwrap();
        assert_eq!(cmhc.format_kind(), FormatKind::Percentage);

        // "Pro-Ration" would classify as Percentage; declared currency
        let pro_ration = registry.find("Less Pro-Ration of Rents").unwrap();
        assert_eq!(pro_ration.format_kind(), FormatKind::Currency);
    }

    #[test]
    fn test_heuristic_used_when_format_absent() {
        let registry = FieldRegistry::new();

        let fmv = registry.find("Fair Market Value").unwrap();
        assert!(fmv.format.is_none());
        assert_eq!(fmv.format_kind(), FormatKind::Currency);

        let vacancy = registry.find("Vacancy Rate").unwrap();
        assert_eq!(vacancy.format_kind(), FormatKind::Percentage);
    }

    #[test]
    fn test_user_input_items_are_declared_and_unique() {
        let registry = FieldRegistry::new();
        let inputs = registry.items_with_provenance(Provenance::UserInput);

        // The analysis workbook carries 42 investor assumptions
        assert_eq!(inputs.len(), 42);

        let mut keys: Vec<String> = inputs.iter().map(|i| i.canonical_key()).collect();
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total, "canonical user-input keys must be unique");
    }

    #[test]
    fn test_sourced_items() {
        let registry = FieldRegistry::new();
        let sourced = registry.items_with_provenance(Provenance::Sourced);
        let keys: Vec<String> = sourced.iter().map(|i| i.canonical_key()).collect();

        assert_eq!(sourced.len(), 10);
        assert!(keys.contains(&"address".to_string()));
        assert!(keys.contains(&"first_mtg_interest_rate".to_string()));
        assert!(keys.contains(&"association_fees".to_string()));
    }

    #[test]
    fn test_editability() {
        let registry = FieldRegistry::new();

        assert!(registry.find("Vacancy Rate").unwrap().is_editable());
        assert!(registry.find("Offer Price").unwrap().is_editable());
        assert!(!registry.find("Net Operating Income").unwrap().is_editable());
        assert!(!registry.find("Address").unwrap().is_editable());
    }
}
