// 🔎 Value Resolver - Current value for a line item
// Provenance-specific lookup with pending-edit precedence. Unmapped sourced
// fields fail loudly instead of defaulting to zero: silent zeros mask schema
// drift between the registry and the remote payload shape.

use crate::registry::LineItemDefinition;
use crate::snapshot::{PendingEdits, PropertySnapshot};
use crate::normalize::Provenance;
use serde_json::Value;

// ============================================================================
// RESOLVE ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A Sourced field has no recognized mapping in the snapshot schema
    UnmappedField { display_name: String },

    /// No snapshot loaded yet for the active property
    MissingSnapshot,
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::UnmappedField { display_name } => {
                write!(f, "no sourced mapping for field '{}'", display_name)
            }
            ResolveError::MissingSnapshot => write!(f, "no snapshot loaded"),
        }
    }
}

impl std::error::Error for ResolveError {}

// ============================================================================
// SOURCED SCHEMA
// ============================================================================

/// The finite set of sourced-fact slots the remote service provides.
/// A sourced line item resolving outside this set is a registry/service
/// schema mismatch and must surface, not default.
fn recognized_sourced_key(key: &str) -> bool {
    matches!(
        key,
        "address"
            | "fair_market_value"
            | "number_of_units"
            | "offer_price"
            | "transfer_tax"
            | "first_mtg_interest_rate"
            | "gross_rents"
            | "property_taxes"
            | "insurance"
            | "association_fees"
    )
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// Resolve the current raw value for a line item.
///
/// `Ok(None)` means the value is genuinely absent and renders as the
/// not-available marker, never as zero.
///
/// Pending edits take precedence over the snapshot for every editable
/// provenance: the displayed value reflects unsaved intent.
pub fn resolve(
    item: &LineItemDefinition,
    snapshot: &PropertySnapshot,
    pending: &PendingEdits,
) -> Result<Option<Value>, ResolveError> {
    let key = item.canonical_key();

    match item.provenance {
        Provenance::Sourced => {
            if !recognized_sourced_key(&key) {
                return Err(ResolveError::UnmappedField {
                    display_name: item.display_name.clone(),
                });
            }
            if let Some(edited) = pending.get(&key) {
                return Ok(Some(Value::from(*edited)));
            }
            match snapshot.sourced(&key) {
                Some(Value::Null) | None => Ok(None),
                Some(value) => Ok(Some(value.clone())),
            }
        }

        Provenance::UserInput => {
            if let Some(edited) = pending.get(&key) {
                return Ok(Some(Value::from(*edited)));
            }
            match snapshot.user_input(&key) {
                Some(Value::Null) | None => Ok(Some(Value::from(0.0))),
                Some(value) => Ok(Some(value.clone())),
            }
        }

        Provenance::Derived => match snapshot.derived(&key) {
            // Tolerate transient absence during partial updates
            Some(Value::Null) | None => Ok(Some(Value::from(0.0))),
            Some(value) => Ok(Some(value.clone())),
        },
    }
}

// ============================================================================
// TESTS
// ============================================================================
