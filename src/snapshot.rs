// 📸 Property Snapshot - One property's financial state, replaced wholesale
// A snapshot is an immutable view returned by the calculation service.
// Partial mutation is never allowed; a new snapshot swaps in atomically.

use crate::normalize::from_wire_format;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// ============================================================================
// PROPERTY SNAPSHOT
// ============================================================================

/// PropertySnapshot - the three per-provenance value mappings plus the
/// summary cashflow figure.
///
/// Values stay as `serde_json::Value`: most are numbers, but the address is
/// a string and the calculation service emits sentinel strings ("Infinite",
/// "No Debt to Cover") for a few derived metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySnapshot {
    /// Externally sourced facts (list price, tax assessment, quoted rate)
    #[serde(default)]
    pub sourced_facts: HashMap<String, Value>,

    /// Investor assumptions as last stored server-side
    #[serde(default)]
    pub user_inputs: HashMap<String, Value>,

    /// Server-computed metrics
    #[serde(default)]
    pub derived_metrics: HashMap<String, Value>,

    /// Summary figure surfaced on search results
    #[serde(default)]
    pub cashflow_per_unit: f64,

    /// When this snapshot was installed locally
    #[serde(default = "Utc::now")]
    pub retrieved_at: DateTime<Utc>,
}

impl PropertySnapshot {
    /// Parse an inbound wire payload (camelCase keys throughout) into the
    /// working representation (snake_case keys throughout).
    pub fn from_wire(wire: &Value) -> Result<Self> {
        let working = from_wire_format(wire);
        let mut snapshot: PropertySnapshot =
            serde_json::from_value(working).context("malformed property snapshot payload")?;
        snapshot.retrieved_at = Utc::now();
        Ok(snapshot)
    }

    pub fn sourced(&self, key: &str) -> Option<&Value> {
        self.sourced_facts.get(key)
    }

    pub fn user_input(&self, key: &str) -> Option<&Value> {
        self.user_inputs.get(key)
    }

    pub fn derived(&self, key: &str) -> Option<&Value> {
        self.derived_metrics.get(key)
    }
}

// ============================================================================
// PENDING EDITS
// ============================================================================

/// Unsaved numeric overrides keyed by canonical key.
///
/// Cleared on successful submission and whenever the active property
/// identifier changes; never persisted.
pub type PendingEdits = HashMap<String, f64>;

// ============================================================================
// TESTS
// ============================================================================
