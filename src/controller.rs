// 🎛️ Edit/Recalculate Controller - Explicit state container for one property
// Owns the active snapshot and the pending edits, merges the recalculation
// payload, and tags every outbound request so stale responses are discarded.

use crate::format::{from_editable_number, FormatKind};
use crate::normalize::{to_wire_format, Provenance};
use crate::registry::FieldRegistry;
use crate::resolve::{resolve, ResolveError};
use crate::snapshot::{PendingEdits, PropertySnapshot};
use crate::transport::{Transport, TransportError};
use serde_json::{json, Map, Value};
use uuid::Uuid;

// ============================================================================
// CONTROLLER STATE
// ============================================================================

/// Viewing → Editing → Recalculating → back to Viewing on success, or back
/// to Editing with edits intact on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// No pending edits; values come straight from the current snapshot
    Viewing,
    /// One or more pending edits recorded
    Editing,
    /// A submission is in flight; re-entrant submission is refused
    Recalculating,
}

/// Identity of one outbound recalculation request. A response is applied
/// only if its tag still matches the controller's in-flight request and the
/// active property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTag {
    pub request_id: Uuid,
    pub property_id: String,
}

// ============================================================================
// CONTROLLER ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerError {
    /// No property selected yet
    NoActiveProperty,

    /// No snapshot loaded for the active property
    MissingSnapshot,

    /// A recalculation is already in flight for this property
    RecalculationInFlight,

    /// Display name not declared in the Field Registry
    UnknownField(String),

    /// The field exists but does not accept edits
    FieldNotEditable(String),

    /// The service answered with something that is not a snapshot
    MalformedSnapshot(String),

    /// Credentials rejected; the session has been invalidated
    SessionExpired,

    /// Resolution failed while assembling a payload
    Resolve(ResolveError),

    /// Any other transport failure
    Transport(TransportError),
}

impl std::fmt::Display for ControllerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControllerError::NoActiveProperty => write!(f, "no active property"),
            ControllerError::MissingSnapshot => write!(f, "no snapshot loaded for active property"),
            ControllerError::RecalculationInFlight => {
                write!(f, "a recalculation is already in flight")
            }
            ControllerError::UnknownField(name) => write!(f, "unknown field '{}'", name),
            ControllerError::FieldNotEditable(name) => write!(f, "field '{}' is not editable", name),
            ControllerError::MalformedSnapshot(detail) => {
                write!(f, "malformed snapshot response: {}", detail)
            }
            ControllerError::SessionExpired => write!(f, "session expired; re-authentication required"),
            ControllerError::Resolve(err) => write!(f, "{}", err),
            ControllerError::Transport(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<ResolveError> for ControllerError {
    fn from(err: ResolveError) -> Self {
        ControllerError::Resolve(err)
    }
}

// ============================================================================
// RECALC CONTROLLER
// ============================================================================

/// RecalcController - the single state container for resolution and
/// payload-building. All transitions happen on one logical thread; the only
/// suspension point is the transport call between `begin_recalculation` and
/// `complete_recalculation`.
pub struct RecalcController {
    registry: FieldRegistry,
    active_property: Option<String>,
    snapshot: Option<PropertySnapshot>,
    pending: PendingEdits,
    state: ControllerState,
    in_flight: Option<RequestTag>,
}

impl RecalcController {
    pub fn new() -> Self {
        RecalcController {
            registry: FieldRegistry::new(),
            active_property: None,
            snapshot: None,
            pending: PendingEdits::new(),
            state: ControllerState::Viewing,
            in_flight: None,
        }
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn active_property(&self) -> Option<&str> {
        self.active_property.as_deref()
    }

    pub fn snapshot(&self) -> Option<&PropertySnapshot> {
        self.snapshot.as_ref()
    }

    pub fn pending_edits(&self) -> &PendingEdits {
        &self.pending
    }

    // ========================================================================
    // PROPERTY CONTEXT
    // ========================================================================

    /// Switch the active property. Pending edits silently reset and the
    /// previous snapshot is dropped; an in-flight request keeps its tag and
    /// will be discarded as stale when its response arrives.
    pub fn set_active_property(&mut self, property_id: &str) {
        if self.active_property.as_deref() == Some(property_id) {
            return;
        }

        self.active_property = Some(property_id.to_string());
        self.snapshot = None;
        self.pending.clear();
        self.state = ControllerState::Viewing;
    }

    /// Install a snapshot wholesale from a wire payload (initial load or a
    /// refresh). Pending edits survive; only a successful recalculation or a
    /// property switch clears them.
    pub fn install_snapshot(&mut self, wire: &Value) -> Result<(), ControllerError> {
        if self.active_property.is_none() {
            return Err(ControllerError::NoActiveProperty);
        }

        let snapshot = PropertySnapshot::from_wire(wire)
            .map_err(|e| ControllerError::MalformedSnapshot(e.to_string()))?;
        self.snapshot = Some(snapshot);

        if self.state != ControllerState::Recalculating {
            self.state = if self.pending.is_empty() {
                ControllerState::Viewing
            } else {
                ControllerState::Editing
            };
        }

        Ok(())
    }

    // ========================================================================
    // PENDING EDITS
    // ========================================================================

    /// Record an edit from a display field. The text parses as a number
    /// (invalid or empty parses to zero), runs through the Format Engine's
    /// inverse conversion, and lands under the field's canonical key —
    /// immediately visible to the resolver, no network round trip.
    pub fn set_pending_edit(
        &mut self,
        display_name: &str,
        edited_text: &str,
    ) -> Result<(), ControllerError> {
        let item = self
            .registry
            .find(display_name)
            .ok_or_else(|| ControllerError::UnknownField(display_name.to_string()))?;

        if !item.is_editable() {
            return Err(ControllerError::FieldNotEditable(display_name.to_string()));
        }

        let edited: f64 = edited_text.trim().parse().unwrap_or(0.0);
        let raw = from_editable_number(edited, item.format_kind());
        self.pending.insert(item.canonical_key(), raw);

        if self.state != ControllerState::Recalculating {
            self.state = ControllerState::Editing;
        }

        Ok(())
    }

    // ========================================================================
    // PAYLOAD ASSEMBLY
    // ========================================================================

    /// Merge the full recalculation value set, working convention.
    ///
    /// Every Sourced field contributes its current value (pending edit, then
    /// snapshot, then a type-appropriate default); every declared UserInput
    /// field appears exactly once with pending > snapshot > zero priority.
    pub fn build_recalculation_payload(&self) -> Result<Map<String, Value>, ControllerError> {
        let snapshot = self.snapshot.as_ref().ok_or(ControllerError::MissingSnapshot)?;
        let mut values = Map::new();

        for item in self.registry.items_with_provenance(Provenance::Sourced) {
            let resolved = resolve(item, snapshot, &self.pending)?;
            let value = match resolved {
                Some(v) => v,
                None if item.format_kind() == FormatKind::Text => Value::from(""),
                None => Value::from(0.0),
            };
            values.insert(item.canonical_key(), value);
        }

        for item in self.registry.items_with_provenance(Provenance::UserInput) {
            let resolved = resolve(item, snapshot, &self.pending)?;
            values.insert(item.canonical_key(), resolved.unwrap_or_else(|| Value::from(0.0)));
        }

        Ok(values)
    }

    // ========================================================================
    // RECALCULATION
    // ========================================================================

    /// First phase: refuse re-entrant submission, assemble the wire payload,
    /// and tag the request with the property active right now.
    pub fn begin_recalculation(&mut self) -> Result<(RequestTag, Value), ControllerError> {
        if self.state == ControllerState::Recalculating {
            return Err(ControllerError::RecalculationInFlight);
        }

        let property_id = self
            .active_property
            .clone()
            .ok_or(ControllerError::NoActiveProperty)?;
        let values = self.build_recalculation_payload()?;

        let request = json!({
            "property_id": property_id,
            "values": Value::Object(values),
        });

        let tag = RequestTag {
            request_id: Uuid::new_v4(),
            property_id,
        };
        self.in_flight = Some(tag.clone());
        self.state = ControllerState::Recalculating;

        Ok((tag, to_wire_format(&request)))
    }

    /// Second phase: apply or discard the outcome of a tagged request.
    ///
    /// Returns `Ok(true)` when a new snapshot was installed, `Ok(false)`
    /// when the response was stale (superseded request, or the active
    /// property changed while it was in flight) and therefore ignored.
    /// On failure the snapshot and pending edits stay untouched.
    pub fn complete_recalculation(
        &mut self,
        tag: &RequestTag,
        outcome: Result<Value, TransportError>,
    ) -> Result<bool, ControllerError> {
        let matches_in_flight = self.in_flight.as_ref() == Some(tag);
        if !matches_in_flight {
            return Ok(false);
        }

        if self.active_property.as_deref() != Some(tag.property_id.as_str()) {
            // Property switched while the request was in flight
            self.in_flight = None;
            return Ok(false);
        }

        self.in_flight = None;

        let response = match outcome {
            Ok(response) => response,
            Err(err) => {
                self.settle_after_failure();
                return Err(match err {
                    TransportError::Unauthorized => ControllerError::SessionExpired,
                    other => ControllerError::Transport(other),
                });
            }
        };

        let snapshot = match PropertySnapshot::from_wire(&response) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.settle_after_failure();
                return Err(ControllerError::MalformedSnapshot(e.to_string()));
            }
        };

        self.snapshot = Some(snapshot);
        self.pending.clear();
        self.state = ControllerState::Viewing;
        Ok(true)
    }

    fn settle_after_failure(&mut self) {
        self.state = if self.pending.is_empty() {
            ControllerState::Viewing
        } else {
            ControllerState::Editing
        };
    }

    /// Convenience driver for shells with a blocking transport: begin,
    /// submit, complete.
    pub fn submit_recalculation(
        &mut self,
        transport: &dyn Transport,
    ) -> Result<bool, ControllerError> {
        let (tag, payload) = self.begin_recalculation()?;
        let outcome = transport.recalculate(&tag.property_id, &payload);

        if matches!(outcome, Err(TransportError::Unauthorized)) {
            transport.invalidate_session();
        }

        self.complete_recalculation(&tag, outcome)
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    /// Persist the current assumption set (pending edits included). One-shot
    /// delegation; local state is not mutated.
    pub fn save_user_inputs(&self, transport: &dyn Transport) -> Result<(), ControllerError> {
        let snapshot = self.snapshot.as_ref().ok_or(ControllerError::MissingSnapshot)?;
        let mut inputs = Map::new();

        for item in self.registry.items_with_provenance(Provenance::UserInput) {
            let resolved = resolve(item, snapshot, &self.pending)?;
            inputs.insert(item.canonical_key(), resolved.unwrap_or_else(|| Value::from(0.0)));
        }

        let payload = to_wire_format(&Value::Object(inputs));
        transport
            .save_user_inputs(&payload)
            .map_err(|e| self.persistence_error(transport, e))
    }

    /// Persist a snapshot excerpt to the saved-properties list.
    pub fn save_property(&self, transport: &dyn Transport) -> Result<(), ControllerError> {
        let property_id = self.active_property.as_ref().ok_or(ControllerError::NoActiveProperty)?;
        let snapshot = self.snapshot.as_ref().ok_or(ControllerError::MissingSnapshot)?;

        let excerpt = json!({
            "property_id": property_id,
            "sourced_facts": snapshot.sourced_facts,
            "cashflow_per_unit": snapshot.cashflow_per_unit,
        });

        transport
            .save_property(&to_wire_format(&excerpt))
            .map_err(|e| self.persistence_error(transport, e))
    }

    fn persistence_error(&self, transport: &dyn Transport, err: TransportError) -> ControllerError {
        match err {
            TransportError::Unauthorized => {
                transport.invalidate_session();
                ControllerError::SessionExpired
            }
            other => ControllerError::Transport(other),
        }
    }
}

impl Default for RecalcController {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
