// 🚚 Transport Boundary - External collaborator for remote calls
// The core never owns HTTP mechanics; the surrounding application implements
// this trait. Payloads cross the boundary already wire-converted.

use serde_json::Value;

// ============================================================================
// TRANSPORT ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection-level failure (DNS, timeout, refused)
    Network(String),

    /// Credentials rejected; the session must be re-established
    Unauthorized,

    /// The remote service answered with a non-success status
    Api { status: u16, detail: String },
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Network(detail) => write!(f, "network error: {}", detail),
            TransportError::Unauthorized => write!(f, "could not validate credentials"),
            TransportError::Api { status, detail } => {
                write!(f, "service error {}: {}", status, detail)
            }
        }
    }
}

impl std::error::Error for TransportError {}

// ============================================================================
// TRANSPORT TRAIT
// ============================================================================

/// Remote capabilities the Edit/Recalculate controller depends on.
///
/// All payloads and responses use the wire casing convention (camelCase);
/// the controller converts on both sides of the boundary.
pub trait Transport {
    /// Submit a recalculation request; the response is a fresh snapshot
    /// payload for the property.
    fn recalculate(&self, property_id: &str, payload: &Value) -> Result<Value, TransportError>;

    /// Persist the investor's assumption set.
    fn save_user_inputs(&self, payload: &Value) -> Result<(), TransportError>;

    /// Persist a property-snapshot excerpt to the saved list.
    fn save_property(&self, payload: &Value) -> Result<(), TransportError>;

    /// Invoked by the controller when a call comes back Unauthorized, so
    /// the shell can drop the session and redirect to re-authenticate.
    fn invalidate_session(&self) {}
}

// ============================================================================
// TESTS
// ============================================================================
