// Rental Cashflow Analysis - Core Library
// Field registry, value resolution, and recalculation for property reports

pub mod normalize;  // Name Normalizer - display names to canonical keys
pub mod format;     // Format Engine - display rendering and edit-mode inverse
pub mod registry;   // Field Registry - declarative line-item catalog
pub mod snapshot;   // Property Snapshot - per-provenance value mappings
pub mod resolve;    // Value Resolver - provenance-specific lookup
pub mod report;     // Report Assembly - formatted sections for display
pub mod transport;  // Transport Boundary - remote-call trait
pub mod controller; // Edit/Recalculate Controller - state and submission

// Re-export commonly used types
pub use normalize::{
    canonical_key, derive_key, from_wire_format, to_wire_format, Provenance,
};
pub use format::{
    classify, format_value, from_editable_number, to_editable_number,
    FormatKind, NOT_AVAILABLE,
};
pub use registry::{FieldRegistry, LineItemDefinition};
pub use snapshot::{PendingEdits, PropertySnapshot};
pub use resolve::{resolve, ResolveError};
pub use report::{build_report, render_line, ReportLine, ReportSection, ERROR_TOKEN};
pub use transport::{Transport, TransportError};
pub use controller::{ControllerError, ControllerState, RecalcController, RequestTag};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
