//! # cirrus-id
//!
//! Typed identifiers for the cirrus fleet orchestrator.
//!
//! Two families of identifiers live here:
//!
//! - **Orchestrator IDs** are generated by cirrus itself and use a prefixed
//!   ULID format: `{prefix}_{ulid}` (for example
//!   `inst_01HV4Z4NYPLTRS0JTUA8XDME5F`). They sort by creation time and the
//!   prefix makes the resource type visible.
//! - **Provider names** are opaque strings owned by the cloud provider, such
//!   as availability zone names (`us-east1-b`) or volume identifiers
//!   (`us-east1-b--c930380d-8337-4bf5-b07a-9dbb5ae771e4`). They are wrapped
//!   so a zone name cannot be passed where a volume id is expected.

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use types::*;

/// Re-export ulid for consumers that need raw ULID operations
pub use ulid::Ulid;
