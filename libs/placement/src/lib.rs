//! # cirrus-placement
//!
//! Decides which availability zone(s) a single instance launch may use.
//!
//! Three independent sources of constraint are reconciled:
//!
//! - an explicit placement directive from the user (`zone=<name>`)
//! - zones implied by the storage volumes attached at creation time
//! - live zone health from the provider's zone catalog
//!
//! Two entry points are exposed:
//!
//! - [`derive_availability_zone`] returns exactly one zone. It is used for
//!   pre-flight validation, e.g. before creating a disk that must live in
//!   the same zone as the future instance.
//! - [`resolve_candidate_zones`] returns an ordered, non-empty list of zones
//!   for the instance-creation workflow to try in sequence.
//!
//! # Invariants
//!
//! - A resolved zone is `Up` in the catalog snapshot used for the decision,
//!   unless the caller supplied an explicit zone, which always wins as-is.
//! - Volumes implying more than one zone always fail resolution.
//! - A placement zone and a volume zone must agree; neither silently wins.
//! - Resolution is pure: identical inputs yield identical results.

mod error;
mod placement;
mod resolver;
mod spread;
mod volume;
mod zone;

pub use error::ZoneError;
pub use placement::{Placement, ZONE_PLACEMENT_PREFIX};
pub use resolver::{
    derive_availability_zone, resolve_candidate_zones, LaunchConstraints, ZoneResolver,
};
pub use spread::{DistributionHint, LeastLoaded, SpreadPolicy, ZoneLoad};
pub use volume::{zone_from_volume_id, AttachmentZone, VolumeAttachment, ZoneConstraintSet};
pub use zone::{AvailabilityZone, ZoneCatalog, ZoneDeprecation, ZoneStatus};

pub use cirrus_id::{VolumeId, ZoneName};
