//! Resolution error taxonomy.
//!
//! Every variant is terminal for the current launch attempt. The caller may
//! retry the whole launch with different input, never the same one.

use cirrus_id::ZoneName;
use thiserror::Error;

use crate::{AttachmentZone, ZoneStatus};

/// Errors produced while resolving an availability zone.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ZoneError {
    /// A zone named by placement or a volume is not in the catalog.
    #[error("invalid availability zone \"{zone}\" not found")]
    UnknownZone { zone: ZoneName },

    /// A zone named by placement or a volume exists but is not `Up`.
    #[error("availability zone \"{zone}\" is {status}")]
    ZoneUnavailable { zone: ZoneName, status: ZoneStatus },

    /// Attached volumes live in more than one zone.
    #[error(
        "cannot attach volumes from multiple availability zones: {}",
        describe_attachments(.attachments)
    )]
    VolumeZoneConflict { attachments: Vec<AttachmentZone> },

    /// The placement zone differs from the zone of the attached volumes.
    #[error(
        "cannot create instance with placement \"zone={placement_zone}\", as this will prevent attaching the requested disks in zone \"{volume_zone}\""
    )]
    PlacementVolumeConflict {
        placement_zone: ZoneName,
        volume_zone: ZoneName,
    },

    /// No zone is `Up` and nothing constrained the choice.
    #[error("no usable availability zones found")]
    NoZonesAvailable,
}

impl ZoneError {
    /// Returns true if there is nothing to try, as opposed to a
    /// misconfigured request.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ZoneError::NoZonesAvailable)
    }

    /// Returns true if independent constraints disagree with each other.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ZoneError::VolumeZoneConflict { .. } | ZoneError::PlacementVolumeConflict { .. }
        )
    }

    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            ZoneError::UnknownZone { .. } => "unknown_zone",
            ZoneError::ZoneUnavailable { .. } => "zone_unavailable",
            ZoneError::VolumeZoneConflict { .. } => "volume_zone_conflict",
            ZoneError::PlacementVolumeConflict { .. } => "placement_volume_conflict",
            ZoneError::NoZonesAvailable => "no_zones_available",
        }
    }
}

fn describe_attachments(attachments: &[AttachmentZone]) -> String {
    attachments
        .iter()
        .map(|a| format!("{} is in {}", a.volume_id, a.zone))
        .collect::<Vec<_>>()
        .join(", ")
}
