//! Zone constraints implied by attached volumes.
//!
//! Provider volume identifiers have the shape `<zone>--<opaque-id>`. A
//! volume is pinned to the zone it was created in, so an instance that
//! attaches it must be created there too.

use cirrus_id::{VolumeId, ZoneName};
use serde::{Deserialize, Serialize};

const VOLUME_ZONE_SEPARATOR: &str = "--";

/// A volume to attach at instance creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeAttachment {
    pub volume_id: VolumeId,
}

impl VolumeAttachment {
    pub fn new(volume_id: impl Into<String>) -> Self {
        Self {
            volume_id: VolumeId::new(volume_id),
        }
    }

    /// Zone implied by the attached volume, if any.
    pub fn zone(&self) -> Option<ZoneName> {
        zone_from_volume_id(&self.volume_id)
    }
}

/// An attachment together with the zone its volume id implies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentZone {
    pub volume_id: VolumeId,
    pub zone: ZoneName,
}

/// Returns the zone encoded in a volume id.
///
/// Identifiers without the `--` separator, or with nothing before it, carry
/// no zone information. That is not an error.
pub fn zone_from_volume_id(volume_id: &VolumeId) -> Option<ZoneName> {
    let (zone, _) = volume_id.as_str().split_once(VOLUME_ZONE_SEPARATOR)?;
    if zone.is_empty() {
        return None;
    }
    Some(ZoneName::new(zone))
}

/// Merged zone constraint of all attachments of one launch request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ZoneConstraintSet {
    /// No attachment implies a zone.
    #[default]
    Unconstrained,

    /// Every zone-bearing attachment implies the same zone.
    Zone(ZoneName),

    /// Attachments imply two or more distinct zones. Carries every
    /// zone-bearing attachment in the order supplied.
    Conflict(Vec<AttachmentZone>),
}

impl ZoneConstraintSet {
    /// Computes the constraint implied by a set of attachments.
    pub fn from_attachments<'a, I>(attachments: I) -> Self
    where
        I: IntoIterator<Item = &'a VolumeAttachment>,
    {
        let pairs: Vec<AttachmentZone> = attachments
            .into_iter()
            .filter_map(|a| {
                a.zone().map(|zone| AttachmentZone {
                    volume_id: a.volume_id.clone(),
                    zone,
                })
            })
            .collect();

        let Some(first) = pairs.first() else {
            return ZoneConstraintSet::Unconstrained;
        };

        if pairs.iter().all(|p| p.zone == first.zone) {
            ZoneConstraintSet::Zone(first.zone.clone())
        } else {
            ZoneConstraintSet::Conflict(pairs)
        }
    }

    /// The single required zone, if the attachments agree on one.
    pub fn zone(&self) -> Option<&ZoneName> {
        match self {
            ZoneConstraintSet::Zone(zone) => Some(zone),
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ZoneConstraintSet::Conflict(_))
    }

    pub fn is_unconstrained(&self) -> bool {
        matches!(self, ZoneConstraintSet::Unconstrained)
    }
}
