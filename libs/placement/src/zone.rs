//! Availability zones and the per-request zone catalog snapshot.

use std::collections::HashSet;

use cirrus_id::ZoneName;
use serde::{Deserialize, Serialize};

use crate::ZoneError;

/// Provider-reported health of an availability zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ZoneStatus {
    /// The zone accepts new resources.
    Up,

    /// The zone is unavailable.
    Down,
}

impl ZoneStatus {
    /// Returns the provider's wire name for the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneStatus::Up => "UP",
            ZoneStatus::Down => "DOWN",
        }
    }
}

impl std::fmt::Display for ZoneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deprecation metadata published by the provider for a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneDeprecation {
    /// Zone the provider recommends instead, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<ZoneName>,
}

/// A single availability zone as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityZone {
    pub name: ZoneName,
    pub status: ZoneStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation: Option<ZoneDeprecation>,
}

impl AvailabilityZone {
    /// Creates a zone that is not deprecated.
    pub fn new(name: impl Into<String>, status: ZoneStatus) -> Self {
        Self {
            name: ZoneName::new(name),
            status,
            deprecation: None,
        }
    }

    /// Marks the zone deprecated, optionally naming a replacement.
    #[must_use]
    pub fn deprecated(mut self, replacement: Option<ZoneName>) -> Self {
        self.deprecation = Some(ZoneDeprecation { replacement });
        self
    }

    /// Returns true if new resources may be created in this zone.
    pub fn is_available(&self) -> bool {
        self.status == ZoneStatus::Up
    }

    /// Returns true if the provider has deprecated this zone.
    pub fn is_deprecated(&self) -> bool {
        self.deprecation.is_some()
    }

    /// Returns the replacement zone the provider recommends, if any.
    pub fn deprecated_replacement(&self) -> Option<&ZoneName> {
        self.deprecation.as_ref().and_then(|d| d.replacement.as_ref())
    }
}

/// Snapshot of the provider's zones for one resolution call.
///
/// The catalog preserves the provider's ordering, which is used as the
/// tie-break when spreading instances. It is never cached across calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneCatalog {
    zones: Vec<AvailabilityZone>,
}

impl ZoneCatalog {
    /// Wraps the zones returned by the provider. If a name is reported more
    /// than once, only its first entry is kept.
    pub fn new(zones: Vec<AvailabilityZone>) -> Self {
        let mut seen = HashSet::with_capacity(zones.len());
        let zones = zones
            .into_iter()
            .filter(|z| seen.insert(z.name.clone()))
            .collect();
        Self { zones }
    }

    /// Looks up a zone by name.
    pub fn get(&self, name: &ZoneName) -> Option<&AvailabilityZone> {
        self.zones.iter().find(|z| &z.name == name)
    }

    /// Zones whose status is `Up`, in provider order.
    pub fn available(&self) -> impl Iterator<Item = &AvailabilityZone> {
        self.zones.iter().filter(|z| z.is_available())
    }

    /// Validates that `name` exists and is `Up`.
    pub fn require_available(&self, name: &ZoneName) -> Result<&AvailabilityZone, ZoneError> {
        let zone = self.get(name).ok_or_else(|| ZoneError::UnknownZone {
            zone: name.clone(),
        })?;
        if !zone.is_available() {
            return Err(ZoneError::ZoneUnavailable {
                zone: name.clone(),
                status: zone.status,
            });
        }
        Ok(zone)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AvailabilityZone> {
        self.zones.iter()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

impl From<Vec<AvailabilityZone>> for ZoneCatalog {
    fn from(zones: Vec<AvailabilityZone>) -> Self {
        Self::new(zones)
    }
}

impl FromIterator<AvailabilityZone> for ZoneCatalog {
    fn from_iter<I: IntoIterator<Item = AvailabilityZone>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
