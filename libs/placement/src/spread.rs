//! Spreading unconstrained launches across zones.
//!
//! The spreading policy is owned by a separate subsystem. Zone resolution
//! only relies on its contract: less-loaded zones come first and zones with
//! equal load keep a stable order.

use cirrus_id::ZoneName;
use serde::{Deserialize, Serialize};

use crate::AvailabilityZone;

/// Running-instance count for one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneLoad {
    pub zone: ZoneName,
    pub running_instances: u32,
}

/// Current load per zone, as supplied by the spreading subsystem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistributionHint {
    loads: Vec<ZoneLoad>,
}

impl DistributionHint {
    pub fn new(loads: Vec<ZoneLoad>) -> Self {
        Self { loads }
    }

    /// Running instances in `zone`, or `None` if the hint does not mention
    /// it. The first entry wins for repeated zones.
    pub fn running_instances(&self, zone: &ZoneName) -> Option<u32> {
        self.loads
            .iter()
            .find(|l| &l.zone == zone)
            .map(|l| l.running_instances)
    }

    pub fn loads(&self) -> &[ZoneLoad] {
        &self.loads
    }

    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }
}

impl<Z: Into<String>> FromIterator<(Z, u32)> for DistributionHint {
    fn from_iter<I: IntoIterator<Item = (Z, u32)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(zone, running_instances)| ZoneLoad {
                    zone: ZoneName::new(zone),
                    running_instances,
                })
                .collect(),
        )
    }
}

/// Orders candidate zones for an unconstrained launch.
pub trait SpreadPolicy: Send + Sync {
    /// Orders `zones` (already filtered to `Up`, in catalog order) by
    /// preference. Implementations must only return names from `zones`.
    fn spread_candidates(
        &self,
        zones: &[&AvailabilityZone],
        hint: &DistributionHint,
    ) -> Vec<ZoneName>;
}

/// Default policy: fewest running instances first.
///
/// Ties between zones the hint mentions keep catalog order. Zones the hint
/// does not mention count as zero and sort by name after the mentioned
/// zones of the same count.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeastLoaded;

impl SpreadPolicy for LeastLoaded {
    fn spread_candidates(
        &self,
        zones: &[&AvailabilityZone],
        hint: &DistributionHint,
    ) -> Vec<ZoneName> {
        let mut keyed: Vec<(u32, bool, usize, &ZoneName)> = zones
            .iter()
            .enumerate()
            .map(|(position, zone)| match hint.running_instances(&zone.name) {
                Some(count) => (count, false, position, &zone.name),
                None => (0, true, 0, &zone.name),
            })
            .collect();

        keyed.sort();
        keyed.into_iter().map(|(_, _, _, name)| name.clone()).collect()
    }
}

impl<P: SpreadPolicy + ?Sized> SpreadPolicy for &P {
    fn spread_candidates(
        &self,
        zones: &[&AvailabilityZone],
        hint: &DistributionHint,
    ) -> Vec<ZoneName> {
        (**self).spread_candidates(zones, hint)
    }
}
