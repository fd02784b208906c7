//! Zone conflict resolution and the two public entry points.

use cirrus_id::ZoneName;

use crate::{
    DistributionHint, LeastLoaded, Placement, SpreadPolicy, VolumeAttachment, ZoneCatalog,
    ZoneConstraintSet, ZoneError,
};

/// Everything known about one launch attempt that bears on its zone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchConstraints {
    /// Zone already decided by the caller. Wins over everything else.
    pub explicit_zone: Option<ZoneName>,

    pub placement: Placement,

    /// Merged zone constraint of the attached volumes.
    pub volume_constraints: ZoneConstraintSet,

    /// Catalog snapshot for this call.
    pub known_zones: ZoneCatalog,

    /// Current load per zone; only consulted when nothing else constrains
    /// the choice.
    pub distribution_hint: DistributionHint,
}

impl LaunchConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_explicit_zone(mut self, zone: Option<ZoneName>) -> Self {
        self.explicit_zone = zone;
        self
    }

    #[must_use]
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    #[must_use]
    pub fn with_volume_attachments<'a, I>(mut self, attachments: I) -> Self
    where
        I: IntoIterator<Item = &'a VolumeAttachment>,
    {
        self.volume_constraints = ZoneConstraintSet::from_attachments(attachments);
        self
    }

    #[must_use]
    pub fn with_known_zones(mut self, zones: impl Into<ZoneCatalog>) -> Self {
        self.known_zones = zones.into();
        self
    }

    #[must_use]
    pub fn with_distribution_hint(mut self, hint: DistributionHint) -> Self {
        self.distribution_hint = hint;
        self
    }

    /// Returns false when the explicit zone makes the catalog irrelevant, so
    /// callers can skip fetching it.
    pub fn requires_catalog(&self) -> bool {
        self.explicit_zone.is_none()
    }

    /// Returns true when resolution will fall through to spreading, which is
    /// the only time the distribution hint is read.
    pub fn requires_distribution_hint(&self) -> bool {
        self.explicit_zone.is_none()
            && self.placement.zone().is_none()
            && self.volume_constraints.is_unconstrained()
    }
}

/// Merges placement, volume and catalog constraints into zone decisions.
#[derive(Debug, Clone, Default)]
pub struct ZoneResolver<P = LeastLoaded> {
    policy: P,
}

impl ZoneResolver<LeastLoaded> {
    pub fn new() -> Self {
        Self {
            policy: LeastLoaded,
        }
    }
}

impl<P: SpreadPolicy> ZoneResolver<P> {
    /// Creates a resolver that orders unconstrained launches with `policy`.
    pub fn with_policy(policy: P) -> Self {
        Self { policy }
    }

    /// Resolves exactly one zone.
    ///
    /// When nothing constrains the choice, the first spread candidate is
    /// returned.
    pub fn resolve(&self, constraints: &LaunchConstraints) -> Result<ZoneName, ZoneError> {
        if let Some(zone) = self.required_zone(constraints)? {
            return Ok(zone);
        }
        self.spread(constraints)?
            .into_iter()
            .next()
            .ok_or(ZoneError::NoZonesAvailable)
    }

    /// Resolves the ordered, non-empty list of zones to attempt.
    pub fn resolve_many(
        &self,
        constraints: &LaunchConstraints,
    ) -> Result<Vec<ZoneName>, ZoneError> {
        match self.required_zone(constraints)? {
            Some(zone) => Ok(vec![zone]),
            None => self.spread(constraints),
        }
    }

    /// Applies the explicit, volume and placement rules in order. Returns
    /// `None` when none of them constrains the zone.
    fn required_zone(
        &self,
        constraints: &LaunchConstraints,
    ) -> Result<Option<ZoneName>, ZoneError> {
        if let Some(zone) = &constraints.explicit_zone {
            return Ok(Some(zone.clone()));
        }

        let volume_zone = match &constraints.volume_constraints {
            ZoneConstraintSet::Conflict(attachments) => {
                return Err(ZoneError::VolumeZoneConflict {
                    attachments: attachments.clone(),
                });
            }
            ZoneConstraintSet::Zone(zone) => Some(zone),
            ZoneConstraintSet::Unconstrained => None,
        };

        if let Some(placement_zone) = constraints.placement.zone() {
            constraints.known_zones.require_available(placement_zone)?;
            if let Some(volume_zone) = volume_zone {
                if volume_zone != placement_zone {
                    return Err(ZoneError::PlacementVolumeConflict {
                        placement_zone: placement_zone.clone(),
                        volume_zone: volume_zone.clone(),
                    });
                }
            }
            return Ok(Some(placement_zone.clone()));
        }

        if let Some(volume_zone) = volume_zone {
            constraints.known_zones.require_available(volume_zone)?;
            return Ok(Some(volume_zone.clone()));
        }

        Ok(None)
    }

    fn spread(&self, constraints: &LaunchConstraints) -> Result<Vec<ZoneName>, ZoneError> {
        let available: Vec<_> = constraints.known_zones.available().collect();
        if available.is_empty() {
            return Err(ZoneError::NoZonesAvailable);
        }

        let mut candidates: Vec<ZoneName> = Vec::with_capacity(available.len());
        for zone in self
            .policy
            .spread_candidates(&available, &constraints.distribution_hint)
        {
            // The policy is external; never let it smuggle in a zone that is
            // down, unknown or already listed.
            if available.iter().any(|z| z.name == zone) && !candidates.contains(&zone) {
                candidates.push(zone);
            }
        }

        if candidates.is_empty() {
            return Err(ZoneError::NoZonesAvailable);
        }
        Ok(candidates)
    }
}

/// Derives the single zone a launch must use, for pre-flight validation.
pub fn derive_availability_zone(constraints: &LaunchConstraints) -> Result<ZoneName, ZoneError> {
    ZoneResolver::new().resolve(constraints)
}

/// Resolves the ordered candidate zones for instance creation.
pub fn resolve_candidate_zones(
    constraints: &LaunchConstraints,
) -> Result<Vec<ZoneName>, ZoneError> {
    ZoneResolver::new().resolve_many(constraints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AvailabilityZone, ZoneStatus};

    fn zones(spec: &[(&str, ZoneStatus)]) -> Vec<AvailabilityZone> {
        spec.iter()
            .map(|(name, status)| AvailabilityZone::new(*name, *status))
            .collect()
    }

    #[test]
    fn test_explicit_zone_wins_without_checks() {
        let constraints = LaunchConstraints::new()
            .with_explicit_zone(Some(ZoneName::new("az3")))
            .with_placement(Placement::parse("zone=az1"))
            .with_volume_attachments(&[
                VolumeAttachment::new("az1--a"),
                VolumeAttachment::new("az2--b"),
            ]);

        assert_eq!(derive_availability_zone(&constraints).unwrap(), "az3");
        assert_eq!(
            resolve_candidate_zones(&constraints).unwrap(),
            vec![ZoneName::new("az3")]
        );
    }

    #[test]
    fn test_placement_selects_zone() {
        let constraints = LaunchConstraints::new()
            .with_known_zones(zones(&[
                ("az1", ZoneStatus::Down),
                ("az2", ZoneStatus::Up),
                ("az3", ZoneStatus::Up),
            ]))
            .with_placement(Placement::parse("zone=az3"));

        assert_eq!(derive_availability_zone(&constraints).unwrap(), "az3");
    }

    #[test]
    fn test_volume_conflict_checked_before_placement() {
        let constraints = LaunchConstraints::new()
            .with_placement(Placement::parse("zone=nowhere"))
            .with_volume_attachments(&[
                VolumeAttachment::new("az1--a"),
                VolumeAttachment::new("az2--b"),
            ]);

        let err = derive_availability_zone(&constraints).unwrap_err();
        assert!(matches!(err, ZoneError::VolumeZoneConflict { .. }));
    }

    #[test]
    fn test_unconstrained_resolve_returns_first_candidate() {
        let constraints = LaunchConstraints::new()
            .with_known_zones(zones(&[("az1", ZoneStatus::Up), ("az2", ZoneStatus::Up)]))
            .with_distribution_hint([("az1", 4), ("az2", 2)].into_iter().collect());

        assert_eq!(derive_availability_zone(&constraints).unwrap(), "az2");
    }

    #[test]
    fn test_requires_distribution_hint() {
        assert!(LaunchConstraints::new().requires_distribution_hint());
        assert!(LaunchConstraints::new()
            .with_placement(Placement::parse("host=x"))
            .requires_distribution_hint());
        assert!(!LaunchConstraints::new()
            .with_placement(Placement::parse("zone=x"))
            .requires_distribution_hint());
        assert!(!LaunchConstraints::new()
            .with_volume_attachments(&[VolumeAttachment::new("x--1")])
            .requires_distribution_hint());
        assert!(!LaunchConstraints::new()
            .with_explicit_zone(Some(ZoneName::new("x")))
            .requires_catalog());
    }

    struct Rogue;

    impl SpreadPolicy for Rogue {
        fn spread_candidates(
            &self,
            _zones: &[&AvailabilityZone],
            _hint: &DistributionHint,
        ) -> Vec<ZoneName> {
            vec![
                ZoneName::new("down"),
                ZoneName::new("phantom"),
                ZoneName::new("up"),
                ZoneName::new("up"),
            ]
        }
    }

    #[test]
    fn test_policy_output_is_filtered_to_available_zones() {
        let constraints = LaunchConstraints::new()
            .with_known_zones(zones(&[("down", ZoneStatus::Down), ("up", ZoneStatus::Up)]));

        let resolver = ZoneResolver::with_policy(Rogue);
        assert_eq!(
            resolver.resolve_many(&constraints).unwrap(),
            vec![ZoneName::new("up")]
        );
    }
}
