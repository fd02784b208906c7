//! Zone service: runs zone resolution against the live provider.
//!
//! The service turns a [`LaunchRequest`] into [`LaunchConstraints`] by
//! parsing the placement once, converting attachments and fetching only the
//! provider data the decision needs:
//! - the zone catalog, unless an explicit zone is set
//! - running-instance counts, only when nothing constrains the zone
//!
//! Each call fetches a fresh snapshot; nothing is cached between calls.

use std::sync::Arc;

use cirrus_id::{InstanceId, Region, VolumeId, ZoneName};
use cirrus_placement::{
    AvailabilityZone, LaunchConstraints, LeastLoaded, Placement, SpreadPolicy, VolumeAttachment,
    ZoneError, ZoneResolver,
};
use serde::{de, Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::provider::{CloudProvider, ProviderError};

/// A single instance-launch request as received from callers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaunchRequest {
    /// Zone already decided by the caller. Empty means not set.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "caller_zone"
    )]
    pub availability_zone: Option<ZoneName>,

    /// Raw placement directive, e.g. `zone=us-east1-b`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<String>,

    #[serde(default, deserialize_with = "caller_attachments")]
    pub volume_attachments: Vec<VolumeAttachment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,
}

fn caller_zone<'de, D>(deserializer: D) -> Result<Option<ZoneName>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => ZoneName::parse(&s).map(Some).map_err(de::Error::custom),
    }
}

fn caller_attachments<'de, D>(deserializer: D) -> Result<Vec<VolumeAttachment>, D::Error>
where
    D: Deserializer<'de>,
{
    let attachments = Vec::<VolumeAttachment>::deserialize(deserializer)?;
    for attachment in &attachments {
        VolumeId::parse(attachment.volume_id.as_str()).map_err(de::Error::custom)?;
    }
    Ok(attachments)
}

/// Errors from the zone service.
#[derive(Debug, Error)]
pub enum ZoneServiceError {
    /// The provider could not be reached or answered badly.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The request's constraints cannot be satisfied.
    #[error(transparent)]
    Resolution(#[from] ZoneError),

    /// None of the requested instances exist.
    #[error("no instances found")]
    NoInstances,

    /// Some of the requested instances exist. `zones` holds the zones that
    /// were found, with `None` for the missing ones.
    #[error("some instances were not found")]
    PartialInstances { zones: Vec<Option<ZoneName>> },
}

/// Zone listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneInfo {
    pub name: ZoneName,
    pub available: bool,
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<ZoneName>,
}

impl From<&AvailabilityZone> for ZoneInfo {
    fn from(zone: &AvailabilityZone) -> Self {
        Self {
            name: zone.name.clone(),
            available: zone.is_available(),
            deprecated: zone.is_deprecated(),
            replacement: zone.deprecated_replacement().cloned(),
        }
    }
}

/// Resolves availability zones for launches in one region.
#[derive(Clone)]
pub struct ZoneService {
    provider: Arc<dyn CloudProvider>,
    region: Region,
    policy: Arc<dyn SpreadPolicy>,
}

impl ZoneService {
    /// Create a zone service spreading unconstrained launches least-loaded
    /// first.
    pub fn new(provider: Arc<dyn CloudProvider>, region: Region) -> Self {
        Self::with_policy(provider, region, Arc::new(LeastLoaded))
    }

    /// Create a zone service with a custom spreading policy.
    pub fn with_policy(
        provider: Arc<dyn CloudProvider>,
        region: Region,
        policy: Arc<dyn SpreadPolicy>,
    ) -> Self {
        Self {
            provider,
            region,
            policy,
        }
    }

    pub fn provider(&self) -> &Arc<dyn CloudProvider> {
        &self.provider
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    /// List the region's availability zones.
    #[instrument(skip(self), fields(region = %self.region))]
    pub async fn availability_zones(&self) -> Result<Vec<ZoneInfo>, ZoneServiceError> {
        let zones = self.provider.availability_zones(&self.region).await?;
        Ok(zones.iter().map(ZoneInfo::from).collect())
    }

    /// Derive the one zone a launch must use.
    ///
    /// Used before creating resources that must share the instance's zone.
    #[instrument(skip(self, request), fields(region = %self.region))]
    pub async fn derive_availability_zone(
        &self,
        request: &LaunchRequest,
    ) -> Result<ZoneName, ZoneServiceError> {
        let constraints = self.constraints_for(request).await?;
        let zone = ZoneResolver::with_policy(&*self.policy).resolve(&constraints)?;

        warn_if_deprecated(&constraints, &zone);
        info!(zone = %zone, "Derived availability zone");
        Ok(zone)
    }

    /// Resolve the ordered zones an instance creation should attempt.
    #[instrument(skip(self, request), fields(region = %self.region))]
    pub async fn start_instance_availability_zones(
        &self,
        request: &LaunchRequest,
    ) -> Result<Vec<ZoneName>, ZoneServiceError> {
        let constraints = self.constraints_for(request).await?;
        let zones = ZoneResolver::with_policy(&*self.policy).resolve_many(&constraints)?;

        for zone in &zones {
            warn_if_deprecated(&constraints, zone);
        }
        info!(candidate_count = zones.len(), "Resolved candidate zones");
        Ok(zones)
    }

    /// Zone of each existing instance, in the order requested.
    #[instrument(skip(self, ids), fields(instance_count = ids.len()))]
    pub async fn instance_availability_zone_names(
        &self,
        ids: &[InstanceId],
    ) -> Result<Vec<ZoneName>, ZoneServiceError> {
        if ids.is_empty() {
            return Err(ZoneServiceError::NoInstances);
        }

        let zones = self.provider.instance_zones(ids).await?;
        let found = zones.iter().filter(|z| z.is_some()).count();

        if found == 0 {
            return Err(ZoneServiceError::NoInstances);
        }
        if found < ids.len() {
            warn!(found, requested = ids.len(), "Some instances were not found");
            return Err(ZoneServiceError::PartialInstances { zones });
        }
        Ok(zones.into_iter().flatten().collect())
    }

    async fn constraints_for(
        &self,
        request: &LaunchRequest,
    ) -> Result<LaunchConstraints, ZoneServiceError> {
        let mut constraints = LaunchConstraints::new()
            .with_explicit_zone(request.availability_zone.clone())
            .with_placement(Placement::from(request.placement.as_deref()))
            .with_volume_attachments(&request.volume_attachments);

        if !constraints.requires_catalog() {
            debug!("Explicit availability zone set, skipping zone catalog");
            return Ok(constraints);
        }

        let zones = self.provider.availability_zones(&self.region).await?;
        debug!(zone_count = zones.len(), "Fetched zone catalog snapshot");
        constraints = constraints.with_known_zones(zones);

        if constraints.requires_distribution_hint() {
            let hint = self.provider.running_instances_by_zone(&self.region).await?;
            constraints = constraints.with_distribution_hint(hint);
        }

        Ok(constraints)
    }
}

fn warn_if_deprecated(constraints: &LaunchConstraints, zone: &ZoneName) {
    let Some(entry) = constraints.known_zones.get(zone) else {
        return;
    };
    if entry.is_deprecated() {
        match entry.deprecated_replacement() {
            Some(replacement) => warn!(
                zone = %zone,
                replacement = %replacement,
                "Availability zone is deprecated"
            ),
            None => warn!(zone = %zone, "Availability zone is deprecated"),
        }
    }
}
