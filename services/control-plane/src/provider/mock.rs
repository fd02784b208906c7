//! In-memory provider for tests and development.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use cirrus_id::{InstanceId, Region, ZoneName};
use cirrus_placement::{AvailabilityZone, DistributionHint, ZoneLoad, ZoneStatus};
use tracing::{debug, info};

use super::{CloudProvider, InstanceSpec, ProviderError};

/// A recorded call against the mock provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCall {
    pub func: &'static str,
    pub region: Option<Region>,
    pub zone: Option<ZoneName>,
}

#[derive(Debug, Default)]
struct MockState {
    zones: Vec<AvailabilityZone>,
    instances: Vec<(InstanceId, ZoneName)>,
    rejecting_zones: HashSet<ZoneName>,
    unreachable: bool,
    calls: Vec<ProviderCall>,
}

/// Mock provider holding zones and instances in memory.
///
/// Every call is recorded so tests can assert which remote operations a
/// code path performed.
#[derive(Debug, Default)]
pub struct MockProvider {
    state: Mutex<MockState>,
}

impl MockProvider {
    /// Create a mock provider with no zones.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock provider with the given zones.
    pub fn with_zones(zones: Vec<AvailabilityZone>) -> Self {
        let provider = Self::new();
        provider.set_zones(zones);
        provider
    }

    /// Zones used in dev mode.
    pub fn dev_default() -> Self {
        Self::with_zones(vec![
            AvailabilityZone::new("dev-a", ZoneStatus::Up),
            AvailabilityZone::new("dev-b", ZoneStatus::Up),
            AvailabilityZone::new("dev-c", ZoneStatus::Up),
        ])
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the zone list.
    pub fn set_zones(&self, zones: Vec<AvailabilityZone>) {
        self.lock().zones = zones;
    }

    /// Register an existing instance in `zone`.
    pub fn add_instance(&self, zone: impl Into<String>) -> InstanceId {
        let id = InstanceId::new();
        self.lock().instances.push((id, ZoneName::new(zone)));
        id
    }

    /// Make instance creation in `zone` fail.
    pub fn reject_creates_in(&self, zone: impl Into<String>) {
        self.lock().rejecting_zones.insert(ZoneName::new(zone));
    }

    /// Make every call fail with a transport error.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.lock().unreachable = unreachable;
    }

    /// Calls recorded so far, oldest first.
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.lock().calls.clone()
    }

    /// Names of the calls recorded so far, oldest first.
    pub fn call_names(&self) -> Vec<&'static str> {
        self.lock().calls.iter().map(|c| c.func).collect()
    }

    fn record(
        &self,
        func: &'static str,
        region: Option<&Region>,
        zone: Option<&ZoneName>,
    ) -> Result<MutexGuard<'_, MockState>, ProviderError> {
        let mut state = self.lock();
        state.calls.push(ProviderCall {
            func,
            region: region.cloned(),
            zone: zone.cloned(),
        });
        if state.unreachable {
            return Err(ProviderError::Transport(
                "mock provider configured to be unreachable".to_string(),
            ));
        }
        Ok(state)
    }
}

#[async_trait]
impl CloudProvider for MockProvider {
    async fn availability_zones(
        &self,
        region: &Region,
    ) -> Result<Vec<AvailabilityZone>, ProviderError> {
        let state = self.record("AvailabilityZones", Some(region), None)?;
        Ok(state.zones.clone())
    }

    async fn running_instances_by_zone(
        &self,
        region: &Region,
    ) -> Result<DistributionHint, ProviderError> {
        let state = self.record("RunningInstancesByZone", Some(region), None)?;
        let loads = state
            .zones
            .iter()
            .map(|z| ZoneLoad {
                zone: z.name.clone(),
                running_instances: state
                    .instances
                    .iter()
                    .filter(|(_, zone)| *zone == z.name)
                    .count() as u32,
            })
            .collect();
        Ok(DistributionHint::new(loads))
    }

    async fn instance_zones(
        &self,
        ids: &[InstanceId],
    ) -> Result<Vec<Option<ZoneName>>, ProviderError> {
        let state = self.record("InstanceZones", None, None)?;
        Ok(ids
            .iter()
            .map(|id| {
                state
                    .instances
                    .iter()
                    .find(|(known, _)| known == id)
                    .map(|(_, zone)| zone.clone())
            })
            .collect())
    }

    async fn create_instance(
        &self,
        spec: &InstanceSpec,
        zone: &ZoneName,
    ) -> Result<InstanceId, ProviderError> {
        let mut state = self.record("CreateInstance", None, Some(zone))?;
        if state.rejecting_zones.contains(zone) {
            debug!(zone = %zone, "[MOCK] Rejecting instance creation");
            return Err(ProviderError::CreateRejected {
                zone: zone.clone(),
                message: "mock provider configured to reject this zone".to_string(),
            });
        }

        let id = InstanceId::new();
        state.instances.push((id, zone.clone()));
        info!(
            launch_id = %spec.launch_id,
            instance_id = %id,
            zone = %zone,
            "[MOCK] Created instance"
        );
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_id::LaunchId;

    #[tokio::test]
    async fn test_records_calls_with_region() {
        let provider = MockProvider::dev_default();
        let zones = provider
            .availability_zones(&Region::new("us-east1"))
            .await
            .unwrap();

        assert_eq!(zones.len(), 3);
        assert_eq!(
            provider.calls(),
            vec![ProviderCall {
                func: "AvailabilityZones",
                region: Some(Region::new("us-east1")),
                zone: None,
            }]
        );
    }

    #[tokio::test]
    async fn test_running_instances_by_zone_counts_instances() {
        let provider = MockProvider::with_zones(vec![
            AvailabilityZone::new("az1", ZoneStatus::Up),
            AvailabilityZone::new("az2", ZoneStatus::Up),
        ]);
        provider.add_instance("az2");
        provider.add_instance("az2");

        let hint = provider
            .running_instances_by_zone(&Region::new("r"))
            .await
            .unwrap();

        assert_eq!(hint.running_instances(&ZoneName::new("az1")), Some(0));
        assert_eq!(hint.running_instances(&ZoneName::new("az2")), Some(2));
    }

    #[tokio::test]
    async fn test_create_and_lookup_instance() {
        let provider = MockProvider::dev_default();
        let spec = InstanceSpec {
            launch_id: LaunchId::new(),
            instance_type: None,
            volume_attachments: vec![],
        };

        let id = provider
            .create_instance(&spec, &ZoneName::new("dev-b"))
            .await
            .unwrap();
        let zones = provider
            .instance_zones(&[id, InstanceId::new()])
            .await
            .unwrap();

        assert_eq!(zones, vec![Some(ZoneName::new("dev-b")), None]);
    }

    #[tokio::test]
    async fn test_unreachable() {
        let provider = MockProvider::dev_default();
        provider.set_unreachable(true);

        let err = provider
            .availability_zones(&Region::new("r"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)));
    }
}
