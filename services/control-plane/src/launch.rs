//! Instance launch workflow.
//!
//! Resolves candidate zones for a launch and attempts creation in each zone
//! in order until one succeeds. Attempts for one launch are sequential;
//! independent launches run concurrently.

use cirrus_id::{InstanceId, LaunchId, ZoneName};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::provider::{InstanceSpec, ProviderError};
use crate::zones::{LaunchRequest, ZoneService, ZoneServiceError};

/// Errors from launching an instance.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Candidate zones could not be resolved.
    #[error(transparent)]
    Zones(#[from] ZoneServiceError),

    /// Creation failed in every candidate zone.
    #[error("cannot launch instance in any of {} candidate zones: {last}", .attempts.len())]
    Exhausted {
        attempts: Vec<ZoneAttempt>,
        #[source]
        last: ProviderError,
    },
}

/// One creation attempt in one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneAttempt {
    pub zone: ZoneName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A successful launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchOutcome {
    pub launch_id: LaunchId,
    pub instance_id: InstanceId,
    pub zone: ZoneName,
    /// Every attempt made, the successful one last.
    pub attempts: Vec<ZoneAttempt>,
}

/// Creates instances in the first candidate zone that accepts them.
#[derive(Clone)]
pub struct Launcher {
    zones: ZoneService,
}

impl Launcher {
    pub fn new(zones: ZoneService) -> Self {
        Self { zones }
    }

    /// Launch one instance.
    #[instrument(skip(self, request), fields(launch_id = tracing::field::Empty))]
    pub async fn launch(&self, request: &LaunchRequest) -> Result<LaunchOutcome, LaunchError> {
        let launch_id = LaunchId::new();
        tracing::Span::current().record("launch_id", tracing::field::display(launch_id));

        let candidates = self.zones.start_instance_availability_zones(request).await?;
        let spec = InstanceSpec {
            launch_id,
            instance_type: request.instance_type.clone(),
            volume_attachments: request.volume_attachments.clone(),
        };

        let mut attempts = Vec::with_capacity(candidates.len());
        let mut last_error = None;

        for zone in candidates {
            match self.zones.provider().create_instance(&spec, &zone).await {
                Ok(instance_id) => {
                    info!(
                        instance_id = %instance_id,
                        zone = %zone,
                        attempt = attempts.len() + 1,
                        "Instance launched"
                    );
                    attempts.push(ZoneAttempt {
                        zone: zone.clone(),
                        error: None,
                    });
                    return Ok(LaunchOutcome {
                        launch_id,
                        instance_id,
                        zone,
                        attempts,
                    });
                }
                Err(e) => {
                    warn!(zone = %zone, error = %e, "Instance creation failed, trying next zone");
                    attempts.push(ZoneAttempt {
                        zone,
                        error: Some(e.to_string()),
                    });
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(last) => Err(LaunchError::Exhausted { attempts, last }),
            // Resolution never yields an empty candidate list.
            None => Err(LaunchError::Zones(ZoneServiceError::Resolution(
                cirrus_placement::ZoneError::NoZonesAvailable,
            ))),
        }
    }

    /// Launch independent instances concurrently. Results are returned in
    /// request order.
    pub async fn launch_many(
        &self,
        requests: &[LaunchRequest],
    ) -> Vec<Result<LaunchOutcome, LaunchError>> {
        join_all(requests.iter().map(|request| self.launch(request))).await
    }
}
