//! Cloud provider interface and implementations.
//!
//! The provider is an opaque RPC boundary: it lists zones, reports where
//! instances run and creates instances. Two implementations ship:
//! - [`HttpProvider`] talks to the provider's REST API
//! - [`MockProvider`] keeps everything in memory for tests and dev mode

mod http;
mod mock;

pub use http::HttpProvider;
pub use mock::{MockProvider, ProviderCall};

use async_trait::async_trait;
use cirrus_id::{InstanceId, LaunchId, Region, ZoneName};
use cirrus_placement::{AvailabilityZone, DistributionHint, VolumeAttachment};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the provider boundary.
///
/// These are transport-level failures and are never mixed with zone
/// resolution errors.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request never produced a response.
    #[error("provider request failed: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The provider's response could not be decoded.
    #[error("invalid provider response: {0}")]
    Decode(String),

    /// The provider refused to create an instance in a zone.
    #[error("cannot create instance in zone \"{zone}\": {message}")]
    CreateRejected { zone: ZoneName, message: String },
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Decode(err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

/// What to create once a zone has been chosen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceSpec {
    pub launch_id: LaunchId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,
    #[serde(default)]
    pub volume_attachments: Vec<VolumeAttachment>,
}

/// Cloud provider operations used by the control plane.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// List the availability zones of a region.
    async fn availability_zones(
        &self,
        region: &Region,
    ) -> Result<Vec<AvailabilityZone>, ProviderError>;

    /// Running instances per zone, used to spread unconstrained launches.
    async fn running_instances_by_zone(
        &self,
        region: &Region,
    ) -> Result<DistributionHint, ProviderError>;

    /// Zone of each instance, one slot per id. `None` for instances the
    /// provider does not know.
    async fn instance_zones(
        &self,
        ids: &[InstanceId],
    ) -> Result<Vec<Option<ZoneName>>, ProviderError>;

    /// Create an instance in `zone`.
    async fn create_instance(
        &self,
        spec: &InstanceSpec,
        zone: &ZoneName,
    ) -> Result<InstanceId, ProviderError>;
}
