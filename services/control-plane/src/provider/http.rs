//! REST client for the cloud provider API.

use std::time::Duration;

use async_trait::async_trait;
use cirrus_id::{InstanceId, Region, ZoneName};
use cirrus_placement::{AvailabilityZone, DistributionHint, ZoneLoad};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{CloudProvider, InstanceSpec, ProviderError};

/// Provider client speaking JSON over HTTP.
///
/// Timeouts are enforced here; zone resolution itself never times out.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProvider {
    /// Create a new provider client.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error!(status = %status, body = %body, "Provider request failed");
        Err(ProviderError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[derive(Debug, Serialize)]
struct InstanceZonesRequest<'a> {
    instance_ids: &'a [InstanceId],
}

#[derive(Debug, Deserialize)]
struct InstanceZonesResponse {
    zones: Vec<Option<ZoneName>>,
}

#[derive(Debug, Serialize)]
struct CreateInstanceRequest<'a> {
    zone: &'a ZoneName,
    #[serde(flatten)]
    spec: &'a InstanceSpec,
}

#[derive(Debug, Deserialize)]
struct CreateInstanceResponse {
    instance_id: InstanceId,
}

#[async_trait]
impl CloudProvider for HttpProvider {
    async fn availability_zones(
        &self,
        region: &Region,
    ) -> Result<Vec<AvailabilityZone>, ProviderError> {
        let url = format!("{}/v1/regions/{}/zones", self.base_url, region);
        debug!(url = %url, "Fetching availability zones");

        let response = Self::check(self.client.get(&url).send().await?).await?;
        let zones: Vec<AvailabilityZone> = response.json().await?;

        debug!(zone_count = zones.len(), "Fetched availability zones");
        Ok(zones)
    }

    async fn running_instances_by_zone(
        &self,
        region: &Region,
    ) -> Result<DistributionHint, ProviderError> {
        let url = format!("{}/v1/regions/{}/instance-counts", self.base_url, region);
        debug!(url = %url, "Fetching running instance counts");

        let response = Self::check(self.client.get(&url).send().await?).await?;
        let loads: Vec<ZoneLoad> = response.json().await?;
        Ok(DistributionHint::new(loads))
    }

    async fn instance_zones(
        &self,
        ids: &[InstanceId],
    ) -> Result<Vec<Option<ZoneName>>, ProviderError> {
        let url = format!("{}/v1/instances/zones", self.base_url);
        debug!(instance_count = ids.len(), "Looking up instance zones");

        let request = InstanceZonesRequest { instance_ids: ids };
        let response = Self::check(self.client.post(&url).json(&request).send().await?).await?;
        let body: InstanceZonesResponse = response.json().await?;

        if body.zones.len() != ids.len() {
            return Err(ProviderError::Decode(format!(
                "expected {} zones, got {}",
                ids.len(),
                body.zones.len()
            )));
        }
        Ok(body.zones)
    }

    async fn create_instance(
        &self,
        spec: &InstanceSpec,
        zone: &ZoneName,
    ) -> Result<InstanceId, ProviderError> {
        let url = format!("{}/v1/instances", self.base_url);
        debug!(launch_id = %spec.launch_id, zone = %zone, "Creating instance");

        let request = CreateInstanceRequest { zone, spec };
        let response = self.client.post(&url).json(&request).send().await?;

        // 409/422 mean the provider refused this zone; the caller may try
        // the next candidate.
        let status = response.status();
        if status.as_u16() == 409 || status.as_u16() == 422 {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::CreateRejected {
                zone: zone.clone(),
                message,
            });
        }

        let body: CreateInstanceResponse = Self::check(response).await?.json().await?;
        Ok(body.instance_id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::zones::{LaunchRequest, ZoneService};
    use cirrus_id::LaunchId;
    use cirrus_placement::ZoneStatus;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> HttpProvider {
        HttpProvider::new(server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn spec() -> InstanceSpec {
        InstanceSpec {
            launch_id: LaunchId::new(),
            instance_type: Some("n1-standard-1".to_string()),
            volume_attachments: vec![],
        }
    }

    #[tokio::test]
    async fn test_availability_zones() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/regions/us-east1/zones"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "name": "a-zone", "status": "UP" },
                { "name": "b-zone", "status": "DOWN",
                  "deprecation": { "replacement": "a-zone" } }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let zones = provider(&server)
            .availability_zones(&Region::new("us-east1"))
            .await
            .unwrap();

        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].name, "a-zone");
        assert!(zones[0].is_available());
        assert_eq!(zones[1].status, ZoneStatus::Down);
        assert_eq!(zones[1].deprecated_replacement(), Some(&ZoneName::new("a-zone")));
    }

    #[tokio::test]
    async fn test_odd_zone_name_does_not_poison_catalog() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/regions/us-east1/zones"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "name": "a-zone", "status": "UP" },
                { "name": "b zone", "status": "UP" }
            ])))
            .mount(&server)
            .await;

        let zones = provider(&server)
            .availability_zones(&Region::new("us-east1"))
            .await
            .unwrap();
        assert_eq!(zones[1].name, "b zone");

        let service = ZoneService::new(Arc::new(provider(&server)), Region::new("us-east1"));
        let request = LaunchRequest {
            placement: Some("zone=a-zone".to_string()),
            ..Default::default()
        };
        let zone = service.derive_availability_zone(&request).await.unwrap();
        assert_eq!(zone, "a-zone");
    }

    #[tokio::test]
    async fn test_availability_zones_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/regions/us-east1/zones"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = provider(&server)
            .availability_zones(&Region::new("us-east1"))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_running_instances_by_zone() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/regions/us-east1/instance-counts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "zone": "az2", "running_instances": 1 },
                { "zone": "az3", "running_instances": 0 }
            ])))
            .mount(&server)
            .await;

        let hint = provider(&server)
            .running_instances_by_zone(&Region::new("us-east1"))
            .await
            .unwrap();

        assert_eq!(hint.running_instances(&ZoneName::new("az2")), Some(1));
        assert_eq!(hint.running_instances(&ZoneName::new("az3")), Some(0));
    }

    #[tokio::test]
    async fn test_instance_zones_length_mismatch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/instances/zones"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "zones": [] })),
            )
            .mount(&server)
            .await;

        let err = provider(&server)
            .instance_zones(&[InstanceId::new()])
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Decode(_)));
    }

    #[tokio::test]
    async fn test_create_instance() {
        let server = MockServer::start().await;
        let instance_id = InstanceId::new();
        Mock::given(method("POST"))
            .and(path("/v1/instances"))
            .and(body_partial_json(serde_json::json!({
                "zone": "az2",
                "instance_type": "n1-standard-1"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "instance_id": instance_id.to_string()
            })))
            .mount(&server)
            .await;

        let created = provider(&server)
            .create_instance(&spec(), &ZoneName::new("az2"))
            .await
            .unwrap();

        assert_eq!(created, instance_id);
    }

    #[tokio::test]
    async fn test_create_instance_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/instances"))
            .respond_with(ResponseTemplate::new(409).set_body_string("zone resources exhausted"))
            .mount(&server)
            .await;

        let err = provider(&server)
            .create_instance(&spec(), &ZoneName::new("az2"))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "cannot create instance in zone \"az2\": zone resources exhausted"
        );
    }
}
