use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use cirrus_placement::ZoneError;
use serde::Serialize;

use crate::launch::LaunchError;
use crate::zones::ZoneServiceError;

#[derive(Debug, Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    pub code: String,
    pub request_id: String,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl ProblemDetails {
    fn new(status: StatusCode, code: impl Into<String>, detail: impl Into<String>) -> Self {
        let code = code.into();
        let title = status
            .canonical_reason()
            .unwrap_or("Unknown Error")
            .to_string();
        Self {
            r#type: format!("https://cirrus.dev/problems/{code}"),
            title,
            status: status.as_u16(),
            detail: detail.into(),
            instance: None,
            code,
            request_id: "unknown".to_string(),
            retryable: false,
            details: None,
        }
    }

    fn set_request_id(&mut self, request_id: impl Into<String>) {
        let request_id = request_id.into();
        self.request_id = request_id.clone();
        if self.instance.is_none() {
            self.instance = Some(request_id);
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub problem: Box<ProblemDetails>,
}

impl ApiError {
    fn with_status(
        status: StatusCode,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let problem = Box::new(ProblemDetails::new(status, code, message));
        Self { status, problem }
    }

    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, code, message)
    }

    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::CONFLICT, code, message)
    }

    pub fn bad_gateway(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_GATEWAY, code, message)
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.problem.set_request_id(request_id);
        self
    }

    pub fn with_details(mut self, details: Vec<FieldError>) -> Self {
        self.problem.details = Some(details);
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.problem.retryable = retryable;
        self
    }
}

impl From<ZoneError> for ApiError {
    fn from(err: ZoneError) -> Self {
        let message = err.to_string();
        match &err {
            ZoneError::NoZonesAvailable => ApiError::not_found(err.code(), message),
            ZoneError::UnknownZone { .. } => ApiError::bad_request(err.code(), message),
            ZoneError::ZoneUnavailable { .. } | ZoneError::PlacementVolumeConflict { .. } => {
                ApiError::conflict(err.code(), message)
            }
            ZoneError::VolumeZoneConflict { attachments } => {
                let details = attachments
                    .iter()
                    .map(|a| FieldError {
                        field: a.volume_id.to_string(),
                        message: format!("volume is in availability zone {}", a.zone),
                    })
                    .collect();
                ApiError::conflict(err.code(), message).with_details(details)
            }
        }
    }
}

impl From<ZoneServiceError> for ApiError {
    fn from(err: ZoneServiceError) -> Self {
        match err {
            ZoneServiceError::Resolution(e) => e.into(),
            ZoneServiceError::Provider(e) => {
                ApiError::bad_gateway("provider_unavailable", e.to_string()).with_retryable(true)
            }
            ZoneServiceError::NoInstances => {
                ApiError::not_found("instances_not_found", "no instances found")
            }
            ZoneServiceError::PartialInstances { zones } => {
                let details = zones
                    .iter()
                    .enumerate()
                    .filter(|(_, zone)| zone.is_none())
                    .map(|(index, _)| FieldError {
                        field: format!("instance_ids[{index}]"),
                        message: "instance not found".to_string(),
                    })
                    .collect();
                ApiError::not_found("instances_partially_found", "some instances were not found")
                    .with_details(details)
            }
        }
    }
}

impl From<LaunchError> for ApiError {
    fn from(err: LaunchError) -> Self {
        match err {
            LaunchError::Zones(e) => e.into(),
            LaunchError::Exhausted { ref attempts, .. } => {
                let details = attempts
                    .iter()
                    .map(|a| FieldError {
                        field: a.zone.to_string(),
                        message: a.error.clone().unwrap_or_default(),
                    })
                    .collect();
                ApiError::bad_gateway("launch_exhausted", err.to_string())
                    .with_details(details)
                    .with_retryable(true)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.problem)).into_response();
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_id::{VolumeId, ZoneName};
    use cirrus_placement::{AttachmentZone, ZoneStatus};
    use rstest::rstest;

    #[rstest]
    #[case::no_zones(ZoneError::NoZonesAvailable, StatusCode::NOT_FOUND)]
    #[case::unknown(
        ZoneError::UnknownZone { zone: ZoneName::new("nope") },
        StatusCode::BAD_REQUEST
    )]
    #[case::down(
        ZoneError::ZoneUnavailable { zone: ZoneName::new("az1"), status: ZoneStatus::Down },
        StatusCode::CONFLICT
    )]
    #[case::placement_mismatch(
        ZoneError::PlacementVolumeConflict {
            placement_zone: ZoneName::new("az1"),
            volume_zone: ZoneName::new("az2"),
        },
        StatusCode::CONFLICT
    )]
    fn test_zone_error_status(#[case] err: ZoneError, #[case] expected: StatusCode) {
        let code = err.code();
        let api = ApiError::from(err);
        assert_eq!(api.status, expected);
        assert_eq!(api.problem.code, code);
        assert!(!api.problem.retryable);
    }

    #[test]
    fn test_volume_conflict_lists_attachments() {
        let err = ApiError::from(ZoneError::VolumeZoneConflict {
            attachments: vec![
                AttachmentZone {
                    volume_id: VolumeId::new("a--1"),
                    zone: ZoneName::new("a"),
                },
                AttachmentZone {
                    volume_id: VolumeId::new("b--2"),
                    zone: ZoneName::new("b"),
                },
            ],
        });
        assert_eq!(err.status, StatusCode::CONFLICT);
        let details = err.problem.details.unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].field, "a--1");
    }

    #[test]
    fn test_provider_failure_is_retryable() {
        let err = ApiError::from(ZoneServiceError::Provider(
            crate::provider::ProviderError::Transport("connection refused".to_string()),
        ))
        .with_request_id("req_test");
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert!(err.problem.retryable);
        assert_eq!(err.problem.instance.as_deref(), Some("req_test"));
    }
}
