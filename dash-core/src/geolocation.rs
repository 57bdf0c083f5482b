//! Where the user is, when the platform can tell us.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt::Debug;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::model::Coordinates;

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("location lookup is not supported")]
    Unsupported,

    #[error("location access denied: {0}")]
    Denied(String),

    #[error("location lookup failed: {0}")]
    Unavailable(String),
}

/// Lifecycle of one bootstrap attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoState {
    Idle,
    Requesting,
    Resolved(Coordinates),
    Denied(String),
    Unsupported,
}

#[async_trait]
pub trait LocationSource: Send + Sync + Debug {
    fn is_supported(&self) -> bool {
        true
    }

    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// Source for systems with no location capability at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

#[async_trait]
impl LocationSource for NoLocation {
    fn is_supported(&self) -> bool {
        false
    }

    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::Unsupported)
    }
}

/// Coordinates supplied up front, from config or the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl LocationSource for FixedLocation {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

/// Approximate position from an IP geolocation service.
#[derive(Debug, Clone)]
pub struct IpLocation {
    endpoint: String,
    http: Client,
}

impl IpLocation {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: Client::new(),
        }
    }
}

// Services disagree on field names.
#[derive(Debug, Deserialize)]
struct IpLocationBody {
    #[serde(alias = "latitude")]
    lat: Option<f64>,
    #[serde(alias = "longitude")]
    lon: Option<f64>,
    message: Option<String>,
}

#[async_trait]
impl LocationSource for IpLocation {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        let res = self
            .http
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| LocationError::Unavailable(e.to_string()))?;

        let status = res.status();
        if status == reqwest::StatusCode::FORBIDDEN || status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(LocationError::Denied(format!("service responded with {status}")));
        }
        if !status.is_success() {
            return Err(LocationError::Unavailable(format!(
                "service responded with {status}"
            )));
        }

        let body: IpLocationBody = res
            .json()
            .await
            .map_err(|e| LocationError::Unavailable(e.to_string()))?;

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => Ok(Coordinates::new(lat, lon)),
            _ => Err(LocationError::Unavailable(
                body.message
                    .unwrap_or_else(|| "response had no coordinates".to_string()),
            )),
        }
    }
}

/// Runs one lookup through `Idle -> Requesting -> {Resolved, Denied, Unsupported}`.
pub async fn locate(source: &dyn LocationSource) -> GeoState {
    let mut state = GeoState::Idle;
    debug!(?state, "starting location lookup");

    if !source.is_supported() {
        info!("geolocation not supported");
        return GeoState::Unsupported;
    }

    state = GeoState::Requesting;
    debug!(?state, "requesting current position");

    state = match source.current_position().await {
        Ok(coords) => GeoState::Resolved(coords),
        Err(LocationError::Unsupported) => GeoState::Unsupported,
        Err(err) => {
            warn!(%err, "error getting location");
            GeoState::Denied(err.to_string())
        }
    };
    debug!(?state, "location lookup finished");

    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug)]
    struct Refusing;

    #[async_trait]
    impl LocationSource for Refusing {
        async fn current_position(&self) -> Result<Coordinates, LocationError> {
            Err(LocationError::Denied("user said no".to_string()))
        }
    }

    #[tokio::test]
    async fn unsupported_source_short_circuits() {
        assert_eq!(locate(&NoLocation).await, GeoState::Unsupported);
    }

    #[tokio::test]
    async fn fixed_source_resolves() {
        let coords = Coordinates::new(48.85, 2.35);
        assert_eq!(
            locate(&FixedLocation(coords)).await,
            GeoState::Resolved(coords)
        );
    }

    #[tokio::test]
    async fn refusal_is_denied() {
        let state = locate(&Refusing).await;
        assert!(matches!(state, GeoState::Denied(reason) if reason.contains("user said no")));
    }

    #[tokio::test]
    async fn ip_location_reads_lat_lon() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "lat": 52.52,
                "lon": 13.405
            })))
            .mount(&mock_server)
            .await;

        let source = IpLocation::new(mock_server.uri());
        let coords = source.current_position().await.unwrap();

        assert_eq!(coords, Coordinates::new(52.52, 13.405));
    }

    #[tokio::test]
    async fn ip_location_accepts_long_field_names() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "latitude": -33.87,
                "longitude": 151.21
            })))
            .mount(&mock_server)
            .await;

        let source = IpLocation::new(mock_server.uri());
        let coords = source.current_position().await.unwrap();

        assert_eq!(coords, Coordinates::new(-33.87, 151.21));
    }

    #[tokio::test]
    async fn ip_location_without_coordinates_is_unavailable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "fail",
                "message": "reserved range"
            })))
            .mount(&mock_server)
            .await;

        let source = IpLocation::new(mock_server.uri());
        let state = locate(&source).await;

        assert!(matches!(state, GeoState::Denied(reason) if reason.contains("reserved range")));
    }

    #[tokio::test]
    async fn ip_location_forbidden_is_denied() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server)
            .await;

        let source = IpLocation::new(mock_server.uri());
        let err = source.current_position().await.unwrap_err();

        assert!(matches!(err, LocationError::Denied(_)));
    }
}
