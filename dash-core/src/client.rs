use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::fmt::Debug;
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::model::{ProxyErrorBody, ProxyPayload, WeatherReport};

/// Outcome of one proxy lookup. The failure message is `err.to_string()`.
pub type FetchResult = Result<WeatherReport, FetchError>;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never completed.
    #[error("Failed to fetch weather data. Please try again.")]
    Transport(#[source] reqwest::Error),

    /// Non-success response carrying a readable message.
    #[error("{0}")]
    Api(String),

    /// Non-success response without a readable message.
    #[error("Server responded with status {0}")]
    Status(StatusCode),

    #[error("Failed to read weather data: {0}")]
    Decode(String),

    /// Any failure of a coordinate lookup.
    #[error("Could not fetch weather for your location. {0}")]
    Location(Box<FetchError>),
}

impl FetchError {
    fn for_location(self) -> Self {
        Self::Location(Box::new(self))
    }
}

#[async_trait]
pub trait WeatherClient: Send + Sync + Debug {
    async fn fetch_by_city(&self, city: &str) -> FetchResult;

    async fn fetch_by_coordinates(&self, lat: f64, lon: f64) -> FetchResult;
}

/// Client for the backend proxy in front of the weather provider.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    base_url: String,
    http: Client,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http: Client::new(),
        }
    }

    async fn read_report(&self, res: reqwest::Response) -> FetchResult {
        let status = res.status();

        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(error_from_body(status, &body));
        }

        let body = res.text().await.map_err(FetchError::Transport)?;
        let payload: ProxyPayload =
            serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))?;

        Ok(payload.into())
    }
}

fn error_from_body(status: StatusCode, body: &str) -> FetchError {
    serde_json::from_str::<ProxyErrorBody>(body)
        .ok()
        .and_then(ProxyErrorBody::into_message)
        .map(FetchError::Api)
        .unwrap_or(FetchError::Status(status))
}

#[async_trait]
impl WeatherClient for ProxyClient {
    #[instrument(skip(self), level = "info")]
    async fn fetch_by_city(&self, city: &str) -> FetchResult {
        let url = format!("{}/weather/{}", self.base_url, urlencoding::encode(city));

        let result = match self.http.get(&url).send().await {
            Ok(res) => self.read_report(res).await,
            Err(e) => Err(FetchError::Transport(e)),
        };

        match &result {
            Ok(report) => debug!(city = %report.current.city, "weather fetched"),
            Err(e) => error!(error = ?e, "failed to fetch weather data"),
        }
        result
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch_by_coordinates(&self, lat: f64, lon: f64) -> FetchResult {
        let url = format!("{}/weather/coords", self.base_url);

        let result = match self
            .http
            .get(&url)
            .query(&[("lat", lat.to_string()), ("lon", lon.to_string())])
            .send()
            .await
        {
            Ok(res) => self.read_report(res).await,
            Err(e) => Err(FetchError::Transport(e)),
        }
        .map_err(FetchError::for_location);

        match &result {
            Ok(report) => debug!(city = %report.current.city, "weather fetched by coordinates"),
            Err(e) => error!(error = ?e, "failed to fetch weather by coordinates"),
        }
        result
    }
}
