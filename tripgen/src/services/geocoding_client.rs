//! Reverse geocoding client
//!
//! Boundary to the external geocoding service. [`ReverseGeocoder`] is the
//! capability the place resolver depends on; [`GoogleGeocoder`] is the
//! production implementation against the Google Geocoding JSON API.

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;

pub const GOOGLE_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const USER_AGENT: &str = concat!("tripgen/", env!("CARGO_PKG_VERSION"));

/// Only locality-scoped results are requested
const RESULT_TYPE: &str = "locality";

pub const DEFAULT_RATE_LIMIT_PER_SECOND: u32 = 50;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Geocoding client errors
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("API key is required for the geocoding service")]
    MissingApiKey,

    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("HTTP error {0}: {1}")]
    HttpError(u16, String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Request denied: {0}")]
    RequestDenied(String),

    #[error("API error {0}: {1}")]
    ApiError(String, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// One named place returned by the geocoding service, with its type tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceCandidate {
    pub name: String,
    pub types: Vec<String>,
}

impl PlaceCandidate {
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        types: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            types: types.into_iter().map(Into::into).collect(),
        }
    }
}

/// Reverse geocoding capability
///
/// Given a coordinate pair, returns zero or more candidate place names,
/// locality-scoped. Implementations must be shareable across workers.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<PlaceCandidate>, GeocodeError>;
}

/// Geocoding API response
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeResult {
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

/// Flatten a response into candidates, mapping API statuses to errors.
///
/// Every address component of every result becomes one candidate named by
/// its long name. `ZERO_RESULTS` is an empty list, not an error.
pub fn candidates_from_response(
    response: GeocodeResponse,
) -> Result<Vec<PlaceCandidate>, GeocodeError> {
    let message = response.error_message.unwrap_or_default();

    match response.status.as_str() {
        "OK" => Ok(response
            .results
            .into_iter()
            .flat_map(|result| result.address_components)
            .map(|component| PlaceCandidate {
                name: component.long_name,
                types: component.types,
            })
            .collect()),
        "ZERO_RESULTS" => Ok(Vec::new()),
        "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => Err(GeocodeError::RateLimitExceeded),
        "REQUEST_DENIED" => Err(GeocodeError::RequestDenied(message)),
        other => Err(GeocodeError::ApiError(other.to_string(), message)),
    }
}

/// Settings for [`GoogleGeocoder`]
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub api_key: String,
    pub base_url: String,
    pub rate_limit_per_second: u32,
    pub timeout: Duration,
}

impl GeocoderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: GOOGLE_GEOCODE_URL.to_string(),
            rate_limit_per_second: DEFAULT_RATE_LIMIT_PER_SECOND,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Google Geocoding API client
///
/// The rate limiter is shared by every caller of one client, so a single
/// instance behind an `Arc` enforces the ceiling across all workers.
pub struct GoogleGeocoder {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    rate_limiter: DefaultDirectRateLimiter,
}

impl GoogleGeocoder {
    pub fn new(config: GeocoderConfig) -> Result<Self, GeocodeError> {
        if config.api_key.trim().is_empty() {
            return Err(GeocodeError::MissingApiKey);
        }

        let per_second = NonZeroU32::new(config.rate_limit_per_second).ok_or_else(|| {
            GeocodeError::InvalidConfig("rate limit must be at least 1 request/second".to_string())
        })?;

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| GeocodeError::NetworkError(e.to_string()))?;

        tracing::debug!(
            base_url = %config.base_url,
            rate_limit = per_second.get(),
            timeout_secs = config.timeout.as_secs(),
            "Geocoding client created"
        );

        Ok(Self {
            http_client,
            base_url: config.base_url,
            api_key: config.api_key,
            rate_limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }
}

#[async_trait]
impl ReverseGeocoder for GoogleGeocoder {
    async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<PlaceCandidate>, GeocodeError> {
        // Waits for a token; shared across all concurrent callers
        self.rate_limiter.until_ready().await;

        let latlng = format!("{},{}", latitude, longitude);

        tracing::debug!(latlng = %latlng, "Querying geocoding API");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[
                ("latlng", latlng.as_str()),
                ("result_type", RESULT_TYPE),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| GeocodeError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status.as_u16() == 429 {
            return Err(GeocodeError::RateLimitExceeded);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GeocodeError::HttpError(status.as_u16(), error_text));
        }

        let body: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| GeocodeError::ParseError(e.to_string()))?;

        let candidates = candidates_from_response(body)?;

        tracing::debug!(
            latlng = %latlng,
            candidates = candidates.len(),
            "Geocoding lookup successful"
        );

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const LONDON_JSON: &str = r#"{
        "status": "OK",
        "results": [
            {
                "address_components": [
                    {"long_name": "London", "short_name": "London", "types": ["locality", "political"]}
                ]
            }
        ]
    }"#;

    const EXPECTED_REQUEST_LINE: &str =
        "GET /geocode?latlng=51.5%2C-0.12&result_type=locality&key=k HTTP/1.1";

    fn parse(json: &str) -> GeocodeResponse {
        serde_json::from_str(json).unwrap()
    }

    /// Serve a single canned HTTP response on a local port.
    ///
    /// Returns the endpoint URL and a handle yielding the request line.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/geocode", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();

            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;

            String::from_utf8_lossy(&request)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string()
        });

        (base_url, handle)
    }

    fn local_geocoder(base_url: String) -> GoogleGeocoder {
        let mut config = GeocoderConfig::new("k");
        config.base_url = base_url;
        config.timeout = Duration::from_secs(5);
        GoogleGeocoder::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_reverse_geocode_sends_locality_query() {
        let (base_url, server) = serve_once("200 OK", LONDON_JSON).await;

        let candidates = local_geocoder(base_url)
            .reverse_geocode(51.5, -0.12)
            .await
            .unwrap();

        assert_eq!(
            candidates,
            vec![PlaceCandidate::new("London", ["locality", "political"])]
        );
        assert_eq!(server.await.unwrap(), EXPECTED_REQUEST_LINE);
    }

    #[tokio::test]
    async fn test_reverse_geocode_http_429_is_rate_limit() {
        let (base_url, server) = serve_once("429 Too Many Requests", "").await;

        let result = local_geocoder(base_url).reverse_geocode(51.5, -0.12).await;

        assert!(matches!(result, Err(GeocodeError::RateLimitExceeded)));
        assert_eq!(server.await.unwrap(), EXPECTED_REQUEST_LINE);
    }

    #[tokio::test]
    async fn test_reverse_geocode_server_error_keeps_status_and_body() {
        let (base_url, server) = serve_once("500 Internal Server Error", "boom").await;

        let result = local_geocoder(base_url).reverse_geocode(51.5, -0.12).await;

        match result {
            Err(GeocodeError::HttpError(status, body)) => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected HttpError, got {:?}", other),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_reverse_geocode_undecodable_body_is_parse_error() {
        let (base_url, server) = serve_once("200 OK", "not json").await;

        let result = local_geocoder(base_url).reverse_geocode(51.5, -0.12).await;

        assert!(matches!(result, Err(GeocodeError::ParseError(_))));
        server.await.unwrap();
    }

    #[test]
    fn test_client_creation() {
        let client = GoogleGeocoder::new(GeocoderConfig::new("some_api_key"));
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_creation_requires_api_key() {
        let result = GoogleGeocoder::new(GeocoderConfig::new(""));
        assert!(matches!(result, Err(GeocodeError::MissingApiKey)));

        let result = GoogleGeocoder::new(GeocoderConfig::new("   "));
        assert!(matches!(result, Err(GeocodeError::MissingApiKey)));
    }

    #[test]
    fn test_client_creation_rejects_zero_rate_limit() {
        let mut config = GeocoderConfig::new("some_api_key");
        config.rate_limit_per_second = 0;

        let result = GoogleGeocoder::new(config);
        assert!(matches!(result, Err(GeocodeError::InvalidConfig(_))));
    }

    #[test]
    fn test_ok_response_flattens_all_components() {
        let response = parse(
            r#"{
                "status": "OK",
                "results": [
                    {
                        "address_components": [
                            {"long_name": "London", "short_name": "London", "types": ["locality", "political"]},
                            {"long_name": "Greater London", "short_name": "Greater London", "types": ["administrative_area_level_2", "political"]}
                        ]
                    },
                    {
                        "address_components": [
                            {"long_name": "United Kingdom", "short_name": "GB", "types": ["country", "political"]}
                        ]
                    }
                ]
            }"#,
        );

        let candidates = candidates_from_response(response).unwrap();

        assert_eq!(
            candidates,
            vec![
                PlaceCandidate::new("London", ["locality", "political"]),
                PlaceCandidate::new("Greater London", ["administrative_area_level_2", "political"]),
                PlaceCandidate::new("United Kingdom", ["country", "political"]),
            ]
        );
    }

    #[test]
    fn test_zero_results_is_empty_not_error() {
        let response = parse(r#"{"status": "ZERO_RESULTS", "results": []}"#);
        assert!(candidates_from_response(response).unwrap().is_empty());
    }

    #[test]
    fn test_status_mapping_to_errors() {
        let over_limit = parse(r#"{"status": "OVER_QUERY_LIMIT", "results": []}"#);
        assert!(matches!(
            candidates_from_response(over_limit),
            Err(GeocodeError::RateLimitExceeded)
        ));

        let denied = parse(
            r#"{"status": "REQUEST_DENIED", "results": [], "error_message": "The provided API key is invalid."}"#,
        );
        match candidates_from_response(denied) {
            Err(GeocodeError::RequestDenied(msg)) => assert!(msg.contains("API key")),
            other => panic!("expected RequestDenied, got {:?}", other),
        }

        let unknown = parse(r#"{"status": "UNKNOWN_ERROR"}"#);
        assert!(matches!(
            candidates_from_response(unknown),
            Err(GeocodeError::ApiError(status, _)) if status == "UNKNOWN_ERROR"
        ));
    }
}
