// src/services/geocoding_client.rs
// DOCUMENTATION: Google Geocoding API client
// PURPOSE: Resolve listing addresses to coordinates with bounded retry

use crate::config::Config;
use crate::errors::AppError;
use crate::models::{GeoLocation, PropertyAddress};
use reqwest::Client;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

/// Geocoding API client
/// DOCUMENTATION: Holds the API key and the retry policy
#[derive(Clone)]
pub struct GeocodingClient {
    client: Client,
    api_key: String,
    base_url: String,
    max_attempts: u32,
    retry_delay: Duration,
}

/// Response from the Geocoding API
#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    pub status: String,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeResult {
    pub formatted_address: Option<String>,
    pub geometry: GeocodeGeometry,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeGeometry {
    pub location: GeocodeLatLng,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeLatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Result of a single geocoding attempt
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Found(GeoLocation),
    /// The address does not exist; retrying will not help
    NoMatch,
    /// Rejected request (bad key, malformed query); retrying will not help
    Fatal(String),
    /// Transport failure, quota or server hiccup
    Retryable(String),
}

impl GeocodeResponse {
    /// Map the API status onto an attempt outcome
    pub fn into_outcome(self) -> AttemptOutcome {
        match self.status.as_str() {
            "OK" => match self.results.into_iter().next() {
                Some(result) => AttemptOutcome::Found(GeoLocation {
                    latitude: result.geometry.location.lat,
                    longitude: result.geometry.location.lng,
                    formatted_address: result.formatted_address,
                }),
                None => AttemptOutcome::NoMatch,
            },
            "ZERO_RESULTS" => AttemptOutcome::NoMatch,
            "REQUEST_DENIED" | "INVALID_REQUEST" => AttemptOutcome::Fatal(
                self.error_message
                    .unwrap_or_else(|| format!("Geocoder status {}", self.status)),
            ),
            // OVER_QUERY_LIMIT, UNKNOWN_ERROR and anything new
            other => AttemptOutcome::Retryable(
                self.error_message
                    .unwrap_or_else(|| format!("Geocoder status {}", other)),
            ),
        }
    }
}

/// Run `attempt` up to `max_attempts` times, sleeping `delay` between tries
/// Only Retryable outcomes are retried
pub async fn retry_with_delay<F, Fut>(
    max_attempts: u32,
    delay: Duration,
    mut attempt: F,
) -> Result<GeoLocation, AppError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = AttemptOutcome>,
{
    let max_attempts = max_attempts.max(1);
    let mut last_error = String::new();

    for n in 1..=max_attempts {
        match attempt(n).await {
            AttemptOutcome::Found(location) => return Ok(location),
            AttemptOutcome::NoMatch => {
                return Err(AppError::ValidationError(
                    "Could not geocode address".to_string(),
                ))
            }
            AttemptOutcome::Fatal(msg) => {
                log::error!("Geocoding request rejected: {}", msg);
                return Err(AppError::ExternalApiError(msg));
            }
            AttemptOutcome::Retryable(msg) => {
                log::warn!("Geocoding attempt {}/{} failed: {}", n, max_attempts, msg);
                last_error = msg;
                if n < max_attempts && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(AppError::ExternalApiError(format!(
        "Geocoding failed after {} attempts: {}",
        max_attempts, last_error
    )))
}

impl GeocodingClient {
    pub fn new(api_key: String, max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://maps.googleapis.com/maps/api/geocode/json".to_string(),
            max_attempts,
            retry_delay,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.geocoding_api_key.clone(),
            config.geocoding_max_attempts,
            Duration::from_millis(config.geocoding_retry_delay_ms),
        )
    }

    /// Point the client at another endpoint (local stubs)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Geocode an address
    /// DOCUMENTATION: Returns Ok(None) when no API key is configured so
    /// listings can still be saved in development
    pub async fn geocode(
        &self,
        address: &PropertyAddress,
    ) -> Result<Option<GeoLocation>, AppError> {
        if !self.is_configured() {
            log::warn!("Geocoding skipped, no API key configured");
            return Ok(None);
        }

        let full_query = address.to_query();
        log::debug!("Geocoding address: {}", full_query);

        let query = full_query.as_str();
        let location =
            retry_with_delay(self.max_attempts, self.retry_delay, move |_| self.attempt(query))
                .await?;

        log::info!(
            "Geocoded '{}' to ({}, {})",
            query,
            location.latitude,
            location.longitude
        );
        Ok(Some(location))
    }

    async fn attempt(&self, query: &str) -> AttemptOutcome {
        let params = [("address", query), ("key", self.api_key.as_str())];

        let response = match self.client.get(&self.base_url).query(&params).send().await {
            Ok(response) => response,
            Err(e) => return AttemptOutcome::Retryable(format!("Request failed: {}", e)),
        };

        if !response.status().is_success() {
            return AttemptOutcome::Retryable(format!("HTTP {}", response.status()));
        }

        match response.json::<GeocodeResponse>().await {
            Ok(body) => body.into_outcome(),
            Err(e) => AttemptOutcome::Retryable(format!("Parse error: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    fn sample_address() -> PropertyAddress {
        PropertyAddress {
            address: "1600 Amphitheatre Parkway".to_string(),
            city: "Mountain View".to_string(),
            state: Some("CA".to_string()),
            zip_code: None,
            country: "US".to_string(),
        }
    }

    fn location() -> GeoLocation {
        GeoLocation {
            latitude: 37.422,
            longitude: -122.084,
            formatted_address: Some("1600 Amphitheatre Pkwy".to_string()),
        }
    }

    #[test]
    fn test_ok_response_takes_first_result() {
        let body: GeocodeResponse = serde_json::from_value(json!({
            "status": "OK",
            "results": [
                {
                    "formatted_address": "1600 Amphitheatre Pkwy",
                    "geometry": { "location": { "lat": 37.422, "lng": -122.084 } }
                },
                {
                    "formatted_address": "Elsewhere",
                    "geometry": { "location": { "lat": 1.0, "lng": 2.0 } }
                }
            ]
        }))
        .unwrap();

        assert_eq!(body.into_outcome(), AttemptOutcome::Found(location()));
    }

    #[test]
    fn test_status_classification() {
        let outcome = |status: &str| {
            serde_json::from_value::<GeocodeResponse>(json!({ "status": status }))
                .unwrap()
                .into_outcome()
        };

        assert_eq!(outcome("ZERO_RESULTS"), AttemptOutcome::NoMatch);
        assert!(matches!(outcome("REQUEST_DENIED"), AttemptOutcome::Fatal(_)));
        assert!(matches!(outcome("INVALID_REQUEST"), AttemptOutcome::Fatal(_)));
        assert!(matches!(outcome("OVER_QUERY_LIMIT"), AttemptOutcome::Retryable(_)));
        assert!(matches!(outcome("UNKNOWN_ERROR"), AttemptOutcome::Retryable(_)));
        // OK without results is treated as no match
        assert_eq!(outcome("OK"), AttemptOutcome::NoMatch);
    }

    #[tokio::test]
    async fn test_retry_stops_at_max_attempts() {
        let calls = Cell::new(0);
        let result = retry_with_delay(3, Duration::ZERO, |_| {
            calls.set(calls.get() + 1);
            async { AttemptOutcome::Retryable("quota".to_string()) }
        })
        .await;

        assert_eq!(calls.get(), 3);
        assert!(matches!(result, Err(AppError::ExternalApiError(_))));
    }

    #[tokio::test]
    async fn test_retry_recovers_after_transient_failure() {
        let result = retry_with_delay(3, Duration::ZERO, |n| async move {
            if n < 2 {
                AttemptOutcome::Retryable("timeout".to_string())
            } else {
                AttemptOutcome::Found(location())
            }
        })
        .await;

        assert_eq!(result.unwrap(), location());
    }

    #[tokio::test]
    async fn test_no_match_is_not_retried() {
        let calls = Cell::new(0);
        let result = retry_with_delay(5, Duration::ZERO, |_| {
            calls.set(calls.get() + 1);
            async { AttemptOutcome::NoMatch }
        })
        .await;

        assert_eq!(calls.get(), 1);
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_fatal_is_not_retried() {
        let calls = Cell::new(0);
        let result = retry_with_delay(5, Duration::ZERO, |_| {
            calls.set(calls.get() + 1);
            async { AttemptOutcome::Fatal("bad key".to_string()) }
        })
        .await;

        assert_eq!(calls.get(), 1);
        assert!(matches!(result, Err(AppError::ExternalApiError(_))));
    }

    #[tokio::test]
    async fn test_delay_is_applied_between_attempts() {
        let started = std::time::Instant::now();
        let _ = retry_with_delay(3, Duration::from_millis(20), |_| async {
            AttemptOutcome::Retryable("down".to_string())
        })
        .await;

        // Two sleeps for three attempts
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn test_unconfigured_client_skips_geocoding() {
        let client = GeocodingClient::new(String::new(), 3, Duration::ZERO);
        let location = tokio_test::block_on(client.geocode(&sample_address()));
        assert_eq!(location.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unreachable_host_exhausts_retries() {
        let client = GeocodingClient::new("key".to_string(), 2, Duration::ZERO)
            .with_base_url("http://127.0.0.1:9/geocode");
        let err = client.geocode(&sample_address()).await.unwrap_err();
        assert!(matches!(err, AppError::ExternalApiError(_)));
    }
}
