//! ROOK processed-data API client
//!
//! One call fetches one (family, user, day) tuple. `204 No Content` is the
//! provider's way of saying nothing was recorded and maps to
//! [`DayFetch::NoData`]; every other non-`200` status is an error. There are
//! no retries here, the caller decides what a failed day means.

use chrono::NaiveDate;
use reqwest::header::{HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::{ClientConfig, ProviderCredentials};
use crate::db::models::MetricFamily;
use crate::error::{Result, RookError};
use crate::models::{GlucoseResponse, HeartRateResponse, StepsResponse};

/// User agent for provider requests
const API_USER_AGENT: &str = concat!("rook-sync/", env!("CARGO_PKG_VERSION"));

const PHYSICAL_HEALTH_PATH: &str = "/v2/processed_data/physical_health";
const BODY_HEALTH_PATH: &str = "/v2/processed_data/body_health";

/// Outcome of a successful round trip for one day
#[derive(Debug, Clone, PartialEq)]
pub enum DayFetch<T> {
    /// Provider answered `204 No Content`
    NoData,
    /// Decoded response body
    Payload(T),
}

impl<T> DayFetch<T> {
    pub fn is_no_data(&self) -> bool {
        matches!(self, DayFetch::NoData)
    }

    pub fn into_payload(self) -> Option<T> {
        match self {
            DayFetch::NoData => None,
            DayFetch::Payload(payload) => Some(payload),
        }
    }
}

/// Path of a family's endpoint relative to the API root
pub fn endpoint_path(family: MetricFamily) -> String {
    match family {
        MetricFamily::Steps => format!("{}/summary", PHYSICAL_HEALTH_PATH),
        MetricFamily::BloodGlucose => format!("{}/events/blood_glucose", BODY_HEALTH_PATH),
        MetricFamily::HeartRate => format!("{}/events/heart_rate", PHYSICAL_HEALTH_PATH),
    }
}

/// ROOK API client
pub struct RookClient {
    client: Client,
    base_url: String,
    credentials: Option<ProviderCredentials>,
}

impl RookClient {
    /// Create a client; credentials are read from the environment on every request
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RookError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base.trim_end_matches('/').to_string(),
            credentials: None,
        })
    }

    /// Create a client with a custom base URL (for testing)
    #[doc(hidden)]
    pub fn new_with_base_url(base_url: &str) -> Result<Self> {
        Self::new(&ClientConfig {
            api_base: base_url.to_string(),
            ..ClientConfig::default()
        })
    }

    /// Pin the credential pair instead of reading the environment
    pub fn with_credentials(mut self, credentials: ProviderCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Build the full URL for one family and day
    fn build_url(&self, family: MetricFamily, user_id: &str, day: NaiveDate) -> Result<Url> {
        let raw = format!("{}{}", self.base_url, endpoint_path(family));
        let mut url = Url::parse(&raw)
            .map_err(|e| RookError::config(format!("Invalid API URL {}: {}", raw, e)))?;

        url.query_pairs_mut()
            .append_pair("user_id", user_id)
            .append_pair("date", &day.format("%Y-%m-%d").to_string());

        Ok(url)
    }

    fn credentials(&self) -> ProviderCredentials {
        self.credentials
            .clone()
            .unwrap_or_else(ProviderCredentials::from_env)
    }

    /// Fetch one day of one family and decode the body as `T`
    pub async fn fetch_day<T: DeserializeOwned>(
        &self,
        family: MetricFamily,
        user_id: &str,
        day: NaiveDate,
    ) -> Result<DayFetch<T>> {
        let url = self.build_url(family, user_id, day)?;
        let credentials = self.credentials();

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, HeaderValue::from_static(API_USER_AGENT))
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .basic_auth(&credentials.client_uuid, Some(&credentials.secret_key))
            .send()
            .await
            .map_err(RookError::Http)?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(DayFetch::NoData),
            StatusCode::OK => {
                let body = response.text().await.map_err(RookError::Http)?;
                serde_json::from_str(&body).map(DayFetch::Payload).map_err(|e| {
                    RookError::invalid_response(format!(
                        "Failed to decode {} response: {}",
                        family, e
                    ))
                })
            }
            status => Err(RookError::Api {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("Unknown status")
                    .to_string(),
            }),
        }
    }

    /// Fetch the daily physical summary carrying the step count
    pub async fn fetch_steps(&self, user_id: &str, day: NaiveDate) -> Result<DayFetch<StepsResponse>> {
        self.fetch_day(MetricFamily::Steps, user_id, day).await
    }

    /// Fetch blood glucose events
    pub async fn fetch_blood_glucose(
        &self,
        user_id: &str,
        day: NaiveDate,
    ) -> Result<DayFetch<GlucoseResponse>> {
        self.fetch_day(MetricFamily::BloodGlucose, user_id, day).await
    }

    /// Fetch heart rate events
    pub async fn fetch_heart_rate(
        &self,
        user_id: &str,
        day: NaiveDate,
    ) -> Result<DayFetch<HeartRateResponse>> {
        self.fetch_day(MetricFamily::HeartRate, user_id, day).await
    }
}
