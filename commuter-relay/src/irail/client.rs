//! iRail HTTP client.
//!
//! Provides async methods for querying the iRail connections and stations
//! endpoints. Handles the User-Agent iRail asks clients to send, request
//! concurrency limiting, and status-code mapping.

use std::sync::Arc;

use chrono::DateTime;
use chrono_tz::Tz;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::config::Language;

use super::error::IrailError;
use super::types::{ConnectionsResponse, StationDto, StationsResponse};

/// Default base URL for the iRail API.
const DEFAULT_BASE_URL: &str = "https://api.irail.be";

/// Identifies this client to iRail, as their usage policy requests.
const DEFAULT_USER_AGENT: &str = "WerknaamCommuter <https://werknaam.be, commuter@werknaam.be>";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 2;

/// Parameters of one connections query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionQuery {
    pub from: String,
    pub to: String,

    /// Departure time to search from; `None` means "now".
    pub at: Option<DateTime<Tz>>,

    pub lang: Language,
}

impl ConnectionQuery {
    /// A query for the next departures from now.
    pub fn now(from: impl Into<String>, to: impl Into<String>, lang: Language) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            at: None,
            lang,
        }
    }

    /// Query parameters in the form iRail expects.
    ///
    /// Dates are "DDMMYY" and times "HHMM", both in the query's time zone.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("from", self.from.clone()),
            ("to", self.to.clone()),
            ("format", "json".to_string()),
            ("lang", self.lang.as_str().to_string()),
        ];
        if let Some(at) = &self.at {
            params.push(("date", at.format("%d%m%y").to_string()));
            params.push(("time", at.format("%H%M").to_string()));
        }
        params
    }
}

/// Configuration for the iRail client.
#[derive(Debug, Clone)]
pub struct IrailConfig {
    /// Base URL for the API (defaults to production iRail)
    pub base_url: String,
    /// Station list endpoint; `{base_url}/v1/stations` when unset
    pub stations_url: Option<String>,
    /// Value of the User-Agent header
    pub user_agent: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl IrailConfig {
    /// Create a new config pointing at production iRail.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            stations_url: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 30,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Fetch the station list from `url` instead of the base URL.
    pub fn with_stations_url(mut self, url: impl Into<String>) -> Self {
        self.stations_url = Some(url.into());
        self
    }

    /// Set the User-Agent header value.
    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// The station list endpoint this config points at.
    pub fn stations_endpoint(&self) -> String {
        match &self.stations_url {
            Some(url) => url.clone(),
            None => format!("{}/v1/stations", self.base_url.trim_end_matches('/')),
        }
    }

    /// Build a config from the defaults, overridden by environment variables.
    ///
    /// Reads `IRAIL_BASE_URL`, `IRAIL_STATIONS_URL`, `IRAIL_TIMEOUT_SECS`
    /// and `IRAIL_MAX_CONCURRENT`. Unparseable numbers are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::new();

        if let Ok(url) = std::env::var("IRAIL_BASE_URL") {
            config = config.with_base_url(url);
        }
        if let Ok(url) = std::env::var("IRAIL_STATIONS_URL") {
            config = config.with_stations_url(url);
        }

        if let Ok(secs) = std::env::var("IRAIL_TIMEOUT_SECS") {
            match secs.parse() {
                Ok(secs) => config = config.with_timeout(secs),
                Err(e) => warn!(error = %e, "ignoring IRAIL_TIMEOUT_SECS"),
            }
        }

        if let Ok(n) = std::env::var("IRAIL_MAX_CONCURRENT") {
            match n.parse() {
                Ok(n) => config = config.with_max_concurrent(n),
                Err(e) => warn!(error = %e, "ignoring IRAIL_MAX_CONCURRENT"),
            }
        }

        config
    }
}

impl Default for IrailConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// iRail API client.
///
/// Uses a semaphore to limit concurrent requests and stay within the
/// public API's rate limits.
#[derive(Debug, Clone)]
pub struct IrailClient {
    http: reqwest::Client,
    base_url: String,
    stations_url: String,
    semaphore: Arc<Semaphore>,
}

impl IrailClient {
    /// Create a new iRail client with the given configuration.
    pub fn new(config: IrailConfig) -> Result<Self, IrailError> {
        let mut headers = HeaderMap::new();

        let agent =
            HeaderValue::from_str(&config.user_agent).map_err(|_| IrailError::Api {
                status: 0,
                message: "Invalid User-Agent format".to_string(),
            })?;
        headers.insert(USER_AGENT, agent);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            stations_url: config.stations_endpoint(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    /// Search connections between two stations.
    pub async fn get_connections(
        &self,
        query: &ConnectionQuery,
    ) -> Result<ConnectionsResponse, IrailError> {
        let url = format!("{}/connections/", self.base_url);
        debug!(from = %query.from, to = %query.to, at = ?query.at, "fetching connections");
        self.get_json(&url, &query.params()).await
    }

    /// Fetch the full station list.
    pub async fn get_stations(&self, lang: Language) -> Result<Vec<StationDto>, IrailError> {
        let url = &self.stations_url;
        let params = [
            ("format", "json".to_string()),
            ("lang", lang.as_str().to_string()),
        ];
        let response: StationsResponse = self.get_json(url, &params).await?;
        Ok(response.station)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&'static str, String)],
    ) -> Result<T, IrailError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| IrailError::Api {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let response = self.http.get(url).query(params).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(IrailError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IrailError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| IrailError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })
    }
}
