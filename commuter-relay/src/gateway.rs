//! Fetch gateway: validated, typed access to the schedule source.
//!
//! The gateway checks request preconditions before any network traffic,
//! folds every transport or parse failure into a single
//! [`GatewayError::FetchFailed`], and re-locates a previously listed
//! departure inside a fresh detail response. It never retries; retry policy
//! belongs to the caller.

use std::future::Future;

use chrono::Duration;
use chrono_tz::Tz;
use tracing::debug;

use crate::config::{Language, RelayConfig};
use crate::domain::{ConnectionIdentifier, Route, epoch_to_local};
use crate::irail::{
    Connection, ConnectionQuery, ConnectionsResponse, IrailClient, IrailError, StationDto,
};

/// Errors surfaced by the gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Missing or identical station ids; no request was made.
    #[error("invalid request: {0}")]
    InvalidRequest(&'static str),

    /// Network, HTTP or parse failure.
    #[error("fetch failed: {0}")]
    FetchFailed(#[from] IrailError),

    /// The requested connection is not in the fresh response.
    #[error("connection not found: {vehicle_ref} at {departure_epoch_secs}")]
    NotFound {
        vehicle_ref: String,
        departure_epoch_secs: i64,
    },
}

/// Anything that can answer connection and station queries.
///
/// Implemented by [`IrailClient`], by the caching wrapper and by the
/// in-memory mock used in tests.
pub trait ScheduleSource: Send + Sync {
    /// Search connections for a query.
    fn connections(
        &self,
        query: &ConnectionQuery,
    ) -> impl Future<Output = Result<ConnectionsResponse, IrailError>> + Send;

    /// Fetch the full station list.
    fn stations(
        &self,
        lang: Language,
    ) -> impl Future<Output = Result<Vec<StationDto>, IrailError>> + Send;
}

impl ScheduleSource for IrailClient {
    async fn connections(&self, query: &ConnectionQuery) -> Result<ConnectionsResponse, IrailError> {
        self.get_connections(query).await
    }

    async fn stations(&self, lang: Language) -> Result<Vec<StationDto>, IrailError> {
        self.get_stations(lang).await
    }
}

/// Check the route preconditions shared by search and detail fetches.
pub fn validate_route(route: &Route) -> Result<(), GatewayError> {
    if route.from_station_id.is_empty() {
        return Err(GatewayError::InvalidRequest("missing from station"));
    }
    if route.to_station_id.is_empty() {
        return Err(GatewayError::InvalidRequest("missing to station"));
    }
    if route.from_station_id == route.to_station_id {
        return Err(GatewayError::InvalidRequest("from and to stations are the same"));
    }
    Ok(())
}

/// Find the connection matching `identifier` exactly.
///
/// Both the vehicle reference and the scheduled departure time must match;
/// there is no nearest-match fallback.
pub fn find_connection(
    response: ConnectionsResponse,
    identifier: &ConnectionIdentifier,
) -> Result<Connection, GatewayError> {
    response
        .connection
        .into_iter()
        .find(|conn| {
            conn.departure.vehicle.as_deref() == Some(identifier.vehicle_ref.as_str())
                && conn.departure.time == Some(identifier.departure_epoch_secs)
        })
        .ok_or_else(|| GatewayError::NotFound {
            vehicle_ref: identifier.vehicle_ref.clone(),
            departure_epoch_secs: identifier.departure_epoch_secs,
        })
}

/// Typed access to a [`ScheduleSource`].
#[derive(Debug, Clone)]
pub struct FetchGateway<S> {
    source: S,
    language: Language,
    timezone: Tz,
    detail_lookback: Duration,
}

impl<S: ScheduleSource> FetchGateway<S> {
    /// Create a gateway over `source`, taking language, time zone and
    /// detail look-back from `config`.
    pub fn new(source: S, config: &RelayConfig) -> Self {
        Self {
            source,
            language: config.language,
            timezone: config.timezone,
            detail_lookback: config.detail_lookback,
        }
    }

    /// Access the underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Search the next connections for a route.
    pub async fn search_connections(
        &self,
        route: &Route,
    ) -> Result<ConnectionsResponse, GatewayError> {
        validate_route(route)?;

        let query = ConnectionQuery::now(
            route.from_station_id.as_str(),
            route.to_station_id.as_str(),
            self.language,
        );
        let response = self.source.connections(&query).await?;
        debug!(count = response.connection.len(), "search response");
        Ok(response)
    }

    /// Re-fetch one previously listed departure with its full leg details.
    ///
    /// Queries a window starting `detail_lookback` before the departure so
    /// that the departure itself is always inside the response, then
    /// matches it exactly by vehicle and scheduled time.
    pub async fn fetch_connection_detail(
        &self,
        route: &Route,
        identifier: &ConnectionIdentifier,
    ) -> Result<Connection, GatewayError> {
        validate_route(route)?;

        let departure = epoch_to_local(identifier.departure_epoch_secs, self.timezone);
        let query = ConnectionQuery {
            at: Some(departure - self.detail_lookback),
            ..ConnectionQuery::now(
                route.from_station_id.as_str(),
                route.to_station_id.as_str(),
                self.language,
            )
        };

        let response = self.source.connections(&query).await?;
        debug!(
            count = response.connection.len(),
            vehicle = %identifier.vehicle_ref,
            "detail response"
        );
        find_connection(response, identifier)
    }

    /// Fetch the station list.
    pub async fn fetch_stations(&self) -> Result<Vec<StationDto>, GatewayError> {
        Ok(self.source.stations(self.language).await?)
    }
}
