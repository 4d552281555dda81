//! In-memory iRail stand-in for testing without network access.
//!
//! Serves canned connection lists keyed by (from, to) and a canned station
//! list, and records the queries it receives.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::Language;
use crate::gateway::ScheduleSource;

use super::client::ConnectionQuery;
use super::error::IrailError;
use super::types::{Connection, ConnectionStop, ConnectionsResponse, StationDto, VehicleInfo};

#[derive(Default)]
struct MockState {
    connections: HashMap<(String, String), Vec<Connection>>,
    stations: Vec<StationDto>,
    failure_status: Option<u16>,
    queries: Vec<ConnectionQuery>,
}

/// Mock schedule source that serves data from memory.
///
/// Clones share state, so a test can keep a handle for assertions after
/// moving a clone into a gateway.
#[derive(Clone, Default)]
pub struct MockIrail {
    state: Arc<Mutex<MockState>>,
}

impl MockIrail {
    /// Create an empty mock. Unknown routes answer with no connections.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serve `connections` for every query from `from` to `to`.
    pub fn add_connections(&self, from: &str, to: &str, connections: Vec<Connection>) {
        self.state()
            .connections
            .insert((from.to_string(), to.to_string()), connections);
    }

    /// Serve `stations` from the station list endpoint.
    pub fn set_stations(&self, stations: Vec<StationDto>) {
        self.state().stations = stations;
    }

    /// Fail every subsequent request with the given HTTP status.
    pub fn fail_with_status(&self, status: u16) {
        self.state().failure_status = Some(status);
    }

    /// Number of connection queries received.
    pub fn call_count(&self) -> usize {
        self.state().queries.len()
    }

    /// The most recent connection query.
    pub fn last_query(&self) -> Option<ConnectionQuery> {
        self.state().queries.last().cloned()
    }

    /// A minimal direct connection departing at `departure` on `vehicle`.
    pub fn connection(vehicle: &str, departure: i64) -> Connection {
        let short = vehicle.rsplit('.').next().unwrap_or(vehicle);
        Connection {
            id: None,
            departure: ConnectionStop {
                time: Some(departure),
                vehicle: Some(vehicle.to_string()),
                vehicleinfo: Some(VehicleInfo {
                    name: Some(vehicle.to_string()),
                    shortname: Some(short.to_string()),
                    number: None,
                    kind: Some(short.trim_end_matches(|c: char| c.is_ascii_digit()).to_string()),
                }),
                platform: Some("1".to_string()),
                ..ConnectionStop::default()
            },
            arrival: ConnectionStop {
                time: Some(departure + 1800),
                platform: Some("2".to_string()),
                ..ConnectionStop::default()
            },
            duration: Some(1800),
            vias: None,
        }
    }
}

impl ScheduleSource for MockIrail {
    async fn connections(&self, query: &ConnectionQuery) -> Result<ConnectionsResponse, IrailError> {
        let mut state = self.state();
        state.queries.push(query.clone());

        if let Some(status) = state.failure_status {
            return Err(IrailError::Api {
                status,
                message: "mock failure".to_string(),
            });
        }

        let connection = state
            .connections
            .get(&(query.from.clone(), query.to.clone()))
            .cloned()
            .unwrap_or_default();
        Ok(ConnectionsResponse { connection })
    }

    async fn stations(&self, _lang: Language) -> Result<Vec<StationDto>, IrailError> {
        let state = self.state();
        if let Some(status) = state.failure_status {
            return Err(IrailError::Api {
                status,
                message: "mock failure".to_string(),
            });
        }
        Ok(state.stations.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_canned_connections() {
        let mock = MockIrail::new();
        mock.add_connections("A", "B", vec![MockIrail::connection("BE.NMBS.IC1", 100)]);

        let query = ConnectionQuery::now("A", "B", Language::En);
        let response = mock.connections(&query).await.unwrap();
        assert_eq!(response.connection.len(), 1);

        let other = ConnectionQuery::now("B", "A", Language::En);
        assert!(mock.connections(&other).await.unwrap().connection.is_empty());
        assert_eq!(mock.call_count(), 2);
    }

    #[test]
    fn canned_connection_shape() {
        let conn = MockIrail::connection("BE.NMBS.IC1832", 1000);
        let info = conn.departure.vehicleinfo.unwrap();
        assert_eq!(info.shortname.as_deref(), Some("IC1832"));
        assert_eq!(info.kind.as_deref(), Some("IC"));
        assert_eq!(conn.arrival.time, Some(2800));
    }
}
