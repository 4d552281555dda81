//! Station id → name lookup.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::gateway::{FetchGateway, GatewayError, ScheduleSource};
use crate::irail::StationDto;

/// Thread-safe station name lookup.
///
/// Seeded from the persisted station cache so names resolve before the
/// network list arrives, then replaced wholesale on each refresh.
#[derive(Clone, Default)]
pub struct StationDirectory {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl StationDirectory {
    /// Create a directory holding `stations`.
    pub fn new(stations: Vec<StationDto>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(build_map(stations))),
        }
    }

    /// Create an empty directory.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up a station name by id.
    pub async fn get(&self, id: &str) -> Option<String> {
        let guard = self.inner.read().await;
        guard.get(id).cloned()
    }

    /// Display name for `id`, or the id itself when it is not known.
    pub async fn name(&self, id: &str) -> String {
        self.get(id).await.unwrap_or_else(|| id.to_string())
    }

    /// Get the number of stations in the lookup.
    pub async fn len(&self) -> usize {
        let guard = self.inner.read().await;
        guard.len()
    }

    /// Check if the lookup is empty.
    pub async fn is_empty(&self) -> bool {
        let guard = self.inner.read().await;
        guard.is_empty()
    }

    /// Replace the mapping with `stations`.
    pub async fn replace(&self, stations: Vec<StationDto>) -> usize {
        let map = build_map(stations);
        let count = map.len();

        let mut guard = self.inner.write().await;
        *guard = map;

        count
    }

    /// Refresh the station data through `gateway`.
    ///
    /// On success, replaces the current mapping and returns the fetched
    /// list for persisting. On failure, the existing mapping is preserved
    /// and the error is returned.
    pub async fn refresh<S: ScheduleSource>(
        &self,
        gateway: &FetchGateway<S>,
    ) -> Result<Vec<StationDto>, GatewayError> {
        let stations = gateway.fetch_stations().await?;
        self.replace(stations.clone()).await;
        Ok(stations)
    }
}

/// Build the id → name map, skipping entries without an id.
fn build_map(stations: Vec<StationDto>) -> HashMap<String, String> {
    stations
        .into_iter()
        .filter(|s| !s.id.is_empty())
        .map(|s| (s.id, s.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;
    use crate::irail::MockIrail;

    fn station(id: &str, name: &str) -> StationDto {
        StationDto {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn name_falls_back_to_id() {
        let directory = StationDirectory::new(vec![station("BE.NMBS.008813003", "Brussels-Central")]);

        assert_eq!(directory.name("BE.NMBS.008813003").await, "Brussels-Central");
        assert_eq!(directory.name("BE.NMBS.000000000").await, "BE.NMBS.000000000");
        assert_eq!(directory.get("BE.NMBS.000000000").await, None);
    }

    #[test]
    fn build_map_skips_empty_ids() {
        let map = build_map(vec![station("", "Nowhere"), station("A", "Alpha")]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("A"), Some(&"Alpha".to_string()));
    }

    #[tokio::test]
    async fn refresh_replaces_mapping() {
        let mock = MockIrail::new();
        mock.set_stations(vec![station("B", "Beta"), station("C", "Gamma")]);
        let gateway = FetchGateway::new(mock, &RelayConfig::default());
        let directory = StationDirectory::new(vec![station("A", "Alpha")]);

        let fetched = directory.refresh(&gateway).await.unwrap();

        assert_eq!(fetched.len(), 2);
        assert_eq!(directory.len().await, 2);
        assert_eq!(directory.get("A").await, None);
        assert_eq!(directory.name("C").await, "Gamma");
    }

    #[tokio::test]
    async fn failed_refresh_keeps_mapping() {
        let mock = MockIrail::new();
        mock.fail_with_status(503);
        let gateway = FetchGateway::new(mock, &RelayConfig::default());
        let directory = StationDirectory::new(vec![station("A", "Alpha")]);

        assert!(directory.refresh(&gateway).await.is_err());
        assert_eq!(directory.name("A").await, "Alpha");
        assert!(!directory.is_empty().await);
    }
}
