//! Typed access to the persisted session.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{trace, warn};

use crate::config::Language;
use crate::domain::{ConnectionIdentifier, Route};
use crate::irail::StationDto;
use crate::schedule::ScheduleRule;

use super::error::StorageError;
use super::{keys, KeyValueStore};

/// Typed load/save over a [`KeyValueStore`].
///
/// Loads never fail: absent values load as `None` and corrupt values are
/// logged and load as `None`.
#[derive(Debug, Clone)]
pub struct SessionStore<K> {
    store: K,
}

impl<K: KeyValueStore> SessionStore<K> {
    pub fn new(store: K) -> Self {
        Self { store }
    }

    /// Access the underlying store.
    pub fn store(&self) -> &K {
        &self.store
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.store.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "ignoring corrupt stored value");
                None
            }
        }
    }

    fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        trace!(key, bytes = raw.len(), "saving");
        self.store.set(key, raw)
    }

    /// The last searched route, when both ends are stored.
    pub fn load_route(&self) -> Option<Route> {
        let from: String = self.load(keys::FROM_STATION)?;
        let to: String = self.load(keys::TO_STATION)?;
        Some(Route::new(from, to))
    }

    pub fn save_route(&self, route: &Route) -> Result<(), StorageError> {
        self.save(keys::FROM_STATION, &route.from_station_id)?;
        self.save(keys::TO_STATION, &route.to_station_id)
    }

    /// Identifiers of the last delivered departures, by display index.
    pub fn load_identifiers(&self) -> Vec<Option<ConnectionIdentifier>> {
        self.load(keys::CONNECTIONS).unwrap_or_default()
    }

    pub fn save_identifiers(
        &self,
        identifiers: &[Option<ConnectionIdentifier>],
    ) -> Result<(), StorageError> {
        self.save(keys::CONNECTIONS, identifiers)
    }

    pub fn load_station_cache(&self) -> Vec<StationDto> {
        self.load(keys::STATION_CACHE).unwrap_or_default()
    }

    pub fn save_station_cache(&self, stations: &[StationDto]) -> Result<(), StorageError> {
        self.save(keys::STATION_CACHE, stations)
    }

    /// Favorite station ids in device order, if configured.
    pub fn load_favorites(&self) -> Option<Vec<String>> {
        self.load(keys::FAVORITE_STATIONS)
    }

    pub fn save_favorites(&self, favorites: &[String]) -> Result<(), StorageError> {
        self.save(keys::FAVORITE_STATIONS, favorites)
    }

    /// Stored schedule rules; a rule with a malformed time discards the list.
    pub fn load_schedules(&self) -> Vec<ScheduleRule> {
        self.load(keys::SMART_SCHEDULES).unwrap_or_default()
    }

    pub fn save_schedules(&self, rules: &[ScheduleRule]) -> Result<(), StorageError> {
        self.save(keys::SMART_SCHEDULES, rules)
    }

    pub fn load_language(&self) -> Option<Language> {
        self.load(keys::LANGUAGE)
    }

    pub fn save_language(&self, language: Language) -> Result<(), StorageError> {
        self.save(keys::LANGUAGE, &language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn session() -> SessionStore<MemoryStore> {
        SessionStore::new(MemoryStore::new())
    }

    #[test]
    fn route_needs_both_ends() {
        let session = session();
        assert_eq!(session.load_route(), None);

        session
            .store()
            .set(keys::FROM_STATION, "\"BE.NMBS.008813003\"".into())
            .unwrap();
        assert_eq!(session.load_route(), None);

        session
            .save_route(&Route::new("BE.NMBS.008813003", "BE.NMBS.008821006"))
            .unwrap();
        assert_eq!(
            session.load_route(),
            Some(Route::new("BE.NMBS.008813003", "BE.NMBS.008821006"))
        );
    }

    #[test]
    fn identifiers_keep_their_stored_shape() {
        let session = session();
        let identifiers = vec![
            Some(ConnectionIdentifier {
                vehicle_ref: "BE.NMBS.IC1832".into(),
                departure_epoch_secs: 1_710_493_200,
            }),
            None,
        ];
        session.save_identifiers(&identifiers).unwrap();

        assert_eq!(
            session.store().get(keys::CONNECTIONS).as_deref(),
            Some(r#"[{"vehicle":"BE.NMBS.IC1832","departTime":1710493200},null]"#)
        );
        assert_eq!(session.load_identifiers(), identifiers);
    }

    #[test]
    fn corrupt_values_load_as_absent() {
        let session = session();
        session
            .store()
            .set(keys::FAVORITE_STATIONS, "[not json".into())
            .unwrap();
        session.store().set(keys::CONNECTIONS, "{}".into()).unwrap();

        assert_eq!(session.load_favorites(), None);
        assert!(session.load_identifiers().is_empty());
    }

    #[test]
    fn station_cache_and_language() {
        let session = session();
        let stations = vec![StationDto {
            id: "BE.NMBS.008813003".into(),
            name: "Brussels-Central".into(),
        }];
        session.save_station_cache(&stations).unwrap();
        session.save_language(Language::Fr).unwrap();

        assert_eq!(session.load_station_cache(), stations);
        assert_eq!(session.load_language(), Some(Language::Fr));
    }

    #[test]
    fn schedules_round_trip_through_store() {
        let session = session();
        let json = r#"[{"id":"s1","enabled":true,"days":[1,2],"startTime":"07:00",
                        "endTime":"09:00","fromId":"A","toId":"B"}]"#;
        session
            .store()
            .set(keys::SMART_SCHEDULES, json.into())
            .unwrap();

        let rules = session.load_schedules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].route(), Route::new("A", "B"));
    }
}
