//! Protocol orchestration.
//!
//! [`Relay`] owns every piece of session state and turns device requests
//! and configuration events into transmission jobs:
//!
//! - a search request is acknowledged at once, debounced, fetched, and
//!   delivered as a count followed by departures;
//! - a detail request looks up the stored departure identifier, re-fetches
//!   that departure and delivers its legs;
//! - configuration and start-up deliver favorites and preselect the route
//!   of the active schedule rule.

mod configuration;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::correlation::CorrelationStore;
use crate::debounce::Debouncer;
use crate::domain::{ConnectionIdentifier, RequestId, RequestKind, Route};
use crate::format::{Formatter, connection_identifier};
use crate::gateway::{FetchGateway, ScheduleSource};
use crate::protocol::{
    InboundMessage, Job, JobReport, OutboundMessage, SequentialTransmitter, StationSelection,
    Transport,
};
use crate::schedule;
use crate::stations::{StationDirectory, legacy_station_id};
use crate::storage::{KeyValueStore, SessionStore};

pub use configuration::DeviceConfiguration;

/// Relays schedule data between iRail and the device.
///
/// Cloning is cheap; clones share the same session.
pub struct Relay<S, T, K> {
    inner: Arc<Inner<S, T, K>>,
}

impl<S, T, K> Clone for Relay<S, T, K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<S, T, K> {
    config: RelayConfig,
    gateway: FetchGateway<S>,
    transmitter: SequentialTransmitter<T>,
    session_store: SessionStore<K>,
    stations: StationDirectory,
    formatter: Formatter,
    debouncer: Debouncer,
    /// Active requests and departure identifiers, mutated by every handler.
    correlation: Mutex<CorrelationStore>,
}

/// Resolve the station pair of a search request to iRail ids.
///
/// Unknown legacy names resolve to an empty id, which the gateway rejects.
fn resolve_route(stations: StationSelection) -> Route {
    match stations {
        StationSelection::Ids { from, to } => Route::new(from, to),
        StationSelection::LegacyNames { from, to } => {
            let resolve = |name: &str| {
                legacy_station_id(name).unwrap_or_else(|| {
                    warn!(name, "unknown legacy station name");
                    ""
                })
            };
            Route::new(resolve(&from), resolve(&to))
        }
    }
}

impl<S, T, K> Relay<S, T, K>
where
    S: ScheduleSource + 'static,
    T: Transport + 'static,
    K: KeyValueStore + 'static,
{
    /// Create a relay, restoring the persisted session from `store`.
    ///
    /// A stored language takes precedence over the configured one.
    pub fn new(source: S, transport: T, store: K, config: RelayConfig) -> Self {
        let session_store = SessionStore::new(store);

        let config = match session_store.load_language() {
            Some(language) => {
                info!(%language, "using stored language");
                config.with_language(language)
            }
            None => config,
        };

        let mut correlation = CorrelationStore::with_identifiers(session_store.load_identifiers());
        if let Some(route) = session_store.load_route() {
            info!(
                from = %route.from_station_id,
                to = %route.to_station_id,
                "restored session"
            );
            correlation.adopt_request(RequestKind::Search, RequestId::default(), route);
        }

        let stations = StationDirectory::new(session_store.load_station_cache());

        Self {
            inner: Arc::new(Inner {
                gateway: FetchGateway::new(source, &config),
                transmitter: SequentialTransmitter::new(transport),
                formatter: Formatter::new(config.timezone),
                debouncer: Debouncer::new(),
                correlation: Mutex::new(correlation),
                session_store,
                stations,
                config,
            }),
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.inner.config
    }

    pub fn stations(&self) -> &StationDirectory {
        &self.inner.stations
    }

    pub fn session_store(&self) -> &SessionStore<K> {
        &self.inner.session_store
    }

    pub fn transport(&self) -> &T {
        self.inner.transmitter.transport()
    }

    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.inner.config.timezone)
    }

    /// Handle one request from the device.
    ///
    /// Search requests return once acknowledged; the search itself runs
    /// after the debounce delay. Detail requests return once delivered.
    pub async fn handle(&self, message: InboundMessage) {
        debug!(?message, "inbound message");
        match message {
            InboundMessage::RequestData {
                request_id,
                stations,
            } => {
                self.request_data(request_id, resolve_route(stations))
                    .await
            }
            InboundMessage::RequestDetails {
                request_id,
                departure_index,
            } => self.request_details(request_id, departure_index).await,
        }
    }

    async fn request_data(&self, request_id: Option<RequestId>, route: Route) {
        let inner = &self.inner;

        let request_id = {
            let mut correlation = inner.correlation.lock().await;
            match request_id {
                Some(id) => {
                    correlation.adopt_request(RequestKind::Search, id, route.clone());
                    id
                }
                None => correlation.begin_request(RequestKind::Search, route.clone()),
            }
        };
        info!(
            %request_id,
            from = %route.from_station_id,
            to = %route.to_station_id,
            "search requested"
        );

        if let Err(error) = inner.session_store.save_route(&route) {
            warn!(%error, "failed to persist route");
        }

        let ack = OutboundMessage::RequestAck { request_id };
        if let Err(error) = inner.transmitter.send_one(&ack).await {
            warn!(%request_id, %error, "acknowledgment not delivered");
        }

        let relay = self.clone();
        inner.debouncer.schedule(inner.config.debounce_delay, async move {
            relay.run_search(request_id, route).await;
        });
    }

    async fn run_search(&self, request_id: RequestId, route: Route) {
        let inner = &self.inner;
        let max = inner.config.max_departures;
        debug!(%request_id, "running search");

        let records = match inner.gateway.search_connections(&route).await {
            Ok(response) => {
                let delivered = &response.connection[..response.connection.len().min(max)];
                self.store_identifiers(request_id, delivered.iter().map(connection_identifier).collect())
                    .await;
                delivered
                    .iter()
                    .map(|conn| inner.formatter.departure_record(conn))
                    .collect()
            }
            Err(error) => {
                warn!(%request_id, %error, "search failed, sending empty result");
                self.store_identifiers(request_id, Vec::new()).await;
                Vec::new()
            }
        };

        match inner
            .transmitter
            .run(Job::departures(request_id, records, max))
            .await
        {
            Ok(report) => info!(
                %request_id,
                delivered = report.delivered,
                failed = report.failed.len(),
                "departures delivered"
            ),
            Err(error) => warn!(%request_id, %error, "departures not delivered"),
        }
    }

    /// Record the identifiers of a search result, unless a newer search
    /// has been accepted since it started.
    async fn store_identifiers(&self, request_id: RequestId, identifiers: Vec<ConnectionIdentifier>) {
        let mut correlation = self.inner.correlation.lock().await;
        if !correlation.is_active(RequestKind::Search, request_id) {
            debug!(%request_id, "search superseded, keeping newer identifiers");
            return;
        }

        correlation.replace_identifiers(identifiers);
        if let Err(error) = self
            .inner
            .session_store
            .save_identifiers(correlation.identifiers())
        {
            warn!(%error, "failed to persist departure identifiers");
        }
    }

    async fn request_details(&self, request_id: Option<RequestId>, departure_index: u8) {
        let inner = &self.inner;

        let (request_id, route, identifier) = {
            let mut correlation = inner.correlation.lock().await;
            let route = correlation.active(RequestKind::Search).route.clone();
            let request_id = match request_id {
                Some(id) => {
                    correlation.adopt_request(RequestKind::Detail, id, route.clone());
                    id
                }
                None => correlation.begin_request(RequestKind::Detail, route.clone()),
            };
            let identifier = correlation
                .get_identifier(usize::from(departure_index))
                .cloned();
            (request_id, route, identifier)
        };

        let identifier = match identifier {
            Ok(identifier) => identifier,
            Err(error) => {
                warn!(%request_id, %error, "detail requested for unknown departure");
                return;
            }
        };
        info!(
            %request_id,
            departure_index,
            vehicle = %identifier.vehicle_ref,
            "details requested"
        );

        let connection = match inner
            .gateway
            .fetch_connection_detail(&route, &identifier)
            .await
        {
            Ok(connection) => connection,
            Err(error) => {
                warn!(%request_id, %error, "detail fetch failed");
                return;
            }
        };

        let legs = inner.formatter.leg_records(&connection);
        match inner
            .transmitter
            .run(Job::legs(request_id, departure_index, legs))
            .await
        {
            Ok(report) => info!(
                %request_id,
                delivered = report.delivered,
                failed = report.failed.len(),
                "legs delivered"
            ),
            Err(error) => warn!(%request_id, %error, "legs not delivered"),
        }
    }

    /// Send the favorite stations to the device, in order.
    ///
    /// Ids missing from the station directory are sent with the id as the
    /// name, so device indices always match list positions.
    pub async fn deliver_favorites(&self, favorites: &[String]) -> Option<JobReport> {
        let inner = &self.inner;
        let max = inner.config.max_favorites;

        let mut stations = Vec::with_capacity(favorites.len().min(max));
        for id in favorites.iter().take(max) {
            stations.push((inner.stations.name(id).await, id.clone()));
        }

        match inner.transmitter.run(Job::stations(stations, max)).await {
            Ok(report) => {
                info!(
                    delivered = report.delivered,
                    failed = report.failed.len(),
                    "favorites delivered"
                );
                Some(report)
            }
            Err(error) => {
                warn!(%error, "favorites not delivered");
                None
            }
        }
    }

    /// Preselect `route` on the device by its positions in `favorites`.
    ///
    /// Returns false, sending nothing, when either station is not among
    /// the favorites delivered to the device.
    pub async fn set_active_route(&self, favorites: &[String], route: &Route) -> bool {
        let delivered = &favorites[..favorites.len().min(self.inner.config.max_favorites)];
        let position = |id: &str| {
            delivered
                .iter()
                .position(|favorite| favorite == id)
                .and_then(|i| u8::try_from(i).ok())
        };

        let (Some(from_index), Some(to_index)) = (
            position(&route.from_station_id),
            position(&route.to_station_id),
        ) else {
            info!(
                from = %route.from_station_id,
                to = %route.to_station_id,
                "active route stations not in favorites"
            );
            return false;
        };

        let message = OutboundMessage::SetActiveRoute {
            from_index,
            to_index,
        };
        match self.inner.transmitter.send_one(&message).await {
            Ok(()) => {
                info!(from_index, to_index, "active route set");
                true
            }
            Err(error) => {
                warn!(%error, "active route not delivered");
                false
            }
        }
    }

    /// Apply a configuration event at the current time.
    pub async fn apply_configuration(&self, configuration: DeviceConfiguration) {
        self.apply_configuration_at(configuration, self.now()).await;
    }

    /// Apply a configuration event, evaluating schedules at `now`.
    ///
    /// Non-empty favorites are stored and delivered. Schedule rules, when
    /// present, replace the stored ones and may preselect a route.
    pub async fn apply_configuration_at(&self, configuration: DeviceConfiguration, now: DateTime<Tz>) {
        let store = &self.inner.session_store;

        let favorites = if configuration.favorite_stations.is_empty() {
            store.load_favorites().unwrap_or_default()
        } else {
            if let Err(error) = store.save_favorites(&configuration.favorite_stations) {
                warn!(%error, "failed to persist favorites");
            }
            self.deliver_favorites(&configuration.favorite_stations).await;
            configuration.favorite_stations.clone()
        };

        if let Some(rules) = configuration.schedule_rules() {
            if let Err(error) = store.save_schedules(&rules) {
                warn!(%error, "failed to persist schedules");
            }
            info!(rules = rules.len(), "schedules updated");
            if let Some(route) = schedule::evaluate(&rules, &now) {
                self.set_active_route(&favorites, &route).await;
            }
        }
    }

    /// Start the session at the current time.
    pub async fn start(&self) -> JoinHandle<()> {
        self.start_at(self.now()).await
    }

    /// Start the session, evaluating schedules at `now`.
    ///
    /// Spawns a station list refresh and returns its handle, then delivers
    /// the stored favorites and preselects the scheduled route.
    pub async fn start_at(&self, now: DateTime<Tz>) -> JoinHandle<()> {
        let relay = self.clone();
        let refresh = tokio::spawn(async move {
            relay.refresh_stations().await;
        });

        let store = &self.inner.session_store;
        match store.load_favorites() {
            Some(favorites) => {
                info!(count = favorites.len(), "delivering saved favorites");
                self.deliver_favorites(&favorites).await;

                let rules = schedule::retain_valid(store.load_schedules());
                match schedule::evaluate(&rules, &now) {
                    Some(route) => {
                        self.set_active_route(&favorites, &route).await;
                    }
                    None => debug!("no active schedule"),
                }
            }
            None => info!("no saved favorites"),
        }

        refresh
    }

    /// Refresh the station directory and persist the fetched list.
    ///
    /// Returns the number of stations loaded; on failure the directory
    /// keeps its current contents.
    pub async fn refresh_stations(&self) -> Option<usize> {
        let inner = &self.inner;
        match inner.stations.refresh(&inner.gateway).await {
            Ok(stations) => {
                if let Err(error) = inner.session_store.save_station_cache(&stations) {
                    warn!(%error, "failed to persist station cache");
                }
                info!(count = stations.len(), "station list refreshed");
                Some(stations.len())
            }
            Err(error) => {
                warn!(%error, "station list refresh failed");
                None
            }
        }
    }
}
