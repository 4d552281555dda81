use std::time::Duration;

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use commuter_relay::cache::{CacheConfig, CachedSource};
use commuter_relay::config::RelayConfig;
use commuter_relay::irail::{IrailClient, IrailConfig};
use commuter_relay::protocol::{InboundMessage, LineTransport};
use commuter_relay::relay::{DeviceConfiguration, Relay};
use commuter_relay::storage::JsonFileStore;

/// How often to refresh station names (24 hours).
const STATION_REFRESH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default location of the persisted session.
const DEFAULT_STORE_PATH: &str = "commuter_store.json";

/// One line on stdin: a settings event or a device message.
#[derive(Deserialize)]
#[serde(untagged)]
enum InboundLine {
    Configuration { configuration: DeviceConfiguration },
    Device(serde_json::Value),
}

#[tokio::main]
async fn main() {
    // stdout carries device messages, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("commuter_relay=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = RelayConfig::from_env();

    let client =
        IrailClient::new(IrailConfig::from_env()).expect("Failed to create iRail client");
    let source = CachedSource::new(client, &CacheConfig::with_ttl(config.search_cache_ttl));

    let store_path =
        std::env::var("COMMUTER_STORE").unwrap_or_else(|_| DEFAULT_STORE_PATH.to_string());
    let store = JsonFileStore::open(store_path);

    let relay = Relay::new(source, LineTransport::new(tokio::io::stdout()), store, config);
    info!(
        language = %relay.config().language,
        timezone = %relay.config().timezone,
        "relay starting"
    );
    let _initial_refresh = relay.start().await;

    // Spawn background task to refresh station names daily
    let refresher = relay.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(STATION_REFRESH_INTERVAL);
        interval.tick().await; // First tick is immediate, skip it
        loop {
            interval.tick().await;
            refresher.refresh_stations().await;
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "failed to read stdin");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str(&line) {
            Ok(InboundLine::Configuration { configuration }) => {
                relay.apply_configuration(configuration).await;
            }
            Ok(InboundLine::Device(value)) => match InboundMessage::from_value(value) {
                Ok(message) => relay.handle(message).await,
                Err(e) => warn!(error = %e, "ignoring device message"),
            },
            Err(e) => warn!(error = %e, "ignoring unparseable line"),
        }
    }

    info!("stdin closed, shutting down");
}
