//! Relay configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Response language for station names and directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Nl,
    Fr,
    De,
}

impl Language {
    /// The iRail `lang` query value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Nl => "nl",
            Language::Fr => "fr",
            Language::De => "de",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unsupported language code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language: {0}")]
pub struct UnsupportedLanguage(pub String);

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "nl" => Ok(Language::Nl),
            "fr" => Ok(Language::Fr),
            "de" => Ok(Language::De),
            _ => Err(UnsupportedLanguage(s.to_string())),
        }
    }
}

/// Configuration parameters for the relay.
///
/// The defaults are the values the device firmware is built against; only
/// the language and time zone are meant to vary between installations.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Quiet period before a search request is executed.
    pub debounce_delay: Duration,

    /// Maximum number of departures delivered per search.
    pub max_departures: usize,

    /// Maximum number of favorite stations delivered to the device.
    pub max_favorites: usize,

    /// How far before the chosen departure a detail query starts.
    pub detail_lookback: chrono::Duration,

    /// Language used for iRail queries.
    pub language: Language,

    /// Time zone departure times are rendered in.
    pub timezone: Tz,

    /// Lifetime of cached search responses.
    pub search_cache_ttl: Duration,
}

impl RelayConfig {
    /// Build a config from the defaults, overridden by environment variables.
    ///
    /// Reads `COMMUTER_LANG`, `COMMUTER_TZ` and `COMMUTER_DEBOUNCE_MS`.
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(lang) = std::env::var("COMMUTER_LANG") {
            match lang.parse() {
                Ok(lang) => config.language = lang,
                Err(e) => warn!(error = %e, "ignoring COMMUTER_LANG"),
            }
        }

        if let Ok(tz) = std::env::var("COMMUTER_TZ") {
            match tz.parse::<Tz>() {
                Ok(tz) => config.timezone = tz,
                Err(e) => warn!(error = %e, "ignoring COMMUTER_TZ"),
            }
        }

        if let Ok(ms) = std::env::var("COMMUTER_DEBOUNCE_MS") {
            match ms.parse::<u64>() {
                Ok(ms) => config.debounce_delay = Duration::from_millis(ms),
                Err(e) => warn!(error = %e, "ignoring COMMUTER_DEBOUNCE_MS"),
            }
        }

        config
    }

    /// Set the query language.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Set the display time zone.
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            debounce_delay: Duration::from_millis(500),
            max_departures: 11,
            max_favorites: 6,
            detail_lookback: chrono::Duration::minutes(10),
            language: Language::En,
            timezone: chrono_tz::Europe::Brussels,
            search_cache_ttl: Duration::from_secs(30),
        }
    }
}
