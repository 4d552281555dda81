//! Configuration pushed from the companion settings page.

use serde::Deserialize;
use tracing::warn;

use crate::schedule::{ScheduleRule, retain_valid};

/// A configuration event: favorites and schedule rules.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfiguration {
    /// Favorite station ids, in device order.
    #[serde(default)]
    pub favorite_stations: Vec<String>,

    /// Raw schedule rules; `None` leaves the stored rules untouched.
    #[serde(default)]
    pub smart_schedules: Option<Vec<serde_json::Value>>,
}

impl DeviceConfiguration {
    /// The well-formed schedule rules, if the event carried any.
    ///
    /// Rules that do not parse, or whose window wraps past midnight, are
    /// dropped with a warning; the rest keep their order.
    pub fn schedule_rules(&self) -> Option<Vec<ScheduleRule>> {
        let raw = self.smart_schedules.as_ref()?;
        let parsed = raw
            .iter()
            .enumerate()
            .filter_map(|(position, value)| {
                match serde_json::from_value::<ScheduleRule>(value.clone()) {
                    Ok(rule) => Some(rule),
                    Err(e) => {
                        warn!(position, error = %e, "dropping malformed schedule rule");
                        None
                    }
                }
            })
            .collect();
        Some(retain_valid(parsed))
    }
}
