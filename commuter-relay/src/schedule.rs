//! Time-windowed route rules.
//!
//! A rule names a route that should be preselected on the device during a
//! daily time window on chosen weekdays.

use chrono::{DateTime, Datelike, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{ClockTime, Route};

/// A time/day-windowed route rule, as stored and as configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRule {
    pub id: String,
    pub enabled: bool,

    /// Weekdays the rule applies on, 0 = Sunday through 6 = Saturday.
    pub days: Vec<u8>,

    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub from_id: String,
    pub to_id: String,
}

impl ScheduleRule {
    /// Windows never wrap past midnight.
    pub fn is_valid(&self) -> bool {
        self.start_time <= self.end_time
    }

    fn matches(&self, weekday: u8, time: ClockTime) -> bool {
        self.enabled
            && self.days.contains(&weekday)
            && self.start_time <= time
            && time <= self.end_time
    }

    pub fn route(&self) -> Route {
        Route::new(&self.from_id, &self.to_id)
    }
}

/// Keep only rules with a well-formed window, logging the rest.
pub fn retain_valid(rules: Vec<ScheduleRule>) -> Vec<ScheduleRule> {
    rules
        .into_iter()
        .filter(|rule| {
            let valid = rule.is_valid();
            if !valid {
                warn!(
                    id = %rule.id,
                    start = %rule.start_time,
                    end = %rule.end_time,
                    "dropping rule whose window wraps past midnight"
                );
            }
            valid
        })
        .collect()
}

/// Route of the first enabled rule whose window contains `now`.
///
/// Both window ends are inclusive, at minute resolution in `now`'s zone.
pub fn evaluate<Tz: TimeZone>(rules: &[ScheduleRule], now: &DateTime<Tz>) -> Option<Route> {
    let weekday = u8::try_from(now.weekday().num_days_from_sunday()).unwrap_or_default();
    let time = ClockTime::from_time(now.time());

    let matched = rules.iter().find(|rule| rule.matches(weekday, time));
    match matched {
        Some(rule) => debug!(id = %rule.id, %weekday, %time, "schedule matched"),
        None => debug!(%weekday, %time, rules = rules.len(), "no schedule matched"),
    }
    matched.map(ScheduleRule::route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Europe::Brussels;
    use proptest::prelude::*;

    fn rule(id: &str, days: &[u8], start: &str, end: &str, from: &str, to: &str) -> ScheduleRule {
        ScheduleRule {
            id: id.to_string(),
            enabled: true,
            days: days.to_vec(),
            start_time: start.parse().unwrap(),
            end_time: end.parse().unwrap(),
            from_id: from.to_string(),
            to_id: to.to_string(),
        }
    }

    // 2024-03-18 is a Monday.
    fn monday_at(hour: u32, minute: u32) -> DateTime<chrono_tz::Tz> {
        Brussels.with_ymd_and_hms(2024, 3, 18, hour, minute, 0).unwrap()
    }

    #[test]
    fn first_match_wins() {
        let rules = vec![
            rule("morning", &[1, 2, 3, 4, 5], "07:00", "09:30", "A", "B"),
            rule("overlap", &[1], "08:00", "10:00", "C", "D"),
        ];

        assert_eq!(evaluate(&rules, &monday_at(8, 15)), Some(Route::new("A", "B")));
        assert_eq!(evaluate(&rules, &monday_at(9, 45)), Some(Route::new("C", "D")));
    }

    #[test]
    fn window_is_inclusive() {
        let rules = vec![rule("r", &[1], "07:00", "09:30", "A", "B")];

        assert!(evaluate(&rules, &monday_at(7, 0)).is_some());
        assert!(evaluate(&rules, &monday_at(9, 30)).is_some());
        assert!(evaluate(&rules, &monday_at(6, 59)).is_none());
        assert!(evaluate(&rules, &monday_at(9, 31)).is_none());
    }

    #[test]
    fn seconds_do_not_leave_the_window() {
        let rules = vec![rule("r", &[1], "07:00", "09:30", "A", "B")];
        let late = Brussels.with_ymd_and_hms(2024, 3, 18, 9, 30, 59).unwrap();
        assert!(evaluate(&rules, &late).is_some());
    }

    #[test]
    fn disabled_and_wrong_day_are_skipped() {
        let mut disabled = rule("off", &[1], "00:00", "23:59", "X", "Y");
        disabled.enabled = false;
        let weekend = rule("weekend", &[0, 6], "00:00", "23:59", "S", "T");

        assert_eq!(evaluate(&[disabled, weekend], &monday_at(12, 0)), None);
    }

    #[test]
    fn sunday_is_day_zero() {
        let rules = vec![rule("sunday", &[0], "00:00", "23:59", "A", "B")];
        let sunday = Brussels.with_ymd_and_hms(2024, 3, 17, 12, 0, 0).unwrap();
        assert!(evaluate(&rules, &sunday).is_some());
    }

    #[test]
    fn no_rules_no_route() {
        assert_eq!(evaluate(&[], &monday_at(8, 0)), None);
    }

    #[test]
    fn wrapping_windows_are_dropped() {
        let rules = vec![
            rule("night", &[1], "23:00", "01:00", "A", "B"),
            rule("day", &[1], "08:00", "18:00", "C", "D"),
        ];
        let kept = retain_valid(rules);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "day");
    }

    #[test]
    fn deserializes_stored_shape() {
        let json = r#"[{"id":"s1","enabled":true,"days":[1,2,3],"startTime":"07:00",
                        "endTime":"09:00","fromId":"BE.NMBS.008813003","toId":"BE.NMBS.008821006"}]"#;
        let rules: Vec<ScheduleRule> = serde_json::from_str(json).unwrap();
        assert_eq!(rules[0].start_time, ClockTime::new(7, 0).unwrap());
        assert_eq!(rules[0].route(), Route::new("BE.NMBS.008813003", "BE.NMBS.008821006"));
    }

    #[test]
    fn malformed_time_fails_to_deserialize() {
        let json = r#"{"id":"s1","enabled":true,"days":[1],"startTime":"7am",
                       "endTime":"09:00","fromId":"A","toId":"B"}"#;
        assert!(serde_json::from_str::<ScheduleRule>(json).is_err());
    }

    fn arb_rule() -> impl Strategy<Value = ScheduleRule> {
        (
            any::<bool>(),
            proptest::collection::vec(0u8..7, 0..7),
            0u8..24,
            0u8..60,
            0u8..24,
            0u8..60,
            "[A-D]",
            "[A-D]",
        )
            .prop_map(|(enabled, days, h1, m1, h2, m2, from, to)| ScheduleRule {
                id: format!("{from}{to}"),
                enabled,
                days,
                start_time: ClockTime::new(h1, m1).unwrap(),
                end_time: ClockTime::new(h2, m2).unwrap(),
                from_id: from,
                to_id: to,
            })
    }

    proptest! {
        #[test]
        fn evaluation_is_repeatable(
            rules in proptest::collection::vec(arb_rule(), 0..8),
            day in 17u32..24,
            hour in 0u32..24,
            minute in 0u32..60,
        ) {
            let now = Brussels.with_ymd_and_hms(2024, 3, day, hour, minute, 0).unwrap();
            prop_assert_eq!(evaluate(&rules, &now), evaluate(&rules, &now));
        }
    }
}
