//! Record normalization.
//!
//! Converts raw iRail connections into display-ready [`DepartureRecord`]s
//! and [`LegRecord`]s. All resolution of iRail's optional fields (which
//! name to show, what a missing platform means) happens here and nowhere
//! else.

use chrono_tz::Tz;

use crate::domain::{
    Bounded, ConnectionIdentifier, DepartureRecord, LegRecord, format_epoch_hhmm,
};
use crate::irail::{Connection, ConnectionStop, Via};

/// `platforminfo.normal` value meaning "not the planned platform".
const PLATFORM_CHANGED_SENTINEL: &str = "0";

/// Shown when iRail gives no usable name.
const UNKNOWN: &str = "Unknown";

/// Shown when iRail gives no platform.
const UNKNOWN_PLATFORM: &str = "?";

/// Train type assumed when the vehicle info carries none.
const DEFAULT_TRAIN_TYPE: &str = "IC";

/// Render a duration as "{h}h{m}m", "{h}h" or "{m}m".
///
/// Seconds are truncated to whole minutes first.
///
/// # Examples
///
/// ```
/// use commuter_relay::format::duration_string;
///
/// assert_eq!(duration_string(61 * 60), "1h1m");
/// assert_eq!(duration_string(60 * 60), "1h");
/// assert_eq!(duration_string(45 * 60), "45m");
/// ```
pub fn duration_string(total_secs: i64) -> String {
    let total_mins = total_secs.max(0) / 60;
    let hours = total_mins / 60;
    let minutes = total_mins % 60;

    match (hours, minutes) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h{m}m"),
    }
}

/// Delay in whole minutes, rounding towards negative infinity.
pub fn delay_minutes(delay_secs: Option<i64>) -> i32 {
    let mins = delay_secs.unwrap_or(0).div_euclid(60);
    mins.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// True exactly when iRail flags the platform as not the planned one.
pub fn platform_changed(stop: &ConnectionStop) -> bool {
    stop.platforminfo
        .as_ref()
        .and_then(|info| info.normal.as_deref())
        .is_some_and(|normal| normal.trim() == PLATFORM_CHANGED_SENTINEL)
}

/// True exactly when the connection has no transfers.
pub fn is_direct(conn: &Connection) -> bool {
    conn.vias
        .as_ref()
        .and_then(|vias| vias.number)
        .unwrap_or(0)
        == 0
}

/// Name of the station a stop happens at, if iRail gave one.
pub fn station_name(stop: &ConnectionStop) -> Option<&str> {
    stop.stationinfo
        .as_ref()
        .and_then(|info| info.name.as_deref())
        .or(stop.station.as_deref())
        .filter(|name| !name.is_empty())
}

/// Where a departing vehicle is headed.
///
/// Resolution order: the explicit direction name, then the arrival
/// station's name, then "Unknown".
pub fn resolve_direction<'a>(departure: &'a ConnectionStop, arrival_station: Option<&'a str>) -> &'a str {
    departure
        .direction
        .as_ref()
        .and_then(|direction| direction.name.as_deref())
        .filter(|name| !name.is_empty())
        .or(arrival_station)
        .unwrap_or(UNKNOWN)
}

/// The identifier needed to find this departure again later.
pub fn connection_identifier(conn: &Connection) -> ConnectionIdentifier {
    ConnectionIdentifier {
        vehicle_ref: conn.departure.vehicle.clone().unwrap_or_default(),
        departure_epoch_secs: conn.departure.time.unwrap_or(0),
    }
}

/// One end of a leg: a stop plus the via it belongs to, if any.
#[derive(Clone, Copy)]
struct LegEnd<'a> {
    stop: &'a ConnectionStop,
    via: Option<&'a Via>,
}

impl<'a> LegEnd<'a> {
    fn endpoint(stop: &'a ConnectionStop) -> Self {
        Self { stop, via: None }
    }

    fn at_via(stop: &'a ConnectionStop, via: &'a Via) -> Self {
        Self { stop, via: Some(via) }
    }

    /// The stop's own station name, falling back to the via's.
    fn station(&self) -> Option<&'a str> {
        station_name(self.stop).or_else(|| {
            let via = self.via?;
            via.stationinfo
                .as_ref()
                .and_then(|info| info.name.as_deref())
                .or(via.station.as_deref())
                .filter(|name| !name.is_empty())
        })
    }
}

/// Renders raw connections in a fixed display time zone.
#[derive(Debug, Clone, Copy)]
pub struct Formatter {
    timezone: Tz,
}

impl Formatter {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    fn time(&self, epoch_secs: Option<i64>) -> String {
        format_epoch_hhmm(epoch_secs.unwrap_or(0), self.timezone)
    }

    /// Project a connection into the departure list entry the device shows.
    pub fn departure_record(&self, conn: &Connection) -> DepartureRecord {
        let departure = &conn.departure;
        let arrival = &conn.arrival;

        let train_type = departure
            .vehicleinfo
            .as_ref()
            .and_then(|info| info.kind.as_deref())
            .filter(|kind| !kind.is_empty())
            .unwrap_or(DEFAULT_TRAIN_TYPE);

        let platform = departure
            .platform
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(UNKNOWN_PLATFORM);

        DepartureRecord {
            destination: Bounded::new(resolve_direction(departure, station_name(arrival))),
            depart_time: self.time(departure.time),
            depart_timestamp: departure.time.unwrap_or(0),
            arrive_time: self.time(arrival.time),
            platform: Bounded::new(platform),
            train_type: Bounded::new(train_type),
            duration: Bounded::from(duration_string(conn.duration.unwrap_or(0))),
            depart_delay: delay_minutes(departure.delay),
            arrive_delay: delay_minutes(arrival.delay),
            is_direct: is_direct(conn),
            platform_changed: platform_changed(departure),
        }
    }

    /// Split a connection into its legs.
    ///
    /// Leg 0 runs from the departure to the first transfer's arrival; each
    /// transfer's departure starts the next leg, which ends at the next
    /// transfer's arrival or, for the last one, at the overall arrival. The
    /// result always has one more leg than there are transfers.
    pub fn leg_records(&self, conn: &Connection) -> Vec<LegRecord> {
        let vias = conn.vias.as_ref().map(|v| v.via.as_slice()).unwrap_or(&[]);

        let boardings = std::iter::once(LegEnd::endpoint(&conn.departure))
            .chain(vias.iter().map(|via| LegEnd::at_via(&via.departure, via)));
        let alightings = vias
            .iter()
            .map(|via| LegEnd::at_via(&via.arrival, via))
            .chain(std::iter::once(LegEnd::endpoint(&conn.arrival)));

        boardings
            .zip(alightings)
            .map(|(board, alight)| self.leg(board, alight))
            .collect()
    }

    fn leg(&self, board: LegEnd<'_>, alight: LegEnd<'_>) -> LegRecord {
        let depart = board.stop;
        let arrive = alight.stop;
        let arrive_station = alight.station();

        let vehicle = depart
            .vehicleinfo
            .as_ref()
            .and_then(|info| info.shortname.as_deref())
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN);

        let stop_count = depart
            .stops
            .as_ref()
            .and_then(|stops| stops.number)
            .unwrap_or(0)
            .clamp(0, u16::MAX as i64) as u16;

        LegRecord {
            depart_station: Bounded::new(board.station().unwrap_or(UNKNOWN)),
            arrive_station: Bounded::new(arrive_station.unwrap_or(UNKNOWN)),
            depart_time: self.time(depart.time),
            arrive_time: self.time(arrive.time),
            depart_platform: Bounded::new(
                depart.platform.as_deref().filter(|p| !p.is_empty()).unwrap_or(UNKNOWN_PLATFORM),
            ),
            arrive_platform: Bounded::new(
                arrive.platform.as_deref().filter(|p| !p.is_empty()).unwrap_or(UNKNOWN_PLATFORM),
            ),
            depart_delay: delay_minutes(depart.delay),
            arrive_delay: delay_minutes(arrive.delay),
            vehicle: Bounded::new(vehicle),
            direction: Bounded::new(resolve_direction(depart, arrive_station)),
            stop_count,
            depart_platform_changed: platform_changed(depart),
            arrive_platform_changed: platform_changed(arrive),
        }
    }
}
