//! Display-ready records delivered to the device.
//!
//! These are produced by the formatter from raw iRail connections. Every
//! text field is a [`Bounded`] string sized to the device's buffers.

use serde::Serialize;

use super::Bounded;

/// One departure in a search result, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DepartureRecord {
    /// Terminus of the departing train (or the arrival station).
    pub destination: Bounded<31>,

    /// Local departure time, "HH:MM".
    pub depart_time: String,

    /// Raw departure time as Unix seconds.
    pub depart_timestamp: i64,

    /// Local arrival time, "HH:MM".
    pub arrive_time: String,

    pub platform: Bounded<3>,

    /// Train type code, e.g. "IC" or "S1".
    pub train_type: Bounded<7>,

    /// Journey duration, e.g. "1h12m".
    pub duration: Bounded<7>,

    /// Departure delay in whole minutes.
    pub depart_delay: i32,

    /// Arrival delay in whole minutes.
    pub arrive_delay: i32,

    /// True when the journey needs no transfer.
    pub is_direct: bool,

    pub platform_changed: bool,
}

/// One hop of a journey, between two consecutive boarding/alighting points.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LegRecord {
    pub depart_station: Bounded<31>,
    pub arrive_station: Bounded<31>,
    pub depart_time: String,
    pub arrive_time: String,
    pub depart_platform: Bounded<3>,
    pub arrive_platform: Bounded<3>,
    pub depart_delay: i32,
    pub arrive_delay: i32,

    /// Short vehicle name, e.g. "IC 1234".
    pub vehicle: Bounded<15>,

    /// Terminus of the vehicle.
    pub direction: Bounded<31>,

    /// Intermediate stops on this leg.
    pub stop_count: u16,

    pub depart_platform_changed: bool,
    pub arrive_platform_changed: bool,
}
