//! iRail client.
//!
//! This module provides an HTTP client for the iRail API, which serves
//! Belgian rail (NMBS/SNCB) connections and the station list.
//!
//! Key characteristics of iRail:
//! - Station ids look like "BE.NMBS.008813003"
//! - Times are Unix seconds and delays are seconds, both usually sent as strings
//! - There is no stable connection id; a departure is re-identified by its
//!   vehicle reference and scheduled departure time

mod client;
mod error;
#[cfg(test)]
mod mock;
mod types;

pub use client::{ConnectionQuery, IrailClient, IrailConfig};
pub use error::IrailError;
#[cfg(test)]
pub use mock::MockIrail;
pub use types::{
    Connection, ConnectionStop, ConnectionsResponse, Direction, PlatformInfo, StationDto,
    StationInfo, StationsResponse, Stops, VehicleInfo, Via, Vias,
};
