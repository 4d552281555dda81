//! iRail API response DTOs.
//!
//! These types map directly to the iRail JSON responses. iRail encodes most
//! numbers as strings ("delay": "120") and omits nested objects freely, so
//! numeric fields go through lenient deserializers and nested objects are
//! `Option`s. Resolution of the optional fields lives in the formatter.

use serde::{Deserialize, Deserializer, Serialize};

/// Response from the `/connections/` endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionsResponse {
    /// Journey options, in departure order.
    #[serde(default)]
    pub connection: Vec<Connection>,
}

/// One journey option between two stations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Connection {
    pub id: Option<String>,

    /// Boarding at the origin station.
    #[serde(default)]
    pub departure: ConnectionStop,

    /// Alighting at the destination station.
    #[serde(default)]
    pub arrival: ConnectionStop,

    /// Total journey time in seconds.
    #[serde(default, deserialize_with = "opt_flex_i64")]
    pub duration: Option<i64>,

    /// Transfer points, absent for direct connections.
    pub vias: Option<Vias>,
}

/// A boarding or alighting event at one station.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionStop {
    /// Station display name.
    pub station: Option<String>,

    pub stationinfo: Option<StationInfo>,

    /// Scheduled time, Unix seconds.
    #[serde(default, deserialize_with = "opt_flex_i64")]
    pub time: Option<i64>,

    /// Delay in seconds.
    #[serde(default, deserialize_with = "opt_flex_i64")]
    pub delay: Option<i64>,

    #[serde(default, deserialize_with = "opt_flex_string")]
    pub platform: Option<String>,

    pub platforminfo: Option<PlatformInfo>,

    /// Vehicle reference, e.g. "BE.NMBS.IC1832".
    pub vehicle: Option<String>,

    pub vehicleinfo: Option<VehicleInfo>,

    /// Terminus of the vehicle.
    pub direction: Option<Direction>,

    /// Intermediate stops of the vehicle on this hop.
    pub stops: Option<Stops>,

    #[serde(default, deserialize_with = "opt_flex_i64")]
    pub canceled: Option<i64>,
}

/// Station reference embedded in stops and vias.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StationInfo {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Platform details, including whether it differs from the planned one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlatformInfo {
    #[serde(default, deserialize_with = "opt_flex_string")]
    pub name: Option<String>,

    /// "1" when the platform is the planned one, "0" when it changed.
    #[serde(default, deserialize_with = "opt_flex_string")]
    pub normal: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehicleInfo {
    pub name: Option<String>,

    /// Human-readable name, e.g. "IC 1832".
    pub shortname: Option<String>,

    #[serde(default, deserialize_with = "opt_flex_string")]
    pub number: Option<String>,

    /// Train type code, e.g. "IC", "S1", "L".
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Direction {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Stops {
    #[serde(default, deserialize_with = "opt_flex_i64")]
    pub number: Option<i64>,
}

/// Transfer points of a connection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Vias {
    #[serde(default, deserialize_with = "opt_flex_i64")]
    pub number: Option<i64>,

    #[serde(default)]
    pub via: Vec<Via>,
}

/// One transfer: alight from one vehicle, board the next.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Via {
    /// Arrival of the incoming vehicle.
    #[serde(default)]
    pub arrival: ConnectionStop,

    /// Departure of the outgoing vehicle.
    #[serde(default)]
    pub departure: ConnectionStop,

    pub station: Option<String>,

    pub stationinfo: Option<StationInfo>,
}

/// Response from the `/stations/` endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StationsResponse {
    #[serde(default)]
    pub station: Vec<StationDto>,
}

/// Minimal station DTO: we only need the id and the name.
///
/// Also the shape of the persisted station cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationDto {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flex {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

/// Deserialize an optional integer sent either as a JSON number or a string.
///
/// Unparseable strings become `None`.
fn opt_flex_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Flex> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Flex::Int(n)) => Some(n),
        Some(Flex::Float(f)) => Some(f as i64),
        Some(Flex::Str(s)) => s.trim().parse().ok(),
        Some(Flex::Bool(b)) => Some(i64::from(b)),
        None => None,
    })
}

/// Deserialize an optional string that iRail sometimes sends as a number.
fn opt_flex_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Flex> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Flex::Str(s)) => Some(s),
        Some(Flex::Int(n)) => Some(n.to_string()),
        Some(Flex::Float(f)) => Some(f.to_string()),
        Some(Flex::Bool(b)) => Some(if b { "1" } else { "0" }.to_string()),
        None => None,
    })
}
