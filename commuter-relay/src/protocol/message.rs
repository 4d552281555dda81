//! Device message model.
//!
//! The transport carries each message as a flat dictionary of typed fields
//! keyed by name, with `MESSAGE_TYPE` selecting the kind. Outbound messages
//! serialize to that dictionary; inbound dictionaries parse into
//! [`InboundMessage`].

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;

use crate::domain::{Bounded, DepartureRecord, LegRecord, RequestId};

/// Numeric message kinds shared with the device firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    RequestData = 1,
    SendDeparture = 2,
    SendCount = 3,
    RequestDetails = 4,
    SendDetail = 5,
    SendStationCount = 6,
    SendStation = 7,
    SetActiveRoute = 8,
    RequestAck = 9,
}

impl MessageType {
    /// The wire code of this kind.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up a kind by its wire code.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            1 => MessageType::RequestData,
            2 => MessageType::SendDeparture,
            3 => MessageType::SendCount,
            4 => MessageType::RequestDetails,
            5 => MessageType::SendDetail,
            6 => MessageType::SendStationCount,
            7 => MessageType::SendStation,
            8 => MessageType::SetActiveRoute,
            9 => MessageType::RequestAck,
            _ => return None,
        })
    }
}

/// A message from the relay to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// A search request was received.
    RequestAck { request_id: RequestId },

    /// Number of departures that follow.
    Count { count: u8, request_id: RequestId },

    /// One departure of a search result.
    Departure {
        index: u8,
        record: DepartureRecord,
        request_id: RequestId,
    },

    /// Number of legs that follow for one departure.
    DetailCount {
        departure_index: u8,
        leg_count: u8,
        request_id: RequestId,
    },

    /// One leg of a departure's journey.
    DetailLeg {
        leg_index: u8,
        leg: LegRecord,
        request_id: RequestId,
    },

    /// Number of favorite stations that follow.
    StationCount { count: u8 },

    /// One favorite station.
    Station {
        index: u8,
        name: Bounded<63>,
        id: Bounded<31>,
    },

    /// Preselect a route by favorite indices.
    SetActiveRoute { from_index: u8, to_index: u8 },
}

impl OutboundMessage {
    /// The wire kind of this message.
    pub fn message_type(&self) -> MessageType {
        match self {
            OutboundMessage::RequestAck { .. } => MessageType::RequestAck,
            OutboundMessage::Count { .. } => MessageType::SendCount,
            OutboundMessage::Departure { .. } => MessageType::SendDeparture,
            OutboundMessage::DetailCount { .. } | OutboundMessage::DetailLeg { .. } => {
                MessageType::SendDetail
            }
            OutboundMessage::StationCount { .. } => MessageType::SendStationCount,
            OutboundMessage::Station { .. } => MessageType::SendStation,
            OutboundMessage::SetActiveRoute { .. } => MessageType::SetActiveRoute,
        }
    }

    /// The correlation id, for the kinds that carry one.
    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            OutboundMessage::RequestAck { request_id }
            | OutboundMessage::Count { request_id, .. }
            | OutboundMessage::Departure { request_id, .. }
            | OutboundMessage::DetailCount { request_id, .. }
            | OutboundMessage::DetailLeg { request_id, .. } => Some(*request_id),
            OutboundMessage::StationCount { .. }
            | OutboundMessage::Station { .. }
            | OutboundMessage::SetActiveRoute { .. } => None,
        }
    }
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

impl Serialize for OutboundMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("MESSAGE_TYPE", &self.message_type().code())?;

        match self {
            OutboundMessage::RequestAck { request_id } => {
                map.serialize_entry("REQUEST_ID", request_id)?;
            }
            OutboundMessage::Count { count, request_id } => {
                map.serialize_entry("DATA_COUNT", count)?;
                map.serialize_entry("REQUEST_ID", request_id)?;
            }
            OutboundMessage::Departure {
                index,
                record,
                request_id,
            } => {
                map.serialize_entry("DEPARTURE_INDEX", index)?;
                map.serialize_entry("DESTINATION", &record.destination)?;
                map.serialize_entry("DEPART_TIME", &record.depart_time)?;
                map.serialize_entry("DEPART_TIMESTAMP", &record.depart_timestamp)?;
                map.serialize_entry("ARRIVE_TIME", &record.arrive_time)?;
                map.serialize_entry("PLATFORM", &record.platform)?;
                map.serialize_entry("TRAIN_TYPE", &record.train_type)?;
                map.serialize_entry("DURATION", &record.duration)?;
                map.serialize_entry("DEPART_DELAY", &record.depart_delay)?;
                map.serialize_entry("ARRIVE_DELAY", &record.arrive_delay)?;
                map.serialize_entry("IS_DIRECT", &flag(record.is_direct))?;
                map.serialize_entry("PLATFORM_CHANGED", &flag(record.platform_changed))?;
                map.serialize_entry("REQUEST_ID", request_id)?;
            }
            OutboundMessage::DetailCount {
                departure_index,
                leg_count,
                request_id,
            } => {
                map.serialize_entry("DEPARTURE_INDEX", departure_index)?;
                map.serialize_entry("LEG_COUNT", leg_count)?;
                map.serialize_entry("REQUEST_ID", request_id)?;
            }
            OutboundMessage::DetailLeg {
                leg_index,
                leg,
                request_id,
            } => {
                map.serialize_entry("LEG_INDEX", leg_index)?;
                map.serialize_entry("LEG_DEPART_STATION", &leg.depart_station)?;
                map.serialize_entry("LEG_ARRIVE_STATION", &leg.arrive_station)?;
                map.serialize_entry("LEG_DEPART_TIME", &leg.depart_time)?;
                map.serialize_entry("LEG_ARRIVE_TIME", &leg.arrive_time)?;
                map.serialize_entry("LEG_DEPART_PLATFORM", &leg.depart_platform)?;
                map.serialize_entry("LEG_ARRIVE_PLATFORM", &leg.arrive_platform)?;
                map.serialize_entry("LEG_DEPART_DELAY", &leg.depart_delay)?;
                map.serialize_entry("LEG_ARRIVE_DELAY", &leg.arrive_delay)?;
                map.serialize_entry("LEG_VEHICLE", &leg.vehicle)?;
                map.serialize_entry("LEG_DIRECTION", &leg.direction)?;
                map.serialize_entry("LEG_STOP_COUNT", &leg.stop_count)?;
                map.serialize_entry(
                    "LEG_DEPART_PLATFORM_CHANGED",
                    &flag(leg.depart_platform_changed),
                )?;
                map.serialize_entry(
                    "LEG_ARRIVE_PLATFORM_CHANGED",
                    &flag(leg.arrive_platform_changed),
                )?;
                map.serialize_entry("REQUEST_ID", request_id)?;
            }
            OutboundMessage::StationCount { count } => {
                map.serialize_entry("CONFIG_STATION_COUNT", count)?;
            }
            OutboundMessage::Station { index, name, id } => {
                map.serialize_entry("CONFIG_STATION_INDEX", index)?;
                map.serialize_entry("CONFIG_STATION_NAME", name)?;
                map.serialize_entry("CONFIG_STATION_IRAIL_ID", id)?;
            }
            OutboundMessage::SetActiveRoute {
                from_index,
                to_index,
            } => {
                map.serialize_entry("CONFIG_FROM_INDEX", from_index)?;
                map.serialize_entry("CONFIG_TO_INDEX", to_index)?;
            }
        }

        map.end()
    }
}

/// Error returned when an inbound dictionary is not a valid request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InboundError {
    #[error("unknown message type {0}")]
    UnknownType(u8),

    #[error("message type {0:?} is not a device request")]
    NotARequest(MessageType),

    #[error("missing field {0}")]
    MissingField(&'static str),
}

/// Station selection in a search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationSelection {
    /// iRail station ids.
    Ids { from: String, to: String },

    /// Display names from older firmware, resolved through a fixed table.
    LegacyNames { from: String, to: String },
}

/// A request from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// List departures between two stations.
    RequestData {
        /// Device-issued id; `None` when the device sent none.
        request_id: Option<RequestId>,
        stations: StationSelection,
    },

    /// Break down one departure of the last search into legs.
    RequestDetails {
        request_id: Option<RequestId>,
        departure_index: u8,
    },
}

/// The inbound dictionary as the transport delivers it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct RawInbound {
    message_type: u8,
    request_id: Option<u32>,
    from_station_id: Option<String>,
    to_station_id: Option<String>,
    from_station: Option<String>,
    to_station: Option<String>,
    departure_index: Option<u8>,
}

impl TryFrom<RawInbound> for InboundMessage {
    type Error = InboundError;

    fn try_from(raw: RawInbound) -> Result<Self, Self::Error> {
        let kind =
            MessageType::from_code(raw.message_type).ok_or(InboundError::UnknownType(raw.message_type))?;
        // A zero id means "none" on the device side.
        let request_id = raw.request_id.filter(|&id| id != 0).map(RequestId);

        match kind {
            MessageType::RequestData => {
                let stations = match (raw.from_station_id, raw.to_station_id) {
                    (Some(from), Some(to)) if !from.is_empty() && !to.is_empty() => {
                        StationSelection::Ids { from, to }
                    }
                    _ => StationSelection::LegacyNames {
                        from: raw.from_station.unwrap_or_default(),
                        to: raw.to_station.unwrap_or_default(),
                    },
                };
                Ok(InboundMessage::RequestData {
                    request_id,
                    stations,
                })
            }
            MessageType::RequestDetails => Ok(InboundMessage::RequestDetails {
                request_id,
                departure_index: raw
                    .departure_index
                    .ok_or(InboundError::MissingField("DEPARTURE_INDEX"))?,
            }),
            other => Err(InboundError::NotARequest(other)),
        }
    }
}

impl InboundMessage {
    /// Parse an inbound dictionary.
    pub fn from_value(value: serde_json::Value) -> Result<Self, InboundParseError> {
        let raw: RawInbound = serde_json::from_value(value)?;
        Ok(raw.try_into()?)
    }
}

/// Error returned by [`InboundMessage::from_value`].
#[derive(Debug, thiserror::Error)]
pub enum InboundParseError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] InboundError),
}
