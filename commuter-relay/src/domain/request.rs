//! Request correlation types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Correlation token carried by every outgoing message of a request kind.
///
/// The device discards any message whose id is not the one it most
/// recently issued for that kind.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u32);

impl RequestId {
    /// The id following this one.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestId({})", self.0)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The independently cancellable request kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Departure list between two stations.
    Search,
    /// Leg breakdown of one departure.
    Detail,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Search => f.write_str("search"),
            RequestKind::Detail => f.write_str("detail"),
        }
    }
}

/// A from/to station pair, by iRail id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Route {
    pub from_station_id: String,
    pub to_station_id: String,
}

impl Route {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from_station_id: from.into(),
            to_station_id: to.into(),
        }
    }
}

/// The active request of one kind: its id and the route it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub route: Route,
}

/// Re-identifies one departure of a search result for a later detail request.
///
/// iRail has no stable connection id, so the pair of vehicle reference and
/// scheduled departure time is used instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionIdentifier {
    /// iRail vehicle reference, e.g. "BE.NMBS.IC1832".
    #[serde(rename = "vehicle")]
    pub vehicle_ref: String,

    /// Scheduled departure, Unix seconds.
    #[serde(rename = "departTime")]
    pub departure_epoch_secs: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_uses_persisted_field_names() {
        let id = ConnectionIdentifier {
            vehicle_ref: "BE.NMBS.IC1832".into(),
            departure_epoch_secs: 1_710_493_200,
        };
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#"{"vehicle":"BE.NMBS.IC1832","departTime":1710493200}"#);
        let back: ConnectionIdentifier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn request_id_next_wraps() {
        assert_eq!(RequestId(7).next(), RequestId(8));
        assert_eq!(RequestId(u32::MAX).next(), RequestId(0));
    }
}
