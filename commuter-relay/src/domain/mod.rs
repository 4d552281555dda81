//! Domain types for the commuter relay.
//!
//! This module contains the validated value types shared by the formatter,
//! the correlation store and the message protocol. Types enforce their
//! invariants at construction time (truncated text, in-range clock times).

mod bounded;
mod records;
mod request;
mod time;

pub use bounded::Bounded;
pub use records::{DepartureRecord, LegRecord};
pub use request::{ConnectionIdentifier, RequestContext, RequestId, RequestKind, Route};
pub use time::{ClockTime, InvalidClockTime, epoch_to_local, format_epoch_hhmm};
