//! Device protocol: message model, transport seam, and sequential delivery.

mod message;
#[cfg(test)]
mod recording;
mod stdio;
mod transmitter;
mod transport;

pub use message::{
    InboundError, InboundMessage, InboundParseError, MessageType, OutboundMessage,
    StationSelection,
};
#[cfg(test)]
pub use recording::RecordingTransport;
pub use stdio::LineTransport;
pub use transmitter::{Job, JobKind, JobReport, SequentialTransmitter, TransmitError};
pub use transport::{Transport, TransportError};
