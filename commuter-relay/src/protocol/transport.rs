//! Transport abstraction: the single-outstanding-message device channel.
//!
//! A send resolves once the transport has reported the outcome for that
//! message: `Ok` for an acknowledged delivery, `Err` for a rejected one.
//! Callers await each send before issuing the next, which is what keeps at
//! most one message of a job in flight.

use std::future::Future;
use std::sync::Arc;

use super::message::OutboundMessage;

/// A single outgoing message was not acknowledged.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The channel to the device is gone.
    #[error("transport closed")]
    Closed,

    /// The device (or its link) rejected the message.
    #[error("message rejected: {0}")]
    Rejected(String),

    /// Writing the message failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Message-oriented channel to the device.
pub trait Transport: Send + Sync {
    /// Send one message and wait for its delivery outcome.
    fn send(
        &self,
        message: &OutboundMessage,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn send(
        &self,
        message: &OutboundMessage,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        self.as_ref().send(message)
    }
}
