//! Recording transport for testing delivery without a device.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::message::OutboundMessage;
use super::transport::{Transport, TransportError};

/// Decides whether the n-th send (0-based, across all jobs) fails.
type FailurePolicy = Box<dyn Fn(usize, &OutboundMessage) -> bool + Send + Sync>;

/// Transport that records every message it is asked to send.
///
/// Delivery can be made to fail selectively. It also tracks how many sends
/// are in progress at once, so tests can check the single-outstanding rule.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutboundMessage>>,
    attempts: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    fail_when: Option<FailurePolicy>,
}

impl RecordingTransport {
    /// A transport that acknowledges everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that rejects sends for which `policy(attempt, message)`
    /// returns true. Rejected messages are not recorded as sent.
    pub fn failing_when(
        policy: impl Fn(usize, &OutboundMessage) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            fail_when: Some(Box::new(policy)),
            ..Self::default()
        }
    }

    fn sent_guard(&self) -> MutexGuard<'_, Vec<OutboundMessage>> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Messages acknowledged so far, in order.
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent_guard().clone()
    }

    /// Number of send attempts, acknowledged or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Highest number of sends that were in progress at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Transport for RecordingTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        // Give other tasks a chance to interleave, like a real link would.
        tokio::task::yield_now().await;

        let rejected = self
            .fail_when
            .as_ref()
            .is_some_and(|policy| policy(attempt, message));
        if !rejected {
            self.sent_guard().push(message.clone());
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if rejected {
            Err(TransportError::Rejected(format!("attempt {attempt}")))
        } else {
            Ok(())
        }
    }
}
