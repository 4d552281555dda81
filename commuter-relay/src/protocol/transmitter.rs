//! Sequential delivery of count-prefixed message sequences.
//!
//! A [`Job`] is a count message followed by that many record messages. The
//! transmitter sends the count first, then each record in index order,
//! awaiting each delivery outcome before the next send. A failed count
//! aborts the job; a failed record is logged and skipped.

use tracing::{debug, warn};

use crate::domain::{Bounded, DepartureRecord, LegRecord, RequestId};

use super::message::OutboundMessage;
use super::transport::{Transport, TransportError};

/// Largest record count a count message can announce.
const MAX_RECORDS: usize = u8::MAX as usize;

/// What a job delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Departures,
    Legs,
    Stations,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            JobKind::Departures => "departures",
            JobKind::Legs => "legs",
            JobKind::Stations => "stations",
        })
    }
}

/// A count message plus the records it announces.
///
/// Constructors apply the per-kind limit before building the count, so the
/// announced count always equals the number of record messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    kind: JobKind,
    count: OutboundMessage,
    records: Vec<OutboundMessage>,
}

fn index(i: usize) -> u8 {
    u8::try_from(i).unwrap_or(u8::MAX)
}

impl Job {
    /// Departures of a search, keeping at most `limit`.
    pub fn departures(request_id: RequestId, mut records: Vec<DepartureRecord>, limit: usize) -> Self {
        records.truncate(limit.min(MAX_RECORDS));
        let count = OutboundMessage::Count {
            count: index(records.len()),
            request_id,
        };
        let records = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| OutboundMessage::Departure {
                index: index(i),
                record,
                request_id,
            })
            .collect();

        Self {
            kind: JobKind::Departures,
            count,
            records,
        }
    }

    /// Legs of one departure.
    pub fn legs(request_id: RequestId, departure_index: u8, mut legs: Vec<LegRecord>) -> Self {
        legs.truncate(MAX_RECORDS);
        let count = OutboundMessage::DetailCount {
            departure_index,
            leg_count: index(legs.len()),
            request_id,
        };
        let records = legs
            .into_iter()
            .enumerate()
            .map(|(i, leg)| OutboundMessage::DetailLeg {
                leg_index: index(i),
                leg,
                request_id,
            })
            .collect();

        Self {
            kind: JobKind::Legs,
            count,
            records,
        }
    }

    /// Favorite stations as (display name, id) pairs, keeping at most `limit`.
    pub fn stations(mut stations: Vec<(String, String)>, limit: usize) -> Self {
        stations.truncate(limit.min(MAX_RECORDS));
        let count = OutboundMessage::StationCount {
            count: index(stations.len()),
        };
        let records = stations
            .into_iter()
            .enumerate()
            .map(|(i, (name, id))| OutboundMessage::Station {
                index: index(i),
                name: Bounded::from(name),
                id: Bounded::from(id),
            })
            .collect();

        Self {
            kind: JobKind::Stations,
            count,
            records,
        }
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    /// Number of record messages, which is also the announced count.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The count message followed by the records, in send order.
    pub fn messages(&self) -> impl Iterator<Item = &OutboundMessage> {
        std::iter::once(&self.count).chain(self.records.iter())
    }
}

/// Outcome of a completed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub kind: JobKind,
    /// Records acknowledged by the transport.
    pub delivered: usize,
    /// Indices of records the transport rejected.
    pub failed: Vec<usize>,
}

/// A job could not start.
#[derive(Debug, thiserror::Error)]
pub enum TransmitError {
    #[error("count message for {kind} job was not delivered: {source}")]
    CountFailed {
        kind: JobKind,
        #[source]
        source: TransportError,
    },
}

/// Runs jobs one message at a time over a transport.
pub struct SequentialTransmitter<T> {
    transport: T,
}

impl<T: Transport> SequentialTransmitter<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a single standalone message.
    pub async fn send_one(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        self.transport.send(message).await
    }

    /// Deliver a job: the count, then every record in order.
    pub async fn run(&self, job: Job) -> Result<JobReport, TransmitError> {
        let Job {
            kind,
            count,
            records,
        } = job;

        if let Err(source) = self.transport.send(&count).await {
            warn!(%kind, error = %source, "count message failed, abandoning job");
            return Err(TransmitError::CountFailed { kind, source });
        }
        debug!(%kind, count = records.len(), "count delivered");

        let mut report = JobReport {
            kind,
            delivered: 0,
            failed: Vec::new(),
        };

        for (i, message) in records.iter().enumerate() {
            match self.transport.send(message).await {
                Ok(()) => report.delivered += 1,
                Err(error) => {
                    warn!(%kind, index = i, %error, "record not delivered, skipping");
                    report.failed.push(i);
                }
            }
        }

        debug!(
            %kind,
            delivered = report.delivered,
            failed = report.failed.len(),
            "job complete"
        );
        Ok(report)
    }
}
