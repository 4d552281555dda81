//! Request correlation.
//!
//! Tracks the active request per kind and the identifiers of the most
//! recently delivered departures, so a later detail request can name a
//! departure by its display index.

use tracing::debug;

use crate::domain::{ConnectionIdentifier, RequestContext, RequestId, RequestKind, Route};

/// No identifier is recorded at the requested index.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no departure recorded at index {index}")]
pub struct NotFound {
    pub index: usize,
}

/// Active request ids and departure identifiers.
///
/// Search and detail ids are tracked independently: starting a detail does
/// not invalidate the search it refers to.
#[derive(Debug, Clone, Default)]
pub struct CorrelationStore {
    search: RequestContext,
    detail: RequestContext,
    identifiers: Vec<Option<ConnectionIdentifier>>,
}

impl CorrelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with identifiers persisted by an earlier session.
    pub fn with_identifiers(identifiers: Vec<Option<ConnectionIdentifier>>) -> Self {
        Self {
            identifiers,
            ..Self::default()
        }
    }

    fn slot(&mut self, kind: RequestKind) -> &mut RequestContext {
        match kind {
            RequestKind::Search => &mut self.search,
            RequestKind::Detail => &mut self.detail,
        }
    }

    /// Start a request of `kind`, issuing a fresh id one past the last.
    ///
    /// Every message produced for an earlier request of the same kind is
    /// stale from here on.
    pub fn begin_request(&mut self, kind: RequestKind, route: Route) -> RequestId {
        let slot = self.slot(kind);
        let request_id = slot.request_id.next();
        *slot = RequestContext { request_id, route };
        debug!(%kind, %request_id, "request started");
        request_id
    }

    /// Start a request of `kind` under an id chosen by the device.
    pub fn adopt_request(&mut self, kind: RequestKind, request_id: RequestId, route: Route) {
        *self.slot(kind) = RequestContext { request_id, route };
        debug!(%kind, %request_id, "request adopted");
    }

    /// The active request of `kind`.
    pub fn active(&self, kind: RequestKind) -> &RequestContext {
        match kind {
            RequestKind::Search => &self.search,
            RequestKind::Detail => &self.detail,
        }
    }

    /// True when `request_id` is the active id for `kind`.
    pub fn is_active(&self, kind: RequestKind, request_id: RequestId) -> bool {
        self.active(kind).request_id == request_id
    }

    /// Replace all identifiers with those of a new search result.
    pub fn replace_identifiers(&mut self, identifiers: Vec<ConnectionIdentifier>) {
        self.identifiers = identifiers.into_iter().map(Some).collect();
    }

    /// Record the identifier of the departure shown at `index`.
    pub fn record_identifier(&mut self, index: usize, identifier: ConnectionIdentifier) {
        if index >= self.identifiers.len() {
            self.identifiers.resize(index + 1, None);
        }
        self.identifiers[index] = Some(identifier);
    }

    /// The identifier of the departure shown at `index`.
    pub fn get_identifier(&self, index: usize) -> Result<&ConnectionIdentifier, NotFound> {
        self.identifiers
            .get(index)
            .and_then(Option::as_ref)
            .ok_or(NotFound { index })
    }

    /// All identifiers, for persistence.
    pub fn identifiers(&self) -> &[Option<ConnectionIdentifier>] {
        &self.identifiers
    }
}
