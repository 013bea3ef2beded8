//! Domain error types.

use thiserror::Error;

use crate::identity::{StreamId, StreamSequence};

/// Top-level domain error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// No handler is registered for an event variant.
    #[error("no handler registered on stream type {stream_type} for event {variant}")]
    MissingHandler {
        /// The aggregate's stream type.
        stream_type: String,
        /// The variant tag that could not be dispatched.
        variant: String,
    },

    /// An event payload was missing or mistyping a required field.
    #[error("invalid payload for event {event_type}: {reason}")]
    InvalidPayload {
        /// The event type the payload was decoded as.
        event_type: String,
        /// What was wrong with the payload.
        reason: String,
    },

    /// An attached file could not be opened.
    #[error("file unavailable at {location}: {reason}")]
    FileUnavailable {
        /// The location that was requested, or `<absent>`.
        location: String,
        /// Why the file could not be opened.
        reason: String,
    },

    /// Optimistic concurrency conflict.
    #[error("concurrency conflict on stream {stream_id}: expected sequence {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The stream that had the conflict.
        stream_id: StreamId,
        /// The sequence the writer was loaded at.
        expected: StreamSequence,
        /// The latest sequence found in the store.
        actual: StreamSequence,
    },

    /// An event or envelope belongs to a different stream.
    #[error("stream mismatch: expected {expected}, found {found}")]
    StreamMismatch {
        /// The stream the aggregate belongs to.
        expected: String,
        /// The stream the event or envelope names.
        found: String,
    },

    /// An envelope was applied out of order.
    #[error("out of sequence: expected {expected}, found {found}")]
    OutOfSequence {
        /// The sequence the aggregate expected next.
        expected: StreamSequence,
        /// The sequence carried by the envelope.
        found: StreamSequence,
    },

    /// An aggregate was not found.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(StreamId),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Builds an `InvalidPayload` error.
    pub fn invalid_payload(event_type: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            event_type: event_type.into(),
            reason: reason.into(),
        }
    }

    /// Builds a `FileUnavailable` error.
    pub fn file_unavailable(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FileUnavailable {
            location: location.into(),
            reason: reason.into(),
        }
    }
}
