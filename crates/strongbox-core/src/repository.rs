//! Event repository abstraction.
//!
//! Persistence is an external collaborator. The core converts envelopes to
//! payload-level [`StoredEnvelope`]s, hands them over with the expected
//! sequence, and decodes stored history back into envelopes for replay.

use serde::{Deserialize, Serialize};

use crate::aggregate::AggregateRoot;
use crate::envelope::EventEnvelope;
use crate::error::DomainError;
use crate::event::{DomainEvent, EventMetaData};
use crate::file::{FileLocation, FileReference};
use crate::identity::{StreamId, StreamSequence, StreamType};
use crate::payload::EventPayload;
use crate::stream::EventStream;

/// Stored representation of an event envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEnvelope {
    /// Stream type of the owning aggregate.
    pub stream_type: StreamType,
    /// Stream (aggregate instance) this event belongs to.
    pub stream_id: StreamId,
    /// Sequence within the stream.
    pub stream_sequence: StreamSequence,
    /// Declared event type name, used to route `from_payload`.
    pub event_type: String,
    /// Exported event fields.
    pub payload: EventPayload,
    /// Location of the attached file, if any.
    pub file_location: Option<FileLocation>,
}

impl StoredEnvelope {
    /// Exports an envelope for persistence.
    #[must_use]
    pub fn from_envelope<E: DomainEvent>(envelope: &EventEnvelope<E>) -> Self {
        let meta = envelope.metadata();
        Self {
            stream_type: meta.stream_type().clone(),
            stream_id: meta.stream_id().clone(),
            stream_sequence: meta.stream_sequence(),
            event_type: envelope.event().type_name().to_owned(),
            payload: envelope.event().to_payload(),
            file_location: envelope.file().location().cloned(),
        }
    }

    /// Rebuilds the metadata triple.
    #[must_use]
    pub fn metadata(&self) -> EventMetaData {
        EventMetaData::new(
            self.stream_type.clone(),
            self.stream_id.clone(),
            self.stream_sequence,
        )
    }

    /// Decodes the stored payload back into a typed envelope.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPayload` if the event type is unknown to
    /// `E` or the payload is missing or mistyping a field.
    pub fn decode<E: DomainEvent>(&self) -> Result<EventEnvelope<E>, DomainError> {
        let event = E::from_payload(&self.event_type, &self.payload)?;
        Ok(EventEnvelope::new(
            self.metadata(),
            event,
            FileReference::from_location(self.file_location.clone()),
        ))
    }
}

/// Decodes a stored history into an ordered stream.
///
/// # Errors
///
/// Returns the first decoding error; nothing is skipped.
pub fn decode_history<E: DomainEvent>(
    stored: &[StoredEnvelope],
) -> Result<EventStream<E>, DomainError> {
    stored.iter().map(StoredEnvelope::decode::<E>).collect()
}

/// Repository trait for loading and appending event streams.
pub trait EventRepository: Send + Sync {
    /// Load all envelopes of a stream, ordered by sequence.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` on storage failure.
    fn load_history(
        &self,
        stream_type: &StreamType,
        stream_id: &StreamId,
    ) -> Result<Vec<StoredEnvelope>, DomainError>;

    /// Append envelopes to a stream with optimistic concurrency.
    /// `expected` is the sequence the writer loaded the stream at; the write
    /// must be rejected if the stored stream has advanced past it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` on a stale `expected`, or
    /// `DomainError::Infrastructure` on storage failure.
    fn append(
        &self,
        stream_type: &StreamType,
        stream_id: &StreamId,
        expected: StreamSequence,
        envelopes: &[StoredEnvelope],
    ) -> Result<(), DomainError>;
}

/// Persists an aggregate's uncommitted changes and clears them on success.
///
/// Returns the envelopes that were handed to the repository. On error the
/// changes stay buffered.
///
/// # Errors
///
/// Returns whatever the repository's `append` returns.
pub fn save_aggregate<A: AggregateRoot>(
    repo: &dyn EventRepository,
    aggregate: &mut A,
) -> Result<Vec<StoredEnvelope>, DomainError> {
    let Some(first) = aggregate.changes().iter().next() else {
        return Ok(Vec::new());
    };
    let stream_id = first.metadata().stream_id().clone();
    let stored: Vec<StoredEnvelope> = aggregate
        .changes()
        .iter()
        .map(StoredEnvelope::from_envelope)
        .collect();

    repo.append(
        &A::stream_type(),
        &stream_id,
        aggregate.expected_sequence(),
        &stored,
    )?;
    aggregate.clear_changes();

    tracing::debug!(
        stream_type = A::STREAM_TYPE,
        stream_id = %stream_id,
        sequence = %aggregate.sequence(),
        count = stored.len(),
        "changes persisted"
    );
    Ok(stored)
}

/// Loads and reconstitutes an aggregate from its stored history.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the stream is empty, decoding
/// errors from [`StoredEnvelope::decode`], or replay errors from
/// [`AggregateRoot::reconstitute_from_history`].
pub fn load_aggregate<A: AggregateRoot>(
    repo: &dyn EventRepository,
    stream_id: &StreamId,
) -> Result<A, DomainError> {
    let stored = repo.load_history(&A::stream_type(), stream_id)?;
    if stored.is_empty() {
        return Err(DomainError::AggregateNotFound(stream_id.clone()));
    }
    let history = decode_history::<A::Event>(&stored)?;
    A::reconstitute_from_history(&history)
}
