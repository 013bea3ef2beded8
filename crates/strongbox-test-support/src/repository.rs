//! Test repositories: `EventRepository` implementations for tests.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use strongbox_core::error::DomainError;
use strongbox_core::identity::{StreamId, StreamSequence, StreamType};
use strongbox_core::repository::{EventRepository, StoredEnvelope};

/// One recorded `append` call: stream id, expected sequence, envelopes.
pub type AppendCall = (StreamId, StreamSequence, Vec<StoredEnvelope>);

/// An in-memory event store that enforces optimistic concurrency the way a
/// real store must: an append is rejected unless `expected` equals the
/// stream's latest stored sequence, and appended envelopes must continue the
/// stream without gaps.
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    streams: RwLock<HashMap<(StreamType, StreamId), Vec<StoredEnvelope>>>,
}

impl InMemoryEventRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-loaded with `history` for one stream.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_history(history: Vec<StoredEnvelope>) -> Self {
        let repo = Self::new();
        if let Some(first) = history.first() {
            let key = (first.stream_type.clone(), first.stream_id.clone());
            repo.streams.write().unwrap().insert(key, history);
        }
        repo
    }

    /// Latest stored sequence of a stream, `0` if the stream is empty.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn latest_sequence(&self, stream_type: &StreamType, stream_id: &StreamId) -> StreamSequence {
        self.streams
            .read()
            .unwrap()
            .get(&(stream_type.clone(), stream_id.clone()))
            .and_then(|stream| stream.last())
            .map_or(StreamSequence::INITIAL, |e| e.stream_sequence)
    }
}

impl EventRepository for InMemoryEventRepository {
    fn load_history(
        &self,
        stream_type: &StreamType,
        stream_id: &StreamId,
    ) -> Result<Vec<StoredEnvelope>, DomainError> {
        let streams = self
            .streams
            .read()
            .map_err(|_| DomainError::Infrastructure("lock poisoned".to_owned()))?;
        Ok(streams
            .get(&(stream_type.clone(), stream_id.clone()))
            .cloned()
            .unwrap_or_default())
    }

    fn append(
        &self,
        stream_type: &StreamType,
        stream_id: &StreamId,
        expected: StreamSequence,
        envelopes: &[StoredEnvelope],
    ) -> Result<(), DomainError> {
        let mut streams = self
            .streams
            .write()
            .map_err(|_| DomainError::Infrastructure("lock poisoned".to_owned()))?;
        let key = (stream_type.clone(), stream_id.clone());

        let actual = streams
            .get(&key)
            .and_then(|stream| stream.last())
            .map_or(StreamSequence::INITIAL, |e| e.stream_sequence);
        if actual != expected {
            tracing::warn!(stream_id = %stream_id, %expected, %actual, "append rejected");
            return Err(DomainError::ConcurrencyConflict {
                stream_id: stream_id.clone(),
                expected,
                actual,
            });
        }

        let mut next = actual.increment();
        for envelope in envelopes {
            if envelope.stream_id != *stream_id || envelope.stream_type != *stream_type {
                return Err(DomainError::Infrastructure(format!(
                    "envelope for {}/{} appended to {stream_type}/{stream_id}",
                    envelope.stream_type, envelope.stream_id
                )));
            }
            if envelope.stream_sequence != next {
                return Err(DomainError::Infrastructure(format!(
                    "non-contiguous append on {stream_id}: expected sequence {next}, got {}",
                    envelope.stream_sequence
                )));
            }
            next = next.increment();
        }

        streams.entry(key).or_default().extend_from_slice(envelopes);
        Ok(())
    }
}

/// An event repository that records all `append` calls. Returns the
/// configured history from every `load_history` call and always succeeds on
/// `append`.
#[derive(Debug)]
pub struct RecordingEventRepository {
    load_result: Mutex<Vec<StoredEnvelope>>,
    appended: Mutex<Vec<AppendCall>>,
}

impl RecordingEventRepository {
    /// Create a new recording repository that will return `load_result` from
    /// every `load_history` call.
    #[must_use]
    pub fn new(load_result: Vec<StoredEnvelope>) -> Self {
        Self {
            load_result: Mutex::new(load_result),
            appended: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of all `append` calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn appended_events(&self) -> Vec<AppendCall> {
        self.appended.lock().unwrap().clone()
    }
}

impl EventRepository for RecordingEventRepository {
    fn load_history(
        &self,
        _stream_type: &StreamType,
        _stream_id: &StreamId,
    ) -> Result<Vec<StoredEnvelope>, DomainError> {
        Ok(self.load_result.lock().unwrap().clone())
    }

    fn append(
        &self,
        _stream_type: &StreamType,
        stream_id: &StreamId,
        expected: StreamSequence,
        envelopes: &[StoredEnvelope],
    ) -> Result<(), DomainError> {
        self.appended
            .lock()
            .unwrap()
            .push((stream_id.clone(), expected, envelopes.to_vec()));
        Ok(())
    }
}

/// An event repository that always returns an empty history and silently
/// accepts appends. Useful for "aggregate not found" scenarios and creation
/// commands.
#[derive(Debug)]
pub struct EmptyEventRepository;

impl EventRepository for EmptyEventRepository {
    fn load_history(
        &self,
        _stream_type: &StreamType,
        _stream_id: &StreamId,
    ) -> Result<Vec<StoredEnvelope>, DomainError> {
        Ok(vec![])
    }

    fn append(
        &self,
        _stream_type: &StreamType,
        _stream_id: &StreamId,
        _expected: StreamSequence,
        _envelopes: &[StoredEnvelope],
    ) -> Result<(), DomainError> {
        Ok(())
    }
}

/// An event repository that always returns an infrastructure error. Useful
/// for testing error-handling paths.
#[derive(Debug)]
pub struct FailingEventRepository;

impl EventRepository for FailingEventRepository {
    fn load_history(
        &self,
        _stream_type: &StreamType,
        _stream_id: &StreamId,
    ) -> Result<Vec<StoredEnvelope>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    fn append(
        &self,
        _stream_type: &StreamType,
        _stream_id: &StreamId,
        _expected: StreamSequence,
        _envelopes: &[StoredEnvelope],
    ) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
