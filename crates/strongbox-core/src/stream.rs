//! Ordered, append-only log of event envelopes.

use std::slice;

use crate::envelope::EventEnvelope;

/// Append-only sequence of envelopes in insertion order.
///
/// Iteration borrows the stream, so every reader gets its own cursor and
/// restarting is just calling [`EventStream::iter`] again.
#[derive(Debug, Clone, PartialEq)]
pub struct EventStream<E> {
    envelopes: Vec<EventEnvelope<E>>,
}

impl<E> EventStream<E> {
    /// Creates an empty stream.
    #[must_use]
    pub fn new() -> Self {
        Self {
            envelopes: Vec::new(),
        }
    }

    /// Adds an envelope at the end.
    pub fn append(&mut self, envelope: EventEnvelope<E>) {
        self.envelopes.push(envelope);
    }

    /// Replaces the contents with an empty stream.
    pub fn clear(&mut self) {
        self.envelopes = Vec::new();
    }

    /// Forward iterator from the first envelope.
    pub fn iter(&self) -> slice::Iter<'_, EventEnvelope<E>> {
        self.envelopes.iter()
    }

    /// Number of envelopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.envelopes.len()
    }

    /// Whether the stream holds no envelopes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty()
    }

    /// The most recently appended envelope.
    #[must_use]
    pub fn last(&self) -> Option<&EventEnvelope<E>> {
        self.envelopes.last()
    }

    /// Read-only view of the envelopes.
    #[must_use]
    pub fn as_slice(&self) -> &[EventEnvelope<E>] {
        &self.envelopes
    }
}

impl<E> Default for EventStream<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, E> IntoIterator for &'a EventStream<E> {
    type Item = &'a EventEnvelope<E>;
    type IntoIter = slice::Iter<'a, EventEnvelope<E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<E> IntoIterator for EventStream<E> {
    type Item = EventEnvelope<E>;
    type IntoIter = std::vec::IntoIter<EventEnvelope<E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.envelopes.into_iter()
    }
}

impl<E> FromIterator<EventEnvelope<E>> for EventStream<E> {
    fn from_iter<I: IntoIterator<Item = EventEnvelope<E>>>(iter: I) -> Self {
        Self {
            envelopes: iter.into_iter().collect(),
        }
    }
}

impl<E> From<Vec<EventEnvelope<E>>> for EventStream<E> {
    fn from(envelopes: Vec<EventEnvelope<E>>) -> Self {
        Self { envelopes }
    }
}
