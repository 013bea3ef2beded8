//! Aggregate root abstraction.
//!
//! An aggregate records its own changes as envelopes and mutates state only
//! through [`AggregateRoot::apply`]. The same step serves live recording and
//! replay, so a reconstituted aggregate is indistinguishable from one that
//! recorded the same events itself.

use std::collections::HashMap;
use std::fmt;

use crate::envelope::EventEnvelope;
use crate::error::DomainError;
use crate::event::{DomainEvent, EventMetaData};
use crate::file::{FileLocation, FileReference};
use crate::identity::{StreamId, StreamSequence, StreamType};
use crate::stream::EventStream;

/// State transition for one event variant.
///
/// Handlers must validate before they mutate: an `Err` must leave the
/// aggregate untouched.
pub type EventHandler<A> = fn(&mut A, &<A as AggregateRoot>::Event) -> Result<(), DomainError>;

/// Explicit table of variant tag to handler, built once per aggregate type.
pub struct EventHandlers<A: AggregateRoot> {
    handlers: HashMap<&'static str, EventHandler<A>>,
}

impl<A: AggregateRoot> EventHandlers<A> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers `handler` for the variant tag `variant`, replacing any
    /// earlier registration.
    #[must_use]
    pub fn on(mut self, variant: &'static str, handler: EventHandler<A>) -> Self {
        self.handlers.insert(variant, handler);
        self
    }

    /// Looks up the handler for a variant tag.
    #[must_use]
    pub fn get(&self, variant: &str) -> Option<EventHandler<A>> {
        self.handlers.get(variant).copied()
    }

    /// Whether a handler is registered for `variant`.
    #[must_use]
    pub fn contains(&self, variant: &str) -> bool {
        self.handlers.contains_key(variant)
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<A: AggregateRoot> Default for EventHandlers<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: AggregateRoot> fmt::Debug for EventHandlers<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut variants: Vec<&str> = self.handlers.keys().copied().collect();
        variants.sort_unstable();
        f.debug_struct("EventHandlers")
            .field("variants", &variants)
            .finish()
    }
}

/// Bookkeeping every aggregate embeds: current sequence and the
/// uncommitted-changes buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecorder<E> {
    sequence: StreamSequence,
    changes: EventStream<E>,
}

impl<E> ChangeRecorder<E> {
    /// Sequence of the last applied event.
    #[must_use]
    pub fn sequence(&self) -> StreamSequence {
        self.sequence
    }

    /// Envelopes recorded since creation or the last clear.
    #[must_use]
    pub fn changes(&self) -> &EventStream<E> {
        &self.changes
    }
}

impl<E> Default for ChangeRecorder<E> {
    fn default() -> Self {
        Self {
            sequence: StreamSequence::INITIAL,
            changes: EventStream::new(),
        }
    }
}

/// Trait for event-sourced aggregate roots.
///
/// `Default` yields the blank replay seed: no identity, sequence 0, no
/// changes. Valid instances come from named factories that record an initial
/// event, or from [`AggregateRoot::reconstitute_from_history`].
pub trait AggregateRoot: Default + Sized + 'static {
    /// The closed set of events this aggregate records and applies.
    type Event: DomainEvent;

    /// Stream type tag shared by every instance of this aggregate.
    const STREAM_TYPE: &'static str;

    /// Returns the aggregate identifier, once the first event has been applied.
    fn stream_id(&self) -> Option<&StreamId>;

    /// The handler table for this aggregate type.
    fn handlers() -> &'static EventHandlers<Self>;

    /// Read access to the embedded bookkeeping.
    fn recorder(&self) -> &ChangeRecorder<Self::Event>;

    /// Write access to the embedded bookkeeping.
    fn recorder_mut(&mut self) -> &mut ChangeRecorder<Self::Event>;

    /// Returns the stream type tag.
    #[must_use]
    fn stream_type() -> StreamType {
        StreamType::new(Self::STREAM_TYPE)
    }

    /// Returns the current sequence (number of events applied).
    fn sequence(&self) -> StreamSequence {
        self.recorder().sequence
    }

    /// Returns uncommitted envelopes since creation or the last clear.
    fn changes(&self) -> &EventStream<Self::Event> {
        &self.recorder().changes
    }

    /// Clears uncommitted envelopes after persistence.
    fn clear_changes(&mut self) {
        self.recorder_mut().changes.clear();
    }

    /// Moves the uncommitted envelopes out, leaving an empty buffer.
    fn take_changes(&mut self) -> EventStream<Self::Event> {
        std::mem::take(&mut self.recorder_mut().changes)
    }

    /// Sequence the aggregate was loaded at: the optimistic-concurrency
    /// token a store compares against its latest stored sequence.
    fn expected_sequence(&self) -> StreamSequence {
        let pending = u64::try_from(self.changes().len()).unwrap_or(u64::MAX);
        StreamSequence::new(self.sequence().value().saturating_sub(pending))
    }

    /// Records a new change: wraps `event` with the next sequence and an
    /// optional attachment, applies it, and buffers the envelope.
    ///
    /// Nothing is buffered if applying fails.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::StreamMismatch` if the event's subject differs
    /// from this aggregate's stream id, or any error from [`AggregateRoot::apply`].
    fn record(
        &mut self,
        event: Self::Event,
        file: Option<FileLocation>,
    ) -> Result<(), DomainError> {
        if let Some(id) = self.stream_id() {
            if id != event.subject_id() {
                return Err(DomainError::StreamMismatch {
                    expected: id.to_string(),
                    found: event.subject_id().to_string(),
                });
            }
        }

        let metadata = EventMetaData::new(
            Self::stream_type(),
            event.subject_id().clone(),
            self.sequence().increment(),
        );
        let envelope = EventEnvelope::new(metadata, event, FileReference::from_location(file));

        self.apply(&envelope)?;
        self.recorder_mut().changes.append(envelope);
        Ok(())
    }

    /// Applies one envelope: dispatches to the registered handler and moves
    /// the sequence to the envelope's sequence.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::StreamMismatch` if the envelope belongs to
    /// another stream, `DomainError::OutOfSequence` if it does not carry the
    /// next sequence, `DomainError::MissingHandler` if no handler is
    /// registered for its variant, or the handler's own error. State is
    /// unchanged on every error.
    fn apply(&mut self, envelope: &EventEnvelope<Self::Event>) -> Result<(), DomainError> {
        let meta = envelope.metadata();
        let stream_type = Self::stream_type();

        if *meta.stream_type() != stream_type {
            tracing::warn!(
                expected = %stream_type,
                found = %meta.stream_type(),
                "envelope rejected: foreign stream type"
            );
            return Err(DomainError::StreamMismatch {
                expected: stream_type.to_string(),
                found: meta.stream_type().to_string(),
            });
        }

        if let Some(id) = self.stream_id() {
            if id != meta.stream_id() {
                tracing::warn!(
                    expected = %id,
                    found = %meta.stream_id(),
                    "envelope rejected: foreign stream id"
                );
                return Err(DomainError::StreamMismatch {
                    expected: id.to_string(),
                    found: meta.stream_id().to_string(),
                });
            }
        }

        let expected = self.sequence().increment();
        if meta.stream_sequence() != expected {
            tracing::warn!(
                stream_id = %meta.stream_id(),
                expected = %expected,
                found = %meta.stream_sequence(),
                "envelope rejected: out of sequence"
            );
            return Err(DomainError::OutOfSequence {
                expected,
                found: meta.stream_sequence(),
            });
        }

        let event = envelope.event();
        let variant = event.variant_tag();
        let Some(handler) = Self::handlers().get(variant) else {
            tracing::warn!(stream_type = %stream_type, variant, "no handler registered");
            return Err(DomainError::MissingHandler {
                stream_type: stream_type.to_string(),
                variant: variant.to_owned(),
            });
        };

        handler(self, event)?;
        self.recorder_mut().sequence = meta.stream_sequence();

        tracing::debug!(
            stream_type = %stream_type,
            stream_id = %meta.stream_id(),
            sequence = %meta.stream_sequence(),
            event = %event.name(),
            "event applied"
        );
        Ok(())
    }

    /// Rebuilds an aggregate by applying `history` in order to a blank
    /// instance. The result has no uncommitted changes.
    ///
    /// Callers must supply envelopes in stream order.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`AggregateRoot::apply`].
    fn reconstitute_from_history<'a, I>(history: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = &'a EventEnvelope<Self::Event>>,
        Self::Event: 'a,
    {
        let mut aggregate = Self::default();
        for envelope in history {
            aggregate.apply(envelope)?;
        }
        Ok(aggregate)
    }
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use std::sync::LazyLock;

    use super::{AggregateRoot, ChangeRecorder, EventHandlers};
    use crate::error::DomainError;
    use crate::event::DomainEvent;
    use crate::identity::StreamId;
    use crate::payload::EventPayload;

    /// Events of the `Tally` test aggregate. `Frozen` has no
    /// registered handler.
    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum TallyEvent {
        Opened { tally_id: StreamId },
        Incremented { tally_id: StreamId, by: i64 },
        Frozen { tally_id: StreamId },
    }

    impl DomainEvent for TallyEvent {
        fn type_name(&self) -> &'static str {
            match self {
                Self::Opened { .. } => "TallyOpenedEvent",
                Self::Incremented { .. } => "TallyIncrementedEvent",
                Self::Frozen { .. } => "TallyFrozenEvent",
            }
        }

        fn subject_id(&self) -> &StreamId {
            match self {
                Self::Opened { tally_id }
                | Self::Incremented { tally_id, .. }
                | Self::Frozen { tally_id } => tally_id,
            }
        }

        fn to_payload(&self) -> EventPayload {
            let payload = EventPayload::new().with("tallyId", self.subject_id().as_str());
            match self {
                Self::Incremented { by, .. } => payload.with("by", *by),
                Self::Opened { .. } | Self::Frozen { .. } => payload,
            }
        }

        fn from_payload(type_name: &str, payload: &EventPayload) -> Result<Self, DomainError> {
            let reader = payload.reader(type_name);
            let tally_id = StreamId::new(reader.text("tallyId")?);
            match type_name {
                "TallyOpenedEvent" => Ok(Self::Opened { tally_id }),
                "TallyIncrementedEvent" => Ok(Self::Incremented {
                    tally_id,
                    by: reader.integer("by")?,
                }),
                "TallyFrozenEvent" => Ok(Self::Frozen { tally_id }),
                other => Err(DomainError::invalid_payload(other, "unknown event type")),
            }
        }
    }

    /// Minimal aggregate used to exercise the core contract.
    #[derive(Debug, Default, Clone, PartialEq)]
    pub(crate) struct Tally {
        pub(crate) id: Option<StreamId>,
        pub(crate) total: i64,
        recorder: ChangeRecorder<TallyEvent>,
    }

    static TALLY_HANDLERS: LazyLock<EventHandlers<Tally>> = LazyLock::new(|| {
        EventHandlers::new()
            .on("TallyOpened", Tally::when_opened)
            .on("TallyIncremented", Tally::when_incremented)
    });

    impl Tally {
        pub(crate) fn open(tally_id: StreamId) -> Result<Self, DomainError> {
            let mut tally = Self::default();
            tally.record(TallyEvent::Opened { tally_id }, None)?;
            Ok(tally)
        }

        pub(crate) fn increment(&mut self, by: i64) -> Result<(), DomainError> {
            let tally_id = self.id.clone().unwrap_or_else(|| StreamId::new("unopened"));
            self.record(TallyEvent::Incremented { tally_id, by }, None)
        }

        pub(crate) fn freeze(&mut self) -> Result<(), DomainError> {
            let tally_id = self.id.clone().unwrap_or_else(|| StreamId::new("unopened"));
            self.record(TallyEvent::Frozen { tally_id }, None)
        }

        fn when_opened(&mut self, event: &TallyEvent) -> Result<(), DomainError> {
            if let TallyEvent::Opened { tally_id } = event {
                self.id = Some(tally_id.clone());
            }
            Ok(())
        }

        fn when_incremented(&mut self, event: &TallyEvent) -> Result<(), DomainError> {
            if let TallyEvent::Incremented { by, .. } = event {
                self.total += by;
            }
            Ok(())
        }
    }

    impl AggregateRoot for Tally {
        type Event = TallyEvent;

        const STREAM_TYPE: &'static str = "tally";

        fn stream_id(&self) -> Option<&StreamId> {
            self.id.as_ref()
        }

        fn handlers() -> &'static EventHandlers<Self> {
            &TALLY_HANDLERS
        }

        fn recorder(&self) -> &ChangeRecorder<TallyEvent> {
            &self.recorder
        }

        fn recorder_mut(&mut self) -> &mut ChangeRecorder<TallyEvent> {
            &mut self.recorder
        }
    }
}
