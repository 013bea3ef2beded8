//! Event envelopes: one recorded change plus everything needed to locate it.

use crate::event::{DomainEvent, EventMetaData};
use crate::file::FileReference;
use crate::identity::StreamSequence;

/// Immutable bundle of metadata, event, and optional attachment.
///
/// This is the unit handed to persistence and used for replay.
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope<E> {
    metadata: EventMetaData,
    event: E,
    file: FileReference,
}

impl<E: DomainEvent> EventEnvelope<E> {
    /// Bundles one recorded change.
    #[must_use]
    pub fn new(metadata: EventMetaData, event: E, file: FileReference) -> Self {
        Self {
            metadata,
            event,
            file,
        }
    }

    /// Where this event sits in its stream.
    #[must_use]
    pub fn metadata(&self) -> &EventMetaData {
        &self.metadata
    }

    /// The recorded event.
    #[must_use]
    pub fn event(&self) -> &E {
        &self.event
    }

    /// The attached file, if any.
    #[must_use]
    pub fn file(&self) -> &FileReference {
        &self.file
    }

    /// Shorthand for the metadata's stream sequence.
    #[must_use]
    pub fn sequence(&self) -> StreamSequence {
        self.metadata.stream_sequence()
    }

    /// Splits the envelope into its parts.
    #[must_use]
    pub fn into_parts(self) -> (EventMetaData, E, FileReference) {
        (self.metadata, self.event, self.file)
    }
}
