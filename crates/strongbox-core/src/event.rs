//! Domain event abstractions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::identity::{StreamId, StreamSequence, StreamType};
use crate::payload::EventPayload;

/// Suffix stripped from an event's declared type name to obtain its variant tag.
pub const EVENT_TYPE_SUFFIX: &str = "Event";

/// Locates one event within its aggregate's history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventMetaData {
    stream_type: StreamType,
    stream_id: StreamId,
    stream_sequence: StreamSequence,
}

impl EventMetaData {
    /// Creates metadata for one event.
    #[must_use]
    pub fn new(
        stream_type: StreamType,
        stream_id: StreamId,
        stream_sequence: StreamSequence,
    ) -> Self {
        Self {
            stream_type,
            stream_id,
            stream_sequence,
        }
    }

    /// The aggregate category.
    #[must_use]
    pub fn stream_type(&self) -> &StreamType {
        &self.stream_type
    }

    /// The aggregate instance.
    #[must_use]
    pub fn stream_id(&self) -> &StreamId {
        &self.stream_id
    }

    /// Position of the event within its stream.
    #[must_use]
    pub fn stream_sequence(&self) -> StreamSequence {
        self.stream_sequence
    }
}

/// Derives the variant tag from a declared event type name.
///
/// `AttachmentUploadedEvent` becomes `AttachmentUploaded`; names without the
/// suffix are returned unchanged.
#[must_use]
pub fn variant_tag_of(type_name: &str) -> &str {
    type_name.strip_suffix(EVENT_TYPE_SUFFIX).unwrap_or(type_name)
}

/// Human-readable event name, e.g. `Attachment Uploaded`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventName(String);

impl EventName {
    /// Builds the name from a declared type name by dropping the `Event`
    /// suffix and splitting the camel-cased words.
    #[must_use]
    pub fn from_type_name(type_name: &str) -> Self {
        let base = variant_tag_of(type_name);
        let mut name = String::with_capacity(base.len() + 4);
        let mut prev: Option<char> = None;
        let mut chars = base.chars().peekable();
        while let Some(c) = chars.next() {
            if let Some(p) = prev {
                let next_is_lower = chars.peek().is_some_and(|n| n.is_lowercase());
                let starts_word = c.is_uppercase()
                    && (p.is_lowercase() || p.is_ascii_digit() || (p.is_uppercase() && next_is_lower));
                if starts_word {
                    name.push(' ');
                }
            }
            name.push(c);
            prev = Some(c);
        }
        Self(name)
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trait that every closed set of domain events implements.
pub trait DomainEvent: Clone + fmt::Debug + Send + Sync + Sized {
    /// Declared type name of the current variant, e.g. `AttachmentUploadedEvent`.
    ///
    /// This is the routing key stored alongside the payload.
    fn type_name(&self) -> &'static str;

    /// Identifier of the stream this event is about.
    fn subject_id(&self) -> &StreamId;

    /// Exports the event's fields.
    fn to_payload(&self) -> EventPayload;

    /// Rebuilds the variant named by `type_name` from a payload.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPayload` if `type_name` is unknown or a
    /// required field is missing or mistyped.
    fn from_payload(type_name: &str, payload: &EventPayload) -> Result<Self, DomainError>;

    /// Handler key for the current variant: the type name without its
    /// `Event` suffix.
    fn variant_tag(&self) -> &'static str {
        variant_tag_of(self.type_name())
    }

    /// Human-readable name of the current variant.
    fn name(&self) -> EventName {
        EventName::from_type_name(self.type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_tag_strips_event_suffix() {
        assert_eq!(variant_tag_of("AttachmentUploadedEvent"), "AttachmentUploaded");
        assert_eq!(variant_tag_of("Uploaded"), "Uploaded");
    }

    #[test]
    fn test_variant_tag_only_strips_trailing_suffix() {
        assert_eq!(variant_tag_of("EventLogged"), "EventLogged");
    }

    #[test]
    fn test_event_name_splits_camel_case_words() {
        let name = EventName::from_type_name("AttachmentUploadedEvent");

        assert_eq!(name.as_str(), "Attachment Uploaded");
    }

    #[test]
    fn test_event_name_keeps_acronyms_together() {
        let name = EventName::from_type_name("PDFAttachedEvent");

        assert_eq!(name.to_string(), "PDF Attached");
    }

    #[test]
    fn test_metadata_exposes_components() {
        let meta = EventMetaData::new(
            StreamType::new("attachment"),
            StreamId::new("abc"),
            StreamSequence::new(3),
        );

        assert_eq!(meta.stream_type().as_str(), "attachment");
        assert_eq!(meta.stream_id().as_str(), "abc");
        assert_eq!(meta.stream_sequence().value(), 3);
    }
}
