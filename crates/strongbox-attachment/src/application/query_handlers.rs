//! Query handlers for the Attachment context.
//!
//! This module contains query handlers that reconstitute aggregates
//! from stored events and return read-only view DTOs.

use serde::Serialize;
use strongbox_core::aggregate::AggregateRoot;
use strongbox_core::error::DomainError;
use strongbox_core::file::{BinaryStorage, ContentStream, FileLocation, FileReference};
use strongbox_core::identity::StreamId;
use strongbox_core::repository::{EventRepository, decode_history};
use strongbox_core::stream::EventStream;
use tracing::debug;

use crate::domain::aggregates::Attachment;
use crate::domain::events::AttachmentEvent;

/// Read-only view of an attachment aggregate.
#[derive(Debug, Serialize)]
pub struct AttachmentView {
    /// The attachment identifier.
    pub attachment_id: StreamId,
    /// Current display name.
    pub file_name: String,
    /// Media type of the current content.
    pub mime_type: String,
    /// Length of the current content in bytes.
    pub file_size: u64,
    /// Number of content uploads.
    pub revision: u32,
    /// Current sequence (event count).
    pub version: u64,
    /// Location of the current content.
    pub file_location: Option<FileLocation>,
}

fn load_history(
    attachment_id: &StreamId,
    repo: &dyn EventRepository,
) -> Result<EventStream<AttachmentEvent>, DomainError> {
    let stored = repo.load_history(&Attachment::stream_type(), attachment_id)?;
    if stored.is_empty() {
        return Err(DomainError::AggregateNotFound(attachment_id.clone()));
    }
    decode_history(&stored)
}

/// The file reference of the latest envelope that carried one.
fn current_file(history: &EventStream<AttachmentEvent>) -> FileReference {
    history
        .iter()
        .rev()
        .find(|envelope| envelope.file().location().is_some())
        .map(|envelope| envelope.file().clone())
        .unwrap_or_default()
}

/// Retrieves an attachment by its identifier.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID,
/// or any decoding or replay error.
pub fn get_attachment_by_id(
    attachment_id: &StreamId,
    repo: &dyn EventRepository,
) -> Result<AttachmentView, DomainError> {
    let history = load_history(attachment_id, repo)?;
    let attachment = Attachment::reconstitute_from_history(&history)?;

    Ok(AttachmentView {
        attachment_id: attachment_id.clone(),
        file_name: attachment
            .file_name()
            .map(|name| name.as_str().to_owned())
            .unwrap_or_default(),
        mime_type: attachment
            .mime_type()
            .map(|mime| mime.as_str().to_owned())
            .unwrap_or_default(),
        file_size: attachment.file_size().bytes(),
        revision: attachment.revision(),
        version: attachment.sequence().value(),
        file_location: current_file(&history).location().cloned(),
    })
}

/// Opens the attachment's current content from `storage`.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID,
/// or `DomainError::FileUnavailable` if no file was ever recorded or the
/// storage cannot open it.
pub fn open_attachment_content(
    attachment_id: &StreamId,
    repo: &dyn EventRepository,
    storage: &dyn BinaryStorage,
) -> Result<ContentStream, DomainError> {
    let history = load_history(attachment_id, repo)?;
    let file = current_file(&history);
    debug!(attachment_id = %attachment_id, location = ?file.location(), "opening attachment content");
    file.open_stream(storage)
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use strongbox_core::envelope::EventEnvelope;
    use strongbox_core::event::EventMetaData;
    use strongbox_core::identity::{StreamSequence, StreamType};
    use strongbox_core::repository::StoredEnvelope;
    use strongbox_test_support::{
        EmptyEventRepository, FailingEventRepository, InMemoryBinaryStorage,
        RecordingEventRepository,
    };

    use super::*;
    use crate::domain::events::{AttachmentRenamedEvent, AttachmentUploadedEvent};
    use crate::domain::values::{FileName, FileSize, MimeType};

    fn stored(sequence: u64, event: AttachmentEvent, file: Option<&str>) -> StoredEnvelope {
        StoredEnvelope::from_envelope(&EventEnvelope::new(
            EventMetaData::new(
                StreamType::new("attachment"),
                StreamId::new("a-1"),
                StreamSequence::new(sequence),
            ),
            event,
            FileReference::from_location(file.map(FileLocation::new)),
        ))
    }

    fn history() -> Vec<StoredEnvelope> {
        vec![
            stored(
                1,
                AttachmentEvent::Uploaded(AttachmentUploadedEvent {
                    attachment_id: StreamId::new("a-1"),
                    file_name: FileName::new("An example PDF").unwrap(),
                    mime_type: MimeType::new("application/x-pdf").unwrap(),
                    file_size: FileSize::new(11).unwrap(),
                }),
                Some("/tmp/example.pdf.tmp"),
            ),
            stored(
                2,
                AttachmentEvent::Renamed(AttachmentRenamedEvent {
                    attachment_id: StreamId::new("a-1"),
                    file_name: FileName::new("Renamed PDF").unwrap(),
                }),
                None,
            ),
        ]
    }

    #[test]
    fn test_get_attachment_by_id_returns_view() {
        // Arrange
        let repo = RecordingEventRepository::new(history());

        // Act
        let view = get_attachment_by_id(&StreamId::new("a-1"), &repo).unwrap();

        // Assert
        assert_eq!(view.attachment_id, StreamId::new("a-1"));
        assert_eq!(view.file_name, "Renamed PDF");
        assert_eq!(view.mime_type, "application/x-pdf");
        assert_eq!(view.file_size, 11);
        assert_eq!(view.revision, 1);
        assert_eq!(view.version, 2);
        assert_eq!(view.file_location, Some(FileLocation::new("/tmp/example.pdf.tmp")));
    }

    #[test]
    fn test_view_serializes_to_json() {
        let repo = RecordingEventRepository::new(history());

        let view = get_attachment_by_id(&StreamId::new("a-1"), &repo).unwrap();
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["attachment_id"], "a-1");
        assert_eq!(json["file_location"], "/tmp/example.pdf.tmp");
        assert_eq!(json["version"], 2);
    }

    #[test]
    fn test_get_attachment_by_id_returns_not_found() {
        let result = get_attachment_by_id(&StreamId::new("a-1"), &EmptyEventRepository);

        assert_eq!(
            result.unwrap_err(),
            DomainError::AggregateNotFound(StreamId::new("a-1"))
        );
    }

    #[test]
    fn test_get_attachment_by_id_propagates_repository_error() {
        let result = get_attachment_by_id(&StreamId::new("a-1"), &FailingEventRepository);

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }

    #[test]
    fn test_open_attachment_content_reads_latest_file() {
        // Arrange
        let repo = RecordingEventRepository::new(history());
        let storage = InMemoryBinaryStorage::new();
        storage.put("/tmp/example.pdf.tmp", "%PDF-1.4 ok");

        // Act
        let mut stream = open_attachment_content(&StreamId::new("a-1"), &repo, &storage).unwrap();
        let mut content = String::new();
        stream.read_to_string(&mut content).unwrap();

        // Assert
        assert_eq!(content, "%PDF-1.4 ok");
    }

    #[test]
    fn test_open_attachment_content_reports_missing_file() {
        let repo = RecordingEventRepository::new(history());
        let storage = InMemoryBinaryStorage::new();

        let result = open_attachment_content(&StreamId::new("a-1"), &repo, &storage);

        match result {
            Err(DomainError::FileUnavailable { location, .. }) => {
                assert_eq!(location, "/tmp/example.pdf.tmp");
            }
            Err(other) => panic!("expected FileUnavailable, got {other:?}"),
            Ok(_) => panic!("expected FileUnavailable, got a stream"),
        }
    }

    #[test]
    fn test_current_file_is_absent_without_any_upload_file() {
        let stream: EventStream<AttachmentEvent> = decode_history(&history()[1..]).unwrap();

        assert_eq!(current_file(&stream), FileReference::Absent);
    }
}
