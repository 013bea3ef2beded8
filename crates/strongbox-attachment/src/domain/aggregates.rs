//! Aggregate roots for the Attachment context.

use std::sync::LazyLock;

use strongbox_core::aggregate::{AggregateRoot, ChangeRecorder, EventHandlers};
use strongbox_core::entropy::{EntropySource, SystemEntropy};
use strongbox_core::error::DomainError;
use strongbox_core::event::{DomainEvent, variant_tag_of};
use strongbox_core::file::FileLocation;
use strongbox_core::identity::StreamId;

use super::events::{
    ATTACHMENT_CONTENT_REPLACED_EVENT_TYPE, ATTACHMENT_RENAMED_EVENT_TYPE,
    ATTACHMENT_UPLOADED_EVENT_TYPE, AttachmentContentReplacedEvent, AttachmentEvent,
    AttachmentRenamedEvent, AttachmentUploadedEvent,
};
use super::values::{FileName, FileSize, MimeType};

/// Stream type of every attachment stream.
pub const ATTACHMENT_STREAM_TYPE: &str = "attachment";

static ATTACHMENT_HANDLERS: LazyLock<EventHandlers<Attachment>> = LazyLock::new(|| {
    EventHandlers::new()
        .on(
            variant_tag_of(ATTACHMENT_UPLOADED_EVENT_TYPE),
            Attachment::when_uploaded,
        )
        .on(
            variant_tag_of(ATTACHMENT_RENAMED_EVENT_TYPE),
            Attachment::when_renamed,
        )
        .on(
            variant_tag_of(ATTACHMENT_CONTENT_REPLACED_EVENT_TYPE),
            Attachment::when_content_replaced,
        )
});

/// The aggregate root for an uploaded file.
///
/// The content itself never passes through the aggregate: each upload
/// records the location of the file alongside its event, and readers open
/// it through a `BinaryStorage`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attachment {
    id: Option<StreamId>,
    file_name: Option<FileName>,
    mime_type: Option<MimeType>,
    file_size: FileSize,
    /// Number of content uploads, starting at 1 for the initial upload.
    revision: u32,
    recorder: ChangeRecorder<AttachmentEvent>,
}

impl Attachment {
    /// Uploads a new attachment under a freshly generated identifier.
    ///
    /// # Errors
    ///
    /// Returns any error from recording the `AttachmentUploadedEvent`.
    pub fn upload(
        file_name: FileName,
        file: FileLocation,
        mime_type: MimeType,
        file_size: FileSize,
    ) -> Result<Self, DomainError> {
        Self::upload_with(&mut SystemEntropy, file_name, file, mime_type, file_size)
    }

    /// Like [`Attachment::upload`], drawing the identifier from `entropy`.
    ///
    /// # Errors
    ///
    /// Returns any error from recording the `AttachmentUploadedEvent`.
    pub fn upload_with(
        entropy: &mut dyn EntropySource,
        file_name: FileName,
        file: FileLocation,
        mime_type: MimeType,
        file_size: FileSize,
    ) -> Result<Self, DomainError> {
        let event = AttachmentEvent::Uploaded(AttachmentUploadedEvent {
            attachment_id: StreamId::generate_with(entropy),
            file_name,
            mime_type,
            file_size,
        });

        let mut attachment = Self::default();
        attachment.record(event, Some(file))?;
        Ok(attachment)
    }

    /// Gives the attachment a new display name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the attachment has not been
    /// uploaded or already carries `file_name`.
    pub fn rename(&mut self, file_name: FileName) -> Result<(), DomainError> {
        let attachment_id = self.require_uploaded()?.clone();
        if self.file_name.as_ref() == Some(&file_name) {
            return Err(DomainError::Validation(format!(
                "attachment {attachment_id} is already named {:?}",
                file_name.as_str()
            )));
        }

        self.record(
            AttachmentEvent::Renamed(AttachmentRenamedEvent {
                attachment_id,
                file_name,
            }),
            None,
        )
    }

    /// Replaces the attachment's content with the file at `file`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the attachment has not been uploaded.
    pub fn replace_content(
        &mut self,
        file: FileLocation,
        mime_type: MimeType,
        file_size: FileSize,
    ) -> Result<(), DomainError> {
        let attachment_id = self.require_uploaded()?.clone();

        self.record(
            AttachmentEvent::ContentReplaced(AttachmentContentReplacedEvent {
                attachment_id,
                mime_type,
                file_size,
            }),
            Some(file),
        )
    }

    /// Current display name.
    #[must_use]
    pub fn file_name(&self) -> Option<&FileName> {
        self.file_name.as_ref()
    }

    /// Media type of the current content.
    #[must_use]
    pub fn mime_type(&self) -> Option<&MimeType> {
        self.mime_type.as_ref()
    }

    /// Length of the current content.
    #[must_use]
    pub fn file_size(&self) -> FileSize {
        self.file_size
    }

    /// Number of content uploads so far; `0` for a blank aggregate.
    #[must_use]
    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// Location of the current content: the file of the latest upload
    /// among the uncommitted changes.
    #[must_use]
    pub fn pending_file(&self) -> Option<&FileLocation> {
        self.changes()
            .iter()
            .rev()
            .find_map(|envelope| envelope.file().location())
    }

    fn require_uploaded(&self) -> Result<&StreamId, DomainError> {
        self.id
            .as_ref()
            .ok_or_else(|| DomainError::Validation("attachment has not been uploaded".to_owned()))
    }

    fn unexpected(event: &AttachmentEvent) -> DomainError {
        DomainError::MissingHandler {
            stream_type: ATTACHMENT_STREAM_TYPE.to_owned(),
            variant: event.variant_tag().to_owned(),
        }
    }

    fn when_uploaded(&mut self, event: &AttachmentEvent) -> Result<(), DomainError> {
        let AttachmentEvent::Uploaded(uploaded) = event else {
            return Err(Self::unexpected(event));
        };
        if self.id.is_some() {
            return Err(DomainError::Validation(format!(
                "attachment {} has already been uploaded",
                uploaded.attachment_id
            )));
        }

        self.id = Some(uploaded.attachment_id.clone());
        self.file_name = Some(uploaded.file_name.clone());
        self.mime_type = Some(uploaded.mime_type.clone());
        self.file_size = uploaded.file_size;
        self.revision = 1;
        Ok(())
    }

    fn when_renamed(&mut self, event: &AttachmentEvent) -> Result<(), DomainError> {
        let AttachmentEvent::Renamed(renamed) = event else {
            return Err(Self::unexpected(event));
        };
        self.require_uploaded()?;

        self.file_name = Some(renamed.file_name.clone());
        Ok(())
    }

    fn when_content_replaced(&mut self, event: &AttachmentEvent) -> Result<(), DomainError> {
        let AttachmentEvent::ContentReplaced(replaced) = event else {
            return Err(Self::unexpected(event));
        };
        self.require_uploaded()?;

        self.mime_type = Some(replaced.mime_type.clone());
        self.file_size = replaced.file_size;
        self.revision = self.revision.saturating_add(1);
        Ok(())
    }
}

impl AggregateRoot for Attachment {
    type Event = AttachmentEvent;

    const STREAM_TYPE: &'static str = ATTACHMENT_STREAM_TYPE;

    fn stream_id(&self) -> Option<&StreamId> {
        self.id.as_ref()
    }

    fn handlers() -> &'static EventHandlers<Self> {
        &ATTACHMENT_HANDLERS
    }

    fn recorder(&self) -> &ChangeRecorder<AttachmentEvent> {
        &self.recorder
    }

    fn recorder_mut(&mut self) -> &mut ChangeRecorder<AttachmentEvent> {
        &mut self.recorder
    }
}

#[cfg(test)]
mod tests {
    use strongbox_core::envelope::EventEnvelope;
    use strongbox_core::event::EventMetaData;
    use strongbox_core::file::FileReference;
    use strongbox_core::identity::{StreamSequence, StreamType};
    use strongbox_test_support::FixedEntropy;

    use super::*;

    fn example_pdf() -> Attachment {
        Attachment::upload(
            FileName::new("An example PDF").unwrap(),
            FileLocation::new("/tmp/example.pdf.tmp"),
            MimeType::new("application/x-pdf").unwrap(),
            FileSize::new(150_000).unwrap(),
        )
        .unwrap()
    }

    fn envelope(
        id: &str,
        sequence: u64,
        event: AttachmentEvent,
        file: Option<&str>,
    ) -> EventEnvelope<AttachmentEvent> {
        EventEnvelope::new(
            EventMetaData::new(
                StreamType::new(ATTACHMENT_STREAM_TYPE),
                StreamId::new(id),
                StreamSequence::new(sequence),
            ),
            event,
            FileReference::from_location(file.map(FileLocation::new)),
        )
    }

    fn uploaded(id: &str) -> AttachmentEvent {
        AttachmentEvent::Uploaded(AttachmentUploadedEvent {
            attachment_id: StreamId::new(id),
            file_name: FileName::new("An example PDF").unwrap(),
            mime_type: MimeType::new("application/x-pdf").unwrap(),
            file_size: FileSize::new(150_000).unwrap(),
        })
    }

    fn renamed(id: &str, name: &str) -> AttachmentEvent {
        AttachmentEvent::Renamed(AttachmentRenamedEvent {
            attachment_id: StreamId::new(id),
            file_name: FileName::new(name).unwrap(),
        })
    }

    fn replaced(id: &str, size: u64) -> AttachmentEvent {
        AttachmentEvent::ContentReplaced(AttachmentContentReplacedEvent {
            attachment_id: StreamId::new(id),
            mime_type: MimeType::new("application/pdf").unwrap(),
            file_size: FileSize::new(size).unwrap(),
        })
    }

    #[test]
    fn test_upload_records_one_envelope_with_file() {
        // Arrange / Act
        let attachment = example_pdf();

        // Assert
        assert_eq!(attachment.changes().len(), 1);
        assert_eq!(attachment.sequence(), StreamSequence::new(1));

        let env = attachment.changes().last().unwrap();
        let AttachmentEvent::Uploaded(event) = env.event() else {
            panic!("expected Uploaded, got {:?}", env.event());
        };
        assert_eq!(attachment.stream_id(), Some(&event.attachment_id));
        assert_eq!(env.metadata().stream_id(), &event.attachment_id);
        assert_eq!(env.metadata().stream_type().as_str(), "attachment");
        assert_eq!(
            env.file(),
            &FileReference::Present(FileLocation::new("/tmp/example.pdf.tmp"))
        );
        assert_eq!(event.file_name.as_str(), "An example PDF");
        assert_eq!(event.mime_type.as_str(), "application/x-pdf");
        assert_eq!(event.file_size.bytes(), 150_000);
    }

    #[test]
    fn test_upload_sets_state() {
        let attachment = example_pdf();

        assert_eq!(attachment.file_name().unwrap().as_str(), "An example PDF");
        assert_eq!(attachment.mime_type().unwrap().as_str(), "application/x-pdf");
        assert_eq!(attachment.file_size().bytes(), 150_000);
        assert_eq!(attachment.revision(), 1);
        assert_eq!(
            attachment.pending_file(),
            Some(&FileLocation::new("/tmp/example.pdf.tmp"))
        );
    }

    #[test]
    fn test_upload_with_entropy_is_deterministic() {
        let upload = || {
            Attachment::upload_with(
                &mut FixedEntropy(0xab),
                FileName::new("a.txt").unwrap(),
                FileLocation::new("/tmp/a.txt"),
                MimeType::new("text/plain").unwrap(),
                FileSize::new(3).unwrap(),
            )
            .unwrap()
        };

        let first = upload();
        let second = upload();

        assert_eq!(first, second);
        assert_eq!(
            first.stream_id().unwrap().as_str(),
            "abababababababababababababababab"
        );
    }

    #[test]
    fn test_rename_records_event_without_file() {
        let mut attachment = example_pdf();

        attachment.rename(FileName::new("Quarterly report").unwrap()).unwrap();

        assert_eq!(attachment.changes().len(), 2);
        assert_eq!(attachment.sequence(), StreamSequence::new(2));
        assert_eq!(attachment.file_name().unwrap().as_str(), "Quarterly report");
        assert_eq!(attachment.changes().last().unwrap().file(), &FileReference::Absent);
    }

    #[test]
    fn test_rename_to_same_name_is_rejected() {
        let mut attachment = example_pdf();
        let before = attachment.clone();

        let result = attachment.rename(FileName::new("An example PDF").unwrap());

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(attachment, before);
    }

    #[test]
    fn test_rename_blank_aggregate_is_rejected() {
        let mut attachment = Attachment::default();

        let result = attachment.rename(FileName::new("anything").unwrap());

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(attachment.changes().is_empty());
    }

    #[test]
    fn test_replace_content_bumps_revision_and_file() {
        let mut attachment = example_pdf();

        attachment
            .replace_content(
                FileLocation::new("/tmp/example-v2.pdf.tmp"),
                MimeType::new("application/pdf").unwrap(),
                FileSize::new(200_000).unwrap(),
            )
            .unwrap();

        assert_eq!(attachment.revision(), 2);
        assert_eq!(attachment.file_size().bytes(), 200_000);
        assert_eq!(attachment.mime_type().unwrap().as_str(), "application/pdf");
        assert_eq!(
            attachment.pending_file(),
            Some(&FileLocation::new("/tmp/example-v2.pdf.tmp"))
        );
    }

    #[test]
    fn test_reconstitute_three_envelopes() {
        // Arrange
        let history = vec![
            envelope("a-1", 1, uploaded("a-1"), Some("/tmp/example.pdf.tmp")),
            envelope("a-1", 2, renamed("a-1", "Renamed PDF"), None),
            envelope("a-1", 3, replaced("a-1", 99), Some("/tmp/example-v2.pdf.tmp")),
        ];

        // Act
        let attachment = Attachment::reconstitute_from_history(&history).unwrap();

        // Assert
        assert_eq!(attachment.sequence(), StreamSequence::new(3));
        assert!(attachment.changes().is_empty());
        assert_eq!(attachment.stream_id(), Some(&StreamId::new("a-1")));
        assert_eq!(attachment.file_name().unwrap().as_str(), "Renamed PDF");
        assert_eq!(attachment.file_size().bytes(), 99);
        assert_eq!(attachment.revision(), 2);
    }

    #[test]
    fn test_replay_matches_live_state() {
        let mut live = example_pdf();
        live.rename(FileName::new("Renamed").unwrap()).unwrap();
        live.replace_content(
            FileLocation::new("/tmp/v2"),
            MimeType::new("text/plain").unwrap(),
            FileSize::new(12).unwrap(),
        )
        .unwrap();

        let rebuilt = Attachment::reconstitute_from_history(live.changes()).unwrap();

        assert_eq!(rebuilt.stream_id(), live.stream_id());
        assert_eq!(rebuilt.file_name(), live.file_name());
        assert_eq!(rebuilt.mime_type(), live.mime_type());
        assert_eq!(rebuilt.file_size(), live.file_size());
        assert_eq!(rebuilt.revision(), live.revision());
        assert_eq!(rebuilt.sequence(), live.sequence());
    }

    #[test]
    fn test_replay_rejects_rename_before_upload() {
        let history = vec![envelope("a-1", 1, renamed("a-1", "x"), None)];

        let result = Attachment::reconstitute_from_history(&history);

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_replay_rejects_second_upload() {
        let history = vec![
            envelope("a-1", 1, uploaded("a-1"), Some("/tmp/a")),
            envelope("a-1", 2, uploaded("a-1"), Some("/tmp/b")),
        ];

        let result = Attachment::reconstitute_from_history(&history);

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_handler_table_covers_every_event() {
        let handlers = Attachment::handlers();

        assert_eq!(handlers.len(), 3);
        for variant in ["AttachmentUploaded", "AttachmentRenamed", "AttachmentContentReplaced"] {
            assert!(handlers.contains(variant), "missing handler for {variant}");
        }
    }

    #[test]
    fn test_every_declared_event_type_dispatches_to_a_handler() {
        // Arrange
        let handlers = Attachment::handlers();
        let declared = [
            ATTACHMENT_UPLOADED_EVENT_TYPE,
            ATTACHMENT_RENAMED_EVENT_TYPE,
            ATTACHMENT_CONTENT_REPLACED_EVENT_TYPE,
        ];

        // Act
        let missing: Vec<&str> = declared
            .into_iter()
            .filter(|type_name| !handlers.contains(variant_tag_of(type_name)))
            .collect();

        // Assert
        assert!(missing.is_empty(), "no handler for {missing:?}");
    }
}
