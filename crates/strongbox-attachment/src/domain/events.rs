//! Domain events for the Attachment context.

use strongbox_core::error::DomainError;
use strongbox_core::event::DomainEvent;
use strongbox_core::identity::StreamId;
use strongbox_core::payload::{EventPayload, PayloadReader};

use super::values::{FileName, FileSize, MimeType};

/// Type name of [`AttachmentUploadedEvent`].
pub const ATTACHMENT_UPLOADED_EVENT_TYPE: &str = "AttachmentUploadedEvent";
/// Type name of [`AttachmentRenamedEvent`].
pub const ATTACHMENT_RENAMED_EVENT_TYPE: &str = "AttachmentRenamedEvent";
/// Type name of [`AttachmentContentReplacedEvent`].
pub const ATTACHMENT_CONTENT_REPLACED_EVENT_TYPE: &str = "AttachmentContentReplacedEvent";

const ATTACHMENT_ID: &str = "attachmentId";
const FILE_NAME: &str = "fileName";
const MIME_TYPE: &str = "mimeType";
const FILE_SIZE: &str = "fileSize";

/// Emitted when a new attachment is uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentUploadedEvent {
    /// The attachment identifier.
    pub attachment_id: StreamId,
    /// Display name.
    pub file_name: FileName,
    /// Media type of the uploaded content.
    pub mime_type: MimeType,
    /// Length of the uploaded content.
    pub file_size: FileSize,
}

/// Emitted when an attachment gets a new display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRenamedEvent {
    /// The attachment identifier.
    pub attachment_id: StreamId,
    /// The new display name.
    pub file_name: FileName,
}

/// Emitted when an attachment's content is replaced by a new upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentContentReplacedEvent {
    /// The attachment identifier.
    pub attachment_id: StreamId,
    /// Media type of the new content.
    pub mime_type: MimeType,
    /// Length of the new content.
    pub file_size: FileSize,
}

/// Every event recorded on an attachment stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentEvent {
    /// A new attachment has been uploaded.
    Uploaded(AttachmentUploadedEvent),
    /// An attachment has been renamed.
    Renamed(AttachmentRenamedEvent),
    /// An attachment's content has been replaced.
    ContentReplaced(AttachmentContentReplacedEvent),
}

impl DomainEvent for AttachmentEvent {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Uploaded(_) => ATTACHMENT_UPLOADED_EVENT_TYPE,
            Self::Renamed(_) => ATTACHMENT_RENAMED_EVENT_TYPE,
            Self::ContentReplaced(_) => ATTACHMENT_CONTENT_REPLACED_EVENT_TYPE,
        }
    }

    fn subject_id(&self) -> &StreamId {
        match self {
            Self::Uploaded(e) => &e.attachment_id,
            Self::Renamed(e) => &e.attachment_id,
            Self::ContentReplaced(e) => &e.attachment_id,
        }
    }

    fn to_payload(&self) -> EventPayload {
        let payload = EventPayload::new().with(ATTACHMENT_ID, self.subject_id().as_str());
        match self {
            Self::Uploaded(e) => payload
                .with(FILE_NAME, e.file_name.as_str())
                .with(MIME_TYPE, e.mime_type.as_str())
                .with(FILE_SIZE, e.file_size.to_signed()),
            Self::Renamed(e) => payload.with(FILE_NAME, e.file_name.as_str()),
            Self::ContentReplaced(e) => payload
                .with(MIME_TYPE, e.mime_type.as_str())
                .with(FILE_SIZE, e.file_size.to_signed()),
        }
    }

    fn from_payload(type_name: &str, payload: &EventPayload) -> Result<Self, DomainError> {
        let fields = Fields {
            type_name,
            reader: payload.reader(type_name),
        };
        match type_name {
            ATTACHMENT_UPLOADED_EVENT_TYPE => Ok(Self::Uploaded(AttachmentUploadedEvent {
                attachment_id: fields.attachment_id()?,
                file_name: fields.file_name()?,
                mime_type: fields.mime_type()?,
                file_size: fields.file_size()?,
            })),
            ATTACHMENT_RENAMED_EVENT_TYPE => Ok(Self::Renamed(AttachmentRenamedEvent {
                attachment_id: fields.attachment_id()?,
                file_name: fields.file_name()?,
            })),
            ATTACHMENT_CONTENT_REPLACED_EVENT_TYPE => {
                Ok(Self::ContentReplaced(AttachmentContentReplacedEvent {
                    attachment_id: fields.attachment_id()?,
                    mime_type: fields.mime_type()?,
                    file_size: fields.file_size()?,
                }))
            }
            other => Err(DomainError::invalid_payload(other, "unknown event type")),
        }
    }
}

/// Reads attachment fields, reporting value-type violations as payload errors.
struct Fields<'a> {
    type_name: &'a str,
    reader: PayloadReader<'a>,
}

impl Fields<'_> {
    fn invalid(&self, err: DomainError) -> DomainError {
        match err {
            DomainError::Validation(reason) => DomainError::invalid_payload(self.type_name, reason),
            other => other,
        }
    }

    fn attachment_id(&self) -> Result<StreamId, DomainError> {
        Ok(StreamId::new(self.reader.text(ATTACHMENT_ID)?))
    }

    fn file_name(&self) -> Result<FileName, DomainError> {
        FileName::new(self.reader.text(FILE_NAME)?).map_err(|e| self.invalid(e))
    }

    fn mime_type(&self) -> Result<MimeType, DomainError> {
        MimeType::new(self.reader.text(MIME_TYPE)?).map_err(|e| self.invalid(e))
    }

    fn file_size(&self) -> Result<FileSize, DomainError> {
        FileSize::from_signed(self.reader.integer(FILE_SIZE)?).map_err(|e| self.invalid(e))
    }
}
