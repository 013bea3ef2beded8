//! Commands for the Attachment context.

use strongbox_core::command::Command;
use strongbox_core::identity::StreamId;
use uuid::Uuid;

/// Command to upload a new attachment from a file already on storage.
#[derive(Debug, Clone)]
pub struct UploadAttachment {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Display name.
    pub file_name: String,
    /// Where the uploaded content was stored.
    pub file_path: String,
    /// Media type of the content.
    pub mime_type: String,
    /// Length of the content in bytes.
    pub file_size: u64,
}

/// Command to rename an attachment.
#[derive(Debug, Clone)]
pub struct RenameAttachment {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The attachment identifier.
    pub attachment_id: StreamId,
    /// The new display name.
    pub file_name: String,
}

/// Command to replace an attachment's content with a new upload.
#[derive(Debug, Clone)]
pub struct ReplaceAttachmentContent {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The attachment identifier.
    pub attachment_id: StreamId,
    /// Where the new content was stored.
    pub file_path: String,
    /// Media type of the new content.
    pub mime_type: String,
    /// Length of the new content in bytes.
    pub file_size: u64,
}

impl Command for UploadAttachment {
    fn command_type(&self) -> &'static str {
        "attachment.upload"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn target(&self) -> Option<&StreamId> {
        None
    }
}

impl Command for RenameAttachment {
    fn command_type(&self) -> &'static str {
        "attachment.rename"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn target(&self) -> Option<&StreamId> {
        Some(&self.attachment_id)
    }
}

impl Command for ReplaceAttachmentContent {
    fn command_type(&self) -> &'static str {
        "attachment.replace_content"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn target(&self) -> Option<&StreamId> {
        Some(&self.attachment_id)
    }
}
