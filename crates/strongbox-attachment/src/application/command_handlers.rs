//! Command handlers for the Attachment context.
//!
//! This module contains application-level command handler functions that
//! orchestrate domain logic: load aggregate, execute command, persist events.

use strongbox_core::aggregate::AggregateRoot;
use strongbox_core::command::Command;
use strongbox_core::entropy::EntropySource;
use strongbox_core::error::DomainError;
use strongbox_core::file::FileLocation;
use strongbox_core::identity::StreamId;
use strongbox_core::repository::{EventRepository, StoredEnvelope, load_aggregate, save_aggregate};
use tracing::{info, instrument};

use crate::domain::aggregates::Attachment;
use crate::domain::commands::{RenameAttachment, ReplaceAttachmentContent, UploadAttachment};
use crate::domain::values::{FileName, FileSize, MimeType};

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct AttachmentCommandResult {
    /// The attachment affected by the command.
    pub attachment_id: StreamId,
    /// The envelopes produced and persisted.
    pub stored_events: Vec<StoredEnvelope>,
}

fn persist(
    command: &dyn Command,
    attachment_id: StreamId,
    attachment: &mut Attachment,
    repo: &dyn EventRepository,
) -> Result<AttachmentCommandResult, DomainError> {
    let stored_events = save_aggregate(repo, attachment)?;

    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        attachment_id = %attachment_id,
        events = stored_events.len(),
        "command handled"
    );

    Ok(AttachmentCommandResult {
        attachment_id,
        stored_events,
    })
}

/// Handles the `UploadAttachment` command: creates a new attachment and
/// persists its `AttachmentUploadedEvent`.
///
/// # Errors
///
/// Returns `DomainError::Validation` if a field is invalid, or whatever the
/// repository's `append` returns.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id))]
pub fn handle_upload_attachment(
    command: &UploadAttachment,
    entropy: &mut dyn EntropySource,
    repo: &dyn EventRepository,
) -> Result<AttachmentCommandResult, DomainError> {
    let mut attachment = Attachment::upload_with(
        entropy,
        FileName::new(command.file_name.as_str())?,
        FileLocation::new(command.file_path.as_str()),
        MimeType::new(command.mime_type.as_str())?,
        FileSize::new(command.file_size)?,
    )?;
    let attachment_id = attachment
        .stream_id()
        .cloned()
        .ok_or_else(|| DomainError::Infrastructure("upload produced no identifier".to_owned()))?;

    persist(command, attachment_id, &mut attachment, repo)
}

/// Handles the `RenameAttachment` command: loads the attachment, renames it,
/// and persists the resulting event.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the attachment does not
/// exist, `DomainError::Validation` if the name is blank or unchanged, or
/// any repository error.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, attachment_id = %command.attachment_id))]
pub fn handle_rename_attachment(
    command: &RenameAttachment,
    repo: &dyn EventRepository,
) -> Result<AttachmentCommandResult, DomainError> {
    let file_name = FileName::new(command.file_name.as_str())?;
    let mut attachment: Attachment = load_aggregate(repo, &command.attachment_id)?;

    attachment.rename(file_name)?;

    persist(command, command.attachment_id.clone(), &mut attachment, repo)
}

/// Handles the `ReplaceAttachmentContent` command: loads the attachment,
/// points it at the new content, and persists the resulting event.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the attachment does not
/// exist, `DomainError::Validation` if a field is invalid, or any repository
/// error.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, attachment_id = %command.attachment_id))]
pub fn handle_replace_attachment_content(
    command: &ReplaceAttachmentContent,
    repo: &dyn EventRepository,
) -> Result<AttachmentCommandResult, DomainError> {
    let mime_type = MimeType::new(command.mime_type.as_str())?;
    let file_size = FileSize::new(command.file_size)?;
    let mut attachment: Attachment = load_aggregate(repo, &command.attachment_id)?;

    attachment.replace_content(
        FileLocation::new(command.file_path.as_str()),
        mime_type,
        file_size,
    )?;

    persist(command, command.attachment_id.clone(), &mut attachment, repo)
}
