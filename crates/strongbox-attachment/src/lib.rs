//! Strongbox: Attachment bounded context.
//!
//! Responsible for recording file uploads, renames and content
//! replacements as events, and for resolving the current content of an
//! attachment through the binary storage collaborator.

pub mod application;
pub mod domain;
