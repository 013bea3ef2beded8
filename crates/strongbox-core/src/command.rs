//! Command abstractions.

use uuid::Uuid;

use crate::identity::StreamId;

/// Trait that all application commands implement.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type name for this command (for logging/routing).
    fn command_type(&self) -> &'static str;

    /// Correlation ID to trace this command through the system.
    fn correlation_id(&self) -> Uuid;

    /// The existing stream this command acts on; `None` for commands that
    /// create a new stream.
    fn target(&self) -> Option<&StreamId>;
}
