//! Test storage: an in-memory `BinaryStorage`.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::RwLock;

use strongbox_core::error::DomainError;
use strongbox_core::file::{BinaryStorage, ContentStream, FileLocation};

/// Binary storage that keeps file contents in memory. Files can be added or
/// removed between calls to simulate external changes.
#[derive(Debug, Default)]
pub struct InMemoryBinaryStorage {
    files: RwLock<HashMap<FileLocation, Vec<u8>>>,
}

impl InMemoryBinaryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `content` at `location`, replacing anything already there.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn put(&self, location: &str, content: impl Into<Vec<u8>>) {
        self.files
            .write()
            .unwrap()
            .insert(FileLocation::new(location), content.into());
    }

    /// Deletes the content at `location`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn remove(&self, location: &str) {
        self.files
            .write()
            .unwrap()
            .remove(&FileLocation::new(location));
    }
}

impl BinaryStorage for InMemoryBinaryStorage {
    fn exists(&self, location: &FileLocation) -> bool {
        self.files
            .read()
            .is_ok_and(|files| files.contains_key(location))
    }

    fn open(&self, location: &FileLocation) -> Result<ContentStream, DomainError> {
        let files = self.files.read().map_err(|_| {
            DomainError::file_unavailable(location.as_str(), "storage lock poisoned")
        })?;
        let content = files
            .get(location)
            .cloned()
            .ok_or_else(|| DomainError::file_unavailable(location.as_str(), "no such file"))?;
        Ok(Box::new(Cursor::new(content)))
    }
}
