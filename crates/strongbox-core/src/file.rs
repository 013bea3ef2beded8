//! Optional file attachments carried by event envelopes.
//!
//! The core never reads file contents itself. A [`FileReference`] only knows
//! where content lives; probing and opening is delegated to a
//! [`BinaryStorage`] collaborator at call time.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Location of binary content inside a storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileLocation(String);

impl FileLocation {
    /// Wraps a location string, typically a file path.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the location as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A readable byte stream positioned at the start of the content.
pub type ContentStream = Box<dyn Read + Send>;

/// Resolves file locations to readable content.
pub trait BinaryStorage: Send + Sync {
    /// Whether readable content exists at `location` right now.
    fn exists(&self, location: &FileLocation) -> bool;

    /// Opens the content at `location`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::FileUnavailable` if the content cannot be read.
    fn open(&self, location: &FileLocation) -> Result<ContentStream, DomainError>;
}

/// Optional attachment descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FileReference {
    /// No file is attached.
    #[default]
    Absent,
    /// A file is attached at the given location.
    Present(FileLocation),
}

impl FileReference {
    /// Builds a reference from an optional location.
    #[must_use]
    pub fn from_location(location: Option<FileLocation>) -> Self {
        location.map_or(Self::Absent, Self::Present)
    }

    /// The attached location, if any.
    #[must_use]
    pub fn location(&self) -> Option<&FileLocation> {
        match self {
            Self::Absent => None,
            Self::Present(location) => Some(location),
        }
    }

    /// Whether a file is attached and currently present in `storage`.
    /// Always false for `Absent`.
    #[must_use]
    pub fn exists(&self, storage: &dyn BinaryStorage) -> bool {
        match self {
            Self::Absent => false,
            Self::Present(location) => storage.exists(location),
        }
    }

    /// Opens the attached content.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::FileUnavailable` for `Absent`, or when `storage`
    /// cannot open the location.
    pub fn open_stream(&self, storage: &dyn BinaryStorage) -> Result<ContentStream, DomainError> {
        match self {
            Self::Absent => Err(DomainError::file_unavailable(
                "<absent>",
                "no file is attached to this event",
            )),
            Self::Present(location) => storage.open(location),
        }
    }
}

/// Storage collaborator backed by the local filesystem.
///
/// Relative locations are resolved against `root`; absolute locations are
/// used as-is.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    /// Creates a storage rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory relative locations are resolved against.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, location: &FileLocation) -> PathBuf {
        let path = Path::new(location.as_str());
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl BinaryStorage for LocalFileStorage {
    fn exists(&self, location: &FileLocation) -> bool {
        self.resolve(location).is_file()
    }

    fn open(&self, location: &FileLocation) -> Result<ContentStream, DomainError> {
        let path = self.resolve(location);
        let unavailable = |e: std::io::Error| {
            tracing::warn!(location = %location, error = %e, "attached file could not be opened");
            DomainError::file_unavailable(location.as_str(), e.to_string())
        };
        let file = File::open(&path).map_err(unavailable)?;
        if !file.metadata().map_err(unavailable)?.is_file() {
            tracing::warn!(location = %location, "attached location is not a regular file");
            return Err(DomainError::file_unavailable(
                location.as_str(),
                "not a regular file",
            ));
        }
        Ok(Box::new(BufReader::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_never_exists() {
        let storage = LocalFileStorage::new(std::env::temp_dir());

        assert!(!FileReference::Absent.exists(&storage));
        assert!(FileReference::Absent.location().is_none());
    }

    #[test]
    fn test_absent_open_stream_fails_with_file_unavailable() {
        let storage = LocalFileStorage::new(std::env::temp_dir());

        let result = FileReference::Absent.open_stream(&storage);

        match result {
            Err(DomainError::FileUnavailable { location, .. }) => assert_eq!(location, "<absent>"),
            Err(other) => panic!("expected FileUnavailable, got {other:?}"),
            Ok(_) => panic!("expected FileUnavailable, got a stream"),
        }
    }

    #[test]
    fn test_present_reads_content_from_start() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("example.pdf.tmp"), b"%PDF-1.7").unwrap();
        let storage = LocalFileStorage::new(dir.path());
        let reference = FileReference::Present(FileLocation::new("example.pdf.tmp"));

        assert!(reference.exists(&storage));
        let mut content = Vec::new();
        reference
            .open_stream(&storage)
            .unwrap()
            .read_to_end(&mut content)
            .unwrap();

        assert_eq!(content, b"%PDF-1.7");
    }

    #[test]
    fn test_present_exists_reflects_storage_at_query_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.bin");
        let storage = LocalFileStorage::new(dir.path());
        let reference = FileReference::Present(FileLocation::new(path.to_string_lossy()));

        assert!(!reference.exists(&storage));
        std::fs::write(&path, b"late").unwrap();
        assert!(reference.exists(&storage));
    }

    #[test]
    fn test_present_missing_file_fails_with_file_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());
        let reference = FileReference::Present(FileLocation::new("missing.pdf"));

        let result = reference.open_stream(&storage);

        assert!(matches!(result, Err(DomainError::FileUnavailable { .. })));
    }

    #[test]
    fn test_present_directory_fails_with_file_unavailable() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let storage = LocalFileStorage::new(dir.path());
        let reference = FileReference::Present(FileLocation::new("sub"));

        // Act
        let result = reference.open_stream(&storage);

        // Assert
        assert!(!reference.exists(&storage));
        match result {
            Err(DomainError::FileUnavailable { location, reason }) => {
                assert_eq!(location, "sub");
                assert_eq!(reason, "not a regular file");
            }
            Err(other) => panic!("expected FileUnavailable, got {other:?}"),
            Ok(_) => panic!("expected FileUnavailable, got a stream"),
        }
    }

    #[test]
    fn test_from_location_maps_none_to_absent() {
        assert_eq!(FileReference::from_location(None), FileReference::Absent);
        assert_eq!(
            FileReference::from_location(Some(FileLocation::new("/tmp/a"))),
            FileReference::Present(FileLocation::new("/tmp/a"))
        );
    }
}
