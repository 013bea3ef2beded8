//! Value types describing an attachment's file.

use std::fmt;

use serde::Serialize;
use strongbox_core::error::DomainError;

/// Display name of an attachment, e.g. `An example PDF`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FileName(String);

impl FileName {
    /// Creates a file name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the name is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::Validation("file name must not be blank".to_owned()));
        }
        Ok(Self(value))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Media type of the content, e.g. `application/x-pdf`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MimeType(String);

impl MimeType {
    /// Creates a media type.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` unless the value has the form
    /// `type/subtype`.
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let well_formed = value
            .split_once('/')
            .is_some_and(|(kind, sub)| !kind.trim().is_empty() && !sub.trim().is_empty());
        if !well_formed {
            return Err(DomainError::Validation(format!(
                "mime type must look like type/subtype, got {value:?}"
            )));
        }
        Ok(Self(value))
    }

    /// Returns the media type as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content length in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FileSize(u64);

impl FileSize {
    /// Largest size that still fits a signed payload integer.
    pub const MAX: Self = Self(i64::MAX.unsigned_abs());

    /// Creates a size.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `bytes` exceeds [`FileSize::MAX`].
    pub fn new(bytes: u64) -> Result<Self, DomainError> {
        if bytes > Self::MAX.0 {
            return Err(DomainError::Validation(format!(
                "file size {bytes} exceeds the maximum of {}",
                Self::MAX.0
            )));
        }
        Ok(Self(bytes))
    }

    /// Creates a size from a payload integer.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `bytes` is negative.
    pub fn from_signed(bytes: i64) -> Result<Self, DomainError> {
        u64::try_from(bytes)
            .map(Self)
            .map_err(|_| DomainError::Validation(format!("file size must not be negative, got {bytes}")))
    }

    /// Returns the size in bytes.
    #[must_use]
    pub fn bytes(self) -> u64 {
        self.0
    }

    /// Returns the size as a payload integer. Lossless for every valid size.
    #[must_use]
    pub fn to_signed(self) -> i64 {
        i64::try_from(self.0).unwrap_or(i64::MAX)
    }
}

impl fmt::Display for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes", self.0)
    }
}
