//! Stream identity and versioning values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entropy::{EntropySource, SystemEntropy};

/// Number of random bytes behind a generated stream identifier.
const STREAM_ID_BYTES: usize = 16;

/// Opaque identifier of one aggregate instance (one stream).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(String);

impl StreamId {
    /// Wraps an existing identifier, e.g. one loaded from storage.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates a fresh identifier from 128 bits of system randomness.
    #[must_use]
    pub fn generate() -> Self {
        Self::generate_with(&mut SystemEntropy)
    }

    /// Generates an identifier from the given entropy source, hex encoded.
    #[must_use]
    pub fn generate_with(entropy: &mut dyn EntropySource) -> Self {
        let mut bytes = [0u8; STREAM_ID_BYTES];
        entropy.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Category tag shared by every stream of one aggregate kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamType(String);

impl StreamType {
    /// Creates a stream type tag.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-stream version counter. Starts at 0 and grows by one per applied event.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StreamSequence(u64);

impl StreamSequence {
    /// The sequence of a stream with no events.
    pub const INITIAL: Self = Self(0);

    /// Creates a sequence value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the next sequence value. The receiver is unchanged.
    #[must_use]
    pub const fn increment(self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw counter.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for StreamSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
