//! Entropy source abstraction for stream identifier generation.
//!
//! In production, this wraps the thread-local CSPRNG from `rand`. In tests,
//! a fixed or sequenced implementation is injected so generated identifiers
//! are repeatable.

use rand::RngCore;

/// Abstraction over a source of random bytes.
pub trait EntropySource {
    /// Fill `dest` entirely with random bytes.
    fn fill_bytes(&mut self, dest: &mut [u8]);
}

/// Production entropy backed by `rand`'s OS-seeded CSPRNG.
///
/// Panics if the operating system randomness source fails, which is not
/// recoverable locally.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEntropy;

impl EntropySource for SystemEntropy {
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        rand::rng().fill_bytes(dest);
    }
}
