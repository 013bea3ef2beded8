//! Test entropy: deterministic `EntropySource` implementations for tests.

use strongbox_core::entropy::EntropySource;

/// Fills every request with the same byte. Every generated id is identical.
#[derive(Debug, Clone, Copy)]
pub struct FixedEntropy(pub u8);

impl EntropySource for FixedEntropy {
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(self.0);
    }
}

/// Fills each request with the next byte from a predetermined sequence, so
/// consecutive ids differ but are repeatable. Panics if the sequence is
/// exhausted.
#[derive(Debug)]
pub struct SequenceEntropy {
    values: Vec<u8>,
    index: usize,
}

impl SequenceEntropy {
    /// Create a new `SequenceEntropy` with the given values.
    #[must_use]
    pub fn new(values: Vec<u8>) -> Self {
        Self { values, index: 0 }
    }
}

impl EntropySource for SequenceEntropy {
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let val = self.values[self.index];
        self.index += 1;
        dest.fill(val);
    }
}
