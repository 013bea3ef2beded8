//! Shared test doubles and utilities for Strongbox.

mod entropy;
mod repository;
mod storage;

pub use entropy::{FixedEntropy, SequenceEntropy};
pub use repository::{
    EmptyEventRepository, FailingEventRepository, InMemoryEventRepository,
    RecordingEventRepository,
};
pub use storage::InMemoryBinaryStorage;
