//! Strongbox Core: event-sourced aggregate primitives.
//!
//! This crate defines how an aggregate records its changes as versioned
//! envelopes, buffers them for persistence, and is rebuilt by replaying its
//! history. Persistence and binary storage are collaborators behind traits.

pub mod aggregate;
pub mod command;
pub mod config;
pub mod entropy;
pub mod envelope;
pub mod error;
pub mod event;
pub mod file;
pub mod identity;
pub mod payload;
pub mod repository;
pub mod stream;
pub mod telemetry;
