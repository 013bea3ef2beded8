//! Domain layer: values, events, commands and the `Attachment` aggregate.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod values;
