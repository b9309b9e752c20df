//! Augmenta Settings Library
//!
//! This library provides the settings model and store behind the
//! `augmenta-settings` editor. It can be used both as a binary and as a
//! library for testing or for embedding in another front end.

pub mod config;

// Re-export commonly used types for convenience
pub use config::{
    ConfigDocument, ConfigStore, Example, FieldSpec, FieldType, FieldValue, LoadOrigin,
    LoadOutcome, OrderedMap,
};
