//! Config layer: TOML schema + validated in-memory structures.
//!
//! Kept apart from ingestion and rendering. It owns the constants that the
//! capacity and power models are built from.

pub mod settings;

pub use settings::{DisplaySettings, RawConfig, ValidatedConfig};
