//! Configuration models and layered config loading.
//!
//! This crate owns the Sisa config schema, validation, and layer-merging
//! logic used by both the server and the routing engine. The router keyword
//! tables, the per-destination daily-cost table, and the support
//! vocabularies all live here as overridable defaults.

mod error;
mod loader;
mod model;

/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// Layered config types and loader options.
pub use loader::{ConfigLayer, ConfigLayerSource, LayeredConfig, LayeredConfigOptions};
/// Configuration schema models.
pub use model::*;
