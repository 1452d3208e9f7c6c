//! Layered configuration loader.
//!
//! Discovers configuration layers (user/cwd/runtime), merges them in
//! precedence order, and produces a final `SisaConfig`.

mod merge;

#[cfg(test)]
mod tests;

use crate::{ConfigError, SisaConfig};
use directories::UserDirs;
use log::{debug, info};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config filename in local layers.
const DEFAULT_CONFIG_FILE: &str = "sisa.json5";
/// Default config directory under the user's home.
const DEFAULT_CONFIG_DIR: &str = ".sisa";

/// Effective config plus metadata about which layers were loaded.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// The merged, validated config.
    pub config: SisaConfig,
    /// Metadata for each layer merged during load.
    pub layers: Vec<ConfigLayer>,
}

/// Origin for a single config layer in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// User-specific configuration under the home directory.
    User,
    /// Current working directory configuration.
    Cwd,
    /// Runtime overrides (highest precedence).
    Runtime,
}

/// Metadata about a loaded config layer.
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    /// Layer origin (user, cwd, runtime).
    pub source: ConfigLayerSource,
    /// Location on disk.
    pub path: PathBuf,
}

/// Options controlling layered config discovery and overrides.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Working directory used to resolve the cwd layer.
    pub cwd: PathBuf,
    /// Optional user config path (defaults to `~/.sisa/sisa.json5`).
    pub user_config_path: Option<PathBuf>,
    /// Runtime override config paths applied last.
    pub runtime_paths: Vec<PathBuf>,
}

impl LayeredConfigOptions {
    /// Create options with default layer locations for the provided cwd.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            user_config_path: default_user_config_path(),
            runtime_paths: Vec::new(),
        }
    }

    /// Add a runtime override config path that is applied last.
    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }
}

impl SisaConfig {
    /// Load a single config from a path (no layering).
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        info!("loading config from path: {}", path.as_ref().display());
        let contents = fs::read_to_string(path)?;
        Self::load_from_str(&contents)
    }

    /// Load a single config from JSON5 contents (no layering).
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        let value: Value = json5::from_str(contents)?;
        config_from_value(value)
    }

    /// Load a layered config stack using the default layer locations.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        info!(
            "loading layered config with defaults (cwd={})",
            cwd.as_ref().display()
        );
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load a layered config stack using explicit layer locations.
    ///
    /// Layer precedence (low -> high): user, cwd, runtime overrides.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let mut layers = Vec::new();
        let mut merged = Value::Object(serde_json::Map::new());

        let user_layer = options
            .user_config_path
            .as_deref()
            .filter(|path| path.exists())
            .map(|path| (ConfigLayerSource::User, path.to_path_buf()));
        let cwd_path = options.cwd.join(DEFAULT_CONFIG_FILE);
        let cwd_layer = cwd_path
            .exists()
            .then(|| (ConfigLayerSource::Cwd, cwd_path));
        let runtime_layers = options
            .runtime_paths
            .iter()
            .map(|path| (ConfigLayerSource::Runtime, path.clone()));

        for (source, path) in user_layer.into_iter().chain(cwd_layer).chain(runtime_layers) {
            debug!(
                "loading config layer (source={:?}, path={})",
                source,
                path.display()
            );
            let contents = fs::read_to_string(&path)?;
            let value: Value = json5::from_str(&contents)?;
            merge::merge_json_values(&mut merged, &value);
            layers.push(ConfigLayer { source, path });
        }

        let config = config_from_value(merged)?;
        info!("layered config loaded (layers={})", layers.len());
        Ok(LayeredConfig { config, layers })
    }

    /// Validate configuration invariants that cannot be expressed in serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for rule in &self.router.rules {
            if rule.keywords.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "router rule for {} has no keywords",
                    rule.agent
                )));
            }
        }
        if self.recommendations.max_results == 0 {
            return Err(ConfigError::Invalid(
                "recommendations.max_results must be at least 1".to_string(),
            ));
        }
        if self.recommendations.low_budget_ceiling > self.recommendations.medium_budget_ceiling {
            return Err(ConfigError::Invalid(
                "recommendations budget ceilings must be ordered low <= medium".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.support.resolve_threshold)
            || !(0.0..=1.0).contains(&self.support.confidence_cap)
        {
            return Err(ConfigError::Invalid(
                "support confidence bounds must lie in [0, 1]".to_string(),
            ));
        }
        if self
            .support
            .categories
            .iter()
            .all(|rule| !rule.keywords.is_empty())
        {
            return Err(ConfigError::Invalid(
                "support.categories requires a catch-all category with no keywords".to_string(),
            ));
        }
        Ok(())
    }
}

fn config_from_value(value: Value) -> Result<SisaConfig, ConfigError> {
    let config: SisaConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}

/// Default user config path under the home directory.
fn default_user_config_path() -> Option<PathBuf> {
    UserDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(DEFAULT_CONFIG_DIR)
            .join(DEFAULT_CONFIG_FILE)
    })
}
