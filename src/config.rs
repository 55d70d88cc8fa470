use config::{Config, ConfigError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::code::FecCode;
use crate::error::FecError;

/// Prefix of the environment variables that override file settings,
/// e.g. `SHARDFEC_REQUIRED=4`.
pub const ENV_PREFIX: &str = "SHARDFEC";

pub const DEFAULT_REQUIRED: usize = 3;
pub const DEFAULT_TOTAL: usize = 7;

/// Code parameters, as read from `conf.toml` and the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeConfig {
    /// Shares needed to decode.
    pub required: usize,
    /// Shares written per encoding.
    pub total: usize,
}

impl Default for CodeConfig {
    fn default() -> Self {
        CodeConfig {
            required: DEFAULT_REQUIRED,
            total: DEFAULT_TOTAL,
        }
    }
}

impl CodeConfig {
    /// Loads the defaults, then `path` if given and present, then
    /// `SHARDFEC_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("required", DEFAULT_REQUIRED as i64)?
            .set_default("total", DEFAULT_TOTAL as i64)?;

        if let Some(path) = path {
            debug!("📝 Loading config at path: {:#?}", path);
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?;

        settings.try_deserialize()
    }

    /// Renders this config as a TOML document.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|err| ConfigError::Foreign(Box::new(err)))
    }

    /// Builds the [`FecCode`] these parameters describe.
    ///
    /// # Errors
    ///
    /// [`FecError::InvalidParameters`] unless `1 <= required <= total <= 256`.
    pub fn build(&self) -> Result<FecCode, FecError> {
        FecCode::new(self.required, self.total)
    }
}
