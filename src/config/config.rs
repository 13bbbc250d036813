// Copyright (C) 2024 Bellande Architecture Mechanism Research Innovation Center, Ronaldson Bellande

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "cosmo.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Prefix prepended to invoked macro commands before dispatch.
    pub prefix: String,
    pub interp_timeout_secs: f64,
    pub macro_timeout_secs: f64,
    pub script_extension: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            prefix: "$c ".to_string(),
            interp_timeout_secs: 5.0,
            macro_timeout_secs: 30.0,
            script_extension: "cosmo".to_string(),
        }
    }
}

impl Config {
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loading config");
        Self::from_toml(&text, path)
    }

    /// Loads the explicit path if given, else `cosmo.toml` when it exists,
    /// else the defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Saturates instead of panicking on values [`Config::validate`] rejects.
    pub fn interp_timeout(&self) -> Duration {
        saturating_secs(self.interp_timeout_secs)
    }

    pub fn macro_timeout(&self) -> Duration {
        saturating_secs(self.macro_timeout_secs)
    }

    /// Checked by [`Config::from_toml`] and by every consumer that turns the
    /// timeouts into durations, since the fields can be set directly.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("interp_timeout_secs", self.interp_timeout_secs),
            ("macro_timeout_secs", self.macro_timeout_secs),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{} must be a positive number of seconds, got {}",
                    name, value
                )));
            }
            if Duration::try_from_secs_f64(value).is_err() {
                return Err(ConfigError::Invalid(format!(
                    "{} is too large, got {}",
                    name, value
                )));
            }
        }
        if self.script_extension.is_empty() {
            return Err(ConfigError::Invalid(
                "script_extension must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn saturating_secs(seconds: f64) -> Duration {
    if seconds.is_nan() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
}
