// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted tool preferences (`combtool.json`).

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use comb_codec::math::Tolerance;
use comb_codec::{DecodeOptions, DEFAULT_STACK_CEILING};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for preference loading and saving.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed preferences file.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// The platform has no usable config directory.
    #[error("could not resolve config dir")]
    NoConfigDir,
}

/// Saved preferences for `combtool`. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPrefs {
    /// Decoder stack ceiling.
    pub stack_ceiling: usize,
    /// Translation tolerance for the placement identity test.
    pub tolerance_dist: f64,
    /// Tolerance for the remaining matrix terms.
    pub tolerance_perp: f64,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ToolPrefs {
    fn default() -> Self {
        Self {
            stack_ceiling: DEFAULT_STACK_CEILING,
            tolerance_dist: Tolerance::DEFAULT_DIST,
            tolerance_perp: Tolerance::DEFAULT_PERP,
            log_level: "warn".to_owned(),
        }
    }
}

impl ToolPrefs {
    /// `combtool.json` under the user config directory (e.g. `~/.config/combtool`).
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let proj =
            ProjectDirs::from("dev", "flyingrobots", "combtool").ok_or(ConfigError::NoConfigDir)?;
        Ok(proj.config_dir().join("combtool.json"))
    }

    /// Reads `path`; a missing or empty file gives the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read(path) {
            Ok(bytes) if bytes.is_empty() => Ok(Self::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes pretty JSON to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    /// Decoder limits derived from these preferences.
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            stack_ceiling: self.stack_ceiling,
        }
    }

    /// Placement tolerance derived from these preferences.
    pub fn tolerance(&self) -> Tolerance {
        Tolerance::new(self.tolerance_dist, self.tolerance_perp)
    }
}
