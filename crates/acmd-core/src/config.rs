// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Registry configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{ModuleError, Result};

/// Environment variable naming a TOML configuration file.
pub const CONFIG_ENV: &str = "ACMD_CONFIG";

/// Prefix of environment variables overriding single settings.
pub const ENV_PREFIX: &str = "ACMD_";

/// What happens to callers still waiting on a definition when the
/// registry is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrphanPolicy {
    /// The caller's future never settles
    #[default]
    Pending,
    /// The caller's future fails with [`ModuleError::Abandoned`]
    Reject,
}

/// What happens when `define` targets a key that is already registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Redefinition {
    /// The new definition replaces the old one under that key
    #[default]
    Shadow,
    /// The definition fails with a configuration error
    Reject,
}

/// Configuration for a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RegistryConfig {
    /// Separator between a module name and its version in a module id
    pub version_separator: String,

    /// Fate of waiters orphaned by `clear()`
    pub orphaned_waiters: OrphanPolicy,

    /// Behavior on repeated definitions under the same key
    pub redefinition: Redefinition,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            version_separator: "#".to_string(),
            orphaned_waiters: OrphanPolicy::Pending,
            redefinition: Redefinition::Shadow,
        }
    }
}

impl RegistryConfig {
    /// Load configuration from the default locations.
    ///
    /// Defaults, then the TOML file named by `ACMD_CONFIG`, then
    /// `ACMD_*` environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_vars(std::env::vars())?;
        Ok(config)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ModuleError::configuration(format!("invalid registry config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ModuleError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        debug!("Loaded registry config from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Build configuration from defaults plus the current environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Build configuration from defaults plus `ACMD_*` variables.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        config.apply_vars(vars)?;
        Ok(config)
    }

    fn apply_vars<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(setting) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            if setting == "CONFIG" {
                continue;
            }
            let setting = setting.to_lowercase().replace('_', "-");
            self.set(&setting, value.as_ref())?;
        }
        self.validate()
    }

    /// Set a configuration value by its kebab-case key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "version-separator" => self.version_separator = value.to_string(),
            "orphaned-waiters" => {
                self.orphaned_waiters = match value {
                    "pending" => OrphanPolicy::Pending,
                    "reject" => OrphanPolicy::Reject,
                    other => {
                        return Err(ModuleError::configuration(format!(
                            "orphaned-waiters must be 'pending' or 'reject', got '{other}'"
                        )));
                    }
                }
            }
            "redefinition" => {
                self.redefinition = match value {
                    "shadow" => Redefinition::Shadow,
                    "reject" => Redefinition::Reject,
                    other => {
                        return Err(ModuleError::configuration(format!(
                            "redefinition must be 'shadow' or 'reject', got '{other}'"
                        )));
                    }
                }
            }
            other => {
                return Err(ModuleError::configuration(format!(
                    "unknown registry setting '{other}'"
                )));
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.version_separator.is_empty() {
            return Err(ModuleError::configuration(
                "version-separator must not be empty",
            ));
        }
        Ok(())
    }
}
