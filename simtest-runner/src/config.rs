// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for simtest.
//!
//! Configuration is layered: the defaults in `default-config.toml` come first, and a repository
//! config (`.config/simtest.toml` under the discovery root, or a file passed in explicitly) is
//! merged on top of them.

use crate::{
    classifier::SubstringClassifier,
    errors::{ConfigParseError, ConfigParseErrorKind},
};
use camino::Utf8Path;
use config::{Config, ConfigBuilder, File, FileFormat, builder::DefaultState};
use serde::Deserialize;

/// Overall configuration for simtest.
#[derive(Clone, Debug)]
pub struct SimtestConfig {
    discovery: DiscoveryConfig,
    execution: ExecutionConfig,
}

impl SimtestConfig {
    /// The location of the repository config, relative to the discovery root.
    pub const CONFIG_PATH: &'static str = ".config/simtest.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Repository-specific configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the config from the given file, or if not specified from `.config/simtest.toml` under
    /// the given root.
    ///
    /// An explicitly specified file must exist. If no file is specified and the root has no
    /// `.config/simtest.toml`, the default config is used.
    pub fn from_sources(
        root: &Utf8Path,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = root.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config().add_source(source);
        Self::build(&config_file, builder)
    }

    /// Returns the discovery section of the config.
    pub fn discovery(&self) -> &DiscoveryConfig {
        &self.discovery
    }

    /// Returns the execution section of the config.
    pub fn execution(&self) -> &ExecutionConfig {
        &self.execution
    }

    /// Builds a path classifier from the discovery section.
    pub fn classifier(&self) -> SubstringClassifier {
        SubstringClassifier::new(
            self.discovery.blacklist.iter().cloned(),
            self.discovery.ancestor_segment.clone(),
            self.discovery.entry_point.clone(),
        )
    }

    // ---
    // Helper methods
    // ---

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn build(
        config_file: &Utf8Path,
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<Self, ConfigParseError> {
        let to_parse_error =
            |kind: ConfigParseErrorKind| ConfigParseError::new(config_file, kind);

        let deserialized: SimtestConfigDeserialize = builder
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|err| to_parse_error(ConfigParseErrorKind::BuildError(Box::new(err))))?;

        deserialized.into_config().map_err(to_parse_error)
    }
}

impl Default for SimtestConfig {
    fn default() -> Self {
        Self::build(
            Utf8Path::new("<default config>"),
            Self::make_default_config(),
        )
        .expect("default config should be valid")
    }
}

/// Settings that control which files are collected as tests.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DiscoveryConfig {
    /// The file name that marks a directory as containing a test.
    pub entry_point: String,

    /// A string that must appear somewhere in a test's path.
    pub ancestor_segment: String,

    /// Path prefixes excluded from collection.
    pub blacklist: Vec<String>,
}

/// Settings that control how tests are launched and judged.
#[derive(Clone, Debug)]
pub struct ExecutionConfig {
    launcher: Vec<String>,
    success_marker: String,
}

impl ExecutionConfig {
    /// Returns the launcher program followed by its arguments.
    ///
    /// This is guaranteed to be non-empty.
    pub fn launcher(&self) -> &[String] {
        &self.launcher
    }

    /// Returns the success marker a test must print to pass.
    pub fn success_marker(&self) -> &str {
        &self.success_marker
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct SimtestConfigDeserialize {
    discovery: DiscoveryConfig,
    execution: ExecutionConfigDeserialize,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ExecutionConfigDeserialize {
    launcher: String,
    success_marker: String,
}

impl SimtestConfigDeserialize {
    fn into_config(self) -> Result<SimtestConfig, ConfigParseErrorKind> {
        if self.discovery.entry_point.is_empty() {
            return Err(ConfigParseErrorKind::EmptyValue {
                key: "discovery.entry-point",
            });
        }
        if self.execution.success_marker.is_empty() {
            return Err(ConfigParseErrorKind::EmptyValue {
                key: "execution.success-marker",
            });
        }

        let launcher = shell_words::split(&self.execution.launcher).map_err(|err| {
            ConfigParseErrorKind::InvalidLauncher {
                launcher: self.execution.launcher.clone(),
                err,
            }
        })?;
        if launcher.is_empty() {
            return Err(ConfigParseErrorKind::EmptyValue {
                key: "execution.launcher",
            });
        }

        Ok(SimtestConfig {
            discovery: self.discovery,
            execution: ExecutionConfig {
                launcher,
                success_marker: self.execution.success_marker,
            },
        })
    }
}
