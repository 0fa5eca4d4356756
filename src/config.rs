//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Inkx.
//! The Inkx project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{InkError, Result};

pub const INK_DEFAULT_PACKAGE_SUFFIX: &str = "inkplugin";
pub const INK_DEFAULT_MANIFEST_FILE: &str = "manifest.json";

/// Configuration for the plugin host: where to look for packages, how they
/// are recognised, and which ones to leave alone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InkHostConfig {
    /// Directories scanned in order, non-recursively.
    pub plugin_dirs: Vec<PathBuf>,
    /// Directory name suffix marking a package, without the leading dot.
    pub package_suffix: String,
    /// Manifest file name inside a package directory.
    pub manifest_file: String,
    /// Package ids that are never loaded.
    pub disabled_plugins: Vec<String>,
    /// Whether fixed-contract plugins are accepted.
    pub allow_legacy_plugins: bool,
}

impl Default for InkHostConfig {
    fn default() -> Self {
        InkHostConfig {
            plugin_dirs: vec![default_plugin_dir()],
            package_suffix: INK_DEFAULT_PACKAGE_SUFFIX.to_string(),
            manifest_file: INK_DEFAULT_MANIFEST_FILE.to_string(),
            disabled_plugins: Vec::new(),
            allow_legacy_plugins: true,
        }
    }
}

/// Per-user plugins directory, `<data_dir>/inkx/plugins`.
pub fn default_plugin_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("inkx").join("plugins"))
        .unwrap_or_else(|| PathBuf::from("inkx").join("plugins"))
}

impl InkHostConfig {
    /// Config scanning a single directory, everything else default.
    pub fn with_plugin_dir(dir: impl Into<PathBuf>) -> Self {
        InkHostConfig {
            plugin_dirs: vec![dir.into()],
            ..InkHostConfig::default()
        }
    }

    pub fn is_disabled(&self, plugin_id: &str) -> bool {
        self.disabled_plugins.iter().any(|p| p == plugin_id)
    }

    /// Load a JSON config file. Missing keys take their defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&text)?;
        InkHostConfigBuilder::from_json(&value)
    }

    pub fn validate(&self) -> Result<()> {
        if self.package_suffix.trim().is_empty() {
            return Err(InkError::config("package_suffix must not be empty"));
        }
        if self.package_suffix.starts_with('.') {
            return Err(InkError::config(
                "package_suffix must not start with '.'",
            ));
        }
        if self.manifest_file.trim().is_empty() {
            return Err(InkError::config("manifest_file must not be empty"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InkHostConfigBuilder {
    pub plugin_dirs: Option<Vec<PathBuf>>,
    pub package_suffix: Option<String>,
    pub manifest_file: Option<String>,
    pub disabled_plugins: Option<Vec<String>>,
    pub allow_legacy_plugins: Option<bool>,
}

impl InkHostConfigBuilder {
    pub fn build(self) -> Result<InkHostConfig> {
        let base = InkHostConfig::default();
        let config = InkHostConfig {
            plugin_dirs: self.plugin_dirs.unwrap_or(base.plugin_dirs),
            package_suffix: self.package_suffix.unwrap_or(base.package_suffix),
            manifest_file: self.manifest_file.unwrap_or(base.manifest_file),
            disabled_plugins: self.disabled_plugins.unwrap_or(base.disabled_plugins),
            allow_legacy_plugins: self
                .allow_legacy_plugins
                .unwrap_or(base.allow_legacy_plugins),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(value: &Value) -> Result<InkHostConfig> {
        let builder: InkHostConfigBuilder = serde_json::from_value(value.clone())
            .map_err(|e| InkError::config(format!("invalid host config: {e}")))?;
        builder.build()
    }
}
