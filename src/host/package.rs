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

//! # Bundle Descriptor Reader
//!
//! A plugin package is a directory named `<Id>.<suffix>` (default suffix
//! `inkplugin`) containing a JSON manifest:
//!
//! ```text
//! MarkYellow.inkplugin/
//! ├── manifest.json      {"entry_point": "MarkYellow", "version": "1.0.0"}
//! └── libMarkYellow.so
//! ```
//!
//! Anything else in the plugins directory is not a package and is skipped
//! without comment.

use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::InkHostConfig;
use crate::errors::{InkError, Result};

/// Plugin version information.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InkPluginVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub pre_release: Option<String>,
}

impl InkPluginVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        InkPluginVersion {
            major,
            minor,
            patch,
            pre_release: None,
        }
    }

    pub fn parse(version_str: &str) -> std::result::Result<Self, String> {
        let parts: Vec<&str> = version_str.trim().splitn(3, '.').collect();
        if parts.len() < 3 {
            return Err("invalid version format, expected major.minor.patch".to_string());
        }

        let major = parts[0]
            .parse::<u32>()
            .map_err(|_| format!("invalid major version '{}'", parts[0]))?;
        let minor = parts[1]
            .parse::<u32>()
            .map_err(|_| format!("invalid minor version '{}'", parts[1]))?;

        let (patch_str, pre_release) = match parts[2].split_once('-') {
            Some((patch, pre)) if !pre.is_empty() => (patch, Some(pre.to_string())),
            Some((patch, _)) => (patch, None),
            None => (parts[2], None),
        };
        let patch = patch_str
            .parse::<u32>()
            .map_err(|_| format!("invalid patch version '{}'", patch_str))?;

        Ok(InkPluginVersion {
            major,
            minor,
            patch,
            pre_release,
        })
    }
}

impl Default for InkPluginVersion {
    fn default() -> Self {
        InkPluginVersion::new(1, 0, 0)
    }
}

impl fmt::Display for InkPluginVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pre_release {
            Some(pre) => write!(f, "{}.{}.{}-{}", self.major, self.minor, self.patch, pre),
            None => write!(f, "{}.{}.{}", self.major, self.minor, self.patch),
        }
    }
}

/// Everything the host knows about a package before touching its code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InkPackageDescriptor {
    /// Package directory.
    pub path: PathBuf,
    /// Directory stem, e.g. `MarkYellow` for `MarkYellow.inkplugin`.
    pub id: String,
    /// Human readable name, defaults to `id`.
    pub name: String,
    pub version: InkPluginVersion,
    /// Manifest-declared entry-point type name.
    pub entry_point: String,
    /// Code artifact file name, relative to `path`.
    pub library: String,
    /// ABI version the manifest claims to target, if any.
    pub abi_version: Option<u32>,
    pub description: Option<String>,
}

impl InkPackageDescriptor {
    pub fn library_path(&self) -> PathBuf {
        self.path.join(&self.library)
    }
}

/// Platform file name of a package's code artifact when the manifest does
/// not name one, e.g. `libMarkYellow.so` or `MarkYellow.dll`.
pub fn default_library_name(id: &str) -> String {
    format!("{DLL_PREFIX}{id}{DLL_SUFFIX}")
}

#[derive(Debug, Deserialize)]
struct InkManifestFile {
    #[serde(default)]
    entry_point: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    library: Option<String>,
    #[serde(default)]
    abi_version: Option<u32>,
    #[serde(default)]
    description: Option<String>,
}

impl InkManifestFile {
    fn into_descriptor(self, path: &Path, manifest_path: &Path, id: &str) -> Result<InkPackageDescriptor> {
        let entry_point = self
            .entry_point
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| InkError::invalid_manifest(manifest_path, "missing 'entry_point'"))?;

        let version = match self.version {
            Some(v) => InkPluginVersion::parse(&v)
                .map_err(|e| InkError::invalid_manifest(manifest_path, e))?,
            None => InkPluginVersion::default(),
        };

        let library = match self.library {
            Some(lib) if lib.trim().is_empty() => {
                return Err(InkError::invalid_manifest(manifest_path, "empty 'library'"));
            }
            Some(lib) => lib,
            None => default_library_name(id),
        };

        Ok(InkPackageDescriptor {
            path: path.to_path_buf(),
            id: id.to_string(),
            name: self.name.unwrap_or_else(|| id.to_string()),
            version,
            entry_point,
            library,
            abi_version: self.abi_version,
            description: self.description,
        })
    }
}

/// Reads package descriptors according to the host's naming convention.
#[derive(Clone, Debug)]
pub struct InkPackageReader {
    suffix: String,
    manifest_file: String,
}

impl Default for InkPackageReader {
    fn default() -> Self {
        InkPackageReader::from_config(&InkHostConfig::default())
    }
}

impl InkPackageReader {
    pub fn new(suffix: impl Into<String>, manifest_file: impl Into<String>) -> Self {
        InkPackageReader {
            suffix: suffix.into(),
            manifest_file: manifest_file.into(),
        }
    }

    pub fn from_config(config: &InkHostConfig) -> Self {
        InkPackageReader::new(config.package_suffix.clone(), config.manifest_file.clone())
    }

    /// Package id for a path that follows the naming convention.
    pub fn package_id(&self, path: &Path) -> Option<String> {
        let ext = path.extension()?.to_str()?;
        if ext != self.suffix {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        if stem.is_empty() || stem.starts_with('.') {
            return None;
        }
        Some(stem.to_string())
    }

    /// Read the descriptor of the package at `path`.
    ///
    /// Returns [`InkError::NotAPackage`] when the path is not a directory, does
    /// not carry the package suffix, or holds no manifest. A manifest that
    /// exists but cannot be used yields [`InkError::InvalidManifest`].
    pub fn read(&self, path: &Path) -> Result<InkPackageDescriptor> {
        if !path.is_dir() {
            return Err(InkError::not_a_package(path));
        }
        let id = self
            .package_id(path)
            .ok_or_else(|| InkError::not_a_package(path))?;

        let manifest_path = path.join(&self.manifest_file);
        if !manifest_path.is_file() {
            return Err(InkError::not_a_package(path));
        }

        let text = fs::read_to_string(&manifest_path)
            .map_err(|e| InkError::invalid_manifest(&manifest_path, e.to_string()))?;
        let file: InkManifestFile = serde_json::from_str(&text)
            .map_err(|e| InkError::invalid_manifest(&manifest_path, e.to_string()))?;
        file.into_descriptor(path, &manifest_path, &id)
    }
}
