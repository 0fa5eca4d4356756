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

//! # Inkx Error Module
//!
//! This module defines the error types used throughout the Inkx plugin host.
//!
//! ## Error Categories
//!
//! - **Discovery**: `NotAPackage`, `InvalidManifest`, `DuplicatePackage`
//! - **Loading**: `LoadFailed`, `EntryPointNotFound`
//! - **Negotiation**: `DuplicateLabel`
//! - **Invocation**: `TargetNotFound`, `InvocationThrew`, `UnknownAction`,
//!   `NoEditingFocus`
//! - **Host**: `Lifecycle`, `Config`, `Io`, `Serde`
//!
//! None of these are fatal to the host. Scan errors are contained to the
//! candidate package that raised them, invocation errors to the single
//! invocation.

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience result type used throughout Inkx.
pub type Result<T> = std::result::Result<T, InkError>;

/// Canonical error enumeration for the Inkx host.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum InkError {
    /// Errors originating from filesystem IO.
    #[error("io error: {0}")]
    Io(String),

    /// Wrapper for serde-style serialization issues.
    #[error("serialization error: {0}")]
    Serde(String),

    /// The path is not a plugin package. Callers skip these silently.
    #[error("not a plugin package: {path}")]
    NotAPackage { path: String },

    /// The package exists but its manifest cannot be used.
    #[error("invalid manifest in '{path}': {message}")]
    InvalidManifest { path: String, message: String },

    /// The package code could not be mapped or is not an Inkx plugin.
    #[error("failed to load plugin '{path}': {message}")]
    LoadFailed { path: String, message: String },

    /// The manifest entry point does not name a type in the loaded code.
    #[error("entry point '{entry_point}' not found in plugin '{path}'")]
    EntryPointNotFound { path: String, entry_point: String },

    /// A package with the same id was already loaded from another directory.
    #[error("plugin '{plugin}' already loaded from '{existing}'")]
    DuplicatePackage { plugin: String, existing: String },

    /// A plugin registered the same label twice.
    #[error("plugin '{plugin}' already registered an action labeled '{label}'")]
    DuplicateLabel { plugin: String, label: String },

    /// The registered target no longer resolves on the plugin instance.
    #[error("target '{target}' not found on plugin '{plugin}'")]
    TargetNotFound { plugin: String, target: String },

    /// The plugin target failed or panicked while running.
    #[error("plugin '{plugin}' target '{target}' failed: {message}")]
    InvocationThrew {
        plugin: String,
        target: String,
        message: String,
    },

    /// An action handle does not refer to any registration.
    #[error("unknown action handle #{0}")]
    UnknownAction(usize),

    /// No text surface or document has focus at gesture time.
    #[error("no focused text surface or document")]
    NoEditingFocus,

    /// An operation was attempted in the wrong manager state.
    #[error("lifecycle error: {0}")]
    Lifecycle(String),

    /// Host configuration problems.
    #[error("config error: {0}")]
    Config(String),
}

impl From<io::Error> for InkError {
    fn from(err: io::Error) -> Self {
        InkError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for InkError {
    fn from(err: serde_json::Error) -> Self {
        InkError::Serde(err.to_string())
    }
}

impl InkError {
    /// Helper to construct not-a-package errors.
    pub fn not_a_package(path: impl AsRef<std::path::Path>) -> Self {
        InkError::NotAPackage {
            path: path.as_ref().display().to_string(),
        }
    }

    /// Helper to construct manifest errors.
    pub fn invalid_manifest(
        path: impl AsRef<std::path::Path>,
        message: impl Into<String>,
    ) -> Self {
        InkError::InvalidManifest {
            path: path.as_ref().display().to_string(),
            message: message.into(),
        }
    }

    /// Helper to construct load errors.
    pub fn load_failed(path: impl AsRef<std::path::Path>, message: impl Into<String>) -> Self {
        InkError::LoadFailed {
            path: path.as_ref().display().to_string(),
            message: message.into(),
        }
    }

    pub fn entry_point_not_found(
        path: impl AsRef<std::path::Path>,
        entry_point: impl Into<String>,
    ) -> Self {
        InkError::EntryPointNotFound {
            path: path.as_ref().display().to_string(),
            entry_point: entry_point.into(),
        }
    }

    pub fn target_not_found(plugin: impl Into<String>, target: impl Into<String>) -> Self {
        InkError::TargetNotFound {
            plugin: plugin.into(),
            target: target.into(),
        }
    }

    pub fn invocation_threw(
        plugin: impl Into<String>,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        InkError::InvocationThrew {
            plugin: plugin.into(),
            target: target.into(),
            message: message.into(),
        }
    }

    /// Helper to construct lifecycle errors.
    pub fn lifecycle<T: Into<String>>(message: T) -> Self {
        InkError::Lifecycle(message.into())
    }

    /// Helper to construct config errors.
    pub fn config<T: Into<String>>(message: T) -> Self {
        InkError::Config(message.into())
    }

    /// Errors the scanner drops without any diagnostic.
    pub fn is_silent(&self) -> bool {
        matches!(self, InkError::NotAPackage { .. })
    }
}
