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

//! # Inkx Core Library
//!
//! Plugin host core for text editors. Inkx discovers plugin packages in a
//! plugins directory, loads their code into the editor process, lets each
//! plugin negotiate the actions it offers, and dispatches menu clicks into
//! those actions with the live text surface and document.
//!
//! ## Module Overview
//!
//! - **host::package**: package naming convention and manifest reading
//! - **host::loader**: dynamic library and static entry-point loading
//! - **host::plugin**: the plugin contract and the export macro
//! - **host::registry**: the action registry built during negotiation
//! - **host::dispatch**: invocation of registered actions
//! - **host::manager**: the scan cycle that ties the above together
//! - **editing**: interfaces of the editor UI the host talks to
//! - **config**: host configuration
//! - **errors**: error types
//!
//! ## Feature Flags
//!
//! - `dylib` (default): load plugin packages from dynamic libraries
//!
//! ## Quick Start
//!
//! ```ignore
//! use inkx::{InkHostConfig, InkPluginManager};
//!
//! let mut manager = InkPluginManager::with_dylib_loader(InkHostConfig::default())?;
//! let report = manager.scan()?;
//! for diagnostic in &report.diagnostics {
//!     eprintln!("{}: {}", diagnostic.path.display(), diagnostic.error);
//! }
//!
//! // build the Plugins menu
//! manager.populate_menu(&mut menu);
//!
//! // later, when an item is clicked
//! manager.trigger(handle, &mut focus)?;
//! ```
//!
//! ## Error Handling
//!
//! All operations return `Result<T, InkError>`. No plugin failure is fatal to
//! the host: scan failures drop one package, invocation failures fail one
//! invocation.

pub mod config;
pub mod editing;
pub mod errors;
pub mod host;

pub use config::{
    default_plugin_dir, InkHostConfig, InkHostConfigBuilder, INK_DEFAULT_MANIFEST_FILE,
    INK_DEFAULT_PACKAGE_SUFFIX,
};
pub use editing::{
    InkColor, InkDocument, InkEditingContext, InkFocusProvider, InkMenuSink, InkTextSurface,
};
pub use errors::{InkError, Result};
pub use host::*;
