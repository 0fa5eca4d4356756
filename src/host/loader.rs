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

//! # Dynamic Loader Module
//!
//! Turns a package descriptor into an [`InkLoadedModule`]: the package code
//! mapped into the process and its entry-point constructor resolved by name.
//!
//! ## Backends
//!
//! - [`InkDylibLoader`]: maps the package's dynamic library with
//!   `libloading` and reads its exported [`InkPluginDeclaration`]
//! - [`InkStaticLoader`]: declarations linked into the host binary, keyed by
//!   the library name a manifest refers to
//!
//! Loaded libraries are never unloaded. The dylib backend leaks each
//! `Library` so that plugin vtables and closures stay valid for the rest of
//! the process.

use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::errors::{InkError, Result};
use crate::host::package::InkPackageDescriptor;
use crate::host::panic_message;
use crate::host::plugin::{
    InkEntryConstructor, InkEntryPoints, InkPluginDeclaration, InkPluginObject,
    INK_CORE_VERSION, INK_PLUGIN_ABI_VERSION,
};

/// A package whose code is resident and whose entry point resolved.
pub struct InkLoadedModule {
    descriptor: InkPackageDescriptor,
    constructor: InkEntryConstructor,
    core_version: String,
    #[cfg(feature = "dylib")]
    library: Option<&'static libloading::Library>,
}

impl InkLoadedModule {
    fn resolve(descriptor: &InkPackageDescriptor, declaration: &InkPluginDeclaration) -> Result<Self> {
        let constructor = resolve_entry_point(descriptor, declaration)?;
        Ok(InkLoadedModule {
            descriptor: descriptor.clone(),
            constructor,
            core_version: declaration.core_version.to_string(),
            #[cfg(feature = "dylib")]
            library: None,
        })
    }

    pub fn descriptor(&self) -> &InkPackageDescriptor {
        &self.descriptor
    }

    /// Inkx version the plugin library was built against.
    pub fn core_version(&self) -> &str {
        &self.core_version
    }

    pub fn is_dynamic(&self) -> bool {
        #[cfg(feature = "dylib")]
        {
            self.library.is_some()
        }
        #[cfg(not(feature = "dylib"))]
        {
            false
        }
    }

    /// Run the entry-point constructor.
    pub fn instantiate(&self) -> anyhow::Result<InkPluginObject> {
        (self.constructor)()
    }
}

impl fmt::Debug for InkLoadedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InkLoadedModule")
            .field("plugin", &self.descriptor.id)
            .field("entry_point", &self.descriptor.entry_point)
            .field("core_version", &self.core_version)
            .field("dynamic", &self.is_dynamic())
            .finish()
    }
}

/// Loads package code and resolves the manifest's entry point.
pub trait InkModuleLoader {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Fails with [`InkError::LoadFailed`] when the code cannot be mapped or
    /// is not an Inkx plugin, and with [`InkError::EntryPointNotFound`] when
    /// the entry point is not among the library's declared types.
    fn load(&self, descriptor: &InkPackageDescriptor) -> Result<InkLoadedModule>;
}

fn resolve_entry_point(
    descriptor: &InkPackageDescriptor,
    declaration: &InkPluginDeclaration,
) -> Result<InkEntryConstructor> {
    if declaration.abi_version != INK_PLUGIN_ABI_VERSION {
        return Err(InkError::load_failed(
            &descriptor.path,
            format!(
                "plugin ABI version {} does not match host ABI version {}",
                declaration.abi_version, INK_PLUGIN_ABI_VERSION
            ),
        ));
    }
    if let Some(declared) = descriptor.abi_version {
        if declared != INK_PLUGIN_ABI_VERSION {
            return Err(InkError::load_failed(
                &descriptor.path,
                format!(
                    "manifest targets ABI version {} but host speaks {}",
                    declared, INK_PLUGIN_ABI_VERSION
                ),
            ));
        }
    }
    if declaration.core_version != INK_CORE_VERSION {
        log::warn!(
            "host.loader.core_version_mismatch: plugin built against a different core version - plugin={}, plugin_core={}, host_core={}",
            descriptor.id,
            declaration.core_version,
            INK_CORE_VERSION
        );
    }

    // Catches hand-written registration functions linked into the host.
    let points: InkEntryPoints = catch_unwind(AssertUnwindSafe(|| declaration.entry_points()))
        .map_err(|payload| {
            InkError::load_failed(
                &descriptor.path,
                format!("entry-point registration panicked: {}", panic_message(payload.as_ref())),
            )
        })?;

    points.resolve(&descriptor.entry_point).ok_or_else(|| {
        log::debug!(
            "host.loader.entry_points: declared entry points - plugin={}, available={:?}",
            descriptor.id,
            points.names()
        );
        InkError::entry_point_not_found(&descriptor.path, descriptor.entry_point.clone())
    })
}

/// Declarations linked into the host, looked up by the manifest's library
/// name. Built-in plugins and tests load through this backend.
#[derive(Debug, Default)]
pub struct InkStaticLoader {
    libraries: HashMap<String, InkPluginDeclaration>,
}

impl InkStaticLoader {
    pub fn new() -> Self {
        InkStaticLoader::default()
    }

    /// Make `declaration` available under the artifact name `library`.
    pub fn with_library(mut self, library: impl Into<String>, declaration: &InkPluginDeclaration) -> Self {
        self.add_library(library, declaration);
        self
    }

    /// Shorthand for a declaration at the host's own ABI and core version.
    pub fn with_entry_points(
        self,
        library: impl Into<String>,
        register: fn(&mut InkEntryPoints),
    ) -> Self {
        let declaration = InkPluginDeclaration {
            abi_version: INK_PLUGIN_ABI_VERSION,
            core_version: INK_CORE_VERSION,
            register,
        };
        self.with_library(library, &declaration)
    }

    pub fn add_library(&mut self, library: impl Into<String>, declaration: &InkPluginDeclaration) {
        self.libraries.insert(library.into(), *declaration);
    }

    pub fn contains(&self, library: &str) -> bool {
        self.libraries.contains_key(library)
    }
}

impl InkModuleLoader for InkStaticLoader {
    fn name(&self) -> &'static str {
        "static"
    }

    fn load(&self, descriptor: &InkPackageDescriptor) -> Result<InkLoadedModule> {
        let declaration = self.libraries.get(&descriptor.library).ok_or_else(|| {
            InkError::load_failed(
                &descriptor.path,
                format!("no linked library named '{}'", descriptor.library),
            )
        })?;
        InkLoadedModule::resolve(descriptor, declaration)
    }
}

/// Loads plugin packages from platform dynamic libraries.
#[cfg(feature = "dylib")]
#[derive(Debug, Default, Clone, Copy)]
pub struct InkDylibLoader;

#[cfg(feature = "dylib")]
impl InkDylibLoader {
    pub fn new() -> Self {
        InkDylibLoader
    }
}

#[cfg(feature = "dylib")]
impl InkModuleLoader for InkDylibLoader {
    fn name(&self) -> &'static str {
        "dylib"
    }

    fn load(&self, descriptor: &InkPackageDescriptor) -> Result<InkLoadedModule> {
        use crate::host::plugin::INK_PLUGIN_DECLARATION_SYMBOL;

        let library_path = descriptor.library_path();
        if !library_path.is_file() {
            return Err(InkError::load_failed(
                &descriptor.path,
                format!("code artifact '{}' not found", descriptor.library),
            ));
        }

        // SAFETY: mapping the library runs its initialisers. Plugins are
        // trusted at load time.
        let library = unsafe { libloading::Library::new(&library_path) }
            .map_err(|err| InkError::load_failed(&descriptor.path, err.to_string()))?;
        let library: &'static libloading::Library = Box::leak(Box::new(library));

        // SAFETY: the symbol is the `static InkPluginDeclaration` emitted by
        // `inkx_export_plugin!`; the leaked library keeps it alive forever.
        let declaration: &'static InkPluginDeclaration = unsafe {
            let symbol = library
                .get::<*const InkPluginDeclaration>(INK_PLUGIN_DECLARATION_SYMBOL.as_bytes())
                .map_err(|err| {
                    InkError::load_failed(
                        &descriptor.path,
                        format!("missing symbol '{}': {}", INK_PLUGIN_DECLARATION_SYMBOL, err),
                    )
                })?;
            let ptr: *const InkPluginDeclaration = *symbol;
            if ptr.is_null() {
                return Err(InkError::load_failed(
                    &descriptor.path,
                    format!("symbol '{}' is null", INK_PLUGIN_DECLARATION_SYMBOL),
                ));
            }
            &*ptr
        };

        let mut module = InkLoadedModule::resolve(descriptor, declaration)?;
        module.library = Some(library);
        Ok(module)
    }
}
