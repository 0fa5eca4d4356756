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

//! # Plugin Manager Module
//!
//! Drives one scan cycle over the configured plugin directories and owns the
//! resulting [`InkActionRegistry`].
//!
//! ## Scan Cycle
//!
//! ```text
//! Idle ──scan()──▶ Scanning ──▶ Ready
//!                     │
//!                     └─ per candidate: Validating ─▶ Loading ─▶ Negotiating
//! ```
//!
//! A candidate that fails any stage is dropped with an [`InkDiagnostic`] and
//! the scan moves on. Entries that are not packages at all are dropped
//! without one. Once `Ready`, the registry never changes again and actions
//! may be invoked; there is no re-scan.

use std::fs;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::InkHostConfig;
use crate::editing::{InkEditingContext, InkFocusProvider, InkMenuSink};
use crate::errors::{InkError, Result};
use crate::host::dispatch::InkInvocationDispatcher;
use crate::host::loader::{InkLoadedModule, InkModuleLoader};
use crate::host::package::{InkPackageDescriptor, InkPackageReader};
use crate::host::panic_message;
use crate::host::plugin::{InkActionHost, InkActionTarget, InkPluginInstance, InkPluginObject};
use crate::host::registry::{InkActionHandle, InkActionRegistry};

/// Manager lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InkScanState {
    Idle,
    Scanning,
    Ready,
}

/// Stage a candidate package was in when it was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InkCandidateStage {
    Validating,
    Loading,
    Negotiating,
}

/// Why a candidate package was dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InkDiagnostic {
    pub path: PathBuf,
    pub stage: InkCandidateStage,
    pub error: InkError,
}

/// Outcome of a scan cycle.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InkScanReport {
    /// Ids of loaded plugins, in scan order.
    pub loaded: Vec<String>,
    /// Ids skipped because the config disables them.
    pub disabled: Vec<String>,
    pub diagnostics: Vec<InkDiagnostic>,
    /// Registry size after the scan.
    pub registrations: usize,
}

impl InkScanReport {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

pub struct InkPluginManager {
    config: InkHostConfig,
    reader: InkPackageReader,
    loader: Box<dyn InkModuleLoader>,
    dispatcher: InkInvocationDispatcher,
    state: InkScanState,
    modules: Vec<InkLoadedModule>,
    plugins: Vec<Arc<InkPluginInstance>>,
    registry: InkActionRegistry,
}

impl InkPluginManager {
    pub fn new<L>(config: InkHostConfig, loader: L) -> Result<Self>
    where
        L: InkModuleLoader + 'static,
    {
        config.validate()?;
        Ok(InkPluginManager {
            reader: InkPackageReader::from_config(&config),
            config,
            loader: Box::new(loader),
            dispatcher: InkInvocationDispatcher::new(),
            state: InkScanState::Idle,
            modules: Vec::new(),
            plugins: Vec::new(),
            registry: InkActionRegistry::new(),
        })
    }

    /// Manager that loads packages from platform dynamic libraries.
    #[cfg(feature = "dylib")]
    pub fn with_dylib_loader(config: InkHostConfig) -> Result<Self> {
        InkPluginManager::new(config, crate::host::loader::InkDylibLoader::new())
    }

    pub fn config(&self) -> &InkHostConfig {
        &self.config
    }

    pub fn state(&self) -> InkScanState {
        self.state
    }

    pub fn registry(&self) -> &InkActionRegistry {
        &self.registry
    }

    pub fn plugins(&self) -> &[Arc<InkPluginInstance>] {
        &self.plugins
    }

    pub fn plugin(&self, plugin_id: &str) -> Option<&Arc<InkPluginInstance>> {
        self.plugins.iter().find(|p| p.id() == plugin_id)
    }

    pub fn modules(&self) -> &[InkLoadedModule] {
        &self.modules
    }

    /// Run the scan cycle. Only the first call does anything; later calls
    /// fail with [`InkError::Lifecycle`].
    pub fn scan(&mut self) -> Result<InkScanReport> {
        if self.state != InkScanState::Idle {
            return Err(InkError::lifecycle(format!(
                "plugins already scanned (state {:?})",
                self.state
            )));
        }
        self.state = InkScanState::Scanning;

        log::info!(
            "host.scan.start: scanning plugin directories - dirs={:?}, loader={}, suffix={}",
            self.config.plugin_dirs,
            self.loader.name(),
            self.config.package_suffix
        );

        let mut report = InkScanReport::default();
        let dirs = self.config.plugin_dirs.clone();
        for dir in &dirs {
            for path in list_candidates(dir) {
                self.process_candidate(&path, &mut report);
            }
        }

        report.registrations = self.registry.len();
        self.state = InkScanState::Ready;

        log::info!(
            "host.scan.ready: plugin scan complete - loaded={}, disabled={}, dropped={}, actions={}",
            report.loaded.len(),
            report.disabled.len(),
            report.diagnostics.len(),
            report.registrations
        );
        Ok(report)
    }

    fn process_candidate(&mut self, path: &Path, report: &mut InkScanReport) {
        let descriptor = match self.reader.read(path) {
            Ok(descriptor) => descriptor,
            Err(err) if err.is_silent() => {
                log::trace!("host.scan.skip: not a plugin package - path={}", path.display());
                return;
            }
            Err(err) => {
                record(report, path, InkCandidateStage::Validating, err);
                return;
            }
        };

        if self.config.is_disabled(&descriptor.id) {
            log::info!(
                "host.scan.disabled: plugin disabled by configuration - plugin={}, path={}",
                descriptor.id,
                path.display()
            );
            report.disabled.push(descriptor.id);
            return;
        }

        if let Some(existing) = self.plugin(&descriptor.id) {
            let err = InkError::DuplicatePackage {
                plugin: descriptor.id.clone(),
                existing: existing.path().display().to_string(),
            };
            record(report, path, InkCandidateStage::Validating, err);
            return;
        }

        log::debug!(
            "host.plugin.load: loading plugin code - plugin={}, version={}, entry_point={}, library={}",
            descriptor.id,
            descriptor.version,
            descriptor.entry_point,
            descriptor.library
        );

        let module = match self.loader.load(&descriptor) {
            Ok(module) => module,
            Err(err) => {
                record(report, path, InkCandidateStage::Loading, err);
                return;
            }
        };

        // Only constructors linked into the host can unwind this far.
        let object = match catch_unwind(AssertUnwindSafe(|| module.instantiate())) {
            Ok(Ok(object)) => object,
            Ok(Err(err)) => {
                let err = InkError::load_failed(
                    path,
                    format!(
                        "entry point '{}' failed to construct: {err:#}",
                        descriptor.entry_point
                    ),
                );
                record(report, path, InkCandidateStage::Loading, err);
                return;
            }
            Err(payload) => {
                let err = InkError::load_failed(
                    path,
                    format!(
                        "entry point '{}' panicked during construction: {}",
                        descriptor.entry_point,
                        panic_message(payload.as_ref())
                    ),
                );
                record(report, path, InkCandidateStage::Loading, err);
                return;
            }
        };

        if matches!(object, InkPluginObject::Fixed(_)) && !self.config.allow_legacy_plugins {
            let err = InkError::load_failed(path, "fixed-contract plugins are disabled");
            record(report, path, InkCandidateStage::Loading, err);
            return;
        }

        let instance = Arc::new(InkPluginInstance::new(&descriptor, object));
        match self.negotiate(&descriptor, &instance) {
            Ok(count) => {
                log::info!(
                    "host.plugin.ready: plugin loaded - plugin={}, version={}, contract={}, actions={}",
                    descriptor.id,
                    descriptor.version,
                    instance.object().contract(),
                    count
                );
                report.loaded.push(descriptor.id.clone());
                self.modules.push(module);
                self.plugins.push(instance);
            }
            Err(err) => record(report, path, InkCandidateStage::Negotiating, err),
        }
    }

    /// Negotiate with a fresh instance and commit its registrations, all or
    /// nothing.
    fn negotiate(
        &mut self,
        descriptor: &InkPackageDescriptor,
        instance: &Arc<InkPluginInstance>,
    ) -> Result<usize> {
        let mut session = self.registry.begin_negotiation(Arc::clone(instance));
        log::debug!(
            "host.plugin.negotiate: negotiating actions - plugin={}, contract={}",
            descriptor.id,
            instance.object().contract()
        );

        match instance.object() {
            InkPluginObject::Negotiated(plugin) => {
                Arc::clone(plugin)
                    .guarded_negotiate(&mut session)
                    .map_err(|err| {
                        InkError::load_failed(
                            &descriptor.path,
                            format!("negotiation failed: {err:#}"),
                        )
                    })?;
            }
            InkPluginObject::Fixed(plugin) => {
                let label = plugin.guarded_menu_label().map_err(|err| {
                    InkError::load_failed(&descriptor.path, format!("menu_label failed: {err:#}"))
                })?;
                let plugin = Arc::clone(plugin);
                let target = InkActionTarget::bound("perform", move |surface, document, _context| {
                    plugin.guarded_perform(surface, document)
                });
                session.register_action(&label, target, Value::Null)?;
            }
        }

        log::debug!(
            "host.plugin.negotiated: committing staged actions - plugin={}, staged={}",
            descriptor.id,
            session.staged_len()
        );
        let handles = self.registry.commit(session)?;
        Ok(handles.len())
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.state != InkScanState::Ready {
            return Err(InkError::lifecycle(format!(
                "actions cannot be invoked before the scan completes (state {:?})",
                self.state
            )));
        }
        Ok(())
    }

    /// Invoke the action behind `handle` with an editing context the caller
    /// already holds.
    pub fn invoke(&self, handle: InkActionHandle, context: &mut InkEditingContext<'_>) -> Result<()> {
        self.ensure_ready()?;
        let registration = self.registry.get(handle)?;
        self.dispatcher.invoke(registration, context)
    }

    /// Invoke the action behind `handle` against whatever has focus now.
    pub fn trigger(&self, handle: InkActionHandle, focus: &mut dyn InkFocusProvider) -> Result<()> {
        self.ensure_ready()?;
        let mut context = focus.focused().ok_or(InkError::NoEditingFocus)?;
        self.invoke(handle, &mut context)
    }

    pub fn populate_menu(&self, sink: &mut dyn InkMenuSink) {
        self.registry.populate_menu(sink);
    }
}

fn record(report: &mut InkScanReport, path: &Path, stage: InkCandidateStage, error: InkError) {
    match &error {
        InkError::LoadFailed { .. } | InkError::EntryPointNotFound { .. } => log::error!(
            "host.plugin.dropped: plugin dropped - path={}, stage={:?}, error={}",
            path.display(),
            stage,
            error
        ),
        _ => log::warn!(
            "host.plugin.dropped: plugin dropped - path={}, stage={:?}, error={}",
            path.display(),
            stage,
            error
        ),
    }
    report.diagnostics.push(InkDiagnostic {
        path: path.to_path_buf(),
        stage,
        error,
    });
}

/// Entries of `dir`, sorted by file name so scan order is stable.
fn list_candidates(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            log::debug!("host.scan.missing_dir: plugin directory does not exist - dir={}", dir.display());
            return Vec::new();
        }
        Err(err) => {
            log::warn!(
                "host.scan.read_dir_failed: cannot read plugin directory - dir={}, error={}",
                dir.display(),
                err
            );
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries.flatten().map(|entry| entry.path()).collect();
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    paths
}
