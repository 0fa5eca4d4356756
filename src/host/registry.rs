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

//! # Action Registry Module
//!
//! Host-owned, append-only table of the actions plugins registered during
//! negotiation.
//!
//! ## Registry Operations
//!
//! - Stage one plugin's registrations in an [`InkNegotiationSession`] and
//!   commit them whole, or drop them whole when negotiation fails
//! - Enumerate registrations in scan order, then negotiation-call order
//! - Resolve an [`InkActionHandle`] stored by a UI element
//! - Populate a menu through [`InkMenuSink`]
//!
//! Registrations are never merged, deduplicated or reordered. Two plugins
//! may use the same label; only one plugin may not use a label twice.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::editing::InkMenuSink;
use crate::errors::{InkError, Result};
use crate::host::plugin::{InkActionHost, InkActionTarget, InkPluginInstance};

/// Opaque reference to one registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InkActionHandle(usize);

impl InkActionHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for InkActionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One action a plugin offered during negotiation.
#[derive(Clone, Debug)]
pub struct InkActionRegistration {
    label: String,
    plugin: Arc<InkPluginInstance>,
    target: InkActionTarget,
    context: Value,
}

impl InkActionRegistration {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn plugin(&self) -> &Arc<InkPluginInstance> {
        &self.plugin
    }

    pub fn target(&self) -> &InkActionTarget {
        &self.target
    }

    /// Value the plugin chose at registration time, `Null` when it chose none.
    pub fn context(&self) -> &Value {
        &self.context
    }
}

/// Registrations of a single plugin, staged until negotiation completes.
pub struct InkNegotiationSession {
    plugin: Arc<InkPluginInstance>,
    base: usize,
    staged: Vec<InkActionRegistration>,
}

impl InkNegotiationSession {
    pub fn plugin(&self) -> &Arc<InkPluginInstance> {
        &self.plugin
    }

    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }
}

impl InkActionHost for InkNegotiationSession {
    fn register_action(
        &mut self,
        label: &str,
        target: InkActionTarget,
        context: Value,
    ) -> Result<InkActionHandle> {
        if self.staged.iter().any(|r| r.label == label) {
            log::warn!(
                "host.registry.duplicate_label: plugin registered a label twice; keeping the first - plugin={}, label={}",
                self.plugin.id(),
                label
            );
            return Err(InkError::DuplicateLabel {
                plugin: self.plugin.id().to_string(),
                label: label.to_string(),
            });
        }

        log::debug!(
            "host.registry.register: action staged - plugin={}, label={}, target={}",
            self.plugin.id(),
            label,
            target.name()
        );

        let handle = InkActionHandle(self.base + self.staged.len());
        self.staged.push(InkActionRegistration {
            label: label.to_string(),
            plugin: Arc::clone(&self.plugin),
            target,
            context,
        });
        Ok(handle)
    }

    fn plugin_id(&self) -> &str {
        self.plugin.id()
    }
}

#[derive(Debug, Default)]
pub struct InkActionRegistry {
    entries: Vec<InkActionRegistration>,
}

impl InkActionRegistry {
    pub fn new() -> Self {
        InkActionRegistry::default()
    }

    /// Open a session for `plugin`. Handles it hands out stay valid as long as
    /// nothing else is committed before it.
    pub fn begin_negotiation(&self, plugin: Arc<InkPluginInstance>) -> InkNegotiationSession {
        InkNegotiationSession {
            plugin,
            base: self.entries.len(),
            staged: Vec::new(),
        }
    }

    /// Append a session's registrations in the order they were made.
    pub fn commit(&mut self, session: InkNegotiationSession) -> Result<Vec<InkActionHandle>> {
        if session.base != self.entries.len() {
            return Err(InkError::lifecycle(format!(
                "negotiation for '{}' started at #{} but registry now holds {} entries",
                session.plugin.id(),
                session.base,
                self.entries.len()
            )));
        }
        let start = self.entries.len();
        self.entries.extend(session.staged);
        Ok((start..self.entries.len()).map(InkActionHandle).collect())
    }

    pub fn resolve(&self, handle: InkActionHandle) -> Option<&InkActionRegistration> {
        self.entries.get(handle.0)
    }

    pub fn get(&self, handle: InkActionHandle) -> Result<&InkActionRegistration> {
        self.resolve(handle)
            .ok_or(InkError::UnknownAction(handle.0))
    }

    pub fn iter(&self) -> impl Iterator<Item = (InkActionHandle, &InkActionRegistration)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, r)| (InkActionHandle(i), r))
    }

    pub fn handles(&self) -> Vec<InkActionHandle> {
        (0..self.entries.len()).map(InkActionHandle).collect()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|r| r.label.as_str()).collect()
    }

    pub fn registrations_for<'a>(
        &'a self,
        plugin_id: &'a str,
    ) -> impl Iterator<Item = &'a InkActionRegistration> + 'a {
        self.entries.iter().filter(move |r| r.plugin.id() == plugin_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add one menu item per registration, in registry order.
    pub fn populate_menu(&self, sink: &mut dyn InkMenuSink) {
        for (handle, registration) in self.iter() {
            sink.add_item(&registration.label, handle);
        }
    }
}
