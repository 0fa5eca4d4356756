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

//! # Invocation Dispatcher
//!
//! Calls a registered action with `(surface, document, context)`, the
//! invocation shape
//! [`INK_INVOCATION_SHAPE_VERSION`](crate::host::plugin::INK_INVOCATION_SHAPE_VERSION). Selector targets are
//! resolved against the owning instance at call time. Plugin errors, and
//! panics the plugin side of the contract turned into errors, come back as
//! [`InkError`] values; the registry and the editing session stay usable.
//!
//! Invocations are synchronous and unbounded: a plugin that blocks, blocks
//! the caller.

use crate::editing::InkEditingContext;
use crate::errors::{InkError, Result};
use crate::host::plugin::{InkActionFn, InkActionTarget, InkPluginObject};
use crate::host::registry::InkActionRegistration;

#[derive(Clone, Copy, Debug, Default)]
pub struct InkInvocationDispatcher;

impl InkInvocationDispatcher {
    pub fn new() -> Self {
        InkInvocationDispatcher
    }

    /// Resolve the callable behind a registration's target.
    pub fn resolve_target(&self, registration: &InkActionRegistration) -> Result<InkActionFn> {
        let plugin = registration.plugin();
        match registration.target() {
            InkActionTarget::Bound { callable, .. } => Ok(callable.clone()),
            InkActionTarget::Selector(selector) => {
                let resolved = match plugin.object() {
                    InkPluginObject::Negotiated(instance) => instance
                        .guarded_resolve_selector(selector)
                        .map_err(|err| {
                            InkError::invocation_threw(
                                plugin.id(),
                                selector.clone(),
                                format!("{err:#}"),
                            )
                        })?,
                    InkPluginObject::Fixed(_) => None,
                };
                resolved.ok_or_else(|| InkError::target_not_found(plugin.id(), selector.clone()))
            }
        }
    }

    /// Invoke `registration` against the live editing context.
    pub fn invoke(
        &self,
        registration: &InkActionRegistration,
        context: &mut InkEditingContext<'_>,
    ) -> Result<()> {
        let plugin_id = registration.plugin().id();
        let target = registration.target().name();

        let callable = self.resolve_target(registration).map_err(|err| {
            log::error!(
                "host.dispatch.resolve_failed: action target did not resolve - plugin={}, label={}, target={}, error={}",
                plugin_id,
                registration.label(),
                target,
                err
            );
            err
        })?;

        log::debug!(
            "host.dispatch.invoke: invoking plugin action - plugin={}, label={}, target={}, document={}",
            plugin_id,
            registration.label(),
            target,
            context.document.title()
        );

        let outcome = callable.call(
            &mut *context.surface,
            &mut *context.document,
            registration.context(),
        );
        let message = match outcome {
            Ok(()) => return Ok(()),
            Err(err) => format!("{err:#}"),
        };

        log::error!(
            "host.dispatch.invocation_failed: plugin action failed - plugin={}, label={}, target={}, error={}",
            plugin_id,
            registration.label(),
            target,
            message
        );
        Err(InkError::invocation_threw(plugin_id, target, message))
    }
}
