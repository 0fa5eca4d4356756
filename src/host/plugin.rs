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

//! Inkx Plugin Contract - what a plugin library exports and what the host
//! hands back to it.
//!
//! A plugin library declares its entry-point types with
//! [`inkx_export_plugin!`](crate::inkx_export_plugin). Each type is
//! `Default`-constructible and implements one of two contracts:
//!
//! - [`InkNegotiatingPlugin`]: registers any number of actions with the host
//!   during a single `negotiate` call.
//! - [`InkFixedActionPlugin`]: the older fixed contract, one label and one
//!   action per package.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use inkx::{InkActionHost, InkActionTarget, InkColor, InkNegotiatingPlugin};
//!
//! #[derive(Default)]
//! pub struct MarkYellow;
//!
//! impl InkNegotiatingPlugin for MarkYellow {
//!     fn negotiate(self: Arc<Self>, host: &mut dyn InkActionHost) -> anyhow::Result<()> {
//!         host.register_action(
//!             "Mark Selected Text Yellow",
//!             InkActionTarget::bound("mark", move |surface, _doc, _ctx| {
//!                 let range = surface.selected_range();
//!                 surface.set_background(range, InkColor::YELLOW);
//!                 Ok(())
//!             }),
//!             serde_json::Value::Null,
//!         )?;
//!         Ok(())
//!     }
//! }
//!
//! inkx::inkx_export_plugin! { negotiated: [MarkYellow] }
//! ```
//!
//! Plugin libraries must be built with the same compiler and the same Inkx
//! version as the host: the contract passes Rust trait objects, not a C ABI.
//!
//! A plugin library carries its own copy of the standard library, and a
//! panic raised there aborts the process if it unwinds into the host. Every
//! call the host makes into plugin code goes through a `guarded_*` trait
//! method, an [`InkActionFn`] or a `register_*` constructor. Each of these is
//! compiled into the plugin and turns a panic into an error before it
//! crosses back.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::editing::{InkDocument, InkTextSurface};
use crate::errors::Result;
use crate::host::package::{InkPackageDescriptor, InkPluginVersion};
use crate::host::panic_message;
use crate::host::registry::InkActionHandle;

/// Bumped whenever the plugin contract changes shape.
pub const INK_PLUGIN_ABI_VERSION: u32 = 1;

/// Version of the (surface, document, context) invocation argument shape.
pub const INK_INVOCATION_SHAPE_VERSION: u32 = 1;

/// Version of the Inkx core a plugin was compiled against.
pub const INK_CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Symbol every plugin library exports, see [`InkPluginDeclaration`].
pub const INK_PLUGIN_DECLARATION_SYMBOL: &str = "inkx_plugin_declaration";

/// Run plugin code with panics turned into errors.
fn contain_panic<R>(what: &str, f: impl FnOnce() -> anyhow::Result<R>) -> anyhow::Result<R> {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        Err(anyhow::anyhow!(
            "{} panicked: {}",
            what,
            panic_message(payload.as_ref())
        ))
    })
}

type InkActionCallback =
    dyn Fn(&mut dyn InkTextSurface, &mut dyn InkDocument, &Value) -> anyhow::Result<()>
        + Send
        + Sync;

/// A callable action target: `(surface, document, context)`. A panic in the
/// wrapped closure comes back from [`call`](Self::call) as an error.
#[derive(Clone)]
pub struct InkActionFn(Arc<InkActionCallback>);

impl InkActionFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut dyn InkTextSurface, &mut dyn InkDocument, &Value) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        InkActionFn(Arc::new(
            move |surface: &mut dyn InkTextSurface,
                  document: &mut dyn InkDocument,
                  context: &Value| {
                contain_panic("action", || f(surface, document, context))
            },
        ))
    }

    pub fn call(
        &self,
        surface: &mut dyn InkTextSurface,
        document: &mut dyn InkDocument,
        context: &Value,
    ) -> anyhow::Result<()> {
        (self.0)(surface, document, context)
    }
}

impl fmt::Debug for InkActionFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InkActionFn(..)")
    }
}

/// What an action registration points at.
#[derive(Clone, Debug)]
pub enum InkActionTarget {
    /// A callable bound at negotiation time. Always resolves.
    Bound { name: String, callable: InkActionFn },
    /// A symbolic target resolved against the plugin instance on every
    /// invocation through [`InkNegotiatingPlugin::resolve_selector`].
    Selector(String),
}

impl InkActionTarget {
    pub fn bound<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut dyn InkTextSurface, &mut dyn InkDocument, &Value) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        InkActionTarget::Bound {
            name: name.into(),
            callable: InkActionFn::new(f),
        }
    }

    pub fn selector(name: impl Into<String>) -> Self {
        InkActionTarget::Selector(name.into())
    }

    /// Identifier used in diagnostics.
    pub fn name(&self) -> &str {
        match self {
            InkActionTarget::Bound { name, .. } => name,
            InkActionTarget::Selector(name) => name,
        }
    }
}

/// Facade the host passes to [`InkNegotiatingPlugin::negotiate`].
pub trait InkActionHost {
    /// Register one action. Call order is menu order.
    fn register_action(
        &mut self,
        label: &str,
        target: InkActionTarget,
        context: Value,
    ) -> Result<InkActionHandle>;

    /// Package id of the plugin being negotiated with.
    fn plugin_id(&self) -> &str;
}

/// Negotiated contract. `negotiate` is called exactly once, right after the
/// instance is constructed.
pub trait InkNegotiatingPlugin: Send + Sync + 'static {
    fn negotiate(self: Arc<Self>, host: &mut dyn InkActionHost) -> anyhow::Result<()>;

    /// Resolve a [`InkActionTarget::Selector`] at invocation time.
    fn resolve_selector(&self, _selector: &str) -> Option<InkActionFn> {
        None
    }

    #[doc(hidden)]
    fn guarded_negotiate(self: Arc<Self>, host: &mut dyn InkActionHost) -> anyhow::Result<()> {
        contain_panic("negotiate", move || self.negotiate(host))
    }

    #[doc(hidden)]
    fn guarded_resolve_selector(&self, selector: &str) -> anyhow::Result<Option<InkActionFn>> {
        contain_panic("resolve_selector", || Ok(self.resolve_selector(selector)))
    }
}

/// Fixed contract: one label, one action.
pub trait InkFixedActionPlugin: Send + Sync + 'static {
    fn menu_label(&self) -> String;

    fn perform(
        &self,
        surface: &mut dyn InkTextSurface,
        document: &mut dyn InkDocument,
    ) -> anyhow::Result<()>;

    #[doc(hidden)]
    fn guarded_menu_label(&self) -> anyhow::Result<String> {
        contain_panic("menu_label", || Ok(self.menu_label()))
    }

    #[doc(hidden)]
    fn guarded_perform(
        &self,
        surface: &mut dyn InkTextSurface,
        document: &mut dyn InkDocument,
    ) -> anyhow::Result<()> {
        contain_panic("perform", || self.perform(surface, document))
    }
}

/// A constructed entry-point object, tagged by the contract it speaks.
#[derive(Clone)]
pub enum InkPluginObject {
    Negotiated(Arc<dyn InkNegotiatingPlugin>),
    Fixed(Arc<dyn InkFixedActionPlugin>),
}

impl InkPluginObject {
    pub fn contract(&self) -> &'static str {
        match self {
            InkPluginObject::Negotiated(_) => "negotiated",
            InkPluginObject::Fixed(_) => "fixed",
        }
    }
}

impl fmt::Debug for InkPluginObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InkPluginObject::{}", self.contract())
    }
}

/// Builds an entry-point object. Constructors loaded from a dynamic library
/// must not panic; the ones `register_negotiated` and `register_fixed`
/// install report a panicking `Default` as an error.
pub type InkEntryConstructor = fn() -> anyhow::Result<InkPluginObject>;

fn construct_negotiated<T: InkNegotiatingPlugin + Default>() -> anyhow::Result<InkPluginObject> {
    contain_panic("constructor", || {
        Ok(InkPluginObject::Negotiated(Arc::new(T::default())))
    })
}

fn construct_fixed<T: InkFixedActionPlugin + Default>() -> anyhow::Result<InkPluginObject> {
    contain_panic("constructor", || Ok(InkPluginObject::Fixed(Arc::new(T::default()))))
}

/// Entry-point types a plugin library makes constructible, by name.
#[derive(Clone, Default)]
pub struct InkEntryPoints {
    entries: Vec<(String, InkEntryConstructor)>,
}

impl InkEntryPoints {
    pub fn new() -> Self {
        InkEntryPoints::default()
    }

    /// Register a constructor. A later registration under the same name
    /// replaces the earlier one.
    pub fn register(&mut self, name: &str, constructor: InkEntryConstructor) {
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| n == name) {
            slot.1 = constructor;
        } else {
            self.entries.push((name.to_string(), constructor));
        }
    }

    pub fn register_negotiated<T: InkNegotiatingPlugin + Default>(&mut self, name: &str) {
        self.register(name, construct_negotiated::<T>);
    }

    pub fn register_fixed<T: InkFixedActionPlugin + Default>(&mut self, name: &str) {
        self.register(name, construct_fixed::<T>);
    }

    pub fn resolve(&self, name: &str) -> Option<InkEntryConstructor> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, ctor)| *ctor)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for InkEntryPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// The static a plugin library exports under
/// [`INK_PLUGIN_DECLARATION_SYMBOL`].
///
/// `repr(C)` pins `abi_version` at offset 0 so the host can reject a foreign
/// declaration before reading the rest. The remaining fields are Rust types
/// and only match between libraries built by the same compiler.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct InkPluginDeclaration {
    pub abi_version: u32,
    pub core_version: &'static str,
    pub register: fn(&mut InkEntryPoints),
}

impl fmt::Debug for InkPluginDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InkPluginDeclaration")
            .field("abi_version", &self.abi_version)
            .field("core_version", &self.core_version)
            .finish()
    }
}

impl InkPluginDeclaration {
    pub fn entry_points(&self) -> InkEntryPoints {
        let mut points = InkEntryPoints::new();
        (self.register)(&mut points);
        points
    }
}

/// Export the plugin declaration for a library.
///
/// ```ignore
/// inkx::inkx_export_plugin! {
///     negotiated: [MarkYellow, Highlighter],
///     fixed: [WordCount],
/// }
/// ```
#[macro_export]
macro_rules! inkx_export_plugin {
    (
        $(negotiated: [$($negotiated:ident),* $(,)?])? $(,)?
        $(fixed: [$($fixed:ident),* $(,)?])? $(,)?
    ) => {
        #[doc(hidden)]
        #[no_mangle]
        #[allow(non_upper_case_globals)]
        pub static inkx_plugin_declaration: $crate::InkPluginDeclaration =
            $crate::InkPluginDeclaration {
                abi_version: $crate::INK_PLUGIN_ABI_VERSION,
                core_version: $crate::INK_CORE_VERSION,
                register: {
                    #[allow(unused_variables)]
                    fn __inkx_register(points: &mut $crate::InkEntryPoints) {
                        $($( points.register_negotiated::<$negotiated>(stringify!($negotiated)); )*)?
                        $($( points.register_fixed::<$fixed>(stringify!($fixed)); )*)?
                    }
                    __inkx_register
                },
            };
    };
}

/// One live plugin: the constructed entry-point object plus the identity of
/// the package it came from. Shared by every registration it produced.
pub struct InkPluginInstance {
    id: String,
    name: String,
    version: InkPluginVersion,
    entry_point: String,
    path: PathBuf,
    object: InkPluginObject,
}

impl InkPluginInstance {
    pub fn new(descriptor: &InkPackageDescriptor, object: InkPluginObject) -> Self {
        InkPluginInstance {
            id: descriptor.id.clone(),
            name: descriptor.name.clone(),
            version: descriptor.version.clone(),
            entry_point: descriptor.entry_point.clone(),
            path: descriptor.path.clone(),
            object,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &InkPluginVersion {
        &self.version
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn object(&self) -> &InkPluginObject {
        &self.object
    }
}

impl fmt::Debug for InkPluginInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InkPluginInstance")
            .field("id", &self.id)
            .field("version", &self.version.to_string())
            .field("entry_point", &self.entry_point)
            .field("contract", &self.object.contract())
            .finish()
    }
}
