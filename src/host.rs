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

use std::any::Any;

pub mod dispatch;
pub mod loader;
pub mod manager;
pub mod package;
pub mod plugin;
pub mod registry;

pub use dispatch::InkInvocationDispatcher;
#[cfg(feature = "dylib")]
pub use loader::InkDylibLoader;
pub use loader::{InkLoadedModule, InkModuleLoader, InkStaticLoader};
pub use manager::{
    InkCandidateStage, InkDiagnostic, InkPluginManager, InkScanReport, InkScanState,
};
pub use package::{default_library_name, InkPackageDescriptor, InkPackageReader, InkPluginVersion};
pub use plugin::{
    InkActionFn, InkActionHost, InkActionTarget, InkEntryConstructor, InkEntryPoints,
    InkFixedActionPlugin, InkNegotiatingPlugin, InkPluginDeclaration, InkPluginInstance,
    InkPluginObject, INK_CORE_VERSION, INK_INVOCATION_SHAPE_VERSION, INK_PLUGIN_ABI_VERSION,
    INK_PLUGIN_DECLARATION_SYMBOL,
};
pub use registry::{
    InkActionHandle, InkActionRegistration, InkActionRegistry, InkNegotiationSession,
};

/// Text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
