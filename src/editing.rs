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

//! # Editing Collaborator Interfaces
//!
//! The editor UI, document model and menu rendering live outside Inkx. This
//! module describes the slice of them the plugin host needs:
//!
//! - [`InkTextSurface`]: the focused text view a plugin acts on
//! - [`InkDocument`]: the active document
//! - [`InkEditingContext`]: both of the above, borrowed for one invocation
//! - [`InkFocusProvider`]: where the host asks for the context at gesture time
//! - [`InkMenuSink`]: where registered actions are presented to the user

use std::ops::Range;
use std::path::PathBuf;

use crate::host::registry::InkActionHandle;

/// RGBA color used for background highlights.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InkColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl InkColor {
    pub const YELLOW: InkColor = InkColor::rgb(255, 255, 0);
    pub const BLUE: InkColor = InkColor::rgb(0, 0, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        InkColor { r, g, b, a: 255 }
    }
}

/// The text view that currently has keyboard focus.
///
/// Ranges are byte offsets into [`InkTextSurface::text`].
pub trait InkTextSurface {
    fn text(&self) -> String;

    fn selected_range(&self) -> Range<usize>;

    fn replace_range(&mut self, range: Range<usize>, replacement: &str);

    fn set_background(&mut self, range: Range<usize>, color: InkColor);

    /// Text covered by the current selection, empty when nothing is selected
    /// or the selection does not fall on character boundaries.
    fn selected_text(&self) -> String {
        let text = self.text();
        text.get(self.selected_range()).unwrap_or_default().to_string()
    }
}

/// The document backing the focused text surface.
pub trait InkDocument {
    fn title(&self) -> String;

    fn path(&self) -> Option<PathBuf>;

    fn mark_edited(&mut self);
}

/// Live editing state handed to a plugin for the duration of one invocation.
pub struct InkEditingContext<'a> {
    pub surface: &'a mut dyn InkTextSurface,
    pub document: &'a mut dyn InkDocument,
}

impl<'a> InkEditingContext<'a> {
    pub fn new(surface: &'a mut dyn InkTextSurface, document: &'a mut dyn InkDocument) -> Self {
        InkEditingContext { surface, document }
    }
}

/// Supplies the focused surface and active document when a user gesture
/// arrives. Returns `None` when no editor window has focus.
pub trait InkFocusProvider {
    fn focused(&mut self) -> Option<InkEditingContext<'_>>;
}

/// Receives one clickable entry per registered action. The handle is the
/// value the UI stores and passes back when the entry is clicked.
pub trait InkMenuSink {
    fn add_item(&mut self, label: &str, handle: InkActionHandle);
}
