//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Inkx.
//! The Inkx project belongs to the Dunimd Team.

//! Shared fixtures: an in-memory editor and plugin package writers.

#![allow(dead_code)]

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use inkx::{
    InkActionHandle, InkColor, InkDocument, InkEditingContext, InkFocusProvider, InkMenuSink,
    InkTextSurface,
};
use serde_json::{json, Value};

#[derive(Debug, Default)]
pub struct MockSurface {
    pub text: String,
    pub selection: Range<usize>,
    pub highlights: Vec<(Range<usize>, InkColor)>,
}

impl MockSurface {
    pub fn new(text: &str, selection: Range<usize>) -> Self {
        MockSurface {
            text: text.to_string(),
            selection,
            highlights: Vec::new(),
        }
    }
}

impl InkTextSurface for MockSurface {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn selected_range(&self) -> Range<usize> {
        self.selection.clone()
    }

    fn replace_range(&mut self, range: Range<usize>, replacement: &str) {
        self.text.replace_range(range.clone(), replacement);
        self.selection = range.start..range.start + replacement.len();
    }

    fn set_background(&mut self, range: Range<usize>, color: InkColor) {
        self.highlights.push((range, color));
    }
}

#[derive(Debug, Default)]
pub struct MockDocument {
    pub title: String,
    pub edits: usize,
}

impl MockDocument {
    pub fn new(title: &str) -> Self {
        MockDocument {
            title: title.to_string(),
            edits: 0,
        }
    }
}

impl InkDocument for MockDocument {
    fn title(&self) -> String {
        self.title.clone()
    }

    fn path(&self) -> Option<PathBuf> {
        None
    }

    fn mark_edited(&mut self) {
        self.edits += 1;
    }
}

/// Focus provider over one optional surface/document pair.
pub struct MockFocus {
    pub editor: Option<(MockSurface, MockDocument)>,
}

impl InkFocusProvider for MockFocus {
    fn focused(&mut self) -> Option<InkEditingContext<'_>> {
        let (surface, document) = self.editor.as_mut()?;
        Some(InkEditingContext::new(surface, document))
    }
}

#[derive(Debug, Default)]
pub struct RecordingMenu {
    pub items: Vec<(String, InkActionHandle)>,
}

impl InkMenuSink for RecordingMenu {
    fn add_item(&mut self, label: &str, handle: InkActionHandle) {
        self.items.push((label.to_string(), handle));
    }
}

/// One observed call into a plugin target.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCall {
    pub target: String,
    pub document: String,
    pub selected: String,
    pub context: Value,
}

/// Append-only log plugins in a test binary write to. Tests filter by the
/// document title they used, so parallel tests do not see each other.
pub struct CallLog(Mutex<Vec<RecordedCall>>);

impl CallLog {
    pub const fn new() -> Self {
        CallLog(Mutex::new(Vec::new()))
    }

    pub fn record(
        &self,
        target: &str,
        surface: &dyn InkTextSurface,
        document: &dyn InkDocument,
        context: &Value,
    ) {
        self.0.lock().unwrap().push(RecordedCall {
            target: target.to_string(),
            document: document.title(),
            selected: surface.selected_text(),
            context: context.clone(),
        });
    }

    pub fn for_document(&self, document: &str) -> Vec<RecordedCall> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.document == document)
            .cloned()
            .collect()
    }
}

/// Write `<dir>/<id>.inkplugin/manifest.json` and return the package path.
pub fn write_package(dir: &Path, id: &str, manifest: Value) -> PathBuf {
    let package = dir.join(format!("{id}.inkplugin"));
    fs::create_dir_all(&package).unwrap();
    fs::write(
        package.join("manifest.json"),
        serde_json::to_string_pretty(&manifest).unwrap(),
    )
    .unwrap();
    package
}

/// Package whose code lives in the static library `library`.
pub fn write_static_package(dir: &Path, id: &str, entry_point: &str, library: &str) -> PathBuf {
    write_package(
        dir,
        id,
        json!({
            "entry_point": entry_point,
            "library": library,
            "version": "1.0.0",
        }),
    )
}
