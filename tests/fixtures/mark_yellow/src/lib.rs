//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Inkx.
//! The Inkx project belongs to the Dunimd Team.

//! Plugin library loaded by the `dylib` integration test.

use std::sync::Arc;

use anyhow::bail;
use inkx::{
    InkActionFn, InkActionHost, InkActionTarget, InkColor, InkDocument, InkFixedActionPlugin,
    InkNegotiatingPlugin, InkTextSurface,
};
use serde_json::{json, Value};

#[derive(Default)]
pub struct MarkYellow;

impl InkNegotiatingPlugin for MarkYellow {
    fn negotiate(self: Arc<Self>, host: &mut dyn InkActionHost) -> anyhow::Result<()> {
        host.register_action(
            "Mark Selected Text Yellow",
            InkActionTarget::bound("markYellow", |surface, document, context| {
                let range = surface.selected_range();
                surface.set_background(range, InkColor::YELLOW);
                if context.is_null() {
                    document.mark_edited();
                }
                Ok(())
            }),
            Value::Null,
        )?;
        host.register_action(
            "Fails",
            InkActionTarget::bound("fails", |_surface, _document, _context| {
                bail!("plugin error")
            }),
            Value::Null,
        )?;
        host.register_action(
            "Panics",
            InkActionTarget::bound("panics", |_surface, _document, _context| {
                panic!("plugin panic")
            }),
            Value::Null,
        )?;
        host.register_action(
            "Run as Script",
            InkActionTarget::selector("runScript"),
            json!({"replacement": "#!"}),
        )?;
        host.register_action("Missing", InkActionTarget::selector("missing"), Value::Null)?;
        host.register_action("Explodes", InkActionTarget::selector("explode"), Value::Null)?;
        Ok(())
    }

    fn resolve_selector(&self, selector: &str) -> Option<InkActionFn> {
        match selector {
            "runScript" => Some(InkActionFn::new(|surface, _document, context| {
                let replacement = context["replacement"].as_str().unwrap_or_default();
                let range = surface.selected_range();
                surface.replace_range(range, replacement);
                Ok(())
            })),
            "explode" => panic!("selector panic"),
            _ => None,
        }
    }
}

#[derive(Default)]
pub struct Refuses;

impl InkNegotiatingPlugin for Refuses {
    fn negotiate(self: Arc<Self>, host: &mut dyn InkActionHost) -> anyhow::Result<()> {
        host.register_action("Never Seen", InkActionTarget::selector("never"), Value::Null)?;
        panic!("negotiate panic")
    }
}

pub struct Unbuildable;

impl Default for Unbuildable {
    fn default() -> Self {
        panic!("constructor panic")
    }
}

impl InkNegotiatingPlugin for Unbuildable {
    fn negotiate(self: Arc<Self>, _host: &mut dyn InkActionHost) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct Shout;

impl InkFixedActionPlugin for Shout {
    fn menu_label(&self) -> String {
        "Shout".to_string()
    }

    fn perform(
        &self,
        surface: &mut dyn InkTextSurface,
        document: &mut dyn InkDocument,
    ) -> anyhow::Result<()> {
        let range = surface.selected_range();
        if range.is_empty() {
            panic!("nothing to shout");
        }
        let upper = surface.selected_text().to_uppercase();
        surface.replace_range(range, &upper);
        document.mark_edited();
        Ok(())
    }
}

inkx::inkx_export_plugin! {
    negotiated: [MarkYellow, Refuses, Unbuildable],
    fixed: [Shout],
}
