//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Inkx.
//! The Inkx project belongs to the Dunimd Team.

#[path = "../common/mod.rs"]
mod common;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use inkx::{
    InkActionFn, InkActionHandle, InkActionHost, InkActionRegistry, InkActionTarget, InkColor,
    InkEditingContext, InkError, InkFixedActionPlugin, InkInvocationDispatcher,
    InkNegotiatingPlugin, InkPackageDescriptor, InkPluginInstance, InkPluginObject,
    InkPluginVersion, InkDocument, InkTextSurface,
};
use serde_json::{json, Value};

use common::{CallLog, MockDocument, MockSurface};

static CALLS: CallLog = CallLog::new();

#[derive(Default)]
struct Marker;

impl InkNegotiatingPlugin for Marker {
    fn negotiate(self: Arc<Self>, host: &mut dyn InkActionHost) -> anyhow::Result<()> {
        host.register_action(
            "Mark Selected Text Yellow",
            InkActionTarget::bound("markYellow", |surface, document, context| {
                CALLS.record("markYellow", surface, document, context);
                let range = surface.selected_range();
                surface.set_background(range, InkColor::YELLOW);
                Ok(())
            }),
            Value::Null,
        )?;
        host.register_action(
            "Mark Selected Text Blue",
            InkActionTarget::bound("markBlue", |surface, document, context| {
                CALLS.record("markBlue", surface, document, context);
                let range = surface.selected_range();
                surface.set_background(range, InkColor::BLUE);
                Ok(())
            }),
            json!({"color": "blue"}),
        )?;
        host.register_action("Run as Script", InkActionTarget::selector("runScript"), json!(7))?;
        host.register_action("Vanished", InkActionTarget::selector("vanished"), Value::Null)?;
        host.register_action("Explodes", InkActionTarget::selector("explode"), Value::Null)?;
        host.register_action(
            "Fails",
            InkActionTarget::bound("fails", |_surface, _document, _context| {
                bail!("selection is empty")
            }),
            Value::Null,
        )?;
        host.register_action(
            "Panics",
            InkActionTarget::bound("panics", |_surface, _document, _context| {
                panic!("plugin bug")
            }),
            Value::Null,
        )?;
        Ok(())
    }

    fn resolve_selector(&self, selector: &str) -> Option<InkActionFn> {
        match selector {
            "runScript" => Some(InkActionFn::new(|surface, document, context| {
                CALLS.record("runScript", surface, document, context);
                document.mark_edited();
                Ok(())
            })),
            "explode" => panic!("selector table corrupted"),
            _ => None,
        }
    }
}

#[derive(Default)]
struct Upcase;

impl InkFixedActionPlugin for Upcase {
    fn menu_label(&self) -> String {
        "Upcase".to_string()
    }

    fn perform(
        &self,
        surface: &mut dyn InkTextSurface,
        _document: &mut dyn InkDocument,
    ) -> anyhow::Result<()> {
        let range = surface.selected_range();
        let upper = surface.selected_text().to_uppercase();
        surface.replace_range(range, &upper);
        Ok(())
    }
}

fn descriptor(id: &str) -> InkPackageDescriptor {
    InkPackageDescriptor {
        path: PathBuf::from(format!("/plugins/{id}.inkplugin")),
        id: id.to_string(),
        name: id.to_string(),
        version: InkPluginVersion::default(),
        entry_point: id.to_string(),
        library: id.to_string(),
        abi_version: None,
        description: None,
    }
}

fn marker_registry() -> (InkActionRegistry, Vec<InkActionHandle>) {
    let mut registry = InkActionRegistry::new();
    let plugin = Arc::new(Marker);
    let instance = Arc::new(InkPluginInstance::new(
        &descriptor("Marker"),
        InkPluginObject::Negotiated(plugin.clone()),
    ));
    let mut session = registry.begin_negotiation(instance);
    plugin.negotiate(&mut session).unwrap();
    let handles = registry.commit(session).unwrap();
    (registry, handles)
}

fn invoke(
    registry: &InkActionRegistry,
    handle: InkActionHandle,
    surface: &mut MockSurface,
    document: &mut MockDocument,
) -> inkx::Result<()> {
    let registration = registry.get(handle)?;
    let mut context = InkEditingContext::new(surface, document);
    InkInvocationDispatcher::new().invoke(registration, &mut context)
}

#[test]
fn test_bound_action_receives_surface_document_and_null_context() {
    let (registry, handles) = marker_registry();
    let mut surface = MockSurface::new("hello world", 0..5);
    let mut document = MockDocument::new("dispatch-yellow.txt");

    invoke(&registry, handles[0], &mut surface, &mut document).unwrap();

    let calls = CALLS.for_document("dispatch-yellow.txt");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].target, "markYellow");
    assert_eq!(calls[0].selected, "hello");
    assert_eq!(calls[0].context, Value::Null);
    assert_eq!(surface.highlights, vec![(0..5, InkColor::YELLOW)]);
}

#[test]
fn test_each_registration_passes_its_own_context() {
    let (registry, handles) = marker_registry();
    let mut surface = MockSurface::new("abc", 1..2);
    let mut document = MockDocument::new("dispatch-context.txt");

    invoke(&registry, handles[1], &mut surface, &mut document).unwrap();
    invoke(&registry, handles[2], &mut surface, &mut document).unwrap();

    let calls = CALLS.for_document("dispatch-context.txt");
    let seen: Vec<(&str, &Value)> = calls.iter().map(|c| (c.target.as_str(), &c.context)).collect();
    assert_eq!(
        seen,
        vec![("markBlue", &json!({"color": "blue"})), ("runScript", &json!(7))]
    );
    assert_eq!(document.edits, 1);
    assert_eq!(surface.highlights, vec![(1..2, InkColor::BLUE)]);
}

#[test]
fn test_unresolved_selector_does_not_poison_later_calls() {
    let (registry, handles) = marker_registry();
    let mut surface = MockSurface::new("text", 0..4);
    let mut document = MockDocument::new("dispatch-selector.txt");

    match invoke(&registry, handles[3], &mut surface, &mut document) {
        Err(InkError::TargetNotFound { plugin, target }) => {
            assert_eq!(plugin, "Marker");
            assert_eq!(target, "vanished");
        }
        other => panic!("expected TargetNotFound, got {other:?}"),
    }
    assert!(CALLS.for_document("dispatch-selector.txt").is_empty());

    invoke(&registry, handles[0], &mut surface, &mut document).unwrap();
    assert_eq!(CALLS.for_document("dispatch-selector.txt").len(), 1);
}

#[test]
fn test_failing_and_panicking_actions_are_contained() {
    let (registry, handles) = marker_registry();
    let mut surface = MockSurface::new("text", 0..4);
    let mut document = MockDocument::new("dispatch-failures.txt");

    match invoke(&registry, handles[5], &mut surface, &mut document) {
        Err(InkError::InvocationThrew { target, message, .. }) => {
            assert_eq!(target, "fails");
            assert!(message.contains("selection is empty"));
        }
        other => panic!("expected InvocationThrew, got {other:?}"),
    }
    match invoke(&registry, handles[6], &mut surface, &mut document) {
        Err(InkError::InvocationThrew { target, message, .. }) => {
            assert_eq!(target, "panics");
            assert!(message.contains("plugin bug"));
        }
        other => panic!("expected InvocationThrew, got {other:?}"),
    }

    invoke(&registry, handles[0], &mut surface, &mut document).unwrap();
    assert_eq!(CALLS.for_document("dispatch-failures.txt").len(), 1);
}

#[test]
fn test_panicking_selector_resolution_is_contained() {
    let (registry, handles) = marker_registry();
    let mut surface = MockSurface::new("text", 0..4);
    let mut document = MockDocument::new("dispatch-explode.txt");

    match invoke(&registry, handles[4], &mut surface, &mut document) {
        Err(InkError::InvocationThrew { target, message, .. }) => {
            assert_eq!(target, "explode");
            assert!(message.contains("selector table corrupted"));
        }
        other => panic!("expected InvocationThrew, got {other:?}"),
    }

    invoke(&registry, handles[0], &mut surface, &mut document).unwrap();
    assert_eq!(CALLS.for_document("dispatch-explode.txt").len(), 1);
}

#[test]
fn test_selector_on_fixed_plugin_is_not_found() {
    let mut registry = InkActionRegistry::new();
    let instance = Arc::new(InkPluginInstance::new(
        &descriptor("Upcase"),
        InkPluginObject::Fixed(Arc::new(Upcase)),
    ));
    let mut session = registry.begin_negotiation(instance);
    let handle = session
        .register_action("Upcase", InkActionTarget::selector("perform"), Value::Null)
        .unwrap();
    registry.commit(session).unwrap();

    let mut surface = MockSurface::new("abc", 0..3);
    let mut document = MockDocument::new("dispatch-fixed.txt");
    assert!(matches!(
        invoke(&registry, handle, &mut surface, &mut document),
        Err(InkError::TargetNotFound { .. })
    ));
    assert_eq!(surface.text, "abc");
}
