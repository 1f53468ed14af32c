#![cfg(target_arch = "wasm32")]
use keiros_reveal_wasm::{abi_version, compose_mailto, KeirosReveal};
use serde_wasm_bindgen as swb;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

use keiros_reveal_core::{DomMutation, ElementId, InstallReport, Outputs, RevealEvent};
use serde_json::json;

// No filesystem in the browser; embed the shared fixtures.
const PAGE: &str = include_str!("../../../../fixtures/pages/keiros.json");
const DOM: &str = include_str!("../../../../fixtures/dom/keiros.json");

wasm_bindgen_test_configure!(run_in_browser);

fn to_js(value: serde_json::Value) -> JsValue {
    swb::to_value(&value).unwrap()
}

fn outputs(v: JsValue) -> Outputs {
    swb::from_value(v).unwrap()
}

#[wasm_bindgen_test]
fn abi_is_1() {
    assert_eq!(abi_version(), 1);
}

#[wasm_bindgen_test]
fn construct_with_defaults() {
    assert!(KeirosReveal::new(JsValue::UNDEFINED).is_ok());
    assert!(KeirosReveal::new(to_js(json!({ "reduced_motion": true }))).is_ok());
}

#[wasm_bindgen_test]
fn bad_config_is_an_error() {
    assert!(KeirosReveal::new(to_js(json!({ "reduced_motion": "yes" }))).is_err());
}

#[wasm_bindgen_test]
fn register_intersect_and_update() {
    let mut page = KeirosReveal::new(JsValue::NULL).unwrap();
    page.register(
        7,
        to_js(json!({ "type": "add_classes", "classes": ["animated"] })),
        JsValue::UNDEFINED,
    )
    .unwrap();

    let out = outputs(
        page.update(0.0, to_js(json!({ "entries": [{ "element": 7, "ratio": 0.4 }] })))
            .unwrap(),
    );
    assert!(out.mutations.contains(&DomMutation::AddClass {
        element: ElementId(7),
        class: "animated".into(),
    }));
    assert!(out
        .events
        .iter()
        .any(|e| matches!(e, RevealEvent::Fired { .. })));
    assert_eq!(page.state(7).unwrap().as_string().as_deref(), Some("Fired"));
    assert!(page.state(8).is_err());
}

#[wasm_bindgen_test]
fn direct_intersect_between_frames() {
    let mut page = KeirosReveal::new(JsValue::UNDEFINED).unwrap();
    page.register(
        3,
        to_js(json!({ "type": "add_classes", "classes": ["visible"] })),
        JsValue::UNDEFINED,
    )
    .unwrap();
    page.update(0.0, JsValue::UNDEFINED).unwrap();
    assert!(page.on_intersect(3, 0.5, 4000.0));
    assert!(!page.on_intersect(3, 0.9, 4100.0));
    let out = outputs(page.update(4200.0, JsValue::UNDEFINED).unwrap());
    assert!(out.mutations.contains(&DomMutation::AddClass {
        element: ElementId(3),
        class: "visible".into(),
    }));
}

#[wasm_bindgen_test]
fn install_snapshot_from_fixtures() {
    let spec: serde_json::Value = serde_json::from_str(PAGE).unwrap();
    let dom: serde_json::Value = serde_json::from_str(DOM).unwrap();
    let mut page = KeirosReveal::new(JsValue::UNDEFINED).unwrap();
    let report: InstallReport = swb::from_value(
        page.install_snapshot(to_js(spec), to_js(dom), 0.0).unwrap(),
    )
    .unwrap();
    assert!(report.skipped.is_empty());
    assert!(report.registered > 0);
    assert!(page.next_due_ms().is_some());
}

#[wasm_bindgen_test]
fn mailto_defaults_recipient() {
    let form = to_js(json!({
        "name": "Ada",
        "email": "ada@example.com",
        "message": "Hello"
    }));
    let url = compose_mailto(form, None).unwrap();
    assert!(url.starts_with("mailto:info@keiros.com?subject="));

    let bad = to_js(json!({ "name": "Ada", "email": "nope", "message": "Hi" }));
    assert!(compose_mailto(bad, None).is_err());
}
