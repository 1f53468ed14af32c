use js_sys::{Function, Object, Reflect};
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use keiros_reveal_core::{
    Action, Config, ContactForm, DomQuery, ElementId, Inputs, ObserverOptions, Outputs, Page,
    PageSpec, StaticDom, DEFAULT_RECIPIENT,
};

#[wasm_bindgen]
pub struct KeirosReveal {
    core: Page,
}

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

fn element_of(val: &JsValue) -> Option<ElementId> {
    val.as_f64()
        .filter(|n| n.fract() == 0.0 && *n >= 0.0 && *n <= f64::from(u32::MAX))
        .map(|n| ElementId(n as u32))
}

/// DOM lookups forwarded to JS callbacks. Element handles are the host's integer ids.
struct JsDom {
    query_all: Function,
    query_within: Function,
    attribute: Function,
    previous_sibling: Function,
    next_sibling: Function,
}

impl JsDom {
    fn from_object(obj: &Object) -> Result<Self, JsError> {
        let get = |name: &str| -> Result<Function, JsError> {
            Reflect::get(obj, &JsValue::from_str(name))
                .ok()
                .and_then(|v| v.dyn_into::<Function>().ok())
                .ok_or_else(|| JsError::new(&format!("install error: dom.{name} is not a function")))
        };
        Ok(Self {
            query_all: get("queryAll")?,
            query_within: get("queryWithin")?,
            attribute: get("attribute")?,
            previous_sibling: get("previousSibling")?,
            next_sibling: get("nextSibling")?,
        })
    }

    fn elements(val: Result<JsValue, JsValue>) -> Vec<ElementId> {
        match val {
            Ok(v) if !jsvalue_is_undefined_or_null(&v) => swb::from_value::<Vec<u32>>(v)
                .map(|ids| ids.into_iter().map(ElementId).collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    fn element(val: Result<JsValue, JsValue>) -> Option<ElementId> {
        val.ok().as_ref().and_then(element_of)
    }
}

impl DomQuery for JsDom {
    fn query_all(&self, selector: &str) -> Vec<ElementId> {
        Self::elements(
            self.query_all
                .call1(&JsValue::UNDEFINED, &JsValue::from_str(selector)),
        )
    }

    fn query_within(&self, root: ElementId, selector: &str) -> Vec<ElementId> {
        Self::elements(self.query_within.call2(
            &JsValue::UNDEFINED,
            &JsValue::from(root.0),
            &JsValue::from_str(selector),
        ))
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        self.attribute
            .call2(
                &JsValue::UNDEFINED,
                &JsValue::from(element.0),
                &JsValue::from_str(name),
            )
            .ok()
            .and_then(|v| v.as_string())
    }

    fn previous_sibling(&self, element: ElementId) -> Option<ElementId> {
        Self::element(
            self.previous_sibling
                .call1(&JsValue::UNDEFINED, &JsValue::from(element.0)),
        )
    }

    fn next_sibling(&self, element: ElementId) -> Option<ElementId> {
        Self::element(
            self.next_sibling
                .call1(&JsValue::UNDEFINED, &JsValue::from(element.0)),
        )
    }
}

#[wasm_bindgen]
impl KeirosReveal {
    /// Create a page core. Pass a config object or undefined/null for defaults.
    /// Example:
    ///   new KeirosReveal({ reduced_motion: matchMedia('(prefers-reduced-motion: reduce)').matches })
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<KeirosReveal, JsError> {
        console_error_panic_hook::set_once();

        let cfg: Config = if jsvalue_is_undefined_or_null(&config) {
            Config::default()
        } else {
            swb::from_value(config).map_err(|e| JsError::new(&format!("config error: {e}")))?
        };

        Ok(KeirosReveal {
            core: Page::new(cfg),
        })
    }

    /// Wire the page against the live document. `dom` exposes
    /// `queryAll(selector)`, `queryWithin(root, selector)`, `attribute(el, name)`,
    /// `previousSibling(el)` and `nextSibling(el)`. Returns the install report.
    #[wasm_bindgen]
    pub fn install(&mut self, spec: JsValue, dom: Object, now_ms: f64) -> Result<JsValue, JsError> {
        let spec: PageSpec =
            swb::from_value(spec).map_err(|e| JsError::new(&format!("install error: {e}")))?;
        let dom = JsDom::from_object(&dom)?;
        let report = self.core.install(&dom, &spec, now_ms);
        swb::to_value(&report).map_err(|e| JsError::new(&format!("install error: {e}")))
    }

    /// Same as `install`, against a serialized `StaticDom` snapshot.
    #[wasm_bindgen(js_name = install_snapshot)]
    pub fn install_snapshot(
        &mut self,
        spec: JsValue,
        snapshot: JsValue,
        now_ms: f64,
    ) -> Result<JsValue, JsError> {
        let spec: PageSpec =
            swb::from_value(spec).map_err(|e| JsError::new(&format!("install error: {e}")))?;
        let dom: StaticDom = swb::from_value(snapshot)
            .map_err(|e| JsError::new(&format!("install error: snapshot: {e}")))?;
        let report = self.core.install(&dom, &spec, now_ms);
        swb::to_value(&report).map_err(|e| JsError::new(&format!("install error: {e}")))
    }

    /// Register one element with a resolved action. `options` may be undefined for defaults.
    #[wasm_bindgen]
    pub fn register(&mut self, element: u32, action: JsValue, options: JsValue) -> Result<(), JsError> {
        let action: Action =
            swb::from_value(action).map_err(|e| JsError::new(&format!("register error: {e}")))?;
        let options: ObserverOptions = if jsvalue_is_undefined_or_null(&options) {
            ObserverOptions::default()
        } else {
            swb::from_value(options).map_err(|e| JsError::new(&format!("register error: {e}")))?
        };
        self.core
            .register(ElementId(element), action, options)
            .map(|_| ())
            .map_err(|e| JsError::new(&format!("register error: {e}")))
    }

    /// Deliver one intersection outside a frame. Returns whether the element fired;
    /// its mutations arrive with the next `update`.
    #[wasm_bindgen(js_name = on_intersect)]
    pub fn on_intersect(&mut self, element: u32, ratio: f64, now_ms: f64) -> bool {
        self.core.on_intersect(ElementId(element), ratio, now_ms)
    }

    /// Advance to `now_ms` (the rAF timestamp) with this frame's inputs. Returns Outputs.
    #[wasm_bindgen]
    pub fn update(&mut self, now_ms: f64, inputs_json: JsValue) -> Result<JsValue, JsError> {
        let inputs: Inputs = if jsvalue_is_undefined_or_null(&inputs_json) {
            Inputs::default()
        } else {
            swb::from_value(inputs_json).map_err(|e| JsError::new(&format!("inputs error: {e}")))?
        };
        let out: &Outputs = self.core.update(now_ms, inputs);
        swb::to_value(out).map_err(|e| JsError::new(&format!("outputs error: {e}")))
    }

    /// Whether the host should keep requesting animation frames.
    #[wasm_bindgen(js_name = needs_frame)]
    pub fn needs_frame(&self) -> bool {
        self.core.needs_frame()
    }

    /// Timestamp of the next timer, or undefined when none is queued.
    #[wasm_bindgen(js_name = next_due_ms)]
    pub fn next_due_ms(&self) -> Option<f64> {
        self.core.next_due_ms()
    }

    /// Trigger state of a registered element, `"Observed"` or `"Fired"`.
    #[wasm_bindgen]
    pub fn state(&self, element: u32) -> Result<JsValue, JsError> {
        let state = self
            .core
            .state(ElementId(element))
            .map_err(|e| JsError::new(&format!("state error: {e}")))?;
        swb::to_value(&state).map_err(|e| JsError::new(&format!("state error: {e}")))
    }
}

/// Validate a contact form and build its `mailto:` URL. `recipient` defaults to the site inbox.
#[wasm_bindgen]
pub fn compose_mailto(form: JsValue, recipient: Option<String>) -> Result<String, JsError> {
    let form: ContactForm =
        swb::from_value(form).map_err(|e| JsError::new(&format!("contact error: {e}")))?;
    form.compose_mailto(recipient.as_deref().unwrap_or(DEFAULT_RECIPIENT))
        .map_err(|e| JsError::new(&format!("contact error: {e}")))
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
