//! Decorative loops: OTA node cycling, flow pulses, hero parallax and device tilt.
//! None of these carry state beyond their own cursor; they only must not fail.

use crate::config::TiltConfig;
use crate::ids::ElementId;
use crate::oracle::Rect;
use crate::outputs::Outputs;

/// Lights one OTA node per step, then one idle step with none lit, then wraps.
#[derive(Clone, Debug)]
pub struct OtaCycle {
    nodes: Vec<ElementId>,
    cursor: usize,
}

impl OtaCycle {
    pub fn new(nodes: Vec<ElementId>) -> Self {
        Self { nodes, cursor: 0 }
    }

    pub fn step(&mut self, out: &mut Outputs) {
        for &node in &self.nodes {
            out.remove_class(node, "active");
        }
        if let Some(&node) = self.nodes.get(self.cursor) {
            out.add_class(node, "active");
            self.cursor += 1;
        } else {
            self.cursor = 0;
        }
    }
}

/// Dims every pulse, to be restored a short moment later.
#[derive(Clone, Debug)]
pub struct FlowPulse {
    pulses: Vec<ElementId>,
    dim_opacity: f64,
}

impl FlowPulse {
    pub fn new(pulses: Vec<ElementId>, dim_opacity: f64) -> Self {
        Self {
            pulses,
            dim_opacity,
        }
    }

    pub fn dim(&self, out: &mut Outputs) {
        for &p in &self.pulses {
            out.set_style(p, "opacity", self.dim_opacity.to_string());
        }
    }

    pub fn restore(&self, out: &mut Outputs) {
        for &p in &self.pulses {
            out.set_style(p, "opacity", "1");
        }
    }
}

/// Component tooltips: opacity 1 while hovered, 0 after.
#[derive(Clone, Debug, Default)]
pub struct Tooltips {
    pairs: Vec<(ElementId, ElementId)>,
}

impl Tooltips {
    pub fn new(pairs: Vec<(ElementId, ElementId)>) -> Self {
        Self { pairs }
    }

    /// Returns false when `component` has no tooltip.
    pub fn hover(&self, component: ElementId, shown: bool, out: &mut Outputs) -> bool {
        let Some(&(_, tip)) = self.pairs.iter().find(|(c, _)| *c == component) else {
            return false;
        };
        out.set_style(tip, "opacity", if shown { "1" } else { "0" });
        true
    }
}

pub fn parallax_transform(scroll_y: f64, speed: f64) -> String {
    format!("translateY({}px)", scroll_y * speed)
}

/// Smoothed Y rotation following the pointer across the device model.
#[derive(Clone, Debug)]
pub struct Tilt {
    element: ElementId,
    cfg: TiltConfig,
    rotation: f64,
    target: f64,
}

const SETTLE_DEG: f64 = 0.01;

impl Tilt {
    pub fn new(element: ElementId, cfg: TiltConfig) -> Self {
        Self {
            element,
            cfg,
            rotation: 0.0,
            target: 0.0,
        }
    }

    pub fn pointer_move(&mut self, x: f64, rect: Rect) {
        if rect.width <= 0.0 {
            return;
        }
        let center = rect.left + rect.width / 2.0;
        let mouse_x = (x - center) / rect.width;
        self.target = mouse_x * self.cfg.max_degrees;
    }

    pub fn pointer_leave(&mut self) {
        self.target = 0.0;
    }

    pub fn is_moving(&self) -> bool {
        (self.target - self.rotation).abs() > SETTLE_DEG
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Advance one frame; writes the transform while still moving.
    pub fn frame(&mut self, out: &mut Outputs) {
        if !self.is_moving() {
            return;
        }
        self.rotation += (self.target - self.rotation) * self.cfg.follow;
        if !self.is_moving() {
            self.rotation = self.target;
        }
        out.set_style(
            self.element,
            "transform",
            format!("rotateY({}deg)", self.rotation),
        );
    }
}
