//! Cascades: fixed per-index delays so a group reveals one item after another.

use serde::{Deserialize, Serialize};

use crate::ids::ElementId;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeStep {
    pub element: ElementId,
    /// Offset from the moment the group itself triggers.
    pub delay_ms: u32,
}

/// An ordered group with a constant step. Order is document order at registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeGroup {
    pub elements: Vec<ElementId>,
    #[serde(default)]
    pub base_delay_ms: u32,
    pub step_ms: u32,
}

impl CascadeGroup {
    pub fn steps(&self) -> Vec<CascadeStep> {
        cascade(&self.elements, self.base_delay_ms, self.step_ms)
    }
}

/// Element `i` lands at `base_delay_ms + i * step_ms`.
pub fn cascade(elements: &[ElementId], base_delay_ms: u32, step_ms: u32) -> Vec<CascadeStep> {
    elements
        .iter()
        .enumerate()
        .map(|(i, &element)| CascadeStep {
            element,
            delay_ms: base_delay_ms.saturating_add((i as u32).saturating_mul(step_ms)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_offset_shifts_every_step() {
        let els = [ElementId(4), ElementId(9)];
        let steps = cascade(&els, 800, 150);
        assert_eq!(steps[0].delay_ms, 800);
        assert_eq!(steps[1].delay_ms, 950);
        assert_eq!(steps[1].element, ElementId(9));
    }

    #[test]
    fn empty_group_has_no_steps() {
        assert!(cascade(&[], 0, 100).is_empty());
    }
}
