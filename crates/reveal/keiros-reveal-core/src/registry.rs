//! Trigger registry: one action per observed element, fired at most once.
//!
//! Per element: `Observed -> (ratio > 0) -> Fired`. `Fired` is terminal. The
//! registry only decides; the page applies the returned [`Fire`] (mutations,
//! timers, unobserve).

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::config::DuplicatePolicy;
use crate::counter::CounterSpec;
use crate::error::RevealError;
use crate::ids::ElementId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    AddClasses {
        classes: Vec<String>,
    },
    StartCounter {
        /// Node whose text the counter writes (often a child of the observed card).
        text_target: ElementId,
        spec: CounterSpec,
        #[serde(default)]
        delay_ms: u32,
        /// Marker classes added to the observed element on fire.
        #[serde(default)]
        classes: Vec<String>,
    },
    CascadeChildren {
        children: Vec<ElementId>,
        /// Added to each child at its cascade slot.
        #[serde(default)]
        classes: Vec<String>,
        /// Added to the container itself on fire.
        #[serde(default)]
        container_classes: Vec<String>,
        #[serde(default)]
        base_delay_ms: u32,
        step_ms: u32,
    },
    FillBar {
        percent: f64,
        #[serde(default)]
        classes: Vec<String>,
    },
}

impl Action {
    pub fn add_classes<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Action::AddClasses {
            classes: classes.into_iter().map(Into::into).collect(),
        }
    }

    /// Cascade containers stay observed after firing; everything else is unobserved.
    #[inline]
    pub fn keeps_observing(&self) -> bool {
        matches!(self, Action::CascadeChildren { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Action::AddClasses { .. } => "add_classes",
            Action::StartCounter { .. } => "start_counter",
            Action::CascadeChildren { .. } => "cascade_children",
            Action::FillBar { .. } => "fill_bar",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerState {
    Observed,
    Fired,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Registration {
    Inserted,
    /// An earlier action was swapped out (replace policy).
    Replaced,
}

/// Decision returned when an element fires.
#[derive(Clone, Debug, PartialEq)]
pub struct Fire {
    pub element: ElementId,
    pub action: Action,
    pub unobserve: bool,
}

#[derive(Debug)]
struct Target {
    action: Action,
    state: TriggerState,
}

#[derive(Debug, Default)]
pub struct TriggerRegistry {
    policy: DuplicatePolicy,
    targets: HashMap<ElementId, Target>,
    fired: usize,
}

impl TriggerRegistry {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            targets: HashMap::new(),
            fired: 0,
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Attach `action` to `element`. A fired element keeps its `Fired` state even
    /// when its action is replaced, so the replacement never runs.
    pub fn register(
        &mut self,
        element: ElementId,
        action: Action,
    ) -> Result<Registration, RevealError> {
        match self.targets.get_mut(&element) {
            None => {
                self.targets.insert(
                    element,
                    Target {
                        action,
                        state: TriggerState::Observed,
                    },
                );
                Ok(Registration::Inserted)
            }
            Some(_) if self.policy == DuplicatePolicy::Reject => {
                Err(RevealError::DuplicateRegistration { element })
            }
            Some(target) => {
                log::debug!(
                    "replacing {} action on {element} with {}",
                    target.action.kind(),
                    action.kind()
                );
                target.action = action;
                Ok(Registration::Replaced)
            }
        }
    }

    /// Process one intersection. Returns the action to run the first time the
    /// element is visible; every later call is a no-op.
    pub fn on_intersect(&mut self, element: ElementId, ratio: f64) -> Option<Fire> {
        if ratio <= 0.0 {
            return None;
        }
        let target = self.targets.get_mut(&element)?;
        if target.state == TriggerState::Fired {
            return None;
        }
        target.state = TriggerState::Fired;
        self.fired += 1;
        log::debug!("fired {} on {element} at ratio {ratio:.3}", target.action.kind());
        Some(Fire {
            element,
            unobserve: !target.action.keeps_observing(),
            action: target.action.clone(),
        })
    }

    pub fn state(&self, element: ElementId) -> Option<TriggerState> {
        self.targets.get(&element).map(|t| t.state)
    }

    #[inline]
    pub fn is_fired(&self, element: ElementId) -> bool {
        self.state(element) == Some(TriggerState::Fired)
    }

    pub fn action(&self, element: ElementId) -> Option<&Action> {
        self.targets.get(&element).map(|t| &t.action)
    }

    pub fn fired_count(&self) -> usize {
        self.fired
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_ratio_does_not_fire() {
        let mut reg = TriggerRegistry::new(DuplicatePolicy::Replace);
        reg.register(ElementId(1), Action::add_classes(["visible"]))
            .unwrap();
        assert!(reg.on_intersect(ElementId(1), 0.0).is_none());
        assert_eq!(reg.state(ElementId(1)), Some(TriggerState::Observed));
    }

    #[test]
    fn unknown_elements_are_ignored() {
        let mut reg = TriggerRegistry::default();
        assert!(reg.on_intersect(ElementId(42), 1.0).is_none());
        assert_eq!(reg.state(ElementId(42)), None);
    }

    #[test]
    fn cascade_containers_stay_observed() {
        let mut reg = TriggerRegistry::default();
        reg.register(
            ElementId(0),
            Action::CascadeChildren {
                children: vec![ElementId(1), ElementId(2)],
                classes: vec!["animated".into()],
                container_classes: vec![],
                base_delay_ms: 0,
                step_ms: 100,
            },
        )
        .unwrap();
        let fire = reg.on_intersect(ElementId(0), 0.4).unwrap();
        assert!(!fire.unobserve);
        assert!(reg.on_intersect(ElementId(0), 0.9).is_none());
    }

    #[test]
    fn action_serde_is_tagged() {
        let a: Action =
            serde_json::from_str(r#"{ "type": "add_classes", "classes": ["visible"] }"#).unwrap();
        assert_eq!(a, Action::add_classes(["visible"]));
    }
}
