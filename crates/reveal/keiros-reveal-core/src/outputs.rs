//! Output contracts from the page core.
//!
//! Outputs carry the DOM mutations for this frame, commands for the host's
//! observation/scrolling primitives, and a separate list of semantic events.
//! Adapters (wasm/JS) apply mutations and commands to the live document.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ids::ElementId;
use crate::oracle::ObserverOptions;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DomMutation {
    AddClass {
        element: ElementId,
        class: String,
    },
    RemoveClass {
        element: ElementId,
        class: String,
    },
    SetText {
        element: ElementId,
        text: String,
    },
    /// Inline style or custom property (`--bar-height`).
    SetStyle {
        element: ElementId,
        property: String,
        value: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum HostCommand {
    Observe {
        element: ElementId,
        options: ObserverOptions,
    },
    Unobserve {
        element: ElementId,
    },
    ScrollTo {
        top: f64,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
#[non_exhaustive]
pub enum RevealEvent {
    Fired {
        element: ElementId,
        action: String,
    },
    CounterFinished {
        element: ElementId,
        text: String,
    },
    ConnectorLinked {
        connector: ElementId,
    },
    SectionChanged {
        section: Option<String>,
    },
}

/// Outputs returned by `Page::update()`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub mutations: Vec<DomMutation>,
    #[serde(default)]
    pub commands: Vec<HostCommand>,
    #[serde(default)]
    pub events: Vec<RevealEvent>,
}

impl Outputs {
    pub fn with_capacity(mutations: usize) -> Self {
        Self {
            mutations: Vec::with_capacity(mutations),
            commands: Vec::new(),
            events: Vec::new(),
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.mutations.clear();
        self.commands.clear();
        self.events.clear();
    }

    #[inline]
    pub fn push_mutation(&mut self, m: DomMutation) {
        self.mutations.push(m);
    }

    #[inline]
    pub fn push_command(&mut self, c: HostCommand) {
        self.commands.push(c);
    }

    #[inline]
    pub fn push_event(&mut self, e: RevealEvent) {
        self.events.push(e);
    }

    pub fn add_class(&mut self, element: ElementId, class: &str) {
        self.push_mutation(DomMutation::AddClass {
            element,
            class: class.to_string(),
        });
    }

    pub fn remove_class(&mut self, element: ElementId, class: &str) {
        self.push_mutation(DomMutation::RemoveClass {
            element,
            class: class.to_string(),
        });
    }

    pub fn set_style(&mut self, element: ElementId, property: &str, value: impl Into<String>) {
        self.push_mutation(DomMutation::SetStyle {
            element,
            property: property.to_string(),
            value: value.into(),
        });
    }

    /// Move everything from `other` to the end of `self`.
    pub fn append(&mut self, other: &mut Outputs) {
        self.mutations.append(&mut other.mutations);
        self.commands.append(&mut other.commands);
        self.events.append(&mut other.events);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty() && self.commands.is_empty() && self.events.is_empty()
    }
}

/// Replays mutations into plain maps: the view a host document would end up with.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DomState {
    classes: BTreeMap<ElementId, BTreeSet<String>>,
    text: BTreeMap<ElementId, String>,
    styles: BTreeMap<ElementId, BTreeMap<String, String>>,
    text_writes: usize,
}

impl DomState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, outputs: &Outputs) {
        for m in &outputs.mutations {
            match m {
                DomMutation::AddClass { element, class } => {
                    self.classes
                        .entry(*element)
                        .or_default()
                        .insert(class.clone());
                }
                DomMutation::RemoveClass { element, class } => {
                    if let Some(set) = self.classes.get_mut(element) {
                        set.remove(class);
                    }
                }
                DomMutation::SetText { element, text } => {
                    self.text.insert(*element, text.clone());
                    self.text_writes += 1;
                }
                DomMutation::SetStyle {
                    element,
                    property,
                    value,
                } => {
                    self.styles
                        .entry(*element)
                        .or_default()
                        .insert(property.clone(), value.clone());
                }
            }
        }
    }

    pub fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.classes
            .get(&element)
            .is_some_and(|set| set.contains(class))
    }

    pub fn text(&self, element: ElementId) -> Option<&str> {
        self.text.get(&element).map(String::as_str)
    }

    pub fn style(&self, element: ElementId, property: &str) -> Option<&str> {
        self.styles
            .get(&element)
            .and_then(|s| s.get(property))
            .map(String::as_str)
    }

    pub fn text_writes(&self) -> usize {
        self.text_writes
    }
}
