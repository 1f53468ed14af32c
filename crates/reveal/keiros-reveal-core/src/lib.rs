//! Keiros reveal core (browser-agnostic)
//!
//! Viewport-driven animation triggers for the Keiros site: a visibility oracle,
//! a one-shot trigger registry, count-up counters, cascades, and the page-level
//! state (nav, tabs, decorative loops) around them. Hosts feed batched browser
//! input into [`Page::update`] and apply the returned [`Outputs`].

pub mod config;
pub mod contact;
pub mod counter;
pub mod decor;
pub mod dom;
pub mod error;
pub mod format;
pub mod ids;
pub mod inputs;
pub mod nav;
pub mod oracle;
pub mod outputs;
pub mod page;
pub mod registry;
pub mod sequencer;
pub mod timers;
pub mod wiring;

// Re-exports for consumers (adapters)
pub use config::{Config, DuplicatePolicy, NavConfig, TiltConfig};
pub use contact::{ContactForm, DEFAULT_RECIPIENT};
pub use counter::{ease_out_cubic, CounterAnimation, CounterSpec};
pub use dom::{DomQuery, NodeSnapshot, StaticDom};
pub use error::{ContactError, RevealError};
pub use format::Formatter;
pub use ids::{ElementId, TimerId};
pub use inputs::{ElementLayout, Inputs, PageEvent, SectionLayout};
pub use oracle::{IntersectionEntry, Margin, ObserverOptions, Rect, Viewport, VisibilityOracle};
pub use outputs::{DomMutation, DomState, HostCommand, Outputs, RevealEvent};
pub use page::{InstallReport, Page};
pub use registry::{Action, Registration, TriggerRegistry, TriggerState};
pub use sequencer::{cascade, CascadeGroup, CascadeStep};
pub use timers::{PendingTimer, TimerQueue};
pub use wiring::{ActionTemplate, PageSpec, RevealRule};
