//! Input contracts for the page core.
//!
//! Hosts batch everything the browser reported since the last animation frame
//! and pass it into `Page::update()` once per frame.

use serde::{Deserialize, Serialize};

use crate::ids::ElementId;
use crate::oracle::{IntersectionEntry, Rect, Viewport};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Inputs {
    /// Native intersection entries (element + ratio).
    #[serde(default)]
    pub entries: Vec<IntersectionEntry>,
    /// Element geometry, for hosts without a native observer. Needs `viewport`.
    #[serde(default)]
    pub layouts: Vec<ElementLayout>,
    #[serde(default)]
    pub viewport: Option<Viewport>,
    /// Replaces the known section layout (on load and resize).
    #[serde(default)]
    pub sections: Option<Vec<SectionLayout>>,
    #[serde(default)]
    pub events: Vec<PageEvent>,
}

impl Inputs {
    pub fn intersect(element: ElementId, ratio: f64) -> Self {
        Self {
            entries: vec![IntersectionEntry { element, ratio }],
            ..Self::default()
        }
    }

    pub fn event(event: PageEvent) -> Self {
        Self {
            events: vec![event],
            ..Self::default()
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementLayout {
    pub element: ElementId,
    pub rect: Rect,
}

/// A `section[id]` in document coordinates (`offsetTop`, `offsetHeight`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectionLayout {
    pub id: String,
    pub top: f64,
    pub height: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageEvent {
    /// `window.pageYOffset` after a scroll.
    Scroll { y: f64 },
    Click { element: ElementId },
    /// Pointer over the tilt target; `rect` is the target's client box.
    PointerMove { x: f64, y: f64, rect: Rect },
    PointerLeave,
    /// `mouseenter` / `mouseleave` on an element.
    HoverStart { element: ElementId },
    HoverEnd { element: ElementId },
}
