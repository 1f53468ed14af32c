//! Navigation and tab state. Unlike reveal triggers these toggle back and forth,
//! keyed by clicks and scroll position rather than intersection.

use crate::config::NavConfig;
use crate::ids::ElementId;
use crate::inputs::SectionLayout;
use crate::outputs::Outputs;

const ACTIVE: &str = "active";
const SCROLLED: &str = "scrolled";

/// Coalesces bursts of scroll events into one evaluation per frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameThrottle {
    ticking: bool,
}

impl FrameThrottle {
    /// True when this call is the one that requested the frame.
    pub fn request(&mut self) -> bool {
        if self.ticking {
            return false;
        }
        self.ticking = true;
        true
    }

    /// Consume a pending request at frame time.
    pub fn take(&mut self) -> bool {
        std::mem::replace(&mut self.ticking, false)
    }

    pub fn is_pending(&self) -> bool {
        self.ticking
    }
}

#[derive(Clone, Debug, Default)]
pub struct NavElements {
    pub nav: Option<ElementId>,
    pub toggle: Option<ElementId>,
    pub menu: Option<ElementId>,
    /// Nav links with the section id their `href="#…"` points at.
    pub links: Vec<(ElementId, Option<String>)>,
}

#[derive(Debug)]
pub struct NavState {
    cfg: NavConfig,
    els: NavElements,
    menu_open: bool,
    scrolled: bool,
    active_link: Option<ElementId>,
    active_section: Option<String>,
    scroll_y: f64,
    throttle: FrameThrottle,
}

impl NavState {
    pub fn new(cfg: NavConfig, els: NavElements) -> Self {
        Self {
            cfg,
            els,
            menu_open: false,
            scrolled: false,
            active_link: None,
            active_section: None,
            scroll_y: 0.0,
            throttle: FrameThrottle::default(),
        }
    }

    pub fn is_menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn active_link(&self) -> Option<ElementId> {
        self.active_link
    }

    pub fn active_section(&self) -> Option<&str> {
        self.active_section.as_deref()
    }

    pub fn is_toggle(&self, element: ElementId) -> bool {
        self.els.toggle == Some(element)
    }

    pub fn is_link(&self, element: ElementId) -> bool {
        self.els.links.iter().any(|(l, _)| *l == element)
    }

    pub fn frame_pending(&self) -> bool {
        self.throttle.is_pending()
    }

    fn set_menu(&mut self, open: bool, out: &mut Outputs) {
        if self.menu_open == open {
            return;
        }
        self.menu_open = open;
        for el in [self.els.menu, self.els.toggle].into_iter().flatten() {
            if open {
                out.add_class(el, ACTIVE);
            } else {
                out.remove_class(el, ACTIVE);
            }
        }
    }

    pub fn toggle_menu(&mut self, out: &mut Outputs) {
        let open = !self.menu_open;
        self.set_menu(open, out);
    }

    /// Clicking any nav link closes the mobile menu.
    pub fn link_clicked(&mut self, out: &mut Outputs) {
        self.set_menu(false, out);
    }

    /// Record a scroll position; returns whether a frame was newly requested.
    pub fn on_scroll(&mut self, y: f64) -> bool {
        self.scroll_y = y;
        self.throttle.request()
    }

    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    /// Force an evaluation on the next frame (initial activation on page ready).
    pub fn request_frame(&mut self) {
        self.throttle.request();
    }

    /// Evaluate the pending scroll once: nav `scrolled` state and the active link.
    pub fn frame(&mut self, sections: &[SectionLayout], out: &mut Outputs) -> bool {
        if !self.throttle.take() {
            return false;
        }
        let y = self.scroll_y;

        let scrolled = y > self.cfg.scrolled_threshold_px;
        if scrolled != self.scrolled {
            self.scrolled = scrolled;
            if let Some(nav) = self.els.nav {
                if scrolled {
                    out.add_class(nav, SCROLLED);
                } else {
                    out.remove_class(nav, SCROLLED);
                }
            }
        }

        // Later sections win when windows overlap; no match keeps the current link.
        let Some(current) = sections.iter().rev().find(|s| {
            let top = s.top - self.cfg.section_offset_px;
            y > top && y <= top + s.height
        }) else {
            return true;
        };
        if self.active_section.as_deref() == Some(current.id.as_str()) {
            return true;
        }
        self.active_section = Some(current.id.clone());
        let link = self
            .els
            .links
            .iter()
            .find(|(_, target)| target.as_deref() == Some(current.id.as_str()))
            .map(|(l, _)| *l);
        if link != self.active_link {
            if let Some(old) = self.active_link {
                out.remove_class(old, ACTIVE);
            }
            if let Some(new) = link {
                out.add_class(new, ACTIVE);
            }
            self.active_link = link;
        }
        true
    }
}

/// Tabs and their panels, paired by a shared `data-tab` value.
#[derive(Clone, Debug, Default)]
pub struct TabGroup {
    pub tabs: Vec<(ElementId, String)>,
    pub panels: Vec<(ElementId, String)>,
    active: Option<String>,
}

impl TabGroup {
    pub fn new(tabs: Vec<(ElementId, String)>, panels: Vec<(ElementId, String)>) -> Self {
        Self {
            tabs,
            panels,
            active: None,
        }
    }

    pub fn contains(&self, element: ElementId) -> bool {
        self.tabs.iter().any(|(t, _)| *t == element)
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Activate the clicked tab and its panel, clearing every other one.
    pub fn click(&mut self, tab: ElementId, out: &mut Outputs) -> bool {
        let Some((_, key)) = self.tabs.iter().find(|(t, _)| *t == tab) else {
            return false;
        };
        let key = key.clone();
        for (el, _) in self.tabs.iter().chain(self.panels.iter()) {
            out.remove_class(*el, ACTIVE);
        }
        out.add_class(tab, ACTIVE);
        if let Some((panel, _)) = self.panels.iter().find(|(_, k)| *k == key) {
            out.add_class(*panel, ACTIVE);
        }
        self.active = Some(key);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::DomMutation;

    #[test]
    fn throttle_coalesces() {
        let mut t = FrameThrottle::default();
        assert!(t.request());
        assert!(!t.request());
        assert!(t.take());
        assert!(!t.take());
        assert!(t.request());
    }

    #[test]
    fn tab_click_switches_panel() {
        let mut tabs = TabGroup::new(
            vec![(ElementId(1), "hw".into()), (ElementId(2), "fw".into())],
            vec![(ElementId(3), "hw".into()), (ElementId(4), "fw".into())],
        );
        let mut out = Outputs::default();
        assert!(tabs.click(ElementId(2), &mut out));
        assert_eq!(tabs.active(), Some("fw"));
        let adds: Vec<_> = out
            .mutations
            .iter()
            .filter_map(|m| match m {
                DomMutation::AddClass { element, .. } => Some(*element),
                _ => None,
            })
            .collect();
        assert_eq!(adds, vec![ElementId(2), ElementId(4)]);

        let mut out = Outputs::default();
        assert!(!tabs.click(ElementId(3), &mut out));
        assert!(out.is_empty());
    }
}
