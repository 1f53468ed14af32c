//! Page: owns the reveal state of one document and turns batched browser
//! input into DOM mutations.
//!
//! Methods:
//! - new, install (wiring from a [`PageSpec`]), register, register_on_visible
//! - on_intersect (direct trigger), update (per animation frame)
//! - needs_frame / next_due_ms (host scheduling hints)

use crate::config::Config;
use crate::counter::{CounterAnimation, CounterSpec};
use crate::decor::{parallax_transform, FlowPulse, OtaCycle, Tilt, Tooltips};
use crate::dom::DomQuery;
use crate::error::RevealError;
use crate::ids::{CounterId, ElementId, IdAllocator};
use crate::inputs::{Inputs, PageEvent, SectionLayout};
use crate::nav::{NavElements, NavState, TabGroup};
use crate::oracle::{
    coalesce, intersection_ratio, IntersectionEntry, ObserverOptions, Viewport, VisibilityOracle,
};
use crate::outputs::{DomMutation, HostCommand, Outputs, RevealEvent};
use crate::registry::{Action, Fire, Registration, TriggerRegistry, TriggerState};
use crate::sequencer::cascade;
use crate::timers::{PendingTimer, TimerQueue};
use crate::wiring::{
    ActionTemplate, ConnectorRule, DecorSpec, IntroCascade, NavSpec, PageSpec, StaggerSpec,
    TabSpec,
};
use serde::{Deserialize, Serialize};

const REDUCED_MOTION_CLASS: &str = "reduced-motion";

/// Deferred work, run by the timer queue.
#[derive(Clone, Debug)]
enum PageTask {
    /// Cascade or intro step: add classes and inline styles to one element.
    Reveal {
        element: ElementId,
        classes: Vec<String>,
        styles: Vec<(String, String)>,
    },
    StartCounter {
        element: ElementId,
        text_target: ElementId,
        spec: CounterSpec,
    },
    LinkConnector {
        connector: ElementId,
        classes: Vec<String>,
    },
    OtaStep,
    PulseDim,
    PulseRestore,
}

#[derive(Debug)]
struct RunningCounter {
    id: CounterId,
    element: ElementId,
    text_target: ElementId,
    anim: CounterAnimation,
}

/// Connector sitting between two items; lights up once both have fired.
#[derive(Debug)]
struct Connector {
    connector: ElementId,
    prev: ElementId,
    next: ElementId,
    classes: Vec<String>,
    linked: bool,
}

#[derive(Debug)]
struct Pulse {
    pulse: FlowPulse,
    dim_ms: u32,
}

/// What `install` wired up, and what it had to skip.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InstallReport {
    pub registered: usize,
    pub skipped: Vec<RevealError>,
}

impl InstallReport {
    fn skip(&mut self, err: RevealError) {
        log::warn!("skipping registration ({}): {err}", err.category());
        self.skipped.push(err);
    }
}

#[derive(Debug)]
pub struct Page {
    // Owned state
    cfg: Config,
    ids: IdAllocator,
    oracle: VisibilityOracle,
    registry: TriggerRegistry,
    timers: TimerQueue<PageTask>,
    counters: Vec<RunningCounter>,
    connectors: Vec<Connector>,

    // Non one-shot state
    nav: Option<NavState>,
    tabs: Vec<TabGroup>,
    /// In-page anchors and the section id each scrolls to.
    anchors: Vec<(ElementId, String)>,
    tooltips: Option<Tooltips>,
    ota: Option<OtaCycle>,
    pulse: Option<Pulse>,
    parallax: Option<ElementId>,
    tilt: Option<Tilt>,
    sections: Vec<SectionLayout>,
    viewport: Option<Viewport>,
    scroll_y: f64,
    parallax_dirty: bool,
    now_ms: f64,

    // Written outside update(), flushed at the start of the next frame.
    pending: Outputs,
    // Per-tick outputs
    outputs: Outputs,
}

impl Page {
    pub fn new(cfg: Config) -> Self {
        Self {
            registry: TriggerRegistry::new(cfg.duplicate_policy),
            pending: Outputs::with_capacity(cfg.max_mutations_per_tick),
            outputs: Outputs::with_capacity(cfg.max_mutations_per_tick),
            cfg,
            ids: IdAllocator::new(),
            oracle: VisibilityOracle::new(),
            timers: TimerQueue::new(),
            counters: Vec::new(),
            connectors: Vec::new(),
            nav: None,
            tabs: Vec::new(),
            anchors: Vec::new(),
            tooltips: None,
            ota: None,
            pulse: None,
            parallax: None,
            tilt: None,
            sections: Vec::new(),
            viewport: None,
            scroll_y: 0.0,
            parallax_dirty: false,
            now_ms: 0.0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// The page clock never runs backwards.
    fn advance_clock(&mut self, now_ms: f64) {
        if now_ms.is_finite() {
            self.now_ms = self.now_ms.max(now_ms);
        }
    }

    fn delay(&self, ms: u32) -> u32 {
        if self.cfg.reduced_motion {
            0
        } else {
            ms
        }
    }

    /// Wire a whole page. Never fails: anything unresolvable is logged and listed in the report.
    pub fn install(&mut self, dom: &dyn DomQuery, spec: &PageSpec, now_ms: f64) -> InstallReport {
        self.now_ms = now_ms;
        let mut report = InstallReport::default();

        if self.cfg.reduced_motion {
            match dom.query_first("body") {
                Some(body) => self.pending.add_class(body, REDUCED_MOTION_CLASS),
                None => log::debug!("no body element; reduced-motion class not applied"),
            }
        }

        for rule in &spec.reveals {
            if let Err(err) = self.register_matches(
                dom,
                &rule.selector,
                rule.options.clone(),
                &rule.action,
                &mut report,
            ) {
                report.skip(err);
            }
        }
        for intro in &spec.intros {
            if let Err(err) = self.install_intro(dom, intro) {
                report.skip(err);
            }
        }
        if let Some(rule) = &spec.connectors {
            if let Err(err) = self.install_connectors(dom, rule) {
                report.skip(err);
            }
        }
        if let Some(nav) = &spec.nav {
            if let Err(err) = self.install_nav(dom, nav) {
                report.skip(err);
            }
        }
        for tabs in &spec.tabs {
            if let Err(err) = self.install_tabs(dom, tabs) {
                report.skip(err);
            }
        }
        if let Some(selector) = &spec.anchors {
            if let Err(err) = self.install_anchors(dom, selector) {
                report.skip(err);
            }
        }
        for stagger in &spec.staggers {
            if let Err(err) = self.install_stagger(dom, stagger) {
                report.skip(err);
            }
        }
        self.install_decor(dom, &spec.decor, &mut report);

        log::debug!(
            "installed {} reveal target(s), {} skipped",
            report.registered,
            report.skipped.len()
        );
        report
    }

    /// Register one element. Emits `HostCommand::Observe` unless the element already fired.
    pub fn register(
        &mut self,
        element: ElementId,
        action: Action,
        options: ObserverOptions,
    ) -> Result<Registration, RevealError> {
        let options = options.normalized()?;
        let registration = self.registry.register(element, action)?;
        if self.registry.is_fired(element) {
            log::debug!("{element} already fired; action replaced without re-observing");
            return Ok(registration);
        }
        self.oracle.observe(element, options.clone());
        self.pending
            .push_command(HostCommand::Observe { element, options });
        Ok(registration)
    }

    /// Resolve `template` for every element matching `selector` and register each.
    /// Returns how many were registered; elements that fail to resolve are logged and skipped.
    pub fn register_on_visible(
        &mut self,
        dom: &dyn DomQuery,
        selector: &str,
        options: ObserverOptions,
        template: &ActionTemplate,
    ) -> Result<usize, RevealError> {
        let mut report = InstallReport::default();
        self.register_matches(dom, selector, options, template, &mut report)?;
        Ok(report.registered)
    }

    fn register_matches(
        &mut self,
        dom: &dyn DomQuery,
        selector: &str,
        options: ObserverOptions,
        template: &ActionTemplate,
        report: &mut InstallReport,
    ) -> Result<(), RevealError> {
        let options = options.normalized()?;
        let elements = dom.query_all(selector);
        if elements.is_empty() {
            return Err(RevealError::MissingElement {
                selector: selector.to_string(),
            });
        }
        for element in elements {
            let registered = template
                .resolve(dom, element, &self.cfg)
                .and_then(|action| self.register(element, action, options.clone()));
            match registered {
                Ok(_) => report.registered += 1,
                Err(err) => report.skip(err),
            }
        }
        Ok(())
    }

    fn install_intro(&mut self, dom: &dyn DomQuery, intro: &IntroCascade) -> Result<(), RevealError> {
        let elements = dom.query_all(&intro.selector);
        if elements.is_empty() {
            return Err(RevealError::MissingElement {
                selector: intro.selector.clone(),
            });
        }
        let styles: Vec<(String, String)> = intro
            .styles
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for step in cascade(&elements, intro.base_delay_ms, intro.step_ms) {
            self.schedule_task(
                step.delay_ms,
                PageTask::Reveal {
                    element: step.element,
                    classes: intro.classes.clone(),
                    styles: styles.clone(),
                },
            );
        }
        Ok(())
    }

    fn install_connectors(&mut self, dom: &dyn DomQuery, rule: &ConnectorRule) -> Result<(), RevealError> {
        let found = dom.query_all(&rule.connector_selector);
        if found.is_empty() {
            return Err(RevealError::MissingElement {
                selector: rule.connector_selector.clone(),
            });
        }
        for connector in found {
            let prev = dom
                .previous_sibling(connector)
                .filter(|&p| dom.has_class(p, &rule.item_class));
            let next = dom
                .next_sibling(connector)
                .filter(|&n| dom.has_class(n, &rule.item_class));
            match (prev, next) {
                (Some(prev), Some(next)) => self.connectors.push(Connector {
                    connector,
                    prev,
                    next,
                    classes: rule.classes.clone(),
                    linked: false,
                }),
                _ => log::debug!("connector {connector} is not between two items; ignored"),
            }
        }
        Ok(())
    }

    fn install_nav(&mut self, dom: &dyn DomQuery, spec: &NavSpec) -> Result<(), RevealError> {
        let first = |sel: &Option<String>| sel.as_deref().and_then(|s| dom.query_first(s));
        let links: Vec<(ElementId, Option<String>)> = dom
            .query_all(&spec.links)
            .into_iter()
            .map(|l| {
                let target = dom
                    .attribute(l, "href")
                    .and_then(|h| h.strip_prefix('#').map(str::to_string))
                    .filter(|id| !id.is_empty());
                (l, target)
            })
            .collect();
        if links.is_empty() {
            return Err(RevealError::MissingElement {
                selector: spec.links.clone(),
            });
        }
        for (link, target) in &links {
            if let Some(target) = target {
                self.add_anchor(*link, target.clone());
            }
        }
        let els = NavElements {
            nav: first(&spec.nav),
            toggle: first(&spec.toggle),
            menu: first(&spec.menu),
            links,
        };
        let mut nav = NavState::new(self.cfg.nav, els);
        nav.request_frame();
        self.nav = Some(nav);
        Ok(())
    }

    fn add_anchor(&mut self, element: ElementId, target: String) {
        if !self.anchors.iter().any(|(a, _)| *a == element) {
            self.anchors.push((element, target));
        }
    }

    fn install_anchors(&mut self, dom: &dyn DomQuery, selector: &str) -> Result<(), RevealError> {
        let found = dom.query_all(selector);
        if found.is_empty() {
            return Err(RevealError::MissingElement {
                selector: selector.to_string(),
            });
        }
        for anchor in found {
            let target = dom
                .attribute(anchor, "href")
                .and_then(|h| h.strip_prefix('#').map(str::to_string))
                .filter(|id| !id.is_empty());
            match target {
                Some(target) => self.add_anchor(anchor, target),
                None => log::debug!("anchor {anchor} has no in-page target; ignored"),
            }
        }
        Ok(())
    }

    /// Sets `property` to each element's cascade delay in seconds (`0s`, `0.1s`, ...).
    fn install_stagger(&mut self, dom: &dyn DomQuery, spec: &StaggerSpec) -> Result<(), RevealError> {
        let elements = dom.query_all(&spec.selector);
        if elements.is_empty() {
            return Err(RevealError::MissingElement {
                selector: spec.selector.clone(),
            });
        }
        for step in cascade(&elements, 0, spec.step_ms) {
            let secs = f64::from(self.delay(step.delay_ms)) / 1000.0;
            self.pending
                .set_style(step.element, &spec.property, format!("{secs}s"));
        }
        Ok(())
    }

    /// Where clicking `element` scrolls to: its section's top, clear of the fixed header.
    fn anchor_scroll(&self, element: ElementId) -> Option<f64> {
        let (_, target) = self.anchors.iter().find(|(a, _)| *a == element)?;
        let section = self.sections.iter().find(|s| &s.id == target)?;
        Some(section.top - self.cfg.nav.anchor_offset_px)
    }

    fn install_tabs(&mut self, dom: &dyn DomQuery, spec: &TabSpec) -> Result<(), RevealError> {
        let keyed = |selector: &str| -> Vec<(ElementId, String)> {
            dom.query_all(selector)
                .into_iter()
                .filter_map(|el| dom.attribute(el, &spec.attribute).map(|k| (el, k)))
                .collect()
        };
        let tabs = keyed(&spec.tabs);
        if tabs.is_empty() {
            return Err(RevealError::MissingElement {
                selector: spec.tabs.clone(),
            });
        }
        self.tabs.push(TabGroup::new(tabs, keyed(&spec.panels)));
        Ok(())
    }

    fn install_decor(&mut self, dom: &dyn DomQuery, decor: &DecorSpec, report: &mut InstallReport) {
        if let Some(ota) = &decor.ota {
            let nodes = dom.query_all(&ota.selector);
            if nodes.is_empty() {
                report.skip(RevealError::MissingElement {
                    selector: ota.selector.clone(),
                });
            } else {
                self.ota = Some(OtaCycle::new(nodes));
                self.timers
                    .schedule_interval(self.now_ms, f64::from(ota.period_ms), PageTask::OtaStep);
            }
        }
        if let Some(pulse) = &decor.pulse {
            let pulses = dom.query_all(&pulse.selector);
            if pulses.is_empty() {
                report.skip(RevealError::MissingElement {
                    selector: pulse.selector.clone(),
                });
            } else {
                self.pulse = Some(Pulse {
                    pulse: FlowPulse::new(pulses, pulse.dim_opacity),
                    dim_ms: pulse.dim_ms,
                });
                self.timers.schedule_interval(
                    self.now_ms,
                    f64::from(pulse.period_ms),
                    PageTask::PulseDim,
                );
            }
        }
        if let Some(sel) = &decor.parallax {
            self.parallax = dom.query_first(sel);
            if self.parallax.is_none() {
                report.skip(RevealError::MissingElement {
                    selector: sel.clone(),
                });
            }
        }
        if let Some(spec) = &decor.tooltips {
            let triggers = dom.query_all(&spec.trigger);
            if triggers.is_empty() {
                report.skip(RevealError::MissingElement {
                    selector: spec.trigger.clone(),
                });
            } else {
                let pairs = triggers
                    .into_iter()
                    .filter_map(|t| {
                        dom.query_within(t, &spec.tooltip)
                            .into_iter()
                            .next()
                            .map(|tip| (t, tip))
                    })
                    .collect();
                self.tooltips = Some(Tooltips::new(pairs));
            }
        }
        if let Some(sel) = &decor.tilt {
            match dom.query_first(sel) {
                Some(el) => self.tilt = Some(Tilt::new(el, self.cfg.tilt)),
                None => report.skip(RevealError::MissingElement {
                    selector: sel.clone(),
                }),
            }
        }
    }

    fn schedule_task(&mut self, delay_ms: u32, task: PageTask) {
        let delay = self.delay(delay_ms);
        let id = self.timers.schedule(self.now_ms, f64::from(delay), task);
        log::debug!("scheduled timer {} at +{delay}ms", id.0);
    }

    /// Feed one intersection straight into the registry, bypassing the oracle.
    /// `now_ms` anchors the delays and counters it starts; hosts may call this
    /// between frames. Returns whether the element fired.
    pub fn on_intersect(&mut self, element: ElementId, ratio: f64, now_ms: f64) -> bool {
        self.advance_clock(now_ms);
        match self.registry.on_intersect(element, ratio) {
            Some(fire) => {
                self.apply_fire(fire);
                true
            }
            None => false,
        }
    }

    fn apply_fire(&mut self, fire: Fire) {
        let Fire {
            element,
            action,
            unobserve,
        } = fire;
        log::debug!("{element} fired ({})", action.kind());
        self.pending.push_event(RevealEvent::Fired {
            element,
            action: action.kind().to_string(),
        });
        match action {
            Action::AddClasses { classes } => {
                for class in &classes {
                    self.pending.add_class(element, class);
                }
            }
            Action::StartCounter {
                text_target,
                spec,
                delay_ms,
                classes,
            } => {
                for class in &classes {
                    self.pending.add_class(element, class);
                }
                if self.delay(delay_ms) == 0 {
                    self.start_counter(element, text_target, spec);
                } else {
                    self.schedule_task(
                        delay_ms,
                        PageTask::StartCounter {
                            element,
                            text_target,
                            spec,
                        },
                    );
                }
            }
            Action::CascadeChildren {
                children,
                classes,
                container_classes,
                base_delay_ms,
                step_ms,
            } => {
                for class in &container_classes {
                    self.pending.add_class(element, class);
                }
                for step in cascade(&children, base_delay_ms, step_ms) {
                    self.schedule_task(
                        step.delay_ms,
                        PageTask::Reveal {
                            element: step.element,
                            classes: classes.clone(),
                            styles: Vec::new(),
                        },
                    );
                }
            }
            Action::FillBar { percent, classes } => {
                self.pending
                    .set_style(element, "--bar-height", format!("{percent}%"));
                for class in &classes {
                    self.pending.add_class(element, class);
                }
            }
        }
        if unobserve {
            self.oracle.unobserve(element);
            self.pending
                .push_command(HostCommand::Unobserve { element });
        }
        self.link_connectors();
    }

    fn start_counter(&mut self, element: ElementId, text_target: ElementId, spec: CounterSpec) {
        let mut anim = CounterAnimation::start(spec, self.now_ms);
        if self.cfg.reduced_motion {
            anim.jump_to_end();
        }
        let id = self.ids.alloc_counter();
        log::debug!("counter {} started on {text_target}", id.0);
        self.counters.push(RunningCounter {
            id,
            element,
            text_target,
            anim,
        });
    }

    fn link_connectors(&mut self) {
        let mut ready = Vec::new();
        for c in self.connectors.iter_mut().filter(|c| !c.linked) {
            if self.registry.is_fired(c.prev) && self.registry.is_fired(c.next) {
                c.linked = true;
                ready.push((c.connector, c.classes.clone()));
            }
        }
        for (connector, classes) in ready {
            self.schedule_task(
                self.cfg.connector_delay_ms,
                PageTask::LinkConnector { connector, classes },
            );
        }
    }

    fn run_task(&mut self, task: PageTask) {
        match task {
            PageTask::Reveal {
                element,
                classes,
                styles,
            } => {
                for class in &classes {
                    self.pending.add_class(element, class);
                }
                for (property, value) in styles {
                    self.pending.set_style(element, &property, value);
                }
            }
            PageTask::StartCounter {
                element,
                text_target,
                spec,
            } => self.start_counter(element, text_target, spec),
            PageTask::LinkConnector { connector, classes } => {
                for class in &classes {
                    self.pending.add_class(connector, class);
                }
                self.pending
                    .push_event(RevealEvent::ConnectorLinked { connector });
            }
            PageTask::OtaStep => {
                if let Some(ota) = self.ota.as_mut() {
                    ota.step(&mut self.pending);
                }
            }
            PageTask::PulseDim => {
                if let Some(p) = &self.pulse {
                    p.pulse.dim(&mut self.pending);
                    let dim_ms = p.dim_ms;
                    self.timers
                        .schedule(self.now_ms, f64::from(dim_ms), PageTask::PulseRestore);
                }
            }
            PageTask::PulseRestore => {
                if let Some(p) = &self.pulse {
                    p.pulse.restore(&mut self.pending);
                }
            }
        }
    }

    fn apply_event(&mut self, event: PageEvent) {
        match event {
            PageEvent::Scroll { y } => {
                self.scroll_y = y;
                self.parallax_dirty = self.parallax.is_some();
                if let Some(nav) = self.nav.as_mut() {
                    nav.on_scroll(y);
                }
            }
            PageEvent::Click { element } => {
                if let Some(nav) = self.nav.as_mut() {
                    if nav.is_toggle(element) {
                        nav.toggle_menu(&mut self.pending);
                    } else if nav.is_link(element) {
                        nav.link_clicked(&mut self.pending);
                    }
                }
                if let Some(top) = self.anchor_scroll(element) {
                    self.pending.push_command(HostCommand::ScrollTo { top });
                }
                for group in self.tabs.iter_mut().filter(|g| g.contains(element)) {
                    group.click(element, &mut self.pending);
                }
            }
            PageEvent::PointerMove { x, rect, .. } => {
                if let Some(tilt) = self.tilt.as_mut() {
                    tilt.pointer_move(x, rect);
                }
            }
            PageEvent::PointerLeave => {
                if let Some(tilt) = self.tilt.as_mut() {
                    tilt.pointer_leave();
                }
            }
            PageEvent::HoverStart { element } => self.hover(element, true),
            PageEvent::HoverEnd { element } => self.hover(element, false),
        }
    }

    fn hover(&mut self, element: ElementId, shown: bool) {
        if let Some(tips) = &self.tooltips {
            tips.hover(element, shown, &mut self.pending);
        }
    }

    /// Collect this frame's intersection entries, from native entries and from layouts.
    fn gather_entries(&mut self, inputs: &mut Inputs) -> Vec<IntersectionEntry> {
        let mut raw = std::mem::take(&mut inputs.entries);
        if !inputs.layouts.is_empty() {
            match self.viewport {
                Some(viewport) => {
                    for layout in &inputs.layouts {
                        if let Some(opts) = self.oracle.options(layout.element) {
                            raw.push(IntersectionEntry {
                                element: layout.element,
                                ratio: intersection_ratio(layout.rect, viewport, opts.margin),
                            });
                        }
                    }
                }
                None => log::warn!(
                    "{} layout(s) ignored: no viewport known",
                    inputs.layouts.len()
                ),
            }
        }
        coalesce(raw)
            .into_iter()
            .filter_map(|e| self.oracle.report(e.element, e.ratio))
            .collect()
    }

    /// Advance the page to `now_ms` and apply this frame's inputs.
    pub fn update(&mut self, now_ms: f64, mut inputs: Inputs) -> &Outputs {
        self.outputs.clear();
        self.advance_clock(now_ms);

        // 1) Layout and viewport
        if let Some(viewport) = inputs.viewport {
            self.viewport = Some(viewport);
        }
        if let Some(sections) = inputs.sections.take() {
            self.sections = sections;
            if let Some(nav) = self.nav.as_mut() {
                nav.request_frame();
            }
        }

        // 2) Scroll, click and pointer events
        for event in std::mem::take(&mut inputs.events) {
            self.apply_event(event);
        }

        // 3) Threshold crossings → registry, in document order
        for entry in self.gather_entries(&mut inputs) {
            if let Some(fire) = self.registry.on_intersect(entry.element, entry.ratio) {
                self.apply_fire(fire);
            }
        }

        // 4) Due timers (cascade steps, delayed counters, connectors, loops)
        for (id, task) in self.timers.run_due(self.now_ms) {
            log::trace!("timer {} ran at t={}", id.0, self.now_ms);
            self.run_task(task);
        }

        // 5) Counters
        let now = self.now_ms;
        for c in &mut self.counters {
            if let Some(text) = c.anim.frame(now) {
                self.pending.push_mutation(DomMutation::SetText {
                    element: c.text_target,
                    text: text.clone(),
                });
                if c.anim.is_finished() {
                    log::debug!("counter {} on {} finished at {text}", c.id.0, c.element);
                    self.pending.push_event(RevealEvent::CounterFinished {
                        element: c.text_target,
                        text,
                    });
                }
            }
        }
        self.counters.retain(|c| !c.anim.is_finished());

        // 6) Scroll-driven state and pointer follow
        if let Some(nav) = self.nav.as_mut() {
            let before = nav.active_section().map(str::to_string);
            if nav.frame(&self.sections, &mut self.pending) {
                let after = nav.active_section();
                if before.as_deref() != after {
                    self.pending.push_event(RevealEvent::SectionChanged {
                        section: after.map(str::to_string),
                    });
                }
            }
        }
        if std::mem::take(&mut self.parallax_dirty) {
            if let Some(el) = self.parallax {
                self.pending.set_style(
                    el,
                    "transform",
                    parallax_transform(self.scroll_y, self.cfg.parallax_speed),
                );
            }
        }
        if let Some(tilt) = self.tilt.as_mut() {
            tilt.frame(&mut self.pending);
        }

        std::mem::swap(&mut self.outputs, &mut self.pending);
        &self.outputs
    }

    /// Whether animation frames are still needed (counters running, tilt easing, scroll pending).
    pub fn needs_frame(&self) -> bool {
        !self.counters.is_empty()
            || !self.pending.is_empty()
            || self.parallax_dirty
            || self.tilt.as_ref().is_some_and(Tilt::is_moving)
            || self.nav.as_ref().is_some_and(NavState::frame_pending)
    }

    /// When the next timer falls due, for hosts that sleep between frames.
    pub fn next_due_ms(&self) -> Option<f64> {
        self.timers.next_due()
    }

    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        self.timers.pending()
    }

    /// Trigger state of a registered element.
    pub fn state(&self, element: ElementId) -> Result<TriggerState, RevealError> {
        self.registry
            .state(element)
            .ok_or(RevealError::UnknownElement { element })
    }

    pub fn is_observed(&self, element: ElementId) -> bool {
        self.oracle.is_observed(element)
    }

    pub fn observed_count(&self) -> usize {
        self.oracle.len()
    }

    pub fn fired_count(&self) -> usize {
        self.registry.fired_count()
    }

    pub fn running_counters(&self) -> usize {
        self.counters.len()
    }

    pub fn nav(&self) -> Option<&NavState> {
        self.nav.as_ref()
    }

    pub fn tabs(&self) -> &[TabGroup] {
        &self.tabs
    }
}
