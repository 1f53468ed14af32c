use keiros_reveal_core::{
    Config, DomState, ElementId, HostCommand, Inputs, Page, PageEvent, PageSpec, Rect,
    RevealEvent, SectionLayout, StaticDom,
};

struct Site {
    dom: StaticDom,
    nav: ElementId,
    toggle: ElementId,
    menu: ElementId,
    links: Vec<ElementId>,
    tabs: Vec<ElementId>,
    panels: Vec<ElementId>,
    hero_bg: ElementId,
    device: ElementId,
}

fn site() -> Site {
    let mut dom = StaticDom::new();
    let body = dom.push("body", &[], None);
    let nav = dom.push("nav", &["navbar"], Some(body));
    let toggle = dom.push("button", &["nav-toggle"], Some(nav));
    let menu = dom.push("ul", &["nav-menu"], Some(nav));
    let links: Vec<ElementId> = ["home", "platform", "contact"]
        .iter()
        .map(|id| {
            let link = dom.push("a", &["nav-link"], Some(menu));
            dom.set_attribute(link, "href", &format!("#{id}"));
            link
        })
        .collect();
    let mut tabs = Vec::new();
    let mut panels = Vec::new();
    for key in ["hardware", "firmware"] {
        let tab = dom.push("button", &["tab-btn"], Some(body));
        dom.set_attribute(tab, "data-tab", key);
        tabs.push(tab);
    }
    for key in ["hardware", "firmware"] {
        let panel = dom.push("div", &["tab-panel"], Some(body));
        dom.set_attribute(panel, "data-tab", key);
        panels.push(panel);
    }
    let hero_bg = dom.push("div", &["hero-bg"], Some(body));
    let device = dom.push("div", &["device-3d"], Some(body));
    Site {
        dom,
        nav,
        toggle,
        menu,
        links,
        tabs,
        panels,
        hero_bg,
        device,
    }
}

fn spec() -> PageSpec {
    serde_json::from_value(serde_json::json!({
        "nav": {
            "nav": ".navbar",
            "toggle": ".nav-toggle",
            "menu": ".nav-menu",
            "links": ".nav-link"
        },
        "tabs": [{ "tabs": ".tab-btn", "panels": ".tab-panel" }],
        "decor": { "parallax": ".hero-bg", "tilt": ".device-3d" }
    }))
    .unwrap()
}

fn sections() -> Vec<SectionLayout> {
    [("home", 0.0, 700.0), ("platform", 700.0, 900.0), ("contact", 1600.0, 600.0)]
        .iter()
        .map(|(id, top, height)| SectionLayout {
            id: id.to_string(),
            top: *top,
            height: *height,
        })
        .collect()
}

fn scroll(y: f64) -> Inputs {
    Inputs::event(PageEvent::Scroll { y })
}

fn installed() -> (Site, Page, DomState) {
    let site = site();
    let mut page = Page::new(Config::default());
    let report = page.install(&site.dom, &spec(), 0.0);
    assert!(report.skipped.is_empty(), "{:?}", report.skipped);
    let mut state = DomState::new();
    let inputs = Inputs {
        sections: Some(sections()),
        ..Inputs::default()
    };
    state.apply(page.update(0.0, inputs));
    (site, page, state)
}

#[test]
fn menu_toggles_and_closes_on_link_click() {
    let (site, mut page, mut state) = installed();
    state.apply(page.update(16.0, Inputs::event(PageEvent::Click { element: site.toggle })));
    assert!(state.has_class(site.menu, "active"));
    assert!(state.has_class(site.toggle, "active"));

    state.apply(page.update(32.0, Inputs::event(PageEvent::Click { element: site.toggle })));
    assert!(!state.has_class(site.menu, "active"));

    state.apply(page.update(48.0, Inputs::event(PageEvent::Click { element: site.toggle })));
    let out = page
        .update(64.0, Inputs::event(PageEvent::Click { element: site.links[1] }))
        .clone();
    state.apply(&out);
    assert!(!state.has_class(site.menu, "active"));
    assert!(out.commands.contains(&HostCommand::ScrollTo { top: 620.0 }));
}

#[test]
fn scrolled_class_follows_threshold() {
    let (site, mut page, mut state) = installed();
    state.apply(page.update(16.0, scroll(100.0)));
    assert!(!state.has_class(site.nav, "scrolled"));
    state.apply(page.update(32.0, scroll(101.0)));
    assert!(state.has_class(site.nav, "scrolled"));
    state.apply(page.update(48.0, scroll(20.0)));
    assert!(!state.has_class(site.nav, "scrolled"));
}

#[test]
fn active_link_tracks_current_section() {
    let (site, mut page, mut state) = installed();
    let out = page.update(16.0, scroll(650.0)).clone();
    state.apply(&out);
    assert!(state.has_class(site.links[1], "active"));
    assert!(!state.has_class(site.links[0], "active"));
    assert!(out.events.contains(&RevealEvent::SectionChanged {
        section: Some("platform".into())
    }));

    state.apply(page.update(32.0, scroll(1550.0)));
    assert!(state.has_class(site.links[2], "active"));
    assert!(!state.has_class(site.links[1], "active"));
    assert_eq!(page.nav().and_then(|n| n.active_section()), Some("contact"));
}

#[test]
fn scroll_bursts_are_evaluated_once_per_frame() {
    let (site, mut page, mut state) = installed();
    let burst = Inputs {
        events: vec![
            PageEvent::Scroll { y: 50.0 },
            PageEvent::Scroll { y: 650.0 },
            PageEvent::Scroll { y: 1550.0 },
        ],
        ..Inputs::default()
    };
    let out = page.update(16.0, burst).clone();
    state.apply(&out);
    let changes = out
        .events
        .iter()
        .filter(|e| matches!(e, RevealEvent::SectionChanged { .. }))
        .count();
    assert_eq!(changes, 1);
    assert!(state.has_class(site.links[2], "active"));
    assert!(!state.has_class(site.links[1], "active"));
}

#[test]
fn tabs_switch_panels() {
    let (site, mut page, mut state) = installed();
    state.apply(page.update(16.0, Inputs::event(PageEvent::Click { element: site.tabs[1] })));
    assert!(state.has_class(site.tabs[1], "active"));
    assert!(state.has_class(site.panels[1], "active"));
    assert!(!state.has_class(site.panels[0], "active"));

    state.apply(page.update(32.0, Inputs::event(PageEvent::Click { element: site.tabs[0] })));
    assert!(state.has_class(site.panels[0], "active"));
    assert!(!state.has_class(site.panels[1], "active"));
    assert_eq!(page.tabs()[0].active(), Some("hardware"));
}

#[test]
fn parallax_moves_hero_background() {
    let (site, mut page, mut state) = installed();
    state.apply(page.update(16.0, scroll(300.0)));
    assert_eq!(state.style(site.hero_bg, "transform"), Some("translateY(150px)"));
}

#[test]
fn tilt_eases_towards_pointer_and_back() {
    let (site, mut page, mut state) = installed();
    let rect = Rect {
        top: 0.0,
        left: 100.0,
        width: 200.0,
        height: 200.0,
    };
    state.apply(page.update(
        16.0,
        Inputs::event(PageEvent::PointerMove {
            x: 300.0,
            y: 50.0,
            rect,
        }),
    ));
    assert!(page.needs_frame());
    let mut t = 16.0;
    while page.needs_frame() {
        t += 16.0;
        state.apply(page.update(t, Inputs::default()));
        assert!(t < 10_000.0, "tilt never settled");
    }
    assert_eq!(state.style(site.device, "transform"), Some("rotateY(15deg)"));

    state.apply(page.update(t + 16.0, Inputs::event(PageEvent::PointerLeave)));
    while page.needs_frame() {
        t += 16.0;
        state.apply(page.update(t, Inputs::default()));
    }
    assert_eq!(state.style(site.device, "transform"), Some("rotateY(0deg)"));
}
