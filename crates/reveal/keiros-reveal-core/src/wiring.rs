//! Selector-level page wiring, deserialized from JSON and resolved against a DOM.
//!
//! A [`PageSpec`] says *which* nodes get *what* behaviour; resolving it turns
//! selectors into element handles and data attributes into concrete
//! [`Action`]s.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::counter::CounterSpec;
use crate::dom::DomQuery;
use crate::error::RevealError;
use crate::format::Formatter;
use crate::ids::ElementId;
use crate::oracle::ObserverOptions;
use crate::registry::Action;

fn default_value_attribute() -> String {
    "data-value".to_string()
}

fn default_target_attribute() -> String {
    "data-target".to_string()
}

fn default_suffix_attribute() -> String {
    "data-suffix".to_string()
}

/// Per-element action, before selectors and data attributes are resolved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionTemplate {
    AddClasses {
        classes: Vec<String>,
    },
    StartCounter {
        /// Descendant holding the number; the observed element itself when absent.
        #[serde(default)]
        value_selector: Option<String>,
        /// Fixed target; otherwise read from `target_attribute` on the value node.
        #[serde(default)]
        end: Option<f64>,
        #[serde(default = "default_target_attribute")]
        target_attribute: String,
        /// Fixed suffix; otherwise read from `suffix_attribute` (missing means none).
        #[serde(default)]
        suffix: Option<String>,
        #[serde(default = "default_suffix_attribute")]
        suffix_attribute: String,
        /// Overrides formatter inference.
        #[serde(default)]
        formatter: Option<Formatter>,
        #[serde(default)]
        duration_ms: Option<u32>,
        #[serde(default)]
        delay_ms: u32,
        /// Integer attribute on the observed element scaled by `delay_step_ms`.
        #[serde(default)]
        delay_attribute: Option<String>,
        #[serde(default)]
        delay_step_ms: u32,
        #[serde(default)]
        classes: Vec<String>,
    },
    CascadeChildren {
        child_selector: String,
        #[serde(default)]
        classes: Vec<String>,
        #[serde(default)]
        container_classes: Vec<String>,
        #[serde(default)]
        base_delay_ms: u32,
        step_ms: u32,
    },
    FillBar {
        #[serde(default = "default_value_attribute")]
        attribute: String,
        #[serde(default)]
        classes: Vec<String>,
    },
}

fn parse_attr<T: std::str::FromStr>(
    dom: &dyn DomQuery,
    element: ElementId,
    name: &str,
) -> Result<T, RevealError> {
    dom.attribute(element, name)
        .and_then(|v| v.trim().parse::<T>().ok())
        .ok_or_else(|| RevealError::InvalidAttribute {
            element,
            name: name.to_string(),
        })
}

impl ActionTemplate {
    /// Resolve against the DOM for one matched element.
    pub fn resolve(
        &self,
        dom: &dyn DomQuery,
        element: ElementId,
        cfg: &Config,
    ) -> Result<Action, RevealError> {
        match self {
            ActionTemplate::AddClasses { classes } => Ok(Action::AddClasses {
                classes: classes.clone(),
            }),
            ActionTemplate::StartCounter {
                value_selector,
                end,
                target_attribute,
                suffix,
                suffix_attribute,
                formatter,
                duration_ms,
                delay_ms,
                delay_attribute,
                delay_step_ms,
                classes,
            } => {
                let text_target = match value_selector {
                    Some(sel) => dom
                        .query_within(element, sel)
                        .into_iter()
                        .next()
                        .ok_or_else(|| RevealError::MissingElement {
                            selector: sel.clone(),
                        })?,
                    None => element,
                };
                let end = match end {
                    Some(v) => *v,
                    None => parse_attr::<f64>(dom, text_target, target_attribute)?,
                };
                let suffix = suffix
                    .clone()
                    .or_else(|| dom.attribute(text_target, suffix_attribute))
                    .unwrap_or_default();
                let formatter = formatter
                    .clone()
                    .unwrap_or_else(|| Formatter::infer(end, &suffix));
                let spec = CounterSpec::new(
                    0.0,
                    end,
                    duration_ms.unwrap_or(cfg.counter_duration_ms),
                    formatter,
                )?;
                let index = match delay_attribute {
                    Some(name) => parse_attr::<u32>(dom, element, name)?,
                    None => 0,
                };
                Ok(Action::StartCounter {
                    text_target,
                    spec,
                    delay_ms: delay_ms.saturating_add(index.saturating_mul(*delay_step_ms)),
                    classes: classes.clone(),
                })
            }
            ActionTemplate::CascadeChildren {
                child_selector,
                classes,
                container_classes,
                base_delay_ms,
                step_ms,
            } => {
                let children = dom.query_within(element, child_selector);
                if children.is_empty() {
                    return Err(RevealError::MissingElement {
                        selector: child_selector.clone(),
                    });
                }
                Ok(Action::CascadeChildren {
                    children,
                    classes: classes.clone(),
                    container_classes: container_classes.clone(),
                    base_delay_ms: *base_delay_ms,
                    step_ms: *step_ms,
                })
            }
            ActionTemplate::FillBar { attribute, classes } => Ok(Action::FillBar {
                percent: parse_attr::<f64>(dom, element, attribute)?,
                classes: classes.clone(),
            }),
        }
    }
}

/// Observe every element matching `selector` with one action template.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevealRule {
    pub selector: String,
    #[serde(default)]
    pub options: ObserverOptions,
    pub action: ActionTemplate,
}

/// Unconditional cascade scheduled at page-ready (hero lines, card rows).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntroCascade {
    pub selector: String,
    #[serde(default)]
    pub base_delay_ms: u32,
    pub step_ms: u32,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub styles: BTreeMap<String, String>,
}

/// Connectors between two items light up once both neighbours have fired.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectorRule {
    pub connector_selector: String,
    pub item_class: String,
    #[serde(default)]
    pub classes: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NavSpec {
    #[serde(default)]
    pub nav: Option<String>,
    #[serde(default)]
    pub toggle: Option<String>,
    #[serde(default)]
    pub menu: Option<String>,
    pub links: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TabSpec {
    pub tabs: String,
    pub panels: String,
    #[serde(default = "default_tab_attribute")]
    pub attribute: String,
}

fn default_tab_attribute() -> String {
    "data-tab".to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoopSpec {
    pub selector: String,
    pub period_ms: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PulseSpec {
    pub selector: String,
    pub period_ms: u32,
    pub dim_ms: u32,
    #[serde(default = "default_dim_opacity")]
    pub dim_opacity: f64,
}

fn default_dim_opacity() -> f64 {
    0.3
}

/// Shows the first `tooltip` inside each `trigger` while the pointer is over it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TooltipSpec {
    pub trigger: String,
    pub tooltip: String,
}

/// Per-index style applied once at install, e.g. a `transition-delay` stagger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StaggerSpec {
    pub selector: String,
    #[serde(default = "default_stagger_property")]
    pub property: String,
    pub step_ms: u32,
}

fn default_stagger_property() -> String {
    "transition-delay".to_string()
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DecorSpec {
    #[serde(default)]
    pub ota: Option<LoopSpec>,
    #[serde(default)]
    pub pulse: Option<PulseSpec>,
    #[serde(default)]
    pub parallax: Option<String>,
    #[serde(default)]
    pub tilt: Option<String>,
    #[serde(default)]
    pub tooltips: Option<TooltipSpec>,
}

/// The complete behaviour wiring of a page.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSpec {
    #[serde(default)]
    pub reveals: Vec<RevealRule>,
    #[serde(default)]
    pub intros: Vec<IntroCascade>,
    #[serde(default)]
    pub connectors: Option<ConnectorRule>,
    #[serde(default)]
    pub nav: Option<NavSpec>,
    #[serde(default)]
    pub tabs: Vec<TabSpec>,
    /// In-page anchors (`a[href^="#"]`) that scroll to their section on click.
    #[serde(default)]
    pub anchors: Option<String>,
    #[serde(default)]
    pub staggers: Vec<StaggerSpec>,
    #[serde(default)]
    pub decor: DecorSpec,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::StaticDom;

    fn metric_dom() -> (StaticDom, ElementId, ElementId) {
        let mut dom = StaticDom::new();
        let card = dom.push("div", &["platform-metric-card"], None);
        dom.set_attribute(card, "data-metric", "2");
        let value = dom.push("span", &["metric-value-animated"], Some(card));
        dom.set_attribute(value, "data-target", "99.97");
        dom.set_attribute(value, "data-suffix", "%");
        (dom, card, value)
    }

    fn counter_template() -> ActionTemplate {
        serde_json::from_value(serde_json::json!({
            "type": "start_counter",
            "value_selector": ".metric-value-animated",
            "delay_attribute": "data-metric",
            "delay_step_ms": 200,
            "classes": ["animated"]
        }))
        .unwrap()
    }

    #[test]
    fn counter_reads_data_attributes() {
        let (dom, card, value) = metric_dom();
        let action = counter_template()
            .resolve(&dom, card, &Config::default())
            .unwrap();
        match action {
            Action::StartCounter {
                text_target,
                spec,
                delay_ms,
                classes,
            } => {
                assert_eq!(text_target, value);
                assert_eq!(spec.end, 99.97);
                assert_eq!(spec.duration_ms, 2000);
                assert_eq!(spec.formatter, Formatter::Percent { decimals: 2 });
                assert_eq!(delay_ms, 400);
                assert_eq!(classes, vec!["animated".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn counter_without_target_is_rejected() {
        let mut dom = StaticDom::new();
        let card = dom.push("div", &["platform-metric-card"], None);
        dom.set_attribute(card, "data-metric", "0");
        dom.push("span", &["metric-value-animated"], Some(card));
        let err = counter_template()
            .resolve(&dom, card, &Config::default())
            .unwrap_err();
        assert!(matches!(err, RevealError::InvalidAttribute { ref name, .. } if name == "data-target"));
    }

    #[test]
    fn cascade_needs_children() {
        let mut dom = StaticDom::new();
        let table = dom.push("div", &["dashboard-table"], None);
        let t = ActionTemplate::CascadeChildren {
            child_selector: ".table-row".into(),
            classes: vec!["animated".into()],
            container_classes: vec![],
            base_delay_ms: 0,
            step_ms: 100,
        };
        assert!(matches!(
            t.resolve(&dom, table, &Config::default()),
            Err(RevealError::MissingElement { .. })
        ));
        let r0 = dom.push("div", &["table-row"], Some(table));
        let r1 = dom.push("div", &["table-row"], Some(table));
        match t.resolve(&dom, table, &Config::default()).unwrap() {
            Action::CascadeChildren { children, .. } => assert_eq!(children, vec![r0, r1]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn fill_bar_reads_value() {
        let mut dom = StaticDom::new();
        let bar = dom.push("div", &["chart-bar"], None);
        dom.set_attribute(bar, "data-value", "72");
        let t: ActionTemplate =
            serde_json::from_str(r#"{ "type": "fill_bar", "classes": ["animated"] }"#).unwrap();
        assert_eq!(
            t.resolve(&dom, bar, &Config::default()).unwrap(),
            Action::FillBar {
                percent: 72.0,
                classes: vec!["animated".into()],
            }
        );
    }
}
