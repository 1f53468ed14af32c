//! Visibility oracle: threshold-crossing detection over reported intersection ratios.
//!
//! Hosts either forward native intersection entries (ratios) or report element
//! geometry, in which case [`intersection_ratio`] computes the ratio against the
//! margin-adjusted viewport. Either way the oracle only delivers an entry when the
//! ratio lands in a different threshold bucket than the last delivered one.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::RevealError;
use crate::ids::ElementId;

/// Root margin in px; positive values grow the viewport, negative values shrink it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MarginRepr")]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MarginRepr {
    Css(String),
    Sides {
        #[serde(default)]
        top: f64,
        #[serde(default)]
        right: f64,
        #[serde(default)]
        bottom: f64,
        #[serde(default)]
        left: f64,
    },
}

impl TryFrom<MarginRepr> for Margin {
    type Error = RevealError;

    fn try_from(repr: MarginRepr) -> Result<Self, Self::Error> {
        match repr {
            MarginRepr::Css(s) => Margin::parse(&s),
            MarginRepr::Sides {
                top,
                right,
                bottom,
                left,
            } => Ok(Margin {
                top,
                right,
                bottom,
                left,
            }),
        }
    }
}

impl Margin {
    pub fn uniform(px: f64) -> Self {
        Self {
            top: px,
            right: px,
            bottom: px,
            left: px,
        }
    }

    /// Parse a CSS `rootMargin` such as `"0px 0px -100px 0px"` or `"100px"`.
    pub fn parse(input: &str) -> Result<Self, RevealError> {
        let invalid = || RevealError::InvalidMargin {
            input: input.to_string(),
        };
        let parts = input
            .split_whitespace()
            .map(|tok| {
                let num = tok.strip_suffix("px").unwrap_or(tok);
                num.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(invalid)
            })
            .collect::<Result<Vec<f64>, _>>()?;
        let [top, right, bottom, left] = match parts.as_slice() {
            [] => [0.0; 4],
            [a] => [*a; 4],
            [v, h] => [*v, *h, *v, *h],
            [t, h, b] => [*t, *h, *b, *h],
            [t, r, b, l] => [*t, *r, *b, *l],
            _ => return Err(invalid()),
        };
        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }
}

/// Element box relative to the viewport (as from `getBoundingClientRect`).
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Fraction of `rect` inside the margin-adjusted viewport.
pub fn intersection_ratio(rect: Rect, viewport: Viewport, margin: Margin) -> f64 {
    let root_top = -margin.top;
    let root_left = -margin.left;
    let root_bottom = viewport.height + margin.bottom;
    let root_right = viewport.width + margin.right;

    let bottom = rect.top + rect.height;
    let right = rect.left + rect.width;

    let area = rect.width * rect.height;
    if area <= 0.0 {
        let inside = rect.top >= root_top
            && rect.top <= root_bottom
            && rect.left >= root_left
            && rect.left <= root_right;
        return if inside { 1.0 } else { 0.0 };
    }

    let w = (right.min(root_right) - rect.left.max(root_left)).max(0.0);
    let h = (bottom.min(root_bottom) - rect.top.max(root_top)).max(0.0);
    ((w * h) / area).clamp(0.0, 1.0)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObserverOptions {
    #[serde(default = "default_thresholds")]
    pub thresholds: Vec<f64>,
    #[serde(default)]
    pub margin: Margin,
}

fn default_thresholds() -> Vec<f64> {
    vec![0.0]
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            thresholds: default_thresholds(),
            margin: Margin::default(),
        }
    }
}

impl ObserverOptions {
    pub fn new(thresholds: Vec<f64>, margin: Margin) -> Result<Self, RevealError> {
        Self { thresholds, margin }.normalized()
    }

    /// Validate thresholds into a sorted, deduplicated list within [0, 1].
    pub fn normalized(mut self) -> Result<Self, RevealError> {
        if let Some(bad) = self
            .thresholds
            .iter()
            .copied()
            .find(|t| !(0.0..=1.0).contains(t))
        {
            return Err(RevealError::InvalidThreshold { value: bad });
        }
        self.thresholds.sort_by(f64::total_cmp);
        self.thresholds.dedup();
        if self.thresholds.is_empty() {
            self.thresholds = default_thresholds();
        }
        Ok(self)
    }

    /// Number of thresholds the ratio has reached. Threshold 0 counts only when intersecting.
    fn bucket(&self, ratio: f64) -> usize {
        self.thresholds
            .iter()
            .filter(|&&t| if t == 0.0 { ratio > 0.0 } else { ratio >= t })
            .count()
    }
}

/// A delivered threshold crossing.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntersectionEntry {
    pub element: ElementId,
    pub ratio: f64,
}

impl IntersectionEntry {
    #[inline]
    pub fn is_intersecting(&self) -> bool {
        self.ratio > 0.0
    }
}

#[derive(Debug)]
struct Observation {
    options: ObserverOptions,
    last_bucket: Option<usize>,
}

#[derive(Debug, Default)]
pub struct VisibilityOracle {
    observed: HashMap<ElementId, Observation>,
}

impl VisibilityOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, element: ElementId, options: ObserverOptions) {
        self.observed.insert(
            element,
            Observation {
                options,
                last_bucket: None,
            },
        );
    }

    /// Stop delivering for `element`. Unknown elements are ignored.
    pub fn unobserve(&mut self, element: ElementId) -> bool {
        self.observed.remove(&element).is_some()
    }

    pub fn is_observed(&self, element: ElementId) -> bool {
        self.observed.contains_key(&element)
    }

    pub fn options(&self, element: ElementId) -> Option<&ObserverOptions> {
        self.observed.get(&element).map(|o| &o.options)
    }

    pub fn len(&self) -> usize {
        self.observed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }

    /// Feed a ratio; returns an entry when a threshold was crossed since the last delivery.
    pub fn report(&mut self, element: ElementId, ratio: f64) -> Option<IntersectionEntry> {
        let obs = self.observed.get_mut(&element)?;
        let ratio = if ratio.is_finite() {
            ratio.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let bucket = obs.options.bucket(ratio);
        if obs.last_bucket == Some(bucket) {
            return None;
        }
        obs.last_bucket = Some(bucket);
        Some(IntersectionEntry { element, ratio })
    }

    /// Feed element geometry instead of a precomputed ratio.
    pub fn report_rect(
        &mut self,
        element: ElementId,
        rect: Rect,
        viewport: Viewport,
    ) -> Option<IntersectionEntry> {
        let margin = self.observed.get(&element)?.options.margin;
        self.report(element, intersection_ratio(rect, viewport, margin))
    }
}

/// Collapse a frame's entries to one per element (latest wins), in document order.
pub fn coalesce(entries: Vec<IntersectionEntry>) -> Vec<IntersectionEntry> {
    let mut latest: HashMap<ElementId, f64> = HashMap::with_capacity(entries.len());
    for e in entries {
        latest.insert(e.element, e.ratio);
    }
    let mut out: Vec<IntersectionEntry> = latest
        .into_iter()
        .map(|(element, ratio)| IntersectionEntry { element, ratio })
        .collect();
    out.sort_by_key(|e| e.element);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn margin_shorthand() {
        assert_eq!(Margin::parse("100px").unwrap(), Margin::uniform(100.0));
        let m = Margin::parse("0px 0px -100px 0px").unwrap();
        assert_eq!(m.bottom, -100.0);
        assert_eq!(m.top, 0.0);
        let m = Margin::parse("10px 20px").unwrap();
        assert_eq!((m.top, m.right, m.bottom, m.left), (10.0, 20.0, 10.0, 20.0));
        let m = Margin::parse("1 2 3").unwrap();
        assert_eq!((m.top, m.right, m.bottom, m.left), (1.0, 2.0, 3.0, 2.0));
        assert_eq!(Margin::parse("").unwrap(), Margin::default());
        assert!(Margin::parse("10%").is_err());
        assert!(Margin::parse("1px 2px 3px 4px 5px").is_err());
    }

    #[test]
    fn margin_from_json_string_or_sides() {
        let o: ObserverOptions =
            serde_json::from_str(r#"{ "thresholds": [0.25, 0, 0.1], "margin": "0px 0px -100px 0px" }"#)
                .unwrap();
        assert_eq!(o.margin.bottom, -100.0);
        let o: ObserverOptions = serde_json::from_str(r#"{ "margin": { "top": 5 } }"#).unwrap();
        assert_eq!(o.margin.top, 5.0);
        assert_eq!(o.thresholds, vec![0.0]);
    }

    #[test]
    fn thresholds_are_normalized() {
        let o = ObserverOptions::new(vec![0.25, 0.0, 0.1, 0.1], Margin::default()).unwrap();
        assert_eq!(o.thresholds, vec![0.0, 0.1, 0.25]);
        let err = ObserverOptions::new(vec![1.5], Margin::default()).unwrap_err();
        assert_eq!(err, RevealError::InvalidThreshold { value: 1.5 });
        let o = ObserverOptions::new(vec![], Margin::default()).unwrap();
        assert_eq!(o.thresholds, vec![0.0]);
    }

    #[test]
    fn ratio_against_shrunk_viewport() {
        let vp = Viewport {
            width: 1000.0,
            height: 800.0,
        };
        let rect = Rect {
            top: 600.0,
            left: 0.0,
            width: 100.0,
            height: 200.0,
        };
        assert!((intersection_ratio(rect, vp, Margin::default()) - 1.0).abs() < 1e-12);
        let shrunk = Margin::parse("0px 0px -100px 0px").unwrap();
        assert!((intersection_ratio(rect, vp, shrunk) - 0.5).abs() < 1e-12);
        let below = Rect { top: 850.0, ..rect };
        assert_eq!(intersection_ratio(below, vp, Margin::default()), 0.0);
        // a grown root catches it early
        assert!(intersection_ratio(below, vp, Margin::uniform(100.0)) > 0.0);
    }

    #[test]
    fn delivers_only_on_crossings() {
        let mut oracle = VisibilityOracle::new();
        let el = ElementId(1);
        oracle.observe(el, ObserverOptions::new(vec![0.0, 0.5], Margin::default()).unwrap());

        // initial notification
        assert!(oracle.report(el, 0.0).is_some());
        assert!(oracle.report(el, 0.0).is_none());
        let e = oracle.report(el, 0.2).unwrap();
        assert!(e.is_intersecting());
        assert!(oracle.report(el, 0.3).is_none());
        assert!(oracle.report(el, 0.6).is_some());
        assert!(oracle.report(el, 0.0).is_some());
    }

    #[test]
    fn unobserved_elements_are_silent() {
        let mut oracle = VisibilityOracle::new();
        assert!(oracle.report(ElementId(9), 1.0).is_none());
        oracle.observe(ElementId(9), ObserverOptions::default());
        assert!(oracle.unobserve(ElementId(9)));
        assert!(oracle.report(ElementId(9), 1.0).is_none());
        assert!(!oracle.unobserve(ElementId(9)));
    }

    #[test]
    fn coalesce_keeps_latest_in_document_order() {
        let entries = vec![
            IntersectionEntry {
                element: ElementId(5),
                ratio: 0.1,
            },
            IntersectionEntry {
                element: ElementId(2),
                ratio: 0.4,
            },
            IntersectionEntry {
                element: ElementId(5),
                ratio: 0.9,
            },
        ];
        let out = coalesce(entries);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].element, ElementId(2));
        assert_eq!(out[1].ratio, 0.9);
    }
}
