//! Core configuration for keiros-reveal-core.

use serde::{Deserialize, Serialize};

/// What `register` does when an element already carries an action.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Last registration wins.
    #[default]
    Replace,
    /// Keep the first registration and report `DuplicateRegistration`.
    Reject,
}

/// Page-wide tuning. Every field falls back to the site defaults when absent.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub duplicate_policy: DuplicatePolicy,
    /// Default counter duration when a template does not name one.
    pub counter_duration_ms: u32,
    /// Delay between both neighbours of a connector firing and the connector reveal.
    pub connector_delay_ms: u32,
    pub nav: NavConfig,
    pub parallax_speed: f64,
    pub tilt: TiltConfig,
    /// Host reported `prefers-reduced-motion: reduce`.
    pub reduced_motion: bool,
    /// Capacity hint for per-tick mutation buffers.
    pub max_mutations_per_tick: usize,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Nav gets `scrolled` once scrollY exceeds this.
    pub scrolled_threshold_px: f64,
    /// Sections count as current this far before their top edge.
    pub section_offset_px: f64,
    /// Anchor jumps stop this far above the target (fixed header height).
    pub anchor_offset_px: f64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TiltConfig {
    pub max_degrees: f64,
    /// Fraction of the remaining angle closed per frame.
    pub follow: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Replace,
            counter_duration_ms: 2000,
            connector_delay_ms: 300,
            nav: NavConfig::default(),
            parallax_speed: 0.5,
            tilt: TiltConfig::default(),
            reduced_motion: false,
            max_mutations_per_tick: 1024,
        }
    }
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            scrolled_threshold_px: 100.0,
            section_offset_px: 100.0,
            anchor_offset_px: 80.0,
        }
    }
}

impl Default for TiltConfig {
    fn default() -> Self {
        Self {
            max_degrees: 30.0,
            follow: 0.1,
        }
    }
}
