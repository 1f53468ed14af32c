//! Count-up animation for metric values.
//!
//! A counter is a finite, time-driven sequence of display strings. Values are
//! eased with `1 - (1 - p)^3`; the last frame is the formatted target itself
//! rather than the interpolated value, so rounding never leaves it short.

use serde::{Deserialize, Serialize};

use crate::error::RevealError;
use crate::format::Formatter;

/// Ease-out cubic on normalized progress.
#[inline]
pub fn ease_out_cubic(p: f64) -> f64 {
    let inv = 1.0 - p;
    1.0 - inv * inv * inv
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CounterSpec {
    #[serde(default)]
    pub start: f64,
    pub end: f64,
    pub duration_ms: u32,
    #[serde(default)]
    pub formatter: Formatter,
}

impl CounterSpec {
    pub fn new(
        start: f64,
        end: f64,
        duration_ms: u32,
        formatter: Formatter,
    ) -> Result<Self, RevealError> {
        let spec = Self {
            start,
            end,
            duration_ms,
            formatter,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Counter from zero with a formatter inferred from the target and suffix.
    pub fn to_target(end: f64, suffix: &str, duration_ms: u32) -> Result<Self, RevealError> {
        Self::new(0.0, end, duration_ms, Formatter::infer(end, suffix))
    }

    pub fn validate(&self) -> Result<(), RevealError> {
        if self.duration_ms == 0 {
            return Err(RevealError::InvalidCounter {
                reason: "duration_ms must be > 0".into(),
            });
        }
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(RevealError::InvalidCounter {
                reason: format!("non-finite range {}..{}", self.start, self.end),
            });
        }
        Ok(())
    }

    /// Normalized progress after `elapsed_ms`.
    #[inline]
    pub fn progress(&self, elapsed_ms: f64) -> f64 {
        (elapsed_ms / f64::from(self.duration_ms)).clamp(0.0, 1.0)
    }

    /// Interpolated (unformatted) value after `elapsed_ms`.
    pub fn value_at(&self, elapsed_ms: f64) -> f64 {
        let eased = ease_out_cubic(self.progress(elapsed_ms));
        self.start + (self.end - self.start) * eased
    }

    pub fn final_text(&self) -> String {
        self.formatter.format(self.end)
    }
}

/// One running counter. Not restartable: once finished, start a new one.
#[derive(Clone, Debug)]
pub struct CounterAnimation {
    spec: CounterSpec,
    started_at: f64,
    displayed: Option<String>,
    finished: bool,
}

impl CounterAnimation {
    pub fn start(spec: CounterSpec, now_ms: f64) -> Self {
        Self {
            spec,
            started_at: now_ms,
            displayed: None,
            finished: false,
        }
    }

    pub fn spec(&self) -> &CounterSpec {
        &self.spec
    }

    /// Make the next frame the final one.
    pub fn jump_to_end(&mut self) {
        self.started_at = f64::NEG_INFINITY;
    }

    /// Produce the text for the frame at `now_ms`, or `None` once halted.
    pub fn frame(&mut self, now_ms: f64) -> Option<String> {
        if self.finished {
            return None;
        }
        let elapsed = (now_ms - self.started_at).max(0.0);
        let text = if self.spec.progress(elapsed) >= 1.0 {
            self.finished = true;
            self.spec.final_text()
        } else {
            self.spec.formatter.format(self.spec.value_at(elapsed))
        };
        log::trace!("counter frame t={now_ms} text={text}");
        self.displayed = Some(text.clone());
        Some(text)
    }

    /// Last text written, if any frame ran.
    pub fn displayed(&self) -> Option<&str> {
        self.displayed.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Lazily pair this counter with a sequence of tick timestamps.
    pub fn frames<I>(self, ticks: I) -> CounterFrames<I::IntoIter>
    where
        I: IntoIterator<Item = f64>,
    {
        CounterFrames {
            counter: self,
            ticks: ticks.into_iter(),
        }
    }
}

/// Iterator of display strings; ends when the counter halts or ticks run out.
#[derive(Debug)]
pub struct CounterFrames<I> {
    counter: CounterAnimation,
    ticks: I,
}

impl<I: Iterator<Item = f64>> Iterator for CounterFrames<I> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let now = self.ticks.next()?;
        self.counter.frame(now)
    }
}
