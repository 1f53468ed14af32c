//! Deterministic timer queue standing in for `setTimeout`/`setInterval`.
//!
//! Tasks run in `(due_at, order)` order; interval tasks re-arm themselves after
//! each run and run at most once per `run_due`, like a throttled `setInterval`. There is no cancellation: once scheduled, a task runs.

use serde::{Deserialize, Serialize};

use crate::ids::{IdAllocator, TimerId};

/// Upper bound on tasks run by one `run_due` call.
const DEFAULT_STEP_LIMIT: usize = 10_000;
/// Intervals shorter than this are clamped, as browsers do.
const MIN_INTERVAL_MS: f64 = 1.0;

/// Next due time strictly after `now_ms`, on the interval's original phase.
/// Periods missed during a stall are dropped, not replayed.
fn rearm_after(due_at: f64, period: f64, now_ms: f64) -> f64 {
    let next = due_at + period;
    if next > now_ms {
        return next;
    }
    next + period * (((now_ms - next) / period).floor() + 1.0)
}

#[derive(Clone, Debug)]
pub struct ScheduledTask<T> {
    pub id: TimerId,
    pub due_at: f64,
    pub order: u64,
    pub interval_ms: Option<f64>,
    pub task: T,
}

/// Externally visible view of a queued task.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingTimer {
    pub id: TimerId,
    pub due_at: f64,
    pub order: u64,
    pub interval_ms: Option<f64>,
}

#[derive(Debug)]
pub struct TimerQueue<T> {
    tasks: Vec<ScheduledTask<T>>,
    ids: IdAllocator,
    next_order: u64,
    step_limit: usize,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            ids: IdAllocator::new(),
            next_order: 0,
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }
}

impl<T: Clone> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step_limit(step_limit: usize) -> Self {
        Self {
            step_limit: step_limit.max(1),
            ..Self::default()
        }
    }

    fn push(&mut self, due_at: f64, interval_ms: Option<f64>, task: T) -> TimerId {
        let id = self.ids.alloc_timer();
        let order = self.next_order;
        self.next_order += 1;
        self.tasks.push(ScheduledTask {
            id,
            due_at,
            order,
            interval_ms,
            task,
        });
        id
    }

    /// One-shot task `delay_ms` after `now_ms`.
    pub fn schedule(&mut self, now_ms: f64, delay_ms: f64, task: T) -> TimerId {
        self.push(now_ms + delay_ms.max(0.0), None, task)
    }

    /// Repeating task, first run one period after `now_ms`.
    pub fn schedule_interval(&mut self, now_ms: f64, period_ms: f64, task: T) -> TimerId {
        let period = period_ms.max(MIN_INTERVAL_MS);
        self.push(now_ms + period, Some(period), task)
    }

    fn next_index(&self, due_limit: f64) -> Option<usize> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_at <= due_limit)
            .min_by(|(_, a), (_, b)| a.due_at.total_cmp(&b.due_at).then(a.order.cmp(&b.order)))
            .map(|(i, _)| i)
    }

    /// Pop every task due at or before `now_ms`, re-arming intervals.
    pub fn run_due(&mut self, now_ms: f64) -> Vec<(TimerId, T)> {
        let mut ran = Vec::new();
        while let Some(idx) = self.next_index(now_ms) {
            if ran.len() >= self.step_limit {
                log::warn!(
                    "timer step limit {} reached at t={now_ms}; {} task(s) deferred",
                    self.step_limit,
                    self.tasks.len()
                );
                break;
            }
            match self.tasks[idx].interval_ms {
                Some(period) => {
                    let order = self.next_order;
                    self.next_order += 1;
                    let t = &mut self.tasks[idx];
                    t.due_at = rearm_after(t.due_at, period, now_ms);
                    t.order = order;
                    ran.push((t.id, t.task.clone()));
                }
                None => {
                    let t = self.tasks.remove(idx);
                    ran.push((t.id, t.task));
                }
            }
        }
        ran
    }

    pub fn pending(&self) -> Vec<PendingTimer> {
        let mut timers: Vec<PendingTimer> = self
            .tasks
            .iter()
            .map(|t| PendingTimer {
                id: t.id,
                due_at: t.due_at,
                order: t.order,
                interval_ms: t.interval_ms,
            })
            .collect();
        timers.sort_by(|a, b| a.due_at.total_cmp(&b.due_at).then(a.order.cmp(&b.order)));
        timers
    }

    /// Earliest due time of any queued task.
    pub fn next_due(&self) -> Option<f64> {
        self.tasks.iter().map(|t| t.due_at).min_by(f64::total_cmp)
    }

    /// True when only repeating tasks remain.
    pub fn only_intervals(&self) -> bool {
        self.tasks.iter().all(|t| t.interval_ms.is_some())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
