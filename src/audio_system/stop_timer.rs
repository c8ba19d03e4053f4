//! Delayed stops
//!
//! A stop timer releases every playback matching its selector once its
//! delay elapses, without touching volume. Timers are independent: several
//! may target the same sound and the first to elapse wins.
use std::time::Duration;

use super::request::SoundSelector;

#[derive(Debug, Clone)]
pub struct StopTimer {
    pub(crate) selector: SoundSelector,
    pub(crate) remaining: Duration,
}

impl StopTimer {
    pub fn new(selector: impl Into<SoundSelector>, delay: Duration) -> Self {
        Self {
            selector: selector.into(),
            remaining: delay,
        }
    }

    pub fn selector(&self) -> &SoundSelector {
        &self.selector
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }
}

/// Scheduling-ordered stop timers
#[derive(Debug, Default)]
pub struct StopTimers {
    timers: Vec<StopTimer>,
}

impl StopTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn schedule(&mut self, timer: StopTimer) {
        self.timers.push(timer);
    }

    pub fn iter(&self) -> impl Iterator<Item = &StopTimer> {
        self.timers.iter()
    }

    pub fn cancel_all(&mut self) -> Vec<StopTimer> {
        std::mem::take(&mut self.timers)
    }

    /// Count down every timer and remove the elapsed ones, in scheduling order
    pub fn advance(&mut self, delta: Duration) -> Vec<StopTimer> {
        for timer in &mut self.timers {
            timer.remaining = timer.remaining.saturating_sub(delta);
        }
        let (elapsed, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.timers)
            .into_iter()
            .partition(|t| t.remaining.is_zero());
        self.timers = waiting;
        elapsed
    }
}
