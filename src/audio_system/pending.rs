//! Pending-start registry
//!
//! Delayed requests waiting for their start time. One entry per sound id;
//! registering the same id again supersedes the earlier entry.
use std::time::Duration;

use super::catalog::ClipRef;
use super::category::SoundCategory;
use super::request::{PlaybackRequest, SoundSelector};

/// A delayed request waiting to be admitted
#[derive(Debug, Clone)]
pub struct PendingStart {
    pub(crate) id: String,
    pub(crate) clip: ClipRef,
    pub(crate) category: SoundCategory,
    pub(crate) request: PlaybackRequest,
    pub(crate) remaining: Duration,
}

impl PendingStart {
    pub fn new(
        id: impl Into<String>,
        clip: ClipRef,
        category: SoundCategory,
        request: PlaybackRequest,
    ) -> Self {
        let remaining = request.delay;
        Self {
            id: id.into(),
            clip,
            category,
            request,
            remaining,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    fn matches(&self, selector: &SoundSelector) -> bool {
        match selector {
            SoundSelector::Id(id) => &self.id == id,
            SoundSelector::Clip(clip) => &self.clip == clip,
            SoundSelector::Category(category) => self.category == *category,
        }
    }
}

/// Registration-ordered pending starts
#[derive(Debug, Default)]
pub struct PendingRegistry {
    entries: Vec<PendingStart>,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&PendingStart> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Identifiers in registration order
    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }

    /// Register an entry, returning the one it superseded
    pub fn register(&mut self, entry: PendingStart) -> Option<PendingStart> {
        let superseded = self.cancel(&entry.id);
        self.entries.push(entry);
        superseded
    }

    /// Cancel by id; absent ids are a no-op
    pub fn cancel(&mut self, id: &str) -> Option<PendingStart> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(index))
    }

    /// Cancel every entry matching `selector`
    pub fn cancel_matching(&mut self, selector: &SoundSelector) -> Vec<PendingStart> {
        let (cancelled, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| e.matches(selector));
        self.entries = kept;
        cancelled
    }

    pub fn cancel_all(&mut self) -> Vec<PendingStart> {
        std::mem::take(&mut self.entries)
    }

    /// Count down every entry and remove the ones whose delay elapsed,
    /// returned in registration order
    pub fn advance(&mut self, delta: Duration) -> Vec<PendingStart> {
        for entry in &mut self.entries {
            entry.remaining = entry.remaining.saturating_sub(delta);
        }
        let (elapsed, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| e.remaining.is_zero());
        self.entries = waiting;
        elapsed
    }
}
