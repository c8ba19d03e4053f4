//! Active-playback registry
//!
//! Authoritative record of every acquired channel, kept in admission order
//! so the oldest record of a category is always the first match.
use super::catalog::ClipRef;
use super::category::SoundCategory;
use super::channel::{Channel, ChannelId};
use super::fade::FadeTask;
use super::request::SoundSelector;

/// One currently acquired channel and its logical state
#[derive(Debug)]
pub struct ActivePlayback<C> {
    pub(crate) channel: C,
    pub(crate) id: String,
    pub(crate) clip: ClipRef,
    pub(crate) category: SoundCategory,
    pub(crate) raw_volume: f32,
    pub(crate) paused: bool,
    pub(crate) admitted: u64,
    pub(crate) fade: Option<FadeTask>,

    /// Set when a stopping fade completed; released on the same tick
    pub(crate) retired: bool,
}

impl<C: Channel> ActivePlayback<C> {
    pub fn channel_id(&self) -> ChannelId {
        self.channel.id()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn clip(&self) -> &ClipRef {
        &self.clip
    }

    pub fn category(&self) -> SoundCategory {
        self.category
    }

    /// Post-fade, pre-multiplier volume
    pub fn raw_volume(&self) -> f32 {
        self.raw_volume
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    /// Admission sequence number; lower is older
    pub fn admitted(&self) -> u64 {
        self.admitted
    }

    /// Write the raw volume and push `raw × multiplier` to the channel
    pub(crate) fn apply_volume(&mut self, raw_volume: f32, multiplier: f32) {
        self.raw_volume = raw_volume;
        self.channel.set_volume(raw_volume * multiplier);
    }

    pub(crate) fn matches(&self, selector: &SoundSelector) -> bool {
        match selector {
            SoundSelector::Id(id) => &self.id == id,
            SoundSelector::Clip(clip) => &self.clip == clip,
            SoundSelector::Category(category) => self.category == *category,
        }
    }

    fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            channel: self.channel.id(),
            id: self.id.clone(),
            clip: self.clip.name.clone(),
            category: self.category,
            raw_volume: self.raw_volume,
            paused: self.paused,
            fading: self.fade.is_some(),
        }
    }
}

/// Read-only copy of an active record
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub channel: ChannelId,
    pub id: String,
    pub clip: String,
    pub category: SoundCategory,
    pub raw_volume: f32,
    pub paused: bool,
    pub fading: bool,
}

/// Ordered set of active records
#[derive(Debug)]
pub struct ActiveRegistry<C> {
    records: Vec<ActivePlayback<C>>,
    next_admission: u64,
}

impl<C: Channel> ActiveRegistry<C> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_admission: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn count(&self, category: SoundCategory) -> usize {
        self.records.iter().filter(|r| r.category == category).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActivePlayback<C>> {
        self.records.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut ActivePlayback<C>> {
        self.records.iter_mut()
    }

    pub fn find(&self, id: &str) -> Option<&ActivePlayback<C>> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn contains_channel(&self, channel: ChannelId) -> bool {
        self.records.iter().any(|r| r.channel.id() == channel)
    }

    /// Append a record, stamping its admission order
    pub(crate) fn insert(&mut self, mut record: ActivePlayback<C>) -> ChannelId {
        let channel = record.channel.id();
        debug_assert!(
            !self.contains_channel(channel),
            "channel {} registered twice",
            channel
        );
        record.admitted = self.next_admission;
        self.next_admission += 1;
        self.records.push(record);
        channel
    }

    /// Remove the earliest-admitted record of `category`
    pub(crate) fn remove_oldest(&mut self, category: SoundCategory) -> Option<ActivePlayback<C>> {
        let index = self.records.iter().position(|r| r.category == category)?;
        Some(self.records.remove(index))
    }

    /// Remove every record accepted by `predicate`, preserving order of the rest
    pub(crate) fn drain_where(
        &mut self,
        mut predicate: impl FnMut(&ActivePlayback<C>) -> bool,
    ) -> Vec<ActivePlayback<C>> {
        let mut removed = Vec::new();
        let mut index = 0;
        while index < self.records.len() {
            if predicate(&self.records[index]) {
                removed.push(self.records.remove(index));
            } else {
                index += 1;
            }
        }
        removed
    }

    /// Remove records whose channel ended on its own
    pub(crate) fn drain_finished(&mut self) -> Vec<ActivePlayback<C>> {
        self.drain_where(|r| !r.paused && !r.channel.is_playing())
    }

    pub(crate) fn drain_all(&mut self) -> Vec<ActivePlayback<C>> {
        std::mem::take(&mut self.records)
    }

    pub fn snapshot(&self) -> Vec<PlaybackSnapshot> {
        self.records.iter().map(ActivePlayback::snapshot).collect()
    }
}

impl<C: Channel> Default for ActiveRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
