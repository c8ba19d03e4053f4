//! Headless channel backend
//!
//! In-memory channels that record every parameter written to them. Used for
//! tests and for hosts without an audio device. A [`HeadlessProbe`] shares
//! the pool's ledger so state stays inspectable after channels move into the
//! scheduler (or onto the driver thread).
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::catalog::ClipRef;
use super::channel::{Channel, ChannelId, ChannelPool};
use crate::error::PoolError;

/// Everything a headless channel has been told
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelState {
    pub group: String,
    pub clip: Option<ClipRef>,
    pub looping: bool,
    pub volume: f32,
    pub pitch: f32,
    pub priority: u16,
    pub start_offset: Duration,
    pub spatial_blend: f32,
    pub position: [f32; 3],
    pub min_distance: f32,
    pub max_distance: f32,
    pub playing: bool,
    pub paused: bool,
    pub play_count: u32,
}

impl ChannelState {
    fn new(group: &str) -> Self {
        Self {
            group: group.to_string(),
            clip: None,
            looping: false,
            volume: 1.0,
            pitch: 1.0,
            priority: 128,
            start_offset: Duration::ZERO,
            spatial_blend: 0.0,
            position: [0.0; 3],
            min_distance: 1.0,
            max_distance: 500.0,
            playing: false,
            paused: false,
            play_count: 0,
        }
    }
}

#[derive(Debug, Default)]
struct Ledger {
    channels: HashMap<ChannelId, ChannelState>,
    live: HashSet<ChannelId>,
    idle: HashMap<String, Vec<ChannelId>>,
    acquired: usize,
    released: usize,
    destroyed: usize,
    last_parent: Option<String>,
}

impl Ledger {
    fn with_state(&mut self, id: ChannelId, f: impl FnOnce(&mut ChannelState)) {
        if let Some(state) = self.channels.get_mut(&id) {
            f(state);
        }
    }
}

/// In-memory channel
#[derive(Debug)]
pub struct HeadlessChannel {
    id: ChannelId,
    ledger: Arc<Mutex<Ledger>>,
}

impl HeadlessChannel {
    fn update(&self, f: impl FnOnce(&mut ChannelState)) {
        self.ledger.lock().with_state(self.id, f);
    }
}

impl Channel for HeadlessChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    fn set_clip(&mut self, clip: &ClipRef) {
        self.update(|s| s.clip = Some(clip.clone()));
    }

    fn set_looping(&mut self, looping: bool) {
        self.update(|s| s.looping = looping);
    }

    fn set_volume(&mut self, volume: f32) {
        self.update(|s| s.volume = volume);
    }

    fn set_pitch(&mut self, pitch: f32) {
        self.update(|s| s.pitch = pitch);
    }

    fn set_priority(&mut self, priority: u16) {
        self.update(|s| s.priority = priority);
    }

    fn set_start_offset(&mut self, offset: Duration) {
        self.update(|s| s.start_offset = offset);
    }

    fn set_spatial_blend(&mut self, blend: f32) {
        self.update(|s| s.spatial_blend = blend);
    }

    fn set_position(&mut self, position: [f32; 3]) {
        self.update(|s| s.position = position);
    }

    fn set_distances(&mut self, min_distance: f32, max_distance: f32) {
        self.update(|s| {
            s.min_distance = min_distance;
            s.max_distance = max_distance;
        });
    }

    fn play(&mut self) {
        self.update(|s| {
            s.playing = true;
            s.paused = false;
            s.play_count += 1;
        });
    }

    fn stop(&mut self) {
        self.update(|s| {
            s.playing = false;
            s.paused = false;
        });
    }

    fn pause(&mut self) {
        self.update(|s| {
            if s.playing {
                s.paused = true;
            }
        });
    }

    fn resume(&mut self) {
        self.update(|s| s.paused = false);
    }

    fn is_playing(&self) -> bool {
        let ledger = self.ledger.lock();
        ledger
            .channels
            .get(&self.id)
            .map(|s| s.playing && !s.paused)
            .unwrap_or(false)
    }
}

/// Pool of headless channels with per-group recycling
#[derive(Debug, Default)]
pub struct HeadlessPool {
    ledger: Arc<Mutex<Ledger>>,
    next_id: u64,
    limit: Option<usize>,
}

impl HeadlessPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse acquisitions beyond `limit` live channels
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Handle for inspecting channel state from anywhere
    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe {
            ledger: Arc::clone(&self.ledger),
        }
    }
}

impl ChannelPool for HeadlessPool {
    type Channel = HeadlessChannel;

    fn acquire(&mut self, group: &str, parent: Option<&str>) -> Result<HeadlessChannel, PoolError> {
        let mut ledger = self.ledger.lock();

        if let Some(limit) = self.limit {
            if ledger.live.len() >= limit {
                return Err(PoolError::Exhausted {
                    group: group.to_string(),
                });
            }
        }

        let recycled = ledger.idle.get_mut(group).and_then(|ids| ids.pop());
        let id = match recycled {
            Some(id) => id,
            None => {
                let id = ChannelId(self.next_id);
                self.next_id += 1;
                id
            }
        };

        ledger.channels.insert(id, ChannelState::new(group));
        ledger.live.insert(id);
        ledger.acquired += 1;
        ledger.last_parent = parent.map(str::to_string);
        drop(ledger);

        Ok(HeadlessChannel {
            id,
            ledger: Arc::clone(&self.ledger),
        })
    }

    fn release(&mut self, channel: HeadlessChannel) {
        let mut ledger = self.ledger.lock();

        if !ledger.live.remove(&channel.id) {
            debug_assert!(false, "channel {} released twice", channel.id);
            tracing::warn!("Ignoring double release of {}", channel.id);
            return;
        }

        let mut group = None;
        ledger.with_state(channel.id, |s| {
            s.playing = false;
            s.paused = false;
            group = Some(s.group.clone());
        });
        if let Some(group) = group {
            ledger.idle.entry(group).or_default().push(channel.id);
        }
        ledger.released += 1;
    }

    fn release_all_in_group(&mut self, group: &str) {
        let mut ledger = self.ledger.lock();
        if let Some(ids) = ledger.idle.remove(group) {
            ledger.destroyed += ids.len();
            for id in ids {
                ledger.channels.remove(&id);
            }
        }
    }
}

/// Read side of a headless pool
#[derive(Debug, Clone)]
pub struct HeadlessProbe {
    ledger: Arc<Mutex<Ledger>>,
}

impl HeadlessProbe {
    /// Last known state of a channel
    pub fn state(&self, id: ChannelId) -> Option<ChannelState> {
        self.ledger.lock().channels.get(&id).cloned()
    }

    /// Output volume of a channel
    pub fn volume(&self, id: ChannelId) -> Option<f32> {
        self.state(id).map(|s| s.volume)
    }

    /// Simulate the clip reaching its natural end
    pub fn finish(&self, id: ChannelId) {
        self.ledger.lock().with_state(id, |s| {
            s.playing = false;
            s.paused = false;
        });
    }

    /// Channels currently handed out
    pub fn live_count(&self) -> usize {
        self.ledger.lock().live.len()
    }

    pub fn is_live(&self, id: ChannelId) -> bool {
        self.ledger.lock().live.contains(&id)
    }

    pub fn acquired(&self) -> usize {
        self.ledger.lock().acquired
    }

    pub fn released(&self) -> usize {
        self.ledger.lock().released
    }

    /// Idle channels waiting for reuse in `group`
    pub fn idle_count(&self, group: &str) -> usize {
        self.ledger
            .lock()
            .idle
            .get(group)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Idle channels dropped through `release_all_in_group`
    pub fn destroyed(&self) -> usize {
        self.ledger.lock().destroyed
    }

    pub fn last_parent(&self) -> Option<String> {
        self.ledger.lock().last_parent.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_release_recycles() {
        let mut pool = HeadlessPool::new();
        let probe = pool.probe();

        let channel = pool.acquire("AudioSound", None).unwrap();
        let id = channel.id();
        assert_eq!(probe.live_count(), 1);

        pool.release(channel);
        assert_eq!(probe.live_count(), 0);
        assert_eq!(probe.idle_count("AudioSound"), 1);

        let again = pool.acquire("AudioSound", Some("Level")).unwrap();
        assert_eq!(again.id(), id);
        assert_eq!(probe.acquired(), 2);
        assert_eq!(probe.last_parent().as_deref(), Some("Level"));
    }

    #[test]
    fn test_recycled_channel_is_reset() {
        let mut pool = HeadlessPool::new();
        let probe = pool.probe();

        let mut channel = pool.acquire("g", None).unwrap();
        channel.set_volume(0.3);
        channel.set_looping(true);
        let id = channel.id();
        pool.release(channel);

        let _channel = pool.acquire("g", None).unwrap();
        let state = probe.state(id).unwrap();
        assert_eq!(state.volume, 1.0);
        assert!(!state.looping);
    }

    #[test]
    fn test_groups_do_not_share_idle_channels() {
        let mut pool = HeadlessPool::new();
        let a = pool.acquire("a", None).unwrap();
        let a_id = a.id();
        pool.release(a);

        let b = pool.acquire("b", None).unwrap();
        assert_ne!(b.id(), a_id);
    }

    #[test]
    fn test_play_pause_finish() {
        let mut pool = HeadlessPool::new();
        let probe = pool.probe();
        let mut channel = pool.acquire("g", None).unwrap();

        assert!(!channel.is_playing());
        channel.play();
        assert!(channel.is_playing());
        channel.pause();
        assert!(!channel.is_playing());
        channel.resume();
        assert!(channel.is_playing());

        probe.finish(channel.id());
        assert!(!channel.is_playing());
    }

    #[test]
    fn test_limit_exhausts() {
        let mut pool = HeadlessPool::new().with_limit(1);
        let _held = pool.acquire("g", None).unwrap();
        let err = pool.acquire("g", None).unwrap_err();
        assert!(matches!(err, PoolError::Exhausted { .. }));
    }

    #[test]
    fn test_release_all_in_group_drops_idle() {
        let mut pool = HeadlessPool::new();
        let probe = pool.probe();
        let first = pool.acquire("g", None).unwrap();
        let second = pool.acquire("g", None).unwrap();
        pool.release(first);
        pool.release(second);

        pool.release_all_in_group("g");
        assert_eq!(probe.idle_count("g"), 0);
        assert_eq!(probe.destroyed(), 2);
    }
}
