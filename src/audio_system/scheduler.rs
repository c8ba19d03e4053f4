//! Playback scheduler
//!
//! Admission, eviction, delayed starts and fade orchestration. All time
//! based state advances inside [`SoundScheduler::tick`].
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::catalog::{ClipRef, SoundCatalog};
use super::category::{CategoryStates, SoundCategory};
use super::channel::{Channel, ChannelId, ChannelPool, SpatialParams};
use super::fade::{FadeEnd, FadeTask, VolumeFade};
use super::pending::{PendingRegistry, PendingStart};
use super::registry::{ActivePlayback, ActiveRegistry, PlaybackSnapshot};
use super::request::{PlaybackRequest, SoundSelector, SoundTarget};
use super::stop_timer::{StopTimer, StopTimers};
use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::messaging::{DropReason, EventBus, PlaybackEvent};

/// Shared, read-only sound catalog
pub type SharedCatalog = Arc<dyn SoundCatalog + Send + Sync>;

/// Request after catalog resolution
struct Resolved {
    id: String,
    clip: ClipRef,
    category: SoundCategory,
}

/// Bounded-concurrency playback scheduler
///
/// Owns every acquired channel through its active records. Channels go back
/// to the pool exactly once: on natural end (sweep), explicit stop,
/// eviction, completed fade-out, or `destroy_all`.
pub struct SoundScheduler<P: ChannelPool> {
    pub(crate) config: SchedulerConfig,
    catalog: SharedCatalog,
    pub(crate) pool: P,
    pub(crate) active: ActiveRegistry<P::Channel>,
    pub(crate) pending: PendingRegistry,
    stop_timers: StopTimers,
    pub(crate) categories: CategoryStates,
    parent_group: Option<String>,
    events: Option<EventBus>,
}

impl<P: ChannelPool> SoundScheduler<P> {
    /// Create a scheduler
    ///
    /// An invalid capacity (zero) is reported here once and raised to one.
    pub fn new(mut config: SchedulerConfig, catalog: SharedCatalog, pool: P) -> Self {
        if let Err(e) = config.validate() {
            tracing::error!("Scheduler configuration error: {}", e);
            config.max_capacity_music = config.max_capacity_music.max(1);
            config.max_capacity_sfx = config.max_capacity_sfx.max(1);
        }

        if catalog.is_empty() {
            tracing::error!("Sound catalog is empty");
        }

        let categories = CategoryStates::from_config(&config);

        Self {
            config,
            catalog,
            pool,
            active: ActiveRegistry::new(),
            pending: PendingRegistry::new(),
            stop_timers: StopTimers::new(),
            categories,
            parent_group: None,
            events: None,
        }
    }

    /// Publish playback events on `bus`
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    /// Parent forwarded to the pool on every acquire
    pub fn set_parent_group(&mut self, parent: Option<String>) {
        self.parent_group = parent;
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut P {
        &mut self.pool
    }

    pub fn capacity(&self, category: SoundCategory) -> usize {
        self.config.capacity(category)
    }

    pub fn active_count(&self, category: SoundCategory) -> usize {
        self.active.count(category)
    }

    /// Active records in admission order
    pub fn active(&self) -> impl Iterator<Item = &ActivePlayback<P::Channel>> {
        self.active.iter()
    }

    pub fn snapshot(&self) -> Vec<PlaybackSnapshot> {
        self.active.snapshot()
    }

    pub fn pending_ids(&self) -> Vec<String> {
        self.pending.ids()
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.contains(id)
    }

    /// True while an unpaused record for `id` exists
    pub fn is_playing(&self, id: &str) -> bool {
        self.active.iter().any(|r| r.id() == id && !r.is_paused())
    }

    /// Clip of the first active record for `id`
    pub fn active_clip(&self, id: &str) -> Option<&ClipRef> {
        self.active.find(id).map(|r| r.clip())
    }

    /// Request playback
    ///
    /// Returns the channel id when the sound started now. Delayed requests,
    /// unresolvable sounds and disabled categories return `None`.
    pub fn request_play(&mut self, mut request: PlaybackRequest) -> Option<ChannelId> {
        if self.categories.all_disabled() {
            let id = request.target.name().to_string();
            debug!("All categories disabled, dropping {}", id);
            self.publish(PlaybackEvent::Dropped {
                id,
                reason: DropReason::CategoryDisabled,
            });
            return None;
        }

        let resolved = match self.resolve(&mut request) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!("[Sound] {}", e);
                self.publish(PlaybackEvent::Dropped {
                    id: request.target.name().to_string(),
                    reason: DropReason::Unresolved,
                });
                return None;
            }
        };

        if !self.categories.is_enabled(resolved.category) {
            debug!("{} disabled, dropping {}", resolved.category, resolved.id);
            self.publish(PlaybackEvent::Dropped {
                id: resolved.id,
                reason: DropReason::CategoryDisabled,
            });
            return None;
        }

        self.make_room(resolved.category);

        if !request.delay.is_zero() {
            let delay = request.delay;
            let id = resolved.id.clone();
            let entry = PendingStart::new(resolved.id, resolved.clip, resolved.category, request);
            if self.pending.register(entry).is_some() {
                debug!("Superseded pending start for {}", id);
                self.publish(PlaybackEvent::PendingCancelled { id: id.clone() });
            }
            debug!("Scheduled {} in {:?}", id, delay);
            self.publish(PlaybackEvent::Scheduled { id, delay });
            return None;
        }

        self.start(resolved, &request)
    }

    /// Advance time by `delta`
    ///
    /// Fades are sampled first, then elapsed stop timers fire, then
    /// naturally ended channels are swept, then elapsed pending starts are
    /// admitted in registration order.
    pub fn tick(&mut self, delta: Duration) {
        self.advance_fades(delta);

        for timer in self.stop_timers.advance(delta) {
            debug!("Stop timer elapsed for {:?}", timer.selector());
            self.stop(timer.selector);
        }

        self.sweep();

        for entry in self.pending.advance(delta) {
            self.promote(entry);
        }
    }

    /// Look up the catalog entry and settle the volume the request plays at
    fn resolve(&self, request: &mut PlaybackRequest) -> Result<Resolved, SchedulerError> {
        let descriptor = match &request.target {
            SoundTarget::Id(id) => self
                .catalog
                .resolve(id)
                .ok_or_else(|| SchedulerError::UnknownSound(id.clone()))?,
            SoundTarget::Clip(clip) => self
                .catalog
                .resolve_clip(clip)
                .ok_or_else(|| SchedulerError::UnknownClip(clip.name.clone()))?,
        };

        if request.volume.is_none() {
            request.volume = Some(VolumeFade::constant(descriptor.volume));
        }

        Ok(Resolved {
            id: descriptor.id.clone(),
            clip: descriptor.clip.clone(),
            category: request.category.unwrap_or(descriptor.category),
        })
    }

    /// Evict oldest records of `category` until one slot is free
    fn make_room(&mut self, category: SoundCategory) {
        let capacity = self.capacity(category);
        while self.active.count(category) >= capacity {
            let Some(oldest) = self.active.remove_oldest(category) else {
                break;
            };
            debug!(
                "{} at capacity ({}), evicting {} on {}",
                category,
                capacity,
                oldest.id(),
                oldest.channel_id()
            );
            let event = PlaybackEvent::Evicted {
                id: oldest.id().to_string(),
                channel: oldest.channel_id(),
            };
            self.release(oldest);
            self.publish(event);
        }
    }

    /// Acquire and configure a channel, then register it
    fn start(&mut self, resolved: Resolved, request: &PlaybackRequest) -> Option<ChannelId> {
        let mut channel = match self
            .pool
            .acquire(&self.config.pool_group, self.parent_group.as_deref())
        {
            Ok(channel) => channel,
            Err(e) => {
                warn!("[Sound] Cannot start {}: {}", resolved.id, e);
                self.publish(PlaybackEvent::Dropped {
                    id: resolved.id,
                    reason: DropReason::PoolUnavailable,
                });
                return None;
            }
        };

        channel.stop();
        channel.set_clip(&resolved.clip);
        channel.set_looping(request.looping);
        channel.set_priority(request.priority);
        channel.set_pitch(request.resolve_pitch());
        if !request.start_offset.is_zero() {
            channel.set_start_offset(request.start_offset);
        }

        match &request.spatial {
            Some(spatial) => {
                channel.set_spatial_blend(1.0);
                channel.set_position(spatial.position);
                channel.set_distances(spatial.min_distance, spatial.max_distance);
            }
            None => {
                let defaults = SpatialParams::default();
                channel.set_spatial_blend(0.0);
                channel.set_distances(defaults.min_distance, defaults.max_distance);
            }
        }

        let fade = request.volume.unwrap_or_default();
        let mut record = ActivePlayback {
            channel,
            id: resolved.id,
            clip: resolved.clip,
            category: resolved.category,
            raw_volume: 0.0,
            paused: false,
            admitted: 0,
            fade: None,
            retired: false,
        };
        record.apply_volume(
            fade.starting_volume(),
            self.categories.multiplier(resolved.category),
        );
        if !fade.is_instant() {
            record.fade = Some(FadeTask::new(fade, FadeEnd::Hold));
        }
        record.channel.play();

        let id = record.id.clone();
        let category = record.category;
        let channel_id = self.active.insert(record);
        debug!("Started {} ({}) on {}", id, category, channel_id);
        self.publish(PlaybackEvent::Started {
            id,
            category,
            channel: channel_id,
        });

        Some(channel_id)
    }

    /// Re-run admission for an elapsed pending start
    fn promote(&mut self, entry: PendingStart) {
        if !self.categories.is_enabled(entry.category) {
            debug!(
                "{} disabled when {} became due, dropping",
                entry.category, entry.id
            );
            self.publish(PlaybackEvent::Dropped {
                id: entry.id,
                reason: DropReason::CategoryDisabled,
            });
            return;
        }

        self.make_room(entry.category);
        let resolved = Resolved {
            id: entry.id,
            clip: entry.clip,
            category: entry.category,
        };
        self.start(resolved, &entry.request);
    }

    /// Ramps keep running while a record is paused
    fn advance_fades(&mut self, delta: Duration) {
        let categories = &self.categories;
        let mut retiring = false;

        for record in self.active.iter_mut() {
            let Some(task) = record.fade.as_mut() else {
                continue;
            };
            let (volume, done) = task.advance(delta);
            let end = task.end();
            record.apply_volume(volume, categories.multiplier(record.category));

            if done {
                record.fade = None;
                if end == FadeEnd::Stop {
                    record.retired = true;
                    retiring = true;
                }
            }
        }

        if retiring {
            for record in self.active.drain_where(|r| r.retired) {
                debug!("Fade-out of {} complete", record.id());
                let event = PlaybackEvent::Stopped {
                    id: record.id().to_string(),
                    channel: record.channel_id(),
                };
                self.release(record);
                self.publish(event);
            }
        }
    }

    /// Reclaim channels whose clip ended on its own
    fn sweep(&mut self) {
        for record in self.active.drain_finished() {
            debug!("{} finished on {}", record.id(), record.channel_id());
            let event = PlaybackEvent::Finished {
                id: record.id().to_string(),
                channel: record.channel_id(),
            };
            self.release(record);
            self.publish(event);
        }
    }

    /// Stop a record's channel and hand it back to the pool
    pub(crate) fn release(&mut self, record: ActivePlayback<P::Channel>) {
        let mut channel = record.channel;
        channel.stop();
        self.pool.release(channel);
    }

    pub(crate) fn publish(&self, event: PlaybackEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }

    /// Stop matching playbacks and cancel matching pending starts
    pub fn stop(&mut self, selector: impl Into<SoundSelector>) {
        let selector = selector.into();

        for record in self.active.drain_where(|r| r.matches(&selector)) {
            let event = PlaybackEvent::Stopped {
                id: record.id().to_string(),
                channel: record.channel_id(),
            };
            self.release(record);
            self.publish(event);
        }

        for entry in self.pending.cancel_matching(&selector) {
            debug!("Cancelled pending start for {}", entry.id());
            self.publish(PlaybackEvent::PendingCancelled { id: entry.id });
        }
    }

    /// Stop every playback, cancel every pending start and stop timer
    pub fn stop_all(&mut self) {
        self.stop_timers.cancel_all();

        for record in self.active.drain_all() {
            let event = PlaybackEvent::Stopped {
                id: record.id().to_string(),
                channel: record.channel_id(),
            };
            self.release(record);
            self.publish(event);
        }

        for entry in self.pending.cancel_all() {
            self.publish(PlaybackEvent::PendingCancelled { id: entry.id });
        }
    }

    /// Cancel a pending start by id; no-op when none exists
    pub fn cancel_pending(&mut self, id: &str) -> bool {
        match self.pending.cancel(id) {
            Some(entry) => {
                self.publish(PlaybackEvent::PendingCancelled { id: entry.id });
                true
            }
            None => false,
        }
    }

    /// Stop matching playbacks once `delay` has elapsed
    ///
    /// Volume is left alone until the stop. Playbacks that start before the
    /// timer fires are stopped too when they match. A zero delay stops now.
    pub fn stop_after(&mut self, selector: impl Into<SoundSelector>, delay: Duration) {
        let selector = selector.into();
        if delay.is_zero() {
            self.stop(selector);
            return;
        }
        debug!("Stopping {:?} in {:?}", selector, delay);
        self.stop_timers.schedule(StopTimer::new(selector, delay));
    }

    /// Number of stop timers still counting down
    pub fn stop_timer_count(&self) -> usize {
        self.stop_timers.len()
    }

    /// Ramp matching playbacks to silence, then stop them
    ///
    /// Matching pending starts are cancelled. Returns how many playbacks
    /// started fading out.
    pub fn fade_out(&mut self, selector: impl Into<SoundSelector>, duration: Duration) -> usize {
        let selector = selector.into();
        if duration.is_zero() {
            let before = self.active.len();
            self.stop(selector);
            return before - self.active.len();
        }

        let mut fading = 0;
        for record in self.active.iter_mut().filter(|r| r.matches(&selector)) {
            let fade = VolumeFade::new(record.raw_volume, 0.0, duration);
            record.fade = Some(FadeTask::new(fade, FadeEnd::Stop));
            fading += 1;
        }

        for entry in self.pending.cancel_matching(&selector) {
            self.publish(PlaybackEvent::PendingCancelled { id: entry.id });
        }

        fading
    }

    /// Pause every playback of `category`
    pub fn pause(&mut self, category: SoundCategory) {
        for record in self.active.iter_mut().filter(|r| r.category == category) {
            record.paused = true;
            record.channel.pause();
        }
    }

    /// Resume every playback of `category`
    pub fn resume(&mut self, category: SoundCategory) {
        for record in self.active.iter_mut().filter(|r| r.category == category) {
            record.paused = false;
            record.channel.resume();
        }
    }

    pub fn pause_all(&mut self) {
        for record in self.active.iter_mut() {
            record.paused = true;
            record.channel.pause();
        }
    }

    pub fn resume_all(&mut self) {
        for record in self.active.iter_mut() {
            record.paused = false;
            record.channel.resume();
        }
    }

    /// Hard reset
    ///
    /// Stops everything, returns every channel, destroys the pool group and
    /// restores category state from configuration.
    pub fn destroy_all(&mut self) {
        self.stop_all();
        self.pool.release_all_in_group(&self.config.pool_group);
        self.categories = CategoryStates::from_config(&self.config);
        info!("Destroyed all playback in group {}", self.config.pool_group);
    }

    /// Log a status dump
    pub fn log_status(&self) {
        info!("SoundScheduler status");
        info!("  Pool group: {}", self.config.pool_group);
        info!("  Parent group: {:?}", self.parent_group);
        for category in SoundCategory::ALL {
            let state = self.categories.get(category);
            info!(
                "  {}: enabled={} volume={:.2} active={}/{}",
                category,
                state.enabled,
                state.volume(),
                self.active.count(category),
                self.capacity(category)
            );
        }
        info!("  Catalog sounds: {}", self.catalog.len());
        for (index, record) in self.active.iter().enumerate() {
            info!(
                "  active[{}]: {} on {} raw={:.2} paused={}",
                index,
                record.id(),
                record.channel_id(),
                record.raw_volume(),
                record.is_paused()
            );
        }
        for entry in self.pending.ids() {
            info!("  pending: {}", entry);
        }
        for timer in self.stop_timers.iter() {
            info!("  stop in {:?}: {:?}", timer.remaining(), timer.selector());
        }
    }
}
