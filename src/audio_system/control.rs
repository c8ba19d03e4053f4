//! Category controller
//!
//! Enable flags and volume multipliers. Volume changes are pushed to every
//! affected channel immediately; raw volumes and running fades are untouched.
use tracing::{debug, info};

use super::category::{CategoryState, SoundCategory};
use super::channel::ChannelPool;
use super::scheduler::SoundScheduler;

impl<P: ChannelPool> SoundScheduler<P> {
    pub fn category(&self, category: SoundCategory) -> &CategoryState {
        self.categories.get(category)
    }

    pub fn is_enabled(&self, category: SoundCategory) -> bool {
        self.categories.is_enabled(category)
    }

    /// Current multiplier of `category`
    pub fn volume(&self, category: SoundCategory) -> f32 {
        self.categories.multiplier(category)
    }

    /// Enable or disable a category
    ///
    /// Disabling pauses its active playbacks (records stay) and enabling
    /// resumes them. Pending starts are kept and re-checked when they elapse.
    pub fn set_enabled(&mut self, category: SoundCategory, enabled: bool) {
        let state = self.categories.get_mut(category);
        if state.enabled == enabled {
            return;
        }
        state.enabled = enabled;
        info!(
            "{} {}",
            category,
            if enabled { "enabled" } else { "disabled" }
        );

        if enabled {
            self.resume(category);
        } else {
            self.pause(category);
        }
    }

    pub fn set_all_enabled(&mut self, enabled: bool) {
        for category in SoundCategory::ALL {
            self.set_enabled(category, enabled);
        }
    }

    /// Set the multiplier of `category` (clamped to 0.0-1.0)
    pub fn set_volume(&mut self, category: SoundCategory, volume: f32) {
        self.categories.get_mut(category).set_volume(volume);
        let multiplier = self.categories.multiplier(category);
        debug!("{} volume set to {:.2}", category, multiplier);

        for record in self.active.iter_mut().filter(|r| r.category == category) {
            let raw = record.raw_volume;
            record.apply_volume(raw, multiplier);
        }
    }

    pub fn set_all_volume(&mut self, volume: f32) {
        for category in SoundCategory::ALL {
            self.set_volume(category, volume);
        }
    }
}
