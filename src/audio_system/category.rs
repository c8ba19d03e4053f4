//! Sound categories and their mix state
//!
//! Categories drive capacity limits and volume multipliers.
use std::fmt;

use serde::{Deserialize, Serialize};

use super::fade::unit_volume;
use crate::config::SchedulerConfig;

/// Sound category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundCategory {
    /// Background music
    Music,

    /// Sound effects
    #[default]
    Sfx,
}

impl SoundCategory {
    /// Every category, in a stable order
    pub const ALL: [SoundCategory; 2] = [SoundCategory::Music, SoundCategory::Sfx];

    fn index(self) -> usize {
        match self {
            SoundCategory::Music => 0,
            SoundCategory::Sfx => 1,
        }
    }
}

impl fmt::Display for SoundCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoundCategory::Music => write!(f, "Music"),
            SoundCategory::Sfx => write!(f, "SFX"),
        }
    }
}

/// Enable flag and volume multiplier of one category
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryState {
    pub enabled: bool,
    volume: f32,
}

impl CategoryState {
    pub fn new(enabled: bool, volume: f32) -> Self {
        Self {
            enabled,
            volume: unit_volume(volume),
        }
    }

    /// Volume multiplier (0.0-1.0)
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Set the multiplier, clamped to 0.0-1.0
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = unit_volume(volume);
    }
}

impl Default for CategoryState {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 1.0,
        }
    }
}

/// Per-category state table
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStates {
    states: [CategoryState; 2],
}

impl CategoryStates {
    /// Initial states from configuration
    pub fn from_config(config: &SchedulerConfig) -> Self {
        let mut states = Self {
            states: [CategoryState::default(); 2],
        };
        *states.get_mut(SoundCategory::Music) =
            CategoryState::new(config.music_enabled, config.music_volume);
        *states.get_mut(SoundCategory::Sfx) =
            CategoryState::new(config.sfx_enabled, config.sfx_volume);
        states
    }

    pub fn get(&self, category: SoundCategory) -> &CategoryState {
        &self.states[category.index()]
    }

    pub fn get_mut(&mut self, category: SoundCategory) -> &mut CategoryState {
        &mut self.states[category.index()]
    }

    pub fn is_enabled(&self, category: SoundCategory) -> bool {
        self.get(category).enabled
    }

    /// True when no category accepts new playback
    pub fn all_disabled(&self) -> bool {
        self.states.iter().all(|s| !s.enabled)
    }

    pub fn multiplier(&self, category: SoundCategory) -> f32 {
        self.get(category).volume()
    }
}

impl Default for CategoryStates {
    fn default() -> Self {
        Self::from_config(&SchedulerConfig::default())
    }
}
