//! Play requests and stop selectors
use std::ops::RangeInclusive;
use std::time::Duration;

use super::catalog::ClipRef;
use super::category::SoundCategory;
use super::channel::SpatialParams;
use super::fade::VolumeFade;

/// Highest accepted priority value
pub const MAX_PRIORITY: u16 = 256;

/// Default priority (higher = more important)
pub const DEFAULT_PRIORITY: u16 = 128;

/// What a request plays
#[derive(Debug, Clone, PartialEq)]
pub enum SoundTarget {
    /// Catalog identifier
    Id(String),

    /// Clip reference, resolved through the catalog
    Clip(ClipRef),
}

impl SoundTarget {
    /// Sound id, or clip name for clip targets
    pub fn name(&self) -> &str {
        match self {
            SoundTarget::Id(id) => id,
            SoundTarget::Clip(clip) => &clip.name,
        }
    }
}

/// A request to play one sound
#[derive(Debug, Clone)]
pub struct PlaybackRequest {
    pub target: SoundTarget,

    /// Overrides the catalog category
    pub category: Option<SoundCategory>,

    /// Overrides the catalog default volume
    pub volume: Option<VolumeFade>,

    pub start_offset: Duration,
    pub looping: bool,
    pub delay: Duration,
    pub priority: u16,
    pub pitch: f32,

    /// Random pitch range applied at admission, replacing `pitch`
    pub pitch_variation: Option<RangeInclusive<f32>>,

    /// None plays as plain 2-D audio
    pub spatial: Option<SpatialParams>,
}

impl PlaybackRequest {
    fn with_target(target: SoundTarget) -> Self {
        Self {
            target,
            category: None,
            volume: None,
            start_offset: Duration::ZERO,
            looping: false,
            delay: Duration::ZERO,
            priority: DEFAULT_PRIORITY,
            pitch: 1.0,
            pitch_variation: None,
            spatial: None,
        }
    }

    /// Play a catalog sound by identifier
    pub fn id(id: impl Into<String>) -> Self {
        Self::with_target(SoundTarget::Id(id.into()))
    }

    /// Play a catalog sound by clip
    pub fn clip(clip: ClipRef) -> Self {
        Self::with_target(SoundTarget::Clip(clip))
    }

    pub fn with_category(mut self, category: SoundCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_volume(mut self, fade: VolumeFade) -> Self {
        self.volume = Some(fade);
        self
    }

    pub fn with_start_offset(mut self, offset: Duration) -> Self {
        self.start_offset = offset;
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set priority, clamped to 0-256
    pub fn with_priority(mut self, priority: u16) -> Self {
        self.priority = priority.min(MAX_PRIORITY);
        self
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn with_pitch_variation(mut self, range: RangeInclusive<f32>) -> Self {
        self.pitch_variation = Some(range);
        self
    }

    pub fn with_spatial(mut self, spatial: SpatialParams) -> Self {
        self.spatial = Some(spatial);
        self
    }

    /// Pitch to configure the channel with
    pub(crate) fn resolve_pitch(&self) -> f32 {
        use rand::Rng;

        match &self.pitch_variation {
            Some(range) if range.start() < range.end() => {
                rand::thread_rng().gen_range(range.clone())
            }
            Some(range) => *range.start(),
            None => self.pitch,
        }
    }
}

/// Which playbacks a stop applies to
#[derive(Debug, Clone, PartialEq)]
pub enum SoundSelector {
    Id(String),
    Clip(ClipRef),
    Category(SoundCategory),
}

impl From<&str> for SoundSelector {
    fn from(id: &str) -> Self {
        SoundSelector::Id(id.to_string())
    }
}

impl From<String> for SoundSelector {
    fn from(id: String) -> Self {
        SoundSelector::Id(id)
    }
}

impl From<ClipRef> for SoundSelector {
    fn from(clip: ClipRef) -> Self {
        SoundSelector::Clip(clip)
    }
}

impl From<&ClipRef> for SoundSelector {
    fn from(clip: &ClipRef) -> Self {
        SoundSelector::Clip(clip.clone())
    }
}

impl From<SoundCategory> for SoundSelector {
    fn from(category: SoundCategory) -> Self {
        SoundSelector::Category(category)
    }
}
