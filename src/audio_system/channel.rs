//! Channel resource and pool seams
//!
//! A channel is one playable output (a voice). Channels are handed out by a
//! pool keyed by resource group and must be handed back exactly once.
use std::fmt;
use std::time::Duration;

use crate::audio_system::catalog::ClipRef;
use crate::error::PoolError;

/// Identity of a pooled channel, unique for the pool's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch#{}", self.0)
    }
}

/// 3-D emitter placement forwarded to the channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialParams {
    pub position: [f32; 3],
    pub min_distance: f32,
    pub max_distance: f32,
}

impl SpatialParams {
    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_distances(mut self, min_distance: f32, max_distance: f32) -> Self {
        self.min_distance = min_distance.max(0.0);
        self.max_distance = max_distance.max(self.min_distance);
        self
    }
}

impl Default for SpatialParams {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            min_distance: 1.0,
            max_distance: 500.0,
        }
    }
}

/// Opaque audio output primitive
pub trait Channel {
    fn id(&self) -> ChannelId;

    fn set_clip(&mut self, clip: &ClipRef);
    fn set_looping(&mut self, looping: bool);
    fn set_volume(&mut self, volume: f32);
    fn set_pitch(&mut self, pitch: f32);
    fn set_priority(&mut self, priority: u16);
    fn set_start_offset(&mut self, offset: Duration);

    /// 0.0 = plain 2-D, 1.0 = fully positional
    fn set_spatial_blend(&mut self, blend: f32);
    fn set_position(&mut self, position: [f32; 3]);
    fn set_distances(&mut self, min_distance: f32, max_distance: f32);

    fn play(&mut self);
    fn stop(&mut self);
    fn pause(&mut self);
    fn resume(&mut self);

    /// False once the clip ended, was stopped, or while paused
    fn is_playing(&self) -> bool;
}

/// Recycling pool of channels keyed by resource group
pub trait ChannelPool {
    type Channel: Channel;

    /// Take a channel out of `group`, optionally parented under `parent`
    fn acquire(&mut self, group: &str, parent: Option<&str>) -> Result<Self::Channel, PoolError>;

    /// Hand a channel back to the pool
    fn release(&mut self, channel: Self::Channel);

    /// Drop every idle channel recycled under `group`
    fn release_all_in_group(&mut self, group: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_id_display() {
        assert_eq!(ChannelId(7).to_string(), "ch#7");
    }

    #[test]
    fn test_spatial_defaults() {
        let spatial = SpatialParams::at([1.0, 2.0, 3.0]);
        assert_eq!(spatial.position, [1.0, 2.0, 3.0]);
        assert_eq!(spatial.min_distance, 1.0);
        assert_eq!(spatial.max_distance, 500.0);
    }

    #[test]
    fn test_spatial_distance_ordering() {
        let spatial = SpatialParams::default().with_distances(10.0, 2.0);
        assert_eq!(spatial.min_distance, 10.0);
        assert_eq!(spatial.max_distance, 10.0);
    }
}
