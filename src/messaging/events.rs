//! Playback events
//!
//! Events represent things that have happened (past tense).
//! They are broadcast to all subscribers.
use std::time::Duration;

use crate::audio_system::{ChannelId, SoundCategory};

/// Scheduler events
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// A sound was admitted and is playing
    Started {
        id: String,
        category: SoundCategory,
        channel: ChannelId,
    },

    /// A delayed start was registered
    Scheduled { id: String, delay: Duration },

    /// The oldest playback of a full category was stopped to make room
    Evicted { id: String, channel: ChannelId },

    /// A playback reached its natural end and was reclaimed
    Finished { id: String, channel: ChannelId },

    /// A playback was stopped explicitly or by a completed fade-out
    Stopped { id: String, channel: ChannelId },

    /// A pending start was cancelled or superseded
    PendingCancelled { id: String },

    /// A request was discarded without playing
    Dropped { id: String, reason: DropReason },
}

/// Why a request never played
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Not found in the catalog
    Unresolved,

    /// Target category disabled at admission
    CategoryDisabled,

    /// Channel pool refused an acquisition
    PoolUnavailable,
}

impl PlaybackEvent {
    /// Sound identifier the event refers to
    pub fn id(&self) -> &str {
        match self {
            PlaybackEvent::Started { id, .. }
            | PlaybackEvent::Scheduled { id, .. }
            | PlaybackEvent::Evicted { id, .. }
            | PlaybackEvent::Finished { id, .. }
            | PlaybackEvent::Stopped { id, .. }
            | PlaybackEvent::PendingCancelled { id }
            | PlaybackEvent::Dropped { id, .. } => id,
        }
    }

    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            PlaybackEvent::Started {
                id,
                category,
                channel,
            } => format!("Started {} ({}) on {}", id, category, channel),
            PlaybackEvent::Scheduled { id, delay } => {
                format!("Scheduled {} in {}ms", id, delay.as_millis())
            }
            PlaybackEvent::Evicted { id, channel } => format!("Evicted {} from {}", id, channel),
            PlaybackEvent::Finished { id, .. } => format!("Finished {}", id),
            PlaybackEvent::Stopped { id, .. } => format!("Stopped {}", id),
            PlaybackEvent::PendingCancelled { id } => format!("Cancelled pending {}", id),
            PlaybackEvent::Dropped { id, reason } => format!("Dropped {}: {:?}", id, reason),
        }
    }
}
