//! Bounded-concurrency sound playback scheduler
//!
//! Plays catalog sounds on pooled channels with per-category capacity,
//! delayed starts, volume fades and category mixing. Time advances only
//! through [`SoundScheduler::tick`].

pub mod audio_system;
pub mod config;
pub mod error;
pub mod messaging;

pub use audio_system::{
    Channel, ChannelId, ChannelPool, ClipRef, HeadlessPool, PlaybackRequest, SoundBank,
    SoundCatalog, SoundCategory, SoundDescriptor, SoundScheduler, SoundSelector, VolumeFade,
};
pub use config::SchedulerConfig;
pub use error::{AppResult, CatalogError, ConfigError, PoolError, SchedulerError};
pub use messaging::{EventBus, PlaybackEvent, SchedulerCommand, TickDriver};
