//! Audio system module
//!
//! Schedules playback of catalog sounds onto a bounded set of channels:
//! - Per-category capacity with FIFO eviction
//! - Delayed starts with supersede semantics
//! - Linear fades advanced by a periodic tick
//! - Category enable flags and volume multipliers
//!
//! ## Architecture
//!
//! ```text
//! SoundScheduler
//!   ├── SoundCatalog      (id / clip -> descriptor)
//!   ├── ChannelPool       (acquire / release channels)
//!   ├── ActiveRegistry    (admission-ordered active records)
//!   ├── PendingRegistry   (delayed starts)
//!   ├── StopTimers        (delayed stops)
//!   └── CategoryStates    (Music, SFX)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use audio_system::{HeadlessPool, PlaybackRequest, SoundScheduler, VolumeFade};
//!
//! let mut scheduler = SoundScheduler::new(config, Arc::new(bank), HeadlessPool::new());
//!
//! scheduler.request_play(
//!     PlaybackRequest::id("theme")
//!         .looping(true)
//!         .with_volume(VolumeFade::fade_in(0.8, Duration::from_secs(2))),
//! );
//!
//! // Once per frame
//! scheduler.tick(Duration::from_millis(16));
//! ```

pub mod catalog;
pub mod category;
pub mod channel;
mod control;
pub mod fade;
pub mod headless;
pub mod pending;
pub mod registry;
pub mod request;
#[cfg(feature = "rodio-backend")]
pub mod rodio_backend;
pub mod scheduler;
pub mod stop_timer;

pub use catalog::{ClipRef, SoundBank, SoundCatalog, SoundDescriptor};
pub use category::{CategoryState, CategoryStates, SoundCategory};
pub use channel::{Channel, ChannelId, ChannelPool, SpatialParams};
pub use fade::{unit_volume, FadeEnd, FadeTask, VolumeFade};
pub use headless::{ChannelState, HeadlessChannel, HeadlessPool, HeadlessProbe};
pub use pending::{PendingRegistry, PendingStart};
pub use registry::{ActivePlayback, ActiveRegistry, PlaybackSnapshot};
pub use request::{PlaybackRequest, SoundSelector, SoundTarget, DEFAULT_PRIORITY, MAX_PRIORITY};
#[cfg(feature = "rodio-backend")]
pub use rodio_backend::{RodioChannel, RodioPool};
pub use scheduler::{SharedCatalog, SoundScheduler};
pub use stop_timer::{StopTimer, StopTimers};
