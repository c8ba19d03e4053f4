//! Messaging module for Event/Command architecture
//!
//! - **Events**: Notifications of playback activity (past tense, broadcast)
//! - **Commands**: Requests applied to the scheduler (imperative, queued)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────┐     Command      ┌────────────┐     Event      ┌─────────────┐
//! │  Host   │ ───────────────> │ TickDriver │ ─────────────> │  Event Bus  │
//! │         │                  │ (scheduler)│                │             │
//! └─────────┘                  └────────────┘                └─────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! let bus = EventBus::new();
//! let (rx, _id) = bus.subscribe();
//!
//! let driver = TickDriver::spawn(
//!     move || SoundScheduler::new(config, catalog, pool).with_event_bus(bus),
//!     Duration::from_millis(16),
//! );
//!
//! driver.send(SchedulerCommand::Play(PlaybackRequest::id("theme")));
//!
//! while let Ok(event) = rx.recv() {
//!     println!("{}", event.description());
//! }
//! ```

pub mod bus;
pub mod commands;
pub mod driver;
pub mod events;

pub use bus::{EventBus, SubscriberId};
pub use commands::{CommandResult, SchedulerCommand};
pub use driver::TickDriver;
pub use events::{DropReason, PlaybackEvent};
