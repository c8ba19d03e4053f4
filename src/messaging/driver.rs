//! Tick driver
//!
//! Runs a scheduler on its own thread, applying queued commands between
//! ticks and publishing a snapshot of active playback after each step.
use std::convert::Infallible;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded, RecvTimeoutError, Sender};
use parking_lot::RwLock;

use super::commands::{CommandResult, SchedulerCommand};
use crate::audio_system::{ChannelPool, PlaybackSnapshot, SoundScheduler};

/// Background thread owning a scheduler
pub struct TickDriver {
    command_tx: Sender<SchedulerCommand>,
    snapshot: Arc<RwLock<Vec<PlaybackSnapshot>>>,
    handle: Option<JoinHandle<()>>,
}

impl TickDriver {
    /// Spawn the driver thread with a scheduler that cannot fail to build
    pub fn spawn<P, F>(factory: F, interval: Duration) -> Self
    where
        P: ChannelPool + 'static,
        F: FnOnce() -> SoundScheduler<P> + Send + 'static,
    {
        match Self::try_spawn(move || Ok::<_, Infallible>(factory()), interval) {
            Ok(driver) => driver,
            Err(never) => match never {},
        }
    }

    /// Spawn the driver thread
    ///
    /// The scheduler is built on the driver thread by `factory`, so pools
    /// that cannot cross threads (audio output streams) work here. Blocks
    /// until the factory has run; its error is returned and the thread ends.
    pub fn try_spawn<P, E, F>(factory: F, interval: Duration) -> Result<Self, E>
    where
        P: ChannelPool + 'static,
        E: Send + 'static,
        F: FnOnce() -> Result<SoundScheduler<P>, E> + Send + 'static,
    {
        let (command_tx, command_rx) = unbounded::<SchedulerCommand>();
        let (ready_tx, ready_rx) = bounded::<Result<(), E>>(1);
        let snapshot = Arc::new(RwLock::new(Vec::new()));
        let shared = Arc::clone(&snapshot);
        let interval = interval.max(Duration::from_millis(1));

        let handle = thread::spawn(move || {
            let mut scheduler = match factory() {
                Ok(scheduler) => {
                    let _ = ready_tx.send(Ok(()));
                    scheduler
                }
                Err(e) => {
                    tracing::debug!("Scheduler factory failed, driver not started");
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            tracing::info!("Tick driver thread started ({}ms)", interval.as_millis());
            let mut last_tick = Instant::now();

            loop {
                let command = match command_rx.recv_deadline(last_tick + interval) {
                    Ok(command) => Some(command),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => {
                        tracing::debug!("Command channel closed, stopping driver");
                        break;
                    }
                };

                // Catch up before applying, so anything the command admits
                // only sees time from here on
                let now = Instant::now();
                scheduler.tick(now.duration_since(last_tick));
                last_tick = now;

                if let Some(command) = command {
                    if command.apply(&mut scheduler) == CommandResult::Shutdown {
                        tracing::info!("Shutdown command received, stopping driver");
                        break;
                    }
                }
                *shared.write() = scheduler.snapshot();
            }

            scheduler.stop_all();
            shared.write().clear();
            tracing::info!("Tick driver thread stopped");
        });

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => match handle.join() {
                Err(panic) => std::panic::resume_unwind(panic),
                Ok(()) => unreachable!("driver thread exited without reporting"),
            },
        }

        Ok(Self {
            command_tx,
            snapshot,
            handle: Some(handle),
        })
    }

    /// Get a sender for submitting commands
    pub fn sender(&self) -> Sender<SchedulerCommand> {
        self.command_tx.clone()
    }

    /// Queue a command; false once the driver has stopped
    pub fn send(&self, command: SchedulerCommand) -> bool {
        self.command_tx.send(command).is_ok()
    }

    /// Active playback as of the last step
    pub fn snapshot(&self) -> Vec<PlaybackSnapshot> {
        self.snapshot.read().clone()
    }

    /// Stop the driver and wait for its thread
    pub fn shutdown(mut self) {
        self.stop_thread();
    }

    fn stop_thread(&mut self) {
        let _ = self.command_tx.send(SchedulerCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Tick driver thread panicked");
            }
        }
    }
}

impl Drop for TickDriver {
    fn drop(&mut self) {
        self.stop_thread();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_system::{
        HeadlessPool, PlaybackRequest, SoundBank, SoundCategory, SoundDescriptor, VolumeFade,
    };
    use crate::config::SchedulerConfig;
    use crate::error::PoolError;
    use crate::messaging::{EventBus, PlaybackEvent};

    fn bank() -> SoundBank {
        SoundBank::from_descriptors(vec![SoundDescriptor::new(
            "theme",
            crate::audio_system::ClipRef::new("theme.ogg"),
            SoundCategory::Music,
        )])
        .unwrap()
    }

    #[test]
    fn test_driver_applies_commands_and_publishes() {
        let bus = EventBus::new();
        let (rx, _id) = bus.subscribe();
        let pool = HeadlessPool::new();
        let probe = pool.probe();
        let catalog = Arc::new(bank());

        let driver = TickDriver::spawn(
            move || {
                SoundScheduler::new(SchedulerConfig::default(), catalog, pool).with_event_bus(bus)
            },
            Duration::from_millis(5),
        );

        assert!(driver.send(SchedulerCommand::Play(PlaybackRequest::id("theme"))));

        let event = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(matches!(event, PlaybackEvent::Started { .. }));
        assert_eq!(probe.live_count(), 1);

        driver.shutdown();
        assert_eq!(probe.live_count(), 0);
    }

    #[test]
    fn test_driver_ticks_delayed_start() {
        let bus = EventBus::new();
        let (rx, _id) = bus.subscribe();
        let catalog = Arc::new(bank());

        let driver = TickDriver::spawn(
            move || {
                SoundScheduler::new(SchedulerConfig::default(), catalog, HeadlessPool::new())
                    .with_event_bus(bus)
            },
            Duration::from_millis(2),
        );

        driver.send(SchedulerCommand::Play(
            PlaybackRequest::id("theme").with_delay(Duration::from_millis(20)),
        ));

        let mut started = false;
        while let Ok(event) = rx.recv_timeout(Duration::from_secs(2)) {
            if let PlaybackEvent::Started { id, .. } = event {
                assert_eq!(id, "theme");
                started = true;
                break;
            }
        }
        assert!(started);
    }

    #[test]
    fn test_failing_factory_is_reported() {
        let result = TickDriver::try_spawn(
            || -> Result<SoundScheduler<HeadlessPool>, PoolError> {
                Err(PoolError::Exhausted {
                    group: "AudioSound".to_string(),
                })
            },
            Duration::from_millis(5),
        );

        match result {
            Err(PoolError::Exhausted { group }) => assert_eq!(group, "AudioSound"),
            Err(other) => panic!("Wrong error: {}", other),
            Ok(_) => panic!("Driver started without a scheduler"),
        }
    }

    #[test]
    fn test_command_admission_sees_only_later_time() {
        let catalog = Arc::new(bank());
        let driver = TickDriver::spawn(
            move || SoundScheduler::new(SchedulerConfig::default(), catalog, HeadlessPool::new()),
            Duration::from_millis(100),
        );

        // Land the request in the middle of an interval
        thread::sleep(Duration::from_millis(60));
        let sent = Instant::now();
        driver.send(SchedulerCommand::Play(
            PlaybackRequest::id("theme")
                .with_volume(VolumeFade::fade_in(1.0, Duration::from_secs(1))),
        ));

        let deadline = sent + Duration::from_secs(2);
        loop {
            let raw = driver.snapshot().first().map(|s| s.raw_volume);
            let elapsed = sent.elapsed().as_secs_f32();
            if let Some(raw) = raw.filter(|raw| *raw > 0.0) {
                assert!(raw <= elapsed + 1e-3, "raw {} after {}s", raw, elapsed);
                break;
            }
            assert!(Instant::now() < deadline, "fade never advanced");
            thread::sleep(Duration::from_millis(1));
        }

        driver.shutdown();
    }
}
