//! Sound scheduler demo
//!
//! Usage: `sound-scheduler-demo <bank.json> [config.json]`
//!
//! Plays every sound in the bank through the default audio output, one
//! second apart, with music fading in. Exits once nothing is left playing.
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;

use sound_scheduler::audio_system::RodioPool;
use sound_scheduler::{
    AppResult, EventBus, PlaybackRequest, SchedulerCommand, SchedulerConfig, SoundBank,
    SoundCategory, SoundScheduler, TickDriver, VolumeFade,
};

const LOG_TARGET_STARTUP: &str = "sound_scheduler::startup";

/// Demo run time ceiling
const MAX_RUN_TIME: Duration = Duration::from_secs(120);

/// Initialize tracing with file rotation
///
/// Logs are written to `<config dir>/SoundScheduler/logs/` with daily
/// rotation. Debug builds also log to the console.
fn initialize_tracing() {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = dirs::config_dir()
        .map(|dir| dir.join("SoundScheduler").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
    }

    let file_appender = rolling::daily(&log_dir, "sound-scheduler.log");

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    #[cfg(debug_assertions)]
    {
        let console_layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(true)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer)
            .init();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();
    }

    tracing::info!(target: LOG_TARGET_STARTUP, "Log directory: {}", log_dir.display());
}

fn load_config(path: Option<&Path>) -> AppResult<SchedulerConfig> {
    let config = match path {
        Some(path) => SchedulerConfig::load(path)?,
        None => SchedulerConfig::load_or_default(&SchedulerConfig::default_path()?)?,
    };
    config.validate().context("Invalid scheduler configuration")?;
    Ok(config)
}

fn run() -> AppResult<()> {
    let mut args = std::env::args().skip(1);
    let bank_path = PathBuf::from(
        args.next()
            .context("Usage: sound-scheduler-demo <bank.json> [config.json]")?,
    );
    let config_path = args.next().map(PathBuf::from);

    let config = load_config(config_path.as_deref())?;
    let bank = SoundBank::load(&bank_path)
        .with_context(|| format!("Failed to load sound bank {}", bank_path.display()))?;
    let clip_root = bank_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    tracing::info!(
        target: LOG_TARGET_STARTUP,
        "Starting demo with {} sounds (music cap {}, sfx cap {})",
        bank.len(),
        config.max_capacity_music,
        config.max_capacity_sfx
    );

    let requests: Vec<PlaybackRequest> = bank
        .iter()
        .enumerate()
        .map(|(index, sound)| {
            let request = PlaybackRequest::id(sound.id.clone())
                .with_delay(Duration::from_secs(index as u64));
            match sound.category {
                SoundCategory::Music => request.with_volume(VolumeFade::fade_in(
                    sound.volume,
                    Duration::from_secs(2),
                )),
                SoundCategory::Sfx => request.with_pitch_variation(0.95..=1.05),
            }
        })
        .collect();
    let delays = requests.len() as u64;

    let bus = EventBus::new();
    let (events, _subscription) = bus.subscribe();
    let catalog = Arc::new(bank);
    let interval = Duration::from_millis(config.tick_interval_ms);

    // Output streams are not Send; open it on the driver thread
    let driver = TickDriver::try_spawn(
        move || {
            RodioPool::new(&clip_root)
                .map(|pool| SoundScheduler::new(config, catalog, pool).with_event_bus(bus))
        },
        interval,
    )
    .context("Failed to open audio output")?;

    for request in requests {
        driver.send(SchedulerCommand::Play(request));
    }

    let started = Instant::now();
    let earliest_exit = Duration::from_secs(delays + 1);
    loop {
        while let Ok(event) = events.try_recv() {
            println!("{}", event.description());
        }

        let elapsed = started.elapsed();
        if elapsed > earliest_exit && driver.snapshot().is_empty() {
            break;
        }
        if elapsed > MAX_RUN_TIME {
            tracing::warn!("Demo time limit reached");
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    driver.send(SchedulerCommand::LogStatus);
    driver.shutdown();
    Ok(())
}

fn main() {
    initialize_tracing();

    if let Err(e) = run() {
        tracing::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
