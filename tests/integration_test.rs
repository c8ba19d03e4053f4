// Integration tests for the sound scheduler
// All scenarios run on the headless backend with a manually advanced clock

use std::sync::Arc;
use std::time::Duration;

use sound_scheduler::audio_system::{HeadlessProbe, SpatialParams};
use sound_scheduler::{
    ClipRef, EventBus, HeadlessPool, PlaybackEvent, PlaybackRequest, SchedulerConfig, SoundBank,
    SoundCategory, SoundDescriptor, SoundScheduler, VolumeFade,
};

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn bank() -> SoundBank {
    SoundBank::from_json(
        r#"{
            "sounds": [
                { "id": "theme", "clip": { "name": "theme_loop" }, "category": "music" },
                { "id": "battle", "clip": { "name": "battle_loop" }, "category": "music" },
                { "id": "a", "clip": { "name": "a_clip" }, "category": "sfx" },
                { "id": "b", "clip": { "name": "b_clip" }, "category": "sfx" },
                { "id": "c", "clip": { "name": "c_clip" }, "category": "sfx" },
                { "id": "x", "clip": { "name": "x_clip" }, "category": "sfx", "volume": 0.7 }
            ]
        }"#,
    )
    .unwrap()
}

fn setup(config: SchedulerConfig) -> (SoundScheduler<HeadlessPool>, HeadlessProbe) {
    let pool = HeadlessPool::new();
    let probe = pool.probe();
    (SoundScheduler::new(config, Arc::new(bank()), pool), probe)
}

#[test]
fn test_sfx_capacity_one_evicts_previous() {
    let config = SchedulerConfig::default().with_capacity(SoundCategory::Sfx, 1);
    let (mut scheduler, probe) = setup(config);

    let a = scheduler.request_play(PlaybackRequest::id("a")).unwrap();
    let b = scheduler.request_play(PlaybackRequest::id("b")).unwrap();

    assert!(!probe.is_live(a));
    assert!(probe.is_live(b));
    assert!(!scheduler.is_playing("a"));
    assert!(scheduler.is_playing("b"));
    assert_eq!(scheduler.active_count(SoundCategory::Sfx), 1);
}

#[test]
fn test_eviction_is_fifo_within_category() {
    let config = SchedulerConfig::default().with_capacity(SoundCategory::Sfx, 2);
    let (mut scheduler, _probe) = setup(config);

    scheduler.request_play(PlaybackRequest::id("theme"));
    scheduler.request_play(PlaybackRequest::id("a"));
    scheduler.request_play(PlaybackRequest::id("b"));
    scheduler.request_play(PlaybackRequest::id("c"));

    let ids: Vec<String> = scheduler.snapshot().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec!["theme", "b", "c"]);

    // Replaying a sound already active still evicts the oldest
    scheduler.request_play(PlaybackRequest::id("b"));
    let ids: Vec<String> = scheduler.snapshot().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec!["theme", "c", "b"]);
}

#[test]
fn test_capacity_never_exceeded() {
    let config = SchedulerConfig::default()
        .with_capacity(SoundCategory::Sfx, 2)
        .with_capacity(SoundCategory::Music, 1);
    let (mut scheduler, probe) = setup(config);

    let sounds = ["a", "theme", "b", "battle", "c", "x"];
    for step in 0..60u64 {
        let id = sounds[(step % sounds.len() as u64) as usize];
        let request = PlaybackRequest::id(id).with_delay(ms((step % 3) * 10));
        scheduler.request_play(request);

        if step % 7 == 0 {
            if let Some(first) = scheduler.snapshot().first() {
                probe.finish(first.channel);
            }
        }

        scheduler.tick(ms(10));
        assert!(scheduler.active_count(SoundCategory::Sfx) <= 2);
        assert!(scheduler.active_count(SoundCategory::Music) <= 1);
        assert_eq!(probe.live_count(), scheduler.snapshot().len());
    }
}

#[test]
fn test_disabling_music_pauses_without_removing() {
    let (mut scheduler, probe) = setup(SchedulerConfig::default());
    let theme = scheduler.request_play(PlaybackRequest::id("theme")).unwrap();
    let battle = scheduler.request_play(PlaybackRequest::id("battle")).unwrap();

    scheduler.set_enabled(SoundCategory::Music, false);
    for _ in 0..5 {
        scheduler.tick(ms(16));
    }

    assert_eq!(scheduler.active_count(SoundCategory::Music), 2);
    assert!(probe.state(theme).unwrap().paused);
    assert!(probe.state(battle).unwrap().paused);
    assert!(scheduler.snapshot().iter().all(|s| s.paused));

    scheduler.set_enabled(SoundCategory::Music, true);
    assert!(!probe.state(theme).unwrap().paused);
    assert!(!probe.state(battle).unwrap().paused);
    assert!(scheduler.is_playing("theme"));
    assert!(scheduler.is_playing("battle"));
}

#[test]
fn test_delayed_start_admits_once_after_delay() {
    let (mut scheduler, probe) = setup(SchedulerConfig::default());

    let request = PlaybackRequest::id("a")
        .with_delay(Duration::from_secs(2))
        .with_volume(VolumeFade::constant(1.0));
    assert!(scheduler.request_play(request).is_none());
    assert_eq!(scheduler.pending_ids(), vec!["a".to_string()]);

    for _ in 0..19 {
        scheduler.tick(ms(100));
    }
    assert_eq!(probe.acquired(), 0);

    scheduler.tick(ms(100));
    assert_eq!(probe.acquired(), 1);
    assert!(scheduler.is_playing("a"));
    assert!(scheduler.pending_ids().is_empty());

    for _ in 0..10 {
        scheduler.tick(ms(100));
    }
    assert_eq!(probe.acquired(), 1);
}

#[test]
fn test_second_delayed_request_supersedes_first() {
    let bus = EventBus::new();
    let (rx, _id) = bus.subscribe();
    let (scheduler, probe) = setup(SchedulerConfig::default());
    let mut scheduler = scheduler.with_event_bus(bus);

    scheduler.request_play(PlaybackRequest::id("x").with_delay(ms(500)));
    scheduler.tick(ms(300));
    scheduler.request_play(
        PlaybackRequest::id("x")
            .with_delay(ms(500))
            .with_volume(VolumeFade::constant(0.2)),
    );

    // The first entry would have elapsed here
    scheduler.tick(ms(300));
    assert_eq!(probe.acquired(), 0);

    scheduler.tick(ms(200));
    assert_eq!(probe.acquired(), 1);
    let started = scheduler.snapshot();
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].raw_volume, 0.2);

    let events: Vec<PlaybackEvent> = rx.try_iter().collect();
    let started_count = events
        .iter()
        .filter(|e| matches!(e, PlaybackEvent::Started { .. }))
        .count();
    let cancelled = events
        .iter()
        .filter(|e| matches!(e, PlaybackEvent::PendingCancelled { .. }))
        .count();
    assert_eq!(started_count, 1);
    assert_eq!(cancelled, 1);
}

#[test]
fn test_stop_by_id_clears_active_and_pending() {
    let (mut scheduler, probe) = setup(SchedulerConfig::default());
    let channel = scheduler.request_play(PlaybackRequest::id("x")).unwrap();
    scheduler.request_play(PlaybackRequest::id("x").with_delay(ms(400)));
    scheduler.request_play(PlaybackRequest::id("a").with_delay(ms(400)));

    scheduler.stop("x");

    assert!(!probe.is_live(channel));
    assert!(!scheduler.is_playing("x"));
    assert_eq!(scheduler.pending_ids(), vec!["a".to_string()]);

    scheduler.tick(ms(500));
    assert!(!scheduler.is_playing("x"));
    assert!(scheduler.is_playing("a"));
}

#[test]
fn test_stop_by_clip_and_category() {
    let (mut scheduler, _probe) = setup(SchedulerConfig::default());
    scheduler.request_play(PlaybackRequest::id("theme"));
    scheduler.request_play(PlaybackRequest::id("a"));
    scheduler.request_play(PlaybackRequest::id("b"));
    scheduler.request_play(PlaybackRequest::id("c").with_delay(ms(100)));

    scheduler.stop(ClipRef::new("a_clip"));
    assert_eq!(scheduler.active_count(SoundCategory::Sfx), 1);

    scheduler.stop(SoundCategory::Sfx);
    assert_eq!(scheduler.active_count(SoundCategory::Sfx), 0);
    assert!(scheduler.pending_ids().is_empty());
    assert!(scheduler.is_playing("theme"));
}

#[test]
fn test_fade_is_monotonic_and_exact() {
    let (mut scheduler, probe) = setup(SchedulerConfig::default());
    let channel = scheduler
        .request_play(PlaybackRequest::id("theme").with_volume(VolumeFade::new(
            0.1,
            0.9,
            ms(1000),
        )))
        .unwrap();

    let mut last = scheduler.snapshot()[0].raw_volume;
    assert!((last - 0.1).abs() < 1e-6);

    for step in 0..15 {
        if step == 5 {
            scheduler.set_volume(SoundCategory::Music, 0.5);
        }
        scheduler.tick(ms(90));
        let raw = scheduler.snapshot()[0].raw_volume;
        assert!(raw >= last);
        last = raw;

        let expected = raw * scheduler.volume(SoundCategory::Music);
        assert!((probe.volume(channel).unwrap() - expected).abs() < 1e-6);
    }

    assert_eq!(last, 0.9);
    assert!(!scheduler.snapshot()[0].fading);
}

#[test]
fn test_set_volume_mid_fade_keeps_raw_trajectory() {
    let fade = VolumeFade::fade_in(1.0, ms(1000));

    let (mut reference, _) = setup(SchedulerConfig::default());
    let (mut adjusted, _) = setup(SchedulerConfig::default());
    reference.request_play(PlaybackRequest::id("theme").with_volume(fade));
    adjusted.request_play(PlaybackRequest::id("theme").with_volume(fade));

    for step in 0..12 {
        if step == 3 {
            adjusted.set_volume(SoundCategory::Music, 0.25);
        }
        reference.tick(ms(100));
        adjusted.tick(ms(100));
        assert_eq!(
            reference.snapshot()[0].raw_volume,
            adjusted.snapshot()[0].raw_volume
        );
    }
}

#[test]
fn test_destroy_all_releases_everything() {
    let (mut scheduler, probe) = setup(SchedulerConfig::default());
    scheduler.request_play(PlaybackRequest::id("theme"));
    scheduler.request_play(PlaybackRequest::id("a"));
    scheduler.request_play(PlaybackRequest::id("b").with_spatial(SpatialParams::at([4.0, 0.0, 1.0])));
    scheduler.request_play(PlaybackRequest::id("c").with_delay(ms(250)));
    scheduler.pause(SoundCategory::Music);

    scheduler.destroy_all();

    assert!(scheduler.snapshot().is_empty());
    assert!(scheduler.pending_ids().is_empty());
    assert_eq!(probe.live_count(), 0);
    assert_eq!(probe.acquired(), probe.released());
    assert_eq!(probe.destroyed(), 3);

    scheduler.tick(ms(500));
    assert_eq!(probe.acquired(), 3);
}

#[test]
fn test_natural_end_is_swept() {
    let bus = EventBus::new();
    let (rx, _id) = bus.subscribe();
    let (scheduler, probe) = setup(SchedulerConfig::default());
    let mut scheduler = scheduler.with_event_bus(bus);

    let a = scheduler.request_play(PlaybackRequest::id("a")).unwrap();
    let b = scheduler.request_play(PlaybackRequest::id("b")).unwrap();

    probe.finish(a);
    scheduler.tick(ms(16));

    assert!(!probe.is_live(a));
    assert!(probe.is_live(b));
    assert_eq!(scheduler.active_count(SoundCategory::Sfx), 1);
    assert!(rx
        .try_iter()
        .any(|e| matches!(e, PlaybackEvent::Finished { ref id, .. } if id == "a")));
}

#[test]
fn test_pending_start_for_disabled_category_never_plays() {
    let (mut scheduler, probe) = setup(SchedulerConfig::default());
    scheduler.request_play(PlaybackRequest::id("theme").with_delay(ms(200)));
    scheduler.set_enabled(SoundCategory::Music, false);

    scheduler.tick(ms(250));
    assert_eq!(probe.acquired(), 0);
    assert!(scheduler.pending_ids().is_empty());

    scheduler.set_enabled(SoundCategory::Music, true);
    scheduler.tick(ms(250));
    assert_eq!(probe.acquired(), 0);
}

#[test]
fn test_pending_start_for_paused_category_plays() {
    let (mut scheduler, _probe) = setup(SchedulerConfig::default());
    scheduler.request_play(PlaybackRequest::id("theme").with_delay(ms(200)));
    scheduler.pause(SoundCategory::Music);

    scheduler.tick(ms(250));
    assert!(scheduler.is_playing("theme"));
}

#[test]
fn test_config_round_trip_drives_scheduler() {
    let dir = std::env::temp_dir().join(format!("sound-scheduler-it-{}", std::process::id()));
    let path = dir.join("config.json");

    let config = SchedulerConfig {
        music_volume: 0.5,
        ..SchedulerConfig::default().with_capacity(SoundCategory::Music, 1)
    };
    config.save(&path).unwrap();
    let loaded = SchedulerConfig::load(&path).unwrap();
    assert_eq!(loaded, config);

    let (mut scheduler, probe) = setup(loaded);
    scheduler.request_play(PlaybackRequest::id("theme"));
    let battle = scheduler.request_play(PlaybackRequest::id("battle")).unwrap();
    assert_eq!(scheduler.active_count(SoundCategory::Music), 1);
    assert_eq!(probe.volume(battle), Some(0.5));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_delayed_stop_keeps_volume_then_releases() {
    let bus = EventBus::new();
    let (rx, _id) = bus.subscribe();
    let (scheduler, probe) = setup(SchedulerConfig::default());
    let mut scheduler = scheduler.with_event_bus(bus);

    let theme = scheduler
        .request_play(PlaybackRequest::id("theme").looping(true))
        .unwrap();
    let x = scheduler.request_play(PlaybackRequest::id("x")).unwrap();
    scheduler.stop_after("theme", ms(500));

    for _ in 0..4 {
        scheduler.tick(ms(100));
        assert_eq!(probe.volume(theme), Some(1.0));
        assert!(probe.is_live(theme));
    }

    scheduler.tick(ms(100));
    assert!(!probe.is_live(theme));
    assert!(probe.is_live(x));
    assert!(!scheduler.is_playing("theme"));

    let stopped: Vec<PlaybackEvent> = rx
        .try_iter()
        .filter(|e| matches!(e, PlaybackEvent::Stopped { .. }))
        .collect();
    assert_eq!(stopped.len(), 1);
    assert_eq!(stopped[0].id(), "theme");
}

#[test]
fn test_fade_out_completes_while_category_disabled() {
    let (mut scheduler, probe) = setup(SchedulerConfig::default());
    let theme = scheduler.request_play(PlaybackRequest::id("theme")).unwrap();

    scheduler.fade_out("theme", ms(400));
    scheduler.set_enabled(SoundCategory::Music, false);
    for _ in 0..4 {
        scheduler.tick(ms(100));
    }

    assert!(!probe.is_live(theme));
    assert_eq!(scheduler.active_count(SoundCategory::Music), 0);
    assert_eq!(probe.live_count(), 0);
}
