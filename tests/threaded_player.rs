use std::time::{Duration, Instant};

use smfplay::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn document() -> MidiDocument {
    let mut bytes = vec![0x4D, 0x54, 0x68, 0x64, 0, 0, 0, 6, 0, 1, 0, 2, 0, 96];
    let first: &[u8] = &[
        0x00, 0x90, 0x3C, 0x64, //
        0x60, 0x80, 0x3C, 0x40, // 500 000
        0x00, 0xFF, 0x2F, 0x00,
    ];
    let second: &[u8] = &[
        0x30, 0x90, 0x40, 0x64, // 250 000
        0x60, 0x80, 0x40, 0x40, // 750 000
        0x00, 0xFF, 0x2F, 0x00,
    ];
    for track in [first, second] {
        bytes.extend_from_slice(b"MTrk");
        bytes.extend_from_slice(&(track.len() as u32).to_be_bytes());
        bytes.extend_from_slice(track);
    }
    MidiDocument::parse(&bytes).unwrap()
}

fn config() -> PlayerConfig {
    PlayerConfig::default()
        .with_idle_interval(Duration::from_millis(2))
        .with_thread_name("smfplay-test")
}

/// Poll `condition` until it holds, failing the test after two seconds
fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn plays_against_an_external_clock() {
    init_tracing();
    let clock = ExternalClock::new();
    let position = clock.handle();
    let player = MidiPlayer::with_clock(config(), clock).unwrap();
    assert!(player.is_running());

    player.load(document()).unwrap();
    player.play().unwrap();
    wait_until("play", || player.caught_up());
    assert_eq!(player.state(), PlayerState::Playing);

    position.advance(0.5);
    let mut log = EventLog::default();
    wait_until("first half", || {
        player.dispatch(&mut log);
        log.len() == 4
    });
    assert_eq!(player.state(), PlayerState::Playing);

    position.advance(0.5);
    wait_until("finish", || {
        player.dispatch(&mut log);
        log.finished == 1
    });
    assert_eq!(log.len(), 6);
    let second: Vec<f64> = log.track(1).map(|e| e.time_usec).collect();
    assert_eq!(second, vec![250_000., 750_000., 750_000.]);
    wait_until("stopped", || player.state() == PlayerState::Stopped);
    assert_eq!(player.current_time(), 0.);
}

#[test]
fn looping_keeps_playing() {
    let clock = ExternalClock::new();
    let position = clock.handle();
    let player = MidiPlayer::with_clock(config().with_looping(true), clock).unwrap();
    player.load(document()).unwrap();
    player.play().unwrap();
    wait_until("play", || player.caught_up());
    assert_eq!(player.state(), PlayerState::Playing);

    position.advance(1.);
    let mut log = EventLog::default();
    wait_until("loop", || {
        player.dispatch(&mut log);
        log.loops == 1
    });
    assert_eq!(log.finished, 0);
    assert_eq!(player.state(), PlayerState::Playing);
    assert!(player.looping());
}

#[test]
fn control_calls_are_published() {
    let player = MidiPlayer::with_clock(config(), ExternalClock::new()).unwrap();
    assert_eq!(player.speed_scale(), 1.);
    assert!(!player.looping());

    player.load(document()).unwrap();
    player.set_loop(true).unwrap();
    player.set_speed_scale(2.).unwrap();
    player.set_speed_scale(0.).unwrap();
    player.set_current_time(0.25).unwrap();
    let expected = || {
        player.state() == PlayerState::Paused
            && player.looping()
            && player.speed_scale() == 2.
            && player.current_time() == 0.25
    };
    assert!(expected());
    wait_until("seek", || player.caught_up());
    assert!(expected());

    player.resume().unwrap();
    assert_eq!(player.state(), PlayerState::Playing);
    player.pause().unwrap();
    assert_eq!(player.state(), PlayerState::Paused);
    player.stop().unwrap();
    assert_eq!(player.state(), PlayerState::Stopped);
    assert_eq!(player.current_time(), 0.);
    wait_until("stop", || player.caught_up());
    assert_eq!(player.state(), PlayerState::Stopped);
}

#[test]
fn state_follows_control_calls_at_once() {
    let player = MidiPlayer::spawn(config().with_speed_scale(8.)).unwrap();
    // nothing to play yet
    player.play().unwrap();
    assert_eq!(player.state(), PlayerState::Stopped);
    player.set_current_time(0.5).unwrap();
    assert_eq!(player.state(), PlayerState::Stopped);

    player.load(document()).unwrap();
    player.play().unwrap();
    assert_eq!(player.state(), PlayerState::Playing);

    let mut log = EventLog::default();
    wait_until("stopped", || {
        player.dispatch(&mut log);
        player.state() == PlayerState::Stopped
    });
    player.dispatch(&mut log);
    assert_eq!(log.finished, 1);
    assert_eq!(log.len(), 6);
}

#[test]
fn full_queue_drops_notifications() {
    let clock = ExternalClock::new();
    let position = clock.handle();
    let player = MidiPlayer::with_clock(config().with_event_capacity(2), clock).unwrap();
    player.load(document()).unwrap();
    player.play().unwrap();
    wait_until("play", || player.caught_up());
    assert_eq!(player.state(), PlayerState::Playing);

    position.advance(5.);
    wait_until("stopped", || player.state() == PlayerState::Stopped);

    let mut log = EventLog::default();
    assert_eq!(player.dispatch(&mut log), 2);
    assert_eq!(log.finished, 0);
}

#[test]
fn wall_clock_player_finishes() {
    init_tracing();
    let player = MidiPlayer::spawn(config()).unwrap();
    player.load(document()).unwrap();
    player.set_speed_scale(8.).unwrap();
    player.play().unwrap();

    let mut log = EventLog::default();
    wait_until("finish", || {
        player.dispatch(&mut log);
        log.finished == 1
    });
    assert_eq!(log.len(), 6);
}

#[test]
fn shutdown_disconnects() {
    let player = MidiPlayer::spawn(config()).unwrap();
    assert!(player.is_running());
    player.shutdown();
    assert!(!player.is_running());

    assert!(matches!(player.play(), Err(PlayerError::Disconnected)));
    assert!(matches!(player.load(document()), Err(PlayerError::Disconnected)));
    // a second shutdown is harmless
    player.shutdown();
}

#[test]
fn invalid_config_is_refused() {
    let bad = [
        config().with_event_capacity(0),
        config().with_command_capacity(0),
        config().with_tick_interval(Duration::ZERO),
        config().with_thread_name(""),
        config().with_speed_scale(f64::NAN),
    ];
    for config in bad {
        assert!(matches!(
            MidiPlayer::spawn(config),
            Err(PlayerError::InvalidConfig(_))
        ));
    }
}
