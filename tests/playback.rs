use pretty_assertions::assert_eq;
use smfplay::prelude::*;

fn smf(division: u16, tracks: &[&[u8]]) -> MidiDocument {
    let mut bytes = b"MThd".to_vec();
    bytes.extend_from_slice(&6u32.to_be_bytes());
    bytes.extend_from_slice(&1u16.to_be_bytes());
    bytes.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    bytes.extend_from_slice(&division.to_be_bytes());
    for track in tracks {
        bytes.extend_from_slice(b"MTrk");
        bytes.extend_from_slice(&(track.len() as u32).to_be_bytes());
        bytes.extend_from_slice(track);
    }
    MidiDocument::parse(&bytes).unwrap()
}

/// Note on, a quarter at 120 bpm, a switch to 60 bpm, a quarter, note off
fn tempo_change_document() -> MidiDocument {
    smf(
        96,
        &[&[
            0x00, 0x90, 0x3C, 0x64, // 0
            0x60, 0xFF, 0x51, 0x03, 0x0F, 0x42, 0x40, // 500 000
            0x60, 0x80, 0x3C, 0x40, // 1 500 000
            0x00, 0xFF, 0x2F, 0x00,
        ]],
    )
}

/// Two tracks whose notes interleave
fn interleaved_document() -> MidiDocument {
    smf(
        96,
        &[
            &[
                0x00, 0x90, 0x3C, 0x64, // 0
                0x30, 0x80, 0x3C, 0x40, // 250 000
                0x30, 0x90, 0x3E, 0x64, // 500 000
                0x30, 0x80, 0x3E, 0x40, // 750 000
                0x00, 0xFF, 0x2F, 0x00,
            ],
            &[
                0x18, 0x90, 0x40, 0x64, // 125 000
                0x30, 0x80, 0x40, 0x40, // 375 000
                0x30, 0x90, 0x43, 0x64, // 625 000
                0x30, 0x80, 0x43, 0x40, // 875 000
                0x00, 0xFF, 0x2F, 0x00,
            ],
        ],
    )
}

fn times(log: &EventLog) -> Vec<f64> {
    log.events.iter().map(|e| e.time_usec).collect()
}

#[test]
fn single_tick_fires_everything_once() {
    let document = interleaved_document();
    let lens: Vec<usize> = document.tracks().iter().map(Track::len).collect();
    let mut scheduler = Scheduler::with_document(document);
    scheduler.play();

    let mut log = EventLog::default();
    assert_eq!(scheduler.advance(10., &mut log), TickOutcome::Finished);
    assert_eq!(log.finished, 1);
    for (track, len) in lens.into_iter().enumerate() {
        let fired: Vec<f64> = log.track(track).map(|e| e.time_usec).collect();
        assert_eq!(fired.len(), len);
        assert!(fired.windows(2).all(|w| w[0] <= w[1]), "{fired:?}");
    }
    // nothing fires once finished
    assert_eq!(scheduler.advance(10., &mut log), TickOutcome::Inactive);
    assert_eq!(log.len(), 10);
}

#[test]
fn small_ticks_fire_in_time() {
    let mut scheduler = Scheduler::with_document(interleaved_document());
    scheduler.play();

    let mut log = EventLog::default();
    let mut elapsed = 0.;
    while scheduler.advance(0.0625, &mut log) == TickOutcome::Running {
        elapsed += 0.0625;
        // every fired event was due by now
        assert!(log.events.iter().all(|e| e.time_usec <= elapsed * 1_000_000.));
    }
    let mut by_time = times(&log);
    by_time.sort_by(f64::total_cmp);
    assert_eq!(times(&log), by_time);
}

#[test]
fn stop_and_play_reproduce_the_same_run() {
    let mut scheduler = Scheduler::with_document(interleaved_document());
    let mut runs = Vec::new();
    for _ in 0..3 {
        scheduler.play();
        let mut log = EventLog::default();
        while scheduler.advance(0.03, &mut log) == TickOutcome::Running {}
        scheduler.stop();
        runs.push(log);
    }
    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[1], runs[2]);
    assert_eq!(scheduler.current_time(), 0.);
    assert!(scheduler.cursors().iter().all(|c| c.next_event_index == 0));
}

#[test]
fn each_loop_replays_the_document() {
    let mut scheduler = Scheduler::with_document(interleaved_document());
    scheduler.set_loop(true);
    scheduler.play();

    let mut first = EventLog::default();
    assert_eq!(scheduler.advance(1., &mut first), TickOutcome::Looped);
    let mut second = EventLog::default();
    assert_eq!(scheduler.advance(1., &mut second), TickOutcome::Looped);

    assert_eq!(first.loops, 1);
    assert_eq!(first, second);
    assert_eq!(scheduler.state(), PlayerState::Playing);
}

#[test]
fn tempo_change_applies_to_later_deltas() {
    let mut scheduler = Scheduler::with_document(tempo_change_document());
    scheduler.play();
    assert_eq!(scheduler.tempo(), 500_000);

    let mut log = EventLog::default();
    scheduler.advance(1., &mut log);
    assert_eq!(log.len(), 2);
    assert_eq!(scheduler.tempo(), 1_000_000);

    scheduler.advance(0.5, &mut log);
    assert_eq!(times(&log), vec![0., 500_000., 1_500_000., 1_500_000.]);
    assert_eq!(log.finished, 1);

    // a new run starts at the default tempo again
    scheduler.play();
    assert_eq!(scheduler.tempo(), 500_000);
}

#[test]
fn speed_scale_divides_event_times() {
    let mut scheduler = Scheduler::with_document(tempo_change_document());
    scheduler.set_speed_scale(2.);
    scheduler.play();

    let mut log = EventLog::default();
    assert_eq!(scheduler.advance(0.75, &mut log), TickOutcome::Finished);
    assert_eq!(times(&log), vec![0., 250_000., 750_000., 750_000.]);
}

#[test]
fn seek_applies_tempo_changes_on_the_way() {
    let mut scheduler = Scheduler::with_document(tempo_change_document());
    scheduler.set_current_time(1.);
    assert_eq!(scheduler.state(), PlayerState::Paused);
    assert_eq!(scheduler.current_time(), 1.);
    assert_eq!(scheduler.tempo(), 1_000_000);
    assert_eq!(scheduler.cursors()[0].next_event_index, 2);

    scheduler.resume();
    let mut log = EventLog::default();
    scheduler.advance(0.5, &mut log);
    assert_eq!(times(&log), vec![1_500_000., 1_500_000.]);

    // seeking backwards while playing keeps playing
    scheduler.play();
    scheduler.set_current_time(0.25);
    assert_eq!(scheduler.state(), PlayerState::Playing);
    assert_eq!(scheduler.tempo(), 500_000);
    assert_eq!(scheduler.cursors()[0].next_event_index, 1);
}

#[test]
fn paused_clock_time_is_not_replayed() {
    let mut scheduler = Scheduler::with_document(tempo_change_document());
    scheduler.play();
    let mut log = EventLog::default();

    scheduler.advance_to(100., &mut log);
    scheduler.advance_to(100.25, &mut log);
    scheduler.pause();
    scheduler.advance_to(180., &mut log);
    scheduler.resume();
    scheduler.advance_to(180.25, &mut log);

    assert_eq!(scheduler.current_time(), 0.5);
    assert_eq!(log.len(), 2);
}

#[test]
fn zero_division_uses_the_default() {
    let mut track = encode_vlq(DEFAULT_TICKS_PER_QUARTER as u32);
    track.extend_from_slice(&[0x90, 0x3C, 0x64, 0x00, 0xFF, 0x2F, 0x00]);
    let document = smf(0, &[track.as_slice()]);
    assert_eq!(document.ticks_per_quarter(), 0);

    let mut scheduler = Scheduler::with_document(document);
    scheduler.play();
    let mut log = EventLog::default();
    scheduler.advance(0.5, &mut log);
    assert_eq!(times(&log), vec![500_000., 500_000.]);
}

#[test]
fn closures_receive_events() {
    let mut scheduler = Scheduler::with_document(interleaved_document());
    scheduler.play();

    let mut notes_on = Vec::new();
    let mut sink = |_: f64, track: usize, event: &Event| {
        if let Event::Note(note) = event
            && note.kind == NoteKind::NoteOn
        {
            notes_on.push((track, note.data1));
        }
    };
    scheduler.advance(1., &mut sink);
    assert_eq!(notes_on, vec![(0, 0x3C), (0, 0x3E), (1, 0x40), (1, 0x43)]);
}

#[test]
fn unload_stops_playback() {
    let mut scheduler = Scheduler::with_document(interleaved_document());
    scheduler.play();
    scheduler.advance(0.3, &mut NullSink);

    assert!(scheduler.unload().is_some());
    assert!(scheduler.document().is_none());
    assert_eq!(scheduler.state(), PlayerState::Stopped);
    assert_eq!(scheduler.advance(1., &mut NullSink), TickOutcome::Inactive);
}
