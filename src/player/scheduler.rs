use std::sync::Arc;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{
    file::{DEFAULT_TEMPO, DEFAULT_TICKS_PER_QUARTER, MidiDocument, ticks_to_micros},
    player::{EventSink, NullSink},
};

/// Where playback is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum PlayerState {
    /// At the start, not moving
    #[default]
    Stopped = 0,
    /// Moving
    Playing = 1,
    /// Holding its position
    Paused = 2,
}

/// What a call to [`Scheduler::advance`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not playing, nothing happened
    Inactive,
    /// Playing, with events still pending
    Running,
    /// Every track finished and playback restarted
    Looped,
    /// Every track finished and playback stopped
    Finished,
}

/// How far one track has played
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackCursor {
    /// Index of the next event to fire
    pub next_event_index: usize,
    /// When the last fired event was due, in microseconds
    pub track_time_usec: f64,
}

#[doc = r#"
Plays a [`MidiDocument`] against time handed to it.

The scheduler owns no thread and reads no clock. Call [`advance`](Self::advance)
with elapsed seconds, or [`advance_to`](Self::advance_to) with a clock
position, and every event that came due fires to the sink.

Each track keeps a [`PlaybackCursor`]. An event is due once the playback
time reaches the previous event's due time plus its own delta at the
current tempo. A tempo change takes effect as soon as it fires, for every
track scanned after it.

# Example
```rust
# use smfplay::prelude::*;
let bytes: &[u8] = &[
    0x4D, 0x54, 0x68, 0x64, 0, 0, 0, 6, 0, 0, 0, 1, 0, 96,
    0x4D, 0x54, 0x72, 0x6B, 0, 0, 0, 8,
    0x60, 0x90, 0x3C, 0x64, // one quarter in
    0x00, 0xFF, 0x2F, 0x00,
];
let mut scheduler = Scheduler::with_document(MidiDocument::parse(bytes).unwrap());
scheduler.set_speed_scale(2.);
scheduler.play();

let mut log = EventLog::default();
assert_eq!(scheduler.advance(0.25, &mut log), TickOutcome::Finished);
assert_eq!(log.events[0].time_usec, 250_000.);
assert_eq!(scheduler.state(), PlayerState::Stopped);
```
"#]
#[derive(Debug, Clone)]
pub struct Scheduler {
    document: Option<Arc<MidiDocument>>,
    cursors: Vec<PlaybackCursor>,
    state: PlayerState,
    current_usec: f64,
    tempo: u32,
    // last (tempo, division) that converted without a zero
    fallback: (u32, u16),
    looping: bool,
    speed_scale: f64,
    last_position: Option<f64>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// A stopped scheduler with nothing loaded
    pub const fn new() -> Self {
        Self {
            document: None,
            cursors: Vec::new(),
            state: PlayerState::Stopped,
            current_usec: 0.,
            tempo: DEFAULT_TEMPO,
            fallback: (DEFAULT_TEMPO, DEFAULT_TICKS_PER_QUARTER),
            looping: false,
            speed_scale: 1.,
            last_position: None,
        }
    }

    /// A stopped scheduler holding `document`
    pub fn with_document(document: impl Into<Arc<MidiDocument>>) -> Self {
        let mut scheduler = Self::new();
        scheduler.load(document);
        scheduler
    }

    /// Replace the document. Playback stops.
    pub fn load(&mut self, document: impl Into<Arc<MidiDocument>>) {
        let document = document.into();
        let division = document.ticks_per_quarter();
        if division == 0 {
            tracing::warn!("Document has zero ticks per quarter note, using {DEFAULT_TICKS_PER_QUARTER}");
        } else {
            self.fallback.1 = division;
        }
        self.document = Some(document);
        self.stop();
    }

    /// Drop the document. Playback stops.
    pub fn unload(&mut self) -> Option<Arc<MidiDocument>> {
        self.stop();
        self.cursors.clear();
        self.document.take()
    }

    /// The loaded document
    pub fn document(&self) -> Option<&Arc<MidiDocument>> {
        self.document.as_ref()
    }

    /// Start from the beginning. Does nothing without a document.
    pub fn play(&mut self) {
        if self.document.is_none() {
            tracing::warn!("play() called with no document loaded");
            return;
        }
        self.rewind();
        self.state = PlayerState::Playing;
        tracing::info!("Playback started");
    }

    /// Return to the beginning and stop
    pub fn stop(&mut self) {
        self.rewind();
        if self.state != PlayerState::Stopped {
            tracing::info!("Playback stopped");
        }
        self.state = PlayerState::Stopped;
    }

    /// Hold the current position
    pub fn pause(&mut self) {
        match self.state {
            PlayerState::Playing => self.state = PlayerState::Paused,
            state => tracing::debug!("pause() ignored while {state:?}"),
        }
    }

    /// Continue from the held position
    pub fn resume(&mut self) {
        match self.state {
            PlayerState::Paused => self.state = PlayerState::Playing,
            state => tracing::debug!("resume() ignored while {state:?}"),
        }
    }

    /// Restart instead of stopping once every track has finished
    pub fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// True if playback restarts at the end
    pub const fn looping(&self) -> bool {
        self.looping
    }

    /// Play faster (above 1) or slower (below 1).
    ///
    /// Anything but a finite positive value is ignored with a warning.
    pub fn set_speed_scale(&mut self, speed_scale: f64) {
        if !(speed_scale.is_finite() && speed_scale > 0.) {
            tracing::warn!("Ignoring speed scale {speed_scale}");
            return;
        }
        self.speed_scale = speed_scale;
    }

    /// The playback rate
    pub const fn speed_scale(&self) -> f64 {
        self.speed_scale
    }

    /// Where playback is
    pub const fn state(&self) -> PlayerState {
        self.state
    }

    /// Tempo in effect, microseconds per quarter note
    pub const fn tempo(&self) -> u32 {
        self.tempo
    }

    /// One cursor per track
    pub fn cursors(&self) -> &[PlaybackCursor] {
        &self.cursors
    }

    /// Playback time in seconds
    pub fn current_time(&self) -> f64 {
        self.current_usec / 1_000_000.
    }

    /// Move playback to `seconds` without firing anything.
    ///
    /// Every track is scanned again from the start so that tempo changes
    /// before the target are honoured. A stopped scheduler becomes paused
    /// at the target.
    pub fn set_current_time(&mut self, seconds: f64) {
        let Some(document) = self.document.clone() else {
            tracing::warn!("set_current_time() called with no document loaded");
            return;
        };
        let target = if seconds.is_finite() { seconds.max(0.) } else { 0. };

        self.rewind();
        self.current_usec = target * 1_000_000.;
        self.scan(&document, &mut NullSink);
        if self.state == PlayerState::Stopped {
            self.state = PlayerState::Paused;
        }
        tracing::debug!("Moved to {target}s");
    }

    /// Move forward `delta_secs` of playback time and fire what came due.
    ///
    /// Negative or non finite deltas count as zero.
    pub fn advance(&mut self, delta_secs: f64, sink: &mut impl EventSink) -> TickOutcome {
        if self.state != PlayerState::Playing {
            return TickOutcome::Inactive;
        }
        let Some(document) = self.document.clone() else {
            return TickOutcome::Inactive;
        };
        let delta = if delta_secs.is_finite() { delta_secs.max(0.) } else { 0. };
        self.current_usec += delta * 1_000_000.;

        if !self.scan(&document, sink) {
            return TickOutcome::Running;
        }
        if self.looping && spans_time(&document) {
            self.rewind();
            sink.on_loop();
            tracing::info!("Playback looped");
            TickOutcome::Looped
        } else {
            self.stop();
            sink.on_finished();
            tracing::info!("Playback finished");
            TickOutcome::Finished
        }
    }

    /// Advance to a clock position in seconds.
    ///
    /// Only the distance moved since the previous call counts, so a clock
    /// that jumps backwards contributes nothing. The position is remembered
    /// in every state, so time spent paused is never played back later.
    pub fn advance_to(&mut self, position_secs: f64, sink: &mut impl EventSink) -> TickOutcome {
        if !position_secs.is_finite() {
            return self.advance(0., sink);
        }
        let delta = self
            .last_position
            .map_or(0., |last| (position_secs - last).max(0.));
        self.last_position = Some(position_secs);
        self.advance(delta, sink)
    }

    /// Forget the last clock position, so the next one counts from itself
    pub fn reset_clock(&mut self) {
        self.last_position = None;
    }

    fn rewind(&mut self) {
        self.current_usec = 0.;
        self.tempo = DEFAULT_TEMPO;
        self.fallback.0 = DEFAULT_TEMPO;
        let tracks = self.document.as_ref().map_or(0, |d| d.tracks().len());
        self.cursors.clear();
        self.cursors.resize(tracks, PlaybackCursor::default());
    }

    /// Fire every due event. True once every track has run out.
    fn scan(&mut self, document: &MidiDocument, sink: &mut dyn EventSink) -> bool {
        let division = document.ticks_per_quarter();
        let mut finished = 0;

        for (index, track) in document.tracks().iter().enumerate() {
            let events = track.events();
            loop {
                let cursor = self.cursors[index];
                let Some(next) = events.get(cursor.next_event_index) else {
                    finished += 1;
                    break;
                };
                let due = cursor.track_time_usec + self.event_micros(next.event.delta_ticks(), division);
                if self.current_usec < due {
                    break;
                }
                self.cursors[index] = PlaybackCursor {
                    next_event_index: cursor.next_event_index + 1,
                    track_time_usec: due,
                };
                if let Some(tempo) = next.event.tempo() {
                    self.set_tempo(tempo);
                }
                sink.on_event(due, index, &next.event);
            }
        }
        finished == document.tracks().len()
    }

    fn set_tempo(&mut self, tempo: u32) {
        if tempo == 0 {
            tracing::warn!("Ignoring zero tempo");
            return;
        }
        self.tempo = tempo;
        self.fallback.0 = tempo;
    }

    fn event_micros(&self, delta_ticks: u32, division: u16) -> f64 {
        let ticks = delta_ticks as u64;
        let micros = ticks_to_micros(ticks, self.tempo, division)
            .or_else(|| ticks_to_micros(ticks, self.fallback.0, self.fallback.1))
            .unwrap_or(0.);
        micros / self.speed_scale
    }
}

/// False when every event sits at tick zero, so a loop would restart on every tick
fn spans_time(document: &MidiDocument) -> bool {
    document
        .tracks()
        .iter()
        .filter_map(|track| track.events().last())
        .any(|event| event.absolute_ticks > 0)
}

#[cfg(test)]
fn two_track_document() -> MidiDocument {
    let mut bytes = vec![0x4D, 0x54, 0x68, 0x64, 0, 0, 0, 6, 0, 1, 0, 2, 0, 96];
    let first: &[u8] = &[
        0x00, 0x90, 0x3C, 0x64, // 0 µs
        0x60, 0x80, 0x3C, 0x40, // 500 000 µs
        0x00, 0xFF, 0x2F, 0x00,
    ];
    let second: &[u8] = &[
        0x30, 0x90, 0x40, 0x64, // 250 000 µs
        0x60, 0x80, 0x40, 0x40, // 750 000 µs
        0x00, 0xFF, 0x2F, 0x00,
    ];
    for track in [first, second] {
        bytes.extend_from_slice(b"MTrk");
        bytes.extend_from_slice(&(track.len() as u32).to_be_bytes());
        bytes.extend_from_slice(track);
    }
    MidiDocument::parse(&bytes).unwrap()
}

#[cfg(test)]
use crate::player::EventLog;

#[test]
fn fires_each_event_once_in_track_order() {
    use pretty_assertions::assert_eq;
    let mut scheduler = Scheduler::with_document(two_track_document());
    scheduler.play();

    let mut log = EventLog::default();
    let mut outcome = TickOutcome::Running;
    while outcome == TickOutcome::Running {
        outcome = scheduler.advance(0.1, &mut log);
    }
    assert_eq!(outcome, TickOutcome::Finished);
    assert_eq!(log.len(), 6);
    assert_eq!(log.finished, 1);
    for track in 0..2 {
        let times: Vec<f64> = log.track(track).map(|e| e.time_usec).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(times.len(), 3);
    }
    let ends: Vec<f64> = log.track(1).map(|e| e.time_usec).collect();
    assert_eq!(ends, vec![250_000., 750_000., 750_000.]);
}

#[test]
fn stop_then_play_replays_identically() {
    let mut scheduler = Scheduler::with_document(two_track_document());
    let mut run = || {
        scheduler.play();
        let mut log = EventLog::default();
        for _ in 0..4 {
            scheduler.advance(0.2, &mut log);
        }
        scheduler.stop();
        log
    };
    let first = run();
    let second = run();
    assert_eq!(first, second);
    assert_eq!(first.len(), 6);
}

#[test]
fn pause_holds_position() {
    let mut scheduler = Scheduler::with_document(two_track_document());
    scheduler.play();
    let mut log = EventLog::default();
    scheduler.advance(0.25, &mut log);
    assert_eq!(log.len(), 2);

    scheduler.pause();
    assert_eq!(scheduler.advance(10., &mut log), TickOutcome::Inactive);
    assert_eq!(scheduler.current_time(), 0.25);

    scheduler.resume();
    scheduler.advance(0.25, &mut log);
    // note off and end of track on the first track
    assert_eq!(log.len(), 4);
}

#[test]
fn external_clock_ignores_backward_jumps() {
    let mut scheduler = Scheduler::with_document(two_track_document());
    scheduler.play();
    let mut log = EventLog::default();
    scheduler.advance_to(5.0, &mut log);
    assert_eq!(scheduler.current_time(), 0.);
    scheduler.advance_to(5.3, &mut log);
    scheduler.advance_to(4.0, &mut log);
    scheduler.advance_to(4.1, &mut log);
    assert!((scheduler.current_time() - 0.4).abs() < 1e-9);
    assert_eq!(log.len(), 2);
}

#[test]
fn looping_restarts_from_zero() {
    let mut scheduler = Scheduler::with_document(two_track_document());
    scheduler.set_loop(true);
    scheduler.play();
    let mut log = EventLog::default();
    assert_eq!(scheduler.advance(1.0, &mut log), TickOutcome::Looped);
    assert_eq!(scheduler.state(), PlayerState::Playing);
    assert_eq!(scheduler.current_time(), 0.);
    assert_eq!(log.loops, 1);
    assert_eq!(log.len(), 6);
}

#[test]
fn documents_without_length_finish_instead_of_looping() {
    let empty = [0x4D, 0x54, 0x68, 0x64, 0, 0, 0, 6, 0, 1, 0, 0, 0, 96];
    let mut instant = empty.to_vec();
    instant[11] = 1;
    instant.extend_from_slice(b"MTrk");
    instant.extend_from_slice(&[0, 0, 0, 4, 0x00, 0xFF, 0x2F, 0x00]);

    for bytes in [empty.to_vec(), instant] {
        let mut scheduler = Scheduler::with_document(MidiDocument::parse(&bytes).unwrap());
        scheduler.set_loop(true);
        scheduler.play();
        let mut log = EventLog::default();
        assert_eq!(scheduler.advance(0.001, &mut log), TickOutcome::Finished);
        assert_eq!(scheduler.advance(0.001, &mut log), TickOutcome::Inactive);
        assert_eq!(log.loops, 0);
        assert_eq!(log.finished, 1);
    }
}

#[test]
fn seeking_fires_nothing() {
    let mut scheduler = Scheduler::with_document(two_track_document());
    scheduler.set_current_time(0.625);
    assert_eq!(scheduler.state(), PlayerState::Paused);
    assert_eq!(scheduler.cursors()[0].next_event_index, 3);
    assert_eq!(scheduler.cursors()[1].next_event_index, 1);

    scheduler.resume();
    let mut log = EventLog::default();
    scheduler.advance(0.125, &mut log);
    assert_eq!(log.len(), 2);
    assert_eq!(log.finished, 1);
    assert_eq!(log.events[0].time_usec, 750_000.);
}

#[test]
fn invalid_inputs_are_ignored() {
    let mut scheduler = Scheduler::new();
    scheduler.play();
    assert_eq!(scheduler.state(), PlayerState::Stopped);

    scheduler.load(two_track_document());
    scheduler.set_speed_scale(-1.);
    scheduler.set_speed_scale(f64::NAN);
    assert_eq!(scheduler.speed_scale(), 1.);

    scheduler.play();
    let mut log = EventLog::default();
    scheduler.advance(f64::INFINITY, &mut log);
    scheduler.advance(-3., &mut log);
    assert_eq!(scheduler.current_time(), 0.);
    assert_eq!(log.len(), 1);
}
