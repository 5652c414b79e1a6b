#![doc = r#"
Every event of a document laid out on one absolute clock.

Unlike [`TrackEvent::time_usec`](crate::file::TrackEvent::time_usec), which
is fixed while parsing with whatever tempo was current, a timeline honours
tempo changes the way a sequencer does:

- Formats 0 and 1 share one tempo map built from the tempo changes of
  every track, so a conductor track times all the others.
- In format 2 each track is its own sequence and follows only its own
  tempo changes.

Events are merged across tracks in time order. Events at the same time
keep track order.
"#]

use itertools::Itertools;

use crate::{
    event::Event,
    file::{MidiDocument, TempoMap, Track},
};

/// An event placed on the timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedEvent<'a> {
    /// Microseconds from the start of the document
    pub time_usec: f64,
    /// Index of the track the event belongs to
    pub track: usize,
    /// Ticks from the start of the track
    pub absolute_ticks: u64,
    /// The event
    pub event: &'a Event,
}

#[doc = r#"
A flattened, time ordered view of a [`MidiDocument`].

# Example
```rust
# use smfplay::prelude::*;
let bytes: &[u8] = &[
    0x4D, 0x54, 0x68, 0x64, 0, 0, 0, 6, 0, 0, 0, 1, 0, 96,
    0x4D, 0x54, 0x72, 0x6B, 0, 0, 0, 12,
    0x00, 0x90, 0x3C, 0x64,
    0x60, 0x80, 0x3C, 0x40,
    0x00, 0xFF, 0x2F, 0x00,
];
let document = MidiDocument::parse(bytes).unwrap();
let timeline = document.timeline();

assert_eq!(timeline.len(), 3);
assert_eq!(timeline.duration_usec(), 500_000.);
```
"#]
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline<'a> {
    events: Vec<TimedEvent<'a>>,
    track_durations: Vec<f64>,
}

impl<'a> Timeline<'a> {
    /// Lay out every track of `document`
    pub fn new(document: &'a MidiDocument) -> Self {
        let division = document.header().ticks_per_quarter;
        let tracks = document.tracks();

        let maps: Vec<TempoMap> = if document.format().has_global_tempo() {
            let global = TempoMap::new(division, tracks.iter().flat_map(tempo_changes));
            vec![global; tracks.len()]
        } else {
            tracks
                .iter()
                .map(|track| TempoMap::new(division, tempo_changes(track)))
                .collect()
        };

        let placed: Vec<Vec<TimedEvent<'a>>> = tracks
            .iter()
            .zip(&maps)
            .map(|(track, map)| {
                track
                    .events()
                    .iter()
                    .map(|e| TimedEvent {
                        time_usec: map.micros_at(e.absolute_ticks),
                        track: track.index(),
                        absolute_ticks: e.absolute_ticks,
                        event: &e.event,
                    })
                    .collect()
            })
            .collect();

        let track_durations = placed
            .iter()
            .map(|events| events.last().map_or(0., |e| e.time_usec))
            .collect();
        let events = placed
            .into_iter()
            .kmerge_by(|a, b| (a.time_usec, a.track) < (b.time_usec, b.track))
            .collect();

        Self {
            events,
            track_durations,
        }
    }

    /// All events in time order
    pub fn events(&self) -> &[TimedEvent<'a>] {
        &self.events
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if no track has any events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Time of the last event of each track
    pub fn track_durations(&self) -> &[f64] {
        &self.track_durations
    }

    /// Time of the last event of the document
    pub fn duration_usec(&self) -> f64 {
        self.track_durations.iter().copied().fold(0., f64::max)
    }

    /// Events of one track, in time order
    pub fn track(&self, index: usize) -> impl Iterator<Item = &TimedEvent<'a>> {
        self.events.iter().filter(move |e| e.track == index)
    }

    /// Events with `from <= time_usec < to`
    pub fn between(&self, from: f64, to: f64) -> &[TimedEvent<'a>] {
        let start = self.events.partition_point(|e| e.time_usec < from);
        let end = self.events.partition_point(|e| e.time_usec < to).max(start);
        &self.events[start..end]
    }
}

fn tempo_changes(track: &Track) -> impl Iterator<Item = (u64, u32)> + '_ {
    track
        .events()
        .iter()
        .filter_map(|e| e.event.tempo().map(|tempo| (e.absolute_ticks, tempo)))
}

#[cfg(test)]
fn document(format: u16, tracks: &[&[u8]]) -> MidiDocument {
    let mut bytes = vec![0x4D, 0x54, 0x68, 0x64, 0, 0, 0, 6, 0, format as u8, 0, tracks.len() as u8, 0, 96];
    for track in tracks {
        bytes.extend_from_slice(b"MTrk");
        bytes.extend_from_slice(&(track.len() as u32).to_be_bytes());
        bytes.extend_from_slice(track);
    }
    MidiDocument::parse(&bytes).unwrap()
}

#[cfg(test)]
const EIGHTY_BPM: [u8; 7] = [0x00, 0xFF, 0x51, 0x03, 0x0B, 0x71, 0xB0];

#[test]
fn conductor_track_times_every_track() {
    use pretty_assertions::assert_eq;
    let conductor = [EIGHTY_BPM.as_slice(), &[0x00, 0xFF, 0x2F, 0x00]].concat();
    let notes = [0x60, 0x90, 0x3C, 0x64, 0x00, 0xFF, 0x2F, 0x00];
    let document = document(1, &[conductor.as_slice(), notes.as_slice()]);
    let timeline = document.timeline();

    // one quarter at 750 000 µs
    assert_eq!(timeline.track_durations(), &[0., 750_000.]);
    let tracks: Vec<usize> = timeline.events().iter().map(|e| e.track).collect();
    assert_eq!(tracks, vec![0, 0, 1, 1]);
}

#[test]
fn independent_tracks_keep_their_own_tempo() {
    let slow = [EIGHTY_BPM.as_slice(), &[0x60, 0xFF, 0x2F, 0x00]].concat();
    let plain = [0x60, 0xFF, 0x2F, 0x00];
    let document = document(2, &[slow.as_slice(), plain.as_slice()]);
    let timeline = document.timeline();
    assert_eq!(timeline.track_durations(), &[750_000., 500_000.]);
    assert_eq!(timeline.duration_usec(), 750_000.);
    assert_eq!(timeline.between(600_000., 800_000.).len(), 1);
    assert_eq!(timeline.track(1).count(), 1);
}
