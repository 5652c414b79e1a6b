use crate::{
    ChunkError,
    event::{Decoded, Event, MetaEvent, decode_event},
    file::{
        ChunkId, ChunkKind, DEFAULT_TICKS_PER_QUARTER, HeaderInfo, KeySignature, MetaKind,
        MetaValue, ParseWarning, RawChunk, TimeSignature, WarningKind, ticks_to_micros,
    },
    reader::Reader,
};

#[doc = r#"
State shared by every track of one parse.

The header's tempo lives here and moves forward as tempo changes are
read, so a change in one track also times the tracks parsed after it.
"#]
#[derive(Debug, Clone, PartialEq)]
pub struct ParseContext {
    /// The file header, with the tempo most recently read
    pub header: HeaderInfo,
    /// Everything recoverable that went wrong so far
    pub warnings: Vec<ParseWarning>,
}

impl ParseContext {
    /// A fresh context for a file with this header
    pub const fn new(header: HeaderInfo) -> Self {
        Self {
            header,
            warnings: Vec::new(),
        }
    }

    /// Record and log a warning
    pub fn warn(&mut self, track: Option<usize>, position: usize, kind: WarningKind) {
        let warning = ParseWarning {
            track,
            position,
            kind,
        };
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }

    fn division(&self) -> u16 {
        match self.header.ticks_per_quarter {
            0 => DEFAULT_TICKS_PER_QUARTER,
            division => division,
        }
    }

    fn micros(&self, ticks: u64) -> f64 {
        ticks_to_micros(ticks, self.header.tempo_usec_per_quarter, self.division()).unwrap_or(0.)
    }
}

/// An event together with where it falls on its track
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackEvent {
    /// The event
    pub event: Event,
    /// Ticks from the start of the track
    pub absolute_ticks: u64,
    /// Microseconds from the start of the track, at the tempo known while parsing
    pub time_usec: f64,
}

#[doc = r#"
One `MTrk` chunk, decoded.

Besides its events, a track remembers the last name, time signature and
key signature it declared.
"#]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Track {
    index: usize,
    events: Vec<TrackEvent>,
    name: Option<String>,
    time_signature: TimeSignature,
    key_signature: KeySignature,
    ended: bool,
}

impl Track {
    /// An empty track at `index`
    pub fn new(index: usize) -> Self {
        Self {
            index,
            events: Vec::new(),
            name: None,
            time_signature: TimeSignature::default(),
            key_signature: KeySignature::default(),
            ended: false,
        }
    }

    #[doc = r#"
Decode the events of a track chunk.

Problems inside the chunk are recorded on `ctx` and never fail the parse:

- Data bytes in status position and system exclusive messages are skipped.
  Their delta times are added to the next event kept.
- Malformed meta events are kept with a [`MetaValue::Raw`] value and change
  no state.
- An event that runs past the end of the chunk, or a quantity that overflows,
  drops the rest of the track.
- The end of track event stops decoding. Bytes after it are ignored.

Tempo changes update `ctx.header` as they are read.

# Errors
[`ChunkError::UnexpectedChunk`] if `chunk` is not `MTrk`.
"#]
    pub fn parse(
        chunk: &RawChunk<'_>,
        index: usize,
        ctx: &mut ParseContext,
    ) -> Result<Self, ChunkError> {
        if chunk.kind() != ChunkKind::Track {
            return Err(ChunkError::UnexpectedChunk {
                expected: ChunkId::TRACK,
                found: chunk.id(),
            });
        }

        let mut track = Self::new(index);
        let mut reader = Reader::from_byte_slice(chunk.data());
        let mut absolute_ticks = 0u64;
        // ticks and time of the last tempo change on this track
        let mut anchor = (0u64, 0f64);
        let mut skipped_ticks = 0u32;
        let mut truncated = false;

        while !reader.is_empty() {
            let position = reader.buffer_position();
            let decoded = match decode_event(&mut reader) {
                Ok(decoded) => decoded,
                Err(e) => {
                    let kind = if e.is_out_of_bounds() {
                        WarningKind::TruncatedEvent
                    } else {
                        WarningKind::VlqOverflow
                    };
                    ctx.warn(Some(index), position, kind);
                    truncated = true;
                    break;
                }
            };
            absolute_ticks += decoded.delta_ticks() as u64;

            let mut event = match decoded {
                Decoded::Event(event) => event,
                Decoded::MalformedMeta(event, error) => {
                    ctx.warn(Some(index), position, WarningKind::MalformedMeta(error));
                    event
                }
                Decoded::SystemExclusive { delta_ticks, .. } => {
                    skipped_ticks = skipped_ticks.saturating_add(delta_ticks);
                    continue;
                }
                Decoded::UnknownStatus {
                    delta_ticks,
                    status,
                } => {
                    ctx.warn(Some(index), position, WarningKind::UnknownStatus(status));
                    skipped_ticks = skipped_ticks.saturating_add(delta_ticks);
                    continue;
                }
            };
            if skipped_ticks > 0 {
                event.set_delta_ticks(event.delta_ticks().saturating_add(skipped_ticks));
                skipped_ticks = 0;
            }

            let time_usec = anchor.1 + ctx.micros(absolute_ticks - anchor.0);
            if let Event::Meta(meta) = &event {
                if let MetaKind::Unknown(kind) = meta.kind {
                    ctx.warn(Some(index), position, WarningKind::UnknownMeta(kind));
                }
                if track.ingest_meta(meta, ctx) {
                    anchor = (absolute_ticks, time_usec);
                }
            }
            let ended = event.is_end_of_track();
            track.events.push(TrackEvent {
                event,
                absolute_ticks,
                time_usec,
            });

            if ended {
                track.ended = true;
                if !reader.is_empty() {
                    ctx.warn(
                        Some(index),
                        reader.buffer_position(),
                        WarningKind::TrailingBytes(reader.remaining()),
                    );
                }
                break;
            }
        }

        if !track.ended && !truncated {
            ctx.warn(
                Some(index),
                reader.buffer_position(),
                WarningKind::MissingEndOfTrack,
            );
        }
        tracing::debug!(
            "Track {index} ({}): {} events over {absolute_ticks} ticks",
            track.display_name(),
            track.events.len()
        );
        Ok(track)
    }

    /// Apply a meta event to the running state. True if the tempo changed.
    fn ingest_meta(&mut self, meta: &MetaEvent, ctx: &mut ParseContext) -> bool {
        match (&meta.kind, &meta.value) {
            (_, MetaValue::Tempo(tempo)) => {
                ctx.header.tempo_usec_per_quarter = *tempo;
                return true;
            }
            (_, MetaValue::TimeSignature(signature)) => self.time_signature = *signature,
            (_, MetaValue::KeySignature(key)) => self.key_signature = *key,
            (MetaKind::TrackName, MetaValue::Text(name)) => self.name = Some(name.clone()),
            _ => {}
        }
        false
    }

    /// Position of the track in its file
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The events, in file order
    pub fn events(&self) -> &[TrackEvent] {
        &self.events
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if the track has no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The last track name the track declared
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The declared name, or `Track <index>`
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Track {}", self.index))
    }

    /// The last time signature the track declared
    pub const fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    /// The last key signature the track declared
    pub const fn key_signature(&self) -> KeySignature {
        self.key_signature
    }

    /// True if the track closed with an end of track event
    pub const fn ended(&self) -> bool {
        self.ended
    }

    /// Ticks up to the last event
    pub fn duration_ticks(&self) -> u64 {
        self.events.last().map_or(0, |e| e.absolute_ticks)
    }

    /// Microseconds up to the last event, at the tempo known while parsing
    pub fn duration_usec(&self) -> f64 {
        self.events.last().map_or(0., |e| e.time_usec)
    }

    /// Iterate over the events alone
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().map(|e| &e.event)
    }
}

#[cfg(test)]
fn parse_track(data: &[u8]) -> (Track, ParseContext) {
    let mut ctx = ParseContext::new(HeaderInfo::new(crate::file::Format::SingleTrack, 1, 96));
    let track = Track::parse(&RawChunk::new(ChunkId::TRACK, data), 0, &mut ctx).unwrap();
    (track, ctx)
}

#[test]
fn tempo_changes_time_following_events() {
    use pretty_assertions::assert_eq;
    let (track, ctx) = parse_track(&[
        0x60, 0x90, 0x3C, 0x64, // one quarter at 120 bpm
        0x00, 0xFF, 0x51, 0x03, 0x0F, 0x42, 0x40, // 60 bpm
        0x60, 0x80, 0x3C, 0x40, // one quarter at 60 bpm
        0x00, 0xFF, 0x2F, 0x00,
    ]);
    let times: Vec<f64> = track.events().iter().map(|e| e.time_usec).collect();
    assert_eq!(times, vec![500_000., 500_000., 1_500_000., 1_500_000.]);
    assert_eq!(ctx.header.tempo_usec_per_quarter, 1_000_000);
    assert!(ctx.warnings.is_empty());
    assert!(track.ended());
}

#[test]
fn end_of_track_stops_decoding() {
    let (track, ctx) = parse_track(&[0x00, 0xFF, 0x2F, 0x00, 0x00, 0x90, 0x3C, 0x64]);
    assert_eq!(track.len(), 1);
    assert_eq!(
        ctx.warnings,
        vec![ParseWarning {
            track: Some(0),
            position: 4,
            kind: WarningKind::TrailingBytes(4)
        }]
    );
}

#[test]
fn skipped_units_fold_into_next_delta() {
    let (track, ctx) = parse_track(&[
        0x10, 0xF0, 0x02, 0x01, 0xF7, // sysex
        0x20, 0x45, // stray data byte
        0x30, 0x90, 0x3C, 0x64, 0x00, 0xFF, 0x2F, 0x00,
    ]);
    let note = &track.events()[0];
    assert_eq!(note.event.delta_ticks(), 0x60);
    assert_eq!(note.absolute_ticks, 0x60);
    assert_eq!(ctx.warnings.len(), 1);
    assert_eq!(ctx.warnings[0].kind, WarningKind::UnknownStatus(0x45));
}

#[test]
fn metadata_last_value_wins() {
    let (track, _) = parse_track(&[
        0x00, 0xFF, 0x03, 0x03, b'o', b'n', b'e', //
        0x00, 0xFF, 0x58, 0x04, 0x03, 0x02, 0x18, 0x08, //
        0x00, 0xFF, 0x03, 0x03, b't', b'w', b'o', //
        0x00, 0xFF, 0x59, 0x02, 0x02, 0x00, //
        0x00, 0xFF, 0x2F, 0x00,
    ]);
    assert_eq!(track.name(), Some("two"));
    assert_eq!(track.time_signature().numerator, 3);
    assert_eq!(track.time_signature().denominator, 4);
    assert_eq!(track.key_signature().sharps_flats, 2);
}

#[test]
fn truncated_event_drops_the_rest() {
    let (track, ctx) = parse_track(&[0x00, 0x90, 0x3C, 0x64, 0x00, 0x90, 0x3C]);
    assert_eq!(track.len(), 1);
    assert!(!track.ended());
    assert_eq!(ctx.warnings.len(), 1);
    assert_eq!(ctx.warnings[0].kind, WarningKind::TruncatedEvent);
    assert_eq!(track.display_name(), "Track 0");
}

#[test]
fn missing_end_of_track_is_reported() {
    let (track, ctx) = parse_track(&[0x00, 0x90, 0x3C, 0x64]);
    assert_eq!(track.len(), 1);
    assert_eq!(ctx.warnings[0].kind, WarningKind::MissingEndOfTrack);
}

#[test]
fn malformed_meta_has_no_effect() {
    let (track, ctx) = parse_track(&[
        0x00, 0xFF, 0x51, 0x02, 0x00, 0x01, // short tempo
        0x60, 0xFF, 0x2F, 0x00,
    ]);
    assert_eq!(ctx.header.tempo_usec_per_quarter, 500_000);
    assert_eq!(track.events()[1].time_usec, 500_000.);
    assert!(matches!(
        ctx.warnings[0].kind,
        WarningKind::MalformedMeta(crate::MetaError::Length { .. })
    ));
}

#[test]
fn wrong_chunk_is_rejected() {
    let mut ctx = ParseContext::new(HeaderInfo::new(crate::file::Format::SingleTrack, 1, 96));
    let err = Track::parse(&RawChunk::new(ChunkId::HEADER, &[]), 0, &mut ctx).unwrap_err();
    assert_eq!(
        err,
        ChunkError::UnexpectedChunk {
            expected: ChunkId::TRACK,
            found: ChunkId::HEADER
        }
    );
}
