use pretty_assertions::assert_eq;
use smfplay::prelude::*;

const END_OF_TRACK: &[u8] = &[0x00, 0xFF, 0x2F, 0x00];

/// A file with one `MTrk` chunk per entry of `tracks`, and a header declaring that many
fn smf(format: u16, division: u16, tracks: &[&[u8]]) -> Vec<u8> {
    let mut bytes = b"MThd".to_vec();
    bytes.extend_from_slice(&6u32.to_be_bytes());
    bytes.extend_from_slice(&format.to_be_bytes());
    bytes.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    bytes.extend_from_slice(&division.to_be_bytes());
    for track in tracks {
        push_chunk(&mut bytes, b"MTrk", track);
    }
    bytes
}

fn push_chunk(bytes: &mut Vec<u8>, id: &[u8; 4], data: &[u8]) {
    bytes.extend_from_slice(id);
    bytes.extend_from_slice(&(data.len() as u32).to_be_bytes());
    bytes.extend_from_slice(data);
}

fn times(track: &Track) -> Vec<f64> {
    track.events().iter().map(|e| e.time_usec).collect()
}

#[test]
fn header_decode() {
    let bytes = [
        0x4D, 0x54, 0x68, 0x64, 0x00, 0x00, 0x00, 0x06, 0x00, 0x01, 0x00, 0x02, 0x04, 0x00,
    ];
    let (chunk, rest) = read_chunk(&bytes).unwrap();
    assert!(rest.is_empty());

    let header = HeaderInfo::parse(&chunk).unwrap();
    assert_eq!(header.format, Format::MultiSimultaneous);
    assert_eq!(header.track_count, 2);
    assert_eq!(header.division_kind, DivisionKind::TicksPerQuarterNote);
    assert_eq!(header.ticks_per_quarter, 1024);
    assert_eq!(header.tempo_usec_per_quarter, 500_000);
}

#[test]
fn chunk_framing() {
    let mut bytes = Vec::new();
    push_chunk(&mut bytes, b"XFIH", &[1, 2, 3, 4, 5]);
    bytes.extend_from_slice(&[0xAA, 0xBB]);

    let (chunk, rest) = read_chunk(&bytes).unwrap();
    assert_eq!(chunk.id(), ChunkId(*b"XFIH"));
    assert_eq!(chunk.kind(), ChunkKind::Unknown);
    assert_eq!(chunk.size(), 5);
    assert_eq!(chunk.data(), &[1, 2, 3, 4, 5]);
    assert_eq!(rest, &[0xAA, 0xBB]);
}

#[test]
fn tempo_change_times_later_events() {
    // 60 bpm set at the start, then a quarter note
    let track: &[u8] = &[
        0x00, 0xFF, 0x51, 0x03, 0x0F, 0x42, 0x40, //
        0x00, 0x90, 0x3C, 0x64, //
        0x60, 0x80, 0x3C, 0x40, //
        0x00, 0xFF, 0x2F, 0x00,
    ];
    let document = MidiDocument::parse(&smf(0, 96, &[track])).unwrap();
    assert_eq!(times(&document.tracks()[0]), vec![0., 0., 1_000_000., 1_000_000.]);
    assert_eq!(document.header().tempo_usec_per_quarter, 1_000_000);
}

#[test]
fn tempo_change_mid_track() {
    // a quarter at 120 bpm, then 0x07A120 again, then 40 bpm
    let track: &[u8] = &[
        0x60, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, //
        0x60, 0xFF, 0x51, 0x03, 0x16, 0xE3, 0x60, //
        0x60, 0x90, 0x3C, 0x64, //
        0x00, 0xFF, 0x2F, 0x00,
    ];
    let document = MidiDocument::parse(&smf(0, 96, &[track])).unwrap();
    assert_eq!(
        times(&document.tracks()[0]),
        vec![500_000., 1_000_000., 2_500_000., 2_500_000.]
    );
}

#[test]
fn tempo_carries_into_later_tracks() {
    let conductor: &[u8] = &[
        0x00, 0xFF, 0x51, 0x03, 0x0F, 0x42, 0x40, //
        0x00, 0xFF, 0x2F, 0x00,
    ];
    let melody: &[u8] = &[
        0x83, 0x60, 0x90, 0x3C, 0x64, // 480 ticks
        0x00, 0xFF, 0x2F, 0x00,
    ];
    let document = MidiDocument::parse(&smf(1, 480, &[conductor, melody])).unwrap();
    assert_eq!(document.tracks()[1].events()[0].absolute_ticks, 480);
    assert_eq!(document.tracks()[1].events()[0].time_usec, 1_000_000.);
}

#[test]
fn end_of_track_is_authoritative() {
    let track: &[u8] = &[
        0x00, 0x90, 0x3C, 0x64, //
        0x00, 0xFF, 0x2F, 0x00, //
        0x00, 0x80, 0x3C, 0x40, // never read
    ];
    let document = MidiDocument::parse(&smf(0, 96, &[track])).unwrap();
    let track = &document.tracks()[0];
    assert_eq!(track.len(), 2);
    assert!(track.ended());
    assert!(track.events()[1].event.is_end_of_track());
    assert_eq!(
        document.warnings(),
        &[ParseWarning {
            track: Some(0),
            position: 8,
            kind: WarningKind::TrailingBytes(4),
        }]
    );
}

#[test]
fn skipped_units_fold_their_delta() {
    let track: &[u8] = &[
        0x10, 0xF0, 0x03, 0x7E, 0x7F, 0xF7, // sysex
        0x20, 0x45, // data byte in status position
        0x30, 0x90, 0x3C, 0x64, //
        0x00, 0xFF, 0x2F, 0x00,
    ];
    let document = MidiDocument::parse(&smf(0, 96, &[track])).unwrap();
    let track = &document.tracks()[0];
    assert_eq!(track.len(), 2);
    assert_eq!(track.events()[0].event.delta_ticks(), 0x60);
    assert_eq!(track.events()[0].absolute_ticks, 0x60);
    assert_eq!(
        document.warnings(),
        &[ParseWarning {
            track: Some(0),
            position: 6,
            kind: WarningKind::UnknownStatus(0x45),
        }]
    );
}

#[test]
fn every_event_class_decodes() {
    let track: &[u8] = &[
        0x00, 0xC1, 0x05, // program change
        0x00, 0xB1, 0x07, 0x64, // controller
        0x00, 0xE1, 0x00, 0x40, // centred bend
        0x00, 0xD1, 0x20, // channel pressure
        0x00, 0xF8, // timing clock
        0x00, 0xFF, 0x03, 0x04, b'L', b'e', b'a', b'd', //
        0x00, 0xFF, 0x58, 0x04, 0x03, 0x03, 0x18, 0x08, // 3/8
        0x00, 0xFF, 0x59, 0x02, 0xFE, 0x01, // Bb minor
        0x00, 0xFF, 0x2F, 0x00,
    ];
    let document = MidiDocument::parse(&smf(0, 96, &[track])).unwrap();
    assert!(document.warnings().is_empty());

    let track = &document.tracks()[0];
    let events: Vec<&Event> = track.iter().collect();
    assert_eq!(events.len(), 9);
    assert_eq!(
        events[0],
        &Event::Note(NoteEvent {
            channel: 1,
            kind: NoteKind::ProgramChange,
            data1: 5,
            data2: None,
            delta_ticks: 0,
        })
    );
    let Event::Note(bend) = events[2] else {
        panic!("expected pitch bend");
    };
    assert_eq!(bend.pitch_bend(), Some(0x2000));
    assert_eq!(
        events[4],
        &Event::System(SystemEvent {
            kind: SystemKind::TimingClock,
            delta_ticks: 0,
        })
    );

    assert_eq!(track.name(), Some("Lead"));
    assert_eq!(track.time_signature().numerator, 3);
    assert_eq!(track.time_signature().denominator, 8);
    assert_eq!(track.key_signature().sharps_flats, -2);
    assert!(track.key_signature().is_minor());
}

#[test]
fn local_problems_are_warnings() {
    let unknown_meta: &[u8] = &[
        0x00, 0xFF, 0x60, 0x01, 0x00, // unknown meta type
        0x00, 0xFF, 0x51, 0x03, 0x00, 0x00, 0x00, // zero tempo
        0x00, 0xFF, 0x2F, 0x00,
    ];
    let no_end: &[u8] = &[0x00, 0x90, 0x3C, 0x64];
    let truncated: &[u8] = &[0x00, 0x90, 0x3C];
    let document = MidiDocument::parse(&smf(1, 96, &[unknown_meta, no_end, truncated])).unwrap();

    let kinds: Vec<(Option<usize>, WarningKind)> = document
        .warnings()
        .iter()
        .map(|w| (w.track, w.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (Some(0), WarningKind::UnknownMeta(0x60)),
            (Some(0), WarningKind::MalformedMeta(MetaError::ZeroTempo)),
            (Some(1), WarningKind::MissingEndOfTrack),
            (Some(2), WarningKind::TruncatedEvent),
        ]
    );
    // the zero tempo changed nothing
    assert_eq!(document.header().tempo_usec_per_quarter, 500_000);
    assert_eq!(document.tracks()[0].len(), 3);
    assert!(document.tracks()[2].is_empty());
}

#[test]
fn zero_division_is_reported_once() {
    let track: &[u8] = &[
        0x60, 0x90, 0x3C, 0x64, //
        0x00, 0xFF, 0x2F, 0x00,
    ];
    let document = MidiDocument::parse(&smf(1, 0, &[track, track])).unwrap();
    assert_eq!(document.ticks_per_quarter(), 0);
    assert_eq!(
        document.warnings(),
        &[ParseWarning {
            track: None,
            position: 12,
            kind: WarningKind::ZeroDivision(DEFAULT_TICKS_PER_QUARTER),
        }]
    );
    // timed at the default division
    assert_eq!(times(&document.tracks()[1]), vec![100_000., 100_000.]);
}

#[test]
fn extra_tracks_and_unknown_chunks_are_kept() {
    let mut bytes = smf(1, 96, &[END_OF_TRACK]);
    push_chunk(&mut bytes, b"XFIH", b"vendor");
    push_chunk(&mut bytes, b"MTrk", END_OF_TRACK);

    let document = MidiDocument::parse(&bytes).unwrap();
    assert_eq!(document.tracks().len(), 2);
    assert_eq!(document.unknown_chunks().len(), 1);
    assert_eq!(document.unknown_chunks()[0].id(), ChunkId(*b"XFIH"));
    assert_eq!(document.unknown_chunks()[0].data(), b"vendor");
    assert_eq!(
        document.warnings(),
        &[ParseWarning {
            track: None,
            position: 40,
            kind: WarningKind::ExtraTrack(1),
        }]
    );
}

#[test]
fn structural_problems_are_errors() {
    let err = MidiDocument::parse(&[]).unwrap_err();
    assert_eq!(err.parse_error(), Some(&ParseError::File(FileError::MissingHeader)));

    let mut bytes = smf(1, 96, &[END_OF_TRACK, END_OF_TRACK]);
    bytes.truncate(26);
    let err = MidiDocument::parse(&bytes).unwrap_err();
    assert_eq!(
        err.parse_error(),
        Some(&ParseError::File(FileError::MissingTracks {
            expected: 2,
            found: 1
        }))
    );

    let mut bytes = smf(0, 96, &[END_OF_TRACK]);
    bytes[9] = 3;
    let err = MidiDocument::parse(&bytes).unwrap_err();
    assert_eq!(
        err.parse_error(),
        Some(&ParseError::Header(HeaderError::UnknownFormat(3)))
    );

    let mut bytes = smf(0, 96, &[]);
    bytes.extend(smf(0, 96, &[]));
    let err = MidiDocument::parse(&bytes).unwrap_err();
    assert_eq!(err.position(), 14);
    assert_eq!(err.parse_error(), Some(&ParseError::File(FileError::DuplicateHeader)));

    let mut bytes = b"MTrk".to_vec();
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    let err = MidiDocument::parse(&bytes).unwrap_err();
    assert_eq!(
        err.parse_error(),
        Some(&ParseError::Header(HeaderError::NotAHeaderChunk(ChunkId::TRACK)))
    );
}

#[test]
fn load_from_disk() {
    let path = std::env::temp_dir().join(format!("smfplay-load-{}.mid", std::process::id()));
    std::fs::write(&path, smf(0, 96, &[END_OF_TRACK])).unwrap();
    let document = MidiDocument::load(&path);
    std::fs::remove_file(&path).unwrap();

    let document = document.unwrap();
    assert_eq!(document.event_count(), 1);

    let err = MidiDocument::load(&path).unwrap_err();
    assert!(matches!(err.error_kind(), ReaderErrorKind::Io(_)));
}

#[test]
fn timeline_merges_tracks() {
    let conductor: &[u8] = &[
        0x00, 0xFF, 0x51, 0x03, 0x0F, 0x42, 0x40, // 60 bpm
        0x00, 0xFF, 0x2F, 0x00,
    ];
    let melody: &[u8] = &[
        0x00, 0x90, 0x3C, 0x64, //
        0x60, 0x80, 0x3C, 0x40, //
        0x00, 0xFF, 0x2F, 0x00,
    ];
    let document = MidiDocument::parse(&smf(1, 96, &[conductor, melody])).unwrap();
    let timeline = document.timeline();

    assert_eq!(timeline.len(), document.event_count());
    let stamps: Vec<(f64, usize)> = timeline.events().iter().map(|e| (e.time_usec, e.track)).collect();
    assert_eq!(
        stamps,
        vec![
            (0., 0),
            (0., 0),
            (0., 1),
            (1_000_000., 1),
            (1_000_000., 1),
        ]
    );
    assert_eq!(timeline.track_durations(), &[0., 1_000_000.]);
    assert_eq!(timeline.duration_usec(), 1_000_000.);
}
