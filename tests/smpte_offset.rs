use pretty_assertions::assert_eq;
use smfplay::prelude::*;

/// Single track file at 96 ticks per quarter whose track opens with an
/// SMPTE offset meta event, then one note and the end of track.
fn create_midi_with_smpte_offset(
    fps: SmpteFps,
    hour: u8,
    minute: u8,
    second: u8,
    frame: u8,
    subframe: u8,
) -> Vec<u8> {
    let offset = SmpteOffset {
        fps,
        hour,
        minute,
        second,
        frame,
        subframe,
    };
    let mut track = vec![0x00, 0xFF, 0x54, 0x05];
    track.extend_from_slice(&offset.to_bytes());
    track.extend_from_slice(&[
        0x00, 0x90, 0x3C, 0x64, // note on
        0x60, 0x80, 0x3C, 0x40, // note off
        0x00, 0xFF, 0x2F, 0x00, // end of track
    ]);

    let mut bytes = vec![0x4D, 0x54, 0x68, 0x64, 0, 0, 0, 6, 0, 0, 0, 1, 0, 96];
    bytes.extend_from_slice(b"MTrk");
    bytes.extend_from_slice(&(track.len() as u32).to_be_bytes());
    bytes.extend_from_slice(&track);
    bytes
}

fn first_offset(document: &MidiDocument) -> SmpteOffset {
    let Some(Event::Meta(MetaEvent {
        value: MetaValue::SmpteOffset(offset),
        ..
    })) = document.tracks()[0].iter().next()
    else {
        panic!("Expected SMPTE offset meta event");
    };
    *offset
}

#[test]
fn test_smpte_offset_24fps() {
    let midi_data = create_midi_with_smpte_offset(SmpteFps::TwentyFour, 12, 30, 15, 18, 50);
    let document = MidiDocument::parse(&midi_data).unwrap();
    assert!(document.warnings().is_empty());
    assert_eq!(document.tracks()[0].len(), 4);

    let offset = first_offset(&document);
    assert_eq!(offset.fps, SmpteFps::TwentyFour);
    assert_eq!(offset.hour, 12);
    assert_eq!(offset.minute, 30);
    assert_eq!(offset.second, 15);
    assert_eq!(offset.frame, 18);
    assert_eq!(offset.subframe, 50);

    let expected_micros = (12 * 3600 + 30 * 60 + 15) as f64 * 1_000_000.
        + (18. / 24.) * 1_000_000.
        + (50. / 100. / 24.) * 1_000_000.;
    assert!((offset.as_micros() - expected_micros).abs() < 0.01);
}

#[test]
fn test_smpte_offset_25fps_pal() {
    let midi_data = create_midi_with_smpte_offset(SmpteFps::TwentyFive, 0, 0, 1, 12, 75);
    let document = MidiDocument::parse(&midi_data).unwrap();

    let offset = first_offset(&document);
    assert_eq!(offset.fps, SmpteFps::TwentyFive);
    assert_eq!(offset.whole_seconds(), 1);
    assert_eq!(offset.frame, 12);
    assert_eq!(offset.subframe, 75);
    assert!((offset.as_micros() - 1_510_000.).abs() < 0.01);
}

#[test]
fn test_smpte_offset_29_97_drop_frame() {
    let midi_data = create_midi_with_smpte_offset(SmpteFps::TwentyNine, 23, 59, 59, 28, 99);
    let document = MidiDocument::parse(&midi_data).unwrap();

    let offset = first_offset(&document);
    assert_eq!(offset.fps, SmpteFps::TwentyNine);
    assert_eq!(offset.whole_seconds(), 86_399);
    // a drop frame second is slightly longer than 30 frames
    assert!(offset.as_micros() > 86_399_000_000. + 28.99 / 30. * 1_000_000.);
}

#[test]
fn smpte_offset_does_not_move_playback() {
    let midi_data = create_midi_with_smpte_offset(SmpteFps::Thirty, 1, 0, 0, 0, 0);
    let mut scheduler = Scheduler::with_document(MidiDocument::parse(&midi_data).unwrap());
    scheduler.play();

    let mut log = EventLog::default();
    scheduler.advance(0., &mut log);
    // the offset meta and the note on are both due at zero
    assert_eq!(log.len(), 2);
    assert_eq!(log.events[1].time_usec, 0.);
}

#[test]
fn invalid_offset_is_kept_as_raw() {
    let mut midi_data = create_midi_with_smpte_offset(SmpteFps::TwentyFour, 0, 0, 0, 0, 0);
    // minute byte of the offset payload
    midi_data[27] = 60;

    let document = MidiDocument::parse(&midi_data).unwrap();
    let Some(Event::Meta(meta)) = document.tracks()[0].iter().next() else {
        panic!("Expected meta event");
    };
    assert_eq!(meta.kind, MetaKind::SmpteOffset);
    assert_eq!(meta.value, MetaValue::Raw);
    assert_eq!(
        document.warnings()[0].kind,
        WarningKind::MalformedMeta(MetaError::Smpte(SmpteError::MinuteOffset(60)))
    );
}

#[test]
fn smpte_division_is_refused() {
    let mut midi_data = create_midi_with_smpte_offset(SmpteFps::TwentyFive, 0, 0, 0, 0, 0);
    // -25 fps, 40 ticks per frame
    midi_data[12] = 0xE7;
    midi_data[13] = 40;

    let err = MidiDocument::parse(&midi_data).unwrap_err();
    assert_eq!(err.position(), 0);
    assert_eq!(
        err.parse_error(),
        Some(&ParseError::Header(HeaderError::UnsupportedDivision {
            fps: -25,
            ticks_per_frame: 40
        }))
    );
}
