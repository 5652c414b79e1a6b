use smfplay::prelude::*;

fn smpte_bytes(rate_bits: u8, hour: u8, minute: u8, second: u8, frame: u8, subframe: u8) -> [u8; 5] {
    [(rate_bits << 5) | (hour & 0x1F), minute, second, frame, subframe]
}

#[test]
fn wrong_length() {
    for len in [0, 3, 4, 6] {
        let data = vec![0; len];
        assert_eq!(SmpteOffset::parse(&data), Err(SmpteError::Length(len)));
    }
}

#[test]
fn rate_bits_above_three() {
    for bits in 4..8 {
        let data = smpte_bytes(bits, 12, 30, 15, 10, 50);
        assert_eq!(SmpteOffset::parse(&data), Err(SmpteError::TrackFrame(bits)));
    }
}

#[test]
fn fields_out_of_range() {
    let cases = [
        (smpte_bytes(0, 24, 0, 0, 0, 0), SmpteError::HourOffset(24)),
        (smpte_bytes(0, 31, 0, 0, 0, 0), SmpteError::HourOffset(31)),
        (smpte_bytes(1, 0, 60, 0, 0, 0), SmpteError::MinuteOffset(60)),
        (smpte_bytes(1, 0, 0, 60, 0, 0), SmpteError::SecondOffset(60)),
        (smpte_bytes(2, 0, 0, 0, 0, 100), SmpteError::Subframe(100)),
        (smpte_bytes(3, 0, 0, 0, 0, 255), SmpteError::Subframe(255)),
    ];
    for (data, expected) in cases {
        assert_eq!(SmpteOffset::parse(&data), Err(expected), "{data:02X?}");
    }
}

#[test]
fn frame_must_be_below_the_rate() {
    assert_eq!(
        SmpteOffset::parse(&smpte_bytes(0, 0, 0, 0, 24, 0)),
        Err(SmpteError::Frame(24))
    );
    assert_eq!(
        SmpteOffset::parse(&smpte_bytes(1, 0, 0, 0, 25, 0)),
        Err(SmpteError::Frame(25))
    );
    // drop frame still numbers frames 0-29
    assert!(SmpteOffset::parse(&smpte_bytes(2, 0, 0, 0, 29, 0)).is_ok());
    assert_eq!(
        SmpteOffset::parse(&smpte_bytes(3, 0, 0, 0, 30, 0)),
        Err(SmpteError::Frame(30))
    );
}

#[test]
fn first_bad_field_wins() {
    let data = smpte_bytes(0, 24, 60, 60, 30, 100);
    assert_eq!(SmpteOffset::parse(&data), Err(SmpteError::HourOffset(24)));
}

#[test]
fn boundary_values_parse() {
    let offset = SmpteOffset::parse(&smpte_bytes(3, 23, 59, 59, 29, 99)).unwrap();
    assert_eq!(offset.fps, SmpteFps::Thirty);
    assert_eq!(offset.to_bytes(), smpte_bytes(3, 23, 59, 59, 29, 99));
}

#[test]
fn errors_surface_through_meta_decoding() {
    let err = MetaValue::decode(MetaKind::SmpteOffset, &smpte_bytes(0, 0, 0, 0, 0, 100)).unwrap_err();
    assert_eq!(err, MetaError::Smpte(SmpteError::Subframe(100)));

    let err = MetaValue::decode(MetaKind::SmpteOffset, &[0, 0]).unwrap_err();
    assert_eq!(err, MetaError::Smpte(SmpteError::Length(2)));
}
