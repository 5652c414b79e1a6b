use thiserror::Error;

use crate::MetaError;

#[doc = r#"
A problem found while parsing that did not stop the parse.

`position` is a byte offset into the track's data for track warnings,
and into the whole file for file warnings (`track` is `None`).
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("{}at byte {position}: {kind}", track_prefix(.track))]
pub struct ParseWarning {
    /// Index of the track, if the warning belongs to one
    pub track: Option<usize>,
    /// Byte offset
    pub position: usize,
    /// What happened
    pub kind: WarningKind,
}

fn track_prefix(track: &Option<usize>) -> String {
    track.map(|t| format!("track {t} ")).unwrap_or_default()
}

/// Kinds of [`ParseWarning`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WarningKind {
    /// The header declares zero ticks per quarter note. Times use the given default.
    #[error("zero ticks per quarter note, timing at {0}")]
    ZeroDivision(u16),
    /// A data byte where a status byte belongs. It was skipped.
    #[error("data byte {0:#04X} in status position")]
    UnknownStatus(u8),
    /// A meta type this crate does not know. Kept uninterpreted.
    #[error("unknown meta type {0:#04X}")]
    UnknownMeta(u8),
    /// A meta payload that could not be decoded. Kept uninterpreted.
    #[error("malformed meta event: {0}")]
    MalformedMeta(MetaError),
    /// An event ran past the end of the chunk. The rest of the track was dropped.
    #[error("event runs past the end of the track")]
    TruncatedEvent,
    /// A quantity longer than four bytes. The rest of the track was dropped.
    #[error("variable length quantity is longer than four bytes")]
    VlqOverflow,
    /// The track data ended without an end of track event
    #[error("no end of track event")]
    MissingEndOfTrack,
    /// Bytes after the end of track event, ignored
    #[error("{0} bytes after end of track")]
    TrailingBytes(usize),
    /// More track chunks than the header declares. The track was kept.
    #[error("track {0} is beyond the declared track count")]
    ExtraTrack(usize),
    /// Bytes after the last chunk that do not form a chunk, ignored
    #[error("{0} trailing bytes do not form a chunk")]
    TrailingData(usize),
}

#[test]
fn warnings_display_their_origin() {
    let warning = ParseWarning {
        track: Some(2),
        position: 17,
        kind: WarningKind::UnknownStatus(0x3C),
    };
    assert_eq!(warning.to_string(), "track 2 at byte 17: data byte 0x3C in status position");

    let warning = ParseWarning {
        track: None,
        position: 40,
        kind: WarningKind::TrailingData(3),
    };
    assert_eq!(warning.to_string(), "at byte 40: 3 trailing bytes do not form a chunk");
}

#[test]
fn zero_division_names_the_fallback() {
    let warning = ParseWarning {
        track: None,
        position: 12,
        kind: WarningKind::ZeroDivision(480),
    };
    assert_eq!(warning.to_string(), "at byte 12: zero ticks per quarter note, timing at 480");
}
