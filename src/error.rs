use thiserror::Error;

use crate::file::{ChunkId, MetaKind};

#[doc = r#"
Everything that can go wrong while turning bytes into a [`MidiDocument`](crate::MidiDocument).

Each variant wraps the error of the stage that failed.
"#]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Framing of a chunk was broken
    #[error("Chunk: {0}")]
    Chunk(#[from] ChunkError),
    /// The `MThd` chunk could not be interpreted
    #[error("Header: {0}")]
    Header(#[from] HeaderError),
    /// The chunks do not make up a valid file
    #[error("File: {0}")]
    File(#[from] FileError),
    /// A variable length quantity was malformed
    #[error("Variable length quantity: {0}")]
    Vlq(#[from] VlqError),
    /// An SMPTE value was out of range
    #[error("SMPTE: {0}")]
    Smpte(#[from] SmpteError),
}

/// Errors produced while splitting a buffer into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChunkError {
    /// The buffer ended before the chunk's 8 byte header and declared length.
    #[error("Chunk needs {needed} bytes, only {available} remain")]
    TruncatedChunk {
        /// Bytes required for the whole chunk, header included
        needed: usize,
        /// Bytes left in the buffer
        available: usize,
    },
    /// A chunk of one kind was handed to the parser of another
    #[error("Expected a {expected} chunk, found {found}")]
    UnexpectedChunk {
        /// The id the parser works on
        expected: ChunkId,
        /// The id that was found
        found: ChunkId,
    },
}

/// Errors produced while decoding the `MThd` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// The first chunk was not `MThd`
    #[error("Expected an MThd chunk, found {0}")]
    NotAHeaderChunk(ChunkId),
    /// Header payload is shorter than the six bytes the format requires
    #[error("Header payload is {0} bytes, needs at least 6")]
    Length(u32),
    /// Format word is not 0, 1 or 2
    #[error("Unknown file format {0}")]
    UnknownFormat(u16),
    /// The file times its events in SMPTE frames, which is not supported
    #[error("SMPTE division ({fps} fps, {ticks_per_frame} ticks per frame) is not supported")]
    UnsupportedDivision {
        /// Frames per second as stored (a negative number in the file)
        fps: i8,
        /// Ticks per frame
        ticks_per_frame: u8,
    },
}

/// Errors about the overall chunk layout of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FileError {
    /// No header chunk was found
    #[error("The file has no MThd chunk")]
    MissingHeader,
    /// A second header chunk was found
    #[error("The file has more than one MThd chunk")]
    DuplicateHeader,
    /// Fewer track chunks than the header declares
    #[error("The header declares {expected} tracks, but only {found} were found")]
    MissingTracks {
        /// Tracks declared in the header
        expected: u16,
        /// Track chunks actually present
        found: usize,
    },
}

/// Errors produced while decoding a variable length quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VlqError {
    /// The continuation bit was still set after four bytes
    #[error("Quantity is longer than four bytes")]
    Overflow,
    /// The input ended while the continuation bit was set
    #[error("Input ended in the middle of a quantity")]
    Truncated,
}

/// Errors produced while validating SMPTE values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SmpteError {
    /// Offset payload must be five bytes
    #[error("SMPTE offset payload is {0} bytes, expected 5")]
    Length(usize),
    /// Frame rate bits of an offset are not one of the four known rates
    #[error("Invalid frame rate bits {0}")]
    TrackFrame(u8),
    /// Hours above 23
    #[error("Invalid hour offset {0}")]
    HourOffset(u8),
    /// Minutes above 59
    #[error("Invalid minute offset {0}")]
    MinuteOffset(u8),
    /// Seconds above 59
    #[error("Invalid second offset {0}")]
    SecondOffset(u8),
    /// Frame number beyond the frame rate
    #[error("Invalid frame {0}")]
    Frame(u8),
    /// Subframes above 99
    #[error("Invalid subframe {0}")]
    Subframe(u8),
}

/// Problems with the payload of a meta event.
///
/// These never abort a parse. The event is kept with its raw payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetaError {
    /// The payload length does not match the meta type
    #[error("{kind:?} payload is {found} bytes, expected {expected}")]
    Length {
        /// The meta type
        kind: MetaKind,
        /// Bytes the type requires
        expected: usize,
        /// Bytes that were present
        found: usize,
    },
    /// A tempo of zero microseconds per quarter note
    #[error("Tempo of zero microseconds per quarter note")]
    ZeroTempo,
    /// A time signature denominator exponent too large to represent
    #[error("Time signature denominator 2^{0} is out of range")]
    Denominator(u8),
    /// A key signature mode other than major (0) or minor (1)
    #[error("Key signature mode {0} is neither major nor minor")]
    KeyMode(u8),
    /// An invalid SMPTE offset
    #[error("{0}")]
    Smpte(#[from] SmpteError),
}

/// Errors from controlling a [`MidiPlayer`](crate::MidiPlayer).
#[derive(Debug, Error)]
pub enum PlayerError {
    /// The playback thread could not be started
    #[error("Could not spawn the playback thread: {0}")]
    Spawn(#[from] std::io::Error),
    /// A [`PlayerConfig`](crate::player::PlayerConfig) value is out of range
    #[error("Invalid player configuration: {0}")]
    InvalidConfig(String),
    /// The playback thread has exited
    #[error("The playback thread is no longer running")]
    Disconnected,
}
