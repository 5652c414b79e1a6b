#![doc = r#"
Rusty representation of a Standard MIDI File.

Parsing runs in stages:

1. [`read_chunk`] splits the bytes into chunks.
2. [`HeaderInfo::parse`] decodes the `MThd` chunk.
3. [`Track::parse`] decodes each `MTrk` chunk, threading a [`ParseContext`]
   through all of them.
4. A [`DocumentBuilder`] collects the results into a [`MidiDocument`].

[`MidiDocument::parse`] runs all of them.
"#]

/// Contains the [`DocumentBuilder`] and the chunk reader
pub mod builder;
pub use builder::{DocumentBuilder, chunk::*};

mod format;
pub use format::*;

mod header;
pub use header::*;

mod meta;
pub use meta::*;

mod timeline;
pub use timeline::*;

mod timing;
pub use timing::*;

mod track;
pub use track::*;

mod warning;
pub use warning::*;

use std::path::Path;

use crate::reader::{ReadResult, ReaderError, ReaderErrorKind};

#[doc = r#"
A parsed Standard MIDI File.

Once built a document never changes. Playback reads it through an
`Arc` and keeps its own tempo.

# Example
```rust
# use smfplay::prelude::*;
let bytes: &[u8] = &[
    0x4D, 0x54, 0x68, 0x64, 0, 0, 0, 6, 0, 0, 0, 1, 0, 96,
    0x4D, 0x54, 0x72, 0x6B, 0, 0, 0, 11,
    0x00, 0xFF, 0x51, 0x03, 0x0F, 0x42, 0x40, // 60 bpm
    0x00, 0xFF, 0x2F, 0x00,
];
let document = MidiDocument::parse(bytes).unwrap();

assert_eq!(document.format(), Format::SingleTrack);
assert_eq!(document.header().tempo_usec_per_quarter, 1_000_000);
assert!(document.warnings().is_empty());
```
"#]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MidiDocument {
    pub(crate) header: HeaderInfo,
    pub(crate) tracks: Vec<Track>,
    pub(crate) unknown_chunks: Vec<UnknownChunk>,
    pub(crate) warnings: Vec<ParseWarning>,
}

impl MidiDocument {
    /// Parse a complete file held in memory.
    ///
    /// # Errors
    /// Structural problems abort the parse: a chunk cut short before every
    /// declared track was read, a missing or invalid header, an SMPTE
    /// division, or too few tracks. Everything else becomes a
    /// [`ParseWarning`].
    pub fn parse(bytes: &[u8]) -> ReadResult<Self> {
        let mut builder = DocumentBuilder::default();
        let mut rest = bytes;

        while !rest.is_empty() {
            let position = bytes.len() - rest.len();
            let (chunk, remainder) = match read_chunk(rest) {
                Ok(split) => split,
                Err(_) if builder.is_complete() => {
                    builder.trailing_data(position, rest.len());
                    break;
                }
                Err(e) => return Err(ReaderError::new(position, ReaderErrorKind::chunk(e))),
            };
            builder
                .handle_chunk(chunk, position)
                .map_err(|e| ReaderError::invalid(position, e))?;
            rest = remainder;
        }

        builder
            .build()
            .map_err(|e| ReaderError::invalid(bytes.len(), e))
    }

    /// Read and parse a file from disk.
    ///
    /// # Errors
    /// An I/O error, or anything [`MidiDocument::parse`] returns.
    pub fn load(path: impl AsRef<Path>) -> ReadResult<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        tracing::debug!("Read {} bytes from {}", bytes.len(), path.as_ref().display());
        Self::parse(&bytes)
    }

    /// The header. Its tempo is the last one the file declared.
    pub const fn header(&self) -> &HeaderInfo {
        &self.header
    }

    /// Relationship between the tracks
    pub const fn format(&self) -> Format {
        self.header.format
    }

    /// Ticks in one quarter note
    pub const fn ticks_per_quarter(&self) -> u16 {
        self.header.ticks_per_quarter
    }

    /// The tracks in file order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// One track
    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Chunks with ids this crate does not interpret
    pub fn unknown_chunks(&self) -> &[UnknownChunk] {
        &self.unknown_chunks
    }

    /// Problems found while parsing that did not stop the parse
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    /// Total number of events over all tracks
    pub fn event_count(&self) -> usize {
        self.tracks.iter().map(Track::len).sum()
    }

    /// Every event on one absolute clock. See [`Timeline`].
    pub fn timeline(&self) -> Timeline<'_> {
        Timeline::new(self)
    }
}

impl TryFrom<&[u8]> for MidiDocument {
    type Error = ReaderError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::parse(bytes)
    }
}

#[test]
fn trailing_junk_after_tracks_is_a_warning() {
    let mut bytes = vec![0x4D, 0x54, 0x68, 0x64, 0, 0, 0, 6, 0, 0, 0, 1, 0, 96];
    bytes.extend_from_slice(&[0x4D, 0x54, 0x72, 0x6B, 0, 0, 0, 4, 0x00, 0xFF, 0x2F, 0x00]);
    bytes.extend_from_slice(&[0x00, 0x00, 0x00]);

    let document = MidiDocument::parse(&bytes).unwrap();
    assert_eq!(
        document.warnings(),
        &[ParseWarning {
            track: None,
            position: 26,
            kind: WarningKind::TrailingData(3)
        }]
    );
}

#[test]
fn truncated_track_is_fatal() {
    let mut bytes = vec![0x4D, 0x54, 0x68, 0x64, 0, 0, 0, 6, 0, 0, 0, 1, 0, 96];
    bytes.extend_from_slice(&[0x4D, 0x54, 0x72, 0x6B, 0, 0, 0, 8, 0x00, 0xFF, 0x2F, 0x00]);

    let err = MidiDocument::parse(&bytes).unwrap_err();
    assert_eq!(err.position(), 14);
    assert_eq!(
        err.parse_error(),
        Some(&crate::ParseError::Chunk(crate::ChunkError::TruncatedChunk {
            needed: 16,
            available: 12
        }))
    );
}
