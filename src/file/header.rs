use crate::{
    HeaderError,
    file::{ChunkKind, DEFAULT_TEMPO, Format, RawChunk, SmpteFps, ticks_to_micros},
};

/// How the header's division word measures time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DivisionKind {
    /// Delta times count fractions of a quarter note
    TicksPerQuarterNote,
    /// Delta times count fractions of an SMPTE frame
    FramesPerSecond,
}

#[doc = r#"
The decoded contents of the `MThd` chunk.

`tempo_usec_per_quarter` starts at 500 000 (120 bpm). Tempo meta events
update it while tracks are parsed (see [`ParseContext`](crate::file::ParseContext)),
so once a document is built it holds the last tempo the file declared.

# Example
```rust
# use smfplay::prelude::*;
let bytes = [0x4D, 0x54, 0x68, 0x64, 0, 0, 0, 6, 0, 1, 0, 2, 0x04, 0x00];
let (chunk, _) = read_chunk(&bytes).unwrap();
let header = HeaderInfo::parse(&chunk).unwrap();

assert_eq!(header.format, Format::MultiSimultaneous);
assert_eq!(header.track_count, 2);
assert_eq!(header.division_kind, DivisionKind::TicksPerQuarterNote);
assert_eq!(header.ticks_per_quarter, 1024);
```
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeaderInfo {
    /// Relationship between the tracks
    pub format: Format,
    /// Number of `MTrk` chunks the file declares
    pub track_count: u16,
    /// Always [`DivisionKind::TicksPerQuarterNote`] for a parsed file
    pub division_kind: DivisionKind,
    /// Ticks in one quarter note
    pub ticks_per_quarter: u16,
    /// Microseconds in one quarter note
    pub tempo_usec_per_quarter: u32,
}

impl HeaderInfo {
    /// A header for `track_count` tracks at `ticks_per_quarter`, default tempo
    pub const fn new(format: Format, track_count: u16, ticks_per_quarter: u16) -> Self {
        Self {
            format,
            track_count,
            division_kind: DivisionKind::TicksPerQuarterNote,
            ticks_per_quarter,
            tempo_usec_per_quarter: DEFAULT_TEMPO,
        }
    }

    /// Decode a header chunk.
    ///
    /// # Errors
    /// - [`HeaderError::NotAHeaderChunk`] if `chunk` is not `MThd`
    /// - [`HeaderError::Length`] if it carries fewer than six bytes
    /// - [`HeaderError::UnknownFormat`] for a format word above 2
    /// - [`HeaderError::UnsupportedDivision`] if the division is SMPTE based
    pub fn parse(chunk: &RawChunk<'_>) -> Result<Self, HeaderError> {
        if chunk.kind() != ChunkKind::Header {
            return Err(HeaderError::NotAHeaderChunk(chunk.id()));
        }
        // anything past six bytes belongs to a later revision of the format
        let Some(words) = chunk.data().first_chunk::<6>() else {
            return Err(HeaderError::Length(chunk.size()));
        };

        let format = u16::from_be_bytes([words[0], words[1]]);
        let format = Format::try_from(format).map_err(|_| HeaderError::UnknownFormat(format))?;
        let track_count = u16::from_be_bytes([words[2], words[3]]);

        if words[4] >> 7 == 1 {
            let fps = words[4] as i8;
            if SmpteFps::from_division_byte(fps).is_none() {
                tracing::debug!("SMPTE division with nonstandard rate {fps}");
            }
            return Err(HeaderError::UnsupportedDivision {
                fps,
                ticks_per_frame: words[5],
            });
        }
        let ticks_per_quarter = u16::from_be_bytes([words[4], words[5]]);

        Ok(Self::new(format, track_count, ticks_per_quarter))
    }

    /// Microseconds covered by `ticks` at the current tempo
    pub fn ticks_to_micros(&self, ticks: u64) -> Option<f64> {
        ticks_to_micros(ticks, self.tempo_usec_per_quarter, self.ticks_per_quarter)
    }
}

#[cfg(test)]
fn header_chunk(payload: &[u8]) -> RawChunk<'_> {
    RawChunk::new(crate::file::ChunkId::HEADER, payload)
}

#[test]
fn decodes_ticks_per_quarter() {
    use pretty_assertions::assert_eq;
    let header = HeaderInfo::parse(&header_chunk(&[0, 0, 0, 1, 0x01, 0xE0])).unwrap();
    assert_eq!(header, HeaderInfo::new(Format::SingleTrack, 1, 480));
    assert_eq!(header.tempo_usec_per_quarter, 500_000);
    assert_eq!(header.ticks_to_micros(480), Some(500_000.));
}

#[test]
fn ignores_extended_header_bytes() {
    let header = HeaderInfo::parse(&header_chunk(&[0, 2, 0, 3, 0, 96, 0xAB, 0xCD])).unwrap();
    assert_eq!(header.format, Format::MultiIndependent);
    assert_eq!(header.track_count, 3);
}

#[test]
fn rejects_non_header_chunks() {
    let chunk = RawChunk::new(crate::file::ChunkId::TRACK, &[0, 0, 0, 1, 0, 96]);
    assert_eq!(
        HeaderInfo::parse(&chunk),
        Err(HeaderError::NotAHeaderChunk(crate::file::ChunkId::TRACK))
    );
    assert_eq!(
        HeaderInfo::parse(&header_chunk(&[0, 0, 0, 1])),
        Err(HeaderError::Length(4))
    );
    assert_eq!(
        HeaderInfo::parse(&header_chunk(&[0, 7, 0, 1, 0, 96])),
        Err(HeaderError::UnknownFormat(7))
    );
}

#[test]
fn smpte_division_is_unsupported() {
    // -25 fps, 40 ticks per frame
    let err = HeaderInfo::parse(&header_chunk(&[0, 0, 0, 1, 0xE7, 40])).unwrap_err();
    assert_eq!(
        err,
        HeaderError::UnsupportedDivision {
            fps: -25,
            ticks_per_frame: 40
        }
    );
}
