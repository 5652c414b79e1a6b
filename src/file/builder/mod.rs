pub mod chunk;

use super::MidiDocument;
use crate::{
    FileError, ParseError,
    file::{
        DEFAULT_TICKS_PER_QUARTER, HeaderInfo, ParseContext, Track, WarningKind,
        builder::chunk::{ChunkKind, RawChunk, UnknownChunk},
    },
};

#[derive(Default)]
enum BuildStage {
    #[default]
    AwaitingHeader,
    ReadingTracks(ParseContext),
}

#[doc = r#"
Assembles a [`MidiDocument`] from chunks handed over in file order.

The first chunk must be the header. Track chunks are parsed as they
arrive, sharing one [`ParseContext`], and unknown chunks are kept as is.

# Example
```rust
# use smfplay::prelude::*;
let header = [0, 0, 0, 1, 0, 96];
let track = [0x00, 0xFF, 0x2F, 0x00];

let mut builder = DocumentBuilder::default();
builder.handle_chunk(RawChunk::new(ChunkId::HEADER, &header), 0).unwrap();
assert!(!builder.is_complete());
builder.handle_chunk(RawChunk::new(ChunkId::TRACK, &track), 14).unwrap();
assert!(builder.is_complete());

let document = builder.build().unwrap();
assert_eq!(document.tracks()[0].len(), 1);
```
"#]
#[derive(Default)]
pub struct DocumentBuilder {
    stage: BuildStage,
    tracks: Vec<Track>,
    unknown_chunks: Vec<UnknownChunk>,
}

impl DocumentBuilder {
    /// Handle the next chunk. `position` is its offset in the file.
    ///
    /// # Errors
    /// - A [`HeaderError`](crate::HeaderError) if the first chunk is not a valid header
    /// - [`FileError::DuplicateHeader`] for a second header
    pub fn handle_chunk(&mut self, chunk: RawChunk<'_>, position: usize) -> Result<(), ParseError> {
        let BuildStage::ReadingTracks(ctx) = &mut self.stage else {
            let header = HeaderInfo::parse(&chunk)?;
            tracing::debug!(
                "{:?} file, {} tracks, {} ticks per quarter note",
                header.format,
                header.track_count,
                header.ticks_per_quarter
            );
            let mut ctx = ParseContext::new(header);
            if header.ticks_per_quarter == 0 {
                // the division word sits after the id, length, format and track count
                ctx.warn(
                    None,
                    position + 12,
                    WarningKind::ZeroDivision(DEFAULT_TICKS_PER_QUARTER),
                );
            }
            self.stage = BuildStage::ReadingTracks(ctx);
            return Ok(());
        };
        match chunk.kind() {
            ChunkKind::Header => return Err(FileError::DuplicateHeader.into()),
            ChunkKind::Track => {
                let index = self.tracks.len();
                if index >= ctx.header.track_count as usize {
                    ctx.warn(None, position, WarningKind::ExtraTrack(index));
                }
                self.tracks.push(Track::parse(&chunk, index, ctx)?);
            }
            ChunkKind::Unknown => {
                tracing::debug!("Keeping unknown {} chunk of {} bytes", chunk.id(), chunk.size());
                self.unknown_chunks.push(chunk.into());
            }
        }
        Ok(())
    }

    /// True once the header and every track it declares have been handled
    pub fn is_complete(&self) -> bool {
        match &self.stage {
            BuildStage::AwaitingHeader => false,
            BuildStage::ReadingTracks(ctx) => self.tracks.len() >= ctx.header.track_count as usize,
        }
    }

    /// Note bytes at `position` that do not form a chunk
    pub fn trailing_data(&mut self, position: usize, len: usize) {
        if let BuildStage::ReadingTracks(ctx) = &mut self.stage {
            ctx.warn(None, position, WarningKind::TrailingData(len));
        }
    }

    /// Finish the document.
    ///
    /// # Errors
    /// - [`FileError::MissingHeader`] if no chunk was handled
    /// - [`FileError::MissingTracks`] if fewer tracks arrived than the header declares
    pub fn build(self) -> Result<MidiDocument, FileError> {
        let BuildStage::ReadingTracks(ctx) = self.stage else {
            return Err(FileError::MissingHeader);
        };
        if self.tracks.len() < ctx.header.track_count as usize {
            return Err(FileError::MissingTracks {
                expected: ctx.header.track_count,
                found: self.tracks.len(),
            });
        }
        Ok(MidiDocument {
            header: ctx.header,
            tracks: self.tracks,
            unknown_chunks: self.unknown_chunks,
            warnings: ctx.warnings,
        })
    }
}

#[cfg(test)]
use crate::file::builder::chunk::ChunkId;

#[test]
fn header_must_come_first() {
    let mut builder = DocumentBuilder::default();
    let err = builder
        .handle_chunk(RawChunk::new(ChunkId::TRACK, &[]), 0)
        .unwrap_err();
    assert_eq!(
        err,
        ParseError::Header(crate::HeaderError::NotAHeaderChunk(ChunkId::TRACK))
    );
    assert_eq!(
        DocumentBuilder::default().build().unwrap_err(),
        FileError::MissingHeader
    );
}

#[test]
fn second_header_is_an_error() {
    let mut builder = DocumentBuilder::default();
    let header = [0, 0, 0, 1, 0, 96];
    builder
        .handle_chunk(RawChunk::new(ChunkId::HEADER, &header), 0)
        .unwrap();
    let err = builder
        .handle_chunk(RawChunk::new(ChunkId::HEADER, &header), 14)
        .unwrap_err();
    assert_eq!(err, ParseError::File(FileError::DuplicateHeader));
}

#[test]
fn counts_tracks_against_the_header() {
    use pretty_assertions::assert_eq;
    let mut builder = DocumentBuilder::default();
    builder
        .handle_chunk(RawChunk::new(ChunkId::HEADER, &[0, 1, 0, 2, 0, 96]), 0)
        .unwrap();
    builder
        .handle_chunk(RawChunk::new(ChunkId::TRACK, &[0x00, 0xFF, 0x2F, 0x00]), 14)
        .unwrap();
    builder
        .handle_chunk(RawChunk::new(ChunkId(*b"XYZW"), &[1, 2]), 26)
        .unwrap();
    assert_eq!(
        builder.build().unwrap_err(),
        FileError::MissingTracks {
            expected: 2,
            found: 1
        }
    );
}
