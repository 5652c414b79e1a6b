#![doc = r#"
Contains types for MIDI file chunks

# Overview

MIDI files are organized into chunks. Each chunk starts with a 4-character ASCII
type identifier and a 32-bit big-endian length, followed by exactly that many
bytes of data. The Standard MIDI File format defines two chunk types:

- `MThd`, the header. It comes first and holds the file format, the number
  of tracks and the division (see [`HeaderInfo`](crate::file::HeaderInfo)).
- `MTrk`, a track. It holds a sequence of delta-timed events
  (see [`Track`](crate::file::Track)).

Any other identifier is an unknown chunk. Its length is still honoured so the
chunks after it stay in sync, and its bytes are kept as an [`UnknownChunk`], but
nothing interprets them.

# Example Structure

```text
[Header Chunk: "MThd"]
[Track Chunk 1: "MTrk"]
[Track Chunk 2: "MTrk"]
...
[Track Chunk N: "MTrk"]
[Optional Unknown Chunks]
```
"#]

use core::fmt;

use crate::ChunkError;

/// Size of the id and length fields that precede every chunk's data
pub const CHUNK_HEADER_LEN: usize = 8;

/// The four byte tag that starts a chunk.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChunkId(pub [u8; 4]);

impl ChunkId {
    /// `MThd`
    pub const HEADER: Self = Self(*b"MThd");
    /// `MTrk`
    pub const TRACK: Self = Self(*b"MTrk");

    /// What kind of chunk this id introduces
    pub const fn kind(&self) -> ChunkKind {
        match &self.0 {
            b"MThd" => ChunkKind::Header,
            b"MTrk" => ChunkKind::Track,
            _ => ChunkKind::Unknown,
        }
    }

    /// The raw tag
    pub const fn bytes(&self) -> [u8; 4] {
        self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{byte:02X}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkId(\"{self}\")")
    }
}

/// Classification of a chunk by its id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// `MThd`
    Header,
    /// `MTrk`
    Track,
    /// Anything else
    Unknown,
}

/// A chunk split off the input buffer, data borrowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawChunk<'a> {
    id: ChunkId,
    size: u32,
    data: &'a [u8],
}

impl<'a> RawChunk<'a> {
    /// Construct a chunk from parts. `size` is taken from `data`.
    pub fn new(id: ChunkId, data: &'a [u8]) -> Self {
        Self {
            id,
            size: data.len() as u32,
            data,
        }
    }
    /// The chunk's tag
    pub const fn id(&self) -> ChunkId {
        self.id
    }
    /// What kind of chunk this is
    pub const fn kind(&self) -> ChunkKind {
        self.id.kind()
    }
    /// The declared data length
    pub const fn size(&self) -> u32 {
        self.size
    }
    /// The chunk's data
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }
}

#[doc = r#"
Split one chunk off the front of `buffer`.

Returns the chunk and the bytes after it.

# Errors
[`ChunkError::TruncatedChunk`] if `buffer` holds fewer than `8 + length` bytes.

# Example
```rust
# use smfplay::prelude::*;
let bytes = [b'X', b'Y', b'Z', b'W', 0, 0, 0, 2, 0xAA, 0xBB, 0x01];
let (chunk, rest) = read_chunk(&bytes).unwrap();
assert_eq!(chunk.kind(), ChunkKind::Unknown);
assert_eq!(chunk.data(), &[0xAA, 0xBB]);
assert_eq!(rest, &[0x01]);
```
"#]
pub fn read_chunk(buffer: &[u8]) -> Result<(RawChunk<'_>, &[u8]), ChunkError> {
    let Some((head, rest)) = buffer.split_first_chunk::<CHUNK_HEADER_LEN>() else {
        return Err(ChunkError::TruncatedChunk {
            needed: CHUNK_HEADER_LEN,
            available: buffer.len(),
        });
    };
    let id = ChunkId([head[0], head[1], head[2], head[3]]);
    let size = u32::from_be_bytes([head[4], head[5], head[6], head[7]]);

    if rest.len() < size as usize {
        return Err(ChunkError::TruncatedChunk {
            needed: CHUNK_HEADER_LEN + size as usize,
            available: buffer.len(),
        });
    }
    let (data, remainder) = rest.split_at(size as usize);
    Ok((RawChunk { id, size, data }, remainder))
}

/// A chunk with an id this crate does not interpret. Kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnknownChunk {
    id: ChunkId,
    data: Vec<u8>,
}

impl UnknownChunk {
    /// The chunk's tag
    pub const fn id(&self) -> ChunkId {
        self.id
    }
    /// The chunk's data
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl From<RawChunk<'_>> for UnknownChunk {
    fn from(chunk: RawChunk<'_>) -> Self {
        Self {
            id: chunk.id,
            data: chunk.data.to_vec(),
        }
    }
}

#[cfg(test)]
fn framed(id: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut bytes = id.to_vec();
    bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

#[test]
fn framing_returns_payload_and_remainder() {
    use pretty_assertions::assert_eq;
    for len in [0usize, 1, 6, 255, 1024] {
        let payload: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();
        let mut buffer = framed(b"MTrk", &payload);
        let trailer = [0xDE, 0xAD, 0xBE, 0xEF];
        buffer.extend_from_slice(&trailer);

        let (chunk, rest) = read_chunk(&buffer).unwrap();
        assert_eq!(chunk.kind(), ChunkKind::Track);
        assert_eq!(chunk.size() as usize, len);
        assert_eq!(chunk.data(), payload.as_slice());
        assert_eq!(rest, &buffer[CHUNK_HEADER_LEN + len..]);
    }
}

#[test]
fn truncated_chunks_are_rejected() {
    let err = read_chunk(b"MTr").unwrap_err();
    assert_eq!(
        err,
        ChunkError::TruncatedChunk {
            needed: 8,
            available: 3
        }
    );

    let mut buffer = framed(b"MThd", &[0, 1, 0, 2, 4, 0]);
    buffer.truncate(12);
    let err = read_chunk(&buffer).unwrap_err();
    assert_eq!(
        err,
        ChunkError::TruncatedChunk {
            needed: 14,
            available: 12
        }
    );
}

#[test]
fn unknown_chunks_keep_their_bytes() {
    let buffer = framed(b"XFIH", &[1, 2, 3]);
    let (chunk, rest) = read_chunk(&buffer).unwrap();
    assert!(rest.is_empty());
    assert_eq!(chunk.id().to_string(), "XFIH");
    let owned = UnknownChunk::from(chunk);
    assert_eq!(owned.data(), &[1, 2, 3]);
}
