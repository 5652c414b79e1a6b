#![warn(missing_docs)]
#![doc = r#"
Parse Standard MIDI Files and play them back in real time.

# Overview

`smfplay` is split into two halves:

- [`file`] turns the raw bytes of a `.mid` file into a [`MidiDocument`]:
  a header, plus one ordered list of [`Event`]s per track.
- [`player`] walks a [`MidiDocument`] against a clock, firing each event
  to an [`EventSink`] when its time comes up. Tempo changes are applied
  as they are reached, and playback can loop, pause, seek and change speed.

Playback can be driven by hand with a [`Scheduler`], or handed off to a
dedicated thread with a [`MidiPlayer`].

# Example
```rust
use smfplay::prelude::*;

let bytes: &[u8] = &[
    0x4D, 0x54, 0x68, 0x64, 0, 0, 0, 6, 0, 0, 0, 1, 0, 96, // MThd
    0x4D, 0x54, 0x72, 0x6B, 0, 0, 0, 12, // MTrk
    0x00, 0x90, 0x3C, 0x64, // note on
    0x60, 0x80, 0x3C, 0x40, // note off, one quarter later
    0x00, 0xFF, 0x2F, 0x00, // end of track
];

let document = MidiDocument::parse(bytes).unwrap();
assert_eq!(document.tracks().len(), 1);

let mut scheduler = Scheduler::with_document(document);
scheduler.play();

let mut log = EventLog::default();
scheduler.advance(0.25, &mut log);
assert_eq!(log.len(), 1);
scheduler.advance(0.25, &mut log);
assert_eq!(log.len(), 3);
```
"#]

mod error;
pub use error::*;

pub mod event;
pub mod file;
pub mod player;
pub mod reader;

pub use event::Event;
pub use file::MidiDocument;
pub use player::{EventSink, MidiPlayer, Scheduler};

#[doc = r#"
Commonly used types
"#]
pub mod prelude {
    pub use crate::error::*;
    pub use crate::event::*;
    pub use crate::file::*;
    pub use crate::player::*;
    pub use crate::reader::{ReadResult, Reader, ReaderError, ReaderErrorKind, decode_vlq, encode_vlq};
}
