#![doc = r#"
Events carried by a track.

# Hierarchy
```text
                   |-------|
                   | Event |
                   |-------|
                 /     |     \
|-----------|  |--------|  |------|
| NoteEvent |  | System |  | Meta |
|-----------|  |--------|  |------|
```

Every event remembers the ticks since the previous event on its track.
System exclusive messages are skipped by the decoder and never appear here.
"#]

mod decoder;
pub use decoder::*;

use num_enum::{FromPrimitive, IntoPrimitive, TryFromPrimitive};

use crate::file::{MetaKind, MetaValue};

#[doc = r#"
The class of a channel voice message, taken from the high nibble of its status byte.
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum NoteKind {
    /// `0x8n`
    NoteOff = 0x8,
    /// `0x9n`
    NoteOn = 0x9,
    /// `0xAn`, polyphonic key pressure
    Aftertouch = 0xA,
    /// `0xBn`, control change
    Controller = 0xB,
    /// `0xCn`
    ProgramChange = 0xC,
    /// `0xDn`
    ChannelPressure = 0xD,
    /// `0xEn`
    PitchBend = 0xE,
}

impl NoteKind {
    /// Data bytes following the status byte
    pub const fn data_len(&self) -> usize {
        match self {
            Self::ProgramChange | Self::ChannelPressure => 1,
            _ => 2,
        }
    }
}

/// A channel voice message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NoteEvent {
    /// 0-15
    pub channel: u8,
    /// Message class
    pub kind: NoteKind,
    /// Key, controller, program or the low bits of a bend
    pub data1: u8,
    /// Present for the two byte kinds
    pub data2: Option<u8>,
    /// Ticks since the previous event on the track
    pub delta_ticks: u32,
}

impl NoteEvent {
    /// The status byte this event was read from
    pub fn status(&self) -> u8 {
        (u8::from(self.kind) << 4) | (self.channel & 0x0F)
    }

    /// A note on with velocity zero, which means note off
    pub fn is_note_off(&self) -> bool {
        match self.kind {
            NoteKind::NoteOff => true,
            NoteKind::NoteOn => self.data2 == Some(0),
            _ => false,
        }
    }

    /// The 14 bit pitch bend value, centred on `0x2000`
    pub fn pitch_bend(&self) -> Option<u16> {
        match (self.kind, self.data2) {
            (NoteKind::PitchBend, Some(msb)) => {
                Some(((msb as u16 & 0x7F) << 7) | (self.data1 as u16 & 0x7F))
            }
            _ => None,
        }
    }
}

/// System status bytes other than system exclusive and meta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum SystemKind {
    /// `0xF8`
    TimingClock = 0xF8,
    /// `0xFA`
    Start = 0xFA,
    /// `0xFB`
    Continue = 0xFB,
    /// `0xFC`
    Stop = 0xFC,
    /// `0xFE`
    ActiveSensing = 0xFE,
    /// `0xFF` outside a file. Inside a track this byte always introduces a meta event.
    Reset = 0xFF,
    /// Any other system status
    #[num_enum(catch_all)]
    Other(u8) = 0x00,
}

/// A system common or real time message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SystemEvent {
    /// Which message
    pub kind: SystemKind,
    /// Ticks since the previous event on the track
    pub delta_ticks: u32,
}

/// A meta event with its payload, raw and decoded
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetaEvent {
    /// Type byte
    pub kind: MetaKind,
    /// Payload as stored
    pub payload: Vec<u8>,
    /// Payload as interpreted. [`MetaValue::Raw`] when it could not be.
    pub value: MetaValue,
    /// Ticks since the previous event on the track
    pub delta_ticks: u32,
}

impl MetaEvent {
    /// True for the end of track marker
    pub fn is_end_of_track(&self) -> bool {
        self.kind == MetaKind::EndOfTrack
    }
}

#[doc = r#"
A single event decoded from a track.

# Example
```rust
# use smfplay::prelude::*;
let mut reader = Reader::from_byte_slice(&[0x60, 0x92, 0x3C, 0x64]);
let Decoded::Event(event) = decode_event(&mut reader).unwrap() else {
    unreachable!()
};
assert_eq!(event.delta_ticks(), 0x60);
let Event::Note(note) = event else { unreachable!() };
assert_eq!(note.kind, NoteKind::NoteOn);
assert_eq!(note.channel, 2);
assert_eq!(note.data2, Some(0x64));
```
"#]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Event {
    /// A channel voice message
    Note(NoteEvent),
    /// A system common or real time message
    System(SystemEvent),
    /// A meta event
    Meta(MetaEvent),
}

impl Event {
    /// Ticks since the previous event on the track
    pub const fn delta_ticks(&self) -> u32 {
        match self {
            Self::Note(e) => e.delta_ticks,
            Self::System(e) => e.delta_ticks,
            Self::Meta(e) => e.delta_ticks,
        }
    }

    /// Replace the delta time
    pub const fn set_delta_ticks(&mut self, delta_ticks: u32) {
        match self {
            Self::Note(e) => e.delta_ticks = delta_ticks,
            Self::System(e) => e.delta_ticks = delta_ticks,
            Self::Meta(e) => e.delta_ticks = delta_ticks,
        }
    }

    /// The tempo, if this is a valid tempo change
    pub fn tempo(&self) -> Option<u32> {
        match self {
            Self::Meta(meta) => meta.value.as_tempo(),
            _ => None,
        }
    }

    /// True for the end of track marker
    pub fn is_end_of_track(&self) -> bool {
        matches!(self, Self::Meta(meta) if meta.is_end_of_track())
    }

    /// The channel, for channel voice messages
    pub const fn channel(&self) -> Option<u8> {
        match self {
            Self::Note(note) => Some(note.channel),
            _ => None,
        }
    }
}

impl From<NoteEvent> for Event {
    fn from(value: NoteEvent) -> Self {
        Self::Note(value)
    }
}

impl From<SystemEvent> for Event {
    fn from(value: SystemEvent) -> Self {
        Self::System(value)
    }
}

impl From<MetaEvent> for Event {
    fn from(value: MetaEvent) -> Self {
        Self::Meta(value)
    }
}

#[test]
fn velocity_zero_note_on_is_off() {
    let note = NoteEvent {
        channel: 0,
        kind: NoteKind::NoteOn,
        data1: 60,
        data2: Some(0),
        delta_ticks: 0,
    };
    assert!(note.is_note_off());
    assert_eq!(note.status(), 0x90);
}

#[test]
fn pitch_bend_is_fourteen_bits() {
    let bend = NoteEvent {
        channel: 3,
        kind: NoteKind::PitchBend,
        data1: 0x00,
        data2: Some(0x40),
        delta_ticks: 0,
    };
    assert_eq!(bend.pitch_bend(), Some(0x2000));
    assert_eq!(bend.status(), 0xE3);
}

#[test]
fn delta_ticks_can_be_replaced() {
    let mut event = Event::from(SystemEvent {
        kind: SystemKind::from(0xF8),
        delta_ticks: 5,
    });
    event.set_delta_ticks(12);
    assert_eq!(event.delta_ticks(), 12);
    assert_eq!(SystemKind::from(0xF4), SystemKind::Other(0xF4));
}

#[test]
fn system_kind_converts_both_ways() {
    assert_eq!(SystemKind::from(0xFF), SystemKind::Reset);
    assert_eq!(SystemKind::from(0x00), SystemKind::Other(0x00));
    assert_eq!(u8::from(SystemKind::Reset), 0xFF);
    assert_eq!(u8::from(SystemKind::Other(0xF4)), 0xF4);
    assert_eq!(u8::from(SystemKind::ActiveSensing), 0xFE);
}
