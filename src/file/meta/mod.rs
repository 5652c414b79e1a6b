#![doc = r#"
Meta event types and their decoded values.

A meta event is `FF <type> <vlq length> <payload>`. The type byte is a
[`MetaKind`], and [`MetaValue::decode`] interprets the payload according
to it. Types this crate does not know, and sequencer specific data, are
kept as [`MetaValue::Raw`].
"#]

mod smpte_offset;
pub use smpte_offset::*;

use num_enum::{FromPrimitive, IntoPrimitive};

use crate::MetaError;

#[doc = r#"
The type byte of a meta event.

# Example
```rust
# use smfplay::prelude::*;
assert_eq!(MetaKind::from(0x51), MetaKind::SetTempo);
assert_eq!(MetaKind::from(0x60), MetaKind::Unknown(0x60));
assert_eq!(u8::from(MetaKind::EndOfTrack), 0x2F);
```
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum MetaKind {
    /// `0x00`
    SequenceNumber = 0x00,
    /// `0x01`
    Text = 0x01,
    /// `0x02`
    Copyright = 0x02,
    /// `0x03`, sequence or track name
    TrackName = 0x03,
    /// `0x04`
    InstrumentName = 0x04,
    /// `0x05`
    Lyric = 0x05,
    /// `0x06`
    Marker = 0x06,
    /// `0x07`
    CuePoint = 0x07,
    /// `0x08`
    ProgramName = 0x08,
    /// `0x09`
    DeviceName = 0x09,
    /// `0x20`
    ChannelPrefix = 0x20,
    /// `0x21`
    Port = 0x21,
    /// `0x2F`
    EndOfTrack = 0x2F,
    /// `0x51`
    SetTempo = 0x51,
    /// `0x54`
    SmpteOffset = 0x54,
    /// `0x58`
    TimeSignature = 0x58,
    /// `0x59`
    KeySignature = 0x59,
    /// `0x7F`
    SequencerSpecific = 0x7F,
    /// Any other type byte
    #[num_enum(catch_all)]
    Unknown(u8),
}

impl MetaKind {
    /// True for the types whose payload is text
    pub const fn is_text(&self) -> bool {
        matches!(
            self,
            Self::Text
                | Self::Copyright
                | Self::TrackName
                | Self::InstrumentName
                | Self::Lyric
                | Self::Marker
                | Self::CuePoint
                | Self::ProgramName
                | Self::DeviceName
        )
    }

    /// The payload length the type requires, if it is fixed
    pub const fn fixed_len(&self) -> Option<usize> {
        match self {
            Self::SequenceNumber => Some(2),
            Self::ChannelPrefix | Self::Port => Some(1),
            Self::SetTempo => Some(3),
            Self::SmpteOffset => Some(SmpteOffset::LEN),
            Self::TimeSignature => Some(4),
            Self::KeySignature => Some(2),
            _ => None,
        }
    }
}

/// A time signature meta event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSignature {
    /// Beats per bar
    pub numerator: u8,
    /// Note value of a beat, already raised from its stored exponent
    pub denominator: u8,
    /// MIDI clocks per metronome click
    pub clocks_per_tick: u8,
    /// Notated 32nd notes in a MIDI quarter note
    pub notated_32nds_per_quarter: u8,
}

impl Default for TimeSignature {
    /// 4/4, 24 clocks, 8 32nds
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
            clocks_per_tick: 24,
            notated_32nds_per_quarter: 8,
        }
    }
}

/// A key signature meta event. The default is C major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeySignature {
    /// Negative for flats, positive for sharps
    pub sharps_flats: i8,
    /// 0 major, 1 minor
    pub major_minor: u8,
}

impl KeySignature {
    /// True for a minor key
    pub const fn is_minor(&self) -> bool {
        self.major_minor == 1
    }
}

/// The interpreted payload of a meta event
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetaValue {
    /// Any of the text types. Invalid UTF-8 is replaced.
    Text(String),
    /// Microseconds per quarter note, never zero
    Tempo(u32),
    /// Time signature
    TimeSignature(TimeSignature),
    /// Key signature
    KeySignature(KeySignature),
    /// Sequence number. `None` when the payload is empty, which stands for
    /// the position of the track in the file.
    SequenceNumber(Option<u16>),
    /// MIDI channel the following meta events refer to
    ChannelPrefix(u8),
    /// Output port
    Port(u8),
    /// Track start time code
    SmpteOffset(SmpteOffset),
    /// The end of the track
    EndOfTrack,
    /// Payload left uninterpreted
    Raw,
}

impl MetaValue {
    #[doc = r#"
Interpret `payload` as a meta event of type `kind`.

The end of track marker ignores any payload it carries.

# Errors
A [`MetaError`] if the payload has the wrong length or an invalid field.

# Example
```rust
# use smfplay::prelude::*;
let tempo = MetaValue::decode(MetaKind::SetTempo, &[0x07, 0xA1, 0x20]).unwrap();
assert_eq!(tempo, MetaValue::Tempo(500_000));

let err = MetaValue::decode(MetaKind::SetTempo, &[0, 0, 0]).unwrap_err();
assert_eq!(err, MetaError::ZeroTempo);
```
"#]
    pub fn decode(kind: MetaKind, payload: &[u8]) -> Result<Self, MetaError> {
        if let Some(expected) = kind.fixed_len()
            && payload.len() != expected
            && kind != MetaKind::SmpteOffset
            && !(kind == MetaKind::SequenceNumber && payload.is_empty())
        {
            return Err(MetaError::Length {
                kind,
                expected,
                found: payload.len(),
            });
        }

        let value = match kind {
            kind if kind.is_text() => Self::Text(String::from_utf8_lossy(payload).into_owned()),
            MetaKind::SequenceNumber => {
                let number = payload.first_chunk().map(|bytes| u16::from_be_bytes(*bytes));
                Self::SequenceNumber(number)
            }
            MetaKind::ChannelPrefix => Self::ChannelPrefix(payload[0]),
            MetaKind::Port => Self::Port(payload[0]),
            MetaKind::EndOfTrack => Self::EndOfTrack,
            MetaKind::SetTempo => {
                let tempo = u32::from_be_bytes([0, payload[0], payload[1], payload[2]]);
                if tempo == 0 {
                    return Err(MetaError::ZeroTempo);
                }
                Self::Tempo(tempo)
            }
            MetaKind::SmpteOffset => Self::SmpteOffset(SmpteOffset::parse(payload)?),
            MetaKind::TimeSignature => {
                let Some(denominator) = 1u8.checked_shl(payload[1] as u32) else {
                    return Err(MetaError::Denominator(payload[1]));
                };
                Self::TimeSignature(TimeSignature {
                    numerator: payload[0],
                    denominator,
                    clocks_per_tick: payload[2],
                    notated_32nds_per_quarter: payload[3],
                })
            }
            MetaKind::KeySignature => {
                if payload[1] > 1 {
                    return Err(MetaError::KeyMode(payload[1]));
                }
                Self::KeySignature(KeySignature {
                    sharps_flats: payload[0] as i8,
                    major_minor: payload[1],
                })
            }
            _ => Self::Raw,
        };
        Ok(value)
    }

    /// The text, for the text types
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The tempo, for a tempo change
    pub const fn as_tempo(&self) -> Option<u32> {
        match self {
            Self::Tempo(tempo) => Some(*tempo),
            _ => None,
        }
    }
}

#[test]
fn decodes_time_signature() {
    use pretty_assertions::assert_eq;
    let value = MetaValue::decode(MetaKind::TimeSignature, &[6, 3, 36, 8]).unwrap();
    assert_eq!(
        value,
        MetaValue::TimeSignature(TimeSignature {
            numerator: 6,
            denominator: 8,
            clocks_per_tick: 36,
            notated_32nds_per_quarter: 8,
        })
    );
    assert_eq!(
        MetaValue::decode(MetaKind::TimeSignature, &[4, 9, 24, 8]),
        Err(MetaError::Denominator(9))
    );
}

#[test]
fn decodes_key_signature() {
    let value = MetaValue::decode(MetaKind::KeySignature, &[0xFD, 1]).unwrap();
    let MetaValue::KeySignature(key) = value else {
        panic!("expected a key signature, got {value:?}");
    };
    assert_eq!(key.sharps_flats, -3);
    assert!(key.is_minor());
    assert_eq!(
        MetaValue::decode(MetaKind::KeySignature, &[0, 2]),
        Err(MetaError::KeyMode(2))
    );
}

#[test]
fn text_is_lossy() {
    let value = MetaValue::decode(MetaKind::TrackName, b"Pi\xFFano").unwrap();
    assert_eq!(value.as_text(), Some("Pi\u{FFFD}ano"));
}

#[test]
fn wrong_lengths_are_errors() {
    assert_eq!(
        MetaValue::decode(MetaKind::SetTempo, &[0x07, 0xA1]),
        Err(MetaError::Length {
            kind: MetaKind::SetTempo,
            expected: 3,
            found: 2
        })
    );
    assert_eq!(
        MetaValue::decode(MetaKind::SmpteOffset, &[0; 3]),
        Err(MetaError::Smpte(crate::SmpteError::Length(3)))
    );
    assert_eq!(
        MetaValue::decode(MetaKind::EndOfTrack, &[1]),
        Ok(MetaValue::EndOfTrack)
    );
    assert_eq!(
        MetaValue::decode(MetaKind::Unknown(0x60), &[1, 2]),
        Ok(MetaValue::Raw)
    );
}

#[test]
fn sequence_number_may_be_empty() {
    assert_eq!(
        MetaValue::decode(MetaKind::SequenceNumber, &[0x01, 0x02]),
        Ok(MetaValue::SequenceNumber(Some(0x0102)))
    );
    assert_eq!(
        MetaValue::decode(MetaKind::SequenceNumber, &[]),
        Ok(MetaValue::SequenceNumber(None))
    );
    assert_eq!(
        MetaValue::decode(MetaKind::SequenceNumber, &[0x01]),
        Err(MetaError::Length {
            kind: MetaKind::SequenceNumber,
            expected: 2,
            found: 1
        })
    );
}
