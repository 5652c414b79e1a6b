use crate::{
    MetaError,
    event::{Event, MetaEvent, NoteEvent, NoteKind, SystemEvent, SystemKind},
    file::{MetaKind, MetaValue},
    reader::{ReadResult, Reader},
};

/// The outcome of decoding one unit of a track.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// An event to keep
    Event(Event),
    /// A meta event whose payload could not be interpreted.
    ///
    /// The event carries [`MetaValue::Raw`].
    MalformedMeta(Event, MetaError),
    /// A system exclusive message, skipped
    SystemExclusive {
        /// Ticks since the previous unit
        delta_ticks: u32,
        /// Bytes skipped
        length: u32,
    },
    /// A data byte found where a status byte belongs. Only the byte itself was consumed.
    UnknownStatus {
        /// Ticks since the previous unit
        delta_ticks: u32,
        /// The offending byte
        status: u8,
    },
}

impl Decoded {
    /// The delta time read ahead of this unit
    pub const fn delta_ticks(&self) -> u32 {
        match self {
            Self::Event(event) | Self::MalformedMeta(event, _) => event.delta_ticks(),
            Self::SystemExclusive { delta_ticks, .. } | Self::UnknownStatus { delta_ticks, .. } => {
                *delta_ticks
            }
        }
    }
}

#[doc = r#"
Decode the delta time and event at the reader's position.

Status bytes are never implied: every event must carry its own.

| status | payload |
|--------|---------|
| `0x80`-`0xBF`, `0xE0`-`0xEF` | two data bytes |
| `0xC0`-`0xDF` | one data byte |
| `0xF0`, `0xF7` | VLQ length, then that many bytes (skipped) |
| `0xF1`-`0xFE` | none |
| `0xFF` | type byte, VLQ length, then that many bytes |

# Errors
An out of bounds [`ReaderError`](crate::reader::ReaderError) if the event runs past the
end of the data, or a [`VlqError::Overflow`](crate::VlqError::Overflow) parse error for a
delta time or length longer than four bytes. Either way the reader's position can no
longer be trusted.
"#]
pub fn decode_event(reader: &mut Reader<'_>) -> ReadResult<Decoded> {
    let (delta_ticks, _) = reader.read_vlq()?;
    let status = reader.read_next()?;

    match status {
        0x00..=0x7F => Ok(Decoded::UnknownStatus {
            delta_ticks,
            status,
        }),
        0xFF => decode_meta(reader, delta_ticks),
        0xF0 | 0xF7 => {
            let (length, _) = reader.read_vlq()?;
            reader.skip(length as usize)?;
            tracing::debug!("Skipped {length} byte system exclusive message");
            Ok(Decoded::SystemExclusive {
                delta_ticks,
                length,
            })
        }
        0xF1..=0xFE => Ok(Decoded::Event(Event::System(SystemEvent {
            kind: SystemKind::from(status),
            delta_ticks,
        }))),
        _ => {
            let Ok(kind) = NoteKind::try_from(status >> 4) else {
                return Ok(Decoded::UnknownStatus {
                    delta_ticks,
                    status,
                });
            };
            let data = reader.read_slice(kind.data_len())?;
            Ok(Decoded::Event(Event::Note(NoteEvent {
                channel: status & 0x0F,
                kind,
                data1: data[0],
                data2: data.get(1).copied(),
                delta_ticks,
            })))
        }
    }
}

fn decode_meta(reader: &mut Reader<'_>, delta_ticks: u32) -> ReadResult<Decoded> {
    let kind = MetaKind::from(reader.read_next()?);
    let (length, _) = reader.read_vlq()?;
    let payload = reader.read_slice(length as usize)?;

    let (value, error) = match MetaValue::decode(kind, payload) {
        Ok(value) => (value, None),
        Err(e) => (MetaValue::Raw, Some(e)),
    };
    let event = Event::Meta(MetaEvent {
        kind,
        payload: payload.to_vec(),
        value,
        delta_ticks,
    });
    Ok(match error {
        Some(e) => Decoded::MalformedMeta(event, e),
        None => Decoded::Event(event),
    })
}

#[test]
fn voice_payload_widths() {
    use pretty_assertions::assert_eq;
    let mut reader = Reader::from_byte_slice(&[0x00, 0xC5, 0x07, 0x81, 0x00, 0xB0, 0x07, 0x64]);

    let program = decode_event(&mut reader).unwrap();
    assert_eq!(
        program,
        Decoded::Event(Event::Note(NoteEvent {
            channel: 5,
            kind: NoteKind::ProgramChange,
            data1: 7,
            data2: None,
            delta_ticks: 0,
        }))
    );
    let controller = decode_event(&mut reader).unwrap();
    assert_eq!(controller.delta_ticks(), 128);
    assert!(reader.is_empty());
}

#[test]
fn sysex_is_skipped() {
    let mut reader = Reader::from_byte_slice(&[0x10, 0xF0, 0x03, 0x7E, 0x7F, 0xF7, 0x00, 0xF8]);
    assert_eq!(
        decode_event(&mut reader).unwrap(),
        Decoded::SystemExclusive {
            delta_ticks: 0x10,
            length: 3
        }
    );
    let Decoded::Event(Event::System(clock)) = decode_event(&mut reader).unwrap() else {
        panic!("expected a system event");
    };
    assert_eq!(clock.kind, SystemKind::TimingClock);
}

#[test]
fn data_byte_in_status_position() {
    let mut reader = Reader::from_byte_slice(&[0x00, 0x3C, 0x40]);
    assert_eq!(
        decode_event(&mut reader).unwrap(),
        Decoded::UnknownStatus {
            delta_ticks: 0,
            status: 0x3C
        }
    );
    assert_eq!(reader.buffer_position(), 2);
}

#[test]
fn meta_events_decode_their_payload() {
    let mut reader = Reader::from_byte_slice(&[
        0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, // tempo
        0x00, 0xFF, 0x51, 0x03, 0x00, 0x00, 0x00, // zero tempo
    ]);
    let Decoded::Event(tempo) = decode_event(&mut reader).unwrap() else {
        panic!("expected a tempo");
    };
    assert_eq!(tempo.tempo(), Some(500_000));

    let Decoded::MalformedMeta(event, error) = decode_event(&mut reader).unwrap() else {
        panic!("expected a malformed tempo");
    };
    assert_eq!(error, MetaError::ZeroTempo);
    assert_eq!(event.tempo(), None);
}

#[test]
fn truncated_events_are_errors() {
    let mut reader = Reader::from_byte_slice(&[0x00, 0x90, 0x3C]);
    assert!(decode_event(&mut reader).unwrap_err().is_out_of_bounds());

    let mut reader = Reader::from_byte_slice(&[0xFF, 0xFF, 0xFF, 0xFF, 0x7F, 0x90]);
    let err = decode_event(&mut reader).unwrap_err();
    assert_eq!(
        err.parse_error(),
        Some(&crate::ParseError::Vlq(crate::VlqError::Overflow))
    );
}
