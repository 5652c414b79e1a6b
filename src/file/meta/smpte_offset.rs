#![doc = r#"
The SMPTE offset meta event (`FF 54 05 hr mn se fr ff`).

It places the start of a track at an absolute time code. Nothing in
playback consumes it: events are always timed from tick zero. The value
is decoded so that callers syncing to video can read it.

The hour byte packs the frame rate into bits 5 and 6:

| bits | rate |
|------|------|
| `00` | 24 fps |
| `01` | 25 fps |
| `10` | 29.97 fps |
| `11` | 30 fps |
"#]

use crate::{SmpteError, file::SmpteFps};

/// A track's starting position as an SMPTE time code
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SmpteOffset {
    /// Frame rate the frame and subframe fields count in
    pub fps: SmpteFps,
    /// 0-23
    pub hour: u8,
    /// 0-59
    pub minute: u8,
    /// 0-59
    pub second: u8,
    /// Below the nominal frame rate
    pub frame: u8,
    /// Hundredths of a frame, 0-99
    pub subframe: u8,
}

impl SmpteOffset {
    /// Byte length of the payload
    pub const LEN: usize = 5;

    /// Decode the five payload bytes.
    ///
    /// # Errors
    /// A [`SmpteError`] naming the first field that is out of range.
    pub const fn parse(data: &[u8]) -> Result<Self, SmpteError> {
        let [rate_hour, minute, second, frame, subframe] = match data {
            [a, b, c, d, e] => [*a, *b, *c, *d, *e],
            _ => return Err(SmpteError::Length(data.len())),
        };

        let Some(fps) = SmpteFps::from_offset_bits(rate_hour >> 5) else {
            return Err(SmpteError::TrackFrame(rate_hour >> 5));
        };
        let hour = rate_hour & 0b0001_1111;
        if hour > 23 {
            return Err(SmpteError::HourOffset(hour));
        }
        if minute > 59 {
            return Err(SmpteError::MinuteOffset(minute));
        }
        if second > 59 {
            return Err(SmpteError::SecondOffset(second));
        }
        if frame >= fps.as_division() {
            return Err(SmpteError::Frame(frame));
        }
        if subframe > 99 {
            return Err(SmpteError::Subframe(subframe));
        }
        Ok(Self {
            fps,
            hour,
            minute,
            second,
            frame,
            subframe,
        })
    }

    /// The encoded payload
    pub const fn to_bytes(&self) -> [u8; 5] {
        let bits = match self.fps {
            SmpteFps::TwentyFour => 0,
            SmpteFps::TwentyFive => 1,
            SmpteFps::TwentyNine => 2,
            SmpteFps::Thirty => 3,
        };
        [
            (bits << 5) | self.hour,
            self.minute,
            self.second,
            self.frame,
            self.subframe,
        ]
    }

    /// Whole seconds since 00:00:00
    pub const fn whole_seconds(&self) -> u32 {
        self.hour as u32 * 3600 + self.minute as u32 * 60 + self.second as u32
    }

    /// Absolute position in microseconds
    pub fn as_micros(&self) -> f64 {
        let frames = self.frame as f64 + self.subframe as f64 / 100.;
        self.whole_seconds() as f64 * 1_000_000. + frames * 1_000_000. / self.fps.as_f64()
    }
}

#[test]
fn decodes_time_code() {
    use pretty_assertions::assert_eq;
    // payload of 00 FF 54 05 ...
    let offset = SmpteOffset::parse(&[0x41, 0x17, 0x2D, 0x0C, 0x22]).unwrap();
    assert_eq!(
        offset,
        SmpteOffset {
            fps: SmpteFps::TwentyNine,
            hour: 1,
            minute: 23,
            second: 45,
            frame: 12,
            subframe: 34,
        }
    );
    assert_eq!(offset.to_bytes(), [0x41, 0x17, 0x2D, 0x0C, 0x22]);
}

#[test]
fn micros_at_25_fps() {
    let offset = SmpteOffset::parse(&[0x20, 0, 1, 5, 50]).unwrap();
    assert_eq!(offset.fps, SmpteFps::TwentyFive);
    // 1 s + 5.5 frames of 40 ms
    assert_eq!(offset.as_micros(), 1_220_000.);
}

#[test]
fn rejects_out_of_range_fields() {
    assert_eq!(
        SmpteOffset::parse(&[0x7F, 0x17, 0x2D, 0x0C, 0x22]),
        Err(SmpteError::HourOffset(31))
    );
    assert_eq!(
        SmpteOffset::parse(&[0x41, 0x50, 0x2D, 0x0C, 0x22]),
        Err(SmpteError::MinuteOffset(80))
    );
    assert_eq!(
        SmpteOffset::parse(&[0x00, 0, 0, 24, 0]),
        Err(SmpteError::Frame(24))
    );
    assert_eq!(
        SmpteOffset::parse(&[0x80, 0, 0, 0, 0]),
        Err(SmpteError::TrackFrame(4))
    );
    assert_eq!(SmpteOffset::parse(&[0; 4]), Err(SmpteError::Length(4)));
}
