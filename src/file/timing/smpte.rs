#![doc = r#"
SMPTE frame rates.

MIDI can stamp time with SMPTE time code instead of musical beats. Files
that do so for their whole division are refused by this crate, but an
individual track may still carry an SMPTE offset meta event that places
its start at an absolute time code.
"#]

/// The four frame rates MIDI can express
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SmpteFps {
    /// 24 frames per second, film
    TwentyFour,
    /// 25 frames per second, PAL/SECAM
    TwentyFive,
    /// 29.97 frames per second, NTSC drop frame
    TwentyNine,
    /// 30 frames per second
    Thirty,
}

impl SmpteFps {
    /// Reads the high byte of an SMPTE division, stored as a negative number.
    pub const fn from_division_byte(byte: i8) -> Option<Self> {
        match byte {
            -24 => Some(Self::TwentyFour),
            -25 => Some(Self::TwentyFive),
            -29 => Some(Self::TwentyNine),
            -30 => Some(Self::Thirty),
            _ => None,
        }
    }

    /// Reads the two rate bits of an SMPTE offset's hour byte.
    pub const fn from_offset_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::TwentyFour),
            1 => Some(Self::TwentyFive),
            2 => Some(Self::TwentyNine),
            3 => Some(Self::Thirty),
            _ => None,
        }
    }

    /// Nominal whole frames per second. Drop frame counts as 30.
    pub const fn as_division(&self) -> u8 {
        match self {
            Self::TwentyFour => 24,
            Self::TwentyFive => 25,
            Self::TwentyNine | Self::Thirty => 30,
        }
    }

    /// Exact frames per second
    pub const fn as_f64(&self) -> f64 {
        match self {
            Self::TwentyFour => 24.,
            Self::TwentyFive => 25.,
            Self::TwentyNine => DROP_FRAME,
            Self::Thirty => 30.,
        }
    }
}

const DROP_FRAME: f64 = 30_000. / 1001.;

#[test]
fn division_bytes() {
    assert_eq!(SmpteFps::from_division_byte(-25), Some(SmpteFps::TwentyFive));
    assert_eq!(SmpteFps::from_division_byte(-26), None);
    assert_eq!(SmpteFps::TwentyNine.as_division(), 30);
    assert!(SmpteFps::TwentyNine.as_f64() < 30.);
}
