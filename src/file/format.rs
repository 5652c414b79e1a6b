use num_enum::{IntoPrimitive, TryFromPrimitive};

#[doc = r#"
How the tracks of a file relate to one another.

This is the first word of the `MThd` chunk.

- Format 0 holds a single track carrying every channel.
- Format 1 holds several tracks that play at the same time. Tempo
  changes live in the first track but apply to all of them.
- Format 2 holds several independent single-track patterns, each with
  its own tempo.
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum Format {
    /// Format 0
    SingleTrack = 0,
    /// Format 1
    MultiSimultaneous = 1,
    /// Format 2
    MultiIndependent = 2,
}

impl Format {
    /// True when tempo changes in one track govern every other track
    pub const fn has_global_tempo(&self) -> bool {
        !matches!(self, Self::MultiIndependent)
    }
}

#[test]
fn format_from_word() {
    assert_eq!(Format::try_from(1u16).unwrap(), Format::MultiSimultaneous);
    assert!(Format::try_from(3u16).is_err());
    assert_eq!(u16::from(Format::MultiIndependent), 2);
    assert!(!Format::MultiIndependent.has_global_tempo());
}
