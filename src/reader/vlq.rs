use crate::VlqError;

/// Largest value a four byte quantity can hold (28 bits).
pub const MAX_VLQ: u32 = 0x0FFF_FFFF;

const MAX_VLQ_WIDTH: usize = 4;

#[doc = r#"
Decode a variable length quantity from the start of `bytes`.

Each byte contributes its low seven bits, most significant group first.
A set high bit means another byte follows. Returns the value and the
number of bytes it occupied.

# Example
```rust
# use smfplay::prelude::*;
assert_eq!(decode_vlq(&[0x81, 0x00]), Ok((128, 2)));
assert_eq!(decode_vlq(&[0x7F, 0xFF]), Ok((127, 1)));
```
"#]
pub fn decode_vlq(bytes: &[u8]) -> Result<(u32, usize), VlqError> {
    let mut value: u32 = 0;
    for (i, byte) in bytes.iter().enumerate() {
        if i == MAX_VLQ_WIDTH {
            return Err(VlqError::Overflow);
        }
        value = (value << 7) | (byte & 0x7F) as u32;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    if bytes.len() >= MAX_VLQ_WIDTH {
        Err(VlqError::Overflow)
    } else {
        Err(VlqError::Truncated)
    }
}

/// Encode `value` as a variable length quantity.
///
/// Values above [`MAX_VLQ`] are clamped to it.
pub fn encode_vlq(value: u32) -> Vec<u8> {
    let mut value = value.min(MAX_VLQ);
    let mut out = vec![(value & 0x7F) as u8];
    value >>= 7;
    while value > 0 {
        out.push(((value & 0x7F) as u8) | 0x80);
        value >>= 7;
    }
    out.reverse();
    out
}

#[test]
fn vlq_widths() {
    use pretty_assertions::assert_eq;
    let cases = [
        (0, 1),
        (127, 1),
        (128, 2),
        (16_383, 2),
        (16_384, 3),
        (2_097_151, 3),
        (2_097_152, 4),
        (MAX_VLQ, 4),
    ];
    for (value, width) in cases {
        let bytes = encode_vlq(value);
        assert_eq!(bytes.len(), width, "encoding {value}");
        assert_eq!(decode_vlq(&bytes), Ok((value, width)), "decoding {value}");
    }
}

#[test]
fn vlq_known_encodings() {
    assert_eq!(encode_vlq(0x40), [0x40]);
    assert_eq!(encode_vlq(0x2000), [0xC0, 0x00]);
    assert_eq!(encode_vlq(0x0010_0000), [0xC0, 0x80, 0x00]);
    assert_eq!(decode_vlq(&[0xFF, 0xFF, 0xFF, 0x7F]), Ok((MAX_VLQ, 4)));
}

#[test]
fn vlq_rejects_bad_input() {
    assert_eq!(decode_vlq(&[]), Err(VlqError::Truncated));
    assert_eq!(decode_vlq(&[0x81, 0x80]), Err(VlqError::Truncated));
    assert_eq!(
        decode_vlq(&[0x81, 0x80, 0x80, 0x80, 0x00]),
        Err(VlqError::Overflow)
    );
    assert_eq!(decode_vlq(&[0x81, 0x80, 0x80, 0x80]), Err(VlqError::Overflow));
}
