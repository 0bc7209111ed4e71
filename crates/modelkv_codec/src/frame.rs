//! Length-prefixed framing.
//!
//! A frame is a concatenation of parts, each preceded by its length as a
//! 4-byte big-endian integer:
//!
//! ```text
//! | len_0 (u32 BE) | part_0 | len_1 (u32 BE) | part_1 | ...
//! ```
//!
//! Explicit lengths mean a part may contain any byte value.

use crate::error::{CodecError, CodecResult};

const LEN_SIZE: usize = 4;

/// Concatenates `parts`, each prefixed with its big-endian length.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if a part is longer than `u32::MAX` bytes.
pub fn encode_frame(parts: &[&[u8]]) -> CodecResult<Vec<u8>> {
    let total = parts.iter().map(|p| LEN_SIZE + p.len()).sum();
    let mut frame = Vec::with_capacity(total);
    for part in parts {
        let len = u32::try_from(part.len())
            .map_err(|_| CodecError::encode(format!("frame part of {} bytes", part.len())))?;
        frame.extend_from_slice(&len.to_be_bytes());
        frame.extend_from_slice(part);
    }
    Ok(frame)
}

/// Splits a frame into exactly `expected` parts.
///
/// # Errors
///
/// Returns [`CodecError::MalformedEnvelope`] if a length prefix is cut
/// short, a part runs past the end, or the part count differs from
/// `expected` (including trailing bytes after the last part).
pub fn decode_frame(frame: &[u8], expected: usize) -> CodecResult<Vec<&[u8]>> {
    let mut parts = Vec::with_capacity(expected);
    let mut rest = frame;

    while !rest.is_empty() {
        if parts.len() == expected {
            return Err(CodecError::malformed(format!(
                "{} trailing bytes after {expected} parts",
                rest.len()
            )));
        }
        if rest.len() < LEN_SIZE {
            return Err(CodecError::malformed("truncated length prefix"));
        }
        let (prefix, tail) = rest.split_at(LEN_SIZE);
        let mut len_bytes = [0u8; LEN_SIZE];
        len_bytes.copy_from_slice(prefix);
        let len = u32::from_be_bytes(len_bytes) as usize;
        if len > tail.len() {
            return Err(CodecError::malformed(format!(
                "part of {len} bytes exceeds remaining {}",
                tail.len()
            )));
        }
        let (part, next) = tail.split_at(len);
        parts.push(part);
        rest = next;
    }

    if parts.len() != expected {
        return Err(CodecError::malformed(format!(
            "expected {expected} parts, found {}",
            parts.len()
        )));
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn layout_is_big_endian_length_then_bytes() {
        let frame = encode_frame(&[b"ab", b""]).unwrap();
        assert_eq!(frame, vec![0, 0, 0, 2, b'a', b'b', 0, 0, 0, 0]);
    }

    #[test]
    fn parts_may_contain_delimiter_like_bytes() {
        let salt = [0u8, 0, 0, 4];
        let body = b"$$::\x00\xff";
        let frame = encode_frame(&[&salt, body]).unwrap();
        let parts = decode_frame(&frame, 2).unwrap();
        assert_eq!(parts, vec![&salt[..], &body[..]]);
    }

    #[test]
    fn truncated_prefix_is_malformed() {
        let err = decode_frame(&[0, 0, 1], 2).unwrap_err();
        assert!(matches!(err, CodecError::MalformedEnvelope { .. }));
    }

    #[test]
    fn overlong_part_is_malformed() {
        let err = decode_frame(&[0, 0, 0, 9, 1, 2], 1).unwrap_err();
        assert!(matches!(err, CodecError::MalformedEnvelope { .. }));
    }

    #[test]
    fn wrong_part_count_is_malformed() {
        let frame = encode_frame(&[b"one"]).unwrap();
        assert!(decode_frame(&frame, 2).is_err());

        let frame = encode_frame(&[b"a", b"b", b"c"]).unwrap();
        assert!(decode_frame(&frame, 2).is_err());

        assert!(decode_frame(&[], 2).is_err());
    }

    proptest! {
        #[test]
        fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
            let _ = decode_frame(&bytes, 2);
        }
    }
}
