//! Domain names in label-length-prefixed wire form.
//!
//! Decoding stops at compression pointers instead of following them; the
//! encoder only ever produces literal labels, plus the single-byte-offset
//! pointers built by [`compressed_name`].

use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u8};
use nom::IResult;
use tracing::debug;

use crate::error::{Result, WireError};

pub const MAX_NAME_LEN: usize = 255;
pub const MAX_LABEL_LEN: usize = 63;

/// Top two bits of a length byte that introduce a compression pointer.
pub const COMPRESSED_NAME: u8 = 0xC0;
const POINTER_OFFSET_MASK: u16 = 0x3FFF;

#[derive(Debug, PartialEq, Eq)]
pub enum LabelPart<'a> {
    Root,
    Regular(&'a [u8]),
    Backreference(u16),
    Reserved(u8),
}

pub fn parse_label_part(input: &[u8]) -> IResult<&[u8], LabelPart<'_>, WireError> {
    let (_, tag_byte) = be_u8::<WireError>(input)?;  // peek
    match tag_byte & COMPRESSED_NAME {
        COMPRESSED_NAME => {
            let (input, addr) = be_u16::<WireError>(input)?;
            Ok((input, LabelPart::Backreference(addr & POINTER_OFFSET_MASK)))
        }
        0 => {
            let (input, count) = be_u8::<WireError>(input)?;
            if count == 0u8 {
                return Ok((input, LabelPart::Root));
            }
            let (input, part) = take::<u8, &[u8], WireError>(count)(input)?;
            Ok((input, LabelPart::Regular(part)))
        }
        _ => Ok((&input[1..], LabelPart::Reserved(tag_byte))),
    }
}

/// Decodes the name starting at `offset` into dotted form (no trailing dot).
///
/// Returns the name and the offset of the first byte after its terminating
/// zero label.
pub fn decode_name(message: &[u8], offset: usize) -> Result<(String, usize)> {
    decode_labels(message, offset).map_err(|e| {
        debug!(offset, error = %e, "failed to decode name");
        e
    })
}

fn decode_labels(message: &[u8], offset: usize) -> Result<(String, usize)> {
    let mut input = message.get(offset..).ok_or(WireError::ShortBuffer {
        needed: offset,
        actual: message.len(),
    })?;
    let mut name: Vec<u8> = Vec::with_capacity(MAX_NAME_LEN);

    loop {
        let (rest, part) = parse_label_part(input)?;
        input = rest;
        match part {
            LabelPart::Root => break,
            LabelPart::Regular(label) => {
                if let Some(&byte) = label.iter().find(|&&b| !is_label_byte(b)) {
                    return Err(WireError::InvalidLabelByte(byte));
                }
                let sep = if name.is_empty() { 0 } else { 1 };
                let len = name.len() + sep + label.len();
                if len > MAX_NAME_LEN {
                    return Err(WireError::NameTooLong { len });
                }
                if sep == 1 {
                    name.push(b'.');
                }
                name.extend_from_slice(label);
            }
            LabelPart::Backreference(offset) => {
                return Err(WireError::CompressionPointer { offset })
            }
            LabelPart::Reserved(tag) => return Err(WireError::ReservedLabelType(tag)),
        }
    }

    let end = message.len() - input.len();
    // only ASCII was pushed
    let name = name.into_iter().map(char::from).collect();
    Ok((name, end))
}

// Printable ASCII, minus the separator a decoded name could not tell apart.
fn is_label_byte(byte: u8) -> bool {
    byte.is_ascii_graphic() && byte != b'.'
}

// A single trailing dot names the root and is not a label of its own.
fn relative(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// Exact number of bytes [`encode_name_into`] will write for `name`.
pub fn encoded_len(name: &str) -> Result<usize> {
    let name = relative(name);
    if name.len() > MAX_NAME_LEN {
        return Err(WireError::NameTooLong { len: name.len() });
    }
    if name.is_empty() {
        return Ok(1);
    }
    for label in name.split('.') {
        if label.is_empty() {
            return Err(WireError::EmptyLabel);
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(WireError::LabelTooLong { len: label.len() });
        }
        if let Some(byte) = label.bytes().find(|&b| !is_label_byte(b)) {
            return Err(WireError::InvalidLabelByte(byte));
        }
    }
    // every dot becomes a length byte, plus the leading length and the root
    Ok(name.len() + 2)
}

/// Writes `name` in wire form at the start of `dst`, returning the bytes used.
///
/// Nothing is written unless the whole name fits and every label is valid.
pub fn encode_name_into(name: &str, dst: &mut [u8]) -> Result<usize> {
    let needed = encoded_len(name)?;
    if dst.len() < needed {
        return Err(WireError::ShortBuffer {
            needed,
            actual: dst.len(),
        });
    }

    let name = relative(name);
    let mut pos = 0;
    if !name.is_empty() {
        for label in name.split('.') {
            let end = pos + 1 + label.len();
            dst[pos] = label.len() as u8;
            dst[pos + 1..end].copy_from_slice(label.as_bytes());
            pos = end;
        }
    }
    dst[pos] = 0;
    Ok(pos + 1)
}

pub fn encode_name(name: &str) -> Result<Vec<u8>> {
    let mut out = vec![0u8; encoded_len(name)?];
    encode_name_into(name, &mut out)?;
    Ok(out)
}

/// Name reference pointing at the name that starts `offset` bytes into the message.
pub fn compressed_name(offset: u8) -> u16 {
    (u16::from(COMPRESSED_NAME) << 8) | u16::from(offset)
}

#[cfg(test)]
mod test {
    use super::*;

    const QUERY: &[u8] = include_bytes!("../testdata/query.google.dns");
    const RESPONSE: &[u8] = include_bytes!("../testdata/response.google.dns");

    #[test]
    fn test_parse_label() {
        let (name, end) = decode_name(QUERY, 12).unwrap();
        assert_eq!(name, "google.com");
        assert_eq!(end, 24);
    }

    #[test]
    fn test_parse_label_jump_is_rejected() {
        let (rest, part) = parse_label_part(&RESPONSE[28..30]).unwrap();
        assert!(rest.is_empty());
        assert_eq!(part, LabelPart::Backreference(12));
        assert_eq!(
            decode_name(RESPONSE, 28),
            Err(WireError::CompressionPointer { offset: 12 })
        );
    }

    #[test]
    fn test_decode_foo_bar() {
        let bytes = [3, b'f', b'o', b'o', 3, b'b', b'a', b'r', 0];
        assert_eq!(decode_name(&bytes, 0).unwrap(), ("foo.bar".to_string(), 9));
    }

    #[test]
    fn test_decode_root() {
        assert_eq!(decode_name(&[0], 0).unwrap(), (String::new(), 1));
    }

    #[test]
    fn test_decode_out_of_bounds() {
        // label runs past the end
        assert_eq!(decode_name(&[5, b'a', b'b'], 0), Err(WireError::Truncated));
        // missing terminator
        assert_eq!(decode_name(&[1, b'a'], 0), Err(WireError::Truncated));
        // offset beyond the buffer
        assert_eq!(
            decode_name(&[0], 4),
            Err(WireError::ShortBuffer { needed: 4, actual: 1 })
        );
        assert_eq!(decode_name(&[0], 1), Err(WireError::Truncated));
    }

    #[test]
    fn test_decode_reserved_label_types() {
        assert_eq!(decode_name(&[0x40, 0], 0), Err(WireError::ReservedLabelType(0x40)));
        assert_eq!(decode_name(&[0x81, 0], 0), Err(WireError::ReservedLabelType(0x81)));
    }

    #[test]
    fn test_decode_rejects_non_ascii_label() {
        assert_eq!(
            decode_name(&[2, 0xFF, 0xFE, 0], 0),
            Err(WireError::InvalidLabelByte(0xFF))
        );
        let mut bytes = Vec::new();
        for _ in 0..4 {
            bytes.push(63);
            bytes.extend_from_slice(&[0xFF; 63]);
        }
        bytes.push(0);
        assert_eq!(decode_name(&bytes, 0), Err(WireError::InvalidLabelByte(0xFF)));
    }

    #[test]
    fn test_decode_rejects_dot_inside_label() {
        assert_eq!(
            decode_name(&[3, b'a', b'.', b'b', 0], 0),
            Err(WireError::InvalidLabelByte(b'.'))
        );
    }

    #[test]
    fn test_decode_name_too_long() {
        let mut bytes = Vec::new();
        for _ in 0..5 {
            bytes.push(63);
            bytes.extend_from_slice(&[b'x'; 63]);
        }
        bytes.push(0);
        assert_eq!(decode_name(&bytes, 0), Err(WireError::NameTooLong { len: 319 }));
    }

    #[test]
    fn test_encode_foo_bar() {
        assert_eq!(
            encode_name("foo.bar").unwrap(),
            vec![3, b'f', b'o', b'o', 3, b'b', b'a', b'r', 0]
        );
        assert_eq!(encode_name("foo.bar.").unwrap(), encode_name("foo.bar").unwrap());
        assert_eq!(encode_name("").unwrap(), vec![0]);
    }

    #[test]
    fn test_encode_rejects() {
        let long_label = "a".repeat(64);
        assert_eq!(encode_name(&long_label), Err(WireError::LabelTooLong { len: 64 }));
        assert_eq!(encode_name("foo..bar"), Err(WireError::EmptyLabel));
        assert_eq!(encode_name(".foo"), Err(WireError::EmptyLabel));
        assert_eq!(encode_name("caf\u{e9}.fr"), Err(WireError::InvalidLabelByte(0xC3)));
        assert_eq!(encode_name("a b.c"), Err(WireError::InvalidLabelByte(b' ')));
        let long_name = vec!["abc"; 65].join(".");
        assert_eq!(encode_name(&long_name), Err(WireError::NameTooLong { len: 259 }));
        // 255 is still fine
        let limit = vec!["abc"; 64].join(".");
        assert_eq!(encode_name(&limit).unwrap().len(), 257);
    }

    #[test]
    fn test_encode_into_short_buffer_writes_nothing() {
        let mut dst = [0xAAu8; 8];
        assert_eq!(
            encode_name_into("foo.bar", &mut dst),
            Err(WireError::ShortBuffer { needed: 9, actual: 8 })
        );
        assert_eq!(dst, [0xAAu8; 8]);
    }

    #[test]
    fn test_compressed_name() {
        assert_eq!(compressed_name(12), 0xC00C);
        assert_eq!(compressed_name(0xFF), 0xC0FF);
    }
}
