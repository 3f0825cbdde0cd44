//! Question entries and single-address answer records.

use std::net::Ipv4Addr;

use nom::number::complete::{be_u16, be_u32};
use nom::sequence::{pair, tuple};
use nom::IResult;

use crate::error::{Result, WireError};
use crate::name::{decode_name, encode_name_into, encoded_len};

pub const TYPE_A: u16 = 1;
pub const CLASS_IN: u16 = 1;

/// type(2) | class(2) following the question name.
pub const QUESTION_TAIL_LEN: usize = 4;
/// nameref(2) | type(2) | class(2) | ttl(4) | rdlength(2) | address(4)
pub const A_ANSWER_LEN: usize = 16;
const A_RDLENGTH: u16 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: String,
    pub qtype: u16,
    pub qclass: u16,
}

fn question_tail(input: &[u8]) -> IResult<&[u8], (u16, u16), WireError> {
    pair(be_u16, be_u16)(input)
}

/// Reads the question at `offset`, returning it with the offset just past its tail.
pub fn parse_question(message: &[u8], offset: usize) -> Result<(Question, usize)> {
    let (name, end) = decode_name(message, offset)?;
    let (_, (qtype, qclass)) = question_tail(&message[end..])?;
    Ok((Question { name, qtype, qclass }, end + QUESTION_TAIL_LEN))
}

impl Question {
    pub fn wire_len(&self) -> Result<usize> {
        Ok(encoded_len(&self.name)? + QUESTION_TAIL_LEN)
    }

    pub fn write_to(&self, dst: &mut [u8]) -> Result<usize> {
        let needed = self.wire_len()?;
        if dst.len() < needed {
            return Err(WireError::ShortBuffer {
                needed,
                actual: dst.len(),
            });
        }
        let pos = encode_name_into(&self.name, dst)?;
        dst[pos..pos + 2].copy_from_slice(&self.qtype.to_be_bytes());
        dst[pos + 2..pos + 4].copy_from_slice(&self.qclass.to_be_bytes());
        Ok(needed)
    }
}

/// An IN A answer whose owner is given by a 16-bit name reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressAnswer {
    pub name_ref: u16,
    pub ttl: u32,
    pub address: Ipv4Addr,
}

impl AddressAnswer {
    pub fn write_to(&self, dst: &mut [u8]) -> Result<usize> {
        if dst.len() < A_ANSWER_LEN {
            return Err(WireError::ShortBuffer {
                needed: A_ANSWER_LEN,
                actual: dst.len(),
            });
        }
        dst[0..2].copy_from_slice(&self.name_ref.to_be_bytes());
        dst[2..4].copy_from_slice(&TYPE_A.to_be_bytes());
        dst[4..6].copy_from_slice(&CLASS_IN.to_be_bytes());
        dst[6..10].copy_from_slice(&self.ttl.to_be_bytes());
        dst[10..12].copy_from_slice(&A_RDLENGTH.to_be_bytes());
        dst[12..16].copy_from_slice(&self.address.octets());
        Ok(A_ANSWER_LEN)
    }
}

fn address_answer(input: &[u8]) -> IResult<&[u8], (u16, u16, u16, u32, u16, u32), WireError> {
    tuple((be_u16, be_u16, be_u16, be_u32, be_u16, be_u32))(input)
}

/// Reads an address answer at `offset`, returning it with the offset just past it.
pub fn parse_address_answer(message: &[u8], offset: usize) -> Result<(AddressAnswer, usize)> {
    let input = message.get(offset..).ok_or(WireError::ShortBuffer {
        needed: offset,
        actual: message.len(),
    })?;
    let (_, (name_ref, rtype, rclass, ttl, rdlength, address)) = address_answer(input)?;
    if rtype != TYPE_A || rclass != CLASS_IN || rdlength != A_RDLENGTH {
        return Err(WireError::UnexpectedRecord { rtype, rdlength });
    }
    let answer = AddressAnswer {
        name_ref,
        ttl,
        address: Ipv4Addr::from(address),
    };
    Ok((answer, offset + A_ANSWER_LEN))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::name::compressed_name;

    const QUERY: &[u8] = include_bytes!("../testdata/query.google.dns");
    const RESPONSE: &[u8] = include_bytes!("../testdata/response.google.dns");

    #[test]
    fn test_parse_question() {
        let (question, end) = parse_question(QUERY, 12).unwrap();
        assert_eq!(question.name, "google.com");
        assert_eq!(question.qtype, TYPE_A);
        assert_eq!(question.qclass, CLASS_IN);
        assert_eq!(end, QUERY.len());
    }

    #[test]
    fn test_parse_question_missing_tail() {
        assert_eq!(parse_question(&QUERY[..26], 12), Err(WireError::Truncated));
    }

    #[test]
    fn test_write_question_matches_capture() {
        let question = Question {
            name: "google.com".to_string(),
            qtype: TYPE_A,
            qclass: CLASS_IN,
        };
        let mut out = [0u8; 16];
        assert_eq!(question.write_to(&mut out).unwrap(), 16);
        assert_eq!(&out[..], &QUERY[12..]);
    }

    #[test]
    fn test_parse_answer() {
        let (answer, end) = parse_address_answer(RESPONSE, 28).unwrap();
        assert_eq!(answer.name_ref, compressed_name(12));
        assert_eq!(answer.ttl, 300);
        assert_eq!(answer.address, Ipv4Addr::new(142, 250, 74, 14));
        assert_eq!(end, RESPONSE.len());
    }

    #[test]
    fn test_write_answer_matches_capture() {
        let answer = AddressAnswer {
            name_ref: compressed_name(12),
            ttl: 300,
            address: Ipv4Addr::new(142, 250, 74, 14),
        };
        let mut out = [0u8; A_ANSWER_LEN];
        answer.write_to(&mut out).unwrap();
        assert_eq!(&out[..], &RESPONSE[28..]);

        let mut short = [0u8; 10];
        assert_eq!(
            answer.write_to(&mut short),
            Err(WireError::ShortBuffer { needed: 16, actual: 10 })
        );
    }

    #[test]
    fn test_parse_answer_wrong_type() {
        let mut buf = RESPONSE.to_vec();
        buf[31] = 28;
        assert_eq!(
            parse_address_answer(&buf, 28),
            Err(WireError::UnexpectedRecord { rtype: 28, rdlength: 4 })
        );
    }
}
