//! The fixed 12-byte message header.
//!
//! ```text
//!   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! |                      ID                       |
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! |QR|   Opcode  |AA|TC|RD|RA|   Z    |   RCODE   |
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! |           QDCOUNT / ANCOUNT / NSCOUNT / ARCOUNT |
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! ```
//!
//! Everything here reads or writes big-endian fields at fixed offsets of a
//! caller-owned buffer, after checking the buffer holds a whole header.

use std::convert::TryFrom;

use nom::number::complete::be_u16;
use nom::IResult;
use tracing::{debug, trace};

use crate::error::{QueryViolation, Result, WireError};

pub const HEADER_LEN: usize = 12;

pub const ID_OFFSET: usize = 0;
pub const FLAGS1_OFFSET: usize = 2;
pub const FLAGS2_OFFSET: usize = 3;
pub const QDCOUNT_OFFSET: usize = 4;
pub const ANCOUNT_OFFSET: usize = 6;
pub const NSCOUNT_OFFSET: usize = 8;
pub const ARCOUNT_OFFSET: usize = 10;

// flags1: QR | Opcode(4) | AA | TC | RD
pub const DNS_QR: u8 = 0x80;
pub const DNS_TC: u8 = 0x02;
// flags2: RA | Z(3) | RCODE(4)
pub const DNS_RA: u8 = 0x80;
pub const DNS_Z: u8 = 0x70;
pub const DNS_RCODE: u8 = 0x0F;

pub const MAX_RCODE: u8 = 5;

/// Room for the decimal transaction id plus a terminator.
pub const ID_STR_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DnsHeader {
    pub id: u16,

    pub message_type: u8,
    pub opcode: u8,
    pub authoritative_answer: u8,
    pub truncated_message: u8,
    pub recursion_desired: u8,
    pub recursion_available: u8,
    pub zz: u8,  // reserved as 0, three bits
    pub rescode: u8,

    pub questions: u16,
    pub answers: u16,
    pub authorities: u16,
    pub resources: u16,
}

pub fn parse_dns_header(input: &[u8]) -> IResult<&[u8], DnsHeader> {
    do_parse!(input,
        id: be_u16 >>
        b0: bits!(tuple!(
            take_bits!(1u8), // message_type
            take_bits!(4u8), // opcode
            take_bits!(1u8), // authoritative_answer
            take_bits!(1u8), // truncated_message
            take_bits!(1u8), // recursion_desired
            take_bits!(1u8), // recursion_available
            take_bits!(3u8), // zz
            take_bits!(4u8)  // rescode
        )) >>
        questions: be_u16 >>
        answers: be_u16 >>
        authorities: be_u16 >>
        resources: be_u16 >>
        (
            DnsHeader {
                id,
                message_type: b0.0,
                opcode: b0.1,
                authoritative_answer: b0.2,
                truncated_message: b0.3,
                recursion_desired: b0.4,
                recursion_available: b0.5,
                zz: b0.6,
                rescode: b0.7,
                questions,
                answers,
                authorities,
                resources,
            }
        )
    )
}

impl DnsHeader {
    /// Re-emits the header exactly as it sits on the wire.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[ID_OFFSET..ID_OFFSET + 2].copy_from_slice(&self.id.to_be_bytes());
        out[FLAGS1_OFFSET] = (self.message_type << 7)
            | (self.opcode << 3)
            | (self.authoritative_answer << 2)
            | (self.truncated_message << 1)
            | self.recursion_desired;
        out[FLAGS2_OFFSET] = (self.recursion_available << 7) | (self.zz << 4) | self.rescode;
        out[QDCOUNT_OFFSET..QDCOUNT_OFFSET + 2].copy_from_slice(&self.questions.to_be_bytes());
        out[ANCOUNT_OFFSET..ANCOUNT_OFFSET + 2].copy_from_slice(&self.answers.to_be_bytes());
        out[NSCOUNT_OFFSET..NSCOUNT_OFFSET + 2].copy_from_slice(&self.authorities.to_be_bytes());
        out[ARCOUNT_OFFSET..ARCOUNT_OFFSET + 2].copy_from_slice(&self.resources.to_be_bytes());
        out
    }

    /// The first query invariant this header breaks, if any.
    pub fn query_violation(&self) -> Option<QueryViolation> {
        if self.message_type != 0 {
            Some(QueryViolation::ResponseFlagSet)
        } else if self.zz != 0 {
            Some(QueryViolation::ReservedBitsSet)
        } else if self.questions == 0 {
            Some(QueryViolation::NoQuestions)
        } else if self.answers != 0 {
            Some(QueryViolation::AnswersPresent)
        } else if self.authorities != 0 {
            Some(QueryViolation::AuthoritiesPresent)
        } else {
            None
        }
    }
}

/// Accepts `data` only if it starts with the header of an answerable query.
///
/// Never looks past the first 12 bytes.
pub fn check_query(data: &[u8]) -> Result<DnsHeader> {
    ensure_header(data)?;
    let (_, header) = parse_dns_header(data)?;
    if let Some(violation) = header.query_violation() {
        debug!(id = header.id, %violation, "rejecting message");
        return Err(WireError::NotAQuery(violation));
    }
    trace!(id = header.id, questions = header.questions, "accepted query header");
    Ok(header)
}

pub fn is_query(data: &[u8]) -> bool {
    check_query(data).is_ok()
}

fn ensure_header(data: &[u8]) -> Result<()> {
    if data.len() < HEADER_LEN {
        return Err(WireError::ShortBuffer {
            needed: HEADER_LEN,
            actual: data.len(),
        });
    }
    Ok(())
}

fn read_u16(data: &[u8], offset: usize) -> Result<u16> {
    ensure_header(data)?;
    Ok(u16::from_be_bytes([data[offset], data[offset + 1]]))
}

fn write_u16(data: &mut [u8], offset: usize, value: u16) -> Result<()> {
    ensure_header(data)?;
    data[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
    Ok(())
}

pub fn id(data: &[u8]) -> Result<u16> {
    read_u16(data, ID_OFFSET)
}

pub fn set_id(data: &mut [u8], id: u16) -> Result<()> {
    write_u16(data, ID_OFFSET, id)
}

/// Decimal transaction id, at most `ID_STR_LEN - 1` digits.
pub fn id_string(data: &[u8]) -> Result<String> {
    let mut s = id(data)?.to_string();
    s.truncate(ID_STR_LEN - 1);
    Ok(s)
}

pub fn qr(data: &[u8]) -> Result<u8> {
    ensure_header(data)?;
    Ok((data[FLAGS1_OFFSET] & DNS_QR) >> 7)
}

/// Marks the message as a response.
pub fn set_qr(data: &mut [u8]) -> Result<()> {
    ensure_header(data)?;
    data[FLAGS1_OFFSET] |= DNS_QR;
    Ok(())
}

pub fn tc(data: &[u8]) -> Result<u8> {
    ensure_header(data)?;
    Ok((data[FLAGS1_OFFSET] & DNS_TC) >> 1)
}

pub fn set_tc(data: &mut [u8]) -> Result<()> {
    ensure_header(data)?;
    data[FLAGS1_OFFSET] |= DNS_TC;
    Ok(())
}

pub fn rcode(data: &[u8]) -> Result<u8> {
    ensure_header(data)?;
    Ok(data[FLAGS2_OFFSET] & DNS_RCODE)
}

/// Replaces the RCODE nibble, leaving RA and Z alone.
///
/// Codes above `MAX_RCODE` are refused and the buffer is left untouched.
pub fn set_rcode(data: &mut [u8], rcode: u8) -> Result<()> {
    if rcode > MAX_RCODE {
        debug!(rcode, "refusing out-of-range response code");
        return Err(WireError::RcodeOutOfRange(rcode));
    }
    ensure_header(data)?;
    data[FLAGS2_OFFSET] = (data[FLAGS2_OFFSET] & !DNS_RCODE) | rcode;
    Ok(())
}

pub fn question_count(data: &[u8]) -> Result<u16> {
    read_u16(data, QDCOUNT_OFFSET)
}

pub fn set_question_count(data: &mut [u8], count: u16) -> Result<()> {
    write_u16(data, QDCOUNT_OFFSET, count)
}

pub fn set_answer_count(data: &mut [u8], count: u16) -> Result<()> {
    write_u16(data, ANCOUNT_OFFSET, count)
}

pub fn set_additional_count(data: &mut [u8], count: u16) -> Result<()> {
    write_u16(data, ARCOUNT_OFFSET, count)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ResponseCode {
    NoError = 0,
    FormErr = 1,
    ServFail = 2,
    NxDomain = 3,
    NotImp = 4,
    Refused = 5,
}

impl TryFrom<u8> for ResponseCode {
    type Error = WireError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(ResponseCode::NoError),
            1 => Ok(ResponseCode::FormErr),
            2 => Ok(ResponseCode::ServFail),
            3 => Ok(ResponseCode::NxDomain),
            4 => Ok(ResponseCode::NotImp),
            5 => Ok(ResponseCode::Refused),
            _ => Err(WireError::RcodeOutOfRange(value)),
        }
    }
}

impl From<ResponseCode> for u8 {
    fn from(code: ResponseCode) -> u8 {
        code as u8
    }
}
