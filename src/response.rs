//! Turning an intercepted query into the reply sent back to its sender.

use std::net::Ipv4Addr;

use tracing::debug;

use crate::error::Result;
use crate::header::{
    check_query, set_additional_count, set_answer_count, set_qr, set_question_count, set_rcode,
    DnsHeader, ResponseCode, HEADER_LEN,
};
use crate::name::compressed_name;
use crate::record::{parse_question, AddressAnswer, Question, A_ANSWER_LEN};

/// A validated query and where its first question ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub header: DnsHeader,
    pub question: Question,
    pub question_end: usize,
}

pub fn parse_query(data: &[u8]) -> Result<Query> {
    let header = check_query(data)?;
    let (question, question_end) = parse_question(data, HEADER_LEN)?;
    Ok(Query {
        header,
        question,
        question_end,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Answer with an empty response carrying this code.
    Code(ResponseCode),
    /// Answer NOERROR with one A record for the queried name.
    Address { address: Ipv4Addr, ttl: u32 },
}

/// Builds the reply to `query`: its header and first question, with QR set,
/// RCODE filled in and, for [`Reply::Address`], one answer pointing back at
/// the question name.
pub fn build_response(query: &[u8], reply: &Reply) -> Result<Vec<u8>> {
    let parsed = parse_query(query)?;

    let mut out = Vec::with_capacity(parsed.question_end + A_ANSWER_LEN);
    out.extend_from_slice(&query[..parsed.question_end]);
    set_question_count(&mut out, 1)?;
    set_additional_count(&mut out, 0)?;
    set_qr(&mut out)?;

    match *reply {
        Reply::Code(code) => set_rcode(&mut out, code.into())?,
        Reply::Address { address, ttl } => {
            set_rcode(&mut out, ResponseCode::NoError.into())?;
            set_answer_count(&mut out, 1)?;
            let answer = AddressAnswer {
                name_ref: compressed_name(HEADER_LEN as u8),
                ttl,
                address,
            };
            let pos = out.len();
            out.resize(pos + A_ANSWER_LEN, 0);
            answer.write_to(&mut out[pos..])?;
        }
    }

    debug!(
        id = parsed.header.id,
        name = %parsed.question.name,
        ?reply,
        "built response"
    );
    Ok(out)
}
