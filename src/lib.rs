//! Wire-level DNS codec for intercepting queries and answering them in place.
//!
//! Every function works on a caller-owned byte buffer holding one message and
//! keeps no state between calls.

#[macro_use] extern crate nom;

pub mod error;
pub mod header;
pub mod name;
pub mod record;
pub mod response;

pub use error::{QueryViolation, Result, WireError};
pub use header::{check_query, is_query, DnsHeader, ResponseCode, HEADER_LEN};
pub use name::{compressed_name, decode_name, encode_name, encode_name_into};
pub use record::{parse_address_answer, parse_question, AddressAnswer, Question};
pub use response::{build_response, parse_query, Query, Reply};
