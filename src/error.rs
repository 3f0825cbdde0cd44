use nom::error::{ErrorKind, ParseError};
use thiserror::Error;

/// The query invariant a message failed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryViolation {
    #[error("QR bit is set (message is a response)")]
    ResponseFlagSet,

    #[error("reserved Z bits are non-zero")]
    ReservedBitsSet,

    #[error("question count is zero")]
    NoQuestions,

    #[error("answer count is non-zero")]
    AnswersPresent,

    #[error("authority count is non-zero")]
    AuthoritiesPresent,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("buffer too short: need {needed} bytes, have {actual}")]
    ShortBuffer { needed: usize, actual: usize },

    #[error("message truncated")]
    Truncated,

    #[error("not an answerable query: {0}")]
    NotAQuery(QueryViolation),

    #[error("label of {len} bytes exceeds 63")]
    LabelTooLong { len: usize },

    #[error("name of {len} bytes exceeds 255")]
    NameTooLong { len: usize },

    #[error("empty label in name")]
    EmptyLabel,

    #[error("label byte 0x{0:02x} is not printable ASCII or is a dot")]
    InvalidLabelByte(u8),

    #[error("compression pointer to offset {offset} is not decoded")]
    CompressionPointer { offset: u16 },

    #[error("reserved label type 0x{0:02x}")]
    ReservedLabelType(u8),

    #[error("expected an IN A record, found type {rtype} with {rdlength} bytes of data")]
    UnexpectedRecord { rtype: u16, rdlength: u16 },

    #[error("response code {0} is outside 0..=5")]
    RcodeOutOfRange(u8),
}

pub type Result<T> = std::result::Result<T, WireError>;

impl<I> ParseError<I> for WireError {
    fn from_error_kind(_input: I, _kind: ErrorKind) -> Self {
        WireError::Truncated
    }

    fn append(_input: I, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

impl<E> From<nom::Err<E>> for WireError
where
    E: Into<WireError>,
{
    fn from(e: nom::Err<E>) -> Self {
        match e {
            nom::Err::Incomplete(_) => WireError::Truncated,
            nom::Err::Error(e) | nom::Err::Failure(e) => e.into(),
        }
    }
}

impl<I> From<(I, ErrorKind)> for WireError {
    fn from(_: (I, ErrorKind)) -> Self {
        WireError::Truncated
    }
}
