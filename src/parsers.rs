use std::str;

use bytes::Bytes;
use nom::bytes::complete::take;
use nom::error::{ErrorKind, ParseError};
use nom::number::complete::{be_u16, be_u8};
use nom::{Err, IResult};

use crate::errors::DecodeError;

/// Every parser runs over a complete packet body, so running out of input is always a truncation.
impl<'a> ParseError<&'a [u8]> for DecodeError {
    fn from_error_kind(_: &'a [u8], _: ErrorKind) -> DecodeError {
        DecodeError::Truncated
    }

    fn append(_: &'a [u8], _: ErrorKind, other: DecodeError) -> DecodeError {
        other
    }
}

pub(crate) type ParserResult<'a, O> = IResult<&'a [u8], O, DecodeError>;

/// Fails the parse with a protocol error rather than a truncation.
pub(crate) fn failure<'a, O>(e: DecodeError) -> ParserResult<'a, O> {
    Err(Err::Failure(e))
}

pub(crate) fn byte(input: &[u8]) -> ParserResult<u8> {
    be_u8(input)
}

/// A two byte big endian integer.
pub(crate) fn uint16(input: &[u8]) -> ParserResult<u16> {
    be_u16(input)
}

pub(crate) fn packet_id(input: &[u8]) -> ParserResult<u16> {
    uint16(input)
}

fn length_data(input: &[u8]) -> ParserResult<&[u8]> {
    let (rest, len) = uint16(input)?;
    take(len)(rest)
}

/// A u16 length prefixed UTF-8 string.
pub(crate) fn mqtt_string(input: &[u8]) -> ParserResult<String> {
    let (rest, raw) = length_data(input)?;
    match str::from_utf8(raw) {
        Ok(s) => Ok((rest, s.to_owned())),
        Err(source) => failure(DecodeError::InvalidUtf8 { source }),
    }
}

/// u16 length prefixed binary data.
pub(crate) fn binary(input: &[u8]) -> ParserResult<Bytes> {
    let (rest, raw) = length_data(input)?;
    Ok((rest, Bytes::copy_from_slice(raw)))
}

/// Runs `parser` over a whole packet body, turning leftovers into `TrailingBytes`.
pub(crate) fn body<'a, O, F>(input: &'a [u8], parser: F) -> Result<O, DecodeError>
where
    F: FnOnce(&'a [u8]) -> ParserResult<'a, O>,
{
    match parser(input) {
        Ok((rest, _)) if !rest.is_empty() => Err(DecodeError::TrailingBytes { count: rest.len() }),
        Ok((_, out)) => Ok(out),
        Err(Err::Incomplete(_)) => Err(DecodeError::Truncated),
        Err(Err::Error(e)) | Err(Err::Failure(e)) => Err(e),
    }
}
