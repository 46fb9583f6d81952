//! Variable length encoding of the fixed header's remaining length.
//!
//! Seven bits of value per byte, least significant group first, with the high bit flagging that another byte
//! follows. At most four bytes are allowed, which caps the value at 268,435,455.

use bytes::BufMut;
use snafu::ensure;

use crate::errors::*;

/// Largest value a remaining length can hold.
pub const MAX_REMAINING_LENGTH: u32 = 268_435_455;

const MAX_BYTES: usize = 4;

/// How decoding treats encodings that use more bytes than the value needs, e.g. `[0x80, 0x00]` for zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LengthPolicy {
    /// Reject with `DecodeError::NonMinimalLength`.
    Strict,
    /// Accept the value as encoded.
    Lenient,
}

impl Default for LengthPolicy {
    fn default() -> LengthPolicy {
        LengthPolicy::Strict
    }
}

/// Writes `value` to `out`, returning the number of bytes used.
pub fn encode<B: BufMut>(value: usize, out: &mut B) -> Result<usize, EncodeError> {
    ensure!(value <= MAX_REMAINING_LENGTH as usize, LengthOverflow { value });

    let mut val = value;
    let mut written = 0;
    loop {
        let mut enc_byte: u8 = (val % 128) as u8;
        val /= 128;
        if val > 0 {
            enc_byte |= 128;
        }
        out.put_u8(enc_byte);
        written += 1;
        if val == 0 {
            break;
        }
    }
    Ok(written)
}

/// Number of bytes `encode` would write for `value`.
pub fn encoded_len(value: usize) -> Result<usize, EncodeError> {
    match value {
        0..=127 => Ok(1),
        128..=16_383 => Ok(2),
        16_384..=2_097_151 => Ok(3),
        2_097_152..=268_435_455 => Ok(4),
        _ => LengthOverflow { value }.fail(),
    }
}

/// Decodes a remaining length from the front of `input`, rejecting non-minimal encodings.
///
/// Returns the value and the number of bytes it occupied. Running out of input before the terminating byte is
/// a `MalformedLength`, since the caller is expected to hand over the whole header.
pub fn decode(input: &[u8]) -> Result<(u32, usize), DecodeError> {
    decode_with(input, LengthPolicy::Strict)
}

/// Like [`decode`], with an explicit policy for non-minimal encodings.
pub fn decode_with(input: &[u8], policy: LengthPolicy) -> Result<(u32, usize), DecodeError> {
    scan(input, policy)?.ok_or(DecodeError::MalformedLength)
}

/// Decodes a remaining length from a buffer that may not hold all of it yet.
///
/// `Ok(None)` means more bytes are needed.
pub fn scan(input: &[u8], policy: LengthPolicy) -> Result<Option<(u32, usize)>, DecodeError> {
    let mut value: u32 = 0;
    let mut multiplier: u32 = 1;

    for (i, &b) in input.iter().take(MAX_BYTES).enumerate() {
        value += (b as u32 & 127) * multiplier;

        if b & 128 == 0 {
            let consumed = i + 1;
            if policy == LengthPolicy::Strict && consumed > 1 && b == 0 {
                return NonMinimalLength { value }.fail();
            }
            return Ok(Some((value, consumed)));
        }

        multiplier *= 128;
    }

    ensure!(input.len() < MAX_BYTES, MalformedLength);
    Ok(None)
}
