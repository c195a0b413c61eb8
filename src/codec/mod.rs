//! Deterministic, loss-documented mapping between [`Sample`] and an on-wire
//! payload, parameterised by a static [`Mode`] shared by both endpoints.

mod raw;
mod zlib;

use crate::constants::{PAYLOAD_LEN_MAX, PAYLOAD_LEN_MIN};
use crate::error::LinkError;
use crate::sample::Sample;

/// Compression/encoding mode. The choice is static and identical at both
/// endpoints; the protocol never negotiates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Raw 32-byte struct, verbatim.
    None,
    /// Same wire representation as `None`; kept as a distinct variant so a
    /// caller can name "the reference encoding" explicitly.
    Raw,
    /// DEFLATE compression of the raw 32 bytes, at max level.
    Zlib,
    /// Stub for a future learned codec: 1 byte, the low 8 bits of `ts`.
    Bam,
    /// Fixed-size filler payload for link-layer PDR testing; ignores the
    /// sample entirely.
    Dummy(u8),
}

/// Result of decoding a payload. `Bam` and `Dummy` payloads are not
/// invertible to a full [`Sample`]; decoding them never fails, it just
/// yields a stub record instead of [`Decoded::Sample`].
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Sample(Sample),
    BamStub { code: u8 },
    DummyStub { len: usize },
}

/// Encode a sample into a wire payload for the given mode.
///
/// Never panics. Returns [`LinkError::InvariantViolation`] if the result
/// would exceed the maximum payload length — that indicates a misconfigured
/// mode, not a per-message condition.
pub fn encode(sample: &Sample, mode: Mode) -> Result<Vec<u8>, LinkError> {
    let payload = match mode {
        Mode::None | Mode::Raw => raw::pack(sample).to_vec(),
        Mode::Zlib => zlib::compress(&raw::pack(sample))
            .map_err(|e| LinkError::InvariantViolation(format!("zlib compress: {e}")))?,
        Mode::Bam => vec![(sample.ts as u32 & 0xFF) as u8],
        Mode::Dummy(n) => vec![0xCC; n as usize],
    };

    if payload.len() < PAYLOAD_LEN_MIN || payload.len() > PAYLOAD_LEN_MAX {
        return Err(LinkError::InvariantViolation(format!(
            "encoded payload length {} outside [{}, {}]",
            payload.len(),
            PAYLOAD_LEN_MIN,
            PAYLOAD_LEN_MAX
        )));
    }
    Ok(payload)
}

/// Decode a wire payload produced by [`encode`] with the same mode.
///
/// On any failure (length mismatch, decompression error) returns
/// [`LinkError::Undecodable`]; never panics.
pub fn decode(payload: &[u8], mode: Mode) -> Result<Decoded, LinkError> {
    match mode {
        Mode::None | Mode::Raw => raw::unpack(payload).map(Decoded::Sample),
        Mode::Zlib => {
            let raw_bytes = zlib::decompress(payload)
                .map_err(|e| LinkError::Undecodable(format!("zlib decompress: {e}")))?;
            raw::unpack(&raw_bytes).map(Decoded::Sample)
        }
        Mode::Bam => {
            let code = *payload
                .first()
                .ok_or_else(|| LinkError::Undecodable("empty bam payload".into()))?;
            Ok(Decoded::BamStub { code })
        }
        Mode::Dummy(_) => Ok(Decoded::DummyStub { len: payload.len() }),
    }
}
