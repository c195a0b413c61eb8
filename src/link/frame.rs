//! On-wire unit definitions and classification.
//!
//! A unit on the wire is one of: a handshake beacon, a 2-byte control
//! packet, or a data frame `LENGTH | SEQ | PAYLOAD`. Classification looks
//! only at the leading byte(s); it never looks behind the current unit.

use crate::constants::{
    CTRL_DATA_ACK, CTRL_HANDSHAKE_ACK, CTRL_PERMIT, CTRL_QUERY, DATA_LENGTH_MAX, DATA_LENGTH_MIN,
};
use crate::error::LinkError;
use bytes::BufMut;
use nom::bytes::complete::tag;
use nom::number::complete::u8 as nom_u8;
use nom::IResult;

/// A 2-byte control packet: `TYPE | SEQ`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlPacket {
    pub ty: u8,
    pub seq: u8,
}

impl ControlPacket {
    pub fn new(ty: u8, seq: u8) -> Self {
        Self { ty, seq }
    }

    pub fn pack(self) -> [u8; 2] {
        [self.ty, self.seq]
    }

    pub fn is_known_type(ty: u8) -> bool {
        matches!(ty, CTRL_HANDSHAKE_ACK | CTRL_QUERY | CTRL_PERMIT | CTRL_DATA_ACK)
    }
}

/// A data frame payload, already stripped of its `LENGTH` byte.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub seq: u8,
    pub payload: Vec<u8>,
}

/// What the leading byte of an incoming unit indicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadByte {
    /// A control TYPE byte; one more byte (SEQ) follows.
    Control(u8),
    /// A data `LENGTH` byte; `LENGTH` more bytes (SEQ + payload) follow.
    DataLength(u8),
    /// The first byte of the handshake beacon (`'S'`); 4 more bytes expected.
    SynLead,
    /// Neither: discard and continue scanning.
    Garbage(u8),
}

/// Classify a single leading byte. Pure function, no I/O.
pub fn classify(b: u8) -> LeadByte {
    if ControlPacket::is_known_type(b) {
        LeadByte::Control(b)
    } else if (DATA_LENGTH_MIN..=DATA_LENGTH_MAX).contains(&b) {
        LeadByte::DataLength(b)
    } else if b == crate::constants::SYN_BEACON[0] {
        LeadByte::SynLead
    } else {
        LeadByte::Garbage(b)
    }
}

/// Pack `(seq, payload)` into the wire bytes `[length, seq, payload...]`.
///
/// `payload.len()` must be in `[1, 56]`; callers (the codec) are responsible
/// for that invariant before reaching the framer.
pub fn pack_data_frame(seq: u8, payload: &[u8]) -> Vec<u8> {
    let length = 1 + payload.len() as u8;
    let mut buf = bytes::BytesMut::with_capacity(2 + payload.len());
    buf.put_u8(length);
    buf.put_u8(seq);
    buf.put_slice(payload);
    buf.to_vec()
}

/// Parse the remainder of a control packet (just the SEQ byte).
pub fn parse_control_seq(input: &[u8]) -> IResult<&[u8], u8> {
    nom_u8(input)
}

/// Parse the remainder of a data frame body: `SEQ | PAYLOAD[len-1]`.
pub fn parse_data_body(input: &[u8], length: u8) -> Result<Frame, LinkError> {
    fn parser(input: &[u8], body_len: usize) -> IResult<&[u8], (u8, &[u8])> {
        let (input, seq) = nom_u8(input)?;
        let (input, payload) = nom::bytes::complete::take(body_len)(input)?;
        Ok((input, (seq, payload)))
    }

    let body_len = length as usize - 1;
    match parser(input, body_len) {
        Ok((_, (seq, payload))) => Ok(Frame {
            seq,
            payload: payload.to_vec(),
        }),
        Err(_) => Err(LinkError::FrameMalformed(format!(
            "short read: expected {} body bytes",
            length
        ))),
    }
}

/// Parse the trailing `"YN\r\n"` of a handshake beacon, given the leading
/// `'S'` byte has already been consumed.
pub fn parse_syn_tail(input: &[u8]) -> IResult<&[u8], &[u8]> {
    tag(&crate::constants::SYN_BEACON[1..])(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SYN_BEACON;

    #[test]
    fn classifier_disjointness() {
        for ty in [0x00u8, 0x50, 0x55, 0xAA] {
            assert!(matches!(classify(ty), LeadByte::Control(_)));
        }
        for len in 2u8..=57 {
            assert!(matches!(classify(len), LeadByte::DataLength(_)));
        }
    }

    #[test]
    fn garbage_bytes_are_discarded() {
        for b in [0x01u8, 0x58, 0x99, 0xFF] {
            assert!(matches!(classify(b), LeadByte::Garbage(_)));
        }
    }

    #[test]
    fn pack_data_frame_round_trips() {
        let payload = vec![0xCCu8; 8];
        let wire = pack_data_frame(0x2A, &payload);
        assert_eq!(wire[0], 9);
        assert_eq!(wire[1], 0x2A);
        let frame = parse_data_body(&wire[2..], wire[0]).unwrap();
        assert_eq!(frame.seq, 0x2A);
        assert_eq!(frame.payload, payload);
    }

    #[test]
    fn syn_beacon_tail_parses() {
        let (rest, _) = parse_syn_tail(&SYN_BEACON[1..]).unwrap();
        assert!(rest.is_empty());
    }

    #[test]
    fn short_read_is_frame_malformed() {
        let err = parse_data_body(&[0x2A], 9).unwrap_err();
        assert!(matches!(err, LinkError::FrameMalformed(_)));
    }
}
