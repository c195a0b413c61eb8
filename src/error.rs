//! # Link Error Handling
//!
//! This module defines the `LinkError` enum, which represents the different error
//! types that can occur in the lora-link crate.

use thiserror::Error;

/// Represents the different error types that can occur on the link.
///
/// Only [`LinkError::TransportFatal`] and [`LinkError::HandshakeExhausted`] ever
/// escape the state machines to a caller; every other variant is consumed
/// internally and converted into a retry decision plus a logged event.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The serial handle cannot be opened or has become unusable.
    #[error("transport unusable: {0}")]
    TransportFatal(String),

    /// Handshake retry budget was consumed without a valid Handshake ACK.
    #[error("handshake retry budget exhausted")]
    HandshakeExhausted,

    /// A control packet could not be parsed as a well-formed response.
    #[error("response unparseable: {0}")]
    ResponseUnparseable(String),

    /// `LENGTH` was out of range, or a short read occurred during the body.
    #[error("malformed frame: {0}")]
    FrameMalformed(String),

    /// A payload survived framing but failed codec decode.
    #[error("undecodable payload: {0}")]
    Undecodable(String),

    /// An internal invariant was violated (e.g. codec produced an oversized payload).
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}
