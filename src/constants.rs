//! Wire-format constants for the link-layer protocol.

/// Handshake beacon, Transmitter -> Receiver: `"SYN\r\n"`.
pub const SYN_BEACON: [u8; 5] = [0x53, 0x59, 0x4E, 0x0D, 0x0A];

/// Control TYPE: Handshake ACK, Receiver -> Transmitter, SEQ always 0x00.
pub const CTRL_HANDSHAKE_ACK: u8 = 0x00;
/// Control TYPE: Query (send request), Transmitter -> Receiver.
pub const CTRL_QUERY: u8 = 0x50;
/// Control TYPE: Send permit, Receiver -> Transmitter.
pub const CTRL_PERMIT: u8 = 0x55;
/// Control TYPE: Data ACK, Receiver -> Transmitter.
pub const CTRL_DATA_ACK: u8 = 0xAA;

/// Minimum value of a data frame `LENGTH` byte (SEQ + 1-byte payload).
pub const DATA_LENGTH_MIN: u8 = 2;
/// Maximum value of a data frame `LENGTH` byte (SEQ + 56-byte payload).
pub const DATA_LENGTH_MAX: u8 = 57;

/// Minimum payload length in bytes.
pub const PAYLOAD_LEN_MIN: usize = 1;
/// Maximum payload length in bytes.
pub const PAYLOAD_LEN_MAX: usize = 56;

/// Exact encoded length of the "raw"/"none" codec payload.
pub const RAW_PAYLOAD_LEN: usize = 32;

/// Number of consecutive unexpected SYNs, while `Connected`, that forces
/// the receiver back to `AwaitingSyn`.
pub const RE_HANDSHAKE_THRESHOLD: u8 = 3;

/// Scale factors applied to the raw codec's scaled `i16` fields.
pub mod scale {
    pub const ACCEL: f64 = 1000.0;
    pub const GYRO: f64 = 10.0;
    pub const ATTITUDE: f64 = 10.0;
    pub const ALTITUDE: f64 = 10.0;
}
