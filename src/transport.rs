//! Serial transport adapter.
//!
//! Wraps the physical serial/LoRa radio handle (out of scope: specified only
//! by interface) with the primitives the link state machines need:
//! timed reads, a blocking write, and input-buffer reset for
//! resynchronisation.

use crate::error::LinkError;
use async_trait::async_trait;
use std::time::Duration;

/// Byte-stream transport with read-with-timeout and write semantics.
#[async_trait]
pub trait SerialPort: Send {
    /// Write `buf` to the wire, followed by a flush. Blocks until complete.
    async fn write_all(&mut self, buf: &[u8]) -> Result<(), LinkError>;

    /// Read exactly one byte, or time out.
    async fn read_one_timeout(&mut self, timeout: Duration) -> Result<Option<u8>, LinkError>;

    /// Read exactly `n` bytes, honoring an inter-byte timeout between each
    /// byte. Returns `Ok(None)` on a short read (the caller treats this as
    /// [`LinkError::FrameMalformed`] and resynchronises).
    async fn read_exact_timeout(
        &mut self,
        n: usize,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>, LinkError>;

    /// Discard any bytes currently buffered by the transport, to
    /// resynchronise after a malformed frame.
    fn reset_input_buffer(&mut self);

    /// Whether the radio is configured to append a trailing RSSI byte after
    /// each data frame.
    fn rssi_trailer(&self) -> bool {
        false
    }
}

/// Convert a raw RSSI byte to dBm: `rssi_dbm = -(256 - raw)`.
pub fn rssi_from_raw(raw: u8) -> i32 {
    -(256 - raw as i32)
}

pub mod tokio_serial_port {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio_serial::SerialStream;

    /// A [`SerialPort`] backed by a real OS serial device via `tokio-serial`.
    pub struct TokioSerialPort {
        stream: SerialStream,
        rssi_trailer: bool,
    }

    impl TokioSerialPort {
        pub fn open(path: &str, baud_rate: u32, rssi_trailer: bool) -> Result<Self, LinkError> {
            let stream = tokio_serial::new(path, baud_rate)
                .open_native_async()
                .map_err(|e| LinkError::TransportFatal(format!("open {path}: {e}")))?;
            Ok(Self { stream, rssi_trailer })
        }
    }

    #[async_trait]
    impl SerialPort for TokioSerialPort {
        async fn write_all(&mut self, buf: &[u8]) -> Result<(), LinkError> {
            self.stream
                .write_all(buf)
                .await
                .map_err(|e| LinkError::TransportFatal(e.to_string()))?;
            self.stream
                .flush()
                .await
                .map_err(|e| LinkError::TransportFatal(e.to_string()))
        }

        async fn read_one_timeout(&mut self, timeout: Duration) -> Result<Option<u8>, LinkError> {
            let mut b = [0u8; 1];
            match tokio::time::timeout(timeout, self.stream.read_exact(&mut b)).await {
                Ok(Ok(_)) => Ok(Some(b[0])),
                Ok(Err(e)) => Err(LinkError::TransportFatal(e.to_string())),
                Err(_) => Ok(None),
            }
        }

        async fn read_exact_timeout(
            &mut self,
            n: usize,
            timeout: Duration,
        ) -> Result<Option<Vec<u8>>, LinkError> {
            let mut buf = vec![0u8; n];
            match tokio::time::timeout(timeout, self.stream.read_exact(&mut buf)).await {
                Ok(Ok(_)) => Ok(Some(buf)),
                Ok(Err(_)) => Ok(None),
                Err(_) => Ok(None),
            }
        }

        fn reset_input_buffer(&mut self) {
            let _ = self.stream.clear(tokio_serial::ClearBuffer::Input);
        }

        fn rssi_trailer(&self) -> bool {
            self.rssi_trailer
        }
    }
}
