pub mod frame;
pub mod metrics;
pub mod receiver;
pub mod transmitter;

use std::time::Duration;

/// Retry budgets and timeouts shared by both link state machines.
///
/// **Reliable mode** sets `retry_permit`/`retry_data` above 1 so a lost
/// response is retried. **PDR mode** sets both to 1, so each message is
/// attempted exactly once and the Delivered count over N attempts is the
/// directly observed Packet Delivery Ratio.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    pub retry_handshake: u32,
    pub retry_permit: u32,
    pub retry_data: u32,
    /// Coarse per-response timeout.
    pub response_timeout: Duration,
    /// Fine-grained timeout between bytes of a multi-byte read.
    pub inter_byte_timeout: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            retry_handshake: 5,
            retry_permit: 3,
            retry_data: 3,
            response_timeout: Duration::from_secs(2),
            inter_byte_timeout: Duration::from_millis(100),
        }
    }
}

impl LinkConfig {
    /// Single-attempt retry budgets for directly observing PDR.
    pub fn pdr_mode(mut self) -> Self {
        self.retry_permit = 1;
        self.retry_data = 1;
        self
    }
}
