//! Side-effect-only observers on link state transitions: PDR counters and
//! RSSI bookkeeping. Never drive protocol decisions themselves.

/// Packet Delivery Ratio counters, Delivered / Attempted.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdrCounters {
    attempted: u64,
    delivered: u64,
}

impl PdrCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_attempt(&mut self) {
        self.attempted += 1;
    }

    pub fn record_delivered(&mut self) {
        self.delivered += 1;
    }

    pub fn attempted(&self) -> u64 {
        self.attempted
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// PDR as a fraction in `[0.0, 1.0]`. `0.0` when nothing has been
    /// attempted yet.
    pub fn pdr(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.delivered as f64 / self.attempted as f64
        }
    }
}

/// Receiver-side reception counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReceptionCounters {
    pub received: u64,
}
