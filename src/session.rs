//! High-level façades wiring the link state machines to their logging and
//! archival sinks — the single-threaded cooperative loops the CLI drives.

use crate::link::metrics::PdrCounters;
use crate::link::receiver::Receiver;
use crate::link::transmitter::{Outcome, Transmitter};
use crate::link::LinkConfig;
use crate::codec::Mode;
use crate::error::LinkError;
use crate::persistence::archive::PayloadArchive;
use crate::persistence::event_log::EventSink;
use crate::sample::SensorSource;
use crate::transport::SerialPort;

/// Drives repeated `send_message` calls against a sensor source, logging a
/// PDR summary as it goes.
pub struct TransmitterSession<T: SerialPort, E: EventSink> {
    transmitter: Transmitter<T, E>,
}

impl<T: SerialPort, E: EventSink> TransmitterSession<T, E> {
    pub fn new(transport: T, events: E, config: LinkConfig, mode: Mode) -> Self {
        Self {
            transmitter: Transmitter::new(transport, events, config, mode),
        }
    }

    pub fn metrics(&self) -> PdrCounters {
        self.transmitter.metrics()
    }

    /// Connect, then send `count` samples (or run forever if `None`),
    /// pacing by whatever the sensor source's `sample()` call costs.
    pub async fn run(
        &mut self,
        sensor: &mut dyn SensorSource,
        count: Option<usize>,
    ) -> Result<(), LinkError> {
        self.transmitter.connect().await?;

        let mut sent = 0usize;
        loop {
            if let Some(limit) = count {
                if sent >= limit {
                    break;
                }
            }
            let sample = sensor.sample();
            match self.transmitter.send_message(&sample).await? {
                Outcome::Delivered => {
                    crate::logging::log_info(&format!("seq {} delivered", self.transmitter.current_seq().wrapping_sub(1)));
                }
                Outcome::Dropped => {
                    crate::logging::log_warn(&format!("seq {} dropped", self.transmitter.current_seq().wrapping_sub(1)));
                }
            }
            sent += 1;
        }

        let metrics = self.transmitter.metrics();
        crate::logging::log_info(&format!(
            "session done: {}/{} delivered, PDR {:.2}%",
            metrics.delivered(),
            metrics.attempted(),
            metrics.pdr() * 100.0
        ));
        Ok(())
    }
}

/// Drives the receiver event loop, archiving every accepted message.
pub struct ReceiverSession<T: SerialPort, E: EventSink> {
    receiver: Receiver<T, E>,
    archive: PayloadArchive,
}

impl<T: SerialPort, E: EventSink> ReceiverSession<T, E> {
    pub fn new(transport: T, events: E, config: LinkConfig, mode: Mode, archive: PayloadArchive) -> Self {
        Self {
            receiver: Receiver::new(transport, events, config, mode),
            archive,
        }
    }

    /// Run the event loop until a transport-fatal error occurs.
    pub async fn run_forever(&mut self) -> Result<(), LinkError> {
        loop {
            if let Some(msg) = self.receiver.run_once().await? {
                if let Err(e) = self
                    .archive
                    .append(&msg.decoded, msg.seq, sample_ts(&msg.decoded), msg.rssi_dbm)
                {
                    crate::logging::log_error(&format!("archive write failed: {e}"));
                }
            }
        }
    }
}

fn sample_ts(decoded: &crate::codec::Decoded) -> Option<f64> {
    match decoded {
        crate::codec::Decoded::Sample(s) => Some(s.ts),
        _ => None,
    }
}
