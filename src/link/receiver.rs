//! Receiver event loop: classifies each incoming unit and emits the
//! appropriate control packet, symmetric to [`super::transmitter::Transmitter`].

use super::frame::{classify, parse_data_body, ControlPacket, LeadByte};
use super::metrics::ReceptionCounters;
use super::LinkConfig;
use crate::codec::{decode, Decoded, Mode};
use crate::constants::{
    CTRL_DATA_ACK, CTRL_HANDSHAKE_ACK, CTRL_PERMIT, CTRL_QUERY, RE_HANDSHAKE_THRESHOLD, SYN_BEACON,
};
use crate::error::LinkError;
use crate::persistence::event_log::{EventRecord, EventSink, EventType};
use crate::transport::{rssi_from_raw, SerialPort};

/// Receiver session phase. Initial state is `AwaitingSyn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingSyn,
    Connected,
}

/// An accepted data frame, decoded and ready for archival.
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    pub seq: u8,
    pub decoded: Decoded,
    pub rssi_dbm: Option<i32>,
}

/// Drives the receiver side of the link over a [`SerialPort`].
pub struct Receiver<T: SerialPort, E: EventSink> {
    transport: T,
    events: E,
    config: LinkConfig,
    mode: Mode,
    phase: Phase,
    consecutive_unexpected_syn: u8,
    counters: ReceptionCounters,
}

impl<T: SerialPort, E: EventSink> Receiver<T, E> {
    pub fn new(transport: T, events: E, config: LinkConfig, mode: Mode) -> Self {
        Self {
            transport,
            events,
            config,
            mode,
            phase: Phase::AwaitingSyn,
            consecutive_unexpected_syn: 0,
            counters: ReceptionCounters::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn counters(&self) -> ReceptionCounters {
        self.counters
    }

    /// Process one incoming unit. Returns `Ok(Some(_))` when a data frame
    /// was accepted (and ACKed); `Ok(None)` for everything else, including a
    /// read timeout with nothing to classify.
    pub async fn run_once(&mut self) -> Result<Option<ReceivedMessage>, LinkError> {
        let lead = match self
            .transport
            .read_one_timeout(self.config.response_timeout)
            .await?
        {
            Some(b) => b,
            None => return Ok(None),
        };

        match classify(lead) {
            LeadByte::SynLead => self.handle_syn().await,
            LeadByte::Control(ty) => self.handle_control(ty).await,
            LeadByte::DataLength(length) => self.handle_data(length).await,
            LeadByte::Garbage(_) => Ok(None),
        }
    }

    async fn handle_syn(&mut self) -> Result<Option<ReceivedMessage>, LinkError> {
        let tail = self
            .transport
            .read_exact_timeout(4, self.config.inter_byte_timeout)
            .await?;

        let Some(tail) = tail else {
            return Ok(None);
        };
        if tail.as_slice() != &SYN_BEACON[1..] {
            // Lead byte happened to be 'S' but wasn't a real beacon.
            return Ok(None);
        }

        self.transport
            .write_all(&ControlPacket::new(CTRL_HANDSHAKE_ACK, 0x00).pack())
            .await?;

        if self.phase == Phase::AwaitingSyn {
            self.phase = Phase::Connected;
            self.consecutive_unexpected_syn = 0;
            self.events
                .log_rx_event(EventRecord::new(0, 1, EventType::HandshakeAckOk));
        } else {
            self.consecutive_unexpected_syn += 1;
            if self.consecutive_unexpected_syn >= RE_HANDSHAKE_THRESHOLD {
                self.phase = Phase::AwaitingSyn;
                self.consecutive_unexpected_syn = 0;
            }
        }
        Ok(None)
    }

    async fn handle_control(&mut self, ty: u8) -> Result<Option<ReceivedMessage>, LinkError> {
        let seq = match self
            .transport
            .read_one_timeout(self.config.inter_byte_timeout)
            .await?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if self.phase != Phase::Connected {
            return Ok(None);
        }
        self.consecutive_unexpected_syn = 0;

        if ty == CTRL_QUERY {
            self.transport
                .write_all(&ControlPacket::new(CTRL_PERMIT, seq).pack())
                .await?;
            self.events
                .log_rx_event(EventRecord::new(seq, 1, EventType::PermitAckOk));
        }
        Ok(None)
    }

    async fn handle_data(&mut self, length: u8) -> Result<Option<ReceivedMessage>, LinkError> {
        let body_len = length as usize - 1;
        let body = self
            .transport
            .read_exact_timeout(body_len, self.config.inter_byte_timeout)
            .await?;

        let Some(body) = body else {
            self.transport.reset_input_buffer();
            return Ok(None);
        };

        let frame = match parse_data_body(&body, length) {
            Ok(f) => f,
            Err(_) => {
                self.transport.reset_input_buffer();
                return Ok(None);
            }
        };

        let rssi_dbm = if self.transport.rssi_trailer() {
            self.transport
                .read_one_timeout(self.config.inter_byte_timeout)
                .await?
                .map(rssi_from_raw)
        } else {
            None
        };

        if self.phase != Phase::Connected {
            return Ok(None);
        }
        self.consecutive_unexpected_syn = 0;

        // Emit the ACK before decoding, so ACK latency is bounded by the
        // link, not by codec cost.
        self.transport
            .write_all(&ControlPacket::new(CTRL_DATA_ACK, frame.seq).pack())
            .await?;
        self.events
            .log_rx_event(EventRecord::new(frame.seq, 1, EventType::DataAckOk));
        self.counters.received += 1;

        match decode(&frame.payload, self.mode) {
            Ok(decoded) => Ok(Some(ReceivedMessage {
                seq: frame.seq,
                decoded,
                rssi_dbm,
            })),
            Err(e) => {
                crate::logging::log_warn(&format!("undecodable payload for seq {}: {e}", frame.seq));
                Ok(None)
            }
        }
    }
}
