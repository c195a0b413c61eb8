//! Transmitter state machine: handshake, then repeated
//! `Query -> Permit -> Data -> DataAck` cycles, one message at a time.

use super::frame::{classify, pack_data_frame, ControlPacket, LeadByte};
use super::metrics::PdrCounters;
use super::LinkConfig;
use crate::codec::{encode, Mode};
use crate::constants::{CTRL_DATA_ACK, CTRL_HANDSHAKE_ACK, CTRL_PERMIT, CTRL_QUERY, SYN_BEACON};
use crate::error::LinkError;
use crate::persistence::event_log::{EventRecord, EventSink, EventType};
use crate::sample::Sample;
use crate::transport::SerialPort;
use chrono::Utc;
use std::time::Duration;

/// Transmitter session phase. Initial state is `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Disconnected,
    Handshaking,
    Idle,
    AwaitingPermit,
    AwaitingDataAck,
}

/// Result of one `send_message` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Delivered,
    Dropped,
}

/// Drives the transmitter side of the link over a [`SerialPort`], logging
/// every state-transition-worthy event through an [`EventSink`].
pub struct Transmitter<T: SerialPort, E: EventSink> {
    transport: T,
    events: E,
    config: LinkConfig,
    mode: Mode,
    current_seq: u8,
    phase: Phase,
    metrics: PdrCounters,
}

impl<T: SerialPort, E: EventSink> Transmitter<T, E> {
    pub fn new(transport: T, events: E, config: LinkConfig, mode: Mode) -> Self {
        Self {
            transport,
            events,
            config,
            mode,
            current_seq: 0,
            phase: Phase::Disconnected,
            metrics: PdrCounters::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_seq(&self) -> u8 {
        self.current_seq
    }

    pub fn metrics(&self) -> PdrCounters {
        self.metrics
    }

    /// Run the handshake: write SYN, await Handshake-ACK, retrying up to
    /// `retry_handshake` times. Returns [`LinkError::HandshakeExhausted`] if
    /// the budget is consumed without a valid ACK.
    pub async fn connect(&mut self) -> Result<(), LinkError> {
        self.phase = Phase::Handshaking;

        for attempt in 1..=self.config.retry_handshake {
            if let Err(e) = self.transport.write_all(&SYN_BEACON).await {
                self.events.log_tx_event(EventRecord::new(0, attempt, EventType::HandshakeSynFail));
                return Err(e);
            }
            self.events
                .log_tx_event(EventRecord::new(0, attempt, EventType::HandshakeSynSent));

            match self.read_control_response(self.config.response_timeout).await {
                Ok(Some(ctrl)) if ctrl.ty == CTRL_HANDSHAKE_ACK && ctrl.seq == 0 => {
                    self.events
                        .log_tx_event(EventRecord::new(0, attempt, EventType::HandshakeAckOk));
                    self.current_seq = 0;
                    self.phase = Phase::Idle;
                    return Ok(());
                }
                Ok(Some(_)) => {
                    self.events
                        .log_tx_event(EventRecord::new(0, attempt, EventType::HandshakeAckInvalid));
                }
                Ok(None) => {
                    self.events
                        .log_tx_event(EventRecord::new(0, attempt, EventType::HandshakeAckTimeout));
                }
                Err(LinkError::TransportFatal(_)) => {
                    return Err(LinkError::TransportFatal("transport failed during handshake".into()));
                }
                Err(_) => {
                    self.events
                        .log_tx_event(EventRecord::new(0, attempt, EventType::HandshakeAckUnpackFail));
                }
            }
        }

        let mut record = EventRecord::new(0, self.config.retry_handshake, EventType::HandshakeFinalFail);
        record.total_attempts_for_frame = Some(self.config.retry_handshake);
        record.ack_received_final = Some(false);
        self.events.log_tx_event(record);
        self.phase = Phase::Disconnected;
        Err(LinkError::HandshakeExhausted)
    }

    /// Encode and send one sample. Performs the handshake first if not
    /// already connected.
    pub async fn send_message(&mut self, sample: &Sample) -> Result<Outcome, LinkError> {
        if self.phase != Phase::Idle {
            self.connect().await?;
        }

        let payload = match encode(sample, self.mode) {
            Ok(p) => p,
            Err(e) => {
                crate::logging::log_error(&format!("encode failed, aborting send: {e}"));
                return Ok(Outcome::Dropped);
            }
        };

        self.metrics.record_attempt();
        let seq = self.current_seq;
        let sent_at = Utc::now();

        self.phase = Phase::AwaitingPermit;
        let permit_ok = self.run_permit_phase(seq).await?;

        let data_ok = if permit_ok {
            self.phase = Phase::AwaitingDataAck;
            self.run_data_phase(seq, &payload, sent_at).await?
        } else {
            false
        };

        if data_ok {
            self.metrics.record_delivered();
        }

        self.current_seq = self.current_seq.wrapping_add(1);
        self.phase = Phase::Idle;
        Ok(if data_ok { Outcome::Delivered } else { Outcome::Dropped })
    }

    async fn run_permit_phase(&mut self, seq: u8) -> Result<bool, LinkError> {
        for attempt in 1..=self.config.retry_permit {
            let ctrl = ControlPacket::new(CTRL_QUERY, seq);
            if let Err(e) = self.transport.write_all(&ctrl.pack()).await {
                self.events
                    .log_tx_event(EventRecord::new(seq, attempt, EventType::QueryTxFail));
                return Err(e);
            }
            self.events
                .log_tx_event(EventRecord::new(seq, attempt, EventType::QuerySent));

            match self.read_control_response(self.config.response_timeout).await {
                Ok(Some(ctrl)) if ctrl.ty == CTRL_PERMIT && ctrl.seq == seq => {
                    self.events
                        .log_tx_event(EventRecord::new(seq, attempt, EventType::PermitAckOk));
                    return Ok(true);
                }
                Ok(Some(_)) => {
                    self.events
                        .log_tx_event(EventRecord::new(seq, attempt, EventType::PermitAckInvalid));
                }
                Ok(None) => {
                    self.events
                        .log_tx_event(EventRecord::new(seq, attempt, EventType::PermitAckTimeout));
                }
                Err(LinkError::TransportFatal(_)) => {
                    return Err(LinkError::TransportFatal("transport failed awaiting permit".into()));
                }
                Err(_) => {
                    self.events
                        .log_tx_event(EventRecord::new(seq, attempt, EventType::PermitAckUnpackFail));
                }
            }
        }

        let mut record = EventRecord::new(seq, self.config.retry_permit, EventType::PermitFinalFail);
        record.total_attempts_for_frame = Some(self.config.retry_permit);
        record.ack_received_final = Some(false);
        self.events.log_tx_event(record);
        Ok(false)
    }

    async fn run_data_phase(
        &mut self,
        seq: u8,
        payload: &[u8],
        sent_at: chrono::DateTime<Utc>,
    ) -> Result<bool, LinkError> {
        let frame = pack_data_frame(seq, payload);

        for attempt in 1..=self.config.retry_data {
            if let Err(e) = self.transport.write_all(&frame).await {
                self.events
                    .log_tx_event(EventRecord::new(seq, attempt, EventType::DataTxFail));
                return Err(e);
            }
            let mut sent_record = EventRecord::new(seq, attempt, EventType::DataSent);
            sent_record.timestamp_sent_utc = Some(sent_at);
            self.events.log_tx_event(sent_record);

            match self.read_control_response(self.config.response_timeout).await {
                Ok(Some(ctrl)) if ctrl.ty == CTRL_DATA_ACK && ctrl.seq == seq => {
                    let mut record = EventRecord::new(seq, attempt, EventType::DataAckOk);
                    record.total_attempts_for_frame = Some(attempt);
                    record.ack_received_final = Some(true);
                    record.timestamp_sent_utc = Some(sent_at);
                    record.timestamp_ack_interaction_end_utc = Some(Utc::now());
                    self.events.log_tx_event(record);
                    return Ok(true);
                }
                Ok(Some(_)) => {
                    self.events
                        .log_tx_event(EventRecord::new(seq, attempt, EventType::DataAckInvalid));
                }
                Ok(None) => {
                    self.events
                        .log_tx_event(EventRecord::new(seq, attempt, EventType::DataAckTimeout));
                }
                Err(LinkError::TransportFatal(_)) => {
                    return Err(LinkError::TransportFatal("transport failed awaiting data ack".into()));
                }
                Err(_) => {
                    self.events
                        .log_tx_event(EventRecord::new(seq, attempt, EventType::DataAckUnpackFail));
                }
            }
        }

        let mut record = EventRecord::new(seq, self.config.retry_data, EventType::DataAckFinalFail);
        record.total_attempts_for_frame = Some(self.config.retry_data);
        record.ack_received_final = Some(false);
        record.timestamp_sent_utc = Some(sent_at);
        record.timestamp_ack_interaction_end_utc = Some(Utc::now());
        self.events.log_tx_event(record);
        Ok(false)
    }

    /// Read one control-packet response within `timeout`. Returns `Ok(None)`
    /// on timeout; an unexpected lead byte resynchronises the transport and
    /// is reported as [`LinkError::ResponseUnparseable`].
    async fn read_control_response(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<ControlPacket>, LinkError> {
        let lead = match self.transport.read_one_timeout(timeout).await? {
            Some(b) => b,
            None => return Ok(None),
        };

        match classify(lead) {
            LeadByte::Control(ty) => {
                match self
                    .transport
                    .read_one_timeout(self.config.inter_byte_timeout)
                    .await?
                {
                    Some(seq) => Ok(Some(ControlPacket::new(ty, seq))),
                    None => Err(LinkError::ResponseUnparseable("short control packet".into())),
                }
            }
            _ => {
                self.transport.reset_input_buffer();
                Err(LinkError::ResponseUnparseable("unexpected lead byte".into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::event_log::NullEventSink;
    use crate::transport::mock::MockSerialPort;

    fn sample() -> Sample {
        Sample::new(1_700_000_000.0, [0.0, 0.0, 1.0], [0.0; 3], [0.0; 3], 37.5, 127.0, 30.0)
    }

    #[tokio::test]
    async fn handshake_succeeds_on_first_valid_ack() {
        let mock = MockSerialPort::new();
        mock.queue_rx(&[CTRL_HANDSHAKE_ACK, 0x00]);
        let mut tx = Transmitter::new(mock.clone(), NullEventSink, LinkConfig::default(), Mode::None);
        tx.connect().await.unwrap();
        assert_eq!(tx.phase(), Phase::Idle);
        assert_eq!(mock.take_tx(), SYN_BEACON.to_vec());
    }

    #[tokio::test]
    async fn happy_path_delivers_and_advances_seq() {
        let mock = MockSerialPort::new();
        mock.queue_rx(&[CTRL_HANDSHAKE_ACK, 0x00]);
        mock.queue_rx(&[CTRL_PERMIT, 0x00]);
        mock.queue_rx(&[CTRL_DATA_ACK, 0x00]);

        let mut tx = Transmitter::new(mock, NullEventSink, LinkConfig::default(), Mode::None);
        let outcome = tx.send_message(&sample()).await.unwrap();
        assert_eq!(outcome, Outcome::Delivered);
        assert_eq!(tx.current_seq(), 1);
    }

    #[tokio::test]
    async fn data_ack_never_arrives_drops_after_retry_budget() {
        let mock = MockSerialPort::new();
        mock.queue_rx(&[CTRL_HANDSHAKE_ACK, 0x00]);
        mock.queue_rx(&[CTRL_PERMIT, 0x00]);
        // No DataAck queued at all: every attempt times out.

        let mut config = LinkConfig::default();
        config.response_timeout = Duration::from_millis(5);
        config.retry_data = 3;
        let mut tx = Transmitter::new(mock, NullEventSink, config, Mode::None);
        let outcome = tx.send_message(&sample()).await.unwrap();
        assert_eq!(outcome, Outcome::Dropped);
        assert_eq!(tx.current_seq(), 1, "seq advances on Dropped too");
    }

    #[tokio::test]
    async fn data_ack_arrives_on_second_attempt_after_one_timeout() {
        let mock = MockSerialPort::new();
        mock.queue_rx(&[CTRL_HANDSHAKE_ACK, 0x00]);
        mock.queue_rx(&[CTRL_PERMIT, 0x00]);
        // Write #1 = SYN, #2 = Query, #3 = first Data attempt (times out),
        // #4 = second Data attempt: only now does the ack become readable.
        mock.queue_rx_after_writes(4, &[CTRL_DATA_ACK, 0x00]);

        let mut config = LinkConfig::default();
        config.response_timeout = Duration::from_millis(5);
        config.retry_data = 3;
        let mut tx = Transmitter::new(mock, NullEventSink, config, Mode::None);
        let outcome = tx.send_message(&sample()).await.unwrap();
        assert_eq!(outcome, Outcome::Delivered);
        assert_eq!(tx.current_seq(), 1);
    }

    #[tokio::test]
    async fn permit_with_wrong_seq_retries_then_drops() {
        let mock = MockSerialPort::new();
        mock.queue_rx(&[CTRL_HANDSHAKE_ACK, 0x00]);
        // Permit always echoes the wrong seq.
        for _ in 0..3 {
            mock.queue_rx(&[CTRL_PERMIT, 0x06]);
        }

        let mut config = LinkConfig::default();
        config.retry_permit = 3;
        let mut tx = Transmitter::new(mock, NullEventSink, config, Mode::None);
        let outcome = tx.send_message(&sample()).await.unwrap();
        assert_eq!(outcome, Outcome::Dropped);
    }

    #[tokio::test]
    async fn pdr_mode_attempts_exactly_once() {
        let mock = MockSerialPort::new();
        mock.queue_rx(&[CTRL_HANDSHAKE_ACK, 0x00]);
        mock.queue_rx(&[CTRL_PERMIT, 0x00]);
        // No DataAck: single attempt then Dropped.
        let mut config = LinkConfig::default().pdr_mode();
        config.response_timeout = Duration::from_millis(5);
        let mut tx = Transmitter::new(mock, NullEventSink, config, Mode::Dummy(8));
        let outcome = tx.send_message(&sample()).await.unwrap();
        assert_eq!(outcome, Outcome::Dropped);
        assert_eq!(tx.metrics().attempted(), 1);
        assert_eq!(tx.metrics().delivered(), 0);
    }
}
