//! # lora-link - a stop-and-wait link protocol for LoRa sensor telemetry
//!
//! This crate implements a small link-layer protocol for delivering
//! time-stamped IMU/GPS samples from an embedded transmitter to a receiver
//! over a half-duplex LoRa radio link whose underlying UART exposes a
//! reliable byte pipe with a strict per-air-packet size limit.
//!
//! ## Features
//!
//! - Fixed-schema sensor payload codec with optional compression
//! - Framing and classification over a byte-oriented serial link
//! - Handshake, then repeated Query/Permit/Data/Ack cycles, stop-and-wait
//! - Configurable retry budgets for reliable delivery or direct PDR
//!   measurement
//! - CSV event logging and JSONL payload archival
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! lora-link = "0.1.0"
//! ```
//!
//! ```rust,no_run
//! use lora_link::{
//!     codec::Mode, link::LinkConfig, persistence::event_log::NullEventSink,
//!     session::TransmitterSession, sample::SyntheticSensor,
//! };
//!
//! # async fn demo(transport: impl lora_link::transport::SerialPort) {
//! let mut session = TransmitterSession::new(transport, NullEventSink, LinkConfig::default(), Mode::None);
//! let mut sensor = SyntheticSensor::new();
//! session.run(&mut sensor, Some(10)).await.ok();
//! # }
//! ```

pub mod codec;
pub mod constants;
pub mod error;
pub mod link;
pub mod logging;
pub mod persistence;
pub mod sample;
pub mod session;
pub mod transport;

pub use crate::error::LinkError;
pub use crate::logging::{init_logger, log_info};
pub use crate::sample::Sample;
