use clap::{Parser, Subcommand};
use lora_link::codec::Mode;
use lora_link::link::LinkConfig;
use lora_link::logging::init_logger;
use lora_link::persistence::archive::PayloadArchive;
use lora_link::persistence::event_log::CsvEventLog;
use lora_link::sample::SyntheticSensor;
use lora_link::session::{ReceiverSession, TransmitterSession};
use lora_link::transport::tokio_serial_port::TokioSerialPort;
use lora_link::LinkError;

#[derive(Parser)]
#[command(name = "lora-link")]
#[command(about = "Stop-and-wait link protocol for LoRa sensor telemetry")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the transmitter role: read samples, send them over the link.
    Transmit {
        /// Serial device path, e.g. /dev/ttyUSB0.
        #[arg(long)]
        port: String,
        #[arg(long, default_value_t = 115_200)]
        baud: u32,
        /// raw|zlib|bam|none, or dummy:<n> for link-layer testing.
        #[arg(long, default_value = "raw")]
        mode: String,
        #[arg(long, default_value_t = 3)]
        retry_permit: u32,
        #[arg(long, default_value_t = 3)]
        retry_data: u32,
        /// Single-attempt retry budgets, for direct PDR measurement.
        #[arg(long, default_value_t = false)]
        pdr_mode: bool,
        /// Number of samples to send; omit to run forever.
        #[arg(long)]
        count: Option<usize>,
        #[arg(long)]
        event_log: Option<String>,
    },
    /// Run the receiver role: accept the link, archive decoded samples.
    Receive {
        #[arg(long)]
        port: String,
        #[arg(long, default_value_t = 115_200)]
        baud: u32,
        #[arg(long, default_value = "raw")]
        mode: String,
        #[arg(long, default_value = "data/archive")]
        archive_dir: String,
        #[arg(long)]
        event_log: Option<String>,
    },
}

fn parse_mode(s: &str) -> Result<Mode, String> {
    if let Some(n) = s.strip_prefix("dummy:") {
        return n
            .parse::<u8>()
            .map(Mode::Dummy)
            .map_err(|e| format!("invalid dummy size: {e}"));
    }
    match s {
        "raw" => Ok(Mode::Raw),
        "none" => Ok(Mode::None),
        "zlib" => Ok(Mode::Zlib),
        "bam" => Ok(Mode::Bam),
        other => Err(format!("unknown mode: {other}")),
    }
}

fn open_event_log(path: Option<String>) -> Result<CsvEventLog, LinkError> {
    let path = path.unwrap_or_else(|| "events.csv".to_string());
    CsvEventLog::create(path).map_err(|e| LinkError::TransportFatal(e.to_string()))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), LinkError> {
    init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Transmit {
            port,
            baud,
            mode,
            retry_permit,
            retry_data,
            pdr_mode,
            count,
            event_log,
        } => {
            let mode = parse_mode(&mode).map_err(LinkError::InvariantViolation)?;
            let mut config = LinkConfig {
                retry_permit,
                retry_data,
                ..LinkConfig::default()
            };
            if pdr_mode {
                config = config.pdr_mode();
            }

            let transport = TokioSerialPort::open(&port, baud, false)?;
            let events = open_event_log(event_log)?;
            let mut session = TransmitterSession::new(transport, events, config, mode);
            let mut sensor = SyntheticSensor::new();
            session.run(&mut sensor, count).await
        }
        Commands::Receive {
            port,
            baud,
            mode,
            archive_dir,
            event_log,
        } => {
            let mode = parse_mode(&mode).map_err(LinkError::InvariantViolation)?;
            let transport = TokioSerialPort::open(&port, baud, false)?;
            let events = open_event_log(event_log)?;
            let archive = PayloadArchive::new(archive_dir)
                .map_err(|e| LinkError::TransportFatal(e.to_string()))?;
            let mut session =
                ReceiverSession::new(transport, events, LinkConfig::default(), mode, archive);
            session.run_forever().await
        }
    }
}
