//! JSONL payload archival: one accepted message per line, one file per UTC
//! day, appended under a host-configured directory.

use crate::codec::Decoded;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct ArchiveMeta {
    recv_frame_seq: u8,
    latency_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    rssi_dbm: Option<i32>,
}

#[derive(Debug, Serialize)]
struct ArchiveRecord<'a> {
    ts_recv_utc: String,
    data: &'a DecodedJson,
    meta: ArchiveMeta,
}

/// A JSON-friendly projection of [`Decoded`]: a concrete sample, or a
/// decoder stub record, exactly as the codec produced it.
#[derive(Debug, Serialize)]
#[serde(tag = "kind")]
enum DecodedJson {
    Sample {
        ts: f64,
        accel: [f64; 3],
        gyro: [f64; 3],
        attitude: [f64; 3],
        lat: f64,
        lon: f64,
        alt: f64,
    },
    BamStub {
        code: u8,
    },
    DummyStub {
        len: usize,
    },
}

impl From<&Decoded> for DecodedJson {
    fn from(d: &Decoded) -> Self {
        match d {
            Decoded::Sample(s) => DecodedJson::Sample {
                ts: s.ts,
                accel: s.accel,
                gyro: s.gyro,
                attitude: s.attitude,
                lat: s.gps.lat,
                lon: s.gps.lon,
                alt: s.gps.alt,
            },
            Decoded::BamStub { code } => DecodedJson::BamStub { code: *code },
            Decoded::DummyStub { len } => DecodedJson::DummyStub { len: *len },
        }
    }
}

/// Appends one JSON object per accepted message to a per-UTC-day file.
pub struct PayloadArchive {
    dir: PathBuf,
}

impl PayloadArchive {
    pub fn new<P: Into<PathBuf>>(dir: P) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, ts: DateTime<Utc>) -> PathBuf {
        self.dir.join(format!("{}.jsonl", ts.format("%Y-%m-%d")))
    }

    /// Append one accepted message. `sample_ts` is the sender-side
    /// timestamp used to compute `latency_ms`; `recv_frame_seq` is the
    /// frame's SEQ; `rssi_dbm` is present iff the transport surfaced it.
    pub fn append(
        &self,
        decoded: &Decoded,
        recv_frame_seq: u8,
        sample_ts: Option<f64>,
        rssi_dbm: Option<i32>,
    ) -> std::io::Result<()> {
        let now = Utc::now();
        let latency_ms = sample_ts
            .map(|ts| ((now.timestamp_millis() as f64) - ts * 1000.0) as i64)
            .unwrap_or(0);

        let data_json = DecodedJson::from(decoded);
        let record = ArchiveRecord {
            ts_recv_utc: now.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            data: &data_json,
            meta: ArchiveMeta {
                recv_frame_seq,
                latency_ms,
                rssi_dbm,
            },
        };

        let line = serde_json::to_string(&record)?;
        let path = self.path_for(now);
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{line}")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::Sample;

    #[test]
    fn appends_one_line_per_message_to_todays_file() {
        let dir = tempfile::tempdir().unwrap();
        let archive = PayloadArchive::new(dir.path()).unwrap();
        let sample = Sample::new(1_700_000_000.0, [0.0; 3], [0.0; 3], [0.0; 3], 0.0, 0.0, 0.0);
        archive
            .append(&Decoded::Sample(sample), 0x2A, Some(sample.ts), Some(-42))
            .unwrap();
        archive
            .append(&Decoded::Sample(sample), 0x2B, Some(sample.ts), None)
            .unwrap();

        let today_file = archive.path_for(Utc::now());
        let contents = std::fs::read_to_string(today_file).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("\"recv_frame_seq\":42"));
        assert!(contents.contains("\"rssi_dbm\":-42"));
    }
}
