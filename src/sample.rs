//! The sensor reading exchanged over the link.

/// A GPS fix: latitude and longitude in degrees, altitude in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gps {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
}

/// One sensor reading: a UNIX epoch timestamp plus IMU and GPS triples.
///
/// Produced by the sensor source, consumed by the codec. The link layer
/// never mutates a `Sample`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// UNIX epoch timestamp, seconds.
    pub ts: f64,
    /// Acceleration, g, (x, y, z).
    pub accel: [f64; 3],
    /// Angular rate, degrees/second, (x, y, z).
    pub gyro: [f64; 3],
    /// Attitude, degrees, (roll, pitch, yaw).
    pub attitude: [f64; 3],
    pub gps: Gps,
}

impl Sample {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ts: f64,
        accel: [f64; 3],
        gyro: [f64; 3],
        attitude: [f64; 3],
        lat: f64,
        lon: f64,
        alt: f64,
    ) -> Self {
        Self {
            ts,
            accel,
            gyro,
            attitude,
            gps: Gps { lat, lon, alt },
        }
    }
}

/// Trait for the sensor source collaborator (out of scope: specified only by
/// interface). Implementations read from a real IMU/GPS; tests and the CLI's
/// demo mode use a synthetic generator instead.
pub trait SensorSource {
    fn sample(&mut self) -> Sample;
}

/// A synthetic sensor source, useful for demos and PDR experiments where no
/// physical IMU is attached.
pub struct SyntheticSensor {
    tick: u64,
}

impl SyntheticSensor {
    pub fn new() -> Self {
        Self { tick: 0 }
    }
}

impl Default for SyntheticSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorSource for SyntheticSensor {
    fn sample(&mut self) -> Sample {
        let t = self.tick as f64;
        self.tick += 1;
        Sample::new(
            now_unix_seconds(),
            [0.0, 0.0, 1.0],
            [t * 0.01, 0.0, 0.0],
            [0.0, t * 0.1, 0.0],
            37.5 + t * 1e-6,
            127.0 - t * 1e-6,
            30.0,
        )
    }
}

fn now_unix_seconds() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
