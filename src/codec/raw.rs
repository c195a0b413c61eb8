//! The fixed 32-byte "raw" struct encoding: LE `u32` timestamp, nine scaled
//! `i16` fields, two `f32` GPS coordinates, one scaled `i16` altitude.

use crate::constants::{scale, RAW_PAYLOAD_LEN};
use crate::error::LinkError;
use crate::sample::Sample;

fn scaled_i16(value: f64, scale: f64) -> i16 {
    (value * scale).trunc() as i16
}

/// Pack a [`Sample`] into the fixed 32-byte raw layout.
pub fn pack(sample: &Sample) -> [u8; RAW_PAYLOAD_LEN] {
    let mut out = [0u8; RAW_PAYLOAD_LEN];
    let mut w = 0usize;

    out[w..w + 4].copy_from_slice(&(sample.ts as u32).to_le_bytes());
    w += 4;

    for v in sample.accel {
        out[w..w + 2].copy_from_slice(&scaled_i16(v, scale::ACCEL).to_le_bytes());
        w += 2;
    }
    for v in sample.gyro {
        out[w..w + 2].copy_from_slice(&scaled_i16(v, scale::GYRO).to_le_bytes());
        w += 2;
    }
    for v in sample.attitude {
        out[w..w + 2].copy_from_slice(&scaled_i16(v, scale::ATTITUDE).to_le_bytes());
        w += 2;
    }

    out[w..w + 4].copy_from_slice(&(sample.gps.lat as f32).to_le_bytes());
    w += 4;
    out[w..w + 4].copy_from_slice(&(sample.gps.lon as f32).to_le_bytes());
    w += 4;
    out[w..w + 2].copy_from_slice(&scaled_i16(sample.gps.alt, scale::ALTITUDE).to_le_bytes());
    w += 2;

    debug_assert_eq!(w, RAW_PAYLOAD_LEN);
    out
}

/// Unpack the fixed 32-byte raw layout back into a [`Sample`].
pub fn unpack(bytes: &[u8]) -> Result<Sample, LinkError> {
    if bytes.len() != RAW_PAYLOAD_LEN {
        return Err(LinkError::Undecodable(format!(
            "raw payload length {} != {RAW_PAYLOAD_LEN}",
            bytes.len()
        )));
    }

    let mut r = 0usize;
    let mut take4 = || {
        let s: [u8; 4] = bytes[r..r + 4].try_into().unwrap();
        r += 4;
        s
    };
    let ts = u32::from_le_bytes(take4()) as f64;

    let mut read_triplet = |scale: f64| -> [f64; 3] {
        let mut v = [0f64; 3];
        for slot in v.iter_mut() {
            let s: [u8; 2] = bytes[r..r + 2].try_into().unwrap();
            r += 2;
            *slot = i16::from_le_bytes(s) as f64 / scale;
        }
        v
    };
    let accel = read_triplet(scale::ACCEL);
    let gyro = read_triplet(scale::GYRO);
    let attitude = read_triplet(scale::ATTITUDE);

    let lat = f32::from_le_bytes(take4()) as f64;
    let lon = f32::from_le_bytes(take4()) as f64;
    let alt_raw: [u8; 2] = bytes[r..r + 2].try_into().unwrap();
    r += 2;
    let alt = i16::from_le_bytes(alt_raw) as f64 / scale::ALTITUDE;

    debug_assert_eq!(r, RAW_PAYLOAD_LEN);
    Ok(Sample::new(ts, accel, gyro, attitude, lat, lon, alt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_is_exactly_32_bytes() {
        let s = Sample::new(1.0, [0.0; 3], [0.0; 3], [0.0; 3], 0.0, 0.0, 0.0);
        assert_eq!(pack(&s).len(), RAW_PAYLOAD_LEN);
    }

    #[test]
    fn round_trip_within_quantisation() {
        let s = Sample::new(
            1_700_000_000.0,
            [0.125, -0.5, 1.0],
            [10.0, -20.0, 0.0],
            [1.0, -1.0, 0.0],
            37.55,
            -127.1,
            12.3,
        );
        let packed = pack(&s);
        let got = unpack(&packed).unwrap();
        assert!((got.ts - s.ts).abs() < 1.0);
        for i in 0..3 {
            assert!((got.accel[i] - s.accel[i]).abs() < 0.001);
            assert!((got.gyro[i] - s.gyro[i]).abs() < 0.1);
            assert!((got.attitude[i] - s.attitude[i]).abs() < 0.1);
        }
        assert!((got.gps.lat - s.gps.lat).abs() < 1e-4);
        assert!((got.gps.lon - s.gps.lon).abs() < 1e-4);
        assert!((got.gps.alt - s.gps.alt).abs() < 0.1);
    }

    #[test]
    fn wrong_length_is_undecodable() {
        let err = unpack(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, LinkError::Undecodable(_)));
    }
}
