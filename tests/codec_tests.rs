//! Round-trip codec properties: `decode(encode(s, mode), mode) ~= s` within
//! documented quantisation, for every representable [`Sample`].

use lora_link::codec::{decode, encode, Decoded, Mode};
use lora_link::sample::Sample;
use proptest::prelude::*;

fn arb_sample() -> impl Strategy<Value = Sample> {
    (
        0u32..2_000_000_000u32,
        prop::array::uniform3(-10.0f64..10.0),
        prop::array::uniform3(-2000.0f64..2000.0),
        prop::array::uniform3(-180.0f64..180.0),
        -90.0f64..90.0,
        -180.0f64..180.0,
        -1000.0f64..1000.0,
    )
        .prop_map(|(ts, accel, gyro, attitude, lat, lon, alt)| {
            Sample::new(ts as f64, accel, gyro, attitude, lat, lon, alt)
        })
}

proptest! {
    #[test]
    fn raw_mode_round_trips_within_tolerance(s in arb_sample()) {
        let payload = encode(&s, Mode::Raw).unwrap();
        prop_assert_eq!(payload.len(), 32);
        match decode(&payload, Mode::Raw).unwrap() {
            Decoded::Sample(got) => {
                for i in 0..3 {
                    prop_assert!((got.accel[i] - s.accel[i]).abs() < 0.001 + 1e-9);
                    prop_assert!((got.gyro[i] - s.gyro[i]).abs() < 0.1 + 1e-9);
                    prop_assert!((got.attitude[i] - s.attitude[i]).abs() < 0.1 + 1e-9);
                }
                prop_assert!((got.gps.lat - s.gps.lat).abs() < 1e-3);
                prop_assert!((got.gps.lon - s.gps.lon).abs() < 1e-3);
                prop_assert!((got.gps.alt - s.gps.alt).abs() < 0.1 + 1e-9);
            }
            other => prop_assert!(false, "expected Sample, got {other:?}"),
        }
    }

    #[test]
    fn zlib_mode_round_trips_within_tolerance(s in arb_sample()) {
        let payload = encode(&s, Mode::Zlib).unwrap();
        match decode(&payload, Mode::Zlib).unwrap() {
            Decoded::Sample(got) => {
                prop_assert!((got.gps.lat - s.gps.lat).abs() < 1e-3);
            }
            other => prop_assert!(false, "expected Sample, got {other:?}"),
        }
    }

    #[test]
    fn none_mode_is_identical_wire_format_to_raw(s in arb_sample()) {
        prop_assert_eq!(encode(&s, Mode::None).unwrap(), encode(&s, Mode::Raw).unwrap());
    }
}

#[test]
fn bam_mode_never_panics_on_empty_input() {
    assert!(decode(&[], Mode::Bam).is_err());
}

#[test]
fn zlib_garbage_payload_is_undecodable_not_a_panic() {
    let err = decode(&[0xFF, 0x00, 0x11, 0x22], Mode::Zlib).unwrap_err();
    assert!(matches!(err, lora_link::LinkError::Undecodable(_)));
}
