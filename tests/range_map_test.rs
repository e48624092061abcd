//! Tests for camera angle to servo range mapping

use hand_servo::range_map::{map_range, RangeMapper};
use proptest::prelude::*;

#[test]
fn test_servo_examples() {
    let mapper = RangeMapper::default();
    assert_eq!(mapper.map_to_servo(-90.0).unwrap(), 0);
    assert_eq!(mapper.map_to_servo(0.0).unwrap(), 135);
    assert_eq!(mapper.map_to_servo(90.0).unwrap(), 270);
    assert_eq!(mapper.map_to_servo(45.0).unwrap(), 202);
    assert_eq!(mapper.map_to_servo(-45.0).unwrap(), 68);
}

#[test]
fn test_out_of_domain_clamps() {
    let mapper = RangeMapper::default();
    assert_eq!(mapper.map_to_servo(120.0).unwrap(), 270);
    assert_eq!(mapper.map_to_servo(-180.0).unwrap(), 0);
    assert_eq!(mapper.map_to_servo(180.0).unwrap(), 270);
}

#[test]
fn test_smoothed_examples() {
    let mapper = RangeMapper::default();
    // 150 and 153 exactly
    assert_eq!(mapper.map_to_servo(10.0).unwrap(), 150);
    assert_eq!(mapper.map_to_servo(12.0).unwrap(), 153);
    // 9.6 -> 149.4
    assert_eq!(mapper.map_to_servo(9.6).unwrap(), 149);
}

#[test]
fn test_custom_domains() {
    assert!((map_range(5.0, 0.0, 10.0, 100.0, 200.0) - 150.0).abs() < 1e-9);
    assert!((map_range(2.5, 0.0, 10.0, 1.0, 0.0) - 0.75).abs() < 1e-9);
}

proptest! {
    #[test]
    fn prop_output_stays_in_servo_range(x in -1000.0f64..1000.0) {
        let value = RangeMapper::default().map_to_servo(x).unwrap();
        prop_assert!((0..=270).contains(&value));
    }

    #[test]
    fn prop_monotone_non_decreasing(a in -200.0f64..200.0, b in -200.0f64..200.0) {
        let mapper = RangeMapper::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(mapper.map(lo) <= mapper.map(hi));
    }

    #[test]
    fn prop_inverse_recovers_in_domain_values(x in -90.0f64..=90.0) {
        let mapper = RangeMapper::default();
        prop_assert!((mapper.inverse().map(mapper.map(x)) - x).abs() < 1e-9);
    }
}
