//! Value mapping between parameter ranges and controller bytes.

/// Highest value a controller byte can carry.
pub const CONTROLLER_MAX: u8 = 127;

/// Inbound switch values above this read as `true`.
pub const SWITCH_THRESHOLD: u8 = 63;

const EPSILON: f32 = f32::EPSILON;

/// Linear map of `value` from `[in_min, in_max]` to `[out_min, out_max]`.
///
/// With `clamp` set the result never leaves the output range, NaN bounds included. A
/// degenerate input range maps everything to `out_min`.
pub fn map_range(
    value: f32,
    in_min: f32,
    in_max: f32,
    out_min: f32,
    out_max: f32,
    clamp: bool,
) -> f32 {
    if (in_max - in_min).abs() < EPSILON {
        return out_min;
    }

    let out = (value - in_min) / (in_max - in_min) * (out_max - out_min) + out_min;
    if !clamp {
        return out;
    }

    let (low, high) = if out_max < out_min {
        (out_max, out_min)
    } else {
        (out_min, out_max)
    };
    // f32::clamp panics on NaN bounds; max/min skip them
    out.max(low).min(high)
}

/// Map a normalized `[0, 1]` amount onto a byte range, rounding to nearest.
pub fn unit_to_byte(amount: f32, low: u8, high: u8) -> u8 {
    map_range(amount, 0.0, 1.0, low as f32, high as f32, true).round() as u8
}

/// Parameter value to controller byte.
pub fn float_to_controller(value: f32, min: f32, max: f32) -> u8 {
    unit_to_byte(map_range(value, min, max, 0.0, 1.0, true), 0, CONTROLLER_MAX)
}

/// Controller byte to parameter value.
pub fn controller_to_float(value: u8, min: f32, max: f32) -> f32 {
    map_range(value as f32, 0.0, CONTROLLER_MAX as f32, min, max, true)
}

/// Boolean parameter to controller byte.
pub fn bool_to_controller(value: bool) -> u8 {
    if value {
        CONTROLLER_MAX
    } else {
        0
    }
}

/// Controller byte to boolean parameter.
pub fn controller_to_bool(value: u8) -> bool {
    value > SWITCH_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_range_clamps() {
        assert_eq!(map_range(2.0, 0.0, 1.0, 0.0, 10.0, true), 10.0);
        assert_eq!(map_range(-1.0, 0.0, 1.0, 0.0, 10.0, true), 0.0);
        assert_eq!(map_range(2.0, 0.0, 1.0, 0.0, 10.0, false), 20.0);
    }

    #[test]
    fn test_map_range_degenerate() {
        assert_eq!(map_range(5.0, 1.0, 1.0, 3.0, 9.0, true), 3.0);
    }

    #[test]
    fn test_map_range_inverted_output() {
        assert_eq!(map_range(0.25, 0.0, 1.0, 10.0, 0.0, true), 7.5);
        assert_eq!(map_range(4.0, 0.0, 1.0, 10.0, 0.0, true), 0.0);
    }

    #[test]
    fn test_nan_range_stays_total() {
        assert_eq!(map_range(0.5, 0.0, 1.0, f32::NAN, 1.0, true), 1.0);
        assert_eq!(controller_to_float(64, f32::NAN, 1.0), 1.0);
        assert_eq!(controller_to_float(64, 0.0, f32::NAN), 0.0);
        assert_eq!(float_to_controller(0.5, f32::NAN, 1.0), 0);
        assert_eq!(float_to_controller(f32::NAN, 0.0, 1.0), 0);
    }

    #[test]
    fn test_float_to_controller() {
        assert_eq!(float_to_controller(0.5, 0.0, 1.0), 64);
        assert_eq!(float_to_controller(0.0, 0.0, 1.0), 0);
        assert_eq!(float_to_controller(1.0, 0.0, 1.0), 127);
        assert_eq!(float_to_controller(-3.0, 0.0, 1.0), 0);
        assert_eq!(float_to_controller(300.0, 20.0, 200.0), 127);
    }

    #[test]
    fn test_controller_to_float() {
        assert_eq!(controller_to_float(127, 0.0, 1.0), 1.0);
        assert_eq!(controller_to_float(0, -12.0, 12.0), -12.0);
    }

    #[test]
    fn test_roundtrip_within_one_step() {
        let (min, max) = (-40.0_f32, 880.0_f32);
        let step = (max - min) / 127.0;
        let mut v = min;
        while v <= max {
            let back = controller_to_float(float_to_controller(v, min, max), min, max);
            assert!((back - v).abs() <= step, "{} came back as {}", v, back);
            v += 3.7;
        }
    }

    #[test]
    fn test_bool_threshold() {
        assert_eq!(bool_to_controller(true), 127);
        assert_eq!(bool_to_controller(false), 0);
        assert!(!controller_to_bool(40));
        assert!(!controller_to_bool(63));
        assert!(controller_to_bool(64));
        assert!(controller_to_bool(127));
    }

    #[test]
    fn test_unit_to_byte() {
        assert_eq!(unit_to_byte(0.0, 65, 95), 65);
        assert_eq!(unit_to_byte(1.0, 65, 95), 95);
        assert_eq!(unit_to_byte(0.5, 17, 47), 32);
        assert_eq!(unit_to_byte(7.0, 17, 47), 47);
    }
}
