/// Tolerance when matching a float frame rate to a known fraction.
const MATCH_TOLERANCE: f64 = 1e-3;

/// Converts a float frame rate into an encoder-friendly `(numerator, denominator)`.
///
/// Integer rates map to `n/1`, NTSC rates to `n*1000/1001`, anything else to
/// millisecond precision. Denominators stay small enough for MPEG-4, whose
/// time base is limited to 16 bits. Returns `None` for non-positive or
/// non-finite input.
pub fn to_fraction(fps: f64) -> Option<(i32, i32)> {
    if !fps.is_finite() || fps <= 0.0 {
        return None;
    }

    let rounded = fps.round();
    if rounded >= 1.0 && (fps - rounded).abs() < MATCH_TOLERANCE {
        return Some((rounded as i32, 1));
    }

    let ntsc = (fps * 1.001).round();
    if ntsc >= 1.0 && (ntsc / 1.001 - fps).abs() < MATCH_TOLERANCE {
        return Some(((ntsc as i32).saturating_mul(1000), 1001));
    }

    let millis = (fps * 1000.0).round() as i32;
    if millis <= 0 {
        return None;
    }
    let divisor = gcd(millis, 1000);
    Some((millis / divisor, 1000 / divisor))
}

fn gcd(mut a: i32, mut b: i32) -> i32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.abs().max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::film(24.0, (24, 1))]
    #[case::pal(25.0, (25, 1))]
    #[case::web(30.0, (30, 1))]
    #[case::high(60.0, (60, 1))]
    #[case::float_noise(29.9999999, (30, 1))]
    #[case::ntsc_film(23.976, (24000, 1001))]
    #[case::ntsc(29.97, (30000, 1001))]
    #[case::ntsc_exact(30000.0 / 1001.0, (30000, 1001))]
    #[case::ntsc_high(59.94, (60000, 1001))]
    #[case::half(12.5, (25, 2))]
    #[case::odd(7.3, (73, 10))]
    fn test_known_rates(#[case] fps: f64, #[case] expected: (i32, i32)) {
        assert_eq!(to_fraction(fps), Some(expected));
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::negative(-30.0)]
    #[case::nan(f64::NAN)]
    #[case::infinite(f64::INFINITY)]
    #[case::below_millisecond(0.0001)]
    fn test_unusable_rates(#[case] fps: f64) {
        assert_eq!(to_fraction(fps), None);
    }

    #[test]
    fn test_denominator_fits_mpeg4_time_base() {
        for fps in [0.5, 1.001, 14.985, 47.952, 119.88, 33.333] {
            let (_, den) = to_fraction(fps).unwrap();
            assert!(den <= 65535, "fps {fps} gave denominator {den}");
        }
    }
}
