use crate::CoreError;

pub fn ensure_finite(v: f64, what: &'static str) -> Result<f64, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Convert a real to `u16`, sending NaN and negatives to 0 and saturating at `u16::MAX`.
pub fn saturating_u16(v: f64) -> u16 {
    if v.is_nan() || v <= 0.0 {
        0
    } else if v >= u16::MAX as f64 {
        u16::MAX
    } else {
        v as u16
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn saturating_u16_is_monotonic(a in -1e6_f64..1e6_f64, b in -1e6_f64..1e6_f64) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(saturating_u16(lo) <= saturating_u16(hi));
        }
    }
}
