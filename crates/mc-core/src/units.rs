// mc-core/src/units.rs

use uom::si::f64::Frequency as UomFrequency;

// Public canonical unit types (SI, f64)
pub type Frequency = UomFrequency;

#[inline]
pub fn hz(v: f64) -> Frequency {
    use uom::si::frequency::hertz;
    Frequency::new::<hertz>(v)
}

/// Frequency as a plain number of hertz.
#[inline]
pub fn as_hz(f: Frequency) -> f64 {
    use uom::si::frequency::hertz;
    f.get::<hertz>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uom::si::frequency::kilohertz;

    #[test]
    fn constructors_smoke() {
        assert_eq!(as_hz(hz(800.0)), 800.0);
        assert!((hz(20_000.0).get::<kilohertz>() - 20.0).abs() < 1e-12);
    }
}
