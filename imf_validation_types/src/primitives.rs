//! Small value types that show up inside MXF properties.

/// A signed rational number, stored as two `i32`s.
///
/// MXF uses these for edit rates, sample rates, and aspect ratios.
#[repr(C)]
#[derive(Clone, Copy, Debug, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub struct Rational {
    pub numerator: i32,
    pub denominator: i32,
}

impl Rational {
    pub const fn new(numerator: i32, denominator: i32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Checks whether two rationals describe the same value, even when they
    /// aren't written the same way (e.g. `48000/1` and `96000/2`).
    ///
    /// A zero denominator has no value, so it never matches anything.
    ///
    /// ```
    /// use imf_validation_types::primitives::Rational;
    ///
    /// assert!(Rational::new(24, 1).same_value(&Rational::new(48, 2)));
    /// assert!(!Rational::new(24000, 1001).same_value(&Rational::new(24, 1)));
    /// assert!(!Rational::new(0, 0).same_value(&Rational::new(0, 0)));
    /// ```
    pub const fn same_value(&self, other: &Rational) -> bool {
        if self.denominator == 0 || other.denominator == 0 {
            return false;
        }
        (self.numerator as i64) * (other.denominator as i64)
            == (other.numerator as i64) * (self.denominator as i64)
    }

    /// The value as a float.
    ///
    /// Returns `None` when the denominator is zero.
    pub fn as_f64(&self) -> Option<f64> {
        if self.denominator == 0 {
            return None;
        }
        Some(self.numerator as f64 / self.denominator as f64)
    }
}

impl core::fmt::Display for Rational {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// An MXF timestamp: year, month, day, hour, minute, second, and quarter
/// milliseconds.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, PartialOrd, Eq, Ord)]
pub struct Timestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub quarter_millis: u8,
}

impl Timestamp {
    /// A timestamp takes up 8 bytes on disk.
    pub const SIZE: usize = 8;

    /// Builds a timestamp from its on-disk form.
    pub const fn from_bytes(b: [u8; 8]) -> Self {
        Self {
            year: u16::from_be_bytes([b[0], b[1]]),
            month: b[2],
            day: b[3],
            hour: b[4],
            minute: b[5],
            second: b[6],
            quarter_millis: b[7],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Rational, Timestamp};

    #[test]
    fn ntsc_rates() {
        let r = Rational::new(24000, 1001);
        assert_eq!(r.numerator, 24000);
        assert_eq!(r.denominator, 1001);
        assert_eq!(r.to_string(), "24000/1001");

        let f = r.as_f64().unwrap();
        assert!((f - 23.976).abs() < 0.001);

        assert_eq!(Rational::new(1, 0).as_f64(), None);
    }

    #[test]
    fn big_rationals_dont_overflow() {
        let a = Rational::new(i32::MAX, 2);
        let b = Rational::new(i32::MAX, 2);
        assert!(a.same_value(&b));
    }

    #[test]
    fn zero_denominators_never_match() {
        let sample_rate = Rational::new(48_000, 1);
        assert!(!Rational::new(0, 0).same_value(&sample_rate));
        assert!(!sample_rate.same_value(&Rational::new(0, 0)));
        assert!(!Rational::new(24, 0).same_value(&Rational::new(25, 0)));
        assert!(!Rational::new(24, 0).same_value(&Rational::new(24, 0)));
        assert!(Rational::new(0, 1).same_value(&Rational::new(0, 25)));
    }

    #[test]
    fn timestamp() {
        let t = Timestamp::from_bytes([0x07, 0xe8, 3, 14, 15, 9, 26, 200]);
        assert_eq!(t.year, 2024);
        assert_eq!(t.month, 3);
        assert_eq!(t.quarter_millis, 200);
    }
}
