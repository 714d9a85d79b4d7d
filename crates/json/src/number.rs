//! Three-variant JSON number (`spec.md` §4.3 / C3).

use std::cmp::Ordering;
use std::ops::AddAssign;

const F64_EPSILON: f64 = 1e-9;

/// A JSON number as one of three native representations.
///
/// Conversions *between* variants (`to_i64`, `to_u64`, `to_f64`) are
/// explicit and round a `f64` to the nearest integer. `AddAssign` is a
/// distinct, stricter operation: it preserves the left-hand variant and
/// *truncates* toward zero when folding a fractional value into an
/// integer, matching the original `Number::operator+=` (see `DESIGN.md`).
#[derive(Debug, Clone, Copy)]
pub enum Number {
    I64(i64),
    U64(u64),
    F64(f64),
}

impl Default for Number {
    fn default() -> Self {
        Number::I64(0)
    }
}

impl Number {
    pub fn is_i64(&self) -> bool {
        matches!(self, Number::I64(_))
    }

    pub fn is_u64(&self) -> bool {
        matches!(self, Number::U64(_))
    }

    pub fn is_f64(&self) -> bool {
        matches!(self, Number::F64(_))
    }

    /// Rounds to the nearest `i64`, per the variant's value.
    pub fn to_i64(&self) -> i64 {
        match *self {
            Number::I64(v) => v,
            Number::U64(v) => v as i64,
            Number::F64(v) => v.round() as i64,
        }
    }

    /// Rounds to the nearest `u64`, per the variant's value.
    pub fn to_u64(&self) -> u64 {
        match *self {
            Number::I64(v) => v as u64,
            Number::U64(v) => v,
            Number::F64(v) => v.round() as u64,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match *self {
            Number::I64(v) => v as f64,
            Number::U64(v) => v as f64,
            Number::F64(v) => v,
        }
    }

    /// True iff the numeric value equals zero, regardless of variant.
    pub fn is_zero(&self) -> bool {
        match *self {
            Number::I64(v) => v == 0,
            Number::U64(v) => v == 0,
            Number::F64(v) => v.abs() < F64_EPSILON,
        }
    }
}

impl AddAssign<Number> for Number {
    /// Preserves `self`'s variant. Adding a `F64` into an integer variant
    /// truncates the fractional part (round-toward-zero); adding an
    /// integer into a `F64` widens normally.
    fn add_assign(&mut self, rhs: Number) {
        *self = match *self {
            Number::I64(lhs) => Number::I64(lhs.wrapping_add(rhs.to_f64().trunc() as i64)),
            Number::U64(lhs) => Number::U64(lhs.wrapping_add(rhs.to_f64().trunc() as u64)),
            Number::F64(lhs) => Number::F64(lhs + rhs.to_f64()),
        };
    }
}

impl PartialEq for Number {
    /// Equality across variants compares numerically; `F64` comparisons use
    /// an epsilon. This intentionally differs from `Ord`, which is only
    /// defined within a single variant (see `PartialOrd` below).
    fn eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            (Number::I64(a), Number::I64(b)) => a == b,
            (Number::U64(a), Number::U64(b)) => a == b,
            (Number::F64(a), Number::F64(b)) => (a - b).abs() < F64_EPSILON,
            (Number::I64(a), Number::U64(b)) | (Number::U64(b), Number::I64(a)) => {
                a >= 0 && a as u64 == b
            }
            _ => (self.to_f64() - other.to_f64()).abs() < F64_EPSILON,
        }
    }
}

impl PartialOrd for Number {
    /// Ordering is only defined between values of the *same* variant; a
    /// cross-variant comparison returns `None` (`spec.md` §4.3: "cross-
    /// variant compare falls back to `false`" for every relational
    /// operator, which `PartialOrd::partial_cmp` returning `None` gives us
    /// for free).
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (*self, *other) {
            (Number::I64(a), Number::I64(b)) => a.partial_cmp(&b),
            (Number::U64(a), Number::U64(b)) => a.partial_cmp(&b),
            (Number::F64(a), Number::F64(b)) => a.partial_cmp(&b),
            _ => None,
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::I64(value)
    }
}

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        Number::U64(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::F64(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_variant_equality_is_numeric() {
        assert_eq!(Number::I64(5), Number::U64(5));
        assert_eq!(Number::U64(5), Number::I64(5));
        assert_ne!(Number::I64(-1), Number::U64(1));
    }

    #[test]
    fn cross_variant_ordering_is_undefined() {
        assert_eq!(Number::I64(1).partial_cmp(&Number::U64(2)), None);
    }

    #[test]
    fn add_assign_preserves_left_variant_and_truncates() {
        let mut n = Number::I64(2);
        n += Number::F64(3.9);
        assert_eq!(n.to_i64(), 5);
        assert!(n.is_i64());
    }

    #[test]
    fn is_zero_matches_spec_not_operator() {
        assert!(Number::F64(0.0).is_zero());
        assert!(!Number::I64(1).is_zero());
    }
}
