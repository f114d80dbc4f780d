//! Miscellaneous utility structs and functions.

use itertools::Itertools;
use std::fmt::Debug;
use std::hash::Hash;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An interval on the real number line.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Interval<T> {
    pub min: T,
    pub max: T,
}

impl<T> Interval<T> {
    /// Creates a new interval.
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: PartialOrd + Copy> Interval<T> {
    /// Returns true if this interval contains the value.
    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }

    /// Restricts a value to the interval.
    /// Values which are not comparable (e.g. NaN) are returned unchanged.
    pub fn clamp(&self, value: T) -> T {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }
}

impl<T: std::ops::Sub<T, Output = T> + Copy> Interval<T> {
    /// Gets the magnitude of the interval.
    pub fn length(&self) -> T {
        self.max - self.min
    }
}

impl<T: Debug> Debug for Interval<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Interval({:?}, {:?})", &self.min, &self.max)
    }
}

/// Checks that `order` contains each of `ids` exactly once.
pub(crate) fn is_permutation<T: Eq + Hash + Clone>(order: &[T], ids: &[T]) -> bool {
    order.len() == ids.len()
        && order.iter().all(|id| ids.contains(id))
        && order.iter().unique().count() == order.len()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn clamp_to_interval() {
        let band = Interval::new(-3.0, 3.0);
        assert_eq!(band.clamp(-5.0), -3.0);
        assert_eq!(band.clamp(4.0), 3.0);
        assert_eq!(band.clamp(1.5), 1.5);
        assert!(band.clamp(f64::NAN).is_nan());
        assert!(band.contains(3.0));
        assert_eq!(band.length(), 6.0);
    }

    #[test]
    fn permutations() {
        assert!(is_permutation(&[3, 1, 2], &[1, 2, 3]));
        assert!(!is_permutation(&[1, 1, 2], &[1, 2, 3]));
        assert!(!is_permutation(&[1, 2], &[1, 2, 3]));
        assert!(!is_permutation(&[1, 2, 4], &[1, 2, 3]));
    }
}
