//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value into the inclusive range `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    if value > max {
        max
    } else if value < min {
        min
    } else {
        value
    }
}

/// Arithmetic mean of the values, or `None` if there are none.
pub fn mean<T, I>(values: I) -> Option<T>
where
    T: Float,
    I: IntoIterator<Item = T>,
{
    let mut sum = T::zero();
    let mut count = 0usize;

    for v in values {
        sum = sum + v;
        count += 1;
    }

    if count == 0 {
        None
    } else {
        T::from(count).map(|n| sum / n)
    }
}

/// Returns true if the value lies in the half-open interval `[lower, upper)`.
pub fn in_half_open_range<T>(value: T, lower: T, upper: T) -> bool
where
    T: Float,
{
    value >= lower && value < upper
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(20.0, -15.0, 15.0), 15.0);
        assert_eq!(clamp(-20.0, -15.0, 15.0), -15.0);
        assert_eq!(clamp(3.5, -15.0, 15.0), 3.5);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(vec![1.0f64, 2.0, 6.0]), Some(3.0));
        assert_eq!(mean(Vec::<f64>::new()), None);
    }

    #[test]
    fn test_in_half_open_range() {
        assert!(in_half_open_range(0.5f64, 0.5, 359.0));
        assert!(in_half_open_range(358.9f64, 0.5, 359.0));
        assert!(!in_half_open_range(359.0f64, 0.5, 359.0));
        assert!(!in_half_open_range(0.49f64, 0.5, 359.0));
    }
}
