//! Summary statistics over a snapshot of scalar values.

/// Count, extrema and mean of a series.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SeriesStats {
    /// Number of values.
    pub count: usize,
    /// Smallest value (0 for an empty series).
    pub min: f64,
    /// Largest value (0 for an empty series).
    pub max: f64,
    /// Arithmetic mean (0 for an empty series).
    pub mean: f64,
}

impl SeriesStats {
    /// Computes the statistics of `values`. Non-finite values are ignored.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_values(values: &[f64]) -> Self {
        let mut count = 0usize;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for &value in values.iter().filter(|v| v.is_finite()) {
            count += 1;
            min = min.min(value);
            max = max.max(value);
            sum += value;
        }

        if count == 0 {
            return Self::default();
        }
        Self {
            count,
            min,
            max,
            mean: sum / count as f64,
        }
    }

    /// Returns true if no value was counted.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Spread between the extrema.
    #[must_use]
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_stats() {
        let stats = SeriesStats::from_values(&[2.0, 4.0, 9.0]);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.range(), 7.0);
    }

    #[test]
    fn test_empty_and_non_finite() {
        assert!(SeriesStats::from_values(&[]).is_empty());

        let stats = SeriesStats::from_values(&[f64::NAN, 1.0, f64::INFINITY]);
        assert_eq!(stats.count, 1);
        assert_eq!(stats.mean, 1.0);
    }
}
