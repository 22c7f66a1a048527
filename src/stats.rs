/// Multiplier applied to the interquartile range to place the fences
pub const FENCE_FACTOR: f64 = 1.5;

/// Box-plot statistics for one sample
///
/// Quartiles use linear interpolation between order statistics at rank
/// `p * (n - 1)`, the same method spreadsheets call `QUARTILE.INC`.
/// Invariant: `lower_fence <= q1 <= median <= q3 <= upper_fence`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutlierBounds {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub lower_fence: f64,
    pub upper_fence: f64,
}

impl OutlierBounds {
    /// Computes quartiles and IQR fences
    ///
    /// # Arguments
    /// * `sample` - Finite numeric values, in any order
    ///
    /// # Returns
    /// * `Option<OutlierBounds>` - `None` for an empty sample; callers skip
    ///   the partition instead of plotting it
    ///
    /// # Examples
    /// ```
    /// use boxplot_web::stats::OutlierBounds;
    ///
    /// let bounds = OutlierBounds::from_sample(&[1.0, 2.0, 3.0]).unwrap();
    /// assert_eq!((bounds.q1, bounds.q3), (1.5, 2.5));
    /// assert_eq!((bounds.lower_fence, bounds.upper_fence), (0.0, 4.0));
    /// ```
    pub fn from_sample(sample: &[f64]) -> Option<Self> {
        if sample.is_empty() {
            return None;
        }

        let mut sorted = sample.to_vec();
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile_sorted(&sorted, 0.25);
        let median = quantile_sorted(&sorted, 0.5);
        let q3 = quantile_sorted(&sorted, 0.75);
        let iqr = q3 - q1;

        Some(OutlierBounds {
            min: sorted[0],
            q1,
            median,
            q3,
            max: sorted[sorted.len() - 1],
            lower_fence: q1 - FENCE_FACTOR * iqr,
            upper_fence: q3 + FENCE_FACTOR * iqr,
        })
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

// `sorted` must be non-empty and ascending; `p` is in [0, 1]
fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let rank = p * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_values() {
        let b = OutlierBounds::from_sample(&[3.0, 1.0, 2.0]).unwrap();
        assert_eq!(b.q1, 1.5);
        assert_eq!(b.median, 2.0);
        assert_eq!(b.q3, 2.5);
        assert_eq!(b.iqr(), 1.0);
        assert_eq!(b.lower_fence, 0.0);
        assert_eq!(b.upper_fence, 4.0);
        assert_eq!((b.min, b.max), (1.0, 3.0));
    }

    #[test]
    fn single_value_collapses_fences() {
        let b = OutlierBounds::from_sample(&[10.0]).unwrap();
        assert_eq!(b.q1, 10.0);
        assert_eq!(b.q3, 10.0);
        assert_eq!(b.iqr(), 0.0);
        assert_eq!(b.lower_fence, 10.0);
        assert_eq!(b.upper_fence, 10.0);
    }

    #[test]
    fn repeated_value() {
        let b = OutlierBounds::from_sample(&[7.25; 9]).unwrap();
        assert_eq!(b.q1, 7.25);
        assert_eq!(b.q3, 7.25);
        assert_eq!(b.lower_fence, 7.25);
        assert_eq!(b.upper_fence, 7.25);
    }

    #[test]
    fn empty_sample_has_no_bounds() {
        assert!(OutlierBounds::from_sample(&[]).is_none());
    }

    #[test]
    fn interpolates_between_order_statistics() {
        // ranks 0.75 and 2.25 over [1, 2, 4, 8]
        let b = OutlierBounds::from_sample(&[8.0, 1.0, 4.0, 2.0]).unwrap();
        assert_eq!(b.q1, 1.75);
        assert_eq!(b.median, 3.0);
        assert_eq!(b.q3, 5.0);
    }

    #[test]
    fn fences_enclose_quartiles() {
        let samples: [&[f64]; 4] = [
            &[1.0],
            &[-5.0, 100.0],
            &[0.1, 0.2, 0.2, 0.9, 14.0, -3.0],
            &[1e9, -1e9, 3.0, 3.0, 3.0],
        ];
        for sample in samples {
            let b = OutlierBounds::from_sample(sample).unwrap();
            assert!(b.lower_fence <= b.q1, "{:?}", b);
            assert!(b.q1 <= b.median, "{:?}", b);
            assert!(b.median <= b.q3, "{:?}", b);
            assert!(b.q3 <= b.upper_fence, "{:?}", b);
        }
    }
}
