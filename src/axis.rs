use crate::stats::OutlierBounds;

/// Margin added on both sides of a single-box axis, as a share of its span
pub const SINGLE_BOX_PADDING: f64 = 0.10;

/// Margin added above a multi-box axis, as a share of its span
pub const MULTI_BOX_PADDING: f64 = 0.05;

/// Displayed range of the value axis
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    /// Range for an image holding a single box
    ///
    /// The axis is clamped to the non-outlier part of the sample, i.e.
    /// `[max(sample min, lower fence), min(sample max, upper fence)]`, and
    /// then widened by 10% of that span on both sides. Outlier points beyond
    /// the fences fall outside the drawn area.
    pub fn single_box(bounds: &OutlierBounds) -> Self {
        let min = bounds.min.max(bounds.lower_fence);
        let max = bounds.max.min(bounds.upper_fence);
        let pad = SINGLE_BOX_PADDING * (max - min);
        AxisRange {
            min: min - pad,
            max: max + pad,
        }
    }

    /// Range shared by every box drawn on one image
    ///
    /// Starts at zero and reaches 5% past the highest upper fence, so all
    /// boxes stay comparable. When every fence is negative the top stays at
    /// zero. Returns `None` when there is nothing to draw.
    pub fn multi_box(bounds: &[OutlierBounds]) -> Option<Self> {
        let highest = bounds
            .iter()
            .map(|b| b.upper_fence)
            .max_by(f64::total_cmp)?
            .max(0.0);
        let min = 0.0;
        Some(AxisRange {
            min,
            max: highest + MULTI_BOX_PADDING * (highest - min),
        })
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Range safe to hand to a chart backend
    ///
    /// A constant sample or a multi-box image of non-positive values gives a
    /// zero-width axis, which is widened around its centre. Other ranges are returned unchanged.
    pub fn drawable(&self) -> Self {
        if self.span() > 0.0 {
            return *self;
        }
        let centre = (self.min + self.max) / 2.0;
        let half = (centre.abs() * SINGLE_BOX_PADDING).max(1.0);
        AxisRange {
            min: centre - half,
            max: centre + half,
        }
    }
}
