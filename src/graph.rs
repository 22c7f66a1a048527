use crate::axis::AxisRange;
use crate::error::AppError;
use crate::stats::OutlierBounds;
use std::path::Path;

/// Pixels per inch of figure size
const PIXELS_PER_INCH: f64 = 100.0;

/// Figure size of a single-box image, in inches
const SINGLE_BOX_FIGURE: (f64, f64) = (5.0, 6.0);

/// Minimum width and height of a multi-box image, in inches
const MULTI_BOX_FIGURE: (f64, f64) = (10.0, 6.0);

/// Extra width given to each category of a multi-box image, in inches
const INCHES_PER_CATEGORY: f64 = 0.5;

/// Everything needed to draw one box
#[derive(Clone, Debug, PartialEq)]
pub struct BoxSummary {
    /// Category shown under the box; empty for a single-box image
    pub label: String,
    pub bounds: OutlierBounds,
    /// Lowest sample value inside the lower fence
    pub whisker_low: f64,
    /// Highest sample value inside the upper fence
    pub whisker_high: f64,
    /// Sample values beyond either fence
    pub outliers: Vec<f64>,
}

impl BoxSummary {
    /// Summarize a sample, `None` when it is empty
    pub fn from_sample(label: impl Into<String>, sample: &[f64]) -> Option<Self> {
        let bounds = OutlierBounds::from_sample(sample)?;
        let inside = |v: &&f64| **v >= bounds.lower_fence && **v <= bounds.upper_fence;

        let whisker_low = sample
            .iter()
            .filter(inside)
            .copied()
            .min_by(f64::total_cmp)
            .unwrap_or(bounds.q1);
        let whisker_high = sample
            .iter()
            .filter(inside)
            .copied()
            .max_by(f64::total_cmp)
            .unwrap_or(bounds.q3);
        let outliers = sample
            .iter()
            .filter(|v| !inside(v))
            .copied()
            .collect();

        Some(BoxSummary {
            label: label.into(),
            bounds,
            whisker_low,
            whisker_high,
            outliers,
        })
    }
}

/// Description of one box-plot image
#[derive(Clone, Debug, PartialEq)]
pub struct BoxPlot {
    pub title: String,
    /// Value-axis caption, the value column name
    pub y_label: String,
    /// Category-axis caption, the secondary column name for multi-box images
    pub x_label: Option<String>,
    pub boxes: Vec<BoxSummary>,
    pub y_range: AxisRange,
    pub width: u32,
    pub height: u32,
}

impl BoxPlot {
    /// One box for a whole group, on a tightened axis
    pub fn single(group: &str, value_column: &str, summary: BoxSummary) -> Self {
        let y_range = AxisRange::single_box(&summary.bounds);
        BoxPlot {
            title: format!("Group {}", group),
            y_label: value_column.to_string(),
            x_label: None,
            boxes: vec![summary],
            y_range,
            width: inches(SINGLE_BOX_FIGURE.0),
            height: inches(SINGLE_BOX_FIGURE.1),
        }
    }

    /// One box per secondary category, on a shared axis starting at zero
    ///
    /// `categories` counts every category of the group, including those
    /// without a numeric value, and sets the figure width. Returns `None`
    /// when no category has any value to plot.
    pub fn multi(
        group: &str,
        value_column: &str,
        secondary_column: &str,
        categories: usize,
        boxes: Vec<BoxSummary>,
    ) -> Option<Self> {
        let bounds: Vec<OutlierBounds> = boxes.iter().map(|b| b.bounds).collect();
        let y_range = AxisRange::multi_box(&bounds)?;
        let width = MULTI_BOX_FIGURE
            .0
            .max(categories.max(boxes.len()) as f64 * INCHES_PER_CATEGORY);

        Some(BoxPlot {
            title: format!("Group {}", group),
            y_label: value_column.to_string(),
            x_label: Some(secondary_column.to_string()),
            boxes,
            y_range,
            width: inches(width),
            height: inches(MULTI_BOX_FIGURE.1),
        })
    }
}

fn inches(size: f64) -> u32 {
    (size * PIXELS_PER_INCH).round() as u32
}

/// Turns a [`BoxPlot`] into an image file
///
/// Implementations write exactly one file per call and keep no drawing
/// state between calls.
pub trait PlotRenderer: Send + Sync {
    fn render(&self, plot: &BoxPlot, path: &Path) -> Result<(), AppError>;
}

#[cfg(feature = "web")]
pub use self::bitmap::PlottersRenderer;

#[cfg(feature = "web")]
mod bitmap {
    use super::{BoxPlot, PlotRenderer};
    use crate::axis::AxisRange;
    use crate::error::AppError;
    use plotters::prelude::*;
    use std::path::Path;

    const SINGLE_BOX_COLOR: RGBColor = RGBColor(173, 216, 230);

    /// PNG renderer backed by `plotters`' bitmap backend
    #[derive(Clone, Copy, Debug, Default)]
    pub struct PlottersRenderer;

    impl PlotRenderer for PlottersRenderer {
        fn render(&self, plot: &BoxPlot, path: &Path) -> Result<(), AppError> {
            draw_box_plot(plot, path).map_err(|e| AppError::Render(e.to_string()))
        }
    }

    /// Draws the plot onto a fresh bitmap and presents it
    ///
    /// Boxes sit at integer x positions; the axis spans half a slot on each
    /// side. Coordinates outside the value range are clipped to its edges
    /// and outliers beyond it are not drawn.
    fn draw_box_plot(plot: &BoxPlot, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let root = BitMapBackend::new(path, (plot.width, plot.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let range = plot.y_range.drawable();
        let slots = plot.boxes.len().max(1);
        let multi = plot.x_label.is_some();
        let half_width = if multi { 0.3 } else { 0.15 };

        let mut chart = ChartBuilder::on(&root)
            .caption(&plot.title, ("sans-serif", 28).into_font())
            .margin(15)
            .x_label_area_size(if multi { 90 } else { 10 })
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5f64..(slots as f64 - 0.5), range.min..range.max)?;

        let category_at = |x: &f64| -> String {
            let slot = x.round();
            if (x - slot).abs() > 1e-6 || slot < 0.0 {
                return String::new();
            }
            plot.boxes
                .get(slot as usize)
                .map(|b| b.label.clone())
                .unwrap_or_default()
        };

        {
            let mut mesh = chart.configure_mesh();
            mesh.disable_x_mesh()
                .y_desc(plot.y_label.as_str())
                .x_label_formatter(&category_at);
            match &plot.x_label {
                Some(x_label) => {
                    mesh.x_desc(x_label.as_str())
                        .x_labels(slots)
                        .x_label_style(
                            ("sans-serif", 12)
                                .into_font()
                                .transform(FontTransform::Rotate90),
                        );
                }
                None => {
                    mesh.x_labels(0);
                }
            }
            mesh.draw()?;
        }

        let clip = |v: f64| clamp(v, &range);
        let fill = |i: usize| -> ShapeStyle {
            if multi {
                Palette99::pick(i).mix(0.8).filled()
            } else {
                SINGLE_BOX_COLOR.filled()
            }
        };

        for (i, summary) in plot.boxes.iter().enumerate() {
            let x = i as f64;
            let b = &summary.bounds;
            let (left, right) = (x - half_width, x + half_width);
            let cap = half_width / 2.0;

            chart.draw_series(std::iter::once(Rectangle::new(
                [(left, clip(b.q1)), (right, clip(b.q3))],
                fill(i),
            )))?;
            chart.draw_series(std::iter::once(Rectangle::new(
                [(left, clip(b.q1)), (right, clip(b.q3))],
                BLACK.stroke_width(1),
            )))?;
            chart.draw_series(
                [
                    vec![(left, clip(b.median)), (right, clip(b.median))],
                    vec![(x, clip(b.q3)), (x, clip(summary.whisker_high))],
                    vec![(x, clip(b.q1)), (x, clip(summary.whisker_low))],
                    vec![(x - cap, clip(summary.whisker_high)), (x + cap, clip(summary.whisker_high))],
                    vec![(x - cap, clip(summary.whisker_low)), (x + cap, clip(summary.whisker_low))],
                ]
                .into_iter()
                .map(|points| PathElement::new(points, BLACK.stroke_width(1))),
            )?;
            chart.draw_series(
                summary
                    .outliers
                    .iter()
                    .filter(|v| **v >= range.min && **v <= range.max)
                    .map(|v| Circle::new((x, *v), 2, BLACK.filled())),
            )?;
        }

        root.present()?;
        Ok(())
    }

    fn clamp(value: f64, range: &AxisRange) -> f64 {
        value.max(range.min).min(range.max)
    }
}
