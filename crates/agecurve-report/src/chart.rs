// Cohort curve charts.
//
// One SVG per metric: mean and median lines over the cohorts in partition
// order, with a shaded band of one sample standard deviation around the
// mean. SVG output needs no system fonts.

use agecurve_baseball::pipeline::aggregate::{CohortStats, CohortSummary};
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during chart generation
#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

type Result<T> = core::result::Result<T, ChartError>;

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 640;

/// `<report>_<metric>.svg`, with anything outside `[A-Za-z0-9_-]`
/// replaced by `_`.
pub fn chart_file_name(report: &str, metric: &str) -> String {
    let stem: String = format!("{report}_{metric}")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}.svg")
}

/// Vertical extent of everything drawn, padded by 5%.
fn y_range(rows: &[CohortStats], floor_zero: bool) -> Result<(f64, f64)> {
    let mut values = Vec::new();
    for row in rows {
        values.push(row.mean);
        values.push(row.median);
        if row.std_dev.is_finite() {
            values.push(row.mean - row.std_dev);
            values.push(row.mean + row.std_dev);
        }
    }
    let finite: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return Err(ChartError::InvalidData(
            "no cohort has a defined statistic".to_string(),
        ));
    }

    let lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let pad = if hi > lo { (hi - lo) * 0.05 } else { lo.abs().max(1.0) * 0.1 };

    let mut lo = lo - pad;
    let hi = hi + pad;
    if floor_zero {
        lo = lo.max(0.0);
    }
    // A floor above every value still needs a drawable range.
    let hi = if hi > lo { hi } else { lo + 1.0 };
    Ok((lo, hi))
}

fn center(index: usize) -> SegmentValue<i32> {
    SegmentValue::CenterOf(index as i32)
}

/// Draw one metric's cohort curve and write it to `output_path`.
///
/// `y_floor_zero` clamps the lower end of the y-axis at zero.
pub fn render_cohort_chart(
    summary: &CohortSummary,
    title: &str,
    output_path: &Path,
    y_floor_zero: bool,
) -> Result<()> {
    let rows = &summary.rows;
    if rows.is_empty() {
        return Err(ChartError::InvalidData(format!(
            "`{}` has no cohorts to plot",
            summary.metric
        )));
    }
    let (y_lo, y_hi) = y_range(rows, y_floor_zero)?;
    // A single cohort still gets a two-slot axis.
    let last = (rows.len() as i32 - 1).max(1);

    let drawing_area = SVGBackend::new(output_path, (WIDTH, HEIGHT)).into_drawing_area();
    drawing_area
        .fill(&WHITE)
        .map_err(|e| ChartError::DrawingArea(e.to_string()))?;

    let mut chart = ChartBuilder::on(&drawing_area)
        .caption(title, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d((0..last).into_segmented(), y_lo..y_hi)
        .map_err(|e| ChartError::ChartConfig(e.to_string()))?;

    let label_of = |value: &SegmentValue<i32>| match value {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => usize::try_from(*i)
            .ok()
            .and_then(|i| rows.get(i))
            .map(|row| row.label.clone())
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(rows.len())
        .x_label_formatter(&label_of)
        .x_desc("Age cohort")
        .y_desc(summary.metric.as_str())
        .label_style(("sans-serif", 16))
        .draw()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    // Band segments only join neighbours that both have a deviation.
    let band_style = BLUE.mix(0.15).filled();
    let bands = rows.windows(2).enumerate().filter_map(|(i, pair)| {
        let (a, b) = (&pair[0], &pair[1]);
        let defined = |r: &CohortStats| r.mean.is_finite() && r.std_dev.is_finite();
        if !(defined(a) && defined(b)) {
            return None;
        }
        Some(Polygon::new(
            vec![
                (center(i), a.mean + a.std_dev),
                (center(i + 1), b.mean + b.std_dev),
                (center(i + 1), b.mean - b.std_dev),
                (center(i), a.mean - a.std_dev),
            ],
            band_style,
        ))
    });
    chart
        .draw_series(bands)
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    let series: [(&str, RGBColor, fn(&CohortStats) -> f64); 2] =
        [("Mean", BLUE, |r| r.mean), ("Median", RED, |r| r.median)];
    for (name, color, pick) in series {
        let points: Vec<(SegmentValue<i32>, f64)> = rows
            .iter()
            .enumerate()
            .filter(|(_, r)| pick(r).is_finite())
            .map(|(i, r)| (center(i), pick(r)))
            .collect();

        chart
            .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
            .map_err(|e| ChartError::Drawing(e.to_string()))?
            .label(name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        chart
            .draw_series(points.into_iter().map(|p| Circle::new(p, 4, color.filled())))
            .map_err(|e| ChartError::Drawing(e.to_string()))?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;

    drawing_area
        .present()
        .map_err(|e| ChartError::Drawing(e.to_string()))?;
    debug!("Wrote chart {}", output_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agecurve_baseball::pipeline::aggregate::summarize;

    fn summary() -> CohortSummary {
        CohortSummary {
            metric: "HR".into(),
            rows: vec![
                summarize("20-24", &[8.0, 12.0]),
                summarize("25-29", &[20.0, 26.0, 23.0]),
                summarize("30-34", &[18.0]),
            ],
        }
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(chart_file_name("batting", "HR"), "batting_HR.svg");
        assert_eq!(
            chart_file_name("batting fine", "avg/9 (adj)"),
            "batting_fine_avg_9__adj_.svg"
        );
        assert_eq!(chart_file_name("pitching", "ERA"), "pitching_ERA.svg");
    }

    #[test]
    fn y_range_floor_and_padding() {
        let rows = summary().rows;
        let (lo, hi) = y_range(&rows, false).unwrap();
        assert!(lo < 8.0);
        assert!(hi > 26.0);

        let rows = vec![summarize("a", &[0.1, 2.0])];
        let (lo, _) = y_range(&rows, false).unwrap();
        assert!(lo < 0.0);
        let (lo, hi) = y_range(&rows, true).unwrap();
        assert_eq!(lo, 0.0);
        assert!(hi > lo);
    }

    #[test]
    fn y_range_of_single_point() {
        let rows = vec![summarize("a", &[5.0])];
        let (lo, hi) = y_range(&rows, false).unwrap();
        assert!(lo < 5.0 && hi > 5.0);
    }

    #[test]
    fn all_undefined_is_invalid() {
        let rows = vec![summarize("a", &[])];
        assert!(matches!(y_range(&rows, false), Err(ChartError::InvalidData(_))));
    }

    #[test]
    fn renders_svg_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(chart_file_name("batting", "HR"));
        render_cohort_chart(&summary(), "batting: HR", &path, true).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("25-29"));
        assert!(svg.contains("Median"));
    }

    #[test]
    fn single_cohort_renders() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.svg");
        let summary = CohortSummary {
            metric: "ERA".into(),
            rows: vec![summarize("30-34", &[3.5])],
        };
        render_cohort_chart(&summary, "pitching: ERA", &path, true).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn empty_summary_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let summary = CohortSummary {
            metric: "HR".into(),
            rows: vec![],
        };
        let err = render_cohort_chart(&summary, "t", &dir.path().join("x.svg"), false);
        assert!(matches!(err, Err(ChartError::InvalidData(_))));
    }
}
