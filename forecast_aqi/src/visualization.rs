//! Charts of the test-segment forecast.

use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;

/// Y-axis range covering every series, padded by 5% on each side.
///
/// Falls back to `0..1` when no finite value is present.
pub fn value_range(series: &[&[f64]]) -> Range<f64> {
    let finite: Vec<f64> = series
        .iter()
        .flat_map(|s| s.iter().cloned())
        .filter(|v| v.is_finite())
        .collect();
    if finite.is_empty() {
        return 0.0..1.0;
    }
    let (lo, hi) = stats::find_min_max(&finite);
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };
    (lo - pad)..(hi + pad)
}

/// Actual versus predicted index over the test segment, as a PNG.
///
/// # Arguments
/// * `actual` - Observed index values
/// * `predicted` - Forecasts aligned with `actual`
/// * `output_path` - Path where the chart PNG will be saved
pub fn plot_forecast<P: AsRef<Path>>(
    actual: &[f64],
    predicted: &[f64],
    output_path: P,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(output_path.as_ref(), (1280, 720)).into_drawing_area();
    root.fill(&WHITE)?;

    let n = actual.len().max(predicted.len()).max(1);
    let mut chart = ChartBuilder::on(&root)
        .caption("AQI forecast: actual vs predicted", ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0usize..n, value_range(&[actual, predicted]))?;

    chart
        .configure_mesh()
        .x_desc("Test day")
        .y_desc("Index value")
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            actual.iter().enumerate().map(|(i, v)| (i, *v)),
            &BLUE,
        ))?
        .label("Actual")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    chart
        .draw_series(LineSeries::new(
            predicted.iter().enumerate().map(|(i, v)| (i, *v)),
            &RED,
        ))?
        .label("Predicted")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));

    chart.configure_series_labels().border_style(&BLACK).draw()?;
    root.present()?;
    Ok(())
}

/// Residuals `actual - predicted` with a zero line, as a PNG
pub fn plot_residuals<P: AsRef<Path>>(
    residuals: &[f64],
    output_path: P,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(output_path.as_ref(), (1280, 480)).into_drawing_area();
    root.fill(&WHITE)?;

    let n = residuals.len().max(1);
    let mut chart = ChartBuilder::on(&root)
        .caption("Forecast residuals", ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0usize..n, value_range(&[residuals, &[0.0]]))?;

    chart.configure_mesh().x_desc("Test day").draw()?;

    chart.draw_series(LineSeries::new(vec![(0, 0.0), (n, 0.0)], &BLACK))?;
    chart.draw_series(
        residuals
            .iter()
            .enumerate()
            .map(|(i, r)| Circle::new((i, *r), 4, ShapeStyle::from(&MAGENTA).filled())),
    )?;

    root.present()?;
    Ok(())
}
