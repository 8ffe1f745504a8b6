use std::panic;
use std::path::Path;

use anyhow::Result;
use crash_impact::{realized_peak, sort_crashes, CrashEvent, Severity, SortDirection, SortKey};
use plotters::coord::Shift;
use plotters::prelude::*;

const CHART_SIZE: (u32, u32) = (1280, 720);

const HIC_COLOR: RGBColor = RGBColor(239, 68, 68);
const BRIC_COLOR: RGBColor = RGBColor(59, 130, 246);
const ACCEL_COLOR: RGBColor = RGBColor(16, 185, 129);

/// Run a render closure, turning backend panics into errors.
pub fn render_guard<F>(render: F) -> Result<(), String>
where
    F: FnOnce() -> Result<()>,
{
    panic::catch_unwind(panic::AssertUnwindSafe(render))
        .map_err(|_| "plotting backend panicked".to_string())?
        .map_err(|err| format!("plotting error: {}", err))
}

pub fn render_waveform(crash: &CrashEvent, path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    draw_waveform(root, crash)
}

pub fn render_metrics(crashes: &[&CrashEvent], path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    draw_metrics(root, crashes)
}

fn draw_waveform<DB>(root: DrawingArea<DB, Shift>, crash: &CrashEvent) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let x_max = crash
        .waveform
        .last()
        .map(|s| f64::from(s.time))
        .unwrap_or(0.0)
        .max(1.0);
    let peak = realized_peak(&crash.waveform);
    let y_max = peak.map(|s| s.value).unwrap_or(0.0).max(1.0) * 1.1;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("{} at {} ({})", crash.rider.name, crash.location, crash.race),
            ("sans-serif", 24),
        )
        .margin(25)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 45)
        .build_cartesian_2d(0.0..x_max, 0.0..y_max)?;

    chart
        .configure_mesh()
        .light_line_style(&TRANSPARENT)
        .x_desc("Time (ms)")
        .y_desc("Acceleration (g)")
        .x_label_formatter(&|v| format!("{:.0}", v))
        .y_label_formatter(&|v| format!("{:.0}", v))
        .draw()?;

    let (r, g, b) = crash.severity().rgb();
    let color = RGBColor(r, g, b);
    chart
        .draw_series(LineSeries::new(
            crash
                .waveform
                .iter()
                .map(|s| (f64::from(s.time), s.value)),
            color.stroke_width(2),
        ))?
        .label(format!("Acceleration, {}", crash.severity()))
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], color));

    if let Some(peak) = peak {
        chart
            .draw_series(std::iter::once(Circle::new(
                (f64::from(peak.time), peak.value),
                5,
                BLACK.filled(),
            )))?
            .label(format!("Peak {:.1} g at {} ms", peak.value, peak.time))
            .legend(|(x, y)| Circle::new((x + 15, y), 4, BLACK.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.7))
        .border_style(&BLACK.mix(0.3))
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Crashes ordered by HIC (highest first); each metric is scaled to its own
/// maximum so the three lines share one axis.
fn draw_metrics<DB>(root: DrawingArea<DB, Shift>, crashes: &[&CrashEvent]) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    if crashes.is_empty() {
        root.present()?;
        return Ok(());
    }

    let mut ordered = crashes.to_vec();
    sort_crashes(&mut ordered, SortKey::Hic, SortDirection::Descending);

    let max_hic = ordered.iter().map(|c| f64::from(c.hic)).fold(1.0, f64::max);
    let max_bric = ordered.iter().map(|c| f64::from(c.bric)).fold(1.0, f64::max);
    let max_accel = ordered.iter().map(|c| c.acceleration).fold(1.0, f64::max);
    let x_max = (ordered.len().saturating_sub(1) as f64).max(1.0);

    let mut chart = ChartBuilder::on(&root)
        .caption("Crash impact metrics", ("sans-serif", 24))
        .margin(25)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 45)
        .build_cartesian_2d(0.0..x_max, 0.0..110.0)?;

    chart
        .configure_mesh()
        .light_line_style(&TRANSPARENT)
        .x_desc("Crash incidents (by HIC)")
        .y_desc("Impact value (% of series max)")
        .x_label_formatter(&|v| format!("{:.0}", v + 1.0))
        .y_label_formatter(&|v| format!("{:.0}", v))
        .draw()?;

    let scaled = |value: f64, max: f64| value / (max * 1.1) * 110.0;
    let series: [(&str, RGBColor, Vec<(f64, f64)>); 3] = [
        (
            "HIC",
            HIC_COLOR,
            ordered
                .iter()
                .enumerate()
                .map(|(i, c)| (i as f64, scaled(f64::from(c.hic), max_hic)))
                .collect(),
        ),
        (
            "BRIC",
            BRIC_COLOR,
            ordered
                .iter()
                .enumerate()
                .map(|(i, c)| (i as f64, scaled(f64::from(c.bric), max_bric)))
                .collect(),
        ),
        (
            "Acceleration (g)",
            ACCEL_COLOR,
            ordered
                .iter()
                .enumerate()
                .map(|(i, c)| (i as f64, scaled(c.acceleration, max_accel)))
                .collect(),
        ),
    ];

    for (label, color, points) in series {
        chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], color));
    }

    let critical = scaled(f64::from(Severity::CRITICAL_HIC), max_hic);
    if critical <= 110.0 {
        chart
            .draw_series(LineSeries::new(
                vec![(0.0, critical), (x_max, critical)],
                HIC_COLOR.mix(0.4),
            ))?
            .label("Critical HIC (800)")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], HIC_COLOR.mix(0.4)));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.7))
        .border_style(&BLACK.mix(0.3))
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    root.present()?;
    Ok(())
}
