//! HTML comparison charts (actual vs forecast) rendered with Plotters.
//!
//! Each series gets `<reports_dir>/<name>_forecast.html`: a standalone HTML
//! page wrapping an inline SVG with four traces (actual, forecast, upper and
//! lower bound) and a shaded uncertainty band.
//!
//! The x axis is days since the Unix epoch; tick labels are formatted back to
//! dates.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime};
use plotters::prelude::*;

use crate::domain::{CanonicalSeries, ForecastTable};
use crate::error::PipelineError;
use crate::io::file_stem;

const CHART_SIZE: (u32, u32) = (1000, 520);
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Write one HTML chart per forecast series.
pub fn write_reports(
    dir: &Path,
    actuals: &BTreeMap<String, CanonicalSeries>,
    forecasts: &BTreeMap<String, ForecastTable>,
    y_label: Option<&str>,
) -> Result<Vec<PathBuf>, PipelineError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        PipelineError::Report(format!("Failed to create reports dir '{}': {e}", dir.display()))
    })?;

    let empty = CanonicalSeries::default();
    let mut written = Vec::with_capacity(forecasts.len());
    for (name, forecast) in forecasts {
        let actual = actuals.get(name).unwrap_or(&empty);
        let html = render_chart_html(name, actual, forecast, y_label.unwrap_or(""))?;
        let path = dir.join(format!("{}_forecast.html", file_stem(name)));
        std::fs::write(&path, html).map_err(|e| {
            PipelineError::Report(format!("Failed to write chart '{}': {e}", path.display()))
        })?;
        tracing::debug!(series = %name, path = %path.display(), "wrote chart");
        written.push(path);
    }
    Ok(written)
}

/// Standalone HTML page for one series.
pub fn render_chart_html(
    name: &str,
    actual: &CanonicalSeries,
    forecast: &ForecastTable,
    y_label: &str,
) -> Result<String, PipelineError> {
    let svg = render_chart_svg(name, actual, forecast, y_label)?;
    let title = escape_html(name);
    Ok(format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title} forecast</title>\n</head>\n<body>\n{svg}\n</body>\n</html>\n"
    ))
}

/// Inline SVG markup for one series.
pub fn render_chart_svg(
    name: &str,
    actual: &CanonicalSeries,
    forecast: &ForecastTable,
    y_label: &str,
) -> Result<String, PipelineError> {
    let actual_pts: Vec<(f64, f64)> = actual.iter().map(|(ds, y)| (to_days(ds), y)).collect();
    let yhat: Vec<(f64, f64)> = forecast.rows.iter().map(|r| (to_days(r.ds), r.yhat)).collect();
    let upper: Vec<(f64, f64)> = forecast.rows.iter().map(|r| (to_days(r.ds), r.yhat_upper)).collect();
    let lower: Vec<(f64, f64)> = forecast.rows.iter().map(|r| (to_days(r.ds), r.yhat_lower)).collect();

    let all = || actual_pts.iter().chain(&upper).chain(&lower);
    let (x_min, x_max) = pad_range(all().map(|p| p.0)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(all().map(|p| p.1)).unwrap_or((0.0, 1.0));

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(name, ("sans-serif", 22))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(64)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(chart_err)?;

        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc(y_label)
            .x_label_formatter(&|x| format_day(*x))
            .draw()
            .map_err(chart_err)?;

        if !upper.is_empty() {
            let band: Vec<(f64, f64)> = upper.iter().chain(lower.iter().rev()).copied().collect();
            chart
                .draw_series(std::iter::once(Polygon::new(band, BLUE.mix(0.15))))
                .map_err(chart_err)?;
        }

        chart
            .draw_series(LineSeries::new(actual_pts.iter().copied(), &BLACK))
            .map_err(chart_err)?
            .label("Actual")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLACK));

        chart
            .draw_series(LineSeries::new(yhat.iter().copied(), &BLUE))
            .map_err(chart_err)?
            .label("Forecast")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

        for (label, pts) in [("Upper Bound", &upper), ("Lower Bound", &lower)] {
            chart
                .draw_series(LineSeries::new(pts.iter().copied(), BLUE.mix(0.3)))
                .map_err(chart_err)?
                .label(label)
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.mix(0.3)));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(chart_err)?;

        root.present().map_err(chart_err)?;
    }
    Ok(svg)
}

fn chart_err(e: impl std::fmt::Display) -> PipelineError {
    PipelineError::Report(format!("Chart rendering failed: {e}"))
}

fn to_days(ts: NaiveDateTime) -> f64 {
    ts.and_utc().timestamp() as f64 / SECONDS_PER_DAY
}

fn format_day(days: f64) -> String {
    DateTime::from_timestamp((days * SECONDS_PER_DAY).round() as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn pad_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !(min.is_finite() && max.is_finite()) {
        return None;
    }
    let pad = ((max - min).abs() * 0.05).max(1e-6);
    Some((min - pad, max + pad))
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ForecastRow;
    use chrono::NaiveDate;

    fn month(m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, m, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn inputs() -> (CanonicalSeries, ForecastTable) {
        let actual = CanonicalSeries::new(vec![month(1), month(2), month(3)], vec![1.0, 2.0, 3.0]).unwrap();
        let forecast = ForecastTable::new(
            (4..=6)
                .map(|m| ForecastRow {
                    ds: month(m),
                    yhat: m as f64,
                    yhat_lower: m as f64 - 0.5,
                    yhat_upper: m as f64 + 0.5,
                })
                .collect(),
        );
        (actual, forecast)
    }

    #[test]
    fn html_embeds_svg_and_escapes_title() {
        let (actual, forecast) = inputs();
        let html = render_chart_html("A&B", &actual, &forecast, "Units").unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>A&amp;B forecast</title>"));
        assert!(html.contains("<svg"));
        assert!(html.contains("Forecast"));
    }

    #[test]
    fn empty_inputs_still_render() {
        let svg = render_chart_svg("empty", &CanonicalSeries::default(), &ForecastTable::default(), "").unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn day_axis_round_trips_dates() {
        assert_eq!(format_day(to_days(month(3))), "2020-03-01");
    }

    #[test]
    fn writes_one_page_per_series() {
        let (actual, forecast) = inputs();
        let mut actuals = BTreeMap::new();
        actuals.insert("North East".to_string(), actual);
        let mut forecasts = BTreeMap::new();
        forecasts.insert("North East".to_string(), forecast);

        let dir = std::env::temp_dir().join(format!("sf-reports-{}", std::process::id()));
        let written = write_reports(&dir, &actuals, &forecasts, Some("Units")).unwrap();
        assert_eq!(written, vec![dir.join("North_East_forecast.html")]);
        assert!(written[0].exists());
        std::fs::remove_dir_all(&dir).ok();
    }
}
