//! ASCII plotting for terminal output.
//!
//! Fixed-size grid with deterministic output, so it can be golden-tested.
//!
//! Plot elements:
//! - observed values: `o`
//! - forecast: `-` line
//! - interval bounds: `.`

use chrono::NaiveDateTime;

use crate::domain::{CanonicalSeries, ForecastTable};

/// Render one series' history with its forecast overlaid.
pub fn render_ascii_plot(
    name: &str,
    actual: &CanonicalSeries,
    forecast: &ForecastTable,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let observed: Vec<(f64, f64)> = actual.iter().map(|(ds, y)| (to_days(ds), y)).collect();
    let yhat: Vec<(f64, f64)> = forecast.rows.iter().map(|r| (to_days(r.ds), r.yhat)).collect();
    let lower: Vec<(f64, f64)> = forecast.rows.iter().map(|r| (to_days(r.ds), r.yhat_lower)).collect();
    let upper: Vec<(f64, f64)> = forecast.rows.iter().map(|r| (to_days(r.ds), r.yhat_upper)).collect();

    let all = || observed.iter().chain(&lower).chain(&upper);
    let (x_min, x_max) = range(all().map(|p| p.0)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = range(all().map(|p| p.1)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let frame = Frame { x_min, x_max, y_min, y_max };

    // Bounds first, then the forecast, then observations on top.
    for &(x, y) in lower.iter().chain(&upper) {
        let (col, row) = frame.cell(x, y, width, height);
        grid[row][col] = '.';
    }
    draw_curve(&mut grid, &yhat, &frame);
    for &(x, y) in &observed {
        let (col, row) = frame.cell(x, y, width, height);
        grid[row][col] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {name} | ds=[{}, {}] | y=[{y_min:.2}, {y_max:.2}]\n",
        format_day(x_min),
        format_day(x_max),
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out
}

struct Frame {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl Frame {
    fn cell(&self, x: f64, y: f64, width: usize, height: usize) -> (usize, usize) {
        (
            map_x(x, self.x_min, self.x_max, width),
            map_y(y, self.y_min, self.y_max, height),
        )
    }
}

fn to_days(ts: NaiveDateTime) -> f64 {
    ts.and_utc().timestamp() as f64 / 86_400.0
}

fn format_day(days: f64) -> String {
    chrono::DateTime::from_timestamp((days * 86_400.0).round() as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "?".to_string())
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if min.is_finite() && max.is_finite() && max > min {
        Some((min, max))
    } else if min.is_finite() && max.is_finite() {
        Some((min - 0.5, max + 0.5))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], frame: &Frame) {
    let height = grid.len();
    let width = grid.first().map_or(0, Vec::len);

    let mut prev = None;
    for &(x, y) in curve {
        let (col, row) = frame.cell(x, y, width, height);
        match prev {
            Some((c0, r0)) => draw_line(grid, c0, r0, col, row, '-'),
            None => grid[row][col] = '-',
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham). Overwrites blanks and bound markers only.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid
            .get_mut(y0 as usize)
            .and_then(|row| row.get_mut(x0 as usize))
            .filter(|c| matches!(**c, ' ' | '.'))
        {
            *cell = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ForecastRow;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 1, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let actual = CanonicalSeries::new(vec![day(1), day(10)], vec![100.0, 110.0]).unwrap();
        let forecast = ForecastTable::new(vec![
            ForecastRow { ds: day(1), yhat: 100.0, yhat_lower: 100.0, yhat_upper: 100.0 },
            ForecastRow { ds: day(10), yhat: 100.0, yhat_lower: 100.0, yhat_upper: 100.0 },
        ]);

        let txt = render_ascii_plot("demo", &actual, &forecast, 10, 5);
        let expected = concat!(
            "Plot: demo | ds=[2020-01-01, 2020-01-10] | y=[99.50, 110.50]\n",
            "         o\n",
            "\n",
            "\n",
            "\n",
            "o---------\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn empty_inputs_render_blank_grid() {
        let txt = render_ascii_plot("none", &CanonicalSeries::default(), &ForecastTable::default(), 10, 5);
        assert_eq!(txt.lines().count(), 6);
        assert!(txt.lines().skip(1).all(str::is_empty));
    }
}
