//! ASCII plotting of a prediction series for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - prediction line: `-`
//! - individual predictions: `o` (only when there is room for every point)

use chrono::NaiveDateTime;

use crate::domain::Prediction;

/// Render predictions against time.
pub fn render_prediction_plot(predictions: &[Prediction], value_name: &str, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let mut series: Vec<(NaiveDateTime, f64)> = predictions.iter().map(|p| (p.timestamp, p.value)).collect();
    series.sort_by_key(|(ts, _)| *ts);

    let (Some(&(t0, _)), Some(&(t1, _))) = (series.first(), series.last()) else {
        return format!("Plot: no predictions to draw for {value_name}\n");
    };

    let span = (t1 - t0).num_seconds().max(1) as f64;
    let points: Vec<(f64, f64)> = series
        .iter()
        .map(|(ts, y)| ((*ts - t0).num_seconds() as f64, *y))
        .collect();

    let (y_min, y_max) = y_range(&points);
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    draw_series(&mut grid, &points, span, y_min, y_max);

    if points.len() <= width {
        for &(x, y) in &points {
            let col = map_x(x, 0.0, span, width);
            let row = map_y(y, y_min, y_max, height);
            grid[row][col] = 'o';
        }
    }

    // Build final string. We include a small header with ranges.
    let mut out = String::new();
    out.push_str(&format!(
        "Plot: time=[{}, {}] | {value_name}=[{y_min:.2}, {y_max:.2}]\n",
        t0.format("%Y-%m-%d %H:%M"),
        t1.format("%Y-%m-%d %H:%M"),
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn y_range(points: &[(f64, f64)]) -> (f64, f64) {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(_, y) in points {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    if !(min_y.is_finite() && max_y.is_finite()) {
        return (0.0, 1.0);
    }
    if max_y <= min_y {
        // Flat series: open a unit window around the value.
        return (min_y - 0.5, max_y + 0.5);
    }
    (min_y, max_y)
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

fn draw_series(grid: &mut [Vec<char>], series: &[(f64, f64)], span: f64, y_min: f64, y_max: f64) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(t, y) in series {
        let x = map_x(t, 0.0, span, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, x, yy, '-');
        } else {
            grid[yy][x] = '-';
        }
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham-ish).
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
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
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
