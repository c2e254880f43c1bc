//! Terminal line chart for the historical series.

use chrono::NaiveDate;

use crate::output::format_money;

/// One line of the chart; `values` are aligned with the chart's dates.
pub struct ChartLine<'a> {
    pub label: &'a str,
    pub glyph: char,
    pub values: &'a [f64],
}

/// Render `lines` over `dates` into a `width` × `height` plot with a y-axis
/// scale, first/last date labels and a legend.
///
/// Lines are drawn in order, so a later line overwrites an earlier one where
/// they cross.
pub fn render_line_chart(dates: &[NaiveDate], lines: &[ChartLine<'_>], width: usize, height: usize) -> String {
    if dates.is_empty() || lines.iter().all(|l| l.values.is_empty()) {
        return "No historical data.".to_string();
    }

    let height = height.max(2);
    let columns = width.max(2).min(dates.len().max(2));

    let (min, max) = lines
        .iter()
        .flat_map(|l| l.values.iter().copied())
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !min.is_finite() || !max.is_finite() {
        return "No historical data.".to_string();
    }

    let mut grid = vec![vec![' '; columns]; height];
    for line in lines {
        if line.values.is_empty() {
            continue;
        }
        for col in 0..columns {
            let idx = sample_index(col, columns, line.values.len());
            let value = line.values[idx];
            if !value.is_finite() {
                continue;
            }
            let row = value_row(value, min, max, height);
            grid[row][col] = line.glyph;
        }
    }

    let top_label = format_money(max);
    let bottom_label = format_money(min);
    let label_width = top_label.len().max(bottom_label.len());

    let mut out = String::new();
    for (i, row) in grid.iter().enumerate() {
        let label = if i == 0 {
            top_label.as_str()
        } else if i == height - 1 {
            bottom_label.as_str()
        } else {
            ""
        };
        let body: String = row.iter().collect();
        out.push_str(&format!("{label:>label_width$} |{}\n", body.trim_end()));
    }
    out.push_str(&format!("{:>label_width$} +{}\n", "", "-".repeat(columns)));

    let first = dates[0].to_string();
    let last = dates[dates.len() - 1].to_string();
    let gap = columns.saturating_sub(first.len() + last.len()).max(1);
    out.push_str(&format!(
        "{:>label_width$}  {first}{}{last}\n",
        "",
        " ".repeat(gap)
    ));

    let legend: Vec<String> = lines
        .iter()
        .map(|l| format!("{} {}", l.glyph, l.label))
        .collect();
    out.push_str(&format!("{:>label_width$}  {}", "", legend.join("   ")));
    out
}

/// Map a column to a sample index, spreading samples evenly.
fn sample_index(col: usize, columns: usize, samples: usize) -> usize {
    if samples <= 1 || columns <= 1 {
        return 0;
    }
    let idx = (col as f64 * (samples - 1) as f64 / (columns - 1) as f64).round() as usize;
    idx.min(samples - 1)
}

/// Row 0 is the top (max value).
fn value_row(value: f64, min: f64, max: f64, height: usize) -> usize {
    if max <= min {
        return height / 2;
    }
    let fraction = (max - value) / (max - min);
    let row = (fraction * (height - 1) as f64).round() as usize;
    row.min(height - 1)
}
