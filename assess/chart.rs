//! Horizontal bar charts of the encoded feature vector.
//!
//! `ChartData` is front-end neutral: the terminal form draws it with ratatui and
//! the one-shot report draws it as text with `render_text`.

use crate::present::ConcernLevel;
use crossterm::style::{Color, Stylize};
use std::fmt::Write as FmtWrite;

/// Bar color used when a chart is not colored by concern (matplotlib's "salmon").
pub const UNIFORM_RGB: (u8, u8, u8) = (250, 128, 114);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarTone {
    Uniform,
    Concern(ConcernLevel),
}

impl BarTone {
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            BarTone::Uniform => UNIFORM_RGB,
            BarTone::Concern(ConcernLevel::High) => (220, 20, 20),
            BarTone::Concern(ConcernLevel::Moderate) => (255, 165, 0),
            BarTone::Concern(ConcernLevel::Low) => (0, 160, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartBar {
    pub label: &'static str,
    pub value: f64,
    pub tone: BarTone,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub title: &'static str,
    pub axis_label: &'static str,
    pub bars: Vec<ChartBar>,
}

impl ChartData {
    pub fn max_value(&self) -> f64 {
        self.bars.iter().map(|b| b.value).fold(0.0, f64::max)
    }
}

/// Formats a bar value the way the form displays numbers: whole numbers without
/// a fractional part, everything else with one decimal.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

/// Number of cells a bar occupies when the largest value spans `width` cells.
pub fn bar_cells(value: f64, max_value: f64, width: usize) -> usize {
    if max_value <= 0.0 || value <= 0.0 {
        return 0;
    }
    ((value / max_value) * width as f64).round() as usize
}

/// Renders a chart as text lines, one bar per line, with the axis label last.
///
/// With `colored` set, bars carry ANSI colors; otherwise each bar is drawn with a
/// glyph so the concern level stays readable in plain text.
pub fn render_text(chart: &ChartData, width: usize, colored: bool) -> String {
    let label_width = chart.bars.iter().map(|b| b.label.len()).max().unwrap_or(0);
    let max_value = chart.max_value();

    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "{}", chart.title);
    for bar in &chart.bars {
        let cells = bar_cells(bar.value, max_value, width);
        let body = if colored {
            let (r, g, b) = bar.tone.rgb();
            "█".repeat(cells).with(Color::Rgb { r, g, b }).to_string()
        } else {
            glyph(bar.tone).to_string().repeat(cells)
        };
        let _ = writeln!(
            out,
            "{:>label_width$} │{} {}",
            bar.label,
            body,
            format_value(bar.value)
        );
    }
    let _ = write!(out, "{:>label_width$}  {}", "", chart.axis_label);
    out
}

fn glyph(tone: BarTone) -> char {
    match tone {
        BarTone::Uniform => '█',
        BarTone::Concern(ConcernLevel::High) => '█',
        BarTone::Concern(ConcernLevel::Moderate) => '▓',
        BarTone::Concern(ConcernLevel::Low) => '░',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ChartData {
        ChartData {
            title: "Profile",
            axis_label: "Level",
            bars: vec![
                ChartBar {
                    label: "Age",
                    value: 50.0,
                    tone: BarTone::Concern(ConcernLevel::High),
                },
                ChartBar {
                    label: "Parity",
                    value: 25.0,
                    tone: BarTone::Concern(ConcernLevel::Moderate),
                },
                ChartBar {
                    label: "Urban",
                    value: 0.0,
                    tone: BarTone::Concern(ConcernLevel::Low),
                },
            ],
        }
    }

    #[test]
    fn bars_scale_to_the_largest_value() {
        assert_eq!(bar_cells(50.0, 50.0, 40), 40);
        assert_eq!(bar_cells(25.0, 50.0, 40), 20);
        assert_eq!(bar_cells(0.0, 50.0, 40), 0);
        assert_eq!(bar_cells(3.0, 0.0, 40), 0);
    }

    #[test]
    fn values_keep_one_decimal_only_when_needed() {
        assert_eq!(format_value(50.0), "50");
        assert_eq!(format_value(31.2), "31.2");
        assert_eq!(format_value(5.0), "5");
    }

    #[test]
    fn plain_text_rendering_uses_glyphs() {
        let text = render_text(&sample(), 10, false);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Profile");
        assert_eq!(lines[1], "   Age │██████████ 50");
        assert_eq!(lines[2], "Parity │▓▓▓▓▓ 25");
        assert_eq!(lines[3], " Urban │ 0");
        assert_eq!(lines[4], "        Level");
    }

    #[test]
    fn colored_rendering_keeps_layout() {
        let text = render_text(&sample(), 10, true);
        assert_eq!(text.lines().count(), 5);
        assert!(text.lines().nth(2).unwrap().starts_with("Parity │"));
        assert!(text.lines().nth(2).unwrap().ends_with(" 25"));
    }
}
