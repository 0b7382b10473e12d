//! Colored terminal rendering.

use colored::*;

use super::charts::{BarChart, LineChart, PieChart};
use super::{BreakdownItem, Surface, Tag};
use crate::palette::Rgb;

const BAR_WIDTH: usize = 30;

/// Text surface backed by an in-memory buffer.
///
/// Nothing is written to the terminal until the caller prints
/// [`TerminalSurface::contents`], so a failed run never leaves half a report
/// on screen.
pub struct TerminalSurface {
    color: bool,
    buf: String,
}

impl TerminalSurface {
    pub fn new(color: bool) -> Self {
        Self { color, buf: String::new() }
    }

    /// No ANSI escapes; used for piping and tests.
    pub fn plain() -> Self {
        Self::new(false)
    }

    pub fn contents(&self) -> &str {
        &self.buf
    }

    fn paint(&self, s: &str, c: Rgb) -> String {
        if self.color {
            s.truecolor(c.r, c.g, c.b).bold().to_string()
        } else {
            s.to_string()
        }
    }

    fn heading(&mut self, title: &str) {
        if !self.buf.is_empty() {
            self.buf.push('\n');
        }
        let line = if self.color {
            title.bright_cyan().bold().to_string()
        } else {
            title.to_string()
        };
        self.buf.push_str(&line);
        self.buf.push('\n');
    }

    fn dim(&self, s: &str) -> String {
        if self.color {
            s.dimmed().to_string()
        } else {
            s.to_string()
        }
    }
}

fn block_bar(fraction: f64) -> String {
    let filled = (fraction.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "·".repeat(BAR_WIDTH - filled))
}

impl Surface for TerminalSurface {
    fn reset(&mut self) {
        self.buf.clear();
    }

    fn draw_trend(&mut self, trend: &str, summary: Option<&str>) {
        self.heading("EMOTIONAL TREND");
        self.buf.push_str(trend);
        self.buf.push('\n');
        if let Some(summary) = summary {
            let s = self.dim(summary);
            self.buf.push_str(&s);
            self.buf.push('\n');
        }
    }

    fn draw_tags(&mut self, tags: &[Tag]) {
        self.heading("EMOTIONS");
        let rendered: Vec<String> = tags.iter().map(|t| self.paint(&t.label, t.color)).collect();
        self.buf.push_str(&rendered.join("  "));
        self.buf.push('\n');
    }

    fn draw_breakdown(&mut self, items: &[BreakdownItem]) {
        self.heading("MESSAGE BREAKDOWN");
        for item in items {
            let label = self.paint(&format!("[{}]", item.emotion), item.color);
            self.buf.push_str(&format!("{:>3}. {}  {}\n", item.index, item.text, label));
        }
    }

    fn draw_line(&mut self, chart: &LineChart) {
        self.heading(&chart.series.to_uppercase());
        let span = chart.y_max - chart.y_min;
        for ((label, value), color) in chart.labels.iter().zip(&chart.values).zip(&chart.point_colors) {
            let fraction = if span > 0.0 { (value - chart.y_min) / span } else { 0.0 };
            let bar = self.paint(&block_bar(fraction), *color);
            self.buf.push_str(&format!("{label:<12} {bar} {value:.2}\n"));
        }
    }

    fn draw_pie(&mut self, chart: &PieChart) {
        self.heading("DISTRIBUTION");
        for (slice, frac) in chart.slices.iter().zip(chart.fractions()) {
            let swatch = self.paint("●", slice.color);
            self.buf
                .push_str(&format!("{swatch} {:<16} {:>5.1}%\n", slice.label, frac * 100.0));
        }
    }

    fn draw_bar(&mut self, chart: &BarChart) {
        self.heading("COUNTS");
        let max = chart.y_max() as f64;
        for bar in &chart.bars {
            let b = self.paint(&block_bar(bar.value as f64 / max), bar.color);
            self.buf.push_str(&format!("{:<16} {b} {}\n", bar.label, bar.value));
        }
    }
}
