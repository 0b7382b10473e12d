//! Result renderer.
//!
//! [`Dashboard::project`] turns an [`AnalysisResult`] into plain view data;
//! a [`Surface`] draws that data. [`Renderer`] drives a surface through one
//! full pass: reset, trend, tags, breakdown, line, pie, bar. Because every
//! pass starts with a reset, drawing the same result twice leaves the surface
//! in the same state as drawing it once.

pub mod charts;
pub mod html;
pub mod terminal;

use serde::Serialize;

use crate::model::AnalysisResult;
use crate::palette::{EmotionPalette, Rgb};
use charts::{BarChart, LineChart, PieChart};

/// One entry of the emotion tag summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub emotion: String,
    pub count: u64,
    pub color: Rgb,
    /// `"<emotion> (<count>)"`
    pub label: String,
}

/// One numbered row of the chronological breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownItem {
    /// 1-based position in the input.
    pub index: usize,
    pub text: String,
    pub emotion: String,
    pub color: Rgb,
}

/// Everything a surface needs to draw one analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub trend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<f64>,
    /// Mean timeline score, `None` for an empty timeline.
    pub mean_intensity: Option<f64>,
    pub tags: Vec<Tag>,
    pub breakdown: Vec<BreakdownItem>,
    pub line: LineChart,
    pub pie: PieChart,
    pub bar: BarChart,
}

impl Dashboard {
    pub fn project(result: &AnalysisResult, palette: &EmotionPalette) -> Self {
        let tags = result
            .emotion_distribution
            .iter()
            .map(|(emotion, count)| Tag {
                emotion: emotion.to_string(),
                count,
                color: palette.color_for(emotion),
                label: format!("{emotion} ({count})"),
            })
            .collect();

        let breakdown = result
            .timeline
            .iter()
            .enumerate()
            .map(|(i, entry)| BreakdownItem {
                index: i + 1,
                text: entry.text.clone(),
                emotion: entry.emotion.clone(),
                color: palette.color_for(&entry.emotion),
            })
            .collect();

        Self {
            trend: result.emotional_trend.clone(),
            summary: result.summary.clone(),
            processing_time_ms: result.processing_time_ms,
            mean_intensity: result.mean_score(),
            tags,
            breakdown,
            line: LineChart::from_timeline(&result.timeline, palette),
            pie: PieChart::from_distribution(&result.emotion_distribution, palette),
            bar: BarChart::from_distribution(&result.emotion_distribution, palette),
        }
    }
}

/// A drawing target owned by the renderer for the duration of a pass.
pub trait Surface {
    /// Remove everything previously drawn.
    fn reset(&mut self);
    fn draw_trend(&mut self, trend: &str, summary: Option<&str>);
    fn draw_tags(&mut self, tags: &[Tag]);
    fn draw_breakdown(&mut self, items: &[BreakdownItem]);
    fn draw_line(&mut self, chart: &LineChart);
    fn draw_pie(&mut self, chart: &PieChart);
    fn draw_bar(&mut self, chart: &BarChart);
}

pub struct Renderer<'a> {
    palette: &'a EmotionPalette,
}

impl<'a> Renderer<'a> {
    pub fn new(palette: &'a EmotionPalette) -> Self {
        Self { palette }
    }

    /// Project `result` and draw it, replacing whatever `surface` showed before.
    pub fn render(&self, surface: &mut dyn Surface, result: &AnalysisResult) -> Dashboard {
        let dashboard = Dashboard::project(result, self.palette);
        draw(surface, &dashboard);
        dashboard
    }
}

/// Draw an already projected dashboard.
pub fn draw(surface: &mut dyn Surface, dashboard: &Dashboard) {
    surface.reset();
    surface.draw_trend(&dashboard.trend, dashboard.summary.as_deref());
    surface.draw_tags(&dashboard.tags);
    surface.draw_breakdown(&dashboard.breakdown);
    surface.draw_line(&dashboard.line);
    surface.draw_pie(&dashboard.pie);
    surface.draw_bar(&dashboard.bar);
}

/// Escape text for HTML/SVG bodies and attribute values.
pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
