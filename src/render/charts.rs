//! Line, pie and bar chart data plus SVG drawing.

use std::f64::consts::PI;
use std::fmt::Write as _;

use serde::Serialize;

use super::escape_html;
use crate::model::{EmotionDistribution, TimelineEntry};
use crate::palette::{EmotionPalette, Rgb};

pub const INTENSITY_SERIES: &str = "Intensity";

/// Curve tension for the intensity line; 0 draws straight segments.
pub const LINE_TENSION: f64 = 0.4;

/// Intensity per message, plotted against the message index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart {
    pub series: String,
    /// `"Message N"`, 1-based.
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub point_colors: Vec<Rgb>,
    pub y_min: f64,
    pub y_max: f64,
    pub tension: f64,
}

impl LineChart {
    pub fn from_timeline(timeline: &[TimelineEntry], palette: &EmotionPalette) -> Self {
        Self {
            series: INTENSITY_SERIES.to_string(),
            labels: (1..=timeline.len()).map(|i| format!("Message {i}")).collect(),
            values: timeline.iter().map(|e| e.score).collect(),
            point_colors: timeline.iter().map(|e| palette.color_for(&e.emotion)).collect(),
            y_min: 0.0,
            y_max: 1.0,
            tension: LINE_TENSION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub label: String,
    pub value: u64,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart {
    pub slices: Vec<Slice>,
}

impl PieChart {
    pub fn from_distribution(dist: &EmotionDistribution, palette: &EmotionPalette) -> Self {
        Self {
            slices: dist
                .iter()
                .map(|(label, value)| Slice {
                    label: label.to_string(),
                    value,
                    color: palette.color_for(label),
                })
                .collect(),
        }
    }

    pub fn total(&self) -> u64 {
        self.slices.iter().map(|s| s.value).sum()
    }

    /// Share of the whole for each slice; all zeros when the total is zero.
    pub fn fractions(&self) -> Vec<f64> {
        let total = self.total();
        self.slices
            .iter()
            .map(|s| if total == 0 { 0.0 } else { s.value as f64 / total as f64 })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: u64,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub bars: Vec<Bar>,
    pub begin_at_zero: bool,
}

impl BarChart {
    pub fn from_distribution(dist: &EmotionDistribution, palette: &EmotionPalette) -> Self {
        Self {
            bars: dist
                .iter()
                .map(|(label, value)| Bar {
                    label: label.to_string(),
                    value,
                    color: palette.color_for(label),
                })
                .collect(),
            begin_at_zero: true,
        }
    }

    /// Top of the y-axis: the largest count, at least 1.
    pub fn y_max(&self) -> u64 {
        self.bars.iter().map(|b| b.value).max().unwrap_or(0).max(1)
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance(self, other: Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

/// Bezier control points `(before, after)` for each point of a cardinal-style
/// spline. Each point's handles run parallel to the line joining its
/// neighbours, scaled by `tension` and the relative neighbour distances.
/// Endpoints use themselves as the missing neighbour.
pub fn control_points(points: &[Point], tension: f64) -> Vec<(Point, Point)> {
    let n = points.len();
    (0..n)
        .map(|i| {
            let cur = points[i];
            let prev = if i == 0 { cur } else { points[i - 1] };
            let next = if i + 1 == n { cur } else { points[i + 1] };

            let d01 = prev.distance(cur);
            let d12 = cur.distance(next);
            let sum = d01 + d12;
            let (s01, s12) = if sum > 0.0 { (d01 / sum, d12 / sum) } else { (0.0, 0.0) };
            let fa = tension * s01;
            let fb = tension * s12;

            let dx = next.x - prev.x;
            let dy = next.y - prev.y;
            (
                Point::new(cur.x - fa * dx, cur.y - fa * dy),
                Point::new(cur.x + fb * dx, cur.y + fb * dy),
            )
        })
        .collect()
}

/// SVG path data through `points` using cubic segments.
pub fn smooth_path(points: &[Point], tension: f64) -> String {
    let Some(first) = points.first() else {
        return String::new();
    };
    let cps = control_points(points, tension);
    let mut d = format!("M{:.2},{:.2}", first.x, first.y);
    for i in 1..points.len() {
        let c1 = cps[i - 1].1;
        let c2 = cps[i].0;
        let p = points[i];
        let _ = write!(
            d,
            " C{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}",
            c1.x, c1.y, c2.x, c2.y, p.x, p.y
        );
    }
    d
}

// ---------------------------------------------------------------------------
// SVG
// ---------------------------------------------------------------------------

pub const CHART_WIDTH: f64 = 560.0;
pub const CHART_HEIGHT: f64 = 280.0;
const PAD_LEFT: f64 = 44.0;
const PAD_RIGHT: f64 = 16.0;
const PAD_TOP: f64 = 28.0;
const PAD_BOTTOM: f64 = 40.0;

fn svg_open(title: &str) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}" role="img" aria-label="{t}"><title>{t}</title>"#,
        w = CHART_WIDTH,
        h = CHART_HEIGHT,
        t = escape_html(title)
    )
}

fn plot_x(i: usize, n: usize) -> f64 {
    let width = CHART_WIDTH - PAD_LEFT - PAD_RIGHT;
    if n <= 1 {
        PAD_LEFT + width / 2.0
    } else {
        PAD_LEFT + width * i as f64 / (n - 1) as f64
    }
}

fn plot_y(value: f64, min: f64, max: f64) -> f64 {
    let height = CHART_HEIGHT - PAD_TOP - PAD_BOTTOM;
    let span = if max > min { max - min } else { 1.0 };
    let v = value.clamp(min, max);
    CHART_HEIGHT - PAD_BOTTOM - (v - min) / span * height
}

/// Intensity line with the y-axis fixed to the chart's domain.
pub fn line_svg(chart: &LineChart) -> String {
    let mut svg = svg_open(&chart.series);
    let n = chart.values.len();

    for step in 0..=4 {
        let v = chart.y_min + (chart.y_max - chart.y_min) * step as f64 / 4.0;
        let y = plot_y(v, chart.y_min, chart.y_max);
        let _ = write!(
            svg,
            r##"<line x1="{PAD_LEFT}" y1="{y:.2}" x2="{x2}" y2="{y:.2}" stroke="#e0e0e0"/><text x="{tx}" y="{ty:.2}" font-size="10" text-anchor="end">{v:.2}</text>"##,
            x2 = CHART_WIDTH - PAD_RIGHT,
            tx = PAD_LEFT - 6.0,
            ty = y + 3.0,
        );
    }

    let points: Vec<Point> = chart
        .values
        .iter()
        .enumerate()
        .map(|(i, v)| Point::new(plot_x(i, n), plot_y(*v, chart.y_min, chart.y_max)))
        .collect();

    if points.len() > 1 {
        let _ = write!(
            svg,
            r##"<path d="{}" fill="none" stroke="#5c6bc0" stroke-width="2"/>"##,
            smooth_path(&points, chart.tension)
        );
    }
    for ((p, color), label) in points.iter().zip(&chart.point_colors).zip(&chart.labels) {
        let _ = write!(
            svg,
            r#"<circle cx="{:.2}" cy="{:.2}" r="4" fill="{color}"/><text x="{:.2}" y="{:.2}" font-size="10" text-anchor="middle">{}</text>"#,
            p.x,
            p.y,
            p.x,
            CHART_HEIGHT - PAD_BOTTOM + 16.0,
            escape_html(label)
        );
    }
    let _ = write!(
        svg,
        r#"<text x="{PAD_LEFT}" y="16" font-size="12">{}</text></svg>"#,
        escape_html(&chart.series)
    );
    svg
}

/// Distribution pie; slices start at twelve o'clock and run clockwise.
pub fn pie_svg(chart: &PieChart) -> String {
    let mut svg = svg_open("Emotion distribution");
    let cx = CHART_WIDTH / 2.0;
    let cy = CHART_HEIGHT / 2.0;
    let r = CHART_HEIGHT / 2.0 - 20.0;
    let fractions = chart.fractions();
    let non_zero = fractions.iter().filter(|f| **f > 0.0).count();

    if non_zero == 1 {
        if let Some((slice, _)) = chart.slices.iter().zip(&fractions).find(|(_, f)| **f > 0.0) {
            let _ = write!(
                svg,
                r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}" fill="{}"><title>{}</title></circle>"#,
                slice.color,
                escape_html(&slice.label)
            );
        }
    } else if non_zero > 1 {
        let mut angle = -PI / 2.0;
        for (slice, frac) in chart.slices.iter().zip(&fractions) {
            if *frac <= 0.0 {
                continue;
            }
            let sweep = frac * 2.0 * PI;
            let (x0, y0) = (cx + r * angle.cos(), cy + r * angle.sin());
            let end = angle + sweep;
            let (x1, y1) = (cx + r * end.cos(), cy + r * end.sin());
            let large = if sweep > PI { 1 } else { 0 };
            let _ = write!(
                svg,
                r##"<path d="M{cx:.2},{cy:.2} L{x0:.2},{y0:.2} A{r:.2},{r:.2} 0 {large} 1 {x1:.2},{y1:.2} Z" fill="{}" stroke="#ffffff"><title>{} ({})</title></path>"##,
                slice.color,
                escape_html(&slice.label),
                slice.value
            );
            angle = end;
        }
    }
    svg.push_str("</svg>");
    svg
}

/// One bar per emotion, y-axis from zero to the largest count.
pub fn bar_svg(chart: &BarChart) -> String {
    let mut svg = svg_open("Emotion counts");
    let y_max = chart.y_max();
    let n = chart.bars.len().max(1);
    let slot = (CHART_WIDTH - PAD_LEFT - PAD_RIGHT) / n as f64;
    let bar_w = slot * 0.6;
    let baseline = plot_y(0.0, 0.0, y_max as f64);

    let ticks = y_max.min(5);
    for step in 0..=ticks {
        let v = y_max as f64 * step as f64 / ticks as f64;
        let y = plot_y(v, 0.0, y_max as f64);
        let _ = write!(
            svg,
            r##"<line x1="{PAD_LEFT}" y1="{y:.2}" x2="{x2}" y2="{y:.2}" stroke="#e0e0e0"/><text x="{tx}" y="{ty:.2}" font-size="10" text-anchor="end">{v:.0}</text>"##,
            x2 = CHART_WIDTH - PAD_RIGHT,
            tx = PAD_LEFT - 6.0,
            ty = y + 3.0,
        );
    }

    for (i, bar) in chart.bars.iter().enumerate() {
        let top = plot_y(bar.value as f64, 0.0, y_max as f64);
        let x = PAD_LEFT + slot * i as f64 + (slot - bar_w) / 2.0;
        let _ = write!(
            svg,
            r#"<rect x="{x:.2}" y="{top:.2}" width="{bar_w:.2}" height="{h:.2}" fill="{}"><title>{} ({})</title></rect><text x="{lx:.2}" y="{ly:.2}" font-size="10" text-anchor="middle">{}</text>"#,
            bar.color,
            escape_html(&bar.label),
            bar.value,
            escape_html(&bar.label),
            h = baseline - top,
            lx = x + bar_w / 2.0,
            ly = CHART_HEIGHT - PAD_BOTTOM + 16.0,
        );
    }
    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::FALLBACK_COLOR;

    fn entry(emotion: &str, score: f64) -> TimelineEntry {
        TimelineEntry { text: "t".into(), emotion: emotion.into(), score }
    }

    #[test]
    fn test_line_chart_from_timeline() {
        let c = LineChart::from_timeline(
            &[entry("joy", 0.9), entry("sadness", 0.3)],
            EmotionPalette::standard(),
        );
        assert_eq!(c.series, "Intensity");
        assert_eq!(c.labels, vec!["Message 1", "Message 2"]);
        assert_eq!(c.values, vec![0.9, 0.3]);
        assert_eq!((c.y_min, c.y_max), (0.0, 1.0));
        assert!(c.tension > 0.0);
        assert_eq!(c.point_colors[0], EmotionPalette::standard().color_for("joy"));
    }

    #[test]
    fn test_control_points_zero_tension_collapse() {
        let pts = [Point::new(0.0, 0.0), Point::new(10.0, 5.0), Point::new(20.0, 0.0)];
        for (p, (a, b)) in pts.iter().zip(control_points(&pts, 0.0)) {
            assert_eq!(*p, a);
            assert_eq!(*p, b);
        }
    }

    #[test]
    fn test_control_points_follow_neighbour_direction() {
        let pts = [Point::new(0.0, 0.0), Point::new(10.0, 10.0), Point::new(20.0, 0.0)];
        let cps = control_points(&pts, 0.4);
        // neighbours are level, so the middle handles are horizontal
        assert!((cps[1].0.y - 10.0).abs() < 1e-9);
        assert!((cps[1].1.y - 10.0).abs() < 1e-9);
        assert!(cps[1].0.x < 10.0 && cps[1].1.x > 10.0);
    }

    #[test]
    fn test_control_points_duplicate_points_no_nan() {
        let pts = [Point::new(5.0, 5.0), Point::new(5.0, 5.0)];
        for (a, b) in control_points(&pts, 0.4) {
            assert!(a.x.is_finite() && a.y.is_finite() && b.x.is_finite() && b.y.is_finite());
        }
    }

    #[test]
    fn test_smooth_path_passes_through_points() {
        let pts = [Point::new(0.0, 0.0), Point::new(10.0, 10.0), Point::new(20.0, 0.0)];
        let d = smooth_path(&pts, 0.4);
        assert!(d.starts_with("M0.00,0.00"));
        assert!(d.contains("10.00,10.00"));
        assert!(d.ends_with("20.00,0.00"));
        assert_eq!(d.matches('C').count(), 2);
        assert_eq!(smooth_path(&[], 0.4), "");
    }

    #[test]
    fn test_line_svg_has_one_point_per_message() {
        let c = LineChart::from_timeline(
            &[entry("joy", 0.9), entry("sadness", 0.3), entry("mystery", 0.5)],
            EmotionPalette::standard(),
        );
        let svg = line_svg(&c);
        assert_eq!(svg.matches("<circle").count(), 3);
        assert!(svg.contains("Message 3"));
        assert!(svg.contains(&FALLBACK_COLOR.to_hex()));
        assert!(svg.contains("<path"));
    }

    #[test]
    fn test_plot_y_domain_is_fixed() {
        let top = plot_y(1.0, 0.0, 1.0);
        let bottom = plot_y(0.0, 0.0, 1.0);
        assert!(top < bottom);
        assert_eq!(plot_y(1.7, 0.0, 1.0), top);
        assert_eq!(plot_y(-0.2, 0.0, 1.0), bottom);
    }

    #[test]
    fn test_pie_fractions() {
        let dist: EmotionDistribution = vec![("joy", 3u64), ("anger", 1u64)].into_iter().collect();
        let pie = PieChart::from_distribution(&dist, EmotionPalette::standard());
        assert_eq!(pie.fractions(), vec![0.75, 0.25]);
        assert_eq!(pie_svg(&pie).matches("<path").count(), 2);
    }

    #[test]
    fn test_pie_single_slice_is_circle() {
        let dist: EmotionDistribution = vec![("joy", 4u64), ("anger", 0u64)].into_iter().collect();
        let svg = pie_svg(&PieChart::from_distribution(&dist, EmotionPalette::standard()));
        assert_eq!(svg.matches("<circle").count(), 1);
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn test_pie_empty_draws_nothing() {
        let pie = PieChart { slices: vec![] };
        assert!(pie.fractions().is_empty());
        let svg = pie_svg(&pie);
        assert!(!svg.contains("<path") && !svg.contains("<circle"));
    }

    #[test]
    fn test_bar_chart_starts_at_zero() {
        let dist: EmotionDistribution = vec![("joy", 2u64), ("fear", 5u64)].into_iter().collect();
        let bar = BarChart::from_distribution(&dist, EmotionPalette::standard());
        assert!(bar.begin_at_zero);
        assert_eq!(bar.y_max(), 5);
        let svg = bar_svg(&bar);
        assert_eq!(svg.matches("<rect").count(), 2);
        assert!(svg.contains(">0</text>"));
    }

    #[test]
    fn test_bar_chart_all_zero_y_max_one() {
        let bar = BarChart { bars: vec![], begin_at_zero: true };
        assert_eq!(bar.y_max(), 1);
        assert!(bar_svg(&bar).ends_with("</svg>"));
    }

    #[test]
    fn test_svg_labels_escaped() {
        let dist: EmotionDistribution = vec![("<script>", 1u64)].into_iter().collect();
        let svg = bar_svg(&BarChart::from_distribution(&dist, EmotionPalette::standard()));
        assert!(!svg.contains("<script>"));
        assert!(svg.contains("&lt;script&gt;"));
    }
}
