//! Standalone HTML report with inline SVG charts.

use std::fmt::Write as _;

use super::charts::{bar_svg, line_svg, pie_svg, BarChart, LineChart, PieChart};
use super::{escape_html, BreakdownItem, Surface, Tag};

/// HTML surface; each section stays hidden until something is drawn into it.
#[derive(Debug, Default)]
pub struct HtmlSurface {
    trend: Option<String>,
    tags: Option<String>,
    breakdown: Option<String>,
    line: Option<String>,
    pie: Option<String>,
    bar: Option<String>,
}

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;margin:0;background:#fafafa;color:#212121}\
header{padding:16px 24px;background:#3949ab;color:#fff}\
main{padding:16px 24px;display:grid;gap:16px}\
section{background:#fff;border:1px solid #e0e0e0;border-radius:8px;padding:12px 16px}\
section[hidden]{display:none}\
h2{font-size:.8rem;text-transform:uppercase;letter-spacing:.5px;color:#757575;margin:0 0 8px}\
.tag{display:inline-block;padding:3px 10px;border-radius:12px;margin:2px 4px;color:#fff;font-size:.85rem}\
ol{margin:0;padding-left:24px}li{margin:4px 0}\
.emotion{font-weight:bold;margin-left:8px}\
.summary{color:#616161;font-size:.9rem}\
.charts{display:grid;grid-template-columns:repeat(auto-fit,minmax(360px,1fr));gap:16px}\
svg{max-width:100%;height:auto}";

impl HtmlSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full page as it currently stands.
    pub fn document(&self) -> String {
        let mut doc = String::from(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
             <title>Emotion Report</title>\n",
        );
        let _ = write!(doc, "<style>{STYLE}</style>\n</head>\n<body>\n");
        doc.push_str("<header><h1>Emotion Report</h1></header>\n<main>\n");
        section(&mut doc, "trend", "Emotional Trend", &self.trend);
        section(&mut doc, "tags", "Emotions", &self.tags);
        section(&mut doc, "breakdown", "Message Breakdown", &self.breakdown);
        doc.push_str("<div class=\"charts\">\n");
        section(&mut doc, "line-chart", "Intensity", &self.line);
        section(&mut doc, "pie-chart", "Distribution", &self.pie);
        section(&mut doc, "bar-chart", "Counts", &self.bar);
        doc.push_str("</div>\n</main>\n</body>\n</html>\n");
        doc
    }
}

fn section(doc: &mut String, id: &str, title: &str, body: &Option<String>) {
    match body {
        Some(body) => {
            let _ = writeln!(doc, "<section id=\"{id}\"><h2>{title}</h2>{body}</section>");
        }
        None => {
            let _ = writeln!(doc, "<section id=\"{id}\" hidden><h2>{title}</h2></section>");
        }
    }
}

impl Surface for HtmlSurface {
    fn reset(&mut self) {
        *self = Self::default();
    }

    /// The trend text is inserted as-is; it may carry markup from the backend.
    fn draw_trend(&mut self, trend: &str, summary: Option<&str>) {
        let mut body = format!("<p class=\"trend\">{trend}</p>");
        if let Some(summary) = summary {
            let _ = write!(body, "<p class=\"summary\">{}</p>", escape_html(summary));
        }
        self.trend = Some(body);
    }

    fn draw_tags(&mut self, tags: &[Tag]) {
        let mut body = String::new();
        for tag in tags {
            let _ = write!(
                body,
                "<span class=\"tag\" style=\"background:{}\">{}</span>",
                tag.color,
                escape_html(&tag.label)
            );
        }
        self.tags = Some(body);
    }

    fn draw_breakdown(&mut self, items: &[BreakdownItem]) {
        let mut body = String::from("<ol>");
        for item in items {
            let _ = write!(
                body,
                "<li value=\"{}\"><span class=\"text\">{}</span><span class=\"emotion\" style=\"color:{}\">{}</span></li>",
                item.index,
                escape_html(&item.text),
                item.color,
                escape_html(&item.emotion)
            );
        }
        body.push_str("</ol>");
        self.breakdown = Some(body);
    }

    fn draw_line(&mut self, chart: &LineChart) {
        self.line = Some(line_svg(chart));
    }

    fn draw_pie(&mut self, chart: &PieChart) {
        self.pie = Some(pie_svg(chart));
    }

    fn draw_bar(&mut self, chart: &BarChart) {
        self.bar = Some(bar_svg(chart));
    }
}
