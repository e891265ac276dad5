//! SVG line chart renderer

use std::fmt::Write;

use super::{ChartRenderer, RenderError};
use crate::activity::ActivityTable;

const PALETTE: [&str; 8] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
];

const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 140.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 50.0;

/// Renders an activity table as a standalone SVG document
#[derive(Debug, Clone, Copy)]
pub struct SvgChartRenderer {
    width: u32,
    height: u32,
}

impl Default for SvgChartRenderer {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
        }
    }
}

impl SvgChartRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Stroke color for a column
    pub fn color(column: usize) -> &'static str {
        PALETTE[column % PALETTE.len()]
    }

    fn plot_area(&self) -> (f64, f64) {
        let w = (f64::from(self.width) - MARGIN_LEFT - MARGIN_RIGHT).max(1.0);
        let h = (f64::from(self.height) - MARGIN_TOP - MARGIN_BOTTOM).max(1.0);
        (w, h)
    }

    fn render_svg(&self, title: &str, table: &ActivityTable) -> Result<String, RenderError> {
        let rows = table.rows();
        if rows.is_empty() {
            return Err(RenderError::EmptyTable);
        }

        let (plot_w, plot_h) = self.plot_area();
        let y_max = table.max_count().max(1) as f64;
        let x_step = if rows.len() > 1 {
            plot_w / (rows.len() - 1) as f64
        } else {
            0.0
        };
        let x_at = |i: usize| MARGIN_LEFT + x_step * i as f64;
        let y_at = |v: u64| MARGIN_TOP + plot_h - (v as f64 / y_max) * plot_h;

        let mut out = String::new();
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        )?;
        writeln!(
            out,
            r#"<rect width="100%" height="100%" fill="white"/>"#
        )?;
        writeln!(
            out,
            r#"<text x="{}" y="24" font-family="sans-serif" font-size="16">{}</text>"#,
            MARGIN_LEFT,
            escape(title)
        )?;

        // axes
        let x_axis_y = MARGIN_TOP + plot_h;
        writeln!(
            out,
            r#"<line x1="{l}" y1="{t}" x2="{l}" y2="{b}" stroke="black"/>"#,
            l = MARGIN_LEFT,
            t = MARGIN_TOP,
            b = x_axis_y
        )?;
        writeln!(
            out,
            r#"<line x1="{l}" y1="{b}" x2="{r}" y2="{b}" stroke="black"/>"#,
            l = MARGIN_LEFT,
            b = x_axis_y,
            r = MARGIN_LEFT + plot_w
        )?;
        writeln!(
            out,
            r#"<text x="16" y="{}" font-family="sans-serif" font-size="12" transform="rotate(-90 16 {})">Count</text>"#,
            MARGIN_TOP + plot_h / 2.0,
            MARGIN_TOP + plot_h / 2.0
        )?;
        writeln!(
            out,
            r#"<text x="{}" y="{}" font-family="sans-serif" font-size="10" text-anchor="end">{}</text>"#,
            MARGIN_LEFT - 6.0,
            MARGIN_TOP + 4.0,
            y_max as u64
        )?;

        // x labels, at most ~10 to stay legible
        let label_every = rows.len().div_ceil(10).max(1);
        for (i, row) in rows.iter().enumerate().step_by(label_every) {
            writeln!(
                out,
                r#"<text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="10" text-anchor="middle">{}</text>"#,
                x_at(i),
                x_axis_y + 16.0,
                row.timestamp.format("%H:%M")
            )?;
        }

        for (col, label) in table.columns().iter().enumerate() {
            let points: Vec<String> = rows
                .iter()
                .enumerate()
                .map(|(i, row)| format!("{:.1},{:.1}", x_at(i), y_at(row.counts()[col])))
                .collect();
            writeln!(
                out,
                r#"<polyline fill="none" stroke="{}" stroke-width="2" points="{}"/>"#,
                Self::color(col),
                points.join(" ")
            )?;

            let legend_x = MARGIN_LEFT + plot_w + 16.0;
            let legend_y = MARGIN_TOP + 18.0 * col as f64;
            writeln!(
                out,
                r#"<rect x="{:.1}" y="{:.1}" width="10" height="10" fill="{}"/>"#,
                legend_x,
                legend_y,
                Self::color(col)
            )?;
            writeln!(
                out,
                r#"<text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="12">{}</text>"#,
                legend_x + 16.0,
                legend_y + 10.0,
                escape(label)
            )?;
        }

        out.push_str("</svg>\n");
        Ok(out)
    }
}

impl ChartRenderer for SvgChartRenderer {
    fn content_type(&self) -> &'static str {
        "image/svg+xml"
    }

    fn render(&self, title: &str, table: &ActivityTable) -> Result<Vec<u8>, RenderError> {
        self.render_svg(title, table).map(String::into_bytes)
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{aggregate, assemble, WindowSpec};
    use crate::storage::{CallEvent, CallbackId};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, s).unwrap()
    }

    fn table(statuses: &[&str]) -> ActivityTable {
        let events: Vec<CallEvent> = statuses
            .iter()
            .map(|s| CallEvent::new(CallbackId::from("cb"), *s, at(10, 5, 0)))
            .collect();
        let grid = WindowSpec::reference().build_buckets(at(10, 20, 37));
        let result = aggregate(&events, &grid);
        assemble(result.counts(), &grid, result.labels())
    }

    fn render(title: &str, table: &ActivityTable) -> String {
        let bytes = SvgChartRenderer::default().render(title, table).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_one_polyline_per_column_in_column_order() {
        let svg = render("hook", &table(&["ok", "error", "ok"]));

        assert_eq!(svg.matches("<polyline").count(), 2);
        let error_at = svg.find(">error<").unwrap();
        let ok_at = svg.find(">ok<").unwrap();
        assert!(error_at < ok_at);
        assert!(svg.contains(SvgChartRenderer::color(0)));
        assert!(svg.contains(SvgChartRenderer::color(1)));
    }

    #[test]
    fn test_axes_labels() {
        let svg = render("hook", &table(&["ok"]));

        assert!(svg.contains(">Count</text>"));
        assert!(svg.contains(">10:00</text>"));
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_empty_columns_render_axes_only() {
        let svg = render("quiet", &table(&[]));
        assert_eq!(svg.matches("<polyline").count(), 0);
        assert!(svg.contains(">quiet</text>"));
    }

    #[test]
    fn test_title_and_labels_are_escaped() {
        let svg = render("a<b & c", &table(&["<weird>"]));
        assert!(svg.contains("a&lt;b &amp; c"));
        assert!(svg.contains("&lt;weird&gt;"));
        assert!(!svg.contains("<weird>"));
    }

    #[test]
    fn test_palette_wraps() {
        assert_eq!(SvgChartRenderer::color(0), SvgChartRenderer::color(PALETTE.len()));
        assert_eq!(SvgChartRenderer::default().content_type(), "image/svg+xml");
    }
}
