use std::fmt::Write as _;

use crate::{
    events::{EventMarker, LabelBook},
    foundation::core::{Affine, Point, Rect, Rgba8},
    plan::FramePlan,
    scene::layout::{LABEL_PAD, Layout, TICK_LENGTH, TICK_PAD},
    series::Series,
    theme::{Font, INTERSECTION_LABEL_SIZE},
};

const LINE_WIDTH: f64 = 3.0;
const SPINE_WIDTH: f64 = 0.8;
const TICK_WIDTH: f64 = 0.8;
const EVENT_LINE_WIDTH: f64 = 1.5;
/// Dash pattern per unit of line width.
const EVENT_DASH: (f64, f64) = (3.7, 1.6);
const DOT_RADIUS: f64 = 3.0;
const EVENT_ROTATION_DEG: f64 = 65.0;
const LINE_SPACING: f64 = 1.2;
/// Rough ascent and advance of a glyph relative to its font size, used to place text that is
/// aligned by its top edge or measured for padding.
const ASCENT: f64 = 0.8;
const ADVANCE: f64 = 0.6;

/// Inputs for drawing one frame.
pub struct FrameScene<'a> {
    pub plan: &'a FramePlan,
    pub layout: &'a Layout,
    pub series: &'a Series,
    pub markers: &'a [EventMarker],
    pub labels: &'a LabelBook,
}

/// Build the SVG document for a frame, sized in points.
pub fn build_svg(scene: &FrameScene<'_>) -> String {
    let mut w = SvgWriter::new(scene.layout);
    let plan = scene.plan;
    let theme = &plan.theme;
    let layout = scene.layout;
    let plot = layout.plot;
    let to_fig = layout.data_to_figure(&plan.window);

    w.rect(layout.figure, theme.background_color);
    w.rect(plot, theme.background_color);

    w.open_clipped();
    for m in scene.markers {
        if !plan.window.contains_x(f64::from(m.year)) {
            continue;
        }
        let x = (to_fig * m.point()).x;
        w.dashed_line(
            Point::new(x, plot.y0),
            Point::new(x, plot.y1),
            Rgba8::GREY,
            EVENT_LINE_WIDTH,
        );
    }
    w.polyline(visible_points(scene.series, plan, to_fig), Rgba8::BLACK, LINE_WIDTH);
    for m in scene.markers {
        w.dot(to_fig * m.point(), DOT_RADIUS, Rgba8::BLACK);
    }
    w.close_group();

    for (_, label) in scene.labels.revealed() {
        w.text(
            &TextStyle {
                font: theme.tick_label_font,
                size: INTERSECTION_LABEL_SIZE,
                color: Rgba8::BLACK,
                anchor: "start",
            },
            to_fig * label.anchor,
            None,
            &[label.text.as_str()],
        );
    }

    w.frame(plot);

    let tick_style = TextStyle {
        font: theme.tick_label_font,
        size: theme.tick_size(),
        color: theme.tick_label_color,
        anchor: "middle",
    };

    for year in &plan.x_ticks {
        let x = (to_fig * Point::new(f64::from(*year), plan.window.y_min)).x;
        w.tick(Point::new(x, plot.y1), Point::new(x, plot.y1 + TICK_LENGTH));
        let label = year.to_string();
        w.text(
            &tick_style,
            Point::new(
                x,
                plot.y1 + TICK_LENGTH + TICK_PAD + tick_style.size * ASCENT,
            ),
            None,
            &[label.as_str()],
        );
    }

    let y_tick_style = TextStyle {
        anchor: "end",
        ..tick_style
    };
    let mut widest_y_label = 0usize;
    for tick in &plan.y_ticks {
        let y = (to_fig * Point::new(plan.window.x_min, tick.value)).y;
        w.tick(Point::new(plot.x0 - TICK_LENGTH, y), Point::new(plot.x0, y));
        w.text(
            &y_tick_style,
            Point::new(
                plot.x0 - TICK_LENGTH - TICK_PAD,
                y + y_tick_style.size * ASCENT / 2.0,
            ),
            None,
            &[tick.label.as_str()],
        );
        widest_y_label = widest_y_label.max(tick.label.chars().count());
    }

    let event_style = TextStyle {
        font: theme.tick_label_font,
        size: theme.event_size(),
        color: theme.tick_label_color,
        anchor: "start",
    };
    for m in scene.markers {
        if !plan.window.contains_x(f64::from(m.year)) {
            continue;
        }
        let x = (to_fig * m.point()).x;
        w.tick(Point::new(x, plot.y0), Point::new(x, plot.y0 - TICK_LENGTH));
        let lines: Vec<&str> = m.wrapped.iter().map(String::as_str).collect();
        w.text(
            &event_style,
            Point::new(x, plot.y0 - TICK_LENGTH - TICK_PAD),
            Some(-EVENT_ROTATION_DEG),
            &lines,
        );
    }

    let axis_style = TextStyle {
        font: theme.axis_label_font,
        size: theme.axis_label_size(),
        color: theme.tick_label_color,
        anchor: "middle",
    };
    let x_label = layout.x_label_anchor();
    w.text(
        &axis_style,
        Point::new(x_label.x, x_label.y + axis_style.size * ASCENT),
        None,
        &["Year"],
    );
    let y_label_x = plot.x0
        - TICK_LENGTH
        - TICK_PAD
        - widest_y_label as f64 * y_tick_style.size * ADVANCE
        - LABEL_PAD;
    w.text(
        &axis_style,
        Point::new(y_label_x, plot.center().y),
        Some(-90.0),
        &["Wealth Gap Ratio"],
    );

    w.text(
        &TextStyle {
            font: theme.title_font,
            size: theme.title_size(),
            color: Rgba8::BLACK,
            anchor: "middle",
        },
        layout.title_anchor(),
        None,
        &[plan.title.as_str()],
    );

    w.finish()
}

/// Series points in figure space up to and including the first point past the window's right
/// edge, so the clipped line reaches the edge.
fn visible_points(series: &Series, plan: &FramePlan, to_fig: Affine) -> Vec<Point> {
    let mut points = Vec::new();
    for row in series.rows() {
        let x = f64::from(row.year);
        points.push(to_fig * Point::new(x, row.ratio));
        if x > plan.window.x_max {
            break;
        }
    }
    points
}

#[derive(Clone, Copy)]
struct TextStyle {
    font: Font,
    size: f64,
    color: Rgba8,
    anchor: &'static str,
}

struct SvgWriter {
    out: String,
}

impl SvgWriter {
    fn new(layout: &Layout) -> Self {
        let (w, h) = (layout.figure.width(), layout.figure.height());
        let p = layout.plot;
        let mut out = String::with_capacity(16 * 1024);
        let _ = write!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        );
        let _ = write!(
            out,
            r#"<defs><clipPath id="plot"><rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}"/></clipPath></defs>"#,
            p.x0,
            p.y0,
            p.width(),
            p.height()
        );
        Self { out }
    }

    fn rect(&mut self, r: Rect, fill: Rgba8) {
        let _ = write!(
            self.out,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}" fill-opacity="{:.3}"/>"#,
            r.x0,
            r.y0,
            r.width(),
            r.height(),
            fill.to_svg_hex(),
            fill.opacity()
        );
    }

    fn frame(&mut self, r: Rect) {
        let _ = write!(
            self.out,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="none" stroke="black" stroke-width="{SPINE_WIDTH}"/>"#,
            r.x0,
            r.y0,
            r.width(),
            r.height()
        );
    }

    fn open_clipped(&mut self) {
        self.out.push_str(r#"<g clip-path="url(#plot)">"#);
    }

    fn close_group(&mut self) {
        self.out.push_str("</g>");
    }

    fn tick(&mut self, a: Point, b: Point) {
        let _ = write!(
            self.out,
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="black" stroke-width="{TICK_WIDTH}"/>"#,
            a.x, a.y, b.x, b.y
        );
    }

    fn dashed_line(&mut self, a: Point, b: Point, color: Rgba8, width: f64) {
        let _ = write!(
            self.out,
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="{width}" stroke-dasharray="{:.2} {:.2}"/>"#,
            a.x,
            a.y,
            b.x,
            b.y,
            color.to_svg_hex(),
            EVENT_DASH.0 * width,
            EVENT_DASH.1 * width
        );
    }

    fn polyline(&mut self, points: Vec<Point>, color: Rgba8, width: f64) {
        if points.is_empty() {
            return;
        }
        self.out.push_str(r#"<polyline points=""#);
        for (i, p) in points.iter().enumerate() {
            if i > 0 {
                self.out.push(' ');
            }
            let _ = write!(self.out, "{:.2},{:.2}", p.x, p.y);
        }
        let _ = write!(
            self.out,
            r#"" fill="none" stroke="{}" stroke-width="{width}" stroke-linejoin="round" stroke-linecap="square"/>"#,
            color.to_svg_hex()
        );
    }

    fn dot(&mut self, c: Point, r: f64, fill: Rgba8) {
        let _ = write!(
            self.out,
            r#"<circle cx="{:.2}" cy="{:.2}" r="{r}" fill="{}"/>"#,
            c.x,
            c.y,
            fill.to_svg_hex()
        );
    }

    /// Draw `lines` with the last line's baseline at `at`, optionally rotated about `at` by
    /// `rotate` degrees (negative is counter-clockwise on screen).
    fn text(&mut self, style: &TextStyle, at: Point, rotate: Option<f64>, lines: &[&str]) {
        if lines.is_empty() {
            return;
        }
        let _ = write!(
            self.out,
            r#"<text transform="translate({:.2} {:.2}){}" font-family="{}" font-size="{}" fill="{}" text-anchor="{}" xml:space="preserve">"#,
            at.x,
            at.y,
            rotate.map(|d| format!(" rotate({d})")).unwrap_or_default(),
            escape(&style.font.css_family()),
            style.size,
            style.color.to_svg_hex(),
            style.anchor
        );
        let step = style.size * LINE_SPACING;
        let first_dy = -step * (lines.len() - 1) as f64;
        for (i, line) in lines.iter().enumerate() {
            let dy = if i == 0 { first_dy } else { step };
            let _ = write!(
                self.out,
                r#"<tspan x="0" dy="{dy:.2}">{}</tspan>"#,
                escape(line)
            );
        }
        self.out.push_str("</text>");
    }

    fn finish(mut self) -> String {
        self.out.push_str("</svg>");
        self.out
    }
}

/// Escape text for use in XML content and attribute values.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{axes, events, foundation::core::FrameIndex};

    const CSV: &str = "Year,Ratio,Events\n\
        1863,56,Emancipation & <Proclamation>\n\
        1864,50,\n\
        1865,40,Thirteenth Amendment\n\
        1866,30,\n\
        1867,25,\n";

    fn render(frame: u64) -> String {
        let series = Series::from_csv_reader(CSV.as_bytes()).unwrap();
        let top = axes::y_top(series.max_ratio(), 1.1);
        let plan = FramePlan::for_frame(&series, FrameIndex(frame), top).unwrap();
        let markers = events::markers(&series, events::DEFAULT_WRAP_WIDTH);
        let mut labels = LabelBook::new(&markers);
        labels.replay(&series, FrameIndex(frame)).unwrap();
        let layout = Layout::default();
        build_svg(&FrameScene {
            plan: &plan,
            layout: &layout,
            series: &series,
            markers: &markers,
            labels: &labels,
        })
    }

    #[test]
    fn document_has_title_background_and_axis_labels() {
        let svg = render(0);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("Black/White Wealth Gap: 1863"));
        assert!(svg.contains(r##"fill="#d0bfab""##));
        assert!(svg.contains(">Year<"));
        assert!(svg.contains(">Wealth Gap Ratio<"));
        assert!(svg.contains("rotate(-90)"));
    }

    #[test]
    fn event_text_is_escaped() {
        let svg = render(0);
        assert!(svg.contains(">Emancipation &amp;<"));
        assert!(svg.contains(">&lt;Proclamation&gt;<"));
        assert!(!svg.contains("<Proclamation>"));
        assert!(svg.contains(r#"xml:space="preserve""#));
        assert!(usvg::Tree::from_str(&svg, &usvg::Options::default()).is_ok());
    }

    #[test]
    fn only_events_in_the_window_get_top_ticks() {
        let early = render(1);
        assert!(early.contains("Emancipation"));
        assert!(!early.contains("Thirteenth Amendment"));

        let late = render(4);
        assert!(late.contains("Thirteenth Amendment"));
        assert!(late.contains("rotate(-65)"));
    }

    #[test]
    fn revealed_labels_show_the_ratio() {
        assert!(!render(1).contains(">56.0<"));
        assert!(render(2).contains(">56.0<"));
    }

    #[test]
    fn visible_line_stops_one_point_past_the_window() {
        let series = Series::from_csv_reader(CSV.as_bytes()).unwrap();
        let plan = FramePlan::for_frame(&series, FrameIndex(2), 62.0).unwrap();
        let to_fig = Layout::default().data_to_figure(&plan.window);
        // Window ends at 1865.0; 1863..=1865 are inside and 1866 is the first point past it.
        assert_eq!(visible_points(&series, &plan, to_fig).len(), 4);
    }

    #[test]
    fn escape_handles_all_specials() {
        assert_eq!(escape(r#"a&b<c>"d'"#), "a&amp;b&lt;c&gt;&quot;d&apos;");
    }
}
