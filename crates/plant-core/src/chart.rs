//! Dashboard Chart
//!
//! Renders a composed chart (area + bar + line over shared axes) as an SVG
//! document with `plotters`. Rendering is a pure function of the data slice.
//!
//! ```text
//!   ┌──────────────────────────────────────────────┐
//!  8┤        ▲ quantity (line)       ■ orders      │
//!   │   ▄▄  ╱ ╲      ▄▄              ■ price       │
//!  4┤  ░██░╱░░░╲░░░░░██░░            ─ quantity    │
//!   │ ░░██░░░░░░░░░░░██░░░                         │
//!  0┼──────┬──────────┬──────────────────────────  │
//!     04/01/2025  04/02/2025                        │
//!   └──────────────────────────────────────────────┘
//! ```
//!
//! A point missing a key is dropped from that series only; a series with no
//! values at all is not drawn. Nothing here returns an error.

use plotters::chart::ChartContext;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters_svg::SVGBackend;
use serde::{Deserialize, Serialize};

/// Fixed surface width in pixels
pub const CHART_WIDTH: u32 = 730;

/// Fixed surface height in pixels
pub const CHART_HEIGHT: u32 = 250;

const MARGIN: u32 = 5;
const Y_AXIS_WIDTH: u32 = 60;
const X_AXIS_HEIGHT: u32 = 30;
const TICK_COUNT: usize = 5;
const BAR_SIZE: f64 = 20.0;
const CURVE_SAMPLES: usize = 16;
const GRID_COLOR: RGBColor = RGBColor(0xf5, 0xf5, 0xf5);
const AXIS_COLOR: RGBColor = RGBColor(0x66, 0x66, 0x66);

type Chart<'a, 'b> =
    ChartContext<'a, SVGBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;
type DrawResult<T> = Result<T, DrawingAreaErrorKind<std::io::Error>>;

/// One x-axis slot of the dashboard chart
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartDataPoint {
    /// X-axis label
    #[serde(default)]
    pub date: String,

    #[serde(default)]
    pub orders: Option<f64>,

    #[serde(default)]
    pub price: Option<f64>,

    #[serde(default)]
    pub quantity: Option<f64>,
}

impl ChartDataPoint {
    pub fn new(date: impl Into<String>, orders: f64, price: f64, quantity: f64) -> Self {
        Self {
            date: date.into(),
            orders: Some(orders),
            price: Some(price),
            quantity: Some(quantity),
        }
    }
}

/// Which field of a data point a series plots
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataKey {
    Orders,
    Price,
    Quantity,
}

impl DataKey {
    pub fn as_str(self) -> &'static str {
        match self {
            DataKey::Orders => "orders",
            DataKey::Price => "price",
            DataKey::Quantity => "quantity",
        }
    }

    fn value(self, point: &ChartDataPoint) -> Option<f64> {
        let value = match self {
            DataKey::Orders => point.orders,
            DataKey::Price => point.price,
            DataKey::Quantity => point.quantity,
        };
        value.filter(|v| v.is_finite())
    }
}

/// How a series is drawn
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeriesKind {
    /// Filled monotone area down to zero
    Area,
    /// Fixed-width bars centred on each slot
    Bar,
    /// Monotone line with point markers
    Line,
}

/// A series overlaid on the shared axes
#[derive(Clone, Debug)]
pub struct Series {
    pub key: DataKey,
    pub kind: SeriesKind,
    pub color: RGBColor,
}

/// Composed area/bar/line chart with a fixed 730×250 surface
#[derive(Clone, Debug)]
pub struct ComposedChart {
    series: Vec<Series>,
}

impl Default for ComposedChart {
    fn default() -> Self {
        Self {
            series: vec![
                Series {
                    key: DataKey::Orders,
                    kind: SeriesKind::Area,
                    color: RGBColor(0x88, 0x84, 0xd8),
                },
                Series {
                    key: DataKey::Price,
                    kind: SeriesKind::Bar,
                    color: RGBColor(0x41, 0x3e, 0xa0),
                },
                Series {
                    key: DataKey::Quantity,
                    kind: SeriesKind::Line,
                    color: RGBColor(0xff, 0x73, 0x00),
                },
            ],
        }
    }
}

/// Hover target for one x slot, in pixels
struct Band {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
    title: String,
}

impl ComposedChart {
    pub fn series(&self) -> &[Series] {
        &self.series
    }

    /// Render `data` to a standalone SVG document
    pub fn render(&self, data: &[ChartDataPoint]) -> String {
        let mut svg = String::new();
        let bands = match self.draw(&mut svg, data) {
            Ok(bands) => bands,
            Err(e) => {
                tracing::warn!(error = %e, points = data.len(), "Chart rendering incomplete");
                Vec::new()
            }
        };

        if let Some(end) = svg.rfind("</svg>") {
            svg.insert_str(end, &tooltips(&bands));
        }
        svg
    }

    /// Shared y range covering zero and every plotted value.
    ///
    /// Falls back to `0..1` when the values span more than `f64` can hold.
    fn y_range(&self, data: &[ChartDataPoint]) -> (f64, f64) {
        let (lo, hi) = self
            .series
            .iter()
            .flat_map(|s| data.iter().filter_map(move |p| s.key.value(p)))
            .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));

        let span = hi - lo;
        if !span.is_finite() || span <= 0.0 {
            return (0.0, 1.0);
        }

        let padded = span.mul_add(0.05, hi);
        (lo, if padded.is_finite() { padded } else { hi })
    }

    fn draw(&self, svg: &mut String, data: &[ChartDataPoint]) -> DrawResult<Vec<Band>> {
        let root = SVGBackend::with_string(svg, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;

        let slots = data.len().max(1);
        let (lo, hi) = self.y_range(data);
        let mut chart = ChartBuilder::on(&root)
            .margin(MARGIN)
            .x_label_area_size(X_AXIS_HEIGHT)
            .y_label_area_size(Y_AXIS_WIDTH)
            .build_cartesian_2d(-0.5..(slots as f64 - 0.5), lo..hi)?;

        chart
            .configure_mesh()
            .bold_line_style(GRID_COLOR.stroke_width(1))
            .light_line_style(TRANSPARENT.stroke_width(0))
            .axis_style(AXIS_COLOR.stroke_width(1))
            .label_style(("sans-serif", 12).into_font().color(&AXIS_COLOR))
            .x_labels(slots)
            .y_labels(TICK_COUNT)
            .x_label_formatter(&|x| slot_label(data, *x))
            .y_label_formatter(&|y| format_value(*y))
            .draw()?;

        // Areas sit beneath bars, bars beneath lines.
        for kind in [SeriesKind::Area, SeriesKind::Bar, SeriesKind::Line] {
            for series in self.series.iter().filter(|s| s.kind == kind) {
                let points: Vec<Option<(f64, f64)>> = data
                    .iter()
                    .enumerate()
                    .map(|(i, p)| series.key.value(p).map(|v| (i as f64, v.clamp(lo, hi))))
                    .collect();
                let baseline = 0.0_f64.clamp(lo, hi);

                match kind {
                    SeriesKind::Area => draw_area(&mut chart, series, &points, baseline)?,
                    SeriesKind::Bar => draw_bars(&mut chart, series, &points, baseline, slots)?,
                    SeriesKind::Line => draw_line(&mut chart, series, &points)?,
                }
            }
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8).filled())
            .border_style(GRID_COLOR.stroke_width(1))
            .label_font(("sans-serif", 12))
            .draw()?;

        let bands = data
            .iter()
            .enumerate()
            .map(|(i, point)| {
                let (left, top) = chart.backend_coord(&(i as f64 - 0.5, hi));
                let (right, bottom) = chart.backend_coord(&(i as f64 + 0.5, lo));
                Band {
                    left,
                    top,
                    right,
                    bottom,
                    title: self.tooltip_title(point),
                }
            })
            .collect();

        root.present()?;
        Ok(bands)
    }

    /// `date` followed by one `key : value` line per present value
    fn tooltip_title(&self, point: &ChartDataPoint) -> String {
        let mut title = point.date.clone();
        for series in &self.series {
            if let Some(value) = series.key.value(point) {
                title.push_str(&format!("\n{} : {}", series.key.as_str(), format_value(value)));
            }
        }
        title
    }
}

fn draw_area(
    chart: &mut Chart<'_, '_>,
    series: &Series,
    points: &[Option<(f64, f64)>],
    baseline: f64,
) -> DrawResult<()> {
    let color = series.color;
    let runs = runs(points);

    for (index, run) in runs.iter().enumerate() {
        let anno = chart.draw_series(
            AreaSeries::new(monotone_samples(run), baseline, color.mix(0.6).filled())
                .border_style(color.stroke_width(1)),
        )?;
        if index == 0 {
            anno.label(series.key.as_str()).legend(box_marker(color));
        }
    }

    if runs.is_empty() {
        legend_only(chart, series)?;
    }
    Ok(())
}

fn draw_bars(
    chart: &mut Chart<'_, '_>,
    series: &Series,
    points: &[Option<(f64, f64)>],
    baseline: f64,
    slots: usize,
) -> DrawResult<()> {
    let color = series.color;
    let plot_width = f64::from(CHART_WIDTH - 2 * MARGIN - Y_AXIS_WIDTH);
    let half = (BAR_SIZE * slots as f64 / plot_width).min(0.8) / 2.0;

    let bars: Vec<_> = points
        .iter()
        .flatten()
        .map(|&(x, y)| Rectangle::new([(x - half, baseline), (x + half, y)], color.filled()))
        .collect();

    if bars.is_empty() {
        return legend_only(chart, series);
    }

    chart
        .draw_series(bars)?
        .label(series.key.as_str())
        .legend(box_marker(color));
    Ok(())
}

fn draw_line(
    chart: &mut Chart<'_, '_>,
    series: &Series,
    points: &[Option<(f64, f64)>],
) -> DrawResult<()> {
    let color = series.color;
    let present: Vec<(f64, f64)> = points.iter().flatten().copied().collect();
    if present.is_empty() {
        return legend_only(chart, series);
    }

    for run in runs(points).iter().filter(|run| run.len() > 1) {
        chart.draw_series(LineSeries::new(monotone_samples(run), color.stroke_width(2)))?;
    }

    chart
        .draw_series(present.into_iter().map(|p| Circle::new(p, 3, color.stroke_width(1))))?
        .label(series.key.as_str())
        .legend(line_marker(color));
    Ok(())
}

/// Legend entry for a series that has nothing to plot
fn legend_only(chart: &mut Chart<'_, '_>, series: &Series) -> DrawResult<()> {
    let color = series.color;
    let anno = chart.draw_series(std::iter::empty::<Circle<(f64, f64), i32>>())?;
    anno.label(series.key.as_str());

    match series.kind {
        SeriesKind::Line => anno.legend(line_marker(color)),
        SeriesKind::Area | SeriesKind::Bar => anno.legend(box_marker(color)),
    };
    Ok(())
}

fn box_marker(color: RGBColor) -> impl Fn((i32, i32)) -> Rectangle<(i32, i32)> {
    move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
}

fn line_marker(color: RGBColor) -> impl Fn((i32, i32)) -> PathElement<(i32, i32)> {
    move |(x, y)| PathElement::new(vec![(x, y), (x + 14, y)], color.stroke_width(3))
}

/// Transparent hover rects, one per slot, carrying a `<title>`
fn tooltips(bands: &[Band]) -> String {
    let mut out = String::from(r#"<g class="tooltip" fill="transparent">"#);
    for band in bands {
        out.push_str(&format!(
            r#"<rect x="{}" y="{}" width="{}" height="{}"><title>{}</title></rect>"#,
            band.left,
            band.top,
            band.right - band.left,
            band.bottom - band.top,
            escape(&band.title)
        ));
    }
    out.push_str("</g>\n");
    out
}

/// X-axis label for a tick; only whole slots carry a date
fn slot_label(data: &[ChartDataPoint], x: f64) -> String {
    let slot = x.round();
    if (x - slot).abs() > 1e-6 || slot < 0.0 {
        return String::new();
    }
    data.get(slot as usize)
        .map(|p| p.date.clone())
        .unwrap_or_default()
}

/// Split a gappy series into contiguous runs of present points
fn runs(points: &[Option<(f64, f64)>]) -> Vec<Vec<(f64, f64)>> {
    points
        .split(Option::is_none)
        .filter(|run| !run.is_empty())
        .map(|run| run.iter().flatten().copied().collect())
        .collect()
}

/// Sample a monotone cubic (Fritsch–Carlson slopes) through `points`.
///
/// The curve never overshoots between two consecutive points, so a run of
/// equal values stays flat and extrema sit exactly on data points.
fn monotone_samples(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let tangents = monotone_tangents(points);
    let mut samples = vec![points[0]];
    for (i, pair) in points.windows(2).enumerate() {
        let ((xa, ya), (xb, yb)) = (pair[0], pair[1]);
        let h = xb - xa;
        for step in 1..=CURVE_SAMPLES {
            let t = step as f64 / CURVE_SAMPLES as f64;
            let (t2, t3) = (t * t, t * t * t);
            let y = (2.0 * t3 - 3.0 * t2 + 1.0) * ya
                + (t3 - 2.0 * t2 + t) * h * tangents[i]
                + (-2.0 * t3 + 3.0 * t2) * yb
                + (t3 - t2) * h * tangents[i + 1];
            samples.push((t.mul_add(h, xa), y));
        }
    }
    samples
}

fn monotone_tangents(points: &[(f64, f64)]) -> Vec<f64> {
    let n = points.len();
    let secants: Vec<f64> = points
        .windows(2)
        .map(|w| {
            let dx = w[1].0 - w[0].0;
            if dx == 0.0 { 0.0 } else { (w[1].1 - w[0].1) / dx }
        })
        .collect();

    let mut tangents = vec![0.0; n];
    for i in 1..n - 1 {
        let (s0, s1) = (secants[i - 1], secants[i]);
        if s0 * s1 <= 0.0 {
            continue;
        }
        let h0 = points[i].0 - points[i - 1].0;
        let h1 = points[i + 1].0 - points[i].0;
        let p = s0.mul_add(h1, s1 * h0) / (h0 + h1);
        tangents[i] = s0.signum() * s0.abs().min(s1.abs()).min(0.5 * p.abs()) * 2.0;
    }

    // One-sided end slopes from the neighbouring tangent.
    tangents[0] = end_slope(secants[0], tangents[1]);
    tangents[n - 1] = end_slope(secants[n - 2], tangents[n - 2]);
    tangents
}

fn end_slope(secant: f64, neighbour: f64) -> f64 {
    let slope = secant.mul_add(3.0, -neighbour) / 2.0;
    if slope * secant <= 0.0 { 0.0 } else { slope }
}

/// Format a value with at most two decimals
fn format_value(v: f64) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    if !rounded.is_finite() {
        format!("{v:e}")
    } else if rounded == 0.0 {
        "0".into()
    } else {
        rounded.to_string()
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<ChartDataPoint> {
        vec![
            ChartDataPoint::new("04/01/2025", 2.0, 40.0, 3.0),
            ChartDataPoint::new("04/02/2025", 5.0, 120.0, 7.0),
            ChartDataPoint::new("04/03/2025", 1.0, 15.0, 1.0),
        ]
    }

    fn without_price(data: &[ChartDataPoint]) -> Vec<ChartDataPoint> {
        data.iter()
            .map(|p| ChartDataPoint { price: None, ..p.clone() })
            .collect()
    }

    fn without_quantity(data: &[ChartDataPoint]) -> Vec<ChartDataPoint> {
        data.iter()
            .map(|p| ChartDataPoint { quantity: None, ..p.clone() })
            .collect()
    }

    /// Elements with the given tag whose markup mentions `color`
    fn count(svg: &str, tag: &str, color: &str) -> usize {
        svg.split('<')
            .filter(|element| element.starts_with(tag) && element.to_uppercase().contains(color))
            .count()
    }

    /// Whether some `<text>` element reads exactly `label`
    fn has_text(svg: &str, label: &str) -> bool {
        svg.split("<text")
            .skip(1)
            .filter_map(|element| element.split_once('>'))
            .filter_map(|(_, rest)| rest.split_once("</text>"))
            .any(|(body, _)| body.trim() == label)
    }

    #[test]
    fn test_fixed_surface() {
        let svg = ComposedChart::default().render(&sample());
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"width="730""#));
        assert!(svg.contains(r#"height="250""#));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_one_bar_per_price_value() {
        let chart = ComposedChart::default();
        let full = chart.render(&sample());
        let bare = chart.render(&without_price(&sample()));

        assert!(count(&full, "rect", "413EA0") >= count(&bare, "rect", "413EA0") + 3);
        assert!(count(&full, "polygon", "8884D8") >= 1);
    }

    #[test]
    fn test_missing_key_degrades_to_absent_series() {
        let data: Vec<ChartDataPoint> =
            serde_json::from_str(r#"[{"date":"a","orders":1},{"date":"b","orders":3}]"#).unwrap();

        let svg = ComposedChart::default().render(&data);
        assert!(count(&svg, "polygon", "8884D8") >= 1);
        assert_eq!(count(&svg, "circle", "FF7300"), 0);
        // Legend still lists every configured series.
        assert!(has_text(&svg, "quantity"));
        assert!(has_text(&svg, "price"));
    }

    #[test]
    fn test_gap_splits_line() {
        let mut data = sample();
        data.insert(1, ChartDataPoint { date: "gap".into(), ..Default::default() });
        data.push(ChartDataPoint::new("04/04/2025", 2.0, 10.0, 4.0));

        let chart = ComposedChart::default();
        let svg = chart.render(&data);
        let bare = chart.render(&without_quantity(&data));

        // [p0] [p2 p3 p4]: only the second run is long enough for a line
        assert_eq!(count(&svg, "polyline", "FF7300") - count(&bare, "polyline", "FF7300"), 1);
        assert_eq!(count(&svg, "circle", "FF7300"), 4);
    }

    #[test]
    fn test_empty_data_renders_frame_only() {
        let svg = ComposedChart::default().render(&[]);
        assert!(svg.starts_with("<svg"));
        assert!(!svg.contains("<polygon"));
        assert!(has_text(&svg, "orders"));
    }

    #[test]
    fn test_tooltip_lists_values() {
        let svg = ComposedChart::default().render(&sample());
        assert_eq!(svg.matches("<title>").count(), 3);
        assert!(svg.contains("<title>04/02/2025\norders : 5\nprice : 120\nquantity : 7</title>"));
    }

    #[test]
    fn test_tooltip_is_escaped() {
        let data = vec![ChartDataPoint::new("<b>&", 1.0, 1.0, 1.0)];
        let svg = ComposedChart::default().render(&data);
        assert!(svg.contains("<title>&lt;b&gt;&amp;\n"));
    }

    #[test]
    fn test_huge_values_do_not_panic() {
        let chart = ComposedChart::default();

        let svg = chart.render(&[ChartDataPoint::new("a", 1.0, 1.7e308, 1.0)]);
        assert!(svg.starts_with("<svg"));

        let svg = chart.render(&[
            ChartDataPoint::new("a", -f64::MAX, f64::MAX, 1.0),
            ChartDataPoint::new("b", f64::INFINITY, f64::NAN, 2.0),
        ]);
        assert!(svg.contains("</svg>"));
    }

    #[test]
    fn test_y_range_falls_back_when_span_overflows() {
        let chart = ComposedChart::default();
        let data = [ChartDataPoint::new("a", -f64::MAX, f64::MAX, 0.0)];
        assert_eq!(chart.y_range(&data), (0.0, 1.0));

        let (lo, hi) = chart.y_range(&[ChartDataPoint::new("a", 1.0, 1.7e308, 1.0)]);
        assert_eq!(lo, 0.0);
        assert!(hi.is_finite() && hi >= 1.7e308);
    }

    #[test]
    fn test_y_range_covers_zero_and_pads() {
        let chart = ComposedChart::default();
        assert_eq!(chart.y_range(&[]), (0.0, 1.0));

        let (lo, hi) = chart.y_range(&sample());
        assert_eq!(lo, 0.0);
        assert!((hi - 126.0).abs() < 1e-9);
    }

    #[test]
    fn test_slot_labels_only_on_whole_slots() {
        let data = sample();
        assert_eq!(slot_label(&data, 1.0), "04/02/2025");
        assert_eq!(slot_label(&data, 0.5), "");
        assert_eq!(slot_label(&data, 7.0), "");
        assert_eq!(slot_label(&data, -1.0), "");
    }

    #[test]
    fn test_monotone_tangents_flat_at_extremum() {
        let points = [(0.0, 0.0), (1.0, 10.0), (2.0, 0.0)];
        let tangents = monotone_tangents(&points);
        assert_eq!(tangents[1], 0.0);
    }

    #[test]
    fn test_monotone_samples_do_not_overshoot() {
        let points = [(0.0, 0.0), (1.0, 1.0), (2.0, 10.0), (3.0, 10.5)];
        let samples = monotone_samples(&points);

        assert_eq!(samples.len(), 1 + 3 * CURVE_SAMPLES);
        assert_eq!(samples.last(), Some(&(3.0, 10.5)));
        for pair in points.windows(2) {
            let (lo, hi) = (pair[0].1.min(pair[1].1), pair[0].1.max(pair[1].1));
            for &(x, y) in samples.iter().filter(|(x, _)| *x >= pair[0].0 && *x <= pair[1].0) {
                assert!(y >= lo - 1e-9 && y <= hi + 1e-9, "x={x}: {y}");
            }
        }
    }
}
