//! Univariate charts for a single column.
//!
//! Each operation turns one precomputed summary into a [`Figure`]:
//! derive a small table, lay glyphs over it, attach tooltips, then apply
//! the axis, grid and legend cosmetics. Nothing is kept between calls except
//! the render-success flags.

use std::collections::HashSet;
use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;
use log::{debug, info};

use crate::config::VizConfig;
use crate::error::{VizError, VizResult};
use crate::figure::{
    AxisRange, AxisScale, ColumnDataSource, Figure, Glyph, HoverMode, HoverTool, Legend,
    LegendLocation, Ticker,
};
use crate::models::{BoxSummary, CategoryCounts, Histogram, QuantilePairs};
use crate::palette::{CATEGORY20C, PALETTE, take_cycled};
use crate::stats::{
    Bandwidth, GaussianKde, density_histogram, drop_missing, linspace, min_max, percentage,
    title_with_missing,
};
use crate::viz::text::truncate_label;

/// Chart kinds, one render-success flag each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Pie,
    Bar,
    Histogram,
    QqNorm,
    Kde,
    Box,
}

impl ChartKind {
    pub const ALL: [ChartKind; 6] = [
        ChartKind::Pie,
        ChartKind::Bar,
        ChartKind::Histogram,
        ChartKind::QqNorm,
        ChartKind::Kde,
        ChartKind::Box,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Set once a chart kind has rendered without error; never reset.
#[derive(Debug, Default)]
pub struct RenderFlags {
    flags: [AtomicBool; 6],
}

impl RenderFlags {
    pub fn is_rendered(&self, kind: ChartKind) -> bool {
        self.flags[kind.index()].load(Ordering::Relaxed)
    }

    fn mark(&self, kind: ChartKind) {
        self.flags[kind.index()].store(true, Ordering::Relaxed);
    }
}

/// Box width used when the caller has no preference.
pub const DEFAULT_BOX_WIDTH: f64 = 0.25;

const BAR_FILL: &str = "#3182bd";
const HIST_FILL: &str = "#6baed6";
const KDE_LINE: &str = "#9467bd";

/// The chart renderer.
#[derive(Debug, Default)]
pub struct UniViz {
    config: VizConfig,
    flags: RenderFlags,
}

impl UniViz {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: VizConfig) -> VizResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            flags: RenderFlags::default(),
        })
    }

    pub fn config(&self) -> &VizConfig {
        &self.config
    }

    pub fn flags(&self) -> &RenderFlags {
        &self.flags
    }

    fn figure(&self, title: impl Into<String>) -> Figure {
        Figure::new(
            title,
            &self.config.title_font_size,
            self.config.plot_width,
            self.config.plot_height,
        )
    }

    /// Pie chart of category counts.
    ///
    /// The `bars` largest (or smallest, when `ascending`) categories get their
    /// own slice; the rest collapse into one `"Other"` slice.
    pub fn pie_viz(
        &self,
        data: &CategoryCounts,
        col_x: &str,
        bars: usize,
        ascending: bool,
    ) -> VizResult<Figure> {
        if bars == 0 {
            return Err(VizError::out_of_range("bars", "must show at least one slice"));
        }
        let mut rows = sorted_present(data, ascending);
        if rows.is_empty() {
            return Err(VizError::EmptyInput(format!("no counts for `{col_x}`")));
        }
        if rows.len() > bars {
            let other: u64 = rows[bars..].iter().map(|(_, c)| c).sum();
            rows.truncate(bars);
            rows.push(("Other".to_string(), other));
        }

        let total: u64 = rows.iter().map(|(_, c)| c).sum();
        let mut percen = Vec::with_capacity(rows.len());
        for (_, c) in &rows {
            percen.push(percentage(*c as f64, total as f64, "pie slice share")?);
        }
        let angle: Vec<f64> = percen.iter().map(|p| p / 100.0 * 2.0 * PI).collect();
        let mut start_angle = Vec::with_capacity(angle.len());
        let mut end_angle = Vec::with_capacity(angle.len());
        let mut acc = 0.0;
        for a in &angle {
            start_angle.push(acc);
            acc += a;
            end_angle.push(acc);
        }

        let n = rows.len();
        let (cats, counts): (Vec<String>, Vec<u64>) = rows.into_iter().unzip();
        let source = ColumnDataSource::new()
            .with_text("cat", cats)
            .with_numbers("count", counts.iter().map(|&c| c as f64).collect())
            .with_numbers("percen", percen)
            .with_numbers("angle", angle)
            .with_numbers("start_angle", start_angle)
            .with_numbers("end_angle", end_angle)
            .with_text("colour", take_cycled(&CATEGORY20C, n));

        let mut fig = self.figure(col_x);
        fig.add_glyph(
            Some("wedge"),
            source,
            Glyph::Wedge {
                x: 0.0,
                y: 1.0,
                radius: self.config.pie_radius,
                start_angle: "start_angle".into(),
                end_angle: "end_angle".into(),
                fill_color: "colour".into(),
                line_color: "white".into(),
            },
        );
        fig.add_tool(HoverTool::new(
            &[
                (col_x, "@cat"),
                ("Count", "@count"),
                ("Percentage", "@percen{0.2f}%"),
            ],
            HoverMode::Mouse,
        ));
        if n <= self.config.max_num_legend {
            fig.legend = Some(Legend {
                renderer: "wedge".into(),
                label_field: "cat".into(),
                label_text_font_size: self.config.legend_font_size.clone(),
                location: LegendLocation::Right,
            });
        } else {
            info!("pie `{col_x}`: {n} slices, legend omitted");
        }
        for axis in [&mut fig.x_axis, &mut fig.y_axis] {
            axis.label = None;
            axis.visible = false;
            axis.grid_visible = false;
        }

        debug!("pie `{col_x}`: {n} slices, total {total}");
        self.flags.mark(ChartKind::Pie);
        Ok(fig)
    }

    /// Bar chart of the `bars` largest (or smallest) categories.
    ///
    /// Percentages are taken against all counts plus `missing`, so the shown
    /// bars and the missing share never exceed 100% together.
    pub fn bar_viz(
        &self,
        data: &CategoryCounts,
        missing: u64,
        col_x: &str,
        bars: usize,
        ascending: bool,
    ) -> VizResult<Figure> {
        if bars == 0 {
            return Err(VizError::out_of_range("bars", "must show at least one bar"));
        }
        let mut rows = sorted_present(data, ascending);
        if rows.is_empty() {
            return Err(VizError::EmptyInput(format!("no counts for `{col_x}`")));
        }
        let distinct = rows.len();
        let total = rows.iter().map(|(_, c)| *c).sum::<u64>() + missing;
        rows.truncate(bars);

        let cats = distinct_labels(
            rows.iter()
                .map(|(c, _)| truncate_label(c, self.config.max_xlab_len)),
        );
        let mut percen = Vec::with_capacity(rows.len());
        for (_, c) in &rows {
            percen.push(percentage(*c as f64, total as f64, "bar share")?);
        }
        let shown = rows.len();
        let source = ColumnDataSource::new()
            .with_numbers("count", rows.iter().map(|(_, c)| *c as f64).collect())
            .with_text("cat", cats.clone())
            .with_numbers("percen", percen);

        let mut fig = self.figure(title_with_missing(col_x, missing, total as f64)?);
        fig.x_axis.range = AxisRange::Factors(cats);
        fig.add_glyph(
            Some("bars"),
            source,
            Glyph::VBar {
                x: "cat".into(),
                top: "count".into(),
                bottom: 0.0,
                width: 0.9,
                fill_color: BAR_FILL.into(),
            },
        );
        fig.add_tool(HoverTool::new(
            &[
                (col_x, "@cat"),
                ("Count", "@count"),
                ("Percentage", "@percen{0.2f}%"),
            ],
            HoverMode::Mouse,
        ));

        fig.x_axis.major_label_orientation = PI / 3.0;
        fig.x_axis.grid_visible = false;
        fig.y_axis.grid_visible = false;
        fig.y_axis.hide_major_labels();
        fig.y_axis.major_tick_line_color = None;
        fig.y_axis.minor_tick_line_color = None;
        fig.y_axis.label = Some("Count".into());
        if shown < distinct {
            fig.x_axis.label = Some(self.config.category_caption(shown, distinct));
        }
        if bars > self.config.max_bar_labels {
            info!("bar `{col_x}`: {bars} bars requested, x labels hidden");
            fig.x_axis.hide_major_labels();
        }

        debug!("bar `{col_x}`: {shown} of {distinct} categories, total {total}");
        self.flags.mark(ChartKind::Bar);
        Ok(fig)
    }

    /// Histogram of precomputed bins. Each bin's percentage is taken against
    /// `orig_df_len`, the row count before missing values were dropped.
    pub fn hist_viz(
        &self,
        data: &Histogram,
        missing: u64,
        orig_df_len: u64,
        show_y_label: bool,
        col_x: &str,
        yscale: AxisScale,
    ) -> VizResult<Figure> {
        data.validate()?;
        if orig_df_len == 0 {
            return Err(VizError::ZeroDenominator(format!(
                "histogram percentages for `{col_x}` (no rows)"
            )));
        }
        let total = orig_df_len as f64;
        let freq: Vec<f64> = data.counts.iter().map(|&c| c as f64).collect();
        let mut percen = Vec::with_capacity(freq.len());
        for f in &freq {
            percen.push(percentage(*f, total, "bin share")?);
        }
        let source = ColumnDataSource::new()
            .with_numbers("left", data.lefts().to_vec())
            .with_numbers("right", data.rights().to_vec())
            .with_numbers("freq", freq)
            .with_numbers("percen", percen);

        let mut fig = self.figure(title_with_missing(col_x, missing, total)?);
        fig.y_axis.scale = yscale;
        fig.add_glyph(
            Some("hist"),
            source,
            Glyph::Quad {
                left: "left".into(),
                right: "right".into(),
                top: "freq".into(),
                bottom: 0.01,
                fill_color: HIST_FILL.into(),
                alpha: 0.5,
            },
        );
        fig.add_tool(HoverTool::new(
            &[
                ("Bin", "[@left, @right]"),
                ("Frequency", "@freq"),
                ("Percentage", "@percen{0.2f}%"),
            ],
            HoverMode::VLine,
        ));

        fig.x_axis.major_label_orientation = PI / 3.0;
        fig.x_axis.major_label_text_font_size = Some("10pt".into());
        fig.x_axis.major_tick_line_color = Some("black".into());
        fig.x_axis.grid_visible = false;
        fig.y_axis.grid_visible = false;
        fig.y_axis.label = Some("Frequency".into());
        fig.x_axis.ticker = Ticker::Fixed(data.edges.clone());
        if !show_y_label {
            fig.y_axis.hide_major_labels();
            fig.y_axis.major_tick_line_color = None;
            fig.y_axis.minor_tick_line_color = None;
            fig.x_axis.minor_tick_line_color = None;
        }

        debug!("histogram `{col_x}`: {} bins", data.counts.len());
        self.flags.mark(ChartKind::Histogram);
        Ok(fig)
    }

    /// Normal QQ plot with the `y = x` reference line across the joint range.
    pub fn qqnorm_viz(&self, data: &QuantilePairs, col_x: &str) -> VizResult<Figure> {
        data.validate()?;
        let (lo, hi) = data.extent();

        let mut fig = self.figure(col_x);
        fig.add_glyph(
            Some("points"),
            ColumnDataSource::new()
                .with_numbers("x", data.theory.clone())
                .with_numbers("y", data.sample.clone()),
            Glyph::Circle {
                x: "x".into(),
                y: "y".into(),
                size: 3.0,
                fill_color: PALETTE[0].into(),
            },
        );
        fig.add_glyph(
            Some("diagonal"),
            ColumnDataSource::new()
                .with_numbers("x", vec![lo, hi])
                .with_numbers("y", vec![lo, hi]),
            Glyph::Line {
                x: "x".into(),
                y: "y".into(),
                line_color: "red".into(),
                line_width: 1.0,
                alpha: 1.0,
            },
        );
        fig.add_tool(HoverTool::new(&[("x", "@x"), ("y", "@y")], HoverMode::Mouse));
        fig.x_axis.grid_visible = false;
        fig.y_axis.grid_visible = false;
        fig.x_axis.label = Some("Normal Quantiles".into());
        fig.y_axis.label = Some(format!("Quantiles of {col_x}"));

        debug!("qqnorm `{col_x}`: {} points", data.theory.len());
        self.flags.mark(ChartKind::QqNorm);
        Ok(fig)
    }

    /// Density histogram of the raw sample with a Gaussian KDE curve on top.
    /// Missing (NaN) values are dropped first.
    pub fn hist_kde_viz(
        &self,
        data: &[f64],
        bandwidth: impl Into<Bandwidth>,
        col_x: &str,
    ) -> VizResult<Figure> {
        let clean = drop_missing(data);
        if clean.is_empty() {
            return Err(VizError::EmptyInput(format!("no values in `{col_x}`")));
        }
        if clean.iter().any(|v| v.is_infinite()) {
            return Err(VizError::NonFinite(format!("values of `{col_x}`")));
        }
        let hist = density_histogram(&clean, self.config.kde_bins)?;
        let kde = GaussianKde::new(&clean, bandwidth.into())?;
        let (lo, hi) = min_max(&clean)
            .ok_or_else(|| VizError::EmptyInput(format!("no values in `{col_x}`")))?;
        let xs = linspace(lo, hi, self.config.num_x_vals);
        let ys = kde.evaluate_many(&xs);

        let edges = hist.edges;
        let mut fig = self.figure(col_x);
        fig.add_glyph(
            Some("hist"),
            ColumnDataSource::new()
                .with_numbers("left", edges[..edges.len() - 1].to_vec())
                .with_numbers("right", edges[1..].to_vec())
                .with_numbers("freq", hist.densities),
            Glyph::Quad {
                left: "left".into(),
                right: "right".into(),
                top: "freq".into(),
                bottom: 1e-7,
                fill_color: HIST_FILL.into(),
                alpha: 0.5,
            },
        );
        fig.add_glyph(
            Some("kde"),
            ColumnDataSource::new()
                .with_numbers("x", xs)
                .with_numbers("y", ys),
            Glyph::Line {
                x: "x".into(),
                y: "y".into(),
                line_color: KDE_LINE.into(),
                line_width: 2.0,
                alpha: 0.5,
            },
        );
        fig.add_tool(
            HoverTool::new(
                &[("Bin", "[@left, @right]"), ("Density", "@freq")],
                HoverMode::Mouse,
            )
            .for_renderers(&["hist"]),
        );
        fig.add_tool(
            HoverTool::new(&[("x", "@x"), ("y", "@y")], HoverMode::Mouse).for_renderers(&["kde"]),
        );

        fig.x_axis.major_label_orientation = PI / 3.0;
        fig.x_axis.major_label_text_font_size = Some("10pt".into());
        fig.y_axis.major_label_text_font_size = Some("10pt".into());
        fig.x_axis.grid_visible = false;
        fig.y_axis.grid_visible = false;
        fig.y_axis.label = Some("Density".into());

        debug!(
            "kde `{col_x}`: {} values, kernel sigma {:.4}",
            clean.len(),
            kde.sigma()
        );
        self.flags.mark(ChartKind::Kde);
        Ok(fig)
    }

    /// Box plot, one box per category at x = 1..N in input order.
    ///
    /// `box_width` is the full width of each box ([`DEFAULT_BOX_WIDTH`] when
    /// in doubt); the median line and the whisker caps span the same width.
    pub fn box_viz(
        &self,
        data: &IndexMap<String, BoxSummary>,
        col_x: &str,
        col_y: Option<&str>,
        box_width: f64,
    ) -> VizResult<Figure> {
        if data.is_empty() {
            return Err(VizError::EmptyInput("no box summaries".into()));
        }
        if !(box_width.is_finite() && box_width > 0.0) {
            return Err(VizError::out_of_range(
                "box_width",
                format!("{box_width} is not a positive width"),
            ));
        }
        for (cat, summary) in data {
            summary.validate(cat)?;
        }

        let n = data.len();
        let xs: Vec<f64> = (1..=n).map(|i| i as f64).collect();
        let summaries: Vec<&BoxSummary> = data.values().collect();
        let col = |f: fn(&BoxSummary) -> f64| summaries.iter().map(|s| f(*s)).collect::<Vec<_>>();
        let half = box_width / 2.0;
        let source = ColumnDataSource::new()
            .with_text("cat", data.keys().cloned().collect())
            .with_numbers("x", xs.clone())
            .with_numbers("lw", col(|s| s.lw))
            .with_numbers("tf", col(|s| s.tf))
            .with_numbers("fy", col(|s| s.fy))
            .with_numbers("sf", col(|s| s.sf))
            .with_numbers("uw", col(|s| s.uw))
            .with_numbers("y", col(BoxSummary::center))
            .with_numbers("w", vec![box_width; n])
            .with_numbers("h", col(BoxSummary::height))
            .with_numbers("x0", xs.iter().map(|x| x - half).collect())
            .with_numbers("x1", xs.iter().map(|x| x + half).collect());

        let title = match col_y {
            Some(y) => format!("{y} by {col_x}"),
            None => col_x.to_string(),
        };
        let mut fig = Figure::new(
            title,
            &self.config.title_font_size,
            self.config.box_plot_width,
            self.config.box_plot_height,
        );

        fig.add_glyph(
            Some("box"),
            source.clone(),
            Glyph::Rect {
                x: "x".into(),
                y: "y".into(),
                width: "w".into(),
                height: "h".into(),
                fill_color: PALETTE[0].into(),
            },
        );
        fig.add_glyph(Some("median"), source.clone(), segment("x0", "fy", "x1", "fy"));
        for (x, summary) in xs.iter().zip(&summaries) {
            fig.add_glyph(
                Some("outlier"),
                ColumnDataSource::new()
                    .with_numbers("x", vec![*x; summary.outliers.len()])
                    .with_numbers("y", summary.outliers.clone()),
                Glyph::Circle {
                    x: "x".into(),
                    y: "y".into(),
                    size: 3.0,
                    fill_color: PALETTE[6].into(),
                },
            );
        }
        fig.add_glyph(Some("upper_whisker"), source.clone(), segment("x", "uw", "x", "sf"));
        fig.add_glyph(Some("lower_whisker"), source.clone(), segment("x", "lw", "x", "tf"));
        fig.add_glyph(Some("upper"), source.clone(), segment("x0", "uw", "x1", "uw"));
        fig.add_glyph(Some("lower"), source, segment("x0", "lw", "x1", "lw"));

        fig.add_tool(
            HoverTool::new(
                &[("25%", "@tf"), ("50%", "@fy"), ("75%", "@sf")],
                HoverMode::Mouse,
            )
            .for_renderers(&["box"]),
        );
        fig.add_tool(
            HoverTool::new(&[("Upper Whisker", "@uw")], HoverMode::Mouse)
                .for_renderers(&["upper"]),
        );
        fig.add_tool(
            HoverTool::new(&[("Lower Whisker", "@lw")], HoverMode::Mouse)
                .for_renderers(&["lower"]),
        );
        fig.add_tool(
            HoverTool::new(&[("Value", "@y")], HoverMode::Mouse).for_renderers(&["outlier"]),
        );

        fig.x_axis.major_label_orientation = PI / 4.0;
        fig.y_axis.label = col_y.map(str::to_string);
        fig.x_axis.ticker = Ticker::Fixed(xs.clone());
        fig.x_axis.tick_labels = xs.into_iter().zip(data.keys().cloned()).collect();

        debug!("box `{col_x}`: {n} boxes");
        self.flags.mark(ChartKind::Box);
        Ok(fig)
    }
}

/// Present entries sorted by count; a stable sort keeps input order on ties.
fn sorted_present(data: &CategoryCounts, ascending: bool) -> Vec<(String, u64)> {
    let mut rows: Vec<(String, u64)> = data
        .iter()
        .filter_map(|(k, v)| v.map(|c| (k.clone(), c)))
        .collect();
    if ascending {
        rows.sort_by(|a, b| a.1.cmp(&b.1));
    } else {
        rows.sort_by(|a, b| b.1.cmp(&a.1));
    }
    rows
}

/// Suffix `(2)`, `(3)`, .. onto labels that repeat an earlier one, so every
/// factor on a categorical axis stays distinct after truncation.
fn distinct_labels(labels: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for label in labels {
        let mut candidate = label.clone();
        let mut n = 2;
        while !seen.insert(candidate.clone()) {
            candidate = format!("{label}({n})");
            n += 1;
        }
        out.push(candidate);
    }
    out
}

fn segment(x0: &str, y0: &str, x1: &str, y1: &str) -> Glyph {
    Glyph::Segment {
        x0: x0.into(),
        y0: y0.into(),
        x1: x1.into(),
        y1: y1.into(),
        line_width: 1.5,
        line_color: "black".into(),
    }
}
