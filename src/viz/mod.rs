//! Static export: draw a [`Figure`] to **SVG** or **PNG** with Plotters.
//!
//! - Pie figures (wedges, no axes) are drawn as polygons, with a right-hand legend panel
//! - Cartesian figures draw bars, quads, points, lines, rects and segments
//! - Categorical ranges, fixed tickers and tick-label maps become explicit tick labels
//! - Hidden labels/ticks/grids and a log y scale are honored; tooltips are interactive-only
//! - Locale-aware tick labels (`30,000` vs `30.000`)

pub mod legend;
pub mod text;
pub mod util;

use anyhow::{Result, anyhow, bail};
use log::{debug, warn};
use num_format::Locale;

use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontFamily, FontTransform};

use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;

use std::f64::consts::PI;
use std::path::Path;
use std::sync::Once;

use crate::figure::{AxisRange, AxisScale, ColumnDataSource, Figure, Glyph, Ticker};
use legend::draw_legend_panel;
use text::estimate_text_width_px;
use util::{compute_left_label_area_px, font_px, format_tick, map_locale, padded, parse_color};

/// One-time registration for a fallback "sans-serif" font when using the `ab_glyph` text path.
/// Required because `ab_glyph` doesn't discover OS fonts.
static INIT_FONTS: Once = Once::new();

fn ensure_fonts_registered() {
    INIT_FONTS.call_once(|| {
        // from `src/viz/mod.rs` → project root → `assets/DejaVuSans.ttf`
        let _ = plotters::style::register_font(
            "sans-serif",
            plotters::style::FontStyle::Normal,
            include_bytes!("../../assets/DejaVuSans.ttf"),
        );
    });
}

/// Render `figure` to `out_path` (SVG when the extension is `.svg`, PNG otherwise).
pub fn save_figure<P: AsRef<Path>>(figure: &Figure, out_path: P, width: u32, height: u32) -> Result<()> {
    save_figure_locale(figure, out_path, width, height, "en")
}

/// Same as `save_figure` but with a locale tag for tick labels (e.g., "en" or "de").
pub fn save_figure_locale<P: AsRef<Path>>(
    figure: &Figure,
    out_path: P,
    width: u32,
    height: u32,
    locale_tag: &str,
) -> Result<()> {
    if width == 0 || height == 0 {
        bail!("image size must be positive, got {width}x{height}");
    }
    ensure_fonts_registered();
    let out_path = out_path.as_ref();
    let path_string = out_path.to_string_lossy().into_owned();
    let locale = map_locale(locale_tag);

    if out_path.extension().and_then(|s| s.to_str()) == Some("svg") {
        let root = SVGBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
        draw_figure(root, figure, locale)?;
    } else {
        let root = BitMapBackend::new(path_string.as_str(), (width, height)).into_drawing_area();
        draw_figure(root, figure, locale)?;
    }
    debug!("saved `{}` to {}", figure.title.text, out_path.display());
    Ok(())
}

/// Render `figure` to an in-memory SVG document.
pub fn render_svg(figure: &Figure, width: u32, height: u32) -> Result<String> {
    if width == 0 || height == 0 {
        bail!("image size must be positive, got {width}x{height}");
    }
    ensure_fonts_registered();
    let mut buf = String::new();
    {
        let root = SVGBackend::with_string(&mut buf, (width, height)).into_drawing_area();
        draw_figure(root, figure, &Locale::en)?;
    }
    Ok(buf)
}

/// Geometry resolved from glyphs, in data coordinates.
enum Mark {
    Rect {
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        color: RGBColor,
        alpha: f64,
    },
    Dot {
        x: f64,
        y: f64,
        radius: i32,
        color: RGBColor,
    },
    Path {
        points: Vec<(f64, f64)>,
        color: RGBColor,
        width: u32,
        alpha: f64,
    },
}

impl Mark {
    fn points(&self) -> Vec<(f64, f64)> {
        match self {
            Mark::Rect { x0, y0, x1, y1, .. } => vec![(*x0, *y0), (*x1, *y1)],
            Mark::Dot { x, y, .. } => vec![(*x, *y)],
            Mark::Path { points, .. } => points.clone(),
        }
    }

    fn map_y(&mut self, f: impl Fn(f64) -> f64) {
        match self {
            Mark::Rect { y0, y1, .. } => {
                *y0 = f(*y0);
                *y1 = f(*y1);
            }
            Mark::Dot { y, .. } => *y = f(*y),
            Mark::Path { points, .. } => {
                for p in points.iter_mut() {
                    p.1 = f(p.1);
                }
            }
        }
    }
}

fn draw_figure<DB>(root: DrawingArea<DB, Shift>, figure: &Figure, locale: &Locale) -> Result<()>
where
    DB: DrawingBackend,
{
    root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;

    let items = legend_items(figure)?;
    let (plot_area, legend_area) = if items.is_empty() {
        (root, None)
    } else {
        let (plot, legend) = root.split_horizontally((75).percent_width());
        (plot, Some(legend))
    };

    let is_pie = figure
        .renderers
        .iter()
        .any(|r| matches!(r.glyph, Glyph::Wedge { .. }));
    if is_pie && !figure.axes_visible() {
        draw_pie(&plot_area, figure)?;
    } else {
        draw_cartesian(&plot_area, figure, locale)?;
    }

    if let (Some(area), Some(legend)) = (legend_area.as_ref(), figure.legend.as_ref()) {
        let px = font_px(Some(&legend.label_text_font_size), 10) * 3 / 2;
        draw_legend_panel(area, &items, px)?;
    }

    plot_area.present().map_err(|e| anyhow!("{:?}", e))?;
    if let Some(area) = legend_area {
        area.present().map_err(|e| anyhow!("{:?}", e))?;
    }
    Ok(())
}

fn title_px(figure: &Figure) -> u32 {
    (font_px(Some(&figure.title.font_size), 10) as f64 * 1.6).round().max(12.0) as u32
}

fn numbers<'a>(source: &'a ColumnDataSource, field: &str) -> Result<&'a [f64]> {
    source
        .numbers(field)
        .ok_or_else(|| anyhow!("numeric column `{field}` not found"))
}

/// (label, color) per legend row, empty when the figure has no legend.
fn legend_items(figure: &Figure) -> Result<Vec<(String, RGBColor)>> {
    let Some(legend) = figure.legend.as_ref() else {
        return Ok(Vec::new());
    };
    let renderer = figure
        .renderer(&legend.renderer)
        .ok_or_else(|| anyhow!("legend renderer `{}` not found", legend.renderer))?;
    let labels = renderer
        .source
        .text(&legend.label_field)
        .ok_or_else(|| anyhow!("legend label column `{}` not found", legend.label_field))?;

    let colors: Vec<RGBColor> = match &renderer.glyph {
        Glyph::Wedge { fill_color, .. } => renderer
            .source
            .text(fill_color)
            .ok_or_else(|| anyhow!("color column `{fill_color}` not found"))?
            .iter()
            .map(|c| parse_color(c))
            .collect::<Result<_>>()?,
        Glyph::VBar { fill_color, .. }
        | Glyph::Quad { fill_color, .. }
        | Glyph::Circle { fill_color, .. }
        | Glyph::Rect { fill_color, .. } => vec![parse_color(fill_color)?; labels.len()],
        Glyph::Line { line_color, .. } | Glyph::Segment { line_color, .. } => {
            vec![parse_color(line_color)?; labels.len()]
        }
    };
    Ok(labels.iter().cloned().zip(colors).collect())
}

fn draw_pie<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, figure: &Figure) -> Result<()> {
    let body = area
        .titled(&figure.title.text, (FontFamily::SansSerif, title_px(figure)))
        .map_err(|e| anyhow!("{:?}", e))?;
    let (w, h) = body.dim_in_pixel();
    let center = (w as f64 / 2.0, h as f64 / 2.0);
    let r = w.min(h) as f64 * 0.42;

    for renderer in &figure.renderers {
        let Glyph::Wedge {
            start_angle,
            end_angle,
            fill_color,
            line_color,
            ..
        } = &renderer.glyph
        else {
            continue;
        };
        let starts = numbers(&renderer.source, start_angle)?;
        let ends = numbers(&renderer.source, end_angle)?;
        let fills = renderer
            .source
            .text(fill_color)
            .ok_or_else(|| anyhow!("color column `{fill_color}` not found"))?;
        let outline = parse_color(line_color)?;

        for ((a0, a1), fill) in starts.iter().zip(ends).zip(fills) {
            // one vertex per ~2 degrees of arc
            let steps = (((a1 - a0) / (PI / 90.0)).ceil() as usize).max(1);
            let to_px = |a: f64| {
                (
                    (center.0 + r * a.cos()).round() as i32,
                    (center.1 - r * a.sin()).round() as i32,
                )
            };
            let mut outline_pts = vec![(center.0 as i32, center.1 as i32)];
            outline_pts.extend((0..=steps).map(|i| to_px(a0 + (a1 - a0) * i as f64 / steps as f64)));

            body.draw(&Polygon::new(outline_pts.clone(), parse_color(fill)?.filled()))
                .map_err(|e| anyhow!("{:?}", e))?;
            outline_pts.push((center.0 as i32, center.1 as i32));
            body.draw(&PathElement::new(outline_pts, outline.stroke_width(1)))
                .map_err(|e| anyhow!("{:?}", e))?;
        }
    }
    Ok(())
}

/// Resolve every glyph into marks. Categorical x values map to `index + 0.5`.
fn collect_marks(figure: &Figure) -> Result<Vec<Mark>> {
    let factors: Option<&[String]> = match &figure.x_axis.range {
        AxisRange::Factors(f) => Some(f),
        AxisRange::Auto => None,
    };
    let mut marks = Vec::new();

    for renderer in &figure.renderers {
        let src = &renderer.source;
        match &renderer.glyph {
            Glyph::Wedge { .. } => bail!("wedges can only be drawn on a figure without axes"),
            Glyph::VBar {
                x,
                top,
                bottom,
                width,
                fill_color,
            } => {
                let color = parse_color(fill_color)?;
                let tops = numbers(src, top)?;
                let xs: Vec<f64> = match (src.text(x), factors) {
                    (Some(cats), Some(factors)) => cats
                        .iter()
                        .map(|c| {
                            factors
                                .iter()
                                .position(|f| f == c)
                                .map(|i| i as f64 + 0.5)
                                .ok_or_else(|| anyhow!("category `{c}` not on the x range"))
                        })
                        .collect::<Result<_>>()?,
                    (Some(cats), None) => (0..cats.len()).map(|i| i as f64 + 0.5).collect(),
                    (None, _) => numbers(src, x)?.to_vec(),
                };
                for (cx, t) in xs.iter().zip(tops) {
                    marks.push(Mark::Rect {
                        x0: cx - width / 2.0,
                        y0: *bottom,
                        x1: cx + width / 2.0,
                        y1: *t,
                        color,
                        alpha: 1.0,
                    });
                }
            }
            Glyph::Quad {
                left,
                right,
                top,
                bottom,
                fill_color,
                alpha,
            } => {
                let color = parse_color(fill_color)?;
                let (ls, rs, ts) = (numbers(src, left)?, numbers(src, right)?, numbers(src, top)?);
                for ((l, r), t) in ls.iter().zip(rs).zip(ts) {
                    marks.push(Mark::Rect {
                        x0: *l,
                        y0: *bottom,
                        x1: *r,
                        y1: *t,
                        color,
                        alpha: *alpha,
                    });
                }
            }
            Glyph::Circle {
                x,
                y,
                size,
                fill_color,
            } => {
                let color = parse_color(fill_color)?;
                let radius = (size / 2.0).ceil().max(2.0) as i32;
                for (px, py) in numbers(src, x)?.iter().zip(numbers(src, y)?) {
                    marks.push(Mark::Dot {
                        x: *px,
                        y: *py,
                        radius,
                        color,
                    });
                }
            }
            Glyph::Line {
                x,
                y,
                line_color,
                line_width,
                alpha,
            } => {
                let points: Vec<(f64, f64)> = numbers(src, x)?
                    .iter()
                    .copied()
                    .zip(numbers(src, y)?.iter().copied())
                    .collect();
                marks.push(Mark::Path {
                    points,
                    color: parse_color(line_color)?,
                    width: line_width.round().max(1.0) as u32,
                    alpha: *alpha,
                });
            }
            Glyph::Rect {
                x,
                y,
                width,
                height,
                fill_color,
            } => {
                let color = parse_color(fill_color)?;
                let (xs, ys) = (numbers(src, x)?, numbers(src, y)?);
                let (ws, hs) = (numbers(src, width)?, numbers(src, height)?);
                for (((cx, cy), w), h) in xs.iter().zip(ys).zip(ws).zip(hs) {
                    marks.push(Mark::Rect {
                        x0: cx - w / 2.0,
                        y0: cy - h / 2.0,
                        x1: cx + w / 2.0,
                        y1: cy + h / 2.0,
                        color,
                        alpha: 1.0,
                    });
                }
            }
            Glyph::Segment {
                x0,
                y0,
                x1,
                y1,
                line_width,
                line_color,
            } => {
                let color = parse_color(line_color)?;
                let width = line_width.round().max(1.0) as u32;
                let (ax, ay) = (numbers(src, x0)?, numbers(src, y0)?);
                let (bx, by) = (numbers(src, x1)?, numbers(src, y1)?);
                for i in 0..ax.len().min(ay.len()).min(bx.len()).min(by.len()) {
                    marks.push(Mark::Path {
                        points: vec![(ax[i], ay[i]), (bx[i], by[i])],
                        color,
                        width,
                        alpha: 1.0,
                    });
                }
            }
        }
    }
    Ok(marks)
}

fn draw_cartesian<DB>(area: &DrawingArea<DB, Shift>, figure: &Figure, locale: &Locale) -> Result<()>
where
    DB: DrawingBackend,
{
    let mut marks = collect_marks(figure)?;
    let log_y = figure.y_axis.scale == AxisScale::Log;
    if log_y {
        let floor = marks
            .iter()
            .flat_map(Mark::points)
            .map(|(_, y)| y)
            .filter(|y| *y > 0.0)
            .fold(f64::INFINITY, f64::min);
        let floor = if floor.is_finite() { floor } else { 1e-3 };
        if marks.iter().flat_map(Mark::points).any(|(_, y)| y <= 0.0) {
            warn!(
                "`{}`: non-positive values clamped to {floor} on the log axis",
                figure.title.text
            );
        }
        for m in marks.iter_mut() {
            m.map_y(|y| y.max(floor).log10());
        }
    }

    let all: Vec<(f64, f64)> = marks.iter().flat_map(Mark::points).collect();
    let extent = |pick: fn(&(f64, f64)) -> f64| {
        all.iter().map(pick).fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        })
    };
    let (x_lo, x_hi) = match &figure.x_axis.range {
        AxisRange::Factors(f) => (0.0, f.len().max(1) as f64),
        AxisRange::Auto if all.is_empty() => (0.0, 1.0),
        AxisRange::Auto => {
            let (lo, hi) = extent(|p| p.0);
            padded(lo, hi, 0.05)
        }
    };
    let (y_lo, y_hi) = if all.is_empty() {
        (0.0, 1.0)
    } else {
        let (lo, hi) = extent(|p| p.1);
        padded(lo, hi, 0.05)
    };

    let x_labels_visible = figure.x_axis.major_labels_visible();
    let y_labels_visible = figure.y_axis.major_labels_visible();
    let fixed_x_ticks: Option<Vec<(f64, String)>> =
        match (&figure.x_axis.range, &figure.x_axis.ticker) {
            (AxisRange::Factors(f), _) => Some(
                f.iter()
                    .enumerate()
                    .map(|(i, s)| (i as f64 + 0.5, s.clone()))
                    .collect(),
            ),
            (AxisRange::Auto, Ticker::Fixed(ticks)) => Some(
                ticks
                    .iter()
                    .map(|&t| {
                        let label = figure
                            .x_axis
                            .tick_label(t)
                            .map(str::to_string)
                            .unwrap_or_else(|| format_tick(t, locale));
                        (t, label)
                    })
                    .collect(),
            ),
            (AxisRange::Auto, Ticker::Auto) => None,
        };

    let tick_font_px = font_px(figure.x_axis.major_label_text_font_size.as_deref(), 10) + 2;
    let rotated = figure.x_axis.major_label_orientation.abs() > 1e-6;
    let longest_x_label = fixed_x_ticks
        .as_ref()
        .map(|t| {
            t.iter()
                .map(|(_, s)| estimate_text_width_px(s, tick_font_px))
                .max()
                .unwrap_or(0)
        })
        .unwrap_or(48);
    let mut bottom_px = match (x_labels_visible, rotated) {
        (false, _) => 16,
        (true, false) => tick_font_px + 16,
        (true, true) => (longest_x_label + 16).clamp(32, 160),
    };
    if figure.x_axis.label.is_some() {
        bottom_px += 24;
    }
    let mut left_px = if y_labels_visible {
        compute_left_label_area_px(y_lo, y_hi, 10, 12, locale)
    } else {
        16
    };
    if figure.y_axis.label.is_some() {
        left_px += 24;
    }

    let mut chart = ChartBuilder::on(area)
        .margin(16)
        .caption(&figure.title.text, (FontFamily::SansSerif, title_px(figure)))
        .set_label_area_size(LabelAreaPosition::Left, left_px)
        .set_label_area_size(LabelAreaPosition::Bottom, bottom_px)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)
        .map_err(|e| anyhow!("{:?}", e))?;

    let x_label_fmt = |v: &f64| format_tick(*v, locale);
    let y_label_fmt = |v: &f64| {
        if log_y {
            format_tick(10f64.powf(*v), locale)
        } else {
            format_tick(*v, locale)
        }
    };
    {
        let mut mesh = chart.configure_mesh();
        mesh.x_labels(if fixed_x_ticks.is_some() || !x_labels_visible {
            0
        } else {
            10
        })
        .y_labels(if y_labels_visible { 10 } else { 0 })
        .x_label_formatter(&x_label_fmt)
        .y_label_formatter(&y_label_fmt)
        .label_style((FontFamily::SansSerif, 12))
        .axis_desc_style((FontFamily::SansSerif, 14));
        if !figure.x_axis.grid_visible {
            mesh.disable_x_mesh();
        }
        if !figure.y_axis.grid_visible {
            mesh.disable_y_mesh();
        }
        if let Some(label) = &figure.x_axis.label {
            mesh.x_desc(label.as_str());
        }
        if let Some(label) = &figure.y_axis.label {
            mesh.y_desc(label.as_str());
        }
        mesh.draw().map_err(|e| anyhow!("{:?}", e))?;
    }

    for mark in &marks {
        match mark {
            Mark::Rect {
                x0,
                y0,
                x1,
                y1,
                color,
                alpha,
            } => {
                chart
                    .draw_series(std::iter::once(Rectangle::new(
                        [(*x0, *y0), (*x1, *y1)],
                        color.mix(*alpha).filled(),
                    )))
                    .map_err(|e| anyhow!("{:?}", e))?;
            }
            Mark::Dot {
                x,
                y,
                radius,
                color,
            } => {
                chart
                    .draw_series(std::iter::once(Circle::new(
                        (*x, *y),
                        *radius,
                        color.filled(),
                    )))
                    .map_err(|e| anyhow!("{:?}", e))?;
            }
            Mark::Path {
                points,
                color,
                width,
                alpha,
            } => {
                chart
                    .draw_series(std::iter::once(PathElement::new(
                        points.clone(),
                        color.mix(*alpha).stroke_width(*width),
                    )))
                    .map_err(|e| anyhow!("{:?}", e))?;
            }
        }
    }

    if let Some(ticks) = fixed_x_ticks {
        let tick_color = figure
            .x_axis
            .major_tick_line_color
            .as_deref()
            .map(parse_color)
            .transpose()?;
        let base = area.get_base_pixel();
        let label_style = if rotated {
            TextStyle::from((FontFamily::SansSerif, tick_font_px))
                .transform(FontTransform::Rotate90)
                .pos(Pos::new(HPos::Left, VPos::Center))
        } else {
            TextStyle::from((FontFamily::SansSerif, tick_font_px))
                .pos(Pos::new(HPos::Center, VPos::Top))
        };
        for (pos, label) in ticks {
            if pos < x_lo || pos > x_hi {
                continue;
            }
            let (bx, by) = chart.backend_coord(&(pos, y_lo));
            let (px, py) = (bx - base.0, by - base.1);
            if let Some(color) = tick_color {
                area.draw(&PathElement::new(
                    vec![(px, py), (px, py + 5)],
                    color.stroke_width(1),
                ))
                .map_err(|e| anyhow!("{:?}", e))?;
            }
            if x_labels_visible {
                area.draw(&Text::new(label, (px, py + 8), label_style.clone()))
                    .map_err(|e| anyhow!("{:?}", e))?;
            }
        }
    }
    Ok(())
}
