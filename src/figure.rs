//! The chart object returned by every rendering operation.
//!
//! A [`Figure`] is declarative: glyphs bind their geometry to named columns
//! of a [`ColumnDataSource`], hover tools describe their tooltips as
//! `@field` / `@field{0.2f}` templates, and axes carry the cosmetic settings.
//! It serializes to JSON for embedding in a dashboard, and
//! [`crate::viz::save_figure`] draws it to SVG or PNG.

use std::f64::consts::PI;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{VizError, VizResult};

/// Font size that hides a text element.
pub const HIDDEN_FONT: &str = "0pt";

/// One named column of a data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnData {
    Number(Vec<f64>),
    Text(Vec<String>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Number(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cell(&self, row: usize, spec: Option<&str>) -> Option<String> {
        match self {
            ColumnData::Number(v) => v.get(row).map(|x| format_number(*x, spec)),
            ColumnData::Text(v) => v.get(row).cloned(),
        }
    }
}

/// Row-oriented table a glyph reads from, stored column-wise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnDataSource {
    pub columns: IndexMap<String, ColumnData>,
}

impl ColumnDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_numbers(mut self, name: &str, values: Vec<f64>) -> Self {
        self.columns
            .insert(name.to_string(), ColumnData::Number(values));
        self
    }

    pub fn with_text(mut self, name: &str, values: Vec<String>) -> Self {
        self.columns.insert(name.to_string(), ColumnData::Text(values));
        self
    }

    /// Number of rows (taken from the first column).
    pub fn len(&self) -> usize {
        self.columns.values().next().map_or(0, ColumnData::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, name: &str) -> Option<&ColumnData> {
        self.columns.get(name)
    }

    pub fn numbers(&self, name: &str) -> Option<&[f64]> {
        match self.columns.get(name)? {
            ColumnData::Number(v) => Some(v),
            ColumnData::Text(_) => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&[String]> {
        match self.columns.get(name)? {
            ColumnData::Text(v) => Some(v),
            ColumnData::Number(_) => None,
        }
    }
}

/// Visual mark, with properties bound to source columns by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Glyph {
    /// Pie slice between two cumulative angles (radians, counter-clockwise from +x).
    Wedge {
        x: f64,
        y: f64,
        radius: f64,
        start_angle: String,
        end_angle: String,
        fill_color: String,
        line_color: String,
    },
    /// Vertical bar on a categorical axis.
    VBar {
        x: String,
        top: String,
        bottom: f64,
        width: f64,
        fill_color: String,
    },
    /// Axis-aligned rectangle given by its edges.
    Quad {
        left: String,
        right: String,
        top: String,
        bottom: f64,
        fill_color: String,
        alpha: f64,
    },
    Circle {
        x: String,
        y: String,
        size: f64,
        fill_color: String,
    },
    Line {
        x: String,
        y: String,
        line_color: String,
        line_width: f64,
        alpha: f64,
    },
    /// Rectangle given by its center and size.
    Rect {
        x: String,
        y: String,
        width: String,
        height: String,
        fill_color: String,
    },
    Segment {
        x0: String,
        y0: String,
        x1: String,
        y1: String,
        line_width: f64,
        line_color: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphRenderer {
    pub name: Option<String>,
    pub source: ColumnDataSource,
    pub glyph: Glyph,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoverMode {
    Mouse,
    VLine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tooltip {
    pub label: String,
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoverTool {
    pub tooltips: Vec<Tooltip>,
    pub mode: HoverMode,
    /// Names of the renderers this tool inspects; empty means all.
    pub renderers: Vec<String>,
}

impl HoverTool {
    pub fn new(tooltips: &[(&str, &str)], mode: HoverMode) -> Self {
        Self {
            tooltips: tooltips
                .iter()
                .map(|(label, template)| Tooltip {
                    label: label.to_string(),
                    template: template.to_string(),
                })
                .collect(),
            mode,
            renderers: Vec::new(),
        }
    }

    pub fn for_renderers(mut self, names: &[&str]) -> Self {
        self.renderers = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn applies_to(&self, renderer: &GlyphRenderer) -> bool {
        self.renderers.is_empty()
            || renderer
                .name
                .as_deref()
                .is_some_and(|n| self.renderers.iter().any(|r| r == n))
    }

    /// Fill every tooltip template with the values of one row.
    pub fn resolve(&self, source: &ColumnDataSource, row: usize) -> Vec<(String, String)> {
        self.tooltips
            .iter()
            .map(|t| (t.label.clone(), fill_template(&t.template, source, row)))
            .collect()
    }
}

/// Expand `@field` and `@field{0.2f}` placeholders. Unknown fields become `???`.
pub fn fill_template(template: &str, source: &ColumnDataSource, row: usize) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '@' {
            out.push(c);
            continue;
        }
        let mut field = String::new();
        while let Some(&n) = chars.peek() {
            if n.is_alphanumeric() || n == '_' {
                field.push(n);
                chars.next();
            } else {
                break;
            }
        }
        if field.is_empty() {
            out.push('@');
            continue;
        }
        let mut spec = None;
        if chars.peek() == Some(&'{') {
            chars.next();
            let s: String = chars.by_ref().take_while(|&n| n != '}').collect();
            spec = Some(s);
        }
        let value = source
            .get(&field)
            .and_then(|col| col.cell(row, spec.as_deref()))
            .unwrap_or_else(|| "???".to_string());
        out.push_str(&value);
    }
    out
}

/// Format a number with an optional printf-like spec; only `0.Nf` is
/// understood, anything else prints the literal value.
fn format_number(v: f64, spec: Option<&str>) -> String {
    let precision = spec
        .and_then(|s| s.strip_suffix('f'))
        .and_then(|s| s.split('.').nth(1))
        .and_then(|p| p.parse::<usize>().ok());
    match precision {
        Some(p) => format!("{v:.p$}"),
        None => format!("{v}"),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisScale {
    #[default]
    Linear,
    Log,
}

impl FromStr for AxisScale {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(AxisScale::Linear),
            "log" => Ok(AxisScale::Log),
            other => Err(VizError::out_of_range(
                "yscale",
                format!("`{other}` is neither `linear` nor `log`"),
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisRange {
    #[default]
    Auto,
    /// Categorical axis; factor `i` sits at `i + 0.5`.
    Factors(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ticker {
    #[default]
    Auto,
    Fixed(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
    pub visible: bool,
    pub scale: AxisScale,
    pub range: AxisRange,
    pub ticker: Ticker,
    /// Tick position -> displayed label, for numeric axes that show names.
    pub tick_labels: Vec<(f64, String)>,
    /// Rotation of the tick labels in radians.
    pub major_label_orientation: f64,
    pub major_label_text_font_size: Option<String>,
    /// `None` hides the ticks.
    pub major_tick_line_color: Option<String>,
    pub minor_tick_line_color: Option<String>,
    pub grid_visible: bool,
}

impl Default for Axis {
    fn default() -> Self {
        Self {
            label: None,
            visible: true,
            scale: AxisScale::Linear,
            range: AxisRange::Auto,
            ticker: Ticker::Auto,
            tick_labels: Vec::new(),
            major_label_orientation: 0.0,
            major_label_text_font_size: None,
            major_tick_line_color: Some("black".to_string()),
            minor_tick_line_color: Some("black".to_string()),
            grid_visible: true,
        }
    }
}

impl Axis {
    pub fn major_labels_visible(&self) -> bool {
        self.visible && self.major_label_text_font_size.as_deref() != Some(HIDDEN_FONT)
    }

    pub fn hide_major_labels(&mut self) {
        self.major_label_text_font_size = Some(HIDDEN_FONT.to_string());
    }

    /// Label shown at `tick`, when a tick-label mapping is attached.
    pub fn tick_label(&self, tick: f64) -> Option<&str> {
        self.tick_labels
            .iter()
            .find(|(pos, _)| (pos - tick).abs() < 1e-9)
            .map(|(_, label)| label.as_str())
    }

    /// Tick orientation in degrees, for display and tests.
    pub fn orientation_degrees(&self) -> f64 {
        self.major_label_orientation * 180.0 / PI
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    pub text: String,
    pub font_size: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendLocation {
    Right,
}

/// One legend entry per row of `renderer`'s source, labelled from `label_field`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub renderer: String,
    pub label_field: String,
    pub label_text_font_size: String,
    pub location: LegendLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub title: Title,
    pub width: u32,
    pub height: u32,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub renderers: Vec<GlyphRenderer>,
    pub hover_tools: Vec<HoverTool>,
    pub legend: Option<Legend>,
}

impl Figure {
    pub fn new(title: impl Into<String>, font_size: &str, width: u32, height: u32) -> Self {
        Self {
            title: Title {
                text: title.into(),
                font_size: font_size.to_string(),
            },
            width,
            height,
            x_axis: Axis::default(),
            y_axis: Axis::default(),
            renderers: Vec::new(),
            hover_tools: Vec::new(),
            legend: None,
        }
    }

    pub fn add_glyph(&mut self, name: Option<&str>, source: ColumnDataSource, glyph: Glyph) {
        self.renderers.push(GlyphRenderer {
            name: name.map(str::to_string),
            source,
            glyph,
        });
    }

    pub fn add_tool(&mut self, tool: HoverTool) {
        self.hover_tools.push(tool);
    }

    /// First renderer with the given name.
    pub fn renderer(&self, name: &str) -> Option<&GlyphRenderer> {
        self.renderers
            .iter()
            .find(|r| r.name.as_deref() == Some(name))
    }

    pub fn renderers_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a GlyphRenderer> + 'a {
        self.renderers
            .iter()
            .filter(move |r| r.name.as_deref() == Some(name))
    }

    /// Hover tools inspecting `renderer`.
    pub fn tools_for<'a>(
        &'a self,
        renderer: &'a GlyphRenderer,
    ) -> impl Iterator<Item = &'a HoverTool> + 'a {
        self.hover_tools
            .iter()
            .filter(move |t| t.applies_to(renderer))
    }

    pub fn axes_visible(&self) -> bool {
        self.x_axis.visible || self.y_axis.visible
    }

    pub fn to_json(&self) -> VizResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(s: &str) -> VizResult<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> ColumnDataSource {
        ColumnDataSource::new()
            .with_text("cat", vec!["a".into(), "b".into()])
            .with_numbers("count", vec![10.0, 5.0])
            .with_numbers("percen", vec![62.5, 31.25])
    }

    #[test]
    fn template_formats_two_decimals() {
        let s = source();
        assert_eq!(fill_template("@percen{0.2f}%", &s, 1), "31.25%");
        assert_eq!(fill_template("@count", &s, 0), "10");
        assert_eq!(fill_template("[@cat, @count]", &s, 1), "[b, 5]");
    }

    #[test]
    fn unknown_field_is_marked() {
        assert_eq!(fill_template("@nope", &source(), 0), "???");
        assert_eq!(fill_template("a @ b", &source(), 0), "a @ b");
    }

    #[test]
    fn tool_filters_by_renderer_name() {
        let tool = HoverTool::new(&[("x", "@x")], HoverMode::Mouse).for_renderers(&["kde"]);
        let named = GlyphRenderer {
            name: Some("kde".into()),
            source: ColumnDataSource::new(),
            glyph: Glyph::Line {
                x: "x".into(),
                y: "y".into(),
                line_color: "red".into(),
                line_width: 1.0,
                alpha: 1.0,
            },
        };
        let other = GlyphRenderer {
            name: Some("hist".into()),
            ..named.clone()
        };
        assert!(tool.applies_to(&named));
        assert!(!tool.applies_to(&other));
    }

    #[test]
    fn figure_survives_json() {
        let mut fig = Figure::new("t", "10pt", 300, 200);
        fig.add_glyph(
            Some("bars"),
            source(),
            Glyph::VBar {
                x: "cat".into(),
                top: "count".into(),
                bottom: 0.0,
                width: 0.9,
                fill_color: "#3182bd".into(),
            },
        );
        fig.x_axis.range = AxisRange::Factors(vec!["a".into(), "b".into()]);
        let back = Figure::from_json(&fig.to_json().unwrap()).unwrap();
        assert_eq!(back, fig);
    }

    #[test]
    fn yscale_parses_case_insensitive() {
        assert_eq!("LOG".parse::<AxisScale>().unwrap(), AxisScale::Log);
        assert!("sqrt".parse::<AxisScale>().is_err());
    }
}
