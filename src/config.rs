//! Tunable constants for the chart renderer.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{VizError, VizResult};

/// Renderer configuration.
///
/// Every field has a default, so a partial JSON document only overrides the
/// keys it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    /// Bar chart x-axis caption when categories are cut off; two `{}` slots
    /// receive the displayed and the total category count.
    pub cat_caption: String,
    /// Category labels longer than this are truncated.
    pub max_xlab_len: usize,
    /// A pie legend is only attached up to this many slices.
    pub max_num_legend: usize,
    /// Number of points where the KDE curve is evaluated.
    pub num_x_vals: usize,
    /// Requesting more bars than this hides the x tick labels.
    pub max_bar_labels: usize,
    /// Bins of the density histogram under the KDE curve.
    pub kde_bins: usize,
    pub title_font_size: String,
    pub legend_font_size: String,
    pub pie_radius: f64,
    pub box_plot_width: u32,
    pub box_plot_height: u32,
    pub plot_width: u32,
    pub plot_height: u32,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            cat_caption: "Top {} of {} categories".to_string(),
            max_xlab_len: 15,
            max_num_legend: 7,
            num_x_vals: 50,
            max_bar_labels: 30,
            kde_bins: 10,
            title_font_size: "10pt".to_string(),
            legend_font_size: "8pt".to_string(),
            pie_radius: 0.62,
            box_plot_width: 300,
            box_plot_height: 500,
            plot_width: 600,
            plot_height: 600,
        }
    }
}

impl VizConfig {
    /// Parse a (possibly partial) JSON config and validate it.
    pub fn from_json_str(s: &str) -> VizResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> VizResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> VizResult<()> {
        let counts = [
            ("max_xlab_len", self.max_xlab_len),
            ("num_x_vals", self.num_x_vals),
            ("kde_bins", self.kde_bins),
        ];
        for (name, v) in counts {
            if v == 0 {
                return Err(VizError::out_of_range(name, "must be at least 1"));
            }
        }
        if self.num_x_vals < 2 {
            return Err(VizError::out_of_range(
                "num_x_vals",
                "needs at least 2 points to span [min, max]",
            ));
        }
        if !(self.pie_radius.is_finite() && self.pie_radius > 0.0) {
            return Err(VizError::out_of_range(
                "pie_radius",
                format!("{} is not a positive radius", self.pie_radius),
            ));
        }
        let sizes = [
            ("box_plot_width", self.box_plot_width),
            ("box_plot_height", self.box_plot_height),
            ("plot_width", self.plot_width),
            ("plot_height", self.plot_height),
        ];
        for (name, v) in sizes {
            if v == 0 {
                return Err(VizError::out_of_range(name, "must be positive"));
            }
        }
        if self.cat_caption.matches("{}").count() != 2 {
            return Err(VizError::out_of_range(
                "cat_caption",
                "needs exactly two `{}` placeholders",
            ));
        }
        Ok(())
    }

    /// Fill the category caption: `"Top 2 of 3 categories"`.
    pub fn category_caption(&self, shown: usize, total: usize) -> String {
        self.cat_caption
            .replacen("{}", &shown.to_string(), 1)
            .replacen("{}", &total.to_string(), 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = VizConfig::from_json_str(r#"{ "max_num_legend": 5 }"#).unwrap();
        assert_eq!(cfg.max_num_legend, 5);
        assert_eq!(cfg.max_xlab_len, 15);
        assert_eq!(cfg.num_x_vals, 50);
    }

    #[test]
    fn zero_kde_bins_rejected() {
        let err = VizConfig::from_json_str(r#"{ "kde_bins": 0 }"#).unwrap_err();
        assert!(matches!(
            err,
            VizError::ParameterOutOfRange { name: "kde_bins", .. }
        ));
    }

    #[test]
    fn caption_fills_both_slots() {
        let cfg = VizConfig::default();
        assert_eq!(cfg.category_caption(2, 3), "Top 2 of 3 categories");
    }
}
