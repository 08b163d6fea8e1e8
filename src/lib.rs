//! univiz_rs
//!
//! Exploratory-data-analysis charts for a single column, built from summaries
//! computed elsewhere (category counts, histogram bins, quantiles, box
//! statistics).
//!
//! ### Features
//! - Pie, bar, histogram, QQ-norm, histogram + KDE overlay and box plot
//! - Charts are plain, serializable [`Figure`] values with tooltips, axes and legend
//! - Optional static export of any figure to SVG/PNG
//!
//! ### Example
//! ```no_run
//! use univiz_rs::{CategoryCounts, UniViz};
//!
//! let viz = UniViz::new();
//! let mut counts = CategoryCounts::new();
//! counts.insert("a".into(), Some(10));
//! counts.insert("b".into(), Some(5));
//! counts.insert("c".into(), Some(1));
//!
//! let fig = viz.bar_viz(&counts, 0, "letters", 2, false)?;
//! univiz_rs::viz::save_figure(&fig, "letters.svg", 600, 400)?;
//! println!("{}", fig.to_json()?);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod figure;
pub mod models;
pub mod palette;
pub mod stats;
pub mod univiz;
pub mod viz;

pub use config::VizConfig;
pub use error::{VizError, VizResult};
pub use figure::{AxisScale, Figure};
pub use models::{BoxSummary, CategoryCounts, Histogram, QuantilePairs};
pub use stats::Bandwidth;
pub use univiz::{ChartKind, DEFAULT_BOX_WIDTH, UniViz};
