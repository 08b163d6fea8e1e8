use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use univiz_rs::viz;
use univiz_rs::{AxisScale, BoxSummary, CategoryCounts, Figure, Histogram, QuantilePairs, UniViz};

fn sample_figures() -> Vec<(&'static str, Figure)> {
    let viz = UniViz::new();
    let counts: CategoryCounts = [("alpha", 12), ("beta", 7), ("gamma", 3), ("delta", 1)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), Some(v)))
        .collect();
    let hist = Histogram::new(vec![3, 8, 5, 1], vec![0.0, 1.0, 2.0, 3.0, 4.0]).unwrap();
    let q = QuantilePairs::new(vec![-1.2, -0.4, 0.4, 1.2], vec![-2.0, -0.3, 0.6, 2.4]).unwrap();
    let raw = [1.0, 1.5, 2.0, 2.2, 2.9, 3.1, 3.3, 4.0, f64::NAN, 5.5];
    let mut boxes = IndexMap::new();
    boxes.insert(
        "north".to_string(),
        BoxSummary {
            lw: 1.0,
            tf: 2.0,
            fy: 3.0,
            sf: 4.0,
            uw: 6.0,
            outliers: vec![9.0],
        },
    );
    boxes.insert(
        "south".to_string(),
        BoxSummary {
            lw: 0.5,
            tf: 1.0,
            fy: 1.2,
            sf: 2.0,
            uw: 2.5,
            outliers: vec![],
        },
    );

    vec![
        ("pie", viz.pie_viz(&counts, "greek", 3, false).unwrap()),
        ("bar", viz.bar_viz(&counts, 2, "greek", 3, false).unwrap()),
        (
            "hist",
            viz.hist_viz(&hist, 1, 18, true, "value", AxisScale::Linear)
                .unwrap(),
        ),
        (
            "hist_log",
            viz.hist_viz(&hist, 0, 17, false, "value", AxisScale::Log)
                .unwrap(),
        ),
        ("qq", viz.qqnorm_viz(&q, "value").unwrap()),
        ("kde", viz.hist_kde_viz(&raw, 0.5, "value").unwrap()),
        (
            "box",
            viz.box_viz(&boxes, "region", Some("income"), 0.7).unwrap(),
        ),
    ]
}

fn assert_non_empty(path: &Path) {
    let meta = fs::metadata(path).expect("file created");
    assert!(meta.len() > 0, "{} has content", path.display());
}

#[test]
fn every_chart_saves_as_svg_and_png() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    for (name, fig) in sample_figures() {
        let svg = dir.path().join(format!("{name}.svg"));
        viz::save_figure(&fig, &svg, 640, 480).unwrap();
        assert_non_empty(&svg);

        let png = dir.path().join(format!("{name}.png"));
        viz::save_figure(&fig, &png, 640, 480).unwrap();
        assert_non_empty(&png);
    }
}

#[test]
fn in_memory_svg_contains_title() {
    for (_, fig) in sample_figures() {
        let doc = viz::render_svg(&fig, 600, 400).unwrap();
        assert!(doc.contains("<svg"));
        assert!(doc.contains(&fig.title.text), "title `{}` missing", fig.title.text);
    }
}

#[test]
fn german_locale_renders() {
    let dir = tempfile::tempdir().unwrap();
    let (_, fig) = sample_figures().remove(2);
    let path = dir.path().join("hist_de.svg");
    viz::save_figure_locale(&fig, &path, 800, 480, "de").unwrap();
    assert_non_empty(&path);
}

#[test]
fn json_round_trip_renders_the_same_figure() {
    let (_, fig) = sample_figures().remove(6);
    let back = Figure::from_json(&fig.to_json().unwrap()).unwrap();
    assert_eq!(back, fig);
    assert!(viz::render_svg(&back, 300, 500).is_ok());
}

#[test]
fn zero_size_is_error() {
    let (_, fig) = sample_figures().remove(0);
    assert!(viz::render_svg(&fig, 0, 400).is_err());
}
