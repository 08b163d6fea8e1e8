use approx::assert_relative_eq;
use univiz_rs::figure::{Glyph, HoverMode, Ticker};
use univiz_rs::{AxisScale, Histogram, UniViz, VizError};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn bin_percentages_use_original_row_count() {
    init();
    let viz = UniViz::new();
    let hist = Histogram::new(vec![2, 3], vec![0.0, 1.0, 2.0]).unwrap();
    let fig = viz
        .hist_viz(&hist, 0, 5, true, "x", AxisScale::Linear)
        .unwrap();

    let src = &fig.renderer("hist").unwrap().source;
    assert_eq!(src.numbers("left").unwrap(), [0.0, 1.0]);
    assert_eq!(src.numbers("right").unwrap(), [1.0, 2.0]);
    assert_eq!(src.numbers("freq").unwrap(), [2.0, 3.0]);
    let percen = src.numbers("percen").unwrap();
    assert_relative_eq!(percen[0], 40.0);
    assert_relative_eq!(percen[1], 60.0);
    assert_eq!(fig.title.text, "x");
}

#[test]
fn empty_bin_has_zero_percent() {
    let viz = UniViz::new();
    let hist = Histogram::new(vec![4, 0, 2], vec![0.0, 1.0, 2.0, 3.0]).unwrap();
    let fig = viz
        .hist_viz(&hist, 2, 8, true, "x", AxisScale::Linear)
        .unwrap();
    let percen = fig.renderer("hist").unwrap().source.numbers("percen").unwrap();
    assert_eq!(percen[1], 0.0);
    assert_relative_eq!(percen[0], 50.0);
    assert_eq!(fig.title.text, "x (25.0% missing values)");
}

#[test]
fn ticks_sit_on_bin_edges() {
    let viz = UniViz::new();
    let edges = vec![0.0, 2.5, 5.0, 7.5];
    let hist = Histogram::new(vec![1, 2, 1], edges.clone()).unwrap();
    let fig = viz
        .hist_viz(&hist, 0, 4, true, "x", AxisScale::Log)
        .unwrap();
    assert_eq!(fig.x_axis.ticker, Ticker::Fixed(edges));
    assert_eq!(fig.y_axis.scale, AxisScale::Log);
    assert_relative_eq!(fig.x_axis.orientation_degrees(), 60.0, epsilon = 1e-9);
    assert_eq!(fig.y_axis.label.as_deref(), Some("Frequency"));
    assert_eq!(fig.hover_tools[0].mode, HoverMode::VLine);
    assert!(matches!(
        fig.renderer("hist").unwrap().glyph,
        Glyph::Quad { bottom, alpha, .. } if bottom == 0.01 && alpha == 0.5
    ));
}

#[test]
fn hidden_y_labels_strip_decorations() {
    let viz = UniViz::new();
    let hist = Histogram::new(vec![1, 1], vec![0.0, 1.0, 2.0]).unwrap();

    let shown = viz
        .hist_viz(&hist, 0, 2, true, "x", AxisScale::Linear)
        .unwrap();
    assert!(shown.y_axis.major_labels_visible());
    assert!(shown.x_axis.minor_tick_line_color.is_some());

    let hidden = viz
        .hist_viz(&hist, 0, 2, false, "x", AxisScale::Linear)
        .unwrap();
    assert!(!hidden.y_axis.major_labels_visible());
    assert_eq!(hidden.y_axis.major_tick_line_color, None);
    assert_eq!(hidden.y_axis.minor_tick_line_color, None);
    assert_eq!(hidden.x_axis.minor_tick_line_color, None);
    // x major ticks stay
    assert_eq!(hidden.x_axis.major_tick_line_color.as_deref(), Some("black"));
}

#[test]
fn tooltip_formats_bin_range() {
    let viz = UniViz::new();
    let hist = Histogram::new(vec![2, 3], vec![0.0, 1.5, 3.0]).unwrap();
    let fig = viz
        .hist_viz(&hist, 0, 6, true, "x", AxisScale::Linear)
        .unwrap();
    let tip = fig.hover_tools[0].resolve(&fig.renderer("hist").unwrap().source, 1);
    assert_eq!(tip[0].1, "[1.5, 3]");
    assert_eq!(tip[1].1, "3");
    assert_eq!(tip[2].1, "50.00%");
}

#[test]
fn invalid_bins_are_rejected() {
    let viz = UniViz::new();
    let unsorted = Histogram {
        counts: vec![1, 1],
        edges: vec![0.0, 2.0, 1.0],
    };
    assert!(matches!(
        viz.hist_viz(&unsorted, 0, 2, true, "x", AxisScale::Linear),
        Err(VizError::NonMonotonicEdges { .. })
    ));

    let empty = Histogram {
        counts: vec![],
        edges: vec![0.0],
    };
    assert!(matches!(
        viz.hist_viz(&empty, 0, 2, true, "x", AxisScale::Linear),
        Err(VizError::EmptyInput(_))
    ));

    let ok = Histogram::new(vec![1], vec![0.0, 1.0]).unwrap();
    assert!(matches!(
        viz.hist_viz(&ok, 0, 0, true, "x", AxisScale::Linear),
        Err(VizError::ZeroDenominator(_))
    ));
}

#[test]
fn yscale_parses_from_text() {
    let scale: AxisScale = "log".parse().unwrap();
    assert_eq!(scale, AxisScale::Log);
    assert!(matches!(
        "cubic".parse::<AxisScale>(),
        Err(VizError::ParameterOutOfRange { name: "yscale", .. })
    ));
}
