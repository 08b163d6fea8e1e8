use std::sync::Arc;
use std::thread;

use univiz_rs::{CategoryCounts, ChartKind, Histogram, QuantilePairs, UniViz, VizConfig};

fn counts() -> CategoryCounts {
    [("a", Some(3)), ("b", Some(1))]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

#[test]
fn flags_start_unset() {
    let viz = UniViz::new();
    for kind in ChartKind::ALL {
        assert!(!viz.flags().is_rendered(kind), "{kind:?} set before rendering");
    }
}

#[test]
fn success_sets_only_its_own_flag() {
    let viz = UniViz::new();
    viz.bar_viz(&counts(), 0, "x", 5, false).unwrap();
    assert!(viz.flags().is_rendered(ChartKind::Bar));
    assert!(!viz.flags().is_rendered(ChartKind::Pie));

    viz.pie_viz(&counts(), "x", 5, false).unwrap();
    assert!(viz.flags().is_rendered(ChartKind::Pie));
}

#[test]
fn failure_leaves_flag_unset() {
    let viz = UniViz::new();
    let bad = Histogram {
        counts: vec![1],
        edges: vec![0.0],
    };
    assert!(viz
        .hist_viz(&bad, 0, 1, true, "x", Default::default())
        .is_err());
    assert!(!viz.flags().is_rendered(ChartKind::Histogram));

    assert!(QuantilePairs::new(vec![1.0], vec![]).is_err());
    assert!(viz.hist_kde_viz(&[], 0.5, "x").is_err());
    assert!(!viz.flags().is_rendered(ChartKind::Kde));
}

#[test]
fn flags_stay_set_after_a_later_failure() {
    let viz = UniViz::new();
    viz.bar_viz(&counts(), 0, "x", 5, false).unwrap();
    assert!(viz.bar_viz(&CategoryCounts::new(), 0, "x", 5, false).is_err());
    assert!(viz.flags().is_rendered(ChartKind::Bar));
}

#[test]
fn renderer_is_shared_across_threads() {
    let viz = Arc::new(UniViz::with_config(VizConfig::default()).unwrap());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let viz = Arc::clone(&viz);
            thread::spawn(move || {
                let q = QuantilePairs::new(vec![0.0, 1.0], vec![0.0, i as f64 + 1.0]).unwrap();
                viz.qqnorm_viz(&q, "x").map(|_| ())
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap().unwrap();
    }
    assert!(viz.flags().is_rendered(ChartKind::QqNorm));
}
