use chart_annotations::core::{HeadlessSurface, SeriesSample, Viewport, VisibleRange};
use chart_annotations::overlay::OverlayReconciler;
use chart_annotations::script::LineElement;

fn surface() -> HeadlessSurface {
    HeadlessSurface::with_ranges(
        Viewport::new(800, 400),
        VisibleRange::new(0.0, 100.0),
        0.0,
        10.0,
    )
    .expect("surface")
}

fn line(id: &str, values: &[f64]) -> LineElement {
    LineElement {
        id: id.to_owned(),
        samples: values
            .iter()
            .enumerate()
            .map(|(index, value)| SeriesSample::new(index as i64, *value))
            .collect(),
        color: None,
        line_width: None,
        line_style: Default::default(),
    }
}

#[test]
fn creates_pushes_and_removes_by_id() {
    let mut host = surface();
    let mut reconciler = OverlayReconciler::new();

    let report = reconciler.reconcile(&mut host, &[line("a", &[1.0, 2.0]), line("b", &[3.0])]);
    assert_eq!(report.created, vec!["a", "b"]);
    assert_eq!(report.pushed, vec!["a", "b"]);
    assert!(report.is_clean());
    assert_eq!(host.series_count(), 2);
    assert_eq!(
        host.series_by_id("a").map(|series| series.samples.len()),
        Some(2)
    );

    let report = reconciler.reconcile(&mut host, &[line("b", &[3.0, 4.0])]);
    assert_eq!(report.removed, vec!["a"]);
    assert!(report.created.is_empty());
    assert_eq!(report.pushed, vec!["b"]);
    assert_eq!(host.series_count(), 1);
    assert_eq!(
        host.series_by_id("b").map(|series| series.samples.len()),
        Some(2)
    );
}

#[test]
fn style_change_recreates_the_native_series() {
    let mut host = surface();
    let mut reconciler = OverlayReconciler::new();
    reconciler.reconcile(&mut host, &[line("a", &[1.0])]);
    let before = reconciler.handle("a").copied();

    let mut restyled = line("a", &[1.0]);
    restyled.color = Some("#ff0000".to_owned());
    let report = reconciler.reconcile(&mut host, &[restyled]);

    assert_eq!(report.removed, vec!["a"]);
    assert_eq!(report.created, vec!["a"]);
    assert_ne!(reconciler.handle("a").copied(), before);
    assert_eq!(
        host.series_by_id("a").map(|series| series.config.color.as_str()),
        Some("#ff0000")
    );
}

#[test]
fn one_failing_series_does_not_block_the_others() {
    let mut host = surface();
    host.fail_series("bad");
    let mut reconciler = OverlayReconciler::new();

    let report = reconciler.reconcile(
        &mut host,
        &[line("good", &[1.0]), line("bad", &[2.0]), line("also-good", &[3.0])],
    );
    assert_eq!(report.failed, vec!["bad"]);
    assert_eq!(report.created, vec!["good", "also-good"]);
    assert!(!reconciler.contains("bad"));

    // Retried on the next pass once the surface recovers.
    host.clear_failures();
    let report = reconciler.reconcile(
        &mut host,
        &[line("good", &[1.0]), line("bad", &[2.0]), line("also-good", &[3.0])],
    );
    assert_eq!(report.created, vec!["bad"]);
    assert!(report.is_clean());
    assert_eq!(reconciler.len(), 3);
}

#[test]
fn disposed_surface_degrades_to_failures_without_panicking() {
    let mut host = surface();
    let mut reconciler = OverlayReconciler::new();
    reconciler.reconcile(&mut host, &[line("a", &[1.0])]);

    host.dispose();
    let report = reconciler.reconcile(&mut host, &[line("b", &[1.0])]);
    assert_eq!(report.failed, vec!["a", "b"]);
    // Failed removals still drop the mapping.
    assert!(reconciler.is_empty());
}

#[test]
fn clear_removes_everything() {
    let mut host = surface();
    let mut reconciler = OverlayReconciler::new();
    reconciler.reconcile(&mut host, &[line("a", &[1.0]), line("b", &[1.0])]);

    let report = reconciler.clear(&mut host);
    assert_eq!(report.removed, vec!["a", "b"]);
    assert!(reconciler.is_empty());
    assert_eq!(host.series_count(), 0);
    assert_eq!(host.stats().remove_calls, 2);
}
