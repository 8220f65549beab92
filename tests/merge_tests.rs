use chart_annotations::script::{
    EvaluationResult, HLineElement, MarkerElement, MarkerPosition, VLineElement, merge_results,
};
use proptest::prelude::*;

fn result_with_hlines(hlines: &[(&str, f64)]) -> EvaluationResult {
    EvaluationResult {
        hlines: hlines
            .iter()
            .map(|(id, price)| HLineElement::new(*id, *price))
            .collect(),
        ..EvaluationResult::default()
    }
}

#[test]
fn later_script_wins_and_keeps_first_slot() {
    let first = result_with_hlines(&[("a", 1.0), ("shared", 2.0)]);
    let second = result_with_hlines(&[("shared", 3.0), ("b", 4.0)]);

    let merged = merge_results([&first, &second]);
    let ids: Vec<&str> = merged.hlines.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "shared", "b"]);
    assert_eq!(merged.hlines[1].price, 3.0);
}

#[test]
fn buckets_dedup_independently() {
    let mut first = result_with_hlines(&[("x", 1.0)]);
    first.vlines.push(VLineElement::new("x", 10));
    let merged = merge_results([&first]);
    assert_eq!(merged.hlines.len(), 1);
    assert_eq!(merged.vlines.len(), 1);
    assert_eq!(merged.len(), 2);
}

#[test]
fn markers_are_sorted_by_time() {
    let result = EvaluationResult {
        markers: vec![
            MarkerElement::new("late", 300, MarkerPosition::AboveBar),
            MarkerElement::new("early", 100, MarkerPosition::BelowBar),
            MarkerElement::new("mid", 200, MarkerPosition::InBar),
        ],
        ..EvaluationResult::default()
    };
    let merged = merge_results([&result]);
    let times: Vec<i64> = merged.markers.iter().map(|m| m.time).collect();
    assert_eq!(times, vec![100, 200, 300]);
}

#[test]
fn empty_input_merges_to_nothing() {
    assert!(merge_results(std::iter::empty::<&EvaluationResult>()).is_empty());
}

proptest! {
    #[test]
    fn merging_a_result_twice_is_idempotent(
        prices in prop::collection::vec(-1000.0f64..1000.0, 0..24),
        id_space in 1usize..8,
    ) {
        let result = EvaluationResult {
            hlines: prices
                .iter()
                .enumerate()
                .map(|(index, price)| HLineElement::new(format!("h{}", index % id_space), *price))
                .collect(),
            ..EvaluationResult::default()
        };

        let once = merge_results([&result]);
        let twice = merge_results([&result, &result]);
        prop_assert_eq!(&once, &twice);
        prop_assert!(once.hlines.len() <= id_space);

        // Every surviving element carries the last value written for its id.
        for hline in &once.hlines {
            let last = result
                .hlines
                .iter()
                .rev()
                .find(|candidate| candidate.id == hline.id)
                .map(|candidate| candidate.price);
            prop_assert_eq!(Some(hline.price), last);
        }
    }
}
