//! End-to-end hypothesis scenarios on synthetic claims data.

use std::collections::BTreeMap;

use claims_model::{Column, Dataset, Decision, TestKind};
use claims_stats::{
    HypothesisRunner, LabelPair, OutcomeMetric, StandardHypothesis, run_standard_hypotheses,
    segment,
};
use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// 1,000 policies split evenly between two provinces, one claim in ten in both.
fn identical_claim_rates() -> Dataset {
    let n = 1000;
    let province = (0..n)
        .map(|i| Some(if i % 2 == 0 { "Gauteng" } else { "Western Cape" }))
        .collect();
    let has_claim = (0..n).map(|i| Some((i / 2) % 10 == 0)).collect();
    Dataset::new(vec![
        Column::categorical("Province", province),
        Column::boolean("HasClaim", has_claim),
    ])
    .unwrap()
}

#[test]
fn identical_claim_rates_fail_to_reject() {
    let ds = identical_claim_rates();
    let seg = segment(&ds, "Province", "Gauteng", "Western Cape").unwrap();
    assert_eq!(seg.control.len(), 500);
    assert_eq!(seg.test.len(), 500);

    let result = HypothesisRunner::default()
        .run(&ds, "province risk", &seg, &OutcomeMetric::claim_frequency())
        .unwrap();
    assert_eq!(result.kind, TestKind::ChiSquared);
    assert!(result.p_value > 0.05);
    assert_eq!(result.decision, Decision::FailToReject);
}

#[test]
fn distinct_margins_reject() {
    let n = 100;
    let mut group = Vec::new();
    let mut margin = Vec::new();
    for (label, centre) in [("A", 100.0), ("B", 500.0)] {
        for i in 0..n {
            group.push(Some(label));
            margin.push(Some(if i % 2 == 0 { centre - 10.0 } else { centre + 10.0 }));
        }
    }
    let ds = Dataset::new(vec![
        Column::categorical("PostalCode", group),
        Column::numeric("Margin", margin),
    ])
    .unwrap();
    let seg = segment(&ds, "PostalCode", "A", "B").unwrap();
    let result = HypothesisRunner::default()
        .run(&ds, "zip margin", &seg, &OutcomeMetric::margin())
        .unwrap();
    assert_eq!(result.kind, TestKind::WelchT);
    assert!(result.p_value < 0.05);
    assert_eq!(result.decision, Decision::Reject);
}

#[test]
fn identical_distributions_fail_to_reject() {
    let values: Vec<f64> = (0..50).map(|i| f64::from(i % 7) * 3.5).collect();
    let group = (0..100).map(|i| Some(if i < 50 { "A" } else { "B" })).collect();
    let margin = values.iter().chain(values.iter()).map(|v| Some(*v)).collect();
    let ds = Dataset::new(vec![
        Column::categorical("Gender", group),
        Column::numeric("Margin", margin),
    ])
    .unwrap();
    let seg = segment(&ds, "Gender", "A", "B").unwrap();
    let result = HypothesisRunner::default()
        .run(&ds, "identical", &seg, &OutcomeMetric::margin())
        .unwrap();
    assert_eq!(result.decision, Decision::FailToReject);
    assert!((result.p_value - 1.0).abs() < 1e-9);
}

fn synthetic_portfolio() -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let provinces = ["Gauteng", "Western Cape", "Kwazulu-natal"];
    let postal = ["2000", "7100", "4001", "1459"];
    let genders = ["Male", "Female"];
    let n = 400;
    let mut province = Vec::new();
    let mut postal_code = Vec::new();
    let mut gender = Vec::new();
    let mut has_claim = Vec::new();
    let mut margin = Vec::new();
    for i in 0..n {
        province.push(Some(provinces[i % provinces.len()]));
        postal_code.push(Some(postal[(i / 3) % postal.len()]));
        gender.push(Some(genders[(i / 2) % 2]));
        has_claim.push(Some(rng.random_range(0.0..1.0) < 0.2));
        margin.push(Some(rng.random_range(-50.0..150.0)));
    }
    Dataset::new(vec![
        Column::categorical("Province", province),
        Column::categorical("PostalCode", postal_code),
        Column::categorical("Gender", gender),
        Column::boolean("HasClaim", has_claim),
        Column::numeric("Margin", margin),
    ])
    .unwrap()
}

#[test]
fn runs_four_standard_hypotheses() {
    let ds = synthetic_portfolio();
    let results =
        run_standard_hypotheses(&ds, &HypothesisRunner::default(), &BTreeMap::new()).unwrap();
    assert_eq!(results.len(), 4);

    let kinds: Vec<TestKind> = results.iter().map(|(_, r)| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TestKind::ChiSquared,
            TestKind::ChiSquared,
            TestKind::WelchT,
            TestKind::ChiSquared
        ]
    );
    let (hypothesis, gender) = &results[3];
    assert_eq!(*hypothesis, StandardHypothesis::GenderRisk);
    assert_eq!(gender.groups[0].label, "Female");
    assert_eq!(gender.groups[1].label, "Male");
    assert!(results.iter().all(|(_, r)| r.decision != Decision::Undefined));
}

#[test]
fn label_overrides_are_used() {
    let ds = synthetic_portfolio();
    let mut overrides = BTreeMap::new();
    overrides.insert(
        "province_risk".to_string(),
        LabelPair {
            control: "Kwazulu-natal".to_string(),
            test: "Western Cape".to_string(),
        },
    );
    let results = run_standard_hypotheses(&ds, &HypothesisRunner::default(), &overrides).unwrap();
    let province = &results[0].1;
    assert_eq!(province.groups[0].label, "Kwazulu-natal");
    assert_eq!(province.groups[1].label, "Western Cape");
}

proptest! {
    #[test]
    fn segmentation_is_disjoint_and_exact(labels in proptest::collection::vec(0u8..4, 2..200)) {
        let names = ["a", "b", "c", "d"];
        let values: Vec<Option<&str>> = labels
            .iter()
            .map(|&l| if l == 3 { None } else { Some(names[l as usize]) })
            .collect();
        let ds = Dataset::new(vec![Column::categorical("Field", values.clone())]).unwrap();

        match segment(&ds, "Field", "a", "b") {
            Ok(seg) => {
                for row in &seg.control.rows {
                    prop_assert!(!seg.test.rows.contains(row));
                }
                let mut union: Vec<usize> = seg.control.rows.iter().chain(&seg.test.rows).copied().collect();
                union.sort_unstable();
                let expected: Vec<usize> = values
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| matches!(v, Some("a") | Some("b")))
                    .map(|(i, _)| i)
                    .collect();
                prop_assert_eq!(union, expected);
            }
            Err(_) => {
                let has_a = values.contains(&Some("a"));
                let has_b = values.contains(&Some("b"));
                prop_assert!(!(has_a && has_b));
            }
        }
    }
}
