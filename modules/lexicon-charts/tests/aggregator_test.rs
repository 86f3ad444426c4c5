//! Report computation over an in-memory population.

use std::sync::Arc;

use lexicon_charts::{
    ChartAggregator, ChartPoint, MemoryPopulation, ReportError, ReportKind, SeriesId,
    LKPP_DATASET,
};
use lexicon_common::{CaseRecord, ExtensionEntry, ExtensionPayload};
use serde_json::{json, Value};

fn lkpp(id: &str, data: Value) -> CaseRecord {
    CaseRecord::new(id, format!("subject {id}")).with_extension(ExtensionEntry::new(LKPP_DATASET, data))
}

fn counts(pairs: &[(&str, i64)]) -> Vec<ChartPoint<i64>> {
    pairs
        .iter()
        .map(|(name, value)| ChartPoint::new(Some(name.to_string()), *value))
        .collect()
}

fn percents(pairs: &[(&str, f64)]) -> Vec<ChartPoint<f64>> {
    pairs
        .iter()
        .map(|(name, value)| ChartPoint::new(Some(name.to_string()), *value))
        .collect()
}

// =========================================================================
// Report shape
// =========================================================================

#[tokio::test]
async fn empty_population_yields_every_series_empty() {
    let aggregator = ChartAggregator::new(MemoryPopulation::default());

    let general = aggregator.general_report().await.unwrap();
    assert_eq!(
        serde_json::to_value(&general).unwrap(),
        json!({"countries": [], "subject_types": [], "case_types": []})
    );

    let dataset = aggregator.dataset_report(LKPP_DATASET).await.unwrap();
    assert_eq!(
        serde_json::to_value(&dataset).unwrap(),
        json!({
            "blacklist_province": [],
            "ceiling_distribution": [],
            "top_ten_reporter": [],
            "scenario_distribution": [],
            "violation_distribution": [],
        })
    );
}

#[tokio::test]
async fn unknown_marker_yields_empty_dataset_report() {
    let population = MemoryPopulation::new(vec![
        lkpp("1", json!({"province": "Bali", "ceiling": "1000000", "rule": "A"})),
        lkpp("2", json!({"province": "Aceh", "scenario": "X"})),
    ]);
    let aggregator = ChartAggregator::new(population);

    let report = aggregator.dataset_report("NOPE").await.unwrap();

    assert_eq!(report.kind(), &ReportKind::dataset("NOPE"));
    assert!(report.is_empty());
    assert_eq!(report.iter().count(), 5);
}

// =========================================================================
// General report
// =========================================================================

#[tokio::test]
async fn general_report_groups_core_columns() {
    let population = MemoryPopulation::new(vec![
        CaseRecord::new("1", "a").with_nation("Indonesia").with_subject_type(2).with_case_type(2),
        CaseRecord::new("2", "b").with_nation("Indonesia").with_subject_type(2).with_case_type(1),
        CaseRecord::new("3", "c").with_nation("Malaysia").with_subject_type(1).with_case_type(2),
        CaseRecord::new("4", "d").with_subject_type(9).with_case_type(7),
    ]);
    let report = ChartAggregator::new(population).general_report().await.unwrap();

    assert_eq!(
        report.get(SeriesId::Countries).unwrap().counts().unwrap(),
        &[
            ChartPoint::new(Some("Indonesia".into()), 2),
            ChartPoint::new(Some("Malaysia".into()), 1),
            ChartPoint::new(None, 1),
        ]
    );
    assert_eq!(
        report.get(SeriesId::SubjectTypes).unwrap().counts().unwrap(),
        &[
            ChartPoint::new(Some("Company".into()), 2),
            ChartPoint::new(Some("Individual".into()), 1),
            ChartPoint::new(None, 1),
        ]
    );
    assert_eq!(
        report.get(SeriesId::CaseTypes).unwrap().counts().unwrap(),
        &[
            ChartPoint::new(Some("Blacklist".into()), 2),
            ChartPoint::new(Some("Verdict".into()), 1),
            ChartPoint::new(None, 1),
        ]
    );
}

#[tokio::test]
async fn general_report_sums_match_population_size() {
    let records: Vec<CaseRecord> = (0..17)
        .map(|i| {
            CaseRecord::new(i.to_string(), "s")
                .with_nation(if i % 3 == 0 { "Indonesia" } else { "Singapore" })
                .with_subject_type(i % 4)
        })
        .collect();
    let report = ChartAggregator::new(MemoryPopulation::new(records))
        .general_report()
        .await
        .unwrap();

    for (_, series) in report.iter() {
        let total: i64 = series.counts().unwrap().iter().map(|p| p.value).sum();
        assert_eq!(total, 17);
    }
}

// =========================================================================
// Dataset report
// =========================================================================

#[tokio::test]
async fn ceiling_values_fall_into_half_open_ranges() {
    let population = MemoryPopulation::new(vec![
        lkpp("1", json!({"ceiling": "1000000"})),
        lkpp("2", json!({"ceiling": "2500000000"})),
        lkpp("3", json!({"ceiling": "99999999999"})),
        lkpp("4", json!({"ceiling": "150000000000"})),
        lkpp("5", json!({"ceiling": "not a number"})),
        lkpp("6", json!({})),
    ]);
    let report = ChartAggregator::new(population)
        .dataset_report(LKPP_DATASET)
        .await
        .unwrap();

    assert_eq!(
        report.get(SeriesId::CeilingDistribution).unwrap().counts().unwrap(),
        counts(&[
            ("0 - 2.5 B", 1),
            ("2.5 B - 15 B", 1),
            ("15 B - 50 B", 0),
            ("50 B - 100 B", 1),
            ("> 100 B", 1),
        ])
        .as_slice()
    );
}

#[tokio::test]
async fn numeric_ceiling_values_are_bucketed_too() {
    let population = MemoryPopulation::new(vec![
        lkpp("1", json!({"ceiling": 20_000_000_000_i64})),
        lkpp("2", json!({"ceiling": "100000000000"})),
    ]);
    let report = ChartAggregator::new(population)
        .dataset_report(LKPP_DATASET)
        .await
        .unwrap();

    assert_eq!(
        report.get(SeriesId::CeilingDistribution).unwrap().counts().unwrap(),
        counts(&[
            ("0 - 2.5 B", 0),
            ("2.5 B - 15 B", 0),
            ("15 B - 50 B", 1),
            ("50 B - 100 B", 0),
            ("> 100 B", 1),
        ])
        .as_slice()
    );
}

#[tokio::test]
async fn violations_collapse_tail_into_other_pinned_last() {
    let mut records = Vec::new();
    for (rule, count) in [("A", 50), ("B", 30), ("C", 10), ("D", 5), ("E", 3), ("F", 2)] {
        for i in 0..count {
            records.push(lkpp(&format!("{rule}-{i}"), json!({"rule": rule})));
        }
    }
    let report = ChartAggregator::new(MemoryPopulation::new(records))
        .dataset_report(LKPP_DATASET)
        .await
        .unwrap();

    assert_eq!(
        report.get(SeriesId::ViolationDistribution).unwrap().percentages().unwrap(),
        percents(&[
            ("A", 50.0),
            ("B", 30.0),
            ("C", 10.0),
            ("D", 5.0),
            ("E", 3.0),
            ("Other", 2.0),
        ])
        .as_slice()
    );
}

#[tokio::test]
async fn other_stays_last_even_when_largest() {
    let mut records = Vec::new();
    for (rule, count) in [("A", 5), ("B", 4), ("C", 3), ("D", 2), ("E", 2)] {
        for i in 0..count {
            records.push(lkpp(&format!("{rule}-{i}"), json!({"rule": rule})));
        }
    }
    for i in 0..8 {
        records.push(lkpp(&format!("tail-{i}"), json!({"rule": format!("rare-{i}")})));
    }
    let report = ChartAggregator::new(MemoryPopulation::new(records))
        .dataset_report(LKPP_DATASET)
        .await
        .unwrap();

    let points = report
        .get(SeriesId::ViolationDistribution)
        .unwrap()
        .percentages()
        .unwrap();
    assert_eq!(points.len(), 6);
    assert_eq!(points[0], ChartPoint::new(Some("A".into()), 20.8));
    assert_eq!(points[5], ChartPoint::new(Some("Other".into()), 33.3));
}

#[tokio::test]
async fn rule_literally_named_other_merges_with_overflow() {
    let mut records = Vec::new();
    for (rule, count) in [("Other", 40), ("A", 30), ("B", 10), ("C", 5), ("D", 4), ("E", 3), ("F", 2)] {
        for i in 0..count {
            records.push(lkpp(&format!("{rule}-{i}"), json!({"rule": rule})));
        }
    }
    let report = ChartAggregator::new(MemoryPopulation::new(records))
        .dataset_report(LKPP_DATASET)
        .await
        .unwrap();

    let points = report
        .get(SeriesId::ViolationDistribution)
        .unwrap()
        .percentages()
        .unwrap();
    let others = points
        .iter()
        .filter(|p| p.name.as_deref() == Some("Other"))
        .count();
    assert_eq!(others, 1);
    assert_eq!(
        points,
        percents(&[("A", 31.9), ("B", 10.6), ("C", 5.3), ("D", 4.3), ("Other", 47.9)]).as_slice()
    );
}

#[tokio::test]
async fn scenario_percentages_sort_descending() {
    let population = MemoryPopulation::new(vec![
        lkpp("1", json!({"scenario": "Y"})),
        lkpp("2", json!({"scenario": "X"})),
        lkpp("3", json!({"scenario": "X"})),
    ]);
    let report = ChartAggregator::new(population)
        .dataset_report(LKPP_DATASET)
        .await
        .unwrap();

    assert_eq!(
        report.get(SeriesId::ScenarioDistribution).unwrap().percentages().unwrap(),
        percents(&[("X", 66.7), ("Y", 33.3)]).as_slice()
    );
}

#[tokio::test]
async fn top_reporters_keep_ten_without_other() {
    let mut records = Vec::new();
    for inst in 0..12 {
        for i in 0..(20 - inst) {
            records.push(lkpp(
                &format!("{inst}-{i}"),
                json!({"institution_area": format!("Institution {inst:02}")}),
            ));
        }
    }
    let report = ChartAggregator::new(MemoryPopulation::new(records))
        .dataset_report(LKPP_DATASET)
        .await
        .unwrap();

    let points = report.get(SeriesId::TopTenReporter).unwrap().counts().unwrap();
    assert_eq!(points.len(), 10);
    assert_eq!(points[0], ChartPoint::new(Some("Institution 00".into()), 20));
    assert_eq!(points[9], ChartPoint::new(Some("Institution 09".into()), 11));
    assert!(points.iter().all(|p| p.name.as_deref() != Some("Other")));
}

#[tokio::test]
async fn province_skips_placeholders_and_missing_values() {
    let population = MemoryPopulation::new(vec![
        lkpp("1", json!({"province": "Bali"})),
        lkpp("2", json!({"province": "Bali"})),
        lkpp("3", json!({"province": "Aceh"})),
        lkpp("4", json!({"province": ""})),
        lkpp("5", json!({"province": "-"})),
        lkpp("6", json!({"province": null})),
        lkpp("7", json!({})),
    ]);
    let report = ChartAggregator::new(population)
        .dataset_report(LKPP_DATASET)
        .await
        .unwrap();

    assert_eq!(
        report.get(SeriesId::BlacklistProvince).unwrap().counts().unwrap(),
        counts(&[("Bali", 2), ("Aceh", 1)]).as_slice()
    );
}

#[tokio::test]
async fn marker_is_matched_by_type_not_position() {
    let population = MemoryPopulation::new(vec![
        CaseRecord::new("1", "a")
            .with_extension(ExtensionEntry::new("OJK", json!({"province": "Papua"})))
            .with_extension(ExtensionEntry::new(LKPP_DATASET, json!({"province": "Bali"}))),
        CaseRecord::new("2", "b")
            .with_extension(ExtensionEntry::new("OJK", json!({"province": "Papua"}))),
        CaseRecord::new("3", "c"),
    ]);
    let report = ChartAggregator::new(population)
        .dataset_report(LKPP_DATASET)
        .await
        .unwrap();

    assert_eq!(
        report.get(SeriesId::BlacklistProvince).unwrap().counts().unwrap(),
        counts(&[("Bali", 1)]).as_slice()
    );
}

#[tokio::test]
async fn first_marker_entry_wins_even_without_object_data() {
    let mut shadowed = CaseRecord::new("1", "a");
    shadowed.extension = ExtensionPayload::from_json(&json!([
        {"type": LKPP_DATASET, "data": "x"},
        {"type": LKPP_DATASET, "data": {"province": "Bali"}}
    ]));
    let population = MemoryPopulation::new(vec![shadowed, lkpp("2", json!({"province": "Aceh"}))]);
    let report = ChartAggregator::new(population)
        .dataset_report(LKPP_DATASET)
        .await
        .unwrap();

    assert_eq!(
        report.get(SeriesId::BlacklistProvince).unwrap().counts().unwrap(),
        counts(&[("Aceh", 1)]).as_slice()
    );
}

#[tokio::test]
async fn repeated_reports_are_identical() {
    let population = MemoryPopulation::new(vec![
        lkpp("1", json!({"province": "Bali", "rule": "A", "scenario": "X", "ceiling": "5"})),
        lkpp("2", json!({"province": "Aceh", "rule": "B", "scenario": "Y", "ceiling": "3000000000"})),
        lkpp("3", json!({"province": "Bali", "rule": "B", "scenario": "X"})),
    ]);
    let aggregator = ChartAggregator::new(population);

    let first = serde_json::to_string(&aggregator.dataset_report(LKPP_DATASET).await.unwrap()).unwrap();
    let second = serde_json::to_string(&aggregator.dataset_report(LKPP_DATASET).await.unwrap()).unwrap();

    assert_eq!(first, second);
}

// =========================================================================
// Snapshot lifecycle
// =========================================================================

#[tokio::test]
async fn successful_report_commits_its_snapshot() {
    let population = Arc::new(MemoryPopulation::new(vec![lkpp("1", json!({"rule": "A"}))]));
    let aggregator = ChartAggregator::new(population.clone());

    aggregator.dataset_report(LKPP_DATASET).await.unwrap();
    aggregator.general_report().await.unwrap();

    assert_eq!(population.committed(), 2);
    assert_eq!(population.rolled_back(), 0);
}

#[tokio::test]
async fn failing_series_aborts_whole_report() {
    let population = Arc::new(
        MemoryPopulation::new(vec![lkpp("1", json!({"province": "Bali", "ceiling": "1"}))])
            .failing_on("ceiling"),
    );
    let aggregator = ChartAggregator::new(population.clone());

    let err = aggregator.dataset_report(LKPP_DATASET).await.unwrap_err();

    assert!(matches!(
        err,
        ReportError::Query {
            series: "ceiling_distribution",
            ..
        }
    ));
    assert_eq!(population.committed(), 0);
    assert_eq!(population.rolled_back(), 1);
}

#[tokio::test]
async fn failing_begin_returns_transaction_error() {
    let population = Arc::new(MemoryPopulation::default().failing_on_begin());
    let aggregator = ChartAggregator::new(population.clone());

    let err = aggregator.general_report().await.unwrap_err();

    assert!(matches!(err, ReportError::Transaction(_)));
    assert!(err.to_string().contains("read snapshot"));
    assert_eq!(population.committed(), 0);
}

#[tokio::test]
async fn inserts_after_a_report_show_up_in_the_next_one() {
    let population = Arc::new(MemoryPopulation::new(vec![
        CaseRecord::new("1", "a").with_nation("Indonesia"),
    ]));
    let aggregator = ChartAggregator::new(population.clone());

    let before = aggregator.general_report().await.unwrap();
    population.insert(CaseRecord::new("2", "b").with_nation("Indonesia"));
    let after = aggregator.general_report().await.unwrap();

    assert_eq!(
        before.get(SeriesId::Countries).unwrap().counts().unwrap(),
        counts(&[("Indonesia", 1)]).as_slice()
    );
    assert_eq!(
        after.get(SeriesId::Countries).unwrap().counts().unwrap(),
        counts(&[("Indonesia", 2)]).as_slice()
    );
}
