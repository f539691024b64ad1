//! End-to-end indicator computation over a JSON survey upload.

use metrica_formula::{
    ComputationStatus, Dataset, IndicatorComputation, IndicatorDefinition, evaluate,
};

const SURVEY: &str = r#"[
    {"Student ID": "S-001", "Course Name": "Math", "region": "North", "score": 71, "attended": true},
    {"Student ID": "S-002", "Course Name": "Math", "region": "South", "score": "88", "attended": false},
    {"Student ID": "S-003", "Course Name": null, "region": "North", "score": "absent", "attended": true},
    {"Student ID": "S-004", "Course Name": "Biology", "region": "East", "score": 65}
]"#;

fn survey() -> Dataset {
    serde_json::from_str(SURVEY).unwrap()
}

#[test]
fn ratio_of_multi_word_fields() {
    let value = evaluate("COUNT(Student ID) / COUNT(Course Name)", &survey()).unwrap();

    assert!((value - 4.0 / 3.0).abs() < 1e-12);
}

#[test]
fn indicator_definitions_load_from_json_and_compute_in_order() {
    let indicators: Vec<IndicatorDefinition> = serde_json::from_str(
        r#"[
            {"name": "Mean score", "formula": "AVG(score)"},
            {"name": "North share", "formula": "percentage(region, \"North\")"},
            {"name": "North mean", "formula": "avg(score)", "filter_criteria": {"region": "North"}},
            {"name": "Broken", "formula": "SUM(grade)"},
            {"name": "Score range", "formula": "MAX(score) - MIN(score)"}
        ]"#,
    )
    .unwrap();
    let dataset = survey();
    let computation = IndicatorComputation::new(&dataset);

    let results = computation.compute_batch(&indicators);

    assert_eq!(results.len(), 5);
    assert!((results[0].value.unwrap() - (71.0 + 88.0 + 65.0) / 3.0).abs() < 1e-12);
    assert_eq!(results[1].value, Some(50.0));
    assert_eq!(results[2].value, Some(71.0));
    assert_eq!(results[2].rows_processed, 2);
    assert_eq!(results[3].status, ComputationStatus::Error);
    assert_eq!(results[3].value, None);
    assert_eq!(results[4].value, Some(23.0));
}

#[test]
fn summary_statistics_cover_numeric_fields_only() {
    let dataset = survey();
    let stats = IndicatorComputation::new(&dataset).summary_statistics();

    assert!(stats.contains_key("score"));
    assert!(stats.contains_key("attended"));
    assert!(!stats.contains_key("region"));
    assert!(!stats.contains_key("Student ID"));
    assert_eq!(stats["score"].count, 3);
}
