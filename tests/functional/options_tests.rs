//! Exclusion configuration, derived table options, and report output.

use crate::common::{compare_datasets, orders_dataset};
use dataequiv::{ComparisonOptions, ComparisonReport, NodeKind};

#[test]
fn excluding_a_table_suppresses_all_its_reports() {
    let actual = orders_dataset(&[(1, 10.0)]);
    let expected = orders_dataset(&[(1, 99.0)]);

    let report = compare_datasets(
        &actual,
        &expected,
        ComparisonOptions::for_dataset().excluding_table("Orders"),
    );

    assert!(report.is_equivalent(), "unexpected failures: {report}");
}

#[test]
fn excluding_a_column_suppresses_reports_mentioning_it() {
    let actual = orders_dataset(&[(1, 10.0)]);
    let expected = orders_dataset(&[(1, 99.0)]);

    let unfiltered = compare_datasets(&actual, &expected, ComparisonOptions::for_dataset());
    assert!(unfiltered.mentions("Amount"));

    let report = compare_datasets(
        &actual,
        &expected,
        ComparisonOptions::for_dataset().excluding_column("Orders", "Amount"),
    );
    assert!(!report.mentions("Amount"), "{report}");
    assert!(report.is_equivalent());

    let report = compare_datasets(
        &actual,
        &expected,
        ComparisonOptions::for_dataset().excluding_column_in_all_tables("Amount"),
    );
    assert!(!report.mentions("Amount"), "{report}");
}

#[test]
fn excluded_columns_missing_from_one_schema_are_not_reported() {
    let mut actual = orders_dataset(&[]);
    actual.tables[0].columns.retain(|c| c.name != "Amount");
    let expected = orders_dataset(&[]);

    let report = compare_datasets(
        &actual,
        &expected,
        ComparisonOptions::for_dataset().excluding_column("Orders", "Amount"),
    );

    assert!(!report.mentions("Amount"), "{report}");
    assert!(report.is_equivalent());
}

#[test]
fn column_exclusion_in_another_table_does_not_apply() {
    let actual = orders_dataset(&[(1, 10.0)]);
    let expected = orders_dataset(&[(1, 99.0)]);

    let report = compare_datasets(
        &actual,
        &expected,
        ComparisonOptions::for_dataset().excluding_column("Items", "Amount"),
    );

    assert!(report.mentions("Amount"));
}

#[test]
fn deselecting_a_member_skips_its_comparison() {
    let actual = orders_dataset(&[]);
    let mut expected = orders_dataset(&[]);
    expected.locale = "fr-FR".to_string();

    let report = compare_datasets(
        &actual,
        &expected,
        ComparisonOptions::for_dataset().excluding_member(NodeKind::Dataset, "locale"),
    );

    assert!(report.is_equivalent(), "unexpected failures: {report}");
}

#[test]
fn deselected_dataset_locale_carries_over_to_tables() {
    let mut actual = orders_dataset(&[]);
    actual.locale = "fr-FR".to_string();
    actual.tables[0].locale = "fr-FR".to_string();

    let expected = orders_dataset(&[]);

    let unfiltered = compare_datasets(&actual, &expected, ComparisonOptions::for_dataset());
    assert_eq!(unfiltered.len(), 2, "dataset and table locale both differ: {unfiltered}");

    let report = compare_datasets(
        &actual,
        &expected,
        ComparisonOptions::for_dataset().excluding_member(NodeKind::Dataset, "locale"),
    );
    assert!(
        report.is_equivalent(),
        "the inherited table-level setting must not be reported: {report}"
    );
}

#[test]
fn reason_is_appended_to_comparison_failures() {
    let actual = orders_dataset(&[(1, 10.0)]);
    let expected = orders_dataset(&[(1, 99.0)]);

    let error = actual
        .should()
        .because("the seed data changed")
        .try_be_equivalent_to(&expected)
        .unwrap_err();

    assert!(error.to_string().contains("because the seed data changed"));
}

#[test]
fn report_display_lists_one_line_per_failure() {
    let actual = orders_dataset(&[(1, 10.0)]);
    let expected = orders_dataset(&[(1, 99.0)]);

    let report = compare_datasets(&actual, &expected, ComparisonOptions::for_dataset());
    let text = report.to_string();

    assert!(text.starts_with("Found 1 difference(s) between actual and expected:"));
    assert!(text.contains("  - at tables[Orders].rows[0].Amount: "));
}

#[test]
fn report_round_trips_through_json() {
    let actual = orders_dataset(&[(1, 10.0)]);
    let expected = orders_dataset(&[(1, 99.0)]);

    let report = compare_datasets(&actual, &expected, ComparisonOptions::for_dataset());
    let json = report.to_json().unwrap();

    let back: ComparisonReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back.failures, report.failures);
}
