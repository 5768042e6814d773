//! Row pairing behavior in index and primary-key mode.

use crate::common::{compare_datasets, failure_pairs, orders_dataset};
use dataequiv::{ComparisonOptions, DataType, NodeKind, RowMatchMode, RowState};

fn pk_options() -> ComparisonOptions {
    ComparisonOptions::for_dataset().with_row_match_mode(RowMatchMode::PrimaryKey)
}

#[test]
fn row_count_mismatch_stops_row_comparison() {
    let actual = orders_dataset(&[(1, 10.0), (2, 20.0)]);
    let expected = orders_dataset(&[(1, 10.0)]);

    let report = compare_datasets(&actual, &expected, ComparisonOptions::for_dataset());

    assert_eq!(report.len(), 1);
    assert_eq!(report.failures[0].path, "tables[Orders].rows");
    assert!(report.mentions("Expected row collection to contain 1 row(s), but found 2"));
}

#[test]
fn index_mode_pairs_rows_by_position() {
    let actual = orders_dataset(&[(1, 10.0), (2, 20.0)]);
    let expected = orders_dataset(&[(2, 20.0), (1, 99.0)]);

    let report = compare_datasets(&actual, &expected, ComparisonOptions::for_dataset());

    assert!(report.mentions("rows[0].Amount"));
    assert!(report.mentions("rows[1].Amount"));
    assert!(report.mentions("rows[0].Id"));
}

#[test]
fn index_mode_permuting_both_sides_identically_stays_equivalent() {
    let actual = orders_dataset(&[(2, 20.0), (1, 10.0)]);
    let expected = orders_dataset(&[(2, 20.0), (1, 10.0)]);

    let report = compare_datasets(&actual, &expected, ComparisonOptions::for_dataset());
    assert!(report.is_equivalent(), "unexpected failures: {report}");
}

#[test]
fn index_mode_permuting_one_side_introduces_positional_mismatches() {
    let actual = orders_dataset(&[(1, 10.0), (2, 20.0)]);
    let expected = orders_dataset(&[(2, 20.0), (1, 10.0)]);

    let report = compare_datasets(&actual, &expected, ComparisonOptions::for_dataset());
    assert!(!report.is_equivalent());
}

#[test]
fn primary_key_mode_matches_rows_by_key() {
    let actual = orders_dataset(&[(1, 10.0), (2, 20.0)]);
    let expected = orders_dataset(&[(2, 20.0), (1, 99.0)]);

    let report = compare_datasets(&actual, &expected, pk_options());

    assert_eq!(report.len(), 1, "exactly one mismatch expected: {report}");
    assert_eq!(report.failures[0].path, "tables[Orders].rows[{ 1 }].Amount");
    assert!(report.mentions("Expected value to be 99, but found 10"));
}

#[test]
fn primary_key_mode_is_permutation_invariant() {
    let expected = orders_dataset(&[(3, 1.0), (1, 99.0), (2, 20.0)]);

    let forward = orders_dataset(&[(1, 10.0), (2, 20.0), (3, 3.0)]);
    let reversed = orders_dataset(&[(3, 3.0), (2, 20.0), (1, 10.0)]);

    let first = compare_datasets(&forward, &expected, pk_options());
    let second = compare_datasets(&reversed, &expected, pk_options());

    assert!(!first.is_equivalent());
    assert_eq!(failure_pairs(&first), failure_pairs(&second));
}

#[test]
fn primary_key_mode_requires_a_primary_key() {
    let mut actual = orders_dataset(&[(1, 10.0)]);
    actual.tables[0].primary_key.clear();
    let expected = orders_dataset(&[(1, 99.0)]);

    let report = compare_datasets(&actual, &expected, pk_options());

    // the key-column list itself is still reported by the table step
    assert!(report.mentions("Expected primary key to consist of 1 column(s), but found 0"));
    assert!(report.mentions(
        "does not have a primary key; primary-key row matching cannot be applied"
    ));
    assert!(
        report.iter().all(|f| !f.path.contains("rows[")),
        "no rows may be compared: {report}"
    );
}

#[test]
fn primary_key_mode_requires_compatible_key_schemas() {
    let actual = orders_dataset(&[(1, 10.0)]);
    let mut expected = orders_dataset(&[(1, 99.0)]);
    expected.tables[0].columns[0].data_type = DataType::Str;

    let report = compare_datasets(&actual, &expected, pk_options());

    assert!(report.mentions("do not have the same schema"));
    assert!(
        report.iter().all(|f| !f.path.contains("rows[")),
        "no rows may be compared: {report}"
    );
}

#[test]
fn unmatched_keys_are_reported_as_unexpected_and_missing() {
    let actual = orders_dataset(&[(1, 10.0), (2, 20.0)]);
    let expected = orders_dataset(&[(2, 20.0), (3, 30.0)]);

    let report = compare_datasets(&actual, &expected, pk_options());

    assert_eq!(report.len(), 2);
    assert!(report.mentions("Found unexpected row with key { 1 }"));
    assert!(report.mentions("Expected to find a row with key { 3 }, but no such row was found"));
}

#[test]
fn several_missing_keys_get_a_plural_report() {
    let actual = orders_dataset(&[(1, 1.0), (2, 2.0), (3, 3.0)]);
    let expected = orders_dataset(&[(4, 4.0), (5, 5.0), (6, 6.0)]);

    let report = compare_datasets(&actual, &expected, pk_options());

    assert!(report.mentions("Found unexpected row with key { 1 }"));
    assert!(report.mentions("Found unexpected row with key { 2 }"));
    assert!(report.mentions("Found unexpected row with key { 3 }"));
    assert!(report.mentions("3 rows were expected in the row collection and not found"));
}

#[test]
fn deleted_rows_compare_their_original_version() {
    let mut actual = orders_dataset(&[(1, 10.0)]);
    {
        let row = &mut actual.tables[0].rows[0];
        row.state = RowState::Deleted;
        row.original = Some(row.values.clone());
    }

    let mut expected = orders_dataset(&[(1, 99.0)]);
    {
        let row = &mut expected.tables[0].rows[0];
        row.state = RowState::Deleted;
        row.original = Some(row.values.clone());
    }

    let report = compare_datasets(&actual, &expected, ComparisonOptions::for_dataset());

    assert_eq!(report.len(), 1);
    assert_eq!(report.failures[0].path, "tables[Orders].rows[0].Amount");
    assert!(report.mentions("Expected value to be 99, but found 10"));
}

#[test]
fn modified_rows_also_compare_originals_when_both_are_modified() {
    let mut actual = orders_dataset(&[(1, 20.0)]);
    {
        let row = &mut actual.tables[0].rows[0];
        row.state = RowState::Modified;
        let mut original = row.values.clone();
        original["Amount"] = 10.0.into();
        row.original = Some(original);
    }

    let mut expected = orders_dataset(&[(1, 20.0)]);
    {
        let row = &mut expected.tables[0].rows[0];
        row.state = RowState::Modified;
        let mut original = row.values.clone();
        original["Amount"] = 99.0.into();
        row.original = Some(original);
    }

    let report = compare_datasets(&actual, &expected, ComparisonOptions::for_dataset());

    assert_eq!(report.len(), 1);
    assert_eq!(
        report.failures[0].path,
        "tables[Orders].rows[0].Amount (original)"
    );

    // excluding original data suppresses the second comparison
    let report = compare_datasets(
        &actual,
        &expected,
        ComparisonOptions::for_dataset().excluding_original_data(),
    );
    assert!(report.is_equivalent(), "unexpected failures: {report}");
}

#[test]
fn originals_are_not_compared_when_only_one_side_is_modified() {
    let mut actual = orders_dataset(&[(1, 20.0)]);
    {
        let row = &mut actual.tables[0].rows[0];
        row.state = RowState::Modified;
        let mut original = row.values.clone();
        original["Amount"] = 10.0.into();
        row.original = Some(original);
    }

    let expected = orders_dataset(&[(1, 20.0)]);

    let report = compare_datasets(
        &actual,
        &expected,
        ComparisonOptions::for_dataset().excluding_member(NodeKind::Row, "row_state"),
    );

    assert!(report.is_equivalent(), "unexpected failures: {report}");
}
