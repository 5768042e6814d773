//! Whole-graph equivalence behavior: guards, membership, hard stops.

use crate::common::{compare_datasets, init_logging, orders_dataset, orders_table, store_dataset};
use dataequiv::{
    Comparand, Comparer, ComparisonOptions, DataSet, Row, Table, Value,
};

#[test]
fn identical_graphs_report_zero_mismatches() {
    init_logging();

    let orders = orders_dataset(&[(1, 10.0), (2, 20.0)]);
    let report = compare_datasets(&orders, &orders.clone(), ComparisonOptions::for_dataset());
    assert!(report.is_equivalent(), "unexpected failures: {report}");

    let store = store_dataset();
    let report = compare_datasets(&store, &store.clone(), ComparisonOptions::for_dataset());
    assert!(report.is_equivalent(), "unexpected failures: {report}");
}

#[test]
fn table_count_mismatch_stops_table_comparison() {
    let mut actual = DataSet::new("ds");
    actual.tables.push(Table::new("A"));
    actual.tables.push(Table::new("B"));
    actual.tables.push(Table::new("C"));

    let mut expected = DataSet::new("ds");
    expected.tables.push(Table::new("A"));
    expected.tables.push(Table::new("B"));

    let report = compare_datasets(&actual, &expected, ComparisonOptions::for_dataset());

    assert_eq!(report.len(), 1);
    assert!(report.mentions("Expected dataset to contain 2 table(s), but found 3 table(s)"));
    assert!(
        report.iter().all(|f| !f.path.starts_with("tables[")),
        "no per-table reports may follow a count mismatch: {report}"
    );
}

#[test]
fn tables_are_matched_by_name_not_position() {
    let mut actual = DataSet::new("ds");
    actual.tables.push(Table::new("Only_In_Actual"));

    let mut expected = DataSet::new("ds");
    expected.tables.push(Table::new("Only_In_Expected"));

    let report = compare_datasets(&actual, &expected, ComparisonOptions::for_dataset());

    assert_eq!(report.len(), 2);
    assert!(report.mentions(
        "Expected dataset to contain table \"Only_In_Expected\", but did not find it"
    ));
    assert!(report.mentions("Found unexpected table \"Only_In_Actual\""));
}

#[test]
fn dataset_type_guard_can_be_relaxed() {
    let actual = orders_dataset(&[(1, 10.0)]);
    let mut expected = orders_dataset(&[(1, 10.0)]);
    expected.type_name = "TypedOrdersDataSet".to_string();

    let report = compare_datasets(&actual, &expected, ComparisonOptions::for_dataset());
    assert!(report.mentions("Expected dataset to be of type \"TypedOrdersDataSet\""));

    let report = compare_datasets(
        &actual,
        &expected,
        ComparisonOptions::for_dataset().allowing_mismatched_types(),
    );
    assert!(report.is_equivalent(), "unexpected failures: {report}");
}

#[test]
fn scalar_member_mismatches_name_expected_and_actual() {
    let actual = orders_dataset(&[]);
    let mut expected = orders_dataset(&[]);
    expected.locale = "fr-FR".to_string();

    let report = compare_datasets(&actual, &expected, ComparisonOptions::for_dataset());

    assert_eq!(report.len(), 1);
    assert!(report.mentions(
        "Expected dataset to have locale value of \"fr-FR\", but found \"en-US\" instead"
    ));
}

#[test]
fn extended_properties_compare_per_key() {
    let mut actual = orders_dataset(&[]);
    actual
        .extended_properties
        .insert("version".to_string(), Value::from(1));

    let mut expected = orders_dataset(&[]);
    expected
        .extended_properties
        .insert("version".to_string(), Value::from(2));
    expected
        .extended_properties
        .insert("owner".to_string(), Value::from("qa"));

    let report = compare_datasets(&actual, &expected, ComparisonOptions::for_dataset());

    assert!(report.mentions("extended_properties[version]"));
    assert!(report.mentions("Expected to find property owner with value \"qa\", but found none"));
}

#[test]
fn relations_are_matched_by_name_and_compared_end_by_end() {
    let actual = store_dataset();
    let mut expected = store_dataset();
    expected.relations[0].child.columns[0].column = "Other".to_string();

    let report = compare_datasets(&actual, &expected, ComparisonOptions::for_dataset());

    assert!(report.mentions("relations[Customers_Orders]"));
    assert!(report.mentions(
        "Expected relation to reference column \"Other\" in table \"Orders\", \
         but found a reference to \"CustomerId\" in table \"Orders\" instead"
    ));
}

#[test]
fn missing_constraints_are_reported_by_name() {
    let mut actual = store_dataset();
    actual.tables[1].constraints.clear();

    let report = compare_datasets(&actual, &store_dataset(), ComparisonOptions::for_dataset());

    assert!(report.mentions(
        "Expected constraint named \"FK_Orders_Customers\", but did not find one"
    ));
}

#[test]
fn missing_columns_are_reported_at_the_table() {
    let mut actual = orders_dataset(&[]);
    actual.tables[0].columns.retain(|c| c.name != "Amount");

    let report = compare_datasets(&actual, &orders_dataset(&[]), ComparisonOptions::for_dataset());

    assert!(report.mentions("Expected table to contain column \"Amount\", but did not find it"));
}

#[test]
fn unmatched_row_columns_can_be_ignored() {
    // expected schema has {Id, Name}, actual only {Id}
    let mut actual_table = Table::new("People");
    actual_table
        .columns
        .push(dataequiv::Column::new("Id", dataequiv::DataType::Int));
    let actual_row = Row::with_values([("Id", 1)]);

    let mut expected_table = Table::new("People");
    expected_table
        .columns
        .push(dataequiv::Column::new("Id", dataequiv::DataType::Int));
    expected_table
        .columns
        .push(dataequiv::Column::new("Name", dataequiv::DataType::Str));
    let expected_row = Row::with_values([("Id", Value::from(1)), ("Name", Value::from("x"))]);

    let comparer = Comparer::new();

    let report = comparer.compare(
        Comparand::Row {
            row: &actual_row,
            table: &actual_table,
        },
        Comparand::Row {
            row: &expected_row,
            table: &expected_table,
        },
        ComparisonOptions::for_row(),
        None,
    );
    assert!(report.mentions("Expected row to have column \"Name\", but found none"));

    let report = comparer.compare(
        Comparand::Row {
            row: &actual_row,
            table: &actual_table,
        },
        Comparand::Row {
            row: &expected_row,
            table: &expected_table,
        },
        ComparisonOptions::for_row().ignoring_unmatched_columns(),
        None,
    );
    assert!(
        !report.mentions("Name"),
        "no report for the unmatched column may be produced: {report}"
    );
}

#[test]
fn one_sided_dataset_context_is_reported_for_relations() {
    let dataset = store_dataset();
    let table = dataset.find_table("Customers").unwrap();

    let report = Comparer::new().compare(
        Comparand::Table {
            table,
            dataset: Some(&dataset),
        },
        Comparand::Table {
            table,
            dataset: None,
        },
        ComparisonOptions::for_table(),
        None,
    );

    assert!(report.mentions(
        "Cannot compare child relations: the expected table has no containing dataset"
    ));
    assert!(report.mentions(
        "Cannot compare parent relations: the expected table has no containing dataset"
    ));
}

#[test]
fn null_actual_is_a_structural_mismatch() {
    let expected = orders_table(&[]);

    let report = Comparer::new().compare(
        Comparand::Null,
        Comparand::Table {
            table: &expected,
            dataset: None,
        },
        ComparisonOptions::for_table(),
        None,
    );

    assert_eq!(report.len(), 1);
    assert!(report.mentions("Expected table to be non-null, but found null"));
}
