//! Common test fixtures: small relational datasets built by hand.

use dataequiv::{
    Column, ColumnRef, Comparand, Comparer, ComparisonOptions, ComparisonReport, Constraint,
    DataSet, DataType, Relation, RelationEnd, Row, Table, Value,
};
use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

/// Initializes test logging once; respects `RUST_LOG`.
pub fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// An "Orders" table with an Id:int primary key and a float Amount column.
pub fn orders_table(rows: &[(i64, f64)]) -> Table {
    let mut table = Table::new("Orders");

    let mut id = Column::new("Id", DataType::Int);
    id.allow_db_null = false;
    table.columns.push(id);
    table.columns.push(Column::new("Amount", DataType::Float));
    table.primary_key = vec!["Id".to_string()];

    for (id, amount) in rows {
        table.rows.push(Row::with_values([
            ("Id", Value::from(*id)),
            ("Amount", Value::from(*amount)),
        ]));
    }

    table
}

/// A one-table dataset wrapping [`orders_table`].
pub fn orders_dataset(rows: &[(i64, f64)]) -> DataSet {
    let mut dataset = DataSet::new("orders");
    dataset.tables.push(orders_table(rows));
    dataset
}

/// Two related tables with constraints and a relation between them.
pub fn store_dataset() -> DataSet {
    let mut customers = Table::new("Customers");
    customers.columns.push(Column::new("Id", DataType::Int));
    customers.columns.push(Column::new("Name", DataType::Str));
    customers.primary_key = vec!["Id".to_string()];
    customers.constraints.push(Constraint::unique(
        "PK_Customers",
        vec!["Id".to_string()],
        true,
    ));
    customers.rows.push(Row::with_values([
        ("Id", Value::from(1)),
        ("Name", Value::from("Ada")),
    ]));

    let mut orders = Table::new("Orders");
    orders.columns.push(Column::new("Id", DataType::Int));
    orders.columns.push(Column::new("CustomerId", DataType::Int));
    orders.primary_key = vec!["Id".to_string()];
    orders.constraints.push(Constraint::foreign_key(
        "FK_Orders_Customers",
        vec!["CustomerId".to_string()],
        "Customers",
        vec!["Id".to_string()],
    ));
    orders.rows.push(Row::with_values([
        ("Id", Value::from(10)),
        ("CustomerId", Value::from(1)),
    ]));

    let mut relation = Relation::new(
        "Customers_Orders",
        RelationEnd::new("Customers", vec![ColumnRef::new("Customers", "Id")]),
        RelationEnd::new("Orders", vec![ColumnRef::new("Orders", "CustomerId")]),
    );
    relation.dataset_name = Some("store".to_string());

    let mut dataset = DataSet::new("store");
    dataset.tables.push(customers);
    dataset.tables.push(orders);
    dataset.relations.push(relation);
    dataset
}

/// Runs one dataset comparison and returns the aggregated report.
pub fn compare_datasets(
    actual: &DataSet,
    expected: &DataSet,
    options: ComparisonOptions,
) -> ComparisonReport {
    Comparer::new().compare(
        Comparand::Dataset(actual),
        Comparand::Dataset(expected),
        options,
        None,
    )
}

/// Sorted `(path, message)` pairs, for order-insensitive report comparison.
pub fn failure_pairs(report: &ComparisonReport) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = report
        .iter()
        .map(|f| (f.path.clone(), f.message.clone()))
        .collect();
    pairs.sort();
    pairs
}
