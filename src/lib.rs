//! Deep equivalence comparison for relational dataset graphs.
//!
//! `dataequiv` compares two graph-shaped tabular structures, an actual and
//! an expected one: a [`DataSet`] containing tables, which contain columns,
//! rows, constraints, and relations between tables. A comparison walks both
//! graphs depth-first, applies type-specific semantics at each node kind,
//! and aggregates every independent mismatch into one path-qualified
//! [`ComparisonReport`] instead of failing fast.
//!
//! Rows can be paired positionally (the default) or by primary-key values,
//! and comparison is configurable per scope: tables, columns, and individual
//! members can be excluded, type mismatches tolerated, and original row
//! versions skipped.
//!
//! ```
//! use dataequiv::{Column, DataSet, DataType, Row, Table};
//!
//! let mut table = Table::new("Orders");
//! table.columns.push(Column::new("Id", DataType::Int));
//! table.rows.push(Row::with_values([("Id", 1)]));
//!
//! let mut actual = DataSet::new("orders");
//! actual.tables.push(table);
//! let expected = actual.clone();
//!
//! actual.should().be_equivalent_to(&expected);
//! ```

pub mod assertions;
pub mod data;
pub mod error;
pub mod options;
pub mod plan;
pub mod report;
pub mod row_matching;
pub mod selection;
pub mod steps;
pub mod value;

pub use assertions::{
    ColumnAssertions, Comparer, DataSetAssertions, RowAssertions, TableAssertions,
};
pub use data::{
    Column, ColumnRef, Constraint, ConstraintKind, DataSet, DateTimeMode, Relation, RelationEnd,
    Row, RowState, RowVersion, SchemaSerializationMode, SerializationFormat, Table,
};
pub use error::{DataEquivError, Result};
pub use options::{ComparisonOptions, RowMatchMode, Scope};
pub use plan::{Comparand, EquivalencyPlan, EquivalencyStep, NodeKind, WalkContext};
pub use report::{ComparisonReport, Failure};
pub use row_matching::CompoundKey;
pub use selection::SelectionCache;
pub use value::{DataType, Value};
