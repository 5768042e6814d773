//! The relational data model compared by the engine
//!
//! All of these types are plain, caller-owned views over an existing data
//! graph. The engine only reads them for the duration of one comparison;
//! it never creates, mutates, or destroys them.

use crate::value::{DataType, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a [`Row`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RowState {
    #[default]
    Unchanged,
    Added,
    Modified,
    Deleted,
    Detached,
}

impl fmt::Display for RowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RowState::Unchanged => "Unchanged",
            RowState::Added => "Added",
            RowState::Modified => "Modified",
            RowState::Deleted => "Deleted",
            RowState::Detached => "Detached",
        };
        f.write_str(name)
    }
}

/// Which version of a row's values to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowVersion {
    Current,
    Original,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SerializationFormat {
    #[default]
    Xml,
    Binary,
}

impl fmt::Display for SerializationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializationFormat::Xml => f.write_str("Xml"),
            SerializationFormat::Binary => f.write_str("Binary"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SchemaSerializationMode {
    #[default]
    IncludeSchema,
    ExcludeSchema,
}

impl fmt::Display for SchemaSerializationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaSerializationMode::IncludeSchema => f.write_str("IncludeSchema"),
            SchemaSerializationMode::ExcludeSchema => f.write_str("ExcludeSchema"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DateTimeMode {
    Local,
    #[default]
    UnspecifiedLocal,
    Unspecified,
    Utc,
}

impl fmt::Display for DateTimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DateTimeMode::Local => "Local",
            DateTimeMode::UnspecifiedLocal => "UnspecifiedLocal",
            DateTimeMode::Unspecified => "Unspecified",
            DateTimeMode::Utc => "Utc",
        };
        f.write_str(name)
    }
}

/// Named container of tables and relations.
///
/// Table names are unique within a dataset; whether uniqueness (and lookup)
/// is case-sensitive depends on `case_sensitive`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSet {
    pub name: String,
    /// Concrete type name of the source graph this view was taken from.
    /// Typed dataset wrappers carry their own name here.
    pub type_name: String,
    pub case_sensitive: bool,
    pub enforce_constraints: bool,
    pub has_errors: bool,
    pub locale: String,
    pub namespace: String,
    pub prefix: String,
    pub remoting_format: SerializationFormat,
    pub schema_serialization_mode: SchemaSerializationMode,
    pub extended_properties: IndexMap<String, Value>,
    pub tables: Vec<Table>,
    pub relations: Vec<Relation>,
}

impl DataSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: "DataSet".to_string(),
            case_sensitive: false,
            enforce_constraints: true,
            has_errors: false,
            locale: "en-US".to_string(),
            namespace: String::new(),
            prefix: String::new(),
            remoting_format: SerializationFormat::default(),
            schema_serialization_mode: SchemaSerializationMode::default(),
            extended_properties: IndexMap::new(),
            tables: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Looks up a table by name, honoring the dataset's case sensitivity:
    /// exact match first, case-insensitive fallback when the flag is off.
    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name).or_else(|| {
            if self.case_sensitive {
                None
            } else {
                self.tables
                    .iter()
                    .find(|t| t.name.eq_ignore_ascii_case(name))
            }
        })
    }

    /// Relations in which the named table is the parent.
    pub fn child_relations_of<'a>(&'a self, table_name: &str) -> Vec<&'a Relation> {
        self.relations
            .iter()
            .filter(|r| r.parent.table == table_name)
            .collect()
    }

    /// Relations in which the named table is the child.
    pub fn parent_relations_of<'a>(&'a self, table_name: &str) -> Vec<&'a Relation> {
        self.relations
            .iter()
            .filter(|r| r.child.table == table_name)
            .collect()
    }
}

/// Named container of columns, rows, and constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub type_name: String,
    pub case_sensitive: bool,
    pub display_expression: String,
    pub has_errors: bool,
    pub locale: String,
    pub namespace: String,
    pub prefix: String,
    pub remoting_format: SerializationFormat,
    pub extended_properties: IndexMap<String, Value>,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub constraints: Vec<Constraint>,
    /// Ordered names of the primary key columns; empty when the table has
    /// no primary key.
    pub primary_key: Vec<String>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: "Table".to_string(),
            case_sensitive: false,
            display_expression: String::new(),
            has_errors: false,
            locale: "en-US".to_string(),
            namespace: String::new(),
            prefix: String::new(),
            remoting_format: SerializationFormat::default(),
            extended_properties: IndexMap::new(),
            columns: Vec::new(),
            rows: Vec::new(),
            constraints: Vec::new(),
            primary_key: Vec::new(),
        }
    }

    /// Looks up a column by name, honoring the table's case sensitivity.
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name).or_else(|| {
            if self.case_sensitive {
                None
            } else {
                self.columns
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(name))
            }
        })
    }
}

/// Typed field descriptor.
///
/// A column belongs to exactly one table, but carries no back-reference;
/// ownership context travels alongside the column during comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub allow_db_null: bool,
    pub auto_increment: bool,
    pub auto_increment_seed: i64,
    pub auto_increment_step: i64,
    pub caption: String,
    pub date_time_mode: DateTimeMode,
    pub default_value: Value,
    pub expression: String,
    pub extended_properties: IndexMap<String, Value>,
    /// `None` means unbounded.
    pub max_length: Option<usize>,
    pub namespace: String,
    pub prefix: String,
    pub read_only: bool,
    pub unique: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        let name = name.into();
        Self {
            caption: name.clone(),
            name,
            data_type,
            allow_db_null: true,
            auto_increment: false,
            auto_increment_seed: 0,
            auto_increment_step: 1,
            date_time_mode: DateTimeMode::default(),
            default_value: Value::Null,
            expression: String::new(),
            extended_properties: IndexMap::new(),
            max_length: None,
            namespace: String::new(),
            prefix: String::new(),
            read_only: false,
            unique: false,
        }
    }
}

/// Ordered mapping from column name to value, with a lifecycle state.
///
/// Modified and Deleted rows additionally carry an Original version of
/// their values. Deleted rows expose only the Original version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    pub type_name: String,
    pub state: RowState,
    pub has_errors: bool,
    pub values: IndexMap<String, Value>,
    pub original: Option<IndexMap<String, Value>>,
}

impl Row {
    pub fn new() -> Self {
        Self {
            type_name: "Row".to_string(),
            state: RowState::default(),
            has_errors: false,
            values: IndexMap::new(),
            original: None,
        }
    }

    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut row = Self::new();
        row.values = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        row
    }

    /// Reads the value of a column at the given version.
    ///
    /// Returns `None` when the version is not available for the row's
    /// state: Deleted rows have no Current version, and only Modified or
    /// Deleted rows carry an Original version.
    pub fn version(&self, column: &str, version: RowVersion) -> Option<&Value> {
        match version {
            RowVersion::Current => {
                if self.state == RowState::Deleted {
                    None
                } else {
                    self.values.get(column)
                }
            }
            RowVersion::Original => self.original.as_ref().and_then(|map| map.get(column)),
        }
    }
}

impl Default for Row {
    fn default() -> Self {
        Self::new()
    }
}

/// A reference to a column by owning-table name and column name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

/// One end (parent or child) of a [`Relation`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationEnd {
    pub table: String,
    pub columns: Vec<ColumnRef>,
    /// Auto-generated key constraint attached to this end, if any.
    pub key_constraint: Option<Constraint>,
}

impl RelationEnd {
    pub fn new(table: impl Into<String>, columns: Vec<ColumnRef>) -> Self {
        Self {
            table: table.into(),
            columns,
            key_constraint: None,
        }
    }
}

/// Named link between a parent table/column-set and a child table/column-set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    pub name: String,
    pub nested: bool,
    /// Name of the containing dataset. A name-only back-reference; the
    /// full dataset is never compared through a relation.
    pub dataset_name: Option<String>,
    pub extended_properties: IndexMap<String, Value>,
    pub parent: RelationEnd,
    pub child: RelationEnd,
}

impl Relation {
    pub fn new(name: impl Into<String>, parent: RelationEnd, child: RelationEnd) -> Self {
        Self {
            name: name.into(),
            nested: false,
            dataset_name: None,
            extended_properties: IndexMap::new(),
            parent,
            child,
        }
    }
}

/// Kind-specific payload of a [`Constraint`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    Unique {
        columns: Vec<String>,
        is_primary_key: bool,
    },
    ForeignKey {
        columns: Vec<String>,
        related_table: String,
        related_columns: Vec<String>,
    },
}

/// Named rule scoped to a table, identified by name for matching purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    pub kind: ConstraintKind,
}

impl Constraint {
    pub fn unique(name: impl Into<String>, columns: Vec<String>, is_primary_key: bool) -> Self {
        Self {
            name: name.into(),
            kind: ConstraintKind::Unique {
                columns,
                is_primary_key,
            },
        }
    }

    pub fn foreign_key(
        name: impl Into<String>,
        columns: Vec<String>,
        related_table: impl Into<String>,
        related_columns: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: ConstraintKind::ForeignKey {
                columns,
                related_table: related_table.into(),
                related_columns,
            },
        }
    }
}
