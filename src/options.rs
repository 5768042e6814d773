//! Per-scope comparison options
//!
//! One options value is created per top-level comparison call and consulted
//! read-only during the walk. The only scope transition that changes the
//! effective options is dataset→table, which derives a fresh value via
//! [`ComparisonOptions::derive_for_tables`] instead of mutating in place.

use crate::error::DataEquivError;
use crate::plan::NodeKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OPTIONS_ID: AtomicU64 = AtomicU64::new(1);

/// Which kind of entity a top-level comparison was started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    Dataset,
    Table,
    Row,
    Column,
}

/// How rows of two row collections are paired before per-row comparison.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RowMatchMode {
    /// Pair rows by position.
    #[default]
    Index,
    /// Pair rows by extracted primary-key values.
    PrimaryKey,
}

impl fmt::Display for RowMatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowMatchMode::Index => f.write_str("index"),
            RowMatchMode::PrimaryKey => f.write_str("primary-key"),
        }
    }
}

impl FromStr for RowMatchMode {
    type Err = DataEquivError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "index" => Ok(RowMatchMode::Index),
            "primary-key" | "primary_key" => Ok(RowMatchMode::PrimaryKey),
            other => Err(DataEquivError::config(format!(
                "unknown row match mode: {other}"
            ))),
        }
    }
}

/// The settings shared by every option scope.
///
/// Name matching against this configuration (excluded tables, excluded
/// columns, excluded members) is always case-sensitive, independent of the
/// data's own `case_sensitive` flags.
#[derive(Debug, Clone)]
pub struct OptionsCore {
    id: u64,
    pub allow_mismatched_types: bool,
    pub ignore_unmatched_columns: bool,
    pub exclude_original_data: bool,
    pub row_match_mode: RowMatchMode,
    pub excluded_tables: BTreeSet<String>,
    pub excluded_columns: BTreeSet<(String, String)>,
    pub excluded_columns_all_tables: BTreeSet<String>,
    pub excluded_members: BTreeMap<NodeKind, BTreeSet<String>>,
}

impl OptionsCore {
    fn new() -> Self {
        Self {
            id: NEXT_OPTIONS_ID.fetch_add(1, Ordering::Relaxed),
            allow_mismatched_types: false,
            ignore_unmatched_columns: false,
            exclude_original_data: false,
            row_match_mode: RowMatchMode::default(),
            excluded_tables: BTreeSet::new(),
            excluded_columns: BTreeSet::new(),
            excluded_columns_all_tables: BTreeSet::new(),
            excluded_members: BTreeMap::new(),
        }
    }

    /// Unique identity of this options value, used as a cache key part.
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Comparison configuration, one variant per starting scope.
#[derive(Debug, Clone)]
pub struct ComparisonOptions {
    scope: Scope,
    core: OptionsCore,
}

impl ComparisonOptions {
    pub fn for_dataset() -> Self {
        Self {
            scope: Scope::Dataset,
            core: OptionsCore::new(),
        }
    }

    pub fn for_table() -> Self {
        Self {
            scope: Scope::Table,
            core: OptionsCore::new(),
        }
    }

    pub fn for_row() -> Self {
        Self {
            scope: Scope::Row,
            core: OptionsCore::new(),
        }
    }

    pub fn for_column() -> Self {
        Self {
            scope: Scope::Column,
            core: OptionsCore::new(),
        }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn core(&self) -> &OptionsCore {
        &self.core
    }

    // Fluent builders, consumed before the comparison starts.

    pub fn allowing_mismatched_types(mut self) -> Self {
        self.core.allow_mismatched_types = true;
        self
    }

    pub fn ignoring_unmatched_columns(mut self) -> Self {
        self.core.ignore_unmatched_columns = true;
        self
    }

    pub fn excluding_original_data(mut self) -> Self {
        self.core.exclude_original_data = true;
        self
    }

    pub fn with_row_match_mode(mut self, mode: RowMatchMode) -> Self {
        self.core.row_match_mode = mode;
        self
    }

    pub fn excluding_table(mut self, table: impl Into<String>) -> Self {
        self.core.excluded_tables.insert(table.into());
        self
    }

    pub fn excluding_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.core
            .excluded_tables
            .extend(tables.into_iter().map(Into::into));
        self
    }

    /// Excludes one column of one table from comparison.
    pub fn excluding_column(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.core
            .excluded_columns
            .insert((table.into(), column.into()));
        self
    }

    /// Excludes every column with this name, in every table.
    pub fn excluding_column_in_all_tables(mut self, column: impl Into<String>) -> Self {
        self.core.excluded_columns_all_tables.insert(column.into());
        self
    }

    /// Deselects a scalar or collection member of one node kind.
    pub fn excluding_member(mut self, kind: NodeKind, member: impl Into<String>) -> Self {
        self.core
            .excluded_members
            .entry(kind)
            .or_default()
            .insert(member.into());
        self
    }

    // Read-side queries used by the steps.

    fn applies_at(&self, consulted: &[Scope]) -> bool {
        consulted.contains(&self.scope)
    }

    pub fn allows_mismatched_types(&self, consulted: &[Scope]) -> bool {
        self.applies_at(consulted) && self.core.allow_mismatched_types
    }

    pub fn ignores_unmatched_columns(&self, consulted: &[Scope]) -> bool {
        self.applies_at(consulted) && self.core.ignore_unmatched_columns
    }

    pub fn excludes_original_data(&self, consulted: &[Scope]) -> bool {
        self.applies_at(consulted) && self.core.exclude_original_data
    }

    pub fn should_exclude_table(&self, table: &str) -> bool {
        self.scope == Scope::Dataset && self.core.excluded_tables.contains(table)
    }

    pub fn should_exclude_column(&self, consulted: &[Scope], table: &str, column: &str) -> bool {
        if !self.applies_at(consulted) {
            return false;
        }

        self.core.excluded_columns_all_tables.contains(column)
            || self
                .core
                .excluded_columns
                .contains(&(table.to_string(), column.to_string()))
    }

    /// The active row matching strategy. Only dataset- and table-scoped
    /// options carry one; other scopes pair by index.
    pub fn row_match_mode(&self) -> RowMatchMode {
        match self.scope {
            Scope::Dataset | Scope::Table => self.core.row_match_mode,
            _ => RowMatchMode::Index,
        }
    }

    /// Whether a member of the given node kind is selected for comparison.
    pub fn is_member_selected(&self, kind: NodeKind, member: &str) -> bool {
        !self
            .core
            .excluded_members
            .get(&kind)
            .is_some_and(|set| set.contains(member))
    }

    /// Derives the options nested table comparisons run under.
    ///
    /// When the caller deselected the dataset's own `case_sensitive` or
    /// `locale` members, those members are deselected on every nested table
    /// as well, so a difference that is really an inherited dataset-level
    /// setting is not reported once per table. Returns a new value; the
    /// original is left untouched.
    pub fn derive_for_tables(&self) -> ComparisonOptions {
        if self.scope != Scope::Dataset {
            return self.clone();
        }

        let exclude_case_sensitive = !self.is_member_selected(NodeKind::Dataset, "case_sensitive");
        let exclude_locale = !self.is_member_selected(NodeKind::Dataset, "locale");

        if !exclude_case_sensitive && !exclude_locale {
            return self.clone();
        }

        let mut derived = self.clone();
        derived.core.id = NEXT_OPTIONS_ID.fetch_add(1, Ordering::Relaxed);

        let table_members = derived
            .core
            .excluded_members
            .entry(NodeKind::Table)
            .or_default();

        if exclude_case_sensitive {
            table_members.insert("case_sensitive".to_string());
        }

        if exclude_locale {
            table_members.insert("locale".to_string());
        }

        derived
    }
}
