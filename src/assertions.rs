//! Fluent assertion entry points
//!
//! The assertion types wrap an optional subject and panic with the full
//! aggregated report when an expectation fails; the `try_` variants return
//! the report inside an error instead. All deep comparisons go through one
//! [`Comparer`], which owns the step plan and the selection cache.

use crate::data::{Column, DataSet, Row, Table};
use crate::error::{DataEquivError, Result};
use crate::options::ComparisonOptions;
use crate::plan::{Comparand, EquivalencyPlan};
use crate::report::{phrase_reason, ComparisonReport};
use crate::selection::SelectionCache;

/// Owns the equivalency plan and the member-selection cache for any number
/// of comparisons. The default comparer has dataset support registered.
pub struct Comparer {
    plan: EquivalencyPlan,
    cache: SelectionCache,
}

impl Default for Comparer {
    fn default() -> Self {
        let mut plan = EquivalencyPlan::new();
        plan.add_dataset_support();

        Self {
            plan,
            cache: SelectionCache::new(),
        }
    }
}

impl Comparer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plan(&self) -> &EquivalencyPlan {
        &self.plan
    }

    /// Mutable access for registering custom steps before comparing.
    pub fn plan_mut(&mut self) -> &mut EquivalencyPlan {
        &mut self.plan
    }

    /// Runs one comparison and returns everything it found.
    pub fn compare(
        &self,
        actual: Comparand<'_>,
        expected: Comparand<'_>,
        options: ComparisonOptions,
        because: Option<String>,
    ) -> ComparisonReport {
        self.plan.compare(actual, expected, options, &self.cache, because)
    }
}

fn amend(message: String, because: &Option<String>) -> String {
    match because {
        Some(reason) => format!("{message} {}", phrase_reason(reason)),
        None => message,
    }
}

fn check(report: ComparisonReport) -> Result<()> {
    if report.is_equivalent() {
        Ok(())
    } else {
        Err(DataEquivError::not_equivalent(report))
    }
}

/// Assertions on a dataset, or on the absence of one.
pub struct DataSetAssertions<'a> {
    subject: Option<&'a DataSet>,
    comparer: Comparer,
    because: Option<String>,
}

impl<'a> DataSetAssertions<'a> {
    pub fn new(subject: Option<&'a DataSet>) -> Self {
        Self {
            subject,
            comparer: Comparer::default(),
            because: None,
        }
    }

    /// Replaces the default comparer, e.g. with one carrying custom steps.
    pub fn using(mut self, comparer: Comparer) -> Self {
        self.comparer = comparer;
        self
    }

    /// Attaches a reason that is appended to every failure this assertion
    /// produces.
    pub fn because(mut self, reason: impl Into<String>) -> Self {
        self.because = Some(reason.into());
        self
    }

    fn subject(&self) -> &'a DataSet {
        match self.subject {
            Some(dataset) => dataset,
            None => panic!(
                "{}",
                amend("Expected a dataset, but found none".to_string(), &self.because)
            ),
        }
    }

    pub fn have_table_count(self, expected: usize) -> Self {
        let actual = self.subject().tables.len();

        if actual != expected {
            panic!(
                "{}",
                amend(
                    format!(
                        "Expected dataset to contain {expected} table(s), but found {actual} table(s)"
                    ),
                    &self.because
                )
            );
        }

        self
    }

    /// Asserts the table exists and hands it back for further drilling.
    pub fn have_table(&self, name: &str) -> &'a Table {
        match self.subject().find_table(name) {
            Some(table) => table,
            None => panic!(
                "{}",
                amend(
                    format!("Expected dataset to contain table {name:?}, but did not find it"),
                    &self.because
                )
            ),
        }
    }

    pub fn have_tables<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let subject = self.subject();

        let missing: Vec<String> = names
            .into_iter()
            .filter(|name| subject.find_table(name.as_ref()).is_none())
            .map(|name| name.as_ref().to_string())
            .collect();

        if !missing.is_empty() {
            panic!(
                "{}",
                amend(
                    format!("Expected dataset to contain table(s) {missing:?}, but did not find them"),
                    &self.because
                )
            );
        }

        self
    }

    pub fn be_equivalent_to(self, expected: &DataSet) -> Self {
        if let Err(error) = self.try_be_equivalent_to(expected) {
            panic!("{error}");
        }

        self
    }

    pub fn be_equivalent_to_with(
        self,
        expected: &DataSet,
        configure: impl FnOnce(ComparisonOptions) -> ComparisonOptions,
    ) -> Self {
        if let Err(error) = self.try_be_equivalent_to_with(expected, configure) {
            panic!("{error}");
        }

        self
    }

    pub fn try_be_equivalent_to(&self, expected: &DataSet) -> Result<()> {
        self.try_be_equivalent_to_with(expected, |options| options)
    }

    pub fn try_be_equivalent_to_with(
        &self,
        expected: &DataSet,
        configure: impl FnOnce(ComparisonOptions) -> ComparisonOptions,
    ) -> Result<()> {
        let options = configure(ComparisonOptions::for_dataset());

        let actual = match self.subject {
            Some(dataset) => Comparand::Dataset(dataset),
            None => Comparand::Null,
        };

        check(self.comparer.compare(
            actual,
            Comparand::Dataset(expected),
            options,
            self.because.clone(),
        ))
    }
}

/// Assertions on a single table. Relation comparison needs the containing
/// datasets; attach them with [`TableAssertions::within`] when relations
/// matter.
pub struct TableAssertions<'a> {
    subject: Option<&'a Table>,
    dataset: Option<&'a DataSet>,
    expected_dataset: Option<&'a DataSet>,
    comparer: Comparer,
    because: Option<String>,
}

impl<'a> TableAssertions<'a> {
    pub fn new(subject: Option<&'a Table>) -> Self {
        Self {
            subject,
            dataset: None,
            expected_dataset: None,
            comparer: Comparer::default(),
            because: None,
        }
    }

    /// Attaches both tables' containing datasets, so parent and child
    /// relations take part in the comparison.
    pub fn within(mut self, dataset: &'a DataSet, expected_dataset: &'a DataSet) -> Self {
        self.dataset = Some(dataset);
        self.expected_dataset = Some(expected_dataset);
        self
    }

    pub fn using(mut self, comparer: Comparer) -> Self {
        self.comparer = comparer;
        self
    }

    pub fn because(mut self, reason: impl Into<String>) -> Self {
        self.because = Some(reason.into());
        self
    }

    fn subject(&self) -> &'a Table {
        match self.subject {
            Some(table) => table,
            None => panic!(
                "{}",
                amend("Expected a table, but found none".to_string(), &self.because)
            ),
        }
    }

    pub fn have_row_count(self, expected: usize) -> Self {
        let actual = self.subject().rows.len();

        if actual != expected {
            panic!(
                "{}",
                amend(
                    format!("Expected table to contain {expected} row(s), but found {actual} row(s)"),
                    &self.because
                )
            );
        }

        self
    }

    pub fn have_column(&self, name: &str) -> &'a Column {
        match self.subject().find_column(name) {
            Some(column) => column,
            None => panic!(
                "{}",
                amend(
                    format!("Expected table to contain column {name:?}, but did not find it"),
                    &self.because
                )
            ),
        }
    }

    pub fn have_columns<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let subject = self.subject();

        let missing: Vec<String> = names
            .into_iter()
            .filter(|name| subject.find_column(name.as_ref()).is_none())
            .map(|name| name.as_ref().to_string())
            .collect();

        if !missing.is_empty() {
            panic!(
                "{}",
                amend(
                    format!("Expected table to contain column(s) {missing:?}, but did not find them"),
                    &self.because
                )
            );
        }

        self
    }

    pub fn be_equivalent_to(self, expected: &Table) -> Self {
        if let Err(error) = self.try_be_equivalent_to(expected) {
            panic!("{error}");
        }

        self
    }

    pub fn be_equivalent_to_with(
        self,
        expected: &Table,
        configure: impl FnOnce(ComparisonOptions) -> ComparisonOptions,
    ) -> Self {
        if let Err(error) = self.try_be_equivalent_to_with(expected, configure) {
            panic!("{error}");
        }

        self
    }

    pub fn try_be_equivalent_to(&self, expected: &Table) -> Result<()> {
        self.try_be_equivalent_to_with(expected, |options| options)
    }

    pub fn try_be_equivalent_to_with(
        &self,
        expected: &Table,
        configure: impl FnOnce(ComparisonOptions) -> ComparisonOptions,
    ) -> Result<()> {
        let options = configure(ComparisonOptions::for_table());

        let actual = match self.subject {
            Some(table) => Comparand::Table {
                table,
                dataset: self.dataset,
            },
            None => Comparand::Null,
        };

        check(self.comparer.compare(
            actual,
            Comparand::Table {
                table: expected,
                dataset: self.expected_dataset,
            },
            options,
            self.because.clone(),
        ))
    }
}

/// Assertions on a single row. Rows carry no schema of their own, so the
/// owning table travels with the subject.
pub struct RowAssertions<'a> {
    subject: Option<&'a Row>,
    table: &'a Table,
    comparer: Comparer,
    because: Option<String>,
}

impl<'a> RowAssertions<'a> {
    pub fn new(subject: Option<&'a Row>, table: &'a Table) -> Self {
        Self {
            subject,
            table,
            comparer: Comparer::default(),
            because: None,
        }
    }

    pub fn using(mut self, comparer: Comparer) -> Self {
        self.comparer = comparer;
        self
    }

    pub fn because(mut self, reason: impl Into<String>) -> Self {
        self.because = Some(reason.into());
        self
    }

    pub fn be_equivalent_to(self, expected: &Row, expected_table: &Table) -> Self {
        if let Err(error) = self.try_be_equivalent_to(expected, expected_table) {
            panic!("{error}");
        }

        self
    }

    pub fn be_equivalent_to_with(
        self,
        expected: &Row,
        expected_table: &Table,
        configure: impl FnOnce(ComparisonOptions) -> ComparisonOptions,
    ) -> Self {
        if let Err(error) = self.try_be_equivalent_to_with(expected, expected_table, configure) {
            panic!("{error}");
        }

        self
    }

    pub fn try_be_equivalent_to(&self, expected: &Row, expected_table: &Table) -> Result<()> {
        self.try_be_equivalent_to_with(expected, expected_table, |options| options)
    }

    pub fn try_be_equivalent_to_with(
        &self,
        expected: &Row,
        expected_table: &Table,
        configure: impl FnOnce(ComparisonOptions) -> ComparisonOptions,
    ) -> Result<()> {
        let options = configure(ComparisonOptions::for_row());

        let actual = match self.subject {
            Some(row) => Comparand::Row {
                row,
                table: self.table,
            },
            None => Comparand::Null,
        };

        check(self.comparer.compare(
            actual,
            Comparand::Row {
                row: expected,
                table: expected_table,
            },
            options,
            self.because.clone(),
        ))
    }
}

/// Assertions on a single column.
pub struct ColumnAssertions<'a> {
    subject: Option<&'a Column>,
    table: Option<&'a str>,
    comparer: Comparer,
    because: Option<String>,
}

impl<'a> ColumnAssertions<'a> {
    pub fn new(subject: Option<&'a Column>) -> Self {
        Self {
            subject,
            table: None,
            comparer: Comparer::default(),
            because: None,
        }
    }

    /// Names the owning table, so per-table column exclusions apply.
    pub fn in_table(mut self, table: &'a str) -> Self {
        self.table = Some(table);
        self
    }

    pub fn using(mut self, comparer: Comparer) -> Self {
        self.comparer = comparer;
        self
    }

    pub fn because(mut self, reason: impl Into<String>) -> Self {
        self.because = Some(reason.into());
        self
    }

    pub fn be_equivalent_to(self, expected: &Column) -> Self {
        if let Err(error) = self.try_be_equivalent_to(expected) {
            panic!("{error}");
        }

        self
    }

    pub fn be_equivalent_to_with(
        self,
        expected: &Column,
        configure: impl FnOnce(ComparisonOptions) -> ComparisonOptions,
    ) -> Self {
        if let Err(error) = self.try_be_equivalent_to_with(expected, configure) {
            panic!("{error}");
        }

        self
    }

    pub fn try_be_equivalent_to(&self, expected: &Column) -> Result<()> {
        self.try_be_equivalent_to_with(expected, |options| options)
    }

    pub fn try_be_equivalent_to_with(
        &self,
        expected: &Column,
        configure: impl FnOnce(ComparisonOptions) -> ComparisonOptions,
    ) -> Result<()> {
        let options = configure(ComparisonOptions::for_column());

        let actual = match self.subject {
            Some(column) => Comparand::Column {
                column,
                table: self.table,
            },
            None => Comparand::Null,
        };

        check(self.comparer.compare(
            actual,
            Comparand::Column {
                column: expected,
                table: None,
            },
            options,
            self.because.clone(),
        ))
    }
}

impl DataSet {
    /// Starts a fluent assertion chain over this dataset.
    pub fn should(&self) -> DataSetAssertions<'_> {
        DataSetAssertions::new(Some(self))
    }
}

impl Table {
    /// Starts a fluent assertion chain over this table.
    pub fn should(&self) -> TableAssertions<'_> {
        TableAssertions::new(Some(self))
    }
}
