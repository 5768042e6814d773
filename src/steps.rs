//! Node-kind comparison steps
//!
//! One step per node kind. Every step follows the same guard structure:
//! check the expected side's kind, check the actual side for null or a
//! kind mismatch, then compare selected scalar members directly and
//! delegate nested collections back to the walker.

use crate::data::{Constraint, ConstraintKind, DataSet, Relation, RelationEnd, Row, RowState, RowVersion, Table};
use crate::options::Scope;
use crate::plan::{Comparand, EquivalencyStep, NodeKind, WalkContext};
use std::fmt::Debug;

/// The only members of a column that are ever compared. The owning-table
/// back-reference is deliberately absent; comparing it would recurse
/// through the table/column cycle forever.
pub(crate) const COLUMN_CANDIDATE_MEMBERS: &[&str] = &[
    "allow_db_null",
    "auto_increment",
    "auto_increment_seed",
    "auto_increment_step",
    "caption",
    "name",
    "data_type",
    "date_time_mode",
    "default_value",
    "expression",
    "extended_properties",
    "max_length",
    "namespace",
    "prefix",
    "read_only",
    "unique",
];

/// Union of two name sequences, preserving expected-side order and
/// appending actual-only names afterwards.
fn name_union<I, J>(expected: I, actual: J) -> Vec<String>
where
    I: IntoIterator<Item = String>,
    J: IntoIterator<Item = String>,
{
    let mut names: Vec<String> = expected.into_iter().collect();

    for name in actual {
        if !names.contains(&name) {
            names.push(name);
        }
    }

    names
}

fn compare_scalar<T: PartialEq + Debug>(
    ctx: &mut WalkContext<'_>,
    entity: &str,
    member: &str,
    actual: &T,
    expected: &T,
) {
    if actual != expected {
        ctx.fail(format!(
            "Expected {entity} to have {member} value of {expected:?}, but found {actual:?} instead"
        ));
    }
}

fn compare_relations_by_name(
    ctx: &mut WalkContext<'_>,
    actual: &[&Relation],
    expected: &[&Relation],
    owner: &str,
    member: &str,
) {
    let names = name_union(
        expected.iter().map(|r| r.name.clone()),
        actual.iter().map(|r| r.name.clone()),
    );

    for name in names {
        let subject = actual.iter().find(|r| r.name == name);
        let expectation = expected.iter().find(|r| r.name == name);

        match (subject, expectation) {
            (Some(subject), Some(expectation)) => {
                ctx.assert_equivalency_of(
                    &Comparand::Relation(subject),
                    &Comparand::Relation(expectation),
                    Some(&format!("{member}[{name}]")),
                );
            }
            (None, Some(_)) => {
                ctx.fail(format!(
                    "Expected {owner} to contain relation {name:?}, but did not find it"
                ));
            }
            (Some(_), None) => {
                ctx.fail(format!("Found unexpected relation {name:?}"));
            }
            (None, None) => unreachable!("name came from one of the relation lists"),
        }
    }
}

fn constraint_kind_name(kind: &ConstraintKind) -> &'static str {
    match kind {
        ConstraintKind::Unique { .. } => "a unique constraint",
        ConstraintKind::ForeignKey { .. } => "a foreign-key constraint",
    }
}

/// Compares two constraints that were matched by name.
fn compare_constraint(ctx: &mut WalkContext<'_>, subject: &Constraint, expectation: &Constraint) {
    if subject.name != expectation.name {
        ctx.fail(format!(
            "Expected constraint to be named {:?}, but found {:?} instead",
            expectation.name, subject.name
        ));
    }

    match (&subject.kind, &expectation.kind) {
        (
            ConstraintKind::Unique {
                columns: actual_columns,
                is_primary_key: actual_pk,
            },
            ConstraintKind::Unique {
                columns: expected_columns,
                is_primary_key: expected_pk,
            },
        ) => {
            if actual_columns != expected_columns {
                ctx.fail(format!(
                    "Expected unique constraint to cover column(s) {expected_columns:?}, but found {actual_columns:?}"
                ));
            }

            compare_scalar(ctx, "constraint", "is_primary_key", actual_pk, expected_pk);
        }
        (
            ConstraintKind::ForeignKey {
                columns: actual_columns,
                related_table: actual_table,
                related_columns: actual_related,
            },
            ConstraintKind::ForeignKey {
                columns: expected_columns,
                related_table: expected_table,
                related_columns: expected_related,
            },
        ) => {
            if actual_columns != expected_columns {
                ctx.fail(format!(
                    "Expected foreign-key constraint to cover column(s) {expected_columns:?}, but found {actual_columns:?}"
                ));
            }

            compare_scalar(ctx, "constraint", "related_table", actual_table, expected_table);

            if actual_related != expected_related {
                ctx.fail(format!(
                    "Expected foreign-key constraint to reference column(s) {expected_related:?}, but found {actual_related:?}"
                ));
            }
        }
        (actual_kind, expected_kind) => {
            ctx.fail(format!(
                "Expected {}, but found {}",
                constraint_kind_name(expected_kind),
                constraint_kind_name(actual_kind)
            ));
        }
    }
}

pub struct DatasetStep;

impl EquivalencyStep for DatasetStep {
    fn kind(&self) -> NodeKind {
        NodeKind::Dataset
    }

    fn handle(&self, actual: &Comparand<'_>, expected: &Comparand<'_>, ctx: &mut WalkContext<'_>) {
        let expectation = match expected {
            Comparand::Dataset(dataset) => *dataset,
            _ => {
                if !actual.is_null() {
                    ctx.fail("Expected dataset value to be null, but found one");
                }
                return;
            }
        };

        let subject = match actual {
            Comparand::Dataset(dataset) => *dataset,
            Comparand::Null => {
                ctx.fail("Expected dataset to be non-null, but found null");
                return;
            }
            other => {
                ctx.fail(format!("Expected a dataset, but found {}", other.describe()));
                return;
            }
        };

        if !ctx.options().allows_mismatched_types(&[Scope::Dataset])
            && subject.type_name != expectation.type_name
        {
            ctx.fail(format!(
                "Expected dataset to be of type {:?}, but found {:?}",
                expectation.type_name, subject.type_name
            ));
        }

        self.compare_scalar_properties(subject, expectation, ctx);
        self.compare_collections(subject, expectation, ctx);
        self.compare_tables(subject, expectation, ctx);
    }
}

impl DatasetStep {
    fn compare_scalar_properties(
        &self,
        subject: &DataSet,
        expectation: &DataSet,
        ctx: &mut WalkContext<'_>,
    ) {
        let selected = |ctx: &WalkContext<'_>, member: &str| {
            ctx.options().is_member_selected(NodeKind::Dataset, member)
        };

        if selected(ctx, "name") && subject.name != expectation.name {
            ctx.fail(format!(
                "Expected dataset to have name {:?}, but found {:?} instead",
                expectation.name, subject.name
            ));
        }

        if selected(ctx, "case_sensitive") {
            compare_scalar(
                ctx,
                "dataset",
                "case_sensitive",
                &subject.case_sensitive,
                &expectation.case_sensitive,
            );
        }

        if selected(ctx, "enforce_constraints") {
            compare_scalar(
                ctx,
                "dataset",
                "enforce_constraints",
                &subject.enforce_constraints,
                &expectation.enforce_constraints,
            );
        }

        if selected(ctx, "has_errors") {
            compare_scalar(
                ctx,
                "dataset",
                "has_errors",
                &subject.has_errors,
                &expectation.has_errors,
            );
        }

        if selected(ctx, "locale") {
            compare_scalar(ctx, "dataset", "locale", &subject.locale, &expectation.locale);
        }

        if selected(ctx, "namespace") {
            compare_scalar(
                ctx,
                "dataset",
                "namespace",
                &subject.namespace,
                &expectation.namespace,
            );
        }

        if selected(ctx, "prefix") {
            compare_scalar(ctx, "dataset", "prefix", &subject.prefix, &expectation.prefix);
        }

        if selected(ctx, "remoting_format") {
            compare_scalar(
                ctx,
                "dataset",
                "remoting_format",
                &subject.remoting_format,
                &expectation.remoting_format,
            );
        }

        if selected(ctx, "schema_serialization_mode") {
            compare_scalar(
                ctx,
                "dataset",
                "schema_serialization_mode",
                &subject.schema_serialization_mode,
                &expectation.schema_serialization_mode,
            );
        }
    }

    fn compare_collections(
        &self,
        subject: &DataSet,
        expectation: &DataSet,
        ctx: &mut WalkContext<'_>,
    ) {
        if ctx
            .options()
            .is_member_selected(NodeKind::Dataset, "extended_properties")
        {
            ctx.assert_equivalency_of(
                &Comparand::Properties(&subject.extended_properties),
                &Comparand::Properties(&expectation.extended_properties),
                Some("extended_properties"),
            );
        }

        if ctx.options().is_member_selected(NodeKind::Dataset, "relations") {
            let actual: Vec<&Relation> = subject.relations.iter().collect();
            let expected: Vec<&Relation> = expectation.relations.iter().collect();
            compare_relations_by_name(ctx, &actual, &expected, "dataset", "relations");
        }
    }

    fn compare_tables(&self, subject: &DataSet, expectation: &DataSet, ctx: &mut WalkContext<'_>) {
        if !ctx.options().is_member_selected(NodeKind::Dataset, "tables") {
            return;
        }

        if subject.tables.len() != expectation.tables.len() {
            // further table comparison is meaningless
            ctx.fail(format!(
                "Expected dataset to contain {} table(s), but found {} table(s)",
                expectation.tables.len(),
                subject.tables.len()
            ));
            return;
        }

        let derived = ctx.options().derive_for_tables();
        let saved = ctx.swap_options(derived);

        let names = name_union(
            expectation.tables.iter().map(|t| t.name.clone()),
            subject.tables.iter().map(|t| t.name.clone()),
        );

        for name in names {
            if ctx.options().should_exclude_table(&name) {
                continue;
            }

            let subject_table = subject.find_table(&name);
            let expectation_table = expectation.find_table(&name);

            match (subject_table, expectation_table) {
                (Some(subject_table), Some(expectation_table)) => {
                    ctx.assert_equivalency_of(
                        &Comparand::Table {
                            table: subject_table,
                            dataset: Some(subject),
                        },
                        &Comparand::Table {
                            table: expectation_table,
                            dataset: Some(expectation),
                        },
                        Some(&format!("tables[{name}]")),
                    );
                }
                (None, Some(_)) => {
                    ctx.fail(format!(
                        "Expected dataset to contain table {name:?}, but did not find it"
                    ));
                }
                (Some(_), None) => {
                    ctx.fail(format!("Found unexpected table {name:?}"));
                }
                (None, None) => unreachable!("name came from one of the table lists"),
            }
        }

        let _ = ctx.swap_options(saved);
    }
}

pub struct TableStep;

impl EquivalencyStep for TableStep {
    fn kind(&self) -> NodeKind {
        NodeKind::Table
    }

    fn handle(&self, actual: &Comparand<'_>, expected: &Comparand<'_>, ctx: &mut WalkContext<'_>) {
        let (expectation, expectation_dataset) = match expected {
            Comparand::Table { table, dataset } => (*table, *dataset),
            _ => {
                if !actual.is_null() {
                    ctx.fail("Expected table value to be null, but found one");
                }
                return;
            }
        };

        let (subject, subject_dataset) = match actual {
            Comparand::Table { table, dataset } => (*table, *dataset),
            Comparand::Null => {
                ctx.fail("Expected table to be non-null, but found null");
                return;
            }
            other => {
                ctx.fail(format!("Expected a table, but found {}", other.describe()));
                return;
            }
        };

        if !ctx
            .options()
            .allows_mismatched_types(&[Scope::Dataset, Scope::Table])
            && subject.type_name != expectation.type_name
        {
            ctx.fail(format!(
                "Expected table to be of type {:?}, but found {:?}",
                expectation.type_name, subject.type_name
            ));
        }

        self.compare_scalar_properties(subject, expectation, ctx);
        self.compare_collections(subject, subject_dataset, expectation, expectation_dataset, ctx);
    }
}

impl TableStep {
    fn compare_scalar_properties(
        &self,
        subject: &Table,
        expectation: &Table,
        ctx: &mut WalkContext<'_>,
    ) {
        let selected = |ctx: &WalkContext<'_>, member: &str| {
            ctx.options().is_member_selected(NodeKind::Table, member)
        };

        if selected(ctx, "name") && subject.name != expectation.name {
            ctx.fail(format!(
                "Expected table to have name {:?}, but found {:?} instead",
                expectation.name, subject.name
            ));
        }

        if selected(ctx, "case_sensitive") {
            compare_scalar(
                ctx,
                "table",
                "case_sensitive",
                &subject.case_sensitive,
                &expectation.case_sensitive,
            );
        }

        if selected(ctx, "display_expression") {
            compare_scalar(
                ctx,
                "table",
                "display_expression",
                &subject.display_expression,
                &expectation.display_expression,
            );
        }

        if selected(ctx, "has_errors") {
            compare_scalar(
                ctx,
                "table",
                "has_errors",
                &subject.has_errors,
                &expectation.has_errors,
            );
        }

        if selected(ctx, "locale") {
            compare_scalar(ctx, "table", "locale", &subject.locale, &expectation.locale);
        }

        if selected(ctx, "namespace") {
            compare_scalar(
                ctx,
                "table",
                "namespace",
                &subject.namespace,
                &expectation.namespace,
            );
        }

        if selected(ctx, "prefix") {
            compare_scalar(ctx, "table", "prefix", &subject.prefix, &expectation.prefix);
        }

        if selected(ctx, "remoting_format") {
            compare_scalar(
                ctx,
                "table",
                "remoting_format",
                &subject.remoting_format,
                &expectation.remoting_format,
            );
        }
    }

    fn compare_collections(
        &self,
        subject: &Table,
        subject_dataset: Option<&DataSet>,
        expectation: &Table,
        expectation_dataset: Option<&DataSet>,
        ctx: &mut WalkContext<'_>,
    ) {
        let selected = |ctx: &WalkContext<'_>, member: &str| {
            ctx.options().is_member_selected(NodeKind::Table, member)
        };

        if selected(ctx, "child_relations") {
            match (subject_dataset, expectation_dataset) {
                (Some(subject_ds), Some(expectation_ds)) => {
                    let actual = subject_ds.child_relations_of(&subject.name);
                    let expected = expectation_ds.child_relations_of(&expectation.name);
                    compare_relations_by_name(ctx, &actual, &expected, "table", "child_relations");
                }
                (None, None) => {}
                (None, Some(_)) => {
                    ctx.fail(
                        "Cannot compare child relations: the actual table has no containing dataset",
                    );
                }
                (Some(_), None) => {
                    ctx.fail(
                        "Cannot compare child relations: the expected table has no containing dataset",
                    );
                }
            }
        }

        if selected(ctx, "columns") {
            self.compare_columns(subject, expectation, ctx);
        }

        if selected(ctx, "constraints") {
            ctx.assert_equivalency_of(
                &Comparand::ConstraintCollection(&subject.constraints),
                &Comparand::ConstraintCollection(&expectation.constraints),
                Some("constraints"),
            );
        }

        if selected(ctx, "extended_properties") {
            ctx.assert_equivalency_of(
                &Comparand::Properties(&subject.extended_properties),
                &Comparand::Properties(&expectation.extended_properties),
                Some("extended_properties"),
            );
        }

        if selected(ctx, "parent_relations") {
            match (subject_dataset, expectation_dataset) {
                (Some(subject_ds), Some(expectation_ds)) => {
                    let actual = subject_ds.parent_relations_of(&subject.name);
                    let expected = expectation_ds.parent_relations_of(&expectation.name);
                    compare_relations_by_name(ctx, &actual, &expected, "table", "parent_relations");
                }
                (None, None) => {}
                (None, Some(_)) => {
                    ctx.fail(
                        "Cannot compare parent relations: the actual table has no containing dataset",
                    );
                }
                (Some(_), None) => {
                    ctx.fail(
                        "Cannot compare parent relations: the expected table has no containing dataset",
                    );
                }
            }
        }

        if selected(ctx, "primary_key") {
            ctx.assert_equivalency_of(
                &Comparand::KeyColumns(&subject.primary_key),
                &Comparand::KeyColumns(&expectation.primary_key),
                Some("primary_key"),
            );
        }

        if selected(ctx, "rows") {
            ctx.assert_equivalency_of(
                &Comparand::RowCollection {
                    rows: &subject.rows,
                    table: subject,
                },
                &Comparand::RowCollection {
                    rows: &expectation.rows,
                    table: expectation,
                },
                Some("rows"),
            );
        }
    }

    fn compare_columns(&self, subject: &Table, expectation: &Table, ctx: &mut WalkContext<'_>) {
        let scopes = [Scope::Dataset, Scope::Table, Scope::Column];

        let names = name_union(
            expectation.columns.iter().map(|c| c.name.clone()),
            subject.columns.iter().map(|c| c.name.clone()),
        );

        for name in names {
            // excluded columns produce no reports, missing or otherwise
            if ctx.options().should_exclude_column(&scopes, &subject.name, &name) {
                continue;
            }

            let subject_column = subject.find_column(&name);
            let expectation_column = expectation.find_column(&name);

            match (subject_column, expectation_column) {
                (Some(subject_column), Some(expectation_column)) => {
                    ctx.assert_equivalency_of(
                        &Comparand::Column {
                            column: subject_column,
                            table: Some(&subject.name),
                        },
                        &Comparand::Column {
                            column: expectation_column,
                            table: Some(&expectation.name),
                        },
                        Some(&format!("columns[{name}]")),
                    );
                }
                (None, Some(_)) => {
                    ctx.fail(format!(
                        "Expected table to contain column {name:?}, but did not find it"
                    ));
                }
                (Some(_), None) => {
                    ctx.fail(format!("Found unexpected column {name:?}"));
                }
                (None, None) => unreachable!("name came from one of the column lists"),
            }
        }
    }
}

pub struct ColumnStep;

impl EquivalencyStep for ColumnStep {
    fn kind(&self) -> NodeKind {
        NodeKind::Column
    }

    fn handle(&self, actual: &Comparand<'_>, expected: &Comparand<'_>, ctx: &mut WalkContext<'_>) {
        let expectation = match expected {
            Comparand::Column { column, .. } => *column,
            _ => {
                if !actual.is_null() {
                    ctx.fail("Expected column value to be null, but found one");
                }
                return;
            }
        };

        let (subject, owning_table) = match actual {
            Comparand::Column { column, table } => (*column, *table),
            Comparand::Null => {
                ctx.fail("Expected column to be non-null, but found null");
                return;
            }
            other => {
                ctx.fail(format!("Expected a column, but found {}", other.describe()));
                return;
            }
        };

        let scopes = [Scope::Dataset, Scope::Table, Scope::Column];

        if ctx.options().should_exclude_column(
            &scopes,
            owning_table.unwrap_or_default(),
            &subject.name,
        ) {
            return;
        }

        for &member in COLUMN_CANDIDATE_MEMBERS {
            if !ctx.options().is_member_selected(NodeKind::Column, member) {
                continue;
            }

            match member {
                "allow_db_null" => compare_scalar(
                    ctx,
                    "column",
                    member,
                    &subject.allow_db_null,
                    &expectation.allow_db_null,
                ),
                "auto_increment" => compare_scalar(
                    ctx,
                    "column",
                    member,
                    &subject.auto_increment,
                    &expectation.auto_increment,
                ),
                "auto_increment_seed" => compare_scalar(
                    ctx,
                    "column",
                    member,
                    &subject.auto_increment_seed,
                    &expectation.auto_increment_seed,
                ),
                "auto_increment_step" => compare_scalar(
                    ctx,
                    "column",
                    member,
                    &subject.auto_increment_step,
                    &expectation.auto_increment_step,
                ),
                "caption" => {
                    compare_scalar(ctx, "column", member, &subject.caption, &expectation.caption);
                }
                "name" => {
                    if subject.name != expectation.name {
                        ctx.fail(format!(
                            "Expected column to have name {:?}, but found {:?} instead",
                            expectation.name, subject.name
                        ));
                    }
                }
                "data_type" => compare_scalar(
                    ctx,
                    "column",
                    member,
                    &subject.data_type,
                    &expectation.data_type,
                ),
                "date_time_mode" => compare_scalar(
                    ctx,
                    "column",
                    member,
                    &subject.date_time_mode,
                    &expectation.date_time_mode,
                ),
                "default_value" => {
                    if subject.default_value != expectation.default_value {
                        ctx.fail(format!(
                            "Expected column to have default_value of {}, but found {} instead",
                            expectation.default_value, subject.default_value
                        ));
                    }
                }
                "expression" => compare_scalar(
                    ctx,
                    "column",
                    member,
                    &subject.expression,
                    &expectation.expression,
                ),
                "extended_properties" => {
                    ctx.assert_equivalency_of(
                        &Comparand::Properties(&subject.extended_properties),
                        &Comparand::Properties(&expectation.extended_properties),
                        Some("extended_properties"),
                    );
                }
                "max_length" => compare_scalar(
                    ctx,
                    "column",
                    member,
                    &subject.max_length,
                    &expectation.max_length,
                ),
                "namespace" => compare_scalar(
                    ctx,
                    "column",
                    member,
                    &subject.namespace,
                    &expectation.namespace,
                ),
                "prefix" => {
                    compare_scalar(ctx, "column", member, &subject.prefix, &expectation.prefix);
                }
                "read_only" => compare_scalar(
                    ctx,
                    "column",
                    member,
                    &subject.read_only,
                    &expectation.read_only,
                ),
                "unique" => {
                    compare_scalar(ctx, "column", member, &subject.unique, &expectation.unique);
                }
                other => unreachable!("no comparison defined for column member {other}"),
            }
        }
    }
}

pub struct RowStep;

impl EquivalencyStep for RowStep {
    fn kind(&self) -> NodeKind {
        NodeKind::Row
    }

    fn handle(&self, actual: &Comparand<'_>, expected: &Comparand<'_>, ctx: &mut WalkContext<'_>) {
        let (expectation, expectation_table) = match expected {
            Comparand::Row { row, table } => (*row, *table),
            _ => {
                if !actual.is_null() {
                    ctx.fail("Expected row value to be null, but found one");
                }
                return;
            }
        };

        let (subject, subject_table) = match actual {
            Comparand::Row { row, table } => (*row, *table),
            Comparand::Null => {
                ctx.fail("Expected row to be non-null, but found null");
                return;
            }
            other => {
                ctx.fail(format!("Expected a row, but found {}", other.describe()));
                return;
            }
        };

        let scopes = [Scope::Dataset, Scope::Table, Scope::Row];

        if !ctx.options().allows_mismatched_types(&scopes)
            && subject.type_name != expectation.type_name
        {
            ctx.fail(format!(
                "Expected row to be of type {:?}, but found {:?}",
                expectation.type_name, subject.type_name
            ));
        }

        let selected = ctx.cache.row_members(ctx.options());

        if selected.has_errors {
            compare_scalar(
                ctx,
                "row",
                "has_errors",
                &subject.has_errors,
                &expectation.has_errors,
            );
        }

        if selected.row_state {
            compare_scalar(ctx, "row", "row_state", &subject.state, &expectation.state);
        }

        self.compare_field_values(subject, subject_table, expectation, expectation_table, ctx);
    }
}

impl RowStep {
    fn compare_field_values(
        &self,
        subject: &Row,
        subject_table: &Table,
        expectation: &Row,
        expectation_table: &Table,
        ctx: &mut WalkContext<'_>,
    ) {
        let scopes = [Scope::Dataset, Scope::Table, Scope::Row];

        let ignore_unmatched = ctx.options().ignores_unmatched_columns(&scopes);

        let subject_version = if subject.state == RowState::Deleted {
            RowVersion::Original
        } else {
            RowVersion::Current
        };

        let expectation_version = if expectation.state == RowState::Deleted {
            RowVersion::Original
        } else {
            RowVersion::Current
        };

        let compare_original_versions = subject.state == RowState::Modified
            && expectation.state == RowState::Modified
            && !ctx.options().excludes_original_data(&scopes);

        let names = name_union(
            expectation_table.columns.iter().map(|c| c.name.clone()),
            subject_table.columns.iter().map(|c| c.name.clone()),
        );

        for name in names {
            if ctx
                .options()
                .should_exclude_column(&scopes, &subject_table.name, &name)
            {
                continue;
            }

            let subject_column = subject_table.find_column(&name);
            let expectation_column = expectation_table.find_column(&name);

            if !ignore_unmatched {
                if subject_column.is_none() {
                    ctx.fail(format!("Expected row to have column {name:?}, but found none"));
                }

                if expectation_column.is_none() {
                    ctx.fail(format!("Found unexpected column {name:?} in row"));
                }
            }

            if subject_column.is_some() && expectation_column.is_some() {
                ctx.assert_equivalency_of(
                    &Comparand::from_value(subject.version(&name, subject_version)),
                    &Comparand::from_value(expectation.version(&name, expectation_version)),
                    Some(&name),
                );

                if compare_original_versions {
                    ctx.assert_equivalency_of(
                        &Comparand::from_value(subject.version(&name, RowVersion::Original)),
                        &Comparand::from_value(expectation.version(&name, RowVersion::Original)),
                        Some(&format!("{name} (original)")),
                    );
                }
            }
        }
    }
}

pub struct RelationStep;

impl EquivalencyStep for RelationStep {
    fn kind(&self) -> NodeKind {
        NodeKind::Relation
    }

    fn handle(&self, actual: &Comparand<'_>, expected: &Comparand<'_>, ctx: &mut WalkContext<'_>) {
        let expectation = match expected {
            Comparand::Relation(relation) => *relation,
            _ => {
                if !actual.is_null() {
                    ctx.fail("Expected relation value to be null, but found one");
                }
                return;
            }
        };

        let subject = match actual {
            Comparand::Relation(relation) => *relation,
            Comparand::Null => {
                ctx.fail("Expected relation to be non-null, but found null");
                return;
            }
            other => {
                ctx.fail(format!("Expected a relation, but found {}", other.describe()));
                return;
            }
        };

        let selected = |ctx: &WalkContext<'_>, member: &str| {
            ctx.options().is_member_selected(NodeKind::Relation, member)
        };

        if selected(ctx, "name") && subject.name != expectation.name {
            ctx.fail(format!(
                "Expected relation to have name {:?}, but found {:?} instead",
                expectation.name, subject.name
            ));
        }

        if selected(ctx, "nested") {
            compare_scalar(ctx, "relation", "nested", &subject.nested, &expectation.nested);
        }

        // Only the containing dataset's name is compared; full dataset
        // equivalence here would recurse back through the whole graph.
        if selected(ctx, "dataset_name") && subject.dataset_name != expectation.dataset_name {
            ctx.fail(format!(
                "Expected containing dataset of relation to be {}, but found {}",
                display_optional_name(&expectation.dataset_name),
                display_optional_name(&subject.dataset_name)
            ));
        }

        if selected(ctx, "extended_properties") {
            ctx.assert_equivalency_of(
                &Comparand::Properties(&subject.extended_properties),
                &Comparand::Properties(&expectation.extended_properties),
                Some("extended_properties"),
            );
        }

        self.compare_end(ctx, "parent", &subject.parent, &expectation.parent);
        self.compare_end(ctx, "child", &subject.child, &expectation.child);
    }
}

impl RelationStep {
    fn compare_end(
        &self,
        ctx: &mut WalkContext<'_>,
        direction: &str,
        subject: &RelationEnd,
        expectation: &RelationEnd,
    ) {
        let selected = |ctx: &WalkContext<'_>, member: String| {
            ctx.options().is_member_selected(NodeKind::Relation, &member)
        };

        if selected(ctx, format!("{direction}_columns")) {
            self.compare_end_columns(ctx, subject, expectation);
        }

        if selected(ctx, format!("{direction}_table")) && subject.table != expectation.table {
            ctx.fail(format!(
                "Expected relation to reference a table named {:?}, but found {:?} instead",
                expectation.table, subject.table
            ));
        }

        if selected(ctx, format!("{direction}_key_constraint")) {
            match (&subject.key_constraint, &expectation.key_constraint) {
                (Some(subject_constraint), Some(expectation_constraint)) => {
                    ctx.with_segment(&format!("{direction}_key_constraint"), |ctx| {
                        compare_constraint(ctx, subject_constraint, expectation_constraint);
                    });
                }
                (None, Some(expectation_constraint)) => {
                    ctx.fail(format!(
                        "Expected relation to have {direction} key constraint {:?}, but found none",
                        expectation_constraint.name
                    ));
                }
                (Some(subject_constraint), None) => {
                    ctx.fail(format!(
                        "Expected relation to have no {direction} key constraint, but found {:?}",
                        subject_constraint.name
                    ));
                }
                (None, None) => {}
            }
        }
    }

    fn compare_end_columns(
        &self,
        ctx: &mut WalkContext<'_>,
        subject: &RelationEnd,
        expectation: &RelationEnd,
    ) {
        if subject.columns.len() != expectation.columns.len() {
            ctx.fail(format!(
                "Expected relation to reference {} column(s), but found {}",
                expectation.columns.len(),
                subject.columns.len()
            ));
            return;
        }

        // These column references live in different tables of different
        // datasets that should be equivalent to one another.
        for (subject_ref, expectation_ref) in subject.columns.iter().zip(&expectation.columns) {
            let equivalent = subject_ref.table == expectation_ref.table
                && subject_ref.column == expectation_ref.column;

            if !equivalent {
                ctx.fail(format!(
                    "Expected relation to reference column {:?} in table {:?}, but found a reference to {:?} in table {:?} instead",
                    expectation_ref.column,
                    expectation_ref.table,
                    subject_ref.column,
                    subject_ref.table
                ));
            }
        }
    }
}

fn display_optional_name(name: &Option<String>) -> String {
    match name {
        Some(name) => format!("{name:?}"),
        None => "<null>".to_string(),
    }
}

pub struct ConstraintCollectionStep;

impl EquivalencyStep for ConstraintCollectionStep {
    fn kind(&self) -> NodeKind {
        NodeKind::ConstraintCollection
    }

    fn handle(&self, actual: &Comparand<'_>, expected: &Comparand<'_>, ctx: &mut WalkContext<'_>) {
        let (subject, expectation) = match (actual, expected) {
            (Comparand::ConstraintCollection(subject), Comparand::ConstraintCollection(expectation)) => {
                (*subject, *expectation)
            }
            (other, Comparand::ConstraintCollection(_)) => {
                ctx.fail(format!(
                    "Expected a constraint collection, but found {}",
                    other.describe()
                ));
                return;
            }
            (Comparand::ConstraintCollection(_), other) => {
                ctx.fail(format!(
                    "Expected {}, but found a constraint collection",
                    other.describe()
                ));
                return;
            }
            _ => unreachable!("dispatched on constraint collection kind"),
        };

        let names = name_union(
            expectation.iter().map(|c| c.name.clone()),
            subject.iter().map(|c| c.name.clone()),
        );

        for name in names {
            let subject_constraint = subject.iter().find(|c| c.name == name);
            let expectation_constraint = expectation.iter().find(|c| c.name == name);

            match (subject_constraint, expectation_constraint) {
                (Some(subject_constraint), Some(expectation_constraint)) => {
                    ctx.with_segment(&format!("[{name}]"), |ctx| {
                        compare_constraint(ctx, subject_constraint, expectation_constraint);
                    });
                }
                (None, Some(_)) => {
                    ctx.fail(format!(
                        "Expected constraint named {name:?}, but did not find one"
                    ));
                }
                (Some(_), None) => {
                    ctx.fail(format!("Found unexpected constraint named {name:?}"));
                }
                (None, None) => unreachable!("name came from one of the constraint lists"),
            }
        }
    }
}
