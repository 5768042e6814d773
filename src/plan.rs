//! Step registry and the recursive comparison walker
//!
//! The walker owns traversal and generic leaf comparison; everything
//! type-specific lives in the node-kind steps. Dispatch is a closed
//! mapping from [`NodeKind`] to exactly one registered step.

use crate::data::{Constraint, Relation, Row, Table};
use crate::data::{Column, DataSet};
use crate::options::ComparisonOptions;
use crate::report::{ComparisonReport, FailureSink};
use crate::row_matching::RowCollectionStep;
use crate::selection::SelectionCache;
use crate::steps::{
    ColumnStep, ConstraintCollectionStep, DatasetStep, RelationStep, RowStep, TableStep,
};
use crate::value::Value;
use indexmap::IndexMap;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The node kinds the pipeline knows how to compare.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum NodeKind {
    Dataset,
    Table,
    Column,
    Row,
    RowCollection,
    Relation,
    ConstraintCollection,
}

impl NodeKind {
    pub const ALL: [NodeKind; 7] = [
        NodeKind::Dataset,
        NodeKind::Table,
        NodeKind::Column,
        NodeKind::Row,
        NodeKind::RowCollection,
        NodeKind::Relation,
        NodeKind::ConstraintCollection,
    ];
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Dataset => "dataset",
            NodeKind::Table => "table",
            NodeKind::Column => "column",
            NodeKind::Row => "row",
            NodeKind::RowCollection => "row collection",
            NodeKind::Relation => "relation",
            NodeKind::ConstraintCollection => "constraint collection",
        };
        f.write_str(name)
    }
}

/// One side of a comparison: a node of the data graph, a leaf value, or
/// nothing at all.
///
/// Back-references are broken here by construction: rows and row
/// collections carry their owning table explicitly, columns carry their
/// owning table's name, and tables carry the dataset they came from.
#[derive(Debug, Clone, Copy)]
pub enum Comparand<'a> {
    Null,
    Value(&'a Value),
    Dataset(&'a DataSet),
    Table {
        table: &'a Table,
        dataset: Option<&'a DataSet>,
    },
    Column {
        column: &'a Column,
        table: Option<&'a str>,
    },
    Row {
        row: &'a Row,
        table: &'a Table,
    },
    RowCollection {
        rows: &'a [Row],
        table: &'a Table,
    },
    Relation(&'a Relation),
    ConstraintCollection(&'a [Constraint]),
    Properties(&'a IndexMap<String, Value>),
    KeyColumns(&'a [String]),
}

impl<'a> Comparand<'a> {
    /// The node kind a registered step handles, if this comparand has one.
    /// Leaf values, property maps and key-column lists are handled by the
    /// walker itself.
    pub fn kind(&self) -> Option<NodeKind> {
        match self {
            Comparand::Dataset(_) => Some(NodeKind::Dataset),
            Comparand::Table { .. } => Some(NodeKind::Table),
            Comparand::Column { .. } => Some(NodeKind::Column),
            Comparand::Row { .. } => Some(NodeKind::Row),
            Comparand::RowCollection { .. } => Some(NodeKind::RowCollection),
            Comparand::Relation(_) => Some(NodeKind::Relation),
            Comparand::ConstraintCollection(_) => Some(NodeKind::ConstraintCollection),
            Comparand::Null | Comparand::Value(_) | Comparand::Properties(_)
            | Comparand::KeyColumns(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Comparand::Null)
    }

    pub fn from_value(value: Option<&'a Value>) -> Self {
        match value {
            Some(value) => Comparand::Value(value),
            None => Comparand::Null,
        }
    }

    /// Short description for mismatch messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Comparand::Null => "null",
            Comparand::Value(_) => "a value",
            Comparand::Dataset(_) => "a dataset",
            Comparand::Table { .. } => "a table",
            Comparand::Column { .. } => "a column",
            Comparand::Row { .. } => "a row",
            Comparand::RowCollection { .. } => "a row collection",
            Comparand::Relation(_) => "a relation",
            Comparand::ConstraintCollection(_) => "a constraint collection",
            Comparand::Properties(_) => "a property collection",
            Comparand::KeyColumns(_) => "a key column list",
        }
    }
}

/// A type-specific comparison step plugged into the walker.
pub trait EquivalencyStep: Send + Sync {
    /// The node kind this step handles.
    fn kind(&self) -> NodeKind;

    /// Compares one pair of nodes, recording mismatches through the
    /// context and recursing through it for nested values.
    fn handle(&self, actual: &Comparand<'_>, expected: &Comparand<'_>, ctx: &mut WalkContext<'_>);
}

/// Ordered registry of comparison steps, one per node kind.
#[derive(Default)]
pub struct EquivalencyPlan {
    steps: Vec<Box<dyn EquivalencyStep>>,
}

impl EquivalencyPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the relational comparison steps. Idempotent: calling this
    /// on a plan that already has dataset support is a no-op.
    pub fn add_dataset_support(&mut self) {
        if self.has_step_for(NodeKind::Dataset) {
            debug!("dataset support already registered; skipping");
            return;
        }

        self.register(Box::new(DatasetStep));
        self.register(Box::new(TableStep));
        self.register(Box::new(ColumnStep));
        self.register(Box::new(RelationStep));
        self.register(Box::new(RowCollectionStep));
        self.register(Box::new(RowStep));
        self.register(Box::new(ConstraintCollectionStep));
    }

    /// Adds a step to the end of the plan. The first registered step for a
    /// kind wins; later ones for the same kind are never consulted.
    pub fn register(&mut self, step: Box<dyn EquivalencyStep>) {
        self.steps.push(step);
    }

    pub fn has_step_for(&self, kind: NodeKind) -> bool {
        self.steps.iter().any(|s| s.kind() == kind)
    }

    pub fn kinds(&self) -> Vec<NodeKind> {
        self.steps.iter().map(|s| s.kind()).collect()
    }

    fn step_for(&self, kind: NodeKind) -> Option<&dyn EquivalencyStep> {
        self.steps
            .iter()
            .find(|s| s.kind() == kind)
            .map(|s| s.as_ref())
    }

    /// Runs one full comparison and returns everything it found.
    pub fn compare(
        &self,
        actual: Comparand<'_>,
        expected: Comparand<'_>,
        options: ComparisonOptions,
        cache: &SelectionCache,
        because: Option<String>,
    ) -> ComparisonReport {
        let mut ctx = WalkContext::new(self, options, cache, because);
        ctx.assert_equivalency_of(&actual, &expected, None);
        ctx.into_report()
    }
}

/// Mutable state of one walk: the current path, the active options, and
/// the failure sink.
pub struct WalkContext<'a> {
    plan: &'a EquivalencyPlan,
    pub cache: &'a SelectionCache,
    options: ComparisonOptions,
    path: Vec<String>,
    sink: FailureSink,
}

impl<'a> WalkContext<'a> {
    fn new(
        plan: &'a EquivalencyPlan,
        options: ComparisonOptions,
        cache: &'a SelectionCache,
        because: Option<String>,
    ) -> Self {
        Self {
            plan,
            cache,
            options,
            path: Vec::new(),
            sink: FailureSink::new(because),
        }
    }

    pub fn options(&self) -> &ComparisonOptions {
        &self.options
    }

    /// Swaps in a derived options value for a nested scope, returning the
    /// previous one so the caller can restore it.
    pub fn swap_options(&mut self, options: ComparisonOptions) -> ComparisonOptions {
        std::mem::replace(&mut self.options, options)
    }

    /// Records a failure at the current path.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.sink.fail(self.path_string(), message);
    }

    pub fn failure_count(&self) -> usize {
        self.sink.len()
    }

    /// The dotted path from the root to the current node. Segments that
    /// start with `[` attach to the previous segment without a dot.
    pub fn path_string(&self) -> String {
        let mut out = String::new();

        for segment in &self.path {
            if !out.is_empty() && !segment.starts_with('[') {
                out.push('.');
            }
            out.push_str(segment);
        }

        out
    }

    /// Runs a closure with an extra path segment pushed, for nested
    /// comparisons that are not comparands of their own.
    pub fn with_segment(&mut self, segment: &str, f: impl FnOnce(&mut Self)) {
        self.path.push(segment.to_string());
        f(self);
        self.path.pop();
    }

    /// Asserts equivalency of two nested values, dispatching to the step
    /// registered for their node kind or to the built-in leaf comparison.
    pub fn assert_equivalency_of(
        &mut self,
        actual: &Comparand<'_>,
        expected: &Comparand<'_>,
        segment: Option<&str>,
    ) {
        if let Some(segment) = segment {
            self.path.push(segment.to_string());
        }

        let kind = expected.kind().or_else(|| actual.kind());
        trace!(
            "comparing {} at '{}'",
            kind.map(|k| k.to_string()).unwrap_or_else(|| "value".to_string()),
            self.path_string()
        );

        match kind {
            Some(kind) => {
                let plan = self.plan;

                match plan.step_for(kind) {
                    Some(step) => step.handle(actual, expected, self),
                    None => self.fail(format!("No comparison step is registered for {kind}")),
                }
            }
            None => self.compare_builtin(actual, expected),
        }

        if segment.is_some() {
            self.path.pop();
        }
    }

    fn compare_builtin(&mut self, actual: &Comparand<'_>, expected: &Comparand<'_>) {
        match (actual, expected) {
            (Comparand::Properties(actual), Comparand::Properties(expected)) => {
                self.compare_properties(actual, expected);
            }
            (Comparand::KeyColumns(actual), Comparand::KeyColumns(expected)) => {
                self.compare_key_columns(actual, expected);
            }
            (
                Comparand::Value(_) | Comparand::Null,
                Comparand::Value(_) | Comparand::Null,
            ) => {
                self.compare_values(value_of(actual), value_of(expected));
            }
            (actual, expected) => {
                self.fail(format!(
                    "Expected {}, but found {}",
                    expected.describe(),
                    actual.describe()
                ));
            }
        }
    }

    /// Generic leaf comparison. `None` means no value was present at all,
    /// as opposed to an explicit null value.
    pub fn compare_values(&mut self, actual: Option<&Value>, expected: Option<&Value>) {
        match (actual, expected) {
            (Some(actual), Some(expected)) => {
                if actual != expected {
                    self.fail(format!(
                        "Expected value to be {expected}, but found {actual}"
                    ));
                }
            }
            (None, Some(expected)) => {
                self.fail(format!("Expected value to be {expected}, but found no value"));
            }
            (Some(actual), None) => {
                self.fail(format!("Expected no value, but found {actual}"));
            }
            (None, None) => {}
        }
    }

    fn compare_properties(
        &mut self,
        actual: &IndexMap<String, Value>,
        expected: &IndexMap<String, Value>,
    ) {
        let mut keys: Vec<&String> = expected.keys().collect();
        keys.extend(actual.keys().filter(|k| !expected.contains_key(*k)));

        for key in keys {
            match (actual.get(key), expected.get(key)) {
                (Some(actual_value), Some(expected_value)) => {
                    let segment = format!("[{key}]");
                    self.path.push(segment);
                    self.compare_values(Some(actual_value), Some(expected_value));
                    self.path.pop();
                }
                (None, Some(expected_value)) => {
                    self.fail(format!(
                        "Expected to find property {key} with value {expected_value}, but found none"
                    ));
                }
                (Some(_), None) => {
                    self.fail(format!("Found unexpected property {key}"));
                }
                (None, None) => unreachable!("key came from one of the maps"),
            }
        }
    }

    fn compare_key_columns(&mut self, actual: &[String], expected: &[String]) {
        if actual.len() != expected.len() {
            self.fail(format!(
                "Expected primary key to consist of {} column(s), but found {}",
                expected.len(),
                actual.len()
            ));
            return;
        }

        for (position, (actual_name, expected_name)) in
            actual.iter().zip(expected.iter()).enumerate()
        {
            if actual_name != expected_name {
                self.fail(format!(
                    "Expected primary key column at position {position} to be {expected_name}, but found {actual_name}"
                ));
            }
        }
    }

    pub(crate) fn into_report(self) -> ComparisonReport {
        self.sink.into_report()
    }
}

fn value_of<'a>(comparand: &Comparand<'a>) -> Option<&'a Value> {
    match comparand {
        Comparand::Value(value) => Some(value),
        _ => None,
    }
}
