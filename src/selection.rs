//! Member-selection caching
//!
//! Row comparison asks "is this scalar member selected?" once per row, so
//! the answers are cached per options value. The cache is an explicit,
//! injectable object rather than process-global state: keys are
//! `(node kind, options id)` tuples, options ids are never reused, and
//! entries are never invalidated.

use crate::options::ComparisonOptions;
use crate::plan::NodeKind;
use std::collections::HashMap;
use std::sync::Mutex;

/// The independently selectable scalar members of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedRowMembers {
    pub has_errors: bool,
    pub row_state: bool,
}

/// Content-addressed cache of member-selection results.
#[derive(Debug, Default)]
pub struct SelectionCache {
    row_members: Mutex<HashMap<(NodeKind, u64), SelectedRowMembers>>,
}

impl SelectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_members(&self, options: &ComparisonOptions) -> SelectedRowMembers {
        let key = (NodeKind::Row, options.core().id());

        let mut cache = self
            .row_members
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        *cache.entry(key).or_insert_with(|| SelectedRowMembers {
            has_errors: options.is_member_selected(NodeKind::Row, "has_errors"),
            row_state: options.is_member_selected(NodeKind::Row, "row_state"),
        })
    }
}
