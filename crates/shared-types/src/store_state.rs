// Snapshot of the cross-filter coordination store.
// A snapshot is immutable; every mutation of the store produces a new one
// with a bumped version, so a reader always sees filters and selections
// from the same logical update.

use crate::{FilterOperator, FilterRule, Selection, WidgetId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Prefix of rule ids synthesized from widget click selections
pub const SELECTION_RULE_PREFIX: &str = "selection";

/// Dashboard-session filter state at one version
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    /// Bumped on every filter or selection mutation
    pub version: u64,
    pub global_filters: Vec<FilterRule>,
    pub selections: BTreeMap<WidgetId, Selection>,
    /// UI-only flag, not part of filtering
    pub edit_mode: bool,
}

/// Detailed change detection result between two snapshots
#[derive(Debug, Clone, PartialEq)]
pub struct StateChangeDetection {
    pub has_changes: bool,
    pub globals_changed: bool,
    pub selections_changed: bool,
    pub edit_mode_changed: bool,
    pub requires_refetch: bool,
    pub change_summary: Vec<String>,
}

impl StoreSnapshot {
    /// Effective filter set for `widget`: global filters, then every other
    /// widget's selection (ordered by widget id, then column), then the
    /// widget's own saved filters. All rules are AND-combined.
    pub fn effective_filters(
        &self,
        widget: &WidgetId,
        saved_filters: &[FilterRule],
    ) -> Vec<FilterRule> {
        let selection_count: usize = self
            .selections
            .iter()
            .filter(|(owner, _)| *owner != widget)
            .map(|(_, selection)| selection.len())
            .sum();

        let mut filters =
            Vec::with_capacity(self.global_filters.len() + selection_count + saved_filters.len());
        filters.extend(self.global_filters.iter().cloned());

        for (owner, selection) in &self.selections {
            if owner == widget {
                continue;
            }
            filters.extend(
                selection
                    .iter()
                    .map(|(column, value)| selection_rule(owner, column, value)),
            );
        }

        filters.extend(saved_filters.iter().cloned());
        filters
    }

    /// The selection currently held by `widget`, if any
    pub fn selection_of(&self, widget: &WidgetId) -> Option<&Selection> {
        self.selections.get(widget)
    }

    pub fn has_filters(&self) -> bool {
        !self.global_filters.is_empty() || !self.selections.is_empty()
    }

    /// Change detection against an earlier snapshot
    pub fn detect_changes_from(&self, previous: &StoreSnapshot) -> StateChangeDetection {
        let mut change_summary = Vec::new();

        let globals_changed = self.global_filters != previous.global_filters;
        if globals_changed {
            change_summary.push(format!(
                "Global filters changed: {} → {}",
                previous.global_filters.len(),
                self.global_filters.len()
            ));
        }

        let selections_changed = self.selections != previous.selections;
        if selections_changed {
            change_summary.push(format!(
                "Selections changed: {} → {} widgets",
                previous.selections.len(),
                self.selections.len()
            ));
        }

        let edit_mode_changed = self.edit_mode != previous.edit_mode;
        if edit_mode_changed {
            change_summary.push(format!(
                "Edit mode changed: {} → {}",
                previous.edit_mode, self.edit_mode
            ));
        }

        StateChangeDetection {
            has_changes: globals_changed || selections_changed || edit_mode_changed,
            globals_changed,
            selections_changed,
            edit_mode_changed,
            requires_refetch: globals_changed || selections_changed,
            change_summary,
        }
    }
}

/// Equality rule synthesized from one entry of a widget's click selection
pub fn selection_rule(owner: &WidgetId, column: &str, value: &str) -> FilterRule {
    FilterRule {
        id: format!("{SELECTION_RULE_PREFIX}:{owner}:{column}"),
        column: column.to_string(),
        operator: FilterOperator::Eq,
        value: value.to_string(),
    }
}
