//! Partial-update expressions.

use super::AttrValue;

/// An ordered set of attribute assignments applied by an update.
///
/// Updates are SET-only: each assignment overwrites one attribute. Assignment
/// order is preserved so backends render deterministic expressions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    assignments: Vec<(String, AttrValue)>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an attribute assignment.
    pub fn set(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.assignments.push((name.into(), value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn assignments(&self) -> &[(String, AttrValue)] {
        &self.assignments
    }
}
