//! Parameterized `UPDATE` statement builder.
//!
//! Column names are `&'static str` so only identifiers known at compile
//! time ever reach the SQL text; values always travel as bound parameters.

use rusqlite::types::Value;

use pocket_core::types::RecordPatch;

/// Accumulates `column = ?N` assignments for a single-row update by id.
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    table: &'static str,
    assignments: Vec<(&'static str, Value)>,
}

impl UpdateBuilder {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            assignments: Vec::new(),
        }
    }

    /// Seed the builder with the columns a patch supplies.
    pub fn from_patch(table: &'static str, patch: &RecordPatch) -> Self {
        let mut builder = Self::new(table);
        if let Some(ref title) = patch.title {
            builder = builder.set("title", Value::Text(title.trim().to_string()));
        }
        if let Some(amount) = patch.amount {
            builder = builder.set("amount", Value::Real(amount));
        }
        if let Some(type_tag) = patch.type_tag {
            builder = builder.set("type", Value::Text(type_tag.as_str().to_string()));
        }
        if let Some(completed) = patch.completed {
            builder = builder.set("completed", Value::Integer(completed as i64));
        }
        builder
    }

    /// Assign a column. A later assignment to the same column replaces the
    /// earlier one.
    pub fn set(mut self, column: &'static str, value: Value) -> Self {
        if let Some(slot) = self.assignments.iter_mut().find(|(c, _)| *c == column) {
            slot.1 = value;
        } else {
            self.assignments.push((column, value));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Render `UPDATE <table> SET ... WHERE id = ?N` and its parameters.
    /// Returns `None` when nothing was assigned.
    pub fn build(&self, id: i64) -> Option<(String, Vec<Value>)> {
        if self.assignments.is_empty() {
            return None;
        }

        let set_clause = self
            .assignments
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{} = ?{}", column, i + 1))
            .collect::<Vec<_>>()
            .join(", ");

        let mut params: Vec<Value> = self.assignments.iter().map(|(_, v)| v.clone()).collect();
        params.push(Value::Integer(id));

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            self.table,
            set_clause,
            params.len()
        );
        Some((sql, params))
    }
}
