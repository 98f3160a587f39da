//! Grouping of a rule's statements into an executable unit.

use rusqlite::Connection;

use crate::query::compiler::{compile, Query};
use crate::query::error::QueryResult;
use crate::routing::rule::Rule;

/// Compiled before/main/after statements of one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySet {
    pub befores: Vec<Query>,
    pub queries: Vec<Query>,
    pub afters: Vec<Query>,
    pub transaction: bool,
}

impl QuerySet {
    /// Compile every statement of `rule`, stopping at the first failure.
    pub fn compile(conn: &Connection, rule: &Rule) -> QueryResult<Self> {
        Ok(Self {
            befores: compile_all(conn, &rule.befores)?,
            queries: compile_all(conn, &rule.queries)?,
            afters: compile_all(conn, &rule.afters)?,
            transaction: rule.transaction,
        })
    }

    /// All statements in execution order.
    pub fn statements(&self) -> impl Iterator<Item = &Query> {
        self.befores
            .iter()
            .chain(self.queries.iter())
            .chain(self.afters.iter())
    }
}

fn compile_all(conn: &Connection, templates: &[String]) -> QueryResult<Vec<Query>> {
    templates.iter().map(|t| compile(conn, t)).collect()
}
