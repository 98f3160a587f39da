//! Placeholder compilation.
//!
//! A template such as `SELECT * FROM t WHERE a = {{a}} AND b = {{a}}` is
//! rewritten to `SELECT * FROM t WHERE a = ? AND b = ?` with the argument
//! keys `["a", "a"]`. The rewritten text is prepared once on the startup
//! connection so malformed SQL never reaches a request.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use rusqlite::Connection;

use crate::query::error::{QueryError, QueryResult};

/// Positional marker understood by SQLite.
pub const POSITIONAL_MARKER: &str = "?";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("placeholder pattern is valid"));

/// A compiled statement and the parameter names feeding its markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    template: String,
    sql: String,
    arg_keys: Vec<String>,
}

impl Query {
    /// The template as written in the rule.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Statement text handed to the backend.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Placeholder names in marker order. Duplicates are kept.
    pub fn arg_keys(&self) -> &[String] {
        &self.arg_keys
    }
}

/// Rewrite every `{{name}}` into a positional marker.
///
/// Returns the rewritten text and the names in left-to-right order.
pub fn rewrite_placeholders(template: &str) -> (String, Vec<String>) {
    let mut arg_keys = Vec::new();
    let sql = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
        arg_keys.push(caps[1].to_string());
        POSITIONAL_MARKER
    });
    (sql.into_owned(), arg_keys)
}

/// Compile a template against the backend.
///
/// The statement lands in the connection's statement cache, which is where
/// it is picked up again at execution time.
pub fn compile(conn: &Connection, template: &str) -> QueryResult<Query> {
    let (sql, arg_keys) = rewrite_placeholders(template);

    conn.prepare_cached(&sql).map_err(|e| QueryError::SqlParse {
        sql: sql.clone(),
        message: e.to_string(),
    })?;

    tracing::trace!(sql = %sql, args = arg_keys.len(), "Compiled statement");

    Ok(Query {
        template: template.to_string(),
        sql,
        arg_keys,
    })
}
