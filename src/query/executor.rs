//! Execution of a compiled query set.
//!
//! # Responsibilities
//! - Bind request parameters to each statement's markers
//! - Run before, main and after statements in order
//! - Concatenate the rows of the main statements only
//! - Commit on success, roll back on failure when a transaction was requested
//!
//! # Design Decisions
//! - The same code path runs against a plain connection or a transaction;
//!   the choice is made once per execution through [`StatementRunner`]
//! - Rollback failures are logged, never returned in place of the cause
//! - Transactions take the write lock up front, so they wait on the busy
//!   timeout instead of failing when a read has to be upgraded

use rusqlite::types::{ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{
    params_from_iter, Connection, ToSql, Transaction, TransactionBehavior,
};
use serde_json::Value;
use thiserror::Error;

use crate::query::compiler::Query;
use crate::query::error::{QueryError, QueryResult};
use crate::query::params::ParamMap;
use crate::query::query_set::QuerySet;
use crate::query::rows::{collect_rows, RowMap};

/// Something that can run one statement and hand back its rows.
pub trait StatementRunner {
    fn run(&self, query: &Query, params: &ParamMap) -> QueryResult<Vec<RowMap>>;

    /// Make the work done so far durable.
    fn commit(self) -> QueryResult<()>;

    /// Undo the work done so far, if the runner can.
    fn rollback(self);
}

/// Runs statements straight on the connection; every statement autocommits.
pub struct Direct<'c>(pub &'c Connection);

impl StatementRunner for Direct<'_> {
    fn run(&self, query: &Query, params: &ParamMap) -> QueryResult<Vec<RowMap>> {
        run_statement(self.0, query, params)
    }

    fn commit(self) -> QueryResult<()> {
        Ok(())
    }

    fn rollback(self) {}
}

/// Runs statements inside a single transaction.
pub struct Transactional<'c>(pub Transaction<'c>);

impl StatementRunner for Transactional<'_> {
    fn run(&self, query: &Query, params: &ParamMap) -> QueryResult<Vec<RowMap>> {
        run_statement(&self.0, query, params)
    }

    fn commit(self) -> QueryResult<()> {
        self.0
            .commit()
            .map_err(|e| QueryError::Unknown(format!("failed to commit transaction: {e}")))
    }

    fn rollback(self) {
        if let Err(e) = self.0.rollback() {
            tracing::warn!(error = %e, "Rollback failed");
        }
    }
}

/// Execute `set` with `params`, returning the rows of its main statements.
pub fn execute_query_set(
    conn: &mut Connection,
    set: &QuerySet,
    params: &ParamMap,
) -> QueryResult<Vec<RowMap>> {
    if set.transaction {
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| QueryError::Unknown(format!("failed to begin transaction: {e}")))?;
        execute_with(Transactional(tx), set, params)
    } else {
        execute_with(Direct(conn), set, params)
    }
}

fn execute_with<R: StatementRunner>(
    runner: R,
    set: &QuerySet,
    params: &ParamMap,
) -> QueryResult<Vec<RowMap>> {
    match run_query_set(&runner, set, params) {
        Ok(rows) => {
            runner.commit()?;
            Ok(rows)
        }
        Err(err) => {
            runner.rollback();
            Err(err)
        }
    }
}

fn run_query_set<R: StatementRunner>(
    runner: &R,
    set: &QuerySet,
    params: &ParamMap,
) -> QueryResult<Vec<RowMap>> {
    for query in &set.befores {
        runner.run(query, params)?;
    }

    let mut rows = Vec::new();
    for query in &set.queries {
        rows.extend(runner.run(query, params)?);
    }

    for query in &set.afters {
        runner.run(query, params)?;
    }

    Ok(rows)
}

fn run_statement(conn: &Connection, query: &Query, params: &ParamMap) -> QueryResult<Vec<RowMap>> {
    let args = bind_args(query, params)?;

    let mut stmt = conn
        .prepare_cached(query.sql())
        .map_err(QueryError::execution)?;
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();

    tracing::trace!(sql = %query.sql(), args = args.len(), "Executing statement");

    let rows = stmt
        .query(params_from_iter(args))
        .map_err(QueryError::execution)?;
    collect_rows(rows, &columns)
}

fn bind_args<'p>(query: &Query, params: &'p ParamMap) -> QueryResult<Vec<Arg<'p>>> {
    query
        .arg_keys()
        .iter()
        .map(|key| {
            params
                .get(key)
                .map(Arg)
                .ok_or_else(|| QueryError::UnknownArg(key.clone()))
        })
        .collect()
}

/// A request value that cannot be bound to a SQLite parameter.
#[derive(Debug, Error)]
#[error("cannot bind {0} value to a statement parameter")]
struct UnsupportedArgument(&'static str);

/// Binding adapter for request values.
struct Arg<'a>(&'a Value);

impl ToSql for Arg<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self.0 {
            Value::Null => SqlValue::Null,
            Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => SqlValue::Integer(i),
                (None, Some(f)) => SqlValue::Real(f),
                (None, None) => return Err(unsupported("number")),
            },
            Value::String(s) => return Ok(ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes()))),
            Value::Array(_) => return Err(unsupported("array")),
            Value::Object(_) => return Err(unsupported("object")),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

fn unsupported(kind: &'static str) -> rusqlite::Error {
    rusqlite::Error::ToSqlConversionFailure(Box::new(UnsupportedArgument(kind)))
}
