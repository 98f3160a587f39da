//! Compiled routes and per-request dispatch.
//!
//! # Responsibilities
//! - Compile every rule once at startup
//! - Hold the database handle shared by all routes
//! - Run a route's query set for one request
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Compilation stops at the first failing statement; the caller aborts startup

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use rusqlite::Connection;

use crate::db::Database;
use crate::query::{
    execute_query_set, resolve_params, QueryError, QueryResult, QuerySet, RowMap,
};
use crate::routing::path::catch_all_name;
use crate::routing::rule::Rule;

/// A rule together with its compiled statements.
#[derive(Debug)]
pub struct CompiledRoute {
    pub rule: Rule,
    pub query_set: QuerySet,
}

/// Request data the routing layer hands to a route.
#[derive(Debug, Default, Clone)]
pub struct RequestInput {
    pub path_params: HashMap<String, String>,
    pub body: Bytes,
    pub query: Option<String>,
}

/// Everything request handlers share: the routes and the database.
#[derive(Debug)]
pub struct RouterContext {
    db: Database,
    routes: Vec<Arc<CompiledRoute>>,
}

impl RouterContext {
    /// Compile `rules` on the first connection, warm the statement cache of
    /// the others, then take ownership of all of them.
    pub fn compile(connections: Vec<Connection>, rules: Vec<Rule>) -> QueryResult<Self> {
        let primary = connections
            .first()
            .ok_or_else(|| QueryError::Unknown("no database connection available".into()))?;

        let mut routes = Vec::with_capacity(rules.len());
        for rule in rules {
            let query_set = QuerySet::compile(primary, &rule)?;
            tracing::info!(
                method = %rule.method,
                path = %rule.path,
                statements = query_set.statements().count(),
                transaction = query_set.transaction,
                "Route compiled"
            );
            routes.push(Arc::new(CompiledRoute { rule, query_set }));
        }

        for conn in connections.iter().skip(1) {
            warm_statements(conn, &routes)?;
        }

        Ok(Self {
            db: Database::new(connections),
            routes,
        })
    }

    pub fn routes(&self) -> &[Arc<CompiledRoute>] {
        &self.routes
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Resolve parameters and run the route's query set.
    pub async fn execute(
        &self,
        route: Arc<CompiledRoute>,
        mut input: RequestInput,
    ) -> QueryResult<Vec<RowMap>> {
        if let Some(name) = catch_all_name(&route.rule.path) {
            if let Some(value) = input.path_params.get_mut(name) {
                value.insert(0, '/');
            }
        }
        let params = resolve_params(&input.path_params, &input.body, input.query.as_deref())?;

        self.db
            .with_connection(move |conn| execute_query_set(conn, &route.query_set, &params))
            .await
            .map_err(QueryError::unknown)?
    }
}

fn warm_statements(conn: &Connection, routes: &[Arc<CompiledRoute>]) -> QueryResult<()> {
    for query in routes.iter().flat_map(|r| r.query_set.statements()) {
        conn.prepare_cached(query.sql())
            .map_err(|e| QueryError::SqlParse {
                sql: query.sql().to_string(),
                message: e.to_string(),
            })?;
    }
    Ok(())
}
