//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the database, retrying until it is ready
//! - Compile every rule against it
//! - Build the HTTP server over the compiled routes
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::sync::Arc;

use thiserror::Error;

use crate::config::{ConfigError, ValidatedConfig};
use crate::db::connect::open_with_retry;
use crate::db::DbError;
use crate::http::HttpServer;
use crate::query::QueryError;
use crate::routing::{Rule, RouterContext};

/// Floor for the per-connection prepared statement cache.
const MIN_STATEMENT_CACHE: usize = 16;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Db(#[from] DbError),

    #[error("rule compilation failed: {0}")]
    Query(#[from] QueryError),

    #[error("metrics error: {0}")]
    Metrics(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Cache size that keeps every compiled statement resident.
pub fn statement_cache_capacity(rules: &[Rule]) -> usize {
    let statements: usize = rules
        .iter()
        .map(|r| r.befores.len() + r.queries.len() + r.afters.len())
        .sum();
    statements.max(MIN_STATEMENT_CACHE)
}

/// Open the database and compile all rules into a ready server.
pub async fn start(config: ValidatedConfig) -> Result<HttpServer, StartupError> {
    let ValidatedConfig { settings, rules } = config;

    let capacity = statement_cache_capacity(&rules);
    let connections = open_with_retry(&settings.db, capacity).await?;

    let context = RouterContext::compile(connections, rules)?;
    tracing::info!(routes = context.routes().len(), "Routes compiled");

    Ok(HttpServer::new(&settings, Arc::new(context)))
}
