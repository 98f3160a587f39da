//! Database subsystem.
//!
//! # Data Flow
//! ```text
//! DbConfig
//!     → connect.rs (open + ping, retry with backoff)
//!     → pool.rs (fixed set of connections)
//!     → Database (cloned into every handler)
//!
//! Per request:
//!     acquire connection → blocking task → release on drop
//! ```
//!
//! # Design Decisions
//! - rusqlite is synchronous; statement work runs on the blocking pool
//! - A transaction lives on one checked-out connection, so it is never
//!   visible to another request

pub mod connect;
pub mod pool;

use std::sync::Arc;

use rusqlite::Connection;
use thiserror::Error;

pub use pool::{ConnectionPool, PooledConnection};

/// Errors from opening or using the database handle.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("unsupported database driver `{0}`")]
    UnsupportedDriver(String),

    #[error("failed to open database `{path}`: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("database not ready after {attempts} attempts: {last}")]
    NotReady { attempts: u32, last: String },

    #[error("connection pool is closed")]
    PoolClosed,

    #[error("database task failed: {0}")]
    Task(String),
}

/// Shared handle to the connection pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: Arc<ConnectionPool>,
}

impl Database {
    pub fn new(connections: Vec<Connection>) -> Self {
        Self {
            pool: ConnectionPool::new(connections),
        }
    }

    /// Run `f` with exclusive use of one connection on the blocking pool.
    pub async fn with_connection<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&mut Connection) -> T + Send + 'static,
        T: Send + 'static,
    {
        let mut conn = self.pool.acquire().await?;
        tokio::task::spawn_blocking(move || f(&mut *conn))
            .await
            .map_err(|e| DbError::Task(e.to_string()))
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }
}
