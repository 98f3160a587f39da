//! Opening the database at startup.

use std::time::Duration;

use rusqlite::Connection;

use crate::config::schema::DbConfig;
use crate::db::DbError;
use crate::resilience::BackoffPolicy;

/// Path SQLite treats as a private in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

const SUPPORTED_DRIVERS: &[&str] = &["sqlite3", "sqlite"];

pub fn is_supported_driver(driver: &str) -> bool {
    SUPPORTED_DRIVERS.contains(&driver)
}

/// Number of connections to open for `config`.
///
/// Every in-memory connection is its own database, so those get exactly one.
pub fn effective_pool_size(config: &DbConfig) -> usize {
    if config.filepath == MEMORY_PATH {
        1
    } else {
        config.pool_size.max(1)
    }
}

/// Open one connection and check that it answers.
pub fn open_connection(config: &DbConfig, cache_capacity: usize) -> Result<Connection, DbError> {
    if !is_supported_driver(&config.driver) {
        return Err(DbError::UnsupportedDriver(config.driver.clone()));
    }

    let open_err = |source: rusqlite::Error| DbError::Open {
        path: config.filepath.clone(),
        source,
    };

    let conn = Connection::open(&config.filepath).map_err(open_err)?;
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(open_err)?;
    conn.set_prepared_statement_cache_capacity(cache_capacity);
    conn.query_row("SELECT 1", [], |_| Ok(()))
        .map_err(open_err)?;
    Ok(conn)
}

/// Open every pool connection, retrying until the database is ready.
pub async fn open_with_retry(
    config: &DbConfig,
    cache_capacity: usize,
) -> Result<Vec<Connection>, DbError> {
    let policy = BackoffPolicy::new(config.connect_base_delay_ms, config.connect_max_delay_ms);
    let attempts = config.connect_attempts.max(1);
    let size = effective_pool_size(config);

    let mut attempt = 0;
    loop {
        attempt += 1;
        let cfg = config.clone();
        let opened = tokio::task::spawn_blocking(move || {
            (0..size)
                .map(|_| open_connection(&cfg, cache_capacity))
                .collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(|e| DbError::Task(e.to_string()))?;

        match opened {
            Ok(connections) => {
                tracing::info!(
                    path = %config.filepath,
                    connections = connections.len(),
                    attempt,
                    "Database ready"
                );
                return Ok(connections);
            }
            Err(e @ DbError::UnsupportedDriver(_)) => return Err(e),
            Err(e) if attempt == attempts => {
                return Err(DbError::NotReady {
                    attempts,
                    last: e.to_string(),
                });
            }
            Err(e) => {
                let delay = policy.delay(attempt);
                tracing::warn!(
                    error = %e,
                    attempt,
                    delay = ?delay,
                    "Database not ready, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(path: &str) -> DbConfig {
        DbConfig {
            filepath: path.to_string(),
            connect_attempts: 2,
            connect_base_delay_ms: 1,
            connect_max_delay_ms: 2,
            ..DbConfig::default()
        }
    }

    #[test]
    fn test_memory_database_gets_one_connection() {
        let mut cfg = config(MEMORY_PATH);
        cfg.pool_size = 8;
        assert_eq!(effective_pool_size(&cfg), 1);

        cfg.filepath = "app.db".into();
        assert_eq!(effective_pool_size(&cfg), 8);

        cfg.pool_size = 0;
        assert_eq!(effective_pool_size(&cfg), 1);
    }

    #[tokio::test]
    async fn test_opens_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.db");
        let mut cfg = config(path.to_str().unwrap());
        cfg.pool_size = 3;

        let conns = open_with_retry(&cfg, 32).await.unwrap();
        assert_eq!(conns.len(), 3);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_unsupported_driver_fails_immediately() {
        let mut cfg = config(MEMORY_PATH);
        cfg.driver = "mysql".into();
        let err = open_with_retry(&cfg, 16).await.unwrap_err();
        assert!(matches!(err, DbError::UnsupportedDriver(ref d) if d == "mysql"));
    }

    #[tokio::test]
    async fn test_gives_up_after_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("gateway.db");
        let cfg = config(path.to_str().unwrap());

        let err = open_with_retry(&cfg, 16).await.unwrap_err();
        match err {
            DbError::NotReady { attempts, .. } => assert_eq!(attempts, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
