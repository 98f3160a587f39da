//! Bounded pool of SQLite connections.
//!
//! # Responsibilities
//! - Hand out one connection per request-handling flow
//! - Return connections on drop
//!
//! # Design Decisions
//! - All connections are opened up front; acquiring never opens a file
//! - A semaphore permit is held for as long as the connection is out

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rusqlite::Connection;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::db::DbError;

/// Connections shared by all request handlers.
#[derive(Debug)]
pub struct ConnectionPool {
    idle: Mutex<Vec<Connection>>,
    permits: Arc<Semaphore>,
    size: usize,
}

/// A checked-out connection. Goes back to the pool on drop.
pub struct PooledConnection {
    conn: Option<Connection>,
    pool: Arc<ConnectionPool>,
    _permit: OwnedSemaphorePermit,
}

impl ConnectionPool {
    pub fn new(connections: Vec<Connection>) -> Arc<Self> {
        let size = connections.len();
        Arc::new(Self {
            idle: Mutex::new(connections),
            permits: Arc::new(Semaphore::new(size)),
            size,
        })
    }

    /// Wait for a free connection.
    pub async fn acquire(self: &Arc<Self>) -> Result<PooledConnection, DbError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| DbError::PoolClosed)?;

        let conn = self.lock_idle().pop().ok_or(DbError::PoolClosed)?;

        Ok(PooledConnection {
            conn: Some(conn),
            pool: Arc::clone(self),
            _permit: permit,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn idle_count(&self) -> usize {
        self.lock_idle().len()
    }

    fn lock_idle(&self) -> MutexGuard<'_, Vec<Connection>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("connection present until drop")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("connection present until drop")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.lock_idle().push(conn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn pool_of(n: usize) -> Arc<ConnectionPool> {
        let conns = (0..n)
            .map(|_| Connection::open_in_memory().unwrap())
            .collect();
        ConnectionPool::new(conns)
    }

    #[tokio::test]
    async fn test_pool_reuses_connections() {
        let pool = pool_of(2);
        let first = pool.acquire().await.unwrap();
        let second = pool.acquire().await.unwrap();
        assert_eq!(pool.idle_count(), 0);
        drop(first);
        assert_eq!(pool.idle_count(), 1);
        drop(second);
        assert_eq!(pool.idle_count(), 2);
        assert_eq!(pool.size(), 2);
    }

    #[tokio::test]
    async fn test_acquire_waits_for_release() {
        let pool = pool_of(1);
        let held = pool.acquire().await.unwrap();

        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.acquire().await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(held);
        waiter.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_pooled_connection_is_usable() {
        let pool = pool_of(1);
        let conn = pool.acquire().await.unwrap();
        let one: i64 = conn.query_row("SELECT 1", [], |r| r.get(0)).unwrap();
        assert_eq!(one, 1);
    }
}
