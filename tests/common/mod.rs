//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use sql_gateway::config::validation::validate_config;
use sql_gateway::config::{GatewayConfig, RuleConfig};
use sql_gateway::lifecycle::{start, Shutdown};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const SCHEMA: &str = "
    CREATE TABLE test (id INTEGER PRIMARY KEY, body TEXT);
    INSERT INTO test VALUES (3, 'x');
";

/// A gateway listening on an ephemeral port, backed by a file database.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub shutdown: Shutdown,
    _dir: TempDir,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Open a side connection to inspect the database.
    pub fn inspect(&self) -> Connection {
        Connection::open(&self.db_path).unwrap()
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Create a fixture database at `path` with `schema` applied.
pub fn create_db(path: &Path, schema: &str) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(schema).unwrap();
}

/// Config with `rules` over a database file at `db_path`.
pub fn config_for(db_path: &Path, rules: Vec<RuleConfig>) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.host = "127.0.0.1".into();
    config.db.filepath = db_path.display().to_string();
    config.db.pool_size = 2;
    config.db.connect_attempts = 1;
    config.rules = rules;
    config
}

pub fn rule(method: &str, path: &str, query: &str) -> RuleConfig {
    RuleConfig {
        method: method.into(),
        path: path.into(),
        query: query.into(),
        ..RuleConfig::default()
    }
}

/// Start a gateway serving `rules` over a fresh database built from `schema`.
pub async fn start_gateway(schema: &str, rules: Vec<RuleConfig>) -> TestGateway {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("gateway.db");
    create_db(&db_path, schema);

    let validated = validate_config(config_for(&db_path, rules)).unwrap();
    let server = start(validated).await.unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestGateway {
        addr,
        db_path,
        shutdown,
        _dir: dir,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
