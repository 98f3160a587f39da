//! SQL gateway library: HTTP routes bound to SQL statements.

pub mod config;
pub mod db;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod query;
pub mod resilience;
pub mod routing;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
