//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, one route per rule)
//!     → request.rs (request ID)
//!     → routing::RouterContext::execute
//!     → response.rs (JSON payload, always 200)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use response::ResponsePayload;
pub use server::HttpServer;
