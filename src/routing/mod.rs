//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     Rule[] (validated config)
//!     → query::QuerySet::compile per rule
//!     → RouterContext (routes + database, immutable)
//!
//! Incoming Request (method, path):
//!     → axum matches the translated path (path.rs)
//!     → RouterContext::execute for the matched route
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Rule paths keep the `:name` syntax; translation happens once at mount time

pub mod path;
pub mod router;
pub mod rule;

pub use path::to_axum_path;
pub use router::{CompiledRoute, RequestInput, RouterContext};
pub use rule::{Method, Rule};
