//! Rule compilation and query execution.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Rule → query_set.rs → compiler.rs (rewrite {{name}} → ?, prepare)
//!          → QuerySet (immutable, one per route)
//!
//! Per request:
//!     path params + body + URL query → params.rs → ParamMap
//!     QuerySet + ParamMap → executor.rs → rows.rs → Vec<RowMap>
//! ```
//!
//! # Design Decisions
//! - SQL text is opaque apart from placeholder substitution
//! - Compilation happens only at startup; a failure aborts launch
//! - Errors carry their kind; classification is a single match

pub mod compiler;
pub mod error;
pub mod executor;
pub mod params;
pub mod query_set;
pub mod rows;

pub use compiler::{compile, rewrite_placeholders, Query};
pub use error::{ErrorKind, QueryError, QueryResult};
pub use executor::{execute_query_set, StatementRunner};
pub use params::{resolve_params, ParamMap};
pub use query_set::QuerySet;
pub use rows::{ColumnValue, RawText, RowMap};
