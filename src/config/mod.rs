//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (YAML/TOML)
//!     → loader.rs (parse & deserialize, environment overrides)
//!     → validation.rs (semantic checks, rule normalization)
//!     → ValidatedConfig (immutable)
//!     → handed to lifecycle::startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::DbConfig;
pub use schema::GatewayConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::RuleConfig;
pub use validation::{ValidatedConfig, ValidationError};
