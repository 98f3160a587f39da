//! Error taxonomy for rule compilation and execution.

use serde::Serialize;
use thiserror::Error;

/// Failures raised while compiling or executing a rule's statements.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The backend rejected or failed a bound statement at execution time.
    #[error("failed to execute query: {0}")]
    QueryExecution(String),

    /// A statement references a placeholder absent from the request parameters.
    #[error("unknown argument name: {0}")]
    UnknownArg(String),

    /// A template failed to compile.
    #[error("failed to parse SQL `{sql}`: {message}")]
    SqlParse { sql: String, message: String },

    /// The request body exists but is not a flat JSON object.
    #[error("request body must be only 1 hierarchical key/value pairs: {0}")]
    RequestBodyParse(String),

    /// Anything not classified above.
    #[error("{0}")]
    Unknown(String),
}

/// Wire label of a [`QueryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    #[serde(rename = "QueryExecutionError")]
    QueryExecution,
    #[serde(rename = "UnknownArgError")]
    UnknownArg,
    #[serde(rename = "SQLParseError")]
    SqlParse,
    #[serde(rename = "RequestBodyParseError")]
    RequestBodyParse,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::QueryExecution => "QueryExecutionError",
            ErrorKind::UnknownArg => "UnknownArgError",
            ErrorKind::SqlParse => "SQLParseError",
            ErrorKind::RequestBodyParse => "RequestBodyParseError",
            ErrorKind::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl QueryError {
    /// Classify the error for the response payload.
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::QueryExecution(_) => ErrorKind::QueryExecution,
            QueryError::UnknownArg(_) => ErrorKind::UnknownArg,
            QueryError::SqlParse { .. } => ErrorKind::SqlParse,
            QueryError::RequestBodyParse(_) => ErrorKind::RequestBodyParse,
            QueryError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    pub(crate) fn execution(err: rusqlite::Error) -> Self {
        QueryError::QueryExecution(err.to_string())
    }

    pub(crate) fn unknown(err: impl std::fmt::Display) -> Self {
        QueryError::Unknown(err.to_string())
    }
}

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;
