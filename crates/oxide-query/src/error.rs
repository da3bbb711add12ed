//! Error types for query and schema compilation.

use crate::exec::ConnectionError;

/// Errors raised while building, compiling or executing a statement.
///
/// Build-time errors are raised by the call that discovers them, before any
/// SQL reaches the connection. Execution errors wrap what the connection
/// reported. Nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// No table name was given and none could be derived from FROM.
    #[error("no table name given for {statement}")]
    MissingTable {
        /// Statement kind being compiled.
        statement: &'static str,
    },

    /// DELETE or UPDATE without any WHERE predicate.
    #[error("{statement} without a WHERE clause is not allowed")]
    MissingWhere {
        /// Statement kind being compiled.
        statement: &'static str,
    },

    /// Batch UPDATE without a row-correlation key.
    #[error("batch update requires a where key column")]
    BatchUpdateWithoutKey,

    /// BETWEEN received the wrong number of bounds.
    #[error("BETWEEN expects exactly 2 bounds, got {0}")]
    BetweenArity(usize),

    /// ORDER BY direction other than ASC, DESC or RANDOM.
    #[error("invalid ORDER BY direction `{0}`")]
    InvalidOrderDirection(String),

    /// Driver name not present in the dialect registry.
    #[error("unknown database driver `{0}`")]
    UnknownDriver(String),

    /// Column type name that no dialect understands.
    #[error("unsupported column type `{0}`")]
    UnsupportedColumnType(String),

    /// Index kind not understood, or not expressible by a dialect.
    #[error("unsupported index type `{kind}` for {dialect}")]
    UnsupportedIndexType {
        /// Index kind.
        kind: String,
        /// Dialect name.
        dialect: &'static str,
    },

    /// Foreign key without a referenced table or with mismatched columns.
    #[error("malformed foreign key `{name}`: {reason}")]
    MalformedForeignKey {
        /// Index name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// CREATE TABLE without any column.
    #[error("table `{0}` must define at least one column")]
    EmptyTable(String),

    /// INSERT/UPDATE without any value.
    #[error("no values set for {statement}")]
    EmptyValues {
        /// Statement kind being compiled.
        statement: &'static str,
    },

    /// Single-row and batch values combined in one statement.
    #[error("single-row and batch values cannot be mixed in one statement")]
    MixedSetValues,

    /// Feature not available in the selected dialect.
    #[error("{feature} is not supported by {dialect}")]
    Unsupported {
        /// Feature name.
        feature: &'static str,
        /// Dialect name.
        dialect: &'static str,
    },

    /// Comparison operator not allowed in a predicate.
    #[error("invalid comparison operator `{0}`")]
    InvalidOperator(String),

    /// Logical operator other than AND/OR.
    #[error("invalid logical operator `{0}`, expected AND or OR")]
    InvalidConjunction(String),

    /// Join type name not recognized.
    #[error("invalid join type `{0}`")]
    InvalidJoinType(String),

    /// Malformed argument to a builder call.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Execution was requested but no connection is bound.
    #[error("no connection bound to the builder")]
    NoConnection,

    /// The connection rejected the statement.
    #[error("{}", execution_message(.message, .code.as_deref(), .sql_state.as_deref()))]
    Execution {
        /// SQL text that failed.
        sql: String,
        /// Driver message.
        message: String,
        /// Raw driver error code.
        code: Option<String>,
        /// Dialect-reported SQLSTATE when it differs from `code`.
        sql_state: Option<String>,
    },
}

fn execution_message(message: &str, code: Option<&str>, sql_state: Option<&str>) -> String {
    match (code, sql_state) {
        (Some(code), Some(state)) => format!("execution failed [{code}/{state}]: {message}"),
        (Some(code), None) => format!("execution failed [{code}]: {message}"),
        (None, Some(state)) => format!("execution failed [{state}]: {message}"),
        (None, None) => format!("execution failed: {message}"),
    }
}

impl QueryError {
    /// Wraps a connection failure for `sql`.
    ///
    /// The SQLSTATE is attached only when it carries information beyond the
    /// raw code.
    #[must_use]
    pub fn execution(sql: impl Into<String>, err: ConnectionError) -> Self {
        let sql_state = match (&err.code, err.sql_state) {
            (Some(code), Some(state)) if *code == state => None,
            (_, state) => state,
        };
        Self::Execution {
            sql: sql.into(),
            message: err.message,
            code: err.code,
            sql_state,
        }
    }

    /// Returns true for errors raised before any SQL reached a connection.
    #[must_use]
    pub const fn is_build_error(&self) -> bool {
        !matches!(self, Self::Execution { .. } | Self::NoConnection)
    }
}

/// Result type for builder operations.
pub type Result<T> = std::result::Result<T, QueryError>;
