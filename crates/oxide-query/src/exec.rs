//! Execution bridge.
//!
//! Builders compile SQL text and hand it to a caller-owned [`Connection`].
//! In prepare mode nothing is executed and the SQL is returned instead.
//! Read results may be cached through an optional [`Cache`].

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::dialect::Driver;
use crate::error::{QueryError, Result};
use crate::value::SqlValue;

/// Failure reported by a connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ConnectionError {
    /// Driver message.
    pub message: String,
    /// Raw driver error code.
    pub code: Option<String>,
    /// SQLSTATE reported by the server.
    pub sql_state: Option<String>,
}

impl ConnectionError {
    /// Creates an error with a message only.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            sql_state: None,
        }
    }

    /// Attaches the raw driver code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attaches the SQLSTATE.
    #[must_use]
    pub fn with_sql_state(mut self, state: impl Into<String>) -> Self {
        self.sql_state = Some(state.into());
        self
    }
}

/// A result row: column names with their values, in select order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Column names.
    pub columns: Vec<String>,
    /// Values, positionally matched with `columns`.
    pub values: Vec<SqlValue>,
}

impl Row {
    /// Returns the value of the named column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    /// Returns the value at `index`.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true for a row without columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, SqlValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (S, SqlValue)>>(iter: I) -> Self {
        let (columns, values) = iter.into_iter().map(|(c, v)| (c.into(), v)).unzip();
        Self { columns, values }
    }
}

/// The database connection a builder executes against.
///
/// Implementations wrap a real driver. Builders only borrow the connection;
/// they never open, pool or close it.
pub trait Connection {
    /// Driver name used to select the dialect (`mysql`, `pgsql`, ...).
    fn driver_name(&self) -> &str;

    /// Executes a statement and returns the number of affected rows.
    fn execute(&self, sql: &str, params: &[SqlValue]) -> std::result::Result<u64, ConnectionError>;

    /// Fetches the first row, if any.
    fn fetch_one(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> std::result::Result<Option<Row>, ConnectionError>;

    /// Fetches all rows.
    fn fetch_all(&self, sql: &str, params: &[SqlValue])
        -> std::result::Result<Vec<Row>, ConnectionError>;

    /// Fetches one column of every row.
    fn fetch_column(
        &self,
        sql: &str,
        params: &[SqlValue],
        index: usize,
    ) -> std::result::Result<Vec<SqlValue>, ConnectionError> {
        Ok(self
            .fetch_all(sql, params)?
            .into_iter()
            .filter_map(|row| row.values.into_iter().nth(index))
            .collect())
    }

    /// Starts a transaction.
    fn begin_transaction(&self) -> std::result::Result<bool, ConnectionError>;

    /// Commits the current transaction.
    fn commit(&self) -> std::result::Result<bool, ConnectionError>;

    /// Rolls back the current transaction.
    fn rollback(&self) -> std::result::Result<bool, ConnectionError>;
}

/// Key-value store for read results.
pub trait Cache {
    /// Whether the cache should be consulted at all.
    fn is_enabled(&self) -> bool;

    /// Returns the rows saved under `key`.
    fn get(&self, key: &str) -> Option<Vec<Row>>;

    /// Saves rows under `key`.
    fn save(&self, key: &str, rows: &[Row]);
}

/// Outcome of realizing a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Realized<T> {
    /// Prepare mode: the compiled SQL, not executed.
    Prepared(String),
    /// The statement ran and produced `T`.
    Done(T),
}

impl<T> Realized<T> {
    /// Returns the SQL of a prepared statement.
    #[must_use]
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Prepared(sql) => Some(sql),
            Self::Done(_) => None,
        }
    }

    /// Consumes the value and returns the SQL of a prepared statement.
    #[must_use]
    pub fn into_sql(self) -> Option<String> {
        match self {
            Self::Prepared(sql) => Some(sql),
            Self::Done(_) => None,
        }
    }

    /// Consumes the value and returns the execution result.
    #[must_use]
    pub fn into_done(self) -> Option<T> {
        match self {
            Self::Prepared(_) => None,
            Self::Done(value) => Some(value),
        }
    }

    /// Returns true in prepare mode.
    #[must_use]
    pub const fn is_prepared(&self) -> bool {
        matches!(self, Self::Prepared(_))
    }

    /// Maps the execution result.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Realized<U> {
        match self {
            Self::Prepared(sql) => Realized::Prepared(sql),
            Self::Done(value) => Realized::Done(f(value)),
        }
    }
}

/// Result of a raw [`query`](crate::QueryBuilder::query).
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Rows returned by a read statement.
    Rows(Vec<Row>),
    /// Rows affected by a write statement.
    Affected(u64),
}

/// Returns true when `sql` is a read whose result may be cached.
#[must_use]
pub fn is_cacheable(sql: &str) -> bool {
    static READ_RE: OnceLock<Regex> = OnceLock::new();
    READ_RE
        .get_or_init(|| {
            Regex::new(r"(?i)^\s*(SELECT|SHOW|DESCRIBE)\b").expect("invalid built-in read regex")
        })
        .is_match(sql)
}

/// Which reader a cached entry belongs to.
///
/// Full rowsets and single-row results are stored under separate keys so
/// that one reader never answers for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheScope {
    /// Every row of the result.
    All,
    /// The first row only.
    First,
}

/// Cache key for `sql` run through `driver` with `params` bound.
///
/// Bound parameters are appended as JSON. Returns `None` when they cannot
/// be serialized, in which case the read bypasses the cache.
#[must_use]
pub fn cache_key(
    driver: Driver,
    scope: CacheScope,
    sql: &str,
    params: &[SqlValue],
) -> Option<String> {
    let mut key = match scope {
        CacheScope::All => format!("{driver}:{sql}"),
        CacheScope::First => format!("{driver}/first:{sql}"),
    };
    if !params.is_empty() {
        let bound = serde_json::to_string(params).ok()?;
        key.push_str("\n-- params ");
        key.push_str(&bound);
    }
    Some(key)
}

/// Forwards compiled SQL to the borrowed connection and cache.
#[derive(Clone, Copy)]
pub struct Executor<'c> {
    driver: Driver,
    connection: Option<&'c dyn Connection>,
    cache: Option<&'c dyn Cache>,
    use_cache: bool,
}

impl std::fmt::Debug for Executor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("driver", &self.driver)
            .field("connected", &self.connection.is_some())
            .field("cached", &self.cache.is_some())
            .field("use_cache", &self.use_cache)
            .finish()
    }
}

impl<'c> Executor<'c> {
    /// Creates an executor without a connection (compile-only).
    #[must_use]
    pub const fn detached(driver: Driver) -> Self {
        Self {
            driver,
            connection: None,
            cache: None,
            use_cache: true,
        }
    }

    /// Creates an executor bound to `connection`.
    #[must_use]
    pub fn new(driver: Driver, connection: &'c dyn Connection) -> Self {
        Self {
            driver,
            connection: Some(connection),
            cache: None,
            use_cache: true,
        }
    }

    /// Attaches a cache.
    #[must_use]
    pub fn with_cache(mut self, cache: &'c dyn Cache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Turns cache lookups on or off.
    pub fn set_use_cache(&mut self, enabled: bool) {
        self.use_cache = enabled;
    }

    /// Returns the bound connection, if any.
    #[must_use]
    pub fn connection(&self) -> Option<&'c dyn Connection> {
        self.connection
    }

    /// Returns the attached cache, if any.
    #[must_use]
    pub fn cache(&self) -> Option<&'c dyn Cache> {
        self.cache
    }

    fn conn(&self) -> Result<&'c dyn Connection> {
        self.connection.ok_or(QueryError::NoConnection)
    }

    fn cache_slot(
        &self,
        scope: CacheScope,
        sql: &str,
        params: &[SqlValue],
    ) -> Option<(&'c dyn Cache, String)> {
        let cache = self
            .cache
            .filter(|cache| self.use_cache && cache.is_enabled() && is_cacheable(sql))?;
        cache_key(self.driver, scope, sql, params).map(|key| (cache, key))
    }

    /// Executes a statement and returns the affected row count.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NoConnection`] or the wrapped connection failure.
    pub fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        let conn = self.conn()?;
        debug!(sql = %sql, "Executing SQL");
        conn.execute(sql, params).map_err(|err| fail(sql, err))
    }

    /// Fetches all rows, going through the cache for cacheable reads.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NoConnection`] or the wrapped connection failure.
    pub fn fetch_all(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        let conn = self.conn()?;
        let cached = self.cache_slot(CacheScope::All, sql, params);
        if let Some((cache, key)) = &cached {
            if let Some(rows) = cache.get(key) {
                debug!(key = %key, rows = rows.len(), "Cache hit");
                return Ok(rows);
            }
        }
        debug!(sql = %sql, "Executing SQL");
        let rows = conn.fetch_all(sql, params).map_err(|err| fail(sql, err))?;
        if let Some((cache, key)) = cached {
            debug!(key = %key, rows = rows.len(), "Cache miss, saving result");
            cache.save(&key, &rows);
        }
        Ok(rows)
    }

    /// Fetches the first row, going through the cache for cacheable reads.
    ///
    /// A full rowset cached by [`fetch_all`](Self::fetch_all) answers this
    /// read too. The single row fetched here is saved under its own key.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NoConnection`] or the wrapped connection failure.
    pub fn fetch_one(&self, sql: &str, params: &[SqlValue]) -> Result<Option<Row>> {
        let conn = self.conn()?;
        let cached = self.cache_slot(CacheScope::First, sql, params);
        if let Some((cache, key)) = &cached {
            let all = cache_key(self.driver, CacheScope::All, sql, params);
            let hit = all
                .and_then(|all| cache.get(&all))
                .or_else(|| cache.get(key));
            if let Some(rows) = hit {
                debug!(key = %key, "Cache hit");
                return Ok(rows.into_iter().next());
            }
        }
        debug!(sql = %sql, "Executing SQL");
        let row = conn.fetch_one(sql, params).map_err(|err| fail(sql, err))?;
        if let Some((cache, key)) = cached {
            debug!(key = %key, "Cache miss, saving result");
            cache.save(&key, row.as_slice());
        }
        Ok(row)
    }

    /// Fetches one column of every row. Not cached.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NoConnection`] or the wrapped connection failure.
    pub fn fetch_column(&self, sql: &str, params: &[SqlValue], index: usize) -> Result<Vec<SqlValue>> {
        let conn = self.conn()?;
        debug!(sql = %sql, index, "Executing SQL");
        conn.fetch_column(sql, params, index)
            .map_err(|err| fail(sql, err))
    }

    /// Starts a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NoConnection`] or the wrapped connection failure.
    pub fn begin(&self) -> Result<bool> {
        let conn = self.conn()?;
        info!(driver = %self.driver, "Beginning transaction");
        conn.begin_transaction()
            .map_err(|err| fail("BEGIN", err))
    }

    /// Commits the current transaction.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NoConnection`] or the wrapped connection failure.
    pub fn commit(&self) -> Result<bool> {
        let conn = self.conn()?;
        info!(driver = %self.driver, "Committing transaction");
        conn.commit().map_err(|err| fail("COMMIT", err))
    }

    /// Rolls back the current transaction.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NoConnection`] or the wrapped connection failure.
    pub fn rollback(&self) -> Result<bool> {
        let conn = self.conn()?;
        info!(driver = %self.driver, "Rolling back transaction");
        conn.rollback().map_err(|err| fail("ROLLBACK", err))
    }

    /// Runs each statement in order and sums the affected rows.
    ///
    /// Stops at the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NoConnection`] or the wrapped connection failure.
    pub fn execute_all(&self, statements: &[String]) -> Result<u64> {
        statements
            .iter()
            .try_fold(0_u64, |total, sql| Ok(total + self.execute(sql, &[])?))
    }
}

fn fail(sql: &str, err: ConnectionError) -> QueryError {
    warn!(sql = %sql, error = %err.message, code = ?err.code, "Statement failed");
    QueryError::execution(sql, err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_cacheable() {
        assert!(is_cacheable("SELECT * FROM t"));
        assert!(is_cacheable("  \n select 1"));
        assert!(is_cacheable("SHOW TABLES"));
        assert!(is_cacheable("describe users"));
        assert!(!is_cacheable("SELECTED"));
        assert!(!is_cacheable("UPDATE t SET a = 1"));
        assert!(!is_cacheable("WITH x AS (SELECT 1) SELECT * FROM x"));
    }

    #[test]
    fn test_cache_key() {
        assert_eq!(
            cache_key(Driver::Sqlite, CacheScope::All, "SELECT 1", &[]).as_deref(),
            Some("sqlite:SELECT 1")
        );
        assert_eq!(
            cache_key(Driver::Sqlite, CacheScope::First, "SELECT 1", &[]).as_deref(),
            Some("sqlite/first:SELECT 1")
        );
    }

    #[test]
    fn test_cache_key_includes_bound_params() {
        let sql = "SELECT * FROM t WHERE id = ?";
        let one = cache_key(Driver::MySql, CacheScope::All, sql, &[SqlValue::Int(1)]);
        let two = cache_key(Driver::MySql, CacheScope::All, sql, &[SqlValue::Int(2)]);
        assert_eq!(
            one.as_deref(),
            Some("mysql:SELECT * FROM t WHERE id = ?\n-- params [{\"Int\":1}]")
        );
        assert_ne!(one, two);
    }

    #[test]
    fn test_detached_executor_has_no_connection() {
        let exec = Executor::detached(Driver::MySql);
        assert!(matches!(
            exec.execute("DELETE FROM t", &[]),
            Err(QueryError::NoConnection)
        ));
    }

    #[test]
    fn test_row_lookup() {
        let row: Row = [("id", SqlValue::Int(1)), ("name", SqlValue::Text(String::from("x")))]
            .into_iter()
            .collect();
        assert_eq!(row.get("id"), Some(&SqlValue::Int(1)));
        assert_eq!(row.get_index(1), Some(&SqlValue::Text(String::from("x"))));
        assert!(row.get("missing").is_none());
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn test_realized_accessors() {
        let prepared: Realized<u64> = Realized::Prepared(String::from("DELETE FROM t"));
        assert!(prepared.is_prepared());
        assert_eq!(prepared.sql(), Some("DELETE FROM t"));
        assert_eq!(Realized::Done(3_u64).map(|n| n * 2).into_done(), Some(6));
    }
}
