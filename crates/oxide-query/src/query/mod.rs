//! Fluent query builder.
//!
//! A [`QueryBuilder`] accumulates one statement at a time. A realizing call
//! (`get`, `insert`, `update`, `delete`, ...) compiles the statement, then
//! either returns the SQL (prepare mode) or runs it on the bound connection.
//! The accumulated state is cleared by every realizing call, whether it
//! succeeds or not.
//!
//! # Example
//!
//! ```rust
//! use oxide_query::{BuilderOptions, Driver, QueryBuilder};
//!
//! let mut qb = QueryBuilder::with_options(Driver::MySql, BuilderOptions::prepared());
//! qb.select("id, name")
//!     .from("users")
//!     .where_("active", true)?
//!     .where_("age >=", 18)?
//!     .order_by("name", "ASC")?
//!     .limit(10);
//!
//! let sql = qb.get()?.into_sql().unwrap();
//! assert_eq!(
//!     sql,
//!     "SELECT `id`, `name`\nFROM `users`\nWHERE `active` = 1\nAND `age` >= 18\nORDER BY `name` ASC\nLIMIT 10"
//! );
//! # Ok::<(), oxide_query::QueryError>(())
//! ```

mod select;
mod state;
mod write;

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::config::BuilderOptions;
use crate::dialect::{self, Dialect, Driver};
use crate::error::{QueryError, Result};
use crate::exec::{is_cacheable, Cache, Connection, Executor, Outcome, Realized};
use crate::protect::IdentifierProtector;
use crate::value::SqlValue;

use state::QueryState;

/// Join flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    /// `INNER JOIN`.
    #[default]
    Inner,
    /// `LEFT JOIN`.
    Left,
    /// `RIGHT JOIN`.
    Right,
    /// `FULL OUTER JOIN`.
    Full,
    /// `LEFT OUTER JOIN`.
    LeftOuter,
    /// `RIGHT OUTER JOIN`.
    RightOuter,
    /// `CROSS JOIN`, without condition.
    Cross,
}

impl JoinType {
    /// Returns the SQL keywords.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL OUTER JOIN",
            Self::LeftOuter => "LEFT OUTER JOIN",
            Self::RightOuter => "RIGHT OUTER JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for JoinType {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s
            .split_whitespace()
            .map(str::to_ascii_uppercase)
            .collect::<Vec<_>>()
            .join(" ");
        let normalized = normalized.strip_suffix(" JOIN").unwrap_or(&normalized);
        match normalized {
            "" | "INNER" | "JOIN" => Ok(Self::Inner),
            "LEFT" => Ok(Self::Left),
            "RIGHT" => Ok(Self::Right),
            "FULL" | "FULL OUTER" | "OUTER" => Ok(Self::Full),
            "LEFT OUTER" => Ok(Self::LeftOuter),
            "RIGHT OUTER" => Ok(Self::RightOuter),
            "CROSS" => Ok(Self::Cross),
            _ => Err(QueryError::InvalidJoinType(s.to_string())),
        }
    }
}

/// Fluent SELECT / INSERT / UPDATE / DELETE compiler.
#[derive(Debug)]
pub struct QueryBuilder<'c> {
    dialect: &'static dyn Dialect,
    options: BuilderOptions,
    executor: Executor<'c>,
    state: QueryState,
}

impl<'c> QueryBuilder<'c> {
    /// Creates a compile-only builder with default options.
    #[must_use]
    pub fn new(driver: Driver) -> Self {
        Self::with_options(driver, BuilderOptions::default())
    }

    /// Creates a compile-only builder.
    #[must_use]
    pub fn with_options(driver: Driver, options: BuilderOptions) -> Self {
        let mut executor = Executor::detached(driver);
        executor.set_use_cache(options.cache);
        Self {
            dialect: driver.dialect(),
            options,
            executor,
            state: QueryState::default(),
        }
    }

    /// Creates a compile-only builder from a driver name.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownDriver`] for names outside the registry.
    pub fn create(driver_name: &str, options: BuilderOptions) -> Result<Self> {
        let dialect = dialect::create(driver_name)?;
        Ok(Self::with_options(dialect.driver(), options))
    }

    /// Creates a builder executing against `connection`; its driver name
    /// selects the dialect.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownDriver`] when the connection reports an
    /// unknown driver name.
    pub fn with_connection(connection: &'c dyn Connection, options: BuilderOptions) -> Result<Self> {
        let driver: Driver = connection.driver_name().parse()?;
        let mut executor = Executor::new(driver, connection);
        executor.set_use_cache(options.cache);
        Ok(Self {
            dialect: driver.dialect(),
            options,
            executor,
            state: QueryState::default(),
        })
    }

    /// Attaches a read cache.
    #[must_use]
    pub fn with_cache(mut self, cache: &'c dyn Cache) -> Self {
        self.executor = self.executor.with_cache(cache);
        self
    }

    /// Returns the dialect.
    #[must_use]
    pub fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    /// Returns the driver.
    #[must_use]
    pub fn driver(&self) -> Driver {
        self.dialect.driver()
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Turns prepare mode on or off.
    pub fn prepare(&mut self, enabled: bool) -> &mut Self {
        self.options.prepare = enabled;
        self
    }

    /// Turns single-line output on or off.
    pub fn optimize(&mut self, enabled: bool) -> &mut Self {
        self.options.optimize = enabled;
        self
    }

    /// Turns cache lookups on or off.
    pub fn cache(&mut self, enabled: bool) -> &mut Self {
        self.options.cache = enabled;
        self.executor.set_use_cache(enabled);
        self
    }

    /// A fresh builder sharing dialect, options, connection and cache.
    #[must_use]
    pub fn fork(&self) -> Self {
        Self {
            dialect: self.dialect,
            options: self.options.clone(),
            executor: self.executor,
            state: QueryState::default(),
        }
    }

    /// Discards everything accumulated for the current statement.
    pub fn reset(&mut self) -> &mut Self {
        self.state = QueryState::default();
        self
    }

    pub(crate) fn protector(&self) -> IdentifierProtector<'_> {
        IdentifierProtector::new(self.dialect, &self.options).with_aliases(&self.state.aliases)
    }

    /// Clause separator: one clause per line unless optimized.
    pub(crate) const fn separator(&self) -> &'static str {
        if self.options.optimize {
            " "
        } else {
            "\n"
        }
    }

    /// Clears the state, then returns the SQL or runs it.
    pub(crate) fn realize<T>(
        &mut self,
        compiled: Result<String>,
        run: impl FnOnce(&Executor<'c>, &str) -> Result<T>,
    ) -> Result<Realized<T>> {
        self.reset();
        let sql = compiled?;
        if self.options.prepare {
            return Ok(Realized::Prepared(sql));
        }
        run(&self.executor, &sql).map(Realized::Done)
    }

    /// Like [`realize`](Self::realize) for several statements.
    pub(crate) fn realize_all(&mut self, compiled: Result<Vec<String>>) -> Result<Realized<u64>> {
        self.reset();
        let statements = compiled?;
        if self.options.prepare {
            return Ok(Realized::Prepared(statements.join(";\n")));
        }
        self.executor.execute_all(&statements).map(Realized::Done)
    }

    /// Runs hand-written SQL with bound parameters.
    ///
    /// Reads (`SELECT`, `SHOW`, `DESCRIBE`) return rows and go through the
    /// cache; anything else returns the affected row count.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NoConnection`] or the execution failure.
    pub fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Realized<Outcome>> {
        self.realize(Ok(sql.to_string()), |exec, sql| {
            if is_cacheable(sql) {
                exec.fetch_all(sql, params).map(Outcome::Rows)
            } else {
                exec.execute(sql, params).map(Outcome::Affected)
            }
        })
    }

    /// Runs `f` inside a transaction.
    ///
    /// Commits when `f` returns `Ok` and rolls back otherwise. Nothing is
    /// retried.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, or a failure to begin or commit.
    pub fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.executor.begin()?;
        match f(self) {
            Ok(value) => {
                self.executor.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = self.executor.rollback() {
                    warn!(error = %rollback, "Rollback failed");
                }
                Err(err)
            }
        }
    }
}
