//! # oxide-query
//!
//! A driver-agnostic fluent SQL builder.
//!
//! This crate provides:
//! - [`QueryBuilder`]: SELECT, INSERT, UPDATE, DELETE and TRUNCATE with
//!   joins, CTEs, unions, batch inserts and CASE-based batch updates
//! - [`SchemaBuilder`]: CREATE, ALTER and DROP for tables, columns, indexes
//!   and foreign keys
//! - One [`Dialect`] per supported engine (`mysql`, `pgsql`, `sqlite`,
//!   `sqlsrv`, `oci`), selected through the closed [`Driver`] enum
//! - An execution bridge over a caller-owned [`Connection`] and optional
//!   [`Cache`], with a prepare mode that returns SQL instead of running it
//!
//! ## Conditions
//!
//! WHERE and HAVING are condition trees. Groups are built by closures, so
//! parentheses always balance:
//!
//! ```rust
//! use oxide_query::{BuilderOptions, Driver, QueryBuilder};
//!
//! let options = BuilderOptions::prepared().with_protect_identifiers(false);
//! let mut qb = QueryBuilder::with_options(Driver::Sqlite, options);
//! qb.from("t")
//!     .where_group(|g| {
//!         g.where_("a", 1)?.or_where("b", 2)?;
//!         Ok(())
//!     })?
//!     .where_("c", 3)?;
//!
//! assert_eq!(
//!     qb.get()?.into_sql().unwrap(),
//!     "SELECT *\nFROM t\nWHERE (a = 1 OR b = 2)\nAND c = 3"
//! );
//! # Ok::<(), oxide_query::QueryError>(())
//! ```
//!
//! ## Dialects
//!
//! The same chain compiles differently per engine:
//!
//! ```rust
//! use oxide_query::{BuilderOptions, Driver, QueryBuilder};
//!
//! for (driver, expected) in [
//!     (Driver::MySql, "SELECT `id`\nFROM `users`\nLIMIT 10, 5"),
//!     (Driver::Postgres, "SELECT \"id\"\nFROM \"users\"\nLIMIT 5 OFFSET 10"),
//! ] {
//!     let mut qb = QueryBuilder::with_options(driver, BuilderOptions::prepared());
//!     qb.select("id").from("users").limit(5).offset(10);
//!     assert_eq!(qb.get()?.into_sql().unwrap(), expected);
//! }
//! # Ok::<(), oxide_query::QueryError>(())
//! ```

pub mod condition;
pub mod config;
pub mod dialect;
pub mod error;
pub mod exec;
pub mod protect;
pub mod query;
pub mod schema;
pub mod value;

pub use condition::{Conditions, Conjunction, LikeSide};
pub use config::BuilderOptions;
pub use dialect::{Dialect, Driver};
pub use error::{QueryError, Result};
pub use exec::{Cache, CacheScope, Connection, ConnectionError, Executor, Outcome, Realized, Row};
pub use protect::IdentifierProtector;
pub use query::{JoinType, QueryBuilder};
pub use schema::SchemaBuilder;
pub use value::{SqlValue, ToSqlValue};
