//! Schema builder: CREATE / ALTER / DROP statements.
//!
//! Columns and indexes are either accumulated and consumed by
//! [`SchemaBuilder::create_table`], or applied right away to an existing
//! table with [`SchemaBuilder::add_column`] / [`SchemaBuilder::add_index`].
//!
//! # Example
//!
//! ```rust
//! use oxide_query::schema::{integer, primary_key, string, IndexBuilder, SchemaBuilder};
//! use oxide_query::{BuilderOptions, Driver};
//!
//! let mut schema = SchemaBuilder::with_options(Driver::Sqlite, BuilderOptions::prepared());
//! schema
//!     .column(primary_key("id"))
//!     .column(string("email").size(120))
//!     .column(integer("age").null())
//!     .index(IndexBuilder::unique(["email"]));
//!
//! let sql = schema.create_table("users").unwrap().into_sql().unwrap();
//! assert_eq!(
//!     sql,
//!     "CREATE TABLE \"users\" (\n    \
//!      \"id\" integer PRIMARY KEY AUTOINCREMENT NOT NULL,\n    \
//!      \"email\" varchar(120) NOT NULL,\n    \
//!      \"age\" integer NULL,\n    \
//!      CONSTRAINT \"uniq_users_email\" UNIQUE (\"email\")\n)"
//! );
//! ```

mod column;
mod index;

pub use column::{
    big_integer, big_primary_key, binary, boolean, char, date, date_time, decimal, double,
    enumeration, float, integer, json, long_text, medium_text, money, primary_key, small_integer,
    string, text, time, timestamp, tiny_integer, tiny_text, ColumnBuilder, ColumnDefinition,
    ColumnSpec, ColumnType, Constraint, DefaultValue, Position,
};
pub use index::{
    ForeignKeyAction, ForeignKeyRef, IndexBuilder, IndexDefinition, IndexKind, IndexSpec,
};

use tracing::warn;

use crate::config::BuilderOptions;
use crate::dialect::{self, Dialect, Driver};
use crate::error::{QueryError, Result};
use crate::exec::{Connection, Executor, Realized};
use crate::protect::IdentifierProtector;

/// Fluent DDL compiler.
#[derive(Debug)]
pub struct SchemaBuilder<'c> {
    dialect: &'static dyn Dialect,
    options: BuilderOptions,
    executor: Executor<'c>,
    columns: Vec<ColumnSpec>,
    indexes: Vec<IndexSpec>,
    if_not_exists: bool,
    table_options: Option<String>,
}

impl<'c> SchemaBuilder<'c> {
    /// Creates a compile-only builder with default options.
    #[must_use]
    pub fn new(driver: Driver) -> Self {
        Self::with_options(driver, BuilderOptions::default())
    }

    /// Creates a compile-only builder.
    #[must_use]
    pub fn with_options(driver: Driver, options: BuilderOptions) -> Self {
        Self {
            dialect: driver.dialect(),
            options,
            executor: Executor::detached(driver),
            columns: Vec::new(),
            indexes: Vec::new(),
            if_not_exists: false,
            table_options: None,
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

    /// Creates a builder executing against `connection`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownDriver`] when the connection reports an
    /// unknown driver name.
    pub fn with_connection(connection: &'c dyn Connection, options: BuilderOptions) -> Result<Self> {
        let driver: Driver = connection.driver_name().parse()?;
        let mut builder = Self::with_options(driver, options);
        builder.executor = Executor::new(driver, connection);
        Ok(builder)
    }

    /// Returns the dialect.
    #[must_use]
    pub fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
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

    fn protector(&self) -> IdentifierProtector<'_> {
        IdentifierProtector::new(self.dialect, &self.options)
    }

    /// Queues a column for the next CREATE TABLE.
    pub fn column(&mut self, column: impl Into<ColumnSpec>) -> &mut Self {
        self.columns.push(column.into());
        self
    }

    /// Queues a raw column definition for the next CREATE TABLE.
    pub fn raw_column(&mut self, name: &str, definition: &str) -> &mut Self {
        self.columns.push(ColumnSpec::raw(name, definition));
        self
    }

    /// Queues an index for the next CREATE TABLE.
    pub fn index(&mut self, index: impl Into<IndexSpec>) -> &mut Self {
        self.indexes.push(index.into());
        self
    }

    /// Adds IF NOT EXISTS to the next CREATE TABLE.
    pub fn if_not_exists(&mut self) -> &mut Self {
        self.if_not_exists = true;
        self
    }

    /// Appends raw table options (e.g. `ENGINE=InnoDB`) to the next CREATE TABLE.
    pub fn table_options(&mut self, options: &str) -> &mut Self {
        self.table_options = Some(options.to_string());
        self
    }

    fn reset(&mut self) {
        self.columns.clear();
        self.indexes.clear();
        self.if_not_exists = false;
        self.table_options = None;
    }

    /// Runs or returns `compiled`. Queued columns and indexes belong to the
    /// next CREATE TABLE and are left alone.
    fn realize(&self, compiled: Result<Vec<String>>) -> Result<Realized<u64>> {
        let statements = compiled?;
        if self.options.prepare {
            return Ok(Realized::Prepared(statements.join(";\n")));
        }
        self.executor.execute_all(&statements).map(Realized::Done)
    }

    fn column_sql(&self, p: &IdentifierProtector<'_>, column: &ColumnSpec) -> String {
        match column {
            ColumnSpec::Typed(def) => self.dialect.column_definition(p, def),
            ColumnSpec::Raw { name, definition } => format!("{} {definition}", p.quote(name)),
        }
    }

    /// Compiles CREATE TABLE from the queued columns and indexes.
    ///
    /// Returns the CREATE TABLE statement followed by any column comments
    /// and indexes the dialect cannot declare inline.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::EmptyTable`] without columns, and index
    /// validation errors.
    pub fn compile_create_table(&self, table: &str) -> Result<Vec<String>> {
        if self.columns.is_empty() {
            return Err(QueryError::EmptyTable(table.to_string()));
        }
        let p = self.protector();
        let target = p.protect_table(table);

        let mut items: Vec<String> = self.columns.iter().map(|c| self.column_sql(&p, c)).collect();
        let mut trailing = Vec::new();
        for column in &self.columns {
            if let ColumnSpec::Typed(def) = column {
                if let Some(comment) = &def.comment {
                    trailing.extend(self.dialect.comment_statement(
                        &target,
                        &p.quote(&def.name),
                        comment,
                    ));
                }
            }
        }
        for index in &self.indexes {
            match index {
                IndexSpec::Raw(sql) => items.push(sql.clone()),
                IndexSpec::Typed(def) => {
                    def.validate(table)?;
                    if self.dialect.supports_inline_index(def.kind) {
                        items.push(self.dialect.inline_index(&p, table, def)?);
                    } else {
                        trailing.push(self.dialect.create_index_statement(&p, table, def)?);
                    }
                }
            }
        }

        let mut sql = String::from("CREATE TABLE ");
        if self.if_not_exists {
            if self.dialect.supports_if_not_exists() {
                sql.push_str("IF NOT EXISTS ");
            } else {
                warn!(dialect = self.dialect.name(), "IF NOT EXISTS ignored, not supported");
            }
        }
        sql.push_str(&target);
        if self.options.optimize {
            sql.push_str(" (");
            sql.push_str(&items.join(", "));
            sql.push(')');
        } else {
            sql.push_str(" (\n    ");
            sql.push_str(&items.join(",\n    "));
            sql.push_str("\n)");
        }
        if let Some(options) = &self.table_options {
            sql.push(' ');
            sql.push_str(options);
        }

        let mut statements = vec![sql];
        statements.extend(trailing);
        Ok(statements)
    }

    /// Creates a table from the queued columns and indexes.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::EmptyTable`] without columns, index validation
    /// errors, or the execution failure.
    pub fn create_table(&mut self, table: &str) -> Result<Realized<u64>> {
        let compiled = self.compile_create_table(table);
        self.reset();
        self.realize(compiled)
    }

    /// Adds a column to an existing table right away.
    ///
    /// # Errors
    ///
    /// Returns the execution failure.
    pub fn add_column(&mut self, table: &str, column: impl Into<ColumnSpec>) -> Result<Realized<u64>> {
        let column = column.into();
        let compiled: Result<Vec<String>> = {
            let p = self.protector();
            let target = p.protect_table(table);
            let mut definition = self.column_sql(&p, &column);
            let mut statements = Vec::new();
            if let ColumnSpec::Typed(def) = &column {
                if let Some(position) = self.dialect.column_position(&p, &def.position) {
                    definition.push(' ');
                    definition.push_str(&position);
                }
                if let Some(comment) = &def.comment {
                    statements.extend(self.dialect.comment_statement(
                        &target,
                        &p.quote(&def.name),
                        comment,
                    ));
                }
            }
            statements.insert(0, self.dialect.add_column_statement(&target, &definition));
            Ok(statements)
        };
        self.realize(compiled)
    }

    /// Adds an index or key constraint to an existing table right away.
    ///
    /// # Errors
    ///
    /// Returns validation errors, [`QueryError::UnsupportedIndexType`] or
    /// the execution failure.
    pub fn add_index(&mut self, table: &str, index: impl Into<IndexSpec>) -> Result<Realized<u64>> {
        let compiled = match index.into() {
            IndexSpec::Raw(sql) => Ok(vec![format!(
                "ALTER TABLE {} ADD {sql}",
                self.protector().protect_table(table)
            )]),
            IndexSpec::Typed(def) => def.validate(table).and_then(|()| {
                self.dialect
                    .create_index_statement(&self.protector(), table, &def)
                    .map(|sql| vec![sql])
            }),
        };
        self.realize(compiled)
    }

    /// Adds a foreign key to an existing table.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MalformedForeignKey`] when `index` is not a
    /// complete foreign key, or the execution failure.
    pub fn add_foreign_key(&mut self, table: &str, index: IndexDefinition) -> Result<Realized<u64>> {
        if index.kind != IndexKind::Foreign {
            return Err(QueryError::MalformedForeignKey {
                name: index.resolved_name(table),
                reason: format!("index kind is {}", index.kind),
            });
        }
        self.add_index(table, index)
    }

    /// Drops a table.
    ///
    /// # Errors
    ///
    /// Returns the execution failure.
    pub fn drop_table(&mut self, table: &str) -> Result<Realized<u64>> {
        let sql = self
            .dialect
            .drop_table_statement(&self.protector().protect_table(table), false);
        self.realize(Ok(vec![sql]))
    }

    /// Drops a table if it exists.
    ///
    /// # Errors
    ///
    /// Returns the execution failure.
    pub fn drop_table_if_exists(&mut self, table: &str) -> Result<Realized<u64>> {
        let sql = self
            .dialect
            .drop_table_statement(&self.protector().protect_table(table), true);
        self.realize(Ok(vec![sql]))
    }

    /// Renames a table.
    ///
    /// # Errors
    ///
    /// Returns the execution failure.
    pub fn rename_table(&mut self, from: &str, to: &str) -> Result<Realized<u64>> {
        let sql = self
            .dialect
            .rename_table_statement(&self.protector(), from, to);
        self.realize(Ok(vec![sql]))
    }

    /// Drops a column.
    ///
    /// # Errors
    ///
    /// Returns the execution failure.
    pub fn drop_column(&mut self, table: &str, column: &str) -> Result<Realized<u64>> {
        let p = self.protector();
        let sql = self
            .dialect
            .drop_column_statement(&p.protect_table(table), &p.quote(column));
        self.realize(Ok(vec![sql]))
    }

    /// Renames a column.
    ///
    /// # Errors
    ///
    /// Returns the execution failure.
    pub fn rename_column(&mut self, table: &str, from: &str, to: &str) -> Result<Realized<u64>> {
        let sql = self
            .dialect
            .rename_column_statement(&self.protector(), table, from, to);
        self.realize(Ok(vec![sql]))
    }

    /// Changes the type, nullability and default of a column.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Unsupported`] on SQLite, or the execution
    /// failure.
    pub fn alter_column(&mut self, table: &str, column: impl Into<ColumnDefinition>) -> Result<Realized<u64>> {
        let def = column.into();
        let compiled = self
            .dialect
            .alter_column_statements(&self.protector(), table, &def);
        self.realize(compiled)
    }

    /// Drops an index.
    ///
    /// # Errors
    ///
    /// Returns the execution failure.
    pub fn drop_index(&mut self, table: &str, name: &str) -> Result<Realized<u64>> {
        let sql = self
            .dialect
            .drop_index_statement(&self.protector(), table, name);
        self.realize(Ok(vec![sql]))
    }

    /// Drops a foreign key constraint.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Unsupported`] on SQLite, or the execution
    /// failure.
    pub fn drop_foreign_key(&mut self, table: &str, name: &str) -> Result<Realized<u64>> {
        let compiled = self
            .dialect
            .drop_foreign_key_statement(&self.protector(), table, name)
            .map(|sql| vec![sql]);
        self.realize(compiled)
    }
}

impl From<ColumnBuilder> for ColumnDefinition {
    fn from(builder: ColumnBuilder) -> Self {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prepared(driver: Driver) -> SchemaBuilder<'static> {
        SchemaBuilder::with_options(driver, BuilderOptions::prepared())
    }

    fn sql(r: Result<Realized<u64>>) -> String {
        r.unwrap().into_sql().unwrap()
    }

    #[test]
    fn test_create_table_requires_columns() {
        let mut schema = prepared(Driver::MySql);
        assert!(matches!(
            schema.create_table("empty"),
            Err(QueryError::EmptyTable(name)) if name == "empty"
        ));
    }

    #[test]
    fn test_state_resets_after_create() {
        let mut schema = prepared(Driver::Sqlite);
        schema.column(integer("a"));
        sql(schema.create_table("t1"));
        assert!(matches!(
            schema.create_table("t2"),
            Err(QueryError::EmptyTable(_))
        ));
    }

    #[test]
    fn test_immediate_operations_keep_the_queue() {
        let mut schema = prepared(Driver::Sqlite);
        schema.column(integer("a")).index(IndexBuilder::key(["a"]));
        sql(schema.drop_table("old"));
        sql(schema.add_column("other", integer("b")));
        assert!(schema.add_index("other", IndexBuilder::key(Vec::<String>::new())).is_err());
        assert_eq!(
            sql(schema.create_table("t")),
            "CREATE TABLE \"t\" (\n    \"a\" integer NOT NULL\n);\n\
             CREATE INDEX \"idx_t_a\" ON \"t\" (\"a\")"
        );
    }

    #[test]
    fn test_optimized_create_table() {
        let mut schema = prepared(Driver::Postgres);
        schema.optimize(true).column(primary_key("id")).column(text("body"));
        assert_eq!(
            sql(schema.create_table("notes")),
            "CREATE TABLE \"notes\" (\"id\" serial NOT NULL PRIMARY KEY, \"body\" text NOT NULL)"
        );
    }

    #[test]
    fn test_add_column_with_position() {
        let mut schema = prepared(Driver::MySql);
        assert_eq!(
            sql(schema.add_column("users", string("nick").size(32).null().after("name"))),
            "ALTER TABLE `users` ADD COLUMN `nick` varchar(32) NULL AFTER `name`"
        );
        // position is dropped where unsupported
        let mut schema = prepared(Driver::Postgres);
        assert_eq!(
            sql(schema.add_column("users", string("nick").first())),
            "ALTER TABLE \"users\" ADD COLUMN \"nick\" varchar(255) NOT NULL"
        );
    }

    #[test]
    fn test_add_foreign_key_rejects_other_kinds() {
        let mut schema = prepared(Driver::Postgres);
        assert!(matches!(
            schema.add_foreign_key("posts", IndexBuilder::key(["a"]).build()),
            Err(QueryError::MalformedForeignKey { .. })
        ));
    }
}
