//! SQL dialect support.
//!
//! Every supported engine is a variant of [`Driver`] and a unit struct
//! implementing [`Dialect`]. The trait carries the generic rendering as
//! default methods; each engine overrides only what differs (quote
//! characters, type names, LIMIT syntax, DDL quirks).

mod mysql;
mod oracle;
mod postgres;
mod sqlite;
mod sqlsrv;

pub use mysql::MySqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;
pub use sqlsrv::SqlServerDialect;

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

use crate::error::{QueryError, Result};
use crate::protect::IdentifierProtector;
use crate::schema::{
    ColumnDefinition, ColumnType, Constraint, DefaultValue, IndexDefinition, IndexKind, Position,
};
use crate::value::{escape_quotes, hex_upper, SqlValue};

/// Supported database engines, keyed by driver name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
    /// MySQL / MariaDB (`mysql`).
    MySql,
    /// PostgreSQL (`pgsql`).
    Postgres,
    /// SQLite 3 (`sqlite`).
    Sqlite,
    /// Microsoft SQL Server (`sqlsrv`).
    SqlServer,
    /// Oracle (`oci`).
    Oracle,
}

impl Driver {
    /// All drivers.
    pub const ALL: [Self; 5] = [
        Self::MySql,
        Self::Postgres,
        Self::Sqlite,
        Self::SqlServer,
        Self::Oracle,
    ];

    /// Returns the canonical driver name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Postgres => "pgsql",
            Self::Sqlite => "sqlite",
            Self::SqlServer => "sqlsrv",
            Self::Oracle => "oci",
        }
    }

    /// Returns the dialect implementation for this driver.
    #[must_use]
    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            Self::MySql => &MySqlDialect,
            Self::Postgres => &PostgresDialect,
            Self::Sqlite => &SqliteDialect,
            Self::SqlServer => &SqlServerDialect,
            Self::Oracle => &OracleDialect,
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Driver {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Self::MySql),
            "pgsql" | "postgres" | "postgresql" => Ok(Self::Postgres),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "sqlsrv" | "mssql" => Ok(Self::SqlServer),
            "oci" | "oracle" => Ok(Self::Oracle),
            _ => Err(QueryError::UnknownDriver(s.to_string())),
        }
    }
}

/// Looks up the dialect registered for `driver_name`.
///
/// # Errors
///
/// Returns [`QueryError::UnknownDriver`] for names outside the registry.
pub fn create(driver_name: &str) -> Result<&'static dyn Dialect> {
    Ok(driver_name.parse::<Driver>()?.dialect())
}

/// Dialect-specific rendering of values, clauses and DDL.
///
/// Statement helpers receive identifiers already protected by the caller
/// unless they take an [`IdentifierProtector`].
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Returns the driver this dialect belongs to.
    fn driver(&self) -> Driver;

    /// Returns the human-readable dialect name.
    fn name(&self) -> &'static str;

    // ---------------------------------------------------------------------
    // Identifiers and literals
    // ---------------------------------------------------------------------

    /// Opening and closing identifier quote characters.
    fn identifier_quotes(&self) -> (char, char) {
        ('"', '"')
    }

    /// Quotes a single identifier segment.
    ///
    /// Quote characters already present are stripped first, so quoting is
    /// idempotent and an identifier can never close its own quotes.
    fn quote_identifier(&self, name: &str) -> String {
        let (open, close) = self.identifier_quotes();
        let bare: String = name.chars().filter(|&c| c != open && c != close).collect();
        format!("{open}{bare}{close}")
    }

    /// Escapes text for use inside a single-quoted literal.
    fn escape_string(&self, s: &str) -> String {
        escape_quotes(s)
    }

    /// Quotes text as a string literal.
    fn quote_string(&self, s: &str) -> String {
        format!("'{}'", self.escape_string(s))
    }

    /// Boolean literal.
    fn bool_literal(&self, value: bool) -> &'static str {
        if value {
            "TRUE"
        } else {
            "FALSE"
        }
    }

    /// Binary literal.
    fn blob_literal(&self, bytes: &[u8]) -> String {
        format!("X'{}'", hex_upper(bytes))
    }

    /// Date literal.
    fn date_literal(&self, date: NaiveDate) -> String {
        format!("'{}'", date.format("%Y-%m-%d"))
    }

    /// Date-time literal.
    fn datetime_literal(&self, datetime: NaiveDateTime) -> String {
        format!("'{}'", datetime.format("%Y-%m-%d %H:%M:%S%.f"))
    }

    /// Renders a value as a SQL literal.
    fn quote_value(&self, value: &SqlValue) -> String {
        match value {
            SqlValue::Null => String::from("NULL"),
            SqlValue::Bool(b) => self.bool_literal(*b).to_string(),
            SqlValue::Int(n) => n.to_string(),
            SqlValue::Float(f) if f.is_finite() => f.to_string(),
            SqlValue::Float(_) => String::from("NULL"),
            SqlValue::Text(s) => self.quote_string(s),
            SqlValue::Blob(bytes) => self.blob_literal(bytes),
            SqlValue::Date(d) => self.date_literal(*d),
            SqlValue::DateTime(dt) => self.datetime_literal(*dt),
            SqlValue::Json(json) => self.quote_string(&json.to_string()),
            SqlValue::List(items) => items
                .iter()
                .map(|item| self.quote_value(item))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Renders a column default.
    fn render_default(&self, default: &DefaultValue) -> String {
        match default {
            DefaultValue::Null => String::from("NULL"),
            DefaultValue::Boolean(b) => self.bool_literal(*b).to_string(),
            DefaultValue::Integer(n) => n.to_string(),
            DefaultValue::Float(f) => f.to_string(),
            DefaultValue::String(s) => self.quote_string(s),
            DefaultValue::Expression(expr) => expr.clone(),
        }
    }

    // ---------------------------------------------------------------------
    // Query syntax
    // ---------------------------------------------------------------------

    /// Function used by `ORDER BY` random.
    fn random_function(&self) -> &'static str {
        "RANDOM()"
    }

    /// Renders the LIMIT/OFFSET clause; `0` means unset.
    ///
    /// `ordered` tells whether the statement already has an ORDER BY.
    fn limit_clause(&self, limit: u64, offset: u64, ordered: bool) -> Option<String> {
        let _ = ordered;
        match (limit, offset) {
            (0, 0) => None,
            (0, offset) => Some(format!("OFFSET {offset}")),
            (limit, 0) => Some(format!("LIMIT {limit}")),
            (limit, offset) => Some(format!("LIMIT {limit} OFFSET {offset}")),
        }
    }

    /// Whether UPDATE and DELETE accept ORDER BY and LIMIT.
    fn supports_write_limit(&self) -> bool {
        false
    }

    /// Renders a (multi-row) INSERT from protected names and literal rows.
    fn insert_statement(&self, table: &str, columns: &[String], rows: &[Vec<String>]) -> String {
        format!(
            "INSERT INTO {table} ({}) VALUES {}",
            columns.join(", "),
            values_list(rows)
        )
    }

    /// Renders an insert-or-replace statement.
    ///
    /// `key` is the protected conflict column, when given.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Unsupported`] when the dialect has no
    /// equivalent.
    fn replace_statement(
        &self,
        table: &str,
        columns: &[String],
        rows: &[Vec<String>],
        key: Option<&str>,
    ) -> Result<String> {
        let _ = (table, columns, rows, key);
        Err(QueryError::Unsupported {
            feature: "REPLACE",
            dialect: self.name(),
        })
    }

    /// Renders TRUNCATE for a protected table name.
    fn truncate_statement(&self, table: &str) -> String {
        format!("TRUNCATE TABLE {table}")
    }

    // ---------------------------------------------------------------------
    // Column types
    // ---------------------------------------------------------------------

    /// Type template for a logical column type.
    fn column_type_template(&self, column_type: ColumnType) -> &'static str;

    /// Whether enum-like columns map to a native `ENUM(...)` type.
    fn native_enum(&self) -> bool {
        false
    }

    /// Whether a size may be attached to a type that has no parameter list
    /// of its own (`text(100)`, `enum('a','b')`).
    ///
    /// When false, a size or precision only replaces an existing `(...)`
    /// group and is dropped for bare types such as `integer` or `CLOB`.
    fn sizes_bare_types(&self) -> bool {
        false
    }

    /// Whether integer columns accept `UNSIGNED`.
    fn supports_unsigned(&self) -> bool {
        false
    }

    /// Renders the column type, applying size, precision or value list.
    fn column_type(&self, def: &ColumnDefinition) -> String {
        let template = self.column_type_template(def.column_type);
        let argument = match &def.constraint {
            Constraint::None => None,
            Constraint::Size(size) => Some(size.to_string()),
            Constraint::Pair(precision, scale) => Some(format!("{precision},{scale}")),
            Constraint::List(values) => Some(
                values
                    .iter()
                    .map(|v| self.quote_string(v))
                    .collect::<Vec<_>>()
                    .join(","),
            ),
        };
        let enum_fallback = def.column_type == ColumnType::Enum && !self.native_enum();
        let mut sql = match argument {
            Some(argument) if !enum_fallback => {
                apply_type_argument(template, &argument, self.sizes_bare_types())
            }
            _ => template.to_string(),
        };
        if def.unsigned && self.supports_unsigned() {
            sql = match sql.split_once(' ') {
                Some((head, rest)) => format!("{head} UNSIGNED {rest}"),
                None => format!("{sql} UNSIGNED"),
            };
        }
        sql
    }

    /// Inline comment clause for a column definition.
    fn inline_comment(&self, comment: &str) -> Option<String> {
        let _ = comment;
        None
    }

    /// Separate statement attaching a comment to a column.
    fn comment_statement(&self, table: &str, column: &str, comment: &str) -> Option<String> {
        let _ = (table, column, comment);
        None
    }

    /// Renders a full column definition.
    fn column_definition(&self, p: &IdentifierProtector<'_>, def: &ColumnDefinition) -> String {
        let name = p.quote(&def.name);
        let mut sql = format!("{name} {}", self.column_type(def));
        if let Some(default) = &def.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&self.render_default(default));
        }
        if !def.column_type.is_primary_key() {
            sql.push_str(if def.nullable { " NULL" } else { " NOT NULL" });
        }
        if def.unique {
            sql.push_str(" UNIQUE");
        }
        if let Constraint::List(values) = &def.constraint {
            if def.column_type == ColumnType::Enum && !self.native_enum() {
                let list = values
                    .iter()
                    .map(|v| self.quote_string(v))
                    .collect::<Vec<_>>()
                    .join(", ");
                sql.push_str(&format!(" CHECK ({name} IN ({list}))"));
            }
        }
        if let Some(comment) = def.comment.as_deref().and_then(|c| self.inline_comment(c)) {
            sql.push(' ');
            sql.push_str(&comment);
        }
        sql
    }

    // ---------------------------------------------------------------------
    // DDL
    // ---------------------------------------------------------------------

    /// Whether CREATE TABLE accepts IF NOT EXISTS.
    fn supports_if_not_exists(&self) -> bool {
        true
    }

    /// Whether DROP TABLE accepts IF EXISTS.
    fn supports_drop_if_exists(&self) -> bool {
        true
    }

    /// Positional clause for ALTER TABLE ... ADD (FIRST / AFTER).
    fn column_position(&self, p: &IdentifierProtector<'_>, position: &Position) -> Option<String> {
        let _ = p;
        if *position != Position::Last {
            warn!(dialect = self.name(), "Column position ignored, not supported");
        }
        None
    }

    /// Renders ALTER TABLE ... ADD for a rendered column definition.
    fn add_column_statement(&self, table: &str, definition: &str) -> String {
        format!("ALTER TABLE {table} ADD COLUMN {definition}")
    }

    /// Renders the statements changing an existing column.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Unsupported`] when columns cannot be altered.
    fn alter_column_statements(
        &self,
        p: &IdentifierProtector<'_>,
        table: &str,
        def: &ColumnDefinition,
    ) -> Result<Vec<String>> {
        let _ = (p, table, def);
        Err(QueryError::Unsupported {
            feature: "ALTER COLUMN",
            dialect: self.name(),
        })
    }

    /// Renders DROP COLUMN.
    fn drop_column_statement(&self, table: &str, column: &str) -> String {
        format!("ALTER TABLE {table} DROP COLUMN {column}")
    }

    /// Renders a table rename; `from`/`to` are raw (prefixed) names.
    fn rename_table_statement(&self, p: &IdentifierProtector<'_>, from: &str, to: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME TO {}",
            p.protect_table(from),
            p.protect_table(to)
        )
    }

    /// Renders a column rename.
    fn rename_column_statement(
        &self,
        p: &IdentifierProtector<'_>,
        table: &str,
        from: &str,
        to: &str,
    ) -> String {
        format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            p.protect_table(table),
            p.quote(from),
            p.quote(to)
        )
    }

    /// Renders DROP TABLE.
    fn drop_table_statement(&self, table: &str, if_exists: bool) -> String {
        if if_exists && !self.supports_drop_if_exists() {
            warn!(dialect = self.name(), "IF EXISTS ignored, not supported");
        }
        if if_exists && self.supports_drop_if_exists() {
            format!("DROP TABLE IF EXISTS {table}")
        } else {
            format!("DROP TABLE {table}")
        }
    }

    /// Whether an index kind can be declared inside CREATE TABLE.
    fn supports_inline_index(&self, kind: IndexKind) -> bool {
        matches!(
            kind,
            IndexKind::Primary | IndexKind::Unique | IndexKind::Foreign
        )
    }

    /// Renders an index as a CREATE TABLE constraint.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnsupportedIndexType`] for kinds that cannot be
    /// declared inline.
    fn inline_index(
        &self,
        p: &IdentifierProtector<'_>,
        table: &str,
        index: &IndexDefinition,
    ) -> Result<String> {
        let name = p.quote(&index.resolved_name(table));
        let columns = quote_columns(p, &index.columns);
        match index.kind {
            IndexKind::Primary => Ok(format!("CONSTRAINT {name} PRIMARY KEY ({columns})")),
            IndexKind::Unique => Ok(format!("CONSTRAINT {name} UNIQUE ({columns})")),
            IndexKind::Foreign => Ok(format!(
                "CONSTRAINT {name} FOREIGN KEY ({columns}) {}",
                references_clause(p, index)
            )),
            kind => Err(QueryError::UnsupportedIndexType {
                kind: kind.to_string(),
                dialect: self.name(),
            }),
        }
    }

    /// Renders a standalone statement creating an index on an existing table.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnsupportedIndexType`] for kinds the dialect
    /// cannot create.
    fn create_index_statement(
        &self,
        p: &IdentifierProtector<'_>,
        table: &str,
        index: &IndexDefinition,
    ) -> Result<String> {
        create_index_sql(p, table, index, self.name())
    }

    /// Renders DROP INDEX.
    fn drop_index_statement(&self, p: &IdentifierProtector<'_>, table: &str, name: &str) -> String {
        let _ = table;
        format!("DROP INDEX {}", p.quote(name))
    }

    /// Renders the removal of a foreign key constraint.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Unsupported`] when constraints cannot be
    /// dropped from an existing table.
    fn drop_foreign_key_statement(
        &self,
        p: &IdentifierProtector<'_>,
        table: &str,
        name: &str,
    ) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            p.protect_table(table),
            p.quote(name)
        ))
    }
}

/// Replaces the first `(...)` group of a type template with `(argument)`.
///
/// A template without a group gets the argument after its first word when
/// `insert` is set, and is returned unchanged otherwise.
pub(crate) fn apply_type_argument(template: &str, argument: &str, insert: bool) -> String {
    if let (Some(open), Some(close)) = (template.find('('), template.find(')')) {
        if open < close {
            return format!("{}({argument}){}", &template[..open], &template[close + 1..]);
        }
    }
    if !insert {
        debug!(template, argument, "Type takes no size, argument dropped");
        return template.to_string();
    }
    match template.split_once(' ') {
        Some((head, rest)) => format!("{head}({argument}) {rest}"),
        None => format!("{template}({argument})"),
    }
}

/// CREATE INDEX / ADD CONSTRAINT for an existing table.
pub(crate) fn create_index_sql(
    p: &IdentifierProtector<'_>,
    table: &str,
    index: &IndexDefinition,
    dialect: &'static str,
) -> Result<String> {
    let name = p.quote(&index.resolved_name(table));
    let target = p.protect_table(table);
    let columns = quote_columns(p, &index.columns);
    match index.kind {
        IndexKind::Primary => Ok(format!(
            "ALTER TABLE {target} ADD CONSTRAINT {name} PRIMARY KEY ({columns})"
        )),
        IndexKind::Unique => Ok(format!("CREATE UNIQUE INDEX {name} ON {target} ({columns})")),
        IndexKind::Key => Ok(format!("CREATE INDEX {name} ON {target} ({columns})")),
        IndexKind::Foreign => Ok(format!(
            "ALTER TABLE {target} ADD CONSTRAINT {name} FOREIGN KEY ({columns}) {}",
            references_clause(p, index)
        )),
        IndexKind::Fulltext => Err(QueryError::UnsupportedIndexType {
            kind: index.kind.to_string(),
            dialect,
        }),
    }
}

/// `(a, b), (c, d)` from rendered rows.
pub(crate) fn values_list(rows: &[Vec<String>]) -> String {
    rows.iter()
        .map(|row| format!("({})", row.join(", ")))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn quote_columns(p: &IdentifierProtector<'_>, columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| p.quote(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `REFERENCES t (cols) [ON DELETE ..] [ON UPDATE ..]` for a foreign key.
pub(crate) fn references_clause(p: &IdentifierProtector<'_>, index: &IndexDefinition) -> String {
    let Some(target) = &index.references else {
        return String::new();
    };
    let mut sql = format!(
        "REFERENCES {} ({})",
        p.protect_table(&target.table),
        quote_columns(p, &target.columns)
    );
    if let Some(action) = target.on_delete {
        sql.push_str(" ON DELETE ");
        sql.push_str(action.as_sql());
    }
    if let Some(action) = target.on_update {
        sql.push_str(" ON UPDATE ");
        sql.push_str(action.as_sql());
    }
    sql
}
