//! SQLite dialect.

use super::{values_list, Dialect, Driver};
use crate::error::{QueryError, Result};
use crate::protect::IdentifierProtector;
use crate::schema::{ColumnType, IndexDefinition, IndexKind};

/// SQLite dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn driver(&self) -> Driver {
        Driver::Sqlite
    }

    fn name(&self) -> &'static str {
        "SQLite"
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        if value {
            "1"
        } else {
            "0"
        }
    }

    fn limit_clause(&self, limit: u64, offset: u64, _ordered: bool) -> Option<String> {
        match (limit, offset) {
            (0, 0) => None,
            // OFFSET is only valid after LIMIT
            (0, offset) => Some(format!("LIMIT -1 OFFSET {offset}")),
            (limit, 0) => Some(format!("LIMIT {limit}")),
            (limit, offset) => Some(format!("LIMIT {limit} OFFSET {offset}")),
        }
    }

    fn replace_statement(
        &self,
        table: &str,
        columns: &[String],
        rows: &[Vec<String>],
        _key: Option<&str>,
    ) -> Result<String> {
        Ok(format!(
            "INSERT OR REPLACE INTO {table} ({}) VALUES {}",
            columns.join(", "),
            values_list(rows)
        ))
    }

    fn truncate_statement(&self, table: &str) -> String {
        format!("DELETE FROM {table}")
    }

    fn column_type_template(&self, column_type: ColumnType) -> &'static str {
        match column_type {
            ColumnType::PrimaryKey => "integer PRIMARY KEY AUTOINCREMENT NOT NULL",
            ColumnType::BigPrimaryKey => "integer PRIMARY KEY AUTOINCREMENT NOT NULL",
            ColumnType::String | ColumnType::Enum => "varchar(255)",
            ColumnType::Char => "char(1)",
            ColumnType::Text
            | ColumnType::TinyText
            | ColumnType::MediumText
            | ColumnType::LongText => "text",
            ColumnType::TinyInteger => "tinyint",
            ColumnType::SmallInteger => "smallint",
            ColumnType::Integer => "integer",
            ColumnType::BigInteger => "bigint",
            ColumnType::Float => "float",
            ColumnType::Double => "double",
            ColumnType::Decimal => "decimal(10,0)",
            ColumnType::DateTime => "datetime",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Time => "time",
            ColumnType::Date => "date",
            ColumnType::Binary => "blob",
            ColumnType::Boolean => "boolean",
            ColumnType::Money => "decimal(19,4)",
            ColumnType::Json => "text",
        }
    }

    fn create_index_statement(
        &self,
        p: &IdentifierProtector<'_>,
        table: &str,
        index: &IndexDefinition,
    ) -> Result<String> {
        match index.kind {
            // SQLite cannot add constraints to an existing table.
            IndexKind::Primary | IndexKind::Foreign => Err(QueryError::Unsupported {
                feature: "adding a key constraint to an existing table",
                dialect: self.name(),
            }),
            _ => super::create_index_sql(p, table, index, self.name()),
        }
    }

    fn drop_foreign_key_statement(
        &self,
        _p: &IdentifierProtector<'_>,
        _table: &str,
        _name: &str,
    ) -> Result<String> {
        Err(QueryError::Unsupported {
            feature: "DROP FOREIGN KEY",
            dialect: self.name(),
        })
    }
}
