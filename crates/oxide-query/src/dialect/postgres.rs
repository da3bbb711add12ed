//! PostgreSQL dialect.

use super::{values_list, Dialect, Driver};
use crate::error::{QueryError, Result};
use crate::protect::IdentifierProtector;
use crate::schema::{ColumnDefinition, ColumnType};
use crate::value::hex_upper;

/// PostgreSQL dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn driver(&self) -> Driver {
        Driver::Postgres
    }

    fn name(&self) -> &'static str {
        "PostgreSQL"
    }

    fn blob_literal(&self, bytes: &[u8]) -> String {
        format!("'\\x{}'::bytea", hex_upper(bytes))
    }

    fn replace_statement(
        &self,
        table: &str,
        columns: &[String],
        rows: &[Vec<String>],
        key: Option<&str>,
    ) -> Result<String> {
        let key = key.ok_or_else(|| {
            QueryError::InvalidArgument(String::from(
                "REPLACE on PostgreSQL needs a conflict key column",
            ))
        })?;
        let updates: Vec<String> = columns
            .iter()
            .filter(|c| c.as_str() != key)
            .map(|c| format!("{c} = EXCLUDED.{c}"))
            .collect();
        let action = if updates.is_empty() {
            String::from("DO NOTHING")
        } else {
            format!("DO UPDATE SET {}", updates.join(", "))
        };
        Ok(format!(
            "INSERT INTO {table} ({}) VALUES {} ON CONFLICT ({key}) {action}",
            columns.join(", "),
            values_list(rows)
        ))
    }

    fn column_type_template(&self, column_type: ColumnType) -> &'static str {
        match column_type {
            ColumnType::PrimaryKey => "serial NOT NULL PRIMARY KEY",
            ColumnType::BigPrimaryKey => "bigserial NOT NULL PRIMARY KEY",
            ColumnType::String | ColumnType::Enum => "varchar(255)",
            ColumnType::Char => "char(1)",
            ColumnType::Text
            | ColumnType::TinyText
            | ColumnType::MediumText
            | ColumnType::LongText => "text",
            ColumnType::TinyInteger | ColumnType::SmallInteger => "smallint",
            ColumnType::Integer => "integer",
            ColumnType::BigInteger => "bigint",
            ColumnType::Float => "real",
            ColumnType::Double => "double precision",
            ColumnType::Decimal => "numeric(10,0)",
            ColumnType::DateTime | ColumnType::Timestamp => "timestamp(0)",
            ColumnType::Time => "time(0)",
            ColumnType::Date => "date",
            ColumnType::Binary => "bytea",
            ColumnType::Boolean => "boolean",
            ColumnType::Money => "numeric(19,4)",
            ColumnType::Json => "jsonb",
        }
    }

    fn comment_statement(&self, table: &str, column: &str, comment: &str) -> Option<String> {
        Some(format!(
            "COMMENT ON COLUMN {table}.{column} IS {}",
            self.quote_string(comment)
        ))
    }

    fn alter_column_statements(
        &self,
        p: &IdentifierProtector<'_>,
        table: &str,
        def: &ColumnDefinition,
    ) -> Result<Vec<String>> {
        let column = p.quote(&def.name);
        let mut changes = vec![format!(
            "ALTER COLUMN {column} TYPE {}",
            self.column_type(def)
        )];
        if !def.column_type.is_primary_key() {
            changes.push(if def.nullable {
                format!("ALTER COLUMN {column} DROP NOT NULL")
            } else {
                format!("ALTER COLUMN {column} SET NOT NULL")
            });
        }
        changes.push(match &def.default {
            Some(default) => format!(
                "ALTER COLUMN {column} SET DEFAULT {}",
                self.render_default(default)
            ),
            None => format!("ALTER COLUMN {column} DROP DEFAULT"),
        });
        let mut statements = vec![format!(
            "ALTER TABLE {} {}",
            p.protect_table(table),
            changes.join(", ")
        )];
        if let Some(comment) = &def.comment {
            statements.extend(self.comment_statement(&p.protect_table(table), &column, comment));
        }
        Ok(statements)
    }
}
