//! SQL Server dialect.

use super::{Dialect, Driver};
use crate::error::Result;
use crate::protect::IdentifierProtector;
use crate::schema::{ColumnDefinition, ColumnType};
use crate::value::hex_upper;

/// Microsoft SQL Server dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDialect;

impl SqlServerDialect {
    /// Creates a new SQL Server dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqlServerDialect {
    fn driver(&self) -> Driver {
        Driver::SqlServer
    }

    fn name(&self) -> &'static str {
        "SQL Server"
    }

    fn identifier_quotes(&self) -> (char, char) {
        ('[', ']')
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        if value {
            "1"
        } else {
            "0"
        }
    }

    fn blob_literal(&self, bytes: &[u8]) -> String {
        format!("0x{}", hex_upper(bytes))
    }

    fn random_function(&self) -> &'static str {
        "NEWID()"
    }

    fn limit_clause(&self, limit: u64, offset: u64, ordered: bool) -> Option<String> {
        if limit == 0 && offset == 0 {
            return None;
        }
        // OFFSET/FETCH is only valid after ORDER BY
        let mut sql = if ordered {
            String::new()
        } else {
            String::from("ORDER BY (SELECT NULL) ")
        };
        sql.push_str(&format!("OFFSET {offset} ROWS"));
        if limit > 0 {
            sql.push_str(&format!(" FETCH NEXT {limit} ROWS ONLY"));
        }
        Some(sql)
    }

    fn column_type_template(&self, column_type: ColumnType) -> &'static str {
        match column_type {
            ColumnType::PrimaryKey => "int IDENTITY PRIMARY KEY",
            ColumnType::BigPrimaryKey => "bigint IDENTITY PRIMARY KEY",
            ColumnType::String | ColumnType::Enum => "nvarchar(255)",
            ColumnType::Char => "nchar(1)",
            ColumnType::Text
            | ColumnType::TinyText
            | ColumnType::MediumText
            | ColumnType::LongText
            | ColumnType::Json => "nvarchar(max)",
            ColumnType::TinyInteger => "tinyint",
            ColumnType::SmallInteger => "smallint",
            ColumnType::Integer => "int",
            ColumnType::BigInteger => "bigint",
            ColumnType::Float => "float",
            ColumnType::Double => "float",
            ColumnType::Decimal => "decimal(18,0)",
            ColumnType::DateTime => "datetime",
            ColumnType::Timestamp => "datetime",
            ColumnType::Time => "time",
            ColumnType::Date => "date",
            ColumnType::Binary => "varbinary(max)",
            ColumnType::Boolean => "bit",
            ColumnType::Money => "decimal(19,4)",
        }
    }

    fn supports_if_not_exists(&self) -> bool {
        false
    }

    fn add_column_statement(&self, table: &str, definition: &str) -> String {
        format!("ALTER TABLE {table} ADD {definition}")
    }

    fn alter_column_statements(
        &self,
        p: &IdentifierProtector<'_>,
        table: &str,
        def: &ColumnDefinition,
    ) -> Result<Vec<String>> {
        let mut sql = format!(
            "ALTER TABLE {} ALTER COLUMN {} {}",
            p.protect_table(table),
            p.quote(&def.name),
            self.column_type(def)
        );
        if !def.column_type.is_primary_key() {
            sql.push_str(if def.nullable { " NULL" } else { " NOT NULL" });
        }
        if def.default.is_some() {
            tracing::warn!(
                column = %def.name,
                "Default ignored, SQL Server keeps defaults in named constraints"
            );
        }
        Ok(vec![sql])
    }

    fn rename_table_statement(&self, p: &IdentifierProtector<'_>, from: &str, to: &str) -> String {
        format!(
            "EXEC sp_rename {}, {}",
            self.quote_string(&p.prefixed(from)),
            self.quote_string(&p.prefixed(to))
        )
    }

    fn rename_column_statement(
        &self,
        p: &IdentifierProtector<'_>,
        table: &str,
        from: &str,
        to: &str,
    ) -> String {
        format!(
            "EXEC sp_rename {}, {}, 'COLUMN'",
            self.quote_string(&format!("{}.{from}", p.prefixed(table))),
            self.quote_string(to)
        )
    }

    fn drop_index_statement(&self, p: &IdentifierProtector<'_>, table: &str, name: &str) -> String {
        format!("DROP INDEX {} ON {}", p.quote(name), p.protect_table(table))
    }
}
