//! MySQL dialect.

use super::{create_index_sql, quote_columns, references_clause, values_list, Dialect, Driver};
use crate::error::Result;
use crate::protect::IdentifierProtector;
use crate::schema::{ColumnDefinition, ColumnType, IndexDefinition, IndexKind, Position};

/// MySQL / MariaDB dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for MySqlDialect {
    fn driver(&self) -> Driver {
        Driver::MySql
    }

    fn name(&self) -> &'static str {
        "MySQL"
    }

    fn identifier_quotes(&self) -> (char, char) {
        ('`', '`')
    }

    // Backslash is an escape character under the default sql_mode.
    fn escape_string(&self, s: &str) -> String {
        s.replace('\\', "\\\\").replace('\'', "''")
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        if value {
            "1"
        } else {
            "0"
        }
    }

    fn random_function(&self) -> &'static str {
        "RAND()"
    }

    fn limit_clause(&self, limit: u64, offset: u64, _ordered: bool) -> Option<String> {
        match (limit, offset) {
            (0, 0) => None,
            (0, offset) => Some(format!("LIMIT {offset}, {}", u64::MAX)),
            (limit, 0) => Some(format!("LIMIT {limit}")),
            (limit, offset) => Some(format!("LIMIT {offset}, {limit}")),
        }
    }

    fn supports_write_limit(&self) -> bool {
        true
    }

    fn replace_statement(
        &self,
        table: &str,
        columns: &[String],
        rows: &[Vec<String>],
        _key: Option<&str>,
    ) -> Result<String> {
        Ok(format!(
            "REPLACE INTO {table} ({}) VALUES {}",
            columns.join(", "),
            values_list(rows)
        ))
    }

    fn column_type_template(&self, column_type: ColumnType) -> &'static str {
        match column_type {
            ColumnType::PrimaryKey => "int(11) NOT NULL AUTO_INCREMENT PRIMARY KEY",
            ColumnType::BigPrimaryKey => "bigint(20) NOT NULL AUTO_INCREMENT PRIMARY KEY",
            ColumnType::String => "varchar(255)",
            ColumnType::Char => "char(1)",
            ColumnType::Text => "text",
            ColumnType::TinyText => "tinytext",
            ColumnType::MediumText => "mediumtext",
            ColumnType::LongText => "longtext",
            ColumnType::TinyInteger => "tinyint(3)",
            ColumnType::SmallInteger => "smallint(6)",
            ColumnType::Integer => "int(11)",
            ColumnType::BigInteger => "bigint(20)",
            ColumnType::Float => "float",
            ColumnType::Double => "double",
            ColumnType::Decimal => "decimal(10,0)",
            ColumnType::DateTime => "datetime",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Time => "time",
            ColumnType::Date => "date",
            ColumnType::Binary => "blob",
            ColumnType::Boolean => "tinyint(1)",
            ColumnType::Money => "decimal(19,4)",
            ColumnType::Json => "json",
            ColumnType::Enum => "enum",
        }
    }

    fn native_enum(&self) -> bool {
        true
    }

    fn sizes_bare_types(&self) -> bool {
        true
    }

    fn supports_unsigned(&self) -> bool {
        true
    }

    fn inline_comment(&self, comment: &str) -> Option<String> {
        Some(format!("COMMENT {}", self.quote_string(comment)))
    }

    fn column_position(&self, p: &IdentifierProtector<'_>, position: &Position) -> Option<String> {
        match position {
            Position::Last => None,
            Position::First => Some(String::from("FIRST")),
            Position::After(column) => Some(format!("AFTER {}", p.quote(column))),
        }
    }

    fn alter_column_statements(
        &self,
        p: &IdentifierProtector<'_>,
        table: &str,
        def: &ColumnDefinition,
    ) -> Result<Vec<String>> {
        Ok(vec![format!(
            "ALTER TABLE {} MODIFY COLUMN {}",
            p.protect_table(table),
            self.column_definition(p, def)
        )])
    }

    fn rename_table_statement(&self, p: &IdentifierProtector<'_>, from: &str, to: &str) -> String {
        format!(
            "RENAME TABLE {} TO {}",
            p.protect_table(from),
            p.protect_table(to)
        )
    }

    fn supports_inline_index(&self, _kind: IndexKind) -> bool {
        true
    }

    fn inline_index(
        &self,
        p: &IdentifierProtector<'_>,
        table: &str,
        index: &IndexDefinition,
    ) -> Result<String> {
        let name = p.quote(&index.resolved_name(table));
        let columns = quote_columns(p, &index.columns);
        Ok(match index.kind {
            IndexKind::Primary => format!("PRIMARY KEY ({columns})"),
            IndexKind::Unique => format!("UNIQUE KEY {name} ({columns})"),
            IndexKind::Key => format!("KEY {name} ({columns})"),
            IndexKind::Fulltext => format!("FULLTEXT KEY {name} ({columns})"),
            IndexKind::Foreign => format!(
                "CONSTRAINT {name} FOREIGN KEY ({columns}) {}",
                references_clause(p, index)
            ),
        })
    }

    fn create_index_statement(
        &self,
        p: &IdentifierProtector<'_>,
        table: &str,
        index: &IndexDefinition,
    ) -> Result<String> {
        if index.kind == IndexKind::Fulltext {
            return Ok(format!(
                "CREATE FULLTEXT INDEX {} ON {} ({})",
                p.quote(&index.resolved_name(table)),
                p.protect_table(table),
                quote_columns(p, &index.columns)
            ));
        }
        if index.kind == IndexKind::Primary {
            return Ok(format!(
                "ALTER TABLE {} ADD PRIMARY KEY ({})",
                p.protect_table(table),
                quote_columns(p, &index.columns)
            ));
        }
        create_index_sql(p, table, index, self.name())
    }

    fn drop_index_statement(&self, p: &IdentifierProtector<'_>, table: &str, name: &str) -> String {
        format!("DROP INDEX {} ON {}", p.quote(name), p.protect_table(table))
    }

    fn drop_foreign_key_statement(
        &self,
        p: &IdentifierProtector<'_>,
        table: &str,
        name: &str,
    ) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} DROP FOREIGN KEY {}",
            p.protect_table(table),
            p.quote(name)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{decimal, enumeration, integer, string};

    #[test]
    fn test_limit_forms() {
        let d = MySqlDialect;
        assert_eq!(d.limit_clause(10, 0, false).as_deref(), Some("LIMIT 10"));
        assert_eq!(d.limit_clause(10, 20, false).as_deref(), Some("LIMIT 20, 10"));
        assert_eq!(d.limit_clause(0, 0, false), None);
    }

    #[test]
    fn test_column_types() {
        let d = MySqlDialect;
        assert_eq!(d.column_type(&string("name").size(64).build()), "varchar(64)");
        assert_eq!(d.column_type(&decimal("price", 12, 2).build()), "decimal(12,2)");
        assert_eq!(
            d.column_type(&integer("hits").unsigned().build()),
            "int(11) UNSIGNED"
        );
        assert_eq!(
            d.column_type(&enumeration("status", ["on", "off"]).build()),
            "enum('on','off')"
        );
    }

    #[test]
    fn test_string_escaping_doubles_backslashes() {
        assert_eq!(MySqlDialect.quote_string(r"a\'b"), r"'a\\''b'");
    }
}
