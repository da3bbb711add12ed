//! Oracle dialect.

use chrono::{NaiveDate, NaiveDateTime};

use super::{Dialect, Driver};
use crate::error::Result;
use crate::protect::IdentifierProtector;
use crate::schema::{ColumnDefinition, ColumnType};
use crate::value::hex_upper;

/// Oracle dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleDialect;

impl OracleDialect {
    /// Creates a new Oracle dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for OracleDialect {
    fn driver(&self) -> Driver {
        Driver::Oracle
    }

    fn name(&self) -> &'static str {
        "Oracle"
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        if value {
            "1"
        } else {
            "0"
        }
    }

    fn blob_literal(&self, bytes: &[u8]) -> String {
        format!("HEXTORAW('{}')", hex_upper(bytes))
    }

    fn date_literal(&self, date: NaiveDate) -> String {
        format!("DATE '{}'", date.format("%Y-%m-%d"))
    }

    fn datetime_literal(&self, datetime: NaiveDateTime) -> String {
        format!("TIMESTAMP '{}'", datetime.format("%Y-%m-%d %H:%M:%S%.f"))
    }

    fn random_function(&self) -> &'static str {
        "DBMS_RANDOM.VALUE"
    }

    fn limit_clause(&self, limit: u64, offset: u64, _ordered: bool) -> Option<String> {
        match (limit, offset) {
            (0, 0) => None,
            (0, offset) => Some(format!("OFFSET {offset} ROWS")),
            (limit, offset) => Some(format!(
                "OFFSET {offset} ROWS FETCH NEXT {limit} ROWS ONLY"
            )),
        }
    }

    fn insert_statement(&self, table: &str, columns: &[String], rows: &[Vec<String>]) -> String {
        let columns = columns.join(", ");
        if rows.len() == 1 {
            return format!("INSERT INTO {table} ({columns}) VALUES ({})", rows[0].join(", "));
        }
        let mut sql = String::from("INSERT ALL");
        for row in rows {
            sql.push_str(&format!(
                " INTO {table} ({columns}) VALUES ({})",
                row.join(", ")
            ));
        }
        sql.push_str(" SELECT 1 FROM DUAL");
        sql
    }

    fn column_type_template(&self, column_type: ColumnType) -> &'static str {
        match column_type {
            ColumnType::PrimaryKey => "NUMBER(10) NOT NULL PRIMARY KEY",
            ColumnType::BigPrimaryKey => "NUMBER(20) NOT NULL PRIMARY KEY",
            ColumnType::String | ColumnType::Enum => "VARCHAR2(255)",
            ColumnType::Char => "CHAR(1)",
            ColumnType::Text
            | ColumnType::TinyText
            | ColumnType::MediumText
            | ColumnType::LongText
            | ColumnType::Json => "CLOB",
            ColumnType::TinyInteger => "NUMBER(3)",
            ColumnType::SmallInteger => "NUMBER(5)",
            ColumnType::Integer => "NUMBER(10)",
            ColumnType::BigInteger => "NUMBER(20)",
            ColumnType::Float | ColumnType::Double => "NUMBER",
            ColumnType::Decimal => "NUMBER(10,0)",
            ColumnType::DateTime | ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Time => "TIMESTAMP",
            ColumnType::Date => "DATE",
            ColumnType::Binary => "BLOB",
            ColumnType::Boolean => "NUMBER(1)",
            ColumnType::Money => "NUMBER(19,4)",
        }
    }

    fn comment_statement(&self, table: &str, column: &str, comment: &str) -> Option<String> {
        Some(format!(
            "COMMENT ON COLUMN {table}.{column} IS {}",
            self.quote_string(comment)
        ))
    }

    fn supports_if_not_exists(&self) -> bool {
        false
    }

    fn supports_drop_if_exists(&self) -> bool {
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
        Ok(vec![format!(
            "ALTER TABLE {} MODIFY ({})",
            p.protect_table(table),
            self.column_definition(p, def)
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_all() {
        let cols = vec![String::from("\"a\""), String::from("\"b\"")];
        let rows = vec![
            vec![String::from("1"), String::from("2")],
            vec![String::from("3"), String::from("4")],
        ];
        assert_eq!(
            OracleDialect.insert_statement("\"t\"", &cols, &rows),
            "INSERT ALL INTO \"t\" (\"a\", \"b\") VALUES (1, 2) \
             INTO \"t\" (\"a\", \"b\") VALUES (3, 4) SELECT 1 FROM DUAL"
        );
    }

    #[test]
    fn test_drop_if_exists_ignored() {
        assert_eq!(OracleDialect.drop_table_statement("\"t\"", true), "DROP TABLE \"t\"");
    }

    #[test]
    fn test_limit() {
        assert_eq!(
            OracleDialect.limit_clause(5, 0, false).as_deref(),
            Some("OFFSET 0 ROWS FETCH NEXT 5 ROWS ONLY")
        );
    }
}
