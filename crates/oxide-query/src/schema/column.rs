//! Column definitions for DDL.
//!
//! Provides a fluent API for defining columns. Type names, sizes and
//! positional directives are rendered per dialect.

use std::fmt;
use std::str::FromStr;

use crate::error::QueryError;

/// Logical column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Auto-incrementing integer primary key.
    PrimaryKey,
    /// Auto-incrementing big integer primary key.
    BigPrimaryKey,
    /// Variable-length string.
    String,
    /// Fixed-length string.
    Char,
    /// Text.
    Text,
    /// Tiny text (MySQL).
    TinyText,
    /// Medium text (MySQL).
    MediumText,
    /// Long text (MySQL).
    LongText,
    /// 1-byte integer.
    TinyInteger,
    /// 2-byte integer.
    SmallInteger,
    /// 4-byte integer.
    Integer,
    /// 8-byte integer.
    BigInteger,
    /// Single precision float.
    Float,
    /// Double precision float.
    Double,
    /// Fixed precision decimal.
    Decimal,
    /// Date and time.
    DateTime,
    /// Timestamp.
    Timestamp,
    /// Time of day.
    Time,
    /// Calendar date.
    Date,
    /// Binary data.
    Binary,
    /// Boolean.
    Boolean,
    /// Monetary amount.
    Money,
    /// JSON document.
    Json,
    /// One value out of a fixed list.
    Enum,
}

impl ColumnType {
    /// All column types.
    pub const ALL: [Self; 24] = [
        Self::PrimaryKey,
        Self::BigPrimaryKey,
        Self::String,
        Self::Char,
        Self::Text,
        Self::TinyText,
        Self::MediumText,
        Self::LongText,
        Self::TinyInteger,
        Self::SmallInteger,
        Self::Integer,
        Self::BigInteger,
        Self::Float,
        Self::Double,
        Self::Decimal,
        Self::DateTime,
        Self::Timestamp,
        Self::Time,
        Self::Date,
        Self::Binary,
        Self::Boolean,
        Self::Money,
        Self::Json,
        Self::Enum,
    ];

    /// Returns the short type name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PrimaryKey => "pk",
            Self::BigPrimaryKey => "bigpk",
            Self::String => "string",
            Self::Char => "char",
            Self::Text => "text",
            Self::TinyText => "tinytext",
            Self::MediumText => "mediumtext",
            Self::LongText => "longtext",
            Self::TinyInteger => "tinyint",
            Self::SmallInteger => "smallint",
            Self::Integer => "integer",
            Self::BigInteger => "bigint",
            Self::Float => "float",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::DateTime => "datetime",
            Self::Timestamp => "timestamp",
            Self::Time => "time",
            Self::Date => "date",
            Self::Binary => "binary",
            Self::Boolean => "boolean",
            Self::Money => "money",
            Self::Json => "json",
            Self::Enum => "enum",
        }
    }

    /// Primary-key types carry their own NOT NULL and key clause.
    #[must_use]
    pub const fn is_primary_key(self) -> bool {
        matches!(self, Self::PrimaryKey | Self::BigPrimaryKey)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str() == name)
            .ok_or_else(|| QueryError::UnsupportedColumnType(s.to_string()))
    }
}

/// Size or precision attached to a column type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Constraint {
    /// Dialect default.
    #[default]
    None,
    /// Single size, e.g. `VARCHAR(64)`.
    Size(u32),
    /// Precision and scale, e.g. `DECIMAL(10,2)`.
    Pair(u32, u32),
    /// Allowed values of an enum-like column.
    List(Vec<String>),
}

/// Where a column added by ALTER TABLE goes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Position {
    /// Appended at the end.
    #[default]
    Last,
    /// First column of the table.
    First,
    /// Right after the named column.
    After(String),
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// NULL default.
    Null,
    /// Boolean default.
    Boolean(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String default.
    String(String),
    /// Raw SQL expression (e.g., `CURRENT_TIMESTAMP`).
    Expression(String),
}

/// A complete column definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    /// Column name.
    pub name: String,
    /// Logical type.
    pub column_type: ColumnType,
    /// Size, precision or value list.
    pub constraint: Constraint,
    /// Whether NULL is allowed. Columns are NOT NULL unless marked nullable.
    pub nullable: bool,
    /// Whether the column is UNIQUE.
    pub unique: bool,
    /// Whether the integer column is UNSIGNED (MySQL only).
    pub unsigned: bool,
    /// Default value.
    pub default: Option<DefaultValue>,
    /// Column comment.
    pub comment: Option<String>,
    /// Position directive for ALTER TABLE ... ADD.
    pub position: Position,
}

impl ColumnDefinition {
    /// Creates a NOT NULL column definition.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            constraint: Constraint::None,
            nullable: false,
            unique: false,
            unsigned: false,
            default: None,
            comment: None,
            position: Position::Last,
        }
    }
}

/// Fluent column definition builder.
#[derive(Debug, Clone)]
pub struct ColumnBuilder {
    def: ColumnDefinition,
}

impl ColumnBuilder {
    /// Creates a new column builder with name and type.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            def: ColumnDefinition::new(name, column_type),
        }
    }

    /// Creates a column builder from a type name such as `"string"` or `"bigpk"`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnsupportedColumnType`] for unknown names.
    pub fn parse(name: impl Into<String>, column_type: &str) -> Result<Self, QueryError> {
        Ok(Self::new(name, column_type.parse()?))
    }

    /// Sets the size, e.g. the length of a string column.
    #[must_use]
    pub fn size(mut self, size: u32) -> Self {
        self.def.constraint = Constraint::Size(size);
        self
    }

    /// Sets precision and scale.
    #[must_use]
    pub fn precision(mut self, precision: u32, scale: u32) -> Self {
        self.def.constraint = Constraint::Pair(precision, scale);
        self
    }

    /// Sets the allowed values of an enum-like column.
    #[must_use]
    pub fn values<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.def.constraint = Constraint::List(values.into_iter().map(Into::into).collect());
        self
    }

    /// Allows NULL.
    #[must_use]
    pub fn null(mut self) -> Self {
        self.def.nullable = true;
        self
    }

    /// Forbids NULL (default).
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.def.nullable = false;
        self
    }

    /// Marks the column as UNIQUE.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.def.unique = true;
        self
    }

    /// Marks an integer column as UNSIGNED.
    #[must_use]
    pub fn unsigned(mut self) -> Self {
        self.def.unsigned = true;
        self
    }

    /// Sets a boolean default value.
    #[must_use]
    pub fn default_bool(mut self, value: bool) -> Self {
        self.def.default = Some(DefaultValue::Boolean(value));
        self
    }

    /// Sets an integer default value.
    #[must_use]
    pub fn default_int(mut self, value: i64) -> Self {
        self.def.default = Some(DefaultValue::Integer(value));
        self
    }

    /// Sets a float default value.
    #[must_use]
    pub fn default_float(mut self, value: f64) -> Self {
        self.def.default = Some(DefaultValue::Float(value));
        self
    }

    /// Sets a string default value.
    #[must_use]
    pub fn default_str(mut self, value: impl Into<String>) -> Self {
        self.def.default = Some(DefaultValue::String(value.into()));
        self
    }

    /// Sets a NULL default value.
    #[must_use]
    pub fn default_null(mut self) -> Self {
        self.def.default = Some(DefaultValue::Null);
        self
    }

    /// Sets a raw SQL expression as default (e.g., `CURRENT_TIMESTAMP`).
    #[must_use]
    pub fn default_expr(mut self, expr: impl Into<String>) -> Self {
        self.def.default = Some(DefaultValue::Expression(expr.into()));
        self
    }

    /// Sets the column comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.def.comment = Some(comment.into());
        self
    }

    /// Places the column first when added to an existing table.
    #[must_use]
    pub fn first(mut self) -> Self {
        self.def.position = Position::First;
        self
    }

    /// Places the column after `column` when added to an existing table.
    #[must_use]
    pub fn after(mut self, column: impl Into<String>) -> Self {
        self.def.position = Position::After(column.into());
        self
    }

    /// Builds the column definition.
    #[must_use]
    pub fn build(self) -> ColumnDefinition {
        self.def
    }
}

/// A column given either as a typed definition or as raw SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSpec {
    /// Typed definition rendered by the dialect.
    Typed(ColumnDefinition),
    /// Raw definition emitted verbatim after the quoted name.
    Raw {
        /// Column name.
        name: String,
        /// Everything after the name, e.g. `"INT NOT NULL DEFAULT 0"`.
        definition: String,
    },
}

impl ColumnSpec {
    /// Creates a raw column definition.
    #[must_use]
    pub fn raw(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self::Raw {
            name: name.into(),
            definition: definition.into(),
        }
    }

    /// Returns the column name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Typed(def) => &def.name,
            Self::Raw { name, .. } => name,
        }
    }
}

impl From<ColumnDefinition> for ColumnSpec {
    fn from(def: ColumnDefinition) -> Self {
        Self::Typed(def)
    }
}

impl From<ColumnBuilder> for ColumnSpec {
    fn from(builder: ColumnBuilder) -> Self {
        Self::Typed(builder.build())
    }
}

// =============================================================================
// Shorthand Functions for Common Types
// =============================================================================

/// Creates an auto-incrementing integer primary key column.
#[must_use]
pub fn primary_key(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, ColumnType::PrimaryKey)
}

/// Creates an auto-incrementing big integer primary key column.
#[must_use]
pub fn big_primary_key(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, ColumnType::BigPrimaryKey)
}

/// Creates a string column builder.
#[must_use]
pub fn string(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, ColumnType::String)
}

/// Creates a fixed-length string column builder.
#[must_use]
pub fn char(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, ColumnType::Char)
}

/// Creates a TEXT column builder.
#[must_use]
pub fn text(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, ColumnType::Text)
}

/// Creates a TINYTEXT column builder.
#[must_use]
pub fn tiny_text(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, ColumnType::TinyText)
}

/// Creates a MEDIUMTEXT column builder.
#[must_use]
pub fn medium_text(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, ColumnType::MediumText)
}

/// Creates a LONGTEXT column builder.
#[must_use]
pub fn long_text(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, ColumnType::LongText)
}

/// Creates a TINYINT column builder.
#[must_use]
pub fn tiny_integer(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, ColumnType::TinyInteger)
}

/// Creates a SMALLINT column builder.
#[must_use]
pub fn small_integer(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, ColumnType::SmallInteger)
}

/// Creates an INTEGER column builder.
#[must_use]
pub fn integer(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, ColumnType::Integer)
}

/// Creates a BIGINT column builder.
#[must_use]
pub fn big_integer(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, ColumnType::BigInteger)
}

/// Creates a FLOAT column builder.
#[must_use]
pub fn float(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, ColumnType::Float)
}

/// Creates a DOUBLE column builder.
#[must_use]
pub fn double(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, ColumnType::Double)
}

/// Creates a DECIMAL column builder.
#[must_use]
pub fn decimal(name: impl Into<String>, precision: u32, scale: u32) -> ColumnBuilder {
    ColumnBuilder::new(name, ColumnType::Decimal).precision(precision, scale)
}

/// Creates a DATETIME column builder.
#[must_use]
pub fn date_time(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, ColumnType::DateTime)
}

/// Creates a TIMESTAMP column builder.
#[must_use]
pub fn timestamp(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, ColumnType::Timestamp)
}

/// Creates a TIME column builder.
#[must_use]
pub fn time(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, ColumnType::Time)
}

/// Creates a DATE column builder.
#[must_use]
pub fn date(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, ColumnType::Date)
}

/// Creates a binary column builder.
#[must_use]
pub fn binary(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, ColumnType::Binary)
}

/// Creates a BOOLEAN column builder.
#[must_use]
pub fn boolean(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, ColumnType::Boolean)
}

/// Creates a money column builder.
#[must_use]
pub fn money(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, ColumnType::Money)
}

/// Creates a JSON column builder.
#[must_use]
pub fn json(name: impl Into<String>) -> ColumnBuilder {
    ColumnBuilder::new(name, ColumnType::Json)
}

/// Creates an enum-like column restricted to `values`.
#[must_use]
pub fn enumeration<S: Into<String>>(
    name: impl Into<String>,
    values: impl IntoIterator<Item = S>,
) -> ColumnBuilder {
    ColumnBuilder::new(name, ColumnType::Enum).values(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_column() {
        let col = integer("id").build();
        assert_eq!(col.name, "id");
        assert_eq!(col.column_type, ColumnType::Integer);
        assert!(!col.nullable);
        assert_eq!(col.position, Position::Last);
    }

    #[test]
    fn test_nullable_and_defaults() {
        let col = string("nickname").size(64).null().default_null().build();
        assert!(col.nullable);
        assert_eq!(col.constraint, Constraint::Size(64));
        assert_eq!(col.default, Some(DefaultValue::Null));
    }

    #[test]
    fn test_decimal_precision() {
        let col = decimal("price", 10, 2).build();
        assert_eq!(col.constraint, Constraint::Pair(10, 2));
    }

    #[test]
    fn test_position_directives() {
        assert_eq!(string("a").first().build().position, Position::First);
        assert_eq!(
            string("a").after("b").build().position,
            Position::After(String::from("b"))
        );
    }

    #[test]
    fn test_parse_column_type() {
        assert_eq!("bigpk".parse::<ColumnType>().unwrap(), ColumnType::BigPrimaryKey);
        assert_eq!("JSON".parse::<ColumnType>().unwrap(), ColumnType::Json);
        assert!(matches!(
            "geometry".parse::<ColumnType>(),
            Err(QueryError::UnsupportedColumnType(name)) if name == "geometry"
        ));
        assert!(ColumnBuilder::parse("x", "varchar2").is_err());
    }

    #[test]
    fn test_column_spec_name() {
        assert_eq!(ColumnSpec::from(integer("age")).name(), "age");
        assert_eq!(ColumnSpec::raw("age", "INT NOT NULL").name(), "age");
    }
}
