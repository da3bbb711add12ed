//! Index and foreign-key definitions for DDL.

use std::fmt;
use std::str::FromStr;

use crate::error::{QueryError, Result};

/// Kind of index or key constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// PRIMARY KEY constraint.
    Primary,
    /// UNIQUE constraint.
    Unique,
    /// Plain (non-unique) index.
    Key,
    /// Full-text index (MySQL).
    Fulltext,
    /// FOREIGN KEY constraint.
    Foreign,
}

impl IndexKind {
    /// Returns the kind name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Unique => "unique",
            Self::Key => "key",
            Self::Fulltext => "fulltext",
            Self::Foreign => "foreign",
        }
    }

    /// Prefix used when deriving an index name.
    #[must_use]
    pub const fn name_prefix(self) -> &'static str {
        match self {
            Self::Primary => "pk",
            Self::Unique => "uniq",
            Self::Key => "idx",
            Self::Fulltext => "ft",
            Self::Foreign => "fk",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" | "primary key" | "pk" => Ok(Self::Primary),
            "unique" | "unique key" => Ok(Self::Unique),
            "key" | "index" => Ok(Self::Key),
            "fulltext" => Ok(Self::Fulltext),
            "foreign" | "foreign key" | "fk" => Ok(Self::Foreign),
            _ => Err(QueryError::UnsupportedIndexType {
                kind: s.to_string(),
                dialect: "any dialect",
            }),
        }
    }
}

/// Foreign key referential action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignKeyAction {
    /// No action.
    NoAction,
    /// Restrict deletion/update.
    Restrict,
    /// Cascade the operation.
    Cascade,
    /// Set to NULL.
    SetNull,
    /// Set to default value.
    SetDefault,
}

impl ForeignKeyAction {
    /// Returns the SQL representation of the action.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

/// Target of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRef {
    /// Referenced table.
    pub table: String,
    /// Referenced columns, positionally matched with the local columns.
    pub columns: Vec<String>,
    /// Action on delete.
    pub on_delete: Option<ForeignKeyAction>,
    /// Action on update.
    pub on_update: Option<ForeignKeyAction>,
}

/// A complete index definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    /// Explicit name; derived from table and columns when absent.
    pub name: Option<String>,
    /// Index kind.
    pub kind: IndexKind,
    /// Indexed columns.
    pub columns: Vec<String>,
    /// Referenced table and columns (foreign keys only).
    pub references: Option<ForeignKeyRef>,
}

impl IndexDefinition {
    /// Returns the explicit name or derives `<prefix>_<table>_<columns>`.
    #[must_use]
    pub fn resolved_name(&self, table: &str) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let mut name = format!("{}_{table}", self.kind.name_prefix());
        for column in &self.columns {
            name.push('_');
            name.push_str(column);
        }
        name
    }

    /// Checks that the definition can be rendered.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] for an index without columns
    /// and [`QueryError::MalformedForeignKey`] for foreign keys without a
    /// referenced table or with a column count mismatch.
    pub fn validate(&self, table: &str) -> Result<()> {
        if self.columns.is_empty() {
            return Err(QueryError::InvalidArgument(format!(
                "index `{}` has no columns",
                self.resolved_name(table)
            )));
        }
        if self.kind != IndexKind::Foreign {
            return Ok(());
        }
        let malformed = |reason: String| QueryError::MalformedForeignKey {
            name: self.resolved_name(table),
            reason,
        };
        let target = self
            .references
            .as_ref()
            .ok_or_else(|| malformed(String::from("no referenced table")))?;
        if target.table.trim().is_empty() {
            return Err(malformed(String::from("no referenced table")));
        }
        if target.columns.len() != self.columns.len() {
            return Err(malformed(format!(
                "{} local columns but {} referenced columns",
                self.columns.len(),
                target.columns.len()
            )));
        }
        Ok(())
    }
}

/// Fluent index builder.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    def: IndexDefinition,
    on_delete: Option<ForeignKeyAction>,
    on_update: Option<ForeignKeyAction>,
}

impl IndexBuilder {
    /// Creates an index of `kind` over `columns`.
    #[must_use]
    pub fn new<S: Into<String>>(kind: IndexKind, columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            def: IndexDefinition {
                name: None,
                kind,
                columns: columns.into_iter().map(Into::into).collect(),
                references: None,
            },
            on_delete: None,
            on_update: None,
        }
    }

    /// PRIMARY KEY over `columns`.
    #[must_use]
    pub fn primary<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self::new(IndexKind::Primary, columns)
    }

    /// UNIQUE constraint over `columns`.
    #[must_use]
    pub fn unique<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self::new(IndexKind::Unique, columns)
    }

    /// Plain index over `columns`.
    #[must_use]
    pub fn key<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self::new(IndexKind::Key, columns)
    }

    /// Full-text index over `columns`.
    #[must_use]
    pub fn fulltext<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self::new(IndexKind::Fulltext, columns)
    }

    /// FOREIGN KEY over `columns`; complete it with [`references`](Self::references).
    #[must_use]
    pub fn foreign<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self::new(IndexKind::Foreign, columns)
    }

    /// Sets an explicit index name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.def.name = Some(name.into());
        self
    }

    /// Sets the referenced table and columns.
    #[must_use]
    pub fn references<S: Into<String>>(
        mut self,
        table: impl Into<String>,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.def.references = Some(ForeignKeyRef {
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            on_delete: None,
            on_update: None,
        });
        self
    }

    /// Sets the ON DELETE action, before or after [`references`](Self::references).
    #[must_use]
    pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    /// Sets the ON UPDATE action, before or after [`references`](Self::references).
    #[must_use]
    pub fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = Some(action);
        self
    }

    /// Builds the index definition.
    #[must_use]
    pub fn build(mut self) -> IndexDefinition {
        if let Some(target) = self.def.references.as_mut() {
            target.on_delete = self.on_delete;
            target.on_update = self.on_update;
        }
        self.def
    }
}

/// An index given either as a typed definition or as raw SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSpec {
    /// Typed definition rendered by the dialect.
    Typed(IndexDefinition),
    /// Raw table-constraint text emitted verbatim inside CREATE TABLE.
    Raw(String),
}

impl From<IndexDefinition> for IndexSpec {
    fn from(def: IndexDefinition) -> Self {
        Self::Typed(def)
    }
}

impl From<IndexBuilder> for IndexSpec {
    fn from(builder: IndexBuilder) -> Self {
        Self::Typed(builder.build())
    }
}
