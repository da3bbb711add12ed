//! Per-statement builder state.

use super::JoinType;
use crate::condition::Conditions;
use crate::error::{QueryError, Result};
use crate::value::SqlValue;

/// A select-list entry, protected lazily at compile time.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SelectItem {
    Expr {
        expr: String,
        protect: bool,
    },
    Aggregate {
        function: &'static str,
        field: String,
        alias: String,
    },
}

/// A FROM entry. Tables are protected lazily at compile time; nested
/// queries and derived tables are kept as compiled when added.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FromItem {
    Table(String),
    Verbatim { raw: String, sql: String },
}

impl FromItem {
    /// The caller's text.
    pub fn raw(&self) -> &str {
        match self {
            Self::Table(raw) | Self::Verbatim { raw, .. } => raw,
        }
    }
}

/// A JOIN entry, protected lazily at compile time.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct JoinItem {
    pub join_type: JoinType,
    pub table: String,
    pub condition: String,
}

/// An ORDER BY entry.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum OrderItem {
    Column {
        column: String,
        direction: Option<&'static str>,
    },
    Random,
}

/// A value assigned by SET.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Assignment {
    Value(SqlValue),
    Expr(String),
}

/// Values for INSERT/UPDATE; single-row and batch forms never mix.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) enum SetValues {
    #[default]
    Empty,
    Single(Vec<(String, Assignment)>),
    Batch(Vec<Vec<(String, SqlValue)>>),
}

impl SetValues {
    pub fn assign(&mut self, column: &str, value: Assignment) -> Result<()> {
        match self {
            Self::Empty => *self = Self::Single(vec![(column.to_string(), value)]),
            Self::Single(values) => match values.iter_mut().find(|(c, _)| c == column) {
                Some(slot) => slot.1 = value,
                None => values.push((column.to_string(), value)),
            },
            Self::Batch(_) => return Err(QueryError::MixedSetValues),
        }
        Ok(())
    }

    pub fn push_rows(&mut self, rows: Vec<Vec<(String, SqlValue)>>) -> Result<()> {
        match self {
            Self::Empty => *self = Self::Batch(rows),
            Self::Batch(existing) => existing.extend(rows),
            Self::Single(_) => return Err(QueryError::MixedSetValues),
        }
        Ok(())
    }
}

/// A common table expression.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Cte {
    pub name: String,
    pub columns: Vec<String>,
    pub query: String,
    pub recursive: bool,
}

/// A UNION epilogue.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct UnionPart {
    pub sql: String,
    pub all: bool,
}

/// Everything one statement accumulates between realizations.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct QueryState {
    pub select: Vec<SelectItem>,
    pub distinct: bool,
    pub from: Vec<FromItem>,
    pub joins: Vec<JoinItem>,
    pub wheres: Conditions,
    pub group_by: Vec<String>,
    pub havings: Conditions,
    pub order_by: Vec<OrderItem>,
    pub limit: u64,
    pub offset: u64,
    pub ctes: Vec<Cte>,
    pub unions: Vec<UnionPart>,
    pub modifiers: Vec<String>,
    pub aliases: Vec<String>,
    pub set: SetValues,
}

impl QueryState {
    pub fn register_alias(&mut self, alias: &str) {
        let alias = alias.trim();
        if !alias.is_empty() && !self.aliases.iter().any(|a| a == alias) {
            self.aliases.push(alias.to_string());
        }
    }

    /// Captures the parts a write statement is compiled from.
    pub fn template(&self) -> StatementTemplate {
        StatementTemplate {
            from: self.from.clone(),
            wheres: self.wheres.clone(),
            order_by: self.order_by.clone(),
            limit: self.limit,
        }
    }
}

/// The parts of a statement that DELETE across several tables repeats.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StatementTemplate {
    pub from: Vec<FromItem>,
    pub wheres: Conditions,
    pub order_by: Vec<OrderItem>,
    pub limit: u64,
}

impl StatementTemplate {
    /// Same template aimed at another table.
    pub fn for_table(&self, table: &str) -> Self {
        Self {
            from: vec![FromItem::Table(table.to_string())],
            ..self.clone()
        }
    }
}
