//! WHERE / HAVING condition trees.
//!
//! Conditions are an explicit tree: each node is a predicate or a
//! parenthesized group, and carries the conjunction joining it to its
//! previous sibling. Groups are built through closures, so an unbalanced
//! group cannot be expressed.
//!
//! ```rust
//! use oxide_query::{BuilderOptions, Conditions, Driver, IdentifierProtector};
//!
//! let mut c = Conditions::new();
//! c.group(|g| {
//!     g.where_("a", 1)?.or_where("b", 2)?;
//!     Ok(())
//! })
//! .unwrap()
//! .where_("c", 3)
//! .unwrap();
//!
//! let options = BuilderOptions::default().with_protect_identifiers(false);
//! let p = IdentifierProtector::new(Driver::Sqlite.dialect(), &options);
//! assert_eq!(c.render(&p, "\n"), "(a = 1 OR b = 2)\nAND c = 3");
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{QueryError, Result};
use crate::protect::IdentifierProtector;
use crate::value::{SqlValue, ToSqlValue};

/// Comparison operators accepted inside a condition key.
const OPERATORS: [&str; 11] = [
    "=", "!=", "<>", "<", ">", "<=", ">=", "LIKE", "NOT LIKE", "IS", "IS NOT",
];

/// Logical operator joining a node to its previous sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Conjunction {
    /// `AND`.
    #[default]
    And,
    /// `OR`.
    Or,
}

impl Conjunction {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Conjunction {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim();
        if token.eq_ignore_ascii_case("AND") {
            Ok(Self::And)
        } else if token.eq_ignore_ascii_case("OR") {
            Ok(Self::Or)
        } else {
            Err(QueryError::InvalidConjunction(s.to_string()))
        }
    }
}

/// Where the `%` wildcards go in a LIKE pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LikeSide {
    /// `%match`.
    Before,
    /// `match%`.
    After,
    /// `%match%`.
    #[default]
    Both,
    /// Exact match, no wildcard.
    None,
}

impl LikeSide {
    fn wrap(self, escaped: &str) -> String {
        match self {
            Self::Before => format!("%{escaped}"),
            Self::After => format!("{escaped}%"),
            Self::Both => format!("%{escaped}%"),
            Self::None => escaped.to_string(),
        }
    }
}

/// A single predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column op value`.
    Compare {
        /// Column reference.
        column: String,
        /// Validated operator.
        operator: String,
        /// Right-hand value.
        value: SqlValue,
    },
    /// `column IS [NOT] NULL`.
    Null {
        /// Column reference.
        column: String,
        /// `IS NOT NULL` when true.
        negated: bool,
    },
    /// `column [NOT] LIKE pattern ESCAPE '!'`.
    Like {
        /// Column reference.
        column: String,
        /// Unescaped match text.
        pattern: String,
        /// Wildcard placement.
        side: LikeSide,
        /// `NOT LIKE` when true.
        negated: bool,
    },
    /// `column [NOT] IN (values)`.
    In {
        /// Column reference.
        column: String,
        /// Non-empty value list.
        values: Vec<SqlValue>,
        /// `NOT IN` when true.
        negated: bool,
    },
    /// `column [NOT] BETWEEN low AND high`.
    Between {
        /// Column reference.
        column: String,
        /// Lower bound.
        low: SqlValue,
        /// Upper bound.
        high: SqlValue,
        /// `NOT BETWEEN` when true.
        negated: bool,
    },
    /// Hand-written SQL, emitted verbatim.
    Raw(String),
}

impl Predicate {
    fn render(&self, p: &IdentifierProtector<'_>) -> String {
        let d = p.dialect();
        let not = |negated: bool| if negated { "NOT " } else { "" };
        match self {
            Self::Compare {
                column,
                operator,
                value,
            } => format!("{} {operator} {}", p.protect(column), d.quote_value(value)),
            Self::Null { column, negated } => {
                format!("{} IS {}NULL", p.protect(column), not(*negated))
            }
            Self::Like {
                column,
                pattern,
                side,
                negated,
            } => format!(
                "{} {}LIKE {} ESCAPE '!'",
                p.protect(column),
                not(*negated),
                d.quote_string(&side.wrap(&escape_like(pattern)))
            ),
            Self::In {
                column,
                values,
                negated,
            } => {
                let list = values
                    .iter()
                    .map(|v| d.quote_value(v))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{} {}IN ({list})", p.protect(column), not(*negated))
            }
            Self::Between {
                column,
                low,
                high,
                negated,
            } => format!(
                "{} {}BETWEEN {} AND {}",
                p.protect(column),
                not(*negated),
                d.quote_value(low),
                d.quote_value(high)
            ),
            Self::Raw(sql) => sql.clone(),
        }
    }
}

/// A node of the condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    /// A predicate.
    Predicate {
        /// Conjunction with the previous sibling.
        conjunction: Conjunction,
        /// The predicate.
        predicate: Predicate,
    },
    /// A parenthesized group.
    Group {
        /// Conjunction with the previous sibling.
        conjunction: Conjunction,
        /// `NOT (...)` when true.
        negated: bool,
        /// Group members.
        children: Conditions,
    },
}

impl ConditionNode {
    const fn conjunction(&self) -> Conjunction {
        match self {
            Self::Predicate { conjunction, .. } | Self::Group { conjunction, .. } => *conjunction,
        }
    }

    fn render(&self, p: &IdentifierProtector<'_>) -> String {
        match self {
            Self::Predicate { predicate, .. } => predicate.render(p),
            Self::Group {
                negated, children, ..
            } => format!(
                "{}({})",
                if *negated { "NOT " } else { "" },
                children.render(p, " ")
            ),
        }
    }
}

/// An ordered list of condition nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions {
    nodes: Vec<ConditionNode>,
}

impl Conditions {
    /// Creates an empty condition list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when no condition was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the nodes.
    #[must_use]
    pub fn nodes(&self) -> &[ConditionNode] {
        &self.nodes
    }

    /// Appends a predicate.
    pub fn push(&mut self, conjunction: Conjunction, predicate: Predicate) -> &mut Self {
        self.nodes.push(ConditionNode::Predicate {
            conjunction,
            predicate,
        });
        self
    }

    /// Appends a group built by `build`. Empty groups are dropped.
    ///
    /// # Errors
    ///
    /// Propagates the first error raised inside `build`.
    pub fn nest<F>(&mut self, conjunction: Conjunction, negated: bool, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let mut children = Self::new();
        build(&mut children)?;
        if !children.is_empty() {
            self.nodes.push(ConditionNode::Group {
                conjunction,
                negated,
                children,
            });
        }
        Ok(self)
    }

    /// Appends every node of `other`; its first node joins with `conjunction`.
    pub fn append(&mut self, conjunction: Conjunction, other: Self) -> &mut Self {
        for (i, node) in other.nodes.into_iter().enumerate() {
            let node = if i == 0 { node.with_conjunction(conjunction) } else { node };
            self.nodes.push(node);
        }
        self
    }

    /// Renders the list; top-level nodes are joined with `separator`.
    #[must_use]
    pub fn render(&self, p: &IdentifierProtector<'_>, separator: &str) -> String {
        let mut sql = String::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                sql.push_str(separator);
                sql.push_str(node.conjunction().as_sql());
                sql.push(' ');
            }
            sql.push_str(&node.render(p));
        }
        sql
    }

    fn compare(
        &mut self,
        conjunction: Conjunction,
        key: &str,
        value: SqlValue,
    ) -> Result<&mut Self> {
        let (column, operator) = split_operator(key)?;
        let predicate = if value.is_null() {
            match operator.as_str() {
                "=" | "IS" => Predicate::Null {
                    column,
                    negated: false,
                },
                "!=" | "<>" | "IS NOT" => Predicate::Null {
                    column,
                    negated: true,
                },
                other => {
                    return Err(QueryError::InvalidArgument(format!(
                        "NULL cannot be compared with `{other}`"
                    )))
                }
            }
        } else {
            Predicate::Compare {
                column,
                operator,
                value,
            }
        };
        Ok(self.push(conjunction, predicate))
    }

    /// `AND key value`; the operator may be embedded in `key` (`"age >"`).
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidOperator`] for an unknown operator.
    pub fn where_(&mut self, key: &str, value: impl ToSqlValue) -> Result<&mut Self> {
        self.compare(Conjunction::And, key, value.to_sql_value())
    }

    /// `OR key value`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidOperator`] for an unknown operator.
    pub fn or_where(&mut self, key: &str, value: impl ToSqlValue) -> Result<&mut Self> {
        self.compare(Conjunction::Or, key, value.to_sql_value())
    }

    /// Adds every `(key, value)` pair, joined by `logic` (`AND` or `OR`).
    ///
    /// The first pair joins the existing conditions with `AND`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidConjunction`] for a bad `logic` token and
    /// [`QueryError::InvalidOperator`] for an unknown operator.
    pub fn where_map<K, V>(
        &mut self,
        pairs: impl IntoIterator<Item = (K, V)>,
        logic: &str,
    ) -> Result<&mut Self>
    where
        K: AsRef<str>,
        V: ToSqlValue,
    {
        let logic: Conjunction = logic.parse()?;
        for (i, (key, value)) in pairs.into_iter().enumerate() {
            let conjunction = if i == 0 { Conjunction::And } else { logic };
            self.compare(conjunction, key.as_ref(), value.to_sql_value())?;
        }
        Ok(self)
    }

    fn in_list<V: ToSqlValue>(
        &mut self,
        conjunction: Conjunction,
        column: &str,
        values: impl IntoIterator<Item = V>,
        negated: bool,
    ) -> Result<&mut Self> {
        let values: Vec<SqlValue> = values.into_iter().map(ToSqlValue::to_sql_value).collect();
        if values.is_empty() {
            return Err(QueryError::InvalidArgument(format!(
                "IN list for `{column}` is empty"
            )));
        }
        Ok(self.push(
            conjunction,
            Predicate::In {
                column: column.to_string(),
                values,
                negated,
            },
        ))
    }

    /// `AND column IN (...)`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] for an empty list.
    pub fn where_in<V: ToSqlValue>(
        &mut self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Result<&mut Self> {
        self.in_list(Conjunction::And, column, values, false)
    }

    /// `OR column IN (...)`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] for an empty list.
    pub fn or_where_in<V: ToSqlValue>(
        &mut self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Result<&mut Self> {
        self.in_list(Conjunction::Or, column, values, false)
    }

    /// `AND column NOT IN (...)`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] for an empty list.
    pub fn where_not_in<V: ToSqlValue>(
        &mut self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Result<&mut Self> {
        self.in_list(Conjunction::And, column, values, true)
    }

    /// `OR column NOT IN (...)`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] for an empty list.
    pub fn or_where_not_in<V: ToSqlValue>(
        &mut self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Result<&mut Self> {
        self.in_list(Conjunction::Or, column, values, true)
    }

    /// `AND column IS NULL`.
    pub fn where_null(&mut self, column: &str) -> &mut Self {
        self.push(Conjunction::And, null(column, false))
    }

    /// `OR column IS NULL`.
    pub fn or_where_null(&mut self, column: &str) -> &mut Self {
        self.push(Conjunction::Or, null(column, false))
    }

    /// `AND column IS NOT NULL`.
    pub fn where_not_null(&mut self, column: &str) -> &mut Self {
        self.push(Conjunction::And, null(column, true))
    }

    /// `OR column IS NOT NULL`.
    pub fn or_where_not_null(&mut self, column: &str) -> &mut Self {
        self.push(Conjunction::Or, null(column, true))
    }

    fn range<V: ToSqlValue>(
        &mut self,
        conjunction: Conjunction,
        column: &str,
        bounds: impl IntoIterator<Item = V>,
        negated: bool,
    ) -> Result<&mut Self> {
        let bounds: Vec<SqlValue> = bounds.into_iter().map(ToSqlValue::to_sql_value).collect();
        let [low, high]: [SqlValue; 2] = bounds
            .try_into()
            .map_err(|rest: Vec<SqlValue>| QueryError::BetweenArity(rest.len()))?;
        Ok(self.push(
            conjunction,
            Predicate::Between {
                column: column.to_string(),
                low,
                high,
                negated,
            },
        ))
    }

    /// `AND column BETWEEN a AND b`; exactly two bounds are required.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::BetweenArity`] unless two bounds are given.
    pub fn between<V: ToSqlValue>(
        &mut self,
        column: &str,
        bounds: impl IntoIterator<Item = V>,
    ) -> Result<&mut Self> {
        self.range(Conjunction::And, column, bounds, false)
    }

    /// `OR column BETWEEN a AND b`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::BetweenArity`] unless two bounds are given.
    pub fn or_between<V: ToSqlValue>(
        &mut self,
        column: &str,
        bounds: impl IntoIterator<Item = V>,
    ) -> Result<&mut Self> {
        self.range(Conjunction::Or, column, bounds, false)
    }

    /// `AND column NOT BETWEEN a AND b`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::BetweenArity`] unless two bounds are given.
    pub fn not_between<V: ToSqlValue>(
        &mut self,
        column: &str,
        bounds: impl IntoIterator<Item = V>,
    ) -> Result<&mut Self> {
        self.range(Conjunction::And, column, bounds, true)
    }

    /// `OR column NOT BETWEEN a AND b`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::BetweenArity`] unless two bounds are given.
    pub fn or_not_between<V: ToSqlValue>(
        &mut self,
        column: &str,
        bounds: impl IntoIterator<Item = V>,
    ) -> Result<&mut Self> {
        self.range(Conjunction::Or, column, bounds, true)
    }

    /// `AND column LIKE pattern`.
    pub fn like(&mut self, column: &str, text: &str, side: LikeSide) -> &mut Self {
        self.push(Conjunction::And, like(column, text, side, false))
    }

    /// `OR column LIKE pattern`.
    pub fn or_like(&mut self, column: &str, text: &str, side: LikeSide) -> &mut Self {
        self.push(Conjunction::Or, like(column, text, side, false))
    }

    /// `AND column NOT LIKE pattern`.
    pub fn not_like(&mut self, column: &str, text: &str, side: LikeSide) -> &mut Self {
        self.push(Conjunction::And, like(column, text, side, true))
    }

    /// `OR column NOT LIKE pattern`.
    pub fn or_not_like(&mut self, column: &str, text: &str, side: LikeSide) -> &mut Self {
        self.push(Conjunction::Or, like(column, text, side, true))
    }

    /// `AND <sql>`, emitted verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] for a blank predicate.
    pub fn raw(&mut self, sql: impl Into<String>) -> Result<&mut Self> {
        let predicate = raw(sql.into())?;
        Ok(self.push(Conjunction::And, predicate))
    }

    /// `OR <sql>`, emitted verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] for a blank predicate.
    pub fn or_raw(&mut self, sql: impl Into<String>) -> Result<&mut Self> {
        let predicate = raw(sql.into())?;
        Ok(self.push(Conjunction::Or, predicate))
    }

    /// `AND (...)`.
    ///
    /// # Errors
    ///
    /// Propagates the first error raised inside `build`.
    pub fn group<F>(&mut self, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.nest(Conjunction::And, false, build)
    }

    /// `OR (...)`.
    ///
    /// # Errors
    ///
    /// Propagates the first error raised inside `build`.
    pub fn or_group<F>(&mut self, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.nest(Conjunction::Or, false, build)
    }

    /// `AND NOT (...)`.
    ///
    /// # Errors
    ///
    /// Propagates the first error raised inside `build`.
    pub fn not_group<F>(&mut self, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.nest(Conjunction::And, true, build)
    }

    /// `OR NOT (...)`.
    ///
    /// # Errors
    ///
    /// Propagates the first error raised inside `build`.
    pub fn or_not_group<F>(&mut self, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.nest(Conjunction::Or, true, build)
    }
}

impl ConditionNode {
    fn with_conjunction(self, conjunction: Conjunction) -> Self {
        match self {
            Self::Predicate { predicate, .. } => Self::Predicate {
                conjunction,
                predicate,
            },
            Self::Group {
                negated, children, ..
            } => Self::Group {
                conjunction,
                negated,
                children,
            },
        }
    }
}

fn null(column: &str, negated: bool) -> Predicate {
    Predicate::Null {
        column: column.to_string(),
        negated,
    }
}

fn like(column: &str, text: &str, side: LikeSide, negated: bool) -> Predicate {
    Predicate::Like {
        column: column.to_string(),
        pattern: text.to_string(),
        side,
        negated,
    }
}

fn raw(sql: String) -> Result<Predicate> {
    if sql.trim().is_empty() {
        return Err(QueryError::InvalidArgument(String::from(
            "raw predicate must not be blank",
        )));
    }
    Ok(Predicate::Raw(sql))
}

/// Escapes LIKE wildcards with `!`.
#[must_use]
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '!' | '%' | '_') {
            escaped.push('!');
        }
        escaped.push(c);
    }
    escaped
}

/// Splits `"age >="` into `("age", ">=")`; no operator means `=`.
///
/// # Errors
///
/// Returns [`QueryError::InvalidOperator`] when the operator is not one of
/// `=`, `!=`, `<>`, `<`, `>`, `<=`, `>=`, `LIKE`, `NOT LIKE`, `IS`, `IS NOT`.
pub fn split_operator(key: &str) -> Result<(String, String)> {
    let key = key.trim();
    let mut depth = 0_i32;
    let mut split_at = None;
    for (i, c) in key.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            '<' | '>' | '=' | '!' if depth == 0 => {
                split_at = Some(i);
                break;
            }
            c if c.is_whitespace() && depth == 0 && split_at.is_none() => {
                split_at = Some(i);
            }
            _ => {}
        }
    }
    let Some(at) = split_at else {
        return Ok((key.to_string(), String::from("=")));
    };
    let column = key[..at].trim();
    let operator = key[at..]
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase();
    if column.is_empty() || !OPERATORS.contains(&operator.as_str()) {
        return Err(QueryError::InvalidOperator(key[at..].trim().to_string()));
    }
    Ok((column.to_string(), operator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuilderOptions;
    use crate::dialect::Driver;

    fn render(c: &Conditions) -> String {
        let options = BuilderOptions::default().with_protect_identifiers(false);
        let p = IdentifierProtector::new(Driver::Postgres.dialect(), &options);
        c.render(&p, "\n")
    }

    #[test]
    fn test_conjunction_placement() {
        let mut c = Conditions::new();
        c.where_("x", 1).unwrap().where_("y", 2).unwrap();
        assert_eq!(render(&c), "x = 1\nAND y = 2");
    }

    #[test]
    fn test_nested_groups() {
        let mut c = Conditions::new();
        c.group(|g| {
            g.where_("a", 1)?.or_group(|inner| {
                inner.where_("b", 2)?.where_("c", 3)?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap()
        .or_where("d", 4)
        .unwrap();
        assert_eq!(render(&c), "(a = 1 OR (b = 2 AND c = 3))\nOR d = 4");
    }

    #[test]
    fn test_negated_and_empty_groups() {
        let mut c = Conditions::new();
        c.group(|_| Ok(())).unwrap();
        assert!(c.is_empty());
        c.not_group(|g| {
            g.where_null("deleted_at");
            Ok(())
        })
        .unwrap();
        assert_eq!(render(&c), "NOT (deleted_at IS NULL)");
    }

    #[test]
    fn test_error_inside_group_propagates() {
        let mut c = Conditions::new();
        let err = c
            .group(|g| {
                g.between("age", [1])?;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, QueryError::BetweenArity(1)));
        assert!(c.is_empty());
    }

    #[test]
    fn test_blank_raw_predicate_is_rejected() {
        let mut c = Conditions::new();
        assert!(matches!(c.raw("  "), Err(QueryError::InvalidArgument(_))));
        assert!(matches!(c.or_raw(""), Err(QueryError::InvalidArgument(_))));
        assert!(c.is_empty());
        c.raw("a > 1").unwrap();
        assert_eq!(render(&c), "a > 1");
    }

    #[test]
    fn test_split_operator() {
        assert_eq!(
            split_operator("age >=").unwrap(),
            (String::from("age"), String::from(">="))
        );
        assert_eq!(
            split_operator("age>=").unwrap(),
            (String::from("age"), String::from(">="))
        );
        assert_eq!(
            split_operator("name not like").unwrap(),
            (String::from("name"), String::from("NOT LIKE"))
        );
        assert_eq!(
            split_operator("COUNT(id) >").unwrap(),
            (String::from("COUNT(id)"), String::from(">"))
        );
        assert_eq!(
            split_operator("id").unwrap(),
            (String::from("id"), String::from("="))
        );
        assert!(matches!(
            split_operator("id; DROP"),
            Err(QueryError::InvalidOperator(_))
        ));
    }

    #[test]
    fn test_null_values() {
        let mut c = Conditions::new();
        c.where_("a", SqlValue::Null)
            .unwrap()
            .where_("b !=", None::<i32>)
            .unwrap();
        assert_eq!(render(&c), "a IS NULL\nAND b IS NOT NULL");
        assert!(matches!(
            Conditions::new().where_("a >", SqlValue::Null),
            Err(QueryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_like_escaping() {
        let mut c = Conditions::new();
        c.like("title", "50%_off!", LikeSide::After)
            .or_not_like("title", "x", LikeSide::None);
        assert_eq!(
            render(&c),
            "title LIKE '50!%!_off!!%' ESCAPE '!'\nOR title NOT LIKE 'x' ESCAPE '!'"
        );
    }

    #[test]
    fn test_in_and_between() {
        let mut c = Conditions::new();
        c.where_in("id", [1, 2, 3])
            .unwrap()
            .or_not_between("age", [18, 65])
            .unwrap();
        assert_eq!(render(&c), "id IN (1, 2, 3)\nOR age NOT BETWEEN 18 AND 65");
        assert!(matches!(
            Conditions::new().where_in("id", Vec::<i64>::new()),
            Err(QueryError::InvalidArgument(_))
        ));
        assert!(matches!(
            Conditions::new().between("id", [1, 2, 3]),
            Err(QueryError::BetweenArity(3))
        ));
    }

    #[test]
    fn test_where_map_logic() {
        let mut c = Conditions::new();
        c.where_map([("a", 1), ("b", 2)], "or").unwrap();
        assert_eq!(render(&c), "a = 1\nOR b = 2");
        assert!(matches!(
            Conditions::new().where_map([("a", 1)], "XOR"),
            Err(QueryError::InvalidConjunction(_))
        ));
    }
}
