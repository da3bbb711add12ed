//! SELECT assembly and the read helpers.

use std::sync::OnceLock;

use regex::Regex;

use super::state::{Cte, FromItem, JoinItem, OrderItem, SelectItem, UnionPart};
use super::{JoinType, QueryBuilder};
use crate::condition::{Conditions, LikeSide};
use crate::error::{QueryError, Result};
use crate::exec::{Realized, Row};
use crate::protect::{alias_name, split_alias, split_list, IdentifierProtector};
use crate::value::{SqlValue, ToSqlValue};

/// `a.x = b.y` style join conditions whose operands can be protected.
fn simple_join_condition() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"^([\w.`"\[\]]+)\s*(=|<>|!=|<=|>=|<|>)\s*([\w.`"\[\]]+)$"#)
            .expect("join condition pattern is valid")
    })
}

/// True when a FROM entry is itself a query or a join.
fn looks_nested(sql: &str) -> bool {
    let mut words = sql.split_whitespace();
    words
        .next()
        .is_some_and(|first| first.eq_ignore_ascii_case("SELECT"))
        || words.any(|word| word.eq_ignore_ascii_case("JOIN"))
}

fn protect_operand(p: &IdentifierProtector<'_>, operand: &str) -> String {
    if operand.parse::<f64>().is_ok() {
        operand.to_string()
    } else {
        p.protect(operand)
    }
}

impl<'c> QueryBuilder<'c> {
    /// Adds a comma-separated list of columns or expressions.
    pub fn select(&mut self, columns: &str) -> &mut Self {
        for column in split_list(columns) {
            if let (_, Some(alias)) = split_alias(&column) {
                self.state.register_alias(alias_name(alias));
            }
            self.state.select.push(SelectItem::Expr {
                expr: column,
                protect: true,
            });
        }
        self
    }

    /// Adds a select expression emitted verbatim.
    pub fn select_raw(&mut self, expr: &str) -> &mut Self {
        self.state.select.push(SelectItem::Expr {
            expr: expr.trim().to_string(),
            protect: false,
        });
        self
    }

    fn select_aggregate(&mut self, function: &'static str, field: &str, alias: Option<&str>) -> &mut Self {
        let field = field.trim();
        let alias = match alias {
            Some(alias) => alias.trim().to_string(),
            None if field == "*" => function.to_ascii_lowercase(),
            None => field.rsplit('.').next().unwrap_or(field).to_string(),
        };
        self.state.register_alias(&alias);
        self.state.select.push(SelectItem::Aggregate {
            function,
            field: field.to_string(),
            alias,
        });
        self
    }

    /// `MAX(field) AS alias`; the alias defaults to the column name.
    pub fn select_max(&mut self, field: &str, alias: Option<&str>) -> &mut Self {
        self.select_aggregate("MAX", field, alias)
    }

    /// `MIN(field) AS alias`.
    pub fn select_min(&mut self, field: &str, alias: Option<&str>) -> &mut Self {
        self.select_aggregate("MIN", field, alias)
    }

    /// `AVG(field) AS alias`.
    pub fn select_avg(&mut self, field: &str, alias: Option<&str>) -> &mut Self {
        self.select_aggregate("AVG", field, alias)
    }

    /// `SUM(field) AS alias`.
    pub fn select_sum(&mut self, field: &str, alias: Option<&str>) -> &mut Self {
        self.select_aggregate("SUM", field, alias)
    }

    /// `COUNT(field) AS alias`.
    pub fn select_count(&mut self, field: &str, alias: Option<&str>) -> &mut Self {
        self.select_aggregate("COUNT", field, alias)
    }

    /// Emits `SELECT DISTINCT`.
    pub fn distinct(&mut self) -> &mut Self {
        self.state.distinct = true;
        self
    }

    /// Adds a keyword emitted right after the statement verb, such as
    /// `SQL_CALC_FOUND_ROWS` or `LOW_PRIORITY`.
    pub fn modifier(&mut self, keyword: &str) -> &mut Self {
        let keyword = keyword.trim();
        if !keyword.is_empty() {
            self.state.modifiers.push(keyword.to_string());
        }
        self
    }

    /// Adds FROM entries.
    ///
    /// `tables` is a comma-separated list of `table [alias]` entries. An entry
    /// that is itself a query or a join is wrapped in parentheses, unless it
    /// already starts with one.
    pub fn from(&mut self, tables: &str) -> &mut Self {
        let tables = tables.trim();
        if looks_nested(tables) && !tables.starts_with('(') {
            self.state.from.push(FromItem::Verbatim {
                raw: tables.to_string(),
                sql: format!("({tables})"),
            });
            return self;
        }
        for entry in split_list(tables) {
            let (_, alias) = split_alias(&entry);
            if let Some(alias) = alias {
                self.state.register_alias(alias_name(alias));
            }
            let item = if entry.starts_with('(') {
                FromItem::Verbatim {
                    raw: entry.clone(),
                    sql: entry,
                }
            } else {
                FromItem::Table(entry)
            };
            self.state.from.push(item);
        }
        self
    }

    /// Same as [`from`](Self::from); reads better for write statements.
    pub fn table(&mut self, table: &str) -> &mut Self {
        self.from(table)
    }

    fn subquery<F>(&self, build: F) -> Result<String>
    where
        F: FnOnce(&mut QueryBuilder<'c>) -> Result<()>,
    {
        let mut sub = self.fork();
        build(&mut sub)?;
        sub.compile_select()
    }

    /// Adds a derived table built by `build` under `alias`.
    ///
    /// # Errors
    ///
    /// Propagates errors raised while building the subquery.
    pub fn from_subquery<F>(&mut self, alias: &str, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut QueryBuilder<'c>) -> Result<()>,
    {
        let sql = self.subquery(build)?;
        self.state.register_alias(alias);
        let quoted = self.protector().quote(alias);
        self.state.from.push(FromItem::Verbatim {
            raw: alias.trim().to_string(),
            sql: format!("({sql}) {quoted}"),
        });
        Ok(self)
    }

    /// Adds a join; `join_type` is parsed as a [`JoinType`] (`""` is an
    /// inner join).
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidJoinType`] for an unknown type and
    /// [`QueryError::InvalidArgument`] when the condition does not fit the
    /// join type.
    pub fn join(&mut self, table: &str, condition: &str, join_type: &str) -> Result<&mut Self> {
        let join_type: JoinType = join_type.parse()?;
        self.join_with(table, condition, join_type)
    }

    /// Adds a join with an already parsed type.
    ///
    /// The table and a simple `a.x = b.y` condition are protected at compile
    /// time, so aliases registered later are honored. Any other condition is
    /// emitted as written.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] for a CROSS JOIN with a
    /// condition, or any other join without one.
    pub fn join_with(&mut self, table: &str, condition: &str, join_type: JoinType) -> Result<&mut Self> {
        let condition = condition.trim();
        match (join_type, condition.is_empty()) {
            (JoinType::Cross, false) => {
                return Err(QueryError::InvalidArgument(String::from(
                    "CROSS JOIN takes no condition",
                )))
            }
            (JoinType::Cross, true) | (_, false) => {}
            (_, true) => {
                return Err(QueryError::InvalidArgument(format!(
                    "{join_type} on `{table}` needs a condition"
                )))
            }
        }
        if let (_, Some(alias)) = split_alias(table) {
            self.state.register_alias(alias_name(alias));
        }
        self.state.joins.push(JoinItem {
            join_type,
            table: table.trim().to_string(),
            condition: condition.to_string(),
        });
        Ok(self)
    }

    /// `AND key value`; the operator may be embedded in `key` (`"age >="`).
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidOperator`] for an unknown operator.
    pub fn where_(&mut self, key: &str, value: impl ToSqlValue) -> Result<&mut Self> {
        self.state.wheres.where_(key, value)?;
        Ok(self)
    }

    /// `OR key value`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidOperator`] for an unknown operator.
    pub fn or_where(&mut self, key: &str, value: impl ToSqlValue) -> Result<&mut Self> {
        self.state.wheres.or_where(key, value)?;
        Ok(self)
    }

    /// Adds every pair, joined by `logic` (`AND` or `OR`).
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidConjunction`] for a bad `logic` token.
    pub fn where_map<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>, logic: &str) -> Result<&mut Self>
    where
        K: AsRef<str>,
        V: ToSqlValue,
    {
        self.state.wheres.where_map(pairs, logic)?;
        Ok(self)
    }

    /// `AND column IN (...)`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] for an empty list.
    pub fn where_in<V: ToSqlValue>(&mut self, column: &str, values: impl IntoIterator<Item = V>) -> Result<&mut Self> {
        self.state.wheres.where_in(column, values)?;
        Ok(self)
    }

    /// `OR column IN (...)`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] for an empty list.
    pub fn or_where_in<V: ToSqlValue>(&mut self, column: &str, values: impl IntoIterator<Item = V>) -> Result<&mut Self> {
        self.state.wheres.or_where_in(column, values)?;
        Ok(self)
    }

    /// `AND column NOT IN (...)`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] for an empty list.
    pub fn where_not_in<V: ToSqlValue>(&mut self, column: &str, values: impl IntoIterator<Item = V>) -> Result<&mut Self> {
        self.state.wheres.where_not_in(column, values)?;
        Ok(self)
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
        self.state.wheres.or_where_not_in(column, values)?;
        Ok(self)
    }

    /// `AND column IS NULL`.
    pub fn where_null(&mut self, column: &str) -> &mut Self {
        self.state.wheres.where_null(column);
        self
    }

    /// `OR column IS NULL`.
    pub fn or_where_null(&mut self, column: &str) -> &mut Self {
        self.state.wheres.or_where_null(column);
        self
    }

    /// `AND column IS NOT NULL`.
    pub fn where_not_null(&mut self, column: &str) -> &mut Self {
        self.state.wheres.where_not_null(column);
        self
    }

    /// `OR column IS NOT NULL`.
    pub fn or_where_not_null(&mut self, column: &str) -> &mut Self {
        self.state.wheres.or_where_not_null(column);
        self
    }

    /// `AND column LIKE pattern`.
    pub fn like(&mut self, column: &str, text: &str, side: LikeSide) -> &mut Self {
        self.state.wheres.like(column, text, side);
        self
    }

    /// `OR column LIKE pattern`.
    pub fn or_like(&mut self, column: &str, text: &str, side: LikeSide) -> &mut Self {
        self.state.wheres.or_like(column, text, side);
        self
    }

    /// `AND column NOT LIKE pattern`.
    pub fn not_like(&mut self, column: &str, text: &str, side: LikeSide) -> &mut Self {
        self.state.wheres.not_like(column, text, side);
        self
    }

    /// `OR column NOT LIKE pattern`.
    pub fn or_not_like(&mut self, column: &str, text: &str, side: LikeSide) -> &mut Self {
        self.state.wheres.or_not_like(column, text, side);
        self
    }

    /// `AND column BETWEEN a AND b`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::BetweenArity`] unless exactly two bounds are
    /// given.
    pub fn between<V: ToSqlValue>(&mut self, column: &str, bounds: impl IntoIterator<Item = V>) -> Result<&mut Self> {
        self.state.wheres.between(column, bounds)?;
        Ok(self)
    }

    /// `OR column BETWEEN a AND b`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::BetweenArity`] unless exactly two bounds are
    /// given.
    pub fn or_between<V: ToSqlValue>(&mut self, column: &str, bounds: impl IntoIterator<Item = V>) -> Result<&mut Self> {
        self.state.wheres.or_between(column, bounds)?;
        Ok(self)
    }

    /// `AND column NOT BETWEEN a AND b`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::BetweenArity`] unless exactly two bounds are
    /// given.
    pub fn not_between<V: ToSqlValue>(&mut self, column: &str, bounds: impl IntoIterator<Item = V>) -> Result<&mut Self> {
        self.state.wheres.not_between(column, bounds)?;
        Ok(self)
    }

    /// `OR column NOT BETWEEN a AND b`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::BetweenArity`] unless exactly two bounds are
    /// given.
    pub fn or_not_between<V: ToSqlValue>(
        &mut self,
        column: &str,
        bounds: impl IntoIterator<Item = V>,
    ) -> Result<&mut Self> {
        self.state.wheres.or_not_between(column, bounds)?;
        Ok(self)
    }

    /// `AND <sql>`, emitted verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] for a blank predicate.
    pub fn where_raw(&mut self, sql: &str) -> Result<&mut Self> {
        self.state.wheres.raw(sql)?;
        Ok(self)
    }

    /// `OR <sql>`, emitted verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] for a blank predicate.
    pub fn or_where_raw(&mut self, sql: &str) -> Result<&mut Self> {
        self.state.wheres.or_raw(sql)?;
        Ok(self)
    }

    /// `AND (...)`, with the group built by `build`.
    ///
    /// # Errors
    ///
    /// Propagates the first error raised inside `build`.
    pub fn where_group<F>(&mut self, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Conditions) -> Result<()>,
    {
        self.state.wheres.group(build)?;
        Ok(self)
    }

    /// `OR (...)`.
    ///
    /// # Errors
    ///
    /// Propagates the first error raised inside `build`.
    pub fn or_where_group<F>(&mut self, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Conditions) -> Result<()>,
    {
        self.state.wheres.or_group(build)?;
        Ok(self)
    }

    /// `AND NOT (...)`.
    ///
    /// # Errors
    ///
    /// Propagates the first error raised inside `build`.
    pub fn where_not_group<F>(&mut self, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Conditions) -> Result<()>,
    {
        self.state.wheres.not_group(build)?;
        Ok(self)
    }

    /// `OR NOT (...)`.
    ///
    /// # Errors
    ///
    /// Propagates the first error raised inside `build`.
    pub fn or_where_not_group<F>(&mut self, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Conditions) -> Result<()>,
    {
        self.state.wheres.or_not_group(build)?;
        Ok(self)
    }

    /// Adds a comma-separated GROUP BY list.
    pub fn group_by(&mut self, columns: &str) -> &mut Self {
        self.state.group_by.extend(split_list(columns));
        self
    }

    /// `HAVING ... AND key value`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidOperator`] for an unknown operator.
    pub fn having(&mut self, key: &str, value: impl ToSqlValue) -> Result<&mut Self> {
        self.state.havings.where_(key, value)?;
        Ok(self)
    }

    /// `HAVING ... OR key value`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidOperator`] for an unknown operator.
    pub fn or_having(&mut self, key: &str, value: impl ToSqlValue) -> Result<&mut Self> {
        self.state.havings.or_where(key, value)?;
        Ok(self)
    }

    /// Adds a verbatim HAVING predicate.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] for a blank predicate.
    pub fn having_raw(&mut self, sql: &str) -> Result<&mut Self> {
        self.state.havings.raw(sql)?;
        Ok(self)
    }

    /// `OR <sql>` in HAVING.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidArgument`] for a blank predicate.
    pub fn or_having_raw(&mut self, sql: &str) -> Result<&mut Self> {
        self.state.havings.or_raw(sql)?;
        Ok(self)
    }

    /// `HAVING ... AND (...)`.
    ///
    /// # Errors
    ///
    /// Propagates the first error raised inside `build`.
    pub fn having_group<F>(&mut self, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Conditions) -> Result<()>,
    {
        self.state.havings.group(build)?;
        Ok(self)
    }

    /// `HAVING ... OR (...)`.
    ///
    /// # Errors
    ///
    /// Propagates the first error raised inside `build`.
    pub fn or_having_group<F>(&mut self, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Conditions) -> Result<()>,
    {
        self.state.havings.or_group(build)?;
        Ok(self)
    }

    /// Adds an ORDER BY entry.
    ///
    /// `direction` is `ASC`, `DESC`, empty, or `RANDOM` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidOrderDirection`] for any other token.
    pub fn order_by(&mut self, field: &str, direction: &str) -> Result<&mut Self> {
        let direction = match direction.trim().to_ascii_uppercase().as_str() {
            "" => None,
            "ASC" => Some("ASC"),
            "DESC" => Some("DESC"),
            "RANDOM" => return Ok(self.order_by_random()),
            _ => return Err(QueryError::InvalidOrderDirection(direction.to_string())),
        };
        for column in split_list(field) {
            self.state.order_by.push(OrderItem::Column { column, direction });
        }
        Ok(self)
    }

    /// Orders by the dialect's random function.
    pub fn order_by_random(&mut self) -> &mut Self {
        self.state.order_by.push(OrderItem::Random);
        self
    }

    /// Sets LIMIT; 0 means unlimited.
    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.state.limit = limit;
        self
    }

    /// Sets OFFSET; 0 means none.
    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.state.offset = offset;
        self
    }

    /// Adds a common table expression.
    pub fn with(&mut self, name: &str, query: &str) -> &mut Self {
        self.with_cte(name, &[], query, false)
    }

    /// Adds a recursive common table expression; the whole prologue becomes
    /// `WITH RECURSIVE`.
    pub fn with_recursive(&mut self, name: &str, query: &str) -> &mut Self {
        self.with_cte(name, &[], query, true)
    }

    /// Adds a common table expression with an explicit column list.
    pub fn with_cte(&mut self, name: &str, columns: &[&str], query: &str, recursive: bool) -> &mut Self {
        self.state.register_alias(name);
        self.state.ctes.push(Cte {
            name: name.trim().to_string(),
            columns: columns.iter().map(|c| c.trim().to_string()).collect(),
            query: query.trim().to_string(),
            recursive,
        });
        self
    }

    /// Appends `UNION <subquery>`.
    ///
    /// # Errors
    ///
    /// Propagates errors raised while building the subquery.
    pub fn union<F>(&mut self, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut QueryBuilder<'c>) -> Result<()>,
    {
        let sql = self.subquery(build)?;
        self.state.unions.push(UnionPart { sql, all: false });
        Ok(self)
    }

    /// Appends `UNION ALL <subquery>`.
    ///
    /// # Errors
    ///
    /// Propagates errors raised while building the subquery.
    pub fn union_all<F>(&mut self, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut QueryBuilder<'c>) -> Result<()>,
    {
        let sql = self.subquery(build)?;
        self.state.unions.push(UnionPart { sql, all: true });
        Ok(self)
    }

    fn render_from_item(p: &IdentifierProtector<'_>, item: &FromItem) -> String {
        match item {
            FromItem::Table(table) => p.protect_table(table),
            FromItem::Verbatim { sql, .. } => sql.clone(),
        }
    }

    fn render_join(p: &IdentifierProtector<'_>, join: &JoinItem) -> String {
        let table = p.protect_table(&join.table);
        if join.join_type == JoinType::Cross {
            return format!("{} {table}", join.join_type);
        }
        let on = simple_join_condition().captures(&join.condition).map_or_else(
            || join.condition.clone(),
            |caps| {
                format!(
                    "{} {} {}",
                    protect_operand(p, &caps[1]),
                    &caps[2],
                    protect_operand(p, &caps[3])
                )
            },
        );
        format!("{} {table} ON {on}", join.join_type)
    }

    fn render_select_item(p: &IdentifierProtector<'_>, item: &SelectItem) -> String {
        match item {
            SelectItem::Expr { expr, protect: true } => p.protect(expr),
            SelectItem::Expr { expr, protect: false } => expr.clone(),
            SelectItem::Aggregate { function, field, alias } => {
                format!("{function}({}) AS {}", p.protect(field), p.quote(alias))
            }
        }
    }

    pub(crate) fn render_order_by(&self, p: &IdentifierProtector<'_>) -> Option<String> {
        if self.state.order_by.is_empty() {
            return None;
        }
        let items: Vec<String> = self
            .state
            .order_by
            .iter()
            .map(|item| match item {
                OrderItem::Random => self.dialect.random_function().to_string(),
                OrderItem::Column { column, direction } => {
                    let column = if column.contains('(') || p.is_alias(column) {
                        column.clone()
                    } else {
                        p.protect(column)
                    };
                    match direction {
                        Some(direction) => format!("{column} {direction}"),
                        None => column,
                    }
                }
            })
            .collect();
        Some(format!("ORDER BY {}", items.join(", ")))
    }

    fn render_ctes(&self, p: &IdentifierProtector<'_>) -> Option<String> {
        if self.state.ctes.is_empty() {
            return None;
        }
        let recursive = self.state.ctes.iter().any(|cte| cte.recursive);
        let ctes: Vec<String> = self
            .state
            .ctes
            .iter()
            .map(|cte| {
                let columns = if cte.columns.is_empty() {
                    String::new()
                } else {
                    let quoted: Vec<String> = cte.columns.iter().map(|c| p.quote(c)).collect();
                    format!(" ({})", quoted.join(", "))
                };
                format!("{}{columns} AS ({})", p.quote(&cte.name), cte.query)
            })
            .collect();
        Some(format!(
            "WITH {}{}",
            if recursive { "RECURSIVE " } else { "" },
            ctes.join(", ")
        ))
    }

    /// Compiles the accumulated state as a SELECT without touching it.
    ///
    /// # Errors
    ///
    /// Currently infallible for SELECT; the signature matches the other
    /// compilers.
    pub fn compile_select(&self) -> Result<String> {
        let p = self.protector();
        let sep = self.separator();
        let state = &self.state;
        let mut parts: Vec<String> = Vec::new();

        if let Some(ctes) = self.render_ctes(&p) {
            parts.push(ctes);
        }

        let mut head = String::from("SELECT ");
        if state.distinct {
            head.push_str("DISTINCT ");
        }
        for modifier in &state.modifiers {
            head.push_str(modifier);
            head.push(' ');
        }
        if state.select.is_empty() {
            head.push('*');
        } else {
            let columns: Vec<String> = state
                .select
                .iter()
                .map(|item| Self::render_select_item(&p, item))
                .collect();
            head.push_str(&columns.join(", "));
        }
        parts.push(head);

        if !state.from.is_empty() {
            let tables: Vec<String> = state
                .from
                .iter()
                .map(|item| Self::render_from_item(&p, item))
                .collect();
            parts.push(format!("FROM {}", tables.join(", ")));
        }
        parts.extend(state.joins.iter().map(|join| Self::render_join(&p, join)));
        if !state.wheres.is_empty() {
            parts.push(format!("WHERE {}", state.wheres.render(&p, sep)));
        }
        if !state.group_by.is_empty() {
            let columns: Vec<String> = state.group_by.iter().map(|c| p.protect(c)).collect();
            parts.push(format!("GROUP BY {}", columns.join(", ")));
        }
        if !state.havings.is_empty() {
            parts.push(format!("HAVING {}", state.havings.render(&p, sep)));
        }
        let order_by = self.render_order_by(&p);
        let ordered = order_by.is_some();
        parts.extend(order_by);
        parts.extend(self.dialect.limit_clause(state.limit, state.offset, ordered));
        for union in &state.unions {
            let keyword = if union.all { "UNION ALL" } else { "UNION" };
            parts.push(format!("{keyword} {}", union.sql));
        }
        Ok(parts.join(sep))
    }

    /// Compiles a row count over the current SELECT.
    ///
    /// # Errors
    ///
    /// Propagates [`compile_select`](Self::compile_select) errors.
    pub fn compile_count(&self) -> Result<String> {
        let inner = self.compile_select()?;
        Ok(format!(
            "SELECT COUNT(*) AS numrows{}FROM ({inner}) count_subquery",
            self.separator()
        ))
    }

    /// Realizes the SELECT as a list of rows.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NoConnection`] outside prepare mode without a
    /// connection, or the execution failure.
    pub fn get(&mut self) -> Result<Realized<Vec<Row>>> {
        let compiled = self.compile_select();
        self.realize(compiled, |exec, sql| exec.fetch_all(sql, &[]))
    }

    /// Adds `pairs` as AND conditions, applies limit and offset, then
    /// realizes the SELECT.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidOperator`] for a bad key, otherwise as
    /// [`get`](Self::get).
    pub fn get_where<K, V>(
        &mut self,
        pairs: impl IntoIterator<Item = (K, V)>,
        limit: u64,
        offset: u64,
    ) -> Result<Realized<Vec<Row>>>
    where
        K: AsRef<str>,
        V: ToSqlValue,
    {
        if let Err(err) = self.state.wheres.where_map(pairs, "AND") {
            self.reset();
            return Err(err);
        }
        self.limit(limit).offset(offset);
        self.get()
    }

    /// Realizes the SELECT and returns its first row.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get).
    pub fn row(&mut self) -> Result<Realized<Option<Row>>> {
        let compiled = self.compile_select();
        self.realize(compiled, |exec, sql| exec.fetch_one(sql, &[]))
    }

    /// Realizes the SELECT and returns one column of every row.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get).
    pub fn column(&mut self, index: usize) -> Result<Realized<Vec<SqlValue>>> {
        let compiled = self.compile_select();
        self.realize(compiled, |exec, sql| exec.fetch_column(sql, &[], index))
    }

    /// Realizes a row count over the current SELECT.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get).
    pub fn count_all_results(&mut self) -> Result<Realized<u64>> {
        let compiled = self.compile_count();
        self.realize(compiled, |exec, sql| {
            let row = exec.fetch_one(sql, &[])?;
            Ok(row.as_ref().map_or(0, row_count))
        })
    }
}

fn row_count(row: &Row) -> u64 {
    match row.get("numrows").or_else(|| row.get_index(0)) {
        Some(SqlValue::Int(n)) => u64::try_from(*n).unwrap_or(0),
        Some(SqlValue::Text(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuilderOptions;
    use crate::dialect::Driver;

    fn builder(driver: Driver) -> QueryBuilder<'static> {
        QueryBuilder::with_options(driver, BuilderOptions::prepared())
    }

    #[test]
    fn test_looks_nested() {
        assert!(looks_nested("SELECT id FROM users"));
        assert!(looks_nested("a JOIN b ON a.id = b.id"));
        assert!(!looks_nested("users u"));
        assert!(!looks_nested("selections"));
    }

    #[test]
    fn test_select_star_by_default() {
        let mut qb = builder(Driver::Postgres);
        qb.from("users");
        assert_eq!(qb.compile_select().unwrap(), "SELECT *\nFROM \"users\"");
    }

    #[test]
    fn test_select_is_protected_lazily() {
        let mut qb = builder(Driver::Postgres);
        qb.options.table_prefix = String::from("app_");
        qb.select("u.name, users.email").from("users u");
        assert_eq!(
            qb.compile_select().unwrap(),
            "SELECT \"u\".\"name\", \"app_users\".\"email\"\nFROM \"app_users\" u"
        );
    }

    #[test]
    fn test_aggregates() {
        let mut qb = builder(Driver::MySql);
        qb.select_max("o.total", None)
            .select_count("*", Some("n"))
            .from("orders o");
        assert_eq!(
            qb.compile_select().unwrap(),
            "SELECT MAX(`o`.`total`) AS `total`, COUNT(*) AS `n`\nFROM `orders` o"
        );
    }

    #[test]
    fn test_order_by_alias_is_not_protected() {
        let mut qb = builder(Driver::MySql);
        qb.select("COUNT(id) AS total")
            .from("t")
            .order_by("total", "desc")
            .unwrap()
            .order_by("name", "")
            .unwrap();
        assert_eq!(
            qb.compile_select().unwrap(),
            "SELECT COUNT(id) AS total\nFROM `t`\nORDER BY total DESC, `name`"
        );
    }

    #[test]
    fn test_order_by_rejects_bad_direction() {
        let mut qb = builder(Driver::MySql);
        assert!(matches!(
            qb.order_by("id", "UP"),
            Err(QueryError::InvalidOrderDirection(d)) if d == "UP"
        ));
    }

    #[test]
    fn test_join_condition_protection() {
        let mut qb = builder(Driver::Sqlite);
        qb.from("users u")
            .join("posts p", "p.user_id = u.id", "left")
            .unwrap()
            .join("tags t", "t.post_id = p.id AND t.visible = 1", "")
            .unwrap();
        assert_eq!(
            qb.compile_select().unwrap(),
            "SELECT *\nFROM \"users\" u\nLEFT JOIN \"posts\" p ON \"p\".\"user_id\" = \"u\".\"id\"\nINNER JOIN \"tags\" t ON t.post_id = p.id AND t.visible = 1"
        );
    }

    #[test]
    fn test_join_honors_aliases_added_later() {
        let mut qb = builder(Driver::Postgres);
        qb.options.table_prefix = String::from("app_");
        qb.join("posts p", "p.user_id = u.id", "left")
            .unwrap()
            .from("users u");
        assert_eq!(
            qb.compile_select().unwrap(),
            "SELECT *\nFROM \"app_users\" u\nLEFT JOIN \"app_posts\" p ON \"p\".\"user_id\" = \"u\".\"id\""
        );
    }

    #[test]
    fn test_cross_join_condition_rules() {
        let mut qb = builder(Driver::Sqlite);
        assert!(qb.join("b", "a.id = b.id", "cross").is_err());
        assert!(qb.join("b", "", "left").is_err());
        qb.from("a").join("b", "", "cross").unwrap();
        assert_eq!(
            qb.compile_select().unwrap(),
            "SELECT *\nFROM \"a\"\nCROSS JOIN \"b\""
        );
    }

    #[test]
    fn test_nested_from_is_wrapped_once() {
        let mut qb = builder(Driver::Sqlite);
        qb.from("SELECT id FROM a");
        assert_eq!(qb.compile_select().unwrap(), "SELECT *\nFROM (SELECT id FROM a)");

        let mut qb = builder(Driver::Sqlite);
        qb.from("(SELECT id FROM a) x");
        assert_eq!(qb.compile_select().unwrap(), "SELECT *\nFROM (SELECT id FROM a) x");
    }

    #[test]
    fn test_row_count_reads_int_or_text() {
        let row: Row = [("numrows", SqlValue::Int(7))].into_iter().collect();
        assert_eq!(row_count(&row), 7);
        let row: Row = [("numrows", SqlValue::Text(String::from("12")))].into_iter().collect();
        assert_eq!(row_count(&row), 12);
        let row: Row = [("numrows", SqlValue::Null)].into_iter().collect();
        assert_eq!(row_count(&row), 0);
    }
}
