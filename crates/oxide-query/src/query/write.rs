//! INSERT / UPDATE / DELETE / TRUNCATE assembly.

use super::state::{Assignment, SetValues, StatementTemplate};
use super::QueryBuilder;
use crate::error::{QueryError, Result};
use crate::exec::Realized;
use crate::protect::{split_alias, IdentifierProtector};
use crate::value::{SqlValue, ToSqlValue};

type Rendered = (Vec<String>, Vec<Vec<String>>);

impl QueryBuilder<'_> {
    /// Assigns a value for INSERT or UPDATE; assigning the same column twice
    /// keeps the last value.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MixedSetValues`] after [`set_batch`](Self::set_batch).
    pub fn set(&mut self, column: &str, value: impl ToSqlValue) -> Result<&mut Self> {
        self.state
            .set
            .assign(column.trim(), Assignment::Value(value.to_sql_value()))?;
        Ok(self)
    }

    /// Assigns every `(column, value)` pair.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MixedSetValues`] after [`set_batch`](Self::set_batch).
    pub fn set_map<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Result<&mut Self>
    where
        K: AsRef<str>,
        V: ToSqlValue,
    {
        for (column, value) in pairs {
            self.set(column.as_ref(), value)?;
        }
        Ok(self)
    }

    /// Assigns an SQL expression emitted verbatim (`counter + 1`).
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MixedSetValues`] after [`set_batch`](Self::set_batch).
    pub fn set_raw(&mut self, column: &str, expr: &str) -> Result<&mut Self> {
        self.state
            .set
            .assign(column.trim(), Assignment::Expr(expr.trim().to_string()))?;
        Ok(self)
    }

    /// Adds rows for a batch INSERT or batch UPDATE.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MixedSetValues`] after [`set`](Self::set).
    pub fn set_batch<R, K, V>(&mut self, rows: impl IntoIterator<Item = R>) -> Result<&mut Self>
    where
        R: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToSqlValue,
    {
        let rows: Vec<Vec<(String, SqlValue)>> = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|(k, v)| (k.as_ref().trim().to_string(), v.to_sql_value()))
                    .collect()
            })
            .collect();
        self.state.set.push_rows(rows)?;
        Ok(self)
    }

    /// Protected name of the table a write statement targets.
    fn target_table(p: &IdentifierProtector<'_>, template: &StatementTemplate, statement: &'static str) -> Result<String> {
        let base = template
            .from
            .first()
            .map(|from| split_alias(from.raw()).0.trim())
            .filter(|base| !base.is_empty())
            .ok_or(QueryError::MissingTable { statement })?;
        Ok(p.protect_table(base))
    }

    fn render_values(&self, p: &IdentifierProtector<'_>, statement: &'static str) -> Result<Rendered> {
        let d = self.dialect;
        match &self.state.set {
            SetValues::Empty => Err(QueryError::EmptyValues { statement }),
            SetValues::Single(values) => {
                let columns = values.iter().map(|(c, _)| p.protect(c)).collect();
                let row = values
                    .iter()
                    .map(|(_, value)| match value {
                        Assignment::Value(v) => d.quote_value(v),
                        Assignment::Expr(e) => e.clone(),
                    })
                    .collect();
                Ok((columns, vec![row]))
            }
            SetValues::Batch(rows) => {
                let Some(first) = rows.first().filter(|row| !row.is_empty()) else {
                    return Err(QueryError::EmptyValues { statement });
                };
                let names: Vec<&str> = first.iter().map(|(c, _)| c.as_str()).collect();
                let mut rendered = Vec::with_capacity(rows.len());
                for (i, row) in rows.iter().enumerate() {
                    if row.len() != names.len() {
                        return Err(QueryError::InvalidArgument(format!(
                            "batch row {i} has {} columns, expected {}",
                            row.len(),
                            names.len()
                        )));
                    }
                    let values = names
                        .iter()
                        .map(|name| {
                            row.iter()
                                .find(|(c, _)| c == name)
                                .map(|(_, v)| d.quote_value(v))
                                .ok_or_else(|| {
                                    QueryError::InvalidArgument(format!(
                                        "batch row {i} has no value for `{name}`"
                                    ))
                                })
                        })
                        .collect::<Result<Vec<_>>>()?;
                    rendered.push(values);
                }
                let columns = names.iter().map(|c| p.protect(c)).collect();
                Ok((columns, rendered))
            }
        }
    }

    /// Compiles an INSERT, single-row or batch.
    ///
    /// Batch column order follows the first row.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MissingTable`], [`QueryError::EmptyValues`], or
    /// [`QueryError::InvalidArgument`] for batch rows with other columns than
    /// the first.
    pub fn compile_insert(&self) -> Result<String> {
        let p = self.protector();
        let table = Self::target_table(&p, &self.state.template(), "INSERT")?;
        let (columns, rows) = self.render_values(&p, "INSERT")?;
        Ok(self.dialect.insert_statement(&table, &columns, &rows))
    }

    /// Realizes an INSERT.
    ///
    /// # Errors
    ///
    /// As [`compile_insert`](Self::compile_insert), or the execution failure.
    pub fn insert(&mut self) -> Result<Realized<u64>> {
        let compiled = self.compile_insert();
        self.realize(compiled, |exec, sql| exec.execute(sql, &[]))
    }

    /// Compiles the dialect's insert-or-replace statement.
    ///
    /// `key` names the conflict column; PostgreSQL requires it.
    ///
    /// # Errors
    ///
    /// As [`compile_insert`](Self::compile_insert), plus
    /// [`QueryError::Unsupported`] on dialects without an equivalent.
    pub fn compile_replace(&self, key: Option<&str>) -> Result<String> {
        let p = self.protector();
        let table = Self::target_table(&p, &self.state.template(), "REPLACE")?;
        let (columns, rows) = self.render_values(&p, "REPLACE")?;
        let key = key.map(|k| p.protect(k));
        self.dialect
            .replace_statement(&table, &columns, &rows, key.as_deref())
    }

    /// Realizes an insert-or-replace.
    ///
    /// # Errors
    ///
    /// As [`compile_replace`](Self::compile_replace), or the execution failure.
    pub fn replace(&mut self, key: Option<&str>) -> Result<Realized<u64>> {
        let compiled = self.compile_replace(key);
        self.realize(compiled, |exec, sql| exec.execute(sql, &[]))
    }

    /// ORDER BY / LIMIT tail of UPDATE and DELETE.
    fn write_tail(&self, p: &IdentifierProtector<'_>, template: &StatementTemplate) -> Result<Vec<String>> {
        if template.order_by.is_empty() && template.limit == 0 {
            return Ok(Vec::new());
        }
        if !self.dialect.supports_write_limit() {
            return Err(QueryError::Unsupported {
                feature: "ORDER BY or LIMIT on UPDATE/DELETE",
                dialect: self.dialect.name(),
            });
        }
        let mut tail = Vec::new();
        tail.extend(self.render_order_by(p));
        if template.limit > 0 {
            tail.push(format!("LIMIT {}", template.limit));
        }
        Ok(tail)
    }

    fn modifiers(&self) -> String {
        self.state
            .modifiers
            .iter()
            .map(|m| format!("{m} "))
            .collect()
    }

    /// Compiles a single-row UPDATE.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MissingWhere`] without conditions,
    /// [`QueryError::MissingTable`], [`QueryError::EmptyValues`], and
    /// [`QueryError::InvalidArgument`] when batch values were given.
    pub fn compile_update(&self) -> Result<String> {
        let p = self.protector();
        let template = self.state.template();
        let table = Self::target_table(&p, &template, "UPDATE")?;
        let assignments = match &self.state.set {
            SetValues::Empty => return Err(QueryError::EmptyValues { statement: "UPDATE" }),
            SetValues::Batch(_) => {
                return Err(QueryError::InvalidArgument(String::from(
                    "batch values need update_batch",
                )))
            }
            SetValues::Single(values) => values
                .iter()
                .map(|(column, value)| {
                    let value = match value {
                        Assignment::Value(v) => self.dialect.quote_value(v),
                        Assignment::Expr(e) => e.clone(),
                    };
                    format!("{} = {value}", p.protect(column))
                })
                .collect::<Vec<_>>(),
        };
        if template.wheres.is_empty() {
            return Err(QueryError::MissingWhere { statement: "UPDATE" });
        }
        let sep = self.separator();
        let mut parts = vec![
            format!("UPDATE {}{table}", self.modifiers()),
            format!("SET {}", assignments.join(", ")),
            format!("WHERE {}", template.wheres.render(&p, sep)),
        ];
        parts.extend(self.write_tail(&p, &template)?);
        Ok(parts.join(sep))
    }

    /// Realizes a single-row UPDATE.
    ///
    /// # Errors
    ///
    /// As [`compile_update`](Self::compile_update), or the execution failure.
    pub fn update(&mut self) -> Result<Realized<u64>> {
        let compiled = self.compile_update();
        self.realize(compiled, |exec, sql| exec.execute(sql, &[]))
    }

    /// Compiles a batch UPDATE keyed on `key`.
    ///
    /// Each column becomes `col = CASE WHEN key = id THEN value ... ELSE col
    /// END` and `key IN (ids)` is added to the conditions. A row that lacks a
    /// column leaves it unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::BatchUpdateWithoutKey`] for an empty key,
    /// [`QueryError::InvalidArgument`] when a row lacks the key or single-row
    /// values were given, plus [`QueryError::MissingTable`] and
    /// [`QueryError::EmptyValues`].
    pub fn compile_update_batch(&self, key: &str) -> Result<String> {
        let key = key.trim();
        if key.is_empty() {
            return Err(QueryError::BatchUpdateWithoutKey);
        }
        let p = self.protector();
        let template = self.state.template();
        let table = Self::target_table(&p, &template, "UPDATE")?;
        let rows = match &self.state.set {
            SetValues::Batch(rows) if !rows.is_empty() => rows,
            SetValues::Single(_) => {
                return Err(QueryError::InvalidArgument(String::from(
                    "single-row values need update",
                )))
            }
            _ => return Err(QueryError::EmptyValues { statement: "UPDATE" }),
        };

        let ids = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.iter()
                    .find(|(c, _)| c == key)
                    .map(|(_, v)| v.clone())
                    .ok_or_else(|| {
                        QueryError::InvalidArgument(format!("batch row {i} has no value for key `{key}`"))
                    })
            })
            .collect::<Result<Vec<SqlValue>>>()?;

        let mut columns: Vec<&str> = Vec::new();
        for (column, _) in rows.iter().flatten() {
            if column != key && !columns.contains(&column.as_str()) {
                columns.push(column);
            }
        }
        if columns.is_empty() {
            return Err(QueryError::EmptyValues { statement: "UPDATE" });
        }

        let d = self.dialect;
        let quoted_key = p.protect(key);
        let cases: Vec<String> = columns
            .iter()
            .map(|column| {
                let quoted = p.protect(column);
                let whens: String = rows
                    .iter()
                    .zip(&ids)
                    .filter_map(|(row, id)| {
                        row.iter().find(|(c, _)| c == column).map(|(_, v)| {
                            format!(" WHEN {quoted_key} = {} THEN {}", d.quote_value(id), d.quote_value(v))
                        })
                    })
                    .collect();
                format!("{quoted} = CASE{whens} ELSE {quoted} END")
            })
            .collect();

        let mut wheres = template.wheres.clone();
        wheres.where_in(key, ids)?;
        let sep = self.separator();
        let mut parts = vec![
            format!("UPDATE {}{table}", self.modifiers()),
            format!("SET {}", cases.join(", ")),
            format!("WHERE {}", wheres.render(&p, sep)),
        ];
        parts.extend(self.write_tail(&p, &template)?);
        Ok(parts.join(sep))
    }

    /// Realizes a batch UPDATE.
    ///
    /// # Errors
    ///
    /// As [`compile_update_batch`](Self::compile_update_batch), or the
    /// execution failure.
    pub fn update_batch(&mut self, key: &str) -> Result<Realized<u64>> {
        let compiled = self.compile_update_batch(key);
        self.realize(compiled, |exec, sql| exec.execute(sql, &[]))
    }

    fn compile_delete_from(&self, template: &StatementTemplate, guarded: bool) -> Result<String> {
        let p = self.protector();
        let table = Self::target_table(&p, template, "DELETE")?;
        let sep = self.separator();
        let mut parts = vec![format!("DELETE {}FROM {table}", self.modifiers())];
        if template.wheres.is_empty() {
            if guarded {
                return Err(QueryError::MissingWhere { statement: "DELETE" });
            }
        } else {
            parts.push(format!("WHERE {}", template.wheres.render(&p, sep)));
        }
        parts.extend(self.write_tail(&p, template)?);
        Ok(parts.join(sep))
    }

    /// Compiles a DELETE.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MissingWhere`] without conditions and
    /// [`QueryError::MissingTable`] without a table.
    pub fn compile_delete(&self) -> Result<String> {
        self.compile_delete_from(&self.state.template(), true)
    }

    /// Realizes a DELETE.
    ///
    /// # Errors
    ///
    /// As [`compile_delete`](Self::compile_delete), or the execution failure.
    pub fn delete(&mut self) -> Result<Realized<u64>> {
        let compiled = self.compile_delete();
        self.realize(compiled, |exec, sql| exec.execute(sql, &[]))
    }

    /// Adds `pairs` as AND conditions and realizes a DELETE.
    ///
    /// # Errors
    ///
    /// As [`delete`](Self::delete), plus [`QueryError::InvalidOperator`].
    pub fn delete_where<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Result<Realized<u64>>
    where
        K: AsRef<str>,
        V: ToSqlValue,
    {
        if let Err(err) = self.state.wheres.where_map(pairs, "AND") {
            self.reset();
            return Err(err);
        }
        self.delete()
    }

    /// Realizes `DELETE FROM table` without any condition.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MissingTable`], or the execution failure.
    pub fn empty_table(&mut self) -> Result<Realized<u64>> {
        let compiled = self.compile_delete_from(&self.state.template(), false);
        self.realize(compiled, |exec, sql| exec.execute(sql, &[]))
    }

    /// Realizes the same guarded DELETE against each of `tables`.
    ///
    /// In prepare mode the statements are joined with `;\n`; otherwise they
    /// run in order and the affected counts are summed.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MissingTable`] for an empty list, the first
    /// compile error, or the first execution failure.
    pub fn delete_from_tables(&mut self, tables: &[&str]) -> Result<Realized<u64>> {
        let template = self.state.template();
        let compiled = if tables.is_empty() {
            Err(QueryError::MissingTable { statement: "DELETE" })
        } else {
            tables
                .iter()
                .map(|table| self.compile_delete_from(&template.for_table(table), true))
                .collect()
        };
        self.realize_all(compiled)
    }

    /// Compiles the dialect's TRUNCATE for the first FROM table.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MissingTable`] without a table.
    pub fn compile_truncate(&self) -> Result<String> {
        let p = self.protector();
        let table = Self::target_table(&p, &self.state.template(), "TRUNCATE")?;
        Ok(self.dialect.truncate_statement(&table))
    }

    /// Realizes a TRUNCATE of the first FROM table.
    ///
    /// # Errors
    ///
    /// As [`compile_truncate`](Self::compile_truncate), or the execution
    /// failure.
    pub fn truncate(&mut self) -> Result<Realized<u64>> {
        let compiled = self.compile_truncate();
        self.realize(compiled, |exec, sql| exec.execute(sql, &[]))
    }

    /// Realizes a TRUNCATE of `table`, ignoring FROM.
    ///
    /// # Errors
    ///
    /// As [`truncate`](Self::truncate).
    pub fn truncate_table(&mut self, table: &str) -> Result<Realized<u64>> {
        let template = self.state.template().for_table(table);
        let p = self.protector();
        let compiled = Self::target_table(&p, &template, "TRUNCATE")
            .map(|table| self.dialect.truncate_statement(&table));
        self.realize(compiled, |exec, sql| exec.execute(sql, &[]))
    }
}
