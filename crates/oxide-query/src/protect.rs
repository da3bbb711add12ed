//! Identifier protection.
//!
//! Table and column references are quoted segment by segment with the
//! dialect's quote characters. The rules are heuristics, not a SQL parser:
//!
//! - `schema.table` and `table.column` are split on `.` and each segment is
//!   quoted on its own.
//! - Anything after the first whitespace outside parentheses is an alias and
//!   is re-appended unquoted.
//! - Expressions containing `(` (function calls) or `'` (literals) are
//!   returned unchanged.
//! - Reserved segments such as `*` are never quoted.
//!
//! Quoting is idempotent: protecting an already protected identifier yields
//! the same text.

use crate::config::BuilderOptions;
use crate::dialect::Dialect;

/// Quotes identifiers for one dialect under one set of options.
#[derive(Debug, Clone, Copy)]
pub struct IdentifierProtector<'a> {
    dialect: &'a dyn Dialect,
    enabled: bool,
    reserved: &'a [String],
    prefix: &'a str,
    aliases: &'a [String],
}

impl<'a> IdentifierProtector<'a> {
    /// Creates a protector from builder options.
    #[must_use]
    pub fn new(dialect: &'a dyn Dialect, options: &'a BuilderOptions) -> Self {
        Self {
            dialect,
            enabled: options.protect_identifiers,
            reserved: &options.reserved_identifiers,
            prefix: &options.table_prefix,
            aliases: &[],
        }
    }

    /// Registers aliases that must not receive the table prefix.
    #[must_use]
    pub fn with_aliases(mut self, aliases: &'a [String]) -> Self {
        self.aliases = aliases;
        self
    }

    /// Returns the dialect.
    #[must_use]
    pub fn dialect(&self) -> &'a dyn Dialect {
        self.dialect
    }

    /// Whether quoting is turned on.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns true when `name` is a registered alias.
    #[must_use]
    pub fn is_alias(&self, name: &str) -> bool {
        let bare = self.strip(name);
        self.aliases.iter().any(|a| a.eq_ignore_ascii_case(&bare))
    }

    /// Quotes a single segment, honouring the reserved list.
    #[must_use]
    pub fn quote(&self, segment: &str) -> String {
        let segment = segment.trim();
        if !self.enabled || segment.is_empty() || self.is_reserved(segment) {
            return segment.to_string();
        }
        self.dialect.quote_identifier(segment)
    }

    /// Returns a raw table name with the table prefix applied.
    #[must_use]
    pub fn prefixed(&self, table: &str) -> String {
        let bare = self.strip(table.trim());
        if self.prefix.is_empty() || self.is_alias(&bare) || bare.starts_with(self.prefix) {
            bare
        } else {
            format!("{}{bare}", self.prefix)
        }
    }

    /// Protects a column reference such as `u.name` or `price AS p`.
    ///
    /// The table prefix goes on the qualifier of `table.column` and
    /// `schema.table.column`.
    #[must_use]
    pub fn protect(&self, identifier: &str) -> String {
        self.protect_with(identifier, false)
    }

    /// Protects a table reference such as `app.users u`.
    ///
    /// The table prefix goes on the last segment.
    #[must_use]
    pub fn protect_table(&self, identifier: &str) -> String {
        self.protect_with(identifier, true)
    }

    fn protect_with(&self, identifier: &str, is_table: bool) -> String {
        let identifier = identifier.trim();
        if identifier.is_empty() || identifier.contains('(') || identifier.contains('\'') {
            return identifier.to_string();
        }
        if !self.enabled && self.prefix.is_empty() {
            return identifier.to_string();
        }
        let (base, alias) = split_alias(identifier);
        let segments: Vec<&str> = base.split('.').collect();
        let target = if is_table {
            Some(segments.len() - 1)
        } else {
            segments.len().checked_sub(2)
        };
        let protected = segments
            .iter()
            .enumerate()
            .map(|(i, segment)| {
                if Some(i) == target {
                    self.quote(&self.prefixed(segment))
                } else {
                    self.quote(&self.strip(segment))
                }
            })
            .collect::<Vec<_>>()
            .join(".");
        match alias {
            Some(alias) => format!("{protected} {alias}"),
            None => protected,
        }
    }

    fn is_reserved(&self, segment: &str) -> bool {
        self.reserved.iter().any(|r| r == segment)
    }

    fn strip(&self, segment: &str) -> String {
        if !self.enabled {
            return segment.trim().to_string();
        }
        let (open, close) = self.dialect.identifier_quotes();
        segment
            .trim()
            .chars()
            .filter(|&c| c != open && c != close)
            .collect()
    }
}

/// Splits `expr alias` at the first whitespace outside parentheses.
///
/// The alias part keeps an optional `AS` keyword.
#[must_use]
pub fn split_alias(identifier: &str) -> (&str, Option<&str>) {
    let identifier = identifier.trim();
    let mut depth = 0_i32;
    for (i, c) in identifier.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            c if c.is_whitespace() && depth == 0 => {
                let alias = identifier[i..].trim();
                return (&identifier[..i], (!alias.is_empty()).then_some(alias));
            }
            _ => {}
        }
    }
    (identifier, None)
}

/// Returns the bare alias name from an alias part (`AS u` or `u`).
#[must_use]
pub fn alias_name(alias: &str) -> &str {
    let alias = alias.trim();
    match alias.split_once(char::is_whitespace) {
        Some((keyword, rest)) if keyword.eq_ignore_ascii_case("AS") => rest.trim(),
        _ => alias,
    }
}

/// Splits a comma-separated list, ignoring commas inside parentheses.
#[must_use]
pub fn split_list(list: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut depth = 0_i32;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                items.push(list[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(list[start..].trim().to_string());
    items.retain(|item| !item.is_empty());
    items
}
