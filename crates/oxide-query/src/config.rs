//! Builder options.

use serde::Deserialize;

/// Options shared by query and schema builders.
///
/// Deserializable so a host application can keep them next to its
/// connection settings:
///
/// ```rust
/// use oxide_query::BuilderOptions;
///
/// let opts: BuilderOptions =
///     serde_json::from_str(r#"{"prepare": true, "table_prefix": "app_"}"#).unwrap();
/// assert!(opts.prepare);
/// assert!(opts.protect_identifiers);
/// assert_eq!(opts.reserved_identifiers, vec!["*".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuilderOptions {
    /// Return compiled SQL instead of executing it.
    pub prepare: bool,
    /// Emit single-line SQL instead of one clause per line.
    pub optimize: bool,
    /// Quote table and column identifiers.
    pub protect_identifiers: bool,
    /// Identifier segments that are never quoted.
    pub reserved_identifiers: Vec<String>,
    /// Prefix prepended to table names.
    pub table_prefix: String,
    /// Consult the cache collaborator for cacheable reads.
    pub cache: bool,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            prepare: false,
            optimize: false,
            protect_identifiers: true,
            reserved_identifiers: vec![String::from("*")],
            table_prefix: String::new(),
            cache: true,
        }
    }
}

impl BuilderOptions {
    /// Options that only compile (prepare mode).
    #[must_use]
    pub fn prepared() -> Self {
        Self {
            prepare: true,
            ..Self::default()
        }
    }

    /// Sets the table prefix.
    #[must_use]
    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    /// Turns identifier quoting on or off.
    #[must_use]
    pub const fn with_protect_identifiers(mut self, enabled: bool) -> Self {
        self.protect_identifiers = enabled;
        self
    }

    /// Turns single-line output on or off.
    #[must_use]
    pub const fn with_optimize(mut self, enabled: bool) -> Self {
        self.optimize = enabled;
        self
    }

    /// Turns prepare mode on or off.
    #[must_use]
    pub const fn with_prepare(mut self, enabled: bool) -> Self {
        self.prepare = enabled;
        self
    }
}
