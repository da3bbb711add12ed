#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use oxide_query::{
    BuilderOptions, Cache, Connection, ConnectionError, Driver, QueryBuilder, Row, SchemaBuilder,
    SqlValue,
};

/// Compile-only query builder with quoting on.
pub fn prepared(driver: Driver) -> QueryBuilder<'static> {
    QueryBuilder::with_options(driver, BuilderOptions::prepared())
}

/// Compile-only query builder with quoting off, so expected SQL stays
/// readable.
pub fn plain(driver: Driver) -> QueryBuilder<'static> {
    QueryBuilder::with_options(
        driver,
        BuilderOptions::prepared().with_protect_identifiers(false),
    )
}

/// Compile-only schema builder with quoting on.
pub fn schema(driver: Driver) -> SchemaBuilder<'static> {
    SchemaBuilder::with_options(driver, BuilderOptions::prepared())
}

pub fn row(pairs: &[(&str, SqlValue)]) -> Row {
    pairs.iter().map(|(c, v)| (*c, v.clone())).collect()
}

/// A connection that records every call and answers from canned rows.
pub struct MockConnection {
    driver: String,
    rows: RefCell<Vec<Row>>,
    affected: Cell<u64>,
    fail_on: RefCell<Option<String>>,
    pub log: RefCell<Vec<String>>,
}

impl MockConnection {
    pub fn new(driver: &str) -> Self {
        Self {
            driver: driver.to_string(),
            rows: RefCell::new(Vec::new()),
            affected: Cell::new(1),
            fail_on: RefCell::new(None),
            log: RefCell::new(Vec::new()),
        }
    }

    pub fn with_rows(self, rows: Vec<Row>) -> Self {
        *self.rows.borrow_mut() = rows;
        self
    }

    pub fn with_affected(self, affected: u64) -> Self {
        self.affected.set(affected);
        self
    }

    /// Makes every statement containing `needle` fail.
    pub fn fail_on(self, needle: &str) -> Self {
        *self.fail_on.borrow_mut() = Some(needle.to_string());
        self
    }

    pub fn statements(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    fn record(&self, sql: &str) -> Result<(), ConnectionError> {
        self.log.borrow_mut().push(sql.to_string());
        match self.fail_on.borrow().as_deref() {
            Some(needle) if sql.contains(needle) => Err(ConnectionError::new("boom")
                .with_code("1064")
                .with_sql_state("42000")),
            _ => Ok(()),
        }
    }
}

impl Connection for MockConnection {
    fn driver_name(&self) -> &str {
        &self.driver
    }

    fn execute(&self, sql: &str, _params: &[SqlValue]) -> Result<u64, ConnectionError> {
        self.record(sql)?;
        Ok(self.affected.get())
    }

    fn fetch_one(&self, sql: &str, _params: &[SqlValue]) -> Result<Option<Row>, ConnectionError> {
        self.record(sql)?;
        Ok(self.rows.borrow().first().cloned())
    }

    fn fetch_all(&self, sql: &str, _params: &[SqlValue]) -> Result<Vec<Row>, ConnectionError> {
        self.record(sql)?;
        Ok(self.rows.borrow().clone())
    }

    fn begin_transaction(&self) -> Result<bool, ConnectionError> {
        self.record("BEGIN")?;
        Ok(true)
    }

    fn commit(&self) -> Result<bool, ConnectionError> {
        self.record("COMMIT")?;
        Ok(true)
    }

    fn rollback(&self) -> Result<bool, ConnectionError> {
        self.record("ROLLBACK")?;
        Ok(true)
    }
}

/// An in-memory cache.
#[derive(Default)]
pub struct MemoryCache {
    pub enabled: bool,
    pub entries: RefCell<HashMap<String, Vec<Row>>>,
}

impl MemoryCache {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            entries: RefCell::new(HashMap::new()),
        }
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.borrow().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Cache for MemoryCache {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn get(&self, key: &str) -> Option<Vec<Row>> {
        self.entries.borrow().get(key).cloned()
    }

    fn save(&self, key: &str, rows: &[Row]) {
        self.entries.borrow_mut().insert(key.to_string(), rows.to_vec());
    }
}
