//! Tests for INSERT, UPDATE, DELETE and TRUNCATE compilation.

mod common;
use common::*;

use oxide_query::{BuilderOptions, Driver, QueryBuilder, QueryError, SqlValue, ToSqlValue};

fn prepared_sql<T>(out: oxide_query::Result<oxide_query::Realized<T>>) -> String {
    out.unwrap().into_sql().unwrap()
}

// ===================================================================
// INSERT / REPLACE
// ===================================================================

#[test]
fn insert_single_row() {
    let mut qb = prepared(Driver::MySql);
    qb.table("users")
        .set("name", "Bob")
        .unwrap()
        .set("active", true)
        .unwrap()
        .set("score", 1.5)
        .unwrap();
    assert_eq!(
        prepared_sql(qb.insert()),
        "INSERT INTO `users` (`name`, `active`, `score`) VALUES ('Bob', 1, 1.5)"
    );
}

#[test]
fn batch_insert_uses_first_row_column_order() {
    let mut qb = plain(Driver::Sqlite);
    qb.table("t")
        .set_batch([vec![("a", 1), ("b", 2)], vec![("b", 4), ("a", 3)]])
        .unwrap();
    assert_eq!(
        prepared_sql(qb.insert()),
        "INSERT INTO t (a, b) VALUES (1, 2), (3, 4)"
    );
}

#[test]
fn oracle_batch_insert() {
    let mut qb = plain(Driver::Oracle);
    qb.table("t")
        .set_batch([vec![("a", 1), ("b", 2)], vec![("a", 3), ("b", 4)]])
        .unwrap();
    assert_eq!(
        prepared_sql(qb.insert()),
        "INSERT ALL INTO t (a, b) VALUES (1, 2) INTO t (a, b) VALUES (3, 4) SELECT 1 FROM DUAL"
    );
}

#[test]
fn single_and_batch_values_do_not_mix() {
    let mut qb = plain(Driver::Sqlite);
    qb.set("a", 1).unwrap();
    assert!(matches!(
        qb.set_batch([vec![("a", 2)]]),
        Err(QueryError::MixedSetValues)
    ));
}

#[test]
fn set_map_and_prefix() {
    let mut qb = QueryBuilder::with_options(
        Driver::Postgres,
        BuilderOptions::prepared().with_table_prefix("app_"),
    );
    qb.table("users")
        .set_map([("a", 1), ("b", 2)])
        .unwrap();
    assert_eq!(
        prepared_sql(qb.insert()),
        "INSERT INTO \"app_users\" (\"a\", \"b\") VALUES (1, 2)"
    );
}

#[test]
fn replace_per_dialect() {
    let build = |driver| {
        let mut qb = plain(driver);
        qb.table("t")
            .set("id", 1)
            .unwrap()
            .set("name", "x")
            .unwrap();
        qb
    };

    assert_eq!(
        prepared_sql(build(Driver::MySql).replace(None)),
        "REPLACE INTO t (id, name) VALUES (1, 'x')"
    );
    assert_eq!(
        prepared_sql(build(Driver::Sqlite).replace(None)),
        "INSERT OR REPLACE INTO t (id, name) VALUES (1, 'x')"
    );
    assert_eq!(
        prepared_sql(build(Driver::Postgres).replace(Some("id"))),
        "INSERT INTO t (id, name) VALUES (1, 'x') ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name"
    );
    assert!(matches!(
        build(Driver::Postgres).replace(None),
        Err(QueryError::InvalidArgument(_))
    ));
    for driver in [Driver::SqlServer, Driver::Oracle] {
        assert!(matches!(
            build(driver).replace(Some("id")),
            Err(QueryError::Unsupported {
                feature: "REPLACE",
                ..
            })
        ));
    }
}

// ===================================================================
// UPDATE
// ===================================================================

#[test]
fn update_single_row() {
    let mut qb = prepared(Driver::MySql);
    qb.table("users")
        .set("name", "Bob")
        .unwrap()
        .set("active", true)
        .unwrap()
        .where_("id", 5)
        .unwrap();
    assert_eq!(
        prepared_sql(qb.update()),
        "UPDATE `users`\nSET `name` = 'Bob', `active` = 1\nWHERE `id` = 5"
    );
}

#[test]
fn update_without_where_is_rejected() {
    let mut qb = plain(Driver::Sqlite);
    qb.table("t").set("a", 1).unwrap();
    assert!(matches!(
        qb.update(),
        Err(QueryError::MissingWhere { statement: "UPDATE" })
    ));
}

#[test]
fn update_with_order_and_limit_on_mysql() {
    let mut qb = plain(Driver::MySql);
    qb.table("jobs")
        .set("state", "taken")
        .unwrap()
        .where_("state", "open")
        .unwrap()
        .order_by("id", "ASC")
        .unwrap()
        .limit(1);
    assert_eq!(
        prepared_sql(qb.update()),
        "UPDATE jobs\nSET state = 'taken'\nWHERE state = 'open'\nORDER BY id ASC\nLIMIT 1"
    );
}

#[test]
fn update_with_limit_elsewhere_is_unsupported() {
    let mut qb = plain(Driver::Sqlite);
    qb.table("jobs")
        .set("state", "taken")
        .unwrap()
        .where_("state", "open")
        .unwrap()
        .limit(1);
    assert!(matches!(
        qb.update(),
        Err(QueryError::Unsupported { dialect: "SQLite", .. })
    ));
}

#[test]
fn batch_update_builds_case_expressions() {
    let mut qb = plain(Driver::MySql);
    qb.table("t")
        .set_batch([vec![("id", 1), ("a", 10)], vec![("id", 2), ("a", 20)]])
        .unwrap();
    assert_eq!(
        prepared_sql(qb.update_batch("id")),
        "UPDATE t\nSET a = CASE WHEN id = 1 THEN 10 WHEN id = 2 THEN 20 ELSE a END\nWHERE id IN (1, 2)"
    );
}

#[test]
fn batch_update_keeps_existing_conditions_and_sparse_rows() {
    let mut qb = prepared(Driver::Postgres);
    qb.table("products")
        .set_batch([
            vec![
                ("sku", "A1".to_sql_value()),
                ("price", SqlValue::Int(10)),
                ("stock", SqlValue::Int(5)),
            ],
            vec![("sku", "B2".to_sql_value()), ("price", SqlValue::Int(20))],
        ])
        .unwrap()
        .where_("active", true)
        .unwrap();
    assert_eq!(
        prepared_sql(qb.update_batch("sku")),
        "UPDATE \"products\"\n\
         SET \"price\" = CASE WHEN \"sku\" = 'A1' THEN 10 WHEN \"sku\" = 'B2' THEN 20 ELSE \"price\" END, \
         \"stock\" = CASE WHEN \"sku\" = 'A1' THEN 5 ELSE \"stock\" END\n\
         WHERE \"active\" = TRUE\nAND \"sku\" IN ('A1', 'B2')"
    );
}

#[test]
fn batch_update_without_key_is_rejected() {
    let mut qb = plain(Driver::MySql);
    qb.table("t").set_batch([vec![("id", 1), ("a", 2)]]).unwrap();
    assert!(matches!(
        qb.update_batch(""),
        Err(QueryError::BatchUpdateWithoutKey)
    ));
}

#[test]
fn batch_values_need_update_batch() {
    let mut qb = plain(Driver::MySql);
    qb.table("t")
        .set_batch([vec![("id", 1), ("a", 2)]])
        .unwrap()
        .where_("id", 1)
        .unwrap();
    assert!(matches!(qb.update(), Err(QueryError::InvalidArgument(_))));
}

// ===================================================================
// DELETE / TRUNCATE
// ===================================================================

#[test]
fn delete_requires_where() {
    let mut qb = plain(Driver::Sqlite);
    qb.table("t");
    assert!(matches!(
        qb.delete(),
        Err(QueryError::MissingWhere { statement: "DELETE" })
    ));

    qb.table("t");
    assert_eq!(
        prepared_sql(qb.delete_where([("id", 5)])),
        "DELETE FROM t\nWHERE id = 5"
    );
}

#[test]
fn empty_table_is_unguarded() {
    let mut qb = prepared(Driver::Postgres);
    qb.table("logs");
    assert_eq!(prepared_sql(qb.empty_table()), "DELETE FROM \"logs\"");
}

#[test]
fn delete_from_several_tables() {
    let mut qb = plain(Driver::Postgres);
    qb.where_("user_id", 7).unwrap();
    assert_eq!(
        prepared_sql(qb.delete_from_tables(&["sessions", "tokens"])),
        "DELETE FROM sessions\nWHERE user_id = 7;\nDELETE FROM tokens\nWHERE user_id = 7"
    );

    assert!(matches!(
        qb.delete_from_tables(&["sessions"]),
        Err(QueryError::MissingWhere { .. })
    ));
    assert!(matches!(
        qb.delete_from_tables(&[]),
        Err(QueryError::MissingTable { .. })
    ));
}

#[test]
fn truncate_per_dialect() {
    let mut qb = prepared(Driver::MySql);
    qb.from("t");
    assert_eq!(prepared_sql(qb.truncate()), "TRUNCATE TABLE `t`");

    let mut qb = prepared(Driver::Sqlite);
    assert_eq!(prepared_sql(qb.truncate_table("logs")), "DELETE FROM \"logs\"");

    let mut qb = prepared(Driver::Sqlite);
    assert!(matches!(
        qb.truncate(),
        Err(QueryError::MissingTable { statement: "TRUNCATE" })
    ));
}

#[test]
fn write_target_drops_the_alias() {
    let mut qb = prepared(Driver::MySql);
    qb.from("users u")
        .set("name", "x")
        .unwrap()
        .where_("id", 1)
        .unwrap();
    assert_eq!(
        prepared_sql(qb.update()),
        "UPDATE `users`\nSET `name` = 'x'\nWHERE `id` = 1"
    );
}

#[test]
fn values_render_per_dialect() {
    let date = chrono::NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    let cases = [
        (Driver::MySql, "INSERT INTO t (d, b) VALUES ('2024-02-29', X'CAFE')"),
        (Driver::Postgres, "INSERT INTO t (d, b) VALUES ('2024-02-29', '\\xCAFE'::bytea)"),
        (Driver::Oracle, "INSERT INTO t (d, b) VALUES (DATE '2024-02-29', HEXTORAW('CAFE'))"),
        (Driver::SqlServer, "INSERT INTO t (d, b) VALUES ('2024-02-29', 0xCAFE)"),
    ];
    for (driver, expected) in cases {
        let mut qb = plain(driver);
        qb.table("t")
            .set("d", date)
            .unwrap()
            .set("b", SqlValue::Blob(vec![0xCA, 0xFE]))
            .unwrap();
        assert_eq!(prepared_sql(qb.insert()), expected, "{driver}");
    }
}
