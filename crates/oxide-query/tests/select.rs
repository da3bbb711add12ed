//! Tests for SELECT compilation.

mod common;
use common::*;

use oxide_query::{BuilderOptions, Driver, LikeSide, QueryBuilder, QueryError, SqlValue};

fn sql(qb: &QueryBuilder<'_>) -> String {
    qb.compile_select().unwrap()
}

// ===================================================================
// Conditions
// ===================================================================

#[test]
fn conjunction_between_two_predicates() {
    let mut qb = plain(Driver::Sqlite);
    qb.from("t").where_("x", 1).unwrap().where_("y", 2).unwrap();
    assert_eq!(sql(&qb), "SELECT *\nFROM t\nWHERE x = 1\nAND y = 2");
}

#[test]
fn nested_group_then_predicate() {
    let mut qb = plain(Driver::Sqlite);
    qb.from("t")
        .where_group(|g| {
            g.where_("a", 1)?.or_where("b", 2)?;
            Ok(())
        })
        .unwrap()
        .where_("c", 3)
        .unwrap();
    assert_eq!(sql(&qb), "SELECT *\nFROM t\nWHERE (a = 1 OR b = 2)\nAND c = 3");
}

#[test]
fn negated_and_deep_groups() {
    let mut qb = plain(Driver::Postgres);
    qb.from("t")
        .where_("a", 1)
        .unwrap()
        .or_where_not_group(|g| {
            g.where_("b", 2)?.or_group(|inner| {
                inner.where_("c", 3)?.where_("d", 4)?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();
    assert_eq!(
        sql(&qb),
        "SELECT *\nFROM t\nWHERE a = 1\nOR NOT (b = 2 OR (c = 3 AND d = 4))"
    );
}

#[test]
fn empty_group_is_dropped() {
    let mut qb = plain(Driver::Sqlite);
    qb.from("t")
        .where_group(|_| Ok(()))
        .unwrap()
        .where_("a", 1)
        .unwrap();
    assert_eq!(sql(&qb), "SELECT *\nFROM t\nWHERE a = 1");
}

#[test]
fn predicate_forms() {
    let mut qb = plain(Driver::MySql);
    qb.from("t")
        .like("name", "50%_off", LikeSide::After)
        .where_in("id", [1, 2, 3])
        .unwrap()
        .not_between("age", [18, 30])
        .unwrap()
        .where_("deleted_at", SqlValue::Null)
        .unwrap()
        .or_where("archived_at !=", None::<i64>)
        .unwrap()
        .where_not_in("role", ["admin", "root"])
        .unwrap();
    assert_eq!(
        sql(&qb),
        "SELECT *\nFROM t\n\
         WHERE name LIKE '50!%!_off%' ESCAPE '!'\n\
         AND id IN (1, 2, 3)\n\
         AND age NOT BETWEEN 18 AND 30\n\
         AND deleted_at IS NULL\n\
         OR archived_at IS NOT NULL\n\
         AND role NOT IN ('admin', 'root')"
    );
}

#[test]
fn where_map_with_or() {
    let mut qb = plain(Driver::Sqlite);
    qb.from("t")
        .where_map([("a", 1), ("b >", 2)], "or")
        .unwrap();
    assert_eq!(sql(&qb), "SELECT *\nFROM t\nWHERE a = 1\nOR b > 2");
}

#[test]
fn condition_errors() {
    let mut qb = plain(Driver::Sqlite);
    assert!(matches!(
        qb.between("a", [1]),
        Err(QueryError::BetweenArity(1))
    ));
    assert!(matches!(
        qb.between("a", [1, 2, 3]),
        Err(QueryError::BetweenArity(3))
    ));
    assert!(matches!(
        qb.where_in("a", Vec::<i64>::new()),
        Err(QueryError::InvalidArgument(_))
    ));
    assert!(matches!(
        qb.where_("a ~~", 1),
        Err(QueryError::InvalidOperator(_))
    ));
    assert!(matches!(
        qb.where_map([("a", 1)], "XOR"),
        Err(QueryError::InvalidConjunction(_))
    ));
    assert!(matches!(
        qb.where_("a >", SqlValue::Null),
        Err(QueryError::InvalidArgument(_))
    ));
}

#[test]
fn raw_conditions_pass_through() {
    let mut qb = prepared(Driver::Postgres);
    qb.from("t")
        .where_raw("score * 2 > bonus")
        .unwrap()
        .or_where_raw("vip")
        .unwrap();
    assert_eq!(
        sql(&qb),
        "SELECT *\nFROM \"t\"\nWHERE score * 2 > bonus\nOR vip"
    );
}

#[test]
fn blank_raw_condition_does_not_unlock_delete() {
    let mut qb = prepared(Driver::Sqlite);
    assert!(matches!(
        qb.where_raw("   "),
        Err(QueryError::InvalidArgument(_))
    ));
    qb.from("t");
    assert!(matches!(
        qb.delete(),
        Err(QueryError::MissingWhere { statement: "DELETE" })
    ));
}

// ===================================================================
// Clauses
// ===================================================================

#[test]
fn dialect_swap_changes_only_quotes() {
    let build = |driver| {
        let mut qb = prepared(driver);
        qb.select("id, name")
            .from("users")
            .where_("age >=", 18)
            .unwrap()
            .order_by("name", "ASC")
            .unwrap();
        sql(&qb)
    };
    let mysql = build(Driver::MySql);
    let sqlite = build(Driver::Sqlite);
    assert_eq!(
        mysql,
        "SELECT `id`, `name`\nFROM `users`\nWHERE `age` >= 18\nORDER BY `name` ASC"
    );
    assert_eq!(mysql.replace('`', "\""), sqlite);
}

#[test]
fn group_by_and_having() {
    let mut qb = plain(Driver::Postgres);
    qb.select("dept, COUNT(*) AS n")
        .from("emp")
        .group_by("dept")
        .having("COUNT(*) >", 5)
        .unwrap()
        .or_having_raw("dept = 'ops'")
        .unwrap();
    assert_eq!(
        sql(&qb),
        "SELECT dept, COUNT(*) AS n\nFROM emp\nGROUP BY dept\nHAVING COUNT(*) > 5\nOR dept = 'ops'"
    );
}

#[test]
fn distinct_and_modifiers() {
    let mut qb = plain(Driver::MySql);
    qb.distinct()
        .modifier("SQL_CALC_FOUND_ROWS")
        .select("a")
        .from("t");
    assert_eq!(sql(&qb), "SELECT DISTINCT SQL_CALC_FOUND_ROWS a\nFROM t");
}

#[test]
fn select_raw_is_never_protected() {
    let mut qb = prepared(Driver::MySql);
    qb.select_raw("price * qty AS total").from("lines");
    assert_eq!(sql(&qb), "SELECT price * qty AS total\nFROM `lines`");
}

#[test]
fn aggregate_helpers() {
    let mut qb = prepared(Driver::Postgres);
    qb.select("dept")
        .select_avg("salary", Some("avg_salary"))
        .select_min("salary", None)
        .select_sum("bonus", None)
        .from("emp")
        .group_by("dept");
    assert_eq!(
        sql(&qb),
        "SELECT \"dept\", AVG(\"salary\") AS \"avg_salary\", MIN(\"salary\") AS \"salary\", SUM(\"bonus\") AS \"bonus\"\n\
         FROM \"emp\"\nGROUP BY \"dept\""
    );
}

#[test]
fn order_by_random_per_dialect() {
    let cases = [
        (Driver::MySql, "RAND()"),
        (Driver::Postgres, "RANDOM()"),
        (Driver::Sqlite, "RANDOM()"),
        (Driver::SqlServer, "NEWID()"),
        (Driver::Oracle, "DBMS_RANDOM.VALUE"),
    ];
    for (driver, function) in cases {
        let mut qb = plain(driver);
        qb.from("t").order_by("ignored", "random").unwrap();
        assert_eq!(sql(&qb), format!("SELECT *\nFROM t\nORDER BY {function}"));
    }
}

#[test]
fn limit_and_offset_per_dialect() {
    let cases = [
        (Driver::MySql, "LIMIT 10, 5"),
        (Driver::Postgres, "LIMIT 5 OFFSET 10"),
        (Driver::Sqlite, "LIMIT 5 OFFSET 10"),
        (
            Driver::SqlServer,
            "ORDER BY (SELECT NULL) OFFSET 10 ROWS FETCH NEXT 5 ROWS ONLY",
        ),
        (Driver::Oracle, "OFFSET 10 ROWS FETCH NEXT 5 ROWS ONLY"),
    ];
    for (driver, tail) in cases {
        let mut qb = plain(driver);
        qb.from("t").limit(5).offset(10);
        assert_eq!(sql(&qb), format!("SELECT *\nFROM t\n{tail}"), "{driver}");
    }
}

#[test]
fn sqlsrv_paging_reuses_existing_order() {
    let mut qb = plain(Driver::SqlServer);
    qb.from("t").order_by("id", "").unwrap().limit(5);
    assert_eq!(
        sql(&qb),
        "SELECT *\nFROM t\nORDER BY id\nOFFSET 0 ROWS FETCH NEXT 5 ROWS ONLY"
    );
}

#[test]
fn offset_without_limit() {
    let mut qb = plain(Driver::Sqlite);
    qb.from("t").offset(20);
    assert_eq!(sql(&qb), "SELECT *\nFROM t\nLIMIT -1 OFFSET 20");
}

#[test]
fn optimize_emits_a_single_line() {
    let mut qb = plain(Driver::Sqlite);
    qb.optimize(true)
        .select("a")
        .from("t")
        .where_("a", 1)
        .unwrap()
        .where_("b", 2)
        .unwrap()
        .limit(3);
    assert_eq!(sql(&qb), "SELECT a FROM t WHERE a = 1 AND b = 2 LIMIT 3");
}

// ===================================================================
// Tables, joins and aliases
// ===================================================================

#[test]
fn table_prefix_skips_aliases() {
    let mut qb = QueryBuilder::with_options(
        Driver::Postgres,
        BuilderOptions::prepared().with_table_prefix("app_"),
    );
    qb.select("u.id, p.title")
        .from("users u")
        .join("posts p", "p.user_id = u.id", "left")
        .unwrap();
    assert_eq!(
        sql(&qb),
        "SELECT \"u\".\"id\", \"p\".\"title\"\n\
         FROM \"app_users\" u\n\
         LEFT JOIN \"app_posts\" p ON \"p\".\"user_id\" = \"u\".\"id\""
    );
}

#[test]
fn several_from_tables() {
    let mut qb = prepared(Driver::MySql);
    qb.from("a, b AS bb");
    assert_eq!(sql(&qb), "SELECT *\nFROM `a`, `b` AS bb");
}

#[test]
fn join_types() {
    let mut qb = plain(Driver::Postgres);
    qb.from("a")
        .join("b", "b.a_id = a.id", "right outer")
        .unwrap()
        .join("c", "c.id = b.c_id", "full")
        .unwrap();
    assert_eq!(
        sql(&qb),
        "SELECT *\nFROM a\nRIGHT OUTER JOIN b ON b.a_id = a.id\nFULL OUTER JOIN c ON c.id = b.c_id"
    );
    assert!(matches!(
        qb.join("d", "d.id = a.id", "sideways"),
        Err(QueryError::InvalidJoinType(_))
    ));
}

#[test]
fn derived_table() {
    let mut qb = plain(Driver::Sqlite);
    qb.select("x.id")
        .from_subquery("x", |q| {
            q.select("id").from("a").where_("b", 1)?;
            Ok(())
        })
        .unwrap();
    assert_eq!(
        sql(&qb),
        "SELECT x.id\nFROM (SELECT id\nFROM a\nWHERE b = 1) x"
    );
}

// ===================================================================
// CTE and UNION
// ===================================================================

#[test]
fn recursive_cte_prologue() {
    let mut qb = plain(Driver::Postgres);
    qb.with_recursive("cte", "SELECT 1 AS n UNION ALL SELECT n + 1 FROM cte WHERE n < 5")
        .select("n")
        .from("cte");
    assert_eq!(
        sql(&qb),
        "WITH RECURSIVE cte AS (SELECT 1 AS n UNION ALL SELECT n + 1 FROM cte WHERE n < 5)\nSELECT n\nFROM cte"
    );
}

#[test]
fn plain_ctes_and_column_lists() {
    let mut qb = plain(Driver::Sqlite);
    qb.with("a", "SELECT 1")
        .with_cte("b", &["x", "y"], "SELECT 2, 3", false)
        .from("a");
    assert_eq!(
        sql(&qb),
        "WITH a AS (SELECT 1), b (x, y) AS (SELECT 2, 3)\nSELECT *\nFROM a"
    );
}

#[test]
fn any_recursive_cte_makes_the_prologue_recursive() {
    let mut qb = plain(Driver::Sqlite);
    qb.with("a", "SELECT 1")
        .with_recursive("b", "SELECT 2")
        .from("b");
    assert!(sql(&qb).starts_with("WITH RECURSIVE a AS (SELECT 1), b AS (SELECT 2)\n"));
}

#[test]
fn cte_name_does_not_get_the_table_prefix() {
    let mut qb = QueryBuilder::with_options(
        Driver::Postgres,
        BuilderOptions::prepared().with_table_prefix("app_"),
    );
    qb.with("recent", "SELECT 1").from("recent");
    assert_eq!(
        sql(&qb),
        "WITH \"recent\" AS (SELECT 1)\nSELECT *\nFROM \"recent\""
    );
}

#[test]
fn unions_keep_call_order() {
    let mut qb = plain(Driver::Sqlite);
    qb.select("id")
        .from("a")
        .union(|q| {
            q.select("id").from("b");
            Ok(())
        })
        .unwrap()
        .union_all(|q| {
            q.select("id").from("c");
            Ok(())
        })
        .unwrap();
    assert_eq!(
        sql(&qb),
        "SELECT id\nFROM a\nUNION SELECT id\nFROM b\nUNION ALL SELECT id\nFROM c"
    );
}

// ===================================================================
// Realizing
// ===================================================================

#[test]
fn count_wraps_the_select() {
    let mut qb = plain(Driver::MySql);
    qb.from("t").where_("a", 1).unwrap();
    assert_eq!(
        qb.compile_count().unwrap(),
        "SELECT COUNT(*) AS numrows\nFROM (SELECT *\nFROM t\nWHERE a = 1) count_subquery"
    );
}

#[test]
fn get_where_applies_conditions_and_limit() {
    let mut qb = prepared(Driver::MySql);
    qb.from("t");
    let out = qb.get_where([("a", 1)], 10, 0).unwrap();
    assert_eq!(
        out.into_sql().unwrap(),
        "SELECT *\nFROM `t`\nWHERE `a` = 1\nLIMIT 10"
    );
}

#[test]
fn state_resets_after_realize() {
    let mut qb = plain(Driver::Sqlite);
    qb.select("a").from("t").where_("a", 1).unwrap().limit(2);
    assert!(qb.get().unwrap().is_prepared());
    assert_eq!(sql(&qb), "SELECT *");
}

#[test]
fn state_resets_after_failed_realize() {
    let mut qb = plain(Driver::Sqlite);
    qb.from("t");
    assert!(qb.delete().is_err());
    qb.from("u").where_("a", 1).unwrap();
    assert_eq!(qb.compile_delete().unwrap(), "DELETE FROM u\nWHERE a = 1");
}

#[test]
fn builder_from_driver_name() {
    let mut qb = QueryBuilder::create("mssql", BuilderOptions::prepared()).unwrap();
    qb.select("id").from("dbo.users");
    assert_eq!(sql(&qb), "SELECT [id]\nFROM [dbo].[users]");
    assert!(matches!(
        QueryBuilder::create("informix", BuilderOptions::default()),
        Err(QueryError::UnknownDriver(_))
    ));
}
