use super::*;
use crate::dialect::{MySql, Postgres, Sqlite};

fn sqlite(b: &Builder) -> (String, Vec<Value>) {
    b.to_sql(&Sqlite).unwrap()
}

#[test]
fn test_simple_select() {
    let (sql, bindings) = sqlite(&Builder::table("foos").and_where("column", "=", "value"));
    assert_eq!(sql, r#"SELECT "foos".* FROM "foos" WHERE "column" = ?"#);
    assert_eq!(bindings, vec![Value::Text("value".into())]);
}

#[test]
fn test_select_without_table() {
    let (sql, bindings) = sqlite(&Builder::empty().select_raw("? AS one", vec![Value::Int(1)]));
    assert_eq!(sql, "SELECT ? AS one");
    assert_eq!(bindings, vec![Value::Int(1)]);
    assert_eq!(sqlite(&Builder::empty()).0, "SELECT *");
}

#[test]
fn test_select_columns_and_distinct() {
    let qb = Builder::table("users")
        .select(&["id", "users.name"])
        .add_select("email")
        .distinct();
    assert_eq!(
        sqlite(&qb).0,
        r#"SELECT DISTINCT "id", "users"."name", "email" FROM "users""#
    );
}

#[test]
fn test_dialect_quoting() {
    let qb = Builder::table("foos").and_where("a", "=", 1).and_where("b", "=", 2);
    assert_eq!(
        qb.to_sql(&MySql).unwrap().0,
        "SELECT `foos`.* FROM `foos` WHERE `a` = ? AND `b` = ?"
    );
    assert_eq!(
        qb.to_sql(&Postgres).unwrap().0,
        r#"SELECT "foos".* FROM "foos" WHERE "a" = $1 AND "b" = $2"#
    );
}

#[test]
fn test_null_comparisons() {
    let qb = Builder::table("t")
        .and_where("deleted_at", "=", None::<i64>)
        .and_where("archived_at", "!=", Value::Null)
        .where_not_null("name");
    let (sql, bindings) = sqlite(&qb);
    assert_eq!(
        sql,
        r#"SELECT "t".* FROM "t" WHERE "deleted_at" IS NULL AND "archived_at" IS NOT NULL AND "name" IS NOT NULL"#
    );
    assert!(bindings.is_empty());

    let err = Builder::table("t")
        .and_where("age", ">", Value::Null)
        .to_sql(&Sqlite)
        .unwrap_err();
    assert!(err.is_invalid_condition());
}

#[test]
fn test_invalid_operator_and_identifier() {
    let err = Builder::table("t")
        .and_where("a", "=~", 1)
        .to_sql(&Sqlite)
        .unwrap_err();
    assert!(err.is_invalid_condition());

    let err = Builder::table("t")
        .and_where("a; DROP TABLE t", "=", 1)
        .to_sql(&Sqlite)
        .unwrap_err();
    assert!(matches!(err, OrmError::InvalidIdentifier(_)));
}

#[test]
fn test_builders_are_immutable() {
    let base = Builder::table("foos").and_where("active", "=", true);
    let recent = base.order_by_desc("created_at").limit(10);
    let named = base.and_where("name", "LIKE", "a%");

    assert_eq!(
        sqlite(&base).0,
        r#"SELECT "foos".* FROM "foos" WHERE "active" = ?"#
    );
    assert_eq!(
        sqlite(&recent).0,
        r#"SELECT "foos".* FROM "foos" WHERE "active" = ? ORDER BY "created_at" DESC LIMIT 10"#
    );
    assert_eq!(
        sqlite(&named).0,
        r#"SELECT "foos".* FROM "foos" WHERE "active" = ? AND "name" LIKE ?"#
    );
    assert_eq!(sqlite(&base).1.len(), 1);
    assert_eq!(sqlite(&named).1.len(), 2);
}

#[test]
fn test_where_groups() {
    let qb = Builder::table("t")
        .and_where("a", "=", 1)
        .or_where_group(|g| g.and_where("b", "=", 2).and_where("c", "=", 3));
    let (sql, bindings) = sqlite(&qb);
    assert_eq!(
        sql,
        r#"SELECT "t".* FROM "t" WHERE "a" = ? OR ("b" = ? AND "c" = ?)"#
    );
    assert_eq!(bindings, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}

#[test]
fn test_empty_group_is_omitted() {
    let qb = Builder::table("t").where_group(|g| g);
    assert_eq!(sqlite(&qb).0, r#"SELECT "t".* FROM "t""#);
}

#[test]
fn test_where_in() {
    let qb = Builder::table("users").where_in("role_id", vec![1, 2, 3]);
    let (sql, bindings) = qb.to_sql(&Postgres).unwrap();
    assert_eq!(
        sql,
        r#"SELECT "users".* FROM "users" WHERE "role_id" IN ($1, $2, $3)"#
    );
    assert_eq!(bindings.len(), 3);

    let none = Builder::table("users").where_in("id", Vec::<i64>::new());
    assert_eq!(sqlite(&none).0, r#"SELECT "users".* FROM "users" WHERE 1 = 0"#);
    let all = Builder::table("users").where_not_in("id", Vec::<i64>::new());
    assert_eq!(sqlite(&all).0, r#"SELECT "users".* FROM "users" WHERE 1 = 1"#);
}

#[test]
fn test_between_and_raw() {
    let qb = Builder::table("t")
        .where_between("age", 18, 65)
        .where_raw("lower(name) = ?", vec![Value::Text("bob".into())]);
    let (sql, bindings) = qb.to_sql(&Postgres).unwrap();
    assert_eq!(
        sql,
        r#"SELECT "t".* FROM "t" WHERE "age" BETWEEN $1 AND $2 AND lower(name) = $3"#
    );
    assert_eq!(
        bindings,
        vec![Value::Int(18), Value::Int(65), Value::Text("bob".into())]
    );
}

#[test]
fn test_raw_binding_count_mismatch() {
    let err = Builder::table("t")
        .where_raw("a = ?", vec![Value::Int(1), Value::Int(2)])
        .to_sql(&Sqlite)
        .unwrap_err();
    assert!(err.is_invalid_condition());
}

#[test]
fn test_subquery_placeholders_are_numbered_in_order() {
    let sub = Builder::table("bars")
        .select(&["foo_id"])
        .and_where("b", "=", 2);
    let qb = Builder::table("foos")
        .and_where("a", "=", 1)
        .where_in_sub("id", &sub)
        .and_where("c", "=", 3);
    let (sql, bindings) = qb.to_sql(&Postgres).unwrap();
    assert_eq!(
        sql,
        r#"SELECT "foos".* FROM "foos" WHERE "a" = $1 AND "id" IN (SELECT "foo_id" FROM "bars" WHERE "b" = $2) AND "c" = $3"#
    );
    assert_eq!(bindings, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}

#[test]
fn test_select_sub_and_exists() {
    let count = Builder::table("bars")
        .select_raw("COUNT(*)", vec![])
        .where_column("bars.foo_id", "=", "foos.id");
    let qb = Builder::table("foos")
        .select(&["id"])
        .select_sub(count, "bar_count")
        .where_not_exists(Builder::table("bans").where_column("bans.foo_id", "=", "foos.id"));
    assert_eq!(
        sqlite(&qb).0,
        r#"SELECT "id", (SELECT COUNT(*) FROM "bars" WHERE "bars"."foo_id" = "foos"."id") AS "bar_count" FROM "foos" WHERE NOT EXISTS (SELECT "bans".* FROM "bans" WHERE "bans"."foo_id" = "foos"."id")"#
    );
}

#[test]
fn test_where_subquery_comparison() {
    let total = Builder::table("orders")
        .select_raw("SUM(total)", vec![])
        .where_column("orders.user_id", "=", "users.id");
    let qb = Builder::table("users").where_subquery(total, ">", 100);
    let (sql, bindings) = sqlite(&qb);
    assert_eq!(
        sql,
        r#"SELECT "users".* FROM "users" WHERE (SELECT SUM(total) FROM "orders" WHERE "orders"."user_id" = "users"."id") > ?"#
    );
    assert_eq!(bindings, vec![Value::Int(100)]);
}

#[test]
fn test_joins() {
    let qb = Builder::table("users AS u")
        .select(&["u.id", "r.name"])
        .left_join("roles AS r", "u.role_id", "=", "r.id")
        .join("teams t", "u.team_id", "=", "t.id")
        .cross_join("regions");
    assert_eq!(
        sqlite(&qb).0,
        r#"SELECT "u"."id", "r"."name" FROM "users" AS "u" LEFT JOIN "roles" AS "r" ON "u"."role_id" = "r"."id" INNER JOIN "teams" AS "t" ON "u"."team_id" = "t"."id" CROSS JOIN "regions""#
    );

    let aliased = Builder::table("users u");
    assert_eq!(sqlite(&aliased).0, r#"SELECT "u".* FROM "users" AS "u""#);
}

#[test]
fn test_join_on_conditions() {
    let qb = Builder::table("a").join_on(JoinKind::Right, "b", |on| {
        on.where_column("a.id", "=", "b.a_id").and_where("b.kind", "=", "x")
    });
    let (sql, bindings) = qb.to_sql(&Postgres).unwrap();
    assert_eq!(
        sql,
        r#"SELECT "a".* FROM "a" RIGHT JOIN "b" ON "a"."id" = "b"."a_id" AND "b"."kind" = $1"#
    );
    assert_eq!(bindings, vec![Value::Text("x".into())]);
}

#[test]
fn test_group_by_having() {
    let qb = Builder::table("orders")
        .select(&["customer_id"])
        .select_raw("SUM(total) AS total", vec![])
        .and_where("status", "=", "paid")
        .group_by(&["customer_id"])
        .having_raw("SUM(total) > ?", vec![Value::Int(100)])
        .order_by_desc("customer_id");
    let (sql, bindings) = qb.to_sql(&Postgres).unwrap();
    assert_eq!(
        sql,
        r#"SELECT "customer_id", SUM(total) AS total FROM "orders" WHERE "status" = $1 GROUP BY "customer_id" HAVING SUM(total) > $2 ORDER BY "customer_id" DESC"#
    );
    assert_eq!(
        bindings,
        vec![Value::Text("paid".into()), Value::Int(100)]
    );
}

#[test]
fn test_order_by() {
    let qb = Builder::table("t")
        .order_by("a")
        .order_by_desc("b")
        .order_by_raw("lower(c)", vec![]);
    assert_eq!(
        sqlite(&qb).0,
        r#"SELECT "t".* FROM "t" ORDER BY "a", "b" DESC, lower(c)"#
    );
    assert_eq!(sqlite(&qb.unordered()).0, r#"SELECT "t".* FROM "t""#);
}

#[test]
fn test_limit_offset() {
    let qb = Builder::table("t").limit(10).offset(20);
    assert_eq!(sqlite(&qb).0, r#"SELECT "t".* FROM "t" LIMIT 10 OFFSET 20"#);

    let offset_only = Builder::table("t").offset(5);
    assert_eq!(
        offset_only.to_sql(&Sqlite).unwrap().0,
        r#"SELECT "t".* FROM "t" LIMIT -1 OFFSET 5"#
    );
    assert_eq!(
        offset_only.to_sql(&Postgres).unwrap().0,
        r#"SELECT "t".* FROM "t" LIMIT ALL OFFSET 5"#
    );
    assert_eq!(
        offset_only.to_sql(&MySql).unwrap().0,
        "SELECT `t`.* FROM `t` LIMIT 18446744073709551615 OFFSET 5"
    );
}

#[test]
fn test_scopes_apply_once_per_compile() {
    let qb = Builder::table("posts")
        .with_scope(Scope::new("published", |q| q.where_not_null("published_at")));
    let first = sqlite(&qb).0;
    let second = sqlite(&qb).0;
    assert_eq!(first, second);
    assert_eq!(
        first,
        r#"SELECT "posts".* FROM "posts" WHERE "published_at" IS NOT NULL"#
    );
}

#[test]
fn test_local_scopes_run_before_global_scopes() {
    let qb = Builder::table("t")
        .with_global_scope(Scope::new("by_b", |q| q.order_by("b")))
        .with_scope(Scope::new("by_a", |q| q.order_by("a")));
    assert_eq!(sqlite(&qb).0, r#"SELECT "t".* FROM "t" ORDER BY "a", "b""#);
}

#[test]
fn test_scope_removal() {
    let qb = Builder::table("t")
        .with_global_scope(Scope::new("live", |q| q.where_null("deleted_at")))
        .with_global_scope(Scope::new("mine", |q| q.and_where("owner", "=", 1)))
        .with_scope(Scope::new("recent", |q| q.order_by_desc("id")));

    assert_eq!(
        sqlite(&qb.without_global_scope("live")).0,
        r#"SELECT "t".* FROM "t" WHERE "owner" = ? ORDER BY "id" DESC"#
    );
    assert_eq!(
        sqlite(&qb.without_global_scopes()).0,
        r#"SELECT "t".* FROM "t" ORDER BY "id" DESC"#
    );
    assert_eq!(
        sqlite(&qb.without_scope("recent")).0,
        r#"SELECT "t".* FROM "t" WHERE "deleted_at" IS NULL AND "owner" = ?"#
    );
}

#[derive(Debug)]
struct Tenant(i64);

#[test]
fn test_scope_reads_context() {
    let tenant = Scope::new("tenant", |q| {
        let id = q.context().get::<Tenant>().map(|t| t.0);
        match id {
            Some(id) => q.and_where("tenant_id", "=", id),
            None => q,
        }
    });
    let qb = Builder::table("docs").with_global_scope(tenant);

    assert_eq!(sqlite(&qb).0, r#"SELECT "docs".* FROM "docs""#);

    let (sql, bindings) = sqlite(&qb.with_context(Context::new().with(Tenant(42))));
    assert_eq!(sql, r#"SELECT "docs".* FROM "docs" WHERE "tenant_id" = ?"#);
    assert_eq!(bindings, vec![Value::Int(42)]);
}

#[test]
fn test_builder_as_fragment() {
    let sub = Builder::table("bars").select(&["id"]).and_where("x", "=", 1);
    let (sql, bindings) = Fragment::from(&sub).to_sql(&Postgres).unwrap();
    assert_eq!(sql, r#"SELECT "id" FROM "bars" WHERE "x" = $1"#);
    assert_eq!(bindings, vec![Value::Int(1)]);
}

#[test]
fn test_table_name() {
    assert_eq!(Builder::table("foos").table_name(), Some("foos"));
    assert_eq!(Builder::table("foos").from("bars").table_name(), Some("bars"));
    assert_eq!(Builder::empty().table_name(), None);
}

#[test]
fn test_from_subquery_continues_placeholders() {
    let inner = Builder::table("bars")
        .select(&["foo_id"])
        .distinct()
        .and_where("id", ">", 3);
    let qb = Builder::empty()
        .select_raw("COUNT(*) AS count, ? AS tag", vec![Value::Int(7)])
        .from_sub(inner, "sub");
    let (sql, bindings) = qb.to_sql(&Postgres).unwrap();
    assert_eq!(
        sql,
        r#"SELECT COUNT(*) AS count, $1 AS tag FROM (SELECT DISTINCT "foo_id" FROM "bars" WHERE "id" > $2) AS "sub""#
    );
    assert_eq!(bindings, vec![Value::Int(7), Value::Int(3)]);
    assert_eq!(qb.table_name(), Some("sub"));
}
