#![allow(dead_code)]

use relorm::{
    BelongsTo, Builder, FromRow, HasMany, Model, MySql, Postgres, Scope, Sqlite, SqliteExecutor,
    Value, from,
};

#[derive(Debug, Clone, Model)]
struct Foo {
    #[orm(id)]
    id: i64,
    column: String,
    bar: relorm::HasOne<Bar>,
}

#[derive(Debug, Clone, Model)]
struct Bar {
    #[orm(id)]
    id: i64,
    foo_id: i64,
}

#[derive(Debug, Clone, Model)]
#[orm(table = "people")]
struct User {
    #[orm(id, auto_increment)]
    id: i64,
    #[orm(column = "user_name")]
    name: String,
    posts: HasMany<Post>,
    #[orm(skip)]
    cached_rank: Option<u32>,
}

#[derive(Debug, Clone, Model)]
#[orm(scopes = "post_scopes")]
struct Post {
    #[orm(id)]
    id: i64,
    #[orm(foreign = "user_id")]
    author: BelongsTo<User>,
    user_id: i64,
    title: String,
    deleted_at: Option<String>,
}

fn post_scopes() -> Vec<Scope> {
    vec![Scope::new("live", |q| q.where_null("deleted_at"))]
}

#[derive(Debug, FromRow)]
struct Total {
    user_id: i64,
    #[orm(column = "n")]
    total: i64,
}

#[test]
fn where_on_model_table() {
    let (sql, bindings) = from::<Foo>()
        .and_where("column", "=", "value")
        .to_sql(&Sqlite)
        .unwrap();
    assert_eq!(sql, r#"SELECT "foos".* FROM "foos" WHERE "column" = ?"#);
    assert_eq!(bindings, vec![Value::Text("value".into())]);
}

#[test]
fn where_has_on_derived_model() {
    let (sql, bindings) = from::<Foo>()
        .where_has("bar", |q| q.and_where("id", "=", 7))
        .to_sql(&Sqlite)
        .unwrap();
    assert_eq!(
        sql,
        r#"SELECT "foos".* FROM "foos" WHERE EXISTS (SELECT "bars".* FROM "bars" WHERE "foo_id" = "foos"."id" AND "id" = ?)"#
    );
    assert_eq!(bindings, vec![Value::Int(7)]);
}

#[test]
fn column_and_table_overrides() {
    let meta = User::meta();
    assert_eq!(meta.table, "people");
    assert_eq!(meta.columns().collect::<Vec<_>>(), vec!["id", "user_name"]);
    assert!(meta.column("id").is_some_and(|f| f.primary && f.auto_increment));
    assert!(!meta.has_column("cached_rank"));
}

#[test]
fn global_scopes_from_model_attribute() {
    let (sql, _) = Post::query().to_sql(&Sqlite).unwrap();
    assert_eq!(
        sql,
        r#"SELECT "posts".* FROM "posts" WHERE "deleted_at" IS NULL"#
    );

    let (sql, _) = Post::query()
        .without_global_scope("live")
        .to_sql(&Sqlite)
        .unwrap();
    assert_eq!(sql, r#"SELECT "posts".* FROM "posts""#);
}

#[test]
fn related_scopes_apply_inside_where_has() {
    let (sql, bindings) = User::query()
        .where_has("posts", |q| q.and_where("title", "=", "hello"))
        .to_sql(&Postgres)
        .unwrap();
    assert_eq!(
        sql,
        r#"SELECT "people".* FROM "people" WHERE EXISTS (SELECT "posts".* FROM "posts" WHERE "user_id" = "people"."id" AND "title" = $1 AND "deleted_at" IS NULL)"#
    );
    assert_eq!(bindings, vec![Value::Text("hello".into())]);
}

#[test]
fn belongs_to_with_custom_foreign_key() {
    let (sql, _) = Post::query()
        .without_global_scopes()
        .where_has("author", |q| q)
        .to_sql(&MySql)
        .unwrap();
    assert_eq!(
        sql,
        "SELECT `posts`.* FROM `posts` WHERE EXISTS (SELECT `people`.* FROM `people` WHERE `id` = `posts`.`user_id`)"
    );
}

#[test]
fn unknown_relationship_fails_on_compile() {
    let err = User::query()
        .where_has("comments", |q| q)
        .to_sql(&Sqlite)
        .unwrap_err();
    assert!(err.is_missing_relationship());
}

#[tokio::test]
async fn aggregate_rows_map_through_from_row() {
    let db = SqliteExecutor::open_in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE posts (id INTEGER PRIMARY KEY, user_id INTEGER, title TEXT, deleted_at TEXT);
         INSERT INTO posts VALUES (1, 1, 'a', NULL), (2, 1, 'b', NULL), (3, 2, 'c', '2024-01-01');",
    )
    .unwrap();

    let totals: Vec<Total> = Post::query()
        .untyped()
        .select_raw("user_id, COUNT(*) AS n", Vec::new())
        .group_by(&["user_id"])
        .order_by("user_id")
        .fetch_as(&db)
        .await
        .unwrap();
    assert_eq!(totals.len(), 1);
    assert_eq!((totals[0].user_id, totals[0].total), (1, 2));

    let all: Vec<Total> = Builder::table("posts")
        .select_raw("user_id, COUNT(*) AS n", Vec::new())
        .group_by(&["user_id"])
        .order_by("user_id")
        .fetch_as(&db)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
}
