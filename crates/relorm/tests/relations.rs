#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use relorm::{
    BelongsTo, Context, Dialect, DynModel, Executor, HasMany, HasOne, Model, OrmResult, Relation,
    Row, SqliteExecutor, Value, load, load_dyn, load_missing,
};

#[derive(Debug, Clone, Model)]
struct Foo {
    #[orm(id)]
    id: i64,
    name: String,
    bar: HasOne<Bar>,
    bars: HasMany<Bar>,
}

#[derive(Debug, Clone, Model)]
struct Bar {
    #[orm(id)]
    id: i64,
    foo_id: Option<i64>,
    foo: BelongsTo<Foo>,
}

#[derive(Debug, Clone, Model)]
#[orm(table = "bars")]
struct BrokenBar {
    #[orm(id)]
    id: i64,
    #[orm(foreign = "owner_id")]
    foo: BelongsTo<Foo>,
}

/// Sqlite executor that records every statement it runs.
struct Recording {
    inner: SqliteExecutor,
    log: Mutex<Vec<String>>,
}

impl Recording {
    fn statements(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn reset(&self) {
        self.log.lock().unwrap().clear();
    }
}

#[async_trait]
impl Executor for Recording {
    fn dialect(&self) -> &dyn Dialect {
        self.inner.dialect()
    }

    async fn query(&self, ctx: &Context, sql: &str, bindings: &[Value]) -> OrmResult<Vec<Row>> {
        self.log.lock().unwrap().push(sql.to_string());
        self.inner.query(ctx, sql, bindings).await
    }

    async fn execute(&self, ctx: &Context, sql: &str, bindings: &[Value]) -> OrmResult<u64> {
        self.log.lock().unwrap().push(sql.to_string());
        self.inner.execute(ctx, sql, bindings).await
    }
}

fn setup() -> Recording {
    let inner = SqliteExecutor::open_in_memory().unwrap();
    inner
        .execute_batch(
            "CREATE TABLE foos (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
             CREATE TABLE bars (id INTEGER PRIMARY KEY, foo_id INTEGER);
             INSERT INTO foos (id, name) VALUES (1, 'one'), (2, 'two'), (3, 'three');
             INSERT INTO bars (id, foo_id) VALUES (4, 1), (5, 2), (6, 3), (7, NULL);",
        )
        .unwrap();
    Recording {
        inner,
        log: Mutex::new(Vec::new()),
    }
}

async fn all_foos(db: &Recording) -> Vec<Foo> {
    let foos = Foo::query().order_by("id").get(db).await.unwrap();
    db.reset();
    foos
}

#[test]
fn derive_builds_metadata() {
    let meta = Foo::meta();
    assert_eq!(meta.type_name, "Foo");
    assert_eq!(meta.table, "foos");
    assert_eq!(meta.columns().collect::<Vec<_>>(), vec!["id", "name"]);
    assert!(meta.find_relation("bar").is_some());
    assert!(meta.find_relation("bars").is_some());
    assert_eq!(Bar::meta().table, "bars");
}

#[tokio::test]
async fn has_one_loads_in_a_single_query() {
    let db = setup();
    let mut foos = all_foos(&db).await;

    load(&Context::new(), &db, &mut foos, "bar").await.unwrap();

    let statements = db.statements();
    assert_eq!(statements.len(), 1);
    assert_eq!(
        statements[0],
        r#"SELECT "bars".* FROM "bars" WHERE "foo_id" IN (?, ?, ?)"#
    );
    let pairs: Vec<(i64, Option<i64>)> = foos
        .iter()
        .map(|f| (f.id, f.bar.get().map(|b| b.id)))
        .collect();
    assert_eq!(pairs, vec![(1, Some(4)), (2, Some(5)), (3, Some(6))]);
}

#[tokio::test]
async fn dotted_path_issues_one_query_per_segment() {
    let db = setup();
    let mut foos = all_foos(&db).await;

    load(&Context::new(), &db, &mut foos, "bar.foo.bar")
        .await
        .unwrap();

    assert_eq!(db.statements().len(), 3);
    for foo in &foos {
        let round_trip = foo
            .bar
            .get()
            .and_then(|b| b.foo.get())
            .and_then(|f| f.bar.get())
            .map(|b| b.id);
        assert_eq!(round_trip, foo.bar.get().map(|b| b.id));
    }
}

#[tokio::test]
async fn load_missing_does_not_refetch() {
    let db = setup();
    let mut foos = all_foos(&db).await;
    let ctx = Context::new();

    load_missing(&ctx, &db, &mut foos, "bar").await.unwrap();
    load_missing(&ctx, &db, &mut foos, "bar").await.unwrap();
    assert_eq!(db.statements().len(), 1);

    // An explicit load always hits the database again.
    load(&ctx, &db, &mut foos, "bar").await.unwrap();
    assert_eq!(db.statements().len(), 2);
}

#[tokio::test]
async fn belongs_to_skips_null_keys() {
    let db = setup();
    let mut bars = Bar::query().order_by("id").get(&db).await.unwrap();
    db.reset();

    load(&Context::new(), &db, &mut bars, "foo").await.unwrap();

    let statements = db.statements();
    assert_eq!(statements.len(), 1);
    assert_eq!(
        statements[0],
        r#"SELECT "foos".* FROM "foos" WHERE "id" IN (?, ?, ?)"#
    );
    let owners: Vec<Option<i64>> = bars.iter().map(|b| b.foo.get().map(|f| f.id)).collect();
    assert_eq!(owners, vec![Some(1), Some(2), Some(3), None]);
    assert!(bars[3].foo.is_loaded());
}

#[tokio::test]
async fn has_many_collects_every_match() {
    let db = setup();
    db.inner
        .execute_batch("INSERT INTO bars (id, foo_id) VALUES (8, 1)")
        .unwrap();
    let mut foos = all_foos(&db).await;

    load(&Context::new(), &db, &mut foos, "bars").await.unwrap();

    let ids: Vec<Vec<i64>> = foos
        .iter()
        .map(|f| {
            let mut ids: Vec<i64> = f.bars.iter().map(|b| b.id).collect();
            ids.sort();
            ids
        })
        .collect();
    assert_eq!(ids, vec![vec![4, 8], vec![5], vec![6]]);
}

#[tokio::test]
async fn unknown_relationship_is_reported() {
    let db = setup();
    let mut foos = all_foos(&db).await;

    let err = load(&Context::new(), &db, &mut foos, "baz")
        .await
        .unwrap_err();
    assert!(err.is_missing_relationship());
    assert!(db.statements().is_empty());

    let err = load(&Context::new(), &db, &mut foos, "bar.baz")
        .await
        .unwrap_err();
    assert!(err.is_missing_relationship());
}

#[tokio::test]
async fn key_override_naming_missing_column_fails() {
    let db = setup();
    let err = BrokenBar::query().get(&db).await.unwrap_err();
    assert!(err.is_missing_field());
}

#[tokio::test]
async fn eager_loading_through_builder() {
    let db = setup();
    let foos = Foo::query()
        .with("bar")
        .with("bars")
        .order_by("id")
        .get(&db)
        .await
        .unwrap();

    assert_eq!(db.statements().len(), 3);
    assert!(foos.iter().all(|f| f.bar.is_loaded() && f.bars.is_loaded()));
    assert_eq!(foos[2].bar.get().map(|b| b.id), Some(6));
}

#[tokio::test]
async fn where_has_filters_by_related_rows() {
    let db = setup();
    let foos = Foo::query()
        .where_has("bar", |q| q.and_where("id", ">=", 5))
        .order_by("id")
        .get(&db)
        .await
        .unwrap();
    assert_eq!(foos.iter().map(|f| f.id).collect::<Vec<_>>(), vec![2, 3]);

    let owned_by_two = Bar::query()
        .where_has("foo", |q| q.and_where("name", "=", "two"))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(owned_by_two, 1);
}

#[tokio::test]
async fn terminal_operations() {
    let db = setup();

    let found = Foo::query().find(&db, 2).await.unwrap();
    assert_eq!(found.map(|f| f.name), Some("two".to_string()));
    assert!(Foo::query().find(&db, 99).await.unwrap().is_none());

    let first = Foo::query().order_by_desc("id").first(&db).await.unwrap();
    assert_eq!(first.map(|f| f.id), Some(3));

    assert_eq!(Foo::query().count(&db).await.unwrap(), 3);
    assert!(Foo::query().and_where("name", "=", "one").exists(&db).await.unwrap());
    assert!(!Foo::query().and_where("name", "=", "nine").exists(&db).await.unwrap());
}

#[tokio::test]
async fn fetched_relationships_are_initialized() {
    let db = setup();
    let foo = Foo::query().find(&db, 1).await.unwrap().unwrap();
    assert!(foo.bar.is_initialized());
    assert!(!foo.bar.is_loaded());
    assert_eq!(foo.bar.parent_value(), &Value::Int(1));
}

#[tokio::test]
async fn count_respects_distinct_and_group_by() {
    let db = setup();
    db.inner
        .execute_batch("INSERT INTO bars (id, foo_id) VALUES (8, 1), (9, 1)")
        .unwrap();

    assert_eq!(Bar::query().count(&db).await.unwrap(), 6);

    let distinct_owners = Bar::query()
        .select(&["foo_id"])
        .distinct()
        .where_not_null("foo_id")
        .count(&db)
        .await
        .unwrap();
    assert_eq!(distinct_owners, 3);

    db.reset();
    let groups = Bar::query()
        .select(&["foo_id"])
        .group_by(&["foo_id"])
        .count(&db)
        .await
        .unwrap();
    assert_eq!(groups, 4);
    assert_eq!(
        db.statements()[0],
        r#"SELECT COUNT(*) AS count FROM (SELECT "foo_id" FROM "bars" GROUP BY "foo_id") AS "sub""#
    );
}

#[tokio::test]
async fn load_dyn_requires_every_model_to_declare_the_segment() {
    let db = setup();
    let mut foos = all_foos(&db).await;
    let ctx = Context::new();

    let models: Vec<&mut dyn DynModel> = foos
        .iter_mut()
        .map(|f| f as &mut dyn DynModel)
        .collect();
    load_dyn(&ctx, &db, models, "bar", false).await.unwrap();
    assert_eq!(db.statements().len(), 1);
    assert!(foos.iter().all(|f| f.bar.is_loaded()));

    let mut bars = Bar::query().order_by("id").get(&db).await.unwrap();
    db.reset();
    let mut mixed: Vec<&mut dyn DynModel> = Vec::new();
    mixed.push(&mut foos[0]);
    mixed.push(&mut bars[0]);
    let err = load_dyn(&ctx, &db, mixed, "bar", false).await.unwrap_err();
    assert!(err.is_missing_relationship());
    assert!(db.statements().is_empty());
}
