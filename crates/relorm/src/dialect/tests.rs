use super::*;

#[test]
fn quoting_per_dialect() {
    assert_eq!(Sqlite.quote_path("foos.id"), r#""foos"."id""#);
    assert_eq!(MySql.quote_path("foos.id"), "`foos`.`id`");
    assert_eq!(Postgres.quote_path("foos.*"), r#""foos".*"#);
    assert_eq!(Sqlite.quote_ident(r#"we"ird"#), r#""we""ird""#);
    assert_eq!(MySql.quote_ident("we`ird"), "`we``ird`");
}

#[test]
fn placeholders() {
    assert_eq!(Sqlite.placeholder(3), "?");
    assert_eq!(MySql.placeholder(3), "?");
    assert_eq!(Postgres.placeholder(3), "$3");
}

#[test]
fn keywords() {
    assert_eq!(Sqlite.auto_increment(), "AUTOINCREMENT");
    assert_eq!(MySql.auto_increment(), "AUTO_INCREMENT");
    assert_eq!(Postgres.auto_increment(), "GENERATED BY DEFAULT AS IDENTITY");
    assert_eq!(MySql.current_timestamp(), "CURRENT_TIMESTAMP");
    assert_eq!(Postgres.current_timestamp(), "now()");
}

#[test]
fn column_types() {
    assert_eq!(Sqlite.column_type(&ColumnType::UInt64).unwrap(), "INTEGER");
    assert_eq!(MySql.column_type(&ColumnType::UInt32).unwrap(), "INT UNSIGNED");
    assert_eq!(Postgres.column_type(&ColumnType::Json).unwrap(), "JSONB");
    assert_eq!(
        MySql
            .column_type(&ColumnType::Enum(vec!["a".into(), "it's".into()]))
            .unwrap(),
        "ENUM('a','it''s')"
    );
    assert!(matches!(
        Postgres.column_type(&ColumnType::Enum(vec!["a".into()])),
        Err(OrmError::UnsupportedType { dialect: "postgres", .. })
    ));
}

#[test]
fn column_type_tags_parse() {
    assert_eq!("int64".parse::<ColumnType>().unwrap(), ColumnType::Int64);
    assert_eq!("DateTime".parse::<ColumnType>().unwrap(), ColumnType::DateTime);
    assert_eq!(
        "enum(Draft, Published)".parse::<ColumnType>().unwrap(),
        ColumnType::Enum(vec!["Draft".into(), "Published".into()])
    );
    assert!(matches!(
        "money".parse::<ColumnType>(),
        Err(OrmError::UnsupportedType { ty, .. }) if ty == "money"
    ));
    assert!(matches!(
        "enum(a,b".parse::<ColumnType>(),
        Err(OrmError::UnsupportedType { .. })
    ));
}

#[test]
fn escape_literals() {
    let text = Value::Text("it's".into());
    assert_eq!(Sqlite.escape_literal(&text).unwrap(), "'it''s'");
    assert_eq!(
        MySql.escape_literal(&Value::Text(r"a\b".into())).unwrap(),
        r"'a\\b'"
    );
    assert_eq!(Postgres.escape_literal(&Value::Bool(true)).unwrap(), "TRUE");
    assert_eq!(Sqlite.escape_literal(&Value::Bool(true)).unwrap(), "1");
    assert_eq!(Sqlite.escape_literal(&Value::Null).unwrap(), "NULL");
    assert_eq!(
        Sqlite.escape_literal(&Value::Bytes(vec![0xde, 0xad])).unwrap(),
        "X'dead'"
    );
    assert!(Postgres.escape_literal(&Value::Float(f64::NAN)).is_err());
}

#[test]
fn dialect_kind_selection() {
    assert_eq!("PostgreSQL".parse::<DialectKind>().unwrap(), DialectKind::Postgres);
    assert_eq!("mariadb".parse::<DialectKind>().unwrap(), DialectKind::MySql);
    assert!("oracle".parse::<DialectKind>().is_err());
    assert_eq!(DialectKind::Postgres.dialect().name(), "postgres");

    let kind: DialectKind = serde_json::from_str(r#""pg""#).unwrap();
    assert_eq!(kind, DialectKind::Postgres);
    assert_eq!(serde_json::to_string(&DialectKind::MySql).unwrap(), r#""mysql""#);
}
