use silo_core::{Column, ColumnType, Value};
use time::macros::date;
use time::{PrimitiveDateTime, Time};

#[test]
fn string_accepts_its_character_class() {
    let ty = ColumnType::String(16);
    assert!(ty.validate(&Value::from("hello world")));
    assert!(ty.validate(&Value::from("under_score-9")));
    assert!(ty.validate(&Value::from("")));
}

#[test]
fn string_rejects_punctuation_length_and_kind() {
    let ty = ColumnType::String(16);
    assert!(!ty.validate(&Value::from("hello!")));
    assert!(!ty.validate(&Value::from("it's")));
    assert!(!ty.validate(&Value::from("a(b)")));
    assert!(!ty.validate(&Value::from("seventeen chars..")));
    assert!(!ty.validate(&Value::from(5)));
    assert!(!ty.validate(&Value::Varchar(None)));
}

#[test]
fn code_string_accepts_code_punctuation() {
    let ty = ColumnType::CodeString(128);
    assert!(ty.validate(&Value::from("f(x) = [1, 2] * {a: 'b'} / <c>^2")));
    assert!(ty.validate(&Value::from(r#"path\to:file, "quoted""#)));
    assert!(!ColumnType::CodeString(4).validate(&Value::from("12345")));
    assert!(!ty.validate(&Value::from(true)));
}

#[test]
fn numeric_and_boolean_validation_is_kind_identity() {
    assert!(ColumnType::Integer.validate(&Value::from(7)));
    assert!(!ColumnType::Integer.validate(&Value::from(7.0)));
    assert!(ColumnType::Float.validate(&Value::from(7.0)));
    assert!(!ColumnType::Float.validate(&Value::from(7)));
    assert!(ColumnType::Boolean.validate(&Value::from(false)));
    assert!(!ColumnType::Boolean.validate(&Value::from("false")));
    assert!(ColumnType::ForeignKey("users").validate(&Value::from(1)));
    assert!(!ColumnType::ForeignKey("users").validate(&Value::from("1")));
}

#[test]
fn datetime_format_drops_the_subsecond_fraction() {
    let stamp = PrimitiveDateTime::new(
        date!(2024 - 01 - 01),
        Time::from_hms_micro(10, 0, 0, 123_456).unwrap(),
    );
    assert_eq!(
        ColumnType::DateTime.format(&Value::from(stamp)),
        "2024-01-01 10:00:00"
    );
}

#[test]
fn datetime_rejects_other_kinds() {
    assert!(!ColumnType::DateTime.validate(&Value::from("2024-01-01 10:00:00")));
    assert!(!ColumnType::DateTime.validate(&Value::from(0)));
}

#[test]
fn string_format_serializes_non_string_input() {
    let ty = ColumnType::String(32);
    assert_eq!(ty.format(&Value::from("plain")), "plain");
    assert_eq!(ty.format(&Value::from(5)), "5");
    assert_eq!(ty.format(&Value::from(true)), "true");
}

#[test]
fn ddl_fragments() {
    assert_eq!(
        Column::new("age", ColumnType::Integer)
            .required(false)
            .default_value(0)
            .ddl(),
        "age integer"
    );
    assert_eq!(
        Column::new("id", ColumnType::Integer).primary_key().ddl(),
        "id serial primary key"
    );
    assert_eq!(
        Column::new("email", ColumnType::String(120)).unique().ddl(),
        "email varchar(120) UNIQUE NOT NULL"
    );
    assert_eq!(
        Column::new("owner", ColumnType::ForeignKey("users")).ddl(),
        "owner integer references users (id)"
    );
    assert_eq!(
        Column::new("body", ColumnType::CodeString(5000)).ddl(),
        "body varchar(5000)"
    );
    assert_eq!(
        Column::new("score", ColumnType::Float).ddl(),
        "score float"
    );
    assert_eq!(
        Column::new("seen", ColumnType::DateTime).ddl(),
        "seen timestamp"
    );
}

#[test]
fn defaults_are_fixed_at_construction() {
    let column = Column::new("age", ColumnType::Integer)
        .required(false)
        .default_value(0);
    assert_eq!(column.default, Some(Value::from(0)));
    let column = Column::new("name", ColumnType::String(50));
    assert!(column.required && column.default.is_none() && !column.unique);
}
