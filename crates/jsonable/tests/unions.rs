use jsonable::{decode_as, from_jsonable_list, to_jsonable, Descriptor, Error, Jsonable};
use pretty_assertions::assert_eq;
use serde_json::json;
use time::macros::datetime;
use time::PrimitiveDateTime;

#[derive(Debug, Clone, PartialEq, Jsonable)]
struct Extra1 {
    int_field: i64,
    str_field: String,
}

#[derive(Debug, Clone, PartialEq, Jsonable)]
struct Window {
    start: Option<PrimitiveDateTime>,
    end: Option<PrimitiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Jsonable)]
enum Reading {
    Window(Window),
    Extra(Extra1),
}

#[derive(Debug, Clone, PartialEq, Jsonable)]
struct Celsius {
    value: f64,
}

#[derive(Debug, Clone, PartialEq, Jsonable)]
struct Fahrenheit {
    value: f64,
}

#[derive(Debug, Clone, PartialEq, Jsonable)]
enum CelsiusFirst {
    Celsius(Celsius),
    Fahrenheit(Fahrenheit),
}

#[derive(Debug, Clone, PartialEq, Jsonable)]
enum FahrenheitFirst {
    Fahrenheit(Fahrenheit),
    Celsius(Celsius),
}

#[derive(Debug, Clone, PartialEq, Jsonable)]
enum Id {
    Number(i64),
    Name(String),
    Missing(()),
}

#[derive(Debug, Clone, PartialEq, Jsonable)]
enum Expr {
    Neg(Box<Expr>),
    Lit(i64),
}

#[test]
fn union_selects_alternative_by_field_set() {
    let descriptor = Descriptor::<Reading>::new().unwrap();
    let decoded = from_jsonable_list(
        descriptor,
        vec![
            Jsonable::from(json!({"end": null, "start": null})),
            Jsonable::from(json!({"int_field": 10, "str_field": "20"})),
        ],
    )
    .unwrap();

    assert_eq!(
        decoded,
        vec![
            Reading::Window(Window {
                start: None,
                end: None
            }),
            Reading::Extra(Extra1 {
                int_field: 10,
                str_field: "20".to_string()
            }),
        ]
    );
}

#[test]
fn partial_input_matches_optional_alternative() {
    let decoded: Reading =
        decode_as(Jsonable::from(json!({"start": "2022-12-28T10:48:00"}))).unwrap();
    assert_eq!(
        decoded,
        Reading::Window(Window {
            start: Some(datetime!(2022-12-28 10:48:00)),
            end: None
        })
    );
}

#[test]
fn ambiguous_input_resolves_in_declaration_order() {
    let input = Jsonable::from(json!({"value": 21.5}));

    let first: CelsiusFirst = decode_as(input.clone()).unwrap();
    assert_eq!(first, CelsiusFirst::Celsius(Celsius { value: 21.5 }));

    let first: FahrenheitFirst = decode_as(input).unwrap();
    assert_eq!(first, FahrenheitFirst::Fahrenheit(Fahrenheit { value: 21.5 }));
}

#[test]
fn scalar_alternatives_are_tried_in_order() {
    assert_eq!(decode_as::<Id>(Jsonable::from(7)).unwrap(), Id::Number(7));
    assert_eq!(
        decode_as::<Id>(Jsonable::from("seven")).unwrap(),
        Id::Name("seven".to_string())
    );
    assert_eq!(decode_as::<Id>(Jsonable::Null).unwrap(), Id::Missing(()));
}

#[test]
fn union_encodes_the_active_alternative() {
    let value = Reading::Extra(Extra1 {
        int_field: 1,
        str_field: "x".to_string(),
    });
    assert_eq!(
        to_jsonable(&value).unwrap(),
        Jsonable::from(json!({"int_field": 1, "str_field": "x"}))
    );
}

#[test]
fn failed_union_keeps_the_last_attempt_as_source() {
    let err = decode_as::<Reading>(Jsonable::from(json!({"int_field": "ten", "str_field": "20"})))
        .unwrap_err();
    let err = match err {
        Error::Decode(err) => err,
        other => panic!("unexpected error: {other}"),
    };
    assert_eq!(err.expected, "union");
    assert!(err.message.starts_with("no alternative of"));

    let source = err.source.expect("record alternative was attempted");
    assert_eq!(source.path, vec!["int_field"]);
    assert_eq!(source.expected, "int");
}

#[test]
fn implausible_records_are_never_attempted() {
    let err = decode_as::<Reading>(Jsonable::from(json!({"unknown": 1}))).unwrap_err();
    let err = match err {
        Error::Decode(err) => err,
        other => panic!("unexpected error: {other}"),
    };
    assert!(err.source.is_none());
}

#[test]
fn self_wrapping_alternatives_are_not_attempted() {
    let encoded = to_jsonable(&Expr::Lit(5)).unwrap();
    assert_eq!(encoded, Jsonable::from(5));
    assert_eq!(decode_as::<Expr>(encoded).unwrap(), Expr::Lit(5));

    let err = decode_as::<Expr>(Jsonable::from("five")).unwrap_err();
    let err = match err {
        Error::Decode(err) => err,
        other => panic!("unexpected error: {other}"),
    };
    assert_eq!(err.source.map(|source| source.expected), Some("int"));
}
