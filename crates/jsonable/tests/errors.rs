use std::collections::HashMap;

use expect_test::expect;
use jsonable::{
    decode_as, from_jsonable_with, to_jsonable, DecodeOptions, Descriptor, Jsonable, Reflect,
    TypeExpr, UnknownFields,
};
use serde_json::json;
use time::PrimitiveDateTime;

#[derive(Debug, PartialEq, Jsonable)]
struct Precipitation {
    start: PrimitiveDateTime,
    end: PrimitiveDateTime,
}

#[derive(Debug, PartialEq, Jsonable)]
enum WindDirection {
    #[jsonable(value = "N")]
    North,
    #[jsonable(value = "S")]
    South,
}

#[derive(Debug, Jsonable)]
struct Samples {
    readings: Vec<f64>,
}

struct Opaque;

impl Reflect for Opaque {
    fn type_expr() -> TypeExpr {
        TypeExpr::Unconstrained("T")
    }
}

#[derive(Debug, Jsonable)]
enum Never {}

#[allow(dead_code)]
#[derive(Debug, Jsonable)]
enum Dup {
    #[jsonable(value = 1)]
    A,
    #[jsonable(value = 1)]
    B,
}

#[derive(Debug, Jsonable)]
struct Clash {
    #[jsonable(rename = "x")]
    a: i32,
    x: i32,
}

#[derive(Debug, Jsonable)]
struct BadKeys {
    lookup: HashMap<Vec<u8>, i32>,
}

#[test]
fn missing_required_field() {
    let err = decode_as::<Precipitation>(Jsonable::from(json!({"start": "2022-12-28T10:48:00"})))
        .unwrap_err();
    expect![[r#"missing required field (expected temporal, got <missing>) at end"#]]
        .assert_eq(&err.to_string());
}

#[test]
fn record_shape_mismatch() {
    let err = decode_as::<Precipitation>(Jsonable::from(json!([1]))).unwrap_err();
    expect![[r#"cannot decode list into `errors::Precipitation` (expected record, got [1]) at <root>"#]]
        .assert_eq(&err.to_string());
}

#[test]
fn unknown_enum_value() {
    let err = decode_as::<WindDirection>(Jsonable::from("Q")).unwrap_err();
    expect![[r#"no member of `errors::WindDirection` has this value (expected enum, got "Q") at <root>"#]]
        .assert_eq(&err.to_string());
}

#[test]
fn denied_unknown_field() {
    let options = DecodeOptions::new().with_unknown_fields(UnknownFields::Deny);
    let input = Jsonable::from(json!({
        "start": "2022-12-28T10:48:00",
        "end": "2022-12-28T12:48:00",
        "extra": 1
    }));

    let descriptor = Descriptor::<Precipitation>::new().unwrap();
    assert!(from_jsonable_with(descriptor, input.clone(), &DecodeOptions::default()).is_ok());

    let err = from_jsonable_with(descriptor, input, &options).unwrap_err();
    expect![[r#"`errors::Precipitation` declares no such field (expected record, got "extra") at extra"#]]
        .assert_eq(&err.to_string());
}

#[test]
fn invalid_nested_temporal() {
    let err = decode_as::<Vec<Precipitation>>(Jsonable::from(json!([
        {"start": "yesterday", "end": "2022-12-28T12:48:00"}
    ])))
    .unwrap_err();
    let rendered = err.to_string();
    assert!(rendered.starts_with("invalid ISO-8601 value"));
    assert!(rendered.ends_with(r#"(expected temporal, got "yesterday") at 0.start"#));
}

#[test]
fn non_finite_float_in_record() {
    let samples = Samples {
        readings: vec![1.0, f64::NAN],
    };
    let err = to_jsonable(&samples).unwrap_err();
    expect![[r#"failed to convert NaN of type f64 to a jsonable value: non-finite float at readings.1"#]]
        .assert_eq(&err.to_string());
}

#[test]
fn unconstrained_type_is_unsupported() {
    let err = Descriptor::<Opaque>::new().unwrap_err();
    expect![[r#"unsupported type `errors::Opaque`: generic parameter `T` has no shape to classify"#]]
        .assert_eq(&err.to_string());
}

#[test]
fn malformed_enums_are_unsupported() {
    let err = Descriptor::<Never>::new().unwrap_err();
    expect![[r#"unsupported type `errors::Never`: enum has no members"#]].assert_eq(&err.to_string());

    let err = Descriptor::<Dup>::new().unwrap_err();
    expect![[r#"unsupported type `errors::Dup`: member `B` repeats the value 1"#]]
        .assert_eq(&err.to_string());
}

#[test]
fn clashing_field_names_are_unsupported() {
    let err = Descriptor::<Clash>::new().unwrap_err();
    expect![[r#"unsupported type `errors::Clash`: field name `x` is declared twice"#]]
        .assert_eq(&err.to_string());
}

#[test]
fn composite_map_keys_fail_at_the_root() {
    let err = Descriptor::<BadKeys>::new().unwrap_err();
    assert!(err.type_name.contains("HashMap"));
    assert!(err.reason.contains("is not a scalar, enum or temporal"));

    let err = decode_as::<BadKeys>(Jsonable::from(json!({"lookup": {}}))).unwrap_err();
    assert!(matches!(err, jsonable::Error::UnsupportedType(_)));
}
