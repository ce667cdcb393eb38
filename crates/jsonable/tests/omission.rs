use jsonable::{decode_as, to_jsonable, Jsonable, Omittable};
use pretty_assertions::assert_eq;
use serde_json::json;

#[derive(Debug, PartialEq, Jsonable)]
struct Foo {
    field1: Omittable<i64>,
    field2: Omittable<String>,
    field3: Omittable<bool>,
}

#[derive(Debug, PartialEq, Jsonable)]
#[jsonable(rename_all = "camelCase")]
struct Profile {
    display_name: String,
    #[jsonable(default)]
    login_count: u32,
    #[jsonable(default = "default_theme")]
    theme: String,
    #[jsonable(rename = "e-mail")]
    email: Option<String>,
    #[jsonable(skip)]
    session_token: String,
}

fn default_theme() -> String {
    "light".to_string()
}

#[test]
fn omitted_fields_leave_no_key() {
    let foo = Foo {
        field1: Omittable::Omitted,
        field2: Omittable::Omitted,
        field3: Omittable::Present(false),
    };
    assert_eq!(
        to_jsonable(&foo).unwrap(),
        Jsonable::from(json!({"field3": false}))
    );
}

#[test]
fn absent_keys_decode_as_omitted() {
    let foo: Foo = decode_as(Jsonable::from(json!({"field2": "x"}))).unwrap();
    assert_eq!(
        foo,
        Foo {
            field1: Omittable::Omitted,
            field2: Omittable::Present("x".to_string()),
            field3: Omittable::Omitted,
        }
    );
}

#[test]
fn null_is_not_an_omission() {
    assert!(decode_as::<Foo>(Jsonable::from(json!({"field1": null}))).is_err());
}

#[test]
fn defaults_fill_missing_fields() {
    let profile: Profile = decode_as(Jsonable::from(json!({"displayName": "ada"}))).unwrap();
    assert_eq!(
        profile,
        Profile {
            display_name: "ada".to_string(),
            login_count: 0,
            theme: "light".to_string(),
            email: None,
            session_token: String::new(),
        }
    );
}

#[test]
fn renamed_fields_are_used_on_the_wire() {
    let profile = Profile {
        display_name: "ada".to_string(),
        login_count: 3,
        theme: "dark".to_string(),
        email: Some("ada@example.com".to_string()),
        session_token: "secret".to_string(),
    };
    assert_eq!(
        to_jsonable(&profile).unwrap(),
        Jsonable::from(json!({
            "displayName": "ada",
            "loginCount": 3,
            "theme": "dark",
            "e-mail": "ada@example.com"
        }))
    );
}

#[test]
fn missing_required_field_is_fatal() {
    assert!(decode_as::<Profile>(Jsonable::from(json!({"loginCount": 1}))).is_err());
}
