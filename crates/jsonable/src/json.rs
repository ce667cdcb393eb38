//! serde adapter: textual JSON in and out of [`Jsonable`].
//!
//! JSON objects only have string keys, so serializing a map stringifies its keys
//! (strings as-is, numbers and bools via their text, null as `"null"`). List and
//! map keys cannot be stringified and are rejected. Decoding undoes the
//! stringification for number, bool and null keys, see [`crate::decode::decode_entries`].

use std::borrow::Cow;

use serde::ser::{Error as _, SerializeMap};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{decode_as, Error, FromJsonable, Jsonable, JsonableMap, ToJsonable};

fn key_text(key: &Jsonable) -> Option<Cow<'_, str>> {
    match key {
        Jsonable::String(text) => Some(Cow::Borrowed(text.as_str())),
        Jsonable::Number(number) => Some(Cow::Owned(number.to_string())),
        Jsonable::Bool(value) => Some(Cow::Owned(value.to_string())),
        Jsonable::Null => Some(Cow::Borrowed("null")),
        Jsonable::List(_) | Jsonable::Map(_) => None,
    }
}

impl Serialize for Jsonable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Jsonable::Null => serializer.serialize_unit(),
            Jsonable::Bool(value) => serializer.serialize_bool(*value),
            Jsonable::Number(number) => number.serialize(serializer),
            Jsonable::String(text) => serializer.serialize_str(text),
            Jsonable::List(items) => serializer.collect_seq(items),
            Jsonable::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    let Some(text) = key_text(key) else {
                        return Err(S::Error::custom(format!(
                            "map key {key} has no JSON object key form"
                        )));
                    };
                    out.serialize_entry(text.as_ref(), value)?;
                }
                out.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Jsonable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Jsonable::from)
    }
}

impl From<serde_json::Value> for Jsonable {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Jsonable::Null,
            serde_json::Value::Bool(value) => Jsonable::Bool(value),
            serde_json::Value::Number(number) => Jsonable::Number(number),
            serde_json::Value::String(text) => Jsonable::String(text),
            serde_json::Value::Array(items) => {
                Jsonable::List(items.into_iter().map(Jsonable::from).collect())
            }
            serde_json::Value::Object(object) => Jsonable::Map(
                object
                    .into_iter()
                    .map(|(key, value)| (Jsonable::String(key), Jsonable::from(value)))
                    .collect::<JsonableMap>(),
            ),
        }
    }
}

impl TryFrom<Jsonable> for serde_json::Value {
    type Error = serde_json::Error;

    fn try_from(value: Jsonable) -> Result<Self, Self::Error> {
        serde_json::to_value(&value)
    }
}

/// Encodes `value` and renders it as compact JSON text.
pub fn to_json_string<T: ToJsonable + ?Sized>(value: &T) -> Result<String, Error> {
    let jsonable = value.to_jsonable()?;
    Ok(serde_json::to_string(&jsonable)?)
}

/// Parses JSON text and decodes it as `T`.
pub fn from_json_str<T: FromJsonable>(text: &str) -> Result<T, Error> {
    let jsonable: Jsonable = serde_json::from_str(text)?;
    decode_as(jsonable)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn objects_become_string_keyed_maps() {
        let value = Jsonable::from(json!({"b": [1, null], "a": {"c": true}}));
        let keys: Vec<_> = value.as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec![Jsonable::from("b"), Jsonable::from("a")]);
        assert_eq!(
            value.get("b"),
            Some(&Jsonable::List(vec![1.into(), Jsonable::Null]))
        );
    }

    #[test]
    fn scalar_keys_are_stringified() {
        let mut map = JsonableMap::new();
        map.insert(1.into(), "one".into());
        map.insert(true.into(), "yes".into());
        map.insert(Jsonable::Null, "nothing".into());
        let value = serde_json::Value::try_from(Jsonable::Map(map)).unwrap();
        assert_eq!(value, json!({"1": "one", "true": "yes", "null": "nothing"}));
    }

    #[test]
    fn composite_keys_are_rejected() {
        let mut map = JsonableMap::new();
        map.insert(Jsonable::List(vec![1.into()]), 2.into());
        let err = serde_json::to_string(&Jsonable::Map(map)).unwrap_err();
        assert!(err.to_string().contains("has no JSON object key form"));
    }

    #[test]
    fn text_round_trip_restores_numeric_keys() {
        let mut scores = BTreeMap::new();
        scores.insert(3u32, 0.5);
        scores.insert(10u32, 1.25);

        let text = to_json_string(&scores).unwrap();
        assert_eq!(text, r#"{"3":0.5,"10":1.25}"#);
        assert_eq!(from_json_str::<BTreeMap<u32, f64>>(&text).unwrap(), scores);
    }

    #[test]
    fn text_round_trip_restores_null_keys() {
        let mut counts = BTreeMap::new();
        counts.insert(None, 1i64);
        counts.insert(Some(2u32), 2);

        let text = to_json_string(&counts).unwrap();
        assert_eq!(text, r#"{"null":1,"2":2}"#);
        assert_eq!(
            from_json_str::<BTreeMap<Option<u32>, i64>>(&text).unwrap(),
            counts
        );

        let labels = from_json_str::<BTreeMap<String, i64>>(r#"{"null":1}"#).unwrap();
        assert_eq!(labels.get("null"), Some(&1));
    }
}
