//! The universal jsonable value model.
//!
//! [`Jsonable`] is the only interchange type at the encode/decode boundary: the
//! encoder produces it, the decoder consumes it. It mirrors JSON except that map keys
//! are arbitrary jsonable values, since typed maps may be keyed by numbers or
//! temporals. Turning those keys into text is the job of a downstream codec (see
//! [`crate::json`]).

use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use serde_json::Number;

/// Insertion-ordered map used by [`Jsonable::Map`].
pub type JsonableMap = IndexMap<Jsonable, Jsonable>;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Jsonable {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<Jsonable>),
    Map(JsonableMap),
}

impl Jsonable {
    /// Builds a float number, rejecting NaN and infinities.
    pub fn float(value: f64) -> Option<Self> {
        Number::from_f64(value).map(Jsonable::Number)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Jsonable::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Jsonable::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Jsonable::Number(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Jsonable::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Jsonable]> {
        match self {
            Jsonable::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&JsonableMap> {
        match self {
            Jsonable::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a string key in a map value.
    pub fn get(&self, key: &str) -> Option<&Jsonable> {
        self.as_map()?
            .iter()
            .find_map(|(k, v)| (k.as_str() == Some(key)).then_some(v))
    }

    /// Short name of the value's shape, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Jsonable::Null => "null",
            Jsonable::Bool(_) => "bool",
            Jsonable::Number(_) => "number",
            Jsonable::String(_) => "string",
            Jsonable::List(_) => "list",
            Jsonable::Map(_) => "map",
        }
    }

    /// True for values that may serve as enum member values.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Jsonable::List(_) | Jsonable::Map(_))
    }
}

// IndexMap equality ignores order, so map hashing must too.
impl Hash for Jsonable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Jsonable::Null => {}
            Jsonable::Bool(value) => value.hash(state),
            Jsonable::Number(value) => value.hash(state),
            Jsonable::String(value) => value.hash(state),
            Jsonable::List(items) => items.hash(state),
            Jsonable::Map(map) => map.len().hash(state),
        }
    }
}

impl fmt::Display for Jsonable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Jsonable::Null => f.write_str("null"),
            Jsonable::Bool(value) => write!(f, "{value}"),
            Jsonable::Number(value) => write!(f, "{value}"),
            Jsonable::String(value) => write!(f, "{value:?}"),
            Jsonable::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Jsonable::Map(map) => {
                f.write_str("{")?;
                for (idx, (key, value)) in map.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Jsonable {
    fn from(value: bool) -> Self {
        Jsonable::Bool(value)
    }
}

impl From<Number> for Jsonable {
    fn from(value: Number) -> Self {
        Jsonable::Number(value)
    }
}

impl From<String> for Jsonable {
    fn from(value: String) -> Self {
        Jsonable::String(value)
    }
}

impl From<&str> for Jsonable {
    fn from(value: &str) -> Self {
        Jsonable::String(value.to_string())
    }
}

impl From<Vec<Jsonable>> for Jsonable {
    fn from(value: Vec<Jsonable>) -> Self {
        Jsonable::List(value)
    }
}

impl From<JsonableMap> for Jsonable {
    fn from(value: JsonableMap) -> Self {
        Jsonable::Map(value)
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Jsonable {
                fn from(value: $ty) -> Self {
                    Jsonable::Number(Number::from(value))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
