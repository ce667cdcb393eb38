//! Value-driven encoding into [`Jsonable`].
//!
//! No descriptor is consulted here: every type encodes itself, and containers
//! recurse into their elements. Errors pick up path segments on the way out.

use std::any::type_name;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

use crate::{temporal, Jsonable, JsonableMap, NonJsonableValueError, Omittable};

/// A runtime value that can project itself into the jsonable model.
pub trait ToJsonable {
    fn to_jsonable(&self) -> Result<Jsonable, NonJsonableValueError>;

    /// Whether a record field holding this value is left out of the encoded map.
    fn is_omitted(&self) -> bool {
        false
    }
}

/// Encodes one record field into `map`, skipping omitted values.
pub fn encode_field<T: ToJsonable + ?Sized>(
    map: &mut JsonableMap,
    name: &'static str,
    value: &T,
) -> Result<(), NonJsonableValueError> {
    if value.is_omitted() {
        return Ok(());
    }
    let encoded = value
        .to_jsonable()
        .map_err(|err| err.with_path_prefix(name))?;
    map.insert(Jsonable::from(name), encoded);
    Ok(())
}

fn encode_seq<'a, T: ToJsonable + 'a>(
    items: impl IntoIterator<Item = &'a T>,
) -> Result<Jsonable, NonJsonableValueError> {
    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            item.to_jsonable()
                .map_err(|err| err.with_path_prefix(idx.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Jsonable::List)
}

fn encode_entries<'a, K: ToJsonable + 'a, V: ToJsonable + 'a>(
    entries: impl IntoIterator<Item = (&'a K, &'a V)>,
) -> Result<Jsonable, NonJsonableValueError> {
    let mut map = JsonableMap::new();
    for (key, value) in entries {
        let key = key
            .to_jsonable()
            .map_err(|err| err.with_path_prefix("<key>"))?;
        let value = value
            .to_jsonable()
            .map_err(|err| err.with_path_prefix(key_segment(&key)))?;
        map.insert(key, value);
    }
    Ok(Jsonable::Map(map))
}

pub(crate) fn key_segment(key: &Jsonable) -> String {
    match key.as_str() {
        Some(text) => text.to_string(),
        None => key.to_string(),
    }
}

impl ToJsonable for () {
    fn to_jsonable(&self) -> Result<Jsonable, NonJsonableValueError> {
        Ok(Jsonable::Null)
    }
}

impl ToJsonable for bool {
    fn to_jsonable(&self) -> Result<Jsonable, NonJsonableValueError> {
        Ok(Jsonable::Bool(*self))
    }
}

macro_rules! impl_to_jsonable_int {
    ($($ty:ty),*) => {
        $(
            impl ToJsonable for $ty {
                fn to_jsonable(&self) -> Result<Jsonable, NonJsonableValueError> {
                    Ok(Jsonable::from(*self))
                }
            }
        )*
    };
}

impl_to_jsonable_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! impl_to_jsonable_wide_int {
    ($($ty:ty => $narrow:ty),*) => {
        $(
            impl ToJsonable for $ty {
                fn to_jsonable(&self) -> Result<Jsonable, NonJsonableValueError> {
                    <$narrow>::try_from(*self).map(Jsonable::from).map_err(|_| {
                        NonJsonableValueError::new(
                            type_name::<$ty>(),
                            self,
                            "integer is outside the 64-bit range",
                        )
                    })
                }
            }
        )*
    };
}

impl_to_jsonable_wide_int!(i128 => i64, u128 => u64);

macro_rules! impl_to_jsonable_float {
    ($($ty:ty),*) => {
        $(
            impl ToJsonable for $ty {
                fn to_jsonable(&self) -> Result<Jsonable, NonJsonableValueError> {
                    Jsonable::float(f64::from(*self)).ok_or_else(|| {
                        NonJsonableValueError::new(type_name::<$ty>(), self, "non-finite float")
                    })
                }
            }
        )*
    };
}

impl_to_jsonable_float!(f32, f64);

impl ToJsonable for str {
    fn to_jsonable(&self) -> Result<Jsonable, NonJsonableValueError> {
        Ok(Jsonable::from(self))
    }
}

impl ToJsonable for String {
    fn to_jsonable(&self) -> Result<Jsonable, NonJsonableValueError> {
        Ok(Jsonable::from(self.as_str()))
    }
}

impl ToJsonable for char {
    fn to_jsonable(&self) -> Result<Jsonable, NonJsonableValueError> {
        Ok(Jsonable::String(self.to_string()))
    }
}

macro_rules! impl_to_jsonable_temporal {
    ($($ty:ty => $format:path),*) => {
        $(
            impl ToJsonable for $ty {
                fn to_jsonable(&self) -> Result<Jsonable, NonJsonableValueError> {
                    $format(*self).map(Jsonable::String).ok_or_else(|| {
                        NonJsonableValueError::new(
                            type_name::<$ty>(),
                            self,
                            "year is outside 1..=9999",
                        )
                    })
                }
            }
        )*
    };
}

impl_to_jsonable_temporal!(
    Date => temporal::format_date,
    PrimitiveDateTime => temporal::format_datetime,
    OffsetDateTime => temporal::format_offset_datetime
);

impl<T: ToJsonable> ToJsonable for Option<T> {
    fn to_jsonable(&self) -> Result<Jsonable, NonJsonableValueError> {
        match self {
            Some(value) => value.to_jsonable(),
            None => Ok(Jsonable::Null),
        }
    }
}

impl<T: ToJsonable> ToJsonable for Omittable<T> {
    fn to_jsonable(&self) -> Result<Jsonable, NonJsonableValueError> {
        match self {
            Omittable::Present(value) => value.to_jsonable(),
            Omittable::Omitted => Err(NonJsonableValueError::new(
                type_name::<Self>(),
                format_args!("Omitted"),
                "the omission marker is only valid as a record field value",
            )),
        }
    }

    fn is_omitted(&self) -> bool {
        matches!(self, Omittable::Omitted)
    }
}

macro_rules! impl_to_jsonable_deref {
    ($($ty:ident),*) => {
        $(
            impl<T: ToJsonable + ?Sized> ToJsonable for $ty<T> {
                fn to_jsonable(&self) -> Result<Jsonable, NonJsonableValueError> {
                    (**self).to_jsonable()
                }

                fn is_omitted(&self) -> bool {
                    (**self).is_omitted()
                }
            }
        )*
    };
}

impl_to_jsonable_deref!(Box, Arc, Rc);

impl<T: ToJsonable + ?Sized> ToJsonable for &T {
    fn to_jsonable(&self) -> Result<Jsonable, NonJsonableValueError> {
        (**self).to_jsonable()
    }

    fn is_omitted(&self) -> bool {
        (**self).is_omitted()
    }
}

impl<T: ToJsonable> ToJsonable for [T] {
    fn to_jsonable(&self) -> Result<Jsonable, NonJsonableValueError> {
        encode_seq(self)
    }
}

impl<T: ToJsonable, const N: usize> ToJsonable for [T; N] {
    fn to_jsonable(&self) -> Result<Jsonable, NonJsonableValueError> {
        encode_seq(self)
    }
}

macro_rules! impl_to_jsonable_seq {
    ($($ty:ident),*) => {
        $(
            impl<T: ToJsonable> ToJsonable for $ty<T> {
                fn to_jsonable(&self) -> Result<Jsonable, NonJsonableValueError> {
                    encode_seq(self)
                }
            }
        )*
    };
}

impl_to_jsonable_seq!(Vec, VecDeque, HashSet, BTreeSet);

macro_rules! impl_to_jsonable_map {
    ($($ty:ident),*) => {
        $(
            impl<K: ToJsonable, V: ToJsonable> ToJsonable for $ty<K, V> {
                fn to_jsonable(&self) -> Result<Jsonable, NonJsonableValueError> {
                    encode_entries(self)
                }
            }
        )*
    };
}

impl_to_jsonable_map!(HashMap, BTreeMap, IndexMap);

impl ToJsonable for Jsonable {
    fn to_jsonable(&self) -> Result<Jsonable, NonJsonableValueError> {
        Ok(self.clone())
    }
}

impl ToJsonable for serde_json::Value {
    fn to_jsonable(&self) -> Result<Jsonable, NonJsonableValueError> {
        Ok(Jsonable::from(self.clone()))
    }
}
