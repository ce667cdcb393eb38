//! Descriptor-guided decoding from [`Jsonable`].
//!
//! [`decode_value`] is the single recursive entry point. It bounds nesting depth and
//! routes `null` to [`FromJsonable::decode_null`]; everything else goes to the
//! target's [`FromJsonable::decode`]. The helpers at the bottom of this module
//! (records, enums, unions) are what `#[derive(Jsonable)]` expands into.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt::Display;
use std::hash::Hash;
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

use crate::descriptor::{DescriptorKind, FieldDescriptor, Link, TypeDescriptor};
use crate::encode::key_segment;
use crate::{temporal, DecodeError, Jsonable, Omittable, Reflect};

/// Policy for record keys the target type does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFields {
    #[default]
    Ignore,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    pub unknown_fields: UnknownFields,
    /// Maximum nesting of decoded values, counting the root.
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            unknown_fields: UnknownFields::Ignore,
            max_depth: 128,
        }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unknown_fields(mut self, unknown_fields: UnknownFields) -> Self {
        self.unknown_fields = unknown_fields;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Per-call decoding state: options, the current path and the nesting depth.
#[derive(Debug)]
pub struct DecodeContext<'a> {
    options: &'a DecodeOptions,
    path: Vec<String>,
    depth: usize,
}

impl<'a> DecodeContext<'a> {
    pub fn new(options: &'a DecodeOptions) -> Self {
        Self {
            options,
            path: Vec::new(),
            depth: 0,
        }
    }

    pub fn options(&self) -> &DecodeOptions {
        self.options
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Runs `f` with `segment` appended to the path.
    pub fn at<R>(&mut self, segment: impl Into<String>, f: impl FnOnce(&mut Self) -> R) -> R {
        self.path.push(segment.into());
        let result = f(self);
        self.path.pop();
        result
    }

    pub fn error(
        &self,
        expected: &'static str,
        got: Option<Jsonable>,
        message: impl Into<String>,
    ) -> DecodeError {
        DecodeError::new(self.path.clone(), expected, got, message)
    }

    /// The input's shape does not fit `descriptor`.
    pub fn mismatch(&self, descriptor: &TypeDescriptor, got: Jsonable) -> DecodeError {
        let message = format!(
            "cannot decode {} into `{}`",
            got.kind_name(),
            descriptor.type_name()
        );
        self.error(descriptor.kind().name(), Some(got), message)
    }

    pub fn resolve(&self, link: &Link) -> Result<&'static TypeDescriptor, DecodeError> {
        link.resolve()
            .map_err(|err| self.error(link.target().name(), None, err.to_string()))
    }

    fn wrong_descriptor(&self, descriptor: &TypeDescriptor, wanted: &str) -> DecodeError {
        self.error(
            descriptor.kind().name(),
            None,
            format!("`{}` is not described as {wanted}", descriptor.type_name()),
        )
    }
}

/// A static type that can be rebuilt from a jsonable value under its descriptor.
pub trait FromJsonable: Reflect + Sized {
    /// Decodes a non-null value. `descriptor` is the resolved descriptor of `Self`.
    fn decode(
        descriptor: &'static TypeDescriptor,
        value: Jsonable,
        cx: &mut DecodeContext<'_>,
    ) -> Result<Self, DecodeError>;

    fn decode_null(
        descriptor: &'static TypeDescriptor,
        cx: &mut DecodeContext<'_>,
    ) -> Result<Self, DecodeError> {
        Err(cx.error(
            descriptor.kind().name(),
            Some(Jsonable::Null),
            format!("`{}` does not accept null", descriptor.type_name()),
        ))
    }

    /// Value used when a record field of this type is missing from the input.
    fn decode_absent() -> Option<Self> {
        None
    }
}

pub fn decode_value<T: FromJsonable>(
    descriptor: &'static TypeDescriptor,
    value: Jsonable,
    cx: &mut DecodeContext<'_>,
) -> Result<T, DecodeError> {
    if cx.depth >= cx.options.max_depth {
        let message = format!("nesting exceeds the maximum depth of {}", cx.options.max_depth);
        return Err(cx.error(descriptor.kind().name(), Some(value), message));
    }

    cx.depth += 1;
    let result = match value {
        Jsonable::Null => T::decode_null(descriptor, cx),
        value => T::decode(descriptor, value, cx),
    };
    cx.depth -= 1;
    result
}

impl FromJsonable for () {
    fn decode(
        descriptor: &'static TypeDescriptor,
        value: Jsonable,
        cx: &mut DecodeContext<'_>,
    ) -> Result<Self, DecodeError> {
        Err(cx.mismatch(descriptor, value))
    }

    fn decode_null(
        _descriptor: &'static TypeDescriptor,
        _cx: &mut DecodeContext<'_>,
    ) -> Result<Self, DecodeError> {
        Ok(())
    }
}

impl FromJsonable for bool {
    fn decode(
        descriptor: &'static TypeDescriptor,
        value: Jsonable,
        cx: &mut DecodeContext<'_>,
    ) -> Result<Self, DecodeError> {
        value.as_bool().ok_or_else(|| cx.mismatch(descriptor, value))
    }
}

macro_rules! impl_from_jsonable_int {
    ($($ty:ty => $as:ident),*) => {
        $(
            impl FromJsonable for $ty {
                fn decode(
                    descriptor: &'static TypeDescriptor,
                    value: Jsonable,
                    cx: &mut DecodeContext<'_>,
                ) -> Result<Self, DecodeError> {
                    value
                        .as_number()
                        .and_then(Number::$as)
                        .and_then(|number| <$ty>::try_from(number).ok())
                        .ok_or_else(|| cx.mismatch(descriptor, value))
                }
            }
        )*
    };
}

impl_from_jsonable_int!(
    i8 => as_i64, i16 => as_i64, i32 => as_i64, i64 => as_i64, i128 => as_i64, isize => as_i64,
    u8 => as_u64, u16 => as_u64, u32 => as_u64, u64 => as_u64, u128 => as_u64, usize => as_u64
);

impl FromJsonable for f64 {
    fn decode(
        descriptor: &'static TypeDescriptor,
        value: Jsonable,
        cx: &mut DecodeContext<'_>,
    ) -> Result<Self, DecodeError> {
        value
            .as_number()
            .and_then(Number::as_f64)
            .ok_or_else(|| cx.mismatch(descriptor, value))
    }
}

impl FromJsonable for f32 {
    fn decode(
        descriptor: &'static TypeDescriptor,
        value: Jsonable,
        cx: &mut DecodeContext<'_>,
    ) -> Result<Self, DecodeError> {
        value
            .as_number()
            .and_then(Number::as_f64)
            .map(|number| number as f32)
            .filter(|number| number.is_finite())
            .ok_or_else(|| cx.mismatch(descriptor, value))
    }
}

impl FromJsonable for String {
    fn decode(
        descriptor: &'static TypeDescriptor,
        value: Jsonable,
        cx: &mut DecodeContext<'_>,
    ) -> Result<Self, DecodeError> {
        match value {
            Jsonable::String(text) => Ok(text),
            other => Err(cx.mismatch(descriptor, other)),
        }
    }
}

impl FromJsonable for char {
    fn decode(
        descriptor: &'static TypeDescriptor,
        value: Jsonable,
        cx: &mut DecodeContext<'_>,
    ) -> Result<Self, DecodeError> {
        let mut chars = value.as_str().unwrap_or_default().chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Ok(ch),
            _ => Err(cx.mismatch(descriptor, value)),
        }
    }
}

fn decode_temporal<T, E: Display>(
    descriptor: &'static TypeDescriptor,
    value: Jsonable,
    cx: &DecodeContext<'_>,
    parse: fn(&str) -> Result<T, E>,
) -> Result<T, DecodeError> {
    match value {
        Jsonable::String(text) => parse(&text).map_err(|err| {
            cx.error(
                descriptor.kind().name(),
                Some(Jsonable::String(text.clone())),
                format!("invalid ISO-8601 value: {err}"),
            )
        }),
        other => Err(cx.mismatch(descriptor, other)),
    }
}

macro_rules! impl_from_jsonable_temporal {
    ($($ty:ty => $parse:path),*) => {
        $(
            impl FromJsonable for $ty {
                fn decode(
                    descriptor: &'static TypeDescriptor,
                    value: Jsonable,
                    cx: &mut DecodeContext<'_>,
                ) -> Result<Self, DecodeError> {
                    decode_temporal(descriptor, value, cx, $parse)
                }
            }
        )*
    };
}

impl_from_jsonable_temporal!(
    Date => temporal::parse_date,
    PrimitiveDateTime => temporal::parse_datetime,
    OffsetDateTime => temporal::parse_offset_datetime
);

impl<T: FromJsonable> FromJsonable for Option<T> {
    fn decode(
        descriptor: &'static TypeDescriptor,
        value: Jsonable,
        cx: &mut DecodeContext<'_>,
    ) -> Result<Self, DecodeError> {
        T::decode(descriptor, value, cx).map(Some)
    }

    fn decode_null(
        _descriptor: &'static TypeDescriptor,
        _cx: &mut DecodeContext<'_>,
    ) -> Result<Self, DecodeError> {
        Ok(None)
    }

    fn decode_absent() -> Option<Self> {
        Some(None)
    }
}

impl<T: FromJsonable> FromJsonable for Omittable<T> {
    fn decode(
        descriptor: &'static TypeDescriptor,
        value: Jsonable,
        cx: &mut DecodeContext<'_>,
    ) -> Result<Self, DecodeError> {
        T::decode(descriptor, value, cx).map(Omittable::Present)
    }

    fn decode_null(
        descriptor: &'static TypeDescriptor,
        cx: &mut DecodeContext<'_>,
    ) -> Result<Self, DecodeError> {
        T::decode_null(descriptor, cx).map(Omittable::Present)
    }

    fn decode_absent() -> Option<Self> {
        Some(Omittable::Omitted)
    }
}

macro_rules! impl_from_jsonable_pointer {
    ($($ty:ident),*) => {
        $(
            impl<T: FromJsonable> FromJsonable for $ty<T> {
                fn decode(
                    descriptor: &'static TypeDescriptor,
                    value: Jsonable,
                    cx: &mut DecodeContext<'_>,
                ) -> Result<Self, DecodeError> {
                    T::decode(descriptor, value, cx).map($ty::new)
                }

                fn decode_null(
                    descriptor: &'static TypeDescriptor,
                    cx: &mut DecodeContext<'_>,
                ) -> Result<Self, DecodeError> {
                    T::decode_null(descriptor, cx).map($ty::new)
                }

                fn decode_absent() -> Option<Self> {
                    T::decode_absent().map($ty::new)
                }
            }
        )*
    };
}

impl_from_jsonable_pointer!(Box, Arc, Rc);

/// Decodes a list value element-wise against the `ListOf` element descriptor.
pub fn decode_items<T: FromJsonable>(
    descriptor: &'static TypeDescriptor,
    value: Jsonable,
    cx: &mut DecodeContext<'_>,
) -> Result<Vec<T>, DecodeError> {
    let DescriptorKind::ListOf(elem) = descriptor.kind() else {
        return Err(cx.wrong_descriptor(descriptor, "a list"));
    };
    let items = match value {
        Jsonable::List(items) => items,
        other => return Err(cx.mismatch(descriptor, other)),
    };

    let elem = cx.resolve(elem)?;
    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| cx.at(idx.to_string(), |cx| decode_value(elem, item, cx)))
        .collect()
}

/// Decodes a map value entry by entry against the `MapOf` key and value
/// descriptors. String keys are first parsed for number, bool and enum keys.
pub fn decode_entries<K: FromJsonable, V: FromJsonable>(
    descriptor: &'static TypeDescriptor,
    value: Jsonable,
    cx: &mut DecodeContext<'_>,
) -> Result<Vec<(K, V)>, DecodeError> {
    let DescriptorKind::MapOf { key, value: item } = descriptor.kind() else {
        return Err(cx.wrong_descriptor(descriptor, "a map"));
    };
    let entries = match value {
        Jsonable::Map(entries) => entries,
        other => return Err(cx.mismatch(descriptor, other)),
    };

    let key_descriptor = cx.resolve(key)?;
    let item_descriptor = cx.resolve(item)?;
    entries
        .into_iter()
        .map(|(key, item)| {
            cx.at(key_segment(&key), |cx| -> Result<(K, V), DecodeError> {
                let key = decode_value(key_descriptor, coerce_key(key_descriptor, key), cx)?;
                let item = decode_value(item_descriptor, item, cx)?;
                Ok((key, item))
            })
        })
        .collect()
}

fn coerce_key(descriptor: &TypeDescriptor, key: Jsonable) -> Jsonable {
    let Jsonable::String(text) = &key else {
        return key;
    };
    let coerced = match descriptor.kind() {
        DescriptorKind::Int => text
            .parse::<i64>()
            .map(Jsonable::from)
            .or_else(|_| text.parse::<u64>().map(Jsonable::from))
            .ok(),
        DescriptorKind::Float => text.parse::<f64>().ok().and_then(Jsonable::float),
        DescriptorKind::Bool => text.parse::<bool>().ok().map(Jsonable::Bool),
        DescriptorKind::EnumOf(members) => members
            .iter()
            .find(|member| member.value.as_str().is_none() && member.value.to_string() == *text)
            .map(|member| member.value.clone()),
        _ => None,
    };
    if coerced.is_none() && text == "null" && null_key_text(descriptor) {
        return Jsonable::Null;
    }
    coerced.unwrap_or(key)
}

/// Whether a `"null"` key text stands for a null key rather than a literal string.
fn null_key_text(descriptor: &TypeDescriptor) -> bool {
    match descriptor.kind() {
        DescriptorKind::Str => false,
        DescriptorKind::EnumOf(members) => !members
            .iter()
            .any(|member| member.value.as_str() == Some("null")),
        _ => true,
    }
}

macro_rules! impl_from_jsonable_seq {
    ($($ty:ident $(: $bound:path)?),*) => {
        $(
            impl<T: FromJsonable $(+ $bound)?> FromJsonable for $ty<T> {
                fn decode(
                    descriptor: &'static TypeDescriptor,
                    value: Jsonable,
                    cx: &mut DecodeContext<'_>,
                ) -> Result<Self, DecodeError> {
                    decode_items(descriptor, value, cx).map(|items| items.into_iter().collect())
                }
            }
        )*
    };
}

impl_from_jsonable_seq!(Vec, VecDeque, BTreeSet: Ord);

impl<T: FromJsonable + Eq + Hash> FromJsonable for HashSet<T> {
    fn decode(
        descriptor: &'static TypeDescriptor,
        value: Jsonable,
        cx: &mut DecodeContext<'_>,
    ) -> Result<Self, DecodeError> {
        decode_items(descriptor, value, cx).map(|items| items.into_iter().collect())
    }
}

impl<K: FromJsonable + Ord, V: FromJsonable> FromJsonable for BTreeMap<K, V> {
    fn decode(
        descriptor: &'static TypeDescriptor,
        value: Jsonable,
        cx: &mut DecodeContext<'_>,
    ) -> Result<Self, DecodeError> {
        decode_entries(descriptor, value, cx).map(|entries| entries.into_iter().collect())
    }
}

macro_rules! impl_from_jsonable_hash_map {
    ($($ty:ident),*) => {
        $(
            impl<K: FromJsonable + Eq + Hash, V: FromJsonable> FromJsonable for $ty<K, V> {
                fn decode(
                    descriptor: &'static TypeDescriptor,
                    value: Jsonable,
                    cx: &mut DecodeContext<'_>,
                ) -> Result<Self, DecodeError> {
                    decode_entries(descriptor, value, cx)
                        .map(|entries| entries.into_iter().collect())
                }
            }
        )*
    };
}

impl_from_jsonable_hash_map!(HashMap, IndexMap);

/// The declared fields of a record input, ready to be pulled out one by one.
#[derive(Debug)]
pub struct RecordInput {
    descriptor: &'static TypeDescriptor,
    fields: &'static IndexMap<&'static str, FieldDescriptor>,
    entries: IndexMap<String, Jsonable>,
}

impl RecordInput {
    /// Checks that `value` is a map and sorts its keys into declared and unknown
    /// ones, applying [`DecodeOptions::unknown_fields`] to the latter.
    pub fn new(
        descriptor: &'static TypeDescriptor,
        value: Jsonable,
        cx: &mut DecodeContext<'_>,
    ) -> Result<Self, DecodeError> {
        let Some(fields) = descriptor.fields() else {
            return Err(cx.wrong_descriptor(descriptor, "a record"));
        };
        let map = match value {
            Jsonable::Map(map) => map,
            other => return Err(cx.mismatch(descriptor, other)),
        };

        let mut entries = IndexMap::with_capacity(map.len());
        for (key, item) in map {
            match key {
                Jsonable::String(name) if fields.contains_key(name.as_str()) => {
                    entries.insert(name, item);
                }
                unknown => match cx.options().unknown_fields {
                    UnknownFields::Ignore => {
                        tracing::trace!(
                            type_name = descriptor.type_name(),
                            key = %unknown,
                            "ignoring unknown record key"
                        );
                    }
                    UnknownFields::Deny => {
                        let message = format!("`{}` declares no such field", descriptor.type_name());
                        return Err(cx.at(key_segment(&unknown), |cx| {
                            cx.error(descriptor.kind().name(), Some(unknown), message)
                        }));
                    }
                },
            }
        }

        Ok(Self {
            descriptor,
            fields,
            entries,
        })
    }

    /// Decodes field `name`. A missing field falls back to the field type's absent
    /// value (`None`, `Omitted`) and is an error otherwise.
    pub fn field<T: FromJsonable>(
        &mut self,
        name: &'static str,
        cx: &mut DecodeContext<'_>,
    ) -> Result<T, DecodeError> {
        self.take(name, cx, T::decode_absent)
    }

    /// Decodes field `name`, using `default` when it is missing.
    pub fn field_or_else<T: FromJsonable>(
        &mut self,
        name: &'static str,
        cx: &mut DecodeContext<'_>,
        default: impl FnOnce() -> T,
    ) -> Result<T, DecodeError> {
        self.take(name, cx, || Some(default()))
    }

    fn take<T: FromJsonable>(
        &mut self,
        name: &'static str,
        cx: &mut DecodeContext<'_>,
        absent: impl FnOnce() -> Option<T>,
    ) -> Result<T, DecodeError> {
        let Some(field) = self.fields.get(name) else {
            let message = format!("`{}` declares no field `{name}`", self.descriptor.type_name());
            return Err(cx.error(self.descriptor.kind().name(), None, message));
        };
        let field_descriptor = cx.resolve(&field.ty)?;

        match self.entries.shift_remove(name) {
            Some(value) => cx.at(name, |cx| decode_value(field_descriptor, value, cx)),
            None => absent().ok_or_else(|| {
                cx.at(name, |cx| {
                    cx.error(
                        field_descriptor.kind().name(),
                        None,
                        "missing required field",
                    )
                })
            }),
        }
    }
}

/// Returns the name of the enum member whose value equals `value`.
pub fn enum_member(
    descriptor: &'static TypeDescriptor,
    value: Jsonable,
    cx: &mut DecodeContext<'_>,
) -> Result<&'static str, DecodeError> {
    let DescriptorKind::EnumOf(members) = descriptor.kind() else {
        return Err(cx.wrong_descriptor(descriptor, "an enum"));
    };
    match members.iter().find(|member| member.value == value) {
        Some(member) => Ok(member.name),
        None => {
            let message = format!("no member of `{}` has this value", descriptor.type_name());
            Err(cx.error(descriptor.kind().name(), Some(value), message))
        }
    }
}

/// Best-effort union matching.
///
/// Alternatives are tried in declaration order and the first successful decode
/// wins. A record alternative is only attempted when the input is a map whose keys
/// are all declared fields and which holds every required field. An alternative that
/// resolves to the union itself is never attempted. `attempt`
/// receives the alternative's index and descriptor and does the typed decode.
pub fn decode_union<T>(
    descriptor: &'static TypeDescriptor,
    value: Jsonable,
    cx: &mut DecodeContext<'_>,
    mut attempt: impl FnMut(
        usize,
        &'static TypeDescriptor,
        Jsonable,
        &mut DecodeContext<'_>,
    ) -> Result<T, DecodeError>,
) -> Result<T, DecodeError> {
    let DescriptorKind::UnionOf(alternatives) = descriptor.kind() else {
        return Err(cx.wrong_descriptor(descriptor, "a union"));
    };

    let mut last_error = None;
    for (idx, link) in alternatives.iter().enumerate() {
        let alternative = cx.resolve(link)?;
        if std::ptr::eq(alternative, descriptor) {
            tracing::trace!(
                union = descriptor.type_name(),
                "skipping alternative that wraps the union itself"
            );
            continue;
        }
        if let Some(fields) = alternative.fields() {
            if !record_plausible(fields, &value) {
                tracing::trace!(
                    union = descriptor.type_name(),
                    alternative = alternative.type_name(),
                    "skipping implausible record alternative"
                );
                continue;
            }
        }

        match attempt(idx, alternative, value.clone(), cx) {
            Ok(decoded) => {
                tracing::debug!(
                    union = descriptor.type_name(),
                    alternative = alternative.type_name(),
                    "selected union alternative"
                );
                return Ok(decoded);
            }
            Err(err) => {
                tracing::trace!(
                    union = descriptor.type_name(),
                    alternative = alternative.type_name(),
                    error = %err,
                    "union alternative rejected"
                );
                last_error = Some(err);
            }
        }
    }

    let message = format!("no alternative of `{}` matched", descriptor.type_name());
    Err(cx
        .error(descriptor.kind().name(), Some(value), message)
        .with_source(last_error))
}

fn record_plausible(fields: &IndexMap<&'static str, FieldDescriptor>, value: &Jsonable) -> bool {
    let Some(map) = value.as_map() else {
        return false;
    };
    let keys_declared = map
        .keys()
        .all(|key| key.as_str().is_some_and(|name| fields.contains_key(name)));
    let required_present = fields
        .values()
        .filter(|field| field.required)
        .all(|field| map.contains_key(&Jsonable::from(field.name)));
    keys_declared && required_present
}
