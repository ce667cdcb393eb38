//! jsonable - structural conversion between typed values and a universal value model
//!
//! Typed Rust values (records, enums, unions, lists, maps, temporals) are encoded
//! into [`Jsonable`] by inspecting the runtime value, and decoded back under the
//! guidance of a cached [`TypeDescriptor`].
//!
//! # Usage
//!
//! ```ignore
//! use jsonable::{Descriptor, Jsonable, Omittable};
//!
//! #[derive(Debug, PartialEq, Jsonable)]
//! struct Precipitation {
//!     start: Option<time::PrimitiveDateTime>,
//!     end: Option<time::PrimitiveDateTime>,
//!     #[jsonable(default)]
//!     note: Omittable<String>,
//! }
//!
//! let value = jsonable::to_jsonable(&precipitation)?;
//! let back = jsonable::from_jsonable(Descriptor::<Precipitation>::new()?, value)?;
//! ```

extern crate self as jsonable;

pub mod decode;
pub mod descriptor;
pub mod encode;
mod error;
pub mod json;
mod omit;
pub mod reflect;
pub mod registry;
pub mod temporal;
mod value;

pub use decode::{DecodeContext, DecodeOptions, FromJsonable, UnknownFields};
pub use descriptor::{Descriptor, DescriptorKind, EnumMember, FieldDescriptor, TypeDescriptor};
pub use encode::ToJsonable;
pub use error::{DecodeError, Error, NonJsonableValueError, UnsupportedTypeError};
pub use json::{from_json_str, to_json_string};
pub use omit::Omittable;
pub use reflect::{Reflect, TemporalKind, TypeExpr, TypeRef};
pub use value::{Jsonable, JsonableMap};

// Re-export the derive macro
#[cfg(feature = "derive")]
pub use jsonable_derive::Jsonable;

/// Encodes a single value.
pub fn to_jsonable<T: ToJsonable + ?Sized>(value: &T) -> Result<Jsonable, Error> {
    Ok(value.to_jsonable()?)
}

/// Encodes each element of `values`, preserving order.
pub fn to_jsonable_list<T: ToJsonable>(values: &[T]) -> Result<Vec<Jsonable>, Error> {
    values
        .iter()
        .enumerate()
        .map(|(idx, value)| {
            value
                .to_jsonable()
                .map_err(|err| Error::from(err.with_path_prefix(idx.to_string())))
        })
        .collect()
}

/// Decodes a single value as `T` with the default [`DecodeOptions`].
pub fn from_jsonable<T: FromJsonable>(descriptor: Descriptor<T>, value: Jsonable) -> Result<T, Error> {
    from_jsonable_with(descriptor, value, &DecodeOptions::default())
}

#[tracing::instrument(level = "trace", skip_all)]
pub fn from_jsonable_with<T: FromJsonable>(
    descriptor: Descriptor<T>,
    value: Jsonable,
    options: &DecodeOptions,
) -> Result<T, Error> {
    let mut cx = DecodeContext::new(options);
    Ok(decode::decode_value(descriptor.raw(), value, &mut cx)?)
}

/// Decodes each element of `values` as `T` with the default [`DecodeOptions`].
pub fn from_jsonable_list<T: FromJsonable>(
    descriptor: Descriptor<T>,
    values: Vec<Jsonable>,
) -> Result<Vec<T>, Error> {
    from_jsonable_list_with(descriptor, values, &DecodeOptions::default())
}

/// Decodes each element of `values` as `T`. Errors are located by list index.
#[tracing::instrument(level = "trace", skip_all, fields(len = values.len()))]
pub fn from_jsonable_list_with<T: FromJsonable>(
    descriptor: Descriptor<T>,
    values: Vec<Jsonable>,
    options: &DecodeOptions,
) -> Result<Vec<T>, Error> {
    let mut cx = DecodeContext::new(options);
    values
        .into_iter()
        .enumerate()
        .map(|(idx, value)| {
            cx.at(idx.to_string(), |cx| {
                decode::decode_value(descriptor.raw(), value, cx).map_err(Error::from)
            })
        })
        .collect()
}

/// Builds the descriptor of `T` and decodes `value` with default options.
pub fn decode_as<T: FromJsonable>(value: Jsonable) -> Result<T, Error> {
    from_jsonable(Descriptor::<T>::new()?, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_operations_mirror_single_ones() {
        let encoded = to_jsonable_list(&[1.5, 2.0]).unwrap();
        assert_eq!(
            encoded,
            vec![to_jsonable(&1.5).unwrap(), to_jsonable(&2.0).unwrap()]
        );

        let descriptor = Descriptor::<f64>::new().unwrap();
        assert_eq!(from_jsonable_list(descriptor, encoded).unwrap(), vec![1.5, 2.0]);
    }

    #[test]
    fn list_decode_errors_are_indexed() {
        let descriptor = Descriptor::<bool>::new().unwrap();
        let err = from_jsonable_list(descriptor, vec![true.into(), "no".into()]).unwrap_err();
        match err {
            Error::Decode(err) => assert_eq!(err.path, vec!["1"]),
            other => panic!("unexpected error: {other}"),
        }
    }
}
