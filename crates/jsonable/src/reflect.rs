//! Static type expressions: how a Rust type describes its own shape.
//!
//! [`Reflect`] is implemented for the built-in scalars, temporals and containers
//! here, and for user records, enums and unions by `#[derive(Jsonable)]`. The
//! expression is raw material only; [`crate::registry`] classifies it into a
//! [`crate::TypeDescriptor`] and rejects shapes it cannot support.

use std::any::TypeId;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::{Jsonable, Omittable};

/// A type that can describe its static shape.
pub trait Reflect: 'static {
    fn type_expr() -> TypeExpr;
}

/// Lazily evaluated reference to a [`Reflect`] type.
///
/// Holding function pointers instead of an evaluated [`TypeExpr`] keeps recursive
/// types (a record containing `Vec<Self>`) finite.
#[derive(Clone, Copy)]
pub struct TypeRef {
    id: fn() -> TypeId,
    name: fn() -> &'static str,
    expr: fn() -> TypeExpr,
}

impl TypeRef {
    pub fn of<T: Reflect>() -> Self {
        Self {
            id: TypeId::of::<T>,
            name: std::any::type_name::<T>,
            expr: T::type_expr,
        }
    }

    pub fn id(&self) -> TypeId {
        (self.id)()
    }

    pub fn name(&self) -> &'static str {
        (self.name)()
    }

    pub fn expr(&self) -> TypeExpr {
        (self.expr)()
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeRef").field(&self.name()).finish()
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for TypeRef {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalKind {
    Date,
    DateTime,
    OffsetDateTime,
}

#[derive(Debug, Clone)]
pub enum TypeExpr {
    Unit,
    Int,
    Float,
    Bool,
    Str,
    Temporal(TemporalKind),
    /// `Option<T>`: null decodes to `None`, an absent field is allowed.
    Optional(TypeRef),
    /// `Omittable<T>`: an absent field is allowed and omitted fields are skipped.
    Omittable(TypeRef),
    /// Smart pointers and newtypes that share their inner type's shape.
    Indirect(TypeRef),
    List(TypeRef),
    Map {
        key: TypeRef,
        value: TypeRef,
    },
    Record(RecordShape),
    Enum(EnumShape),
    Union(UnionShape),
    /// A generic parameter with no shape of its own.
    Unconstrained(&'static str),
}

#[derive(Debug, Clone, Default)]
pub struct RecordShape {
    pub fields: Vec<FieldShape>,
}

impl RecordShape {
    pub fn new(fields: Vec<FieldShape>) -> Self {
        Self { fields }
    }
}

#[derive(Debug, Clone)]
pub struct FieldShape {
    pub name: &'static str,
    pub ty: TypeRef,
    pub has_default: bool,
}

impl FieldShape {
    pub fn new(name: &'static str, ty: TypeRef) -> Self {
        Self {
            name,
            ty,
            has_default: false,
        }
    }

    pub fn with_default(mut self, has_default: bool) -> Self {
        self.has_default = has_default;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnumShape {
    pub members: Vec<EnumMemberShape>,
}

impl EnumShape {
    pub fn new(members: Vec<EnumMemberShape>) -> Self {
        Self { members }
    }
}

#[derive(Debug, Clone)]
pub struct EnumMemberShape {
    pub name: &'static str,
    pub value: Jsonable,
}

impl EnumMemberShape {
    pub fn new(name: &'static str, value: impl Into<Jsonable>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UnionShape {
    pub alternatives: Vec<TypeRef>,
}

impl UnionShape {
    pub fn new(alternatives: Vec<TypeRef>) -> Self {
        Self { alternatives }
    }
}

macro_rules! impl_reflect_scalar {
    ($expr:expr => $($ty:ty),*) => {
        $(
            impl Reflect for $ty {
                fn type_expr() -> TypeExpr {
                    $expr
                }
            }
        )*
    };
}

impl_reflect_scalar!(TypeExpr::Unit => ());
impl_reflect_scalar!(TypeExpr::Bool => bool);
impl_reflect_scalar!(TypeExpr::Int => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
impl_reflect_scalar!(TypeExpr::Float => f32, f64);
impl_reflect_scalar!(TypeExpr::Str => String, char);
impl_reflect_scalar!(TypeExpr::Temporal(TemporalKind::Date) => time::Date);
impl_reflect_scalar!(TypeExpr::Temporal(TemporalKind::DateTime) => time::PrimitiveDateTime);
impl_reflect_scalar!(TypeExpr::Temporal(TemporalKind::OffsetDateTime) => time::OffsetDateTime);

impl<T: Reflect> Reflect for Option<T> {
    fn type_expr() -> TypeExpr {
        TypeExpr::Optional(TypeRef::of::<T>())
    }
}

impl<T: Reflect> Reflect for Omittable<T> {
    fn type_expr() -> TypeExpr {
        TypeExpr::Omittable(TypeRef::of::<T>())
    }
}

macro_rules! impl_reflect_wrapper {
    ($variant:ident => $($ty:ident),*) => {
        $(
            impl<T: Reflect> Reflect for $ty<T> {
                fn type_expr() -> TypeExpr {
                    TypeExpr::$variant(TypeRef::of::<T>())
                }
            }
        )*
    };
}

impl_reflect_wrapper!(Indirect => Box, Arc, Rc);
impl_reflect_wrapper!(List => Vec, VecDeque, HashSet, BTreeSet);

macro_rules! impl_reflect_map {
    ($($ty:ident),*) => {
        $(
            impl<K: Reflect, V: Reflect> Reflect for $ty<K, V> {
                fn type_expr() -> TypeExpr {
                    TypeExpr::Map {
                        key: TypeRef::of::<K>(),
                        value: TypeRef::of::<V>(),
                    }
                }
            }
        )*
    };
}

impl_reflect_map!(HashMap, BTreeMap, IndexMap);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_ref_identity_follows_type_id() {
        assert_eq!(TypeRef::of::<Vec<i64>>(), TypeRef::of::<Vec<i64>>());
        assert_ne!(TypeRef::of::<Vec<i64>>(), TypeRef::of::<Vec<i32>>());
        assert_eq!(TypeRef::of::<String>().name(), "alloc::string::String");
    }

    #[test]
    fn containers_expose_parameters() {
        match <HashMap<String, Vec<f64>>>::type_expr() {
            TypeExpr::Map { key, value } => {
                assert_eq!(key, TypeRef::of::<String>());
                assert!(matches!(value.expr(), TypeExpr::List(inner) if inner == TypeRef::of::<f64>()));
            }
            other => panic!("unexpected expression: {other:?}"),
        }
        assert!(matches!(
            <Option<Box<u8>>>::type_expr(),
            TypeExpr::Optional(inner) if matches!(inner.expr(), TypeExpr::Indirect(_))
        ));
    }
}
