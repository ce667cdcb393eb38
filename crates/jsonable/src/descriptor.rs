//! Type descriptors: the classified, immutable shape of a static type.
//!
//! A [`TypeDescriptor`] is built once per distinct type by [`crate::registry`] and
//! shared by every decode call. Nested shapes are reached through [`Link`]s, which
//! resolve and memoize their target on first use, so recursive types are fine.

use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::OnceLock;

use indexmap::IndexMap;

use crate::reflect::{EnumShape, RecordShape, TemporalKind, TypeExpr, TypeRef, UnionShape};
use crate::{registry, Jsonable, Reflect, UnsupportedTypeError};

#[derive(Debug)]
pub struct TypeDescriptor {
    type_name: &'static str,
    kind: DescriptorKind,
    pub(crate) validated: OnceLock<Result<(), UnsupportedTypeError>>,
}

#[derive(Debug)]
pub enum DescriptorKind {
    None,
    Int,
    Float,
    Bool,
    Str,
    Temporal(TemporalKind),
    ListOf(Link),
    MapOf { key: Link, value: Link },
    EnumOf(Vec<EnumMember>),
    RecordOf(IndexMap<&'static str, FieldDescriptor>),
    UnionOf(Vec<Link>),
}

impl DescriptorKind {
    pub fn name(&self) -> &'static str {
        match self {
            DescriptorKind::None => "none",
            DescriptorKind::Int => "int",
            DescriptorKind::Float => "float",
            DescriptorKind::Bool => "bool",
            DescriptorKind::Str => "str",
            DescriptorKind::Temporal(_) => "temporal",
            DescriptorKind::ListOf(_) => "list",
            DescriptorKind::MapOf { .. } => "map",
            DescriptorKind::EnumOf(_) => "enum",
            DescriptorKind::RecordOf(_) => "record",
            DescriptorKind::UnionOf(_) => "union",
        }
    }
}

#[derive(Debug)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub ty: Link,
    /// False when the field has a declared default or its type tolerates absence.
    pub required: bool,
}

#[derive(Debug, Clone)]
pub struct EnumMember {
    pub name: &'static str,
    pub value: Jsonable,
}

/// Lazily resolved edge to a nested descriptor.
pub struct Link {
    target: TypeRef,
    resolved: OnceLock<&'static TypeDescriptor>,
}

impl Link {
    fn new(target: TypeRef) -> Self {
        Self {
            target,
            resolved: OnceLock::new(),
        }
    }

    pub fn target(&self) -> TypeRef {
        self.target
    }

    pub fn resolve(&self) -> Result<&'static TypeDescriptor, UnsupportedTypeError> {
        if let Some(descriptor) = self.resolved.get() {
            return Ok(descriptor);
        }
        let descriptor = registry::resolve(self.target)?;
        Ok(*self.resolved.get_or_init(|| descriptor))
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Link").field(&self.target.name()).finish()
    }
}

impl TypeDescriptor {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn kind(&self) -> &DescriptorKind {
        &self.kind
    }

    /// Declared fields of a record descriptor.
    pub fn fields(&self) -> Option<&IndexMap<&'static str, FieldDescriptor>> {
        match &self.kind {
            DescriptorKind::RecordOf(fields) => Some(fields),
            _ => None,
        }
    }

    pub(crate) fn links(&self) -> Vec<&Link> {
        match &self.kind {
            DescriptorKind::ListOf(elem) => vec![elem],
            DescriptorKind::MapOf { key, value } => vec![key, value],
            DescriptorKind::RecordOf(fields) => fields.values().map(|field| &field.ty).collect(),
            DescriptorKind::UnionOf(alternatives) => alternatives.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Classifies a non-wrapper type expression, in resolution order: built-in
    /// scalars and temporals, generic containers, records, enums, unions.
    pub(crate) fn classify(ty: TypeRef, expr: TypeExpr) -> Result<Self, UnsupportedTypeError> {
        let type_name = ty.name();
        let kind = match expr {
            TypeExpr::Unit => DescriptorKind::None,
            TypeExpr::Int => DescriptorKind::Int,
            TypeExpr::Float => DescriptorKind::Float,
            TypeExpr::Bool => DescriptorKind::Bool,
            TypeExpr::Str => DescriptorKind::Str,
            TypeExpr::Temporal(kind) => DescriptorKind::Temporal(kind),
            TypeExpr::List(elem) => DescriptorKind::ListOf(Link::new(elem)),
            TypeExpr::Map { key, value } => {
                check_map_key(type_name, key)?;
                DescriptorKind::MapOf {
                    key: Link::new(key),
                    value: Link::new(value),
                }
            }
            TypeExpr::Record(shape) => DescriptorKind::RecordOf(record_fields(type_name, shape)?),
            TypeExpr::Enum(shape) => DescriptorKind::EnumOf(enum_members(type_name, shape)?),
            TypeExpr::Union(shape) => DescriptorKind::UnionOf(union_alternatives(type_name, shape)?),
            TypeExpr::Optional(_) | TypeExpr::Omittable(_) | TypeExpr::Indirect(_) => {
                return Err(UnsupportedTypeError::new(
                    type_name,
                    "wrapper types share their inner type's descriptor",
                ))
            }
            TypeExpr::Unconstrained(param) => {
                return Err(UnsupportedTypeError::new(
                    type_name,
                    format!("generic parameter `{param}` has no shape to classify"),
                ))
            }
        };

        Ok(Self {
            type_name,
            kind,
            validated: OnceLock::new(),
        })
    }
}

fn check_map_key(type_name: &'static str, key: TypeRef) -> Result<(), UnsupportedTypeError> {
    match key.expr() {
        TypeExpr::Optional(inner) | TypeExpr::Omittable(inner) | TypeExpr::Indirect(inner) => {
            check_map_key(type_name, inner)
        }
        TypeExpr::List(_) | TypeExpr::Map { .. } | TypeExpr::Record(_) => {
            Err(UnsupportedTypeError::new(
                type_name,
                format!("map key `{}` is not a scalar, enum or temporal", key.name()),
            ))
        }
        _ => Ok(()),
    }
}

fn accepts_absence(ty: TypeRef) -> bool {
    match ty.expr() {
        TypeExpr::Optional(_) | TypeExpr::Omittable(_) => true,
        TypeExpr::Indirect(inner) => accepts_absence(inner),
        _ => false,
    }
}

fn record_fields(
    type_name: &'static str,
    shape: RecordShape,
) -> Result<IndexMap<&'static str, FieldDescriptor>, UnsupportedTypeError> {
    let mut fields = IndexMap::with_capacity(shape.fields.len());
    for field in shape.fields {
        let descriptor = FieldDescriptor {
            name: field.name,
            required: !field.has_default && !accepts_absence(field.ty),
            ty: Link::new(field.ty),
        };
        if fields.insert(field.name, descriptor).is_some() {
            return Err(UnsupportedTypeError::new(
                type_name,
                format!("field name `{}` is declared twice", field.name),
            ));
        }
    }
    Ok(fields)
}

fn enum_members(
    type_name: &'static str,
    shape: EnumShape,
) -> Result<Vec<EnumMember>, UnsupportedTypeError> {
    if shape.members.is_empty() {
        return Err(UnsupportedTypeError::new(type_name, "enum has no members"));
    }

    let mut seen = HashSet::new();
    let mut members = Vec::with_capacity(shape.members.len());
    for member in shape.members {
        if !member.value.is_scalar() {
            return Err(UnsupportedTypeError::new(
                type_name,
                format!("member `{}` has a non-scalar value {}", member.name, member.value),
            ));
        }
        if !seen.insert(member.value.clone()) {
            return Err(UnsupportedTypeError::new(
                type_name,
                format!("member `{}` repeats the value {}", member.name, member.value),
            ));
        }
        members.push(EnumMember {
            name: member.name,
            value: member.value,
        });
    }
    Ok(members)
}

fn union_alternatives(
    type_name: &'static str,
    shape: UnionShape,
) -> Result<Vec<Link>, UnsupportedTypeError> {
    if shape.alternatives.is_empty() {
        return Err(UnsupportedTypeError::new(type_name, "union has no alternatives"));
    }
    Ok(shape.alternatives.into_iter().map(Link::new).collect())
}

/// Typed handle to the validated descriptor of `T`.
pub struct Descriptor<T> {
    raw: &'static TypeDescriptor,
    marker: PhantomData<fn() -> T>,
}

impl<T: Reflect> Descriptor<T> {
    /// Builds (or fetches from the cache) the descriptor of `T`, validating every
    /// type reachable from it.
    pub fn new() -> Result<Self, UnsupportedTypeError> {
        registry::descriptor_for(TypeRef::of::<T>()).map(|raw| Self {
            raw,
            marker: PhantomData,
        })
    }
}

impl<T> Descriptor<T> {
    pub fn raw(&self) -> &'static TypeDescriptor {
        self.raw
    }
}

impl<T> Clone for Descriptor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Descriptor<T> {}

impl<T> fmt::Debug for Descriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Descriptor").field(self.raw).finish()
    }
}
