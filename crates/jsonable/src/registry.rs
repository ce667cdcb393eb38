//! Process-wide descriptor cache.
//!
//! Each distinct type gets one leaked `OnceLock` slot. The table lock is held only
//! while finding or inserting a slot; classification runs inside the slot, so a type
//! is classified at most once and unrelated types never wait on each other.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::{OnceLock, PoisonError, RwLock};

use crate::descriptor::TypeDescriptor;
use crate::reflect::{TypeExpr, TypeRef};
use crate::UnsupportedTypeError;

type Slot = OnceLock<Result<&'static TypeDescriptor, UnsupportedTypeError>>;

static SLOTS: OnceLock<RwLock<HashMap<TypeId, &'static Slot>>> = OnceLock::new();

fn slot(id: TypeId) -> &'static Slot {
    let table = SLOTS.get_or_init(|| RwLock::new(HashMap::new()));

    let cached = table
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .copied();
    if let Some(slot) = cached {
        return slot;
    }

    let mut table = table.write().unwrap_or_else(PoisonError::into_inner);
    *table
        .entry(id)
        .or_insert_with(|| &*Box::leak(Box::new(OnceLock::new())))
}

/// Returns the cached descriptor of `ty`, classifying it on first use.
///
/// Only `ty` itself is classified; nested types are resolved through their links.
/// Use [`descriptor_for`] when the whole reachable graph must be valid.
pub fn resolve(ty: TypeRef) -> Result<&'static TypeDescriptor, UnsupportedTypeError> {
    slot(ty.id()).get_or_init(|| build(ty)).clone()
}

fn build(ty: TypeRef) -> Result<&'static TypeDescriptor, UnsupportedTypeError> {
    match unwrap_wrappers(ty)? {
        (target, _) if target.id() != ty.id() => resolve(target),
        (_, expr) => {
            let descriptor = TypeDescriptor::classify(ty, expr)?;
            tracing::debug!(
                type_name = descriptor.type_name(),
                kind = descriptor.kind().name(),
                "built type descriptor"
            );
            Ok(Box::leak(Box::new(descriptor)))
        }
    }
}

/// Follows `Option`/`Omittable`/pointer/newtype wrappers down to the first type with a
/// shape of its own. A wrapper chain that leads back to a type already on it has no
/// such type and is rejected here, before any slot is re-entered.
fn unwrap_wrappers(ty: TypeRef) -> Result<(TypeRef, TypeExpr), UnsupportedTypeError> {
    let mut seen = HashSet::new();
    let mut current = ty;
    loop {
        if !seen.insert(current.id()) {
            return Err(UnsupportedTypeError::new(
                ty.name(),
                format!("wrapper cycle through `{}`", current.name()),
            ));
        }
        match current.expr() {
            TypeExpr::Optional(inner) | TypeExpr::Omittable(inner) | TypeExpr::Indirect(inner) => {
                current = inner;
            }
            expr => return Ok((current, expr)),
        }
    }
}

/// Resolves `ty` and validates every type reachable from it.
///
/// Validation runs once per root descriptor and its outcome is cached with it.
pub fn descriptor_for(ty: TypeRef) -> Result<&'static TypeDescriptor, UnsupportedTypeError> {
    let root = resolve(ty)?;
    root.validated.get_or_init(|| validate_graph(root)).clone()?;
    Ok(root)
}

fn validate_graph(root: &'static TypeDescriptor) -> Result<(), UnsupportedTypeError> {
    let mut seen: HashSet<*const TypeDescriptor> = HashSet::new();
    let mut pending = vec![root];
    while let Some(descriptor) = pending.pop() {
        if !seen.insert(descriptor as *const TypeDescriptor) {
            continue;
        }
        for link in descriptor.links() {
            pending.push(link.resolve()?);
        }
    }
    Ok(())
}
