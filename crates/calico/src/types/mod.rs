//! Type descriptors and the built-in type suite.
//!
//! A [`TypeDesc`] is the runtime face of a type: a fixed-size table of
//! operator adapters, a method table of Function values, and the `create` /
//! `deep_copy` entry points. Built-in types register themselves once at
//! runtime construction; record types are generated on demand by
//! [`record::make_record_type`] when a `record` definition or a native
//! module is evaluated.

pub mod array;
pub mod boolean;
pub mod character;
pub mod function;
pub mod integer;
pub mod nothing;
pub mod real;
pub mod record;
pub mod string;

use std::rc::Rc;

use ahash::AHashMap;
use strum::EnumCount;

use crate::{
    ast::OperatorKind,
    errors::RunResult,
    intern::NameId,
    interp::Interp,
    runtime::Runtime,
    value::ObjRef,
};

/// Stable identifier of a registered type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(u32);

impl TypeId {
    #[must_use]
    pub(crate) fn new(index: usize) -> Self {
        Self(u32::try_from(index).expect("type registry overflow"))
    }

    #[inline]
    #[must_use]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// An operator adapter: performs one operator on values of one type.
///
/// `self_obj` is operand 0; `operands` are the remaining operands. When
/// `result_needed` is false the adapter must still produce every observable
/// side effect but may return the pinned `nothing` singleton instead of
/// allocating a result.
pub type OperatorFn = fn(&mut Interp<'_>, ObjRef, &[ObjRef], bool) -> RunResult<ObjRef>;

/// Constructs a fresh instance with the type's default payload.
pub type CreateFn = fn(&mut Runtime, TypeId) -> ObjRef;

/// Constructs an independent deep copy of `obj`.
pub type DeepCopyFn = fn(&mut Runtime, ObjRef) -> RunResult<ObjRef>;

/// Runtime descriptor of one type.
pub struct TypeDesc {
    pub id: TypeId,
    /// Interned display name (`Integer`, `Array`, record name, ...).
    pub name: NameId,
    slots: [Option<OperatorFn>; OperatorKind::COUNT],
    /// Dot-access methods: interned name to Function value. The values are
    /// garbage-collector roots for the lifetime of the runtime.
    pub methods: AHashMap<NameId, ObjRef>,
    pub create: CreateFn,
    pub deep_copy: DeepCopyFn,
    /// Estimated per-instance footprint, used for heap accounting.
    pub instance_size: usize,
    /// Declared field shape for record types; `None` for built-ins.
    pub record_fields: Option<Rc<[NameId]>>,
}

impl TypeDesc {
    #[must_use]
    pub fn new(id: TypeId, name: NameId, create: CreateFn, deep_copy: DeepCopyFn, instance_size: usize) -> Self {
        Self {
            id,
            name,
            slots: [None; OperatorKind::COUNT],
            methods: AHashMap::new(),
            create,
            deep_copy,
            instance_size,
            record_fields: None,
        }
    }

    /// The adapter installed for `op`, if any. An empty slot means the
    /// operator is unsupported on this type.
    #[must_use]
    pub fn operator_slot(&self, op: OperatorKind) -> Option<OperatorFn> {
        self.slots[op.slot()]
    }

    pub fn set_operator(&mut self, op: OperatorKind, adapter: OperatorFn) {
        self.slots[op.slot()] = Some(adapter);
    }

    pub fn add_method(&mut self, name: NameId, function: ObjRef) {
        self.methods.insert(name, function);
    }
}

impl std::fmt::Debug for TypeDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDesc")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("methods", &self.methods.len())
            .field("record_fields", &self.record_fields)
            .finish_non_exhaustive()
    }
}

/// Type ids of the built-in suite, resolved once at runtime construction.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinTypes {
    pub nothing: TypeId,
    pub boolean: TypeId,
    pub integer: TypeId,
    pub real: TypeId,
    pub character: TypeId,
    pub string: TypeId,
    pub array: TypeId,
    pub function: TypeId,
}
