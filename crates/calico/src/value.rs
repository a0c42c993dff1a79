//! Runtime value representation.
//!
//! Every runtime value is a slot on the garbage-collected heap, addressed by
//! an [`ObjRef`]. A slot is a `(kind, type, payload)` triple: *instance*
//! values carry a type-specific [`Payload`], *type-itself* values denote
//! their type as a first-class object and carry an empty payload. Both kinds
//! dispatch operators and methods through the same type descriptor, so
//! `T == T` and `T.method` work uniformly.

use indexmap::IndexMap;

use crate::{ast::FuncId, intern::NameId, interp::NativeFn, modules::io_mod::FileHandle};

/// Handle to a heap slot. Copyable; identity is slot identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef(u32);

impl ObjRef {
    #[must_use]
    pub(crate) fn new(index: usize) -> Self {
        Self(u32::try_from(index).expect("heap slot index overflow"))
    }

    #[inline]
    #[must_use]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// The two kinds of value: an instance of a type, or the type itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjKind {
    Instance,
    TypeItself,
}

/// A function payload: either a native function pointer or a scripted
/// function referencing the runtime's blueprint table.
///
/// Function payloads are immutable once installed, which is why deep copy
/// of a Function is a shallow clone.
#[derive(Debug, Clone, Copy)]
pub enum Function {
    Native(NativeFn),
    Scripted(FuncId),
}

/// Type-specific instance state.
///
/// Composite payloads (`Array`, `Record`) hold references to other values;
/// those references are the garbage collector's edge set. `File` is owned by
/// the `io` native module; native modules extend the runtime through payload
/// variants registered here.
#[derive(Debug)]
pub enum Payload {
    Nothing,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Character(u8),
    Str(Vec<u8>),
    Array(Vec<ObjRef>),
    Function(Function),
    Record(IndexMap<NameId, ObjRef>),
    File(FileHandle),
}

impl Payload {
    /// Static name of the payload variant, used for heap statistics.
    #[must_use]
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::Nothing => "Nothing",
            Self::Boolean(_) => "Boolean",
            Self::Integer(_) => "Integer",
            Self::Real(_) => "Real",
            Self::Character(_) => "Character",
            Self::Str(_) => "String",
            Self::Array(_) => "Array",
            Self::Function(_) => "Function",
            Self::Record(_) => "Record",
            Self::File(_) => "File",
        }
    }

    /// Appends this payload's outgoing references to `edges`.
    ///
    /// Primitives contribute nothing; a scripted function's body is plain
    /// AST outside the collected heap.
    pub fn push_edges(&self, edges: &mut Vec<ObjRef>) {
        match self {
            Self::Array(items) => edges.extend(items.iter().copied()),
            Self::Record(fields) => edges.extend(fields.values().copied()),
            _ => {}
        }
    }

    /// Bytes held outside the slot itself (buffer capacities); the base
    /// footprint comes from the type descriptor's instance size.
    #[must_use]
    pub fn extra_size(&self) -> usize {
        match self {
            Self::Str(bytes) => bytes.capacity(),
            Self::Array(items) => items.capacity() * size_of::<ObjRef>(),
            Self::Record(fields) => fields.len() * (size_of::<NameId>() + size_of::<ObjRef>()),
            _ => 0,
        }
    }
}
