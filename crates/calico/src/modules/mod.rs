//! Native modules, resolved by name through the `load` builtin.
//!
//! Each module builds its exported object at load time: a record type with
//! the module's native methods, returned as an instance. Modules allocate
//! through the runtime and their values are collected like any other.

pub mod gc_mod;
pub mod io_mod;
pub mod random_mod;

use crate::{errors::RunResult, interp::Interp, value::ObjRef};

/// Resolves `name` against the registry; `None` means no such module.
pub(crate) fn load_module(interp: &mut Interp<'_>, name: &str) -> Option<RunResult<ObjRef>> {
    match name {
        "gc" => Some(gc_mod::load(interp)),
        "io" => Some(io_mod::load(interp)),
        "random" => Some(random_mod::load(interp)),
        _ => None,
    }
}
