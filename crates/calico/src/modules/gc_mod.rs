//! The `gc` module: script-level control over the collector.

use crate::{
    errors::RunResult,
    interp::{Interp, NativeFn},
    types::record::make_record_type,
    value::ObjRef,
};

pub(crate) fn load(interp: &mut Interp<'_>) -> RunResult<ObjRef> {
    let rt = &mut *interp.rt;
    let name = rt.interner.intern("GC");
    let type_id = make_record_type(rt, name, Vec::new());
    let entries: &[(&str, NativeFn)] = &[
        ("enable", enable),
        ("disable", disable),
        ("status", status),
        ("ping", ping),
        ("forceping", forceping),
    ];
    for &(method_name, method) in entries {
        let method_name = rt.interner.intern(method_name);
        let value = rt.alloc_native_fn(method);
        rt.type_desc_mut(type_id).add_method(method_name, value);
    }
    Ok(rt.make_instance(type_id))
}

fn enable(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    interp.rt.heap.enable();
    Ok(interp.rt.nothing)
}

fn disable(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    interp.rt.heap.disable();
    Ok(interp.rt.nothing)
}

fn status(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    Ok(interp.rt.protected_boolean(interp.rt.heap.is_enabled()))
}

/// Collects now if collection is enabled.
fn ping(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    interp.rt.gc_ping();
    Ok(interp.rt.nothing)
}

/// Collects now even while collection is disabled.
fn forceping(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    interp.rt.gc_force_ping();
    Ok(interp.rt.nothing)
}
