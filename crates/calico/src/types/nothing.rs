//! The Nothing built-in type: the unit value.

use crate::{
    ast::OperatorKind,
    errors::RunResult,
    heap::Slot,
    interp::Interp,
    runtime::Runtime,
    types::{TypeDesc, TypeId},
    value::{ObjKind, ObjRef},
};

pub(crate) fn register(rt: &mut Runtime) -> TypeId {
    let name = rt.interner.intern("Nothing");
    rt.register_type(|id| {
        let mut desc = TypeDesc::new(id, name, create, deep_copy, size_of::<Slot>());
        desc.set_operator(OperatorKind::Eq, eq_adapter);
        desc.set_operator(OperatorKind::Neq, neq_adapter);
        desc
    })
}

fn create(rt: &mut Runtime, _type_id: TypeId) -> ObjRef {
    rt.alloc_nothing()
}

fn deep_copy(rt: &mut Runtime, obj: ObjRef) -> RunResult<ObjRef> {
    if rt.kind_of(obj) == ObjKind::TypeItself {
        return Ok(obj);
    }
    Ok(rt.alloc_nothing())
}

fn eq_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_operands(args, 1)?;
    Ok(interp.rt.protected_boolean(nothings_equal(interp.rt, self_obj, args[0])))
}

fn neq_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_operands(args, 1)?;
    Ok(interp.rt.protected_boolean(!nothings_equal(interp.rt, self_obj, args[0])))
}

/// All nothing instances compare equal; the payload carries no state.
fn nothings_equal(rt: &Runtime, a: ObjRef, b: ObjRef) -> bool {
    if rt.type_of(a) != rt.type_of(b) {
        return false;
    }
    matches!(
        (rt.kind_of(a), rt.kind_of(b)),
        (ObjKind::TypeItself, ObjKind::TypeItself) | (ObjKind::Instance, ObjKind::Instance)
    )
}

pub(crate) fn install_methods(rt: &mut Runtime) {
    let type_id = rt.builtin_types.nothing;
    let wk = rt.well_known;
    for (name, method) in [
        (wk.repr, repr_method as crate::interp::NativeFn),
        (wk.string, repr_method),
        (wk.bool_, bool_method),
        (wk.int, int_method),
        (wk.read, read_method),
    ] {
        let value = rt.alloc_native_fn(method);
        rt.type_desc_mut(type_id).add_method(name, value);
    }
}

fn repr_method(interp: &mut Interp<'_>, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    if interp.rt.kind_of(args[0]) == ObjKind::TypeItself {
        return Ok(interp.rt.alloc_str("Nothing"));
    }
    Ok(interp.rt.alloc_str("nothing"))
}

fn bool_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    interp.expect_instance(args[0], interp.rt.builtin_types.nothing, 0)?;
    Ok(interp.rt.protected_boolean(false))
}

fn int_method(interp: &mut Interp<'_>, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    interp.expect_instance(args[0], interp.rt.builtin_types.nothing, 0)?;
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    Ok(interp.rt.alloc_integer(0))
}

fn read_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    Ok(interp.rt.alloc_nothing())
}
