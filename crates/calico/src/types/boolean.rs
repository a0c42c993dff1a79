//! The Boolean built-in type.
//!
//! Comparison and logic adapters across the whole suite answer with the
//! runtime's pinned `true`/`false` singletons; boolean literals still
//! allocate fresh instances so nothing user-visible ever aliases a pinned
//! root mutably.

use crate::{
    ast::OperatorKind,
    errors::{RunError, RunResult},
    heap::Slot,
    interp::Interp,
    runtime::Runtime,
    types::{TypeDesc, TypeId},
    value::{ObjKind, ObjRef},
};

pub(crate) fn register(rt: &mut Runtime) -> TypeId {
    let name = rt.interner.intern("Boolean");
    rt.register_type(|id| {
        let mut desc = TypeDesc::new(id, name, create, deep_copy, size_of::<Slot>());
        desc.set_operator(OperatorKind::Not, not_adapter);
        desc.set_operator(OperatorKind::Eq, eq_adapter);
        desc.set_operator(OperatorKind::Neq, neq_adapter);
        desc
    })
}

fn create(rt: &mut Runtime, _type_id: TypeId) -> ObjRef {
    rt.alloc_boolean(false)
}

fn deep_copy(rt: &mut Runtime, obj: ObjRef) -> RunResult<ObjRef> {
    if rt.kind_of(obj) == ObjKind::TypeItself {
        return Ok(obj);
    }
    let value = rt.boolean_value(obj);
    Ok(rt.alloc_boolean(value))
}

fn not_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_instance(self_obj, interp.rt.builtin_types.boolean, 0)?;
    interp.expect_operands(args, 0)?;
    let value = interp.rt.boolean_value(self_obj);
    Ok(interp.rt.protected_boolean(!value))
}

fn eq_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_operands(args, 1)?;
    Ok(interp.rt.protected_boolean(booleans_equal(interp.rt, self_obj, args[0])))
}

fn neq_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_operands(args, 1)?;
    Ok(interp.rt.protected_boolean(!booleans_equal(interp.rt, self_obj, args[0])))
}

fn booleans_equal(rt: &Runtime, a: ObjRef, b: ObjRef) -> bool {
    if rt.type_of(a) != rt.type_of(b) {
        return false;
    }
    match (rt.kind_of(a), rt.kind_of(b)) {
        (ObjKind::TypeItself, ObjKind::TypeItself) => true,
        (ObjKind::Instance, ObjKind::Instance) => rt.boolean_value(a) == rt.boolean_value(b),
        _ => false,
    }
}

pub(crate) fn install_methods(rt: &mut Runtime) {
    let type_id = rt.builtin_types.boolean;
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
    let self_obj = args[0];
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    if interp.rt.kind_of(self_obj) == ObjKind::TypeItself {
        return Ok(interp.rt.alloc_str("Boolean"));
    }
    interp.expect_instance(self_obj, interp.rt.builtin_types.boolean, 0)?;
    let text = if interp.rt.boolean_value(self_obj) { "true" } else { "false" };
    Ok(interp.rt.alloc_str(text))
}

fn bool_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    interp.expect_instance(args[0], interp.rt.builtin_types.boolean, 0)?;
    let value = interp.rt.boolean_value(args[0]);
    Ok(interp.rt.protected_boolean(value))
}

fn int_method(interp: &mut Interp<'_>, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    interp.expect_instance(args[0], interp.rt.builtin_types.boolean, 0)?;
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    let value = i64::from(interp.rt.boolean_value(args[0]));
    Ok(interp.rt.alloc_integer(value))
}

fn read_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let Some(token) = interp.input.read_token() else {
        return Err(RunError::type_error("input is exhausted", interp.rt.ctx_area()));
    };
    match token.as_str() {
        "true" => Ok(interp.rt.alloc_boolean(true)),
        "false" => Ok(interp.rt.alloc_boolean(false)),
        _ => Err(RunError::type_error(
            format!("cannot read a Boolean from '{token}'"),
            interp.rt.ctx_area(),
        )),
    }
}
