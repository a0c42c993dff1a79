//! The Function built-in type.
//!
//! Carries either a native function pointer or a scripted blueprint id.
//! The `Call` adapter here is the single funnel for every call in the
//! interpreter: builtins, methods, record methods, and plain script calls
//! all dispatch through it.

use crate::{
    ast::OperatorKind,
    errors::RunResult,
    heap::Slot,
    interp::Interp,
    runtime::Runtime,
    types::{TypeDesc, TypeId},
    value::{Function, ObjKind, ObjRef, Payload},
};

pub(crate) fn register(rt: &mut Runtime) -> TypeId {
    let name = rt.interner.intern("Function");
    rt.register_type(|id| {
        let mut desc = TypeDesc::new(id, name, create, deep_copy, size_of::<Slot>());
        desc.set_operator(OperatorKind::Call, call_adapter);
        desc.set_operator(OperatorKind::Eq, eq_adapter);
        desc.set_operator(OperatorKind::Neq, neq_adapter);
        desc
    })
}

fn create(rt: &mut Runtime, _type_id: TypeId) -> ObjRef {
    // A default-constructed function is callable and does nothing.
    rt.alloc_native_fn(nop_native)
}

fn nop_native(interp: &mut Interp<'_>, _args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    Ok(interp.rt.nothing)
}

/// Functions are immutable, so a deep copy shares the payload.
fn deep_copy(rt: &mut Runtime, obj: ObjRef) -> RunResult<ObjRef> {
    if rt.kind_of(obj) == ObjKind::TypeItself {
        return Ok(obj);
    }
    let function = function_payload(rt, obj);
    Ok(rt.alloc(rt.builtin_types.function, Payload::Function(function)))
}

fn function_payload(rt: &Runtime, obj: ObjRef) -> Function {
    match rt.heap.get(obj).payload {
        Payload::Function(function) => function,
        _ => panic!("expected a Function payload"),
    }
}

fn call_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_instance(self_obj, interp.rt.builtin_types.function, 0)?;
    match function_payload(interp.rt, self_obj) {
        Function::Native(native) => native(interp, args, result_needed),
        Function::Scripted(func) => interp.call_scripted(func, args, result_needed),
    }
}

fn eq_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_operands(args, 1)?;
    Ok(interp.rt.protected_boolean(functions_equal(interp.rt, self_obj, args[0])))
}

fn neq_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_operands(args, 1)?;
    Ok(interp.rt.protected_boolean(!functions_equal(interp.rt, self_obj, args[0])))
}

/// Identity equality: same native pointer, or same blueprint. Two values
/// created from the same definition compare equal.
fn functions_equal(rt: &Runtime, a: ObjRef, b: ObjRef) -> bool {
    if rt.type_of(a) != rt.type_of(b) {
        return false;
    }
    match (rt.kind_of(a), rt.kind_of(b)) {
        (ObjKind::TypeItself, ObjKind::TypeItself) => true,
        (ObjKind::Instance, ObjKind::Instance) => {
            match (function_payload(rt, a), function_payload(rt, b)) {
                (Function::Native(f), Function::Native(g)) => std::ptr::fn_addr_eq(f, g),
                (Function::Scripted(f), Function::Scripted(g)) => f == g,
                _ => false,
            }
        }
        _ => false,
    }
}

pub(crate) fn install_methods(rt: &mut Runtime) {
    let type_id = rt.builtin_types.function;
    let wk = rt.well_known;
    for (name, method) in [(wk.repr, repr_method as crate::interp::NativeFn), (wk.string, repr_method)] {
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
        return Ok(interp.rt.alloc_str("Function"));
    }
    Ok(interp.rt.alloc_str("function"))
}
