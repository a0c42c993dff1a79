//! The Real built-in type: IEEE 754 double precision.
//!
//! Division follows IEEE semantics (infinities and NaN are ordinary
//! payloads, never errors), and `==` on NaN is non-reflexive.

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
    let name = rt.interner.intern("Real");
    rt.register_type(|id| {
        let mut desc = TypeDesc::new(id, name, create, deep_copy, size_of::<Slot>());
        desc.set_operator(OperatorKind::Add, add_adapter);
        desc.set_operator(OperatorKind::Sub, sub_adapter);
        desc.set_operator(OperatorKind::Mult, mult_adapter);
        desc.set_operator(OperatorKind::Div, div_adapter);
        desc.set_operator(OperatorKind::Neg, neg_adapter);
        desc.set_operator(OperatorKind::Pos, pos_adapter);
        desc.set_operator(OperatorKind::Lt, lt_adapter);
        desc.set_operator(OperatorKind::Leq, leq_adapter);
        desc.set_operator(OperatorKind::Gt, gt_adapter);
        desc.set_operator(OperatorKind::Geq, geq_adapter);
        desc.set_operator(OperatorKind::Eq, eq_adapter);
        desc.set_operator(OperatorKind::Neq, neq_adapter);
        desc
    })
}

fn create(rt: &mut Runtime, _type_id: TypeId) -> ObjRef {
    rt.alloc_real(0.0)
}

fn deep_copy(rt: &mut Runtime, obj: ObjRef) -> RunResult<ObjRef> {
    if rt.kind_of(obj) == ObjKind::TypeItself {
        return Ok(obj);
    }
    let value = rt.real_value(obj);
    Ok(rt.alloc_real(value))
}

fn binary_operands(interp: &Interp<'_>, self_obj: ObjRef, args: &[ObjRef]) -> RunResult<(f64, f64)> {
    interp.expect_instance(self_obj, interp.rt.builtin_types.real, 0)?;
    interp.expect_operands(args, 1)?;
    interp.expect_instance(args[0], interp.rt.builtin_types.real, 1)?;
    Ok((interp.rt.real_value(self_obj), interp.rt.real_value(args[0])))
}

macro_rules! arithmetic_adapter {
    ($name:ident, $apply:expr) => {
        fn $name(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
            let (a, b) = binary_operands(interp, self_obj, args)?;
            if !result_needed {
                return Ok(interp.rt.nothing);
            }
            let apply: fn(f64, f64) -> f64 = $apply;
            Ok(interp.rt.alloc_real(apply(a, b)))
        }
    };
}

macro_rules! comparison_adapter {
    ($name:ident, $apply:expr) => {
        fn $name(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
            let (a, b) = binary_operands(interp, self_obj, args)?;
            let apply: fn(f64, f64) -> bool = $apply;
            Ok(interp.rt.protected_boolean(apply(a, b)))
        }
    };
}

arithmetic_adapter!(add_adapter, |a, b| a + b);
arithmetic_adapter!(sub_adapter, |a, b| a - b);
arithmetic_adapter!(mult_adapter, |a, b| a * b);
arithmetic_adapter!(div_adapter, |a, b| a / b);

comparison_adapter!(lt_adapter, |a, b| a < b);
comparison_adapter!(leq_adapter, |a, b| a <= b);
comparison_adapter!(gt_adapter, |a, b| a > b);
comparison_adapter!(geq_adapter, |a, b| a >= b);

fn neg_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_instance(self_obj, interp.rt.builtin_types.real, 0)?;
    interp.expect_operands(args, 0)?;
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    let value = interp.rt.real_value(self_obj);
    Ok(interp.rt.alloc_real(-value))
}

fn pos_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_instance(self_obj, interp.rt.builtin_types.real, 0)?;
    interp.expect_operands(args, 0)?;
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    let value = interp.rt.real_value(self_obj);
    Ok(interp.rt.alloc_real(value))
}

fn eq_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_operands(args, 1)?;
    Ok(interp.rt.protected_boolean(reals_equal(interp.rt, self_obj, args[0])))
}

fn neq_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_operands(args, 1)?;
    Ok(interp.rt.protected_boolean(!reals_equal(interp.rt, self_obj, args[0])))
}

fn reals_equal(rt: &Runtime, a: ObjRef, b: ObjRef) -> bool {
    if rt.type_of(a) != rt.type_of(b) {
        return false;
    }
    match (rt.kind_of(a), rt.kind_of(b)) {
        (ObjKind::TypeItself, ObjKind::TypeItself) => true,
        // IEEE comparison: NaN != NaN.
        (ObjKind::Instance, ObjKind::Instance) => rt.real_value(a) == rt.real_value(b),
        _ => false,
    }
}

pub(crate) fn install_methods(rt: &mut Runtime) {
    let type_id = rt.builtin_types.real;
    let wk = rt.well_known;
    for (name, method) in [
        (wk.repr, repr_method as crate::interp::NativeFn),
        (wk.string, repr_method),
        (wk.bool_, bool_method),
        (wk.int, int_method),
        (wk.real, real_method),
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
        return Ok(interp.rt.alloc_str("Real"));
    }
    interp.expect_instance(self_obj, interp.rt.builtin_types.real, 0)?;
    let value = interp.rt.real_value(self_obj);
    let mut buffer = ryu::Buffer::new();
    let text = buffer.format(value).to_owned();
    Ok(interp.rt.alloc_str(&text))
}

fn bool_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    interp.expect_instance(args[0], interp.rt.builtin_types.real, 0)?;
    let value = interp.rt.real_value(args[0]);
    Ok(interp.rt.protected_boolean(value != 0.0))
}

fn int_method(interp: &mut Interp<'_>, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    interp.expect_instance(args[0], interp.rt.builtin_types.real, 0)?;
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    // Saturating truncation toward zero.
    let value = interp.rt.real_value(args[0]) as i64;
    Ok(interp.rt.alloc_integer(value))
}

fn real_method(interp: &mut Interp<'_>, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    interp.expect_instance(args[0], interp.rt.builtin_types.real, 0)?;
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    let value = interp.rt.real_value(args[0]);
    Ok(interp.rt.alloc_real(value))
}

fn read_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let Some(token) = interp.input.read_token() else {
        return Err(RunError::type_error("input is exhausted", interp.rt.ctx_area()));
    };
    let Ok(value) = token.parse::<f64>() else {
        return Err(RunError::type_error(
            format!("cannot read a Real from '{token}'"),
            interp.rt.ctx_area(),
        ));
    };
    Ok(interp.rt.alloc_real(value))
}
