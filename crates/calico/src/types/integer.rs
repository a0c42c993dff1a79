//! The Integer built-in type: 64-bit signed, strict integer operands.
//!
//! Arithmetic wraps in two's complement; division and remainder by zero are
//! arithmetic errors. All binary slots require an Integer on both sides —
//! there is no implicit widening to Real.

use crate::{
    ast::OperatorKind,
    errors::{ErrorKind, RunError, RunResult},
    heap::Slot,
    interp::Interp,
    runtime::Runtime,
    types::{TypeDesc, TypeId},
    value::{ObjKind, ObjRef, Payload},
};

pub(crate) fn register(rt: &mut Runtime) -> TypeId {
    let name = rt.interner.intern("Integer");
    rt.register_type(|id| {
        let mut desc = TypeDesc::new(id, name, create, deep_copy, size_of::<Slot>());
        desc.set_operator(OperatorKind::Add, add_adapter);
        desc.set_operator(OperatorKind::Sub, sub_adapter);
        desc.set_operator(OperatorKind::Mult, mult_adapter);
        desc.set_operator(OperatorKind::Div, div_adapter);
        desc.set_operator(OperatorKind::Rem, rem_adapter);
        desc.set_operator(OperatorKind::Lshift, lshift_adapter);
        desc.set_operator(OperatorKind::Rshift, rshift_adapter);
        desc.set_operator(OperatorKind::Bitand, bitand_adapter);
        desc.set_operator(OperatorKind::Bitor, bitor_adapter);
        desc.set_operator(OperatorKind::Bitxor, bitxor_adapter);
        desc.set_operator(OperatorKind::Inverse, inverse_adapter);
        desc.set_operator(OperatorKind::Neg, neg_adapter);
        desc.set_operator(OperatorKind::Pos, pos_adapter);
        desc.set_operator(OperatorKind::PreInc, preinc_adapter);
        desc.set_operator(OperatorKind::PostInc, postinc_adapter);
        desc.set_operator(OperatorKind::PreDec, predec_adapter);
        desc.set_operator(OperatorKind::PostDec, postdec_adapter);
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
    rt.alloc_integer(0)
}

fn deep_copy(rt: &mut Runtime, obj: ObjRef) -> RunResult<ObjRef> {
    if rt.kind_of(obj) == ObjKind::TypeItself {
        return Ok(obj);
    }
    let value = rt.integer_value(obj);
    Ok(rt.alloc_integer(value))
}

/// Verifies `self op arg` operand shapes and extracts both payloads.
fn binary_operands(interp: &Interp<'_>, self_obj: ObjRef, args: &[ObjRef]) -> RunResult<(i64, i64)> {
    interp.expect_instance(self_obj, interp.rt.builtin_types.integer, 0)?;
    interp.expect_operands(args, 1)?;
    interp.expect_instance(args[0], interp.rt.builtin_types.integer, 1)?;
    Ok((interp.rt.integer_value(self_obj), interp.rt.integer_value(args[0])))
}

fn unary_operand(interp: &Interp<'_>, self_obj: ObjRef, args: &[ObjRef]) -> RunResult<i64> {
    interp.expect_instance(self_obj, interp.rt.builtin_types.integer, 0)?;
    interp.expect_operands(args, 0)?;
    Ok(interp.rt.integer_value(self_obj))
}

macro_rules! arithmetic_adapter {
    ($name:ident, $apply:expr) => {
        fn $name(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
            let (a, b) = binary_operands(interp, self_obj, args)?;
            if !result_needed {
                return Ok(interp.rt.nothing);
            }
            let apply: fn(i64, i64) -> i64 = $apply;
            Ok(interp.rt.alloc_integer(apply(a, b)))
        }
    };
}

macro_rules! comparison_adapter {
    ($name:ident, $apply:expr) => {
        fn $name(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
            let (a, b) = binary_operands(interp, self_obj, args)?;
            let apply: fn(i64, i64) -> bool = $apply;
            Ok(interp.rt.protected_boolean(apply(a, b)))
        }
    };
}

arithmetic_adapter!(add_adapter, |a, b| a.wrapping_add(b));
arithmetic_adapter!(sub_adapter, |a, b| a.wrapping_sub(b));
arithmetic_adapter!(mult_adapter, |a, b| a.wrapping_mul(b));
arithmetic_adapter!(lshift_adapter, |a, b| a.wrapping_shl(b as u32));
arithmetic_adapter!(rshift_adapter, |a, b| a.wrapping_shr(b as u32));
arithmetic_adapter!(bitand_adapter, |a, b| a & b);
arithmetic_adapter!(bitor_adapter, |a, b| a | b);
arithmetic_adapter!(bitxor_adapter, |a, b| a ^ b);

comparison_adapter!(lt_adapter, |a, b| a < b);
comparison_adapter!(leq_adapter, |a, b| a <= b);
comparison_adapter!(gt_adapter, |a, b| a > b);
comparison_adapter!(geq_adapter, |a, b| a >= b);

fn div_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    let (a, b) = binary_operands(interp, self_obj, args)?;
    if b == 0 {
        return Err(RunError::new(
            ErrorKind::Arithmetic,
            "division by zero",
            interp.rt.sub_area(1),
        ));
    }
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    Ok(interp.rt.alloc_integer(a.wrapping_div(b)))
}

fn rem_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    let (a, b) = binary_operands(interp, self_obj, args)?;
    if b == 0 {
        return Err(RunError::new(
            ErrorKind::Arithmetic,
            "remainder by zero",
            interp.rt.sub_area(1),
        ));
    }
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    Ok(interp.rt.alloc_integer(a.wrapping_rem(b)))
}

fn inverse_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    let value = unary_operand(interp, self_obj, args)?;
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    Ok(interp.rt.alloc_integer(!value))
}

fn neg_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    let value = unary_operand(interp, self_obj, args)?;
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    Ok(interp.rt.alloc_integer(value.wrapping_neg()))
}

fn pos_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    let value = unary_operand(interp, self_obj, args)?;
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    Ok(interp.rt.alloc_integer(value))
}

/// Pre-increment mutates the payload in place and yields the value itself.
fn preinc_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    let value = unary_operand(interp, self_obj, args)?;
    interp.rt.heap.get_mut(self_obj).payload = Payload::Integer(value.wrapping_add(1));
    Ok(self_obj)
}

fn predec_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    let value = unary_operand(interp, self_obj, args)?;
    interp.rt.heap.get_mut(self_obj).payload = Payload::Integer(value.wrapping_sub(1));
    Ok(self_obj)
}

/// Post-increment mutates in place but yields the previous value.
fn postinc_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    let value = unary_operand(interp, self_obj, args)?;
    interp.rt.heap.get_mut(self_obj).payload = Payload::Integer(value.wrapping_add(1));
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    Ok(interp.rt.alloc_integer(value))
}

fn postdec_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    let value = unary_operand(interp, self_obj, args)?;
    interp.rt.heap.get_mut(self_obj).payload = Payload::Integer(value.wrapping_sub(1));
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    Ok(interp.rt.alloc_integer(value))
}

fn eq_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_operands(args, 1)?;
    Ok(interp.rt.protected_boolean(integers_equal(interp.rt, self_obj, args[0])))
}

fn neq_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_operands(args, 1)?;
    Ok(interp.rt.protected_boolean(!integers_equal(interp.rt, self_obj, args[0])))
}

fn integers_equal(rt: &Runtime, a: ObjRef, b: ObjRef) -> bool {
    if rt.type_of(a) != rt.type_of(b) {
        return false;
    }
    match (rt.kind_of(a), rt.kind_of(b)) {
        (ObjKind::TypeItself, ObjKind::TypeItself) => true,
        (ObjKind::Instance, ObjKind::Instance) => rt.integer_value(a) == rt.integer_value(b),
        _ => false,
    }
}

pub(crate) fn install_methods(rt: &mut Runtime) {
    let type_id = rt.builtin_types.integer;
    let wk = rt.well_known;
    for (name, method) in [
        (wk.repr, repr_method as crate::interp::NativeFn),
        (wk.string, repr_method),
        (wk.bool_, bool_method),
        (wk.int, int_method),
        (wk.real, real_method),
        (wk.char_, char_method),
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
        return Ok(interp.rt.alloc_str("Integer"));
    }
    interp.expect_instance(self_obj, interp.rt.builtin_types.integer, 0)?;
    let text = interp.rt.integer_value(self_obj).to_string();
    Ok(interp.rt.alloc_str(&text))
}

fn bool_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    interp.expect_instance(args[0], interp.rt.builtin_types.integer, 0)?;
    let value = interp.rt.integer_value(args[0]);
    Ok(interp.rt.protected_boolean(value != 0))
}

fn int_method(interp: &mut Interp<'_>, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    interp.expect_instance(args[0], interp.rt.builtin_types.integer, 0)?;
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    let value = interp.rt.integer_value(args[0]);
    Ok(interp.rt.alloc_integer(value))
}

fn real_method(interp: &mut Interp<'_>, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    interp.expect_instance(args[0], interp.rt.builtin_types.integer, 0)?;
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    let value = interp.rt.integer_value(args[0]);
    Ok(interp.rt.alloc_real(value as f64))
}

fn char_method(interp: &mut Interp<'_>, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    interp.expect_instance(args[0], interp.rt.builtin_types.integer, 0)?;
    let value = interp.rt.integer_value(args[0]);
    let Ok(byte) = u8::try_from(value) else {
        return Err(RunError::range_error(
            format!("character code {value} is out of range"),
            interp.rt.sub_area(0),
        ));
    };
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    Ok(interp.rt.alloc_character(byte))
}

fn read_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let Some(token) = interp.input.read_token() else {
        return Err(RunError::type_error("input is exhausted", interp.rt.ctx_area()));
    };
    let Ok(value) = token.parse::<i64>() else {
        return Err(RunError::type_error(
            format!("cannot read an Integer from '{token}'"),
            interp.rt.ctx_area(),
        ));
    };
    Ok(interp.rt.alloc_integer(value))
}
