//! The Character built-in type: a single byte.

use crate::{
    ast::OperatorKind,
    errors::{RunError, RunResult},
    heap::Slot,
    interp::Interp,
    runtime::Runtime,
    types::{TypeDesc, TypeId},
    value::{ObjKind, ObjRef, Payload},
};

pub(crate) fn register(rt: &mut Runtime) -> TypeId {
    let name = rt.interner.intern("Character");
    rt.register_type(|id| {
        let mut desc = TypeDesc::new(id, name, create, deep_copy, size_of::<Slot>());
        desc.set_operator(OperatorKind::Add, add_adapter);
        desc.set_operator(OperatorKind::Sub, sub_adapter);
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
    rt.alloc_character(0)
}

fn deep_copy(rt: &mut Runtime, obj: ObjRef) -> RunResult<ObjRef> {
    if rt.kind_of(obj) == ObjKind::TypeItself {
        return Ok(obj);
    }
    let value = rt.character_value(obj);
    Ok(rt.alloc_character(value))
}

fn binary_operands(interp: &Interp<'_>, self_obj: ObjRef, args: &[ObjRef]) -> RunResult<(u8, u8)> {
    interp.expect_instance(self_obj, interp.rt.builtin_types.character, 0)?;
    interp.expect_operands(args, 1)?;
    interp.expect_instance(args[0], interp.rt.builtin_types.character, 1)?;
    Ok((interp.rt.character_value(self_obj), interp.rt.character_value(args[0])))
}

fn unary_operand(interp: &Interp<'_>, self_obj: ObjRef, args: &[ObjRef]) -> RunResult<u8> {
    interp.expect_instance(self_obj, interp.rt.builtin_types.character, 0)?;
    interp.expect_operands(args, 0)?;
    Ok(interp.rt.character_value(self_obj))
}

macro_rules! comparison_adapter {
    ($name:ident, $apply:expr) => {
        fn $name(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
            let (a, b) = binary_operands(interp, self_obj, args)?;
            let apply: fn(u8, u8) -> bool = $apply;
            Ok(interp.rt.protected_boolean(apply(a, b)))
        }
    };
}

comparison_adapter!(lt_adapter, |a, b| a < b);
comparison_adapter!(leq_adapter, |a, b| a <= b);
comparison_adapter!(gt_adapter, |a, b| a > b);
comparison_adapter!(geq_adapter, |a, b| a >= b);

fn add_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    let (a, b) = binary_operands(interp, self_obj, args)?;
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    Ok(interp.rt.alloc_character(a.wrapping_add(b)))
}

fn sub_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    let (a, b) = binary_operands(interp, self_obj, args)?;
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    Ok(interp.rt.alloc_character(a.wrapping_sub(b)))
}

fn neg_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    let value = unary_operand(interp, self_obj, args)?;
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    Ok(interp.rt.alloc_character(value.wrapping_neg()))
}

fn pos_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    let value = unary_operand(interp, self_obj, args)?;
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    Ok(interp.rt.alloc_character(value))
}

fn preinc_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    let value = unary_operand(interp, self_obj, args)?;
    interp.rt.heap.get_mut(self_obj).payload = Payload::Character(value.wrapping_add(1));
    Ok(self_obj)
}

fn predec_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    let value = unary_operand(interp, self_obj, args)?;
    interp.rt.heap.get_mut(self_obj).payload = Payload::Character(value.wrapping_sub(1));
    Ok(self_obj)
}

fn postinc_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    let value = unary_operand(interp, self_obj, args)?;
    interp.rt.heap.get_mut(self_obj).payload = Payload::Character(value.wrapping_add(1));
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    Ok(interp.rt.alloc_character(value))
}

fn postdec_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    let value = unary_operand(interp, self_obj, args)?;
    interp.rt.heap.get_mut(self_obj).payload = Payload::Character(value.wrapping_sub(1));
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    Ok(interp.rt.alloc_character(value))
}

fn eq_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_operands(args, 1)?;
    Ok(interp.rt.protected_boolean(characters_equal(interp.rt, self_obj, args[0])))
}

fn neq_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_operands(args, 1)?;
    Ok(interp.rt.protected_boolean(!characters_equal(interp.rt, self_obj, args[0])))
}

fn characters_equal(rt: &Runtime, a: ObjRef, b: ObjRef) -> bool {
    if rt.type_of(a) != rt.type_of(b) {
        return false;
    }
    match (rt.kind_of(a), rt.kind_of(b)) {
        (ObjKind::TypeItself, ObjKind::TypeItself) => true,
        (ObjKind::Instance, ObjKind::Instance) => rt.character_value(a) == rt.character_value(b),
        _ => false,
    }
}

pub(crate) fn install_methods(rt: &mut Runtime) {
    let type_id = rt.builtin_types.character;
    let wk = rt.well_known;
    for (name, method) in [
        (wk.repr, repr_method as crate::interp::NativeFn),
        (wk.string, repr_method),
        (wk.bool_, bool_method),
        (wk.int, int_method),
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
        return Ok(interp.rt.alloc_str("Character"));
    }
    interp.expect_instance(self_obj, interp.rt.builtin_types.character, 0)?;
    let value = interp.rt.character_value(self_obj);
    Ok(interp.rt.alloc_string(vec![value]))
}

fn bool_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    interp.expect_instance(args[0], interp.rt.builtin_types.character, 0)?;
    let value = interp.rt.character_value(args[0]);
    Ok(interp.rt.protected_boolean(value != 0))
}

fn int_method(interp: &mut Interp<'_>, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    interp.expect_instance(args[0], interp.rt.builtin_types.character, 0)?;
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    let value = interp.rt.character_value(args[0]);
    Ok(interp.rt.alloc_integer(i64::from(value)))
}

fn char_method(interp: &mut Interp<'_>, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    interp.expect_instance(args[0], interp.rt.builtin_types.character, 0)?;
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    let value = interp.rt.character_value(args[0]);
    Ok(interp.rt.alloc_character(value))
}

fn read_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let Some(token) = interp.input.read_token() else {
        return Err(RunError::type_error("input is exhausted", interp.rt.ctx_area()));
    };
    let byte = token.as_bytes().first().copied().unwrap_or(0);
    Ok(interp.rt.alloc_character(byte))
}
