//! The String built-in type: a mutable byte sequence.

use crate::{
    ast::OperatorKind,
    errors::{ErrorKind, RunError, RunResult},
    heap::Slot,
    interp::{Interp, NativeFn},
    runtime::Runtime,
    types::{TypeDesc, TypeId},
    value::{ObjKind, ObjRef, Payload},
};

pub(crate) fn register(rt: &mut Runtime) -> TypeId {
    let name = rt.interner.intern("String");
    rt.register_type(|id| {
        let mut desc = TypeDesc::new(id, name, create, deep_copy, size_of::<Slot>());
        desc.set_operator(OperatorKind::Add, add_adapter);
        desc.set_operator(OperatorKind::Index, index_adapter);
        desc.set_operator(OperatorKind::IndexSet, index_set_adapter);
        desc.set_operator(OperatorKind::Eq, eq_adapter);
        desc.set_operator(OperatorKind::Neq, neq_adapter);
        desc
    })
}

fn create(rt: &mut Runtime, _type_id: TypeId) -> ObjRef {
    rt.alloc_string(Vec::new())
}

fn deep_copy(rt: &mut Runtime, obj: ObjRef) -> RunResult<ObjRef> {
    if rt.kind_of(obj) == ObjKind::TypeItself {
        return Ok(obj);
    }
    let bytes = rt.string_bytes(obj).to_vec();
    Ok(rt.alloc_string(bytes))
}

/// Checks the index operand against the string's bounds; the diagnostic
/// points at the index operand's sub-area.
fn checked_index(interp: &Interp<'_>, self_obj: ObjRef, index: ObjRef, sub: usize) -> RunResult<usize> {
    interp.expect_instance(index, interp.rt.builtin_types.integer, sub)?;
    let value = interp.rt.integer_value(index);
    let len = interp.rt.string_bytes(self_obj).len();
    if value < 0 || value as usize >= len {
        return Err(RunError::range_error(
            format!("index {value} is out of range for a string of size {len}"),
            interp.rt.sub_area(sub),
        ));
    }
    Ok(value as usize)
}

fn add_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_instance(self_obj, interp.rt.builtin_types.string, 0)?;
    interp.expect_operands(args, 1)?;
    interp.expect_instance(args[0], interp.rt.builtin_types.string, 1)?;
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    let mut bytes = interp.rt.string_bytes(self_obj).to_vec();
    bytes.extend_from_slice(interp.rt.string_bytes(args[0]));
    Ok(interp.rt.alloc_string(bytes))
}

fn index_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_instance(self_obj, interp.rt.builtin_types.string, 0)?;
    interp.expect_operands(args, 1)?;
    let index = checked_index(interp, self_obj, args[0], 1)?;
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    let byte = interp.rt.string_bytes(self_obj)[index];
    Ok(interp.rt.alloc_character(byte))
}

fn index_set_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_instance(self_obj, interp.rt.builtin_types.string, 0)?;
    interp.expect_operands(args, 2)?;
    let index = checked_index(interp, self_obj, args[0], 1)?;
    interp.expect_instance(args[1], interp.rt.builtin_types.character, 2)?;
    let byte = interp.rt.character_value(args[1]);
    string_bytes_mut(interp.rt, self_obj)[index] = byte;
    Ok(interp.rt.nothing)
}

fn eq_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_operands(args, 1)?;
    Ok(interp.rt.protected_boolean(strings_equal(interp.rt, self_obj, args[0])))
}

fn neq_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_operands(args, 1)?;
    Ok(interp.rt.protected_boolean(!strings_equal(interp.rt, self_obj, args[0])))
}

fn strings_equal(rt: &Runtime, a: ObjRef, b: ObjRef) -> bool {
    if rt.type_of(a) != rt.type_of(b) {
        return false;
    }
    match (rt.kind_of(a), rt.kind_of(b)) {
        (ObjKind::TypeItself, ObjKind::TypeItself) => true,
        (ObjKind::Instance, ObjKind::Instance) => rt.string_bytes(a) == rt.string_bytes(b),
        _ => false,
    }
}

fn string_bytes_mut(rt: &mut Runtime, obj: ObjRef) -> &mut Vec<u8> {
    match &mut rt.heap.get_mut(obj).payload {
        Payload::Str(bytes) => bytes,
        _ => panic!("expected a String payload"),
    }
}

pub(crate) fn install_methods(rt: &mut Runtime) {
    let type_id = rt.builtin_types.string;
    let wk = rt.well_known;
    let entries: &[(&str, NativeFn)] = &[
        ("size", size_method),
        ("set", set_method),
        ("clear", clear_method),
        ("empty", empty_method),
        ("reverse", reverse_method),
        ("prepend", prepend_method),
        ("append", append_method),
        ("delpref", delpref_method),
        ("delsuf", delsuf_method),
        ("copy", copy_method),
        ("substr", substr_method),
        ("array", array_method),
    ];
    for &(name, method) in entries {
        let name = rt.interner.intern(name);
        let value = rt.alloc_native_fn(method);
        rt.type_desc_mut(type_id).add_method(name, value);
    }
    for (name, method) in [
        (wk.repr, repr_method as NativeFn),
        (wk.string, string_magic_method),
        (wk.bool_, bool_method),
        (wk.int, int_method),
        (wk.real, real_method),
        (wk.read, read_method),
    ] {
        let value = rt.alloc_native_fn(method);
        rt.type_desc_mut(type_id).add_method(name, value);
    }
}

fn self_string(interp: &Interp<'_>, args: &[ObjRef]) -> RunResult<ObjRef> {
    interp.expect_instance(args[0], interp.rt.builtin_types.string, 0)?;
    Ok(args[0])
}

fn size_method(interp: &mut Interp<'_>, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let self_obj = self_string(interp, args)?;
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    let len = interp.rt.string_bytes(self_obj).len() as i64;
    Ok(interp.rt.alloc_integer(len))
}

fn set_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 2)?;
    let self_obj = self_string(interp, args)?;
    let index = checked_index(interp, self_obj, args[1], 1)?;
    interp.expect_instance(args[2], interp.rt.builtin_types.character, 2)?;
    let byte = interp.rt.character_value(args[2]);
    string_bytes_mut(interp.rt, self_obj)[index] = byte;
    Ok(self_obj)
}

fn clear_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let self_obj = self_string(interp, args)?;
    string_bytes_mut(interp.rt, self_obj).clear();
    Ok(self_obj)
}

fn empty_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let self_obj = self_string(interp, args)?;
    let empty = interp.rt.string_bytes(self_obj).is_empty();
    Ok(interp.rt.protected_boolean(empty))
}

fn reverse_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let self_obj = self_string(interp, args)?;
    string_bytes_mut(interp.rt, self_obj).reverse();
    Ok(self_obj)
}

fn prepend_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 1)?;
    let self_obj = self_string(interp, args)?;
    interp.expect_instance(args[1], interp.rt.builtin_types.string, 1)?;
    let mut joined = interp.rt.string_bytes(args[1]).to_vec();
    joined.extend_from_slice(interp.rt.string_bytes(self_obj));
    *string_bytes_mut(interp.rt, self_obj) = joined;
    Ok(self_obj)
}

fn append_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 1)?;
    let self_obj = self_string(interp, args)?;
    interp.expect_instance(args[1], interp.rt.builtin_types.string, 1)?;
    let suffix = interp.rt.string_bytes(args[1]).to_vec();
    string_bytes_mut(interp.rt, self_obj).extend_from_slice(&suffix);
    Ok(self_obj)
}

/// Strips `prefix` when the string starts with it; otherwise leaves the
/// string untouched.
fn delpref_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 1)?;
    let self_obj = self_string(interp, args)?;
    interp.expect_instance(args[1], interp.rt.builtin_types.string, 1)?;
    let prefix_len = interp.rt.string_bytes(args[1]).len();
    let matches = interp
        .rt
        .string_bytes(self_obj)
        .starts_with(interp.rt.string_bytes(args[1]));
    if matches {
        string_bytes_mut(interp.rt, self_obj).drain(..prefix_len);
    }
    Ok(self_obj)
}

fn delsuf_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 1)?;
    let self_obj = self_string(interp, args)?;
    interp.expect_instance(args[1], interp.rt.builtin_types.string, 1)?;
    let suffix_len = interp.rt.string_bytes(args[1]).len();
    let matches = interp.rt.string_bytes(self_obj).ends_with(interp.rt.string_bytes(args[1]));
    if matches {
        let bytes = string_bytes_mut(interp.rt, self_obj);
        let new_len = bytes.len() - suffix_len;
        bytes.truncate(new_len);
    }
    Ok(self_obj)
}

fn copy_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let self_obj = self_string(interp, args)?;
    interp.rt.deep_copy(self_obj)
}

/// `substr(begin, end)` — half-open byte range, clamped to the string.
fn substr_method(interp: &mut Interp<'_>, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 2)?;
    let self_obj = self_string(interp, args)?;
    interp.expect_instance(args[1], interp.rt.builtin_types.integer, 1)?;
    interp.expect_instance(args[2], interp.rt.builtin_types.integer, 2)?;
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    let bytes = interp.rt.string_bytes(self_obj);
    let begin = interp.rt.integer_value(args[1]).max(0) as usize;
    let end = (interp.rt.integer_value(args[2]).max(0) as usize).min(bytes.len());
    let slice = if begin >= end { Vec::new() } else { bytes[begin..end].to_vec() };
    Ok(interp.rt.alloc_string(slice))
}

/// Explodes the string into an array of characters.
fn array_method(interp: &mut Interp<'_>, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let self_obj = self_string(interp, args)?;
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    let bytes = interp.rt.string_bytes(self_obj).to_vec();
    let mark = interp.temp_mark();
    for byte in bytes {
        let character = interp.rt.alloc_character(byte);
        interp.temp_push(character);
    }
    let items = interp.rt.temp_roots[mark..].to_vec();
    for &item in &items {
        interp.rt.spread_multi_use(item);
    }
    let array = interp.rt.alloc_array(items);
    interp.temp_reset(mark);
    Ok(array)
}

fn repr_method(interp: &mut Interp<'_>, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let self_obj = args[0];
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    if interp.rt.kind_of(self_obj) == ObjKind::TypeItself {
        return Ok(interp.rt.alloc_str("String"));
    }
    interp.expect_instance(self_obj, interp.rt.builtin_types.string, 0)?;
    let bytes = interp.rt.string_bytes(self_obj).to_vec();
    Ok(interp.rt.alloc_string(bytes))
}

fn string_magic_method(interp: &mut Interp<'_>, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    repr_method(interp, args, result_needed)
}

/// `"true"` and `"false"` convert; any other content is a type error.
fn bool_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let self_obj = self_string(interp, args)?;
    let truth = match interp.rt.string_bytes(self_obj) {
        b"true" => true,
        b"false" => false,
        bytes => {
            return Err(RunError::type_error(
                format!("cannot convert '{}' to Boolean", String::from_utf8_lossy(bytes)),
                interp.rt.sub_area(0),
            ));
        }
    };
    Ok(interp.rt.protected_boolean(truth))
}

fn int_method(interp: &mut Interp<'_>, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let self_obj = self_string(interp, args)?;
    let text = String::from_utf8_lossy(interp.rt.string_bytes(self_obj)).into_owned();
    let Ok(value) = text.trim().parse::<i64>() else {
        return Err(RunError::new(
            ErrorKind::Type,
            format!("cannot convert '{text}' to Integer"),
            interp.rt.sub_area(0),
        ));
    };
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    Ok(interp.rt.alloc_integer(value))
}

fn real_method(interp: &mut Interp<'_>, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let self_obj = self_string(interp, args)?;
    let text = String::from_utf8_lossy(interp.rt.string_bytes(self_obj)).into_owned();
    let Ok(value) = text.trim().parse::<f64>() else {
        return Err(RunError::new(
            ErrorKind::Type,
            format!("cannot convert '{text}' to Real"),
            interp.rt.sub_area(0),
        ));
    };
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    Ok(interp.rt.alloc_real(value))
}

fn read_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let Some(token) = interp.input.read_token() else {
        return Err(RunError::type_error("input is exhausted", interp.rt.ctx_area()));
    };
    Ok(interp.rt.alloc_str(&token))
}
