//! The Array built-in type: an ordered, mutable sequence of references.
//!
//! Elements are shared references, so `a[0] = x; b = a;` aliases. The
//! higher-order methods (`filter`, `apply`, `sort`, `combine`) call back
//! into the evaluator through the `Call` slot; while a callback runs, the
//! array itself stays reachable from the caller's operand stack, which is
//! what keeps its elements alive across collection safe points inside the
//! callback.

use crate::{
    ast::OperatorKind,
    errors::{RunError, RunResult},
    heap::Slot,
    interp::{Interp, NativeFn},
    runtime::Runtime,
    types::{TypeDesc, TypeId},
    value::{ObjKind, ObjRef, Payload},
};

pub(crate) fn register(rt: &mut Runtime) -> TypeId {
    let name = rt.interner.intern("Array");
    rt.register_type(|id| {
        let mut desc = TypeDesc::new(id, name, create, deep_copy, size_of::<Slot>());
        desc.set_operator(OperatorKind::Index, index_adapter);
        desc.set_operator(OperatorKind::IndexSet, index_set_adapter);
        desc.set_operator(OperatorKind::Eq, eq_adapter);
        desc.set_operator(OperatorKind::Neq, neq_adapter);
        desc
    })
}

fn create(rt: &mut Runtime, _type_id: TypeId) -> ObjRef {
    rt.alloc_array(Vec::new())
}

fn deep_copy(rt: &mut Runtime, obj: ObjRef) -> RunResult<ObjRef> {
    if rt.kind_of(obj) == ObjKind::TypeItself {
        return Ok(obj);
    }
    let items = array_items(rt, obj).to_vec();
    let mut copies = Vec::with_capacity(items.len());
    for item in items {
        copies.push(rt.deep_copy(item)?);
    }
    Ok(rt.alloc_array(copies))
}

fn array_items(rt: &Runtime, obj: ObjRef) -> &[ObjRef] {
    match &rt.heap.get(obj).payload {
        Payload::Array(items) => items,
        _ => panic!("expected an Array payload"),
    }
}

fn array_items_mut(rt: &mut Runtime, obj: ObjRef) -> &mut Vec<ObjRef> {
    match &mut rt.heap.get_mut(obj).payload {
        Payload::Array(items) => items,
        _ => panic!("expected an Array payload"),
    }
}

fn checked_index(interp: &Interp<'_>, self_obj: ObjRef, index: ObjRef, sub: usize) -> RunResult<usize> {
    interp.expect_instance(index, interp.rt.builtin_types.integer, sub)?;
    let value = interp.rt.integer_value(index);
    let len = array_items(interp.rt, self_obj).len();
    if value < 0 || value as usize >= len {
        return Err(RunError::range_error(
            format!("index {value} is out of range for an array of size {len}"),
            interp.rt.sub_area(sub),
        ));
    }
    Ok(value as usize)
}

fn index_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_instance(self_obj, interp.rt.builtin_types.array, 0)?;
    interp.expect_operands(args, 1)?;
    let index = checked_index(interp, self_obj, args[0], 1)?;
    Ok(array_items(interp.rt, self_obj)[index])
}

fn index_set_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_instance(self_obj, interp.rt.builtin_types.array, 0)?;
    interp.expect_operands(args, 2)?;
    let index = checked_index(interp, self_obj, args[0], 1)?;
    let value = args[1];
    interp.rt.spread_multi_use(value);
    array_items_mut(interp.rt, self_obj)[index] = value;
    Ok(interp.rt.nothing)
}

/// Element-wise equality; each pair compares through the `Eq` slot under a
/// fresh context.
fn eq_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_operands(args, 1)?;
    let other = args[0];
    let rt = &*interp.rt;
    if rt.type_of(other) != rt.type_of(self_obj) {
        return Ok(rt.protected_boolean(false));
    }
    match (rt.kind_of(self_obj), rt.kind_of(other)) {
        (ObjKind::TypeItself, ObjKind::TypeItself) => Ok(interp.rt.protected_boolean(true)),
        (ObjKind::Instance, ObjKind::Instance) => {
            let left = array_items(interp.rt, self_obj).to_vec();
            let right = array_items(interp.rt, other).to_vec();
            if left.len() != right.len() {
                return Ok(interp.rt.protected_boolean(false));
            }
            for (a, b) in left.into_iter().zip(right) {
                if !interp.values_equal(a, b)? {
                    return Ok(interp.rt.protected_boolean(false));
                }
            }
            Ok(interp.rt.protected_boolean(true))
        }
        _ => Ok(interp.rt.protected_boolean(false)),
    }
}

fn neq_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    let equal = eq_adapter(interp, self_obj, args, result_needed)?;
    let value = interp.rt.boolean_value(equal);
    Ok(interp.rt.protected_boolean(!value))
}

pub(crate) fn install_methods(rt: &mut Runtime) {
    let type_id = rt.builtin_types.array;
    let wk = rt.well_known;
    let entries: &[(&str, NativeFn)] = &[
        ("size", size_method),
        ("resize", resize_method),
        ("append", append_method),
        ("prepend", prepend_method),
        ("poplast", poplast_method),
        ("popfirst", popfirst_method),
        ("first", first_method),
        ("last", last_method),
        ("empty", empty_method),
        ("clear", clear_method),
        ("copy", copy_method),
        ("filter", filter_method),
        ("apply", apply_method),
        ("reverse", reverse_method),
        ("sort", sort_method),
        ("combine", combine_method),
    ];
    for &(name, method) in entries {
        let name = rt.interner.intern(name);
        let value = rt.alloc_native_fn(method);
        rt.type_desc_mut(type_id).add_method(name, value);
    }
    for (name, method) in [(wk.repr, repr_method as NativeFn), (wk.string, repr_method)] {
        let value = rt.alloc_native_fn(method);
        rt.type_desc_mut(type_id).add_method(name, value);
    }
}

fn self_array(interp: &Interp<'_>, args: &[ObjRef]) -> RunResult<ObjRef> {
    interp.expect_instance(args[0], interp.rt.builtin_types.array, 0)?;
    Ok(args[0])
}

fn size_method(interp: &mut Interp<'_>, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let self_obj = self_array(interp, args)?;
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    let len = array_items(interp.rt, self_obj).len() as i64;
    Ok(interp.rt.alloc_integer(len))
}

/// `resize(n)` with `n >= 0`; new slots are filled with fresh nothings.
fn resize_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 1)?;
    let self_obj = self_array(interp, args)?;
    interp.expect_instance(args[1], interp.rt.builtin_types.integer, 1)?;
    let new_size = interp.rt.integer_value(args[1]);
    if new_size < 0 {
        return Err(RunError::range_error(
            format!("new array size must not be negative: {new_size}"),
            interp.rt.sub_area(1),
        ));
    }
    let new_size = new_size as usize;
    let old_size = array_items(interp.rt, self_obj).len();
    if new_size <= old_size {
        array_items_mut(interp.rt, self_obj).truncate(new_size);
    } else {
        for _ in old_size..new_size {
            let filler = interp.rt.alloc_nothing();
            interp.rt.spread_multi_use(filler);
            array_items_mut(interp.rt, self_obj).push(filler);
        }
    }
    Ok(self_obj)
}

/// Appends every argument, in order.
fn append_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    let self_obj = self_array(interp, args)?;
    for &value in &args[1..] {
        interp.rt.spread_multi_use(value);
        array_items_mut(interp.rt, self_obj).push(value);
    }
    Ok(self_obj)
}

fn prepend_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    let self_obj = self_array(interp, args)?;
    let mut items = args[1..].to_vec();
    for &value in &items {
        interp.rt.spread_multi_use(value);
    }
    items.extend_from_slice(array_items(interp.rt, self_obj));
    *array_items_mut(interp.rt, self_obj) = items;
    Ok(self_obj)
}

fn poplast_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let self_obj = self_array(interp, args)?;
    array_items_mut(interp.rt, self_obj).pop();
    Ok(self_obj)
}

fn popfirst_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let self_obj = self_array(interp, args)?;
    let items = array_items_mut(interp.rt, self_obj);
    if !items.is_empty() {
        items.remove(0);
    }
    Ok(self_obj)
}

fn first_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let self_obj = self_array(interp, args)?;
    Ok(array_items(interp.rt, self_obj).first().copied().unwrap_or(interp.rt.nothing))
}

fn last_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let self_obj = self_array(interp, args)?;
    Ok(array_items(interp.rt, self_obj).last().copied().unwrap_or(interp.rt.nothing))
}

fn empty_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let self_obj = self_array(interp, args)?;
    let empty = array_items(interp.rt, self_obj).is_empty();
    Ok(interp.rt.protected_boolean(empty))
}

fn clear_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let self_obj = self_array(interp, args)?;
    array_items_mut(interp.rt, self_obj).clear();
    Ok(self_obj)
}

fn copy_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let self_obj = self_array(interp, args)?;
    interp.rt.deep_copy(self_obj)
}

/// Keeps the elements the predicate accepts, mutating in place.
fn filter_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 1)?;
    let self_obj = self_array(interp, args)?;
    let predicate = args[1];
    interp.expect_instance(predicate, interp.rt.builtin_types.function, 1)?;
    let items = array_items(interp.rt, self_obj).to_vec();
    let mut kept = Vec::new();
    interp.with_synthetic_context(2, |interp| {
        for item in items {
            let verdict = interp.run_operator(OperatorKind::Call, predicate, &[item], true)?;
            if interp.truthy(verdict)? {
                kept.push(item);
            }
        }
        Ok(())
    })?;
    *array_items_mut(interp.rt, self_obj) = kept;
    Ok(self_obj)
}

/// Replaces each element with `f(element)`.
fn apply_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 1)?;
    let self_obj = self_array(interp, args)?;
    let func = args[1];
    interp.expect_instance(func, interp.rt.builtin_types.function, 1)?;
    let items = array_items(interp.rt, self_obj).to_vec();
    interp.with_synthetic_context(2, |interp| {
        for (index, item) in items.into_iter().enumerate() {
            let mapped = interp.run_operator(OperatorKind::Call, func, &[item], true)?;
            interp.rt.spread_multi_use(mapped);
            // Store back immediately so the result is reachable through
            // the array before the next callback runs. The callback may
            // have shrunk the array under us.
            if let Some(slot) = array_items_mut(interp.rt, self_obj).get_mut(index) {
                *slot = mapped;
            }
        }
        Ok(())
    })?;
    Ok(self_obj)
}

fn reverse_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let self_obj = self_array(interp, args)?;
    array_items_mut(interp.rt, self_obj).reverse();
    Ok(self_obj)
}

/// `sort(cmp)` where `cmp(a, b)` answers whether `a` orders before `b`.
/// Merge sort keeps the comparator call count at `O(n log n)` and the
/// ordering stable.
fn sort_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 1)?;
    let self_obj = self_array(interp, args)?;
    let comparator = args[1];
    interp.expect_instance(comparator, interp.rt.builtin_types.function, 1)?;
    let items = array_items(interp.rt, self_obj).to_vec();
    let sorted = interp.with_synthetic_context(2, |interp| merge_sort(interp, comparator, items))?;
    *array_items_mut(interp.rt, self_obj) = sorted;
    Ok(self_obj)
}

fn merge_sort(interp: &mut Interp<'_>, comparator: ObjRef, items: Vec<ObjRef>) -> RunResult<Vec<ObjRef>> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let middle = items.len() / 2;
    let mut right = items;
    let left = merge_sort(interp, comparator, right.drain(..middle).collect())?;
    let right = merge_sort(interp, comparator, right)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        let verdict = interp.run_operator(OperatorKind::Call, comparator, &[right[j], left[i]], true)?;
        // Take from the right only when it strictly orders before the
        // left; ties keep the left element first (stability).
        if interp.truthy(verdict)? {
            merged.push(right[j]);
            j += 1;
        } else {
            merged.push(left[i]);
            i += 1;
        }
    }
    merged.extend_from_slice(&left[i..]);
    merged.extend_from_slice(&right[j..]);
    Ok(merged)
}

/// Left fold: `combine(f, init)` evaluates `f(acc, element)` across the
/// array.
fn combine_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 2)?;
    let self_obj = self_array(interp, args)?;
    let func = args[1];
    interp.expect_instance(func, interp.rt.builtin_types.function, 1)?;
    let mut accumulator = args[2];
    let items = array_items(interp.rt, self_obj).to_vec();
    let mark = interp.temp_mark();
    let result = interp.with_synthetic_context(2, |interp| {
        for item in items {
            accumulator = interp.run_operator(OperatorKind::Call, func, &[accumulator, item], true)?;
            // The fresh accumulator must survive the next callback's safe
            // points.
            interp.temp_push(accumulator);
        }
        Ok(accumulator)
    });
    interp.temp_reset(mark);
    result
}

/// `{e1, e2, ...}` via each element's `__repr__`.
fn repr_method(interp: &mut Interp<'_>, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let self_obj = args[0];
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    if interp.rt.kind_of(self_obj) == ObjKind::TypeItself {
        return Ok(interp.rt.alloc_str("Array"));
    }
    interp.expect_instance(self_obj, interp.rt.builtin_types.array, 0)?;
    let items = array_items(interp.rt, self_obj).to_vec();
    let mut text = String::from("{");
    for (index, item) in items.into_iter().enumerate() {
        if index > 0 {
            text.push_str(", ");
        }
        text.push_str(&interp.repr_string(item)?);
    }
    text.push('}');
    Ok(interp.rt.alloc_str(&text))
}
