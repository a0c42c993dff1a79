//! Runtime-generated record types.
//!
//! `record Name { ... }` definitions and native modules both go through
//! [`make_record_type`]: a fresh type descriptor with the declared field
//! shape, field-wise equality, and a generated `__repr__`. Instances carry
//! an ordered field map initialized to `nothing`.

use indexmap::IndexMap;

use crate::{
    ast::OperatorKind,
    errors::{RunError, RunResult},
    heap::Slot,
    intern::NameId,
    interp::Interp,
    runtime::Runtime,
    types::{TypeDesc, TypeId},
    value::{ObjKind, ObjRef, Payload},
};

/// Registers a new record type named `name` with the given field shape and
/// returns its id. Methods are added by the caller afterwards.
pub(crate) fn make_record_type(rt: &mut Runtime, name: NameId, fields: Vec<NameId>) -> TypeId {
    let instance_size = size_of::<Slot>() + fields.len() * (size_of::<NameId>() + size_of::<ObjRef>());
    let type_id = rt.register_type(|id| {
        let mut desc = TypeDesc::new(id, name, create, deep_copy, instance_size);
        desc.set_operator(OperatorKind::Eq, eq_adapter);
        desc.set_operator(OperatorKind::Neq, neq_adapter);
        desc.record_fields = Some(fields.into());
        desc
    });
    let wk = rt.well_known;
    for (method_name, method) in [(wk.repr, repr_method as crate::interp::NativeFn), (wk.string, repr_method)] {
        let value = rt.alloc_native_fn(method);
        rt.type_desc_mut(type_id).add_method(method_name, value);
    }
    type_id
}

/// Fresh instance with every declared field bound to `nothing`.
fn create(rt: &mut Runtime, type_id: TypeId) -> ObjRef {
    let fields = rt
        .type_desc(type_id)
        .record_fields
        .clone()
        .expect("record types carry their field shape");
    let mut payload = IndexMap::with_capacity(fields.len());
    for &field in fields.iter() {
        payload.insert(field, rt.nothing);
    }
    rt.alloc(type_id, Payload::Record(payload))
}

fn deep_copy(rt: &mut Runtime, obj: ObjRef) -> RunResult<ObjRef> {
    if rt.kind_of(obj) == ObjKind::TypeItself {
        return Ok(obj);
    }
    let type_id = rt.type_of(obj);
    let fields = record_fields(rt, obj).clone();
    let mut copies = IndexMap::with_capacity(fields.len());
    for (name, value) in fields {
        copies.insert(name, rt.deep_copy(value)?);
    }
    Ok(rt.alloc(type_id, Payload::Record(copies)))
}

fn record_fields(rt: &Runtime, obj: ObjRef) -> &IndexMap<NameId, ObjRef> {
    match &rt.heap.get(obj).payload {
        Payload::Record(fields) => fields,
        _ => panic!("expected a Record payload"),
    }
}

/// Guards a record method against being detached and called on a foreign
/// receiver.
fn self_record(interp: &Interp<'_>, args: &[ObjRef]) -> RunResult<ObjRef> {
    let obj = args[0];
    if interp.rt.kind_of(obj) == ObjKind::Instance && matches!(interp.rt.heap.get(obj).payload, Payload::Record(_)) {
        Ok(obj)
    } else {
        Err(RunError::type_error(
            format!("expected a record but got {}", interp.rt.type_name(obj)),
            interp.rt.sub_area(0),
        ))
    }
}

fn eq_adapter(interp: &mut Interp<'_>, self_obj: ObjRef, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_operands(args, 1)?;
    let other = args[0];
    if interp.rt.type_of(other) != interp.rt.type_of(self_obj) {
        return Ok(interp.rt.protected_boolean(false));
    }
    match (interp.rt.kind_of(self_obj), interp.rt.kind_of(other)) {
        (ObjKind::TypeItself, ObjKind::TypeItself) => Ok(interp.rt.protected_boolean(true)),
        (ObjKind::Instance, ObjKind::Instance) => {
            let left: Vec<ObjRef> = record_fields(interp.rt, self_obj).values().copied().collect();
            let right: Vec<ObjRef> = record_fields(interp.rt, other).values().copied().collect();
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

/// `Name(field = repr, ...)` over the declared fields in order.
fn repr_method(interp: &mut Interp<'_>, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let self_obj = args[0];
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    let type_name = interp.rt.type_name(self_obj).to_owned();
    if interp.rt.kind_of(self_obj) == ObjKind::TypeItself {
        return Ok(interp.rt.alloc_str(&type_name));
    }
    let self_obj = self_record(interp, args)?;
    let fields: Vec<(NameId, ObjRef)> = record_fields(interp.rt, self_obj)
        .iter()
        .map(|(&name, &value)| (name, value))
        .collect();
    let mut text = type_name;
    text.push('(');
    for (index, (name, value)) in fields.into_iter().enumerate() {
        if index > 0 {
            text.push_str(", ");
        }
        text.push_str(interp.rt.interner.name_of(name));
        text.push_str(" = ");
        text.push_str(&interp.repr_string(value)?);
    }
    text.push(')');
    Ok(interp.rt.alloc_str(&text))
}
