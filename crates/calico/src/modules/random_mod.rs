//! The `random` module: a seedable pseudo-random source.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    errors::{RunError, RunResult},
    interp::{Interp, NativeFn},
    types::record::make_record_type,
    value::ObjRef,
};

pub(crate) fn load(interp: &mut Interp<'_>) -> RunResult<ObjRef> {
    let rt = &mut *interp.rt;
    let name = rt.interner.intern("Random");
    let type_id = make_record_type(rt, name, Vec::new());
    let entries: &[(&str, NativeFn)] = &[("seed", seed), ("randint", randint)];
    for &(method_name, method) in entries {
        let method_name = rt.interner.intern(method_name);
        let value = rt.alloc_native_fn(method);
        rt.type_desc_mut(type_id).add_method(method_name, value);
    }
    Ok(rt.make_instance(type_id))
}

/// Reseeds the runtime's generator for reproducible sequences.
fn seed(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 1)?;
    interp.expect_instance(args[1], interp.rt.builtin_types.integer, 1)?;
    let seed = interp.rt.integer_value(args[1]);
    interp.rt.rng = StdRng::seed_from_u64(seed as u64);
    Ok(interp.rt.nothing)
}

/// Uniform integer in `[low, high]`.
fn randint(interp: &mut Interp<'_>, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 2)?;
    interp.expect_instance(args[1], interp.rt.builtin_types.integer, 1)?;
    interp.expect_instance(args[2], interp.rt.builtin_types.integer, 2)?;
    let low = interp.rt.integer_value(args[1]);
    let high = interp.rt.integer_value(args[2]);
    if low > high {
        return Err(RunError::range_error(
            format!("empty range: {low} > {high}"),
            interp.rt.sub_area(1),
        ));
    }
    // The generator advances even when the result is discarded, so the
    // observable sequence does not depend on how a call is used.
    let value = interp.rt.rng.gen_range(low..=high);
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    Ok(interp.rt.alloc_integer(value))
}
