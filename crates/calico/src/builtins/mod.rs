//! Global built-in functions, installed into the bottom scope frame.

use crate::{
    errors::{ErrorKind, RunError, RunResult},
    intern::NameId,
    interp::{Interp, NativeFn},
    modules,
    runtime::Runtime,
    value::{ObjKind, ObjRef, Payload},
};

/// Binds every built-in function in the global frame.
pub(crate) fn install(rt: &mut Runtime) {
    let entries: &[(&str, NativeFn)] = &[
        ("print", print),
        ("printr", printr),
        ("make", make),
        ("exit", exit),
        ("system", system),
        ("int", to_int),
        ("bool", to_bool),
        ("real", to_real),
        ("char", to_char),
        ("string", to_string),
        ("read", read),
        ("argc", argc),
        ("argg", argg),
        ("load", load),
    ];
    for &(name, func) in entries {
        let name = rt.interner.intern(name);
        let value = rt.alloc_native_fn(func);
        rt.scopes.add_variable(name, value);
    }
}

/// Formats one value for `print`: strings and characters print their raw
/// contents, everything else goes through `__repr__`.
fn printable(interp: &mut Interp<'_>, value: ObjRef) -> RunResult<String> {
    if interp.rt.kind_of(value) == ObjKind::Instance {
        match &interp.rt.heap.get(value).payload {
            Payload::Str(bytes) => return Ok(String::from_utf8_lossy(bytes).into_owned()),
            Payload::Character(byte) => return Ok((*byte as char).to_string()),
            _ => {}
        }
    }
    interp.repr_string(value)
}

/// Space-separated arguments followed by a newline.
fn print(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    for (index, &arg) in args.iter().enumerate() {
        if index > 0 {
            interp.out.stdout_push(' ');
        }
        let text = printable(interp, arg)?;
        interp.out.stdout_write(text.into());
    }
    interp.out.stdout_push('\n');
    Ok(interp.rt.nothing)
}

/// Raw print: no separators, no newline.
fn printr(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    for &arg in args {
        let text = printable(interp, arg)?;
        interp.out.stdout_write(text.into());
    }
    Ok(interp.rt.nothing)
}

fn make(interp: &mut Interp<'_>, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_args(args, 1)?;
    let arg = args[0];
    if interp.rt.kind_of(arg) != ObjKind::TypeItself {
        return Err(RunError::type_error(
            format!("expected a type but got an instance of {}", interp.rt.type_name(arg)),
            interp.rt.sub_area(1),
        ));
    }
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    let type_id = interp.rt.type_of(arg);
    Ok(interp.rt.make_instance(type_id))
}

fn exit(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    use std::io::Write as _;

    interp.expect_args(args, 1)?;
    interp.expect_instance(args[0], interp.rt.builtin_types.integer, 1)?;
    let code = interp.rt.integer_value(args[0]);
    // `process::exit` runs no destructors; pending output that has not hit
    // a newline is still sitting in stdout's line buffer.
    let _ = std::io::stdout().flush();
    std::process::exit(code as i32);
}

/// Runs a shell command; yields its exit code.
fn system(interp: &mut Interp<'_>, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_args(args, 1)?;
    interp.expect_instance(args[0], interp.rt.builtin_types.string, 1)?;
    let command = String::from_utf8_lossy(interp.rt.string_bytes(args[0])).into_owned();
    let status = std::process::Command::new("sh").arg("-c").arg(&command).status();
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    let code = match status {
        Ok(status) => i64::from(status.code().unwrap_or(-1)),
        Err(_) => -1,
    };
    Ok(interp.rt.alloc_integer(code))
}

/// Shared body for the explicit coercion builtins: dispatches the magic
/// method, reporting a type error when the type does not implement it.
fn coerce(interp: &mut Interp<'_>, args: &[ObjRef], magic: NameId, target: &str) -> RunResult<ObjRef> {
    interp.expect_args(args, 1)?;
    let arg = args[0];
    let type_id = interp.rt.type_of(arg);
    if !interp.rt.type_desc(type_id).methods.contains_key(&magic) {
        return Err(RunError::type_error(
            format!("cannot convert {} to {target}", interp.rt.type_name(arg)),
            interp.rt.sub_area(1),
        ));
    }
    interp.run_method(magic, arg, &[], true)
}

fn to_int(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    let magic = interp.rt.well_known.int;
    coerce(interp, args, magic, "Integer")
}

fn to_bool(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    let magic = interp.rt.well_known.bool_;
    coerce(interp, args, magic, "Boolean")
}

fn to_real(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    let magic = interp.rt.well_known.real;
    coerce(interp, args, magic, "Real")
}

fn to_char(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    let magic = interp.rt.well_known.char_;
    coerce(interp, args, magic, "Character")
}

fn to_string(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    let magic = interp.rt.well_known.string;
    coerce(interp, args, magic, "String")
}

/// `read(T)` — input binding through the type's `__read__`.
fn read(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_args(args, 1)?;
    let arg = args[0];
    if interp.rt.kind_of(arg) != ObjKind::TypeItself {
        return Err(RunError::type_error(
            format!("expected a type but got an instance of {}", interp.rt.type_name(arg)),
            interp.rt.sub_area(1),
        ));
    }
    let magic = interp.rt.well_known.read;
    interp.run_method(magic, arg, &[], true)
}

/// Number of raw arguments passed to the enclosing function call.
fn argc(interp: &mut Interp<'_>, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_args(args, 0)?;
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    let count = interp.rt.scopes.arguments_of_enclosing_call().map_or(0, <[ObjRef]>::len);
    Ok(interp.rt.alloc_integer(count as i64))
}

/// The i-th raw argument of the enclosing call; `nothing` out of range.
fn argg(interp: &mut Interp<'_>, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_args(args, 1)?;
    interp.expect_instance(args[0], interp.rt.builtin_types.integer, 1)?;
    if !result_needed {
        return Ok(interp.rt.nothing);
    }
    let index = interp.rt.integer_value(args[0]);
    let Some(arguments) = interp.rt.scopes.arguments_of_enclosing_call() else {
        return Ok(interp.rt.nothing);
    };
    let Ok(index) = usize::try_from(index) else {
        return Ok(interp.rt.nothing);
    };
    Ok(arguments.get(index).copied().unwrap_or(interp.rt.nothing))
}

/// Resolves a native module by name and yields its exported object.
fn load(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_args(args, 1)?;
    interp.expect_instance(args[0], interp.rt.builtin_types.string, 1)?;
    let name = String::from_utf8_lossy(interp.rt.string_bytes(args[0])).into_owned();
    match modules::load_module(interp, &name) {
        Some(result) => result,
        None => Err(RunError::new(
            ErrorKind::Module,
            format!("unknown module '{name}'"),
            interp.rt.sub_area(1),
        )),
    }
}
