//! The `io` module: file handles with an observable error status.
//!
//! Unlike every other failure in the interpreter, file operations never
//! abort: a failed open, read, or write sets the handle's status pair,
//! which scripts inspect through `error()` / `errormessage()`. The handle
//! closes its descriptor when the collector finalizes it, or earlier via
//! `close()`.

use std::{
    fs::{File, OpenOptions},
    io::{Read, Write},
};

use crate::{
    errors::{RunError, RunResult},
    heap::Slot,
    interp::{Interp, NativeFn},
    runtime::Runtime,
    types::{TypeDesc, TypeId, record::make_record_type},
    value::{ObjKind, ObjRef, Payload},
};

/// Payload state of a File value.
#[derive(Debug, Default)]
pub struct FileHandle {
    file: Option<File>,
    error: bool,
    error_message: String,
}

impl FileHandle {
    fn fail(&mut self, message: impl Into<String>) {
        self.error = true;
        self.error_message = message.into();
    }
}

pub(crate) fn load(interp: &mut Interp<'_>) -> RunResult<ObjRef> {
    let rt = &mut *interp.rt;
    let name = rt.interner.intern("io");
    let type_id = make_record_type(rt, name, Vec::new());
    let open_name = rt.interner.intern("open");
    let open_value = rt.alloc_native_fn(open);
    rt.type_desc_mut(type_id).add_method(open_name, open_value);
    Ok(rt.make_instance(type_id))
}

/// The File type is registered once, on the first `open`.
fn file_type(rt: &mut Runtime) -> TypeId {
    let name = rt.interner.intern("File");
    if let Some(desc) = rt.types.iter().find(|desc| desc.name == name) {
        return desc.id;
    }
    let type_id = rt.register_type(|id| TypeDesc::new(id, name, file_create, file_copy, size_of::<Slot>()));
    let entries: &[(&str, NativeFn)] = &[
        ("read", read_method),
        ("write", write_method),
        ("close", close_method),
        ("error", error_method),
        ("errormessage", errormessage_method),
    ];
    for &(method_name, method) in entries {
        let method_name = rt.interner.intern(method_name);
        let value = rt.alloc_native_fn(method);
        rt.type_desc_mut(type_id).add_method(method_name, value);
    }
    type_id
}

fn file_create(rt: &mut Runtime, type_id: TypeId) -> ObjRef {
    rt.alloc(type_id, Payload::File(FileHandle::default()))
}

/// File handles are not copyable; a deep copy shares the handle.
fn file_copy(_rt: &mut Runtime, obj: ObjRef) -> RunResult<ObjRef> {
    Ok(obj)
}

fn handle_mut(rt: &mut Runtime, obj: ObjRef) -> &mut FileHandle {
    match &mut rt.heap.get_mut(obj).payload {
        Payload::File(handle) => handle,
        _ => panic!("expected a File payload"),
    }
}

/// Requires the receiver to be an open-file value.
fn self_file(interp: &Interp<'_>, args: &[ObjRef]) -> RunResult<ObjRef> {
    let obj = args[0];
    if interp.rt.kind_of(obj) == ObjKind::Instance && matches!(interp.rt.heap.get(obj).payload, Payload::File(_)) {
        Ok(obj)
    } else {
        Err(RunError::type_error(
            format!("expected File but got {}", interp.rt.type_name(obj)),
            interp.rt.sub_area(0),
        ))
    }
}

/// `io.open(path, mode)` with modes `r`, `w`, `a`.
fn open(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 2)?;
    interp.expect_instance(args[1], interp.rt.builtin_types.string, 1)?;
    interp.expect_instance(args[2], interp.rt.builtin_types.string, 2)?;
    let path = String::from_utf8_lossy(interp.rt.string_bytes(args[1])).into_owned();
    let mode = String::from_utf8_lossy(interp.rt.string_bytes(args[2])).into_owned();

    let type_id = file_type(interp.rt);
    let file_obj = interp.rt.make_instance(type_id);

    let opened = match mode.as_str() {
        "r" => OpenOptions::new().read(true).open(&path),
        "w" => OpenOptions::new().write(true).create(true).truncate(true).open(&path),
        "a" => OpenOptions::new().append(true).create(true).open(&path),
        other => {
            handle_mut(interp.rt, file_obj).fail(format!("unknown open mode '{other}'"));
            return Ok(file_obj);
        }
    };
    match opened {
        Ok(file) => handle_mut(interp.rt, file_obj).file = Some(file),
        Err(err) => handle_mut(interp.rt, file_obj).fail(format!("failed to open '{path}': {err}")),
    }
    Ok(file_obj)
}

/// Reads the remaining contents as a String.
fn read_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let self_obj = self_file(interp, args)?;
    let handle = handle_mut(interp.rt, self_obj);
    let mut contents = Vec::new();
    match &mut handle.file {
        Some(file) => {
            if let Err(err) = file.read_to_end(&mut contents) {
                handle.fail(format!("failed to read: {err}"));
            }
        }
        None => handle.fail("file is not open"),
    }
    Ok(interp.rt.alloc_string(contents))
}

fn write_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 1)?;
    let self_obj = self_file(interp, args)?;
    interp.expect_instance(args[1], interp.rt.builtin_types.string, 1)?;
    let data = interp.rt.string_bytes(args[1]).to_vec();
    let handle = handle_mut(interp.rt, self_obj);
    match &mut handle.file {
        Some(file) => {
            if let Err(err) = file.write_all(&data) {
                handle.fail(format!("failed to write: {err}"));
            }
        }
        None => handle.fail("file is not open"),
    }
    Ok(self_obj)
}

fn close_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let self_obj = self_file(interp, args)?;
    handle_mut(interp.rt, self_obj).file = None;
    Ok(self_obj)
}

fn error_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let self_obj = self_file(interp, args)?;
    let error = handle_mut(interp.rt, self_obj).error;
    Ok(interp.rt.protected_boolean(error))
}

fn errormessage_method(interp: &mut Interp<'_>, args: &[ObjRef], _result_needed: bool) -> RunResult<ObjRef> {
    interp.expect_method_args(args, 0)?;
    let self_obj = self_file(interp, args)?;
    let message = handle_mut(interp.rt, self_obj).error_message.clone();
    Ok(interp.rt.alloc_str(&message))
}
