//! Whole-file I/O built-ins.

use super::{check_arity, type_error, set_native_fn, Lib, Package};
use crate::fn_native::NativeCallContext;
use crate::{EvalError, RillResult, Value};
use std::fs;

/// Package of file I/O built-ins.
pub(crate) struct BasicIoPackage;

impl Package for BasicIoPackage {
    fn init(lib: &mut Lib) {
        set_native_fn(lib, "read", read);
        set_native_fn(lib, "write", write);
    }
}

/// `read(path)` - whole-file read into a string.
fn read(ctx: &NativeCallContext, args: &[Value]) -> RillResult {
    check_arity(ctx, args, 1)?;

    let path = match &args[0] {
        Value::Str(path) => path,
        other => return Err(type_error(ctx, "a file path string", other)),
    };

    match fs::read_to_string(path.as_str()) {
        Ok(content) => Ok(Value::from(content)),
        Err(err) => EvalError::ErrorIO(
            format!("Error reading file '{}': {}", path, err),
            ctx.position(),
        )
        .into(),
    }
}

/// `write(content, path)` - stringify the content and write it to a file.
fn write(ctx: &NativeCallContext, args: &[Value]) -> RillResult {
    check_arity(ctx, args, 2)?;

    let content = args[0].to_string();
    let path = match &args[1] {
        Value::Str(path) => path,
        other => return Err(type_error(ctx, "a file path string", other)),
    };

    match fs::write(path.as_str(), content) {
        Ok(_) => Ok(Value::Null),
        Err(err) => EvalError::ErrorIO(
            format!("Error writing to file '{}': {}", path, err),
            ctx.position(),
        )
        .into(),
    }
}
