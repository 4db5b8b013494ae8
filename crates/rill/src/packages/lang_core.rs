//! Core language built-ins: output, input, inspection and coercions.

use super::{arity_error, check_arity, type_error, value_to_float, value_to_int, set_native_fn, Lib, Package};
use crate::fn_native::NativeCallContext;
use crate::{Array, EvalError, RillResult, Value, INT};

/// Package of core language facilities.
pub(crate) struct CorePackage;

impl Package for CorePackage {
    fn init(lib: &mut Lib) {
        set_native_fn(lib, "print", print);
        set_native_fn(lib, "println", println);
        set_native_fn(lib, "input", input);
        set_native_fn(lib, "len", len);
        set_native_fn(lib, "type", type_of);
        set_native_fn(lib, "int", to_int);
        set_native_fn(lib, "float", to_float);
        set_native_fn(lib, "str", to_str);
        set_native_fn(lib, "bool", to_bool);
        set_native_fn(lib, "cmd_args", cmd_args);
    }
}

/// Stringify arguments joined by single spaces.
fn join_args(args: &[Value]) -> String {
    args.iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `print(...)` - stringify and write arguments, no trailing newline.
fn print(ctx: &NativeCallContext, args: &[Value]) -> RillResult {
    (ctx.engine().print)(&join_args(args));
    Ok(Value::Null)
}

/// `println(...)` - like `print` with a trailing newline.
fn println(ctx: &NativeCallContext, args: &[Value]) -> RillResult {
    let mut text = join_args(args);
    text.push('\n');
    (ctx.engine().print)(&text);
    Ok(Value::Null)
}

/// `input(prompt?)` - write the optional prompt and read one line.
fn input(ctx: &NativeCallContext, args: &[Value]) -> RillResult {
    if args.len() > 1 {
        return Err(arity_error(ctx, 1, args.len()));
    }

    if let Some(prompt) = args.first() {
        (ctx.engine().print)(&prompt.to_string());
    }

    let mut line = String::new();
    match std::io::stdin().read_line(&mut line) {
        Ok(_) => {
            while line.ends_with('\n') || line.ends_with('\r') {
                line.pop();
            }
            Ok(Value::from(line))
        }
        Err(err) => {
            EvalError::ErrorIO(format!("Error reading input: {}", err), ctx.position()).into()
        }
    }
}

/// `len(x)` - length of a string (in characters), array or dict.
fn len(ctx: &NativeCallContext, args: &[Value]) -> RillResult {
    check_arity(ctx, args, 1)?;

    match &args[0] {
        Value::Str(s) => Ok(Value::Int(s.chars_len() as INT)),
        Value::Array(a) => Ok(Value::Int(a.borrow().len() as INT)),
        Value::Map(m) => Ok(Value::Int(m.borrow().len() as INT)),
        other => Err(type_error(ctx, "a string, array or dict", other)),
    }
}

/// `type(x)` - name of the value's type.
fn type_of(ctx: &NativeCallContext, args: &[Value]) -> RillResult {
    check_arity(ctx, args, 1)?;
    Ok(Value::from(args[0].type_of()))
}

/// `int(x)` - integer coercion.
fn to_int(ctx: &NativeCallContext, args: &[Value]) -> RillResult {
    check_arity(ctx, args, 1)?;
    value_to_int(ctx, &args[0]).map(Value::Int)
}

/// `float(x)` - float coercion.
fn to_float(ctx: &NativeCallContext, args: &[Value]) -> RillResult {
    check_arity(ctx, args, 1)?;
    value_to_float(ctx, &args[0]).map(Value::Float)
}

/// `str(x)` - string coercion.
fn to_str(ctx: &NativeCallContext, args: &[Value]) -> RillResult {
    check_arity(ctx, args, 1)?;
    Ok(Value::from(args[0].to_string()))
}

/// `bool(x)` - truthiness coercion.
fn to_bool(ctx: &NativeCallContext, args: &[Value]) -> RillResult {
    check_arity(ctx, args, 1)?;
    Ok(Value::Bool(args[0].is_truthy()))
}

/// `cmd_args()` - program arguments beyond the script path.
fn cmd_args(ctx: &NativeCallContext, args: &[Value]) -> RillResult {
    check_arity(ctx, args, 0)?;

    let out: Array = ctx
        .engine()
        .script_args
        .iter()
        .map(|arg| Value::Str(arg.clone()))
        .collect();
    Ok(Value::array(out))
}
