//! Basic array built-ins.

use super::{arity_error, check_arity, type_error, set_native_fn, Lib, Package};
use crate::fn_native::NativeCallContext;
use crate::{Array, EvalError, RillResult, Value, INT};

/// Package of basic array utilities.
pub(crate) struct BasicArrayPackage;

impl Package for BasicArrayPackage {
    fn init(lib: &mut Lib) {
        set_native_fn(lib, "range", range);
        set_native_fn(lib, "append", append);
        set_native_fn(lib, "pop", pop);
    }
}

/// Argument that must be an integer.
fn int_arg(ctx: &NativeCallContext, args: &[Value], index: usize) -> Result<INT, Box<EvalError>> {
    match &args[index] {
        Value::Int(n) => Ok(*n),
        other => Err(type_error(ctx, "an integer", other)),
    }
}

/// `range(stop)` / `range(start, stop)` / `range(start, stop, step)` -
/// materialised integer array, negative steps included.
fn range(ctx: &NativeCallContext, args: &[Value]) -> RillResult {
    let (start, stop, step) = match args.len() {
        1 => (0, int_arg(ctx, args, 0)?, 1),
        2 => (int_arg(ctx, args, 0)?, int_arg(ctx, args, 1)?, 1),
        3 => (
            int_arg(ctx, args, 0)?,
            int_arg(ctx, args, 1)?,
            int_arg(ctx, args, 2)?,
        ),
        n => return Err(arity_error(ctx, 3, n)),
    };

    if step == 0 {
        return EvalError::ErrorArithmetic("range() step cannot be zero".into(), ctx.position())
            .into();
    }

    let mut out = Array::new();
    let mut i = start;
    loop {
        if (step > 0 && i >= stop) || (step < 0 && i <= stop) {
            break;
        }
        out.push(Value::Int(i));
        i = match i.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }

    Ok(Value::array(out))
}

/// `append(arr, v)` - push a value onto an array in place.
fn append(ctx: &NativeCallContext, args: &[Value]) -> RillResult {
    check_arity(ctx, args, 2)?;

    match &args[0] {
        Value::Array(a) => {
            a.borrow_mut().push(args[1].clone());
            Ok(Value::Null)
        }
        other => Err(type_error(ctx, "an array", other)),
    }
}

/// `pop(arr, idx = -1)` - remove and return an element; negative indices
/// count from the back.
fn pop(ctx: &NativeCallContext, args: &[Value]) -> RillResult {
    if args.is_empty() || args.len() > 2 {
        return Err(arity_error(ctx, 2, args.len()));
    }

    let array = match &args[0] {
        Value::Array(a) => a,
        other => return Err(type_error(ctx, "an array", other)),
    };
    let index = match args.get(1) {
        Some(Value::Int(i)) => *i,
        Some(other) => return Err(type_error(ctx, "an integer index", other)),
        None => -1,
    };

    let mut array = array.borrow_mut();
    let len = array.len();

    let actual = if index < 0 { index + len as INT } else { index };
    if actual < 0 || actual as usize >= len {
        return EvalError::ErrorArrayBounds(len, index, ctx.position()).into();
    }

    Ok(array.remove(actual as usize))
}
