//! Basic dict built-ins.

use super::{check_arity, type_error, set_native_fn, Lib, Package};
use crate::fn_native::NativeCallContext;
use crate::{Array, RillResult, Value};

/// Package of basic dict utilities.
pub(crate) struct BasicMapPackage;

impl Package for BasicMapPackage {
    fn init(lib: &mut Lib) {
        set_native_fn(lib, "keys", keys);
        set_native_fn(lib, "values", values);
        set_native_fn(lib, "remove", remove);
    }
}

/// `keys(d)` - keys of a dict, in insertion order.
fn keys(ctx: &NativeCallContext, args: &[Value]) -> RillResult {
    check_arity(ctx, args, 1)?;

    match &args[0] {
        Value::Map(m) => {
            let out: Array = m
                .borrow()
                .keys()
                .map(|key| Value::Str(key.clone().into()))
                .collect();
            Ok(Value::array(out))
        }
        other => Err(type_error(ctx, "a dict", other)),
    }
}

/// `values(d)` - values of a dict, in insertion order.
fn values(ctx: &NativeCallContext, args: &[Value]) -> RillResult {
    check_arity(ctx, args, 1)?;

    match &args[0] {
        Value::Map(m) => {
            let out: Array = m.borrow().values().cloned().collect();
            Ok(Value::array(out))
        }
        other => Err(type_error(ctx, "a dict", other)),
    }
}

/// `remove(container, key_or_idx)` - remove an element by index (arrays) or
/// key (dicts). Never fails: wrong types or missing entries yield `false`.
fn remove(ctx: &NativeCallContext, args: &[Value]) -> RillResult {
    check_arity(ctx, args, 2)?;

    let removed = match (&args[0], &args[1]) {
        (Value::Array(a), Value::Int(index)) => {
            let mut array = a.borrow_mut();
            if *index < 0 || *index as usize >= array.len() {
                false
            } else {
                array.remove(*index as usize);
                true
            }
        }
        (Value::Array(_), _) => false,
        // shift_remove keeps the insertion order of the remaining keys
        (Value::Map(m), Value::Str(key)) => m.borrow_mut().shift_remove(key.as_str()).is_some(),
        (Value::Map(_), _) => false,
        _ => false,
    };

    Ok(Value::Bool(removed))
}
