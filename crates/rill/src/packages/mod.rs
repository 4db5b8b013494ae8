//! Module containing all built-in _packages_ available to Rill.
//!
//! Each package registers a group of host functions into a [`Lib`]; the
//! engine installs the full library into the root scope of every script.

use crate::fn_native::{NativeCallContext, NativeFn, NativeFunction};
use crate::{EvalError, Value, FLOAT, INT};

mod array_basic;
mod io_basic;
mod json_basic;
mod lang_core;
mod map_basic;
mod math_basic;
mod string_more;

pub(crate) use array_basic::BasicArrayPackage;
pub(crate) use io_basic::BasicIoPackage;
pub(crate) use json_basic::BasicJsonPackage;
pub(crate) use lang_core::CorePackage;
pub(crate) use map_basic::BasicMapPackage;
pub(crate) use math_basic::BasicMathPackage;
pub(crate) use string_more::MoreStringPackage;

/// Collection of native functions making up a built-in library.
pub type Lib = Vec<NativeFunction>;

/// Trait that all packages must implement.
pub trait Package {
    /// Register all the functions in the package into a library.
    fn init(lib: &mut Lib);
}

/// Register a native function into a library.
#[inline(always)]
pub(crate) fn set_native_fn(lib: &mut Lib, name: &'static str, func: NativeFn) {
    lib.push(NativeFunction { name, func });
}

/// The full standard library installed by [`Engine::new`][crate::Engine::new].
#[must_use]
pub(crate) fn standard_library() -> Lib {
    let mut lib = Lib::new();

    CorePackage::init(&mut lib);
    BasicArrayPackage::init(&mut lib);
    BasicMapPackage::init(&mut lib);
    BasicMathPackage::init(&mut lib);
    MoreStringPackage::init(&mut lib);
    BasicIoPackage::init(&mut lib);
    BasicJsonPackage::init(&mut lib);

    lib
}

/// Arity-mismatch error for the built-in being called.
#[inline]
#[must_use]
pub(crate) fn arity_error(
    ctx: &NativeCallContext,
    expected: usize,
    actual: usize,
) -> Box<EvalError> {
    Box::new(EvalError::ErrorArityMismatch(
        ctx.fn_name().into(),
        expected,
        actual,
        ctx.position(),
    ))
}

/// Check an exact argument count.
#[inline]
pub(crate) fn check_arity(
    ctx: &NativeCallContext,
    args: &[Value],
    expected: usize,
) -> Result<(), Box<EvalError>> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(arity_error(ctx, expected, args.len()))
    }
}

/// Type-mismatch error against an actual argument value.
#[inline]
#[must_use]
pub(crate) fn type_error(
    ctx: &NativeCallContext,
    requested: &str,
    actual: &Value,
) -> Box<EvalError> {
    Box::new(EvalError::ErrorMismatchDataType(
        requested.into(),
        actual.kind_name().into(),
        ctx.position(),
    ))
}

/// Coerce a value to an integer the way the `int()` built-in does: integers
/// pass through, floats truncate toward zero, booleans map to 0/1 and
/// strings parse after trimming.
pub(crate) fn value_to_int(ctx: &NativeCallContext, value: &Value) -> Result<INT, Box<EvalError>> {
    match value {
        Value::Int(n) => Ok(*n),
        Value::Float(v) => Ok(*v as INT),
        Value::Bool(b) => Ok(INT::from(*b)),
        Value::Str(s) => s
            .trim()
            .parse::<INT>()
            .map_err(|_| type_error(ctx, "an integer", value)),
        _ => Err(type_error(ctx, "a number", value)),
    }
}

/// Coerce a value to a float the way the `float()` built-in does.
pub(crate) fn value_to_float(
    ctx: &NativeCallContext,
    value: &Value,
) -> Result<FLOAT, Box<EvalError>> {
    match value {
        Value::Int(n) => Ok(*n as FLOAT),
        Value::Float(v) => Ok(*v),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Str(s) => s
            .trim()
            .parse::<FLOAT>()
            .map_err(|_| type_error(ctx, "a number", value)),
        _ => Err(type_error(ctx, "a number", value)),
    }
}
