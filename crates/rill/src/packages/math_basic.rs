//! The `math(op, ...)` dispatcher.

use super::{arity_error, type_error, value_to_float, set_native_fn, Lib, Package};
use crate::fn_native::NativeCallContext;
use crate::{EvalError, Position, RillResult, Value, FLOAT, INT};

/// Package of basic mathematical functions.
pub(crate) struct BasicMathPackage;

impl Package for BasicMathPackage {
    fn init(lib: &mut Lib) {
        set_native_fn(lib, "math", math);
    }
}

/// Arity-mismatch error for a `math()` sub-operation.
fn math_arity(op: &str, expected: usize, actual: usize, pos: Position) -> Box<EvalError> {
    Box::new(EvalError::ErrorArityMismatch(
        format!("math({})", op),
        expected,
        actual,
        pos,
    ))
}

/// Domain violation, such as `log` of a non-positive number.
fn domain_error(pos: Position) -> Box<EvalError> {
    Box::new(EvalError::ErrorArithmetic("math domain error".into(), pos))
}

/// Round half-to-even, matching the reference behaviour for `round`.
fn round_ties_to_even(x: FLOAT) -> FLOAT {
    let floor = x.floor();
    let diff = x - floor;

    if diff > 0.5 {
        floor + 1.0
    } else if diff < 0.5 {
        floor
    } else if (floor as INT) % 2 == 0 {
        floor
    } else {
        floor + 1.0
    }
}

/// `math(op, args...)` - dispatch to a named mathematical operation.
///
/// `sin|cos|asin|acos|log|exp` return floats; `ceil|floor|round` return
/// integers; `pow` returns a float; `random()` a float in `[0, 1)` and
/// `random(a, b)` a uniform float between the bounds.
fn math(ctx: &NativeCallContext, args: &[Value]) -> RillResult {
    let op = match args.first() {
        Some(Value::Str(op)) => op.clone(),
        Some(other) => return Err(type_error(ctx, "an operation name", other)),
        None => return Err(arity_error(ctx, 1, 0)),
    };
    let op = op.as_str();
    let rest = &args[1..];
    let pos = ctx.position();

    match op {
        "sin" | "cos" | "asin" | "acos" | "log" | "exp" | "ceil" | "floor" | "round" => {
            if rest.len() != 1 {
                return Err(math_arity(op, 1, rest.len(), pos));
            }
            let x = value_to_float(ctx, &rest[0])?;

            match op {
                "sin" => Ok(Value::Float(x.sin())),
                "cos" => Ok(Value::Float(x.cos())),
                "asin" => {
                    if !(-1.0..=1.0).contains(&x) {
                        return Err(domain_error(pos));
                    }
                    Ok(Value::Float(x.asin()))
                }
                "acos" => {
                    if !(-1.0..=1.0).contains(&x) {
                        return Err(domain_error(pos));
                    }
                    Ok(Value::Float(x.acos()))
                }
                "log" => {
                    if x <= 0.0 {
                        return Err(domain_error(pos));
                    }
                    Ok(Value::Float(x.ln()))
                }
                "exp" => Ok(Value::Float(x.exp())),
                "ceil" => Ok(Value::Int(x.ceil() as INT)),
                "floor" => Ok(Value::Int(x.floor() as INT)),
                "round" => Ok(Value::Int(round_ties_to_even(x) as INT)),
                _ => unreachable!("one-argument math operation"),
            }
        }

        "pow" => {
            if rest.len() != 2 {
                return Err(math_arity(op, 2, rest.len(), pos));
            }
            let base = value_to_float(ctx, &rest[0])?;
            let exponent = value_to_float(ctx, &rest[1])?;
            Ok(Value::Float(base.powf(exponent)))
        }

        "random" => match rest.len() {
            0 => Ok(Value::Float(rand::random::<FLOAT>())),
            2 => {
                let low = value_to_float(ctx, &rest[0])?;
                let high = value_to_float(ctx, &rest[1])?;
                Ok(Value::Float(low + (high - low) * rand::random::<FLOAT>()))
            }
            n => Err(math_arity(op, 2, n, pos)),
        },

        _ => EvalError::ErrorRuntime(format!("math(): unsupported operation '{}'", op), pos)
            .into(),
    }
}
