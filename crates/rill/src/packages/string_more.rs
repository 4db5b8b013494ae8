//! String splitting/joining and regular-expression built-ins.

use super::{check_arity, type_error, set_native_fn, Lib, Package};
use crate::fn_native::NativeCallContext;
use crate::{Array, EvalError, ImmutableString, RillResult, Value};
use regex::Regex;

/// Package of additional string utilities.
pub(crate) struct MoreStringPackage;

impl Package for MoreStringPackage {
    fn init(lib: &mut Lib) {
        set_native_fn(lib, "str_split", str_split);
        set_native_fn(lib, "str_join", str_join);
        set_native_fn(lib, "regexp_match", regexp_match);
        set_native_fn(lib, "regexp_find", regexp_find);
        set_native_fn(lib, "regexp_replace", regexp_replace);
    }
}

/// Argument that must be a string.
fn str_arg<'a>(
    ctx: &NativeCallContext,
    args: &'a [Value],
    index: usize,
) -> Result<&'a ImmutableString, Box<EvalError>> {
    match &args[index] {
        Value::Str(s) => Ok(s),
        other => Err(type_error(ctx, "a string", other)),
    }
}

/// Compile a regular-expression pattern argument.
fn compile_pattern(ctx: &NativeCallContext, pattern: &str) -> Result<Regex, Box<EvalError>> {
    Regex::new(pattern).map_err(|err| {
        Box::new(EvalError::ErrorRuntime(
            format!("Invalid regex pattern '{}': {}", pattern, err),
            ctx.position(),
        ))
    })
}

/// `str_split(text, sep)` - split on a non-empty separator.
fn str_split(ctx: &NativeCallContext, args: &[Value]) -> RillResult {
    check_arity(ctx, args, 2)?;

    let text = str_arg(ctx, args, 0)?;
    let separator = str_arg(ctx, args, 1)?;

    if separator.is_empty() {
        return Err(type_error(ctx, "a non-empty separator", &args[1]));
    }

    let out: Array = text
        .as_str()
        .split(separator.as_str())
        .map(Value::from)
        .collect();
    Ok(Value::array(out))
}

/// `str_join(arr, sep)` - stringify elements and join.
fn str_join(ctx: &NativeCallContext, args: &[Value]) -> RillResult {
    check_arity(ctx, args, 2)?;

    let array = match &args[0] {
        Value::Array(a) => a,
        other => return Err(type_error(ctx, "an array", other)),
    };
    let separator = str_arg(ctx, args, 1)?;

    let joined = array
        .borrow()
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(separator.as_str());
    Ok(Value::from(joined))
}

/// `regexp_match(pattern, text)` - `1` when the pattern matches, else `0`.
fn regexp_match(ctx: &NativeCallContext, args: &[Value]) -> RillResult {
    check_arity(ctx, args, 2)?;

    let pattern = str_arg(ctx, args, 0)?;
    let text = str_arg(ctx, args, 1)?;
    let re = compile_pattern(ctx, pattern)?;

    Ok(Value::Int(re.is_match(text).into()))
}

/// `regexp_find(pattern, text)` - all match strings; when the pattern has
/// capture groups, the groups are flattened into a single list.
fn regexp_find(ctx: &NativeCallContext, args: &[Value]) -> RillResult {
    check_arity(ctx, args, 2)?;

    let pattern = str_arg(ctx, args, 0)?;
    let text = str_arg(ctx, args, 1)?;
    let re = compile_pattern(ctx, pattern)?;

    let mut out = Array::new();

    if re.captures_len() > 1 {
        for captures in re.captures_iter(text) {
            for group in 1..captures.len() {
                out.push(Value::from(
                    captures.get(group).map_or("", |m| m.as_str()),
                ));
            }
        }
    } else {
        for found in re.find_iter(text) {
            out.push(Value::from(found.as_str()));
        }
    }

    Ok(Value::array(out))
}

/// `regexp_replace(pattern, text, replacement)` - substitute all matches.
fn regexp_replace(ctx: &NativeCallContext, args: &[Value]) -> RillResult {
    check_arity(ctx, args, 3)?;

    let pattern = str_arg(ctx, args, 0)?;
    let text = str_arg(ctx, args, 1)?;
    let replacement = str_arg(ctx, args, 2)?;
    let re = compile_pattern(ctx, pattern)?;

    Ok(Value::from(
        re.replace_all(text, replacement.as_str()).into_owned(),
    ))
}
