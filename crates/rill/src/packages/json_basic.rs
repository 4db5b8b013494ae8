//! JSON encoding and decoding built-ins.

use super::{check_arity, type_error, set_native_fn, Lib, Package};
use crate::fn_native::NativeCallContext;
use crate::{Array, EvalError, Map, RillResult, Value, FLOAT, INT};
use regex::Regex;

/// Package of JSON built-ins.
pub(crate) struct BasicJsonPackage;

impl Package for BasicJsonPackage {
    fn init(lib: &mut Lib) {
        set_native_fn(lib, "json_encode", json_encode);
        set_native_fn(lib, "json_decode", json_decode);
    }
}

/// `json_encode(x)` - serialise a data value to a JSON string.
fn json_encode(ctx: &NativeCallContext, args: &[Value]) -> RillResult {
    check_arity(ctx, args, 1)?;

    let json = to_json(ctx, &args[0])?;
    Ok(Value::from(json.to_string()))
}

/// `json_decode(s)` - parse a JSON string, tolerating a relaxed dialect.
///
/// Strict JSON is tried first; on failure the text is normalised (trailing
/// commas removed, case-insensitive keyword spellings lowered, single-quoted
/// strings converted) and parsed again. If both attempts fail, a catchable
/// error with the message `Invalid JSON string` is raised.
fn json_decode(ctx: &NativeCallContext, args: &[Value]) -> RillResult {
    check_arity(ctx, args, 1)?;

    let text = match &args[0] {
        Value::Str(text) => text,
        other => return Err(type_error(ctx, "a string", other)),
    };

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(text) {
        return Ok(from_json(&json));
    }

    serde_json::from_str::<serde_json::Value>(&normalize_relaxed(text))
        .map(|json| from_json(&json))
        .map_err(|_| {
            Box::new(EvalError::ErrorRuntime(
                "Invalid JSON string".into(),
                ctx.position(),
            ))
        })
}

/// Convert a script value into a JSON value. Functions, classes, instances
/// and non-finite floats are not representable.
fn to_json(ctx: &NativeCallContext, value: &Value) -> Result<serde_json::Value, Box<EvalError>> {
    match value {
        Value::Null => Ok(serde_json::Value::Null),
        Value::Bool(b) => Ok(serde_json::Value::from(*b)),
        Value::Int(n) => Ok(serde_json::Value::from(*n)),
        Value::Float(v) => serde_json::Number::from_f64(*v)
            .map(serde_json::Value::Number)
            .ok_or_else(|| type_error(ctx, "a finite number", value)),
        Value::Str(s) => Ok(serde_json::Value::from(s.as_str())),
        Value::Array(a) => {
            let mut out = Vec::with_capacity(a.borrow().len());
            for item in a.borrow().iter() {
                out.push(to_json(ctx, item)?);
            }
            Ok(serde_json::Value::Array(out))
        }
        Value::Map(m) => {
            let mut out = serde_json::Map::new();
            for (key, item) in m.borrow().iter() {
                out.insert(key.to_string(), to_json(ctx, item)?);
            }
            Ok(serde_json::Value::Object(out))
        }
        other => Err(type_error(ctx, "a JSON-representable value", other)),
    }
}

/// Convert a parsed JSON value into a script value. Object key order is
/// preserved.
fn from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i as INT),
            None => Value::Float(n.as_f64().unwrap_or(FLOAT::NAN)),
        },
        serde_json::Value::String(s) => Value::from(s.as_str()),
        serde_json::Value::Array(items) => {
            let out: Array = items.iter().map(from_json).collect();
            Value::array(out)
        }
        serde_json::Value::Object(entries) => {
            let mut out = Map::new();
            for (key, item) in entries {
                out.insert(key.as_str().into(), from_json(item));
            }
            Value::map(out)
        }
    }
}

/// Rewrite the tolerated relaxed dialect into strict JSON.
fn normalize_relaxed(text: &str) -> String {
    let trailing_commas = Regex::new(r",\s*([}\]])").expect("hard-coded regex is valid");
    let keyword_true = Regex::new(r"(?i)\btrue\b").expect("hard-coded regex is valid");
    let keyword_false = Regex::new(r"(?i)\bfalse\b").expect("hard-coded regex is valid");
    let keyword_null = Regex::new(r"(?i)\bnull\b").expect("hard-coded regex is valid");
    let single_quoted = Regex::new(r"'([^'\\]*(?:\\.[^'\\]*)*)'").expect("hard-coded regex is valid");

    let text = trailing_commas.replace_all(text, "$1");
    let text = keyword_true.replace_all(&text, "true");
    let text = keyword_false.replace_all(&text, "false");
    let text = keyword_null.replace_all(&text, "null");

    single_quoted
        .replace_all(&text, |captures: &regex::Captures<'_>| {
            let inner = captures[1].replace("\\'", "'").replace('"', "\\\"");
            format!("\"{}\"", inner)
        })
        .into_owned()
}
