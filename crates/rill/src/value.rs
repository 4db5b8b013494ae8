//! Module defining the [`Value`] type - the tagged union of all values a
//! script can produce.

use crate::ast::{ClassDecl, ScriptFnDef};
use crate::fn_native::NativeFunction;
use crate::scope::SharedScope;
use crate::{Identifier, ImmutableString, Locked, Shared, FLOAT, INT};
use ahash::AHashMap;
use indexmap::IndexMap;
use std::fmt;

/// Variable-sized array of [`Value`]s.
pub type Array = Vec<Value>;

/// Insertion-ordered map of string keys to [`Value`]s.
///
/// Iteration yields keys in insertion order, which the language guarantees
/// for `foreach` and `keys()`.
pub type Map = IndexMap<Identifier, Value>;

/// A script-defined function: its definition plus the scope frame it was
/// defined in (lexical closure).
#[derive(Clone)]
pub struct FnValue {
    pub(crate) def: Shared<ScriptFnDef>,
    pub(crate) scope: SharedScope,
}

/// A method bound to a receiving instance by a member access such as `obj.m`.
///
/// Invoking the bound method runs the method with the stored receiver, as if
/// `obj.m(...)` had been called directly.
#[derive(Clone)]
pub struct BoundMethod {
    pub(crate) receiver: Shared<Instance>,
    pub(crate) method: Shared<ScriptFnDef>,
}

/// A class: its declaration, a method table and the scope frame the class
/// was declared in.
pub struct ClassValue {
    pub(crate) decl: Shared<ClassDecl>,
    pub(crate) methods: AHashMap<Identifier, Shared<ScriptFnDef>>,
    pub(crate) scope: SharedScope,
}

impl ClassValue {
    /// Name of the class.
    #[inline(always)]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.decl.name.name
    }
}

/// An instance of a class: a reference to the class plus a per-instance
/// field map.
pub struct Instance {
    pub(crate) class: Shared<ClassValue>,
    pub(crate) fields: Locked<Map>,
}

impl Instance {
    /// Name of the instance's class.
    #[inline(always)]
    #[must_use]
    pub fn class_name(&self) -> &str {
        self.class.name()
    }
}

/// A value in the language.
///
/// Strings are immutable; arrays, dicts and instances are shared by
/// reference, so aliased values observe each other's mutations.
#[derive(Clone, Default)]
pub enum Value {
    /// The null value.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(INT),
    /// A floating-point number.
    Float(FLOAT),
    /// An immutable string.
    Str(ImmutableString),
    /// A mutable ordered sequence of values.
    Array(Shared<Locked<Array>>),
    /// A mutable insertion-ordered map of string keys to values.
    Map(Shared<Locked<Map>>),
    /// A script-defined function closing over its defining scope.
    Fn(Shared<FnValue>),
    /// A method bound to a receiving instance.
    Method(Shared<BoundMethod>),
    /// A class.
    Class(Shared<ClassValue>),
    /// An instance of a class.
    Instance(Shared<Instance>),
    /// A host-provided built-in function.
    Native(NativeFunction),
}

impl Value {
    /// Wrap an [`Array`] into a shared array value.
    #[inline(always)]
    #[must_use]
    pub fn array(items: Array) -> Self {
        Self::Array(Shared::new(Locked::new(items)))
    }
    /// Wrap a [`Map`] into a shared dict value.
    #[inline(always)]
    #[must_use]
    pub fn map(map: Map) -> Self {
        Self::Map(Shared::new(Locked::new(map)))
    }

    /// The name of the value's type, as reported by the `type()` built-in.
    ///
    /// Classes, instances, bound methods and host callables all report
    /// `"unknown"`; only script-defined functions are `"function"`.
    #[must_use]
    pub fn type_of(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Array(_) => "array",
            Self::Map(_) => "dict",
            Self::Fn(_) => "function",
            Self::Method(_) | Self::Class(_) | Self::Instance(_) | Self::Native(_) => "unknown",
        }
    }

    /// The name of the value's kind for diagnostics. Unlike
    /// [`type_of`][Value::type_of] this distinguishes classes, instances and
    /// callables.
    #[must_use]
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Self::Method(_) => "bound method",
            Self::Class(_) => "class",
            Self::Instance(_) => "instance",
            Self::Native(_) => "built-in function",
            _ => self.type_of(),
        }
    }

    /// Boolean coercion.
    ///
    /// `false`, `null`, numeric zero, the empty string, the empty array and
    /// the empty dict are falsy; everything else is truthy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::Array(a) => !a.borrow().is_empty(),
            Self::Map(m) => !m.borrow().is_empty(),
            _ => true,
        }
    }
}

impl From<()> for Value {
    #[inline(always)]
    fn from(_: ()) -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    #[inline(always)]
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<INT> for Value {
    #[inline(always)]
    fn from(value: INT) -> Self {
        Self::Int(value)
    }
}

impl From<FLOAT> for Value {
    #[inline(always)]
    fn from(value: FLOAT) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    #[inline(always)]
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

impl From<String> for Value {
    #[inline(always)]
    fn from(value: String) -> Self {
        Self::Str(value.into())
    }
}

impl From<ImmutableString> for Value {
    #[inline(always)]
    fn from(value: ImmutableString) -> Self {
        Self::Str(value)
    }
}

impl From<Array> for Value {
    #[inline(always)]
    fn from(value: Array) -> Self {
        Self::array(value)
    }
}

impl From<Map> for Value {
    #[inline(always)]
    fn from(value: Map) -> Self {
        Self::map(value)
    }
}

impl PartialEq for Value {
    /// Deep structural equality.
    ///
    /// Integers and floats compare numerically across the two types;
    /// booleans equal only booleans; arrays and dicts compare element-wise;
    /// functions, classes and instances compare by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => {
                *a as FLOAT == *b
            }
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => {
                Shared::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Self::Map(a), Self::Map(b)) => Shared::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Self::Fn(a), Self::Fn(b)) => Shared::ptr_eq(a, b),
            (Self::Method(a), Self::Method(b)) => Shared::ptr_eq(a, b),
            (Self::Class(a), Self::Class(b)) => Shared::ptr_eq(a, b),
            (Self::Instance(a), Self::Instance(b)) => Shared::ptr_eq(a, b),
            (Self::Native(a), Self::Native(b)) => a == b,
            _ => false,
        }
    }
}

/// Write a value nested inside a composite: strings are quoted, everything
/// else prints as usual.
fn fmt_nested(value: &Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        Value::Str(s) => write!(f, "{:?}", s.as_str()),
        _ => fmt::Display::fmt(value, f),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => fmt::Display::fmt(b, f),
            Self::Int(n) => fmt::Display::fmt(n, f),
            Self::Float(v) => {
                if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
                    write!(f, "{:.1}", v)
                } else {
                    fmt::Display::fmt(v, f)
                }
            }
            Self::Str(s) => f.write_str(s),
            Self::Array(a) => {
                f.write_str("[")?;
                for (i, item) in a.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    fmt_nested(item, f)?;
                }
                f.write_str("]")
            }
            Self::Map(m) => {
                f.write_str("{")?;
                for (i, (key, value)) in m.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}: ", key.as_str())?;
                    fmt_nested(value, f)?;
                }
                f.write_str("}")
            }
            Self::Fn(func) => write!(f, "Fn({})", func.def.name),
            Self::Method(m) => write!(f, "Fn({})", m.method.name),
            Self::Class(c) => write!(f, "Class({})", c.name()),
            Self::Instance(i) => write!(f, "Instance({})", i.class_name()),
            Self::Native(n) => write!(f, "Fn({})", n.name),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{:?}", s.as_str()),
            _ => fmt::Display::fmt(self, f),
        }
    }
}

/// Trait implemented by Rust types that a script [`Value`] can be cast into,
/// used by the typed evaluation APIs such as
/// [`Engine::eval`][crate::Engine::eval].
pub trait FromValue: Sized {
    /// Type name reported in cast-failure errors.
    #[must_use]
    fn type_name() -> &'static str;
    /// Try to convert a [`Value`] into this type, handing the value back on
    /// failure.
    fn from_value(value: Value) -> Result<Self, Value>;
}

impl FromValue for Value {
    #[inline(always)]
    fn type_name() -> &'static str {
        "value"
    }
    #[inline(always)]
    fn from_value(value: Value) -> Result<Self, Value> {
        Ok(value)
    }
}

impl FromValue for () {
    #[inline(always)]
    fn type_name() -> &'static str {
        "nothing"
    }
    #[inline(always)]
    fn from_value(_: Value) -> Result<Self, Value> {
        Ok(())
    }
}

impl FromValue for INT {
    #[inline(always)]
    fn type_name() -> &'static str {
        "int"
    }
    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Int(n) => Ok(n),
            _ => Err(value),
        }
    }
}

impl FromValue for FLOAT {
    #[inline(always)]
    fn type_name() -> &'static str {
        "float"
    }
    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Float(v) => Ok(v),
            Value::Int(n) => Ok(n as FLOAT),
            _ => Err(value),
        }
    }
}

impl FromValue for bool {
    #[inline(always)]
    fn type_name() -> &'static str {
        "bool"
    }
    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Bool(b) => Ok(b),
            _ => Err(value),
        }
    }
}

impl FromValue for ImmutableString {
    #[inline(always)]
    fn type_name() -> &'static str {
        "string"
    }
    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Str(s) => Ok(s),
            _ => Err(value),
        }
    }
}

impl FromValue for String {
    #[inline(always)]
    fn type_name() -> &'static str {
        "string"
    }
    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Str(s) => Ok(s.as_str().to_string()),
            _ => Err(value),
        }
    }
}
