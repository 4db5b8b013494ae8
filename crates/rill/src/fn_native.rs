//! Module defining interfaces to host-native functions.

use crate::{Engine, EvalError, Position, Value};
use std::{cell::RefCell, fmt, rc::Rc};

/// Reference-counted container, shared by closures, class instances and
/// aliased collections.
pub type Shared<T> = Rc<T>;

/// Container with interior mutability for values mutated through aliases.
pub type Locked<T> = RefCell<T>;

/// Callback closure implementing the `print`/`println` commands.
pub type OnPrintCallback = Box<dyn Fn(&str)>;

/// Signature of a host function callable from scripts.
pub type NativeFn = fn(&NativeCallContext, &[Value]) -> Result<Value, Box<EvalError>>;

/// Context of a native function call, giving the built-in access to the
/// calling [`Engine`] and the call-site [`Position`] for diagnostics.
pub struct NativeCallContext<'a> {
    engine: &'a Engine,
    fn_name: &'a str,
    pos: Position,
}

impl<'a> NativeCallContext<'a> {
    /// Create a new [`NativeCallContext`].
    #[inline(always)]
    #[must_use]
    pub(crate) fn new(engine: &'a Engine, fn_name: &'a str, pos: Position) -> Self {
        Self {
            engine,
            fn_name,
            pos,
        }
    }
    /// The current [`Engine`].
    #[inline(always)]
    #[must_use]
    pub fn engine(&self) -> &Engine {
        self.engine
    }
    /// Name of the function currently being called.
    #[inline(always)]
    #[must_use]
    pub fn fn_name(&self) -> &str {
        self.fn_name
    }
    /// [`Position`] of the function call.
    #[inline(always)]
    #[must_use]
    pub fn position(&self) -> Position {
        self.pos
    }
}

/// A host function registered as a built-in, installed into the root scope
/// under its name.
#[derive(Clone, Copy)]
pub struct NativeFunction {
    pub(crate) name: &'static str,
    pub(crate) func: NativeFn,
}

impl NativeFunction {
    /// Name the function is registered under.
    #[inline(always)]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.func as usize == other.func as usize
    }
}
