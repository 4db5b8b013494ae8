//! Module that defines the chained [`Scope`] frames holding variables.

use crate::{Identifier, Locked, Shared, Value};
use ahash::AHashMap;

/// Shared handle to a [`Scope`] frame.
///
/// Function values keep a handle to their defining frame (lexical closure),
/// class values keep a handle to the frame they were declared in, and every
/// block evaluation chains a fresh child frame onto the current one. Frames
/// are therefore reference-counted with interior mutability, and the parent
/// link is a shared reference upward.
pub type SharedScope = Shared<Locked<Scope>>;

/// A single scope frame mapping identifiers to values.
///
/// Searches consult the innermost frame first and walk parent links to the
/// root, which is the global scope pre-populated with the built-ins.
///
/// # Example
///
/// ```
/// use rill::{Engine, INT};
///
/// let engine = Engine::new();
/// let scope = engine.new_global_scope();
///
/// engine.run_with_scope(&scope, "var x = 40;").unwrap();
/// engine.run_with_scope(&scope, "x += 2;").unwrap();
///
/// assert_eq!(engine.eval_with_scope::<INT>(&scope, "x").unwrap(), 42);
/// ```
#[derive(Debug, Default)]
pub struct Scope {
    /// Enclosing frame, absent for the global scope.
    parent: Option<SharedScope>,
    /// Variables bound in this frame.
    values: AHashMap<Identifier, Value>,
}

impl Scope {
    /// Create a new root [`Scope`].
    #[inline(always)]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Turn this [`Scope`] into a shared handle.
    #[inline(always)]
    #[must_use]
    pub fn into_shared(self) -> SharedScope {
        Shared::new(Locked::new(self))
    }
    /// Create a new frame chained to a parent frame.
    #[inline]
    #[must_use]
    pub fn new_child(parent: &SharedScope) -> SharedScope {
        Shared::new(Locked::new(Self {
            parent: Some(parent.clone()),
            values: AHashMap::default(),
        }))
    }
    /// Number of variables bound in this frame (excluding parent frames).
    #[inline(always)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }
    /// Is this frame empty?
    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
    /// Bind a variable in this frame, unconditionally.
    ///
    /// An existing binding of the same name in this frame is replaced; a
    /// binding in an enclosing frame is shadowed.
    #[inline]
    pub fn define(&mut self, name: impl Into<Identifier>, value: Value) {
        self.values.insert(name.into(), value);
    }
    /// Look a variable up, walking parent frames towards the root.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        match &self.parent {
            Some(parent) => parent.borrow().get(name),
            None => None,
        }
    }
    /// Mutate the innermost binding of a variable, walking parent frames
    /// towards the root. Returns `false` when no frame binds the name - `set`
    /// never creates a binding.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            return true;
        }
        match &self.parent {
            Some(parent) => parent.borrow_mut().set(name, value),
            None => false,
        }
    }
    /// Is a variable bound in this frame or any enclosing frame?
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        if self.values.contains_key(name) {
            return true;
        }
        match &self.parent {
            Some(parent) => parent.borrow().contains(name),
            None => false,
        }
    }
}
