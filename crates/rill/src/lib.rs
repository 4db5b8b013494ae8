//! # Rill - embedded scripting for Rust
//!
//! Rill is a tiny, dynamically-typed scripting language with a hand-written
//! lexer, a recursive-descent parser and a tree-walking evaluator over a
//! chain of lexical scopes.
//!
//! # A Quick Example
//!
//! ## Contents of `my_script.rill`
//!
//! ```ignore
//! func fact(n) {
//!     if (n <= 1) { return 1; }
//!     return n * fact(n - 1);
//! }
//!
//! println(fact(10));
//! ```
//!
//! ## The Rust part
//!
//! ```
//! use rill::{Engine, EvalError, INT};
//!
//! fn main() -> Result<(), Box<EvalError>> {
//!     let engine = Engine::new();
//!
//!     let result = engine.eval::<INT>("var x = 40; var y = x + 2; y")?;
//!
//!     assert_eq!(result, 42);
//!     Ok(())
//! }
//! ```

// Internal modules

mod ast;
mod engine;
mod error;
mod error_parsing;
mod fn_native;
mod immutable_string;
pub mod packages;
mod parse;
mod scope;
mod token;
mod value;

/// Evaluation result of a script fragment.
pub(crate) type RillResult = Result<Value, Box<EvalError>>;

/// The system integer type. It is defined as [`i64`].
pub type INT = i64;

/// The system floating-point type. It is defined as [`f64`].
pub type FLOAT = f64;

pub use ast::AST;
pub use engine::Engine;
pub use error::EvalError;
pub use error_parsing::{LexError, ParseError, ParseErrorType};
pub use fn_native::{Locked, NativeCallContext, NativeFn, NativeFunction, Shared};
pub use immutable_string::ImmutableString;
pub use scope::{Scope, SharedScope};
pub use token::{Position, SourceMap, Token, TokenIterator};
pub use value::{Array, FromValue, Map, Value};

/// An identifier in Rill. [`SmartString`](https://crates.io/crates/smartstring)
/// is used because most identifiers are ASCII and short, so they can be
/// stored inline without a heap allocation.
pub(crate) type Identifier = SmartString;

pub(crate) type SmartString = smartstring::SmartString<smartstring::Compact>;

/// Variable-sized array of values, backed by a small, inline, fixed-size
/// array when there are few items stored. Most argument and parameter lists
/// are short, so this avoids a heap allocation in the common case.
pub(crate) type StaticVec<T> = smallvec::SmallVec<[T; 4]>;
