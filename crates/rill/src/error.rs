//! Module containing error definitions for the evaluation process.

use crate::{ParseErrorType, Position, Value, INT};
use std::error::Error;
use std::fmt;

/// Evaluation result.
///
/// All wrapped [`Position`] values represent the location in the script where
/// the error occurs.
///
/// Two variants are not errors at all: [`LoopBreak`][EvalError::LoopBreak]
/// and [`Return`][EvalError::Return] are the non-local control-flow signals
/// produced by `break`/`continue` and `return`. They unwind the evaluator
/// exactly like errors do, and the innermost loop or function call absorbs
/// them.
#[derive(Debug)]
#[non_exhaustive]
pub enum EvalError {
    /// Syntax error.
    ErrorParsing(ParseErrorType, Position),

    /// Usage of an unknown variable. Wrapped value is the variable name.
    ErrorVariableNotFound(String, Position),
    /// Call to a value that is not callable. Wrapped value is the name the
    /// call was made through.
    ErrorNotAFunction(String, Position),
    /// Data is not of the required type.
    /// Wrapped values are the type requested and type of the actual result.
    ErrorMismatchDataType(String, String, Position),
    /// Returned type is not the same as the required output type.
    /// Wrapped values are the type requested and type of the actual result.
    ErrorMismatchOutputType(String, String, Position),
    /// Argument count mismatch in a function, method or constructor call.
    /// Wrapped values are the callable name, the expected count and the
    /// actual count.
    ErrorArityMismatch(String, usize, usize, Position),
    /// Array access out-of-bounds.
    /// Wrapped values are the current number of elements in the array and the
    /// index number.
    ErrorArrayBounds(usize, INT, Position),
    /// String indexing out-of-bounds.
    /// Wrapped values are the current number of characters in the string and
    /// the index number.
    ErrorStringBounds(usize, INT, Position),
    /// Dict access with a key that is not present. Wrapped value is the key.
    ErrorKeyNotFound(String, Position),
    /// Trying to index into a type that is not indexable. Wrapped value is
    /// the type name.
    ErrorIndexingType(String, Position),
    /// The `foreach` statement encounters a type that is not iterable.
    /// Wrapped value is the type name.
    ErrorFor(String, Position),
    /// Arithmetic error encountered. Wrapped value is the error message.
    ErrorArithmetic(String, Position),
    /// Access to a private (`_`-prefixed) member from outside the defining
    /// class. Wrapped values are the member name and the class name.
    ErrorPrivateAccess(String, String, Position),
    /// A member or method is not declared on the class of an instance.
    /// Wrapped values are the member name and the class name.
    ErrorMemberNotFound(String, String, Position),
    /// An I/O failure surfaced from a built-in. Wrapped value is the error
    /// message.
    ErrorIO(String, Position),
    /// Run-time error raised by `raise` or a failed `assert`, or by a
    /// built-in reporting a data error. Wrapped value is the full message,
    /// including any `file:line:` prefix.
    ErrorRuntime(String, Position),

    /// Breaking out of loops - not an error if within a loop.
    /// The wrapped value, if true, means breaking clean out of the loop
    /// (i.e. a `break` statement); if false, breaking the current iteration
    /// (i.e. a `continue` statement).
    LoopBreak(bool, Position),
    /// Not an error: Value returned from a function via the `return` keyword.
    /// Wrapped value is the result value.
    Return(Value, Position),
}

impl Error for EvalError {}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ErrorParsing(p, _) => write!(f, "Syntax error: {}", p)?,

            Self::ErrorVariableNotFound(s, _) => write!(f, "Variable not found: {}", s)?,
            Self::ErrorNotAFunction(s, _) => write!(f, "{} is not a function", s)?,

            Self::ErrorMismatchDataType(r, a, _) => match (r.as_str(), a.as_str()) {
                ("", a) => write!(f, "Data type is incorrect: {}", a),
                (r, "") => write!(f, "Data type is incorrect, expecting {}", r),
                (r, a) => write!(f, "Data type is incorrect: {} (expecting {})", a, r),
            }?,
            Self::ErrorMismatchOutputType(r, a, _) => {
                write!(f, "Output type is incorrect: {} (expecting {})", a, r)?
            }
            Self::ErrorArityMismatch(name, expected, actual, _) => match expected {
                1 => write!(f, "'{}' expects 1 argument, got {}", name, actual),
                _ => write!(f, "'{}' expects {} arguments, got {}", name, expected, actual),
            }?,

            Self::ErrorArrayBounds(max, index, _) => match max {
                0 => write!(f, "Array index {} out of bounds: array is empty", index),
                1 => write!(
                    f,
                    "Array index {} out of bounds: only 1 element in the array",
                    index
                ),
                _ => write!(
                    f,
                    "Array index {} out of bounds: only {} elements in the array",
                    index, max
                ),
            }?,
            Self::ErrorStringBounds(max, index, _) => match max {
                0 => write!(f, "String index {} out of bounds: string is empty", index),
                1 => write!(
                    f,
                    "String index {} out of bounds: only 1 character in the string",
                    index
                ),
                _ => write!(
                    f,
                    "String index {} out of bounds: only {} characters in the string",
                    index, max
                ),
            }?,
            Self::ErrorKeyNotFound(key, _) => write!(f, "Dict key not found: {}", key)?,
            Self::ErrorIndexingType(s, _) => write!(f, "Cannot index type '{}'", s)?,
            Self::ErrorFor(s, _) => write!(f, "Cannot iterate over type '{}'", s)?,

            Self::ErrorArithmetic(s, _) => match s.as_str() {
                "" => f.write_str("Arithmetic error"),
                s => f.write_str(s),
            }?,

            Self::ErrorPrivateAccess(member, class, _) => write!(
                f,
                "Cannot access private member '{}' of class {}",
                member, class
            )?,
            Self::ErrorMemberNotFound(member, class, _) => {
                write!(f, "Member '{}' not found on class {}", member, class)?
            }

            Self::ErrorIO(s, _) => f.write_str(s)?,
            Self::ErrorRuntime(s, _) => f.write_str(s)?,

            Self::LoopBreak(true, _) => f.write_str("'break' not inside a loop")?,
            Self::LoopBreak(false, _) => f.write_str("'continue' not inside a loop")?,

            Self::Return(_, _) => f.write_str("NOT AN ERROR - function returns value")?,
        }

        // Do not write any position if None
        if !self.position().is_none() {
            write!(f, " ({})", self.position())?;
        }

        Ok(())
    }
}

impl EvalError {
    /// Is this a pseudo error? A pseudo error is one that does not occur
    /// naturally.
    ///
    /// [`LoopBreak`][EvalError::LoopBreak] and [`Return`][EvalError::Return]
    /// are pseudo errors.
    #[must_use]
    pub const fn is_pseudo_error(&self) -> bool {
        matches!(self, Self::LoopBreak(_, _) | Self::Return(_, _))
    }
    /// Can this error be caught by `try`/`catch`?
    ///
    /// Parse errors happen before evaluation and control-flow signals are not
    /// errors; everything else is catchable.
    #[must_use]
    pub const fn is_catchable(&self) -> bool {
        match self {
            Self::ErrorParsing(_, _) => false,

            Self::ErrorVariableNotFound(_, _)
            | Self::ErrorNotAFunction(_, _)
            | Self::ErrorMismatchDataType(_, _, _)
            | Self::ErrorMismatchOutputType(_, _, _)
            | Self::ErrorArityMismatch(_, _, _, _)
            | Self::ErrorArrayBounds(_, _, _)
            | Self::ErrorStringBounds(_, _, _)
            | Self::ErrorKeyNotFound(_, _)
            | Self::ErrorIndexingType(_, _)
            | Self::ErrorFor(_, _)
            | Self::ErrorArithmetic(_, _)
            | Self::ErrorPrivateAccess(_, _, _)
            | Self::ErrorMemberNotFound(_, _, _)
            | Self::ErrorIO(_, _)
            | Self::ErrorRuntime(_, _) => true,

            Self::LoopBreak(_, _) | Self::Return(_, _) => false,
        }
    }
    /// Get the [`Position`] of this error.
    #[must_use]
    pub const fn position(&self) -> Position {
        match self {
            Self::ErrorParsing(_, pos)
            | Self::ErrorVariableNotFound(_, pos)
            | Self::ErrorNotAFunction(_, pos)
            | Self::ErrorMismatchDataType(_, _, pos)
            | Self::ErrorMismatchOutputType(_, _, pos)
            | Self::ErrorArityMismatch(_, _, _, pos)
            | Self::ErrorArrayBounds(_, _, pos)
            | Self::ErrorStringBounds(_, _, pos)
            | Self::ErrorKeyNotFound(_, pos)
            | Self::ErrorIndexingType(_, pos)
            | Self::ErrorFor(_, pos)
            | Self::ErrorArithmetic(_, pos)
            | Self::ErrorPrivateAccess(_, _, pos)
            | Self::ErrorMemberNotFound(_, _, pos)
            | Self::ErrorIO(_, pos)
            | Self::ErrorRuntime(_, pos)
            | Self::LoopBreak(_, pos)
            | Self::Return(_, pos) => *pos,
        }
    }
    /// Override the [`Position`] of this error.
    pub fn set_position(&mut self, new_position: Position) -> &mut Self {
        match self {
            Self::ErrorParsing(_, pos)
            | Self::ErrorVariableNotFound(_, pos)
            | Self::ErrorNotAFunction(_, pos)
            | Self::ErrorMismatchDataType(_, _, pos)
            | Self::ErrorMismatchOutputType(_, _, pos)
            | Self::ErrorArityMismatch(_, _, _, pos)
            | Self::ErrorArrayBounds(_, _, pos)
            | Self::ErrorStringBounds(_, _, pos)
            | Self::ErrorKeyNotFound(_, pos)
            | Self::ErrorIndexingType(_, pos)
            | Self::ErrorFor(_, pos)
            | Self::ErrorArithmetic(_, pos)
            | Self::ErrorPrivateAccess(_, _, pos)
            | Self::ErrorMemberNotFound(_, _, pos)
            | Self::ErrorIO(_, pos)
            | Self::ErrorRuntime(_, pos)
            | Self::LoopBreak(_, pos)
            | Self::Return(_, pos) => *pos = new_position,
        }
        self
    }
    /// Remove the [`Position`] information from this error and return it.
    pub fn take_position(&mut self) -> Position {
        let pos = self.position();
        self.set_position(Position::NONE);
        pos
    }
    /// Consume the current [`EvalError`] and return a new one with the
    /// specified [`Position`] if the current position is none.
    #[inline]
    #[must_use]
    pub(crate) fn fill_position(mut self: Box<Self>, new_position: Position) -> Box<Self> {
        if self.position().is_none() {
            self.set_position(new_position);
        }
        self
    }
    /// The message string bound to the catch variable when this error is
    /// caught by a `try`/`catch` statement.
    #[must_use]
    pub(crate) fn catch_message(&mut self) -> String {
        match self {
            Self::ErrorRuntime(msg, _) => std::mem::take(msg),
            _ => {
                self.take_position();
                self.to_string()
            }
        }
    }
}

impl<T> From<EvalError> for Result<T, Box<EvalError>> {
    #[inline(always)]
    fn from(err: EvalError) -> Self {
        Err(err.into())
    }
}
