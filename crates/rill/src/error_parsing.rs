//! Module containing error definitions for the parsing process.

use crate::token::DEFAULT_SOURCE;
use crate::{ImmutableString, Position};
use std::error::Error;
use std::fmt;

/// Error encountered when tokenizing the script text.
///
/// The attached [`Position`] is always in combined-buffer coordinates, before
/// any include-mapping is applied.
#[derive(Debug, Eq, PartialEq, Clone, Hash)]
#[non_exhaustive]
pub enum LexError {
    /// An unexpected symbol is encountered when tokenizing the script text.
    UnexpectedInput(String),
    /// A string literal is not terminated before a new-line or EOF.
    UnterminatedString,
    /// A numeric literal is in an invalid format.
    MalformedNumber(String),
}

impl Error for LexError {}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedInput(s) => write!(f, "Unexpected '{}'", s),
            Self::MalformedNumber(s) => write!(f, "Invalid number: '{}'", s),
            Self::UnterminatedString => f.write_str("Open string is not terminated"),
        }
    }
}

impl LexError {
    /// Convert a [`LexError`] into a [`ParseError`].
    #[inline(always)]
    #[must_use]
    pub fn into_err(self, pos: Position) -> ParseError {
        ParseError(Box::new(self.into()), pos, DEFAULT_SOURCE.into())
    }
}

/// Type of error encountered when parsing a script.
#[derive(Debug, Eq, PartialEq, Clone, Hash)]
#[non_exhaustive]
pub enum ParseErrorType {
    /// The script ends prematurely.
    UnexpectedEOF,
    /// Error in the script text. Wrapped value is the lex error.
    BadInput(LexError),
    /// An unexpected token is encountered. Wrapped value is the token.
    UnexpectedToken(String),
    /// Expecting a particular token but not finding one. Wrapped values are
    /// the token and a description of the context.
    MissingToken(String, String),
    /// Missing a variable name after `var`, `func`, `class`, `catch` or a
    /// loop header.
    VariableExpected,
    /// Missing a member name after `.`.
    PropertyExpected,
    /// A postfix call is applied to something that is neither an identifier
    /// nor a member access. Wrapped value is the error description (if any).
    MalformedCallExpr(String),
    /// Assignment to an inappropriate LHS (left-hand-side) expression.
    /// Wrapped value is the error description (if any).
    AssignmentToInvalidLHS(String),
    /// Missing an expression. Wrapped value is the expression type.
    ExprExpected(String),
}

impl ParseErrorType {
    /// Make a [`ParseError`] using the current type and position.
    #[inline(always)]
    #[must_use]
    pub(crate) fn into_err(self, pos: Position) -> ParseError {
        ParseError(Box::new(self), pos, DEFAULT_SOURCE.into())
    }
}

impl fmt::Display for ParseErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadInput(err) => write!(f, "{}", err),

            Self::UnexpectedToken(s) => write!(f, "Unexpected '{}'", s),
            Self::MissingToken(token, s) => write!(f, "Expecting '{}' {}", token, s),

            Self::MalformedCallExpr(s) => match s.as_str() {
                "" => f.write_str("Only identifiers and member accesses can be called"),
                s => f.write_str(s),
            },
            Self::AssignmentToInvalidLHS(s) => match s.as_str() {
                "" => f.write_str("Expression cannot be assigned to"),
                s => f.write_str(s),
            },

            Self::ExprExpected(s) => write!(f, "Expecting {} expression", s),
            Self::PropertyExpected => f.write_str("Expecting name of a property"),
            Self::VariableExpected => f.write_str("Expecting name of a variable"),
            Self::UnexpectedEOF => f.write_str("Script is incomplete"),
        }
    }
}

impl From<LexError> for ParseErrorType {
    #[inline(always)]
    fn from(err: LexError) -> Self {
        Self::BadInput(err)
    }
}

/// Error when parsing a script.
///
/// Carries the type of error, the position of the offending token and the
/// source file the position resolves to (`<input>` when the script was
/// compiled without a source map).
#[derive(Debug, Eq, PartialEq, Clone, Hash)]
pub struct ParseError(pub Box<ParseErrorType>, pub Position, pub ImmutableString);

impl Error for ParseError {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)?;

        // Do not write any position if None
        if !self.1.is_none() {
            write!(
                f,
                " ({}:{}:{})",
                self.2,
                self.1.line().unwrap_or(0),
                self.1.position().unwrap_or(0)
            )?;
        }

        Ok(())
    }
}

impl From<ParseError> for crate::EvalError {
    #[inline(always)]
    fn from(err: ParseError) -> Self {
        Self::ErrorParsing(*err.0, err.1)
    }
}

impl From<ParseError> for Box<crate::EvalError> {
    #[inline(always)]
    fn from(err: ParseError) -> Self {
        Box::new(err.into())
    }
}

impl ParseError {
    /// Type of the parse error.
    #[inline(always)]
    #[must_use]
    pub fn err_type(&self) -> &ParseErrorType {
        &self.0
    }
    /// [`Position`] of the parse error.
    #[inline(always)]
    #[must_use]
    pub fn position(&self) -> Position {
        self.1
    }
}
