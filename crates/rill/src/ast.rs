//! Module defining the abstract syntax tree of a script.

use crate::token::SourceMap;
use crate::{Identifier, ImmutableString, Position, Shared, StaticVec, FLOAT, INT};
use std::fmt;

/// An identifier carrying the position it was parsed at.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub(crate) struct Ident {
    /// Identifier name.
    pub name: Identifier,
    /// Position of the identifier.
    pub pos: Position,
}

impl fmt::Display for Ident {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Compiled AST (abstract syntax tree) of a script.
///
/// Produced by [`Engine::compile`][crate::Engine::compile] and friends; run
/// it with [`Engine::run_ast`][crate::Engine::run_ast] or
/// [`Engine::eval_ast`][crate::Engine::eval_ast].
#[derive(Debug, Clone)]
pub struct AST {
    /// Top-level statements.
    body: Vec<Stmt>,
    /// Mapping from combined-buffer lines back to originating files.
    source_map: Shared<SourceMap>,
}

impl AST {
    /// Create a new [`AST`].
    #[inline(always)]
    #[must_use]
    pub(crate) fn new(body: Vec<Stmt>, source_map: Shared<SourceMap>) -> Self {
        Self { body, source_map }
    }
    /// The top-level statements.
    #[inline(always)]
    #[must_use]
    pub(crate) fn statements(&self) -> &[Stmt] {
        &self.body
    }
    /// The source map the script was compiled with.
    #[inline(always)]
    #[must_use]
    pub(crate) fn source_map(&self) -> &Shared<SourceMap> {
        &self.source_map
    }
    /// Does this [`AST`] contain no statements at all?
    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// A scripted function definition.
#[derive(Debug, Clone)]
pub(crate) struct ScriptFnDef {
    /// Function name.
    pub name: Ident,
    /// Names of the function parameters.
    pub params: StaticVec<Ident>,
    /// Function body.
    pub body: StmtBlock,
}

impl fmt::Display for ScriptFnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "func {}({})",
            self.name,
            self.params
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

/// A class declaration: member variables with optional initializers plus a
/// method table.
#[derive(Debug, Clone)]
pub(crate) struct ClassDecl {
    /// Class name.
    pub name: Ident,
    /// Declared member variables, in declaration order.
    pub fields: StaticVec<(Ident, Option<Expr>)>,
    /// Methods, in declaration order.
    pub methods: StaticVec<Shared<ScriptFnDef>>,
}

/// A statements block.
#[derive(Debug, Clone)]
pub(crate) struct StmtBlock(pub StaticVec<Stmt>, pub Position);

impl StmtBlock {
    /// Is this statements block empty?
    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    /// The statements of the block.
    #[inline(always)]
    #[must_use]
    pub fn statements(&self) -> &[Stmt] {
        &self.0
    }
    /// Position of the block.
    #[inline(always)]
    #[must_use]
    pub fn position(&self) -> Position {
        self.1
    }
}

/// A binary operator.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub(crate) enum BinaryOp {
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `%`
    Modulo,
    /// `==`
    EqualsTo,
    /// `!=`
    NotEqualsTo,
    /// `<`
    LessThan,
    /// `<=`
    LessThanEqualsTo,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanEqualsTo,
    /// `in`
    In,
    /// `not_in`
    NotIn,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::EqualsTo => "==",
            Self::NotEqualsTo => "!=",
            Self::LessThan => "<",
            Self::LessThanEqualsTo => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanEqualsTo => ">=",
            Self::In => "in",
            Self::NotIn => "not_in",
        })
    }
}

/// A unary operator.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub(crate) enum UnaryOp {
    /// `-`
    Minus,
    /// `not`
    Not,
}

/// A binary expression.
#[derive(Debug, Clone)]
pub(crate) struct BinaryExpr {
    /// LHS expression.
    pub lhs: Expr,
    /// RHS expression.
    pub rhs: Expr,
}

/// A function call: name plus arguments.
#[derive(Debug, Clone)]
pub(crate) struct FnCallExpr {
    /// Name of the function (or, for `new`, the class).
    pub name: Ident,
    /// List of function call argument expressions.
    pub args: StaticVec<Expr>,
}

/// A method call: target object, method name, arguments.
#[derive(Debug, Clone)]
pub(crate) struct MethodCallExpr {
    /// Target object expression.
    pub target: Expr,
    /// Method name.
    pub method: Ident,
    /// List of call argument expressions.
    pub args: StaticVec<Expr>,
}

/// An expression sub-tree.
#[derive(Debug, Clone)]
pub(crate) enum Expr {
    /// Integer constant.
    IntegerConstant(INT, Position),
    /// Floating-point constant.
    FloatConstant(FLOAT, Position),
    /// String constant.
    StringConstant(ImmutableString, Position),
    /// Boolean constant.
    BoolConstant(bool, Position),
    /// `null`
    NullConstant(Position),
    /// `[` expr `,` ... `]`
    Array(Box<StaticVec<Expr>>, Position),
    /// `{` string-key `:` expr `,` ... `}`
    Map(Box<StaticVec<(Expr, Expr)>>, Position),
    /// Variable access.
    Variable(Box<Ident>),
    /// lhs `[` index `]`
    Index(Box<BinaryExpr>, Position),
    /// lhs `[` start `:` end `]`
    Slice(Box<(Expr, Expr, Expr)>, Position),
    /// lhs `.` member
    Dot(Box<(Expr, Ident)>, Position),
    /// lhs `and` rhs
    And(Box<BinaryExpr>, Position),
    /// lhs `or` rhs
    Or(Box<BinaryExpr>, Position),
    /// lhs op rhs
    Binary(Box<BinaryExpr>, BinaryOp, Position),
    /// op expr
    Unary(UnaryOp, Box<Expr>, Position),
    /// name `(` expr `,` ... `)`
    FnCall(Box<FnCallExpr>, Position),
    /// target `.` method `(` expr `,` ... `)`
    MethodCall(Box<MethodCallExpr>, Position),
    /// `new` class-name `(` expr `,` ... `)`
    New(Box<FnCallExpr>, Position),
}

impl Expr {
    /// Get the [`Position`] of the expression.
    #[must_use]
    pub fn position(&self) -> Position {
        match self {
            Self::IntegerConstant(_, pos)
            | Self::FloatConstant(_, pos)
            | Self::StringConstant(_, pos)
            | Self::BoolConstant(_, pos)
            | Self::NullConstant(pos)
            | Self::Array(_, pos)
            | Self::Map(_, pos)
            | Self::Index(_, pos)
            | Self::Slice(_, pos)
            | Self::Dot(_, pos)
            | Self::And(_, pos)
            | Self::Or(_, pos)
            | Self::Binary(_, _, pos)
            | Self::Unary(_, _, pos)
            | Self::FnCall(_, pos)
            | Self::MethodCall(_, pos)
            | Self::New(_, pos) => *pos,

            Self::Variable(x) => x.pos,
        }
    }
}

/// An integer-range `for` loop: `for (` var `=` start `..` end `) {` body `}`.
#[derive(Debug, Clone)]
pub(crate) struct ForRange {
    /// Loop variable.
    pub var: Ident,
    /// Start of the half-open range (inclusive).
    pub start: Expr,
    /// End of the half-open range (exclusive).
    pub end: Expr,
    /// Loop body.
    pub body: StmtBlock,
}

/// An iterator loop: `foreach (` key `=>` value `in` collection `) {` body `}`.
#[derive(Debug, Clone)]
pub(crate) struct ForEach {
    /// Key (or index) variable.
    pub key: Ident,
    /// Value variable.
    pub value: Ident,
    /// Collection being iterated.
    pub iterable: Expr,
    /// Loop body.
    pub body: StmtBlock,
}

/// A statement.
#[derive(Debug, Clone)]
pub(crate) enum Stmt {
    /// `var` id `=` expr
    Var(Box<(Ident, Option<Expr>)>, Position),
    /// `var` id `=` expr `,` id `,` id `=` expr `,` ...
    MultiVar(Box<StaticVec<(Ident, Option<Expr>)>>, Position),
    /// target `=` expr, where target is a variable, index access or member
    /// access. Compound assignments are desugared to this form.
    Assignment(Box<BinaryExpr>, Position),
    /// `func` name `(` params `)` `{` body `}`
    FnDef(Shared<ScriptFnDef>, Position),
    /// `class` name `{` members methods `}`
    Class(Shared<ClassDecl>, Position),
    /// `if` `(` expr `)` `{` stmt `}` `else` `{` stmt `}`
    If(Box<(Expr, StmtBlock, StmtBlock)>, Position),
    /// `while` `(` expr `)` `{` stmt `}`
    While(Box<(Expr, StmtBlock)>, Position),
    /// `for` `(` id `=` start `..` end `)` `{` stmt `}`
    For(Box<ForRange>, Position),
    /// `foreach` `(` key `=>` value `in` expr `)` `{` stmt `}`
    Foreach(Box<ForEach>, Position),
    /// `try` `{` stmt `}` `catch` var `{` stmt `}`
    TryCatch(Box<(StmtBlock, Ident, StmtBlock)>, Position),
    /// `return` expr?
    Return(Option<Expr>, Position),
    /// `break`
    Break(Position),
    /// `continue`
    Continue(Position),
    /// `raise` expr
    Raise(Expr, Position),
    /// `assert` expr (`,` expr)?
    Assert(Box<(Expr, Option<Expr>)>, Position),
    /// An expression as a statement.
    Expr(Expr),
}

impl Stmt {
    /// Get the [`Position`] of the statement.
    #[must_use]
    pub fn position(&self) -> Position {
        match self {
            Self::Var(_, pos)
            | Self::MultiVar(_, pos)
            | Self::Assignment(_, pos)
            | Self::FnDef(_, pos)
            | Self::Class(_, pos)
            | Self::If(_, pos)
            | Self::While(_, pos)
            | Self::For(_, pos)
            | Self::Foreach(_, pos)
            | Self::TryCatch(_, pos)
            | Self::Return(_, pos)
            | Self::Break(pos)
            | Self::Continue(pos)
            | Self::Raise(_, pos)
            | Self::Assert(_, pos) => *pos,

            Self::Expr(expr) => expr.position(),
        }
    }
}
