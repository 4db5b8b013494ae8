//! Main module defining the script evaluation engine.

use crate::ast::{
    BinaryOp, Expr, ForEach, ForRange, Ident, ScriptFnDef, Stmt, StmtBlock, UnaryOp, AST,
};
use crate::error::EvalError;
use crate::error_parsing::ParseError;
use crate::fn_native::{NativeCallContext, OnPrintCallback};
use crate::parse::{parse_program, ParseState};
use crate::token::{SourceMap, TokenIterator};
use crate::value::{BoundMethod, ClassValue, FnValue, FromValue, Instance, Map, Value};
use crate::{
    packages, Array, ImmutableString, Locked, Position, RillResult, Scope, Shared, SharedScope,
    FLOAT, INT,
};
use ahash::AHashMap;
use std::fmt;
use std::io::Write;

/// Mutable evaluation state threaded through the statement and expression
/// walkers.
pub(crate) struct EvalState {
    /// Stack of instances whose methods are currently executing, used for
    /// the private-member access policy.
    receivers: Vec<Shared<Instance>>,
    /// Mapping from combined-buffer lines back to source files, consulted by
    /// `raise`/`assert` diagnostics.
    source_map: Shared<SourceMap>,
}

impl EvalState {
    /// Is the code currently executing inside a method whose receiver is an
    /// instance of the same class as `instance`?
    ///
    /// Class identity is compared by reference, not by name.
    #[inline]
    #[must_use]
    fn is_internal_access(&self, instance: &Instance) -> bool {
        self.receivers
            .last()
            .map_or(false, |top| Shared::ptr_eq(&top.class, &instance.class))
    }
}

/// Rill main scripting engine.
///
/// # Example
///
/// ```
/// # fn main() -> Result<(), Box<rill::EvalError>> {
/// use rill::{Engine, INT};
///
/// let engine = Engine::new();
///
/// let result = engine.eval::<INT>("var answer = 40 + 2; answer")?;
///
/// assert_eq!(result, 42);
/// # Ok(())
/// # }
/// ```
pub struct Engine {
    /// Table of built-in functions installed into every global scope.
    builtins: packages::Lib,
    /// Callback closure implementing the `print`/`println` commands.
    pub(crate) print: OnPrintCallback,
    /// Arguments exposed to scripts through `cmd_args()`.
    pub(crate) script_args: Vec<ImmutableString>,
}

impl fmt::Debug for Engine {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Engine")
    }
}

impl Default for Engine {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

/// Print to `stdout`, without a trailing newline, flushing so that prompts
/// and partial lines appear immediately.
#[inline]
fn print_to_stdout(text: &str) {
    print!("{}", text);
    std::io::stdout().flush().ok();
}

impl Engine {
    /// Create a new [`Engine`] with the standard built-in library.
    #[must_use]
    pub fn new() -> Self {
        Self {
            builtins: packages::standard_library(),
            print: Box::new(print_to_stdout),
            script_args: Vec::new(),
        }
    }

    /// Override the callback implementing `print`/`println`.
    ///
    /// The callback receives exactly the text to emit; `println` includes
    /// the trailing newline in the text.
    ///
    /// # Example
    ///
    /// ```
    /// # fn main() -> Result<(), Box<rill::EvalError>> {
    /// use rill::Engine;
    /// use std::cell::RefCell;
    /// use std::rc::Rc;
    ///
    /// let output = Rc::new(RefCell::new(String::new()));
    ///
    /// let mut engine = Engine::new();
    /// let sink = output.clone();
    /// engine.on_print(move |text| sink.borrow_mut().push_str(text));
    ///
    /// engine.run("println(6 * 7);")?;
    ///
    /// assert_eq!(*output.borrow(), "42\n");
    /// # Ok(())
    /// # }
    /// ```
    pub fn on_print(&mut self, callback: impl Fn(&str) + 'static) -> &mut Self {
        self.print = Box::new(callback);
        self
    }

    /// Set the arguments returned by the `cmd_args()` built-in.
    pub fn set_script_args(&mut self, args: impl IntoIterator<Item = String>) -> &mut Self {
        self.script_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Create a fresh global scope pre-populated with the built-ins.
    #[must_use]
    pub fn new_global_scope(&self) -> SharedScope {
        let mut scope = Scope::new();
        for func in self.builtins.iter() {
            scope.define(func.name, Value::Native(*func));
        }
        scope.into_shared()
    }

    /// Compile a script into an [`AST`].
    #[inline(always)]
    pub fn compile(&self, script: &str) -> Result<AST, ParseError> {
        self.compile_with_source_map(script, SourceMap::new())
    }

    /// Compile a script that came out of an include preprocessor, carrying
    /// the preprocessor's line mapping for diagnostics.
    pub fn compile_with_source_map(
        &self,
        script: &str,
        source_map: SourceMap,
    ) -> Result<AST, ParseError> {
        let source_map = Shared::new(source_map);

        let mut stream = TokenIterator::new(script).peekable();
        let state = ParseState::new(source_map.clone());

        let statements = parse_program(&mut stream, &state)?;

        tracing::debug!(statements = statements.len(), "script compiled");

        Ok(AST::new(statements, source_map))
    }

    /// Evaluate a script, returning the value of its last expression
    /// statement cast to `T`.
    #[inline]
    pub fn eval<T: FromValue>(&self, script: &str) -> Result<T, Box<EvalError>> {
        let ast = self.compile(script)?;
        self.eval_ast(&ast)
    }

    /// Evaluate a script against a persistent scope.
    #[inline]
    pub fn eval_with_scope<T: FromValue>(
        &self,
        scope: &SharedScope,
        script: &str,
    ) -> Result<T, Box<EvalError>> {
        let ast = self.compile(script)?;
        self.eval_ast_with_scope(scope, &ast)
    }

    /// Evaluate a compiled [`AST`] under a fresh global scope.
    #[inline]
    pub fn eval_ast<T: FromValue>(&self, ast: &AST) -> Result<T, Box<EvalError>> {
        let scope = self.new_global_scope();
        self.eval_ast_with_scope(&scope, ast)
    }

    /// Evaluate a compiled [`AST`] against a persistent scope.
    pub fn eval_ast_with_scope<T: FromValue>(
        &self,
        scope: &SharedScope,
        ast: &AST,
    ) -> Result<T, Box<EvalError>> {
        let value = self.eval_ast_inner(scope, ast)?;

        T::from_value(value).map_err(|value| {
            Box::new(EvalError::ErrorMismatchOutputType(
                T::type_name().into(),
                value.kind_name().into(),
                Position::NONE,
            ))
        })
    }

    /// Run a script for its side effects.
    #[inline]
    pub fn run(&self, script: &str) -> Result<(), Box<EvalError>> {
        self.eval::<()>(script)
    }

    /// Run a script for its side effects against a persistent scope.
    #[inline]
    pub fn run_with_scope(
        &self,
        scope: &SharedScope,
        script: &str,
    ) -> Result<(), Box<EvalError>> {
        self.eval_with_scope::<()>(scope, script)
    }

    /// Run a compiled [`AST`] for its side effects.
    #[inline]
    pub fn run_ast(&self, ast: &AST) -> Result<(), Box<EvalError>> {
        self.eval_ast::<()>(ast)
    }

    /// Run a compiled [`AST`] for its side effects against a persistent
    /// scope.
    #[inline]
    pub fn run_ast_with_scope(
        &self,
        scope: &SharedScope,
        ast: &AST,
    ) -> Result<(), Box<EvalError>> {
        self.eval_ast_with_scope::<()>(scope, ast)
    }

    /// Walk the top-level statements, tracking the value of the last
    /// expression statement.
    ///
    /// A stray `return` at the top level terminates the script with the
    /// returned value; `break`/`continue` outside a loop surface as errors.
    fn eval_ast_inner(&self, scope: &SharedScope, ast: &AST) -> RillResult {
        let mut state = EvalState {
            receivers: Vec::new(),
            source_map: ast.source_map().clone(),
        };

        tracing::debug!(statements = ast.statements().len(), "script started");

        let mut result = Value::Null;

        for stmt in ast.statements() {
            result = match self.eval_stmt(scope, &mut state, stmt) {
                Ok(value) => value,
                Err(err) => match *err {
                    EvalError::Return(value, _) => return Ok(value),
                    _ => return Err(err),
                },
            };
        }

        Ok(result)
    }

    /// Evaluate a statements block in a fresh child frame.
    fn eval_stmt_block(
        &self,
        scope: &SharedScope,
        state: &mut EvalState,
        block: &StmtBlock,
    ) -> RillResult {
        let frame = Scope::new_child(scope);
        self.eval_block_in_place(&frame, state, block)
    }

    /// Evaluate a statements block directly in the given frame, without
    /// opening a new one. Used for function bodies and loop bodies whose
    /// frame already holds parameters or loop variables.
    fn eval_block_in_place(
        &self,
        scope: &SharedScope,
        state: &mut EvalState,
        block: &StmtBlock,
    ) -> RillResult {
        let mut result = Value::Null;
        for stmt in block.statements() {
            result = self.eval_stmt(scope, state, stmt)?;
        }
        Ok(result)
    }

    /// Evaluate a statement.
    fn eval_stmt(&self, scope: &SharedScope, state: &mut EvalState, stmt: &Stmt) -> RillResult {
        match stmt {
            // Expression as statement
            Stmt::Expr(expr) => self.eval_expr(scope, state, expr),

            // var name = expr
            Stmt::Var(x, _) => {
                let (name, init) = &**x;
                let value = match init {
                    Some(expr) => self.eval_expr(scope, state, expr)?,
                    None => Value::Null,
                };
                scope.borrow_mut().define(name.name.clone(), value);
                Ok(Value::Null)
            }

            // var a = expr, b, c = expr - equivalent to declaring each in order
            Stmt::MultiVar(decls, _) => {
                for (name, init) in decls.iter() {
                    let value = match init {
                        Some(expr) => self.eval_expr(scope, state, expr)?,
                        None => Value::Null,
                    };
                    scope.borrow_mut().define(name.name.clone(), value);
                }
                Ok(Value::Null)
            }

            // target = expr (RHS is evaluated first, then the target resolved)
            Stmt::Assignment(x, pos) => {
                let value = self.eval_expr(scope, state, &x.rhs)?;
                self.assign_to(scope, state, &x.lhs, value, *pos)
            }

            // func name(params) { body } - captures the current frame
            Stmt::FnDef(def, _) => {
                let func = FnValue {
                    def: def.clone(),
                    scope: scope.clone(),
                };
                scope
                    .borrow_mut()
                    .define(def.name.name.clone(), Value::Fn(Shared::new(func)));
                Ok(Value::Null)
            }

            // class name { members methods } - captures the current frame
            Stmt::Class(decl, _) => {
                let mut methods = AHashMap::default();
                for method in decl.methods.iter() {
                    methods.insert(method.name.name.clone(), method.clone());
                }
                let class = ClassValue {
                    decl: decl.clone(),
                    methods,
                    scope: scope.clone(),
                };
                scope
                    .borrow_mut()
                    .define(decl.name.name.clone(), Value::Class(Shared::new(class)));
                Ok(Value::Null)
            }

            // if (cond) { ... } else { ... }
            Stmt::If(x, _) => {
                let (condition, then_block, else_block) = &**x;

                if self.eval_expr(scope, state, condition)?.is_truthy() {
                    if !then_block.is_empty() {
                        self.eval_stmt_block(scope, state, then_block)?;
                    }
                } else if !else_block.is_empty() {
                    self.eval_stmt_block(scope, state, else_block)?;
                }
                Ok(Value::Null)
            }

            // while (cond) { ... }
            Stmt::While(x, _) => {
                let (condition, body) = &**x;

                loop {
                    if !self.eval_expr(scope, state, condition)?.is_truthy() {
                        break;
                    }
                    match self.eval_stmt_block(scope, state, body) {
                        Ok(_) => (),
                        Err(err) => match *err {
                            EvalError::LoopBreak(false, _) => (),
                            EvalError::LoopBreak(true, _) => break,
                            _ => return Err(err),
                        },
                    }
                }
                Ok(Value::Null)
            }

            // for (i = start .. end) { ... } - half-open integer range
            Stmt::For(x, _) => {
                let ForRange {
                    var,
                    start,
                    end,
                    body,
                } = &**x;

                let from = self.eval_int_operand(scope, state, start)?;
                let to = self.eval_int_operand(scope, state, end)?;

                for i in from..to {
                    let frame = Scope::new_child(scope);
                    frame.borrow_mut().define(var.name.clone(), Value::Int(i));

                    match self.eval_block_in_place(&frame, state, body) {
                        Ok(_) => (),
                        Err(err) => match *err {
                            EvalError::LoopBreak(false, _) => (),
                            EvalError::LoopBreak(true, _) => break,
                            _ => return Err(err),
                        },
                    }
                }
                Ok(Value::Null)
            }

            // foreach (k => v in collection) { ... }
            Stmt::Foreach(x, _) => {
                let ForEach {
                    key,
                    value,
                    iterable,
                    body,
                } = &**x;

                let collection = self.eval_expr(scope, state, iterable)?;

                // Snapshot the pairs up-front; mutating the collection while
                // iterating it is unspecified
                let pairs: Vec<(Value, Value)> = match &collection {
                    Value::Array(a) => a
                        .borrow()
                        .iter()
                        .enumerate()
                        .map(|(i, v)| (Value::Int(i as INT), v.clone()))
                        .collect(),
                    Value::Map(m) => m
                        .borrow()
                        .iter()
                        .map(|(k, v)| (Value::Str(k.clone().into()), v.clone()))
                        .collect(),
                    other => {
                        return EvalError::ErrorFor(
                            other.kind_name().into(),
                            iterable.position(),
                        )
                        .into()
                    }
                };

                for (k, v) in pairs {
                    let frame = Scope::new_child(scope);
                    {
                        let mut frame = frame.borrow_mut();
                        frame.define(key.name.clone(), k);
                        frame.define(value.name.clone(), v);
                    }

                    match self.eval_block_in_place(&frame, state, body) {
                        Ok(_) => (),
                        Err(err) => match *err {
                            EvalError::LoopBreak(false, _) => (),
                            EvalError::LoopBreak(true, _) => break,
                            _ => return Err(err),
                        },
                    }
                }
                Ok(Value::Null)
            }

            // try { ... } catch e { ... }
            Stmt::TryCatch(x, _) => {
                let (try_block, catch_var, catch_block) = &**x;

                match self.eval_stmt_block(scope, state, try_block) {
                    Ok(_) => Ok(Value::Null),
                    // return/break/continue pass through unaffected
                    Err(err) if err.is_pseudo_error() => Err(err),
                    Err(err) if !err.is_catchable() => Err(err),
                    Err(mut err) => {
                        let message = err.catch_message();

                        let frame = Scope::new_child(scope);
                        frame
                            .borrow_mut()
                            .define(catch_var.name.clone(), Value::from(message));

                        self.eval_block_in_place(&frame, state, catch_block)?;
                        Ok(Value::Null)
                    }
                }
            }

            // return expr?
            Stmt::Return(value, pos) => {
                let value = match value {
                    Some(expr) => self.eval_expr(scope, state, expr)?,
                    None => Value::Null,
                };
                EvalError::Return(value, *pos).into()
            }

            // break / continue
            Stmt::Break(pos) => EvalError::LoopBreak(true, *pos).into(),
            Stmt::Continue(pos) => EvalError::LoopBreak(false, *pos).into(),

            // raise expr
            Stmt::Raise(expr, pos) => {
                let value = self.eval_expr(scope, state, expr)?;
                Err(self.make_runtime_error(value.to_string(), state, *pos))
            }

            // assert expr, msg?
            Stmt::Assert(x, pos) => {
                let (condition, message) = &**x;

                if self.eval_expr(scope, state, condition)?.is_truthy() {
                    return Ok(Value::Null);
                }

                let message = match message {
                    Some(expr) => self.eval_expr(scope, state, expr)?.to_string(),
                    None => "Assertion failed".to_string(),
                };
                Err(self.make_runtime_error(message, state, *pos))
            }
        }
    }

    /// Evaluate an expression.
    fn eval_expr(&self, scope: &SharedScope, state: &mut EvalState, expr: &Expr) -> RillResult {
        match expr {
            Expr::IntegerConstant(n, _) => Ok(Value::Int(*n)),
            Expr::FloatConstant(v, _) => Ok(Value::Float(*v)),
            Expr::StringConstant(s, _) => Ok(Value::Str(s.clone())),
            Expr::BoolConstant(b, _) => Ok(Value::Bool(*b)),
            Expr::NullConstant(_) => Ok(Value::Null),

            Expr::Array(items, _) => {
                let mut array = Array::with_capacity(items.len());
                for item in items.iter() {
                    array.push(self.eval_expr(scope, state, item)?);
                }
                Ok(Value::array(array))
            }

            Expr::Map(pairs, _) => {
                let mut map = Map::new();
                for (key_expr, value_expr) in pairs.iter() {
                    let key = match self.eval_expr(scope, state, key_expr)? {
                        Value::Str(s) => s,
                        other => {
                            return self.make_type_mismatch_err(
                                "a string key",
                                &other,
                                key_expr.position(),
                            )
                        }
                    };
                    let value = self.eval_expr(scope, state, value_expr)?;
                    map.insert(key.as_str().into(), value);
                }
                Ok(Value::map(map))
            }

            Expr::Variable(ident) => {
                let value = scope.borrow().get(&ident.name);
                value.ok_or_else(|| {
                    EvalError::ErrorVariableNotFound(ident.name.to_string(), ident.pos).into()
                })
            }

            // Short-circuit: the right operand is only evaluated when needed
            Expr::And(x, _) => {
                if !self.eval_expr(scope, state, &x.lhs)?.is_truthy() {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(self.eval_expr(scope, state, &x.rhs)?.is_truthy()))
            }
            Expr::Or(x, _) => {
                if self.eval_expr(scope, state, &x.lhs)?.is_truthy() {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(self.eval_expr(scope, state, &x.rhs)?.is_truthy()))
            }

            Expr::Binary(x, op, pos) => {
                let lhs = self.eval_expr(scope, state, &x.lhs)?;
                let rhs = self.eval_expr(scope, state, &x.rhs)?;
                self.eval_binary_op(*op, lhs, rhs, *pos)
            }

            Expr::Unary(op, operand, pos) => {
                let value = self.eval_expr(scope, state, operand)?;
                match op {
                    UnaryOp::Minus => match value {
                        Value::Int(n) => n.checked_neg().map(Value::Int).ok_or_else(|| {
                            Box::new(EvalError::ErrorArithmetic(
                                "Integer overflow in negation".into(),
                                *pos,
                            ))
                        }),
                        Value::Float(v) => Ok(Value::Float(-v)),
                        other => self.make_type_mismatch_err("a number", &other, *pos),
                    },
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                }
            }

            Expr::Index(x, pos) => {
                let target = self.eval_expr(scope, state, &x.lhs)?;
                let index = self.eval_expr(scope, state, &x.rhs)?;
                self.eval_index(target, index, *pos)
            }

            Expr::Slice(x, pos) => {
                let (target_expr, start_expr, end_expr) = &**x;
                let target = self.eval_expr(scope, state, target_expr)?;
                let start = self.eval_expr(scope, state, start_expr)?;
                let end = self.eval_expr(scope, state, end_expr)?;
                self.eval_slice(target, start, end, *pos)
            }

            Expr::Dot(x, pos) => {
                let (target_expr, member) = &**x;
                let target = self.eval_expr(scope, state, target_expr)?;
                match target {
                    Value::Instance(instance) => self.get_member(&instance, member, state),
                    other => self.make_type_mismatch_err("a class instance", &other, *pos),
                }
            }

            Expr::FnCall(x, pos) => {
                let callee = scope.borrow().get(&x.name.name);
                let callee = match callee {
                    Some(value) => value,
                    None => {
                        return EvalError::ErrorVariableNotFound(
                            x.name.name.to_string(),
                            x.name.pos,
                        )
                        .into()
                    }
                };

                let mut args = Vec::with_capacity(x.args.len());
                for arg in x.args.iter() {
                    args.push(self.eval_expr(scope, state, arg)?);
                }

                self.call_value(&x.name.name, callee, args, state, *pos)
            }

            Expr::MethodCall(x, pos) => {
                let target = self.eval_expr(scope, state, &x.target)?;

                let mut args = Vec::with_capacity(x.args.len());
                for arg in x.args.iter() {
                    args.push(self.eval_expr(scope, state, arg)?);
                }

                match target {
                    Value::Instance(instance) => {
                        self.call_method_by_name(&instance, &x.method, args, state, *pos)
                    }
                    other => self.make_type_mismatch_err("a class instance", &other, *pos),
                }
            }

            Expr::New(x, pos) => {
                let callee = scope.borrow().get(&x.name.name);
                let class = match callee {
                    Some(Value::Class(class)) => class,
                    Some(other) => {
                        return self.make_type_mismatch_err("a class", &other, x.name.pos)
                    }
                    None => {
                        return EvalError::ErrorVariableNotFound(
                            x.name.name.to_string(),
                            x.name.pos,
                        )
                        .into()
                    }
                };

                let mut args = Vec::with_capacity(x.args.len());
                for arg in x.args.iter() {
                    args.push(self.eval_expr(scope, state, arg)?);
                }

                self.instantiate(&class, args, state, *pos)
            }
        }
    }

    /// Assign an already-evaluated value to an assignment target.
    fn assign_to(
        &self,
        scope: &SharedScope,
        state: &mut EvalState,
        target: &Expr,
        value: Value,
        pos: Position,
    ) -> RillResult {
        match target {
            Expr::Variable(ident) => {
                if scope.borrow_mut().set(&ident.name, value) {
                    Ok(Value::Null)
                } else {
                    EvalError::ErrorVariableNotFound(ident.name.to_string(), ident.pos).into()
                }
            }

            Expr::Index(x, index_pos) => {
                let container = self.eval_expr(scope, state, &x.lhs)?;
                let index = self.eval_expr(scope, state, &x.rhs)?;

                match (container, index) {
                    (Value::Array(a), Value::Int(i)) => {
                        let mut array = a.borrow_mut();
                        let len = array.len();
                        // negative indices are not accepted by assignment
                        if i < 0 || i as usize >= len {
                            return EvalError::ErrorArrayBounds(len, i, *index_pos).into();
                        }
                        array[i as usize] = value;
                        Ok(Value::Null)
                    }
                    (Value::Array(_), index) => {
                        self.make_type_mismatch_err("an integer index", &index, *index_pos)
                    }
                    (Value::Map(m), Value::Str(key)) => {
                        m.borrow_mut().insert(key.as_str().into(), value);
                        Ok(Value::Null)
                    }
                    (Value::Map(_), index) => {
                        self.make_type_mismatch_err("a string key", &index, *index_pos)
                    }
                    (Value::Str(_), _) => EvalError::ErrorMismatchDataType(
                        "a mutable collection".into(),
                        "string (strings are immutable)".into(),
                        *index_pos,
                    )
                    .into(),
                    (other, _) => {
                        EvalError::ErrorIndexingType(other.kind_name().into(), *index_pos).into()
                    }
                }
            }

            Expr::Dot(x, dot_pos) => {
                let (target_expr, member) = &**x;
                let target = self.eval_expr(scope, state, target_expr)?;
                match target {
                    Value::Instance(instance) => {
                        self.set_member(&instance, member, value, state)?;
                        Ok(Value::Null)
                    }
                    other => self.make_type_mismatch_err("a class instance", &other, *dot_pos),
                }
            }

            _ => unreachable!("invalid assignment target at {:?}", pos),
        }
    }

    /// Read a member of an instance: a field value, or a bound method.
    fn get_member(
        &self,
        instance: &Shared<Instance>,
        member: &Ident,
        state: &EvalState,
    ) -> RillResult {
        self.check_member_access(instance, member, state)?;

        let field = instance.fields.borrow().get(member.name.as_str()).cloned();
        if let Some(value) = field {
            return Ok(value);
        }

        if let Some(method) = instance.class.methods.get(member.name.as_str()) {
            return Ok(Value::Method(Shared::new(BoundMethod {
                receiver: instance.clone(),
                method: method.clone(),
            })));
        }

        EvalError::ErrorMemberNotFound(
            member.name.to_string(),
            instance.class_name().to_string(),
            member.pos,
        )
        .into()
    }

    /// Write a declared field of an instance.
    fn set_member(
        &self,
        instance: &Shared<Instance>,
        member: &Ident,
        value: Value,
        state: &EvalState,
    ) -> Result<(), Box<EvalError>> {
        self.check_member_access(instance, member, state)?;

        let mut fields = instance.fields.borrow_mut();
        match fields.get_mut(member.name.as_str()) {
            // setting an undeclared field fails
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => EvalError::ErrorMemberNotFound(
                member.name.to_string(),
                instance.class_name().to_string(),
                member.pos,
            )
            .into(),
        }
    }

    /// Enforce the private-member policy: `_`-prefixed members are
    /// accessible only while a method of the same class is executing.
    fn check_member_access(
        &self,
        instance: &Shared<Instance>,
        member: &Ident,
        state: &EvalState,
    ) -> Result<(), Box<EvalError>> {
        if member.name.starts_with('_') && !state.is_internal_access(instance) {
            return EvalError::ErrorPrivateAccess(
                member.name.to_string(),
                instance.class_name().to_string(),
                member.pos,
            )
            .into();
        }
        Ok(())
    }

    /// Invoke a callable value: a built-in, a script function or a bound
    /// method.
    fn call_value(
        &self,
        name: &str,
        callee: Value,
        args: Vec<Value>,
        state: &mut EvalState,
        pos: Position,
    ) -> RillResult {
        match callee {
            Value::Native(func) => {
                let ctx = NativeCallContext::new(self, func.name, pos);
                (func.func)(&ctx, &args).map_err(|err| err.fill_position(pos))
            }
            Value::Fn(func) => {
                if args.len() != func.def.params.len() {
                    return EvalError::ErrorArityMismatch(
                        func.def.name.name.to_string(),
                        func.def.params.len(),
                        args.len(),
                        pos,
                    )
                    .into();
                }
                self.call_script_fn(&func, args, state)
            }
            Value::Method(bound) => {
                if args.len() != bound.method.params.len() {
                    return EvalError::ErrorArityMismatch(
                        bound.method.name.name.to_string(),
                        bound.method.params.len(),
                        args.len(),
                        pos,
                    )
                    .into();
                }
                self.call_method(&bound.receiver, &bound.method, args, state)
            }
            _ => EvalError::ErrorNotAFunction(name.to_string(), pos).into(),
        }
    }

    /// Call a script function: a fresh frame chains from the function's
    /// captured scope (not the caller's), parameters are bound, and the body
    /// runs until `return` or fall-through (which yields null).
    fn call_script_fn(
        &self,
        func: &FnValue,
        args: Vec<Value>,
        state: &mut EvalState,
    ) -> RillResult {
        let frame = Scope::new_child(&func.scope);
        {
            let mut frame = frame.borrow_mut();
            for (param, arg) in func.def.params.iter().zip(args) {
                frame.define(param.name.clone(), arg);
            }
        }

        let result = self.eval_block_in_place(&frame, state, &func.def.body);

        match result {
            Ok(_) => Ok(Value::Null),
            Err(err) => match *err {
                EvalError::Return(value, _) => Ok(value),
                _ => Err(err),
            },
        }
    }

    /// Resolve a method by name on an instance and call it.
    fn call_method_by_name(
        &self,
        instance: &Shared<Instance>,
        method: &Ident,
        args: Vec<Value>,
        state: &mut EvalState,
        pos: Position,
    ) -> RillResult {
        self.check_member_access(instance, method, state)?;

        let def = match instance.class.methods.get(method.name.as_str()) {
            Some(def) => def.clone(),
            None => {
                return EvalError::ErrorMemberNotFound(
                    method.name.to_string(),
                    instance.class_name().to_string(),
                    method.pos,
                )
                .into()
            }
        };

        if args.len() != def.params.len() {
            return EvalError::ErrorArityMismatch(
                method.name.to_string(),
                def.params.len(),
                args.len(),
                pos,
            )
            .into();
        }

        self.call_method(instance, &def, args, state)
    }

    /// Run a method body with `this`/`self` bound and the receiver pushed
    /// for the duration.
    fn call_method(
        &self,
        instance: &Shared<Instance>,
        def: &Shared<ScriptFnDef>,
        args: Vec<Value>,
        state: &mut EvalState,
    ) -> RillResult {
        let frame = Scope::new_child(&instance.class.scope);
        {
            let mut frame = frame.borrow_mut();
            frame.define("this", Value::Instance(instance.clone()));
            frame.define("self", Value::Instance(instance.clone()));
            for (param, arg) in def.params.iter().zip(args) {
                frame.define(param.name.clone(), arg);
            }
        }

        state.receivers.push(instance.clone());
        let result = self.eval_block_in_place(&frame, state, &def.body);
        state.receivers.pop();

        match result {
            Ok(_) => Ok(Value::Null),
            Err(err) => match *err {
                EvalError::Return(value, _) => Ok(value),
                _ => Err(err),
            },
        }
    }

    /// Allocate a new instance: evaluate member initializers in declaration
    /// order, then call `init` if the class defines one.
    fn instantiate(
        &self,
        class: &Shared<ClassValue>,
        args: Vec<Value>,
        state: &mut EvalState,
        pos: Position,
    ) -> RillResult {
        let instance = Shared::new(Instance {
            class: class.clone(),
            fields: Locked::new(Map::new()),
        });

        // Member initializers see `this`/`self` and the class's defining
        // scope, with the receiver pushed
        let init_scope = Scope::new_child(&class.scope);
        {
            let mut frame = init_scope.borrow_mut();
            frame.define("this", Value::Instance(instance.clone()));
            frame.define("self", Value::Instance(instance.clone()));
        }

        state.receivers.push(instance.clone());
        let mut field_error = None;
        for (field, init) in class.decl.fields.iter() {
            let value = match init {
                Some(expr) => match self.eval_expr(&init_scope, state, expr) {
                    Ok(value) => value,
                    Err(err) => {
                        field_error = Some(err);
                        break;
                    }
                },
                None => Value::Null,
            };
            instance.fields.borrow_mut().insert(field.name.clone(), value);
        }
        state.receivers.pop();

        if let Some(err) = field_error {
            return Err(err);
        }

        let init = class.methods.get("init").cloned();
        match init {
            Some(def) => {
                if args.len() != def.params.len() {
                    return EvalError::ErrorArityMismatch(
                        format!("{}.init", class.name()),
                        def.params.len(),
                        args.len(),
                        pos,
                    )
                    .into();
                }
                self.call_method(&instance, &def, args, state)?;
            }
            None if !args.is_empty() => {
                return EvalError::ErrorArityMismatch(
                    format!("new {}", class.name()),
                    0,
                    args.len(),
                    pos,
                )
                .into();
            }
            None => (),
        }

        Ok(Value::Instance(instance))
    }

    /// Evaluate an expression that must produce an integer.
    fn eval_int_operand(
        &self,
        scope: &SharedScope,
        state: &mut EvalState,
        expr: &Expr,
    ) -> Result<INT, Box<EvalError>> {
        match self.eval_expr(scope, state, expr)? {
            Value::Int(n) => Ok(n),
            other => Err(Box::new(EvalError::ErrorMismatchDataType(
                "an integer".into(),
                other.kind_name().into(),
                expr.position(),
            ))),
        }
    }

    /// Evaluate an index access.
    fn eval_index(&self, target: Value, index: Value, pos: Position) -> RillResult {
        match (target, index) {
            (Value::Array(a), Value::Int(i)) => {
                let array = a.borrow();
                if i < 0 || i as usize >= array.len() {
                    return EvalError::ErrorArrayBounds(array.len(), i, pos).into();
                }
                Ok(array[i as usize].clone())
            }
            (Value::Array(_), index) => {
                self.make_type_mismatch_err("an integer index", &index, pos)
            }
            (Value::Map(m), Value::Str(key)) => {
                let map = m.borrow();
                match map.get(key.as_str()) {
                    Some(value) => Ok(value.clone()),
                    None => EvalError::ErrorKeyNotFound(key.to_string(), pos).into(),
                }
            }
            (Value::Map(_), index) => self.make_type_mismatch_err("a string key", &index, pos),
            (Value::Str(s), Value::Int(i)) => {
                if i < 0 {
                    return EvalError::ErrorStringBounds(s.chars_len(), i, pos).into();
                }
                match s.chars().nth(i as usize) {
                    Some(ch) => Ok(Value::Str(ch.into())),
                    None => EvalError::ErrorStringBounds(s.chars_len(), i, pos).into(),
                }
            }
            (Value::Str(_), index) => {
                self.make_type_mismatch_err("an integer index", &index, pos)
            }
            (other, _) => EvalError::ErrorIndexingType(other.kind_name().into(), pos).into(),
        }
    }

    /// Evaluate a slice access on an array or string, with Python-style
    /// index clamping.
    fn eval_slice(&self, target: Value, start: Value, end: Value, pos: Position) -> RillResult {
        let (start, end) = match (start, end) {
            (Value::Int(a), Value::Int(b)) => (a, b),
            (Value::Int(_), other) | (other, _) => {
                return self.make_type_mismatch_err("an integer slice index", &other, pos)
            }
        };

        match target {
            Value::Array(a) => {
                let array = a.borrow();
                let (from, to) = clamp_slice(start, end, array.len());
                Ok(Value::array(array[from..to].to_vec()))
            }
            Value::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                let (from, to) = clamp_slice(start, end, chars.len());
                Ok(Value::from(chars[from..to].iter().collect::<String>()))
            }
            other => EvalError::ErrorIndexingType(other.kind_name().into(), pos).into(),
        }
    }

    /// Evaluate a binary operator over two already-evaluated operands.
    fn eval_binary_op(
        &self,
        op: BinaryOp,
        lhs: Value,
        rhs: Value,
        pos: Position,
    ) -> RillResult {
        match op {
            BinaryOp::Plus => match (lhs, rhs) {
                (Value::Str(a), Value::Str(b)) => {
                    Ok(Value::from(format!("{}{}", a, b)))
                }
                // `+` with at least one string operand coerces the other
                (Value::Str(a), b) => Ok(Value::from(format!("{}{}", a, b))),
                (a, Value::Str(b)) => Ok(Value::from(format!("{}{}", a, b))),
                (Value::Int(a), Value::Int(b)) => a
                    .checked_add(b)
                    .map(Value::Int)
                    .ok_or_else(|| arith_overflow(a, "+", b, pos)),
                (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
                (Value::Int(a), Value::Float(b)) => Ok(Value::Float(a as FLOAT + b)),
                (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a + b as FLOAT)),
                (Value::Array(a), Value::Array(b)) => {
                    let mut out: Array = a.borrow().clone();
                    out.extend(b.borrow().iter().cloned());
                    Ok(Value::array(out))
                }
                (a, b) => self.make_operands_err(op, &a, &b, pos),
            },

            BinaryOp::Minus => match (lhs, rhs) {
                (Value::Int(a), Value::Int(b)) => a
                    .checked_sub(b)
                    .map(Value::Int)
                    .ok_or_else(|| arith_overflow(a, "-", b, pos)),
                (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a - b)),
                (Value::Int(a), Value::Float(b)) => Ok(Value::Float(a as FLOAT - b)),
                (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a - b as FLOAT)),
                (a, b) => self.make_operands_err(op, &a, &b, pos),
            },

            BinaryOp::Multiply => match (lhs, rhs) {
                (Value::Int(a), Value::Int(b)) => a
                    .checked_mul(b)
                    .map(Value::Int)
                    .ok_or_else(|| arith_overflow(a, "*", b, pos)),
                (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a * b)),
                (Value::Int(a), Value::Float(b)) => Ok(Value::Float(a as FLOAT * b)),
                (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a * b as FLOAT)),
                (a, b) => self.make_operands_err(op, &a, &b, pos),
            },

            // `/` is floor division on two integers, IEEE division otherwise
            BinaryOp::Divide => match (lhs, rhs) {
                (Value::Int(a), Value::Int(b)) => div_floor_checked(a, b, pos).map(Value::Int),
                (a, b) => match (to_float(&a), to_float(&b)) {
                    (Some(x), Some(y)) => {
                        if y == 0.0 {
                            EvalError::ErrorArithmetic("Division by zero".into(), pos).into()
                        } else {
                            Ok(Value::Float(x / y))
                        }
                    }
                    _ => self.make_operands_err(op, &a, &b, pos),
                },
            },

            BinaryOp::Modulo => match (lhs, rhs) {
                (Value::Int(a), Value::Int(b)) => mod_floor_checked(a, b, pos).map(Value::Int),
                (a, b) => match (to_float(&a), to_float(&b)) {
                    (Some(x), Some(y)) => {
                        if y == 0.0 {
                            EvalError::ErrorArithmetic("Modulo by zero".into(), pos).into()
                        } else {
                            let r = x % y;
                            let r = if r != 0.0 && (r < 0.0) != (y < 0.0) {
                                r + y
                            } else {
                                r
                            };
                            Ok(Value::Float(r))
                        }
                    }
                    _ => self.make_operands_err(op, &a, &b, pos),
                },
            },

            BinaryOp::EqualsTo => Ok(Value::Bool(lhs == rhs)),
            BinaryOp::NotEqualsTo => Ok(Value::Bool(lhs != rhs)),

            BinaryOp::LessThan
            | BinaryOp::LessThanEqualsTo
            | BinaryOp::GreaterThan
            | BinaryOp::GreaterThanEqualsTo => {
                use std::cmp::Ordering;

                let ordering = match (&lhs, &rhs) {
                    (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
                    (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
                    (a, b) => match (to_float(a), to_float(b)) {
                        (Some(x), Some(y)) => x.partial_cmp(&y),
                        _ => return self.make_operands_err(op, &lhs, &rhs, pos),
                    },
                };

                let result = ordering.map_or(false, |ordering| match op {
                    BinaryOp::LessThan => ordering == Ordering::Less,
                    BinaryOp::LessThanEqualsTo => ordering != Ordering::Greater,
                    BinaryOp::GreaterThan => ordering == Ordering::Greater,
                    BinaryOp::GreaterThanEqualsTo => ordering != Ordering::Less,
                    _ => unreachable!("comparison operator"),
                });

                Ok(Value::Bool(result))
            }

            BinaryOp::In | BinaryOp::NotIn => {
                let found = match (&lhs, &rhs) {
                    (needle, Value::Array(a)) => a.borrow().iter().any(|item| item == needle),
                    (Value::Str(key), Value::Map(m)) => m.borrow().contains_key(key.as_str()),
                    (_, Value::Map(_)) => {
                        return self.make_type_mismatch_err("a string key", &lhs, pos)
                    }
                    (Value::Str(needle), Value::Str(haystack)) => {
                        haystack.as_str().contains(needle.as_str())
                    }
                    (_, Value::Str(_)) => {
                        return self.make_type_mismatch_err("a string", &lhs, pos)
                    }
                    (_, other) => {
                        return self.make_type_mismatch_err(
                            "an array, dict or string",
                            other,
                            pos,
                        )
                    }
                };

                Ok(Value::Bool(if op == BinaryOp::NotIn {
                    !found
                } else {
                    found
                }))
            }
        }
    }

    /// Make a type-mismatch error against an actual value.
    fn make_type_mismatch_err(
        &self,
        requested: &str,
        actual: &Value,
        pos: Position,
    ) -> RillResult {
        EvalError::ErrorMismatchDataType(requested.into(), actual.kind_name().into(), pos).into()
    }

    /// Make a type-mismatch error for a binary operator over unsupported
    /// operand types.
    fn make_operands_err(&self, op: BinaryOp, lhs: &Value, rhs: &Value, pos: Position) -> RillResult {
        EvalError::ErrorMismatchDataType(
            format!("valid operands for '{}'", op),
            format!("{} and {}", lhs.kind_name(), rhs.kind_name()),
            pos,
        )
        .into()
    }

    /// Make a `raise`/`assert`-style runtime error with a `file:line:`
    /// prefix resolved through the source map.
    fn make_runtime_error(
        &self,
        message: String,
        state: &EvalState,
        pos: Position,
    ) -> Box<EvalError> {
        let (file, line) = state.source_map.resolve(pos.line().unwrap_or(0));
        Box::new(EvalError::ErrorRuntime(
            format!("{}:{}: {}", file, line, message),
            pos,
        ))
    }
}

/// Coerce a numeric value to float; `None` for non-numbers.
#[inline]
fn to_float(value: &Value) -> Option<FLOAT> {
    match value {
        Value::Int(n) => Some(*n as FLOAT),
        Value::Float(v) => Some(*v),
        _ => None,
    }
}

/// Checked floor division: `-7 / 2 == -4`, division by zero and `MIN / -1`
/// are errors.
fn div_floor_checked(a: INT, b: INT, pos: Position) -> Result<INT, Box<EvalError>> {
    if b == 0 {
        return Err(Box::new(EvalError::ErrorArithmetic(
            "Division by zero".into(),
            pos,
        )));
    }
    if a == INT::MIN && b == -1 {
        return Err(arith_overflow(a, "/", b, pos));
    }

    let q = a / b;
    let r = a % b;
    Ok(if r != 0 && (a < 0) != (b < 0) { q - 1 } else { q })
}

/// Checked floored remainder: the result takes the sign of the divisor.
fn mod_floor_checked(a: INT, b: INT, pos: Position) -> Result<INT, Box<EvalError>> {
    if b == 0 {
        return Err(Box::new(EvalError::ErrorArithmetic(
            "Modulo by zero".into(),
            pos,
        )));
    }
    if a == INT::MIN && b == -1 {
        return Ok(0);
    }

    let r = a % b;
    Ok(if r != 0 && (r < 0) != (b < 0) { r + b } else { r })
}

/// Integer-overflow error for a binary operation.
fn arith_overflow(a: INT, op: &str, b: INT, pos: Position) -> Box<EvalError> {
    Box::new(EvalError::ErrorArithmetic(
        format!("Integer overflow: {} {} {}", a, op, b),
        pos,
    ))
}

/// Clamp Python-style slice indices into `[0, len]`, yielding an empty range
/// when start is not below end.
fn clamp_slice(start: INT, end: INT, len: usize) -> (usize, usize) {
    let len_i = len as INT;

    let from = if start < 0 {
        (len_i + start).max(0)
    } else {
        start.min(len_i)
    } as usize;
    let to = if end < 0 {
        (len_i + end).max(0)
    } else {
        end.min(len_i)
    } as usize;

    if from >= to {
        (0, 0)
    } else {
        (from, to)
    }
}
