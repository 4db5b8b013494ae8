//! Main module defining the recursive-descent parser.

use crate::ast::{
    BinaryExpr, BinaryOp, ClassDecl, Expr, FnCallExpr, ForEach, ForRange, Ident, MethodCallExpr,
    ScriptFnDef, Stmt, StmtBlock, UnaryOp,
};
use crate::error_parsing::{ParseError, ParseErrorType};
use crate::token::{SourceMap, Token, TokenStream};
use crate::{Position, Shared, StaticVec};

type PERR = ParseErrorType;

/// The message: `TokenStream` never ends
const NEVER_ENDS: &str = "`TokenStream` never ends";

/// A type that encapsulates the current state of the parser.
pub(crate) struct ParseState {
    /// Mapping from combined-buffer lines back to source files, consulted
    /// when reporting errors.
    map: Shared<SourceMap>,
}

impl ParseState {
    /// Create a new [`ParseState`].
    #[inline(always)]
    #[must_use]
    pub fn new(map: Shared<SourceMap>) -> Self {
        Self { map }
    }

    /// Make a [`ParseError`], resolving the offending token's file and line
    /// through the source map.
    ///
    /// Lexer errors keep their raw combined-buffer coordinates.
    fn make_err(&self, err: PERR, pos: Position) -> ParseError {
        if matches!(err, PERR::BadInput(_)) || pos.is_none() {
            return err.into_err(pos);
        }

        let (file, line) = self.map.resolve(pos.line().expect("position is not none"));
        let line = line.clamp(1, u16::MAX as usize) as u16;
        let column = pos.position().unwrap_or(0).min(u16::MAX as usize) as u16;

        ParseError(Box::new(err), Position::new(line, column), file)
    }
}

/// Consume a particular [token][Token], checking that it is the expected one.
#[inline]
fn eat_token(input: &mut TokenStream, token: Token) -> Position {
    let (t, pos) = input.next().expect(NEVER_ENDS);

    if t != token {
        unreachable!(
            "expecting {} (found {}) at {}",
            token.syntax(),
            t.syntax(),
            pos
        );
    }
    pos
}

/// Match a particular [token][Token], consuming it if matched.
#[inline]
fn match_token(input: &mut TokenStream, token: Token) -> (bool, Position) {
    let (t, pos) = input.peek().expect(NEVER_ENDS);
    if *t == token {
        (true, eat_token(input, token))
    } else {
        (false, *pos)
    }
}

/// Consume a particular [token][Token], producing a [`ParseError`] describing
/// the context when some other token is found instead.
fn expect_token(
    input: &mut TokenStream,
    state: &ParseState,
    token: Token,
    context: &str,
) -> Result<Position, ParseError> {
    let (t, pos) = input.peek().expect(NEVER_ENDS);
    let pos = *pos;

    match t {
        t if *t == token => Ok(eat_token(input, token)),
        Token::LexError(_) => match input.next().expect(NEVER_ENDS) {
            (Token::LexError(err), pos) => Err(err.into_err(pos)),
            _ => unreachable!("`LexError` was peeked"),
        },
        _ => Err(state.make_err(
            PERR::MissingToken(token.syntax().into(), context.into()),
            pos,
        )),
    }
}

/// Parse a variable, function, class or member name.
fn parse_var_name(input: &mut TokenStream, state: &ParseState) -> Result<Ident, ParseError> {
    match input.next().expect(NEVER_ENDS) {
        (Token::Identifier(name), pos) => Ok(Ident {
            name: name.into(),
            pos,
        }),
        (Token::LexError(err), pos) => Err(err.into_err(pos)),
        (_, pos) => Err(state.make_err(PERR::VariableExpected, pos)),
    }
}

/// Parse a program - the list of top-level statements.
pub(crate) fn parse_program(
    input: &mut TokenStream,
    state: &ParseState,
) -> Result<Vec<Stmt>, ParseError> {
    let mut statements = Vec::new();

    while !matches!(input.peek().expect(NEVER_ENDS).0, Token::EOF) {
        statements.push(parse_stmt(input, state)?);
    }

    Ok(statements)
}

/// Parse a single statement, dispatching on the leading token.
fn parse_stmt(input: &mut TokenStream, state: &ParseState) -> Result<Stmt, ParseError> {
    let (token, pos) = input.peek().expect(NEVER_ENDS);
    let pos = *pos;

    let stmt = match token {
        // Block-terminated statements never consume a trailing `;`
        Token::Func => return parse_fn_def(input, state),
        Token::If => return parse_if(input, state),
        Token::While => return parse_while(input, state),
        Token::For => return parse_for(input, state),
        Token::Foreach => return parse_foreach(input, state),
        Token::Class => return parse_class(input, state),

        Token::Var => parse_var_stmt(input, state)?,
        Token::Return => parse_return(input, state)?,
        Token::Break => Stmt::Break(eat_token(input, Token::Break)),
        Token::Continue => Stmt::Continue(eat_token(input, Token::Continue)),
        Token::Try => parse_try(input, state)?,
        Token::Raise => {
            let pos = eat_token(input, Token::Raise);
            Stmt::Raise(parse_expr(input, state)?, pos)
        }
        Token::Assert => parse_assert(input, state)?,

        Token::LexError(_) => match input.next().expect(NEVER_ENDS) {
            (Token::LexError(err), pos) => return Err(err.into_err(pos)),
            _ => unreachable!("`LexError` was peeked"),
        },
        Token::EOF => return Err(state.make_err(PERR::UnexpectedEOF, pos)),

        // Anything else starts a postfix expression, optionally continued
        // into an assignment
        _ => parse_expr_stmt(input, state)?,
    };

    // A trailing `;` after the statement is optional
    match_token(input, Token::SemiColon);

    Ok(stmt)
}

/// Parse a `var` declaration statement with one or more comma-separated
/// declarators.
fn parse_var_stmt(input: &mut TokenStream, state: &ParseState) -> Result<Stmt, ParseError> {
    let pos = eat_token(input, Token::Var);

    let mut decls: StaticVec<(Ident, Option<Expr>)> = StaticVec::new();

    loop {
        let name = parse_var_name(input, state)?;
        // A declarator without `= expr` defaults to null
        let init = if match_token(input, Token::Equals).0 {
            Some(parse_expr(input, state)?)
        } else {
            None
        };
        decls.push((name, init));

        if !match_token(input, Token::Comma).0 {
            break;
        }
    }

    if decls.len() == 1 {
        let decl = decls.into_iter().next().expect("one declarator");
        Ok(Stmt::Var(Box::new(decl), pos))
    } else {
        Ok(Stmt::MultiVar(Box::new(decls), pos))
    }
}

/// Parse a function definition, starting from the `func` keyword.
fn parse_fn_def_decl(
    input: &mut TokenStream,
    state: &ParseState,
) -> Result<(ScriptFnDef, Position), ParseError> {
    let pos = eat_token(input, Token::Func);
    let name = parse_var_name(input, state)?;

    expect_token(input, state, Token::LeftParen, "after the function name")?;

    let mut params: StaticVec<Ident> = StaticVec::new();
    loop {
        if match_token(input, Token::RightParen).0 {
            break;
        }
        params.push(parse_var_name(input, state)?);
        if match_token(input, Token::Comma).0 {
            continue;
        }
        expect_token(
            input,
            state,
            Token::RightParen,
            "to close the parameters list",
        )?;
        break;
    }

    let body = parse_block(input, state)?;

    Ok((ScriptFnDef { name, params, body }, pos))
}

/// Parse a function definition statement.
fn parse_fn_def(input: &mut TokenStream, state: &ParseState) -> Result<Stmt, ParseError> {
    let (def, pos) = parse_fn_def_decl(input, state)?;
    Ok(Stmt::FnDef(Shared::new(def), pos))
}

/// Parse a brace-delimited statements block.
fn parse_block(input: &mut TokenStream, state: &ParseState) -> Result<StmtBlock, ParseError> {
    let brace_pos = expect_token(input, state, Token::LeftBrace, "to start a statement block")?;

    let mut statements: StaticVec<Stmt> = StaticVec::new();

    loop {
        match input.peek().expect(NEVER_ENDS) {
            (Token::RightBrace, _) => {
                eat_token(input, Token::RightBrace);
                break;
            }
            (Token::EOF, pos) => return Err(state.make_err(PERR::UnexpectedEOF, *pos)),
            _ => statements.push(parse_stmt(input, state)?),
        }
    }

    Ok(StmtBlock(statements, brace_pos))
}

/// Parse an `if` statement, recursing for `else if` chains.
fn parse_if(input: &mut TokenStream, state: &ParseState) -> Result<Stmt, ParseError> {
    let pos = eat_token(input, Token::If);

    expect_token(input, state, Token::LeftParen, "after 'if'")?;
    let condition = parse_expr(input, state)?;
    expect_token(input, state, Token::RightParen, "after the if condition")?;

    let then_block = parse_block(input, state)?;

    let else_block = if match_token(input, Token::Else).0 {
        if matches!(input.peek().expect(NEVER_ENDS).0, Token::If) {
            // `else if` restarts an if statement
            let else_pos = input.peek().expect(NEVER_ENDS).1;
            let nested = parse_if(input, state)?;
            let mut block: StaticVec<Stmt> = StaticVec::new();
            block.push(nested);
            StmtBlock(block, else_pos)
        } else {
            parse_block(input, state)?
        }
    } else {
        StmtBlock(StaticVec::new(), Position::NONE)
    };

    Ok(Stmt::If(
        Box::new((condition, then_block, else_block)),
        pos,
    ))
}

/// Parse a `while` statement.
fn parse_while(input: &mut TokenStream, state: &ParseState) -> Result<Stmt, ParseError> {
    let pos = eat_token(input, Token::While);

    expect_token(input, state, Token::LeftParen, "after 'while'")?;
    let condition = parse_expr(input, state)?;
    expect_token(input, state, Token::RightParen, "after the loop condition")?;

    let body = parse_block(input, state)?;

    Ok(Stmt::While(Box::new((condition, body)), pos))
}

/// Parse a `for` statement.
///
/// After `for ( IDENT` the next token selects the form: `=` starts an
/// integer-range loop, `=>` an iterator loop.
fn parse_for(input: &mut TokenStream, state: &ParseState) -> Result<Stmt, ParseError> {
    let pos = eat_token(input, Token::For);

    expect_token(input, state, Token::LeftParen, "after 'for'")?;
    let var = parse_var_name(input, state)?;

    match input.peek().expect(NEVER_ENDS) {
        (Token::Equals, _) => {
            eat_token(input, Token::Equals);
            let start = parse_expr(input, state)?;

            // `..`, or two consecutive `.` tokens (the first of which was
            // already consumed while parsing the start expression)
            if !match_token(input, Token::DotDot).0 {
                expect_token(input, state, Token::Period, "in the integer range")?;
            }

            let end = parse_expr(input, state)?;
            expect_token(input, state, Token::RightParen, "after the integer range")?;
            let body = parse_block(input, state)?;

            Ok(Stmt::For(
                Box::new(ForRange {
                    var,
                    start,
                    end,
                    body,
                }),
                pos,
            ))
        }
        (Token::DoubleArrow, _) => {
            eat_token(input, Token::DoubleArrow);
            let value = parse_var_name(input, state)?;
            expect_token(input, state, Token::In, "before the collection")?;
            let iterable = parse_expr(input, state)?;
            expect_token(input, state, Token::RightParen, "after the collection")?;
            let body = parse_block(input, state)?;

            Ok(Stmt::Foreach(
                Box::new(ForEach {
                    key: var,
                    value,
                    iterable,
                    body,
                }),
                pos,
            ))
        }
        (_, err_pos) => Err(state.make_err(
            PERR::MissingToken("=".into(), "or '=>' after the loop variable".into()),
            *err_pos,
        )),
    }
}

/// Parse a `foreach` statement.
fn parse_foreach(input: &mut TokenStream, state: &ParseState) -> Result<Stmt, ParseError> {
    let pos = eat_token(input, Token::Foreach);

    expect_token(input, state, Token::LeftParen, "after 'foreach'")?;
    let key = parse_var_name(input, state)?;
    expect_token(input, state, Token::DoubleArrow, "after the key variable")?;
    let value = parse_var_name(input, state)?;
    expect_token(input, state, Token::In, "before the collection")?;
    let iterable = parse_expr(input, state)?;
    expect_token(input, state, Token::RightParen, "after the collection")?;
    let body = parse_block(input, state)?;

    Ok(Stmt::Foreach(
        Box::new(ForEach {
            key,
            value,
            iterable,
            body,
        }),
        pos,
    ))
}

/// Parse a `try`/`catch` statement.
fn parse_try(input: &mut TokenStream, state: &ParseState) -> Result<Stmt, ParseError> {
    let pos = eat_token(input, Token::Try);

    let try_block = parse_block(input, state)?;
    expect_token(input, state, Token::Catch, "after the try block")?;
    let catch_var = parse_var_name(input, state)?;
    let catch_block = parse_block(input, state)?;

    Ok(Stmt::TryCatch(
        Box::new((try_block, catch_var, catch_block)),
        pos,
    ))
}

/// Parse a `return` statement.
fn parse_return(input: &mut TokenStream, state: &ParseState) -> Result<Stmt, ParseError> {
    let pos = eat_token(input, Token::Return);

    let value = match input.peek().expect(NEVER_ENDS).0 {
        Token::SemiColon | Token::RightBrace | Token::EOF => None,
        _ => Some(parse_expr(input, state)?),
    };

    Ok(Stmt::Return(value, pos))
}

/// Parse an `assert` statement with an optional message.
fn parse_assert(input: &mut TokenStream, state: &ParseState) -> Result<Stmt, ParseError> {
    let pos = eat_token(input, Token::Assert);

    let condition = parse_expr(input, state)?;
    let message = if match_token(input, Token::Comma).0 {
        Some(parse_expr(input, state)?)
    } else {
        None
    };

    Ok(Stmt::Assert(Box::new((condition, message)), pos))
}

/// Parse a `class` definition.
///
/// Class bodies allow only `var` declarations (members) and `func`
/// definitions (methods), with `;` permitted between declarations.
fn parse_class(input: &mut TokenStream, state: &ParseState) -> Result<Stmt, ParseError> {
    let pos = eat_token(input, Token::Class);

    let name = parse_var_name(input, state)?;
    expect_token(input, state, Token::LeftBrace, "to start the class body")?;

    let mut fields: StaticVec<(Ident, Option<Expr>)> = StaticVec::new();
    let mut methods: StaticVec<Shared<ScriptFnDef>> = StaticVec::new();

    loop {
        match input.peek().expect(NEVER_ENDS) {
            (Token::RightBrace, _) => {
                eat_token(input, Token::RightBrace);
                break;
            }
            (Token::SemiColon, _) => {
                eat_token(input, Token::SemiColon);
            }
            (Token::Var, _) => {
                eat_token(input, Token::Var);
                loop {
                    let field = parse_var_name(input, state)?;
                    let init = if match_token(input, Token::Equals).0 {
                        Some(parse_expr(input, state)?)
                    } else {
                        None
                    };
                    fields.push((field, init));

                    if !match_token(input, Token::Comma).0 {
                        break;
                    }
                }
            }
            (Token::Func, _) => {
                let (def, _) = parse_fn_def_decl(input, state)?;
                methods.push(Shared::new(def));
            }
            (Token::EOF, err_pos) => return Err(state.make_err(PERR::UnexpectedEOF, *err_pos)),
            (token, err_pos) => {
                return Err(
                    state.make_err(PERR::UnexpectedToken(token.syntax().into()), *err_pos)
                )
            }
        }
    }

    Ok(Stmt::Class(
        Shared::new(ClassDecl {
            name,
            fields,
            methods,
        }),
        pos,
    ))
}

/// Parse a statement starting with a postfix expression: an expression
/// statement, or an assignment when `=` or a compound-assignment operator
/// follows.
fn parse_expr_stmt(input: &mut TokenStream, state: &ParseState) -> Result<Stmt, ParseError> {
    let target = parse_postfix_expr(input, state)?;

    let (next, op_pos) = input.peek().expect(NEVER_ENDS);
    let op_pos = *op_pos;

    if *next == Token::Equals {
        eat_token(input, Token::Equals);
        ensure_assignable(&target, state, op_pos)?;
        let value = parse_expr(input, state)?;

        Ok(Stmt::Assignment(
            Box::new(BinaryExpr {
                lhs: target,
                rhs: value,
            }),
            op_pos,
        ))
    } else if next.is_op_assignment() {
        let op_token = input.next().expect(NEVER_ENDS).0;
        ensure_assignable(&target, state, op_pos)?;
        let rhs = parse_expr(input, state)?;

        let op = match op_token.map_op_assignment().expect("op-assignment token") {
            Token::Plus => BinaryOp::Plus,
            Token::Minus => BinaryOp::Minus,
            Token::Multiply => BinaryOp::Multiply,
            Token::Divide => BinaryOp::Divide,
            _ => unreachable!("op-assignment maps to an arithmetic operator"),
        };

        // `x op= e` desugars to `x = x op e`, duplicating the target
        // structurally so both copies can be walked independently
        let value = Expr::Binary(
            Box::new(BinaryExpr {
                lhs: target.clone(),
                rhs,
            }),
            op,
            op_pos,
        );

        Ok(Stmt::Assignment(
            Box::new(BinaryExpr {
                lhs: target,
                rhs: value,
            }),
            op_pos,
        ))
    } else {
        Ok(Stmt::Expr(target))
    }
}

/// Raise an error unless an expression is a valid assignment target: a
/// variable, an index access or a member access.
fn ensure_assignable(expr: &Expr, state: &ParseState, pos: Position) -> Result<(), ParseError> {
    match expr {
        Expr::Variable(_) | Expr::Index(_, _) | Expr::Dot(_, _) => Ok(()),
        _ => Err(state.make_err(PERR::AssignmentToInvalidLHS(String::new()), pos)),
    }
}

/// Parse an expression.
#[inline(always)]
fn parse_expr(input: &mut TokenStream, state: &ParseState) -> Result<Expr, ParseError> {
    parse_or(input, state)
}

/// Parse a logical-or chain.
fn parse_or(input: &mut TokenStream, state: &ParseState) -> Result<Expr, ParseError> {
    let mut left = parse_and(input, state)?;

    while matches!(input.peek().expect(NEVER_ENDS).0, Token::Or) {
        let pos = eat_token(input, Token::Or);
        let rhs = parse_and(input, state)?;
        left = Expr::Or(Box::new(BinaryExpr { lhs: left, rhs }), pos);
    }

    Ok(left)
}

/// Parse a logical-and chain.
fn parse_and(input: &mut TokenStream, state: &ParseState) -> Result<Expr, ParseError> {
    let mut left = parse_equality(input, state)?;

    while matches!(input.peek().expect(NEVER_ENDS).0, Token::And) {
        let pos = eat_token(input, Token::And);
        let rhs = parse_equality(input, state)?;
        left = Expr::And(Box::new(BinaryExpr { lhs: left, rhs }), pos);
    }

    Ok(left)
}

/// Parse an equality chain.
fn parse_equality(input: &mut TokenStream, state: &ParseState) -> Result<Expr, ParseError> {
    let mut left = parse_comparison(input, state)?;

    loop {
        let op = match input.peek().expect(NEVER_ENDS).0 {
            Token::EqualsTo => BinaryOp::EqualsTo,
            Token::NotEqualsTo => BinaryOp::NotEqualsTo,
            _ => break,
        };
        let (_, pos) = input.next().expect(NEVER_ENDS);
        let rhs = parse_comparison(input, state)?;
        left = Expr::Binary(Box::new(BinaryExpr { lhs: left, rhs }), op, pos);
    }

    Ok(left)
}

/// Parse a comparison chain, including `in`/`not_in` membership tests.
fn parse_comparison(input: &mut TokenStream, state: &ParseState) -> Result<Expr, ParseError> {
    let mut left = parse_additive(input, state)?;

    loop {
        let op = match input.peek().expect(NEVER_ENDS).0 {
            Token::LessThan => BinaryOp::LessThan,
            Token::LessThanEqualsTo => BinaryOp::LessThanEqualsTo,
            Token::GreaterThan => BinaryOp::GreaterThan,
            Token::GreaterThanEqualsTo => BinaryOp::GreaterThanEqualsTo,
            Token::In => BinaryOp::In,
            Token::NotIn => BinaryOp::NotIn,
            _ => break,
        };
        let (_, pos) = input.next().expect(NEVER_ENDS);
        let rhs = parse_additive(input, state)?;
        left = Expr::Binary(Box::new(BinaryExpr { lhs: left, rhs }), op, pos);
    }

    Ok(left)
}

/// Parse an additive chain.
fn parse_additive(input: &mut TokenStream, state: &ParseState) -> Result<Expr, ParseError> {
    let mut left = parse_multiplicative(input, state)?;

    loop {
        let op = match input.peek().expect(NEVER_ENDS).0 {
            Token::Plus => BinaryOp::Plus,
            Token::Minus => BinaryOp::Minus,
            _ => break,
        };
        let (_, pos) = input.next().expect(NEVER_ENDS);
        let rhs = parse_multiplicative(input, state)?;
        left = Expr::Binary(Box::new(BinaryExpr { lhs: left, rhs }), op, pos);
    }

    Ok(left)
}

/// Parse a multiplicative chain.
fn parse_multiplicative(input: &mut TokenStream, state: &ParseState) -> Result<Expr, ParseError> {
    let mut left = parse_unary(input, state)?;

    loop {
        let op = match input.peek().expect(NEVER_ENDS).0 {
            Token::Multiply => BinaryOp::Multiply,
            Token::Divide => BinaryOp::Divide,
            Token::Modulo => BinaryOp::Modulo,
            _ => break,
        };
        let (_, pos) = input.next().expect(NEVER_ENDS);
        let rhs = parse_unary(input, state)?;
        left = Expr::Binary(Box::new(BinaryExpr { lhs: left, rhs }), op, pos);
    }

    Ok(left)
}

/// Parse a unary expression.
fn parse_unary(input: &mut TokenStream, state: &ParseState) -> Result<Expr, ParseError> {
    match input.peek().expect(NEVER_ENDS).0 {
        Token::Minus => {
            let pos = eat_token(input, Token::Minus);
            let operand = parse_unary(input, state)?;
            Ok(Expr::Unary(UnaryOp::Minus, Box::new(operand), pos))
        }
        Token::Not => {
            let pos = eat_token(input, Token::Not);
            let operand = parse_unary(input, state)?;
            Ok(Expr::Unary(UnaryOp::Not, Box::new(operand), pos))
        }
        _ => parse_postfix_expr(input, state),
    }
}

/// Parse a left-associative postfix chain: member accesses, indexing,
/// slicing and calls.
fn parse_postfix_expr(input: &mut TokenStream, state: &ParseState) -> Result<Expr, ParseError> {
    let mut expr = parse_primary(input, state)?;

    loop {
        match input.peek().expect(NEVER_ENDS).0 {
            Token::LeftBracket => {
                let pos = eat_token(input, Token::LeftBracket);
                let first = parse_expr(input, state)?;

                if match_token(input, Token::Colon).0 {
                    let end = parse_expr(input, state)?;
                    expect_token(input, state, Token::RightBracket, "to close the slice")?;
                    expr = Expr::Slice(Box::new((expr, first, end)), pos);
                } else {
                    expect_token(
                        input,
                        state,
                        Token::RightBracket,
                        "to close the index expression",
                    )?;
                    expr = Expr::Index(
                        Box::new(BinaryExpr {
                            lhs: expr,
                            rhs: first,
                        }),
                        pos,
                    );
                }
            }
            Token::Period => {
                let pos = eat_token(input, Token::Period);

                // `. .` is a spaced-out range separator, not a member access;
                // leave the second dot for the for-loop header
                if matches!(input.peek().expect(NEVER_ENDS).0, Token::Period) {
                    break;
                }

                let member = match input.next().expect(NEVER_ENDS) {
                    (Token::Identifier(name), pos) => Ident {
                        name: name.into(),
                        pos,
                    },
                    (Token::LexError(err), pos) => return Err(err.into_err(pos)),
                    (_, pos) => return Err(state.make_err(PERR::PropertyExpected, pos)),
                };

                if matches!(input.peek().expect(NEVER_ENDS).0, Token::LeftParen) {
                    eat_token(input, Token::LeftParen);
                    let args = parse_call_args(input, state)?;
                    expr = Expr::MethodCall(
                        Box::new(MethodCallExpr {
                            target: expr,
                            method: member,
                            args,
                        }),
                        pos,
                    );
                } else {
                    expr = Expr::Dot(Box::new((expr, member)), pos);
                }
            }
            Token::LeftParen => {
                let pos = eat_token(input, Token::LeftParen);
                match expr {
                    Expr::Variable(ident) => {
                        let args = parse_call_args(input, state)?;
                        expr = Expr::FnCall(Box::new(FnCallExpr { name: *ident, args }), pos);
                    }
                    _ => return Err(state.make_err(PERR::MalformedCallExpr(String::new()), pos)),
                }
            }
            _ => break,
        }
    }

    Ok(expr)
}

/// Parse a comma-separated argument list. The opening `(` is already
/// consumed.
fn parse_call_args(
    input: &mut TokenStream,
    state: &ParseState,
) -> Result<StaticVec<Expr>, ParseError> {
    let mut args: StaticVec<Expr> = StaticVec::new();

    loop {
        if match_token(input, Token::RightParen).0 {
            break;
        }
        args.push(parse_expr(input, state)?);
        if match_token(input, Token::Comma).0 {
            continue;
        }
        expect_token(
            input,
            state,
            Token::RightParen,
            "to close the arguments list",
        )?;
        break;
    }

    Ok(args)
}

/// Parse a primary expression.
fn parse_primary(input: &mut TokenStream, state: &ParseState) -> Result<Expr, ParseError> {
    match input.peek().expect(NEVER_ENDS) {
        (Token::LeftBracket, _) => return parse_array_literal(input, state),
        (Token::LeftBrace, _) => return parse_map_literal(input, state),
        _ => (),
    }

    match input.next().expect(NEVER_ENDS) {
        (Token::IntegerConstant(n), pos) => Ok(Expr::IntegerConstant(n, pos)),
        (Token::FloatConstant(v), pos) => Ok(Expr::FloatConstant(v, pos)),
        (Token::StringConstant(s), pos) => Ok(Expr::StringConstant(s.into(), pos)),
        (Token::True, pos) => Ok(Expr::BoolConstant(true, pos)),
        (Token::False, pos) => Ok(Expr::BoolConstant(false, pos)),
        (Token::Null, pos) => Ok(Expr::NullConstant(pos)),

        (Token::Identifier(name), pos) => Ok(Expr::Variable(Box::new(Ident {
            name: name.into(),
            pos,
        }))),

        (Token::New, pos) => {
            let name = parse_var_name(input, state)?;
            expect_token(input, state, Token::LeftParen, "after the class name")?;
            let args = parse_call_args(input, state)?;
            Ok(Expr::New(Box::new(FnCallExpr { name, args }), pos))
        }

        (Token::LeftParen, _) => {
            let expr = parse_expr(input, state)?;
            expect_token(input, state, Token::RightParen, "to close the expression")?;
            Ok(expr)
        }

        (Token::LexError(err), pos) => Err(err.into_err(pos)),
        (Token::EOF, pos) => Err(state.make_err(PERR::UnexpectedEOF, pos)),
        (token, pos) => Err(state.make_err(PERR::UnexpectedToken(token.syntax().into()), pos)),
    }
}

/// Parse an array literal. The leading `[` is still in the stream.
fn parse_array_literal(
    input: &mut TokenStream,
    state: &ParseState,
) -> Result<Expr, ParseError> {
    let pos = eat_token(input, Token::LeftBracket);

    let mut elements: StaticVec<Expr> = StaticVec::new();

    loop {
        if match_token(input, Token::RightBracket).0 {
            break;
        }
        elements.push(parse_expr(input, state)?);
        if match_token(input, Token::Comma).0 {
            continue;
        }
        expect_token(
            input,
            state,
            Token::RightBracket,
            "to close the array literal",
        )?;
        break;
    }

    Ok(Expr::Array(Box::new(elements), pos))
}

/// Parse a dict literal. The leading `{` is still in the stream.
///
/// Every key must begin with a string literal; the key is still parsed as a
/// full expression and checked for string-ness at evaluation time.
fn parse_map_literal(input: &mut TokenStream, state: &ParseState) -> Result<Expr, ParseError> {
    let pos = eat_token(input, Token::LeftBrace);

    let mut pairs: StaticVec<(Expr, Expr)> = StaticVec::new();

    loop {
        if match_token(input, Token::RightBrace).0 {
            break;
        }

        match input.peek().expect(NEVER_ENDS) {
            (Token::StringConstant(_), _) => (),
            (Token::LexError(_), _) => match input.next().expect(NEVER_ENDS) {
                (Token::LexError(err), pos) => return Err(err.into_err(pos)),
                _ => unreachable!("`LexError` was peeked"),
            },
            (_, err_pos) => {
                return Err(state.make_err(PERR::ExprExpected("a string key".into()), *err_pos))
            }
        }

        let key = parse_expr(input, state)?;
        expect_token(input, state, Token::Colon, "after the dictionary key")?;
        let value = parse_expr(input, state)?;
        pairs.push((key, value));

        if match_token(input, Token::Comma).0 {
            continue;
        }
        expect_token(
            input,
            state,
            Token::RightBrace,
            "to close the dictionary literal",
        )?;
        break;
    }

    Ok(Expr::Map(Box::new(pairs), pos))
}
