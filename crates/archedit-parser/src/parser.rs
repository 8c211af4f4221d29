//! Parser for model DSL source tokens.
//!
//! This module transforms a token stream from the [`lexer`](super::lexer) into
//! the syntax tree defined in [`parser_types`](super::parser_types). The public
//! entry points are [`build_source_file`] for whole files and
//! [`build_snippet`] for the single declarations callers hand to the editor.

use winnow::{
    Parser as _,
    combinator::{alt, opt, repeat},
    error::{AddContext, ContextError, ErrMode},
    stream::{Stream, TokenSlice},
    token::any,
};

use crate::{
    error::{Diagnostic, ErrorCode},
    parser_types as types,
    span::{Span, Spanned},
    tokens::{PositionedToken, Token},
};

/// Context type for parser errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Context {
    /// Description of what is currently being parsed
    Label(&'static str),
    /// Remaining token count (`eof_offset()`) at error start position
    ///
    /// Used to calculate start_offset as: `tokens.len() - start_offset_value`
    StartOffset(usize),
}

type Input<'src> = TokenSlice<'src, PositionedToken<'src>>;
type IResult<O> = std::result::Result<O, ErrMode<ContextError<Context>>>;

/// Run `f`, turning any failure into a Cut error that remembers where the
/// committed construct started.
fn cut_err<'src, O, F>(input: &mut Input<'src>, f: F) -> IResult<O>
where
    F: FnOnce(&mut Input<'src>) -> IResult<O>,
{
    let start_remaining = input.eof_offset();

    match f(input) {
        Ok(o) => Ok(o),
        Err(ErrMode::Backtrack(e)) | Err(ErrMode::Cut(e)) => {
            let e = e.add_context(
                input,
                &input.checkpoint(),
                Context::StartOffset(start_remaining),
            );
            Err(ErrMode::Cut(e))
        }
        Err(e) => Err(e),
    }
}

/// Fail at the current position with `label` as the expectation.
fn expected<'src, O>(input: &mut Input<'src>, label: &'static str) -> IResult<O> {
    Err(ErrMode::Backtrack(ContextError::new().add_context(
        input,
        &input.checkpoint(),
        Context::Label(label),
    )))
}

/// Parse whitespace and comments
fn ws_comment<'src>(input: &mut Input<'src>) -> IResult<()> {
    any.verify(|token: &PositionedToken<'_>| token.token.is_trivia())
        .void()
        .parse_next(input)
}

/// Parse zero or more whitespace/comments
fn ws_comments0<'src>(input: &mut Input<'src>) -> IResult<()> {
    repeat(0.., ws_comment).parse_next(input)
}

/// Parse horizontal whitespace only; a newline ends the current expression.
fn hspace0<'src>(input: &mut Input<'src>) -> IResult<()> {
    repeat(
        0..,
        any.verify(|token: &PositionedToken<'_>| match token.token {
            Token::Whitespace => true,
            Token::BlockComment(text) => !text.contains('\n'),
            _ => false,
        })
        .void(),
    )
    .parse_next(input)
}

/// Parse trivia and `;`, reporting whether a statement separator was seen.
fn separators0<'src>(input: &mut Input<'src>) -> IResult<bool> {
    repeat(
        0..,
        any.verify_map(|token: &PositionedToken<'_>| match token.token {
            Token::Newline | Token::Semicolon => Some(true),
            Token::BlockComment(text) => Some(text.contains('\n')),
            Token::Whitespace | Token::LineComment(_) => Some(false),
            _ => None,
        }),
    )
    .fold(|| false, |seen, separator| seen || separator)
    .parse_next(input)
}

/// Match a single significant token.
fn punct<'src>(
    input: &mut Input<'src>,
    is: fn(&Token<'_>) -> bool,
    label: &'static str,
) -> IResult<Span> {
    any.verify_map(|token: &PositionedToken<'_>| is(&token.token).then_some(token.span))
        .context(Context::Label(label))
        .parse_next(input)
}

fn left_paren<'src>(input: &mut Input<'src>) -> IResult<Span> {
    punct(input, |t| matches!(t, Token::LeftParen), "`(`")
}

fn right_paren<'src>(input: &mut Input<'src>) -> IResult<Span> {
    punct(input, |t| matches!(t, Token::RightParen), "`)`")
}

fn left_brace<'src>(input: &mut Input<'src>) -> IResult<Span> {
    punct(input, |t| matches!(t, Token::LeftBrace), "`{`")
}

fn right_brace<'src>(input: &mut Input<'src>) -> IResult<Span> {
    punct(input, |t| matches!(t, Token::RightBrace), "`}`")
}

fn comma<'src>(input: &mut Input<'src>) -> IResult<Span> {
    punct(input, |t| matches!(t, Token::Comma), "`,`")
}

fn dot<'src>(input: &mut Input<'src>) -> IResult<Span> {
    punct(input, |t| matches!(t, Token::Dot), "`.`")
}

/// Parse an identifier with span preservation
fn identifier<'src>(input: &mut Input<'src>) -> IResult<Spanned<&'src str>> {
    any.verify_map(|token: &'src PositionedToken<'src>| match token.token {
        Token::Identifier(name) => Some(Spanned::new(name, token.span)),
        _ => None,
    })
    .context(Context::Label("identifier"))
    .parse_next(input)
}

/// Parse an interpreted or raw string literal
fn string_literal<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    any.verify_map(|token: &PositionedToken<'_>| match &token.token {
        Token::StringLiteral(value) => Some(Spanned::new(value.clone(), token.span)),
        Token::RawString(value) => Some(Spanned::new((*value).to_string(), token.span)),
        _ => None,
    })
    .context(Context::Label("string literal"))
    .parse_next(input)
}

fn number<'src>(input: &mut Input<'src>) -> IResult<Spanned<&'src str>> {
    any.verify_map(|token: &'src PositionedToken<'src>| match token.token {
        Token::Number(raw) => Some(Spanned::new(raw, token.span)),
        _ => None,
    })
    .context(Context::Label("number"))
    .parse_next(input)
}

fn char_literal<'src>(input: &mut Input<'src>) -> IResult<Spanned<&'src str>> {
    any.verify_map(|token: &'src PositionedToken<'src>| match token.token {
        Token::Char(raw) => Some(Spanned::new(raw, token.span)),
        _ => None,
    })
    .context(Context::Label("rune literal"))
    .parse_next(input)
}

/// Kinds of bracketing tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Paren,
    Brace,
    Bracket,
}

fn opens(token: &Token<'_>) -> Option<Delimiter> {
    match token {
        Token::LeftParen => Some(Delimiter::Paren),
        Token::LeftBrace => Some(Delimiter::Brace),
        Token::LeftBracket => Some(Delimiter::Bracket),
        _ => None,
    }
}

fn closes(token: &Token<'_>) -> Option<Delimiter> {
    match token {
        Token::RightParen => Some(Delimiter::Paren),
        Token::RightBrace => Some(Delimiter::Brace),
        Token::RightBracket => Some(Delimiter::Bracket),
        _ => None,
    }
}

/// Whether the next token satisfies `is`, without consuming it.
fn at<'src>(input: &Input<'src>, is: fn(&Token<'_>) -> bool) -> bool {
    input.peek_token().is_some_and(|token| is(&token.token))
}

/// An opening delimiter and everything up to its matching closer.
fn balanced<'src>(input: &mut Input<'src>) -> IResult<Span> {
    let (open, delimiter) = any
        .verify_map(|token: &PositionedToken<'_>| opens(&token.token).map(|d| (token.span, d)))
        .context(Context::Label("opening delimiter"))
        .parse_next(input)?;

    cut_err(input, |input| {
        let mut stack = vec![delimiter];
        loop {
            let token = any
                .context(Context::Label("closing delimiter"))
                .parse_next(input)?;
            if let Some(inner) = opens(&token.token) {
                stack.push(inner);
            } else if let Some(closer) = closes(&token.token) {
                if stack.pop() != Some(closer) {
                    return expected(input, "matching closing delimiter");
                }
                if stack.is_empty() {
                    return Ok(open.union(token.span));
                }
            }
        }
    })
}

/// `[N]T`, `[]T`, `map[K]V`, `chan T`, `struct{...}`, `interface{...}`
fn type_literal<'src>(input: &mut Input<'src>) -> IResult<Span> {
    let keyword = opt(any.verify_map(|token: &'src PositionedToken<'src>| match token.token {
        Token::Keyword(word @ ("map" | "chan" | "struct" | "interface")) => Some((word, token.span)),
        _ => None,
    }))
    .parse_next(input)?;

    match keyword {
        Some(("struct" | "interface", start)) => {
            hspace0(input)?;
            if !at(input, |t| matches!(t, Token::LeftBrace)) {
                return expected(input, "`{`");
            }
            Ok(start.union(balanced(input)?))
        }
        Some(("map", start)) => {
            if !at(input, |t| matches!(t, Token::LeftBracket)) {
                return expected(input, "`[`");
            }
            balanced(input)?;
            Ok(start.union(type_expr(input)?))
        }
        Some((_, start)) => {
            hspace0(input)?;
            Ok(start.union(type_expr(input)?))
        }
        None => {
            if !at(input, |t| matches!(t, Token::LeftBracket)) {
                return expected(input, "type");
            }
            let dimensions = balanced(input)?;
            Ok(dimensions.union(type_expr(input)?))
        }
    }
}

/// A type: a type literal, `*T` or a possibly qualified name.
fn type_expr<'src>(input: &mut Input<'src>) -> IResult<Span> {
    if let Some(span) = opt(type_literal).parse_next(input)? {
        return Ok(span);
    }
    let pointer = opt(|i: &mut Input<'src>| {
        punct(i, |t| matches!(t, Token::Operator("*")), "`*`")
    })
    .parse_next(input)?;
    if let Some(star) = pointer {
        return Ok(star.union(type_expr(input)?));
    }

    let name = identifier(input)?;
    let field = opt(|i: &mut Input<'src>| {
        dot(i)?;
        identifier(i)
    })
    .parse_next(input)?;
    Ok(field.map_or(name.span(), |field| name.span().union(field.span())))
}

/// Parameter list of a function literal; `true` when it is empty.
fn parameters<'src>(input: &mut Input<'src>) -> IResult<bool> {
    let checkpoint = input.checkpoint();
    left_paren(input)?;
    ws_comments0(input)?;
    if opt(right_paren).parse_next(input)?.is_some() {
        return Ok(true);
    }
    input.reset(&checkpoint);
    balanced(input)?;
    Ok(false)
}

/// Result type of a function literal: `T` or `(T, error)`.
fn results<'src>(input: &mut Input<'src>) -> IResult<Span> {
    if at(input, |t| matches!(t, Token::LeftParen)) {
        balanced(input)
    } else {
        type_expr(input)
    }
}

/// `func() { ... }`, `func(i int) { ... }`, `func() string { ... }`
fn func_lit<'src>(input: &mut Input<'src>) -> IResult<types::FuncLit<'src>> {
    let func = punct(input, |t| matches!(t, Token::Func), "`func`")?;
    hspace0(input)?;
    let parameterless = parameters(input)?;
    hspace0(input)?;
    let result = opt(results).parse_next(input)?;
    hspace0(input)?;

    let body = block(input)?;
    let span = func.union(body.span);
    Ok(types::FuncLit {
        has_signature: !parameterless || result.is_some(),
        body,
        span,
    })
}

/// `( expr )`
fn paren_expr<'src>(input: &mut Input<'src>) -> IResult<types::Expr<'src>> {
    let open = left_paren(input)?;

    cut_err(input, |input| {
        ws_comments0(input)?;
        let inner = expr(input)?;
        ws_comments0(input)?;
        let close = right_paren(input)?;
        Ok(types::Expr::Paren {
            inner: Box::new(inner),
            span: open.union(close),
        })
    })
}

fn operand<'src>(input: &mut Input<'src>) -> IResult<types::Expr<'src>> {
    alt((
        string_literal.map(types::Expr::String),
        number.map(types::Expr::Number),
        char_literal.map(types::Expr::Char),
        func_lit.map(types::Expr::FuncLit),
        identifier.map(types::Expr::Ident),
        paren_expr,
        type_literal.map(types::Expr::Type),
    ))
    .context(Context::Label("expression"))
    .parse_next(input)
}

/// Arguments after the opening parenthesis of a call.
fn call_args<'src>(
    input: &mut Input<'src>,
    callee: types::Expr<'src>,
) -> IResult<types::Expr<'src>> {
    cut_err(input, |input| {
        let mut args = Vec::new();
        let mut trailing_comma = false;
        let mut ellipsis = false;

        ws_comments0(input)?;
        let close = loop {
            if let Some(close) = opt(right_paren).parse_next(input)? {
                break close;
            }

            args.push(expr(input)?);
            trailing_comma = false;
            ws_comments0(input)?;

            if opt(|i: &mut Input<'src>| {
                punct(i, |t| matches!(t, Token::Operator("...")), "`...`")
            })
            .parse_next(input)?
            .is_some()
            {
                ellipsis = true;
                ws_comments0(input)?;
            }

            if opt(comma).parse_next(input)?.is_some() {
                trailing_comma = true;
                ws_comments0(input)?;
                continue;
            }

            break right_paren
                .context(Context::Label("`,` or `)` after argument"))
                .parse_next(input)?;
        };

        let span = callee.span().union(close);
        Ok(types::Expr::Call(types::CallExpr {
            callee: Box::new(callee),
            args,
            close_paren: close.start(),
            trailing_comma,
            ellipsis,
            span,
        }))
    })
}

/// Expressions a composite literal body may follow.
fn is_type_like(expr: &types::Expr<'_>) -> bool {
    matches!(
        expr,
        types::Expr::Ident(_)
            | types::Expr::Selector { .. }
            | types::Expr::Index { .. }
            | types::Expr::Type(_)
    )
}

/// Operand followed by selectors, calls, indexes, type assertions and
/// composite literal bodies: `dsl.Container("API")(...)`, `shapes[i]`.
fn postfix_expr<'src>(input: &mut Input<'src>) -> IResult<types::Expr<'src>> {
    let mut expr = operand(input)?;

    loop {
        let checkpoint = input.checkpoint();
        hspace0(input)?;

        if opt(dot).parse_next(input)?.is_some() {
            ws_comments0(input)?;
            if at(input, |t| matches!(t, Token::LeftParen)) {
                let asserted = cut_err(input, balanced)?;
                let span = expr.span().union(asserted);
                expr = types::Expr::Assert {
                    base: Box::new(expr),
                    span,
                };
            } else {
                let field = cut_err(input, identifier)?;
                let span = expr.span().union(field.span());
                expr = types::Expr::Selector {
                    base: Box::new(expr),
                    field,
                    span,
                };
            }
        } else if opt(left_paren).parse_next(input)?.is_some() {
            expr = call_args(input, expr)?;
        } else if at(input, |t| matches!(t, Token::LeftBracket)) {
            let index = balanced(input)?;
            let span = expr.span().union(index);
            expr = types::Expr::Index {
                base: Box::new(expr),
                span,
            };
        } else if is_type_like(&expr) && at(input, |t| matches!(t, Token::LeftBrace)) {
            let body = balanced(input)?;
            let span = expr.span().union(body);
            expr = types::Expr::Composite {
                ty: Box::new(expr),
                span,
            };
        } else {
            input.reset(&checkpoint);
            return Ok(expr);
        }
    }
}

/// Prefix operators, then a postfix expression
fn unary_expr<'src>(input: &mut Input<'src>) -> IResult<types::Expr<'src>> {
    let prefix = opt(any.verify_map(|token: &PositionedToken<'_>| match token.token {
        Token::Minus => Some((true, token.span)),
        Token::Operator("+" | "!" | "^" | "*" | "&" | "<-") => Some((false, token.span)),
        _ => None,
    }))
    .parse_next(input)?;

    let Some((negate, start)) = prefix else {
        return postfix_expr(input);
    };

    cut_err(input, |input| {
        hspace0(input)?;
        let operand = Box::new(unary_expr(input)?);
        let span = start.union(operand.span());
        Ok(if negate {
            types::Expr::Negate { operand, span }
        } else {
            types::Expr::Unary { operand, span }
        })
    })
}

fn binary_operator<'src>(input: &mut Input<'src>) -> IResult<Span> {
    punct(
        input,
        |t| {
            matches!(
                t,
                Token::Minus
                    | Token::Operator(
                        "+" | "*" | "/" | "%" | "&" | "|" | "^" | "<" | ">" | "==" | "!="
                            | "<=" | ">=" | "&&" | "||" | "<<" | ">>" | "&^"
                    )
            )
        },
        "binary operator",
    )
}

/// Unary expressions joined by binary operators. The operator must end the
/// line if the expression continues on the next one.
fn expr<'src>(input: &mut Input<'src>) -> IResult<types::Expr<'src>> {
    let mut left = unary_expr(input)?;

    loop {
        let checkpoint = input.checkpoint();
        hspace0(input)?;
        if opt(binary_operator).parse_next(input)?.is_none() {
            input.reset(&checkpoint);
            return Ok(left);
        }

        let right = cut_err(input, |input| {
            ws_comments0(input)?;
            unary_expr(input)
        })?;
        let span = left.span().union(right.span());
        left = types::Expr::Binary {
            left: Box::new(left),
            right: Box::new(right),
            span,
        };
    }
}

/// Comma-separated expressions on one logical line.
fn expr_list<'src>(input: &mut Input<'src>) -> IResult<Vec<types::Expr<'src>>> {
    let mut exprs = vec![expr(input)?];
    loop {
        let checkpoint = input.checkpoint();
        hspace0(input)?;
        if opt(comma).parse_next(input)?.is_none() {
            input.reset(&checkpoint);
            return Ok(exprs);
        }
        ws_comments0(input)?;
        exprs.push(expr(input)?);
    }
}

/// `var name = value`
fn var_decl<'src>(input: &mut Input<'src>) -> IResult<types::VarDecl<'src>> {
    let var = punct(input, |t| matches!(t, Token::Var), "`var`")?;
    ws_comments0(input)?;
    let name = identifier(input)?;
    hspace0(input)?;
    punct(input, |t| matches!(t, Token::Assign), "`=`")?;

    cut_err(input, |input| {
        ws_comments0(input)?;
        let value = expr(input)?;
        let span = var.union(value.span());
        Ok(types::VarDecl { name, value, span })
    })
}

/// `name := value` or `name = value`; backtracks when no operator follows.
fn assignment<'src>(input: &mut Input<'src>) -> IResult<types::VarDecl<'src>> {
    let name = identifier(input)?;
    hspace0(input)?;
    punct(
        input,
        |t| matches!(t, Token::Define | Token::Assign),
        "`:=` or `=`",
    )?;

    cut_err(input, |input| {
        ws_comments0(input)?;
        let value = expr(input)?;
        let span = name.span().union(value.span());
        Ok(types::VarDecl { name, value, span })
    })
}

fn assign_operator<'src>(input: &mut Input<'src>) -> IResult<Span> {
    punct(
        input,
        |t| {
            matches!(
                t,
                Token::Define
                    | Token::Assign
                    | Token::Operator(
                        "+=" | "-=" | "*=" | "/=" | "%=" | "&=" | "|=" | "^=" | "<<=" | ">>="
                            | "&^=" | "<-"
                    )
            )
        },
        "assignment operator",
    )
}

/// An expression statement, or another simple statement:
/// `a, b := f()`, `x.y = z`, `n += 1`, `i++`, `ch <- v`.
fn simple_statement<'src>(input: &mut Input<'src>) -> IResult<types::Stmt<'src>> {
    let mut exprs = expr_list(input)?;
    let start = exprs[0].span();
    let checkpoint = input.checkpoint();
    hspace0(input)?;

    if opt(assign_operator).parse_next(input)?.is_some() {
        let values = cut_err(input, |input| {
            ws_comments0(input)?;
            expr_list(input)
        })?;
        let end = values.last().map_or(start, types::Expr::span);
        exprs.extend(values);
        return Ok(types::Stmt::Other {
            exprs,
            span: start.union(end),
        });
    }

    let step = opt(|i: &mut Input<'src>| {
        punct(i, |t| matches!(t, Token::Operator("++" | "--")), "`++` or `--`")
    })
    .parse_next(input)?;
    if let Some(step) = step {
        return Ok(types::Stmt::Other {
            exprs,
            span: start.union(step),
        });
    }

    input.reset(&checkpoint);
    if exprs.len() > 1 {
        return expected(input, "assignment after expression list");
    }
    Ok(types::Stmt::Expr(exprs.remove(0)))
}

/// Whether Go ends a statement at a newline following `token`.
fn ends_line(token: &Token<'_>) -> bool {
    match token {
        Token::Identifier(_)
        | Token::StringLiteral(_)
        | Token::RawString(_)
        | Token::Number(_)
        | Token::Char(_)
        | Token::RightParen
        | Token::RightBracket
        | Token::RightBrace => true,
        Token::Keyword(word) => matches!(*word, "break" | "continue" | "fallthrough" | "return"),
        Token::Operator(op) => matches!(*op, "++" | "--" | ":"),
        _ => false,
    }
}

/// `{ ... }` inside an opaque statement: a block when its content parses as
/// statements, otherwise a composite literal skipped as balanced tokens.
fn nested_block<'src>(input: &mut Input<'src>) -> IResult<(Span, Option<types::Block<'src>>)> {
    let checkpoint = input.checkpoint();
    match block(input) {
        Ok(body) => Ok((body.span, Some(body))),
        Err(ErrMode::Incomplete(needed)) => Err(ErrMode::Incomplete(needed)),
        Err(_) => {
            input.reset(&checkpoint);
            Ok((balanced(input)?, None))
        }
    }
}

/// A statement or declaration the editor does not interpret, starting with
/// a token accepted by `starts`. It runs up to the newline or `;` Go would
/// end it at; the blocks inside it are parsed.
fn opaque<'src>(
    input: &mut Input<'src>,
    starts: fn(&Token<'_>) -> bool,
) -> IResult<types::Opaque<'src>> {
    let first = any
        .verify(|token: &PositionedToken<'_>| starts(&token.token))
        .context(Context::Label("statement"))
        .parse_next(input)?;
    // `;` belongs to the clause of these until their first block.
    let mut in_clause = matches!(
        first.token,
        Token::Keyword("for" | "if" | "switch" | "select")
    );

    cut_err(input, |input| {
        let mut blocks = Vec::new();
        let mut span = first.span;
        let mut ends = ends_line(&first.token);
        let mut open: Vec<Delimiter> = Vec::new();

        loop {
            let checkpoint = input.checkpoint();
            let Some(token) = input.next_token() else {
                break;
            };
            let top = open.is_empty();

            match &token.token {
                Token::Newline if top && ends => {
                    input.reset(&checkpoint);
                    break;
                }
                Token::BlockComment(text) if top && ends && text.contains('\n') => {
                    input.reset(&checkpoint);
                    break;
                }
                Token::Semicolon if top && !in_clause => {
                    input.reset(&checkpoint);
                    break;
                }
                trivia if trivia.is_trivia() => {}
                Token::LeftBrace => {
                    input.reset(&checkpoint);
                    let (body_span, body) = nested_block(input)?;
                    blocks.extend(body);
                    if top {
                        in_clause = false;
                    }
                    span = span.union(body_span);
                    ends = true;
                }
                other => {
                    if let Some(delimiter) = opens(other) {
                        open.push(delimiter);
                    } else if let Some(delimiter) = closes(other) {
                        if top {
                            // Closes the enclosing block or call.
                            input.reset(&checkpoint);
                            break;
                        }
                        if open.pop() != Some(delimiter) {
                            return expected(input, "matching closing delimiter");
                        }
                    }
                    span = span.union(token.span);
                    ends = ends_line(other);
                }
            }
        }

        if !open.is_empty() {
            return expected(input, "closing delimiter");
        }
        Ok(types::Opaque { blocks, span })
    })
}

/// Statements inside a block that the editor keeps as written.
fn is_statement_start(token: &Token<'_>) -> bool {
    matches!(token, Token::Var | Token::Keyword(_))
}

/// Top-level declarations other than `var name = value`.
fn is_declaration_start(token: &Token<'_>) -> bool {
    matches!(
        token,
        Token::Var | Token::Func | Token::Keyword("const" | "type")
    )
}

fn statement<'src>(input: &mut Input<'src>) -> IResult<types::Stmt<'src>> {
    alt((
        var_decl.map(types::Stmt::Var),
        assignment.map(types::Stmt::Assign),
        simple_statement,
        |i: &mut Input<'src>| opaque(i, is_statement_start).map(types::Stmt::Opaque),
    ))
    .context(Context::Label("statement"))
    .parse_next(input)
}

/// `{ stmt* }` with statements separated by newlines or `;`
fn block<'src>(input: &mut Input<'src>) -> IResult<types::Block<'src>> {
    let open = left_brace(input)?;

    cut_err(input, |input| {
        let mut stmts: Vec<types::Stmt<'src>> = Vec::new();
        loop {
            let separated = separators0(input)?;
            if let Some(close) = opt(right_brace).parse_next(input)? {
                return Ok(types::Block {
                    stmts,
                    span: open.union(close),
                });
            }
            if !stmts.is_empty() && !separated {
                return expected(input, "newline or `;` between statements");
            }
            stmts.push(statement(input)?);
        }
    })
}

/// One import spec: optional `.`/`_`/alias followed by the path string
fn import_spec<'src>(input: &mut Input<'src>) -> IResult<types::Import> {
    let alias = opt(alt((
        dot.map(|span| Spanned::new(".".to_string(), span)),
        identifier.map(|name| name.map(|n| (*n).to_string())),
    )))
    .parse_next(input)?;
    if alias.is_some() {
        hspace0(input)?;
    }
    let path = string_literal(input)?;
    Ok(types::Import { alias, path })
}

fn import_keyword<'src>(input: &mut Input<'src>) -> IResult<Span> {
    punct(input, |t| matches!(t, Token::Import), "`import`")
}

/// `import spec` or `import ( spec* )`
fn import_decl<'src>(input: &mut Input<'src>) -> IResult<Vec<types::Import>> {
    import_keyword(input)?;

    cut_err(input, |input| {
        ws_comments0(input)?;
        if opt(left_paren).parse_next(input)?.is_none() {
            return Ok(vec![import_spec(input)?]);
        }

        let mut imports = Vec::new();
        loop {
            separators0(input)?;
            if opt(right_paren).parse_next(input)?.is_some() {
                return Ok(imports);
            }
            imports.push(import_spec(input)?);
        }
    })
}

fn package_clause<'src>(input: &mut Input<'src>) -> IResult<Spanned<&'src str>> {
    punct(input, |t| matches!(t, Token::Package), "`package` clause")?;
    cut_err(input, |input| {
        ws_comments0(input)?;
        identifier
            .context(Context::Label("package name"))
            .parse_next(input)
    })
}

fn source_file<'src>(input: &mut Input<'src>) -> IResult<types::SourceFile<'src>> {
    ws_comments0(input)?;
    let package = package_clause(input)?;

    let mut imports = Vec::new();
    let mut decls = Vec::new();
    loop {
        let separated = separators0(input)?;
        if input.eof_offset() == 0 {
            return Ok(types::SourceFile {
                package,
                imports,
                decls,
            });
        }
        if !separated {
            return expected(input, "newline or `;` between declarations");
        }

        let checkpoint = input.checkpoint();
        if opt(import_keyword).parse_next(input)?.is_some() {
            input.reset(&checkpoint);
            if !decls.is_empty() {
                return expected(input, "imports before declarations");
            }
            imports.extend(import_decl(input)?);
            continue;
        }

        decls.push(
            alt((
                var_decl.map(types::Decl::Var),
                |i: &mut Input<'src>| opaque(i, is_declaration_start).map(types::Decl::Opaque),
            ))
            .context(Context::Label("top-level declaration"))
            .parse_next(input)?,
        );
    }
}

/// Package clause and imports. Declarations after them are not parsed.
fn file_header<'src>(
    input: &mut Input<'src>,
) -> IResult<(Spanned<&'src str>, Vec<types::Import>)> {
    ws_comments0(input)?;
    let package = package_clause(input)?;

    let mut imports = Vec::new();
    loop {
        separators0(input)?;
        let checkpoint = input.checkpoint();
        if opt(import_keyword).parse_next(input)?.is_none() {
            return Ok((package, imports));
        }
        input.reset(&checkpoint);
        imports.extend(import_decl(input)?);
    }
}

/// A declaration handed in by a caller, optionally bound with `var` or `:=`.
fn snippet<'src>(input: &mut Input<'src>) -> IResult<types::Stmt<'src>> {
    separators0(input)?;
    statement(input)
}

/// Convert a winnow error to a diagnostic.
///
/// The span covers the tokens consumed since the innermost committed
/// construct started, trimmed of trivia; at a closing delimiter or end of
/// input it falls back to the preceding tokens.
fn convert_error(
    error: ErrMode<ContextError<Context>>,
    tokens: &[PositionedToken],
    current_remaining: usize,
) -> Diagnostic {
    let start_remaining = match &error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e.context().find_map(|ctx| match ctx {
            Context::StartOffset(n) => Some(*n),
            _ => None,
        }),
        _ => None,
    };

    let end_offset = tokens.len() - current_remaining;
    let start_offset = start_remaining.map(|r| tokens.len() - r).unwrap_or(0);

    match error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => {
            let contexts: Vec<String> = e
                .context()
                .filter_map(|ctx| match ctx {
                    Context::Label(label) => Some(format!("expected {label}")),
                    _ => None,
                })
                .collect();

            let message = if contexts.is_empty() {
                "unexpected token or end of input".to_string()
            } else {
                contexts.join(" → ")
            };

            let examine_range = if end_offset < tokens.len() {
                let at = tokens[end_offset..]
                    .iter()
                    .position(|t| !t.token.is_trivia())
                    .map(|p| end_offset + p);
                match at {
                    Some(at) if !matches!(tokens[at].token, Token::RightBrace | Token::RightParen) => {
                        at..at + 1
                    }
                    _ if start_offset < end_offset => start_offset..end_offset,
                    _ => 0..end_offset,
                }
            } else if start_offset < end_offset {
                start_offset..end_offset
            } else {
                0..tokens.len()
            };

            let error_span = significant_span(&tokens[examine_range]).unwrap_or_else(|| {
                Span::empty(tokens.last().map(|t| t.span.end()).unwrap_or_default())
            });

            Diagnostic::error(format!("unexpected token: {message}"))
                .with_code(ErrorCode::E100)
                .with_label(error_span, "unexpected token")
                .with_help("check syntax and token positioning")
        }
        ErrMode::Incomplete(_) => {
            let span = Span::empty(tokens.last().map(|t| t.span.end()).unwrap_or_default());
            Diagnostic::error("incomplete input")
                .with_code(ErrorCode::E101)
                .with_label(span, "input ended here")
        }
    }
}

/// Union of the first and last non-trivia token spans.
fn significant_span(tokens: &[PositionedToken]) -> Option<Span> {
    let first = tokens.iter().find(|t| !t.token.is_trivia())?;
    let last = tokens.iter().rev().find(|t| !t.token.is_trivia())?;
    Some(first.span.union(last.span))
}

/// Parse a complete source file.
///
/// # Errors
///
/// Returns an E100 diagnostic at the first unexpected token.
pub fn build_source_file<'src>(
    tokens: &'src [PositionedToken<'src>],
) -> Result<types::SourceFile<'src>, Diagnostic> {
    let mut token_slice = TokenSlice::new(tokens);

    source_file
        .parse_next(&mut token_slice)
        .map_err(|e| convert_error(e, tokens, token_slice.eof_offset()))
}

/// Parse the package clause and imports of a Go file.
///
/// # Errors
///
/// Returns an E100 diagnostic when the clause or an import is malformed.
pub fn build_header<'src>(
    tokens: &'src [PositionedToken<'src>],
) -> Result<types::FileHeader, Diagnostic> {
    let mut token_slice = TokenSlice::new(tokens);

    let (package, imports) = file_header
        .parse_next(&mut token_slice)
        .map_err(|e| convert_error(e, tokens, token_slice.eof_offset()))?;
    Ok(types::FileHeader {
        package: (*package.inner()).to_string(),
        imports,
    })
}

/// Parse a single declaration statement.
///
/// The statement must be a call, possibly bound with `var` or `:=`; nothing
/// but trivia may follow it.
///
/// # Errors
///
/// E100 for syntax errors, E200 when the statement is not a call, E201 when
/// more content follows the declaration.
pub fn build_snippet<'src>(
    tokens: &'src [PositionedToken<'src>],
) -> Result<types::Stmt<'src>, Diagnostic> {
    let mut token_slice = TokenSlice::new(tokens);

    let stmt = snippet
        .parse_next(&mut token_slice)
        .map_err(|e| convert_error(e, tokens, token_slice.eof_offset()))?;

    let value = match &stmt {
        types::Stmt::Var(decl) | types::Stmt::Assign(decl) => Some(&decl.value),
        types::Stmt::Expr(expr) => Some(expr),
        types::Stmt::Other { .. } | types::Stmt::Opaque(_) => None,
    };
    if !matches!(value, Some(types::Expr::Call(_))) {
        let span = value.map_or(stmt.span(), types::Expr::span);
        return Err(Diagnostic::error("declaration must be a call")
            .with_code(ErrorCode::E200)
            .with_label(span, "not a call")
            .with_help("pass a single declaration such as `Container(\"API\", func() { ... })`"));
    }

    let consumed = tokens.len() - token_slice.eof_offset();
    let rest = &tokens[consumed..];
    if let Some(extra) = rest
        .iter()
        .find(|t| !t.token.is_trivia() && !matches!(t.token, Token::Semicolon)) {
        let span = significant_span(rest).unwrap_or(extra.span);
        return Err(Diagnostic::error("unexpected content after the declaration")
            .with_code(ErrorCode::E201)
            .with_label(span, "extra content")
            .with_secondary_label(stmt.span(), "declaration ends here")
            .with_help("upsert one declaration at a time"));
    }

    Ok(stmt)
}
