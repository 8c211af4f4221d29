//! Canonical formatter for model files.
//!
//! The formatter parses its input first, so it rejects anything the editor
//! could not read back, then reprints the significant tokens with canonical
//! spacing, tab indentation and line structure. Comments are kept; source
//! text of every token is copied verbatim.
//!
//! Go code the editor does not interpret (loops, helper functions, typed
//! `var` groups, arithmetic) is kept as written. Only its indentation is
//! shifted to the enclosing block's level.

use crate::{
    error::ParseError,
    lexer, parser,
    parser_types::{Decl, Expr, SourceFile, Stmt},
    span::Span,
    tokens::{PositionedToken, Token},
};

/// A token worth printing, with the layout that preceded it.
#[derive(Debug)]
struct Item<'a> {
    token: &'a Token<'a>,
    text: &'a str,
    /// Newlines between the previous significant token and this one.
    newlines: usize,
    /// A `;` separated this token from the previous one.
    after_semicolon: bool,
    /// Tokens of a region printed as written, `token` being the first.
    verbatim: Option<&'a [PositionedToken<'a>]>,
}

impl<'a> Item<'a> {
    /// The token following items are laid out against.
    fn last(&self) -> &'a Token<'a> {
        match self.verbatim.and_then(|tokens| tokens.last()) {
            Some(last) => &last.token,
            None => self.token,
        }
    }
}

/// Expressions the token printer lays out itself.
fn is_plain(expr: &Expr<'_>) -> bool {
    match expr {
        Expr::String(_) | Expr::Number(_) | Expr::Char(_) | Expr::Ident(_) => true,
        Expr::Selector { base, .. } => is_plain(base),
        Expr::Negate { operand, .. } => is_plain(operand),
        Expr::Paren { inner, .. } => is_plain(inner),
        Expr::Call(call) => !call.ellipsis && is_plain(&call.callee) && call.args.iter().all(is_plain),
        Expr::FuncLit(func) => !func.has_signature,
        _ => false,
    }
}

/// Outermost spans to print as written, in document order.
fn verbatim_regions(file: &SourceFile<'_>) -> Vec<Span> {
    let mut regions = Vec::new();
    for decl in &file.decls {
        match decl {
            Decl::Var(decl) if is_plain(&decl.value) => collect_expr(&decl.value, &mut regions),
            _ => regions.push(decl.span()),
        }
    }
    regions
}

fn collect_expr(expr: &Expr<'_>, regions: &mut Vec<Span>) {
    match expr {
        Expr::FuncLit(func) => {
            for stmt in &func.body.stmts {
                collect_stmt(stmt, regions);
            }
        }
        Expr::Call(call) => {
            collect_expr(&call.callee, regions);
            for arg in &call.args {
                collect_expr(arg, regions);
            }
        }
        Expr::Selector { base, .. } => collect_expr(base, regions),
        Expr::Paren { inner, .. } => collect_expr(inner, regions),
        _ => {}
    }
}

fn collect_stmt(stmt: &Stmt<'_>, regions: &mut Vec<Span>) {
    match stmt {
        Stmt::Var(decl) | Stmt::Assign(decl) if is_plain(&decl.value) => {
            collect_expr(&decl.value, regions);
        }
        Stmt::Expr(expr) if is_plain(expr) => collect_expr(expr, regions),
        _ => regions.push(stmt.span()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    /// Call arguments, function parameters, parenthesized expressions.
    Call,
    /// `import ( ... )`
    Group,
    Brace,
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    /// A line break happened directly inside this frame.
    indenting: bool,
}

/// Collect the significant tokens; semicolons are dropped and replaced by a
/// line break. The tokens of each region become a single item.
fn significant<'a>(
    source: &'a str,
    tokens: &'a [PositionedToken<'a>],
    regions: &[Span],
) -> Vec<Item<'a>> {
    let mut items = Vec::new();
    let mut newlines = 0;
    let mut after_semicolon = false;
    let mut regions = regions.iter().peekable();
    let mut index = 0;

    while index < tokens.len() {
        let positioned = &tokens[index];
        if let Some(region) = regions.next_if(|region| region.start() == positioned.span.start()) {
            let last = tokens[index..]
                .iter()
                .position(|token| token.span.end() >= region.end())
                .map_or(tokens.len() - 1, |offset| index + offset);
            items.push(Item {
                token: &positioned.token,
                text: &source[region.range()],
                newlines,
                after_semicolon,
                verbatim: Some(&tokens[index..=last]),
            });
            newlines = 0;
            after_semicolon = false;
            index = last + 1;
            continue;
        }
        index += 1;

        match positioned.token {
            Token::Whitespace => {}
            Token::Newline => newlines += 1,
            Token::Semicolon => after_semicolon = true,
            _ => {
                items.push(Item {
                    token: &positioned.token,
                    text: &source[positioned.span.range()],
                    newlines,
                    after_semicolon,
                    verbatim: None,
                });
                newlines = 0;
                after_semicolon = false;
            }
        }
    }
    items
}

fn is_opener(token: &Token<'_>) -> bool {
    matches!(token, Token::LeftParen | Token::LeftBrace | Token::LeftBracket)
}

fn is_closer(token: &Token<'_>) -> bool {
    matches!(
        token,
        Token::RightParen | Token::RightBrace | Token::RightBracket
    )
}

#[derive(Debug)]
struct Printer<'s> {
    source: &'s str,
    out: String,
    frames: Vec<Frame>,
    /// The last `.` printed was an import alias, not a selector.
    alias_dot: bool,
}

impl<'s> Printer<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            out: String::new(),
            frames: Vec::new(),
            alias_dot: false,
        }
    }

    fn print(mut self, items: &[Item<'_>]) -> String {
        let mut prev: Option<&Token<'_>> = None;

        for item in items {
            let mut popped = false;

            if let Some(prev) = prev {
                let breaks = self.breaks(prev, item);
                if breaks > 0 {
                    if is_closer(item.token) {
                        self.frames.pop();
                        popped = true;
                    } else if let Some(top) = self.frames.last_mut() {
                        top.indenting = true;
                    }
                    for _ in 0..breaks {
                        self.out.push('\n');
                    }
                    let level = self.frames.iter().filter(|f| f.indenting).count();
                    for _ in 0..level {
                        self.out.push('\t');
                    }
                } else if self.space(prev, item.token) {
                    self.out.push(' ');
                }
            }

            if let Some(tokens) = item.verbatim {
                self.verbatim(tokens);
                prev = Some(item.last());
                continue;
            }

            if is_closer(item.token) && !popped {
                self.frames.pop();
            }

            if matches!(item.token, Token::Dot) {
                self.alias_dot = matches!(prev, Some(Token::Import))
                    || self.frames.last().is_some_and(|f| f.kind == FrameKind::Group);
            }

            self.out.push_str(item.text);

            if is_opener(item.token) {
                let kind = match (item.token, prev) {
                    (Token::LeftBrace, _) => FrameKind::Brace,
                    (Token::LeftParen, Some(Token::Import)) => FrameKind::Group,
                    _ => FrameKind::Call,
                };
                self.frames.push(Frame {
                    kind,
                    indenting: false,
                });
            }

            prev = Some(item.token);
        }

        self.out.push('\n');
        self.out
    }

    /// Print `tokens` as written, moving every line from the indentation of
    /// the region's first source line to the current output line's.
    fn verbatim(&mut self, tokens: &[PositionedToken<'_>]) {
        let Some(first) = tokens.first() else {
            return;
        };
        let source = self.source;
        let line_start = source[..first.span.start()]
            .rfind('\n')
            .map_or(0, |newline| newline + 1);
        let base = leading_whitespace(&source[line_start..]);
        let indent = leading_whitespace(&self.out[self.out.rfind('\n').map_or(0, |n| n + 1)..])
            .to_string();

        let mut line_start = false;
        for (i, positioned) in tokens.iter().enumerate() {
            let next = tokens.get(i + 1).map(|next| &next.token);
            match positioned.token {
                Token::Newline => {
                    self.out.push('\n');
                    line_start = true;
                    if !matches!(next, Some(Token::Whitespace | Token::Newline)) {
                        self.out.push_str(&indent);
                    }
                    continue;
                }
                // Trailing whitespace and blank lines.
                Token::Whitespace if matches!(next, Some(Token::Newline)) => {}
                Token::Whitespace if line_start => {
                    let text = &source[positioned.span.range()];
                    self.out.push_str(&indent);
                    self.out.push_str(text.strip_prefix(base).unwrap_or_default());
                }
                _ => self.out.push_str(&source[positioned.span.range()]),
            }
            line_start = false;
        }
    }

    /// Number of newlines to print before `item`.
    fn breaks(&self, prev: &Token<'_>, item: &Item<'_>) -> usize {
        let token = item.token;
        let kept = item.newlines.min(2);

        // Trailing comment on the same line.
        if matches!(token, Token::LineComment(_)) && item.newlines == 0 {
            return 0;
        }

        let breaks = match (prev, token) {
            (Token::LeftBrace, Token::RightBrace) => 0,
            (Token::LeftBrace, _) | (_, Token::RightBrace) => 1,
            (Token::LineComment(_), _) => kept.max(1),
            _ if item.after_semicolon => kept.max(1),
            (
                Token::Assign
                | Token::Define
                | Token::Dot
                | Token::Minus
                | Token::Package
                | Token::Import
                | Token::Var
                | Token::Func,
                _,
            ) => 0,
            _ => match self.frames.last().map(|f| f.kind) {
                Some(FrameKind::Call) => match (prev, token) {
                    (_, Token::Comma | Token::Dot) => 0,
                    (Token::Comma, Token::RightParen) => kept,
                    (_, Token::RightParen) => 0,
                    (Token::LeftParen | Token::Comma, _) => kept,
                    _ => 0,
                },
                Some(FrameKind::Group) | Some(FrameKind::Brace) | None => kept,
            },
        };

        if is_closer(token) || is_opener(prev) {
            breaks.min(1)
        } else {
            breaks
        }
    }

    /// Whether a space separates `prev` and `token` on the same line.
    fn space(&self, prev: &Token<'_>, token: &Token<'_>) -> bool {
        match (prev, token) {
            (_, Token::LineComment(_)) => true,
            (Token::LeftParen | Token::LeftBracket | Token::Minus, _) => false,
            (Token::Dot, _) => self.alias_dot,
            (Token::Import, Token::Dot) => true,
            (_, Token::Comma | Token::Dot | Token::RightParen | Token::RightBracket) => false,
            (
                Token::Identifier(_) | Token::RightParen | Token::RightBracket | Token::Func,
                Token::LeftParen,
            ) => false,
            (Token::LeftBrace, Token::RightBrace) => false,
            _ => true,
        }
    }
}

fn leading_whitespace(line: &str) -> &str {
    let end = line
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(line.len());
    &line[..end]
}

/// Format `source` canonically.
///
/// The output always ends with exactly one newline and formatting it again
/// returns it unchanged.
///
/// # Errors
///
/// Returns the lexer or parser diagnostics when `source` is not a valid
/// model file.
pub fn format(source: &str) -> Result<String, ParseError> {
    let tokens = lexer::tokenize(source)?;
    let file = parser::build_source_file(&tokens)?;

    let regions = verbatim_regions(&file);
    let items = significant(source, &tokens, &regions);
    Ok(Printer::new(source).print(&items))
}
