//! Token definitions for the model DSL.

use std::fmt;

use winnow::stream::Location;

use crate::span::Span;

/// Token types for the Go subset the model DSL is written in.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    // Keywords
    Package,
    Import,
    Var,
    Func,
    /// Any other Go keyword: `for`, `if`, `const`, `type`, `map`...
    Keyword(&'src str),

    // Literals
    /// Interpreted string literal, escapes already decoded.
    StringLiteral(String),
    /// Backquoted raw string literal, content between the quotes.
    RawString(&'src str),
    /// Numeric literal kept verbatim.
    Number(&'src str),
    /// Rune literal kept verbatim, quotes included.
    Char(&'src str),
    Identifier(&'src str),

    // Operators
    Assign, // =
    Define, // :=
    Minus,  // -
    Dot,    // .
    /// Any other Go operator: `+`, `*`, `&&`, `<-`, `++`, `+=`, `:`, `...`
    Operator(&'src str),

    // Punctuation
    LeftParen,    // (
    RightParen,   // )
    LeftBrace,    // {
    RightBrace,   // }
    LeftBracket,  // [
    RightBracket, // ]
    Comma,        // ,
    Semicolon,    // ;

    // Comments
    LineComment(&'src str),  // // comment
    BlockComment(&'src str), // /* comment */

    // Whitespace
    Whitespace,
    Newline,
}

impl Token<'_> {
    /// Whitespace and comments.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            Token::Whitespace | Token::Newline | Token::LineComment(_) | Token::BlockComment(_)
        )
    }
}

/// A token with position information for winnow integration
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, span: Span) -> Self {
        Self { token, span }
    }
}

impl<'src> std::ops::Deref for PositionedToken<'src> {
    type Target = Token<'src>;

    fn deref(&self) -> &Self::Target {
        &self.token
    }
}

impl Location for PositionedToken<'_> {
    fn previous_token_end(&self) -> usize {
        self.span.start()
    }

    fn current_token_start(&self) -> usize {
        self.span.start()
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Package => write!(f, "package"),
            Token::Import => write!(f, "import"),
            Token::Var => write!(f, "var"),
            Token::Func => write!(f, "func"),
            Token::Keyword(word) => write!(f, "{word}"),

            Token::StringLiteral(s) => write!(f, "{s:?}"),
            Token::RawString(s) => write!(f, "`{s}`"),
            Token::Number(n) => write!(f, "{n}"),
            Token::Char(c) => write!(f, "{c}"),
            Token::Identifier(name) => write!(f, "{name}"),

            Token::Assign => write!(f, "="),
            Token::Define => write!(f, ":="),
            Token::Minus => write!(f, "-"),
            Token::Dot => write!(f, "."),
            Token::Operator(op) => write!(f, "{op}"),

            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),

            Token::LineComment(comment) => write!(f, "//{comment}"),
            Token::BlockComment(comment) => write!(f, "/*{comment}*/"),
            Token::Whitespace => write!(f, " "),
            Token::Newline => write!(f, "\\n"),
        }
    }
}
