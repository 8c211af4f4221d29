//! Lexical analyzer for model DSL source text.
//!
//! The lexer converts source text into a stream of [`Token`]s. Whitespace,
//! newlines and comments are kept as tokens: the parser skips them, the
//! formatter uses them to preserve comments and line structure.
//!
//! The public entry point is [`tokenize`], which performs error-recovering
//! lexical analysis and collects all diagnostics in a single pass.

use winnow::{
    Parser as _,
    combinator::{alt, cut_err, preceded, repeat, terminated},
    error::{ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{literal, none_of, one_of, take_until, take_while},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
    tokens::{PositionedToken, Token},
};

/// Rich diagnostic information for lexer errors.
///
/// Attached to winnow errors via `.context()`; the span of the resulting
/// diagnostic runs from `start` to the position where lexing failed.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
    start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = ModalResult<O, ContextError<LexerDiagnostic>>;

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Match an opening delimiter, backtracking without context otherwise.
fn opening<'a>(input: &mut Input<'a>, delimiter: &'static str) -> IResult<&'a str> {
    literal(delimiter).parse_next(input)
}

/// Decode `digits` hex digits into a character.
fn hex_escape<'a>(input: &mut Input<'a>, digits: usize) -> IResult<char> {
    take_while(digits, |c: char| c.is_ascii_hexdigit())
        .verify_map(|hex: &str| u32::from_str_radix(hex, 16).ok().and_then(char::from_u32))
        .parse_next(input)
}

/// Three octal digits, at most `\377`.
fn octal_escape<'a>(input: &mut Input<'a>) -> IResult<char> {
    take_while(3, |c: char| ('0'..='7').contains(&c))
        .verify_map(|oct: &str| {
            u32::from_str_radix(oct, 8)
                .ok()
                .filter(|value| *value <= 0o377)
                .and_then(char::from_u32)
        })
        .parse_next(input)
}

/// The part of an escape sequence after the backslash.
fn escape_body<'a>(input: &mut Input<'a>) -> IResult<char> {
    alt((
        one_of(['a', 'b', 'f', 'n', 'r', 't', 'v', '\\', '\'', '"']).map(|c| match c {
            'a' => '\u{07}',
            'b' => '\u{08}',
            'f' => '\u{0C}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{0B}',
            other => other,
        }),
        preceded('x', |i: &mut Input<'a>| hex_escape(i, 2)),
        preceded('u', |i: &mut Input<'a>| hex_escape(i, 4)),
        preceded('U', |i: &mut Input<'a>| hex_escape(i, 8)),
        octal_escape,
    ))
    .parse_next(input)
}

/// Parse an escape sequence in an interpreted string, backslash included.
fn string_escape<'a>(input: &mut Input<'a>) -> IResult<char> {
    let escape_start = input.current_token_start();

    opening(input, "\\")?;

    cut_err(escape_body)
        .context(LexerDiagnostic {
            code: ErrorCode::E003,
            message: "invalid escape sequence",
            help: Some(
                "valid escapes: `\\n`, `\\t`, `\\\\`, `\\\"`, `\\xNN`, `\\uNNNN`, `\\UNNNNNNNN`, `\\NNN`",
            ),
            start: escape_start,
        })
        .parse_next(input)
}

/// Parse an interpreted string literal: `"Internet Banking\tSystem"`.
///
/// Strings may not span lines.
fn string_literal<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let string_char = none_of(['"', '\\', '\n']);
    let string_content =
        repeat(0.., alt((string_escape, string_char))).fold(String::new, |mut acc, ch| {
            acc.push(ch);
            acc
        });

    let start_pos = input.current_token_start();

    opening(input, "\"")?;

    cut_err(terminated(string_content, '"'))
        .context(LexerDiagnostic {
            code: ErrorCode::E001,
            message: "unterminated string literal",
            help: Some("add closing `\"` before the end of the line"),
            start: start_pos,
        })
        .parse_next(input)
        .map(Token::StringLiteral)
}

/// Parse a backquoted raw string literal, which may span lines.
fn raw_string<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let start_pos = input.current_token_start();

    opening(input, "`")?;

    cut_err(terminated(take_while(0.., |c: char| c != '`'), '`'))
        .context(LexerDiagnostic {
            code: ErrorCode::E004,
            message: "unterminated raw string literal",
            help: Some("add closing backquote"),
            start: start_pos,
        })
        .parse_next(input)
        .map(Token::RawString)
}

/// Parse a rune literal: `'a'`, `'\n'`, `'\u00e9'`.
fn char_literal<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let start_pos = input.current_token_start();

    let rune = alt((string_escape, none_of(['\'', '\\', '\n'])));
    (
        '\'',
        cut_err(terminated(rune, '\'')).context(LexerDiagnostic {
            code: ErrorCode::E006,
            message: "invalid rune literal",
            help: Some("a rune literal holds one character, e.g. `'a'` or `'\\n'`"),
            start: start_pos,
        }),
    )
        .take()
        .map(Token::Char)
        .parse_next(input)
}

/// Parse line comment starting with '//'
fn line_comment<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    preceded("//", take_while(0.., |c: char| c != '\n' && c != '\r'))
        .map(Token::LineComment)
        .parse_next(input)
}

/// Parse block comment `/* ... */`
fn block_comment<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let start_pos = input.current_token_start();

    opening(input, "/*")?;

    cut_err(terminated(take_until(0.., "*/"), "*/"))
        .context(LexerDiagnostic {
            code: ErrorCode::E005,
            message: "unterminated block comment",
            help: Some("add closing `*/`"),
            start: start_pos,
        })
        .parse_next(input)
        .map(Token::BlockComment)
}

/// Token for a Go keyword, `None` for any other word.
fn keyword_token(word: &str) -> Option<Token<'_>> {
    match word {
        "package" => Some(Token::Package),
        "import" => Some(Token::Import),
        "func" => Some(Token::Func),
        "var" => Some(Token::Var),
        "break" | "case" | "chan" | "const" | "continue" | "default" | "defer" | "else"
        | "fallthrough" | "for" | "go" | "goto" | "if" | "interface" | "map" | "range"
        | "return" | "select" | "struct" | "switch" | "type" => Some(Token::Keyword(word)),
        _ => None,
    }
}

/// Parse keywords; a longer word is an identifier
fn keyword<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., is_ident_char)
        .verify_map(keyword_token)
        .parse_next(input)
}

/// Parse numeric literals, kept verbatim (`42`, `0.5`, `0x1F`, `1e3`)
fn number<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '.' || c == '_')
        .verify(|s: &str| s.starts_with(|c: char| c.is_ascii_digit()))
        .map(Token::Number)
        .parse_next(input)
}

/// Parse identifiers (Unicode letters allowed, as in Go)
fn identifier<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., is_ident_char)
        .verify(|s: &str| s.starts_with(|c: char| c.is_alphabetic() || c == '_'))
        .map(Token::Identifier)
        .parse_next(input)
}

/// Go operators without a token of their own, longest first.
const OPERATORS: [&str; 36] = [
    "<<=", ">>=", "&^=", "...", "&&", "||", "<-", "++", "--", "==", "!=", "<=", ">=", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "&^", "+", "*", "/", "%", "&", "|",
    "^", "<", ">", "!", ":", "~",
];

/// Parse a generic Go operator
fn go_operator<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    for op in OPERATORS {
        if input.starts_with(op) {
            return literal(op).map(Token::Operator).parse_next(input);
        }
    }
    Err(ErrMode::Backtrack(ContextError::new()))
}

/// Parse punctuation, `:=` and the operators the parser interprets
fn operator<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        literal(":=").value(Token::Define),
        go_operator,
        '='.value(Token::Assign),
        '-'.value(Token::Minus),
        '.'.value(Token::Dot),
        '('.value(Token::LeftParen),
        ')'.value(Token::RightParen),
        '{'.value(Token::LeftBrace),
        '}'.value(Token::RightBrace),
        '['.value(Token::LeftBracket),
        ']'.value(Token::RightBracket),
        ','.value(Token::Comma),
        ';'.value(Token::Semicolon),
    ))
    .parse_next(input)
}

/// Parse whitespace (spaces, tabs, carriage returns, but not newlines)
fn whitespace<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., |c: char| c.is_whitespace() && c != '\n')
        .value(Token::Whitespace)
        .parse_next(input)
}

/// Parse newline
fn newline<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    '\n'.value(Token::Newline).parse_next(input)
}

/// Parse a single token with position tracking
fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((
        line_comment,   // Must come before block comments
        block_comment,  // Must come before any single char
        string_literal, // Must come before any single char
        raw_string,
        char_literal,
        keyword,    // Must come before identifier
        number,     // Must come before identifier
        identifier, // Must come before single chars
        operator,
        newline, // Must come before whitespace
        whitespace,
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();

    Ok(PositionedToken::new(token, Span::new(start_pos..end_pos)))
}

/// Lexer that accumulates tokens and diagnostics during tokenization.
struct Lexer<'a> {
    tokens: Vec<PositionedToken<'a>>,
    diagnostics: DiagnosticCollector,
}

impl<'a> Lexer<'a> {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    /// Tokenize the input, collecting tokens and errors.
    fn tokenize(&mut self, mut input: Input<'a>) {
        while !input.is_empty() {
            match positioned_token(&mut input) {
                Ok(token) => self.tokens.push(token),
                Err(e) => {
                    let error_pos = input.current_token_start();
                    self.diagnostics.emit(Self::convert_err_mode(e, error_pos));

                    // Skip one character and keep going. A failed string
                    // skips its opening quote, so its tail is lexed as code.
                    if !input.is_empty() {
                        input.next_token();
                    }
                }
            }
        }
    }

    fn finish(self) -> Result<Vec<PositionedToken<'a>>, ParseError> {
        self.diagnostics.finish().map(|()| self.tokens)
    }

    /// Convert an ErrMode and error position to a Diagnostic.
    ///
    /// Falls back to E002 (unexpected character) when no context is attached.
    fn convert_err_mode(err: ErrMode<ContextError<LexerDiagnostic>>, error_pos: usize) -> Diagnostic {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        if let Some(LexerDiagnostic {
            code,
            message,
            help,
            start,
        }) = context_error.context().next()
        {
            let span = Span::new(*start..error_pos.max(*start));
            let mut diag = Diagnostic::error(*message)
                .with_code(*code)
                .with_label(span, code.description());
            if let Some(h) = help {
                diag = diag.with_help(*h);
            }
            return diag;
        }

        let span = Span::new(error_pos..error_pos.saturating_add(1));
        Diagnostic::error("unexpected character")
            .with_code(ErrorCode::E002)
            .with_label(span, ErrorCode::E002.description())
    }
}

/// Split source text into tokens, trivia included.
///
/// Attempts to recover from errors and continue tokenizing, so a single call
/// reports every lexical problem in the file.
///
/// # Errors
///
/// Returns a [`ParseError`] holding one diagnostic per problem found.
pub fn tokenize(input: &str) -> Result<Vec<PositionedToken<'_>>, ParseError> {
    let mut lexer = Lexer::new();
    lexer.tokenize(LocatingSlice::new(input));
    lexer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_token(input: &str) -> Token<'_> {
        let mut located_input = LocatingSlice::new(input);
        let result = positioned_token(&mut located_input);
        assert!(result.is_ok(), "Failed to parse: {input}");
        result.unwrap().token
    }

    fn lex_error(input: &str) -> Diagnostic {
        let err = tokenize(input).expect_err("expected a lexer error");
        err.diagnostics()[0].clone()
    }

    #[test]
    fn test_keywords() {
        assert_eq!(single_token("package"), Token::Package);
        assert_eq!(single_token("import"), Token::Import);
        assert_eq!(single_token("var"), Token::Var);
        assert_eq!(single_token("func"), Token::Func);
        assert_eq!(single_token("for"), Token::Keyword("for"));
        assert_eq!(single_token("range"), Token::Keyword("range"));
        assert_eq!(single_token("const"), Token::Keyword("const"));
        assert_eq!(single_token("formula"), Token::Identifier("formula"));
    }

    #[test]
    fn test_keyword_word_boundaries() {
        assert_eq!(single_token("variable"), Token::Identifier("variable"));
        assert_eq!(single_token("funcs"), Token::Identifier("funcs"));
        assert_eq!(single_token("packageName"), Token::Identifier("packageName"));
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(single_token("SoftwareSystem"), Token::Identifier("SoftwareSystem"));
        assert_eq!(single_token("_"), Token::Identifier("_"));
        assert_eq!(single_token("ShapePerson2"), Token::Identifier("ShapePerson2"));
        assert_eq!(single_token("Système"), Token::Identifier("Système"));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(single_token("42"), Token::Number("42"));
        assert_eq!(single_token("0.5"), Token::Number("0.5"));
        assert_eq!(single_token("0x1F"), Token::Number("0x1F"));
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(
            single_token(r#""Internet Banking System""#),
            Token::StringLiteral("Internet Banking System".to_string())
        );
        assert_eq!(single_token(r#""""#), Token::StringLiteral(String::new()));
    }

    #[test]
    fn test_string_escape_sequences() {
        assert_eq!(
            single_token(r#""a\tb\n\"c\"\\""#),
            Token::StringLiteral("a\tb\n\"c\"\\".to_string())
        );
        assert_eq!(
            single_token(r#""\x41é\U0001F600\101""#),
            Token::StringLiteral("Aé😀A".to_string())
        );
    }

    #[test]
    fn test_raw_strings() {
        assert_eq!(single_token("`a\\nb`"), Token::RawString("a\\nb"));
        assert_eq!(single_token("`line\nline`"), Token::RawString("line\nline"));
    }

    #[test]
    fn test_comments() {
        assert_eq!(single_token("// note"), Token::LineComment(" note"));
        assert_eq!(single_token("/* a\n b */"), Token::BlockComment(" a\n b "));
    }

    #[test]
    fn test_operators() {
        assert_eq!(single_token(":="), Token::Define);
        assert_eq!(single_token("="), Token::Assign);
        assert_eq!(single_token("-"), Token::Minus);
        assert_eq!(single_token("."), Token::Dot);
        assert_eq!(single_token("*"), Token::Operator("*"));
        assert_eq!(single_token("&&"), Token::Operator("&&"));
        assert_eq!(single_token("<-"), Token::Operator("<-"));
        assert_eq!(single_token("--"), Token::Operator("--"));
        assert_eq!(single_token("=="), Token::Operator("=="));
        assert_eq!(single_token("..."), Token::Operator("..."));
        assert_eq!(single_token(":"), Token::Operator(":"));
        assert_eq!(single_token("/="), Token::Operator("/="));
    }

    #[test]
    fn test_go_expression_tokens() {
        let tokens = tokenize("b[i+1] != &x // done").unwrap();
        let significant: Vec<&Token<'_>> = tokens
            .iter()
            .map(|t| &t.token)
            .filter(|t| !t.is_trivia())
            .collect();

        assert_eq!(
            significant,
            vec![
                &Token::Identifier("b"),
                &Token::LeftBracket,
                &Token::Identifier("i"),
                &Token::Operator("+"),
                &Token::Number("1"),
                &Token::RightBracket,
                &Token::Operator("!="),
                &Token::Operator("&"),
                &Token::Identifier("x"),
            ]
        );
    }

    #[test]
    fn test_rune_literals() {
        assert_eq!(single_token("'a'"), Token::Char("'a'"));
        assert_eq!(single_token(r"'\n'"), Token::Char(r"'\n'"));
        assert_eq!(single_token(r"'\''"), Token::Char(r"'\''"));
        assert_eq!(lex_error("x := 'ab'").code(), Some(ErrorCode::E006));
    }

    #[test]
    fn test_full_lexing() {
        let tokens = tokenize("var _ = Design(func() {\n\tTag(\"x\")\n})").unwrap();
        let significant: Vec<&Token<'_>> = tokens
            .iter()
            .map(|t| &t.token)
            .filter(|t| !t.is_trivia())
            .collect();

        assert_eq!(
            significant,
            vec![
                &Token::Var,
                &Token::Identifier("_"),
                &Token::Assign,
                &Token::Identifier("Design"),
                &Token::LeftParen,
                &Token::Func,
                &Token::LeftParen,
                &Token::RightParen,
                &Token::LeftBrace,
                &Token::Identifier("Tag"),
                &Token::LeftParen,
                &Token::StringLiteral("x".to_string()),
                &Token::RightParen,
                &Token::RightBrace,
                &Token::RightParen,
            ]
        );
    }

    #[test]
    fn test_span_tracking() {
        let input = "Uses(\"A\", \"calls\")";
        let tokens = tokenize(input).unwrap();

        assert_eq!(tokens[0].span, Span::new(0..4));
        assert_eq!(tokens[2].span, Span::new(5..8));
        assert_eq!(&input[tokens[2].span.range()], "\"A\"");
    }

    #[test]
    fn test_unterminated_string() {
        let diag = lex_error("Tag(\"open\n)");
        assert_eq!(diag.code(), Some(ErrorCode::E001));
        assert_eq!(diag.primary_span().unwrap().start(), 4);
    }

    #[test]
    fn test_invalid_escape() {
        let diag = lex_error(r#"Tag("bad \q")"#);
        assert_eq!(diag.code(), Some(ErrorCode::E003));
        assert_eq!(diag.primary_span().unwrap().start(), 9);
    }

    #[test]
    fn test_unterminated_raw_string_and_comment() {
        assert_eq!(lex_error("Tag(`open").code(), Some(ErrorCode::E004));
        assert_eq!(lex_error("/* never closed").code(), Some(ErrorCode::E005));
    }

    #[test]
    fn test_unexpected_character_recovery() {
        let err = tokenize("Tag(@) # ok").unwrap_err();
        assert_eq!(err.diagnostics().len(), 2);
        assert!(
            err.diagnostics()
                .iter()
                .all(|d| d.code() == Some(ErrorCode::E002))
        );
        assert_eq!(err.diagnostics()[0].primary_span(), Some(Span::new(4..5)));
    }

    mod proptest_tests {
        use proptest::prelude::*;

        use super::*;

        /// Fragments that always lex; joined without separators some of
        /// them merge (two identifiers), which is still valid input.
        fn fragment() -> impl Strategy<Value = &'static str> {
            prop::sample::select(vec![
                "SoftwareSystem",
                "(",
                ")",
                "{",
                "}",
                ",",
                " ",
                "\t",
                "\n",
                "\"Bank\"",
                "\"a\\tb\"",
                "`raw`",
                "// note\n",
                "/* c */",
                "func",
                "var",
                ":=",
                "=",
                "42",
                ".",
                "-",
                "+",
                "*",
                "<",
                "&",
                ":",
                "[",
                "]",
                "'a'",
                "for",
            ])
        }

        fn check_tokens_tile_input(parts: &[&str]) -> Result<(), TestCaseError> {
            let input: String = parts.concat();
            let tokens = tokenize(&input).map_err(|e| TestCaseError::fail(e.to_string()))?;

            let mut offset = 0;
            for token in &tokens {
                prop_assert_eq!(token.span.start(), offset);
                prop_assert!(!token.span.is_empty());
                offset = token.span.end();
            }
            prop_assert_eq!(offset, input.len());
            Ok(())
        }

        proptest! {
            #[test]
            fn tokens_tile_input(parts in prop::collection::vec(fragment(), 0..40)) {
                check_tokens_tile_input(&parts)?;
            }
        }
    }
}
