//! Error codes for the archedit diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Lexer errors
//! - `E1xx` - Parser errors
//! - `E2xx` - Declaration snippet errors

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// Unterminated string literal.
    ///
    /// A `"` string reached the end of the line or file without its closing
    /// quote.
    E001,

    /// Unexpected character.
    E002,

    /// Invalid escape sequence.
    ///
    /// Valid escapes are `\a \b \f \n \r \t \v \\ \' \"`, `\xNN`, `\uNNNN`,
    /// `\UNNNNNNNN` and three-digit octal escapes.
    E003,

    /// Unterminated raw string literal (missing closing backquote).
    E004,

    /// Unterminated block comment (missing `*/`).
    E005,

    /// Invalid rune literal.
    ///
    /// A `'` literal must hold exactly one character or escape sequence.
    E006,

    // =========================================================================
    // Parser Errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    ///
    /// The parser encountered a token it did not expect at this position.
    E100,

    /// Incomplete input.
    ///
    /// The input ended unexpectedly before a complete construct was parsed.
    E101,

    // =========================================================================
    // Snippet Errors (E2xx)
    // =========================================================================
    /// Snippet is not a declaration.
    ///
    /// Code supplied for an upsert must be a single call such as
    /// `Container("API", func() { ... })`.
    E200,

    /// Unexpected content after the declaration.
    ///
    /// The snippet holds more than one statement.
    E201,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            ErrorCode::E006 => "E006",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E003 => "invalid escape sequence",
            ErrorCode::E004 => "unterminated raw string",
            ErrorCode::E005 => "unterminated block comment",
            ErrorCode::E006 => "invalid rune literal",
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "incomplete input",
            ErrorCode::E200 => "not a declaration",
            ErrorCode::E201 => "unexpected content after declaration",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E001.to_string(), "E001");
        assert_eq!(ErrorCode::E100.to_string(), "E100");
        assert_eq!(ErrorCode::E201.to_string(), "E201");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E004.description(), "unterminated raw string");
        assert_eq!(ErrorCode::E200.description(), "not a declaration");
    }
}
