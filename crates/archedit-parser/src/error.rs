//! Diagnostics reported while lexing, parsing and formatting model sources.
//!
//! A [`Diagnostic`] is one error or warning: an optional [`ErrorCode`], a
//! message, labelled source spans and optional help. Everything that can fail
//! in this crate returns a [`ParseError`], which carries every diagnostic the
//! failing phase collected.
//!
//! ```
//! # use archedit_parser::error::{Diagnostic, ErrorCode};
//! # use archedit_parser::Span;
//! let diag = Diagnostic::error("unterminated string literal")
//!     .with_code(ErrorCode::E001)
//!     .with_label(Span::new(24..31), "string starts here")
//!     .with_help("add closing `\"`");
//! assert_eq!(diag.to_string(), "error[E001]: unterminated string literal");
//! ```

mod diagnostic;
mod error_code;
mod parse_error;

pub(crate) use parse_error::DiagnosticCollector;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use parse_error::ParseError;
