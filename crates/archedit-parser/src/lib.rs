//! # Archedit Parser
//!
//! Parser, declaration tree and formatter for the Go-syntax architecture
//! model DSL (`var _ = Design(func() { SoftwareSystem("X", ...) })`).
//!
//! ## Usage
//!
//! ```
//! # use archedit_parser::{format, parse, ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"package model
//!
//! var _ = Design(func() { SoftwareSystem("Bank") })
//! "#;
//!
//!     let tree = parse(source)?;
//!     let design = tree.roots()[0];
//!     assert_eq!(tree.children(design).len(), 1);
//!
//!     let formatted = format(source)?;
//!     assert!(formatted.contains("\n\tSoftwareSystem(\"Bank\")\n"));
//!     Ok(())
//! }
//! ```

pub mod error;
mod format;
mod lexer;
mod parser;
#[cfg(test)]
mod parser_tests;
mod parser_types;
mod span;
mod tokens;
mod tree;

pub use error::ParseError;
pub use format::format;
pub use parser_types::{FileHeader, Import};
pub use span::{Span, Spanned};
pub use tree::{Arg, Binding, DeclarationNode, DeclarationTree, NodeId, Snippet, SpanViolation};

/// Parse a model file into its declaration tree.
///
/// Trees are cheap to rebuild and hold no reference to `source`; parse again
/// whenever the text changes.
///
/// # Errors
///
/// Returns every lexer diagnostic, or the first parser diagnostic.
pub fn parse(source: &str) -> Result<DeclarationTree, ParseError> {
    DeclarationTree::build(source)
}

/// Parse a single declaration as passed to an upsert.
///
/// # Errors
///
/// See [`Snippet::parse`].
pub fn parse_snippet(code: &str) -> Result<Snippet, ParseError> {
    Snippet::parse(code)
}

/// Read the package clause and imports of any Go file. The declarations
/// that follow are lexed but not parsed.
///
/// # Errors
///
/// Returns every lexer diagnostic, or the first parser diagnostic of the
/// header.
pub fn parse_header(source: &str) -> Result<FileHeader, ParseError> {
    let tokens = lexer::tokenize(source)?;
    Ok(parser::build_header(&tokens)?)
}
