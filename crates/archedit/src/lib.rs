//! Archedit - a format-preserving structural editor for architecture models.
//!
//! Models are Go packages written in the architecture DSL
//! (`var _ = Design(func() { SoftwareSystem("Bank", func() { ... }) })`).
//! The [`Editor`] addresses declarations by path (`Bank/API/Accounts`) or by
//! identifier (view keys, style tags), replaces or inserts their source text,
//! keeps every other byte of the file, and writes the formatted result.
//!
//! Replacing an element keeps the relationships declared directly in it
//! unless the new code redeclares them. Inserting a declaration whose
//! enclosing declarations do not exist yet creates them.

pub mod config;
pub mod snippet;

mod editor;
mod error;
mod patch;
mod plan;
mod relationship;
mod resolve;
mod store;

pub use archedit_core::{kind, locator, path};
pub use archedit_parser::format;

pub use editor::Editor;
pub use error::{EditError, ParseOrigin};
