//! Command-line argument definitions for the archedit CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Global arguments select the package and configuration,
//! the [`Command`] selects the edit.

use clap::{Parser, Subcommand};

use archedit::kind::{ElementKind, StyleKind, ViewKind};

/// Command-line arguments for the archedit model editor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Repository root the package directory is relative to
    #[arg(long, default_value = ".")]
    pub repo: String,

    /// Package directory holding the model files
    #[arg(short, long, default_value = "model")]
    pub dir: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Edits and queries on the package.
///
/// `code` arguments take the declaration source directly, or `@path` to read
/// it from a file.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replace or insert a person, software system, container or component
    UpsertElement {
        /// Person, SoftwareSystem, Container or Component
        kind: ElementKind,
        /// Slash-separated keys, e.g. `Bank/API`
        path: String,
        code: String,
    },

    /// Replace or insert a view by key
    UpsertView {
        /// View function, e.g. `ContainerView`
        kind: ViewKind,
        key: String,
        code: String,
    },

    /// Replace or insert an element or relationship style by tag
    UpsertStyle {
        /// ElementStyle or RelationshipStyle
        kind: StyleKind,
        tag: String,
        code: String,
    },

    /// Replace or insert a relationship of the element at `source`
    UpsertRelationship {
        source: String,
        destination: String,
        code: String,
    },

    /// Upsert the declaration described by a TOML file
    Render {
        input: String,

        /// Print the rendered code without editing the package
        #[arg(long)]
        print: bool,
    },

    /// Rewrite a model file in canonical layout
    Format { file: String },

    /// Create the package with an empty design
    Init,

    /// Print every model file of the package
    Show,

    /// List model packages below the repository root
    Packages,
}
