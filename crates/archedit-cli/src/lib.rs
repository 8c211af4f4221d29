//! CLI logic for the archedit model editor.
//!
//! This module contains the core CLI logic: it loads the configuration,
//! builds an [`Editor`] for the selected package and dispatches the command.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Command};

use std::{fs, path::Path};

use log::info;

use archedit::{
    EditError, Editor,
    kind::IdKind,
    locator::PatchResult,
    snippet::Declaration,
};

/// Run the archedit CLI application
///
/// Returns the text to print: the updated file for edits, the rendered code
/// for `render --print` and every file for `show`.
///
/// # Errors
///
/// Returns `EditError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Parse errors in the package or in the supplied code
/// - Missing relationship sources and destinations
pub fn run(args: &Args) -> Result<String, EditError> {
    info!(repo = args.repo, dir = args.dir; "Opening package");

    let config = config::load_config(args.config.as_ref())?;
    let editor = Editor::new(config, &args.repo, &args.dir);

    let result = match &args.command {
        Command::UpsertElement { kind, path, code } => {
            editor.upsert_element_by_path(*kind, path, &read_code(code)?)?
        }
        Command::UpsertView { kind, key, code } => {
            editor.upsert_element_by_id(IdKind::View(*kind), key, &read_code(code)?)?
        }
        Command::UpsertStyle { kind, tag, code } => {
            editor.upsert_element_by_id(IdKind::Style(*kind), tag, &read_code(code)?)?
        }
        Command::UpsertRelationship {
            source,
            destination,
            code,
        } => editor.upsert_relationship(source, destination, &read_code(code)?)?,
        Command::Render { input, print } => {
            let declaration = read_declaration(Path::new(input))?;
            if *print {
                return Ok(format!("{}\n", declaration.render()?));
            }
            editor.upsert_declaration(&declaration)?
        }
        Command::Format { file } => editor.format_file(file)?,
        Command::Init => editor.create_package()?,
        Command::Show => return show(&editor),
        Command::Packages => return packages(&editor),
    };

    info!(file = result.locator.path().display().to_string(); "Package updated");
    Ok(result.content)
}

fn show(editor: &Editor) -> Result<String, EditError> {
    let files = editor.read_package()?;
    if files.is_empty() {
        return Err(EditError::NotFound(format!(
            "model files in `{}`",
            editor.locator("").package_dir().display()
        )));
    }
    Ok(files
        .iter()
        .map(|PatchResult { content, locator }| format!("// {}\n{content}", locator.filename))
        .collect::<Vec<_>>()
        .join("\n"))
}

fn packages(editor: &Editor) -> Result<String, EditError> {
    Ok(editor
        .list_packages()?
        .iter()
        .map(|dir| {
            if dir.as_os_str().is_empty() {
                ".\n".to_string()
            } else {
                format!("{}\n", dir.display())
            }
        })
        .collect())
}

/// `code` itself, or the content of the file it names with a leading `@`.
fn read_code(code: &str) -> Result<String, EditError> {
    match code.strip_prefix('@') {
        Some(path) => fs::read_to_string(path).map_err(|source| EditError::Io {
            path: path.into(),
            source,
        }),
        None => Ok(code.to_string()),
    }
}

fn read_declaration(path: &Path) -> Result<Declaration, EditError> {
    let content = fs::read_to_string(path).map_err(|source| EditError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|err| {
        EditError::InvalidArgument(format!("declaration `{}`: {err}", path.display()))
    })
}
