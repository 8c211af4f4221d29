//! The editing facade.
//!
//! Every operation reads and parses the package afresh, decides on exactly
//! one edit, splices it into one file, formats the result and writes it.
//! Nothing is written unless the formatted output parses.

use std::path::PathBuf;

use log::{debug, info, warn};

use archedit_core::{
    kind::{DeclarationKind, ElementKind, IdKind},
    locator::{FileLocator, PatchResult},
    path::ElementPath,
};
use archedit_parser::{DeclarationTree, NodeId, Snippet, format, parse, parse_snippet};

use crate::{
    config::EditorConfig,
    error::{EditError, ParseOrigin},
    patch,
    plan::{self, Insertion, Plan, Wrapper},
    relationship::{self, Scope},
    resolve::{self, Resolution},
    snippet::{Declaration, Target, quote},
    store::{self, PackageFile, PackageStore},
};

/// A parsed model file.
#[derive(Debug)]
struct ModelFile {
    filename: String,
    content: String,
    tree: DeclarationTree,
}

/// Structural editor for one DSL package.
///
/// # Examples
///
/// ```rust,no_run
/// use archedit::{Editor, config::EditorConfig};
/// use archedit_core::kind::ElementKind;
///
/// let editor = Editor::new(EditorConfig::default(), "/path/to/repo", "design/model");
/// let result = editor
///     .upsert_element_by_path(
///         ElementKind::Container,
///         "Bank/API",
///         r#"Container("API", "Serves the mobile app", "Rust")"#,
///     )
///     .expect("Failed to edit model");
///
/// println!("{}", result.content);
/// ```
#[derive(Debug, Clone)]
pub struct Editor {
    config: EditorConfig,
    store: PackageStore,
}

impl Editor {
    /// Create an editor for the package `dir` of the repository rooted at
    /// `repository`.
    pub fn new(
        config: EditorConfig,
        repository: impl Into<PathBuf>,
        dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config,
            store: PackageStore::new(repository, dir),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Locator of `filename` in this package.
    pub fn locator(&self, filename: &str) -> FileLocator {
        self.store.locator(filename)
    }

    /// Replace the element at `path`, or insert it under its deepest
    /// existing ancestor.
    ///
    /// Relationships declared directly in a replaced element survive unless
    /// `code` declares a relationship to the same destination.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::InvalidArgument`] if `path` does not have the
    /// number of segments `kind` requires, [`EditError::Parse`] if `code` or
    /// a package file does not parse, and [`EditError::Io`] on file system
    /// failures.
    pub fn upsert_element_by_path(
        &self,
        kind: ElementKind,
        path: &str,
        code: &str,
    ) -> Result<PatchResult, EditError> {
        let path = ElementPath::for_kind(kind, path)?;
        let snippet = self.parse_snippet(code, DeclarationKind::Element(kind))?;
        if snippet.node().key() != Some(path.last()) {
            warn!(
                path:% = path,
                key:? = snippet.node().key();
                "Declaration key differs from the last path segment"
            );
        }

        let files = self.load()?;
        let mut ancestor: Option<(&ModelFile, NodeId, usize)> = None;
        for file in &files {
            match resolve::resolve_path(&file.tree, kind, &path) {
                Resolution::Found(node) => {
                    let merged = self.migrate(file, node, code, &snippet)?;
                    return self.replace(file, node, &merged, &snippet);
                }
                Resolution::Ancestor { node, matched } => {
                    debug!(
                        file = file.filename,
                        path:% = path,
                        ancestor = file.tree.node(node).key().unwrap_or_default(),
                        matched;
                        "Found ancestor of element"
                    );
                    if ancestor.is_none_or(|(_, _, best)| matched > best) {
                        ancestor = Some((file, node, matched));
                    }
                }
                Resolution::NotFound => {
                    debug!(file = file.filename, path:% = path; "Element not in file");
                }
            }
        }

        let wrappers = Wrapper::for_element(kind, &path);
        match ancestor {
            Some((file, node, matched)) => {
                let missing = wrappers.len().saturating_sub(matched);
                let plan = plan::plan_below(&file.tree, node, &wrappers[..missing]);
                self.insert_planned(file, &plan, wrappers.len(), code)
            }
            None => self.insert(&files, &wrappers, code),
        }
    }

    /// Replace the view or style identified by `id`, or insert it into
    /// `Views` (and `Styles`), creating the sections if needed.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::InvalidArgument`] for kinds that have no
    /// identifier (filtered views) or an empty `id`, otherwise as
    /// [`upsert_element_by_path`](Self::upsert_element_by_path).
    pub fn upsert_element_by_id(
        &self,
        kind: IdKind,
        id: &str,
        code: &str,
    ) -> Result<PatchResult, EditError> {
        if kind.key_position().is_none() {
            return Err(EditError::InvalidArgument(format!(
                "`{kind}` declarations have no identifier"
            )));
        }
        if id.trim().is_empty() {
            return Err(EditError::InvalidArgument("identifier is empty".to_string()));
        }
        let snippet = self.parse_snippet(code, kind.into())?;

        let files = self.load()?;
        for file in &files {
            if let Resolution::Found(node) = resolve::resolve_id(&file.tree, kind, id) {
                return self.replace(file, node, code, &snippet);
            }
        }

        self.insert(&files, &Wrapper::for_id(kind), code)
    }

    /// Replace the relationship from `source` to `destination`, or add it to
    /// the source element.
    ///
    /// `destination` may be written relative to the source's software system
    /// or container, as it would be inside the source's block.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::NotFound`] if the source element does not exist,
    /// or if destination verification is enabled and no element matches
    /// `destination`; otherwise as
    /// [`upsert_element_by_path`](Self::upsert_element_by_path).
    pub fn upsert_relationship(
        &self,
        source: &str,
        destination: &str,
        code: &str,
    ) -> Result<PatchResult, EditError> {
        let source = ElementPath::parse(source)?;
        let destination = ElementPath::parse(destination)?.to_string();
        let snippet = parse_snippet(code)
            .map_err(|err| EditError::new_parse_error(ParseOrigin::Snippet, err, code))?;
        if !snippet.node().kind().is_relationship() {
            warn!(found = snippet.node().function(); "Declaration is not a relationship");
        }

        let files = self.load()?;
        let (file, located) = files
            .iter()
            .find_map(|file| {
                relationship::find_relationship(&file.tree, &source, &destination)
                    .map(|located| (file, located))
            })
            .ok_or_else(|| EditError::NotFound(format!("relationship source `{source}`")))?;

        let scope = Scope::of(&file.tree, located.owner);
        if self.config.verify_destination()
            && !files
                .iter()
                .any(|f| relationship::destination_exists(&f.tree, &scope, &destination))
        {
            return Err(EditError::NotFound(format!(
                "relationship destination `{destination}`"
            )));
        }
        let written = relationship::destination(snippet.tree(), snippet.root(), &file.tree);
        if written.as_deref().is_some_and(|w| !scope.matches(w, &destination)) {
            warn!(destination, written:?; "Declaration destination differs from the requested one");
        }

        match located.existing {
            Some(node) => self.replace(file, node, code, &snippet),
            None => {
                let patched =
                    Insertion::into_node(file.tree.node(located.owner)).apply(&file.content, code);
                info!(
                    file = file.filename,
                    source:% = source,
                    state = "insert-into-ancestor";
                    "Added relationship"
                );
                self.commit(&file.filename, &patched)
            }
        }
    }

    /// Render a typed description and upsert it.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::InvalidArgument`] if the description cannot be
    /// rendered, otherwise as the upsert it dispatches to.
    pub fn upsert_declaration(&self, declaration: &Declaration) -> Result<PatchResult, EditError> {
        let code = declaration.render()?;
        match declaration.target()? {
            Target::Element { kind, path } => {
                self.upsert_element_by_path(kind, &path.to_string(), &code)
            }
            Target::Id { kind, id } => self.upsert_element_by_id(kind, &id, &code),
            Target::Relationship {
                source,
                destination,
            } => self.upsert_relationship(&source.to_string(), &destination, &code),
        }
    }

    /// Every model file of the package, as stored.
    pub fn read_package(&self) -> Result<Vec<PatchResult>, EditError> {
        Ok(self
            .store
            .load(&self.config)?
            .into_iter()
            .map(|PackageFile { filename, content }| PatchResult {
                locator: self.store.locator(&filename),
                content,
            })
            .collect())
    }

    /// Model packages of the repository, as directories relative to its
    /// root. A package is a directory with a model file importing the DSL.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Io`] if the repository root cannot be read.
    pub fn list_packages(&self) -> Result<Vec<PathBuf>, EditError> {
        store::discover_packages(self.store.repository(), &self.config)
    }

    /// Validate, format and write a whole file.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::InvalidArgument`] if `filename` is not a model
    /// file name and [`EditError::Parse`] if `content` does not parse.
    pub fn update_file(&self, filename: &str, content: &str) -> Result<PatchResult, EditError> {
        self.check_filename(filename)?;
        let formatted = format(content).map_err(|err| {
            EditError::new_parse_error(self.origin(filename), err, content)
        })?;
        let locator = self.store.write(filename, &formatted)?;
        info!(file = filename; "Updated file");
        Ok(PatchResult {
            content: formatted,
            locator,
        })
    }

    /// Create the package with an empty design in the default file.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::AlreadyExists`] if the package has model files.
    pub fn create_package(&self) -> Result<PatchResult, EditError> {
        if !self.store.list(&self.config)?.is_empty() {
            return Err(EditError::AlreadyExists(self.store.package_dir()));
        }
        let content = self.new_file(
            self.config.package_name(),
            r#"var _ = Design("model", "System architecture model", func() {})"#,
        );
        info!(dir:? = self.store.package_dir(), state = "new-file"; "Created package");
        self.commit(self.config.default_filename(), &content)
    }

    /// Canonicalise an existing file in place.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::NotFound`] if the file does not exist and
    /// [`EditError::Parse`] if it does not parse.
    pub fn format_file(&self, filename: &str) -> Result<PatchResult, EditError> {
        self.check_filename(filename)?;
        let locator = self.store.locator(filename);
        let source = self
            .store
            .read(filename)?
            .ok_or_else(|| EditError::NotFound(format!("file `{}`", locator.path().display())))?;

        let content = format(&source)
            .map_err(|err| EditError::new_parse_error(self.origin(filename), err, &source))?;
        if content != source {
            self.store.write(filename, &content)?;
            info!(file = filename; "Formatted file");
        }
        Ok(PatchResult { content, locator })
    }

    fn check_filename(&self, filename: &str) -> Result<(), EditError> {
        let plain = !filename.contains(['/', '\\']);
        if plain && self.config.is_model_file(filename) {
            Ok(())
        } else {
            Err(EditError::InvalidArgument(format!(
                "`{filename}` is not a model file name"
            )))
        }
    }

    fn origin(&self, filename: &str) -> ParseOrigin {
        ParseOrigin::File(self.store.locator(filename).path())
    }

    fn parse_snippet(&self, code: &str, expected: DeclarationKind) -> Result<Snippet, EditError> {
        let snippet = parse_snippet(code)
            .map_err(|err| EditError::new_parse_error(ParseOrigin::Snippet, err, code))?;
        let found = snippet.node().kind();
        if found != expected {
            warn!(
                expected:% = expected,
                found = snippet.node().function();
                "Declaration kind differs from the requested kind"
            );
        }
        Ok(snippet)
    }

    fn load(&self) -> Result<Vec<ModelFile>, EditError> {
        self.store
            .load(&self.config)?
            .into_iter()
            .map(|PackageFile { filename, content }| {
                let tree = parse(&content).map_err(|err| {
                    EditError::new_parse_error(self.origin(&filename), err, content.as_str())
                })?;
                Ok::<_, EditError>(ModelFile {
                    filename,
                    content,
                    tree,
                })
            })
            .collect()
    }

    /// Carry the relationships of `node` into `code`. The merged code must
    /// still be a single declaration.
    fn migrate(
        &self,
        file: &ModelFile,
        node: NodeId,
        code: &str,
        snippet: &Snippet,
    ) -> Result<String, EditError> {
        let merged = relationship::migrate(&file.content, &file.tree, node, code, snippet);
        if merged != code {
            parse_snippet(&merged).map_err(|err| EditError::Invariant {
                path: self.store.locator(&file.filename).path(),
                err,
                src: merged.clone(),
            })?;
        }
        Ok(merged)
    }

    fn replace(
        &self,
        file: &ModelFile,
        node: NodeId,
        code: &str,
        snippet: &Snippet,
    ) -> Result<PatchResult, EditError> {
        let target = file.tree.node(node);
        // A binding in the code replaces the old one, otherwise the old one stays.
        let span = if snippet.node().binding().is_some() {
            target.statement_span()
        } else {
            target.span()
        };

        let patched = patch::apply(&file.content, span, code);
        info!(
            file = file.filename,
            target = target.function(),
            key:? = target.key(),
            state = "replace";
            "Replaced declaration"
        );
        self.commit(&file.filename, &patched)
    }

    /// Insert `code` where the chain of `wrappers` ends, preferring the file
    /// with the fewest missing links, then the default file, then filename
    /// order.
    fn insert(
        &self,
        files: &[ModelFile],
        wrappers: &[Wrapper],
        code: &str,
    ) -> Result<PatchResult, EditError> {
        let default = self.config.default_filename();
        let best = files
            .iter()
            .filter_map(|file| plan::plan_insertion(&file.tree, wrappers).map(|plan| (file, plan)))
            .min_by_key(|(file, plan)| (plan.missing().len(), file.filename != default));

        let Some((file, plan)) = best else {
            return self.insert_design(files, wrappers, code);
        };
        self.insert_planned(file, &plan, wrappers.len(), code)
    }

    /// Apply `plan`, made for a chain of `links` wrappers, to `file`.
    fn insert_planned(
        &self,
        file: &ModelFile,
        plan: &Plan,
        links: usize,
        code: &str,
    ) -> Result<PatchResult, EditError> {
        let patched = plan.apply(&file.content, code);
        let state = if plan.missing().len() < links {
            "insert-into-ancestor"
        } else {
            "insert-top-level"
        };
        let missing: Vec<DeclarationKind> = plan.missing().iter().map(Wrapper::kind).collect();
        info!(
            file = file.filename,
            anchor = file.tree.node(plan.anchor()).function(),
            offset = plan.insertion().span().start(),
            missing:?,
            state;
            "Inserted declaration"
        );
        self.commit(&file.filename, &patched)
    }

    /// No file has a `Design`: add one holding `code` to the default file,
    /// creating the file if needed.
    fn insert_design(
        &self,
        files: &[ModelFile],
        wrappers: &[Wrapper],
        code: &str,
    ) -> Result<PatchResult, EditError> {
        let design = format!(
            "var _ = Design(func() {{\n{}\n}})",
            plan::wrap(code, wrappers)
        );
        let default = self.config.default_filename();

        let patched = match files.iter().find(|f| f.filename == default) {
            Some(file) => format!("{}\n\n{design}\n", file.content.trim_end()),
            None => {
                let package = files
                    .first()
                    .map_or(self.config.package_name(), |f| f.tree.package());
                self.new_file(package, &design)
            }
        };

        info!(file = default, state = "new-file"; "Created design");
        self.commit(default, &patched)
    }

    fn new_file(&self, package: &str, body: &str) -> String {
        format!(
            "package {package}\n\nimport . {}\n\n{body}\n",
            quote(self.config.dsl_import())
        )
    }

    /// Format `patched` and write it to `filename`. Output that no longer
    /// parses is an editor bug and is never written.
    fn commit(&self, filename: &str, patched: &str) -> Result<PatchResult, EditError> {
        let content = format(patched).map_err(|err| EditError::Invariant {
            path: self.store.locator(filename).path(),
            err,
            src: patched.to_string(),
        })?;
        let locator = self.store.write(filename, &content)?;
        Ok(PatchResult { content, locator })
    }
}
