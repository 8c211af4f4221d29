//! Insertion planning.
//!
//! Every addressable declaration lives under a fixed chain of enclosing
//! declarations below `Design`: views under `Views`, styles under `Styles`
//! under `Views`, containers under their software system, and so on. The
//! chain is described by a list of [`Wrapper`]s, innermost first. Planning
//! walks the chain down from `Design`, inserts into the innermost link that
//! exists, and wraps the new code in the links that do not.

use log::debug;

use archedit_core::{
    kind::{DeclarationKind, ElementKind, IdKind},
    path::ElementPath,
};
use archedit_parser::{DeclarationNode, DeclarationTree, NodeId, Span};

use crate::{patch, snippet::quote};

/// An enclosing declaration a new declaration requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wrapper {
    kind: DeclarationKind,
    key: Option<String>,
    open: String,
    close: &'static str,
}

impl Wrapper {
    fn section(kind: DeclarationKind) -> Self {
        Self {
            kind,
            key: None,
            open: format!("{kind}(func() {{"),
            close: "})",
        }
    }

    fn element(kind: ElementKind, key: &str) -> Self {
        Self {
            kind: DeclarationKind::Element(kind),
            key: Some(key.to_string()),
            open: format!("{kind}({}, func() {{", quote(key)),
            close: "})",
        }
    }

    /// Enclosing declarations of an element at `path`, innermost first.
    pub fn for_element(kind: ElementKind, path: &ElementPath) -> Vec<Wrapper> {
        let keys = path.keys();
        match kind {
            ElementKind::Person | ElementKind::SoftwareSystem => Vec::new(),
            ElementKind::Container => vec![Self::element(ElementKind::SoftwareSystem, &keys[0])],
            ElementKind::Component => vec![
                Self::element(ElementKind::Container, &keys[1]),
                Self::element(ElementKind::SoftwareSystem, &keys[0]),
            ],
        }
    }

    /// Enclosing declarations of a view or style, innermost first.
    pub fn for_id(kind: IdKind) -> Vec<Wrapper> {
        match kind {
            IdKind::View(_) => vec![Self::section(DeclarationKind::Views)],
            IdKind::Style(_) => vec![
                Self::section(DeclarationKind::Styles),
                Self::section(DeclarationKind::Views),
            ],
        }
    }

    pub fn kind(&self) -> DeclarationKind {
        self.kind
    }

    fn matches(&self, node: &DeclarationNode) -> bool {
        node.kind() == self.kind
            && self
                .key
                .as_deref()
                .is_none_or(|key| node.key() == Some(key))
    }

    fn wrap(&self, code: &str) -> String {
        format!("{}\n{}\n{}", self.open, code.trim(), self.close)
    }
}

/// Wrap `code` in `wrappers`, innermost first.
pub fn wrap(code: &str, wrappers: &[Wrapper]) -> String {
    wrappers
        .iter()
        .fold(code.trim().to_string(), |code, wrapper| wrapper.wrap(&code))
}

/// Where new code goes relative to the anchor declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// Insert as a statement at `offset` inside the anchor's block.
    Statement { offset: usize },
    /// The anchor has no block; add one as its last argument.
    NewBlock {
        close_paren: usize,
        trailing_comma: bool,
    },
}

impl Insertion {
    /// Insertion of a new direct child of `node`.
    pub fn into_node(node: &DeclarationNode) -> Self {
        match node.block_close() {
            Some(offset) => Self::Statement { offset },
            None => Self::NewBlock {
                close_paren: node.close_paren(),
                trailing_comma: node.trailing_comma(),
            },
        }
    }

    /// Span replaced by [`text`](Self::text); always empty.
    pub fn span(&self) -> Span {
        match *self {
            Self::Statement { offset } => Span::empty(offset),
            Self::NewBlock { close_paren, .. } => Span::empty(close_paren),
        }
    }

    /// Text to splice for `code`.
    pub fn text(&self, code: &str) -> String {
        match *self {
            Self::Statement { .. } => code.trim().to_string(),
            Self::NewBlock { trailing_comma, .. } => {
                let separator = if trailing_comma { " " } else { ", " };
                format!("{separator}func() {{\n{}\n}}", code.trim())
            }
        }
    }

    /// Insert `code` into `source`. Statements are separated from their
    /// neighbours by line breaks; a new block is spliced verbatim.
    pub fn apply(&self, source: &str, code: &str) -> String {
        match self {
            Self::Statement { .. } => patch::apply(source, self.span(), code),
            Self::NewBlock { .. } => patch::splice(source, self.span(), &self.text(code)),
        }
    }
}

/// Planned insertion of new code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// Innermost existing link of the chain, possibly `Design` itself.
    anchor: NodeId,
    insertion: Insertion,
    /// Links missing below the anchor, innermost first.
    missing: Vec<Wrapper>,
}

impl Plan {
    pub fn anchor(&self) -> NodeId {
        self.anchor
    }

    pub fn insertion(&self) -> Insertion {
        self.insertion
    }

    pub fn missing(&self) -> &[Wrapper] {
        &self.missing
    }

    /// Insert `code`, wrapped in the missing links, into `source`.
    pub fn apply(&self, source: &str, code: &str) -> String {
        self.insertion.apply(source, &wrap(code, &self.missing))
    }
}

/// The first top-level `Design` declaration.
pub fn design(tree: &DeclarationTree) -> Option<NodeId> {
    tree.roots()
        .iter()
        .copied()
        .find(|&id| tree.node(id).kind() == DeclarationKind::Design)
}

/// Plan insertion of a declaration requiring `wrappers`.
///
/// The outermost element link is searched in the whole tree and later links
/// among the children of the previous one, the way paths are resolved.
/// Sections are searched below `Design`. Returns `None` when the tree has no
/// `Design`. Model elements inserted directly into `Design` go before its
/// first `Views` so views stay last.
pub fn plan_insertion(tree: &DeclarationTree, wrappers: &[Wrapper]) -> Option<Plan> {
    let design = design(tree)?;
    let mut anchor = design;
    let mut missing = wrappers.len();

    for wrapper in wrappers.iter().rev() {
        let found = if anchor == design && wrapper.key.is_some() {
            tree.find(|n| wrapper.matches(n))
        } else {
            tree.find_child(anchor, |n| wrapper.matches(n))
        };
        match found {
            Some(child) => {
                anchor = child;
                missing -= 1;
            }
            None => break,
        }
    }

    let in_views = wrappers
        .last()
        .is_some_and(|w| w.kind == DeclarationKind::Views);
    let before_views = missing == wrappers.len() && !in_views;
    Some(plan(tree, anchor, &wrappers[..missing], before_views))
}

/// Plan insertion below `anchor`, an existing link of the chain already
/// resolved by the caller, wrapped in `missing` (innermost first).
pub fn plan_below(tree: &DeclarationTree, anchor: NodeId, missing: &[Wrapper]) -> Plan {
    plan(tree, anchor, missing, false)
}

fn plan(tree: &DeclarationTree, anchor: NodeId, missing: &[Wrapper], before_views: bool) -> Plan {
    let views = tree.find_child(anchor, |n| n.kind() == DeclarationKind::Views);
    let insertion = match views {
        Some(views) if before_views => Insertion::Statement {
            offset: tree.node(views).statement_span().start(),
        },
        _ => Insertion::into_node(tree.node(anchor)),
    };

    debug!(
        anchor = tree.node(anchor).function(),
        missing = missing.len(),
        offset = insertion.span().start();
        "Planned insertion"
    );

    Plan {
        anchor,
        insertion,
        missing: missing.to_vec(),
    }
}
