//! Path and identifier resolution.
//!
//! A path `System/Container/Component` matches a chain of nested element
//! declarations whose kinds follow the path depth. Resolution reports either
//! the terminal node or the deepest element of the chain that exists.

use archedit_core::{
    kind::{DeclarationKind, ElementKind, IdKind},
    path::ElementPath,
};
use archedit_parser::{DeclarationNode, DeclarationTree, NodeId};

/// Outcome of resolving a path or identifier in one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The requested declaration exists.
    Found(NodeId),
    /// Only the first `matched` keys of the path exist; `node` is the
    /// element matched by the last of them.
    Ancestor { node: NodeId, matched: usize },
    NotFound,
}

/// Element kinds along a path ending in `kind`, outermost first.
fn kind_chain(kind: ElementKind) -> Vec<ElementKind> {
    let mut chain: Vec<ElementKind> = std::iter::successors(Some(kind), |k| k.parent()).collect();
    chain.reverse();
    chain
}

fn is_element(node: &DeclarationNode, kind: ElementKind, key: &str) -> bool {
    node.kind() == DeclarationKind::Element(kind) && node.key() == Some(key)
}

/// Resolve `path` to an element of `kind`.
///
/// The first key is searched in the whole tree, later keys among the direct
/// children of the previous match. The first match in document order wins.
pub fn resolve_path(tree: &DeclarationTree, kind: ElementKind, path: &ElementPath) -> Resolution {
    let chain = kind_chain(kind);
    let mut current: Option<NodeId> = None;

    for (depth, (key, kind)) in path.keys().iter().zip(&chain).enumerate() {
        let found = match current {
            None => tree.find(|n| is_element(n, *kind, key)),
            Some(parent) => tree.find_child(parent, |n| is_element(n, *kind, key)),
        };
        match (found, current) {
            (Some(node), _) => current = Some(node),
            (None, Some(node)) => return Resolution::Ancestor { node, matched: depth },
            (None, None) => return Resolution::NotFound,
        }
    }

    match current {
        Some(node) if path.len() == chain.len() => Resolution::Found(node),
        Some(node) => Resolution::Ancestor {
            node,
            matched: path.len().min(chain.len()),
        },
        None => Resolution::NotFound,
    }
}

/// Resolve an element path of any kind, trying the kinds valid at its depth
/// in order (software systems before people at depth one).
pub fn resolve_element(tree: &DeclarationTree, path: &ElementPath) -> Option<NodeId> {
    ElementKind::at_depth(path.len())
        .iter()
        .find_map(|&kind| match resolve_path(tree, kind, path) {
            Resolution::Found(node) => Some(node),
            _ => None,
        })
}

/// Resolve a view or style by its identifier.
pub fn resolve_id(tree: &DeclarationTree, kind: IdKind, id: &str) -> Resolution {
    let kind = DeclarationKind::from(kind);
    tree.find(|n| n.kind() == kind && n.identifier() == Some(id))
        .map_or(Resolution::NotFound, Resolution::Found)
}
