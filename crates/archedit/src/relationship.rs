//! Relationship lookup and migration.
//!
//! Relationships are declared as direct children of their source element:
//!
//! ```text
//! Container("API", func() {
//!     Uses("Database", "Reads from")
//! })
//! ```
//!
//! Inside a software system or container, destinations may be written
//! relative to the enclosing scope (`"Database"` for `"Bank/Database"`), so
//! destinations are compared after qualifying them with the owner's scope.

use log::debug;

use archedit_core::{kind::ElementKind, path::ElementPath};
use archedit_parser::{Arg, DeclarationTree, NodeId, Snippet};

use crate::{plan::Insertion, resolve};

/// Keys of the software system and container enclosing an owner, used to
/// qualify relative destinations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    system: Option<String>,
    container: Option<String>,
}

impl Scope {
    /// Scope of relationships declared directly in `owner`.
    pub fn of(tree: &DeclarationTree, owner: NodeId) -> Self {
        let keys = tree.element_path(owner).unwrap_or_default();
        match tree.node(owner).kind().element() {
            Some(ElementKind::SoftwareSystem) => Self {
                system: keys.first().cloned(),
                container: None,
            },
            Some(ElementKind::Container) | Some(ElementKind::Component) => Self {
                system: keys.first().cloned(),
                container: keys.get(1).cloned(),
            },
            Some(ElementKind::Person) | None => Self::default(),
        }
    }

    /// Whether a relationship destination written in this scope denotes
    /// `destination`.
    pub fn matches(&self, written: &str, destination: &str) -> bool {
        if written == destination {
            return true;
        }
        let either = |prefix: &str| {
            written == format!("{prefix}/{destination}")
                || format!("{prefix}/{written}") == destination
        };
        match (&self.system, &self.container) {
            (Some(system), Some(container)) => {
                either(system) || either(container) || either(&format!("{system}/{container}"))
            }
            (Some(system), None) => either(system),
            _ => false,
        }
    }

    /// Absolute paths `destination` may denote from this scope, most
    /// specific first.
    pub fn candidates(&self, destination: &str) -> Vec<String> {
        let mut out = Vec::new();
        if let (Some(system), Some(container)) = (&self.system, &self.container) {
            out.push(format!("{system}/{container}/{destination}"));
        }
        if let Some(system) = &self.system {
            out.push(format!("{system}/{destination}"));
        }
        out.push(destination.to_string());
        out
    }
}

/// Destination of the relationship `id` as written, with identifiers
/// resolved through `var` bindings of `bindings`.
pub fn destination(
    tree: &DeclarationTree,
    id: NodeId,
    bindings: &DeclarationTree,
) -> Option<String> {
    match tree.node(id).args().first()?.inner() {
        Arg::String(key) => Some(key.clone()),
        Arg::Name(name) => {
            let bound = bindings.resolve_binding(name)?;
            bindings.element_path(bound).map(|keys| keys.join("/"))
        }
        Arg::Func | Arg::Other => None,
    }
}

/// Direct relationship children of `id`, in document order. Relationships
/// declared inside loops or helper functions are not direct.
pub fn direct_relationships(tree: &DeclarationTree, id: NodeId) -> Vec<NodeId> {
    tree.children(id)
        .iter()
        .copied()
        .filter(|&child| {
            let node = tree.node(child);
            node.kind().is_relationship() && !node.is_nested()
        })
        .collect()
}

/// Element owning relationships declared for `source`: a software system or
/// person for one key, a container for two, a component for three.
pub fn find_owner(tree: &DeclarationTree, source: &ElementPath) -> Option<NodeId> {
    resolve::resolve_element(tree, source)
}

/// Owner of a relationship and the matching existing declaration, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located {
    pub owner: NodeId,
    pub existing: Option<NodeId>,
}

/// Find the relationship from `source` to `destination`.
///
/// Only direct children of the owner are considered; relationships of
/// nested elements belong to those elements. Returns `None` when the owner
/// does not exist.
pub fn find_relationship(
    tree: &DeclarationTree,
    source: &ElementPath,
    destination_path: &str,
) -> Option<Located> {
    let owner = find_owner(tree, source)?;
    let scope = Scope::of(tree, owner);

    let existing = direct_relationships(tree, owner).into_iter().find(|&rel| {
        destination(tree, rel, tree)
            .is_some_and(|written| scope.matches(&written, destination_path))
    });

    debug!(
        source:% = source,
        destination = destination_path,
        existing:? = existing;
        "Located relationship"
    );
    Some(Located { owner, existing })
}

/// Whether `destination` names an element of `tree` when written in `scope`.
pub fn destination_exists(tree: &DeclarationTree, scope: &Scope, destination: &str) -> bool {
    scope.candidates(destination).iter().any(|candidate| {
        ElementPath::parse(candidate)
            .is_ok_and(|path| resolve::resolve_element(tree, &path).is_some())
    })
}

/// Carry the relationships of `old` over into its replacement `code`.
///
/// Relationships declared directly in `old` are appended verbatim to the
/// replacement's block, in their original order, unless the replacement
/// declares a relationship to the same destination. Relationships of
/// elements nested in `old` are left alone. Returns `code` unchanged when
/// nothing needs to move; the result must be re-parsed by the caller.
pub fn migrate(
    source: &str,
    tree: &DeclarationTree,
    old: NodeId,
    code: &str,
    snippet: &Snippet,
) -> String {
    let scope = Scope::of(tree, old);

    let replaced: Vec<String> = direct_relationships(snippet.tree(), snippet.root())
        .into_iter()
        .filter_map(|rel| destination(snippet.tree(), rel, tree))
        .collect();

    let carried: Vec<&str> = direct_relationships(tree, old)
        .into_iter()
        .filter(|&rel| {
            let Some(written) = destination(tree, rel, tree) else {
                return true;
            };
            !replaced
                .iter()
                .any(|new| scope.matches(&written, new) || scope.matches(new, &written))
        })
        .map(|rel| &source[tree.node(rel).statement_span().range()])
        .collect();

    debug!(
        old = tree.node(old).key().unwrap_or_default(),
        carried = carried.len();
        "Migrating relationships"
    );

    if carried.is_empty() {
        return code.to_string();
    }

    Insertion::into_node(snippet.node()).apply(code, &carried.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use archedit_parser::{parse, parse_snippet};

    const MODEL: &str = r#"package model

var _ = Design(func() {
	var Mainframe = SoftwareSystem("Mainframe")
	SoftwareSystem("Bank", func() {
		Uses("Other", "Sends")
		Uses(Mainframe, "Reads")
		Container("API", func() {
			Uses("Database", "Queries")
			Uses("Bank/Cache", "Caches")
		})
		Container("Database")
		Container("Cache")
	})
	SoftwareSystem("Other")
})
"#;

    fn path(s: &str) -> ElementPath {
        ElementPath::parse(s).unwrap()
    }

    #[test]
    fn test_scope_matching() {
        let scope = Scope {
            system: Some("Bank".into()),
            container: Some("API".into()),
        };
        assert!(scope.matches("Database", "Database"));
        assert!(scope.matches("Database", "Bank/Database"));
        assert!(scope.matches("Bank/Database", "Database"));
        assert!(scope.matches("Ledger", "Bank/API/Ledger"));
        assert!(scope.matches("Ledger", "API/Ledger"));
        assert!(!scope.matches("Database", "Shop/Database"));

        assert!(!Scope::default().matches("Database", "Bank/Database"));
    }

    #[test]
    fn test_find_existing_relationship() {
        let tree = parse(MODEL).unwrap();
        let located = find_relationship(&tree, &path("Bank/API"), "Bank/Database").unwrap();
        let existing = located.existing.unwrap();
        assert_eq!(tree.node(existing).key(), Some("Queries"));

        let located = find_relationship(&tree, &path("Bank/API"), "Cache").unwrap();
        assert_eq!(tree.node(located.existing.unwrap()).key(), Some("Caches"));
    }

    #[test]
    fn test_scan_is_not_recursive() {
        let tree = parse(MODEL).unwrap();
        let located = find_relationship(&tree, &path("Bank"), "Bank/Database").unwrap();
        assert_eq!(located.existing, None);
        assert_eq!(tree.node(located.owner).key(), Some("Bank"));
    }

    #[test]
    fn test_identifier_destination() {
        let tree = parse(MODEL).unwrap();
        let located = find_relationship(&tree, &path("Bank"), "Mainframe").unwrap();
        assert_eq!(tree.node(located.existing.unwrap()).key(), Some("Reads"));
    }

    #[test]
    fn test_matching_picks_the_right_relationship() {
        let tree = parse(MODEL).unwrap();
        let located = find_relationship(&tree, &path("Bank"), "Other").unwrap();
        assert_eq!(tree.node(located.existing.unwrap()).key(), Some("Sends"));
    }

    #[test]
    fn test_missing_owner() {
        let tree = parse(MODEL).unwrap();
        assert!(find_relationship(&tree, &path("Shop"), "Bank").is_none());
    }

    #[test]
    fn test_destination_exists() {
        let tree = parse(MODEL).unwrap();
        let api = find_owner(&tree, &path("Bank/API")).unwrap();
        let scope = Scope::of(&tree, api);
        assert!(destination_exists(&tree, &scope, "Database"));
        assert!(destination_exists(&tree, &scope, "Other"));
        assert!(!destination_exists(&tree, &scope, "Ledger"));
    }

    #[test]
    fn test_migrate_appends_into_block() {
        let tree = parse(MODEL).unwrap();
        let bank = find_owner(&tree, &path("Bank")).unwrap();
        let code = "SoftwareSystem(\"Bank\", func() {\n\tTag(\"core\")\n})";
        let snippet = parse_snippet(code).unwrap();

        let merged = migrate(MODEL, &tree, bank, code, &snippet);
        assert_eq!(
            merged,
            "SoftwareSystem(\"Bank\", func() {\n\tTag(\"core\")\nUses(\"Other\", \"Sends\")\nUses(Mainframe, \"Reads\")\n})"
        );
    }

    #[test]
    fn test_migrate_synthesizes_block() {
        let tree = parse(MODEL).unwrap();
        let bank = find_owner(&tree, &path("Bank")).unwrap();
        let code = "SoftwareSystem(\"Bank\", \"The bank\")";
        let snippet = parse_snippet(code).unwrap();

        let merged = migrate(MODEL, &tree, bank, code, &snippet);
        assert_eq!(
            merged,
            "SoftwareSystem(\"Bank\", \"The bank\", func() {\nUses(\"Other\", \"Sends\")\nUses(Mainframe, \"Reads\")\n})"
        );
        assert!(parse_snippet(&merged).is_ok());
    }

    #[test]
    fn test_migrate_excludes_redeclared_destinations() {
        let tree = parse(MODEL).unwrap();
        let bank = find_owner(&tree, &path("Bank")).unwrap();
        let code = "SoftwareSystem(\"Bank\", func() {\n\tUses(\"Other\", \"Calls\")\n\tUses(\"Mainframe\", \"Writes\")\n})";
        let snippet = parse_snippet(code).unwrap();

        assert_eq!(migrate(MODEL, &tree, bank, code, &snippet), code);
    }

    #[test]
    fn test_migrate_leaves_loop_relationships() {
        let source = "package model\n\nvar _ = Design(func() {\n\tSoftwareSystem(\"Bank\", func() {\n\t\tUses(\"Other\", \"Sends\")\n\t\tfor _, name := range names {\n\t\t\tUses(name, \"Calls\")\n\t\t}\n\t})\n})\n";
        let tree = parse(source).unwrap();
        let bank = find_owner(&tree, &path("Bank")).unwrap();
        assert_eq!(tree.children(bank).len(), 2);
        assert_eq!(direct_relationships(&tree, bank).len(), 1);

        let code = "SoftwareSystem(\"Bank\")";
        let snippet = parse_snippet(code).unwrap();
        assert_eq!(
            migrate(source, &tree, bank, code, &snippet),
            "SoftwareSystem(\"Bank\", func() {\nUses(\"Other\", \"Sends\")\n})"
        );
    }

    #[test]
    fn test_migrate_nothing_to_carry() {
        let tree = parse(MODEL).unwrap();
        let cache = find_owner(&tree, &path("Bank/Cache")).unwrap();
        let code = "Container(\"Cache\", \"Redis\")";
        let snippet = parse_snippet(code).unwrap();

        assert_eq!(migrate(MODEL, &tree, cache, code, &snippet), code);
    }
}
