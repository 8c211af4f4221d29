//! Declaration kinds of the architecture model DSL.
//!
//! Every call the editor knows how to address maps to one variant of
//! [`DeclarationKind`]. Calls it does not address (`Tag`, `Description`,
//! `AddAll`, ...) map to [`DeclarationKind::Other`] and are carried through
//! untouched.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a name does not denote the requested kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {expected} kind `{name}`")]
pub struct KindError {
    expected: &'static str,
    name: String,
}

impl KindError {
    fn new(expected: &'static str, name: &str) -> Self {
        Self {
            expected,
            name: name.to_string(),
        }
    }

    /// The rejected name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Model elements addressable by a slash-separated path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Person,
    SoftwareSystem,
    Container,
    Component,
}

impl ElementKind {
    /// DSL function declaring this element.
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::Person => "Person",
            Self::SoftwareSystem => "SoftwareSystem",
            Self::Container => "Container",
            Self::Component => "Component",
        }
    }

    /// Number of path segments addressing an element of this kind.
    ///
    /// People and software systems live directly in the design, containers
    /// inside a software system and components inside a container.
    pub fn path_len(&self) -> usize {
        match self {
            Self::Person | Self::SoftwareSystem => 1,
            Self::Container => 2,
            Self::Component => 3,
        }
    }

    /// Kind of the enclosing element, if any.
    pub fn parent(&self) -> Option<ElementKind> {
        match self {
            Self::Person | Self::SoftwareSystem => None,
            Self::Container => Some(Self::SoftwareSystem),
            Self::Component => Some(Self::Container),
        }
    }

    /// Kinds that may sit at the given path depth (1-based).
    pub fn at_depth(depth: usize) -> &'static [ElementKind] {
        match depth {
            1 => &[Self::SoftwareSystem, Self::Person],
            2 => &[Self::Container],
            3 => &[Self::Component],
            _ => &[],
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.function_name())
    }
}

impl FromStr for ElementKind {
    type Err = KindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Person" => Ok(Self::Person),
            "SoftwareSystem" | "System" => Ok(Self::SoftwareSystem),
            "Container" => Ok(Self::Container),
            "Component" => Ok(Self::Component),
            _ => Err(KindError::new("element", s)),
        }
    }
}

/// Diagram views declared inside `Views`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    SystemLandscape,
    SystemContext,
    Container,
    Component,
    Filtered,
    Dynamic,
    Deployment,
}

impl ViewKind {
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::SystemLandscape => "SystemLandscapeView",
            Self::SystemContext => "SystemContextView",
            Self::Container => "ContainerView",
            Self::Component => "ComponentView",
            Self::Filtered => "FilteredView",
            Self::Dynamic => "DynamicView",
            Self::Deployment => "DeploymentView",
        }
    }

    /// Index of the argument holding the view key.
    ///
    /// Filtered views reference another view and carry no key of their own.
    pub fn key_position(&self) -> Option<usize> {
        match self {
            Self::SystemLandscape => Some(0),
            Self::SystemContext | Self::Container | Self::Component | Self::Dynamic => Some(1),
            Self::Deployment => Some(2),
            Self::Filtered => None,
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.function_name())
    }
}

impl FromStr for ViewKind {
    type Err = KindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SystemLandscapeView" => Ok(Self::SystemLandscape),
            "SystemContextView" => Ok(Self::SystemContext),
            "ContainerView" => Ok(Self::Container),
            "ComponentView" => Ok(Self::Component),
            "FilteredView" => Ok(Self::Filtered),
            "DynamicView" => Ok(Self::Dynamic),
            "DeploymentView" => Ok(Self::Deployment),
            _ => Err(KindError::new("view", s)),
        }
    }
}

/// Styles declared inside `Views(func() { Styles(...) })`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleKind {
    Element,
    Relationship,
}

impl StyleKind {
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::Element => "ElementStyle",
            Self::Relationship => "RelationshipStyle",
        }
    }
}

impl fmt::Display for StyleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.function_name())
    }
}

impl FromStr for StyleKind {
    type Err = KindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ElementStyle" => Ok(Self::Element),
            "RelationshipStyle" => Ok(Self::Relationship),
            _ => Err(KindError::new("style", s)),
        }
    }
}

/// Relationship declarations nested directly under their source element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    #[default]
    Uses,
    Delivers,
    InteractsWith,
}

impl RelationshipKind {
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::Uses => "Uses",
            Self::Delivers => "Delivers",
            Self::InteractsWith => "InteractsWith",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.function_name())
    }
}

impl FromStr for RelationshipKind {
    type Err = KindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Uses" => Ok(Self::Uses),
            "Delivers" => Ok(Self::Delivers),
            "InteractsWith" => Ok(Self::InteractsWith),
            _ => Err(KindError::new("relationship", s)),
        }
    }
}

/// Kinds addressable by identifier rather than by path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    View(ViewKind),
    Style(StyleKind),
}

impl IdKind {
    /// Index of the argument holding the identifier, `None` if the kind
    /// cannot be addressed.
    pub fn key_position(&self) -> Option<usize> {
        match self {
            Self::View(view) => view.key_position(),
            Self::Style(_) => Some(0),
        }
    }
}

impl From<IdKind> for DeclarationKind {
    fn from(kind: IdKind) -> Self {
        match kind {
            IdKind::View(view) => Self::View(view),
            IdKind::Style(style) => Self::Style(style),
        }
    }
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::View(view) => view.fmt(f),
            Self::Style(style) => style.fmt(f),
        }
    }
}

impl FromStr for IdKind {
    type Err = KindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(view) = s.parse() {
            return Ok(Self::View(view));
        }
        s.parse()
            .map(Self::Style)
            .map_err(|_| KindError::new("view or style", s))
    }
}

/// Kind of a parsed declaration node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    /// The `Design` (or `Workspace`) root.
    Design,
    Element(ElementKind),
    Views,
    Styles,
    View(ViewKind),
    Style(StyleKind),
    Relationship(RelationshipKind),
    /// Any call the editor does not address.
    Other,
}

impl DeclarationKind {
    /// Classify a call by its function name.
    pub fn from_function_name(name: &str) -> Self {
        match name {
            "Design" | "Workspace" => Self::Design,
            "Views" => Self::Views,
            "Styles" => Self::Styles,
            _ => {
                if let Ok(element) = ElementKind::from_str(name) {
                    // `System` is only a CLI alias.
                    if name != "System" {
                        return Self::Element(element);
                    }
                }
                if let Ok(view) = ViewKind::from_str(name) {
                    return Self::View(view);
                }
                if let Ok(style) = StyleKind::from_str(name) {
                    return Self::Style(style);
                }
                if let Ok(relationship) = RelationshipKind::from_str(name) {
                    return Self::Relationship(relationship);
                }
                Self::Other
            }
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element(_))
    }

    pub fn is_relationship(&self) -> bool {
        matches!(self, Self::Relationship(_))
    }

    /// The element kind, if this is an element declaration.
    pub fn element(&self) -> Option<ElementKind> {
        match self {
            Self::Element(kind) => Some(*kind),
            _ => None,
        }
    }
}

impl From<ElementKind> for DeclarationKind {
    fn from(kind: ElementKind) -> Self {
        Self::Element(kind)
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Design => f.write_str("Design"),
            Self::Element(kind) => kind.fmt(f),
            Self::Views => f.write_str("Views"),
            Self::Styles => f.write_str("Styles"),
            Self::View(kind) => kind.fmt(f),
            Self::Style(kind) => kind.fmt(f),
            Self::Relationship(kind) => kind.fmt(f),
            Self::Other => f.write_str("declaration"),
        }
    }
}
