//! Typed declaration descriptions and their canonical DSL code.
//!
//! Callers that do not want to write DSL by hand describe a declaration with
//! one of the snippet types below (usually deserialized from TOML or JSON as
//! a [`Declaration`]) and hand the rendered code to the matching upsert.
//!
//! # Example
//!
//! ```
//! # use archedit::snippet::{ContainerSnippet, Declaration};
//! let container = ContainerSnippet {
//!     system: "Bank".to_string(),
//!     name: "API".to_string(),
//!     technology: Some("Rust".to_string()),
//!     ..Default::default()
//! };
//! let code = Declaration::Container(container).render().unwrap();
//! assert_eq!(code, r#"Container("API", "", "Rust")"#);
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use archedit_core::{
    kind::{ElementKind, IdKind, RelationshipKind, StyleKind, ViewKind},
    path::{ElementPath, PathError},
};

/// Error returned when a description cannot be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnippetError {
    #[error("{kind} requires `{field}`")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("`{0}` is not a DSL identifier")]
    InvalidIdentifier(String),

    #[error("`{0}` has no key and cannot be described")]
    Unaddressable(ViewKind),

    #[error(transparent)]
    Path(#[from] PathError),
}

/// Quote `s` as a Go interpreted string literal.
pub(crate) fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() && u32::from(c) < 0x80 => {
                out.push_str(&format!("\\x{:02x}", u32::from(c)));
            }
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn identifier(value: &str) -> Result<&str, SnippetError> {
    let mut chars = value.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(value)
    } else {
        Err(SnippetError::InvalidIdentifier(value.to_string()))
    }
}

/// Builder for one call expression with an optional trailing block.
///
/// Positional arguments that are absent but followed by a present one are
/// written as `""`; trailing absent arguments are dropped. The block is only
/// emitted when it has statements.
#[derive(Debug)]
struct Call {
    function: String,
    args: Vec<Option<String>>,
    body: Vec<String>,
}

impl Call {
    fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            args: Vec::new(),
            body: Vec::new(),
        }
    }

    fn string(mut self, value: &str) -> Self {
        self.args.push(Some(quote(value)));
        self
    }

    fn optional(mut self, value: Option<&str>) -> Self {
        self.args.push(value.map(quote));
        self
    }

    fn expr(mut self, value: Option<String>) -> Self {
        self.args.push(value);
        self
    }

    fn stmt(mut self, stmt: impl Into<String>) -> Self {
        self.body.push(stmt.into());
        self
    }

    fn stmt_if(self, condition: bool, stmt: &str) -> Self {
        if condition { self.stmt(stmt) } else { self }
    }

    fn string_stmt(self, function: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => {
                let stmt = Call::new(function).string(value).render();
                self.stmt(stmt)
            }
            None => self,
        }
    }

    fn number_stmt(self, function: &str, value: Option<u32>) -> Self {
        match value {
            Some(value) => self.stmt(format!("{function}({value})")),
            None => self,
        }
    }

    fn render(self) -> String {
        let present = self.args.iter().rposition(Option::is_some).map_or(0, |i| i + 1);
        let mut parts: Vec<String> = self
            .args
            .into_iter()
            .take(present)
            .map(|arg| arg.unwrap_or_else(|| quote("")))
            .collect();

        if !self.body.is_empty() {
            let body: Vec<String> = self
                .body
                .iter()
                .flat_map(|stmt| stmt.lines())
                .map(|line| format!("\t{line}"))
                .collect();
            parts.push(format!("func() {{\n{}\n}}", body.join("\n")));
        }

        format!("{}({})", self.function, parts.join(", "))
    }
}

/// Tags, link and free-form properties shared by model elements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementProperties {
    pub tags: Vec<String>,
    pub url: Option<String>,
    pub properties: IndexMap<String, String>,
}

impl ElementProperties {
    fn write(&self, mut call: Call) -> Call {
        if let Some((first, rest)) = self.tags.split_first() {
            let tag = rest.iter().fold(Call::new("Tag").string(first), |c, t| c.string(t));
            call = call.stmt(tag.render());
        }
        call = call.string_stmt("URL", self.url.as_deref());
        for (key, value) in &self.properties {
            call = call.stmt(Call::new("Prop").string(key).string(value).render());
        }
        call
    }
}

/// A `Person`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonSnippet {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub external: bool,
    #[serde(flatten)]
    pub properties: ElementProperties,
}

/// A `SoftwareSystem`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSnippet {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub external: bool,
    #[serde(flatten)]
    pub properties: ElementProperties,
}

/// A `Container` of `system`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSnippet {
    pub system: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub technology: Option<String>,
    #[serde(flatten)]
    pub properties: ElementProperties,
}

/// A `Component` of `system/container`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSnippet {
    pub system: String,
    pub container: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub technology: Option<String>,
    #[serde(flatten)]
    pub properties: ElementProperties,
}

/// Whether a relationship is synchronous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interaction {
    Synchronous,
    Asynchronous,
}

impl Interaction {
    fn constant(self) -> &'static str {
        match self {
            Self::Synchronous => "InteractionSynchronous",
            Self::Asynchronous => "InteractionAsynchronous",
        }
    }
}

/// A relationship from the element at `source` to `destination`.
///
/// `destination` is written as given, so it may be relative to the source's
/// software system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipSnippet {
    pub source: String,
    pub destination: String,
    #[serde(default)]
    pub relation: RelationshipKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technology: Option<String>,
    #[serde(default)]
    pub interaction: Option<Interaction>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Automatic layout direction of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankDirection {
    TopBottom,
    BottomTop,
    LeftRight,
    RightLeft,
}

impl RankDirection {
    fn constant(self) -> &'static str {
        match self {
            Self::TopBottom => "RankTopBottom",
            Self::BottomTop => "RankBottomTop",
            Self::LeftRight => "RankLeftRight",
            Self::RightLeft => "RankRightLeft",
        }
    }
}

/// A relationship shown in a view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSnippet {
    pub source: String,
    pub destination: String,
}

/// A diagram view.
///
/// `scope` is the software system of context, container and dynamic views,
/// `System/Container` for component views and the deployment scope of
/// deployment views, which also need an `environment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSnippet {
    pub view: ViewKind,
    pub key: String,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub boundary_visible: bool,
    #[serde(default)]
    pub add_all: bool,
    #[serde(default)]
    pub add: Vec<String>,
    #[serde(default)]
    pub links: Vec<LinkSnippet>,
    #[serde(default)]
    pub auto_layout: Option<RankDirection>,
}

impl ViewSnippet {
    fn scope(&self) -> Result<&str, SnippetError> {
        self.scope.as_deref().ok_or(SnippetError::MissingField {
            kind: self.view.function_name(),
            field: "scope",
        })
    }

    fn render(&self) -> Result<String, SnippetError> {
        let call = Call::new(self.view.function_name());
        let call = match self.view {
            ViewKind::SystemLandscape => call,
            ViewKind::SystemContext
            | ViewKind::Container
            | ViewKind::Component
            | ViewKind::Dynamic => call.string(self.scope()?),
            ViewKind::Deployment => {
                let environment = self.environment.as_deref().ok_or(SnippetError::MissingField {
                    kind: self.view.function_name(),
                    field: "environment",
                })?;
                call.string(self.scope()?).string(environment)
            }
            ViewKind::Filtered => return Err(SnippetError::Unaddressable(self.view)),
        };

        let boundary = match self.view {
            ViewKind::SystemLandscape | ViewKind::SystemContext => Some("EnterpriseBoundaryVisible()"),
            ViewKind::Container => Some("SystemBoundaryVisible()"),
            ViewKind::Component => Some("ContainerBoundaryVisible()"),
            ViewKind::Filtered | ViewKind::Dynamic | ViewKind::Deployment => None,
        };

        let mut call = call
            .string(&self.key)
            .optional(self.description.as_deref())
            .string_stmt("Title", self.title.as_deref());
        if let Some(boundary) = boundary {
            call = call.stmt_if(self.boundary_visible, boundary);
        }
        call = call.stmt_if(self.add_all, "AddAll()");
        for element in &self.add {
            call = call.string_stmt("Add", Some(element.as_str()));
        }
        for link in &self.links {
            call = call.stmt(
                Call::new("Link")
                    .string(&link.source)
                    .string(&link.destination)
                    .render(),
            );
        }
        if let Some(direction) = self.auto_layout {
            call = call.stmt(format!("AutoLayout({})", direction.constant()));
        }
        Ok(call.render())
    }
}

/// An `ElementStyle` applied to elements tagged `tag`.
///
/// `shape` and `border` are DSL constants such as `ShapeCylinder` or
/// `BorderDashed`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementStyleSnippet {
    pub tag: String,
    pub shape: Option<String>,
    pub icon: Option<String>,
    pub background: Option<String>,
    pub color: Option<String>,
    pub stroke: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub font_size: Option<u32>,
    pub show_metadata: bool,
    pub show_description: bool,
    pub opacity: Option<u32>,
    pub border: Option<String>,
}

impl ElementStyleSnippet {
    fn render(&self) -> Result<String, SnippetError> {
        let mut call = Call::new(StyleKind::Element.function_name()).string(&self.tag);
        if let Some(shape) = &self.shape {
            call = call.stmt(format!("Shape({})", identifier(shape)?));
        }
        let mut call = call
            .string_stmt("Icon", self.icon.as_deref())
            .string_stmt("Background", self.background.as_deref())
            .string_stmt("Color", self.color.as_deref())
            .string_stmt("Stroke", self.stroke.as_deref())
            .number_stmt("Width", self.width)
            .number_stmt("Height", self.height)
            .number_stmt("FontSize", self.font_size)
            .stmt_if(self.show_metadata, "ShowMetadata()")
            .stmt_if(self.show_description, "ShowDescription()")
            .number_stmt("Opacity", self.opacity);
        if let Some(border) = &self.border {
            call = call.stmt(format!("Border({})", identifier(border)?));
        }
        Ok(call.render())
    }
}

/// A `RelationshipStyle` applied to relationships tagged `tag`.
///
/// `routing` is a DSL constant such as `RoutingOrthogonal`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipStyleSnippet {
    pub tag: String,
    pub thickness: Option<u32>,
    pub font_size: Option<u32>,
    pub width: Option<u32>,
    pub position: Option<u32>,
    pub color: Option<String>,
    pub stroke: Option<String>,
    pub dashed: Option<bool>,
    pub routing: Option<String>,
    pub opacity: Option<u32>,
}

impl RelationshipStyleSnippet {
    fn render(&self) -> Result<String, SnippetError> {
        let mut call = Call::new(StyleKind::Relationship.function_name())
            .string(&self.tag)
            .number_stmt("Thickness", self.thickness)
            .number_stmt("FontSize", self.font_size)
            .number_stmt("Width", self.width)
            .number_stmt("Position", self.position)
            .string_stmt("Color", self.color.as_deref())
            .string_stmt("Stroke", self.stroke.as_deref());
        call = match self.dashed {
            Some(true) => call.stmt("Dashed()"),
            Some(false) => call.stmt("Solid()"),
            None => call,
        };
        if let Some(routing) = &self.routing {
            call = call.stmt(format!("Routing({})", identifier(routing)?));
        }
        Ok(call.number_stmt("Opacity", self.opacity).render())
    }
}

/// What an upsert of a [`Declaration`] addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Element { kind: ElementKind, path: ElementPath },
    Id { kind: IdKind, id: String },
    Relationship { source: ElementPath, destination: String },
}

/// Any typed description, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Declaration {
    Person(PersonSnippet),
    SoftwareSystem(SystemSnippet),
    Container(ContainerSnippet),
    Component(ComponentSnippet),
    Relationship(RelationshipSnippet),
    View(ViewSnippet),
    ElementStyle(ElementStyleSnippet),
    RelationshipStyle(RelationshipStyleSnippet),
}

impl Declaration {
    /// The declaration this description replaces or creates.
    pub fn target(&self) -> Result<Target, SnippetError> {
        let element = |kind: ElementKind, keys: &[&str]| -> Result<Target, SnippetError> {
            Ok(Target::Element {
                kind,
                path: ElementPath::for_kind(kind, &keys.join("/"))?,
            })
        };
        match self {
            Self::Person(p) => element(ElementKind::Person, &[p.name.as_str()]),
            Self::SoftwareSystem(s) => element(ElementKind::SoftwareSystem, &[s.name.as_str()]),
            Self::Container(c) => element(
                ElementKind::Container,
                &[c.system.as_str(), c.name.as_str()],
            ),
            Self::Component(c) => element(
                ElementKind::Component,
                &[c.system.as_str(), c.container.as_str(), c.name.as_str()],
            ),
            Self::Relationship(r) => Ok(Target::Relationship {
                source: ElementPath::parse(&r.source)?,
                destination: r.destination.clone(),
            }),
            Self::View(v) => Ok(Target::Id {
                kind: IdKind::View(v.view),
                id: v.key.clone(),
            }),
            Self::ElementStyle(s) => Ok(Target::Id {
                kind: IdKind::Style(StyleKind::Element),
                id: s.tag.clone(),
            }),
            Self::RelationshipStyle(s) => Ok(Target::Id {
                kind: IdKind::Style(StyleKind::Relationship),
                id: s.tag.clone(),
            }),
        }
    }

    /// Canonical DSL code of the declaration.
    pub fn render(&self) -> Result<String, SnippetError> {
        let code = match self {
            Self::Person(p) => {
                let call = Call::new(ElementKind::Person.function_name())
                    .string(&p.name)
                    .optional(p.description.as_deref());
                p.properties.write(call.stmt_if(p.external, "External()")).render()
            }
            Self::SoftwareSystem(s) => {
                let call = Call::new(ElementKind::SoftwareSystem.function_name())
                    .string(&s.name)
                    .optional(s.description.as_deref());
                s.properties.write(call.stmt_if(s.external, "External()")).render()
            }
            Self::Container(c) => {
                let call = Call::new(ElementKind::Container.function_name())
                    .string(&c.name)
                    .optional(c.description.as_deref())
                    .optional(c.technology.as_deref());
                c.properties.write(call).render()
            }
            Self::Component(c) => {
                let call = Call::new(ElementKind::Component.function_name())
                    .string(&c.name)
                    .optional(c.description.as_deref())
                    .optional(c.technology.as_deref());
                c.properties.write(call).render()
            }
            Self::Relationship(r) => {
                let mut call = Call::new(r.relation.function_name())
                    .string(&r.destination)
                    .string(&r.description)
                    .optional(r.technology.as_deref())
                    .expr(r.interaction.map(|i| i.constant().to_string()));
                if let Some((first, rest)) = r.tags.split_first() {
                    let tag = rest.iter().fold(Call::new("Tag").string(first), |c, t| c.string(t));
                    call = call.stmt(tag.render());
                }
                call.string_stmt("URL", r.url.as_deref()).render()
            }
            Self::View(v) => v.render()?,
            Self::ElementStyle(s) => s.render()?,
            Self::RelationshipStyle(s) => s.render()?,
        };
        Ok(code)
    }
}
