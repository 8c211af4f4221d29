//! Declaration tree: the call structure of a model file.
//!
//! Each call in statement position becomes a [`DeclarationNode`] stored in an
//! arena and addressed by [`NodeId`]. Nodes record their byte spans in the
//! source so callers can splice text without reprinting anything else, and a
//! parent index so ancestry questions never need a second walk.

use indexmap::IndexMap;
use log::trace;

use archedit_core::kind::DeclarationKind;

use crate::{
    error::{Diagnostic, ErrorCode, ParseError},
    lexer, parser,
    parser_types::{CallExpr, Decl, Expr, Import, SourceFile, Stmt},
    span::{Span, Spanned},
};

/// Index of a node in its [`DeclarationTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Summary of one call argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// Decoded string literal.
    String(String),
    /// Identifier or selector field, e.g. `PaymentSystem` or `dsl.Synchronous`.
    Name(String),
    /// `func() { ... }`
    Func,
    Other,
}

/// `var Name = ` or `Name := ` in front of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    name: String,
    span: Span,
}

impl Binding {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The whole statement, binding included.
    pub fn span(&self) -> Span {
        self.span
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclarationNode {
    kind: DeclarationKind,
    function: String,
    args: Vec<Spanned<Arg>>,
    key: Option<String>,
    span: Span,
    block: Option<Span>,
    close_paren: usize,
    trailing_comma: bool,
    binding: Option<Binding>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    depth: usize,
    nested: bool,
}

impl DeclarationNode {
    pub fn kind(&self) -> DeclarationKind {
        self.kind
    }

    /// Called function name without package qualifier.
    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn args(&self) -> &[Spanned<Arg>] {
        &self.args
    }

    /// The first string literal argument.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Decoded string literal at argument `index`.
    pub fn string_arg(&self, index: usize) -> Option<&str> {
        match self.args.get(index).map(|arg| arg.inner()) {
            Some(Arg::String(value)) => Some(value),
            _ => None,
        }
    }

    /// Key used to address this node by id.
    ///
    /// Views are keyed by the argument at their kind's key position, styles
    /// by their tag, everything else by [`key`](Self::key).
    pub fn identifier(&self) -> Option<&str> {
        match self.kind {
            DeclarationKind::View(view) => view.key_position().and_then(|i| self.string_arg(i)),
            DeclarationKind::Style(_) => self.string_arg(0),
            _ => self.key(),
        }
    }

    /// Span of the call expression, excluding any binding.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Span of the whole statement: the binding if any, else the call.
    pub fn statement_span(&self) -> Span {
        self.binding.as_ref().map_or(self.span, Binding::span)
    }

    /// Span of the trailing `func() { ... }` block's braces.
    pub fn block(&self) -> Option<Span> {
        self.block
    }

    /// Offset of the closing `}` of the trailing block.
    pub fn block_close(&self) -> Option<usize> {
        self.block.map(|block| block.end() - 1)
    }

    /// Offset of the call's closing parenthesis.
    pub fn close_paren(&self) -> usize {
        self.close_paren
    }

    pub fn trailing_comma(&self) -> bool {
        self.trailing_comma
    }

    pub fn binding(&self) -> Option<&Binding> {
        self.binding.as_ref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Number of ancestors; top-level declarations have depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether the call sits inside a loop, a condition or a helper function
    /// body rather than directly in its parent's block.
    pub fn is_nested(&self) -> bool {
        self.nested
    }
}

/// A span invariant broken by a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanViolation {
    /// Child not inside the parent's block.
    Escapes { parent: NodeId, child: NodeId },
    /// Two siblings share bytes.
    Overlap { first: NodeId, second: NodeId },
}

/// Arena of declaration nodes built from one source text.
#[derive(Debug, Clone)]
pub struct DeclarationTree {
    package: String,
    imports: Vec<Import>,
    nodes: Vec<DeclarationNode>,
    roots: Vec<NodeId>,
    bindings: IndexMap<String, NodeId>,
}

impl DeclarationTree {
    /// Parse `source` and build its tree.
    ///
    /// # Errors
    ///
    /// Lexer or parser diagnostics.
    pub fn build(source: &str) -> Result<Self, ParseError> {
        let tokens = lexer::tokenize(source)?;
        let file = parser::build_source_file(&tokens)?;
        let tree = Self::from_source_file(&file);
        trace!(
            tokens = tokens.len(),
            nodes = tree.nodes.len(),
            roots = tree.roots.len();
            "Built declaration tree"
        );
        Ok(tree)
    }

    fn from_source_file(file: &SourceFile<'_>) -> Self {
        let mut tree = Self::empty(file.package.inner().to_string(), file.imports.clone());
        for decl in &file.decls {
            match decl {
                Decl::Var(decl) => {
                    tree.lower_stmt_value(decl.name.inner(), decl.span, &decl.value, None, false);
                }
                Decl::Opaque(opaque) => {
                    for stmt in opaque.blocks.iter().flat_map(|block| &block.stmts) {
                        tree.lower_stmt(stmt, None, true);
                    }
                }
            }
        }
        tree
    }

    fn empty(package: String, imports: Vec<Import>) -> Self {
        Self {
            package,
            imports,
            nodes: Vec::new(),
            roots: Vec::new(),
            bindings: IndexMap::new(),
        }
    }

    /// Lower one statement. `nested` marks calls that are not direct
    /// statements of `parent`'s trailing block.
    fn lower_stmt(&mut self, stmt: &Stmt<'_>, parent: Option<NodeId>, nested: bool) {
        match stmt {
            Stmt::Var(decl) | Stmt::Assign(decl) => {
                self.lower_stmt_value(decl.name.inner(), decl.span, &decl.value, parent, nested);
            }
            Stmt::Expr(expr) => self.lower_expr(expr, parent, nested),
            Stmt::Other { exprs, .. } => {
                for expr in exprs {
                    self.lower_bodies(expr, parent);
                }
            }
            Stmt::Opaque(opaque) => {
                for stmt in opaque.blocks.iter().flat_map(|block| &block.stmts) {
                    self.lower_stmt(stmt, parent, true);
                }
            }
        }
    }

    fn lower_stmt_value(
        &mut self,
        name: &str,
        statement: Span,
        value: &Expr<'_>,
        parent: Option<NodeId>,
        nested: bool,
    ) {
        let call = match value {
            Expr::Call(call) if call.callee.name().is_some() => call,
            _ => return self.lower_bodies(value, parent),
        };
        let binding = Binding {
            name: name.to_string(),
            span: statement,
        };
        if let Some(id) = self.lower_call(call, parent, Some(binding), nested) {
            if name != "_" {
                self.bindings.entry(name.to_string()).or_insert(id);
            }
        }
    }

    fn lower_expr(&mut self, expr: &Expr<'_>, parent: Option<NodeId>, nested: bool) {
        match expr {
            Expr::Call(call) if call.callee.name().is_some() => {
                self.lower_call(call, parent, None, nested);
            }
            _ => self.lower_bodies(expr, parent),
        }
    }

    /// Lower the statements of function literals found anywhere in `expr`,
    /// e.g. `func(i int) { ... }(i)` in a loop.
    fn lower_bodies(&mut self, expr: &Expr<'_>, parent: Option<NodeId>) {
        match expr {
            Expr::FuncLit(func) => {
                for stmt in &func.body.stmts {
                    self.lower_stmt(stmt, parent, true);
                }
            }
            Expr::Call(call) => {
                self.lower_bodies(&call.callee, parent);
                for arg in &call.args {
                    self.lower_bodies(arg, parent);
                }
            }
            Expr::Selector { base, .. }
            | Expr::Index { base, .. }
            | Expr::Assert { base, .. } => self.lower_bodies(base, parent),
            Expr::Negate { operand, .. } | Expr::Unary { operand, .. } => {
                self.lower_bodies(operand, parent);
            }
            Expr::Paren { inner, .. } => self.lower_bodies(inner, parent),
            Expr::Binary { left, right, .. } => {
                self.lower_bodies(left, parent);
                self.lower_bodies(right, parent);
            }
            _ => {}
        }
    }

    fn lower_call(
        &mut self,
        call: &CallExpr<'_>,
        parent: Option<NodeId>,
        binding: Option<Binding>,
        nested: bool,
    ) -> Option<NodeId> {
        let function = call.callee.name()?;

        let args: Vec<Spanned<Arg>> = call
            .args
            .iter()
            .map(|arg| {
                let summary = match arg {
                    Expr::String(value) => Arg::String(value.inner().clone()),
                    Expr::Ident(_) | Expr::Selector { .. } => {
                        Arg::Name(arg.name().unwrap_or_default().to_string())
                    }
                    Expr::FuncLit(_) => Arg::Func,
                    _ => Arg::Other,
                };
                Spanned::new(summary, arg.span())
            })
            .collect();

        let key = args.iter().find_map(|arg| match arg.inner() {
            Arg::String(value) => Some(value.clone()),
            _ => None,
        });

        let body = match call.args.last() {
            Some(Expr::FuncLit(func)) => Some(&func.body),
            _ => None,
        };

        let id = NodeId(self.nodes.len());
        let depth = parent.map_or(0, |p| self.nodes[p.0].depth + 1);
        self.nodes.push(DeclarationNode {
            kind: DeclarationKind::from_function_name(function),
            function: function.to_string(),
            args,
            key,
            span: call.span,
            block: body.map(|body| body.span),
            close_paren: call.close_paren,
            trailing_comma: call.trailing_comma,
            binding,
            parent,
            children: Vec::new(),
            depth,
            nested,
        });
        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }

        if let Some(body) = body {
            for stmt in &body.stmts {
                self.lower_stmt(stmt, Some(id), false);
            }
        }
        Some(id)
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &DeclarationNode {
        &self.nodes[id.0]
    }

    /// Top-level declarations in document order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&id| self.parent(id))
    }

    /// Descendants of `id` in document order, `id` excluded.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect(self.children(id), &mut out);
        out
    }

    /// Every node in document order.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        self.collect(&self.roots, &mut out);
        out
    }

    fn collect(&self, ids: &[NodeId], out: &mut Vec<NodeId>) {
        for &id in ids {
            out.push(id);
            self.collect(self.children(id), out);
        }
    }

    /// First node in document order matching `predicate`.
    pub fn find(&self, predicate: impl Fn(&DeclarationNode) -> bool) -> Option<NodeId> {
        self.walk().into_iter().find(|&id| predicate(self.node(id)))
    }

    /// First direct child of `id` matching `predicate`.
    pub fn find_child(
        &self,
        id: NodeId,
        predicate: impl Fn(&DeclarationNode) -> bool,
    ) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&child| predicate(self.node(child)))
    }

    /// Node bound to `name` by `var name = ...` or `name := ...`.
    pub fn resolve_binding(&self, name: &str) -> Option<NodeId> {
        self.bindings.get(name).copied()
    }

    /// Keys of the element chain ending at `id`, outermost first.
    ///
    /// Returns `None` when `id` is not an element or an element ancestor has
    /// no key.
    pub fn element_path(&self, id: NodeId) -> Option<Vec<String>> {
        if !self.node(id).kind.is_element() {
            return None;
        }
        let mut keys = vec![self.node(id).key()?.to_string()];
        for ancestor in self.ancestors(id) {
            let node = self.node(ancestor);
            if node.kind.is_element() {
                keys.push(node.key()?.to_string());
            }
        }
        keys.reverse();
        Some(keys)
    }

    /// Check that children lie inside their parent's block and siblings do
    /// not overlap.
    pub fn check_spans(&self) -> Result<(), SpanViolation> {
        self.check_siblings(&self.roots)?;
        for id in self.walk() {
            let node = self.node(id);
            for &child in &node.children {
                let inside = node
                    .block
                    .is_some_and(|block| block.contains(self.node(child).statement_span()));
                if !inside || !node.span.contains(self.node(child).statement_span()) {
                    return Err(SpanViolation::Escapes { parent: id, child });
                }
            }
            self.check_siblings(&node.children)?;
        }
        Ok(())
    }

    fn check_siblings(&self, ids: &[NodeId]) -> Result<(), SpanViolation> {
        for pair in ids.windows(2) {
            let first = self.node(pair[0]).statement_span();
            let second = self.node(pair[1]).statement_span();
            if first.end() > second.start() {
                return Err(SpanViolation::Overlap {
                    first: pair[0],
                    second: pair[1],
                });
            }
        }
        Ok(())
    }
}

/// A declaration parsed on its own, as passed to the editor.
#[derive(Debug, Clone)]
pub struct Snippet {
    tree: DeclarationTree,
    root: NodeId,
}

impl Snippet {
    /// Parse a single declaration statement.
    ///
    /// # Errors
    ///
    /// Lexer or parser diagnostics, E200 when the statement is not a call
    /// and E201 when anything but trivia follows it.
    pub fn parse(code: &str) -> Result<Self, ParseError> {
        let tokens = lexer::tokenize(code)?;
        let stmt = parser::build_snippet(&tokens)?;

        let mut tree = DeclarationTree::empty(String::new(), Vec::new());
        tree.lower_stmt(&stmt, None, false);
        let root = tree.roots.first().copied().ok_or_else(|| {
            Diagnostic::error("declaration must call a named function")
                .with_code(ErrorCode::E200)
                .with_label(stmt.span(), "not a named call")
        })?;
        Ok(Self { tree, root })
    }

    pub fn tree(&self) -> &DeclarationTree {
        &self.tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The declaration itself.
    pub fn node(&self) -> &DeclarationNode {
        self.tree.node(self.root)
    }
}
