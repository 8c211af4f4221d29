//! Syntax tree produced by the [`parser`](super::parser).
//!
//! Every node carries the byte [`Span`] it was parsed from. The declaration
//! tree in [`tree`](super::tree) is derived from this representation.

use crate::span::{Span, Spanned};

/// A complete source file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile<'src> {
    pub package: Spanned<&'src str>,
    pub imports: Vec<Import>,
    pub decls: Vec<Decl<'src>>,
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Decl<'src> {
    Var(VarDecl<'src>),
    /// `func`, `const`, `type`, typed or grouped `var`.
    Opaque(Opaque<'src>),
}

impl Decl<'_> {
    pub fn span(&self) -> Span {
        match self {
            Decl::Var(decl) => decl.span,
            Decl::Opaque(opaque) => opaque.span,
        }
    }
}

/// Package name and imports of a Go file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHeader {
    pub package: String,
    pub imports: Vec<Import>,
}

/// One import spec: `. "goa.design/model/dsl"`.
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    /// `.`, `_` or a package alias.
    pub alias: Option<Spanned<String>>,
    pub path: Spanned<String>,
}

/// `var Name = value`, at top level or inside a block.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl<'src> {
    pub name: Spanned<&'src str>,
    pub value: Expr<'src>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt<'src> {
    Var(VarDecl<'src>),
    /// `name := value` or `name = value`.
    Assign(VarDecl<'src>),
    Expr(Expr<'src>),
    /// Any other simple statement: `a, b := f()`, `n += 1`, `i++`.
    Other { exprs: Vec<Expr<'src>>, span: Span },
    Opaque(Opaque<'src>),
}

impl Stmt<'_> {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Var(decl) | Stmt::Assign(decl) => decl.span,
            Stmt::Expr(expr) => expr.span(),
            Stmt::Other { span, .. } => *span,
            Stmt::Opaque(opaque) => opaque.span,
        }
    }
}

/// A statement or declaration kept as written, such as `for`, `if` or
/// `const`. Only the blocks inside it are parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Opaque<'src> {
    /// Blocks in document order; composite literals are not included.
    pub blocks: Vec<Block<'src>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'src> {
    /// Interpreted or raw string, decoded.
    String(Spanned<String>),
    Number(Spanned<&'src str>),
    /// Rune literal, quotes included.
    Char(Spanned<&'src str>),
    Ident(Spanned<&'src str>),
    /// `operand.field`
    Selector {
        base: Box<Expr<'src>>,
        field: Spanned<&'src str>,
        span: Span,
    },
    /// `-operand`
    Negate { operand: Box<Expr<'src>>, span: Span },
    /// `!x`, `*p`, `&T{}`, `<-ch`
    Unary { operand: Box<Expr<'src>>, span: Span },
    Binary {
        left: Box<Expr<'src>>,
        right: Box<Expr<'src>>,
        span: Span,
    },
    Paren { inner: Box<Expr<'src>>, span: Span },
    /// `base[...]`: index, slice or type arguments.
    Index { base: Box<Expr<'src>>, span: Span },
    /// `base.(T)`
    Assert { base: Box<Expr<'src>>, span: Span },
    /// `T{...}`; the elements are not parsed.
    Composite { ty: Box<Expr<'src>>, span: Span },
    /// `[]T`, `map[K]V`, `chan T`, `struct{...}`...
    Type(Span),
    Call(CallExpr<'src>),
    FuncLit(FuncLit<'src>),
}

impl<'src> Expr<'src> {
    pub fn span(&self) -> Span {
        match self {
            Expr::String(s) => s.span(),
            Expr::Number(n) => n.span(),
            Expr::Char(c) => c.span(),
            Expr::Ident(i) => i.span(),
            Expr::Selector { span, .. }
            | Expr::Negate { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Paren { span, .. }
            | Expr::Index { span, .. }
            | Expr::Assert { span, .. }
            | Expr::Composite { span, .. }
            | Expr::Type(span) => *span,
            Expr::Call(call) => call.span,
            Expr::FuncLit(func) => func.span,
        }
    }

    /// Name of an identifier or the field of a selector.
    pub fn name(&self) -> Option<&'src str> {
        match self {
            Expr::Ident(name) => Some(*name.inner()),
            Expr::Selector { field, .. } => Some(*field.inner()),
            _ => None,
        }
    }
}

/// `callee(args...)`
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr<'src> {
    pub callee: Box<Expr<'src>>,
    pub args: Vec<Expr<'src>>,
    /// Offset of the closing parenthesis.
    pub close_paren: usize,
    /// Whether the last argument is followed by a comma.
    pub trailing_comma: bool,
    /// The last argument is spread with `...`.
    pub ellipsis: bool,
    pub span: Span,
}

/// `func() { ... }`, or with parameters and results
/// `func(i int) string { ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncLit<'src> {
    /// Anything but an empty parameter list and no result.
    pub has_signature: bool,
    pub body: Block<'src>,
    pub span: Span,
}

/// `{ stmts }`; `span` covers both braces.
#[derive(Debug, Clone, PartialEq)]
pub struct Block<'src> {
    pub stmts: Vec<Stmt<'src>>,
    pub span: Span,
}
