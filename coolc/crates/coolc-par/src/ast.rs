//! AST node definitions for COOL.
//!
//! Every node carries its 1-based source line. Expressions additionally
//! carry a `result_type`, which starts as the `_no_type` sentinel and is
//! written exactly once by the semantic analyzer; the code generator only
//! reads it. Children are owned directly by their parent; the tree has no
//! sharing and no cycles.

use coolc_util::Names;

/// AST root: the classes of one source file.
#[derive(Debug, Clone)]
pub struct Program {
    pub line: u32,
    pub classes: Vec<Class>,
}

/// A class definition. `parent` is `"Object"` when no `inherits` clause
/// was written.
#[derive(Debug, Clone)]
pub struct Class {
    pub line: u32,
    pub name: String,
    pub parent: String,
    pub features: Vec<Feature>,
    /// Source file the class came from, used by runtime abort messages.
    pub filename: String,
}

impl Class {
    /// The attribute features of this class, in declaration order.
    pub fn attrs(&self) -> impl Iterator<Item = &Attr> {
        self.features.iter().filter_map(|f| match f {
            Feature::Attr(attr) => Some(attr),
            Feature::Method(_) => None,
        })
    }

    /// The method features of this class, in declaration order.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.features.iter().filter_map(|f| match f {
            Feature::Method(method) => Some(method),
            Feature::Attr(_) => None,
        })
    }
}

/// A class member: attribute or method.
#[derive(Debug, Clone)]
pub enum Feature {
    Attr(Attr),
    Method(Method),
}

/// An attribute; `init` is [`ExprKind::NoExpr`] when no initializer was
/// written.
#[derive(Debug, Clone)]
pub struct Attr {
    pub line: u32,
    pub name: String,
    pub ty: String,
    pub init: Expr,
}

/// A method definition.
#[derive(Debug, Clone)]
pub struct Method {
    pub line: u32,
    pub name: String,
    pub formals: Vec<Formal>,
    pub return_type: String,
    pub body: Expr,
}

/// A formal parameter of a method.
#[derive(Debug, Clone)]
pub struct Formal {
    pub line: u32,
    pub name: String,
    pub ty: String,
}

/// An expression node: source line, analyzer-assigned type, and the
/// syntactic form.
#[derive(Debug, Clone)]
pub struct Expr {
    pub line: u32,
    pub result_type: String,
    pub kind: ExprKind,
}

impl Expr {
    /// A fresh, untyped expression.
    pub fn new(line: u32, kind: ExprKind) -> Self {
        Self {
            line,
            result_type: Names::NO_TYPE.to_string(),
            kind,
        }
    }

    /// The absent-initializer sentinel.
    pub fn no_expr(line: u32) -> Self {
        Self::new(line, ExprKind::NoExpr)
    }

    /// True for the absent-initializer sentinel.
    pub fn is_no_expr(&self) -> bool {
        matches!(self.kind, ExprKind::NoExpr)
    }
}

/// The syntactic forms of COOL expressions.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// `id <- rhs`
    Assign { id: String, rhs: Box<Expr> },
    /// `recv.method(args)`; plain `method(args)` gets a synthesized
    /// `self` receiver.
    Dispatch {
        recv: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    /// `recv@ty.method(args)`
    StaticDispatch {
        recv: Box<Expr>,
        ty: String,
        method: String,
        args: Vec<Expr>,
    },
    /// `if cond then then_branch else else_branch fi`
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// `while cond loop body pool`
    While { cond: Box<Expr>, body: Box<Expr> },
    /// `{ e1; e2; ... }`; never empty.
    Block { exprs: Vec<Expr> },
    /// A single `let` binding; multi-binding `let` is desugared into a
    /// nest of these.
    Let {
        id: String,
        ty: String,
        init: Box<Expr>,
        body: Box<Expr>,
    },
    /// `case scrutinee of branches esac`
    Case {
        scrutinee: Box<Expr>,
        branches: Vec<CaseBranch>,
    },
    /// `new ty`
    New { ty: String },
    /// `isvoid e`
    IsVoid(Box<Expr>),
    /// `not e`
    Not(Box<Expr>),
    /// Arithmetic negation `~e`.
    Neg(Box<Expr>),
    Plus(Box<Expr>, Box<Expr>),
    Minus(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Lt(Box<Expr>, Box<Expr>),
    Le(Box<Expr>, Box<Expr>),
    Eq(Box<Expr>, Box<Expr>),
    /// `(e)`, kept to mirror the source shape; transparent everywhere.
    Paren(Box<Expr>),
    Int(u32),
    /// String literal, stored escaped and including the quotes, exactly
    /// as the lexer produced it.
    Str(String),
    Bool(bool),
    /// An identifier use.
    Id(String),
    /// Absent initializer sentinel.
    NoExpr,
}

/// One branch of a `case`: `id : ty => body;`.
#[derive(Debug, Clone)]
pub struct CaseBranch {
    pub line: u32,
    /// Type of the branch body, assigned by the analyzer.
    pub result_type: String,
    pub id: String,
    pub ty: String,
    pub body: Expr,
}
