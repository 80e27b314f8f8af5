//! Statement and declaration nodes (§3 Data Model, statement list).

use crate::expr::{Expr, PropertyKey};
use crate::ids::NodeId;
use crate::type_ref::TypeRef;
use sharpts_common::{Atom, Span};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Stmt {
    pub id: NodeId,
    pub span: Span,
    pub kind: StmtKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DeclKind {
    Var,
    Let,
    Const,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VarDeclarator {
    pub name: Atom,
    pub declared_type: Option<TypeRef>,
    pub initializer: Option<Expr>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SwitchCase {
    pub test: Option<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CatchClause {
    pub param: Option<Atom>,
    pub body: Block,
}

pub type Block = Vec<Stmt>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ForHeadKind {
    ForIn,
    ForOf,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Param {
    pub name: Atom,
    pub span: Span,
    pub declared_type: Option<TypeRef>,
    pub default: Option<Expr>,
    pub is_rest: bool,
    /// Legacy parameter decorators (§4.6 item 1); empty under Stage 3.
    pub decorators: Vec<Expr>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FunctionDecl {
    pub name: Option<Atom>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeRef>,
    pub body: Block,
    pub is_async: bool,
    pub is_generator: bool,
    /// True for arrow functions: lexical `this`, no own `arguments`. See
    /// SPEC_FULL.md §C "Arrow-function lexical capture".
    pub is_arrow: bool,
    /// A single-expression arrow body (`x => x + 1`) is represented as a
    /// `Block` of one `Return` statement by the external parser; this flag
    /// records the original concise-body form purely for faithful printing,
    /// the emitter treats both forms identically.
    pub has_concise_body: bool,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MethodMember {
    pub key: PropertyKey,
    pub is_static: bool,
    pub is_abstract: bool,
    pub kind: MethodKind,
    pub function: FunctionDecl,
    pub decorators: Vec<Expr>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MethodKind {
    Method,
    Constructor,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FieldMember {
    pub key: PropertyKey,
    pub is_static: bool,
    pub declared_type: Option<TypeRef>,
    pub initializer: Option<Expr>,
    pub decorators: Vec<Expr>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AccessorMember {
    pub key: PropertyKey,
    pub is_static: bool,
    pub getter: Option<FunctionDecl>,
    pub setter: Option<FunctionDecl>,
    pub decorators: Vec<Expr>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ClassMember {
    Method(MethodMember),
    Field(FieldMember),
    Accessor(AccessorMember),
    StaticBlock(Block),
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClassDecl {
    pub name: Option<Atom>,
    pub superclass: Option<Expr>,
    pub members: Vec<ClassMember>,
    /// §4.6 item 5: applied right-to-left.
    pub decorators: Vec<Expr>,
    pub is_abstract: bool,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum StmtKind {
    Expression(Expr),
    Var {
        kind: DeclKind,
        declarations: Vec<VarDeclarator>,
    },
    Return(Option<Expr>),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        condition: Expr,
    },
    ForIn {
        kind: ForHeadKind,
        decl_kind: Option<DeclKind>,
        binding: Atom,
        right: Expr,
        body: Box<Stmt>,
    },
    ForOf {
        kind: ForHeadKind,
        decl_kind: Option<DeclKind>,
        binding: Atom,
        right: Expr,
        body: Box<Stmt>,
        is_await: bool,
    },
    /// C-style `for` is represented as `init`/`test`/`update` rather than a
    /// dedicated AST node per the teacher's preference for reusing the
    /// `While` shape once desugared; kept distinct here only because §4.3's
    /// loop-label-stack machinery treats it identically to `While`.
    For {
        init: Option<Box<Stmt>>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    Block(Block),
    Sequence(Vec<Stmt>),
    Throw(Expr),
    Switch {
        discriminant: Expr,
        cases: Vec<SwitchCase>,
    },
    TryCatch {
        try_block: Block,
        catch: Option<CatchClause>,
        finally: Option<Block>,
    },
    Break(Option<Atom>),
    Continue(Option<Atom>),
    LabeledStatement {
        label: Atom,
        body: Box<Stmt>,
    },
    Class(ClassDecl),
    Function(FunctionDecl),
    /// A top-level/namespace field declaration (outside a class). Class
    /// fields use `ClassMember::Field` instead.
    Field(FieldMember),
    /// A top-level/namespace accessor pair. Class accessors use
    /// `ClassMember::Accessor` instead.
    Accessor(AccessorMember),
}

impl Stmt {
    #[must_use]
    pub fn new(id: NodeId, span: Span, kind: StmtKind) -> Self {
        Self { id, span, kind }
    }
}
