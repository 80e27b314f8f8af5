//! The SharpTS syntax tree.
//!
//! Unlike a scanner/parser-facing AST, this crate has no concrete syntax
//! concerns (trivia, comments, recovery nodes) — it is the tree a host
//! front end hands to the compiler core, already parsed and already free
//! of TypeScript-only syntax that has no bytecode meaning (type-only
//! imports, ambient declarations, and the like are expected to have been
//! stripped upstream). It is consumed read-only downstream: the checker,
//! the async lowering passes, and the emitter all annotate `NodeId`s in
//! their own side tables rather than mutating these nodes in place.

pub mod expr;
pub mod ids;
pub mod stmt;
pub mod type_ref;
pub mod visit;

pub use expr::{BinaryOp, Expr, ExprKind, IncDecOp, Literal, LogicalOp, ObjectProperty, PropertyKey, UnaryOp};
pub use ids::{NodeId, NodeIdGen};
pub use stmt::{
    AccessorMember, Block, CatchClause, ClassDecl, ClassMember, DeclKind, FieldMember, ForHeadKind, FunctionDecl,
    MethodKind, MethodMember, Param, Stmt, StmtKind, SwitchCase, VarDeclarator,
};
pub use type_ref::{TypeRef, TypeRefKind, TypeRefLiteral};
pub use visit::Visitor;

/// A full compilation unit: the ordered top-level statements a host parser
/// produced, plus the `NodeIdGen` that minted every `NodeId` in the tree so
/// later passes can mint fresh ids of their own (for synthesized helper
/// variables, for instance) without colliding.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Module {
    pub body: Block,
}
