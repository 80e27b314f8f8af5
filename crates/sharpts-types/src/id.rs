//! Interned type handles.
//!
//! Mirrors `sharpts_ast::NodeId` and the teacher project's `TypeId`/
//! `SymbolId` numeric-handle convention: a `TypeId` is a small `Copy`
//! index into a `TypeStore`'s backing table rather than a boxed `Type`,
//! so comparing two types for structural equality after interning is
//! integer equality.

/// A handle to an interned `Type` inside a particular `TypeStore`.
///
/// `TypeId`s from different stores are not comparable; nothing here
/// prevents mixing them, so callers are expected to thread a single
/// store through one compilation unit (the same discipline the AST uses
/// for `NodeId`/`NodeIdGen`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const DUMMY: TypeId = TypeId(u32::MAX);
}
