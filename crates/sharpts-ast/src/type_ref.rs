//! Syntactic type annotations.
//!
//! These are the type expressions as written in source (`Promise<number>`,
//! `string | null`, ...). They carry no semantics of their own — `
//! sharpts_types::lowering` turns a `TypeRef` into a `TypeId` from the
//! closed type lattice (C2). Keeping the syntactic form here and the
//! algebraic form in `sharpts-types` is what lets the lattice normalize
//! and intern types without needing to know anything about source spans.

use sharpts_common::{Atom, Span};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TypeRef {
    pub span: Span,
    pub kind: TypeRefKind,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum TypeRefKind {
    /// A bare name, possibly with type arguments: `number`, `Array<T>`,
    /// `Promise<Foo>`, `Map<K, V>`.
    Named { name: Atom, type_args: Vec<TypeRef> },
    /// `T[]`
    Array(Box<TypeRef>),
    /// `[A, B, C]`
    Tuple(Vec<TypeRef>),
    /// `A | B | C`
    Union(Vec<TypeRef>),
    /// `A & B & C`
    Intersection(Vec<TypeRef>),
    /// `keyof T`
    KeyOf(Box<TypeRef>),
    /// `T[K]`
    IndexedAccess { object: Box<TypeRef>, index: Box<TypeRef> },
    /// A literal type: `"a"`, `42`, `true`.
    Literal(TypeRefLiteral),
    /// `(a: A, b: B) => R`
    Function { params: Vec<TypeRef>, return_type: Box<TypeRef> },
    /// A type parameter reference resolved by name during lowering.
    TypeParameter(Atom),
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum TypeRefLiteral {
    String(String),
    Number(f64),
    Boolean(bool),
}
