//! The SharpTS type lattice (C2 of the specification).
//!
//! This crate is the compile-time type algebra: the closed set of type
//! variants in §3 of the spec, `Union`/`Intersection` normalization, the
//! `MutableClass` → `Class` freeze (§9 "Mutable class with late freeze"),
//! and the subtype/assignability relation the dispatch registry (C8, in
//! `sharpts-emitter`) consults to decide between static and runtime-
//! dispatched call emission.
//!
//! Types are interned in a `TypeStore` so that two structurally identical
//! types (after `Union`/`Intersection` normalization) share one `TypeId`.
//! Equality between `TypeId`s is then integer equality; the canonical
//! string form (`display`) is only computed to build the interning key and
//! for diagnostics, never for runtime comparisons.

pub mod class;
pub mod display;
pub mod id;
pub mod kind;
pub mod lowering;
pub mod relate;
pub mod store;

pub use class::{ClassBuilder, ClassDef, ClassMemberSig, MemberVisibility, MutableClass};
pub use id::TypeId;
pub use kind::{FunctionSig, Type, TypeParam};
pub use lowering::{LoweringError, TypeLowerer};
pub use relate::{assignable_to, is_subtype};
pub use store::TypeStore;
