//! The closed type lattice (§3 Data Model, Type Lattice).
//!
//! `Type` is a single tagged union covering every variant the spec names:
//! primitives, composites, structural types, nominal types, function
//! forms, literal types, and type operators. Nested type references go
//! through `TypeId` rather than `Box<Type>` so that `TypeStore` can intern
//! and structurally dedup everything reachable from a `Union`/
//! `Intersection`, per §3's "equality is structural, via the canonical
//! string form" invariant.

use crate::class::{ClassDef, MutableClass};
use crate::id::TypeId;
use indexmap::IndexMap;
use sharpts_common::Atom;
use std::rc::Rc;

/// A tuple element, which may be optional (`[string, number?]`) or a rest
/// element (`[string, ...number[]]`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TupleElement {
    pub ty: TypeId,
    pub optional: bool,
    pub is_rest: bool,
    pub label: Option<Atom>,
}

/// A structural property signature, as found in `Record`/`Interface`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PropertySig {
    pub ty: TypeId,
    pub optional: bool,
    pub readonly: bool,
}

/// An interface's structural member table plus the interfaces it extends.
/// Unlike `Record`, an `Interface` has nominal identity for diagnostics
/// (its declared name) even though member compatibility is structural.
#[derive(Debug)]
pub struct InterfaceDef {
    pub name: Atom,
    pub members: IndexMap<Atom, PropertySig>,
    pub extends: Vec<TypeId>,
}

/// A declared `enum`. Members are ordered (declaration order matters for
/// numeric auto-increment) and each carries its resolved constant value.
#[derive(Debug)]
pub struct EnumDef {
    pub name: Atom,
    pub members: Vec<(Atom, EnumValue)>,
    pub is_const: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EnumValue {
    Number(f64),
    String(String),
}

/// A declared `namespace`/module-like grouping of exported members.
#[derive(Debug)]
pub struct NamespaceDef {
    pub name: Atom,
    pub exports: IndexMap<Atom, TypeId>,
}

/// A function parameter signature, independent of any particular call
/// site — used both for plain `Function` and inside `OverloadedFunction`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParamSig {
    pub name: Atom,
    pub ty: TypeId,
    pub optional: bool,
    pub is_rest: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionSig {
    pub params: Vec<ParamSig>,
    pub return_type: TypeId,
    pub is_async: bool,
    pub is_generator: bool,
}

/// A formal type parameter of a `GenericFunction`/`GenericClass`/
/// `GenericInterface`, with its optional constraint and default.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeParam {
    pub name: Atom,
    pub constraint: Option<TypeId>,
    pub default: Option<TypeId>,
}

#[derive(Debug)]
pub struct GenericFunctionDef {
    pub type_params: Vec<TypeParam>,
    pub sig: FunctionSig,
}

#[derive(Debug)]
pub struct GenericClassDef {
    pub type_params: Vec<TypeParam>,
    pub class: Rc<ClassDef>,
}

#[derive(Debug)]
pub struct GenericInterfaceDef {
    pub type_params: Vec<TypeParam>,
    pub interface: Rc<InterfaceDef>,
}

/// `{ [K in Keys]: T[K] }`-shaped mapped type. `modifier_add`/
/// `modifier_remove` model the `+readonly`/`-readonly`/`+?`/`-?` prefixes;
/// at most one of each pair may be set, and an unset pair means "keep the
/// source member's modifier unchanged".
#[derive(Debug)]
pub struct MappedTypeDef {
    pub type_param: Atom,
    pub constraint: TypeId,
    pub name_type: Option<TypeId>,
    pub value_type: TypeId,
    pub readonly_add: bool,
    pub readonly_remove: bool,
    pub optional_add: bool,
    pub optional_remove: bool,
}

/// `Check extends Extends ? True : False`, with the inferred type
/// parameters introduced by `infer` in `Extends` scoped to `True`.
#[derive(Debug)]
pub struct ConditionalTypeDef {
    pub check: TypeId,
    pub extends: TypeId,
    pub true_branch: TypeId,
    pub false_branch: TypeId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntrinsicStringOp {
    Uppercase,
    Lowercase,
    Capitalize,
    Uncapitalize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TemplateLiteralPart {
    Literal(String),
    Placeholder(TypeId),
}

#[derive(Clone, Debug, PartialEq)]
pub enum LiteralValue {
    String(String),
    Number(f64),
    Boolean(bool),
    BigInt(String),
}

/// The closed set of type variants (§3 Data Model, Type Lattice).
#[derive(Debug)]
pub enum Type {
    // Primitives
    Number,
    String,
    Boolean,
    Void,
    Any,
    Null,
    Undefined,
    Unknown,
    Never,
    Symbol,
    BigInt,
    Date,
    RegExp,

    // Composites
    Array(TypeId),
    Tuple(Vec<TupleElement>),
    Map(TypeId, TypeId),
    Set(TypeId),
    WeakMap(TypeId, TypeId),
    WeakSet(TypeId),
    Iterator(TypeId),
    Promise(TypeId),
    Generator(TypeId),
    AsyncGenerator(TypeId),
    Module(Rc<NamespaceDef>),

    // Structural
    Record(IndexMap<Atom, PropertySig>),
    Interface(Rc<InterfaceDef>),

    // Nominal
    /// A frozen class. `MutableClass::freeze` is the only way to produce
    /// the `Rc<ClassDef>` inside, and the `Rc`'s identity is preserved
    /// across the freeze (§3: "its identity is preserved across freeze so
    /// that self-referential method signatures remain valid").
    Class(Rc<ClassDef>),
    /// A class signature still being collected; never appears in a
    /// `TypeStore` after the owning pass finishes (§3 lifecycle: "A
    /// `MutableClass` exists only during class signature collection").
    MutableClass(MutableClass),
    /// An instance of the class named by `TypeId` (which resolves to a
    /// `Type::Class`): `this` inside a method, or the result of `new C()`.
    Instance(TypeId),
    Enum(Rc<EnumDef>),
    Namespace(Rc<NamespaceDef>),
    /// An opaque host type the core does not model structurally (e.g.
    /// `Buffer`, a Node.js `fs.Stats`) — tracked only by name so dispatch
    /// (C8) can still route its methods to runtime helpers.
    ExternalType(Atom),

    // Function forms
    Function(FunctionSig),
    OverloadedFunction(Vec<FunctionSig>),
    GenericFunction(Rc<GenericFunctionDef>),
    GenericClass(Rc<GenericClassDef>),
    GenericInterface(Rc<GenericInterfaceDef>),
    /// A generic base (`GenericClass`/`GenericFunction`/`GenericInterface`)
    /// applied to concrete type arguments.
    InstantiatedGeneric { base: TypeId, args: Vec<TypeId> },

    // Literal types
    Literal(LiteralValue),

    // Operators
    KeyOf(TypeId),
    MappedType(Rc<MappedTypeDef>),
    IndexedAccess { object: TypeId, index: TypeId },
    ConditionalType(Rc<ConditionalTypeDef>),
    InferredTypeParameter(Atom),
    /// Normalized: flattened and deduplicated per §3's `Union` invariant.
    /// `TypeStore::make_union` is the only supported constructor.
    Union(Vec<TypeId>),
    /// Normalized: `never`/`any` absorption and deduplication applied per
    /// §3's `Intersection` invariant. `TypeStore::make_intersection` is the
    /// only supported constructor.
    Intersection(Vec<TypeId>),
    TemplateLiteralType(Vec<TemplateLiteralPart>),
    IntrinsicStringType(IntrinsicStringOp, TypeId),
}

impl Type {
    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        matches!(
            self,
            Type::Number
                | Type::String
                | Type::Boolean
                | Type::Void
                | Type::Any
                | Type::Null
                | Type::Undefined
                | Type::Unknown
                | Type::Never
                | Type::Symbol
                | Type::BigInt
                | Type::Date
                | Type::RegExp
        )
    }

    #[must_use]
    pub const fn is_value_type(&self) -> bool {
        matches!(self, Type::Number | Type::Boolean)
    }
}
