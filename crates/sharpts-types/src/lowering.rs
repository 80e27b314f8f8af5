//! Lowering syntactic `TypeRef`s (as written in source) to algebraic
//! `TypeId`s in the closed lattice.
//!
//! This is deliberately a thin pass: name resolution of user-declared
//! classes/interfaces/type aliases is the checker's job (out of scope for
//! this core, per spec.md §1's "file I/O and module resolution" and the
//! binder being an external collaborator) — `TypeLowerer` only resolves
//! the fixed set of built-in type names (`number`, `Array`, `Promise`,
//! ...) plus whatever a caller has registered via `bind_name` (a class,
//! interface, enum, or in-scope type parameter).

use crate::id::TypeId;
use crate::kind::{FunctionSig, ParamSig, TupleElement};
use crate::store::TypeStore;
use rustc_hash::FxHashMap;
use sharpts_ast::{TypeRef, TypeRefKind, TypeRefLiteral};
use sharpts_common::Atom;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoweringError {
    #[error("cannot resolve type name '{0}'")]
    UnknownName(String),
    #[error("'{0}' expects {1} type argument(s), got {2}")]
    ArityMismatch(String, usize, usize),
}

pub struct TypeLowerer<'s, 'i> {
    pub store: &'s mut TypeStore<'i>,
    /// Names bound in the current scope: built-ins are resolved without
    /// consulting this map; user declarations and type parameters must be
    /// registered here before lowering any `TypeRef` that mentions them.
    bindings: FxHashMap<Atom, TypeId>,
}

impl<'s, 'i> TypeLowerer<'s, 'i> {
    #[must_use]
    pub fn new(store: &'s mut TypeStore<'i>) -> Self {
        Self { store, bindings: FxHashMap::default() }
    }

    pub fn bind_name(&mut self, name: Atom, id: TypeId) {
        self.bindings.insert(name, id);
    }

    pub fn lower(&mut self, type_ref: &TypeRef) -> Result<TypeId, LoweringError> {
        match &type_ref.kind {
            TypeRefKind::Named { name, type_args } => self.lower_named(*name, type_args),
            TypeRefKind::Array(elem) => {
                let elem = self.lower(elem)?;
                Ok(self.store.make_array(elem))
            }
            TypeRefKind::Tuple(elements) => {
                let mut out = Vec::with_capacity(elements.len());
                for el in elements {
                    let ty = self.lower(el)?;
                    out.push(TupleElement { ty, optional: false, is_rest: false, label: None });
                }
                Ok(self.store.intern(crate::kind::Type::Tuple(out)))
            }
            TypeRefKind::Union(members) => {
                let mut ids = Vec::with_capacity(members.len());
                for m in members {
                    ids.push(self.lower(m)?);
                }
                Ok(self.store.make_union(ids))
            }
            TypeRefKind::Intersection(members) => {
                let mut ids = Vec::with_capacity(members.len());
                for m in members {
                    ids.push(self.lower(m)?);
                }
                Ok(self.store.make_intersection(ids))
            }
            TypeRefKind::KeyOf(inner) => {
                let inner = self.lower(inner)?;
                Ok(self.store.intern(crate::kind::Type::KeyOf(inner)))
            }
            TypeRefKind::IndexedAccess { object, index } => {
                let object = self.lower(object)?;
                let index = self.lower(index)?;
                Ok(self.store.intern(crate::kind::Type::IndexedAccess { object, index }))
            }
            TypeRefKind::Literal(lit) => {
                let value = match lit {
                    TypeRefLiteral::String(s) => crate::kind::LiteralValue::String(s.clone()),
                    TypeRefLiteral::Number(n) => crate::kind::LiteralValue::Number(*n),
                    TypeRefLiteral::Boolean(b) => crate::kind::LiteralValue::Boolean(*b),
                };
                Ok(self.store.intern(crate::kind::Type::Literal(value)))
            }
            TypeRefKind::Function { params, return_type } => {
                let mut param_sigs = Vec::with_capacity(params.len());
                for p in params {
                    let ty = self.lower(p)?;
                    param_sigs.push(ParamSig { name: Atom::NONE, ty, optional: false, is_rest: false });
                }
                let return_type = self.lower(return_type)?;
                Ok(self.store.intern(crate::kind::Type::Function(FunctionSig {
                    params: param_sigs,
                    return_type,
                    is_async: false,
                    is_generator: false,
                })))
            }
            TypeRefKind::TypeParameter(name) => self.lookup_bound(*name),
        }
    }

    fn lower_named(&mut self, name: Atom, type_args: &[TypeRef]) -> Result<TypeId, LoweringError> {
        let text = self.store.resolve(name).to_string();
        if let Some(id) = builtin_by_name(self, &text, type_args) {
            return id;
        }
        self.lookup_bound(name)
    }

    fn lookup_bound(&self, name: Atom) -> Result<TypeId, LoweringError> {
        self.bindings
            .get(&name)
            .copied()
            .ok_or_else(|| LoweringError::UnknownName(self.store.resolve(name).to_string()))
    }
}

#[allow(clippy::too_many_lines)]
fn builtin_by_name(
    lowerer: &mut TypeLowerer<'_, '_>,
    name: &str,
    type_args: &[TypeRef],
) -> Option<Result<TypeId, LoweringError>> {
    fn arg(lowerer: &mut TypeLowerer<'_, '_>, type_args: &[TypeRef], index: usize) -> Result<TypeId, LoweringError> {
        match type_args.get(index) {
            Some(t) => lowerer.lower(t),
            None => Ok(lowerer.store.unknown()),
        }
    }

    Some(match name {
        "number" => Ok(lowerer.store.number()),
        "string" => Ok(lowerer.store.string()),
        "boolean" => Ok(lowerer.store.boolean()),
        "void" => Ok(lowerer.store.void()),
        "any" => Ok(lowerer.store.any()),
        "null" => Ok(lowerer.store.null()),
        "undefined" => Ok(lowerer.store.undefined()),
        "unknown" => Ok(lowerer.store.unknown()),
        "never" => Ok(lowerer.store.never()),
        "symbol" => Ok(lowerer.store.symbol()),
        "bigint" => Ok(lowerer.store.bigint()),
        "Date" => Ok(lowerer.store.date()),
        "RegExp" => Ok(lowerer.store.regexp()),
        "Array" => arg(lowerer, type_args, 0).map(|elem| lowerer.store.make_array(elem)),
        "Promise" => arg(lowerer, type_args, 0).map(|elem| lowerer.store.make_promise(elem)),
        "Set" => arg(lowerer, type_args, 0).map(|elem| lowerer.store.intern(crate::kind::Type::Set(elem))),
        "WeakSet" => arg(lowerer, type_args, 0).map(|elem| lowerer.store.intern(crate::kind::Type::WeakSet(elem))),
        "Iterator" => arg(lowerer, type_args, 0).map(|elem| lowerer.store.intern(crate::kind::Type::Iterator(elem))),
        "Generator" => arg(lowerer, type_args, 0).map(|elem| lowerer.store.intern(crate::kind::Type::Generator(elem))),
        "AsyncGenerator" => {
            arg(lowerer, type_args, 0).map(|elem| lowerer.store.intern(crate::kind::Type::AsyncGenerator(elem)))
        }
        "Map" => arg(lowerer, type_args, 0).and_then(|k| {
            arg(lowerer, type_args, 1).map(|v| lowerer.store.intern(crate::kind::Type::Map(k, v)))
        }),
        "WeakMap" => arg(lowerer, type_args, 0).and_then(|k| {
            arg(lowerer, type_args, 1).map(|v| lowerer.store.intern(crate::kind::Type::WeakMap(k, v)))
        }),
        _ => return None,
    })
}
