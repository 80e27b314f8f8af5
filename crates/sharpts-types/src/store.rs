//! The interning arena for `Type`s.
//!
//! `TypeStore` borrows the compilation unit's `Interner` (the same one
//! the AST's `Atom`s came from — names are never re-interned here) and
//! owns the arena of `Type` values plus the canonical-string → `TypeId`
//! lookup table that gives `Union`/`Intersection` normalization its
//! structural-equality semantics.

use crate::display::canonical_form;
use crate::id::TypeId;
use crate::kind::Type;
use rustc_hash::FxHashMap;
use sharpts_common::{Atom, Interner};
use sharpts_common::limits::MAX_UNION_MEMBERS;

pub struct TypeStore<'i> {
    interner: &'i Interner,
    types: Vec<Type>,
    canonical: Vec<String>,
    lookup: FxHashMap<String, TypeId>,
}

impl<'i> TypeStore<'i> {
    #[must_use]
    pub fn new(interner: &'i Interner) -> Self {
        let mut store = Self { interner, types: Vec::new(), canonical: Vec::new(), lookup: FxHashMap::default() };
        // Primitives are pre-interned at fixed ids so callers can refer to
        // them without a lookup (mirrors well-known-symbol-slot style
        // fixed indices described in §6 for runtime helper binding).
        for prim in [
            Type::Number,
            Type::String,
            Type::Boolean,
            Type::Void,
            Type::Any,
            Type::Null,
            Type::Undefined,
            Type::Unknown,
            Type::Never,
            Type::Symbol,
            Type::BigInt,
            Type::Date,
            Type::RegExp,
        ] {
            store.intern(prim);
        }
        store
    }

    #[must_use]
    pub fn resolve(&self, atom: Atom) -> &str {
        self.interner.resolve(atom)
    }

    #[must_use]
    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    #[must_use]
    pub fn canonical_of(&self, id: TypeId) -> &str {
        &self.canonical[id.0 as usize]
    }

    /// Intern `ty`, returning the existing `TypeId` if a structurally
    /// identical type (by canonical form) is already present.
    pub fn intern(&mut self, ty: Type) -> TypeId {
        let form = canonical_form(self, &ty);
        if let Some(&existing) = self.lookup.get(&form) {
            return existing;
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        self.canonical.push(form.clone());
        self.lookup.insert(form, id);
        id
    }

    // --- Fixed-id accessors for primitives pre-interned in `new` -------

    pub fn number(&self) -> TypeId {
        TypeId(0)
    }
    pub fn string(&self) -> TypeId {
        TypeId(1)
    }
    pub fn boolean(&self) -> TypeId {
        TypeId(2)
    }
    pub fn void(&self) -> TypeId {
        TypeId(3)
    }
    pub fn any(&self) -> TypeId {
        TypeId(4)
    }
    pub fn null(&self) -> TypeId {
        TypeId(5)
    }
    pub fn undefined(&self) -> TypeId {
        TypeId(6)
    }
    pub fn unknown(&self) -> TypeId {
        TypeId(7)
    }
    pub fn never(&self) -> TypeId {
        TypeId(8)
    }
    pub fn symbol(&self) -> TypeId {
        TypeId(9)
    }
    pub fn bigint(&self) -> TypeId {
        TypeId(10)
    }
    pub fn date(&self) -> TypeId {
        TypeId(11)
    }
    pub fn regexp(&self) -> TypeId {
        TypeId(12)
    }

    /// §3 invariant: `Union` is normalized by recursive flattening and
    /// deduplication, with equality structural via the canonical form.
    pub fn make_union(&mut self, members: Vec<TypeId>) -> TypeId {
        let mut flat = Vec::with_capacity(members.len());
        for member in members {
            self.flatten_union_member(member, &mut flat);
        }
        flat.sort_unstable_by(|a, b| self.canonical_of(*a).cmp(self.canonical_of(*b)));
        flat.dedup();

        if flat.iter().any(|&id| matches!(self.get(id), Type::Any)) {
            return self.any();
        }
        flat.retain(|&id| !matches!(self.get(id), Type::Never));
        if flat.is_empty() {
            return self.never();
        }
        if flat.len() == 1 {
            return flat[0];
        }
        if flat.len() > MAX_UNION_MEMBERS {
            tracing::warn!(member_count = flat.len(), "union exceeds MAX_UNION_MEMBERS, widening to unknown");
            return self.unknown();
        }
        self.intern(Type::Union(flat))
    }

    fn flatten_union_member(&self, id: TypeId, out: &mut Vec<TypeId>) {
        match self.get(id) {
            Type::Union(members) => {
                for &member in members {
                    self.flatten_union_member(member, out);
                }
            }
            _ => out.push(id),
        }
    }

    /// §3 invariant: `Intersection` simplifies with `never & T = never`,
    /// `any & T = any`, `unknown & T = T`, and removes duplicates.
    pub fn make_intersection(&mut self, members: Vec<TypeId>) -> TypeId {
        let mut flat = Vec::with_capacity(members.len());
        for member in members {
            self.flatten_intersection_member(member, &mut flat);
        }

        if flat.iter().any(|&id| matches!(self.get(id), Type::Never)) {
            return self.never();
        }
        if flat.iter().any(|&id| matches!(self.get(id), Type::Any)) {
            return self.any();
        }
        flat.retain(|&id| !matches!(self.get(id), Type::Unknown));

        flat.sort_unstable_by(|a, b| self.canonical_of(*a).cmp(self.canonical_of(*b)));
        flat.dedup();

        if flat.is_empty() {
            return self.unknown();
        }
        if flat.len() == 1 {
            return flat[0];
        }
        if flat.len() > MAX_UNION_MEMBERS {
            tracing::warn!(member_count = flat.len(), "intersection exceeds MAX_UNION_MEMBERS, widening to unknown");
            return self.unknown();
        }
        self.intern(Type::Intersection(flat))
    }

    fn flatten_intersection_member(&self, id: TypeId, out: &mut Vec<TypeId>) {
        match self.get(id) {
            Type::Intersection(members) => {
                for &member in members {
                    self.flatten_intersection_member(member, out);
                }
            }
            _ => out.push(id),
        }
    }

    pub fn make_array(&mut self, elem: TypeId) -> TypeId {
        self.intern(Type::Array(elem))
    }

    pub fn make_promise(&mut self, elem: TypeId) -> TypeId {
        self.intern(Type::Promise(elem))
    }

    pub fn make_instance(&mut self, class: TypeId) -> TypeId {
        self.intern(Type::Instance(class))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_flattening_is_idempotent() {
        let mut interner = Interner::new();
        let _ = interner.intern("unused");
        let mut store = TypeStore::new(&interner);
        let n = store.number();
        let s = store.string();
        let b = store.boolean();

        let once = store.make_union(vec![n, s, b]);
        let nested = store.make_union(vec![once, n, s]);
        let twice = store.make_union(vec![nested, b]);
        assert_eq!(once, twice);
    }

    #[test]
    fn union_dedup_ignores_order() {
        let mut interner = Interner::new();
        let mut store = TypeStore::new(&interner);
        let _ = &mut interner;
        let n = store.number();
        let s = store.string();

        let a = store.make_union(vec![n, s]);
        let b = store.make_union(vec![s, n]);
        assert_eq!(a, b);
    }

    #[test]
    fn intersection_absorbs_never_and_any() {
        let interner = Interner::new();
        let mut store = TypeStore::new(&interner);
        let n = store.number();
        let any = store.any();
        let never = store.never();
        let unknown = store.unknown();

        assert_eq!(store.make_intersection(vec![n, never]), store.never());
        assert_eq!(store.make_intersection(vec![n, any]), store.any());
        assert_eq!(store.make_intersection(vec![n, unknown]), n);
    }

    #[test]
    fn single_member_union_collapses() {
        let interner = Interner::new();
        let mut store = TypeStore::new(&interner);
        let n = store.number();
        assert_eq!(store.make_union(vec![n, n]), n);
    }
}
