//! Subtype / assignability relation and generic instantiation.
//!
//! This is the algebra C8 (in `sharpts-emitter`) consults to decide
//! whether a call's receiver type is concrete enough for direct-virtual
//! dispatch (rule 6) versus falling back to a strategy lookup or the
//! ambiguous-method runtime fallback (rules 7-9). It is not a full
//! structural-subtyping checker — §1's Non-goals explicitly exclude
//! "structural subtyping for nominal class types" — but it does cover
//! the relations the dispatch registry and the decorator applier's
//! abstract-method check actually need.

use crate::id::TypeId;
use crate::kind::Type;
use crate::store::TypeStore;

/// `is_subtype(sub, sup)`: every value of `sub` is usable wherever `sup`
/// is expected, ignoring excess-property checks (irrelevant to dispatch).
#[must_use]
pub fn is_subtype(store: &TypeStore<'_>, sub: TypeId, sup: TypeId) -> bool {
    if sub == sup {
        return true;
    }
    match (store.get(sub), store.get(sup)) {
        (_, Type::Any | Type::Unknown) => true,
        (Type::Any, _) => true,
        (Type::Never, _) => true,
        (_, Type::Never) => false,

        (Type::Union(members), _) => members.iter().all(|&m| is_subtype(store, m, sup)),
        (_, Type::Union(members)) => members.iter().any(|&m| is_subtype(store, sub, m)),

        (_, Type::Intersection(members)) => members.iter().all(|&m| is_subtype(store, sub, m)),
        (Type::Intersection(members), _) => members.iter().any(|&m| is_subtype(store, m, sup)),

        (Type::Literal(crate::kind::LiteralValue::String(_)), Type::String) => true,
        (Type::Literal(crate::kind::LiteralValue::Number(_)), Type::Number) => true,
        (Type::Literal(crate::kind::LiteralValue::Boolean(_)), Type::Boolean) => true,
        (Type::Literal(crate::kind::LiteralValue::BigInt(_)), Type::BigInt) => true,

        (Type::Null, Type::Void) | (Type::Undefined, Type::Void) => true,

        (Type::Array(sub_elem), Type::Array(sup_elem)) => is_subtype(store, *sub_elem, *sup_elem),
        (Type::Promise(sub_elem), Type::Promise(sup_elem)) => is_subtype(store, *sub_elem, *sup_elem),
        (Type::Set(sub_elem), Type::Set(sup_elem)) => is_subtype(store, *sub_elem, *sup_elem),

        (Type::Tuple(sub_elems), Type::Tuple(sup_elems)) => {
            sub_elems.len() >= sup_elems.len()
                && sub_elems.iter().zip(sup_elems.iter()).all(|(a, b)| is_subtype(store, a.ty, b.ty))
        }
        (Type::Tuple(sub_elems), Type::Array(sup_elem)) => {
            sub_elems.iter().all(|el| is_subtype(store, el.ty, *sup_elem))
        }

        (Type::Instance(sub_class), Type::Instance(sup_class)) => class_extends(store, *sub_class, *sup_class),

        (Type::Record(sub_members), Type::Record(sup_members)) => sup_members.iter().all(|(name, sup_sig)| {
            match sub_members.get(name) {
                Some(sub_sig) => is_subtype(store, sub_sig.ty, sup_sig.ty),
                None => sup_sig.optional,
            }
        }),

        (Type::Function(sub_sig), Type::Function(sup_sig)) => {
            sub_sig.params.len() <= sup_sig.params.len()
                && is_subtype(store, sub_sig.return_type, sup_sig.return_type)
                && sub_sig
                    .params
                    .iter()
                    .zip(sup_sig.params.iter())
                    .all(|(sub_p, sup_p)| is_subtype(store, sup_p.ty, sub_p.ty))
        }

        _ => false,
    }
}

/// Walk a class's `superclass` chain looking for `ancestor`.
fn class_extends(store: &TypeStore<'_>, class: TypeId, ancestor: TypeId) -> bool {
    if class == ancestor {
        return true;
    }
    let Type::Class(def) = store.get(class) else { return false };
    match def.superclass {
        Some(parent) => class_extends(store, parent, ancestor),
        None => false,
    }
}

/// Assignability: identical to `is_subtype` except `any` is bidirectional
/// (assignable both to and from everything) and widens literal/`unknown`
/// the same way TypeScript's checker does at a variable's declaration
/// site. For this core that distinction collapses to `is_subtype` plus
/// the `any`-is-bidirectional rule, which `is_subtype` already encodes.
#[must_use]
pub fn assignable_to(store: &TypeStore<'_>, value: TypeId, target: TypeId) -> bool {
    is_subtype(store, value, target)
}

/// Substitute `type_params[i]` with `args[i]` throughout `body`,
/// producing the instantiated member closure for a generic dispatch
/// (InstantiatedGeneric in Type Lattice). Parameters not present in
/// `args` are left as `InferredTypeParameter` placeholders.
pub fn instantiate(store: &mut TypeStore<'_>, body: TypeId, params: &[sharpts_common::Atom], args: &[TypeId]) -> TypeId {
    substitute(store, body, params, args)
}

fn substitute(store: &mut TypeStore<'_>, id: TypeId, params: &[sharpts_common::Atom], args: &[TypeId]) -> TypeId {
    let ty_ref = store.get(id);
    match ty_ref {
        Type::InferredTypeParameter(name) => {
            if let Some(pos) = params.iter().position(|p| p == name) {
                return args.get(pos).copied().unwrap_or(id);
            }
            id
        }
        Type::Array(elem) => {
            let elem = *elem;
            let new_elem = substitute(store, elem, params, args);
            if new_elem == elem { id } else { store.make_array(new_elem) }
        }
        Type::Promise(elem) => {
            let elem = *elem;
            let new_elem = substitute(store, elem, params, args);
            if new_elem == elem { id } else { store.make_promise(new_elem) }
        }
        Type::Union(members) => {
            let members = members.clone();
            let new_members: Vec<_> = members.iter().map(|&m| substitute(store, m, params, args)).collect();
            if new_members == members { id } else { store.make_union(new_members) }
        }
        Type::Intersection(members) => {
            let members = members.clone();
            let new_members: Vec<_> = members.iter().map(|&m| substitute(store, m, params, args)).collect();
            if new_members == members { id } else { store.make_intersection(new_members) }
        }
        _ => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharpts_common::Interner;

    #[test]
    fn primitives_are_self_subtype() {
        let interner = Interner::new();
        let store = TypeStore::new(&interner);
        assert!(is_subtype(&store, store.number(), store.number()));
        assert!(!is_subtype(&store, store.number(), store.string()));
    }

    #[test]
    fn any_and_unknown_absorb() {
        let interner = Interner::new();
        let store = TypeStore::new(&interner);
        assert!(is_subtype(&store, store.number(), store.unknown()));
        assert!(is_subtype(&store, store.any(), store.string()));
        assert!(is_subtype(&store, store.string(), store.any()));
    }

    #[test]
    fn union_member_is_subtype_of_union() {
        let interner = Interner::new();
        let mut store = TypeStore::new(&interner);
        let n = store.number();
        let s = store.string();
        let u = store.make_union(vec![n, s]);
        assert!(is_subtype(&store, n, u));
        assert!(!is_subtype(&store, store.boolean(), u));
    }

    #[test]
    fn array_covariance() {
        let interner = Interner::new();
        let mut store = TypeStore::new(&interner);
        let n = store.number();
        let u = store.make_union(vec![n, store.string()]);
        let arr_n = store.make_array(n);
        let arr_u = store.make_array(u);
        assert!(is_subtype(&store, arr_n, arr_u));
        assert!(!is_subtype(&store, arr_u, arr_n));
    }
}
