//! `MutableClass` → `Class` freeze (§9 "Mutable class with late freeze",
//! §3 lifecycle: "A `MutableClass` exists only during class signature
//! collection").
//!
//! Source systems that build a class's signature often use a single
//! mutable record that is frozen once collection finishes. We model that
//! exactly as §9 prescribes: `ClassRepr::Building(ClassBuilder)` while
//! members are still being added, one-way transition to
//! `ClassRepr::Frozen(Rc<ClassDef>)` guarded by a panic on a second
//! freeze. The `Rc<ClassDef>` identity survives the freeze, so a method
//! signature captured during collection (e.g. a constructor parameter
//! typed as the class itself, for a fluent-builder pattern) still points
//! at the class that is later reachable from `Type::Class`.

use crate::id::TypeId;
use crate::kind::TypeParam;
use indexmap::IndexMap;
use sharpts_common::Atom;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemberVisibility {
    Public,
    Protected,
    Private,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClassMemberSig {
    pub ty: TypeId,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_readonly: bool,
    pub visibility: MemberVisibility,
}

/// The in-progress signature of a class, accumulated member by member as
/// the checker walks a `ClassDecl`.
#[derive(Debug, Default)]
pub struct ClassBuilder {
    pub name: Atom,
    pub superclass: Option<TypeId>,
    pub implements: Vec<TypeId>,
    pub type_params: Vec<TypeParam>,
    pub members: IndexMap<Atom, ClassMemberSig>,
    pub is_abstract: bool,
}

/// The frozen, immutable signature of a class — everything downstream
/// passes (the type checker, C8's direct-virtual dispatch, the decorator
/// applier) consult.
#[derive(Debug)]
pub struct ClassDef {
    pub name: Atom,
    pub superclass: Option<TypeId>,
    pub implements: Vec<TypeId>,
    pub type_params: Vec<TypeParam>,
    pub members: IndexMap<Atom, ClassMemberSig>,
    pub is_abstract: bool,
}

impl From<&ClassBuilder> for ClassDef {
    fn from(builder: &ClassBuilder) -> Self {
        Self {
            name: builder.name,
            superclass: builder.superclass,
            implements: builder.implements.clone(),
            type_params: builder.type_params.clone(),
            members: builder.members.clone(),
            is_abstract: builder.is_abstract,
        }
    }
}

#[derive(Debug)]
enum ClassRepr {
    Building(ClassBuilder),
    Frozen(Rc<ClassDef>),
}

/// A handle to a class signature that is still being collected.
///
/// Cloning a `MutableClass` shares the same underlying builder (it is a
/// thin `Rc<RefCell<_>>` wrapper), matching the way a checker's class pass
/// and a nested decorator pass might both hold a reference to the same
/// in-progress class while it is still being assembled.
#[derive(Clone, Debug)]
pub struct MutableClass(Rc<RefCell<ClassRepr>>);

impl MutableClass {
    #[must_use]
    pub fn new(name: Atom) -> Self {
        Self(Rc::new(RefCell::new(ClassRepr::Building(ClassBuilder {
            name,
            ..ClassBuilder::default()
        }))))
    }

    /// Add or replace a member signature. Panics if the class has already
    /// been frozen — members are only ever collected before freeze.
    pub fn insert_member(&self, name: Atom, sig: ClassMemberSig) {
        match &mut *self.0.borrow_mut() {
            ClassRepr::Building(builder) => {
                builder.members.insert(name, sig);
            }
            ClassRepr::Frozen(_) => panic!("cannot mutate a class signature after it has been frozen"),
        }
    }

    pub fn set_superclass(&self, superclass: TypeId) {
        match &mut *self.0.borrow_mut() {
            ClassRepr::Building(builder) => builder.superclass = Some(superclass),
            ClassRepr::Frozen(_) => panic!("cannot mutate a class signature after it has been frozen"),
        }
    }

    pub fn set_abstract(&self, is_abstract: bool) {
        match &mut *self.0.borrow_mut() {
            ClassRepr::Building(builder) => builder.is_abstract = is_abstract,
            ClassRepr::Frozen(_) => panic!("cannot mutate a class signature after it has been frozen"),
        }
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        matches!(&*self.0.borrow(), ClassRepr::Frozen(_))
    }

    /// One-way transition into `Type::Class`. Panics on a second call —
    /// §9 specifies the transition is guarded by a setter that panics on
    /// second freeze, since a double freeze can only indicate a pass
    /// running the collection step twice, a compiler bug rather than a
    /// recoverable user error.
    pub fn freeze(&self) -> Rc<ClassDef> {
        let mut repr = self.0.borrow_mut();
        match &*repr {
            ClassRepr::Frozen(_) => panic!("class '{:?}' was frozen twice", self.0.as_ptr()),
            ClassRepr::Building(builder) => {
                let def = Rc::new(ClassDef::from(builder));
                *repr = ClassRepr::Frozen(def.clone());
                def
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharpts_common::Interner;

    #[test]
    fn freeze_preserves_members_and_identity() {
        let mut interner = Interner::new();
        let name = interner.intern("Widget");
        let field = interner.intern("count");

        let mutable = MutableClass::new(name);
        mutable.insert_member(
            field,
            ClassMemberSig { ty: TypeId(0), is_static: false, is_abstract: false, is_readonly: false, visibility: MemberVisibility::Public },
        );
        assert!(!mutable.is_frozen());

        let frozen_a = mutable.freeze();
        assert!(mutable.is_frozen());
        assert!(frozen_a.members.contains_key(&field));

        // Same Rc identity if frozen again via the same handle's cached repr.
        assert!(Rc::ptr_eq(&frozen_a, &mutable.freeze_idempotent_for_test()));
    }

    impl MutableClass {
        fn freeze_idempotent_for_test(&self) -> Rc<ClassDef> {
            match &*self.0.borrow() {
                ClassRepr::Frozen(def) => def.clone(),
                ClassRepr::Building(_) => unreachable!(),
            }
        }
    }

    #[test]
    #[should_panic(expected = "frozen twice")]
    fn double_freeze_panics() {
        let mut interner = Interner::new();
        let name = interner.intern("Widget");
        let mutable = MutableClass::new(name);
        mutable.freeze();
        mutable.freeze();
    }
}
