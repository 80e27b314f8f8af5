//! String interning for identifier and property-name deduplication.
//!
//! AST identifiers, state-machine field names, and dispatch-registry method
//! names are compared and hashed far more often than they're printed. An
//! `Atom` is a small `Copy` handle into an `Interner`'s backing table so
//! those comparisons become integer equality instead of string equality.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// An interned string handle.
///
/// Cheap to copy, compare, and hash. Two `Atom`s from the same `Interner`
/// are equal iff the strings they denote are equal.
///
/// Serialized as a bare integer. This only round-trips meaningfully when
/// the deserializing side rebuilds the same `Interner` the atoms were
/// minted from (true of the AST's own `NodeId`s and, in this build, of a
/// host front end that serializes its interner table alongside the tree)
/// — `sharpts-cli` does exactly that (see `cli::ast_io`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Atom(u32);

impl Atom {
    /// Sentinel for "no atom" (e.g. an unnamed function expression).
    pub const NONE: Atom = Atom(u32::MAX);

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

/// A simple string interner backed by a growable vector and a lookup map.
///
/// Not thread-safe; each compilation unit owns one `Interner` for the
/// duration of the pipeline (await analysis, state-machine building,
/// emission all share it by reference).
#[derive(Debug, Default)]
pub struct Interner {
    strings: Vec<Box<str>>,
    lookup: FxHashMap<Box<str>, Atom>,
}

impl Interner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `text`, returning an existing `Atom` if already present.
    pub fn intern(&mut self, text: &str) -> Atom {
        if let Some(&atom) = self.lookup.get(text) {
            return atom;
        }
        let atom = Atom(self.strings.len() as u32);
        let boxed: Box<str> = text.into();
        self.strings.push(boxed.clone());
        self.lookup.insert(boxed, atom);
        atom
    }

    /// Resolve an `Atom` back to its string. Panics if the atom was not
    /// produced by this interner.
    #[must_use]
    pub fn resolve(&self, atom: Atom) -> &str {
        if atom.is_none() {
            return "";
        }
        &self.strings[atom.0 as usize]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_deduplicates() {
        let mut interner = Interner::new();
        let a = interner.intern("hoisted_x");
        let b = interner.intern("hoisted_x");
        let c = interner.intern("hoisted_y");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.resolve(a), "hoisted_x");
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn none_resolves_to_empty() {
        let interner = Interner::new();
        assert_eq!(interner.resolve(Atom::NONE), "");
        assert!(Atom::NONE.is_none());
    }
}
