//! String interning for type, kind, and parameter names.
//!
//! Names are interned once while the catalog is built and resolved by
//! `Atom` afterwards, so every hot-path comparison is a u32 compare.

use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Interned string handle. Cheap to copy, compare, and hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(u32);

impl Atom {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Append-only string interner.
///
/// Mutation only happens through [`CatalogBuilder`](crate::CatalogBuilder);
/// once the catalog is built the interner is read-only, which is why no
/// sharding or locking is needed here.
#[derive(Debug, Default)]
pub struct Interner {
    map: FxHashMap<Arc<str>, Atom>,
    strings: Vec<Arc<str>>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `text`, returning the existing atom if already present.
    pub fn intern(&mut self, text: &str) -> Atom {
        if let Some(&atom) = self.map.get(text) {
            return atom;
        }
        let atom = Atom(self.strings.len() as u32);
        let entry: Arc<str> = Arc::from(text);
        self.strings.push(Arc::clone(&entry));
        self.map.insert(entry, atom);
        atom
    }

    /// Resolves an atom back to its text. Atoms are only minted by
    /// [`intern`](Self::intern), so the index is always in range.
    pub fn resolve(&self, atom: Atom) -> &str {
        &self.strings[atom.index()]
    }

    /// Looks up an already-interned string without inserting.
    pub fn lookup(&self, text: &str) -> Option<Atom> {
        self.map.get(text).copied()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
