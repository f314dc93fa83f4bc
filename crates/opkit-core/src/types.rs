//! Concrete type descriptors.
//!
//! The engine never reflects over runtime types; instead every type that
//! participates in dispatch is registered once as an explicit descriptor:
//! a name, zero or more supertype edges, and optionally a *normalized twin*
//! (the primitive/boxed pairing, assignable in both directions). The
//! assignability walk itself lives on [`Catalog`](crate::Catalog).

use crate::interner::Atom;
use smallvec::SmallVec;

/// Interned identifier for a registered concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    pub(crate) fn from_index(index: usize) -> Self {
        TypeId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Immutable descriptor record for one registered type.
#[derive(Debug, Clone)]
pub(crate) struct TypeData {
    pub(crate) name: Atom,
    pub(crate) supers: SmallVec<[TypeId; 2]>,
    pub(crate) twin: Option<TypeId>,
}

/// Registration-time description of a concrete type.
///
/// ```
/// use opkit_core::{CatalogBuilder, TypeSpec};
///
/// let mut builder = CatalogBuilder::new();
/// let object = builder.ty(TypeSpec::new("Object")).unwrap();
/// let number = builder.ty(TypeSpec::new("Number").extends(object)).unwrap();
/// let integer = builder.ty(TypeSpec::new("Integer").extends(number)).unwrap();
/// // `int` is assignable wherever `Integer` is required, and vice versa.
/// let int = builder.ty(TypeSpec::new("int").twin_of(integer)).unwrap();
///
/// let catalog = builder.build();
/// assert!(catalog.assignable(int, number));
/// ```
#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub(crate) name: String,
    pub(crate) supers: Vec<TypeId>,
    pub(crate) twin: Option<TypeId>,
}

impl TypeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        TypeSpec {
            name: name.into(),
            supers: Vec::new(),
            twin: None,
        }
    }

    /// Adds an assignability edge: values of this type satisfy `superty`.
    pub fn extends(mut self, superty: TypeId) -> Self {
        self.supers.push(superty);
        self
    }

    /// Pairs this type with `other` as normalized twins. The link is
    /// symmetric; each side is assignable wherever the other is required.
    pub fn twin_of(mut self, other: TypeId) -> Self {
        self.twin = Some(other);
        self
    }
}
