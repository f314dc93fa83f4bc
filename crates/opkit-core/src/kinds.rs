//! Operation-kind descriptors.
//!
//! An operation kind is the declared shape of a unit of work, e.g.
//! `Convert<SOURCE, TARGET>`. Kinds form a single-parent hierarchy; a kind
//! introduces its own type parameters and binds each of its parent's
//! parameters to a concrete type, to one of its own parameters (aliasing),
//! or leaves it open.
//!
//! A handler declares the kind it services plus a [`KindProjection`]: one
//! [`Bound`] per parameter of that kind. Bound resolution up the chain is
//! implemented by [`Catalog::resolve_bound`](crate::Catalog::resolve_bound).

use crate::interner::Atom;
use crate::types::TypeId;
use smallvec::SmallVec;

/// Interned identifier for a registered operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KindId(pub(crate) u32);

impl KindId {
    pub(crate) fn from_index(index: usize) -> Self {
        KindId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Addresses one declared type parameter: the kind level that introduces it
/// plus its index at that level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamRef {
    pub kind: KindId,
    pub index: u8,
}

impl ParamRef {
    pub fn new(kind: KindId, index: u8) -> Self {
        ParamRef { kind, index }
    }
}

/// A declared bound for one type parameter slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// No constraint; any actual type satisfies the slot.
    Any,
    /// The actual type must be assignable to this type.
    Exact(TypeId),
    /// A reference to another declared parameter. Legal only inside kind
    /// descriptors while bounds are projected upward; a handler whose
    /// declared projection still contains one is an open (unclosed)
    /// implementation and is rejected at registry construction.
    Param(ParamRef),
}

/// How a kind binds one of its parent's type parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentArg {
    /// Fixed to a concrete type: `ConvertToText<S>` fixes TARGET to `Text`.
    Type(TypeId),
    /// Aliased to one of this kind's own parameters, by local index:
    /// `Convert<S, T>` passes both of its parameters up to `Transform`.
    Own(u8),
    /// Left open; this level carries no binding for the parent slot.
    Open,
}

/// Immutable descriptor record for one registered kind.
#[derive(Debug, Clone)]
pub(crate) struct KindData {
    pub(crate) name: Atom,
    pub(crate) parent: Option<KindId>,
    pub(crate) parent_args: SmallVec<[ParentArg; 2]>,
    pub(crate) params: SmallVec<[Atom; 2]>,
    pub(crate) result_param: Option<u8>,
}

/// Registration-time description of an operation kind.
#[derive(Debug, Clone)]
pub struct KindSpec {
    pub(crate) name: String,
    pub(crate) parent: Option<(KindId, Vec<ParentArg>)>,
    pub(crate) params: Vec<String>,
    pub(crate) result: Option<String>,
}

impl KindSpec {
    pub fn new(name: impl Into<String>) -> Self {
        KindSpec {
            name: name.into(),
            parent: None,
            params: Vec::new(),
            result: None,
        }
    }

    /// Declares one type parameter introduced at this level.
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push(name.into());
        self
    }

    /// Declares the parent kind and how this kind binds each of the
    /// parent's parameters.
    pub fn extends(mut self, parent: KindId, args: impl IntoIterator<Item = ParentArg>) -> Self {
        self.parent = Some((parent, args.into_iter().collect()));
        self
    }

    /// Names which of this level's parameters is the result-type
    /// parameter. Operations of this kind (or any subkind) must resolve it
    /// to a concrete type.
    pub fn result(mut self, param: impl Into<String>) -> Self {
        self.result = Some(param.into());
        self
    }
}

/// A handler's declared operation-type projection: the exact kind it
/// registers under plus one bound per parameter of that kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindProjection {
    pub kind: KindId,
    pub args: SmallVec<[Bound; 2]>,
}

impl KindProjection {
    pub fn new(kind: KindId, args: impl IntoIterator<Item = Bound>) -> Self {
        KindProjection {
            kind,
            args: args.into_iter().collect(),
        }
    }

    /// Projection with every slot unconstrained ("any SOURCE, any TARGET").
    pub fn any(kind: KindId, arity: usize) -> Self {
        KindProjection {
            kind,
            args: std::iter::repeat_n(Bound::Any, arity).collect(),
        }
    }
}
