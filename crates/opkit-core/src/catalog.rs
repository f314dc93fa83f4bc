//! The catalog: one-time construction and read-only querying of every
//! type and kind descriptor a dispatch session knows about.
//!
//! [`CatalogBuilder`] validates eagerly and fails fast with a named
//! [`CatalogError`]; the built [`Catalog`] is immutable and freely shared
//! across contexts (and threads) for the lifetime of a session.
//!
//! The catalog also hosts the two relations the engine is built on:
//! - [`assignable`](Catalog::assignable) — subtype walk over supertype
//!   edges with primitive/boxed twin normalization
//! - [`resolve_bound`](Catalog::resolve_bound) /
//!   [`constraint_holds`](Catalog::constraint_holds) — projecting a
//!   handler's declared bounds up an operation's kind chain and checking
//!   them against the operation's actual type arguments

use crate::interner::{Atom, Interner};
use crate::kinds::{Bound, KindData, KindId, KindProjection, KindSpec, ParamRef, ParentArg};
use crate::reuse::{ReusePhase, normalize_reuse};
use crate::types::{TypeData, TypeId, TypeSpec};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::trace;

/// Fatal catalog construction errors. These are wiring bugs, not runtime
/// conditions: construction fails fast and names the offender.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("type `{name}` is already registered")]
    DuplicateType { name: String },

    #[error("kind `{name}` is already registered")]
    DuplicateKind { name: String },

    #[error("type `{name}` names a twin that is already paired")]
    TwinTaken { name: String },

    #[error("kind `{kind}` binds {given} parent arguments, but `{parent}` declares {expected} parameters")]
    ParentArity {
        kind: String,
        parent: String,
        given: usize,
        expected: usize,
    },

    #[error("kind `{kind}` aliases a parent argument to unknown own parameter index {index}")]
    BadAlias { kind: String, index: u8 },

    #[error("kind `{kind}` names unknown result parameter `{param}`")]
    UnknownResultParam { kind: String, param: String },
}

/// Immutable registry of type and kind descriptors plus reuse
/// declarations.
#[derive(Debug, Default)]
pub struct Catalog {
    interner: Interner,
    types: Vec<TypeData>,
    types_by_name: FxHashMap<Atom, TypeId>,
    kinds: Vec<KindData>,
    kinds_by_name: FxHashMap<Atom, KindId>,
    reuse: FxHashMap<KindId, ReusePhase>,
}

/// Builder for [`Catalog`]. Registration order is meaningful only for
/// atom/id allocation; all lookups afterwards are by id or name.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    catalog: Catalog,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a concrete type descriptor.
    pub fn ty(&mut self, spec: TypeSpec) -> Result<TypeId, CatalogError> {
        let name = self.catalog.interner.intern(&spec.name);
        if self.catalog.types_by_name.contains_key(&name) {
            return Err(CatalogError::DuplicateType { name: spec.name });
        }
        let id = TypeId::from_index(self.catalog.types.len());
        if let Some(twin) = spec.twin {
            let other = &mut self.catalog.types[twin.index()];
            if other.twin.is_some() {
                return Err(CatalogError::TwinTaken { name: spec.name });
            }
            other.twin = Some(id);
        }
        self.catalog.types.push(TypeData {
            name,
            supers: spec.supers.into_iter().collect(),
            twin: spec.twin,
        });
        self.catalog.types_by_name.insert(name, id);
        Ok(id)
    }

    /// Registers an operation-kind descriptor.
    pub fn kind(&mut self, spec: KindSpec) -> Result<KindId, CatalogError> {
        let name = self.catalog.interner.intern(&spec.name);
        if self.catalog.kinds_by_name.contains_key(&name) {
            return Err(CatalogError::DuplicateKind { name: spec.name });
        }
        let mut parent = None;
        let mut parent_args: SmallVec<[ParentArg; 2]> = SmallVec::new();
        if let Some((parent_id, args)) = spec.parent {
            let expected = self.catalog.kinds[parent_id.index()].params.len();
            if args.len() != expected {
                return Err(CatalogError::ParentArity {
                    kind: spec.name,
                    parent: self.catalog.kind_name(parent_id).to_string(),
                    given: args.len(),
                    expected,
                });
            }
            for arg in &args {
                if let ParentArg::Own(index) = arg {
                    if *index as usize >= spec.params.len() {
                        return Err(CatalogError::BadAlias {
                            kind: spec.name,
                            index: *index,
                        });
                    }
                }
            }
            parent = Some(parent_id);
            parent_args = args.into_iter().collect();
        }
        let result_param = match &spec.result {
            None => None,
            Some(result) => match spec.params.iter().position(|p| p == result) {
                Some(index) => Some(index as u8),
                None => {
                    return Err(CatalogError::UnknownResultParam {
                        kind: spec.name,
                        param: result.clone(),
                    });
                }
            },
        };
        let params = spec
            .params
            .iter()
            .map(|p| self.catalog.interner.intern(p))
            .collect();
        let id = KindId::from_index(self.catalog.kinds.len());
        self.catalog.kinds.push(KindData {
            name,
            parent,
            parent_args,
            params,
            result_param,
        });
        self.catalog.kinds_by_name.insert(name, id);
        Ok(id)
    }

    /// Attaches an explicit reuse declaration to a kind. Subkinds without
    /// their own declaration inherit the nearest ancestor's.
    pub fn reusable(&mut self, kind: KindId, phases: ReusePhase) {
        self.catalog.reuse.insert(kind, normalize_reuse(phases));
    }

    pub fn build(self) -> Catalog {
        trace!(
            types = self.catalog.types.len(),
            kinds = self.catalog.kinds.len(),
            "catalog built"
        );
        self.catalog
    }
}

impl Catalog {
    // ----- name lookups ---------------------------------------------------

    pub fn type_id(&self, name: &str) -> Option<TypeId> {
        let atom = self.interner.lookup(name)?;
        self.types_by_name.get(&atom).copied()
    }

    pub fn kind_id(&self, name: &str) -> Option<KindId> {
        let atom = self.interner.lookup(name)?;
        self.kinds_by_name.get(&atom).copied()
    }

    pub fn type_name(&self, ty: TypeId) -> &str {
        self.interner.resolve(self.types[ty.index()].name)
    }

    pub fn kind_name(&self, kind: KindId) -> &str {
        self.interner.resolve(self.kinds[kind.index()].name)
    }

    pub fn param_name(&self, param: ParamRef) -> &str {
        self.interner
            .resolve(self.kinds[param.kind.index()].params[param.index as usize])
    }

    pub fn param_count(&self, kind: KindId) -> usize {
        self.kinds[kind.index()].params.len()
    }

    /// The result-type parameter declared at this level, if any. Inherited
    /// result parameters are found by walking [`kind_chain`](Self::kind_chain).
    pub fn result_param(&self, kind: KindId) -> Option<ParamRef> {
        self.kinds[kind.index()]
            .result_param
            .map(|index| ParamRef { kind, index })
    }

    pub fn parent(&self, kind: KindId) -> Option<KindId> {
        self.kinds[kind.index()].parent
    }

    // ----- hierarchy ------------------------------------------------------

    /// Iterator over `kind` and its ancestors, most-derived first.
    pub fn kind_chain(&self, kind: KindId) -> KindChain<'_> {
        KindChain {
            catalog: self,
            next: Some(kind),
        }
    }

    /// Reflexive-transitive parent-chain test.
    pub fn kind_extends(&self, sub: KindId, ancestor: KindId) -> bool {
        self.kind_chain(sub).any(|k| k == ancestor)
    }

    // ----- assignability --------------------------------------------------

    /// Whether a value of type `actual` satisfies a slot requiring
    /// `declared`.
    ///
    /// Walks supertype edges upward from `actual`, stepping through
    /// normalized twins in both directions, so `int` reaches `Number` via
    /// `Integer` and `Integer` satisfies a slot declared as `int`. An
    /// unrelated type is a hard fail; no coercion is attempted here.
    pub fn assignable(&self, actual: TypeId, declared: TypeId) -> bool {
        let mut seen = FxHashSet::default();
        let mut work: SmallVec<[TypeId; 8]> = SmallVec::new();
        work.push(actual);
        while let Some(ty) = work.pop() {
            if !seen.insert(ty) {
                continue;
            }
            if ty == declared {
                return true;
            }
            let data = &self.types[ty.index()];
            if let Some(twin) = data.twin {
                work.push(twin);
            }
            work.extend(data.supers.iter().copied());
        }
        false
    }

    // ----- constraint resolution ------------------------------------------

    /// Resolves what a projection requires for one declared parameter.
    ///
    /// Starting from the projection's own bounds, each step maps the
    /// current level's bounds onto its parent's parameters through the
    /// parent-argument list, following parameter-to-parameter aliasing,
    /// until `param`'s declaring level is reached. Parameters declared
    /// below the projection's kind (or on an unrelated branch) resolve to
    /// [`Bound::Any`]: the projection says nothing about them.
    pub fn resolve_bound(&self, projection: &KindProjection, param: ParamRef) -> Bound {
        let mut kind = projection.kind;
        let mut bounds = projection.args.clone();
        loop {
            if kind == param.kind {
                return bounds.get(param.index as usize).copied().unwrap_or(Bound::Any);
            }
            let data = &self.kinds[kind.index()];
            let Some(parent) = data.parent else {
                return Bound::Any;
            };
            let mut up: SmallVec<[Bound; 2]> = SmallVec::new();
            for arg in &data.parent_args {
                up.push(match arg {
                    ParentArg::Type(ty) => Bound::Exact(*ty),
                    ParentArg::Own(index) => {
                        bounds.get(*index as usize).copied().unwrap_or(Bound::Any)
                    }
                    ParentArg::Open => Bound::Any,
                });
            }
            bounds = up;
            kind = parent;
        }
    }

    /// Spreads an operation's concrete type arguments for its most-derived
    /// kind across every level of the chain, following the same
    /// parameter-to-parameter aliasing as [`resolve_bound`](Self::resolve_bound).
    ///
    /// `args` gives one entry per parameter of `kind` (in declaration
    /// order); `None` marks a slot the operation cannot resolve. The
    /// returned map answers `type_arg` queries at any level, which is the
    /// usual way a concrete operation implements its accessor.
    pub fn bind_actuals(
        &self,
        kind: KindId,
        args: &[Option<TypeId>],
    ) -> FxHashMap<ParamRef, TypeId> {
        let mut out = FxHashMap::default();
        let mut current: SmallVec<[Option<TypeId>; 2]> = args.iter().copied().collect();
        let mut level = kind;
        loop {
            for (index, actual) in current.iter().enumerate() {
                if let Some(ty) = actual {
                    out.insert(
                        ParamRef {
                            kind: level,
                            index: index as u8,
                        },
                        *ty,
                    );
                }
            }
            let data = &self.kinds[level.index()];
            let Some(parent) = data.parent else {
                return out;
            };
            let mut up: SmallVec<[Option<TypeId>; 2]> = SmallVec::new();
            for arg in &data.parent_args {
                up.push(match arg {
                    ParentArg::Type(ty) => Some(*ty),
                    ParentArg::Own(index) => current.get(*index as usize).copied().flatten(),
                    ParentArg::Open => None,
                });
            }
            current = up;
            level = parent;
        }
    }

    /// The per-parameter half of the matcher: walks `kind`'s chain and, for
    /// every declared parameter the projection bounds, requires the actual
    /// type supplied by `actual` to be assignable to the bound.
    ///
    /// Pure: no side effects, short-circuits on the first mismatch. An
    /// actual the operation cannot produce for a bounded parameter is a
    /// mismatch, as is a still-open [`Bound::Param`].
    pub fn constraint_holds(
        &self,
        kind: KindId,
        projection: &KindProjection,
        actual: &mut dyn FnMut(ParamRef) -> Option<TypeId>,
    ) -> bool {
        for level in self.kind_chain(kind) {
            for index in 0..self.param_count(level) {
                let param = ParamRef {
                    kind: level,
                    index: index as u8,
                };
                let declared = match self.resolve_bound(projection, param) {
                    Bound::Any => continue,
                    Bound::Exact(ty) => ty,
                    Bound::Param(_) => return false,
                };
                match actual(param) {
                    Some(ty) if self.assignable(ty, declared) => {}
                    _ => return false,
                }
            }
        }
        true
    }

    // ----- reuse policy ---------------------------------------------------

    /// Advisory: whether a result for `phase` may be treated as cacheable
    /// for operations of this kind. The nearest ancestor with an explicit
    /// declaration decides; with no declaration anywhere, everything is
    /// reusable.
    pub fn can_reuse(&self, kind: KindId, phase: ReusePhase) -> bool {
        for level in self.kind_chain(kind) {
            if let Some(declared) = self.reuse.get(&level) {
                return declared.contains(phase);
            }
        }
        true
    }

    // ----- rendering ------------------------------------------------------

    /// Human-readable form of a projection, e.g. `Convert<String, *>`.
    /// Also the deterministic fallback ordering key for the specificity
    /// comparator.
    pub fn render_projection(&self, projection: &KindProjection) -> String {
        let mut out = String::from(self.kind_name(projection.kind));
        if !projection.args.is_empty() {
            out.push('<');
            for (i, bound) in projection.args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                match bound {
                    Bound::Any => out.push('*'),
                    Bound::Exact(ty) => out.push_str(self.type_name(*ty)),
                    Bound::Param(param) => out.push_str(self.param_name(*param)),
                }
            }
            out.push('>');
        }
        out
    }
}

/// Iterator over a kind and its ancestors, most-derived first.
pub struct KindChain<'a> {
    catalog: &'a Catalog,
    next: Option<KindId>,
}

impl Iterator for KindChain<'_> {
    type Item = KindId;

    fn next(&mut self) -> Option<KindId> {
        let current = self.next?;
        self.next = self.catalog.parent(current);
        Some(current)
    }
}
