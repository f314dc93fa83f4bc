//! One-time validation and indexing of the handler set for a session.

use crate::errors::ConfigError;
use crate::handler::{Handler, HandlerTag};
use crate::specificity::compare_specificity;
use indexmap::IndexMap;
use opkit_core::{Bound, Catalog, KindChain, KindId};
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tracing::debug;

/// Immutable index of every handler in a dispatch session, partitioned
/// into per-kind buckets sorted by specificity.
///
/// Construction validates the whole set and fails fast on wiring bugs;
/// once built the registry is read-only and freely shared across contexts
/// (and threads).
pub struct HandlerRegistry {
    catalog: Arc<Catalog>,
    buckets: IndexMap<KindId, Vec<Arc<dyn Handler>>>,
}

impl HandlerRegistry {
    pub fn new(
        catalog: Arc<Catalog>,
        handlers: Vec<Arc<dyn Handler>>,
    ) -> Result<Self, ConfigError> {
        let supplied: FxHashSet<HandlerTag> = handlers.iter().map(|h| h.tag()).collect();
        for handler in &handlers {
            let missing: Vec<&'static str> = handler
                .dependencies()
                .into_iter()
                .filter(|dep| !supplied.contains(dep))
                .map(|dep| dep.name())
                .collect();
            if !missing.is_empty() {
                return Err(ConfigError::MissingDependency {
                    handler: handler.tag().name(),
                    missing,
                });
            }
            let projection = handler.projection();
            let expected = catalog.param_count(projection.kind);
            if projection.args.len() != expected {
                return Err(ConfigError::ProjectionArity {
                    handler: handler.tag().name(),
                    kind: catalog.kind_name(projection.kind).to_string(),
                    given: projection.args.len(),
                    expected,
                });
            }
            if projection.args.iter().any(|b| matches!(b, Bound::Param(_))) {
                return Err(ConfigError::OpenConstraint {
                    handler: handler.tag().name(),
                    constraint: catalog.render_projection(projection),
                });
            }
        }

        let mut buckets: IndexMap<KindId, Vec<Arc<dyn Handler>>> = IndexMap::new();
        for handler in handlers {
            buckets
                .entry(handler.projection().kind)
                .or_default()
                .push(handler);
        }
        for (kind, bucket) in buckets.iter_mut() {
            // Stable sort: equal constraints keep registration order.
            bucket.sort_by(|a, b| compare_specificity(&catalog, a.projection(), b.projection()));
            debug!(
                kind = catalog.kind_name(*kind),
                handlers = bucket.len(),
                "handler bucket built"
            );
        }

        Ok(HandlerRegistry { catalog, buckets })
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// The specificity-sorted bucket for one exact kind (empty slice if
    /// nothing registered under it).
    pub fn bucket(&self, kind: KindId) -> &[Arc<dyn Handler>] {
        self.buckets.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Ordered candidate sequence for an operation of this runtime kind:
    /// walks the kind chain most-derived first, yielding each existing
    /// bucket in turn. Lazy; callers stop consuming once a handler
    /// succeeds.
    pub fn candidates_for(&self, kind: KindId) -> Candidates<'_> {
        Candidates {
            registry: self,
            chain: self.catalog.kind_chain(kind),
            bucket: [].iter(),
        }
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers: usize = self.buckets.values().map(Vec::len).sum();
        f.debug_struct("HandlerRegistry")
            .field("kinds", &self.buckets.len())
            .field("handlers", &handlers)
            .finish()
    }
}

/// Lazy iterator over the candidate handlers for one operation kind.
pub struct Candidates<'a> {
    registry: &'a HandlerRegistry,
    chain: KindChain<'a>,
    bucket: std::slice::Iter<'a, Arc<dyn Handler>>,
}

impl<'a> Iterator for Candidates<'a> {
    type Item = &'a Arc<dyn Handler>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(handler) = self.bucket.next() {
                return Some(handler);
            }
            let kind = self.chain.next()?;
            self.bucket = self.registry.bucket(kind).iter();
        }
    }
}
