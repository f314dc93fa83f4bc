//! The handler contract.

use crate::context::DispatchContext;
use crate::errors::DispatchResult;
use crate::operation::Operation;
use opkit_core::{KindProjection, ReusePhase};
use std::any::TypeId as RustTypeId;

/// Identity of a handler *type*. Used only for dependency validation at
/// registry construction, never for ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerTag {
    id: RustTypeId,
    name: &'static str,
}

impl HandlerTag {
    pub fn of<T: 'static>() -> Self {
        HandlerTag {
            id: RustTypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// A candidate implementation for some operation kind.
///
/// Handlers are constructed once, registered into a
/// [`HandlerRegistry`](crate::HandlerRegistry), and live for the owning
/// session. They must be closed implementations of their declared
/// constraint: the projection may bound each parameter or leave it
/// wildcard, but may not reference another parameter.
pub trait Handler: Send + Sync + 'static {
    /// The exact kind this handler registers under, plus its declared
    /// type constraint over that kind's parameters.
    fn projection(&self) -> &KindProjection;

    /// This handler type's identity; conventionally `HandlerTag::of::<Self>()`.
    fn tag(&self) -> HandlerTag;

    /// Handler types assumed to be present in the same registry. Checked
    /// at construction; a missing dependency is a fatal configuration
    /// error.
    fn dependencies(&self) -> Vec<HandlerTag> {
        Vec::new()
    }

    /// Per-handler override of the kind-level reuse declaration. `None`
    /// inherits the kind's policy from the catalog.
    fn reuse_policy(&self) -> Option<ReusePhase> {
        None
    }

    /// Whether this handler can service this specific instance. Called
    /// only after the declared constraint already matched; free to probe
    /// nested operations through `cx`.
    fn supports(&self, cx: &DispatchContext, op: &dyn Operation) -> bool;

    /// Attempts the work. Marks the operation's slot successful on
    /// success; leaving it untouched lets the next candidate try. Errors
    /// propagate to the caller unwrapped.
    fn perform(&self, cx: &DispatchContext, op: &dyn Operation) -> DispatchResult<()>;
}
