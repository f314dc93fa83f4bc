//! Typed operation dispatch.
//!
//! Callers construct operation values; independently registered handlers
//! compete to satisfy them. The engine finds the candidates whose declared
//! type constraint covers the operation's concrete type arguments, tries
//! them in deterministic specificity order (narrowest constraint first),
//! detects recursion when handlers issue nested operations back into the
//! same context, and exposes an advisory reuse policy for callers that
//! want to memoize expensive support checks.
//!
//! The descriptor side (types, kinds, assignability, constraint
//! projection) lives in `opkit-core`; this crate owns the live pieces:
//! the [`Operation`]/[`Handler`] contracts, the specificity comparator,
//! the validated [`HandlerRegistry`], and the re-entrant
//! [`DispatchContext`].

mod context;
mod errors;
mod handler;
mod operation;
mod registry;
mod resolver;
mod specificity;

#[cfg(test)]
mod tests;

pub use context::DispatchContext;
pub use errors::{ConfigError, DispatchError, DispatchResult};
pub use handler::{Handler, HandlerTag};
pub use operation::{Fragment, OpIdentity, OpValue, Operation, ResultSlot};
pub use registry::{Candidates, HandlerRegistry};
pub use resolver::matches;
pub use specificity::compare_specificity;
