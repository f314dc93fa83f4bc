//! Descriptor layer for the opkit dispatch engine.
//!
//! This crate provides the foundational value types the dispatch engine
//! matches against:
//! - String interning (`Atom`, `Interner`) for type/kind/parameter names
//! - Concrete type descriptors with an explicit assignability relation,
//!   including primitive/boxed twin normalization (`TypeId`, `TypeSpec`)
//! - Operation-kind descriptors: hierarchy, declared type parameters,
//!   parent-argument aliasing (`KindId`, `KindSpec`)
//! - Constraint projections and their resolution up a kind chain
//!   (`KindProjection`, `Bound`, `Catalog::resolve_bound`)
//! - The immutable `Catalog` registry and its fail-fast builder
//! - The advisory reuse policy (`ReusePhase`)
//!
//! Everything here is plain data built once at startup; the engine crate
//! layers the live evaluation loop on top.

pub mod catalog;
pub mod interner;
pub mod kinds;
pub mod reuse;
pub mod types;

pub use catalog::{Catalog, CatalogBuilder, CatalogError, KindChain};
pub use interner::{Atom, Interner};
pub use kinds::{Bound, KindId, KindProjection, KindSpec, ParamRef, ParentArg};
pub use reuse::{ReusePhase, normalize_reuse};
pub use types::{TypeId, TypeSpec};

#[cfg(test)]
mod tests;
