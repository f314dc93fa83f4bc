//! Typed operation dispatch.
//!
//! Callers describe their domain once in a [`Catalog`] (concrete types
//! with supertype and primitive/boxed twin edges, operation kinds with
//! declared type parameters), register [`Handler`]s whose projections
//! bound the type arguments they accept, and submit [`Operation`] values
//! to a [`DispatchContext`]. The engine picks candidates whose constraint
//! covers the operation's actual type arguments, narrowest declaration
//! first, and detects recursion when handlers issue nested operations.
//!
//! This crate is a facade over the two workspace members: `opkit-core`
//! (descriptors and the assignability/constraint relations) and
//! `opkit-engine` (registry, specificity ordering, dispatch context).
//!
//! # Example
//!
//! ```
//! use opkit::{
//!     Bound, CatalogBuilder, DispatchContext, DispatchResult, Handler, HandlerRegistry,
//!     HandlerTag, KindId, KindProjection, KindSpec, OpIdentity, Operation, ParamRef,
//!     ResultSlot, TypeId, TypeSpec,
//! };
//! use std::any::Any;
//! use std::rc::Rc;
//! use std::sync::Arc;
//!
//! // Declare the domain: one type, one operation kind.
//! let mut builder = CatalogBuilder::new();
//! let number = builder.ty(TypeSpec::new("Number")).unwrap();
//! let parse = builder
//!     .kind(KindSpec::new("Parse").param("OUTPUT").result("OUTPUT"))
//!     .unwrap();
//! let catalog = Arc::new(builder.build());
//!
//! struct ParseOp {
//!     kind: KindId,
//!     text: String,
//!     output: TypeId,
//!     slot: ResultSlot,
//! }
//!
//! impl Operation for ParseOp {
//!     fn kind(&self) -> KindId {
//!         self.kind
//!     }
//!     fn type_arg(&self, param: ParamRef) -> Option<TypeId> {
//!         (param == ParamRef::new(self.kind, 0)).then_some(self.output)
//!     }
//!     fn identity(&self) -> OpIdentity {
//!         OpIdentity::new(self.kind).text(self.text.as_str()).ty(self.output)
//!     }
//!     fn slot(&self) -> &ResultSlot {
//!         &self.slot
//!     }
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//! }
//!
//! struct NumberParser {
//!     projection: KindProjection,
//! }
//!
//! impl Handler for NumberParser {
//!     fn projection(&self) -> &KindProjection {
//!         &self.projection
//!     }
//!     fn tag(&self) -> HandlerTag {
//!         HandlerTag::of::<Self>()
//!     }
//!     fn supports(&self, _cx: &DispatchContext, op: &dyn Operation) -> bool {
//!         op.as_any().downcast_ref::<ParseOp>().is_some()
//!     }
//!     fn perform(&self, _cx: &DispatchContext, op: &dyn Operation) -> DispatchResult<()> {
//!         if let Some(parse) = op.as_any().downcast_ref::<ParseOp>() {
//!             if let Ok(value) = parse.text.parse::<f64>() {
//!                 op.slot().succeed(Rc::new(value));
//!             }
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let parser = Arc::new(NumberParser {
//!     projection: KindProjection::new(parse, [Bound::Exact(number)]),
//! });
//! let handlers: Vec<Arc<dyn Handler>> = vec![parser];
//! let registry = HandlerRegistry::new(Arc::clone(&catalog), handlers).unwrap();
//! let cx = DispatchContext::new(Arc::new(registry));
//!
//! let op = ParseOp {
//!     kind: parse,
//!     text: "6.5".into(),
//!     output: number,
//!     slot: ResultSlot::new(),
//! };
//! let result = cx.eval(&op).unwrap();
//! assert_eq!(result.downcast_ref::<f64>().copied(), Some(6.5));
//! ```

mod tracing_config;

pub use tracing_config::init_tracing;

pub use opkit_core::{
    Atom, Bound, Catalog, CatalogBuilder, CatalogError, Interner, KindChain, KindId,
    KindProjection, KindSpec, ParamRef, ParentArg, ReusePhase, TypeId, TypeSpec, normalize_reuse,
};

pub use opkit_engine::{
    Candidates, ConfigError, DispatchContext, DispatchError, DispatchResult, Fragment, Handler,
    HandlerRegistry, HandlerTag, OpIdentity, OpValue, Operation, ResultSlot, compare_specificity,
    matches,
};
