//! The re-entrant dispatch context.
//!
//! One context represents one logical session. Handlers routinely issue
//! nested operations back into the same context from `perform`, so the
//! context keeps a live stack of in-flight operations for recursion
//! detection, a scoped hint overlay visible to nested evaluations, and a
//! per-thread marker locating the context currently evaluating.
//!
//! The stack and the hint overlays are the only state any exit path is
//! guaranteed to restore; both are managed by drop guards so early `?`
//! returns (and unwinds) leave siblings and parents consistent.

use crate::errors::{ConfigError, DispatchError, DispatchResult};
use crate::handler::Handler;
use crate::operation::{OpIdentity, OpValue, Operation, ResultSlot};
use crate::registry::HandlerRegistry;
use crate::resolver::matches;
use opkit_core::{Catalog, KindId, ReusePhase, normalize_reuse};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, trace};

thread_local! {
    static ACTIVE: RefCell<Vec<DispatchContext>> = const { RefCell::new(Vec::new()) };
}

struct Frame {
    identity: OpIdentity,
    slot: ResultSlot,
}

struct ContextInner {
    registry: Arc<HandlerRegistry>,
    stack: RefCell<Vec<Frame>>,
    hints: RefCell<FxHashMap<String, OpValue>>,
    // Result-type validation verdicts, memoized per concrete kind.
    checked_kinds: RefCell<FxHashSet<KindId>>,
}

/// The evaluation engine. Cheap to clone (clones share the session).
///
/// Not intended for concurrent use: one logical evaluation proceeds
/// through the stack at a time, and nested `eval` calls must arrive on the
/// same thread (they do, since evaluation is synchronous depth-first
/// descent). Separate sessions on separate threads may freely share the
/// immutable [`HandlerRegistry`].
#[derive(Clone)]
pub struct DispatchContext {
    inner: Rc<ContextInner>,
}

impl DispatchContext {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        DispatchContext {
            inner: Rc::new(ContextInner {
                registry,
                stack: RefCell::new(Vec::new()),
                hints: RefCell::new(FxHashMap::default()),
                checked_kinds: RefCell::new(FxHashSet::default()),
            }),
        }
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.inner.registry
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        self.inner.registry.catalog()
    }

    /// The context currently evaluating on this thread, if any.
    ///
    /// Convenience for nested code that has no direct reference to the
    /// context; the engine itself always passes the context explicitly,
    /// and correctness never depends on this marker.
    pub fn current() -> Option<DispatchContext> {
        ACTIVE.with(|active| active.borrow().last().cloned())
    }

    // ----- evaluation ----------------------------------------------------

    /// Evaluates an operation: tries the matching candidates in
    /// specificity order until one performs successfully.
    ///
    /// Re-entry on an operation value-equal to an already-successful
    /// ancestor in the same call tree returns the ancestor's cached result
    /// without invoking any handler. Re-entry on one still in flight is a
    /// [`DispatchError::Recursive`]; an operation no candidate resolves is
    /// a [`DispatchError::Unresolved`].
    pub fn eval(&self, op: &dyn Operation) -> DispatchResult<OpValue> {
        let identity = op.identity();
        if let Some(slot) = self.in_flight(&identity) {
            if slot.is_success() {
                trace!(
                    operation = %self.describe(&identity),
                    "re-entry on resolved operation, returning cached result"
                );
                op.slot().adopt(&slot);
                return slot.value().ok_or(DispatchError::Unresolved {
                    operation: self.describe(&identity),
                });
            }
            return Err(DispatchError::Recursive {
                operation: self.describe(&identity),
            });
        }
        self.check_result_kind(op)?;

        let _active = ActiveGuard::enter(self);
        let _frame = FrameGuard::push(
            self,
            Frame {
                identity: identity.clone(),
                slot: op.slot().clone(),
            },
        );
        self.try_candidates(op)?;

        if op.slot().is_success() {
            if let Some(value) = op.slot().value() {
                return Ok(value);
            }
        }
        Err(DispatchError::Unresolved {
            operation: self.describe(&identity),
        })
    }

    /// Whether any handler matches and supports this instance. Same
    /// candidate walk as [`eval`](Self::eval) but never performs, and the
    /// probe is bracketed on the stack exactly like an evaluation so
    /// nested probes cannot corrupt an in-progress `eval`.
    ///
    /// An in-flight value-equal operation probes `false` (it cannot
    /// complete from here); an already-successful one probes `true`.
    pub fn supports(&self, op: &dyn Operation) -> bool {
        let identity = op.identity();
        if let Some(slot) = self.in_flight(&identity) {
            return slot.is_success();
        }
        let _active = ActiveGuard::enter(self);
        let _frame = FrameGuard::push(
            self,
            Frame {
                identity,
                slot: op.slot().clone(),
            },
        );
        for handler in self.inner.registry.candidates_for(op.kind()) {
            if !matches(self.catalog(), op, handler.projection()) {
                continue;
            }
            if handler.supports(self, op) {
                return true;
            }
        }
        false
    }

    /// Returns `default` without evaluating if nothing supports `op`;
    /// otherwise defers to [`eval`](Self::eval).
    pub fn eval_if_supported(
        &self,
        op: &dyn Operation,
        default: OpValue,
    ) -> DispatchResult<OpValue> {
        if !self.supports(op) {
            return Ok(default);
        }
        self.eval(op)
    }

    /// Evaluates and reports only whether the operation ended successful.
    /// "Nothing resolved it" becomes `false`; recursion and configuration
    /// errors still propagate.
    pub fn eval_success(&self, op: &dyn Operation) -> DispatchResult<bool> {
        match self.eval(op) {
            Ok(_) => Ok(true),
            Err(DispatchError::Unresolved { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Delegates to a second operation from within a handler's `perform`,
    /// while the first operation stays on the stack.
    ///
    /// Misuse errors: the stack is empty (not inside a handler), or `op`
    /// is value-equal to the operation currently on top. On success the
    /// callback receives the nested result and `true` is returned; if no
    /// handler resolves the nested operation the callback is not invoked
    /// and `false` is returned.
    pub fn forward_to(
        &self,
        op: &dyn Operation,
        callback: impl FnOnce(OpValue),
    ) -> DispatchResult<bool> {
        let identity = op.identity();
        {
            let stack = self.inner.stack.borrow();
            let top = stack.last().ok_or(DispatchError::NoOperationInProgress)?;
            if top.identity == identity {
                return Err(DispatchError::SelfDelegation {
                    operation: self.describe(&identity),
                });
            }
        }
        match self.eval(op) {
            Ok(value) => {
                callback(value);
                Ok(true)
            }
            Err(DispatchError::Unresolved { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    // ----- hints ---------------------------------------------------------

    /// Runs `f` with the given keyed hints overlaid for its duration,
    /// visible to every nested evaluation unless shadowed by a deeper
    /// overlay. Prior values (including absence) are restored on every
    /// exit path. Supplying the same key twice in one call is a
    /// configuration error.
    pub fn with_hints<R>(
        &self,
        hints: Vec<(String, OpValue)>,
        f: impl FnOnce(&DispatchContext) -> R,
    ) -> DispatchResult<R> {
        let mut keys = FxHashSet::default();
        for (key, _) in &hints {
            if !keys.insert(key.as_str()) {
                return Err(ConfigError::DuplicateHint { key: key.clone() }.into());
            }
        }
        let _overlay = HintGuard::apply(self, hints);
        Ok(f(self))
    }

    /// The current value for a hint key, if any overlay in scope set one.
    pub fn hint(&self, key: &str) -> Option<OpValue> {
        self.inner.hints.borrow().get(key).cloned()
    }

    pub fn hint_as<T: 'static>(&self, key: &str) -> Option<Rc<T>> {
        self.hint(key)?.downcast::<T>().ok()
    }

    // ----- reuse ---------------------------------------------------------

    /// Advisory: whether a caller may memoize this operation's outcome for
    /// the given phase. The context itself never caches.
    pub fn can_reuse(&self, op: &dyn Operation, phase: ReusePhase) -> bool {
        self.catalog().can_reuse(op.kind(), phase)
    }

    /// Advisory reuse verdict for one handler: its own declaration if it
    /// has one, otherwise its kind's policy.
    pub fn handler_can_reuse(&self, handler: &dyn Handler, phase: ReusePhase) -> bool {
        match handler.reuse_policy() {
            Some(declared) => normalize_reuse(declared).contains(phase),
            None => self.catalog().can_reuse(handler.projection().kind, phase),
        }
    }

    // ----- internals -----------------------------------------------------

    fn try_candidates(&self, op: &dyn Operation) -> DispatchResult<()> {
        for handler in self.inner.registry.candidates_for(op.kind()) {
            if !matches(self.catalog(), op, handler.projection()) {
                trace!(handler = handler.tag().name(), "constraint mismatch, skipped");
                continue;
            }
            if !handler.supports(self, op) {
                trace!(handler = handler.tag().name(), "declined support");
                continue;
            }
            handler.perform(self, op)?;
            if op.slot().is_success() {
                debug!(
                    handler = handler.tag().name(),
                    operation = %self.describe(&op.identity()),
                    "operation resolved"
                );
                return Ok(());
            }
        }
        Ok(())
    }

    fn in_flight(&self, identity: &OpIdentity) -> Option<ResultSlot> {
        self.inner
            .stack
            .borrow()
            .iter()
            .find(|frame| &frame.identity == identity)
            .map(|frame| frame.slot.clone())
    }

    fn check_result_kind(&self, op: &dyn Operation) -> DispatchResult<()> {
        let kind = op.kind();
        if self.inner.checked_kinds.borrow().contains(&kind) {
            return Ok(());
        }
        let catalog = self.catalog();
        for level in catalog.kind_chain(kind) {
            if let Some(param) = catalog.result_param(level) {
                if op.type_arg(param).is_none() {
                    return Err(ConfigError::UnresolvedResultType {
                        kind: catalog.kind_name(kind).to_string(),
                        param: catalog.param_name(param).to_string(),
                    }
                    .into());
                }
            }
        }
        self.inner.checked_kinds.borrow_mut().insert(kind);
        Ok(())
    }

    fn describe(&self, identity: &OpIdentity) -> String {
        identity.render(self.catalog())
    }
}

/// Pops the frame it pushed, on every exit path.
struct FrameGuard {
    inner: Rc<ContextInner>,
}

impl FrameGuard {
    fn push(cx: &DispatchContext, frame: Frame) -> Self {
        cx.inner.stack.borrow_mut().push(frame);
        FrameGuard {
            inner: Rc::clone(&cx.inner),
        }
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        self.inner.stack.borrow_mut().pop();
    }
}

/// Marks this context active on the current thread; restores the prior
/// marker on drop, including across unwinds.
struct ActiveGuard;

impl ActiveGuard {
    fn enter(cx: &DispatchContext) -> Self {
        ACTIVE.with(|active| active.borrow_mut().push(cx.clone()));
        ActiveGuard
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        ACTIVE.with(|active| {
            active.borrow_mut().pop();
        });
    }
}

/// Applies a hint overlay; restores displaced values (or their absence)
/// on drop.
struct HintGuard {
    inner: Rc<ContextInner>,
    displaced: Vec<(String, Option<OpValue>)>,
}

impl HintGuard {
    fn apply(cx: &DispatchContext, hints: Vec<(String, OpValue)>) -> Self {
        let mut displaced = Vec::with_capacity(hints.len());
        let mut map = cx.inner.hints.borrow_mut();
        for (key, value) in hints {
            let prior = map.insert(key.clone(), value);
            displaced.push((key, prior));
        }
        HintGuard {
            inner: Rc::clone(&cx.inner),
            displaced,
        }
    }
}

impl Drop for HintGuard {
    fn drop(&mut self) {
        let mut map = self.inner.hints.borrow_mut();
        for (key, prior) in self.displaced.drain(..) {
            match prior {
                Some(value) => {
                    map.insert(key, value);
                }
                None => {
                    map.remove(&key);
                }
            }
        }
    }
}
