//! The operation contract: runtime kind, type-argument bindings, value
//! identity, and the shared result slot.

use opkit_core::{Catalog, KindId, ParamRef, TypeId};
use smallvec::SmallVec;
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::fmt::Write as _;
use std::rc::Rc;
use std::sync::Arc;

/// Result payload of a successful operation.
pub type OpValue = Rc<dyn Any>;

/// A unit of work submitted to the dispatch engine.
///
/// Operations are single-use value objects: created by a caller, handed to
/// [`DispatchContext::eval`](crate::DispatchContext::eval), discarded once
/// the result is read. The engine talks to them through exactly four
/// accessors; everything else about an operation (its payload fields, how
/// it resolves its type arguments) is the implementer's business.
pub trait Operation: 'static {
    /// Most-derived runtime kind of this operation.
    fn kind(&self) -> KindId;

    /// The concrete type this operation carries for one declared
    /// parameter, or `None` if it cannot resolve that slot. Implementations
    /// may resolve lazily; the matcher only requires that repeated calls
    /// agree. [`Catalog::bind_actuals`] builds a suitable answer table from
    /// the most-derived kind's arguments.
    fn type_arg(&self, param: ParamRef) -> Option<TypeId>;

    /// Value identity used for recursion detection. Two operation
    /// instances that describe the same work (equal constituent fields)
    /// must produce equal identities; they are the same node on the
    /// dispatch stack.
    fn identity(&self) -> OpIdentity;

    /// The operation's success flag and result slot. The engine keeps a
    /// clone of this slot on the dispatch stack, so a handler marking it
    /// successful is immediately visible to recursion checks higher up the
    /// call tree.
    fn slot(&self) -> &ResultSlot;

    /// Concrete-type access for handlers that service a specific operation
    /// struct. Conventionally `self`.
    fn as_any(&self) -> &dyn Any;
}

/// One constituent of an operation's value identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fragment {
    Text(Arc<str>),
    Int(i64),
    Bool(bool),
    Type(TypeId),
    /// Opaque token for fields with no natural textual form, e.g. a
    /// precomputed hash or the address of a source object.
    Token(u64),
}

/// Value identity of an operation: its kind plus a short sequence of
/// fragments derived from its fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OpIdentity {
    kind: KindId,
    fragments: SmallVec<[Fragment; 4]>,
}

impl OpIdentity {
    pub fn new(kind: KindId) -> Self {
        OpIdentity {
            kind,
            fragments: SmallVec::new(),
        }
    }

    pub fn kind(&self) -> KindId {
        self.kind
    }

    pub fn text(mut self, text: impl Into<Arc<str>>) -> Self {
        self.fragments.push(Fragment::Text(text.into()));
        self
    }

    pub fn int(mut self, value: i64) -> Self {
        self.fragments.push(Fragment::Int(value));
        self
    }

    pub fn flag(mut self, value: bool) -> Self {
        self.fragments.push(Fragment::Bool(value));
        self
    }

    pub fn ty(mut self, ty: TypeId) -> Self {
        self.fragments.push(Fragment::Type(ty));
        self
    }

    pub fn token(mut self, token: u64) -> Self {
        self.fragments.push(Fragment::Token(token));
        self
    }

    /// Human-readable form for error messages, e.g. `Convert("42", Integer)`.
    pub fn render(&self, catalog: &Catalog) -> String {
        let mut out = String::from(catalog.kind_name(self.kind));
        out.push('(');
        for (i, fragment) in self.fragments.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            match fragment {
                Fragment::Text(text) => {
                    let _ = write!(out, "{text:?}");
                }
                Fragment::Int(value) => {
                    let _ = write!(out, "{value}");
                }
                Fragment::Bool(value) => {
                    let _ = write!(out, "{value}");
                }
                Fragment::Type(ty) => out.push_str(catalog.type_name(*ty)),
                Fragment::Token(token) => {
                    let _ = write!(out, "#{token:x}");
                }
            }
        }
        out.push(')');
        out
    }
}

#[derive(Default)]
struct SlotState {
    success: bool,
    value: Option<OpValue>,
}

/// Shared success flag + result value of one operation.
///
/// Clones share state: the dispatch stack holds a clone of each in-flight
/// operation's slot, which is how an ancestor's success becomes visible to
/// an idempotent re-entry check deeper in the same call tree.
#[derive(Clone, Default)]
pub struct ResultSlot {
    state: Rc<RefCell<SlotState>>,
}

impl ResultSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the operation successful with `value`. Once set, candidate
    /// iteration stops and `eval` returns this value.
    pub fn succeed(&self, value: OpValue) {
        let mut state = self.state.borrow_mut();
        state.success = true;
        state.value = Some(value);
    }

    pub fn is_success(&self) -> bool {
        self.state.borrow().success
    }

    pub fn value(&self) -> Option<OpValue> {
        self.state.borrow().value.clone()
    }

    pub fn value_as<T: 'static>(&self) -> Option<Rc<T>> {
        self.value()?.downcast::<T>().ok()
    }

    /// Copies another slot's outcome into this one. Used when an `eval`
    /// re-enters an operation already resolved earlier in the same call
    /// tree. Re-entry on the same instance hands us a clone of our own
    /// slot; there is nothing to copy then, and borrowing both sides
    /// would be a double borrow of one `RefCell`.
    pub(crate) fn adopt(&self, other: &ResultSlot) {
        if Rc::ptr_eq(&self.state, &other.state) {
            return;
        }
        let other = other.state.borrow();
        let mut state = self.state.borrow_mut();
        state.success = other.success;
        state.value = other.value.clone();
    }
}

impl fmt::Debug for ResultSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ResultSlot")
            .field("success", &state.success)
            .field("has_value", &state.value.is_some())
            .finish()
    }
}
