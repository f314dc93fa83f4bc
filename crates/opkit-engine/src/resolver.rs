//! Applicability matching between a live operation and a handler's
//! declared constraint.

use crate::operation::Operation;
use opkit_core::{Catalog, KindProjection};

/// Whether `projection` covers `op`'s concrete type arguments.
///
/// Coarse filter first: the operation's runtime kind must extend the
/// projection's declared kind. Then every declared parameter along the
/// operation's kind chain that the projection bounds must be satisfied by
/// the operation's actual type for that slot (assignability with
/// primitive/boxed normalization, wildcards always satisfied).
///
/// Pure function of its inputs plus the operation's accessor state; safe
/// to call repeatedly.
pub fn matches(catalog: &Catalog, op: &dyn Operation, projection: &KindProjection) -> bool {
    if !catalog.kind_extends(op.kind(), projection.kind) {
        return false;
    }
    catalog.constraint_holds(op.kind(), projection, &mut |param| op.type_arg(param))
}
