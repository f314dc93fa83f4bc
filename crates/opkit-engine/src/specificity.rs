//! Specificity ordering for handlers sharing an operation-kind bucket.
//!
//! Most-specific first, so the dispatch loop tries narrow handlers before
//! broad fallbacks. The order is a strict weak ordering and fully
//! deterministic: where two constraints are incomparable, the rendered
//! description breaks the tie, and exact equals sort stably by insertion
//! order (the registry uses a stable sort).

use opkit_core::{Bound, Catalog, KindProjection};
use std::cmp::Ordering;

/// Compares two declared constraints, narrower first.
pub fn compare_specificity(catalog: &Catalog, a: &KindProjection, b: &KindProjection) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    if a.kind != b.kind {
        let a_under_b = catalog.kind_extends(a.kind, b.kind);
        let b_under_a = catalog.kind_extends(b.kind, a.kind);
        return match (a_under_b, b_under_a) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            // Unrelated kinds; deterministic but not meaningful.
            _ => catalog
                .render_projection(a)
                .cmp(&catalog.render_projection(b)),
        };
    }
    for (x, y) in a.args.iter().zip(b.args.iter()) {
        let ord = compare_bounds(catalog, *x, *y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn compare_bounds(catalog: &Catalog, x: Bound, y: Bound) -> Ordering {
    match (x, y) {
        (Bound::Exact(p), Bound::Exact(q)) => {
            if p == q {
                return Ordering::Equal;
            }
            let p_under_q = catalog.assignable(p, q);
            let q_under_p = catalog.assignable(q, p);
            match (p_under_q, q_under_p) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                // Incomparable (or mutually assignable twins): order by
                // name for determinism.
                _ => catalog.type_name(p).cmp(catalog.type_name(q)),
            }
        }
        (Bound::Exact(_), Bound::Any) => Ordering::Less,
        (Bound::Any, Bound::Exact(_)) => Ordering::Greater,
        (Bound::Any, Bound::Any) => Ordering::Equal,
        // Open bounds never reach a built registry; sort them last so the
        // comparator still never panics.
        (Bound::Param(_), Bound::Param(_)) => Ordering::Equal,
        (Bound::Param(_), _) => Ordering::Greater,
        (_, Bound::Param(_)) => Ordering::Less,
    }
}
