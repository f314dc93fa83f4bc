//! Advisory reuse policy.
//!
//! Kinds (and handlers, via `Handler::reuse_policy` in the engine crate)
//! may declare which dispatch phases produce results a caller can safely
//! memoize. The engine itself never caches; this policy exists for callers
//! that want to avoid repeating expensive support checks.

use bitflags::bitflags;

bitflags! {
    /// Dispatch phases whose outcome may be treated as cacheable.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ReusePhase: u8 {
        /// The support check (`supports` / `matches`).
        const SUPPORT = 1 << 0;
        /// The evaluation itself (`eval` result).
        const EVALUATE = 1 << 1;
    }
}

/// Normalizes a declaration: evaluation reuse implies support reuse. An
/// uncacheable evaluation cannot sit behind a cacheable "yes, supported",
/// and the converse (support-only reuse) is coherent and left alone.
pub fn normalize_reuse(declared: ReusePhase) -> ReusePhase {
    if declared.contains(ReusePhase::EVALUATE) {
        declared | ReusePhase::SUPPORT
    } else {
        declared
    }
}
