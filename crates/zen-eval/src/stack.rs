//! Host stack growth for deep recursion.

/// Headroom that must remain on the current stack segment.
const RED_ZONE: usize = 100 * 1024;

/// Size of each segment allocated once the headroom runs out.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, first moving to a fresh stack segment if the current one is
/// nearly full.
#[inline]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
