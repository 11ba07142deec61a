//! Stack growth for deeply recursive evaluation.
//!
//! Every nested expression and closure call recurses through
//! [`evaluate`](crate::runtime::eval::evaluate). Running each step through
//! [`ensure_sufficient_stack`] means `max_call_depth` is what ends runaway
//! recursion, whatever size stack the host thread was given.

/// Grow the stack when less than this remains.
const RED_ZONE: usize = 128 * 1024;

/// Size of each new stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Runs `f`, first moving to a fresh stack segment if the current one is nearly exhausted.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
