//! Stack growth guard for the type engine.
//!
//! Subtyping, substitution and common-supertype computation all recurse over
//! the structure of a type and over the supertype graph. Pathological inputs
//! (long inheritance chains, deeply nested generic arguments, recursive
//! bounds unrolled several levels) can exhaust a worker thread's stack, so
//! every such recursion step goes through [`ensure_sufficient_stack`].
//!
//! On native targets the stack is grown on demand with `stacker`. On wasm the
//! closure is called directly.

/// Remaining stack below which a new segment is allocated.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment.
const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f`, first growing the stack if less than the red zone remains.
///
/// ```text
/// fn walk(&self, ty: TypeId) -> bool {
///     ensure_sufficient_stack(|| self.walk_children(ty))
/// }
/// ```
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

/// Wasm manages its own stack; run `f` directly.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
