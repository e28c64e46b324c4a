//! Engine configuration.

/// Limits and switches for a [`TypeContext`](crate::TypeContext).
///
/// All limits are deterministic: hitting one degrades the answer in a
/// documented way (a failed substitution, a star projection, `false`), never
/// a panic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Nesting depth at which substitution gives up with `DepthExceeded`.
    pub max_substitution_depth: usize,
    /// Recursion depth at which a subtype check answers `false`.
    pub max_subtype_depth: usize,
    /// Extra nesting allowed in a common supertype beyond the deepest input.
    ///
    /// Recursive hierarchies such as `class A : Rec<A>` unroll at most this
    /// many levels before the innermost argument becomes `*`.
    pub supertype_unroll_depth: u32,
    /// Cache subtype answers per `(sub, super)` pair for the context's life.
    pub memoize_subtyping: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_substitution_depth: 100,
            max_subtype_depth: 100,
            supertype_unroll_depth: 3,
            memoize_subtyping: true,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn with_max_substitution_depth(mut self, depth: usize) -> Self {
        self.max_substitution_depth = depth;
        self
    }

    #[must_use]
    pub fn with_max_subtype_depth(mut self, depth: usize) -> Self {
        self.max_subtype_depth = depth;
        self
    }

    #[must_use]
    pub fn with_supertype_unroll_depth(mut self, depth: u32) -> Self {
        self.supertype_unroll_depth = depth;
        self
    }

    #[must_use]
    pub fn with_memoization(mut self, enabled: bool) -> Self {
        self.memoize_subtyping = enabled;
        self
    }
}
