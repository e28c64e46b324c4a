//! Pre-computed type metadata flags.
//!
//! `TypeFlags` are computed once when a type is interned, so questions like
//! "does this type mention a type parameter" never need a traversal.

use bitflags::bitflags;

bitflags! {
    /// Pre-computed type properties for O(1) queries.
    ///
    /// Used to gate substitution (nothing to do without type parameters)
    /// and error propagation.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct TypeFlags: u8 {
        /// Is or contains the error type.
        const HAS_ERROR = 1 << 0;
        /// Mentions a type-parameter constructor somewhere.
        const HAS_TYPE_PARAM = 1 << 1;
        /// Contains a star projection.
        const HAS_STAR = 1 << 2;
        /// Contains an intersection type.
        const HAS_INTERSECTION = 1 << 3;

        /// The outermost type is marked nullable. Not propagated.
        const IS_NULLABLE = 1 << 7;
    }
}

impl TypeFlags {
    /// Flags inherited by a type from its children.
    pub const PROPAGATE_MASK: Self = Self::HAS_ERROR
        .union(Self::HAS_TYPE_PARAM)
        .union(Self::HAS_STAR)
        .union(Self::HAS_INTERSECTION);

    /// Flags a parent inherits from one child.
    #[inline]
    pub const fn propagate_from(child: Self) -> Self {
        Self::from_bits_truncate(child.bits() & Self::PROPAGATE_MASK.bits())
    }

    /// Union of the propagated flags of several children.
    pub fn propagate_all(children: impl IntoIterator<Item = Self>) -> Self {
        children
            .into_iter()
            .fold(Self::empty(), |acc, child| acc | Self::propagate_from(child))
    }

    #[inline]
    pub const fn has_errors(self) -> bool {
        self.contains(Self::HAS_ERROR)
    }

    #[inline]
    pub const fn has_type_params(self) -> bool {
        self.contains(Self::HAS_TYPE_PARAM)
    }

    #[inline]
    pub const fn is_nullable(self) -> bool {
        self.contains(Self::IS_NULLABLE)
    }
}
