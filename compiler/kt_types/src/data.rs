//! Interned type representation.
//!
//! `TypeData` is what the `TypeInterner` stores. Everything outside the
//! interner passes `TypeId` handles around; children are `TypeId`s too, so
//! structural equality of whole trees is a single integer compare.

use std::fmt;

use kt_ir::{ConstructorId, TypeId};

/// Declaration-site variance of a type parameter, or the kind of a use-site
/// projection.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Variance {
    #[default]
    Invariant,
    /// Write-only (`in T`).
    In,
    /// Read-only (`out T`).
    Out,
}

impl Variance {
    /// Values may be passed in (written) at a position of this kind.
    #[inline]
    pub const fn allows_in_position(self) -> bool {
        matches!(self, Variance::Invariant | Variance::In)
    }

    /// Values may be read out at a position of this kind.
    #[inline]
    pub const fn allows_out_position(self) -> bool {
        matches!(self, Variance::Invariant | Variance::Out)
    }

    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Variance {
        match self {
            Variance::Invariant => Variance::Invariant,
            Variance::In => Variance::Out,
            Variance::Out => Variance::In,
        }
    }

    /// Keyword as written in source (empty for invariant).
    pub const fn keyword(self) -> &'static str {
        match self {
            Variance::Invariant => "",
            Variance::In => "in",
            Variance::Out => "out",
        }
    }
}

impl fmt::Display for Variance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variance::Invariant => f.write_str("invariant"),
            other => f.write_str(other.keyword()),
        }
    }
}

/// A type argument: a projected type or a star.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeArg {
    /// Unprojected argument `T`.
    Invariant(TypeId),
    /// `in T`
    In(TypeId),
    /// `out T`
    Out(TypeId),
    /// `*`
    Star,
}

impl TypeArg {
    /// Build a projection of the given kind.
    #[inline]
    pub const fn new(kind: Variance, ty: TypeId) -> Self {
        match kind {
            Variance::Invariant => TypeArg::Invariant(ty),
            Variance::In => TypeArg::In(ty),
            Variance::Out => TypeArg::Out(ty),
        }
    }

    /// Projection kind, `None` for a star.
    #[inline]
    pub const fn kind(self) -> Option<Variance> {
        match self {
            TypeArg::Invariant(_) => Some(Variance::Invariant),
            TypeArg::In(_) => Some(Variance::In),
            TypeArg::Out(_) => Some(Variance::Out),
            TypeArg::Star => None,
        }
    }

    /// Projected type, `None` for a star.
    #[inline]
    pub const fn ty(self) -> Option<TypeId> {
        match self {
            TypeArg::Invariant(ty) | TypeArg::In(ty) | TypeArg::Out(ty) => Some(ty),
            TypeArg::Star => None,
        }
    }

    #[inline]
    pub const fn is_star(self) -> bool {
        matches!(self, TypeArg::Star)
    }

    /// Replace the projected type, keeping the kind.
    #[inline]
    #[must_use]
    pub fn map_ty(self, f: impl FnOnce(TypeId) -> TypeId) -> TypeArg {
        match self {
            TypeArg::Invariant(ty) => TypeArg::Invariant(f(ty)),
            TypeArg::In(ty) => TypeArg::In(f(ty)),
            TypeArg::Out(ty) => TypeArg::Out(f(ty)),
            TypeArg::Star => TypeArg::Star,
        }
    }
}

/// Interned type payload.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeData {
    /// Unresolved or erroneous type. Propagates permissively.
    Error,
    /// A class or type-parameter constructor applied to its arguments.
    Applied {
        ctor: ConstructorId,
        args: Box<[TypeArg]>,
        nullable: bool,
    },
    /// Intersection of several types that are not subtypes of one another.
    ///
    /// Members are non-null, sorted and deduplicated by the interner.
    Intersection {
        members: Box<[TypeId]>,
        nullable: bool,
    },
}

impl TypeData {
    /// Whether the outermost type accepts `null`.
    #[inline]
    pub fn is_nullable(&self) -> bool {
        match self {
            TypeData::Error => false,
            TypeData::Applied { nullable, .. } | TypeData::Intersection { nullable, .. } => {
                *nullable
            }
        }
    }

    /// Constructor of an applied type.
    #[inline]
    pub fn ctor(&self) -> Option<ConstructorId> {
        match self {
            TypeData::Applied { ctor, .. } => Some(*ctor),
            TypeData::Error | TypeData::Intersection { .. } => None,
        }
    }
}
