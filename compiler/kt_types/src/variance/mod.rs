//! Variance and projection resolution.
//!
//! Combines a type parameter's declaration-site variance with the use-site
//! projection of the argument supplied for it. The result says whether the
//! argument position is read-only (`out`), write-only (`in`) or invariant.

use kt_ir::{ConstructorId, TypeId};

use crate::data::{TypeArg, Variance};
use crate::registry::Declarations;

/// Resolved capability of one argument position.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EffectiveProjection {
    pub kind: Variance,
    pub ty: TypeId,
}

/// Effective projection of `arg` supplied for `param`.
///
/// - `*` widens to `out UpperBound`, or to `in Nothing` for an `in` parameter.
/// - An unprojected argument takes the declared variance.
/// - An explicit projection wins over the declared variance, even when the
///   two conflict.
pub fn effective_projection(
    decls: &Declarations,
    param: ConstructorId,
    arg: TypeArg,
) -> EffectiveProjection {
    let declared = decls.variance_of(param);
    match arg {
        TypeArg::Star => match declared {
            Variance::In => EffectiveProjection {
                kind: Variance::In,
                ty: TypeId::NOTHING,
            },
            Variance::Out | Variance::Invariant => EffectiveProjection {
                kind: Variance::Out,
                ty: decls.upper_bound(param),
            },
        },
        TypeArg::Invariant(ty) => EffectiveProjection { kind: declared, ty },
        TypeArg::In(ty) => EffectiveProjection {
            kind: Variance::In,
            ty,
        },
        TypeArg::Out(ty) => EffectiveProjection {
            kind: Variance::Out,
            ty,
        },
    }
}

/// Compose two projection kinds along a path.
///
/// Invariant is the identity and equal kinds compose to themselves. `in`
/// through `out` (either order) is a contradiction.
pub fn compose(outer: Variance, inner: Variance) -> Option<Variance> {
    match (outer, inner) {
        (Variance::Invariant, kind) | (kind, Variance::Invariant) => Some(kind),
        (a, b) if a == b => Some(a),
        _ => None,
    }
}

/// Why an argument kind cannot sit at a position kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VarianceConflict {
    /// An `out` argument at a write-only position. Not representable.
    OutInInPosition,
    /// An `in` argument at a read-only position. Degrades to `*`.
    InInOutPosition,
}

/// Classify placing an argument of kind `argument` at a position of kind
/// `position`.
pub fn conflict(position: Variance, argument: Variance) -> Option<VarianceConflict> {
    match (position, argument) {
        (Variance::In, Variance::Out) => Some(VarianceConflict::OutInInPosition),
        (Variance::Out, Variance::In) => Some(VarianceConflict::InInOutPosition),
        _ => None,
    }
}

/// Type that can be read out of `arg` at `param`.
///
/// Write-only and star positions only promise the parameter's upper bound.
pub fn out_type(decls: &Declarations, param: ConstructorId, arg: TypeArg) -> TypeId {
    match arg {
        TypeArg::Star | TypeArg::In(_) => decls.upper_bound(param),
        TypeArg::Invariant(ty) | TypeArg::Out(ty) => {
            if decls.variance_of(param) == Variance::In {
                decls.upper_bound(param)
            } else {
                ty
            }
        }
    }
}

/// Type that can be written into `arg` at `param`.
///
/// Read-only and star positions accept only `Nothing`.
pub fn in_type(decls: &Declarations, param: ConstructorId, arg: TypeArg) -> TypeId {
    match arg {
        TypeArg::Star | TypeArg::Out(_) => TypeId::NOTHING,
        TypeArg::Invariant(ty) | TypeArg::In(ty) => {
            if decls.variance_of(param) == Variance::Out {
                TypeId::NOTHING
            } else {
                ty
            }
        }
    }
}

/// Whether an explicit projection of kind `kind` at `param` only repeats the
/// declared variance.
pub fn is_redundant_projection(decls: &Declarations, param: ConstructorId, kind: Variance) -> bool {
    kind != Variance::Invariant && decls.variance_of(param) == kind
}
