//! Type system engine for a Kotlin-like language.
//!
//! Answers the type questions a front end asks about declared types:
//!
//! - subtyping and type equality ([`SubtypeChecker`])
//! - substitution of type parameters under use-site projections ([`Substitutor`])
//! - least upper and greatest lower bounds ([`CommonSupertypes`])
//! - structural unification against patterns ([`TypeUnifier`])
//! - overload and override compatibility ([`OverloadChecker`])
//!
//! # Type interning
//!
//! Types are interned by a [`TypeInterner`] into 32-bit [`TypeId`] handles,
//! so equality is O(1) and every type carries precomputed [`TypeFlags`].
//!
//! # Declarations
//!
//! Constructors come from a frozen [`Declarations`] registry, built with a
//! [`DeclarationsBuilder`] or loaded from a declaration script with
//! [`notation::load_script`]. A [`TypeContext`] ties the interner, the
//! registry and an [`EngineConfig`] together.

mod common;
mod config;
mod context;
mod data;
mod flags;
mod format;
pub mod notation;
mod overload;
mod registry;
mod subst;
mod subtype;
mod type_interner;
mod unify;
mod variance;

#[cfg(test)]
mod testing;

pub use common::CommonSupertypes;
pub use config::EngineConfig;
pub use context::TypeContext;
pub use data::{TypeArg, TypeData, Variance};
pub use flags::TypeFlags;
pub use format::TypeFormatter;
pub use overload::{
    CallableKind, CallableSig, OverloadChecker, OverloadCompatibilityInfo,
    OverrideCompatibilityInfo, OverrideResult, ValueParam,
};
pub use registry::{
    BuiltIns, ClassDef, ClassKind, DeclError, Declarations, DeclarationsBuilder, Modality,
    ParamOwner, TypeParamDef,
};
pub use subst::{SubstitutionError, Substitutor, TypeSubstitution};
pub use subtype::SubtypeChecker;
pub use type_interner::{SharedTypeInterner, TypeInternError, TypeInterner};
pub use unify::{may_be_equal, TypeUnifier, UnificationResult};
pub use variance::{
    compose, conflict, effective_projection, in_type, is_redundant_projection, out_type,
    EffectiveProjection, VarianceConflict,
};

pub use kt_ir::{ConstructorId, Name, SharedInterner, Span, TypeId};

// Size assertions to prevent accidental regressions.
#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::TypeArg;
    // Discriminant plus a 4-byte TypeId.
    kt_ir::static_assert_size!(TypeArg, 8);
}
