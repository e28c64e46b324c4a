//! Type substitution.
//!
//! Replaces type-parameter occurrences with projections, composing variance
//! along the way.
//!
//! # Contradictions
//!
//! An `out` replacement landing in an `in` position fails the whole
//! substitution, whatever the context of the root. Only the declared variance
//! of a parameter widens: an argument that no longer fits its parameter
//! (`In<T>` with `T := out String`) becomes `*`.

use kt_ir::{ConstructorId, TypeId};
use kt_stack::ensure_sufficient_stack;
use rustc_hash::FxHashMap;

use crate::context::TypeContext;
use crate::data::{TypeArg, TypeData, Variance};
use crate::registry::Declarations;
use crate::type_interner::TypeInterner;
use crate::variance::{compose, conflict, is_redundant_projection, VarianceConflict};

/// Why a substitution has no result.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SubstitutionError {
    /// A replacement of one projection kind landed at a position of the
    /// opposite kind.
    #[error("conflicting projection for type parameter {param:?}")]
    Contradiction { param: ConstructorId },

    #[error("substitution exceeded the nesting limit of {limit}")]
    DepthExceeded { limit: usize },
}

/// Immutable map from type-parameter constructors to replacements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeSubstitution {
    map: FxHashMap<ConstructorId, TypeArg>,
}

impl TypeSubstitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map each parameter to the argument at the same index. Extra entries on
    /// either side are ignored.
    pub fn for_params(params: &[ConstructorId], args: &[TypeArg]) -> Self {
        params.iter().copied().zip(args.iter().copied()).collect()
    }

    /// Parameters of `ty`'s constructor mapped to `ty`'s arguments.
    ///
    /// `Derived<Int>` gives `{T := Int}`. Anything other than an applied class
    /// type gives the empty substitution.
    pub fn from_type(interner: &TypeInterner, decls: &Declarations, ty: TypeId) -> Self {
        match interner.lookup(ty) {
            TypeData::Applied { ctor, args, .. } => Self::for_params(decls.params_of(ctor), &args),
            TypeData::Error | TypeData::Intersection { .. } => Self::default(),
        }
    }

    /// Every key maps to the same replacement.
    pub fn constant(keys: impl IntoIterator<Item = ConstructorId>, replacement: TypeArg) -> Self {
        keys.into_iter().map(|key| (key, replacement)).collect()
    }

    /// Add a mapping, builder style. A later entry for the same key wins.
    #[must_use]
    pub fn with(mut self, key: ConstructorId, replacement: TypeArg) -> Self {
        self.map.insert(key, replacement);
        self
    }

    #[inline]
    pub fn get(&self, key: ConstructorId) -> Option<TypeArg> {
        self.map.get(&key).copied()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (ConstructorId, TypeArg)> + '_ {
        self.map.iter().map(|(&k, &v)| (k, v))
    }

    /// Whether any key is a class constructor rather than a type parameter.
    fn has_class_keys(&self) -> bool {
        self.map.keys().any(|key| !key.is_type_param())
    }
}

impl FromIterator<(ConstructorId, TypeArg)> for TypeSubstitution {
    fn from_iter<I: IntoIterator<Item = (ConstructorId, TypeArg)>>(iter: I) -> Self {
        TypeSubstitution {
            map: iter.into_iter().collect(),
        }
    }
}

/// Applies one [`TypeSubstitution`] within one [`TypeContext`].
pub struct Substitutor<'a> {
    ctx: &'a TypeContext<'a>,
    subst: &'a TypeSubstitution,
}

impl<'a> Substitutor<'a> {
    pub fn new(ctx: &'a TypeContext<'a>, subst: &'a TypeSubstitution) -> Self {
        Substitutor { ctx, subst }
    }

    /// Substitute into `ty` used at a `context` position.
    pub fn substitute(&self, ty: TypeId, context: Variance) -> Option<TypeId> {
        self.try_substitute(ty, context).ok()
    }

    /// Like [`Substitutor::substitute`], giving the error type on failure.
    pub fn safe_substitute(&self, ty: TypeId, context: Variance) -> TypeId {
        self.try_substitute(ty, context).unwrap_or(TypeId::ERROR)
    }

    /// Substitute into `ty` used at a `context` position.
    #[tracing::instrument(level = "trace", skip(self), fields(entries = self.subst.len()))]
    pub fn try_substitute(&self, ty: TypeId, context: Variance) -> Result<TypeId, SubstitutionError> {
        if self.is_identity_for(ty) {
            return Ok(ty);
        }
        match self.substitute_projection(context, ty, 0)? {
            TypeArg::Star => Ok(self.star_as_type(ty)),
            projected => Ok(projected.ty().unwrap_or(ty)),
        }
    }

    /// Substitute into a single projection, keeping its kind where possible.
    ///
    /// A star is returned unchanged.
    pub fn substitute_arg(&self, arg: TypeArg) -> Result<TypeArg, SubstitutionError> {
        let Some(ty) = arg.ty() else {
            return Ok(TypeArg::Star);
        };
        if self.is_identity_for(ty) {
            return Ok(arg);
        }
        let kind = arg.kind().unwrap_or_default();
        self.substitute_projection(kind, ty, 0)
    }

    fn is_identity_for(&self, ty: TypeId) -> bool {
        self.subst.is_empty()
            || (!self.ctx.interner().flags(ty).has_type_params() && !self.subst.has_class_keys())
    }

    /// A root that substituted to `*` stands for the bound of what it replaced.
    fn star_as_type(&self, original: TypeId) -> TypeId {
        let interner = self.ctx.interner();
        match interner.ctor_of(original) {
            Some(ctor) if ctor.is_type_param() => {
                let bound = self.ctx.decls().upper_bound(ctor);
                interner.make_nullable_if_needed(bound, interner.is_nullable(original))
            }
            _ => TypeId::NULLABLE_ANY,
        }
    }

    fn substitute_projection(
        &self,
        kind: Variance,
        ty: TypeId,
        depth: usize,
    ) -> Result<TypeArg, SubstitutionError> {
        let limit = self.ctx.config().max_substitution_depth;
        if depth > limit {
            return Err(SubstitutionError::DepthExceeded { limit });
        }
        let interner = self.ctx.interner();

        match interner.lookup(ty) {
            TypeData::Error => Ok(TypeArg::new(kind, ty)),
            TypeData::Applied {
                ctor,
                args,
                nullable,
            } => {
                if let Some(replacement) = self.subst.get(ctor) {
                    return self.replace(ctor, kind, replacement, nullable);
                }
                if args.is_empty() {
                    return Ok(TypeArg::new(kind, ty));
                }
                let new_args = ensure_sufficient_stack(|| {
                    self.substitute_args(ctor, &args, depth)
                })?;
                if *new_args == *args {
                    return Ok(TypeArg::new(kind, ty));
                }
                Ok(TypeArg::new(kind, interner.applied(ctor, new_args, nullable)))
            }
            TypeData::Intersection { members, nullable } => {
                let mut new_members = Vec::with_capacity(members.len());
                for &member in members.iter() {
                    let projected = ensure_sufficient_stack(|| {
                        self.substitute_projection(Variance::Invariant, member, depth + 1)
                    })?;
                    // A star member constrains nothing.
                    if let Some(member) = projected.ty() {
                        new_members.push(member);
                    }
                }
                if new_members.as_slice() == &*members {
                    return Ok(TypeArg::new(kind, ty));
                }
                Ok(TypeArg::new(kind, interner.intersection(new_members, nullable)))
            }
        }
    }

    /// `ctor` is a key of the substitution: splice the replacement in.
    fn replace(
        &self,
        ctor: ConstructorId,
        kind: Variance,
        replacement: TypeArg,
        nullable: bool,
    ) -> Result<TypeArg, SubstitutionError> {
        let (Some(replacement_kind), Some(replacement_ty)) = (replacement.kind(), replacement.ty())
        else {
            return Ok(TypeArg::Star);
        };
        match conflict(kind, replacement_kind) {
            Some(VarianceConflict::OutInInPosition) => {
                tracing::trace!(?ctor, "out replacement in an in position");
                Err(SubstitutionError::Contradiction { param: ctor })
            }
            Some(VarianceConflict::InInOutPosition) => Ok(TypeArg::Star),
            None => {
                let combined = compose(kind, replacement_kind).unwrap_or(kind);
                let ty = self
                    .ctx
                    .interner()
                    .make_nullable_if_needed(replacement_ty, nullable);
                Ok(TypeArg::new(combined, ty))
            }
        }
    }

    fn substitute_args(
        &self,
        ctor: ConstructorId,
        args: &[TypeArg],
        depth: usize,
    ) -> Result<Box<[TypeArg]>, SubstitutionError> {
        let decls = self.ctx.decls();
        let params = decls.params_of(ctor);
        let mut new_args = Vec::with_capacity(args.len());

        for (index, &arg) in args.iter().enumerate() {
            let (Some(&param), Some(use_kind), Some(arg_ty)) =
                (params.get(index), arg.kind(), arg.ty())
            else {
                new_args.push(arg);
                continue;
            };
            // Use-site conflicts fail; only the declared variance widens.
            let substituted = self.substitute_projection(use_kind, arg_ty, depth + 1)?;
            new_args.push(self.fit_to_param(param, arg, substituted));
        }

        Ok(new_args.into_boxed_slice())
    }

    /// Reconcile a substituted argument with the declared variance of its
    /// parameter.
    fn fit_to_param(&self, param: ConstructorId, original: TypeArg, substituted: TypeArg) -> TypeArg {
        if substituted == original {
            return original;
        }
        let (Some(kind), Some(ty)) = (substituted.kind(), substituted.ty()) else {
            return TypeArg::Star;
        };
        let decls = self.ctx.decls();
        if conflict(decls.variance_of(param), kind).is_some() {
            TypeArg::Star
        } else if is_redundant_projection(decls, param, kind) {
            TypeArg::Invariant(ty)
        } else {
            substituted
        }
    }
}
