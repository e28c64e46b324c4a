//! Supertype queries: the declared hierarchy seen through a concrete type.

use kt_ir::{ConstructorId, TypeId};
use kt_stack::ensure_sufficient_stack;
use rustc_hash::FxHashSet;

use super::SubtypeChecker;
use crate::data::{TypeData, Variance};
use crate::subst::{Substitutor, TypeSubstitution};

impl SubtypeChecker<'_> {
    /// Direct supertypes of `ty` with its arguments substituted in.
    ///
    /// `Derived<Int>` gives `[Base<Int>]`. A nullable type gets nullable
    /// supertypes, a type parameter yields its bounds, and an intersection
    /// yields its members.
    pub fn immediate_supertypes(&self, ty: TypeId) -> Vec<TypeId> {
        let interner = self.ctx.interner();
        let decls = self.ctx.decls();
        match interner.lookup(ty) {
            TypeData::Error => Vec::new(),
            TypeData::Intersection { members, nullable } => members
                .iter()
                .map(|&member| interner.make_nullable_as(member, nullable))
                .collect(),
            TypeData::Applied { ctor, nullable, .. } => {
                let subst = TypeSubstitution::from_type(interner, decls, ty);
                let substitutor = Substitutor::new(self.ctx, &subst);
                decls
                    .declared_supertypes(ctor)
                    .iter()
                    .filter_map(|&supertype| substitutor.substitute(supertype, Variance::Invariant))
                    .map(|supertype| interner.make_nullable_if_needed(supertype, nullable))
                    .collect()
            }
        }
    }

    /// Every transitive supertype of `ty`, nearest first, without duplicates.
    /// `ty` itself is not included.
    pub fn all_supertypes(&self, ty: TypeId) -> Vec<TypeId> {
        let mut seen = FxHashSet::default();
        let mut result = Vec::new();
        self.collect_supertypes(ty, &mut seen, &mut result);
        result
    }

    fn collect_supertypes(&self, ty: TypeId, seen: &mut FxHashSet<TypeId>, out: &mut Vec<TypeId>) {
        let direct = self.immediate_supertypes(ty);
        let fresh: Vec<TypeId> = direct.into_iter().filter(|&s| seen.insert(s)).collect();
        out.extend(fresh.iter().copied());
        for supertype in fresh {
            ensure_sufficient_stack(|| self.collect_supertypes(supertype, seen, out));
        }
    }

    /// The supertype of `ty` whose constructor is `target`, arguments
    /// substituted through the hierarchy. `ty` itself when it already has
    /// that constructor.
    ///
    /// When `ty` is nullable the result is too.
    pub fn find_corresponding_supertype(&self, ty: TypeId, target: ConstructorId) -> Option<TypeId> {
        let interner = self.ctx.interner();
        match interner.lookup(ty) {
            TypeData::Error => None,
            TypeData::Applied { ctor, .. } if ctor == target => Some(ty),
            TypeData::Applied { .. } | TypeData::Intersection { .. } => {
                self.immediate_supertypes(ty).into_iter().find_map(|supertype| {
                    ensure_sufficient_stack(|| self.find_corresponding_supertype(supertype, target))
                })
            }
        }
    }

    /// Whether some supertype of `ty` admits `null`.
    ///
    /// Classes never have nullable supertypes, so this only holds for type
    /// parameters with nullable bounds.
    pub fn has_nullable_supertype(&self, ty: TypeId) -> bool {
        let interner = self.ctx.interner();
        match interner.ctor_of(ty) {
            Some(ctor) if ctor.is_type_param() => {
                self.ctx.decls().declared_supertypes(ctor).iter().any(|&bound| {
                    interner.is_nullable(bound)
                        || ensure_sufficient_stack(|| self.has_nullable_supertype(bound))
                })
            }
            _ => false,
        }
    }

    /// Whether `ty` mentions any of `params`.
    pub fn depends_on_type_params(&self, ty: TypeId, params: &[ConstructorId]) -> bool {
        let interner = self.ctx.interner();
        if params.is_empty() || !interner.flags(ty).has_type_params() {
            return false;
        }
        match interner.lookup(ty) {
            TypeData::Error => false,
            TypeData::Applied { ctor, args, .. } => {
                params.contains(&ctor)
                    || args.iter().filter_map(|arg| arg.ty()).any(|arg| {
                        ensure_sufficient_stack(|| self.depends_on_type_params(arg, params))
                    })
            }
            TypeData::Intersection { members, .. } => members.iter().any(|&member| {
                ensure_sufficient_stack(|| self.depends_on_type_params(member, params))
            }),
        }
    }

    /// Whether some type other than `ty` itself (and `Nothing`) is a subtype
    /// of `ty`.
    ///
    /// Only a non-null final class whose arguments leave no room can lack
    /// subtypes; `Array<Int>` still has them because `Int` is below its
    /// parameter's bound.
    pub fn can_have_subtypes(&self, ty: TypeId) -> bool {
        let interner = self.ctx.interner();
        let decls = self.ctx.decls();
        let TypeData::Applied {
            ctor,
            args,
            nullable,
        } = interner.lookup(ty)
        else {
            return true;
        };
        if nullable || !decls.is_final(ctor) {
            return true;
        }

        decls.params_of(ctor).iter().zip(args.iter()).any(|(&param, &arg)| {
            let (Some(kind), Some(arg_ty)) = (arg.kind(), arg.ty()) else {
                return true;
            };
            let nested = || ensure_sufficient_stack(|| self.can_have_subtypes(arg_ty));
            let below_bound = || self.lower_than_bound(arg_ty, param);
            match (decls.variance_of(param), kind) {
                (Variance::Invariant, Variance::Invariant) => below_bound() || nested(),
                (Variance::Invariant | Variance::Out, Variance::In)
                | (Variance::In, Variance::Invariant | Variance::In) => below_bound(),
                (Variance::Invariant | Variance::In, Variance::Out)
                | (Variance::Out, Variance::Invariant | Variance::Out) => nested(),
            }
        })
    }

    /// `arg` is a subtype of some bound of `param` with a different
    /// constructor.
    fn lower_than_bound(&self, arg: TypeId, param: ConstructorId) -> bool {
        let interner = self.ctx.interner();
        self.ctx
            .decls()
            .declared_supertypes(param)
            .iter()
            .any(|&bound| {
                self.is_subtype_of(arg, bound) && interner.ctor_of(arg) != interner.ctor_of(bound)
            })
    }
}
