//! Subtype checking.
//!
//! `A <: B` is decided structurally:
//!
//! 1. Error types are subtypes of (and supertypes of) everything.
//! 2. A type that may hold `null` is only a subtype of one that may too, and
//!    a `?` type only of another `?` type: `T?` is not below `T`.
//! 3. `Nothing` is below every type, `Nothing?` below every nullable type.
//! 4. Otherwise `A`'s supertypes are searched for `B`'s constructor,
//!    substituting along the chain, and the arguments are compared by the
//!    effective projection of each parameter.
//!
//! Intersections distribute: `X <: A & B` needs both, `A & B <: X` either.

mod supertypes;

use std::cell::Cell;

use kt_ir::TypeId;
use kt_stack::ensure_sufficient_stack;

use crate::context::TypeContext;
use crate::data::{TypeArg, TypeData, Variance};
use crate::variance::{in_type, out_type};

/// One subtype query session over a [`TypeContext`].
pub struct SubtypeChecker<'a> {
    ctx: &'a TypeContext<'a>,
    /// Set once an answer was cut off by the depth limit; later answers in
    /// this session are no longer memoized.
    truncated: Cell<bool>,
}

impl<'a> SubtypeChecker<'a> {
    pub fn new(ctx: &'a TypeContext<'a>) -> Self {
        SubtypeChecker {
            ctx,
            truncated: Cell::new(false),
        }
    }

    /// `sub <: sup`
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn is_subtype_of(&self, sub: TypeId, sup: TypeId) -> bool {
        self.check(sub, sup, 0)
    }

    /// `a <: b` and `b <: a`.
    pub fn equal_types(&self, a: TypeId, b: TypeId) -> bool {
        self.equal_at(a, b, 0)
    }

    fn equal_at(&self, a: TypeId, b: TypeId, depth: usize) -> bool {
        a == b || (self.check(a, b, depth) && self.check(b, a, depth))
    }

    fn check(&self, sub: TypeId, sup: TypeId, depth: usize) -> bool {
        if sub == sup || sub.is_error() || sup.is_error() {
            return true;
        }
        if depth > self.ctx.config().max_subtype_depth {
            tracing::debug!(?sub, ?sup, depth, "subtype depth limit reached");
            self.truncated.set(true);
            return false;
        }
        if let Some(answer) = self.ctx.cached_subtype(sub, sup) {
            return answer;
        }
        let answer = ensure_sufficient_stack(|| self.check_uncached(sub, sup, depth));
        if !self.truncated.get() {
            self.ctx.record_subtype(sub, sup, answer);
        }
        answer
    }

    fn check_uncached(&self, sub: TypeId, sup: TypeId, depth: usize) -> bool {
        let interner = self.ctx.interner();

        if let TypeData::Intersection { members, nullable } = interner.lookup(sup) {
            return members.iter().all(|&member| {
                self.check(sub, interner.make_nullable_as(member, nullable), depth + 1)
            });
        }

        if (interner.is_nullable(sub) && !interner.is_nullable(sup))
            || (self.can_be_null(sub) && !self.can_be_null(sup))
        {
            return false;
        }
        if sub == TypeId::NOTHING {
            return true;
        }
        if sub == TypeId::NULLABLE_NOTHING {
            return interner.is_nullable(sup);
        }

        if let TypeData::Intersection { members, nullable } = interner.lookup(sub) {
            return members.iter().any(|&member| {
                self.check(interner.make_nullable_as(member, nullable), sup, depth + 1)
            });
        }

        let Some(target) = interner.ctor_of(sup) else {
            return false;
        };
        match self.find_corresponding_supertype(sub, target) {
            Some(candidate) => self.check_arguments(candidate, sup, depth),
            None => false,
        }
    }

    /// Whether a value of `ty` may be `null`.
    ///
    /// A type parameter may hold `null` when its bound may, even if the use
    /// is not marked `?`.
    pub fn can_be_null(&self, ty: TypeId) -> bool {
        let interner = self.ctx.interner();
        if interner.is_nullable(ty) {
            return true;
        }
        match interner.ctor_of(ty) {
            Some(ctor) if ctor.is_type_param() => {
                let bound = self.ctx.decls().upper_bound(ctor);
                bound != ty && ensure_sufficient_stack(|| self.can_be_null(bound))
            }
            _ => false,
        }
    }

    /// Compare the arguments of two applications of the same constructor.
    fn check_arguments(&self, sub: TypeId, sup: TypeId, depth: usize) -> bool {
        let interner = self.ctx.interner();
        let decls = self.ctx.decls();
        let (TypeData::Applied { ctor, args: sub_args, .. }, TypeData::Applied { args: sup_args, .. }) =
            (interner.lookup(sub), interner.lookup(sup))
        else {
            return false;
        };
        let params = decls.params_of(ctor);
        if sub_args.len() != sup_args.len() || sub_args.len() != params.len() {
            return false;
        }

        params
            .iter()
            .zip(sub_args.iter().zip(sup_args.iter()))
            .all(|(&param, (&sub_arg, &sup_arg))| {
                if sup_arg.is_star() {
                    return true;
                }
                if let (Variance::Invariant, TypeArg::Invariant(a), TypeArg::Invariant(b)) =
                    (decls.variance_of(param), sub_arg, sup_arg)
                {
                    return self.equal_at(a, b, depth + 1);
                }
                let out_ok = self.check(
                    out_type(decls, param, sub_arg),
                    out_type(decls, param, sup_arg),
                    depth + 1,
                );
                out_ok
                    && self.check(
                        in_type(decls, param, sup_arg),
                        in_type(decls, param, sub_arg),
                        depth + 1,
                    )
            })
    }
}
