//! Unification of a known type against a pattern with free variables.
//!
//! Purely structural: `List<Int>` never unifies with `Collection<X>`, even
//! though one is a subtype of the other. Each variable binds at most once;
//! a second, different binding fails and the variable is reported in
//! [`UnificationResult::failed_variables`]. Bindings made before a failure
//! are kept.

use std::collections::BTreeMap;

use kt_ir::{ConstructorId, TypeId};
use kt_stack::ensure_sufficient_stack;

use crate::context::TypeContext;
use crate::data::{TypeArg, TypeData, Variance};
use crate::subst::TypeSubstitution;

/// Outcome of [`TypeUnifier::unify`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnificationResult {
    pub success: bool,
    pub bindings: BTreeMap<ConstructorId, TypeArg>,
    /// Variables that were asked to bind to two different projections.
    pub failed_variables: Vec<ConstructorId>,
}

impl Default for UnificationResult {
    fn default() -> Self {
        UnificationResult {
            success: true,
            bindings: BTreeMap::new(),
            failed_variables: Vec::new(),
        }
    }
}

impl UnificationResult {
    pub fn binding(&self, var: ConstructorId) -> Option<TypeArg> {
        self.bindings.get(&var).copied()
    }

    /// The bindings as a substitution, ready to apply to the pattern.
    pub fn to_substitution(&self) -> TypeSubstitution {
        self.bindings.iter().map(|(&var, &arg)| (var, arg)).collect()
    }

    fn fail(&mut self) {
        self.success = false;
    }

    fn bind(&mut self, var: ConstructorId, value: TypeArg) {
        match self.bindings.get(&var) {
            Some(&existing) if existing != value => {
                tracing::trace!(?var, ?existing, ?value, "conflicting binding");
                if !self.failed_variables.contains(&var) {
                    self.failed_variables.push(var);
                }
                self.fail();
            }
            Some(_) => {}
            None => {
                self.bindings.insert(var, value);
            }
        }
    }
}

/// Unifies types within one [`TypeContext`].
pub struct TypeUnifier<'a, F> {
    ctx: &'a TypeContext<'a>,
    is_variable: F,
}

impl<'a, F: Fn(ConstructorId) -> bool> TypeUnifier<'a, F> {
    pub fn new(ctx: &'a TypeContext<'a>, is_variable: F) -> Self {
        TypeUnifier { ctx, is_variable }
    }

    /// Match `known` against `pattern`.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn unify(&self, known: TypeId, pattern: TypeId) -> UnificationResult {
        let mut result = UnificationResult::default();
        self.unify_args(TypeArg::Invariant(known), TypeArg::Invariant(pattern), &mut result);
        tracing::debug!(success = result.success, bindings = result.bindings.len());
        result
    }

    /// The variable `ty` stands for, if it is a bare variable use.
    fn variable_of(&self, ty: TypeId) -> Option<ConstructorId> {
        let interner = self.ctx.interner();
        interner
            .ctor_of(ty)
            .filter(|&ctor| (self.is_variable)(ctor) && interner.args_of(ty).is_empty())
    }

    fn unify_args(&self, known: TypeArg, pattern: TypeArg, result: &mut UnificationResult) {
        let interner = self.ctx.interner();

        let (known_kind, known_ty, pattern_kind, pattern_ty) =
            match (known.kind().zip(known.ty()), pattern.kind().zip(pattern.ty())) {
                (None, None) => return,
                (None, Some((pattern_kind, pattern_ty))) => {
                    match self.variable_of(pattern_ty) {
                        Some(var)
                            if pattern_kind == Variance::Invariant
                                && !interner.is_nullable(pattern_ty) =>
                        {
                            result.bind(var, TypeArg::Star);
                        }
                        _ => result.fail(),
                    }
                    return;
                }
                (Some(_), None) => {
                    result.fail();
                    return;
                }
                (Some((kk, kt)), Some((pk, pt))) => (kk, kt, pk, pt),
            };

        if known_ty.is_error() {
            if let Some(var) = self.variable_of(pattern_ty) {
                result.bind(var, TypeArg::new(known_kind, TypeId::ERROR));
            }
            return;
        }
        if pattern_ty.is_error() {
            return;
        }

        // `Foo? ~ X?` is `Foo ~ X`.
        let (known_ty, pattern_ty) =
            if interner.is_nullable(known_ty) && interner.is_nullable(pattern_ty) {
                (
                    interner.make_not_nullable(known_ty),
                    interner.make_not_nullable(pattern_ty),
                )
            } else {
                (known_ty, pattern_ty)
            };

        // `in Foo ~ out X` and `Foo ~ out X` fail; `out Foo ~ X` may not.
        if pattern_kind != Variance::Invariant && known_kind != pattern_kind {
            result.fail();
            return;
        }
        // `Foo ~ X?`
        if !interner.is_nullable(known_ty) && interner.is_nullable(pattern_ty) {
            result.fail();
            return;
        }

        if let Some(var) = self.variable_of(pattern_ty) {
            result.bind(var, TypeArg::new(known_kind, known_ty));
            return;
        }

        if interner.is_nullable(known_ty) != interner.is_nullable(pattern_ty)
            || known_kind != pattern_kind
        {
            result.fail();
            return;
        }

        match (interner.lookup(known_ty), interner.lookup(pattern_ty)) {
            (
                TypeData::Applied {
                    ctor: known_ctor,
                    args: known_args,
                    ..
                },
                TypeData::Applied {
                    ctor: pattern_ctor,
                    args: pattern_args,
                    ..
                },
            ) => {
                if known_ctor != pattern_ctor || known_args.len() != pattern_args.len() {
                    result.fail();
                    return;
                }
                for (&k, &p) in known_args.iter().zip(pattern_args.iter()) {
                    ensure_sufficient_stack(|| self.unify_args(k, p, result));
                }
            }
            (
                TypeData::Intersection { members: known, .. },
                TypeData::Intersection {
                    members: pattern, ..
                },
            ) if known.len() == pattern.len() => {
                for (&k, &p) in known.iter().zip(pattern.iter()) {
                    ensure_sufficient_stack(|| {
                        self.unify_args(TypeArg::Invariant(k), TypeArg::Invariant(p), result);
                    });
                }
            }
            _ => result.fail(),
        }
    }
}

/// Whether some instantiation of the type parameters in `a` and `b` could
/// make them equal.
///
/// Every type parameter counts as a variable; both directions are tried.
pub fn may_be_equal(ctx: &TypeContext<'_>, a: TypeId, b: TypeId) -> bool {
    a == b
        || TypeUnifier::new(ctx, ConstructorId::is_type_param).unify(a, b).success
        || TypeUnifier::new(ctx, ConstructorId::is_type_param).unify(b, a).success
}

#[cfg(test)]
mod tests;
