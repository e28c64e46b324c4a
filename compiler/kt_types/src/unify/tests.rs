use kt_ir::TypeId;
use pretty_assertions::assert_eq;

use super::{may_be_equal, UnificationResult};
use crate::data::{TypeArg, Variance};
use crate::testing::Fixture;

fn unify(fx: &Fixture, known: &str, pattern: &str) -> UnificationResult {
    let script = fx.script();
    fx.ctx()
        .unify(fx.ty(known), fx.ty(pattern), |ctor| script.is_free_var(ctor))
}

#[test]
fn constructors_must_match_exactly() {
    let fx = Fixture::kotlin();
    // Structural only: a subtype relation is not enough.
    let result = unify(&fx, "List<Any>", "Set<X>");
    assert!(!result.success);
    assert!(result.bindings.is_empty());

    assert!(!unify(&fx, "ArrayList<Int>", "InvList<X>").success);
    assert!(unify(&fx, "C<Int>", "C<Int>").success);
}

#[test]
fn variables_bind_with_the_known_projection() {
    let fx = Fixture::kotlin();
    let x = fx.ctor("X");
    let int = fx.ty("Int");

    let result = unify(&fx, "C<Int>", "C<X>");
    assert!(result.success);
    assert_eq!(result.binding(x), Some(TypeArg::Invariant(int)));

    let result = unify(&fx, "Base_T<out Int>", "Base_T<X>");
    assert!(result.success);
    assert_eq!(result.binding(x), Some(TypeArg::Out(int)));

    let result = unify(&fx, "Base_T<in Any>", "Base_T<in X>");
    assert!(result.success);
    assert_eq!(result.binding(x), Some(TypeArg::In(TypeId::ANY)));

    let result = unify(&fx, "Base_T<Int>", "Base_T<out X>");
    assert!(!result.success);
    assert_eq!(result.binding(x), None);
    assert!(!unify(&fx, "Base_T<in Int>", "Base_T<out X>").success);
}

#[test]
fn nullability_is_absorbed_by_variables() {
    let fx = Fixture::kotlin();
    let x = fx.ctor("X");

    let result = unify(&fx, "Any?", "X");
    assert!(result.success);
    assert_eq!(result.binding(x), Some(TypeArg::Invariant(TypeId::NULLABLE_ANY)));

    let result = unify(&fx, "Any?", "X?");
    assert!(result.success);
    assert_eq!(result.binding(x), Some(TypeArg::Invariant(TypeId::ANY)));

    assert!(!unify(&fx, "Any", "X?").success);
    assert!(!unify(&fx, "C<Int>?", "C<X>").success);
    assert!(!unify(&fx, "C<Int>", "C<X>?").success);
}

#[test]
fn star_projections() {
    let fx = Fixture::kotlin();
    let x = fx.ctor("X");

    let result = unify(&fx, "Base_T<*>", "Base_T<X>");
    assert!(result.success);
    assert_eq!(result.binding(x), Some(TypeArg::Star));

    assert!(!unify(&fx, "Base_T<*>", "Base_T<X?>").success);
    assert!(!unify(&fx, "Base_T<*>", "Base_T<in X>").success);
    assert!(!unify(&fx, "Base_T<Int>", "Base_T<*>").success);
    assert!(unify(&fx, "Base_T<*>", "Base_T<*>").success);
}

#[test]
fn one_binding_per_variable() {
    let fx = Fixture::kotlin_with("interface Two<A, B>");
    let x = fx.ctor("X");
    let y = fx.ctor("Y");

    let result = unify(&fx, "Two<Int, Int>", "Two<X, X>");
    assert!(result.success);
    assert_eq!(result.bindings.len(), 1);

    let result = unify(&fx, "Two<Int, String>", "Two<X, X>");
    assert!(!result.success);
    assert_eq!(result.failed_variables, vec![x]);
    // The first binding is kept for diagnostics.
    assert_eq!(result.binding(x), Some(TypeArg::Invariant(fx.ty("Int"))));

    let result = unify(&fx, "Two<C<Int>, String>", "Two<C<X>, Y>");
    assert!(result.success);
    assert_eq!(result.binding(y), Some(TypeArg::Invariant(fx.ty("String"))));
}

#[test]
fn partial_bindings_survive_a_failure() {
    let fx = Fixture::kotlin_with("interface Two<A, B>");
    let result = unify(&fx, "Two<Int, String>", "Two<X, Boolean>");
    assert!(!result.success);
    assert!(result.failed_variables.is_empty());
    assert_eq!(result.binding(fx.ctor("X")), Some(TypeArg::Invariant(fx.ty("Int"))));
}

#[test]
fn ill_formed_arity_fails() {
    let fx = Fixture::kotlin();
    let interner = fx.interner();
    let bare_list = interner.applied(fx.ctor("List"), Vec::<TypeArg>::new(), false);
    let script = fx.script();
    let result = fx
        .ctx()
        .unify(bare_list, fx.ty("List<X>"), |ctor| script.is_free_var(ctor));
    assert!(!result.success);
}

#[test]
fn error_types_bind_or_match() {
    let fx = Fixture::kotlin();
    let ctx = fx.ctx();
    let script = fx.script();
    let x = fx.ctor("X");

    let result = ctx.unify(TypeId::ERROR, fx.ty("X"), |ctor| script.is_free_var(ctor));
    assert!(result.success);
    assert_eq!(result.binding(x), Some(TypeArg::Invariant(TypeId::ERROR)));

    let result = ctx.unify(fx.ty("C<Int>"), TypeId::ERROR, |ctor| script.is_free_var(ctor));
    assert!(result.success);
}

#[test]
fn bindings_substitute_back_to_the_known_type() {
    let fx = Fixture::kotlin_with("interface Two<A, B>");
    let ctx = fx.ctx();
    let cases = [
        ("Base_T<C<Int>>?", "Base_T<C<X>>?"),
        ("Two<out Int, *>", "Two<X, Y>"),
        ("Two<Any?, Base_T<in String>>", "Two<X, Base_T<Y>>"),
    ];
    for (known, pattern) in cases {
        let result = unify(&fx, known, pattern);
        assert!(result.success, "{known} ~ {pattern}");
        let back = ctx.substitute(fx.ty(pattern), &result.to_substitution(), Variance::Invariant);
        assert_eq!(back, Some(fx.ty(known)), "{known} ~ {pattern}");
    }
}

#[test]
fn may_be_equal_treats_type_parameters_as_variables() {
    let fx = Fixture::kotlin();
    let ctx = fx.ctx();
    assert!(may_be_equal(&ctx, fx.ty("T"), fx.ty("Int")));
    assert!(!may_be_equal(&ctx, fx.ty("Int"), fx.ty("C<T>?")));
    assert!(may_be_equal(&ctx, fx.ty("C<Int>"), fx.ty("C<T>")));
    assert!(may_be_equal(&ctx, fx.ty("C<T>"), fx.ty("C<Int>")));
    assert!(!may_be_equal(&ctx, fx.ty("C<Int>"), fx.ty("C<String>")));
    assert!(!may_be_equal(&ctx, fx.ty("Int"), fx.ty("String")));
}
