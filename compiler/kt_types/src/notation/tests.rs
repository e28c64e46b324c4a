use kt_ir::{SharedInterner, TypeId};
use pretty_assertions::assert_eq;

use super::{load_script, NotationError};
use crate::data::{TypeArg, Variance};
use crate::overload::CallableKind;
use crate::registry::{DeclError, ParamOwner};
use crate::testing::Fixture;
use crate::type_interner::TypeInterner;

fn load_error(source: &str) -> NotationError {
    let interner = TypeInterner::new();
    match load_script(source, &interner, SharedInterner::new()) {
        Ok(_) => panic!("expected `{source}` to fail"),
        Err(err) => err,
    }
}

/// The source text an error points at.
fn pointed_at(source: &str, err: &NotationError) -> String {
    let span = err.span();
    source[span.start as usize..span.end as usize].to_owned()
}

#[test]
fn declarations_may_refer_forward() {
    let fx = Fixture::load(
        "open class Impl : Api<Impl>\n\
         interface Api<out T : Api<T>>",
    );
    let api = fx.ctor("Api");
    let api_param = fx.param_of("Api", 0);

    assert_eq!(fx.decls().variance_of(api_param), Variance::Out);
    assert_eq!(fx.render(fx.decls().upper_bound(api_param)), "Api<T>");
    let supers: Vec<String> = fx
        .decls()
        .declared_supertypes(fx.ctor("Impl"))
        .iter()
        .map(|&s| fx.render(s))
        .collect();
    assert_eq!(supers, vec!["Api<Impl>"]);
    assert_eq!(fx.interner().ctor_of(fx.ty("Api<*>")), Some(api));
}

#[test]
fn class_parameters_shadow_free_variables() {
    let fx = Fixture::load("typevar T : Number\nclass Box<T> : Comparable<T>");
    let free = fx.ctor("T");
    let class_param = fx.param_of("Box", 0);
    assert_ne!(free, class_param);

    let supertype = fx.decls().declared_supertypes(fx.ctor("Box"))[0];
    assert_eq!(
        fx.interner().args_of(supertype).to_vec(),
        vec![TypeArg::Invariant(fx.interner().simple(class_param))]
    );
    // Outside the class, `T` is the free variable.
    assert_eq!(fx.interner().ctor_of(fx.ty("T")), Some(free));
    assert_eq!(fx.decls().type_param(free).map(|p| p.owner), Some(ParamOwner::Free));
    assert_eq!(fx.render(fx.decls().upper_bound(free)), "Number");
}

#[test]
fn where_clauses_add_bounds() {
    let fx = Fixture::load("interface I\ninterface J\nclass Both<T> where T : I, T : J");
    let param = fx.param_of("Both", 0);
    let bounds: Vec<String> = fx
        .decls()
        .declared_supertypes(param)
        .iter()
        .map(|&b| fx.render(b))
        .collect();
    assert_eq!(bounds, vec!["I", "J"]);
    let bound_type = fx.decls().upper_bound(param);
    assert!(matches!(
        fx.interner().lookup(bound_type),
        crate::data::TypeData::Intersection { nullable: false, .. }
    ));
}

#[test]
fn callables_are_loaded_in_order() {
    let fx = Fixture::load(
        "open class Base_T<T>\n\
         fun <E : Number> Base_T<E>.sum(init: E, extra: Int?): E\n\
         fun reset()\n\
         var Base_T<*>.size: Int",
    );

    let sum = fx.callable(0);
    assert_eq!(fx.decls().names().lookup(sum.name), "sum");
    assert_eq!(sum.kind, CallableKind::Function);
    assert_eq!(sum.type_params.len(), 1);
    let e = sum.type_params[0];
    assert_eq!(fx.decls().type_param(e).map(|p| p.owner), Some(ParamOwner::Callable));
    assert_eq!(fx.render(fx.decls().upper_bound(e)), "Number");
    assert_eq!(sum.receiver.map(|r| fx.render(r)).as_deref(), Some("Base_T<E>"));
    let params: Vec<String> = sum.value_params.iter().map(|p| fx.render(p.ty)).collect();
    assert_eq!(params, vec!["E", "Int?"]);
    assert_eq!(fx.render(sum.return_type), "E");

    let reset = fx.callable(1);
    assert_eq!(fx.render(reset.return_type), "Unit");
    assert!(reset.value_params.is_empty());

    let size = fx.callable(2);
    assert_eq!(size.kind, CallableKind::Property { is_var: true });
    assert_eq!(size.receiver.map(|r| fx.render(r)).as_deref(), Some("Base_T<*>"));
    assert_eq!(size.return_type, fx.ty("Int"));
}

#[test]
fn free_variables_are_reported() {
    let fx = Fixture::load("typevar X\nclass K<T>");
    let x = fx.ctor("X");
    assert_eq!(fx.script().free_var("X"), Some(x));
    assert_eq!(fx.script().free_var("T"), None);
    assert!(fx.script().is_free_var(x));
    assert!(!fx.script().is_free_var(fx.param_of("K", 0)));
}

#[test]
fn unresolved_names_point_at_the_reference() {
    let source = "open class A : Missing<Int>";
    let err = load_error(source);
    assert!(matches!(&err, NotationError::UnresolvedName { name, .. } if name == "Missing"));
    assert_eq!(pointed_at(source, &err), "Missing<Int>");

    let source = "class A<T> where U : Any";
    let err = load_error(source);
    assert!(matches!(&err, NotationError::UnresolvedName { name, .. } if name == "U"));
}

#[test]
fn duplicates_are_rejected() {
    assert!(matches!(
        load_error("class A\ninterface A"),
        NotationError::Duplicate { name, .. } if name == "A"
    ));
    assert!(matches!(
        load_error("class Int"),
        NotationError::Duplicate { name, .. } if name == "Int"
    ));
    assert!(matches!(
        load_error("class Pair<T, T>"),
        NotationError::Duplicate { name, .. } if name == "T"
    ));
    assert!(matches!(
        load_error("typevar X\ntypevar X"),
        NotationError::Duplicate { name, .. } if name == "X"
    ));
}

#[test]
fn arity_is_checked_during_resolution() {
    let source = "class A : Comparable<Int, Int>";
    let err = load_error(source);
    assert_eq!(
        err,
        NotationError::Decl(DeclError::ArityMismatch {
            name: "Comparable".to_owned(),
            expected: 1,
            found: 2,
            span: err.span(),
        })
    );
    assert_eq!(pointed_at(source, &err), "Comparable<Int, Int>");
    assert!(matches!(
        load_error("typevar T\nclass A : Comparable<T<Int>>"),
        NotationError::Decl(DeclError::ArityMismatch { expected: 0, .. })
    ));
}

#[test]
fn registry_errors_are_wrapped() {
    assert!(matches!(
        load_error("open class A : B\nopen class B : A"),
        NotationError::Decl(DeclError::CyclicHierarchy { .. })
    ));
    assert!(matches!(
        load_error("class Sealed\nclass Sub : Sealed"),
        NotationError::Decl(DeclError::FinalSupertype { .. })
    ));
}

#[test]
fn parse_type_requires_the_whole_input() {
    let fx = Fixture::kotlin();
    let interner = fx.interner();
    assert_eq!(fx.script().parse_type(interner, "Nothing?"), Ok(TypeId::NULLABLE_NOTHING));
    assert!(matches!(
        fx.script().parse_type(interner, "Int Int"),
        Err(NotationError::UnexpectedToken { expected: "end of input", .. })
    ));
    assert!(matches!(
        fx.script().parse_type(interner, "Base_T<Int"),
        Err(NotationError::UnexpectedToken { .. })
    ));
    assert!(matches!(
        fx.script().parse_type(interner, "Int#"),
        Err(NotationError::Lex { .. })
    ));
}

#[test]
fn intersections_and_projections_resolve() {
    let fx = Fixture::kotlin();
    let ty = fx.ty("Base_T<in (Parent & Base_outT<*>)?>");
    let args = fx.interner().args_of(ty);
    let [TypeArg::In(member)] = *args else {
        panic!("expected one `in` argument, got {args:?}");
    };
    assert!(fx.interner().is_nullable(member));
    assert!(matches!(
        fx.interner().lookup(member),
        crate::data::TypeData::Intersection { ref members, .. } if members.len() == 2
    ));
}

#[test]
fn parenthesized_types_pass_through() {
    let fx = Fixture::kotlin();
    assert_eq!(fx.ty("(Int)"), fx.ty("Int"));
    assert_eq!(fx.ty("(Int)?"), fx.ty("Int?"));
    assert_eq!(fx.ty("(Int?)"), fx.ty("Int?"));
    assert_eq!(fx.ty("((Parent & A))?"), fx.ty("(Parent & A)?"));
}
