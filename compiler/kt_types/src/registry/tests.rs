use kt_ir::{SharedInterner, Span, TypeId};
use pretty_assertions::assert_eq;

use super::*;
use crate::data::{TypeArg, Variance};
use crate::type_interner::TypeInterner;

fn builder(interner: &TypeInterner) -> DeclarationsBuilder<'_> {
    DeclarationsBuilder::new(interner, SharedInterner::new())
}

fn class(b: &mut DeclarationsBuilder<'_>, name: &str, modality: Modality) -> ConstructorId {
    let name = b.names().intern(name);
    b.declare_class(name, ClassKind::Class, modality, Span::DUMMY)
        .unwrap()
}

#[test]
fn builtins_are_declared_in_order() {
    let interner = TypeInterner::new();
    let decls = builder(&interner).finish().unwrap();
    let b = decls.builtins();

    assert_eq!(*b, BuiltIns::STANDARD);
    assert_eq!(decls.lookup_class("Any"), Some(ConstructorId::ANY));
    assert_eq!(decls.lookup_class("Nothing"), Some(ConstructorId::NOTHING));
    assert_eq!(decls.lookup_class("Int"), Some(b.int));
    assert_eq!(decls.name_str(b.comparable), "Comparable");
    assert!(decls.declared_supertypes(b.any).is_empty());
    assert!(decls.declared_supertypes(b.nothing).is_empty());
    assert!(decls.is_final(b.int));
    assert!(!decls.is_final(b.number));
    assert!(!decls.is_final(b.comparable));

    let comparable_param = decls.params_of(b.comparable)[0];
    assert_eq!(decls.variance_of(comparable_param), Variance::In);
    assert_eq!(decls.upper_bound(comparable_param), TypeId::NULLABLE_ANY);

    let int_supers: Vec<_> = decls
        .declared_supertypes(b.int)
        .iter()
        .filter_map(|&s| interner.ctor_of(s))
        .collect();
    assert_eq!(int_supers, vec![b.number, b.comparable]);
}

#[test]
fn defaults_are_filled_in() {
    let interner = TypeInterner::new();
    let mut b = builder(&interner);
    let base = class(&mut b, "Base", Modality::Open);
    let t = b.names().intern("T");
    let param = b.add_type_param(ParamOwner::Class(base), t, Variance::Out, Span::DUMMY);
    let decls = b.finish().unwrap();

    assert_eq!(decls.declared_supertypes(base), &[TypeId::ANY]);
    assert_eq!(decls.params_of(base), &[param]);
    assert_eq!(decls.arity(base), 1);
    assert_eq!(decls.declared_supertypes(param), &[TypeId::NULLABLE_ANY]);
    assert_eq!(decls.type_param(param).unwrap().owner, ParamOwner::Class(base));
    assert_eq!(decls.name_str(param), "T");
    assert!(decls.class(param).is_none());
    assert!(decls.type_param(base).is_none());
}

#[test]
fn several_bounds_become_an_intersection() {
    let interner = TypeInterner::new();
    let mut b = builder(&interner);
    let left = b.names().intern("Left");
    let right = b.names().intern("Right");
    let left = b
        .declare_class(left, ClassKind::Interface, Modality::Abstract, Span::DUMMY)
        .unwrap();
    let right = b
        .declare_class(right, ClassKind::Interface, Modality::Abstract, Span::DUMMY)
        .unwrap();
    let t = b.names().intern("T");
    let param = b.add_type_param(ParamOwner::Free, t, Variance::Invariant, Span::DUMMY);
    b.add_upper_bound(param, interner.simple(left));
    b.add_upper_bound(param, interner.simple(right));
    let decls = b.finish().unwrap();

    let bound = decls.upper_bound(param);
    assert_eq!(
        bound,
        interner.intersection([interner.simple(left), interner.simple(right)], false)
    );
    assert!(interner.ctor_of(bound).is_none());
}

#[test]
fn duplicate_class_is_rejected() {
    let interner = TypeInterner::new();
    let mut b = builder(&interner);
    let name = b.names().intern("Int");
    let err = b
        .declare_class(name, ClassKind::Class, Modality::Final, Span::new(3, 6))
        .unwrap_err();
    assert_eq!(
        err,
        DeclError::DuplicateClass {
            name: "Int".into(),
            span: Span::new(3, 6),
        }
    );
    assert_eq!(err.to_string(), "class `Int` is already declared");
}

#[test]
fn cyclic_hierarchy_is_rejected() {
    let interner = TypeInterner::new();
    let mut b = builder(&interner);
    let a = class(&mut b, "A", Modality::Open);
    let c = class(&mut b, "C", Modality::Open);
    b.set_supertypes(a, vec![interner.simple(c)]);
    b.set_supertypes(c, vec![interner.simple(a)]);
    let err = b.finish().unwrap_err();
    assert!(matches!(err, DeclError::CyclicHierarchy { .. }), "{err:?}");
}

#[test]
fn cyclic_bound_is_rejected() {
    let interner = TypeInterner::new();
    let mut b = builder(&interner);
    let t = b.names().intern("T");
    let u = b.names().intern("U");
    let t = b.add_type_param(ParamOwner::Callable, t, Variance::Invariant, Span::DUMMY);
    let u = b.add_type_param(ParamOwner::Callable, u, Variance::Invariant, Span::DUMMY);
    b.add_upper_bound(t, interner.simple(u));
    b.add_upper_bound(u, interner.simple(t));
    let err = b.finish().unwrap_err();
    assert!(matches!(err, DeclError::CyclicBound { .. }), "{err:?}");
}

#[test]
fn self_referential_bound_is_allowed() {
    let interner = TypeInterner::new();
    let mut b = builder(&interner);
    let comparable = BuiltIns::STANDARD.comparable;
    let t = b.names().intern("T");
    let t = b.add_type_param(ParamOwner::Callable, t, Variance::Invariant, Span::DUMMY);
    let bound = interner.applied(comparable, vec![TypeArg::Invariant(interner.simple(t))], false);
    b.add_upper_bound(t, bound);
    let decls = b.finish().unwrap();
    assert_eq!(decls.upper_bound(t), bound);
}

#[test]
fn arity_is_checked() {
    let interner = TypeInterner::new();
    let mut b = builder(&interner);
    let a = class(&mut b, "A", Modality::Open);
    let comparable = BuiltIns::STANDARD.comparable;
    b.set_supertypes(a, vec![interner.simple(comparable)]);
    let err = b.finish().unwrap_err();
    assert_eq!(
        err.to_string(),
        "`Comparable` expects 1 type argument(s), found 0"
    );
}

#[test]
fn supertype_shape_is_checked() {
    let interner = TypeInterner::new();
    let int = BuiltIns::STANDARD.int;

    let mut b = builder(&interner);
    let a = class(&mut b, "A", Modality::Open);
    b.set_supertypes(a, vec![interner.simple(int)]);
    assert!(matches!(
        b.finish().unwrap_err(),
        DeclError::FinalSupertype { .. }
    ));

    let mut b = builder(&interner);
    let base = class(&mut b, "Base", Modality::Open);
    let a = class(&mut b, "A", Modality::Open);
    b.set_supertypes(a, vec![interner.make_nullable(interner.simple(base))]);
    assert!(matches!(
        b.finish().unwrap_err(),
        DeclError::NullableSupertype { .. }
    ));

    let mut b = builder(&interner);
    let base = class(&mut b, "Base", Modality::Open);
    let a = class(&mut b, "A", Modality::Open);
    b.set_supertypes(a, vec![interner.simple(base), interner.simple(base)]);
    assert!(matches!(
        b.finish().unwrap_err(),
        DeclError::DuplicateSupertype { .. }
    ));

    let mut b = builder(&interner);
    let a = class(&mut b, "A", Modality::Open);
    let t = b.names().intern("T");
    let t = b.add_type_param(ParamOwner::Class(a), t, Variance::Invariant, Span::DUMMY);
    b.set_supertypes(a, vec![interner.simple(t)]);
    assert!(matches!(
        b.finish().unwrap_err(),
        DeclError::TypeParameterSupertype { .. }
    ));
}

#[test]
fn classes_iterate_in_declaration_order() {
    let interner = TypeInterner::new();
    let mut b = builder(&interner);
    class(&mut b, "Zeta", Modality::Open);
    class(&mut b, "Alpha", Modality::Open);
    let decls = b.finish().unwrap();
    let names: Vec<_> = decls.classes().map(|(id, _)| decls.name_str(id)).collect();
    assert_eq!(names[0], "Any");
    assert_eq!(&names[names.len() - 2..], &["Zeta", "Alpha"]);
}
