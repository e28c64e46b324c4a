use kt_ir::TypeId;
use pretty_assertions::assert_eq;

use crate::config::EngineConfig;
use crate::testing::Fixture;

fn lub(fx: &Fixture, types: &[&str]) -> String {
    let types: Vec<TypeId> = types.iter().map(|t| fx.ty(t)).collect();
    fx.render(fx.ctx().common_supertype(&types))
}

fn glb(fx: &Fixture, types: &[&str]) -> Option<String> {
    let types: Vec<TypeId> = types.iter().map(|t| fx.ty(t)).collect();
    fx.ctx().intersect(&types).map(|ty| fx.render(ty))
}

#[test]
fn nothing_only_contributes_nullability() {
    let fx = Fixture::kotlin();
    assert_eq!(lub(&fx, &["Int", "Nothing"]), "Int");
    assert_eq!(lub(&fx, &["Int", "Nothing?"]), "Int?");
    assert_eq!(lub(&fx, &["Nothing?", "Nothing"]), "Nothing?");
    assert_eq!(lub(&fx, &[]), "Nothing");
    assert_eq!(lub(&fx, &["Int", "Int?"]), "Int?");
}

#[test]
fn unrelated_types_meet_at_any() {
    let fx = Fixture::kotlin();
    assert_eq!(lub(&fx, &["Int", "Char"]), "Any");
    assert_eq!(lub(&fx, &["Char", "Number"]), "Any");
    assert_eq!(lub(&fx, &["Int?", "Char"]), "Any?");
    assert_eq!(lub(&fx, &["Base_inT<*>", "Derived_T<*>"]), "Any");
    // Number and Comparable tie; the tie is resolved one level up.
    assert_eq!(lub(&fx, &["Int", "Long"]), "Any");
}

#[test]
fn most_specific_common_class_wins() {
    let fx = Fixture::kotlin();
    assert_eq!(lub(&fx, &["Int", "Number"]), "Number");
    assert_eq!(lub(&fx, &["A", "B"]), "Parent");
    assert_eq!(
        lub(&fx, &["DDerived_T<Int>", "DDerived1_T<Int>"]),
        "Derived_T<Int>"
    );
    assert_eq!(
        lub(&fx, &["DDerived_T<Int>", "DDerived1_T<Int>", "DDerived2_T<Int>"]),
        "Derived_T<Int>"
    );
    assert_eq!(lub(&fx, &["Base_T<*>", "Derived_T<*>"]), "Base_T<*>");
    assert_eq!(lub(&fx, &["Derived_T<Int>?", "MDerived_T<Int>"]), "Derived_T<Int>?");
}

#[test]
fn arguments_are_joined_by_variance() {
    let fx = Fixture::kotlin();
    assert_eq!(
        lub(&fx, &["Comparable<Int>", "Comparable<Boolean>"]),
        "Comparable<*>"
    );
    // Both are comparable with themselves only.
    assert_eq!(lub(&fx, &["Int", "String"]), "Comparable<*>");
    assert_eq!(lub(&fx, &["Int?", "String"]), "Comparable<*>?");
    assert_eq!(
        lub(&fx, &["Base_T<Int>", "Base_T<Boolean>"]),
        "Base_T<out Comparable<*>>"
    );
    assert_eq!(
        lub(&fx, &["Base_T<Int>", "Base_T<String>"]),
        "Base_T<out Comparable<*>>"
    );
    assert_eq!(lub(&fx, &["Base_T<A>", "Base_T<B>"]), "Base_T<out Parent>");
    assert_eq!(lub(&fx, &["Derived_T<in Int>", "Base_T<Int>"]), "Base_T<in Int>");
    assert_eq!(lub(&fx, &["Base_T<Int>", "Base_T<*>"]), "Base_T<*>");
    assert_eq!(
        lub(&fx, &["Base_outT<Int>", "Base_outT<String>"]),
        "Base_outT<Comparable<*>>"
    );
    assert_eq!(lub(&fx, &["Base_inT<Int>", "Base_inT<Number>"]), "Base_inT<Int>");
    assert_eq!(lub(&fx, &["Base_inT<Int>", "Base_inT<String>"]), "Base_inT<*>");
}

#[test]
fn recursive_hierarchies_unroll_to_a_fixed_depth() {
    let fx = Fixture::kotlin();
    assert_eq!(
        lub(&fx, &["ARec", "BRec"]),
        "Rec<out Rec<out Rec<out Rec<out Rec<*>>>>>"
    );

    let ctx = fx.ctx_with(EngineConfig::default().with_supertype_unroll_depth(0));
    let shallow = ctx.common_supertype(&[fx.ty("ARec"), fx.ty("BRec")]);
    assert_eq!(fx.render(shallow), "Rec<out Rec<*>>");
}

#[test]
fn type_parameters_with_nullable_bounds() {
    let fx = Fixture::kotlin();
    assert_eq!(lub(&fx, &["T", "Int"]), "Any?");
    assert_eq!(lub(&fx, &["T", "T"]), "T");
}

#[test]
fn error_inputs_give_the_error_type() {
    let fx = Fixture::kotlin();
    let ctx = fx.ctx();
    assert_eq!(
        ctx.common_supertype(&[fx.ty("Int"), TypeId::ERROR]),
        TypeId::ERROR
    );
    assert_eq!(ctx.intersect(&[TypeId::ERROR, fx.ty("Int")]), Some(TypeId::ERROR));
}

#[test]
fn lub_is_a_supertype_of_every_input() {
    let fx = Fixture::kotlin();
    let ctx = fx.ctx();
    let inputs = [
        ["Base_T<Int>", "Base_T<Boolean>"],
        ["Derived_T<in Int>", "Base_T<Int>"],
        ["ARec", "BRec"],
        ["Int?", "Char"],
        ["MDerived_T<Int>", "Derived1_inT<String>"],
    ];
    for pair in inputs {
        let types: Vec<TypeId> = pair.iter().map(|t| fx.ty(t)).collect();
        let result = ctx.common_supertype(&types);
        for (&ty, text) in types.iter().zip(pair) {
            assert!(
                ctx.is_subtype_of(ty, result),
                "{text} <: {}",
                fx.render(result)
            );
        }
    }
}

#[test]
fn intersections_of_final_types() {
    let fx = Fixture::kotlin();
    assert_eq!(glb(&fx, &["Long", "Number"]).as_deref(), Some("Long"));
    assert_eq!(glb(&fx, &["Int", "Any?"]).as_deref(), Some("Int"));
    assert_eq!(glb(&fx, &["Int?", "Number?"]).as_deref(), Some("Int?"));
    assert_eq!(glb(&fx, &["Parent", "A"]).as_deref(), Some("A"));
    assert_eq!(glb(&fx, &["Int", "String"]), None);
    assert_eq!(glb(&fx, &["A", "B"]), None);
    // A type parameter could be instantiated with Int.
    assert_eq!(glb(&fx, &["T", "Int"]).as_deref(), Some("Int"));
}

#[test]
fn intersections_with_nothing_and_nullability() {
    let fx = Fixture::kotlin();
    assert_eq!(glb(&fx, &["Number?", "Number"]).as_deref(), Some("Number"));
    assert_eq!(glb(&fx, &["Nothing", "Nothing?"]).as_deref(), Some("Nothing"));
    assert_eq!(glb(&fx, &["Nothing?", "String?"]).as_deref(), Some("Nothing?"));
    assert_eq!(glb(&fx, &["Nothing?", "String"]).as_deref(), Some("Nothing"));
    assert_eq!(glb(&fx, &[]).as_deref(), Some("Any?"));
    assert_eq!(glb(&fx, &["Base_T<*>"]).as_deref(), Some("Base_T<*>"));
}

#[test]
fn open_types_intersect_to_an_intersection_type() {
    let fx = Fixture::kotlin();
    let ctx = fx.ctx();
    assert_eq!(
        ctx.intersect(&[fx.ty("Parent"), fx.ty("Base_outT<Int>")]),
        Some(fx.ty("(Parent & Base_outT<Int>)"))
    );
    assert_eq!(
        ctx.intersect(&[fx.ty("Parent?"), fx.ty("Base_outT<Int>?")]),
        Some(fx.ty("(Parent & Base_outT<Int>)?"))
    );
    // The subtype makes the supertype redundant.
    assert_eq!(
        glb(&fx, &["Derived_T<Int>", "Base_T<Int>"]).as_deref(),
        Some("Derived_T<Int>")
    );
    assert_eq!(
        glb(&fx, &["Base_T<*>", "Base_T<out Any?>"]).as_deref(),
        Some("Base_T<*>")
    );
}
