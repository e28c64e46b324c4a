use super::*;
use crate::data::TypeArg;

const LIST: ConstructorId = ConstructorId::class(10);
const INT: ConstructorId = ConstructorId::class(11);
const T: ConstructorId = ConstructorId::type_param(0);

#[test]
fn canonical_types_have_fixed_ids() {
    let interner = TypeInterner::new();
    assert_eq!(interner.intern(TypeData::Error), TypeId::ERROR);
    assert_eq!(interner.simple(ConstructorId::ANY), TypeId::ANY);
    assert_eq!(
        interner.applied(ConstructorId::NOTHING, Vec::new(), true),
        TypeId::NULLABLE_NOTHING
    );
    assert_eq!(interner.make_nullable(TypeId::ANY), TypeId::NULLABLE_ANY);
    assert_eq!(interner.make_not_nullable(TypeId::NULLABLE_NOTHING), TypeId::NOTHING);
}

#[test]
fn structurally_equal_types_share_an_id() {
    let interner = TypeInterner::new();
    let int = interner.simple(INT);
    let a = interner.applied(LIST, vec![TypeArg::Out(int)], false);
    let b = interner.applied(LIST, vec![TypeArg::Out(int)], false);
    let c = interner.applied(LIST, vec![TypeArg::In(int)], false);
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn flags_propagate_from_arguments() {
    let interner = TypeInterner::new();
    let t = interner.simple(T);
    let list_t = interner.applied(LIST, vec![TypeArg::Invariant(t)], true);
    let flags = interner.flags(list_t);
    assert!(flags.has_type_params());
    assert!(flags.is_nullable());

    let outer = interner.applied(LIST, vec![TypeArg::Invariant(list_t)], false);
    assert!(interner.flags(outer).has_type_params());
    assert!(!interner.is_nullable(outer));

    let star = interner.applied(LIST, vec![TypeArg::Star], false);
    assert!(interner.flags(star).contains(TypeFlags::HAS_STAR));
    assert!(!interner.flags(star).has_type_params());

    let broken = interner.applied(LIST, vec![TypeArg::Invariant(TypeId::ERROR)], false);
    assert!(interner.contains_error(broken));
    assert!(!interner.is_error(broken));
}

#[test]
fn depth_counts_nesting() {
    let interner = TypeInterner::new();
    let int = interner.simple(INT);
    let list = interner.applied(LIST, vec![TypeArg::Invariant(int)], false);
    let nested = interner.applied(LIST, vec![TypeArg::Out(list)], false);
    assert_eq!(interner.depth(int), 1);
    assert_eq!(interner.depth(list), 2);
    assert_eq!(interner.depth(nested), 3);
    assert_eq!(interner.depth(interner.applied(LIST, vec![TypeArg::Star], false)), 1);
}

#[test]
fn intersection_is_canonical() {
    let interner = TypeInterner::new();
    let int = interner.simple(INT);
    let list = interner.applied(LIST, vec![TypeArg::Invariant(int)], false);
    let nullable_list = interner.make_nullable(list);

    let ab = interner.intersection([int, list], false);
    let ba = interner.intersection([nullable_list, int, int], false);
    assert_eq!(ab, ba);
    assert!(interner.flags(ab).contains(TypeFlags::HAS_INTERSECTION));
    assert_eq!(interner.ctor_of(ab), None);

    assert_eq!(interner.intersection([int], true), interner.make_nullable(int));
    assert_eq!(interner.intersection(std::iter::empty(), false), TypeId::ANY);
    assert_eq!(interner.intersection([ab, int], false), ab);
}

#[test]
fn accessors() {
    let interner = TypeInterner::new();
    let int = interner.simple(INT);
    let list = interner.applied(LIST, vec![TypeArg::Invariant(int)], false);
    assert_eq!(interner.ctor_of(list), Some(LIST));
    assert_eq!(&*interner.args_of(list), &[TypeArg::Invariant(int)]);
    assert!(interner.args_of(TypeId::ERROR).is_empty());
    assert!(interner.is_nothing(TypeId::NOTHING));
    assert!(interner.is_nothing_or_nullable_nothing(TypeId::NULLABLE_NOTHING));
    assert!(!interner.is_nothing(TypeId::NULLABLE_NOTHING));
    assert_eq!(interner.make_nullable_if_needed(int, false), int);
    assert_eq!(interner.make_nullable_as(TypeId::ERROR, true), TypeId::ERROR);
    assert!(interner.len() >= TypeId::PRE_INTERNED as usize + 2);
    assert!(!interner.is_empty());
}

#[test]
fn concurrent_interning_agrees() {
    let interner = SharedTypeInterner::new();
    let ids: Vec<Vec<TypeId>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let interner = interner.clone();
                scope.spawn(move || {
                    (0..32)
                        .map(|i| {
                            let leaf = interner.simple(ConstructorId::class(100 + i));
                            interner.applied(LIST, vec![TypeArg::Out(leaf)], i % 2 == 0)
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_default())
            .collect()
    });

    for other in &ids[1..] {
        assert_eq!(&ids[0], other);
    }
}
