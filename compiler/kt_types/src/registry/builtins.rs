//! Built-in classes every registry starts with.

use kt_ir::{ConstructorId, Span, TypeId};

use super::{ClassKind, DeclarationsBuilder, Modality, ParamOwner};
use crate::data::{TypeArg, Variance};

/// Built-in class constructors, declared by every [`DeclarationsBuilder`].
///
/// This is the explicit built-ins context: engine code reaches `Any`,
/// `Nothing` and friends through the registry, never through globals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuiltIns {
    pub any: ConstructorId,
    pub nothing: ConstructorId,
    pub unit: ConstructorId,
    pub number: ConstructorId,
    pub comparable: ConstructorId,
    pub char_sequence: ConstructorId,
    pub boolean: ConstructorId,
    pub char: ConstructorId,
    pub byte: ConstructorId,
    pub short: ConstructorId,
    pub int: ConstructorId,
    pub long: ConstructorId,
    pub float: ConstructorId,
    pub double: ConstructorId,
    pub string: ConstructorId,
    pub array: ConstructorId,
}

impl BuiltIns {
    /// Ids of the built-ins, in the order [`BuiltIns::declare`] creates them.
    pub const STANDARD: BuiltIns = BuiltIns {
        any: ConstructorId::ANY,
        nothing: ConstructorId::NOTHING,
        unit: ConstructorId::class(2),
        number: ConstructorId::class(3),
        comparable: ConstructorId::class(4),
        char_sequence: ConstructorId::class(5),
        boolean: ConstructorId::class(6),
        char: ConstructorId::class(7),
        byte: ConstructorId::class(8),
        short: ConstructorId::class(9),
        int: ConstructorId::class(10),
        long: ConstructorId::class(11),
        float: ConstructorId::class(12),
        double: ConstructorId::class(13),
        string: ConstructorId::class(14),
        array: ConstructorId::class(15),
    };

    /// Declare the built-in hierarchy into a fresh builder.
    pub(super) fn declare(builder: &mut DeclarationsBuilder<'_>) {
        use ClassKind::{Class, Interface};
        use Modality::{Abstract, Final, Open};

        let b = Self::STANDARD;
        let classes = [
            ("Any", Class, Open, b.any),
            ("Nothing", Class, Final, b.nothing),
            ("Unit", Class, Final, b.unit),
            ("Number", Class, Abstract, b.number),
            ("Comparable", Interface, Abstract, b.comparable),
            ("CharSequence", Interface, Abstract, b.char_sequence),
            ("Boolean", Class, Final, b.boolean),
            ("Char", Class, Final, b.char),
            ("Byte", Class, Final, b.byte),
            ("Short", Class, Final, b.short),
            ("Int", Class, Final, b.int),
            ("Long", Class, Final, b.long),
            ("Float", Class, Final, b.float),
            ("Double", Class, Final, b.double),
            ("String", Class, Final, b.string),
            ("Array", Class, Final, b.array),
        ];
        for (name, kind, modality, expected) in classes {
            let name = builder.names.intern(name);
            let id = builder.push_class(name, kind, modality, Span::DUMMY);
            debug_assert_eq!(id, expected);
        }

        let t = builder.names.intern("T");
        builder.add_type_param(ParamOwner::Class(b.comparable), t, Variance::In, Span::DUMMY);
        builder.add_type_param(ParamOwner::Class(b.array), t, Variance::Invariant, Span::DUMMY);

        let interner = builder.interner;
        let comparable_of = |ctor| {
            let arg = TypeArg::Invariant(interner.simple(ctor));
            interner.applied(b.comparable, vec![arg], false)
        };
        let number = interner.simple(b.number);

        builder.set_supertypes(b.boolean, vec![comparable_of(b.boolean)]);
        for numeric in [b.byte, b.short, b.int, b.long, b.float, b.double] {
            builder.set_supertypes(numeric, vec![number, comparable_of(numeric)]);
        }
        builder.set_supertypes(
            b.string,
            vec![comparable_of(b.string), interner.simple(b.char_sequence)],
        );
        // Char has no Comparable supertype, so `lub(Int, Char)` is `Any`.
        builder.set_supertypes(b.char, vec![TypeId::ANY]);
    }
}
