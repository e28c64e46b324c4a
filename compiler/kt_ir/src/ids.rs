//! Compact handles for interned names, interned types and declared
//! constructors.

use std::fmt;

const LOCAL_BITS: u32 = 28;
const LOCAL_MASK: u32 = (1 << LOCAL_BITS) - 1;

/// Declares a 32-bit handle into a 16-shard interner: the top 4 bits pick
/// the shard, the low 28 bits index into it.
macro_rules! sharded_handle {
    ($(#[$meta:meta])* $handle:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[repr(transparent)]
        pub struct $handle(u32);

        impl $handle {
            /// Largest local index a shard can hand out.
            pub const MAX_LOCAL: u32 = LOCAL_MASK;

            pub const NUM_SHARDS: usize = 1 << (32 - LOCAL_BITS);

            #[inline]
            pub const fn from_shard_local(shard: u32, local: u32) -> Self {
                debug_assert!((shard as usize) < Self::NUM_SHARDS);
                debug_assert!(local <= LOCAL_MASK);
                $handle((shard << LOCAL_BITS) | local)
            }

            #[inline]
            pub const fn shard(self) -> usize {
                (self.0 >> LOCAL_BITS) as usize
            }

            #[inline]
            pub const fn local(self) -> usize {
                (self.0 & LOCAL_MASK) as usize
            }
        }
    };
}

sharded_handle! {
    /// Interned name: class, type parameter, callable or parameter.
    Name
}

impl Name {
    /// The empty string, pre-interned in every interner.
    pub const EMPTY: Name = Name(0);
}

impl Default for Name {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({}:{})", self.shard(), self.local())
    }
}

sharded_handle! {
    /// Interned type.
    ///
    /// Two `TypeId`s from the same interner are equal iff the types are
    /// structurally equal. The canonical types sit in shard 0 at fixed local
    /// indices: the error type, `Any`, `Any?`, `Nothing` and `Nothing?`.
    TypeId
}

impl TypeId {
    pub const ERROR: TypeId = TypeId(0);
    pub const ANY: TypeId = TypeId(1);
    pub const NULLABLE_ANY: TypeId = TypeId(2);
    pub const NOTHING: TypeId = TypeId(3);
    pub const NULLABLE_NOTHING: TypeId = TypeId(4);

    /// Number of pre-interned types in shard 0.
    pub const PRE_INTERNED: u32 = 5;

    #[inline]
    pub const fn is_error(self) -> bool {
        self.0 == Self::ERROR.0
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TypeId::ERROR => write!(f, "TypeId::ERROR"),
            TypeId::ANY => write!(f, "TypeId::ANY"),
            TypeId::NULLABLE_ANY => write!(f, "TypeId::NULLABLE_ANY"),
            TypeId::NOTHING => write!(f, "TypeId::NOTHING"),
            TypeId::NULLABLE_NOTHING => write!(f, "TypeId::NULLABLE_NOTHING"),
            _ => write!(f, "TypeId({}:{})", self.shard(), self.local()),
        }
    }
}

/// Handle to a declared type constructor.
///
/// Classes and type parameters share one handle type but live in separate
/// index spaces: the top bit tags type parameters. This lets the type
/// interner tell "mentions a type parameter" apart without access to the
/// declaration registry.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct ConstructorId(u32);

impl ConstructorId {
    const PARAM_TAG: u32 = 1 << 31;

    /// The `Any` class, always the first declared class.
    pub const ANY: ConstructorId = ConstructorId(0);
    /// The `Nothing` class, always the second declared class.
    pub const NOTHING: ConstructorId = ConstructorId(1);

    /// Largest index either space can hold.
    pub const MAX_INDEX: u32 = Self::PARAM_TAG - 1;

    #[inline]
    pub const fn class(index: u32) -> Self {
        debug_assert!(index <= Self::MAX_INDEX);
        ConstructorId(index)
    }

    #[inline]
    pub const fn type_param(index: u32) -> Self {
        debug_assert!(index <= Self::MAX_INDEX);
        ConstructorId(index | Self::PARAM_TAG)
    }

    #[inline]
    pub const fn is_type_param(self) -> bool {
        self.0 & Self::PARAM_TAG != 0
    }

    /// Index within the class or type-parameter space.
    #[inline]
    pub const fn index(self) -> usize {
        (self.0 & !Self::PARAM_TAG) as usize
    }
}

impl fmt::Debug for ConstructorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_type_param() {
            write!(f, "Param({})", self.index())
        } else {
            write!(f, "Class({})", self.index())
        }
    }
}
