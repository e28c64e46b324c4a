//! Sharded type interner.
//!
//! Hash-conses `TypeData` into `TypeId` handles, so structurally equal types
//! get the same id. Flags and nesting depth are computed once at interning.

// Arc is needed here for SharedTypeInterner: one interner serves every thread
// querying the same declarations.
#![expect(
    clippy::disallowed_types,
    reason = "Arc required for SharedTypeInterner thread-safety"
)]

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use kt_ir::{ConstructorId, TypeId};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::data::{TypeArg, TypeData};
use crate::flags::TypeFlags;

/// Error when interning a type fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeInternError {
    /// Shard exceeded the 28-bit local index space.
    #[error("type interner shard {shard_idx} exceeded {max} types", max = TypeId::MAX_LOCAL)]
    ShardOverflow { shard_idx: usize },
}

/// Metadata cached next to each interned type.
#[derive(Copy, Clone, Debug)]
struct TypeMeta {
    flags: TypeFlags,
    /// Nesting depth; a type without arguments has depth 1.
    depth: u32,
}

/// Per-shard storage for interned types.
struct TypeShard {
    map: FxHashMap<TypeData, u32>,
    types: Vec<TypeData>,
    meta: Vec<TypeMeta>,
}

impl TypeShard {
    fn new() -> Self {
        Self {
            map: FxHashMap::default(),
            types: Vec::with_capacity(256),
            meta: Vec::with_capacity(256),
        }
    }

    /// Shard 0 holds the canonical types at the fixed `TypeId` indices.
    fn with_canonical() -> Self {
        let mut shard = Self::new();
        let nullable = TypeFlags::IS_NULLABLE;
        let canonical = [
            (TypeData::Error, TypeFlags::HAS_ERROR),
            (plain(ConstructorId::ANY, false), TypeFlags::empty()),
            (plain(ConstructorId::ANY, true), nullable),
            (plain(ConstructorId::NOTHING, false), TypeFlags::empty()),
            (plain(ConstructorId::NOTHING, true), nullable),
        ];

        for (idx, (data, flags)) in canonical.into_iter().enumerate() {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "canonical type count is fixed and small"
            )]
            let idx_u32 = idx as u32;
            shard.map.insert(data.clone(), idx_u32);
            shard.types.push(data);
            shard.meta.push(TypeMeta { flags, depth: 1 });
        }

        shard
    }
}

fn plain(ctor: ConstructorId, nullable: bool) -> TypeData {
    TypeData::Applied {
        ctor,
        args: Box::new([]),
        nullable,
    }
}

/// Number of shards for type interning.
const NUM_SHARDS: usize = TypeId::NUM_SHARDS;

/// Sharded type interner for concurrent access.
///
/// # Thread Safety
/// Uses `RwLock` per shard. Share across threads through
/// [`SharedTypeInterner`].
///
/// # Canonical Types
/// The error type, `Any`, `Any?`, `Nothing` and `Nothing?` are interned up
/// front at the `TypeId` constants of the same names.
pub struct TypeInterner {
    shards: [RwLock<TypeShard>; NUM_SHARDS],
}

impl TypeInterner {
    pub fn new() -> Self {
        let shards = std::array::from_fn(|i| {
            if i == 0 {
                RwLock::new(TypeShard::with_canonical())
            } else {
                RwLock::new(TypeShard::new())
            }
        });
        Self { shards }
    }

    #[inline]
    fn shard_for(data: &TypeData) -> usize {
        let mut hasher = rustc_hash::FxHasher::default();
        data.hash(&mut hasher);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "truncation is fine for hash-based shard selection"
        )]
        let hash_usize = hasher.finish() as usize;
        hash_usize % NUM_SHARDS
    }

    fn canonical_id(data: &TypeData) -> Option<TypeId> {
        match data {
            TypeData::Error => Some(TypeId::ERROR),
            TypeData::Applied {
                ctor,
                args,
                nullable,
            } if args.is_empty() => match (*ctor, *nullable) {
                (ConstructorId::ANY, false) => Some(TypeId::ANY),
                (ConstructorId::ANY, true) => Some(TypeId::NULLABLE_ANY),
                (ConstructorId::NOTHING, false) => Some(TypeId::NOTHING),
                (ConstructorId::NOTHING, true) => Some(TypeId::NULLABLE_NOTHING),
                _ => None,
            },
            _ => None,
        }
    }

    fn compute_meta(&self, data: &TypeData) -> TypeMeta {
        match data {
            TypeData::Error => TypeMeta {
                flags: TypeFlags::HAS_ERROR,
                depth: 1,
            },
            TypeData::Applied {
                ctor,
                args,
                nullable,
            } => {
                let mut flags = TypeFlags::empty();
                let mut depth = 0;
                for arg in args.iter() {
                    match arg.ty() {
                        Some(ty) => {
                            let child = self.meta(ty);
                            flags |= TypeFlags::propagate_from(child.flags);
                            depth = depth.max(child.depth);
                        }
                        None => flags |= TypeFlags::HAS_STAR,
                    }
                }
                if ctor.is_type_param() {
                    flags |= TypeFlags::HAS_TYPE_PARAM;
                }
                flags.set(TypeFlags::IS_NULLABLE, *nullable);
                TypeMeta {
                    flags,
                    depth: depth + 1,
                }
            }
            TypeData::Intersection { members, nullable } => {
                let metas: Vec<TypeMeta> = members.iter().map(|&m| self.meta(m)).collect();
                let mut flags = TypeFlags::propagate_all(metas.iter().map(|m| m.flags))
                    | TypeFlags::HAS_INTERSECTION;
                flags.set(TypeFlags::IS_NULLABLE, *nullable);
                TypeMeta {
                    flags,
                    depth: metas.iter().map(|m| m.depth).max().unwrap_or(0) + 1,
                }
            }
        }
    }

    /// Try to intern a type, returning its `TypeId` or an error on overflow.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "shard_idx is bounded by NUM_SHARDS (16)"
    )]
    pub fn try_intern(&self, data: TypeData) -> Result<TypeId, TypeInternError> {
        if let Some(id) = Self::canonical_id(&data) {
            return Ok(id);
        }

        let shard_idx = Self::shard_for(&data);
        let shard = &self.shards[shard_idx];

        {
            let guard = shard.read();
            if let Some(&local) = guard.map.get(&data) {
                return Ok(TypeId::from_shard_local(shard_idx as u32, local));
            }
        }

        // Children may live in this same shard, so read their metadata before
        // taking the write lock.
        let meta = self.compute_meta(&data);

        let mut guard = shard.write();

        if let Some(&local) = guard.map.get(&data) {
            return Ok(TypeId::from_shard_local(shard_idx as u32, local));
        }

        let local = u32::try_from(guard.types.len())
            .ok()
            .filter(|&local| local <= TypeId::MAX_LOCAL)
            .ok_or(TypeInternError::ShardOverflow { shard_idx })?;

        guard.types.push(data.clone());
        guard.meta.push(meta);
        guard.map.insert(data, local);

        Ok(TypeId::from_shard_local(shard_idx as u32, local))
    }

    /// Intern a type.
    ///
    /// # Panics
    /// Panics if a shard overflows. Use `try_intern` to handle it.
    #[inline]
    pub fn intern(&self, data: TypeData) -> TypeId {
        self.try_intern(data).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Look up the payload of a `TypeId`.
    ///
    /// # Panics
    /// Panics if the `TypeId` was not created by this interner.
    pub fn lookup(&self, id: TypeId) -> TypeData {
        let guard = self.shards[id.shard()].read();
        guard.types[id.local()].clone()
    }

    fn meta(&self, id: TypeId) -> TypeMeta {
        let guard = self.shards[id.shard()].read();
        guard.meta[id.local()]
    }

    #[inline]
    pub fn flags(&self, id: TypeId) -> TypeFlags {
        self.meta(id).flags
    }

    /// Nesting depth of a type. `Int` is 1, `List<Int>` is 2.
    #[inline]
    pub fn depth(&self, id: TypeId) -> u32 {
        self.meta(id).depth
    }

    /// Number of interned types.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.read().types.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ========================================================================
    // Construction helpers
    // ========================================================================

    /// Intern `ctor<args>` with the given nullability.
    pub fn applied(
        &self,
        ctor: ConstructorId,
        args: impl Into<Box<[TypeArg]>>,
        nullable: bool,
    ) -> TypeId {
        self.intern(TypeData::Applied {
            ctor,
            args: args.into(),
            nullable,
        })
    }

    /// Intern a constructor with no arguments, non-null.
    pub fn simple(&self, ctor: ConstructorId) -> TypeId {
        self.applied(ctor, Vec::new(), false)
    }

    /// Intern an intersection.
    ///
    /// Members are made non-null, flattened, sorted and deduplicated. A single
    /// remaining member is returned as is, with the requested nullability.
    pub fn intersection(
        &self,
        members: impl IntoIterator<Item = TypeId>,
        nullable: bool,
    ) -> TypeId {
        let mut flat = Vec::new();
        for member in members {
            match self.lookup(member) {
                TypeData::Intersection { members: inner, .. } => {
                    flat.extend(inner.iter().copied());
                }
                _ => flat.push(self.make_nullable_as(member, false)),
            }
        }
        flat.sort_unstable();
        flat.dedup();

        match flat.as_slice() {
            [] => self.make_nullable_as(TypeId::ANY, nullable),
            [single] => self.make_nullable_as(*single, nullable),
            _ => self.intern(TypeData::Intersection {
                members: flat.into_boxed_slice(),
                nullable,
            }),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[inline]
    pub fn is_nullable(&self, id: TypeId) -> bool {
        self.flags(id).is_nullable()
    }

    #[inline]
    pub fn is_error(&self, id: TypeId) -> bool {
        id.is_error()
    }

    /// The type is or contains an error type.
    #[inline]
    pub fn contains_error(&self, id: TypeId) -> bool {
        self.flags(id).has_errors()
    }

    #[inline]
    pub fn is_nothing(&self, id: TypeId) -> bool {
        id == TypeId::NOTHING
    }

    #[inline]
    pub fn is_nothing_or_nullable_nothing(&self, id: TypeId) -> bool {
        id == TypeId::NOTHING || id == TypeId::NULLABLE_NOTHING
    }

    /// Constructor of an applied type, `None` for error and intersection types.
    pub fn ctor_of(&self, id: TypeId) -> Option<ConstructorId> {
        let guard = self.shards[id.shard()].read();
        guard.types[id.local()].ctor()
    }

    /// Arguments of an applied type (empty otherwise).
    pub fn args_of(&self, id: TypeId) -> Box<[TypeArg]> {
        match self.lookup(id) {
            TypeData::Applied { args, .. } => args,
            TypeData::Error | TypeData::Intersection { .. } => Box::new([]),
        }
    }

    // ========================================================================
    // Nullability
    // ========================================================================

    /// Same type with the outermost nullability set to `nullable`.
    pub fn make_nullable_as(&self, id: TypeId, nullable: bool) -> TypeId {
        if id.is_error() || self.is_nullable(id) == nullable {
            return id;
        }
        match self.lookup(id) {
            TypeData::Error => id,
            TypeData::Applied { ctor, args, .. } => self.intern(TypeData::Applied {
                ctor,
                args,
                nullable,
            }),
            TypeData::Intersection { members, .. } => {
                self.intern(TypeData::Intersection { members, nullable })
            }
        }
    }

    #[inline]
    pub fn make_nullable(&self, id: TypeId) -> TypeId {
        self.make_nullable_as(id, true)
    }

    #[inline]
    pub fn make_not_nullable(&self, id: TypeId) -> TypeId {
        self.make_nullable_as(id, false)
    }

    /// Make nullable if `nullable` is set, otherwise leave unchanged.
    #[inline]
    pub fn make_nullable_if_needed(&self, id: TypeId, nullable: bool) -> TypeId {
        if nullable {
            self.make_nullable(id)
        } else {
            id
        }
    }
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to a [`TypeInterner`].
#[derive(Clone)]
pub struct SharedTypeInterner(Arc<TypeInterner>);

impl SharedTypeInterner {
    pub fn new() -> Self {
        SharedTypeInterner(Arc::new(TypeInterner::new()))
    }
}

impl Default for SharedTypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for SharedTypeInterner {
    type Target = TypeInterner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests;
