//! Sharded string interner for declaration and parameter names.
//!
//! O(1) interning and lookup with per-shard locking, so parallel script
//! checks can share one interner.

// Arc is needed here for SharedInterner: one interner is shared by every
// worker thread of the driver.
#![expect(
    clippy::disallowed_types,
    reason = "Arc required for SharedInterner thread-safety"
)]

use std::hash::BuildHasher;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use rustc_hash::{FxBuildHasher, FxHashMap};

use crate::Name;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InternError {
    #[error("name shard {shard} is full ({max} names)", max = Name::MAX_LOCAL)]
    ShardOverflow { shard: usize },
}

/// Names of one shard, indexed both ways.
#[derive(Default)]
struct Shard {
    locals: FxHashMap<&'static str, u32>,
    names: Vec<&'static str>,
}

/// Name interner with one `RwLock` per shard.
///
/// Interned strings are leaked: names live as long as the process, which
/// lets [`StringInterner::lookup`] hand out `&'static str`.
pub struct StringInterner {
    shards: [RwLock<Shard>; Name::NUM_SHARDS],
}

impl StringInterner {
    pub fn new() -> Self {
        let interner = StringInterner {
            shards: std::array::from_fn(|_| RwLock::default()),
        };
        // Shard selection must put "" at `Name::EMPTY`.
        interner.shards[0].write().insert("");
        interner
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "reduced modulo NUM_SHARDS first"
    )]
    fn shard_of(s: &str) -> usize {
        if s.is_empty() {
            return 0;
        }
        (FxBuildHasher.hash_one(s) % Name::NUM_SHARDS as u64) as usize
    }

    /// Intern `s`, failing only when its shard is full.
    pub fn try_intern(&self, s: &str) -> Result<Name, InternError> {
        let shard = Self::shard_of(s);
        let handle = |local: u32| {
            #[expect(clippy::cast_possible_truncation, reason = "shard < NUM_SHARDS")]
            let shard = shard as u32;
            Name::from_shard_local(shard, local)
        };

        let guard = self.shards[shard].upgradable_read();
        if let Some(&local) = guard.locals.get(s) {
            return Ok(handle(local));
        }
        let mut guard = RwLockUpgradableReadGuard::upgrade(guard);
        if guard.names.len() > Name::MAX_LOCAL as usize {
            return Err(InternError::ShardOverflow { shard });
        }
        Ok(handle(guard.insert(s)))
    }

    /// Intern `s`.
    ///
    /// # Panics
    /// When a shard overflows its 2^28 names.
    #[inline]
    pub fn intern(&self, s: &str) -> Name {
        self.try_intern(s).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn lookup(&self, name: Name) -> &'static str {
        self.shards[name.shard()].read().names[name.local()]
    }

    /// Number of interned names, the empty one included.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().names.len()).sum()
    }

    /// `true` while only the empty name is interned.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Shard {
    /// Store a name not yet in the shard and return its local index.
    fn insert(&mut self, s: &str) -> u32 {
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        #[expect(
            clippy::cast_possible_truncation,
            reason = "callers check the shard against MAX_LOCAL"
        )]
        let local = self.names.len() as u32;
        self.names.push(leaked);
        self.locals.insert(leaked, local);
        local
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to a [`StringInterner`].
///
/// Declarations keep one of these so names can be rendered without threading
/// a separate interner reference through every formatting call.
#[derive(Clone)]
pub struct SharedInterner(Arc<StringInterner>);

impl SharedInterner {
    /// Create a new shared interner.
    pub fn new() -> Self {
        SharedInterner(Arc::new(StringInterner::new()))
    }
}

impl Default for SharedInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for SharedInterner {
    type Target = StringInterner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
