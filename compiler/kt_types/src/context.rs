//! The engine entry point.
//!
//! A [`TypeContext`] bundles the interner, the frozen declarations and the
//! configuration. Each component (substitutor, subtype checker, common
//! supertypes, unifier, override checker) borrows a context; the methods here
//! are the short way to reach them.

use kt_ir::{ConstructorId, TypeId};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::common::CommonSupertypes;
use crate::config::EngineConfig;
use crate::data::Variance;
use crate::format::TypeFormatter;
use crate::overload::{
    CallableSig, OverloadChecker, OverloadCompatibilityInfo, OverrideCompatibilityInfo,
};
use crate::registry::{BuiltIns, Declarations};
use crate::subst::{Substitutor, TypeSubstitution};
use crate::subtype::SubtypeChecker;
use crate::type_interner::TypeInterner;
use crate::unify::{TypeUnifier, UnificationResult};

/// Shared state for every engine operation.
///
/// `Sync`: several threads may query one context at once.
pub struct TypeContext<'a> {
    interner: &'a TypeInterner,
    decls: &'a Declarations,
    config: EngineConfig,
    subtype_cache: Mutex<FxHashMap<(TypeId, TypeId), bool>>,
}

impl<'a> TypeContext<'a> {
    pub fn new(interner: &'a TypeInterner, decls: &'a Declarations) -> Self {
        Self::with_config(interner, decls, EngineConfig::default())
    }

    pub fn with_config(
        interner: &'a TypeInterner,
        decls: &'a Declarations,
        config: EngineConfig,
    ) -> Self {
        TypeContext {
            interner,
            decls,
            config,
            subtype_cache: Mutex::new(FxHashMap::default()),
        }
    }

    #[inline]
    pub fn interner(&self) -> &'a TypeInterner {
        self.interner
    }

    #[inline]
    pub fn decls(&self) -> &'a Declarations {
        self.decls
    }

    #[inline]
    pub fn builtins(&self) -> &'a BuiltIns {
        self.decls.builtins()
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ========================================================================
    // Subtype memo
    // ========================================================================

    pub(crate) fn cached_subtype(&self, sub: TypeId, sup: TypeId) -> Option<bool> {
        if !self.config.memoize_subtyping {
            return None;
        }
        self.subtype_cache.lock().get(&(sub, sup)).copied()
    }

    pub(crate) fn record_subtype(&self, sub: TypeId, sup: TypeId, answer: bool) {
        if self.config.memoize_subtyping {
            self.subtype_cache.lock().insert((sub, sup), answer);
        }
    }

    /// Number of memoized subtype answers.
    pub fn subtype_cache_len(&self) -> usize {
        self.subtype_cache.lock().len()
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// `sub <: sup`
    pub fn is_subtype_of(&self, sub: TypeId, sup: TypeId) -> bool {
        SubtypeChecker::new(self).is_subtype_of(sub, sup)
    }

    /// Mutual subtyping.
    pub fn equal_types(&self, a: TypeId, b: TypeId) -> bool {
        SubtypeChecker::new(self).equal_types(a, b)
    }

    /// Apply `subst` to `ty` used at a `context` position. `None` when the
    /// result cannot be represented.
    pub fn substitute(
        &self,
        ty: TypeId,
        subst: &TypeSubstitution,
        context: Variance,
    ) -> Option<TypeId> {
        Substitutor::new(self, subst).substitute(ty, context)
    }

    /// Least upper bound of `types`.
    pub fn common_supertype(&self, types: &[TypeId]) -> TypeId {
        CommonSupertypes::new(self).common_supertype(types)
    }

    /// Greatest lower bound of `types`. `None` for an empty intersection.
    pub fn intersect(&self, types: &[TypeId]) -> Option<TypeId> {
        CommonSupertypes::new(self).intersect(types)
    }

    /// Match `known` against `pattern`, binding constructors for which
    /// `is_variable` holds.
    pub fn unify(
        &self,
        known: TypeId,
        pattern: TypeId,
        is_variable: impl Fn(ConstructorId) -> bool,
    ) -> UnificationResult {
        TypeUnifier::new(self, is_variable).unify(known, pattern)
    }

    pub fn is_overloadable(&self, a: &CallableSig, b: &CallableSig) -> OverloadCompatibilityInfo {
        OverloadChecker::new(self).is_overloadable(a, b)
    }

    pub fn is_overridable_by(
        &self,
        super_sig: &CallableSig,
        sub_sig: &CallableSig,
    ) -> OverrideCompatibilityInfo {
        OverloadChecker::new(self).is_overridable_by(super_sig, sub_sig)
    }

    /// Render a type, e.g. `Base_T<out Int>?`.
    pub fn format_type(&self, ty: TypeId) -> String {
        TypeFormatter::new(self.interner, self.decls).format(ty)
    }
}
