//! Declaration registry: classes, type parameters, supertypes and bounds.
//!
//! The engine reads constructors from an immutable [`Declarations`]. It is
//! produced by [`DeclarationsBuilder::finish`], which fills in defaults and
//! validates the hierarchy so the engine never sees a half-built constructor.
//!
//! # Design
//!
//! - Classes and type parameters live in two vectors indexed by
//!   `ConstructorId::index()`; the id's tag bit says which one.
//! - Class names are indexed in an `FxHashMap`; iteration follows
//!   declaration order.
//! - Built-ins come from [`BuiltIns`], declared first by every builder.

mod builtins;

use kt_ir::{ConstructorId, Name, SharedInterner, Span, StringInterner, TypeId};
use kt_stack::ensure_sufficient_stack;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::data::{TypeData, Variance};
use crate::type_interner::TypeInterner;

pub use builtins::BuiltIns;

/// Class or interface.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
}

/// Whether a class may be subclassed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Modality {
    #[default]
    Final,
    Open,
    Abstract,
}

/// A declared class or interface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassDef {
    pub name: Name,
    pub kind: ClassKind,
    pub modality: Modality,
    /// Type-parameter constructors, in declaration order.
    pub params: Vec<ConstructorId>,
    /// Direct supertypes. May mention `params`.
    pub supertypes: Vec<TypeId>,
    pub span: Span,
}

impl ClassDef {
    /// Interfaces and open or abstract classes can be subclassed.
    pub fn is_final(&self) -> bool {
        self.kind == ClassKind::Class && self.modality == Modality::Final
    }
}

/// Who declared a type parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParamOwner {
    Class(ConstructorId),
    /// A function or property signature.
    Callable,
    /// A free variable declared for substitution or unification queries.
    Free,
}

/// A declared type parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeParamDef {
    pub name: Name,
    pub variance: Variance,
    pub owner: ParamOwner,
    /// Upper bounds as written; `Any?` when none were given.
    pub upper_bounds: Vec<TypeId>,
    /// The bounds as one type: the single bound, or their intersection.
    pub bound_type: TypeId,
    pub span: Span,
}

/// Errors found while freezing declarations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DeclError {
    #[error("class `{name}` is already declared")]
    DuplicateClass { name: String, span: Span },

    #[error("`{name}` expects {expected} type argument(s), found {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("class `{name}` inherits from itself")]
    CyclicHierarchy { name: String, span: Span },

    #[error("type parameter `{name}` is bounded by itself")]
    CyclicBound { name: String, span: Span },

    #[error("`{class}` lists supertype `{supertype}` more than once")]
    DuplicateSupertype {
        class: String,
        supertype: String,
        span: Span,
    },

    #[error("supertype `{supertype}` of `{class}` cannot be nullable")]
    NullableSupertype {
        class: String,
        supertype: String,
        span: Span,
    },

    #[error("`{class}` cannot inherit from type parameter `{supertype}`")]
    TypeParameterSupertype {
        class: String,
        supertype: String,
        span: Span,
    },

    #[error("`{class}` cannot inherit from final class `{supertype}`")]
    FinalSupertype {
        class: String,
        supertype: String,
        span: Span,
    },

    #[error("`{class}` cannot inherit from an error or intersection type")]
    MalformedSupertype { class: String, span: Span },
}

impl DeclError {
    /// Location of the offending declaration.
    pub fn span(&self) -> Span {
        match self {
            DeclError::DuplicateClass { span, .. }
            | DeclError::ArityMismatch { span, .. }
            | DeclError::CyclicHierarchy { span, .. }
            | DeclError::CyclicBound { span, .. }
            | DeclError::DuplicateSupertype { span, .. }
            | DeclError::NullableSupertype { span, .. }
            | DeclError::TypeParameterSupertype { span, .. }
            | DeclError::FinalSupertype { span, .. }
            | DeclError::MalformedSupertype { span, .. } => *span,
        }
    }
}

// ============================================================================
// Declarations
// ============================================================================

/// Immutable, validated set of constructors.
///
/// Every supertype list is non-empty (except for `Any` and `Nothing`), every
/// type parameter has at least one bound, and the class hierarchy is acyclic.
#[derive(Clone)]
pub struct Declarations {
    classes: Vec<ClassDef>,
    params: Vec<TypeParamDef>,
    classes_by_name: FxHashMap<Name, ConstructorId>,
    names: SharedInterner,
    builtins: BuiltIns,
}

impl Declarations {
    pub fn builtins(&self) -> &BuiltIns {
        &self.builtins
    }

    pub fn names(&self) -> &StringInterner {
        &self.names
    }

    pub fn class(&self, ctor: ConstructorId) -> Option<&ClassDef> {
        if ctor.is_type_param() {
            None
        } else {
            self.classes.get(ctor.index())
        }
    }

    pub fn type_param(&self, ctor: ConstructorId) -> Option<&TypeParamDef> {
        if ctor.is_type_param() {
            self.params.get(ctor.index())
        } else {
            None
        }
    }

    /// Look up a class by name.
    pub fn lookup_class(&self, name: &str) -> Option<ConstructorId> {
        let name = self.names.try_intern(name).ok()?;
        self.lookup_class_name(name)
    }

    pub fn lookup_class_name(&self, name: Name) -> Option<ConstructorId> {
        self.classes_by_name.get(&name).copied()
    }

    /// All classes in declaration order, built-ins first.
    pub fn classes(&self) -> impl Iterator<Item = (ConstructorId, &ClassDef)> + '_ {
        self.classes
            .iter()
            .enumerate()
            .map(|(index, def)| (ConstructorId::class(index_u32(index)), def))
    }

    pub fn name_of(&self, ctor: ConstructorId) -> Name {
        self.class(ctor)
            .map(|c| c.name)
            .or_else(|| self.type_param(ctor).map(|p| p.name))
            .unwrap_or(Name::EMPTY)
    }

    pub fn name_str(&self, ctor: ConstructorId) -> &'static str {
        self.names.lookup(self.name_of(ctor))
    }

    /// Type parameters of a class (empty for type parameters).
    pub fn params_of(&self, ctor: ConstructorId) -> &[ConstructorId] {
        self.class(ctor).map_or(&[], |c| c.params.as_slice())
    }

    pub fn arity(&self, ctor: ConstructorId) -> usize {
        self.params_of(ctor).len()
    }

    /// Declared variance of a type parameter.
    pub fn variance_of(&self, param: ConstructorId) -> Variance {
        self.type_param(param)
            .map_or(Variance::Invariant, |p| p.variance)
    }

    /// Upper bounds of a type parameter as one type. `Any?` if unknown.
    pub fn upper_bound(&self, param: ConstructorId) -> TypeId {
        self.type_param(param)
            .map_or(TypeId::NULLABLE_ANY, |p| p.bound_type)
    }

    /// Direct supertypes of a class, or the upper bounds of a type parameter.
    pub fn declared_supertypes(&self, ctor: ConstructorId) -> &[TypeId] {
        if let Some(class) = self.class(ctor) {
            &class.supertypes
        } else if let Some(param) = self.type_param(ctor) {
            &param.upper_bounds
        } else {
            &[]
        }
    }

    /// Final classes have no subclasses. Type parameters are never final.
    pub fn is_final(&self, ctor: ConstructorId) -> bool {
        self.class(ctor).is_some_and(ClassDef::is_final)
    }
}

impl std::fmt::Debug for Declarations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Declarations")
            .field("classes", &self.classes.len())
            .field("params", &self.params.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Mutable staging area for declarations.
///
/// Classes and type parameters are declared first so supertypes and bounds
/// can refer to anything, in any order. `finish` then validates everything.
pub struct DeclarationsBuilder<'i> {
    interner: &'i TypeInterner,
    names: SharedInterner,
    classes: Vec<ClassDef>,
    params: Vec<TypeParamDef>,
    classes_by_name: FxHashMap<Name, ConstructorId>,
}

impl<'i> DeclarationsBuilder<'i> {
    /// Create a builder with the built-in classes already declared.
    pub fn new(interner: &'i TypeInterner, names: SharedInterner) -> Self {
        let mut builder = DeclarationsBuilder {
            interner,
            names,
            classes: Vec::new(),
            params: Vec::new(),
            classes_by_name: FxHashMap::default(),
        };
        BuiltIns::declare(&mut builder);
        builder
    }

    pub fn interner(&self) -> &'i TypeInterner {
        self.interner
    }

    pub fn names(&self) -> &StringInterner {
        &self.names
    }

    fn push_class(
        &mut self,
        name: Name,
        kind: ClassKind,
        modality: Modality,
        span: Span,
    ) -> ConstructorId {
        let id = ConstructorId::class(index_u32(self.classes.len()));
        self.classes.push(ClassDef {
            name,
            kind,
            modality,
            params: Vec::new(),
            supertypes: Vec::new(),
            span,
        });
        self.classes_by_name.insert(name, id);
        id
    }

    /// Declare a class. Supertypes are set separately.
    pub fn declare_class(
        &mut self,
        name: Name,
        kind: ClassKind,
        modality: Modality,
        span: Span,
    ) -> Result<ConstructorId, DeclError> {
        if self.classes_by_name.contains_key(&name) {
            return Err(DeclError::DuplicateClass {
                name: self.names.lookup(name).to_owned(),
                span,
            });
        }
        Ok(self.push_class(name, kind, modality, span))
    }

    /// Declare a type parameter. Class parameters are appended to the class.
    pub fn add_type_param(
        &mut self,
        owner: ParamOwner,
        name: Name,
        variance: Variance,
        span: Span,
    ) -> ConstructorId {
        let id = ConstructorId::type_param(index_u32(self.params.len()));
        self.params.push(TypeParamDef {
            name,
            variance,
            owner,
            upper_bounds: Vec::new(),
            bound_type: TypeId::NULLABLE_ANY,
            span,
        });
        if let ParamOwner::Class(class) = owner {
            if let Some(def) = self.class_mut(class) {
                def.params.push(id);
            }
        }
        id
    }

    /// Add an upper bound to a type parameter.
    pub fn add_upper_bound(&mut self, param: ConstructorId, bound: TypeId) {
        if let Some(def) = self.param_mut(param) {
            def.upper_bounds.push(bound);
        }
    }

    /// Replace the direct supertypes of a class.
    pub fn set_supertypes(&mut self, class: ConstructorId, supertypes: Vec<TypeId>) {
        if let Some(def) = self.class_mut(class) {
            def.supertypes = supertypes;
        }
    }

    pub fn lookup_class(&self, name: Name) -> Option<ConstructorId> {
        self.classes_by_name.get(&name).copied()
    }

    /// Type parameters declared so far for a class.
    pub fn params_of(&self, class: ConstructorId) -> &[ConstructorId] {
        if class.is_type_param() {
            return &[];
        }
        self.classes
            .get(class.index())
            .map_or(&[], |c| c.params.as_slice())
    }

    fn class_mut(&mut self, ctor: ConstructorId) -> Option<&mut ClassDef> {
        if ctor.is_type_param() {
            None
        } else {
            self.classes.get_mut(ctor.index())
        }
    }

    fn param_mut(&mut self, ctor: ConstructorId) -> Option<&mut TypeParamDef> {
        if ctor.is_type_param() {
            self.params.get_mut(ctor.index())
        } else {
            None
        }
    }

    /// Fill in defaults, validate and freeze.
    #[tracing::instrument(level = "debug", skip_all, fields(
        classes = self.classes.len(),
        params = self.params.len(),
    ))]
    pub fn finish(mut self) -> Result<Declarations, DeclError> {
        let builtins = BuiltIns::STANDARD;

        for (index, class) in self.classes.iter_mut().enumerate() {
            let id = ConstructorId::class(index_u32(index));
            if class.supertypes.is_empty() && id != builtins.any && id != builtins.nothing {
                class.supertypes.push(TypeId::ANY);
            }
        }
        for param in &mut self.params {
            if param.upper_bounds.is_empty() {
                param.upper_bounds.push(TypeId::NULLABLE_ANY);
            }
        }

        let decls = Declarations {
            classes: self.classes,
            params: self.params,
            classes_by_name: self.classes_by_name,
            names: self.names,
            builtins,
        };

        let validator = Validator {
            decls: &decls,
            interner: self.interner,
        };
        validator.check_supertypes()?;
        validator.check_arities()?;
        validator.check_class_cycles()?;
        validator.check_bound_cycles()?;

        let mut decls = decls;
        for param in &mut decls.params {
            param.bound_type = match param.upper_bounds.as_slice() {
                [single] => *single,
                bounds => {
                    let nullable = bounds.iter().all(|&b| self.interner.is_nullable(b));
                    self.interner.intersection(bounds.iter().copied(), nullable)
                }
            };
        }

        tracing::debug!("declarations frozen");
        Ok(decls)
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "constructor indices are far below u32::MAX"
)]
fn index_u32(index: usize) -> u32 {
    index as u32
}

// ============================================================================
// Validation
// ============================================================================

struct Validator<'a> {
    decls: &'a Declarations,
    interner: &'a TypeInterner,
}

impl Validator<'_> {
    fn name(&self, ctor: ConstructorId) -> String {
        self.decls.name_str(ctor).to_owned()
    }

    fn check_supertypes(&self) -> Result<(), DeclError> {
        for (index, class) in self.decls.classes.iter().enumerate() {
            let id = ConstructorId::class(index_u32(index));
            let mut seen = FxHashSet::default();
            for &supertype in &class.supertypes {
                let TypeData::Applied { ctor, nullable, .. } = self.interner.lookup(supertype)
                else {
                    return Err(DeclError::MalformedSupertype {
                        class: self.name(id),
                        span: class.span,
                    });
                };
                if ctor.is_type_param() {
                    return Err(DeclError::TypeParameterSupertype {
                        class: self.name(id),
                        supertype: self.name(ctor),
                        span: class.span,
                    });
                }
                if nullable {
                    return Err(DeclError::NullableSupertype {
                        class: self.name(id),
                        supertype: self.name(ctor),
                        span: class.span,
                    });
                }
                if self.decls.is_final(ctor) {
                    return Err(DeclError::FinalSupertype {
                        class: self.name(id),
                        supertype: self.name(ctor),
                        span: class.span,
                    });
                }
                if !seen.insert(ctor) {
                    return Err(DeclError::DuplicateSupertype {
                        class: self.name(id),
                        supertype: self.name(ctor),
                        span: class.span,
                    });
                }
            }
        }
        Ok(())
    }

    fn check_arities(&self) -> Result<(), DeclError> {
        for class in &self.decls.classes {
            for &supertype in &class.supertypes {
                self.check_arity(supertype, class.span)?;
            }
        }
        for param in &self.decls.params {
            for &bound in &param.upper_bounds {
                self.check_arity(bound, param.span)?;
            }
        }
        Ok(())
    }

    fn check_arity(&self, ty: TypeId, span: Span) -> Result<(), DeclError> {
        ensure_sufficient_stack(|| match self.interner.lookup(ty) {
            TypeData::Error => Ok(()),
            TypeData::Applied { ctor, args, .. } => {
                let expected = self.decls.arity(ctor);
                if args.len() != expected {
                    return Err(DeclError::ArityMismatch {
                        name: self.name(ctor),
                        expected,
                        found: args.len(),
                        span,
                    });
                }
                args.iter()
                    .filter_map(|arg| arg.ty())
                    .try_for_each(|arg| self.check_arity(arg, span))
            }
            TypeData::Intersection { members, .. } => members
                .iter()
                .try_for_each(|&member| self.check_arity(member, span)),
        })
    }

    fn check_class_cycles(&self) -> Result<(), DeclError> {
        // 0 = unvisited, 1 = on stack, 2 = done
        let mut state = vec![0u8; self.decls.classes.len()];
        for index in 0..self.decls.classes.len() {
            self.visit_class(ConstructorId::class(index_u32(index)), &mut state)?;
        }
        Ok(())
    }

    fn visit_class(&self, id: ConstructorId, state: &mut [u8]) -> Result<(), DeclError> {
        match state[id.index()] {
            2 => return Ok(()),
            1 => {
                let span = self.decls.class(id).map_or(Span::DUMMY, |c| c.span);
                return Err(DeclError::CyclicHierarchy {
                    name: self.name(id),
                    span,
                });
            }
            _ => {}
        }
        state[id.index()] = 1;
        for &supertype in self.decls.declared_supertypes(id) {
            if let Some(ctor) = self.interner.ctor_of(supertype) {
                ensure_sufficient_stack(|| self.visit_class(ctor, state))?;
            }
        }
        state[id.index()] = 2;
        Ok(())
    }

    fn check_bound_cycles(&self) -> Result<(), DeclError> {
        let mut state = vec![0u8; self.decls.params.len()];
        for index in 0..self.decls.params.len() {
            self.visit_param(ConstructorId::type_param(index_u32(index)), &mut state)?;
        }
        Ok(())
    }

    /// Only bounds that are bare type parameters can form a cycle;
    /// `T : Comparable<T>` is fine.
    fn visit_param(&self, id: ConstructorId, state: &mut [u8]) -> Result<(), DeclError> {
        match state[id.index()] {
            2 => return Ok(()),
            1 => {
                let span = self.decls.type_param(id).map_or(Span::DUMMY, |p| p.span);
                return Err(DeclError::CyclicBound {
                    name: self.name(id),
                    span,
                });
            }
            _ => {}
        }
        state[id.index()] = 1;
        for &bound in self.decls.declared_supertypes(id) {
            match self.interner.ctor_of(bound) {
                Some(ctor) if ctor.is_type_param() => {
                    ensure_sufficient_stack(|| self.visit_param(ctor, state))?;
                }
                _ => {}
            }
        }
        state[id.index()] = 2;
        Ok(())
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
