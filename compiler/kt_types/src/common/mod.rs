//! Least upper bounds and greatest lower bounds.
//!
//! # Common supertype
//!
//! 1. `Nothing` inputs drop out and only contribute nullability.
//! 2. Each input's supertype constructors are sorted topologically; the
//!    constructors shared by every input are the candidates, and the most
//!    specific ones (those no other candidate inherits from) win.
//! 3. While more than one candidate wins, all their instances are merged and
//!    the search repeats one level up.
//! 4. The arguments of the winner's instances are joined per parameter, by
//!    the parameter's variance (see [`CommonSupertypes::supertype_projection`]).
//!
//! Recursive hierarchies (`class A : Rec<A>`) would unroll forever, so the
//! nesting of the result is capped at the deepest input plus
//! `EngineConfig::supertype_unroll_depth`; positions below the cap are `*`.

mod intersect;

use kt_ir::{ConstructorId, TypeId};
use kt_stack::ensure_sufficient_stack;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::context::TypeContext;
use crate::data::{TypeArg, TypeData, Variance};
use crate::subst::{Substitutor, TypeSubstitution};
use crate::subtype::SubtypeChecker;
use crate::variance::{effective_projection, is_redundant_projection};

/// Lub and glb over one [`TypeContext`].
pub struct CommonSupertypes<'a> {
    ctx: &'a TypeContext<'a>,
    checker: SubtypeChecker<'a>,
}

/// Instances of one supertype constructor reached from the inputs.
type RawSupertypes = Vec<(ConstructorId, Vec<TypeId>)>;

impl<'a> CommonSupertypes<'a> {
    pub fn new(ctx: &'a TypeContext<'a>) -> Self {
        CommonSupertypes {
            ctx,
            checker: SubtypeChecker::new(ctx),
        }
    }

    /// Least upper bound of `types`.
    ///
    /// The empty list gives `Nothing`; any error type gives the error type.
    #[tracing::instrument(level = "debug", skip_all, fields(count = types.len()))]
    pub fn common_supertype(&self, types: &[TypeId]) -> TypeId {
        let interner = self.ctx.interner();
        let max_depth = types
            .iter()
            .map(|&ty| interner.depth(ty))
            .max()
            .unwrap_or(0)
            + self.ctx.config().supertype_unroll_depth;
        let result = self.lub(types, 0, max_depth);
        tracing::debug!(?result, "common supertype");
        result
    }

    fn lub(&self, types: &[TypeId], depth: u32, max_depth: u32) -> TypeId {
        let interner = self.ctx.interner();

        let mut nullable = false;
        let mut set: Vec<TypeId> = Vec::with_capacity(types.len());
        for &ty in types {
            if ty.is_error() {
                return TypeId::ERROR;
            }
            nullable |= interner.is_nullable(ty);
            if interner.is_nothing_or_nullable_nothing(ty) {
                continue;
            }
            let stripped = interner.make_not_nullable(ty);
            if !set.contains(&stripped) {
                set.push(stripped);
            }
        }

        match set.as_slice() {
            [] => {
                return if nullable {
                    TypeId::NULLABLE_NOTHING
                } else {
                    TypeId::NOTHING
                }
            }
            [single] => return interner.make_nullable_if_needed(*single, nullable),
            _ => {}
        }

        // `T` with bound `Any?` may hold null even when not marked.
        nullable |= set
            .iter()
            .any(|&ty| self.checker.has_nullable_supertype(ty));

        let mut raw = self.common_raw_supertypes(&set);
        while raw.len() > 1 {
            let mut merged: Vec<TypeId> = Vec::new();
            for (_, instances) in &raw {
                for &instance in instances {
                    if !merged.contains(&instance) {
                        merged.push(instance);
                    }
                }
            }
            tracing::trace!(candidates = raw.len(), "merging tied supertypes");
            raw = self.common_raw_supertypes(&merged);
        }

        let result = match raw.pop() {
            Some((ctor, instances)) => {
                self.supertype_projections(ctor, &instances, depth, max_depth)
            }
            None => TypeId::ANY,
        };
        interner.make_nullable_if_needed(result, nullable)
    }

    /// Most specific constructors that are supertypes of every type, each
    /// with the instances it was reached through.
    fn common_raw_supertypes(&self, types: &[TypeId]) -> RawSupertypes {
        let mut instances: FxHashMap<ConstructorId, Vec<TypeId>> = FxHashMap::default();
        let mut common: Option<FxHashSet<ConstructorId>> = None;
        let mut order = Vec::new();

        for &ty in types {
            let mut visited = FxHashSet::default();
            order.clear();
            self.visit_supertypes(ty, &mut visited, &mut instances, &mut order);
            common = Some(match common.take() {
                None => visited,
                Some(mut shared) => {
                    shared.retain(|ctor| visited.contains(ctor));
                    shared
                }
            });
        }
        let common = common.unwrap_or_default();

        // Post-order reversed: every constructor before its supertypes.
        order.reverse();
        let mut inherited = FxHashSet::default();
        let mut result = Vec::new();
        for ctor in order {
            if !common.contains(&ctor) || inherited.contains(&ctor) {
                continue;
            }
            self.mark_with_supertypes(ctor, &mut inherited);
            result.push((ctor, instances.remove(&ctor).unwrap_or_default()));
        }
        result
    }

    fn visit_supertypes(
        &self,
        ty: TypeId,
        visited: &mut FxHashSet<ConstructorId>,
        instances: &mut FxHashMap<ConstructorId, Vec<TypeId>>,
        order: &mut Vec<ConstructorId>,
    ) {
        let interner = self.ctx.interner();
        let decls = self.ctx.decls();
        let ctor = match interner.lookup(ty) {
            TypeData::Error => return,
            TypeData::Intersection { members, .. } => {
                for &member in members.iter() {
                    self.visit_supertypes(member, visited, instances, order);
                }
                return;
            }
            TypeData::Applied { ctor, .. } => ctor,
        };
        if !visited.insert(ctor) {
            return;
        }
        let seen = instances.entry(ctor).or_default();
        if !seen.contains(&ty) {
            seen.push(ty);
        }

        let subst = TypeSubstitution::from_type(interner, decls, ty);
        let substitutor = Substitutor::new(self.ctx, &subst);
        for &supertype in decls.declared_supertypes(ctor) {
            if interner
                .ctor_of(supertype)
                .is_some_and(|super_ctor| visited.contains(&super_ctor))
            {
                continue;
            }
            let substituted = substitutor.safe_substitute(supertype, Variance::Invariant);
            ensure_sufficient_stack(|| {
                self.visit_supertypes(substituted, visited, instances, order);
            });
        }
        order.push(ctor);
    }

    fn mark_with_supertypes(&self, ctor: ConstructorId, marked: &mut FxHashSet<ConstructorId>) {
        if !marked.insert(ctor) {
            return;
        }
        let interner = self.ctx.interner();
        for &supertype in self.ctx.decls().declared_supertypes(ctor) {
            if let Some(super_ctor) = interner.ctor_of(supertype) {
                ensure_sufficient_stack(|| self.mark_with_supertypes(super_ctor, marked));
            }
        }
    }

    /// Join the arguments of several instances of `ctor`.
    fn supertype_projections(
        &self,
        ctor: ConstructorId,
        instances: &[TypeId],
        depth: u32,
        max_depth: u32,
    ) -> TypeId {
        let interner = self.ctx.interner();
        if let [single] = instances {
            return *single;
        }
        let args: Vec<TypeArg> = self
            .ctx
            .decls()
            .params_of(ctor)
            .iter()
            .enumerate()
            .map(|(index, &param)| {
                let mut projections: Vec<TypeArg> = Vec::with_capacity(instances.len());
                for &instance in instances {
                    let arg = interner
                        .args_of(instance)
                        .get(index)
                        .copied()
                        .unwrap_or(TypeArg::Star);
                    if !projections.contains(&arg) {
                        projections.push(arg);
                    }
                }
                self.supertype_projection(param, &projections, depth, max_depth)
            })
            .collect();
        interner.applied(ctor, args, false)
    }

    /// Join the projections supplied for one parameter.
    ///
    /// Projections that can be written to contribute "in" types, those that
    /// can be read contribute "out" types; a star reads as its bound. When
    /// the "in" types share a lower bound the result is `in` of it, otherwise
    /// `out` of the least upper bound of the "out" types.
    fn supertype_projection(
        &self,
        param: ConstructorId,
        projections: &[TypeArg],
        depth: u32,
        max_depth: u32,
    ) -> TypeArg {
        if let [single] = projections {
            return *single;
        }
        if depth >= max_depth {
            tracing::trace!(depth, "supertype unroll limit reached");
            return TypeArg::Star;
        }

        let decls = self.ctx.decls();
        let declared = decls.variance_of(param);
        let mut ins = (declared != Variance::Out).then(Vec::new);
        let mut outs = (declared != Variance::In).then(Vec::new);

        for &projection in projections {
            let (kind, ty) = match projection {
                TypeArg::Star => (Variance::Out, decls.upper_bound(param)),
                TypeArg::Invariant(ty) => (Variance::Invariant, ty),
                TypeArg::In(ty) => (Variance::In, ty),
                TypeArg::Out(ty) => (Variance::Out, ty),
            };
            if kind.allows_in_position() {
                if let Some(ins) = &mut ins {
                    ins.push(ty);
                }
            } else {
                ins = None;
            }
            if kind.allows_out_position() {
                if let Some(outs) = &mut outs {
                    outs.push(ty);
                }
            } else {
                outs = None;
            }
        }

        if let Some(glb) = ins.and_then(|ins| self.intersect(&ins)) {
            return self.normalize(param, TypeArg::In(glb));
        }
        match outs {
            Some(outs) => {
                let lub = ensure_sufficient_stack(|| self.lub(&outs, depth + 1, max_depth));
                self.normalize(param, TypeArg::Out(lub))
            }
            None => TypeArg::Star,
        }
    }

    /// Drop projections that repeat the declaration, and write `out Bound`
    /// as `*`.
    fn normalize(&self, param: ConstructorId, arg: TypeArg) -> TypeArg {
        let decls = self.ctx.decls();
        let effective = effective_projection(decls, param, arg);
        if effective.kind == Variance::Out && effective.ty == decls.upper_bound(param) {
            return TypeArg::Star;
        }
        match arg.kind() {
            Some(kind) if is_redundant_projection(decls, param, kind) => {
                TypeArg::Invariant(effective.ty)
            }
            _ => arg,
        }
    }
}

#[cfg(test)]
mod tests;
