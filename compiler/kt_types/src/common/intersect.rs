//! Greatest lower bound.

use kt_ir::TypeId;

use super::CommonSupertypes;
use crate::unify::may_be_equal;

impl CommonSupertypes<'_> {
    /// Greatest lower bound of `types`, or `None` when no value can have all
    /// of them.
    ///
    /// Members with a strict subtype in the set are dropped. A member that
    /// cannot have subtypes (`Int`, `Array<String>`) must be related to every
    /// other member, and then is the answer. What remains of several
    /// unrelated open types is an intersection type.
    #[tracing::instrument(level = "debug", skip_all, fields(count = types.len()))]
    pub fn intersect(&self, types: &[TypeId]) -> Option<TypeId> {
        let interner = self.ctx.interner();

        let mut unique: Vec<TypeId> = Vec::with_capacity(types.len());
        for &ty in types {
            if ty.is_error() {
                return Some(TypeId::ERROR);
            }
            if !unique.contains(&ty) {
                unique.push(ty);
            }
        }
        match unique.as_slice() {
            [] => return Some(TypeId::NULLABLE_ANY),
            [single] => return Some(*single),
            _ => {}
        }

        let all_nullable = unique.iter().all(|&ty| interner.is_nullable(ty));
        if unique
            .iter()
            .any(|&ty| interner.is_nothing_or_nullable_nothing(ty))
        {
            return Some(if all_nullable {
                TypeId::NULLABLE_NOTHING
            } else {
                TypeId::NOTHING
            });
        }

        let stripped: Vec<TypeId> = unique
            .iter()
            .map(|&ty| interner.make_not_nullable(ty))
            .collect();
        let checker = &self.checker;

        let mut result: Vec<TypeId> = Vec::new();
        'outer: for &ty in &stripped {
            if !checker.can_have_subtypes(ty) {
                for &other in &stripped {
                    let related = may_be_equal(self.ctx, ty, other)
                        || checker.is_subtype_of(ty, other)
                        || checker.is_subtype_of(other, ty);
                    if !related {
                        tracing::debug!(?ty, ?other, "empty intersection");
                        return None;
                    }
                }
                return Some(interner.make_nullable_as(ty, all_nullable));
            }

            for &other in &stripped {
                if other != ty
                    && checker.is_subtype_of(other, ty)
                    && !checker.is_subtype_of(ty, other)
                {
                    continue 'outer;
                }
            }
            for &kept in &result {
                if checker.equal_types(kept, ty) {
                    continue 'outer;
                }
            }
            result.push(ty);
        }

        Some(interner.intersection(result, all_nullable))
    }
}
