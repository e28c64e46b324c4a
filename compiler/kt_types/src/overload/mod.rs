//! Overload and override compatibility of callable signatures.
//!
//! Both checks compare the "compiled" value parameters of two signatures:
//! the extension receiver (if any) followed by the declared parameters.
//! Type parameters of the two signatures are aligned positionally by
//! substituting the first signature's parameters with the second's.

use kt_ir::{ConstructorId, Name, Span, TypeId};

use crate::context::TypeContext;
use crate::data::{TypeArg, Variance};
use crate::subst::{Substitutor, TypeSubstitution};
use crate::subtype::SubtypeChecker;

/// Function or property.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CallableKind {
    Function,
    Property { is_var: bool },
}

impl CallableKind {
    pub fn is_function(self) -> bool {
        matches!(self, CallableKind::Function)
    }
}

/// A value parameter of a callable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ValueParam {
    pub name: Name,
    pub ty: TypeId,
}

/// Signature of a function or property.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallableSig {
    pub name: Name,
    pub kind: CallableKind,
    /// Type-parameter constructors owned by this signature.
    pub type_params: Vec<ConstructorId>,
    /// Extension receiver type.
    pub receiver: Option<TypeId>,
    /// Always empty for properties.
    pub value_params: Vec<ValueParam>,
    /// Return type of a function, or the type of a property.
    pub return_type: TypeId,
    pub span: Span,
}

impl CallableSig {
    /// Receiver (if any) followed by the value parameter types.
    pub fn compiled_value_params(&self) -> Vec<TypeId> {
        self.receiver
            .into_iter()
            .chain(self.value_params.iter().map(|p| p.ty))
            .collect()
    }
}

/// Outcome category of an override check.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OverrideResult {
    Overridable,
    /// The two signatures are unrelated.
    Incompatible,
    /// The signatures clash but one cannot override the other.
    Conflict,
}

/// Result of [`OverloadChecker::is_overridable_by`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct OverrideCompatibilityInfo {
    pub result: OverrideResult,
    pub message: &'static str,
}

impl OverrideCompatibilityInfo {
    pub const fn success() -> Self {
        OverrideCompatibilityInfo {
            result: OverrideResult::Overridable,
            message: "SUCCESS",
        }
    }

    pub const fn incompatible(message: &'static str) -> Self {
        OverrideCompatibilityInfo {
            result: OverrideResult::Incompatible,
            message,
        }
    }

    pub const fn conflict(message: &'static str) -> Self {
        OverrideCompatibilityInfo {
            result: OverrideResult::Conflict,
            message,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result == OverrideResult::Overridable
    }
}

/// Result of [`OverloadChecker::is_overloadable`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct OverloadCompatibilityInfo {
    pub is_success: bool,
    pub message: &'static str,
}

impl OverloadCompatibilityInfo {
    pub const SUCCESS: Self = OverloadCompatibilityInfo {
        is_success: true,
        message: "SUCCESS",
    };

    pub const SAME_ERASURE: Self = OverloadCompatibilityInfo {
        is_success: false,
        message: "same erasure",
    };
}

/// Overload and override checks over one [`TypeContext`].
pub struct OverloadChecker<'a> {
    ctx: &'a TypeContext<'a>,
    checker: SubtypeChecker<'a>,
}

impl<'a> OverloadChecker<'a> {
    pub fn new(ctx: &'a TypeContext<'a>) -> Self {
        OverloadChecker {
            ctx,
            checker: SubtypeChecker::new(ctx),
        }
    }

    /// Whether `a` and `b` may be declared side by side.
    ///
    /// They clash when their value parameters are pairwise equal; return
    /// types do not matter.
    #[tracing::instrument(level = "debug", skip_all, fields(
        a = self.ctx.decls().names().lookup(a.name),
        b = self.ctx.decls().names().lookup(b.name),
    ))]
    pub fn is_overloadable(&self, a: &CallableSig, b: &CallableSig) -> OverloadCompatibilityInfo {
        if a.kind.is_function() != b.kind.is_function() {
            return OverloadCompatibilityInfo::SUCCESS;
        }
        match self.overloadable_by(a, b).result {
            OverrideResult::Incompatible => OverloadCompatibilityInfo::SUCCESS,
            OverrideResult::Overridable | OverrideResult::Conflict => {
                OverloadCompatibilityInfo::SAME_ERASURE
            }
        }
    }

    fn overloadable_by(&self, a: &CallableSig, b: &CallableSig) -> OverrideCompatibilityInfo {
        if let Some(mismatch) = check_receiver_and_parameter_count(a, b) {
            return mismatch;
        }
        let alignment = self.alignment(a, b);
        let substitutor = alignment.as_ref().map(|subst| Substitutor::new(self.ctx, subst));
        let interner = self.ctx.interner();

        for (a_param, b_param) in a
            .compiled_value_params()
            .into_iter()
            .zip(b.compiled_value_params())
        {
            if interner.contains_error(a_param) || interner.contains_error(b_param) {
                return OverrideCompatibilityInfo::incompatible("value parameter type mismatch");
            }
            let a_param = match &substitutor {
                Some(substitutor) => substitutor.safe_substitute(a_param, Variance::Invariant),
                None => a_param,
            };
            if !self
                .checker
                .equal_types(self.upper_bound_of(a_param), self.upper_bound_of(b_param))
            {
                return OverrideCompatibilityInfo::incompatible("value parameter type mismatch");
            }
        }
        OverrideCompatibilityInfo::success()
    }

    /// Whether `sub` may override `sup`. Return types are not compared.
    #[tracing::instrument(level = "debug", skip_all, fields(
        name = self.ctx.decls().names().lookup(sup.name),
    ))]
    pub fn is_overridable_by(&self, sup: &CallableSig, sub: &CallableSig) -> OverrideCompatibilityInfo {
        let info = self.overridable_by(sup, sub);
        tracing::debug!(result = ?info.result, message = info.message);
        info
    }

    fn overridable_by(&self, sup: &CallableSig, sub: &CallableSig) -> OverrideCompatibilityInfo {
        if sup.kind.is_function() != sub.kind.is_function() {
            return OverrideCompatibilityInfo::incompatible("member kind mismatch");
        }
        if sup.name != sub.name {
            return OverrideCompatibilityInfo::incompatible("name mismatch");
        }
        if let Some(mismatch) = check_receiver_and_parameter_count(sup, sub) {
            return mismatch;
        }
        if matches!(sup.kind, CallableKind::Property { is_var: true })
            && matches!(sub.kind, CallableKind::Property { is_var: false })
        {
            return OverrideCompatibilityInfo::incompatible("var overridden by val");
        }

        let sup_params = sup.compiled_value_params();
        let sub_params = sub.compiled_value_params();

        let Some(alignment) = self.alignment(sup, sub) else {
            let all_equal = sup_params.iter().zip(&sub_params).all(|(&a, &b)| {
                self.checker
                    .equal_types(self.upper_bound_of(a), self.upper_bound_of(b))
            });
            return if all_equal {
                OverrideCompatibilityInfo::conflict("type parameter number mismatch")
            } else {
                OverrideCompatibilityInfo::incompatible("type parameter number mismatch")
            };
        };
        let substitutor = Substitutor::new(self.ctx, &alignment);
        let decls = self.ctx.decls();

        for (&sup_param, &sub_param) in sup.type_params.iter().zip(&sub.type_params) {
            let sup_bound = substitutor.safe_substitute(decls.upper_bound(sup_param), Variance::Invariant);
            if !self.checker.equal_types(sup_bound, decls.upper_bound(sub_param)) {
                return OverrideCompatibilityInfo::incompatible("type parameter bounds mismatch");
            }
        }

        for (&a, &b) in sup_params.iter().zip(&sub_params) {
            let both_errors = a.is_error() && b.is_error();
            let a = substitutor.safe_substitute(a, Variance::Invariant);
            if !both_errors && !self.checker.equal_types(a, b) {
                return OverrideCompatibilityInfo::incompatible("value parameter type mismatch");
            }
        }

        OverrideCompatibilityInfo::success()
    }

    /// The return type of `sub` is a subtype of the return type of `sup`,
    /// seen through the type-parameter alignment.
    pub fn is_return_type_ok_for_override(&self, sup: &CallableSig, sub: &CallableSig) -> bool {
        let Some(alignment) = self.alignment(sup, sub) else {
            return false;
        };
        match Substitutor::new(self.ctx, &alignment).substitute(sup.return_type, Variance::Out) {
            Some(sup_return) => self.checker.is_subtype_of(sub.return_type, sup_return),
            None => false,
        }
    }

    /// A `var` needs the same type as the property it overrides; a `val`
    /// may narrow it.
    pub fn is_property_type_ok_for_override(&self, sup: &CallableSig, sub: &CallableSig) -> bool {
        if !matches!(sup.kind, CallableKind::Property { is_var: true }) {
            return self.is_return_type_ok_for_override(sup, sub);
        }
        let Some(alignment) = self.alignment(sup, sub) else {
            return false;
        };
        let sup_type =
            Substitutor::new(self.ctx, &alignment).safe_substitute(sup.return_type, Variance::Invariant);
        self.checker.equal_types(sub.return_type, sup_type)
    }

    /// Map `from`'s type parameters to `to`'s, position by position. `None`
    /// when the counts differ.
    fn alignment(&self, from: &CallableSig, to: &CallableSig) -> Option<TypeSubstitution> {
        if from.type_params.len() != to.type_params.len() {
            return None;
        }
        let interner = self.ctx.interner();
        Some(
            from.type_params
                .iter()
                .zip(&to.type_params)
                .map(|(&a, &b)| (a, TypeArg::Invariant(interner.simple(b))))
                .collect(),
        )
    }

    /// A bare type-parameter type stands for its bound; anything else is
    /// compared as written.
    fn upper_bound_of(&self, ty: TypeId) -> TypeId {
        let interner = self.ctx.interner();
        match interner.ctor_of(ty) {
            Some(ctor) if ctor.is_type_param() => interner.make_nullable_if_needed(
                self.ctx.decls().upper_bound(ctor),
                interner.is_nullable(ty),
            ),
            _ => ty,
        }
    }
}

fn check_receiver_and_parameter_count(
    a: &CallableSig,
    b: &CallableSig,
) -> Option<OverrideCompatibilityInfo> {
    if a.receiver.is_some() != b.receiver.is_some() {
        return Some(OverrideCompatibilityInfo::incompatible(
            "receiver presence mismatch",
        ));
    }
    if a.value_params.len() != b.value_params.len() {
        return Some(OverrideCompatibilityInfo::incompatible(
            "value parameter number mismatch",
        ));
    }
    None
}
