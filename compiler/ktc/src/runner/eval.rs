//! Evaluation of assertions against a loaded script.

use kt_types::notation::LoadedScript;
use kt_types::{
    CallableSig, ConstructorId, EngineConfig, TypeArg, TypeContext, TypeFormatter, TypeId,
    TypeInterner, TypeSubstitution, Variance,
};

use super::result::Outcome;
use crate::error::ScriptError;
use crate::script::{Assertion, Bindings, Check, Fragment};

/// `Ok` when the claim holds, otherwise what was found instead.
type Verdict = Result<(), String>;

pub(crate) struct Evaluator<'a> {
    source: &'a str,
    script: &'a LoadedScript,
    ctx: TypeContext<'a>,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(
        source: &'a str,
        interner: &'a TypeInterner,
        script: &'a LoadedScript,
        config: EngineConfig,
    ) -> Self {
        Evaluator {
            source,
            script,
            ctx: TypeContext::with_config(interner, &script.decls, config),
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(line = assertion.line))]
    pub(crate) fn evaluate(&self, assertion: &Assertion<'_>) -> Result<Outcome, ScriptError> {
        let verdict = self.check(assertion.line, &assertion.check)?;
        Ok(match (verdict, assertion.negated) {
            (Ok(()), false) | (Err(_), true) => Outcome::Passed,
            (Err(found), false) => Outcome::Failed(found),
            (Ok(()), true) => Outcome::Failed("holds".to_owned()),
        })
    }

    fn check(&self, line: usize, check: &Check<'_>) -> Result<Verdict, ScriptError> {
        let ctx = &self.ctx;
        let verdict = match check {
            Check::Subtype { sub, sup } => {
                let holds = ctx.is_subtype_of(self.ty(*sub)?, self.ty(*sup)?);
                holds_or(holds, || {
                    format!("`{}` is not a subtype of `{}`", sub.text, sup.text)
                })
            }
            Check::Equal { a, b } => {
                let holds = ctx.equal_types(self.ty(*a)?, self.ty(*b)?);
                holds_or(holds, || format!("`{}` and `{}` differ", a.text, b.text))
            }
            Check::Lub { types, expected } => {
                let result = ctx.common_supertype(&self.types(types)?);
                self.same(Some(result), Some(self.ty(*expected)?))
            }
            Check::Glb { types, expected } => {
                let result = ctx.intersect(&self.types(types)?);
                self.same(result, expected.map(|ty| self.ty(ty)).transpose()?)
            }
            Check::Subst {
                ty,
                entries,
                expected,
            } => {
                let subst = self.substitution(line, entries)?;
                let result = ctx.substitute(self.ty(*ty)?, &subst, Variance::Invariant);
                self.same(result, expected.map(|ty| self.ty(ty)).transpose()?)
            }
            Check::Unify {
                known,
                pattern,
                success,
                bindings,
            } => {
                let script = self.script;
                let result = ctx.unify(self.ty(*known)?, self.ty(*pattern)?, |ctor| {
                    script.is_free_var(ctor)
                });
                if result.success == *success {
                    self.bindings_match(line, bindings, |var| result.binding(var))?
                } else if result.success {
                    Err("unification succeeded".to_owned())
                } else {
                    Err("unification failed".to_owned())
                }
            }
            Check::Overloadable { a, b } => {
                let info = ctx.is_overloadable(self.callable(line, *a)?, self.callable(line, *b)?);
                holds_or(info.is_success, || info.message.to_owned())
            }
            Check::Overridable { sup, sub } => {
                let info =
                    ctx.is_overridable_by(self.callable(line, *sup)?, self.callable(line, *sub)?);
                holds_or(info.is_success(), || info.message.to_owned())
            }
        };
        tracing::trace!(?verdict);
        Ok(verdict)
    }

    fn ty(&self, fragment: Fragment<'_>) -> Result<TypeId, ScriptError> {
        self.script
            .parse_type(self.ctx.interner(), fragment.text)
            .map_err(|err| ScriptError::notation(self.source, fragment.start, err))
    }

    fn types(&self, fragments: &[Fragment<'_>]) -> Result<Vec<TypeId>, ScriptError> {
        fragments.iter().map(|&fragment| self.ty(fragment)).collect()
    }

    /// `*`, `in T`, `out T` or `T`.
    fn arg(&self, fragment: Fragment<'_>) -> Result<TypeArg, ScriptError> {
        let text = fragment.text;
        if text == "*" {
            return Ok(TypeArg::Star);
        }
        let projected = [("in ", Variance::In), ("out ", Variance::Out)]
            .into_iter()
            .find_map(|(prefix, kind)| text.strip_prefix(prefix).map(|rest| (kind, rest)));
        Ok(match projected {
            Some((kind, rest)) => {
                let skipped = text.len() - rest.len();
                TypeArg::new(kind, self.ty(Fragment::new(rest, fragment.start + skipped))?)
            }
            None => TypeArg::Invariant(self.ty(fragment)?),
        })
    }

    fn var(&self, line: usize, fragment: Fragment<'_>) -> Result<ConstructorId, ScriptError> {
        self.script
            .free_var(fragment.text)
            .ok_or_else(|| ScriptError::UnknownVariable {
                line,
                name: fragment.text.to_owned(),
            })
    }

    fn substitution(
        &self,
        line: usize,
        entries: &Bindings<'_>,
    ) -> Result<TypeSubstitution, ScriptError> {
        entries
            .iter()
            .map(|&(var, arg)| Ok((self.var(line, var)?, self.arg(arg)?)))
            .collect()
    }

    fn bindings_match(
        &self,
        line: usize,
        expected: &Bindings<'_>,
        actual: impl Fn(ConstructorId) -> Option<TypeArg>,
    ) -> Result<Verdict, ScriptError> {
        for &(var, arg) in expected {
            let found = actual(self.var(line, var)?);
            if found != Some(self.arg(arg)?) {
                let found = found.map_or_else(|| "nothing".to_owned(), |arg| self.format_arg(arg));
                return Ok(Err(format!("`{}` bound to {found}", var.text)));
            }
        }
        Ok(Ok(()))
    }

    fn callable(&self, line: usize, index: usize) -> Result<&'a CallableSig, ScriptError> {
        self.script
            .callables
            .get(index)
            .ok_or(ScriptError::UnknownCallable { line, index })
    }

    fn same(&self, found: Option<TypeId>, expected: Option<TypeId>) -> Verdict {
        if found == expected {
            return Ok(());
        }
        Err(match found {
            Some(ty) => format!("got `{}`", self.ctx.format_type(ty)),
            None => "got no type".to_owned(),
        })
    }

    fn format_arg(&self, arg: TypeArg) -> String {
        TypeFormatter::new(self.ctx.interner(), self.ctx.decls()).format_arg(arg)
    }
}

fn holds_or(holds: bool, found: impl FnOnce() -> String) -> Verdict {
    if holds {
        Ok(())
    } else {
        Err(found())
    }
}
