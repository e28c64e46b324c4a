//! Name resolution and registration of parsed declarations.

use kt_ir::{ConstructorId, Name, SharedInterner, Span, StringInterner, TypeId};
use kt_stack::ensure_sufficient_stack;

use super::lexer::lex;
use super::parser::{ArgExpr, CallableDecl, Item, ParamDecl, Parser, TypeExpr, WhereBound};
use super::NotationError;
use crate::data::TypeArg;
use crate::overload::{CallableSig, ValueParam};
use crate::registry::{BuiltIns, DeclError, Declarations, DeclarationsBuilder, ParamOwner};
use crate::type_interner::TypeInterner;

/// Type parameters visible by name.
type Scope = Vec<(Name, ConstructorId)>;

/// A loaded declaration script.
#[derive(Debug)]
pub struct LoadedScript {
    pub decls: Declarations,
    /// Callable signatures, in script order.
    pub callables: Vec<CallableSig>,
    free_vars: Scope,
}

impl LoadedScript {
    /// The free type variable declared with `typevar name`.
    pub fn free_var(&self, name: &str) -> Option<ConstructorId> {
        let name = self.decls.names().try_intern(name).ok()?;
        lookup_scope(&self.free_vars, name)
    }

    pub fn is_free_var(&self, ctor: ConstructorId) -> bool {
        self.free_vars.iter().any(|&(_, var)| var == ctor)
    }

    /// Parse and resolve one type reference against the loaded declarations.
    ///
    /// Free type variables are in scope; callable type parameters are not.
    pub fn parse_type(&self, interner: &TypeInterner, source: &str) -> Result<TypeId, NotationError> {
        let mut parser = Parser::new(source, lex(source)?);
        let expr = parser.parse_type()?;
        parser.expect_end()?;
        Resolver {
            lookup: &self.decls,
            interner,
            free_vars: &self.free_vars,
        }
        .resolve(&expr, &[])
    }
}

/// Lex, parse and resolve a declaration script.
#[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
pub fn load_script(
    source: &str,
    interner: &TypeInterner,
    names: SharedInterner,
) -> Result<LoadedScript, NotationError> {
    let items = Parser::new(source, lex(source)?).parse_script()?;
    let mut builder = DeclarationsBuilder::new(interner, names);
    let mut free_vars = Scope::new();

    // Pass 1: declare classes, their parameters and free variables.
    let mut class_scopes = Vec::new();
    for item in &items {
        match item {
            Item::Class(decl) => {
                let name = builder.names().intern(decl.name);
                let id = builder
                    .declare_class(name, decl.kind, decl.modality, decl.span)
                    .map_err(|err| match err {
                        DeclError::DuplicateClass { name, span } => {
                            NotationError::Duplicate { name, span }
                        }
                        other => other.into(),
                    })?;
                let scope = declare_params(&mut builder, ParamOwner::Class(id), &decl.params)?;
                class_scopes.push((id, scope));
            }
            Item::TypeVar(param) => {
                let name = builder.names().intern(param.name);
                if lookup_scope(&free_vars, name).is_some() {
                    return Err(duplicate(param.name, param.span));
                }
                let id = builder.add_type_param(ParamOwner::Free, name, param.variance, param.span);
                free_vars.push((name, id));
            }
            Item::Callable(_) => {}
        }
    }

    // Pass 2: supertypes and bounds.
    let mut class_scopes = class_scopes.into_iter();
    for item in &items {
        match item {
            Item::Class(decl) => {
                let Some((id, scope)) = class_scopes.next() else {
                    continue;
                };
                let supertypes = decl
                    .supertypes
                    .iter()
                    .map(|expr| resolver(&builder, interner, &free_vars).resolve(expr, &scope))
                    .collect::<Result<Vec<_>, _>>()?;
                builder.set_supertypes(id, supertypes);
                add_bounds(&mut builder, &free_vars, &decl.params, &decl.where_bounds, &scope)?;
            }
            Item::TypeVar(param) => {
                let name = builder.names().intern(param.name);
                let Some(id) = lookup_scope(&free_vars, name) else {
                    continue;
                };
                add_bounds(
                    &mut builder,
                    &free_vars,
                    std::slice::from_ref(param),
                    &[],
                    &[(name, id)],
                )?;
            }
            Item::Callable(_) => {}
        }
    }

    // Pass 3: callable signatures.
    let mut callables = Vec::new();
    for item in &items {
        if let Item::Callable(decl) = item {
            callables.push(load_callable(&mut builder, &free_vars, decl)?);
        }
    }

    let decls = builder.finish()?;
    tracing::debug!(
        classes = decls.classes().count(),
        callables = callables.len(),
        free_vars = free_vars.len(),
        "script loaded"
    );
    Ok(LoadedScript {
        decls,
        callables,
        free_vars,
    })
}

fn load_callable(
    builder: &mut DeclarationsBuilder<'_>,
    free_vars: &[(Name, ConstructorId)],
    decl: &CallableDecl<'_>,
) -> Result<CallableSig, NotationError> {
    let interner = builder.interner();
    let scope = declare_params(builder, ParamOwner::Callable, &decl.type_params)?;
    add_bounds(builder, free_vars, &decl.type_params, &decl.where_bounds, &scope)?;

    let resolver = resolver(&*builder, interner, free_vars);
    let receiver = decl
        .receiver
        .as_ref()
        .map(|expr| resolver.resolve(expr, &scope))
        .transpose()?;
    let value_params = decl
        .value_params
        .iter()
        .map(|(name, expr)| {
            Ok(ValueParam {
                name: resolver.lookup.names().intern(name),
                ty: resolver.resolve(expr, &scope)?,
            })
        })
        .collect::<Result<Vec<_>, NotationError>>()?;
    let return_type = match &decl.return_type {
        Some(expr) => resolver.resolve(expr, &scope)?,
        None => interner.simple(BuiltIns::STANDARD.unit),
    };

    Ok(CallableSig {
        name: resolver.lookup.names().intern(decl.name),
        kind: decl.kind,
        type_params: scope.iter().map(|&(_, id)| id).collect(),
        receiver,
        value_params,
        return_type,
        span: decl.span,
    })
}

/// Declare `params` for `owner`, rejecting repeated names.
fn declare_params(
    builder: &mut DeclarationsBuilder<'_>,
    owner: ParamOwner,
    params: &[ParamDecl<'_>],
) -> Result<Scope, NotationError> {
    let mut scope = Scope::with_capacity(params.len());
    for param in params {
        let name = builder.names().intern(param.name);
        if lookup_scope(&scope, name).is_some() {
            return Err(duplicate(param.name, param.span));
        }
        scope.push((name, builder.add_type_param(owner, name, param.variance, param.span)));
    }
    Ok(scope)
}

/// Register inline bounds (`T : B`) and `where` bounds of `params`.
fn add_bounds(
    builder: &mut DeclarationsBuilder<'_>,
    free_vars: &[(Name, ConstructorId)],
    params: &[ParamDecl<'_>],
    where_bounds: &[WhereBound<'_>],
    scope: &[(Name, ConstructorId)],
) -> Result<(), NotationError> {
    let interner = builder.interner();
    for (param, &(_, id)) in params.iter().zip(scope) {
        for expr in &param.bounds {
            let bound = resolver(&*builder, interner, free_vars).resolve(expr, scope)?;
            builder.add_upper_bound(id, bound);
        }
    }
    for clause in where_bounds {
        let name = builder.names().intern(clause.param);
        let Some(id) = lookup_scope(scope, name) else {
            return Err(NotationError::UnresolvedName {
                name: clause.param.to_owned(),
                span: clause.span,
            });
        };
        let bound = resolver(&*builder, interner, free_vars).resolve(&clause.bound, scope)?;
        builder.add_upper_bound(id, bound);
    }
    Ok(())
}

fn lookup_scope(scope: &[(Name, ConstructorId)], name: Name) -> Option<ConstructorId> {
    scope
        .iter()
        .rev()
        .find(|&&(n, _)| n == name)
        .map(|&(_, id)| id)
}

fn duplicate(name: &str, span: Span) -> NotationError {
    NotationError::Duplicate {
        name: name.to_owned(),
        span,
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Where class names and arities come from: the builder while loading, the
/// frozen declarations afterwards.
trait ClassLookup {
    fn names(&self) -> &StringInterner;
    fn class_named(&self, name: Name) -> Option<ConstructorId>;
    fn arity_of(&self, class: ConstructorId) -> usize;
}

impl ClassLookup for DeclarationsBuilder<'_> {
    fn names(&self) -> &StringInterner {
        DeclarationsBuilder::names(self)
    }

    fn class_named(&self, name: Name) -> Option<ConstructorId> {
        self.lookup_class(name)
    }

    fn arity_of(&self, class: ConstructorId) -> usize {
        self.params_of(class).len()
    }
}

impl ClassLookup for Declarations {
    fn names(&self) -> &StringInterner {
        Declarations::names(self)
    }

    fn class_named(&self, name: Name) -> Option<ConstructorId> {
        self.lookup_class_name(name)
    }

    fn arity_of(&self, class: ConstructorId) -> usize {
        self.arity(class)
    }
}

fn resolver<'r, L: ClassLookup>(
    lookup: &'r L,
    interner: &'r TypeInterner,
    free_vars: &'r [(Name, ConstructorId)],
) -> Resolver<'r, L> {
    Resolver {
        lookup,
        interner,
        free_vars,
    }
}

/// Turns syntax into interned types.
///
/// Names resolve innermost first: the given scope, then free variables,
/// then classes.
struct Resolver<'r, L> {
    lookup: &'r L,
    interner: &'r TypeInterner,
    free_vars: &'r [(Name, ConstructorId)],
}

impl<L: ClassLookup> Resolver<'_, L> {
    fn resolve(
        &self,
        expr: &TypeExpr<'_>,
        scope: &[(Name, ConstructorId)],
    ) -> Result<TypeId, NotationError> {
        match expr {
            TypeExpr::Named {
                name,
                args,
                nullable,
                span,
            } => {
                let ctor = self.constructor(name, *span, scope)?;
                let expected = if ctor.is_type_param() {
                    0
                } else {
                    self.lookup.arity_of(ctor)
                };
                if expected != args.len() {
                    return Err(DeclError::ArityMismatch {
                        name: (*name).to_owned(),
                        expected,
                        found: args.len(),
                        span: *span,
                    }
                    .into());
                }
                let args = args
                    .iter()
                    .map(|arg| match arg {
                        ArgExpr::Star => Ok(TypeArg::Star),
                        ArgExpr::Projected(kind, ty) => ensure_sufficient_stack(|| {
                            self.resolve(ty, scope).map(|ty| TypeArg::new(*kind, ty))
                        }),
                    })
                    .collect::<Result<Vec<_>, NotationError>>()?;
                Ok(self.interner.applied(ctor, args, *nullable))
            }
            TypeExpr::Intersection {
                members, nullable, ..
            } => {
                let members = members
                    .iter()
                    .map(|member| ensure_sufficient_stack(|| self.resolve(member, scope)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(self.interner.intersection(members, *nullable))
            }
        }
    }

    fn constructor(
        &self,
        name: &str,
        span: Span,
        scope: &[(Name, ConstructorId)],
    ) -> Result<ConstructorId, NotationError> {
        let interned = self.lookup.names().intern(name);
        lookup_scope(scope, interned)
            .or_else(|| lookup_scope(self.free_vars, interned))
            .or_else(|| self.lookup.class_named(interned))
            .ok_or_else(|| NotationError::UnresolvedName {
                name: name.to_owned(),
                span,
            })
    }
}
