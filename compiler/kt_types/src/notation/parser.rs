//! Recursive-descent parser from tokens to an unresolved syntax tree.
//!
//! ```text
//! script    := item*
//! item      := modifier? ("class" | "interface") IDENT params? (":" types)? where? body? ";"?
//!            | "typevar" param ("," type)*
//!            | "fun" params? (type ".")? IDENT "(" (IDENT ":" type),* ")" (":" type)? where?
//!            | ("val" | "var") params? (type ".")? IDENT ":" type where?
//! params    := "<" param ("," param)* ">"
//! param     := ("in" | "out")? IDENT (":" type)?
//! where     := "where" IDENT ":" type ("," IDENT ":" type)*
//! type      := IDENT ("<" arg ("," arg)* ">")? "?"?
//!            | "(" type ("&" type)+ ")" "?"?
//! arg       := "*" | ("in" | "out")? type
//! ```
//!
//! Class bodies (`{ ... }`) are accepted and ignored.

use kt_ir::Span;

use super::lexer::{RawToken, Token};
use super::NotationError;
use crate::data::Variance;
use crate::overload::CallableKind;
use crate::registry::{ClassKind, Modality};

/// A type reference before name resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum TypeExpr<'src> {
    Named {
        name: &'src str,
        args: Vec<ArgExpr<'src>>,
        nullable: bool,
        span: Span,
    },
    Intersection {
        members: Vec<TypeExpr<'src>>,
        nullable: bool,
        span: Span,
    },
}

impl TypeExpr<'_> {
    pub(crate) fn span(&self) -> Span {
        match self {
            TypeExpr::Named { span, .. } | TypeExpr::Intersection { span, .. } => *span,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ArgExpr<'src> {
    Star,
    Projected(Variance, TypeExpr<'src>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ParamDecl<'src> {
    pub name: &'src str,
    pub variance: Variance,
    pub bounds: Vec<TypeExpr<'src>>,
    pub span: Span,
}

/// `where T : Bound`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct WhereBound<'src> {
    pub param: &'src str,
    pub bound: TypeExpr<'src>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ClassDecl<'src> {
    pub name: &'src str,
    pub kind: ClassKind,
    pub modality: Modality,
    pub params: Vec<ParamDecl<'src>>,
    pub supertypes: Vec<TypeExpr<'src>>,
    pub where_bounds: Vec<WhereBound<'src>>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CallableDecl<'src> {
    pub name: &'src str,
    pub kind: CallableKind,
    pub type_params: Vec<ParamDecl<'src>>,
    pub receiver: Option<TypeExpr<'src>>,
    pub value_params: Vec<(&'src str, TypeExpr<'src>)>,
    /// `None` for a function without `: Ret`, which returns `Unit`.
    pub return_type: Option<TypeExpr<'src>>,
    pub where_bounds: Vec<WhereBound<'src>>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Item<'src> {
    Class(ClassDecl<'src>),
    TypeVar(ParamDecl<'src>),
    Callable(CallableDecl<'src>),
}

/// Token cursor plus the source the spans point into.
pub(crate) struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(source: &'src str, tokens: Vec<Token>) -> Self {
        Parser {
            source,
            tokens,
            pos: 0,
        }
    }

    // ─── Cursor ───────────────────────────────────────────────────────────

    #[inline]
    fn peek(&self) -> Option<RawToken> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    #[inline]
    fn check(&self, kind: RawToken) -> bool {
        self.peek() == Some(kind)
    }

    /// Span of the current token, or an empty span at the end of input.
    fn current_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some(token) => token.span,
            None => {
                let end = u32::try_from(self.source.len()).unwrap_or(u32::MAX);
                Span::new(end, end)
            }
        }
    }

    /// Span of the last consumed token.
    fn previous_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(Span::DUMMY, |t| t.span)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: RawToken) -> bool {
        if self.check(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: RawToken) -> Result<Span, NotationError> {
        if self.check(kind) {
            let span = self.current_span();
            self.pos += 1;
            Ok(span)
        } else {
            Err(self.unexpected(kind.describe()))
        }
    }

    fn expect_ident(&mut self) -> Result<(&'src str, Span), NotationError> {
        let span = self.expect(RawToken::Ident)?;
        Ok((self.text(span), span))
    }

    fn text(&self, span: Span) -> &'src str {
        self.source
            .get(span.start as usize..span.end as usize)
            .unwrap_or_default()
    }

    fn unexpected(&self, expected: &'static str) -> NotationError {
        let span = self.current_span();
        let found = match self.peek() {
            Some(_) => self.text(span).to_owned(),
            None => "end of input".to_owned(),
        };
        NotationError::UnexpectedToken {
            expected,
            found,
            span,
        }
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Fail unless every token was consumed.
    pub(crate) fn expect_end(&self) -> Result<(), NotationError> {
        if self.is_at_end() {
            Ok(())
        } else {
            Err(self.unexpected("end of input"))
        }
    }

    // ─── Items ────────────────────────────────────────────────────────────

    pub(crate) fn parse_script(&mut self) -> Result<Vec<Item<'src>>, NotationError> {
        let mut items = Vec::new();
        while !self.is_at_end() {
            if self.eat(RawToken::Semicolon) {
                continue;
            }
            items.push(self.parse_item()?);
        }
        Ok(items)
    }

    fn parse_item(&mut self) -> Result<Item<'src>, NotationError> {
        let start = self.current_span();
        match self.peek() {
            Some(RawToken::TypeVar) => {
                self.advance();
                let mut param = self.parse_param()?;
                while self.eat(RawToken::Comma) {
                    param.bounds.push(self.parse_type()?);
                }
                param.span = start.merge(self.previous_span());
                Ok(Item::TypeVar(param))
            }
            Some(RawToken::Fun) => {
                self.advance();
                self.parse_callable(CallableKind::Function, start)
                    .map(Item::Callable)
            }
            Some(RawToken::Val | RawToken::Var) => {
                let is_var = self.check(RawToken::Var);
                self.advance();
                self.parse_callable(CallableKind::Property { is_var }, start)
                    .map(Item::Callable)
            }
            _ => self.parse_class(start).map(Item::Class),
        }
    }

    fn parse_class(&mut self, start: Span) -> Result<ClassDecl<'src>, NotationError> {
        let modality = match self.peek() {
            Some(RawToken::Open) => Some(Modality::Open),
            Some(RawToken::Final) => Some(Modality::Final),
            Some(RawToken::Abstract) => Some(Modality::Abstract),
            _ => None,
        };
        if modality.is_some() {
            self.advance();
        }
        let kind = match self.peek() {
            Some(RawToken::Class) => ClassKind::Class,
            Some(RawToken::Interface) => ClassKind::Interface,
            _ => return Err(self.unexpected("a declaration")),
        };
        self.advance();
        let modality = modality.unwrap_or(match kind {
            ClassKind::Class => Modality::Final,
            ClassKind::Interface => Modality::Abstract,
        });

        let (name, _) = self.expect_ident()?;
        let params = self.parse_params()?;
        let mut supertypes = Vec::new();
        if self.eat(RawToken::Colon) {
            supertypes.push(self.parse_type()?);
            while self.eat(RawToken::Comma) {
                supertypes.push(self.parse_type()?);
            }
        }
        let where_bounds = self.parse_where()?;
        let span = start.merge(self.previous_span());
        self.skip_body()?;

        Ok(ClassDecl {
            name,
            kind,
            modality,
            params,
            supertypes,
            where_bounds,
            span,
        })
    }

    /// Skip a `{ ... }` block, nested braces included.
    fn skip_body(&mut self) -> Result<(), NotationError> {
        if !self.eat(RawToken::LBrace) {
            return Ok(());
        }
        let mut depth = 1usize;
        while depth > 0 {
            match self.advance().map(|t| t.kind) {
                Some(RawToken::LBrace) => depth += 1,
                Some(RawToken::RBrace) => depth -= 1,
                Some(_) => {}
                None => return Err(self.unexpected("`}`")),
            }
        }
        Ok(())
    }

    fn parse_callable(
        &mut self,
        kind: CallableKind,
        start: Span,
    ) -> Result<CallableDecl<'src>, NotationError> {
        let type_params = self.parse_params()?;

        // `R.name` or just `name`: parse a type and see whether a dot follows.
        let head = self.parse_type()?;
        let (receiver, name) = if self.eat(RawToken::Dot) {
            let (name, _) = self.expect_ident()?;
            (Some(head), name)
        } else {
            match head {
                TypeExpr::Named {
                    name,
                    ref args,
                    nullable: false,
                    ..
                } if args.is_empty() => (None, name),
                _ => return Err(self.unexpected("`.`")),
            }
        };

        let mut value_params = Vec::new();
        let return_type = if kind.is_function() {
            self.expect(RawToken::LParen)?;
            if !self.check(RawToken::RParen) {
                loop {
                    let (param_name, _) = self.expect_ident()?;
                    self.expect(RawToken::Colon)?;
                    value_params.push((param_name, self.parse_type()?));
                    if !self.eat(RawToken::Comma) {
                        break;
                    }
                }
            }
            self.expect(RawToken::RParen)?;
            if self.eat(RawToken::Colon) {
                Some(self.parse_type()?)
            } else {
                None
            }
        } else {
            self.expect(RawToken::Colon)?;
            Some(self.parse_type()?)
        };
        let where_bounds = self.parse_where()?;

        Ok(CallableDecl {
            name,
            kind,
            type_params,
            receiver,
            value_params,
            return_type,
            where_bounds,
            span: start.merge(self.previous_span()),
        })
    }

    fn parse_params(&mut self) -> Result<Vec<ParamDecl<'src>>, NotationError> {
        let mut params = Vec::new();
        if !self.eat(RawToken::Lt) {
            return Ok(params);
        }
        loop {
            params.push(self.parse_param()?);
            if !self.eat(RawToken::Comma) {
                break;
            }
        }
        self.expect(RawToken::Gt)?;
        Ok(params)
    }

    fn parse_param(&mut self) -> Result<ParamDecl<'src>, NotationError> {
        let start = self.current_span();
        let variance = self.parse_variance();
        let (name, _) = self.expect_ident()?;
        let mut bounds = Vec::new();
        if self.eat(RawToken::Colon) {
            bounds.push(self.parse_type()?);
        }
        Ok(ParamDecl {
            name,
            variance,
            bounds,
            span: start.merge(self.previous_span()),
        })
    }

    fn parse_where(&mut self) -> Result<Vec<WhereBound<'src>>, NotationError> {
        let mut bounds = Vec::new();
        if !self.eat(RawToken::Where) {
            return Ok(bounds);
        }
        loop {
            let (param, span) = self.expect_ident()?;
            self.expect(RawToken::Colon)?;
            let bound = self.parse_type()?;
            bounds.push(WhereBound {
                param,
                span: span.merge(bound.span()),
                bound,
            });
            if !self.eat(RawToken::Comma) {
                break;
            }
        }
        Ok(bounds)
    }

    fn parse_variance(&mut self) -> Variance {
        if self.eat(RawToken::In) {
            Variance::In
        } else if self.eat(RawToken::Out) {
            Variance::Out
        } else {
            Variance::Invariant
        }
    }

    // ─── Types ────────────────────────────────────────────────────────────

    pub(crate) fn parse_type(&mut self) -> Result<TypeExpr<'src>, NotationError> {
        let start = self.current_span();
        if self.eat(RawToken::LParen) {
            let mut members = vec![self.parse_type()?];
            while self.eat(RawToken::Amp) {
                members.push(self.parse_type()?);
            }
            self.expect(RawToken::RParen)?;
            let nullable = self.eat(RawToken::Question);
            // `(T)` is just `T`, made nullable if asked.
            if members.len() == 1 {
                let mut single = members.remove(0);
                let (TypeExpr::Named { nullable: n, .. }
                | TypeExpr::Intersection { nullable: n, .. }) = &mut single;
                *n |= nullable;
                return Ok(single);
            }
            return Ok(TypeExpr::Intersection {
                members,
                nullable,
                span: start.merge(self.previous_span()),
            });
        }

        let (name, _) = self.expect_ident()?;
        let mut args = Vec::new();
        if self.eat(RawToken::Lt) {
            loop {
                args.push(self.parse_arg()?);
                if !self.eat(RawToken::Comma) {
                    break;
                }
            }
            self.expect(RawToken::Gt)?;
        }
        let nullable = self.eat(RawToken::Question);
        Ok(TypeExpr::Named {
            name,
            args,
            nullable,
            span: start.merge(self.previous_span()),
        })
    }

    fn parse_arg(&mut self) -> Result<ArgExpr<'src>, NotationError> {
        if self.eat(RawToken::Star) {
            return Ok(ArgExpr::Star);
        }
        let variance = self.parse_variance();
        Ok(ArgExpr::Projected(variance, self.parse_type()?))
    }
}
