//! Tokenizer for declaration scripts, built on `logos`.

use kt_ir::Span;
use logos::Logos;

use super::NotationError;

/// Raw token produced by the logos-generated lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
pub(crate) enum RawToken {
    #[regex(r"//[^\n]*")]
    LineComment,

    // Declaration keywords
    #[token("class")]
    Class,
    #[token("interface")]
    Interface,
    #[token("open")]
    Open,
    #[token("final")]
    Final,
    #[token("abstract")]
    Abstract,
    #[token("typevar")]
    TypeVar,
    #[token("fun")]
    Fun,
    #[token("val")]
    Val,
    #[token("var")]
    Var,
    #[token("where")]
    Where,

    // Projections
    #[token("in")]
    In,
    #[token("out")]
    Out,

    // Punctuation
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,
    #[token("?")]
    Question,
    #[token("*")]
    Star,
    #[token("&")]
    Amp,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

impl RawToken {
    /// How the token reads in an error message.
    pub(crate) fn describe(self) -> &'static str {
        match self {
            RawToken::LineComment => "comment",
            RawToken::Class => "`class`",
            RawToken::Interface => "`interface`",
            RawToken::Open => "`open`",
            RawToken::Final => "`final`",
            RawToken::Abstract => "`abstract`",
            RawToken::TypeVar => "`typevar`",
            RawToken::Fun => "`fun`",
            RawToken::Val => "`val`",
            RawToken::Var => "`var`",
            RawToken::Where => "`where`",
            RawToken::In => "`in`",
            RawToken::Out => "`out`",
            RawToken::Lt => "`<`",
            RawToken::Gt => "`>`",
            RawToken::LParen => "`(`",
            RawToken::RParen => "`)`",
            RawToken::LBrace => "`{`",
            RawToken::RBrace => "`}`",
            RawToken::Comma => "`,`",
            RawToken::Colon => "`:`",
            RawToken::Semicolon => "`;`",
            RawToken::Dot => "`.`",
            RawToken::Question => "`?`",
            RawToken::Star => "`*`",
            RawToken::Amp => "`&`",
            RawToken::Ident => "identifier",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: RawToken,
    pub span: Span,
}

/// Split `source` into tokens, dropping comments.
pub(crate) fn lex(source: &str) -> Result<Vec<Token>, NotationError> {
    let mut tokens = Vec::new();
    let mut logos = RawToken::lexer(source);

    while let Some(token_result) = logos.next() {
        let span = Span::from_range(logos.span());
        match token_result {
            Ok(RawToken::LineComment) => {}
            Ok(kind) => tokens.push(Token { kind, span }),
            Err(()) => {
                return Err(NotationError::Lex {
                    text: logos.slice().to_owned(),
                    span,
                })
            }
        }
    }
    Ok(tokens)
}
