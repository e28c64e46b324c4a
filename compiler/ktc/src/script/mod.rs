//! `.ktt` type-assertion scripts.
//!
//! A script is a declaration script with `assert` lines mixed in:
//!
//! ```text
//! open class Base_T<T>
//! typevar X
//! fun a(): Int
//! fun a(x: Int): Int
//!
//! assert subtype Base_T<Int> <: Base_T<out Any>
//! assert !subtype Base_T<Int> <: Base_T<Any>
//! assert equal Base_T<*> == Base_T<out Any?>
//! assert lub Int, Nothing? == Int?
//! assert glb Int, String == empty
//! assert subst Base_T<X> [X := in Int] == Base_T<in Int>
//! assert unify Base_T<Int> ~ Base_T<X> == ok [X := Int]
//! assert overloadable @0 @1
//! assert !overridable @0 @1
//! ```
//!
//! `@i` names the `i`th callable declared in the script. Assertion lines are
//! blanked out of the declarations, so notation errors keep pointing into
//! the original file.

use std::ops::Range;

use kt_ir::Span;

use crate::error::ScriptError;

/// A slice of the script together with its byte offset.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Fragment<'src> {
    pub text: &'src str,
    pub start: usize,
}

impl<'src> Fragment<'src> {
    pub fn new(text: &'src str, start: usize) -> Self {
        Fragment { text, start }
    }

    pub fn span(self) -> Span {
        Span::from_range(self.start..self.start + self.text.len())
    }

    fn slice(self, range: Range<usize>) -> Self {
        Fragment {
            text: &self.text[range.clone()],
            start: self.start + range.start,
        }
    }

    fn trim(self) -> Self {
        let trimmed = self.text.trim_start();
        Fragment {
            text: trimmed.trim_end(),
            start: self.start + (self.text.len() - trimmed.len()),
        }
    }

    fn strip_prefix(self, prefix: &str) -> Option<Self> {
        self.text
            .starts_with(prefix)
            .then(|| self.slice(prefix.len()..self.text.len()))
    }

    fn strip_suffix(self, suffix: &str) -> Option<Self> {
        self.text
            .ends_with(suffix)
            .then(|| self.slice(0..self.text.len() - suffix.len()))
    }

    /// The first whitespace-separated word and the trimmed rest.
    fn split_word(self) -> (Self, Self) {
        let end = self
            .text
            .find(char::is_whitespace)
            .unwrap_or(self.text.len());
        (
            self.slice(0..end),
            self.slice(end..self.text.len()).trim(),
        )
    }

    /// Split at the first `sep` outside brackets.
    fn split_once_top(self, sep: &str) -> Option<(Self, Self)> {
        let at = *top_level_matches(self.text, sep).first()?;
        Some((
            self.slice(0..at).trim(),
            self.slice(at + sep.len()..self.text.len()).trim(),
        ))
    }

    /// Split at every `sep` outside brackets.
    fn split_top(self, sep: &str) -> Vec<Self> {
        let mut pieces = Vec::new();
        let mut from = 0;
        for at in top_level_matches(self.text, sep) {
            pieces.push(self.slice(from..at).trim());
            from = at + sep.len();
        }
        pieces.push(self.slice(from..self.text.len()).trim());
        pieces
    }
}

/// Byte offsets of `sep` in `text` that are not nested in `<>`, `()` or `[]`.
fn top_level_matches(text: &str, sep: &str) -> Vec<usize> {
    let mut depth = 0usize;
    let mut matches = Vec::new();
    let mut resume = 0;
    for (i, c) in text.char_indices() {
        if i < resume {
            continue;
        }
        if depth == 0 && text[i..].starts_with(sep) {
            matches.push(i);
            resume = i + sep.len();
            continue;
        }
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    matches
}

/// `var := arg` pairs inside `[...]`.
pub type Bindings<'src> = Vec<(Fragment<'src>, Fragment<'src>)>;

/// What an assertion claims.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Check<'src> {
    Subtype {
        sub: Fragment<'src>,
        sup: Fragment<'src>,
    },
    /// Mutual subtyping.
    Equal {
        a: Fragment<'src>,
        b: Fragment<'src>,
    },
    Lub {
        types: Vec<Fragment<'src>>,
        expected: Fragment<'src>,
    },
    /// `None` expects an empty intersection.
    Glb {
        types: Vec<Fragment<'src>>,
        expected: Option<Fragment<'src>>,
    },
    /// `None` expects the substitution to fail.
    Subst {
        ty: Fragment<'src>,
        entries: Bindings<'src>,
        expected: Option<Fragment<'src>>,
    },
    Unify {
        known: Fragment<'src>,
        pattern: Fragment<'src>,
        success: bool,
        bindings: Bindings<'src>,
    },
    Overloadable {
        a: usize,
        b: usize,
    },
    Overridable {
        sup: usize,
        sub: usize,
    },
}

/// One `assert` line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assertion<'src> {
    /// One-based line number.
    pub line: usize,
    /// The line as written, without the `assert` keyword.
    pub text: &'src str,
    pub negated: bool,
    pub check: Check<'src>,
}

/// A parsed script.
#[derive(Clone, Debug)]
pub struct Script<'src> {
    pub source: &'src str,
    /// The source with assertion lines replaced by spaces.
    pub declarations: String,
    pub assertions: Vec<Assertion<'src>>,
}

/// Separate the assertions of `source` from its declarations.
pub fn parse_script(source: &str) -> Result<Script<'_>, ScriptError> {
    let mut declarations = String::with_capacity(source.len());
    let mut assertions = Vec::new();
    let mut offset = 0;

    for (index, raw) in source.split_inclusive('\n').enumerate() {
        let content = raw.trim_end_matches(|c| c == '\n' || c == '\r');
        let fragment = Fragment::new(content, offset).trim();
        let body = fragment
            .strip_prefix("assert")
            .filter(|rest| rest.text.is_empty() || rest.text.starts_with(char::is_whitespace));

        match body {
            Some(body) => {
                assertions.push(parse_assertion(index + 1, body.trim())?);
                declarations.push_str(&" ".repeat(content.len()));
                declarations.push_str(&raw[content.len()..]);
            }
            None => declarations.push_str(raw),
        }
        offset += raw.len();
    }

    tracing::debug!(assertions = assertions.len(), "parsed script");
    Ok(Script {
        source,
        declarations,
        assertions,
    })
}

fn parse_assertion(line: usize, body: Fragment<'_>) -> Result<Assertion<'_>, ScriptError> {
    let text = body.text;
    let (negated, body) = match body.strip_prefix("!") {
        Some(rest) => (true, rest),
        None => (false, body),
    };
    let (keyword, rest) = body.split_word();
    let split = |sep: &str, shape: &str| {
        rest.split_once_top(sep)
            .filter(|(lhs, rhs)| !lhs.text.is_empty() && !rhs.text.is_empty())
            .ok_or_else(|| ScriptError::malformed(line, format!("expected `{shape}`")))
    };

    let check = match keyword.text {
        "subtype" => {
            let (sub, sup) = split("<:", "A <: B")?;
            Check::Subtype { sub, sup }
        }
        "equal" => {
            let (a, b) = split("==", "A == B")?;
            Check::Equal { a, b }
        }
        "lub" => {
            let (inputs, expected) = split("==", "A, B == R")?;
            Check::Lub {
                types: type_list(line, inputs)?,
                expected,
            }
        }
        "glb" => {
            let (inputs, expected) = split("==", "A, B == R")?;
            Check::Glb {
                types: type_list(line, inputs)?,
                expected: (expected.text != "empty").then_some(expected),
            }
        }
        "subst" => {
            let (lhs, expected) = split("==", "T [X := A] == R")?;
            let (ty, entries) = lhs
                .split_once_top("[")
                .ok_or_else(|| ScriptError::malformed(line, "expected `[X := A, ...]`"))?;
            Check::Subst {
                ty,
                entries: bindings(line, entries)?,
                expected: (expected.text != "null").then_some(expected),
            }
        }
        "unify" => {
            let (lhs, outcome) = split("==", "K ~ P == ok|fail")?;
            let (known, pattern) = lhs
                .split_once_top("~")
                .ok_or_else(|| ScriptError::malformed(line, "expected `K ~ P`"))?;
            let (word, rest) = outcome.split_word();
            let success = match word.text {
                "ok" => true,
                "fail" => false,
                other => {
                    return Err(ScriptError::malformed(
                        line,
                        format!("expected `ok` or `fail`, found `{other}`"),
                    ))
                }
            };
            let bindings = match rest.strip_prefix("[") {
                Some(inner) => bindings(line, inner)?,
                None if rest.text.is_empty() => Vec::new(),
                None => return Err(ScriptError::malformed(line, "expected `[X := A, ...]`")),
            };
            Check::Unify {
                known,
                pattern,
                success,
                bindings,
            }
        }
        "overloadable" => {
            let (a, b) = callable_pair(line, rest)?;
            Check::Overloadable { a, b }
        }
        "overridable" => {
            let (sup, sub) = callable_pair(line, rest)?;
            Check::Overridable { sup, sub }
        }
        other => {
            return Err(ScriptError::malformed(
                line,
                format!("unknown check `{other}`"),
            ))
        }
    };

    Ok(Assertion {
        line,
        text,
        negated,
        check,
    })
}

fn type_list(line: usize, inputs: Fragment<'_>) -> Result<Vec<Fragment<'_>>, ScriptError> {
    let types = inputs.split_top(",");
    if types.iter().any(|ty| ty.text.is_empty()) {
        return Err(ScriptError::malformed(line, "empty type in list"));
    }
    Ok(types)
}

/// Parse `X := A, Y := in B]`; the opening bracket is already consumed.
fn bindings(line: usize, entries: Fragment<'_>) -> Result<Bindings<'_>, ScriptError> {
    let inner = entries
        .strip_suffix("]")
        .ok_or_else(|| ScriptError::malformed(line, "unclosed `[`"))?
        .trim();
    if inner.text.is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split_top(",")
        .into_iter()
        .map(|entry| {
            entry
                .split_once_top(":=")
                .filter(|(var, arg)| !var.text.is_empty() && !arg.text.is_empty())
                .ok_or_else(|| {
                    ScriptError::malformed(line, format!("expected `X := A`, found `{}`", entry.text))
                })
        })
        .collect()
}

fn callable_pair(line: usize, rest: Fragment<'_>) -> Result<(usize, usize), ScriptError> {
    let index = |word: &str| {
        word.strip_prefix('@')
            .and_then(|digits| digits.parse::<usize>().ok())
    };
    let words: Vec<&str> = rest.text.split_whitespace().collect();
    match words.as_slice() {
        [a, b] => match (index(a), index(b)) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(ScriptError::malformed(line, "expected `@i @j`")),
        },
        _ => Err(ScriptError::malformed(line, "expected `@i @j`")),
    }
}

#[cfg(test)]
mod tests;
