use pretty_assertions::assert_eq;

use super::{parse_script, top_level_matches, Check, Fragment};
use crate::error::ScriptError;

fn texts<'a>(fragments: &[Fragment<'a>]) -> Vec<&'a str> {
    fragments.iter().map(|f| f.text).collect()
}

fn single_check(source: &str) -> Check<'_> {
    match parse_script(source) {
        Ok(mut script) if script.assertions.len() == 1 => script.assertions.remove(0).check,
        Ok(script) => panic!("expected one assertion, got {:?}", script.assertions),
        Err(err) => panic!("`{source}` failed: {err}"),
    }
}

fn malformed_line(source: &str) -> usize {
    match parse_script(source) {
        Err(ScriptError::Malformed { line, .. }) => line,
        other => panic!("expected a malformed assertion, got {other:?}"),
    }
}

#[test]
fn separators_inside_brackets_are_ignored() {
    assert_eq!(top_level_matches("Base_T<Int> <: Base_T<*>", "<:"), vec![12]);
    assert_eq!(top_level_matches("Two<A, B>, C", ","), vec![9]);
    assert_eq!(top_level_matches("(A & B), [X, Y]", ","), vec![7]);
    assert!(top_level_matches("Base_T<Int>", ",").is_empty());
}

#[test]
fn assertion_lines_are_blanked_in_place() {
    let source = "open class A\n  assert subtype A <: Any\nclass B : A\n";
    let script = parse_script(source).unwrap_or_else(|err| panic!("{err}"));

    assert_eq!(script.declarations.len(), source.len());
    let blank = " ".repeat("  assert subtype A <: Any".len());
    assert_eq!(script.declarations, format!("open class A\n{blank}\nclass B : A\n"));
    assert_eq!(script.assertions.len(), 1);
    let assertion = &script.assertions[0];
    assert_eq!(assertion.line, 2);
    assert_eq!(assertion.text, "subtype A <: Any");
    assert!(!assertion.negated);
}

#[test]
fn fragments_keep_their_offsets() {
    let source = "class A\nassert subtype A? <: Any?\n";
    let Check::Subtype { sub, sup } = single_check(source) else {
        panic!("expected a subtype check");
    };
    assert_eq!(&source[sub.start..sub.start + sub.text.len()], "A?");
    let span = sup.span();
    assert_eq!(&source[span.start as usize..span.end as usize], "Any?");
}

#[test]
fn every_check_kind_parses() {
    let Check::Equal { a, b } = single_check("assert equal Base_T<*> == Base_T<out Any?>") else {
        panic!("expected equal");
    };
    assert_eq!((a.text, b.text), ("Base_T<*>", "Base_T<out Any?>"));

    let Check::Lub { types, expected } =
        single_check("assert lub Two<A, B>, Two<B, A> == Two<out Any, out Any>")
    else {
        panic!("expected lub");
    };
    assert_eq!(texts(&types), vec!["Two<A, B>", "Two<B, A>"]);
    assert_eq!(expected.text, "Two<out Any, out Any>");

    assert!(matches!(
        single_check("assert glb Int, String == empty"),
        Check::Glb { expected: None, .. }
    ));

    let Check::Subst { ty, entries, expected } =
        single_check("assert subst Two<X, Y> [X := in Int, Y := *] == null")
    else {
        panic!("expected subst");
    };
    assert_eq!(ty.text, "Two<X, Y>");
    let entries: Vec<(&str, &str)> = entries.iter().map(|(v, a)| (v.text, a.text)).collect();
    assert_eq!(entries, vec![("X", "in Int"), ("Y", "*")]);
    assert_eq!(expected, None);

    let Check::Unify { known, pattern, success, bindings } =
        single_check("assert unify C<Int> ~ C<X> == ok [X := Int]")
    else {
        panic!("expected unify");
    };
    assert_eq!((known.text, pattern.text, success), ("C<Int>", "C<X>", true));
    assert_eq!(bindings.len(), 1);
    assert!(matches!(
        single_check("assert unify List<Any> ~ Set<X> == fail"),
        Check::Unify { success: false, ref bindings, .. } if bindings.is_empty()
    ));

    assert_eq!(
        single_check("assert overloadable @0 @12"),
        Check::Overloadable { a: 0, b: 12 }
    );
    assert_eq!(
        single_check("assert overridable @3 @1"),
        Check::Overridable { sup: 3, sub: 1 }
    );
}

#[test]
fn negation() {
    let script = parse_script("assert !subtype Int <: String").unwrap_or_else(|err| panic!("{err}"));
    assert!(script.assertions[0].negated);
    assert_eq!(script.assertions[0].text, "!subtype Int <: String");
}

#[test]
fn identifiers_starting_with_assert_are_declarations() {
    let source = "class A\nasserted";
    let script = parse_script(source).unwrap_or_else(|err| panic!("{err}"));
    assert!(script.assertions.is_empty());
    assert_eq!(script.declarations, source);
}

#[test]
fn malformed_assertions_report_their_line() {
    assert_eq!(malformed_line("class A\nassert subtype A"), 2);
    assert_eq!(malformed_line("assert frobnicate A"), 1);
    assert_eq!(malformed_line("\n\nassert lub A, , B == A"), 3);
    assert_eq!(malformed_line("assert subst C<X> [X := Int == C<Int>"), 1);
    assert_eq!(malformed_line("assert subst C<X> [X Int] == C<Int>"), 1);
    assert_eq!(malformed_line("assert unify A ~ B == maybe"), 1);
    assert_eq!(malformed_line("assert unify A ~ B == ok X := A"), 1);
    assert_eq!(malformed_line("assert overloadable @0"), 1);
    assert_eq!(malformed_line("assert overridable 0 1"), 1);
    assert_eq!(malformed_line("assert"), 1);
}
