//! Rendering types back to notation.
//!
//! The output parses back to the same type: `Base_T<out Int>?`,
//! `Comparable<*>`, `(A & B)?`. The error type renders as `[ERROR]`.

use std::fmt::Write;

use kt_ir::TypeId;
use kt_stack::ensure_sufficient_stack;

use crate::data::{TypeArg, TypeData};
use crate::registry::Declarations;
use crate::type_interner::TypeInterner;

pub struct TypeFormatter<'a> {
    interner: &'a TypeInterner,
    decls: &'a Declarations,
}

impl<'a> TypeFormatter<'a> {
    pub fn new(interner: &'a TypeInterner, decls: &'a Declarations) -> Self {
        TypeFormatter { interner, decls }
    }

    pub fn format(&self, ty: TypeId) -> String {
        let mut out = String::new();
        self.write_type(ty, &mut out);
        out
    }

    /// `*`, `in T`, `out T` or plain `T`.
    pub fn format_arg(&self, arg: TypeArg) -> String {
        let mut out = String::new();
        self.write_arg(arg, &mut out);
        out
    }

    fn write_type(&self, ty: TypeId, out: &mut String) {
        match self.interner.lookup(ty) {
            TypeData::Error => out.push_str("[ERROR]"),
            TypeData::Applied {
                ctor,
                args,
                nullable,
            } => {
                out.push_str(self.decls.name_str(ctor));
                if !args.is_empty() {
                    out.push('<');
                    for (i, &arg) in args.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        ensure_sufficient_stack(|| self.write_arg(arg, out));
                    }
                    out.push('>');
                }
                if nullable {
                    out.push('?');
                }
            }
            TypeData::Intersection { members, nullable } => {
                out.push('(');
                for (i, &member) in members.iter().enumerate() {
                    if i > 0 {
                        out.push_str(" & ");
                    }
                    ensure_sufficient_stack(|| self.write_type(member, out));
                }
                out.push(')');
                if nullable {
                    out.push('?');
                }
            }
        }
    }

    fn write_arg(&self, arg: TypeArg, out: &mut String) {
        match arg {
            TypeArg::Star => out.push('*'),
            TypeArg::Invariant(ty) => self.write_type(ty, out),
            TypeArg::In(ty) | TypeArg::Out(ty) => {
                let _ = write!(out, "{} ", arg.kind().unwrap_or_default().keyword());
                self.write_type(ty, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::data::TypeArg;
    use crate::testing::Fixture;

    #[test]
    fn renders_projections_and_nullability() {
        let fx = Fixture::kotlin();
        for text in [
            "Int",
            "Int?",
            "Base_T<out Int>?",
            "Base_T<in Comparable<*>>",
            "Comparable<*>",
            "Array<Array<String?>>",
        ] {
            assert_eq!(fx.render(fx.ty(text)), text);
        }
    }

    #[test]
    fn renders_intersections_in_parentheses() {
        let fx = Fixture::load("interface A\ninterface B");
        let a = fx.ty("A");
        let b = fx.ty("B");
        let both = fx.interner().intersection([b, a], true);
        let rendered = fx.render(both);
        assert!(rendered == "(A & B)?" || rendered == "(B & A)?", "{rendered}");
        assert_eq!(fx.ty(&rendered), both);
    }

    #[test]
    fn renders_the_error_type_and_stars() {
        let fx = Fixture::kotlin();
        assert_eq!(fx.render(kt_ir::TypeId::ERROR), "[ERROR]");
        let formatter = super::TypeFormatter::new(fx.interner(), fx.decls());
        assert_eq!(formatter.format_arg(TypeArg::Star), "*");
        assert_eq!(formatter.format_arg(TypeArg::Out(fx.ty("Int"))), "out Int");
    }
}
