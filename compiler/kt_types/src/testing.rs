//! Test fixture: a loaded declaration script plus its interner.

use kt_ir::{ConstructorId, SharedInterner, TypeId};

use crate::config::EngineConfig;
use crate::context::TypeContext;
use crate::format::TypeFormatter;
use crate::notation::{load_script, LoadedScript};
use crate::overload::CallableSig;
use crate::registry::Declarations;
use crate::type_interner::TypeInterner;

/// The sample hierarchy most engine tests run against.
pub(crate) const KOTLIN_HIERARCHY: &str = "
    open class Base_T<T>
    open class Derived_T<T> : Base_T<T>
    open class DDerived_T<T> : Derived_T<T>
    open class DDerived1_T<T> : Derived_T<T>
    open class DDerived2_T<T> : Derived_T<T>

    interface Base_inT<in T>
    open class Derived_inT<in T> : Base_inT<T>
    open class Derived1_inT<T> : Derived_T<T>, Base_inT<T>

    interface Base_outT<out T>
    open class Derived_outT<out T> : Base_outT<T>
    open class MDerived_T<T> : Derived_T<T>, Base_outT<T>

    interface InvList<T>
    open class ArrayList<T> : InvList<T>
    interface List<out E>
    interface Set<out E>

    open class Star<T : Star<T>>
    open class SubStar<T : SubStar<T>> : Star<T>

    open class Rec<T>
    class ARec : Rec<ARec>
    class BRec : Rec<BRec>

    open class Parent
    class A : Parent
    class B : Parent

    class C<T>
    class In<in T>
    class Out<out T>

    typevar T
    typevar X
    typevar Y
";

pub(crate) struct Fixture {
    interner: TypeInterner,
    script: LoadedScript,
}

impl Fixture {
    pub(crate) fn load(source: &str) -> Self {
        let interner = TypeInterner::new();
        let script = match load_script(source, &interner, SharedInterner::new()) {
            Ok(script) => script,
            Err(err) => panic!("fixture script failed to load: {err} at {:?}", err.span()),
        };
        Fixture { interner, script }
    }

    pub(crate) fn kotlin() -> Self {
        Self::load(KOTLIN_HIERARCHY)
    }

    /// The sample hierarchy followed by `extra` declarations.
    pub(crate) fn kotlin_with(extra: &str) -> Self {
        Self::load(&format!("{KOTLIN_HIERARCHY}\n{extra}"))
    }

    pub(crate) fn ctx(&self) -> TypeContext<'_> {
        TypeContext::new(&self.interner, &self.script.decls)
    }

    pub(crate) fn ctx_with(&self, config: EngineConfig) -> TypeContext<'_> {
        TypeContext::with_config(&self.interner, &self.script.decls, config)
    }

    pub(crate) fn ty(&self, text: &str) -> TypeId {
        match self.script.parse_type(&self.interner, text) {
            Ok(ty) => ty,
            Err(err) => panic!("cannot parse `{text}`: {err}"),
        }
    }

    pub(crate) fn render(&self, ty: TypeId) -> String {
        TypeFormatter::new(&self.interner, &self.script.decls).format(ty)
    }

    /// A class or free type variable by name.
    pub(crate) fn ctor(&self, name: &str) -> ConstructorId {
        self.script
            .decls
            .lookup_class(name)
            .or_else(|| self.script.free_var(name))
            .unwrap_or_else(|| panic!("no constructor named `{name}`"))
    }

    /// The `index`th type parameter of `class`.
    pub(crate) fn param_of(&self, class: &str, index: usize) -> ConstructorId {
        match self.decls().params_of(self.ctor(class)).get(index) {
            Some(&param) => param,
            None => panic!("`{class}` has no type parameter #{index}"),
        }
    }

    pub(crate) fn callable(&self, index: usize) -> &CallableSig {
        match self.script.callables.get(index) {
            Some(sig) => sig,
            None => panic!("no callable #{index}"),
        }
    }

    pub(crate) fn script(&self) -> &LoadedScript {
        &self.script
    }

    pub(crate) fn decls(&self) -> &Declarations {
        &self.script.decls
    }

    pub(crate) fn interner(&self) -> &TypeInterner {
        &self.interner
    }
}
