//! Minimal core library
//!
//! The resolver needs the core library to declare `Object`, `num`, `int`,
//! `double`, `bool`, `String`, `Function`, `List`, `Map` and `Iterator`.
//! Embedders that ship their own core sources parse them like any other
//! library under [`CORE_LIBRARY`]; [`bootstrap_core_library`] builds a
//! small tree with just those declarations for tools and tests.

use sable_syntax::{AstBuilder, ClassDecl, LibraryUnit, MethodDecl, Modifiers, SourceId, TopLevelDecl};

/// Name under which the core library is imported
pub const CORE_LIBRARY: &str = "sable:core";

/// Source id of the bootstrap unit; user sources start at 1
pub const CORE_SOURCE: SourceId = SourceId(0);

/// Path of the bootstrap unit, matched by the default core suffix
pub const CORE_PATH: &str = "sable/core.sbl";

/// Build the bootstrap core library
pub fn bootstrap_core_library() -> LibraryUnit {
    let b = AstBuilder::new(CORE_SOURCE);
    let native = |method: MethodDecl| method.with_modifiers(Modifiers::NATIVE).with_native_body();

    let object = b
        .class("Object")
        .with_method(b.constructor("Object", Vec::new()).with_modifiers(Modifiers::CONST).without_body())
        .with_method(native(b.operator("==", vec![b.param("other")], Vec::new())).with_return_type(b.ty("bool")))
        .with_method(native(b.method("toString", Vec::new(), Vec::new())).with_return_type(b.ty("String")));

    let mut num = b.class("num");
    for op in ["+", "-", "*", "/", "%"] {
        num = num.with_method(native(b.operator(op, vec![b.typed_param("num", "other")], Vec::new())).with_return_type(b.ty("num")));
    }
    for op in ["<", ">", "<=", ">="] {
        num = num.with_method(native(b.operator(op, vec![b.typed_param("num", "other")], Vec::new())).with_return_type(b.ty("bool")));
    }
    let num = num
        .with_method(native(b.operator("-", Vec::new(), Vec::new())).with_return_type(b.ty("num")))
        .with_method(native(b.method("toInt", Vec::new(), Vec::new())).with_return_type(b.ty("int")));

    let int = b.class("int").with_superclass(b.ty("num"));
    let double = b.class("double").with_superclass(b.ty("num"));
    let boolean = b.class("bool");
    let string = b
        .class("String")
        .with_method(native(b.getter("length", Vec::new())).with_return_type(b.ty("int")))
        .with_method(native(b.operator("+", vec![b.typed_param("String", "other")], Vec::new())).with_return_type(b.ty("String")));
    let function = b.class("Function");

    let list = b
        .class("List")
        .with_type_param(b.type_param("E", None))
        .with_method(b.constructor("List", Vec::new()))
        .with_method(native(b.getter("length", Vec::new())).with_return_type(b.ty("int")))
        .with_method(native(b.method("add", vec![b.typed_param("E", "value")], Vec::new())).with_return_type(b.ty("void")))
        .with_method(native(b.operator("[]", vec![b.typed_param("int", "index")], Vec::new())).with_return_type(b.ty("E")))
        .with_method(
            native(b.method("iterator", Vec::new(), Vec::new())).with_return_type(b.generic_ty("Iterator", vec![b.ty("E")])),
        );

    let map = b
        .class("Map")
        .with_type_param(b.type_param("K", None))
        .with_type_param(b.type_param("V", None))
        .with_method(b.constructor("Map", Vec::new()))
        .with_method(native(b.getter("length", Vec::new())).with_return_type(b.ty("int")))
        .with_method(native(b.operator("[]", vec![b.typed_param("K", "key")], Vec::new())).with_return_type(b.ty("V")));

    let iterator = iterator_interface(&b);

    let print = native(b.method("print", vec![b.param("value")], Vec::new())).with_return_type(b.ty("void"));

    let classes = [object, num, int, double, boolean, string, function, list, map, iterator];
    let mut declarations: Vec<TopLevelDecl> = classes.into_iter().map(TopLevelDecl::Class).collect();
    declarations.push(TopLevelDecl::Function(print));

    LibraryUnit::new(CORE_LIBRARY).with_unit(b.unit(CORE_PATH, declarations))
}

fn iterator_interface(b: &AstBuilder) -> ClassDecl {
    b.interface("Iterator")
        .with_type_param(b.type_param("E", None))
        .with_method(b.abstract_method("hasNext", Vec::new()).with_return_type(b.ty("bool")))
        .with_method(b.abstract_method("next", Vec::new()).with_return_type(b.ty("E")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_declares_core_types() {
        let core = bootstrap_core_library();
        assert_eq!(core.name, CORE_LIBRARY);
        assert_eq!(core.units.len(), 1);

        let names: Vec<String> = core.units[0]
            .declarations
            .iter()
            .filter_map(|decl| match decl {
                TopLevelDecl::Class(class) => Some(class.name.name.clone()),
                _ => None,
            })
            .collect();
        for expected in ["Object", "num", "int", "double", "bool", "String", "Function", "List", "Map", "Iterator"] {
            assert!(names.iter().any(|n| n == expected), "core library should declare {}", expected);
        }
    }

    #[test]
    fn test_bootstrap_unit_uses_core_source() {
        let core = bootstrap_core_library();
        assert_eq!(core.units[0].source, CORE_SOURCE);
        assert!(core.units[0].path.ends_with("core.sbl"));
    }
}
