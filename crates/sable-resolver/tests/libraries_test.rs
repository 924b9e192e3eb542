//! Tests for library scopes: imports, prefixes, combinators and re-exports

mod common;

use common::{app, library, resolve, resolve_app, APP};
use sable_resolver::{ErrorCode, ResolverErrorCode, SymbolKind, TypeErrorCode};
use sable_syntax::{AstBuilder, LibraryUnit, Modifiers, SourceId, TopLevelDecl};

fn util_library() -> LibraryUnit {
    let b = AstBuilder::new(SourceId(2));
    library(
        &b,
        "util",
        vec![
            TopLevelDecl::Function(b.method("helper", Vec::new(), Vec::new())),
            TopLevelDecl::Function(b.method("other", Vec::new(), Vec::new())),
            TopLevelDecl::Function(b.method("_secret", Vec::new(), Vec::new())),
            TopLevelDecl::Class(b.class("Box")),
        ],
    )
}

fn main_calling(b: &AstBuilder, names: &[&str]) -> TopLevelDecl {
    let body = names.iter().map(|name| b.expr_stmt(b.call(name, Vec::new()))).collect();
    TopLevelDecl::Function(b.method("main", Vec::new(), body))
}

#[test]
fn test_core_library_is_imported_implicitly() {
    let b = app();
    let main = b.method("main", Vec::new(), vec![b.expr_stmt(b.call("print", vec![b.string("hi")]))]);
    let resolved = resolve_app(&b, vec![TopLevelDecl::Function(main)]);
    resolved.assert_clean();
    assert!(!resolved.program.has_errors(common::APP_SOURCE));
}

#[test]
fn test_plain_import_makes_public_names_visible() {
    let b = app();
    let app_lib = library(&b, APP, vec![main_calling(&b, &["helper", "other"])]).with_import(b.import("util"));
    let resolved = resolve(vec![util_library(), app_lib]);
    resolved.assert_clean();
}

#[test]
fn test_prefixed_import_resolves_through_prefix() {
    let b = app();
    let body = vec![
        b.expr_stmt(b.method_call(b.id("u"), "helper", Vec::new())),
        b.var("box", Some(b.new_expr(b.named_ctor(b.ctor("u"), "Box"), Vec::new()))),
        b.var_decl(Modifiers::empty(), Some(b.prefixed_ty("u", "Box")), "typed", None),
    ];
    let main = TopLevelDecl::Function(b.method("main", Vec::new(), body));
    let app_lib = library(&b, APP, vec![main]).with_import(b.import_as("util", "u"));
    let resolved = resolve(vec![util_library(), app_lib]);
    resolved.assert_clean();
}

#[test]
fn test_prefixed_names_are_not_visible_unqualified() {
    let b = app();
    let app_lib = library(&b, APP, vec![main_calling(&b, &["helper"])]).with_import(b.import_as("util", "u"));
    let resolved = resolve(vec![util_library(), app_lib]);
    resolved.assert_only(ResolverErrorCode::CannotResolveMethod);
}

#[test]
fn test_missing_name_through_prefix() {
    let b = app();
    let body = vec![b.expr_stmt(b.method_call(b.id("u"), "nothing", Vec::new()))];
    let main = TopLevelDecl::Function(b.method("main", Vec::new(), body));
    let app_lib = library(&b, APP, vec![main]).with_import(b.import_as("util", "u"));
    let resolved = resolve(vec![util_library(), app_lib]);
    resolved.assert_only(ResolverErrorCode::CannotResolveMethod);
}

#[test]
fn test_show_combinator_limits_imported_names() {
    let b = app();
    let app_lib =
        library(&b, APP, vec![main_calling(&b, &["helper", "other"])]).with_import(b.import_show("util", &["helper"]));
    let resolved = resolve(vec![util_library(), app_lib]);
    assert_eq!(resolved.count(ResolverErrorCode::CannotResolveMethod), 1, "only 'other' should be hidden");
}

#[test]
fn test_hide_combinator_removes_names() {
    let b = app();
    let app_lib =
        library(&b, APP, vec![main_calling(&b, &["helper", "other"])]).with_import(b.import_hide("util", &["other"]));
    let resolved = resolve(vec![util_library(), app_lib]);
    assert_eq!(resolved.count(ResolverErrorCode::CannotResolveMethod), 1, "only 'other' should be hidden");
}

#[test]
fn test_show_of_unknown_name_is_a_warning() {
    let b = app();
    let app_lib = library(&b, APP, vec![main_calling(&b, &["helper"])])
        .with_import(b.import_show("util", &["helper", "missing"]));
    let resolved = resolve(vec![util_library(), app_lib]);
    resolved.assert_only(ResolverErrorCode::ImportedNameNotFound);
    assert!(!resolved.listener.has_errors(), "an unknown shown name is only a warning");
}

#[test]
fn test_import_of_unknown_library() {
    let b = app();
    let app_lib = library(&b, APP, Vec::new()).with_import(b.import("nowhere"));
    let resolved = resolve(vec![app_lib]);
    resolved.assert_only(ResolverErrorCode::LibraryNotFound);
}

#[test]
fn test_name_from_two_libraries_is_ambiguous_when_used() {
    let a = AstBuilder::new(SourceId(2));
    let lib_a = library(
        &a,
        "a",
        vec![TopLevelDecl::Function(a.method("shared", Vec::new(), Vec::new())), TopLevelDecl::Class(a.class("Thing"))],
    );
    let c = AstBuilder::new(SourceId(3));
    let lib_c = library(
        &c,
        "c",
        vec![TopLevelDecl::Function(c.method("shared", Vec::new(), Vec::new())), TopLevelDecl::Class(c.class("Thing"))],
    );

    let b = app();
    let unused = library(&b, APP, Vec::new()).with_import(b.import("a")).with_import(b.import("c"));
    let resolved = resolve(vec![lib_a.clone(), lib_c.clone(), unused]);
    resolved.assert_clean();

    let b = app();
    let body = vec![
        b.expr_stmt(b.call("shared", Vec::new())),
        b.var_decl(Modifiers::empty(), Some(b.ty("Thing")), "thing", None),
    ];
    let main = TopLevelDecl::Function(b.method("main", Vec::new(), body));
    let used = library(&b, APP, vec![main]).with_import(b.import("a")).with_import(b.import("c"));
    let resolved = resolve(vec![lib_a, lib_c, used]);
    resolved.assert_reports(ResolverErrorCode::DuplicateImportedName);
    resolved.assert_reports(TypeErrorCode::AmbiguousType);
}

#[test]
fn test_reexported_names_are_visible_to_importers() {
    let base = AstBuilder::new(SourceId(2));
    let base_lib = library(
        &base,
        "base",
        vec![
            TopLevelDecl::Function(base.method("answer", Vec::new(), Vec::new())),
            TopLevelDecl::Function(base.method("hidden", Vec::new(), Vec::new())),
        ],
    );
    let facade = AstBuilder::new(SourceId(3));
    let facade_lib = library(&facade, "facade", Vec::new()).with_export(facade.export_show("base", &["answer"]));

    let b = app();
    let app_lib = library(&b, APP, vec![main_calling(&b, &["answer", "hidden"])]).with_import(b.import("facade"));
    let resolved = resolve(vec![base_lib, facade_lib, app_lib]);
    assert_eq!(
        resolved.count(ResolverErrorCode::CannotResolveMethod),
        1,
        "'hidden' is not re-exported, got: {:?}",
        resolved.codes()
    );
}

#[test]
fn test_export_of_unknown_library() {
    let b = app();
    let app_lib = library(&b, APP, Vec::new()).with_export(b.export("missing"));
    let resolved = resolve(vec![app_lib]);
    resolved.assert_only(ResolverErrorCode::LibraryNotFound);
}

#[test]
fn test_private_name_through_prefix_is_illegal() {
    let b = app();
    let body = vec![b.expr_stmt(b.method_call(b.id("u"), "_secret", Vec::new()))];
    let main = TopLevelDecl::Function(b.method("main", Vec::new(), body));
    let app_lib = library(&b, APP, vec![main]).with_import(b.import_as("util", "u"));
    let resolved = resolve(vec![util_library(), app_lib]);
    resolved.assert_only(ResolverErrorCode::IllegalAccessToPrivate);
}

#[test]
fn test_private_names_are_not_imported() {
    let b = app();
    let app_lib = library(&b, APP, vec![main_calling(&b, &["_secret"])]).with_import(b.import("util"));
    let resolved = resolve(vec![util_library(), app_lib]);
    resolved.assert_only(ResolverErrorCode::CannotResolveMethod);
}

#[test]
fn test_prefix_conflicting_with_declaration() {
    let b = app();
    let app_lib = library(&b, APP, vec![TopLevelDecl::Function(b.method("u", Vec::new(), Vec::new()))])
        .with_import(b.import_as("util", "u"));
    let resolved = resolve(vec![util_library(), app_lib]);
    resolved.assert_only(ResolverErrorCode::PrefixConflictsWithDeclaration);
}

#[test]
fn test_prefix_is_not_a_value() {
    let b = app();
    let body = vec![b.expr_stmt(b.call("print", vec![b.id("u")]))];
    let main = TopLevelDecl::Function(b.method("main", Vec::new(), body));
    let app_lib = library(&b, APP, vec![main]).with_import(b.import_as("util", "u"));
    let resolved = resolve(vec![util_library(), app_lib]);
    resolved.assert_only(ResolverErrorCode::PrefixIsNotAValue);
}

#[test]
fn test_duplicate_top_level_declarations_are_reported_at_both() {
    let b = app();
    let resolved = resolve_app(
        &b,
        vec![
            TopLevelDecl::Function(b.method("f", Vec::new(), Vec::new())),
            TopLevelDecl::Function(b.method("f", Vec::new(), Vec::new())),
        ],
    );
    assert_eq!(resolved.count(ResolverErrorCode::DuplicateTopLevelDeclaration), 2);
    for diagnostic in resolved.diagnostics() {
        assert_eq!(diagnostic.related.len(), 1, "each report points at the other declaration");
    }
}

#[test]
fn test_top_level_getter_and_setter_share_a_name() {
    let b = app();
    let body = vec![
        b.expr_stmt(b.assign(b.id("value"), b.int(1))),
        b.expr_stmt(b.call("print", vec![b.id("value")])),
    ];
    let resolved = resolve_app(
        &b,
        vec![
            TopLevelDecl::Function(b.getter("value", vec![b.ret(Some(b.int(0)))])),
            TopLevelDecl::Function(b.setter("value", "v")),
            TopLevelDecl::Function(b.method("main", Vec::new(), body)),
        ],
    );
    resolved.assert_clean();

    let field = resolved.top_level("value");
    assert_eq!(resolved.program.symbols.kind(field), SymbolKind::Field);
    let data = resolved.program.symbols.field(field).unwrap();
    assert!(data.getter.is_some() && data.setter.is_some());
}

#[test]
fn test_setter_only_accessor_cannot_be_read() {
    let b = app();
    let body = vec![b.expr_stmt(b.call("print", vec![b.id("value")]))];
    let resolved = resolve_app(
        &b,
        vec![
            TopLevelDecl::Function(b.setter("value", "v")),
            TopLevelDecl::Function(b.method("main", Vec::new(), body)),
        ],
    );
    resolved.assert_only(ResolverErrorCode::FieldDoesNotHaveAGetter);
}

#[test]
fn test_entry_point_is_recorded() {
    let b = app();
    let resolved = resolve_app(&b, vec![TopLevelDecl::Function(b.method("main", Vec::new(), Vec::new()))]);
    let lib = resolved.program.library(APP).unwrap();
    assert_eq!(
        resolved.program.symbols.library(lib).and_then(|l| l.entry_point),
        Some(resolved.top_level("main"))
    );
}

#[test]
fn test_duplicate_field_across_units_of_one_library() {
    let first = |b: &AstBuilder| {
        b.unit(
            "first.sbl",
            vec![
                TopLevelDecl::Fields(b.field_list(Modifiers::empty(), "x", Some(b.int(1)))),
                TopLevelDecl::Function(b.method("main", Vec::new(), vec![b.expr_stmt(b.call("print", vec![b.id("x")]))])),
            ],
        )
    };
    let second = |b: &AstBuilder| {
        b.unit("second.sbl", vec![TopLevelDecl::Fields(b.field_list(Modifiers::empty(), "x", Some(b.int(2))))])
    };

    let (a, b) = (app(), AstBuilder::new(SourceId(2)));
    let resolved = resolve(vec![LibraryUnit::new(APP).with_unit(first(&a)).with_unit(second(&b))]);
    let duplicates: Vec<_> = resolved
        .diagnostics()
        .iter()
        .filter(|d| d.code == ErrorCode::from(ResolverErrorCode::DuplicateTopLevelDeclaration))
        .collect();
    assert_eq!(duplicates.len(), 2, "got: {:?}", resolved.codes());
    assert_ne!(duplicates[0].span.source, duplicates[1].span.source, "each file reports its own declaration");
    for duplicate in &duplicates {
        assert_eq!(duplicate.related.len(), 1);
        assert_ne!(duplicate.related[0].source, duplicate.span.source, "related span points at the other file");
    }

    let a = app();
    let resolved = resolve(vec![LibraryUnit::new(APP).with_unit(first(&a))]);
    resolved.assert_clean();
}
