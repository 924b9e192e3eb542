//! Tests for constructors: `new` targets, super calls, redirects and field initialization

mod common;

use common::{app, library, resolve, resolve_app, Resolved, APP};
use sable_resolver::{ResolverErrorCode, SymbolId, SymbolKind, TypeErrorCode};
use sable_syntax::{AstBuilder, Expression, LibraryUnit, Modifiers, NodeId, SourceId, TopLevelDecl};

/// Resolve `classes` plus a `main` creating `new_expr`; returns the new expression's id
fn resolve_new(b: &AstBuilder, mut decls: Vec<TopLevelDecl>, new_expr: Expression) -> (Resolved, NodeId) {
    let id = new_expr.id();
    decls.push(TopLevelDecl::Function(b.method("main", Vec::new(), vec![b.var("made", Some(new_expr))])));
    (resolve_app(b, decls), id)
}

fn constructor_named(resolved: &Resolved, class: &str, raw_name: &str) -> SymbolId {
    let class = resolved.top_level(class);
    resolved
        .program
        .symbols
        .find_constructor(class, raw_name, class)
        .unwrap_or_else(|| panic!("missing constructor '{}'", raw_name))
}

#[test]
fn test_new_binds_declared_constructor() {
    let b = app();
    let point = b
        .class("Point")
        .with_method(b.constructor("Point", Vec::new()))
        .with_method(b.named_constructor("Point", "origin", Vec::new()));
    let new_expr = b.new_expr(b.named_ctor(b.ctor("Point"), "origin"), Vec::new());
    let (resolved, id) = resolve_new(&b, vec![TopLevelDecl::Class(point)], new_expr);
    resolved.assert_clean();
    assert_eq!(resolved.program.bindings.symbol(id), Some(constructor_named(&resolved, "Point", "origin")));
}

#[test]
fn test_new_of_class_without_constructors_uses_synthetic_one() {
    let b = app();
    let new_expr = b.new_expr(b.ctor("Plain"), Vec::new());
    let (resolved, id) = resolve_new(&b, vec![TopLevelDecl::Class(b.class("Plain"))], new_expr);
    resolved.assert_clean();

    let plain = resolved.top_level("Plain");
    let synthetic = resolved.program.synthetic_constructors[&plain];
    assert_eq!(resolved.program.bindings.symbol(id), Some(synthetic));
    let symbols = &resolved.program.symbols;
    assert!(symbols.modifiers(synthetic).contains(Modifiers::SYNTHETIC));
    assert!(!symbols.class(plain).unwrap().constructors.contains(&synthetic));
}

#[test]
fn test_new_with_missing_constructor() {
    let b = app();
    let point = b.class("Point").with_method(b.constructor("Point", Vec::new()));
    let new_expr = b.new_expr(b.named_ctor(b.ctor("Point"), "polar"), Vec::new());
    let (resolved, _) = resolve_new(&b, vec![TopLevelDecl::Class(point)], new_expr);
    resolved.assert_only(ResolverErrorCode::CannotResolveConstructor);
}

#[test]
fn test_new_of_type_variable() {
    let b = app();
    let make = b.method("make", Vec::new(), vec![b.ret(Some(b.new_expr(b.ctor("T"), Vec::new())))]);
    let class = b.class("Maker").with_type_param(b.type_param("T", None)).with_method(make);
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    resolved.assert_only(ResolverErrorCode::NewExpressionCantUseTypeVariable);
}

#[test]
fn test_new_with_too_many_qualifiers() {
    let b = app();
    let target = b.named_ctor(b.named_ctor(b.ctor("Point"), "a"), "b");
    let (resolved, _) = resolve_new(&b, vec![TopLevelDecl::Class(b.class("Point"))], b.new_expr(target, Vec::new()));
    resolved.assert_only(ResolverErrorCode::TooManyQualifiers);
}

#[test]
fn test_type_arguments_on_constructor_name() {
    let b = app();
    let point = b.class("Point").with_method(b.named_constructor("Point", "origin", Vec::new()));
    let target = b.named_generic_ctor(b.ctor("Point"), "origin", vec![b.ty("int")]);
    let (resolved, _) = resolve_new(&b, vec![TopLevelDecl::Class(point)], b.new_expr(target, Vec::new()));
    resolved.assert_only(ResolverErrorCode::TypeArgumentsOnlyOnClass);
}

#[test]
fn test_new_of_non_class() {
    let b = app();
    let helper = TopLevelDecl::Function(b.method("helper", Vec::new(), Vec::new()));
    let (resolved, _) = resolve_new(&b, vec![helper], b.new_expr(b.ctor("helper"), Vec::new()));
    resolved.assert_only(TypeErrorCode::NotAType);

    let b = app();
    let (resolved, _) = resolve_new(&b, Vec::new(), b.new_expr(b.ctor("Dynamic"), Vec::new()));
    resolved.assert_only(ResolverErrorCode::NotAClass);

    let b = app();
    let (resolved, _) = resolve_new(&b, Vec::new(), b.new_expr(b.ctor("Missing"), Vec::new()));
    resolved.assert_only(TypeErrorCode::NoSuchType);
}

#[test]
fn test_private_constructor_of_other_library() {
    let o = AstBuilder::new(SourceId(2));
    let other = library(
        &o,
        "other",
        vec![TopLevelDecl::Class(
            o.class("Token")
                .with_method(o.constructor("Token", Vec::new()))
                .with_method(o.named_constructor("Token", "_internal", Vec::new())),
        )],
    );
    let b = app();
    let body = vec![
        b.var("ok", Some(b.new_expr(b.ctor("Token"), Vec::new()))),
        b.var("bad", Some(b.new_expr(b.named_ctor(b.ctor("Token"), "_internal"), Vec::new()))),
    ];
    let main = TopLevelDecl::Function(b.method("main", Vec::new(), body));
    let app_lib = library(&b, APP, vec![main]).with_import(b.import("other"));
    let resolved = resolve(vec![other, app_lib]);
    resolved.assert_only(ResolverErrorCode::IllegalAccessToPrivateMember);
}

#[test]
fn test_factory_declared_for_interface_in_default_class() {
    let b = app();
    let factory = b.factory("Shape", Some("unit"), Vec::new(), vec![b.ret(Some(b.null()))]);
    let decls = vec![
        TopLevelDecl::Class(b.interface("Shape").with_default(b.default_clause("ShapeImpl", Vec::new()))),
        TopLevelDecl::Class(b.class("ShapeImpl").with_interface(b.ty("Shape")).with_method(factory)),
    ];
    let new_expr = b.new_expr(b.named_ctor(b.ctor("Shape"), "unit"), Vec::new());
    let (resolved, id) = resolve_new(&b, decls, new_expr);
    resolved.assert_clean();

    let ctor = resolved.program.bindings.symbol(id).unwrap();
    let symbols = &resolved.program.symbols;
    assert_eq!(symbols.kind(ctor), SymbolKind::Constructor);
    assert_eq!(symbols.constructor(ctor).unwrap().constructor_type, resolved.top_level("Shape"));
    assert!(symbols.modifiers(ctor).is_factory());
}

#[test]
fn test_redirecting_factory_target_is_recorded() {
    let b = app();
    let factory = b.factory("Reader", Some("open"), Vec::new(), Vec::new()).with_redirect(b.ctor("FileReader"));
    let resolved = resolve_app(
        &b,
        vec![
            TopLevelDecl::Class(b.class("Reader").with_method(b.constructor("Reader", Vec::new())).with_method(factory)),
            TopLevelDecl::Class(
                b.class("FileReader")
                    .with_interface(b.ty("Reader"))
                    .with_method(b.constructor("FileReader", Vec::new())),
            ),
        ],
    );
    resolved.assert_clean();
    let open = constructor_named(&resolved, "Reader", "open");
    let data = resolved.program.symbols.constructor(open).unwrap();
    assert_eq!(data.redirecting_factory, Some(constructor_named(&resolved, "FileReader", "")));
}

#[test]
fn test_explicit_super_call() {
    let b = app();
    let resolved = resolve_app(
        &b,
        vec![
            TopLevelDecl::Class(
                b.class("Base")
                    .with_method(b.constructor("Base", Vec::new()))
                    .with_method(b.named_constructor("Base", "empty", Vec::new())),
            ),
            TopLevelDecl::Class(
                b.class("Child")
                    .with_superclass(b.ty("Base"))
                    .with_method(b.constructor("Child", Vec::new()).with_initializer(b.super_call(Some("empty"), Vec::new()))),
            ),
        ],
    );
    resolved.assert_clean();
    let child = constructor_named(&resolved, "Child", "");
    assert_eq!(
        resolved.program.symbols.constructor(child).unwrap().super_target,
        Some(constructor_named(&resolved, "Base", "empty"))
    );
}

#[test]
fn test_implicit_super_call() {
    let b = app();
    let resolved = resolve_app(
        &b,
        vec![
            TopLevelDecl::Class(b.class("Base").with_method(b.constructor("Base", Vec::new()))),
            TopLevelDecl::Class(b.class("Child").with_superclass(b.ty("Base")).with_method(b.constructor("Child", Vec::new()))),
        ],
    );
    resolved.assert_clean();
    let child = constructor_named(&resolved, "Child", "");
    assert_eq!(
        resolved.program.symbols.constructor(child).unwrap().super_target,
        Some(constructor_named(&resolved, "Base", ""))
    );
}

#[test]
fn test_implicit_super_without_unnamed_constructor() {
    let base = |b: &AstBuilder| {
        TopLevelDecl::Class(b.class("Base").with_method(b.named_constructor("Base", "create", Vec::new())))
    };

    let b = app();
    let resolved = resolve_app(
        &b,
        vec![
            base(&b),
            TopLevelDecl::Class(b.class("Child").with_superclass(b.ty("Base")).with_method(b.constructor("Child", Vec::new()))),
        ],
    );
    resolved.assert_only(ResolverErrorCode::CannotResolveImplicitSuperConstructor);

    let b = app();
    let resolved = resolve_app(&b, vec![base(&b), TopLevelDecl::Class(b.class("Child").with_superclass(b.ty("Base")))]);
    resolved.assert_only(ResolverErrorCode::CannotResolveImplicitSuperConstructor);
}

#[test]
fn test_unknown_super_constructor() {
    let b = app();
    let resolved = resolve_app(
        &b,
        vec![
            TopLevelDecl::Class(b.class("Base")),
            TopLevelDecl::Class(
                b.class("Child")
                    .with_superclass(b.ty("Base"))
                    .with_method(b.constructor("Child", Vec::new()).with_initializer(b.super_call(Some("nope"), Vec::new()))),
            ),
        ],
    );
    resolved.assert_only(ResolverErrorCode::CannotResolveSuperConstructor);
}

#[test]
fn test_redirecting_constructor() {
    let b = app();
    let class = b
        .class("Range")
        .with_method(b.named_constructor("Range", "between", vec![b.param("lo"), b.param("hi")]))
        .with_method(
            b.constructor("Range", Vec::new())
                .with_initializer(b.this_call(Some("between"), vec![b.int(0), b.int(1)])),
        );
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    resolved.assert_clean();

    let unnamed = constructor_named(&resolved, "Range", "");
    let data = resolved.program.symbols.constructor(unnamed).unwrap();
    assert_eq!(data.redirect_target, Some(constructor_named(&resolved, "Range", "between")));
    assert_eq!(data.super_target, None, "redirecting constructors do not call super");
    assert!(resolved.program.symbols.modifiers(unnamed).contains(Modifiers::REDIRECTING));
}

#[test]
fn test_redirect_to_missing_constructor() {
    let b = app();
    let class = b
        .class("Range")
        .with_method(b.constructor("Range", Vec::new()).with_initializer(b.this_call(Some("nope"), Vec::new())));
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    resolved.assert_only(ResolverErrorCode::CannotResolveConstructor);
}

#[test]
fn test_redirection_cycle() {
    let b = app();
    let class = b
        .class("Loop")
        .with_method(b.named_constructor("Loop", "a", Vec::new()).with_initializer(b.this_call(Some("b"), Vec::new())))
        .with_method(b.named_constructor("Loop", "b", Vec::new()).with_initializer(b.this_call(Some("a"), Vec::new())));
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    assert_eq!(resolved.count(ResolverErrorCode::RedirectionConstructorCycle), 2);
    resolved.assert_only(ResolverErrorCode::RedirectionConstructorCycle);
}

#[test]
fn test_redirecting_constructor_restrictions() {
    let b = app();
    let class = b
        .class("A")
        .with_fields(b.field_list(Modifiers::empty(), "x", None))
        .with_method(b.named_constructor("A", "target", Vec::new()))
        .with_method(
            b.constructor("A", Vec::new())
                .with_initializer(b.field_init("x", b.int(1)))
                .with_initializer(b.this_call(Some("target"), Vec::new())),
        );
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    resolved.assert_only(ResolverErrorCode::RedirectingConstructorHasInitializers);

    let b = app();
    let class = b
        .class("A")
        .with_fields(b.field_list(Modifiers::empty(), "x", None))
        .with_method(b.named_constructor("A", "target", Vec::new()))
        .with_method(
            b.constructor("A", vec![b.field_param("x")]).with_initializer(b.this_call(Some("target"), Vec::new())),
        );
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    resolved.assert_only(ResolverErrorCode::ParameterInitWithRedirectingConstructor);
}

#[test]
fn test_field_initializer_list() {
    let b = app();
    let init = b.field_init("x", b.int(1));
    let init_id = match &init {
        sable_syntax::Initializer::Field(field) => field.id,
        _ => unreachable!(),
    };
    let class = b
        .class("A")
        .with_fields(b.field_list(Modifiers::FINAL, "x", None))
        .with_method(b.constructor("A", Vec::new()).with_initializer(init));
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    resolved.assert_clean();
    assert_eq!(resolved.program.bindings.symbol(init_id), Some(resolved.member("A", "x")));
}

#[test]
fn test_duplicate_initialization() {
    let b = app();
    let class = b
        .class("A")
        .with_fields(b.field_list(Modifiers::empty(), "x", None))
        .with_method(b.constructor("A", vec![b.field_param("x")]).with_initializer(b.field_init("x", b.int(1))));
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    resolved.assert_only(ResolverErrorCode::DuplicateInitialization);

    let b = app();
    let class = b
        .class("A")
        .with_fields(b.field_list(Modifiers::FINAL, "x", Some(b.int(0))))
        .with_method(b.constructor("A", Vec::new()).with_initializer(b.field_init("x", b.int(1))));
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    resolved.assert_only(ResolverErrorCode::DuplicateInitialization);

    let b = app();
    let class = b
        .class("A")
        .with_fields(b.field_list(Modifiers::FINAL, "x", Some(b.int(0))))
        .with_method(b.constructor("A", vec![b.field_param("x")]));
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    assert_eq!(resolved.count(ResolverErrorCode::DuplicateInitialization), 1);
    resolved.assert_only(ResolverErrorCode::DuplicateInitialization);
}

#[test]
fn test_final_fields_must_be_initialized() {
    let b = app();
    let class = b
        .class("A")
        .with_fields(b.field_list(Modifiers::FINAL, "x", None))
        .with_method(b.constructor("A", Vec::new()));
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    resolved.assert_only(ResolverErrorCode::FinalFieldMustBeInitialized);

    let b = app();
    let class = b.class("A").with_fields(b.field_list(Modifiers::FINAL, "x", None));
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    resolved.assert_only(ResolverErrorCode::FinalFieldMustBeInitialized);

    let b = app();
    let class = b
        .class("A")
        .with_fields(b.field_list(Modifiers::FINAL, "x", None))
        .with_method(b.constructor("A", Vec::new()).with_native_body());
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    resolved.assert_clean();
}

#[test]
fn test_initializer_list_field_errors() {
    let b = app();
    let resolved = resolve_app(
        &b,
        vec![
            TopLevelDecl::Class(b.class("Base").with_fields(b.field_list(Modifiers::empty(), "x", None))),
            TopLevelDecl::Class(
                b.class("Child")
                    .with_superclass(b.ty("Base"))
                    .with_method(b.constructor("Child", Vec::new()).with_initializer(b.field_init("x", b.int(1)))),
            ),
        ],
    );
    resolved.assert_only(ResolverErrorCode::CannotInitFieldFromSubclass);

    let b = app();
    let class = b
        .class("A")
        .with_method(b.constructor("A", Vec::new()).with_initializer(b.field_init("nope", b.int(1))));
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    resolved.assert_only(ResolverErrorCode::CannotResolveField);

    let b = app();
    let class = b
        .class("A")
        .with_fields(b.field_list(Modifiers::STATIC, "shared", None))
        .with_method(b.constructor("A", Vec::new()).with_initializer(b.field_init("shared", b.int(1))));
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    resolved.assert_only(ResolverErrorCode::CannotInitStaticFieldInInitializer);

    let b = app();
    let class = b
        .class("A")
        .with_method(b.method("m", Vec::new(), Vec::new()))
        .with_method(b.constructor("A", Vec::new()).with_initializer(b.field_init("m", b.int(1))));
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    resolved.assert_only(ResolverErrorCode::ExpectedFieldNotMethod);
}

#[test]
fn test_factory_with_initializers() {
    let b = app();
    let factory = b
        .factory("A", None, Vec::new(), vec![b.ret(Some(b.null()))])
        .with_initializer(b.super_call(None, Vec::new()));
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(b.class("A").with_method(factory))]);
    resolved.assert_only(ResolverErrorCode::InitializersOnlyInConstructors);
}

#[test]
fn test_redirecting_factory_cycle() {
    let b = app();
    let class = b
        .class("A")
        .with_method(b.factory("A", None, Vec::new(), Vec::new()).with_redirect(b.named_ctor(b.ctor("A"), "x")))
        .with_method(b.factory("A", Some("x"), Vec::new(), Vec::new()).with_redirect(b.ctor("A")));
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    assert_eq!(resolved.count(ResolverErrorCode::RedirectionConstructorCycle), 2);

    let b = app();
    let class = b
        .class("A")
        .with_method(b.factory("A", None, Vec::new(), Vec::new()).with_redirect(b.named_ctor(b.ctor("A"), "x")))
        .with_method(b.factory("A", Some("x"), Vec::new(), vec![b.ret(Some(b.null()))]));
    resolve_app(&b, vec![TopLevelDecl::Class(class)]).assert_clean();
}

#[test]
fn test_redirecting_factory_cycle_across_units() {
    let a = app();
    let b = AstBuilder::new(SourceId(3));
    let first = a.unit(
        "a.sbl",
        vec![TopLevelDecl::Class(
            a.class("A")
                .with_method(a.factory("A", None, Vec::new(), Vec::new()).with_redirect(a.named_ctor(a.ctor("B"), "x"))),
        )],
    );
    let second = b.unit(
        "b.sbl",
        vec![TopLevelDecl::Class(
            b.class("B")
                .with_method(b.factory("B", Some("x"), Vec::new(), Vec::new()).with_redirect(b.ctor("A"))),
        )],
    );
    let resolved = resolve(vec![LibraryUnit::new(APP).with_unit(first).with_unit(second)]);
    assert_eq!(
        resolved.count(ResolverErrorCode::RedirectionConstructorCycle),
        2,
        "both ends of the cycle should be reported, got: {:?}",
        resolved.codes()
    );
    resolved.assert_only(ResolverErrorCode::RedirectionConstructorCycle);
}
