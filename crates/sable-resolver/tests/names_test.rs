//! Tests for name resolution inside bodies

mod common;

use common::{app, library, resolve, resolve_app, Resolved, APP};
use sable_resolver::{ResolverErrorCode, SymbolKind};
use sable_syntax::{Arguments, AstBuilder, ClassDecl, Modifiers, SourceId, Statement, TopLevelDecl};

fn main_with(b: &AstBuilder, body: Vec<Statement>) -> TopLevelDecl {
    TopLevelDecl::Function(b.method("main", Vec::new(), body))
}

fn print(b: &AstBuilder, value: sable_syntax::Expression) -> Statement {
    b.expr_stmt(b.call("print", vec![value]))
}

/// Class `A` with instance field `x`, instance method `m` and a static method with `body`
fn class_with_static(b: &AstBuilder, body: Vec<Statement>) -> ClassDecl {
    b.class("A")
        .with_fields(b.field_list(Modifiers::empty(), "x", None))
        .with_method(b.method("m", Vec::new(), Vec::new()))
        .with_method(b.static_method("s", Vec::new(), body))
}

fn resolve_static_body(build: impl Fn(&AstBuilder) -> Vec<Statement>) -> Resolved {
    let b = app();
    let body = build(&b);
    resolve_app(&b, vec![TopLevelDecl::Class(class_with_static(&b, body))])
}

#[test]
fn test_locals_and_parameters_are_bound() {
    let b = app();
    let use_local = b.id("total");
    let use_local_id = use_local.id();
    let use_param = b.id("n");
    let use_param_id = use_param.id();
    let body = vec![
        b.var("total", Some(b.int(0))),
        b.expr_stmt(b.compound_assign(Some(sable_syntax::BinaryOperator::Add), use_local, use_param)),
    ];
    let resolved = resolve_app(&b, vec![TopLevelDecl::Function(b.method("sum", vec![b.param("n")], body))]);
    resolved.assert_clean();

    let bindings = &resolved.program.bindings;
    let symbols = &resolved.program.symbols;
    let local = bindings.symbol(use_local_id).unwrap();
    assert_eq!(symbols.kind(local), SymbolKind::Variable);
    assert_eq!(symbols.name(local), "total");
    assert_eq!(symbols.kind(bindings.symbol(use_param_id).unwrap()), SymbolKind::Parameter);
}

#[test]
fn test_members_win_over_library_names() {
    let b = app();
    let call = b.call("value", Vec::new());
    let call_id = call.id();
    let class = b
        .class("A")
        .with_method(b.method("value", Vec::new(), Vec::new()))
        .with_method(b.method("run", Vec::new(), vec![b.expr_stmt(call)]));
    let resolved = resolve_app(
        &b,
        vec![
            TopLevelDecl::Function(b.method("value", Vec::new(), Vec::new())),
            TopLevelDecl::Class(class),
        ],
    );
    resolved.assert_clean();
    assert_eq!(resolved.program.bindings.symbol(call_id), Some(resolved.member("A", "value")));
}

#[test]
fn test_inherited_members_are_found() {
    let b = app();
    let read = b.id("size");
    let read_id = read.id();
    let resolved = resolve_app(
        &b,
        vec![
            TopLevelDecl::Class(b.class("Base").with_fields(b.field_list(Modifiers::empty(), "size", None))),
            TopLevelDecl::Class(
                b.class("Child")
                    .with_superclass(b.ty("Base"))
                    .with_method(b.method("show", Vec::new(), vec![print(&b, read)])),
            ),
        ],
    );
    resolved.assert_clean();
    assert_eq!(resolved.program.bindings.symbol(read_id), Some(resolved.member("Base", "size")));
}

#[test]
fn test_unresolved_names_in_instance_code_are_deferred() {
    let b = app();
    let class = b.class("A").with_method(b.method(
        "m",
        Vec::new(),
        vec![b.expr_stmt(b.call("later", Vec::new())), print(&b, b.id("field"))],
    ));
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    resolved.assert_clean();
}

#[test]
fn test_unresolved_names_in_static_code() {
    let b = app();
    let resolved = resolve_app(
        &b,
        vec![main_with(&b, vec![b.expr_stmt(b.call("missing", Vec::new())), print(&b, b.id("nothing"))])],
    );
    assert_eq!(resolved.count(ResolverErrorCode::CannotResolveMethod), 1);
    assert_eq!(resolved.count(ResolverErrorCode::CannotBeResolved), 1);
}

#[test]
fn test_instance_members_from_static_code() {
    let resolved = resolve_static_body(|b| vec![print(b, b.id("x"))]);
    resolved.assert_only(ResolverErrorCode::IllegalFieldAccessFromStatic);

    let resolved = resolve_static_body(|b| vec![b.expr_stmt(b.call("m", Vec::new()))]);
    resolved.assert_only(ResolverErrorCode::InstanceMethodFromStatic);

    let resolved = resolve_static_body(|b| vec![print(b, b.id("m"))]);
    resolved.assert_only(ResolverErrorCode::IllegalMethodAccessFromStatic);

    let resolved = resolve_static_body(|b| vec![print(b, b.this())]);
    resolved.assert_only(ResolverErrorCode::ThisInStaticMethod);

    let resolved = resolve_static_body(|b| vec![b.expr_stmt(b.method_call(b.super_expr(), "m", Vec::new()))]);
    resolved.assert_only(ResolverErrorCode::SuperInStaticMethod);
}

#[test]
fn test_this_and_super_outside_classes() {
    let b = app();
    let resolved = resolve_app(&b, vec![main_with(&b, vec![print(&b, b.this())])]);
    resolved.assert_only(ResolverErrorCode::ThisOutsideOfMethod);

    let b = app();
    let resolved = resolve_app(&b, vec![main_with(&b, vec![print(&b, b.prop(b.super_expr(), "x"))])]);
    resolved.assert_only(ResolverErrorCode::SuperOutsideOfMethod);
}

#[test]
fn test_this_and_super_in_factories() {
    let b = app();
    let factory = b.factory("A", None, Vec::new(), vec![print(&b, b.this()), b.ret(Some(b.null()))]);
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(b.class("A").with_method(factory))]);
    resolved.assert_only(ResolverErrorCode::ThisInFactoryConstructor);

    let b = app();
    let factory = b.factory("A", None, Vec::new(), vec![print(&b, b.prop(b.super_expr(), "hashCode"))]);
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(b.class("A").with_method(factory))]);
    resolved.assert_only(ResolverErrorCode::SuperInFactoryConstructor);
}

#[test]
fn test_instance_field_initializers() {
    let b = app();
    let class = b
        .class("A")
        .with_fields(b.field_list(Modifiers::empty(), "x", Some(b.int(1))))
        .with_fields(b.field_list(Modifiers::empty(), "y", Some(b.id("x"))));
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    resolved.assert_only(ResolverErrorCode::CannotUseInstanceFieldInInstanceFieldInitializer);

    let b = app();
    let class = b.class("A").with_fields(b.field_list(Modifiers::empty(), "self", Some(b.this())));
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    resolved.assert_only(ResolverErrorCode::CannotUseThisInInstanceFieldInitializer);
}

#[test]
fn test_static_field_initializer_can_use_static_members() {
    let b = app();
    let class = b
        .class("A")
        .with_fields(b.field_list(Modifiers::STATIC, "base", Some(b.int(1))))
        .with_fields(b.field_list(Modifiers::STATIC, "next", Some(b.id("base"))));
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    resolved.assert_clean();
}

#[test]
fn test_constructor_initializer_restrictions() {
    let fields = |b: &AstBuilder| {
        b.class("A")
            .with_fields(b.field_list(Modifiers::empty(), "x", None))
            .with_fields(b.field_list(Modifiers::empty(), "y", None))
            .with_method(b.method("m", Vec::new(), Vec::new()))
    };

    let b = app();
    let class = fields(&b).with_method(b.constructor("A", Vec::new()).with_initializer(b.field_init("x", b.id("y"))));
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    resolved.assert_only(ResolverErrorCode::CannotAccessFieldInInitializer);

    let b = app();
    let class = fields(&b).with_method(b.constructor("A", Vec::new()).with_initializer(b.field_init("x", b.this())));
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    resolved.assert_only(ResolverErrorCode::ThisInInitializerAsExpression);

    let b = app();
    let class = fields(&b).with_method(
        b.constructor("A", Vec::new())
            .with_initializer(b.field_init("x", b.call("m", Vec::new()))),
    );
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    resolved.assert_only(ResolverErrorCode::InstanceMethodFromInitializer);

    let b = app();
    let class = fields(&b)
        .with_method(b.named_constructor("A", "with", vec![b.param("value")]))
        .with_method(
            b.constructor("A", Vec::new())
                .with_initializer(b.this_call(Some("with"), vec![b.call("m", Vec::new())])),
        );
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    resolved.assert_only(ResolverErrorCode::InstanceMethodFromRedirect);
}

#[test]
fn test_parameters_are_usable_in_initializers() {
    let b = app();
    let class = b
        .class("A")
        .with_fields(b.field_list(Modifiers::FINAL, "x", None))
        .with_method(b.constructor("A", vec![b.param("value")]).with_initializer(b.field_init("x", b.id("value"))));
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    resolved.assert_clean();
}

#[test]
fn test_super_member_in_initializer() {
    let b = app();
    let resolved = resolve_app(
        &b,
        vec![
            TopLevelDecl::Class(b.class("B").with_method(b.method("seed", Vec::new(), vec![b.ret(Some(b.int(1)))]))),
            TopLevelDecl::Class(
                b.class("A")
                    .with_superclass(b.ty("B"))
                    .with_fields(b.field_list(Modifiers::empty(), "x", None))
                    .with_method(
                        b.constructor("A", Vec::new())
                            .with_initializer(b.field_init("x", b.method_call(b.super_expr(), "seed", Vec::new()))),
                    ),
            ),
        ],
    );
    resolved.assert_only(ResolverErrorCode::SuperMethodInvocationInConstructorInitializer);
}

#[test]
fn test_super_member_lookup() {
    let b = app();
    let resolved = resolve_app(
        &b,
        vec![
            TopLevelDecl::Class(b.class("B").with_method(b.static_method("util", Vec::new(), Vec::new()))),
            TopLevelDecl::Class(b.class("A").with_superclass(b.ty("B")).with_method(b.method(
                "run",
                Vec::new(),
                vec![
                    b.expr_stmt(b.method_call(b.super_expr(), "missing", Vec::new())),
                    b.expr_stmt(b.method_call(b.super_expr(), "util", Vec::new())),
                ],
            ))),
        ],
    );
    assert_eq!(resolved.count(ResolverErrorCode::CannotResolveMethodInClass), 1);
    assert_eq!(resolved.count(ResolverErrorCode::StaticMemberAccessedThroughSuper), 1);
}

#[test]
fn test_static_access_through_class() {
    let b = app();
    let class = b
        .class("K")
        .with_method(b.static_method("make", Vec::new(), Vec::new()))
        .with_method(b.method("run", Vec::new(), Vec::new()))
        .with_fields(b.field_list(Modifiers::STATIC, "count", Some(b.int(0))));
    let good_call = b.method_call(b.id("K"), "make", Vec::new());
    let good_call_id = good_call.id();
    let body = vec![
        b.expr_stmt(good_call),
        print(&b, b.prop(b.id("K"), "count")),
        b.expr_stmt(b.method_call(b.id("K"), "run", Vec::new())),
        print(&b, b.prop(b.id("K"), "missing")),
        b.expr_stmt(b.method_call(b.id("K"), "absent", Vec::new())),
    ];
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class), main_with(&b, body)]);
    assert_eq!(resolved.count(ResolverErrorCode::NotAStaticMethod), 1);
    assert_eq!(resolved.count(ResolverErrorCode::NotAStaticField), 1);
    assert_eq!(resolved.count(ResolverErrorCode::CannotResolveMethodInClass), 1);
    assert_eq!(resolved.codes().len(), 3, "got: {:?}", resolved.codes());
    assert_eq!(resolved.program.bindings.symbol(good_call_id), Some(resolved.member("K", "make")));
}

#[test]
fn test_private_member_of_other_library() {
    let o = AstBuilder::new(SourceId(2));
    let other = library(
        &o,
        "other",
        vec![TopLevelDecl::Class(o.class("K").with_method(o.static_method("_hidden", Vec::new(), Vec::new())))],
    );
    let b = app();
    let body = vec![b.expr_stmt(b.method_call(b.id("K"), "_hidden", Vec::new()))];
    let app_lib = library(&b, APP, vec![main_with(&b, body)]).with_import(b.import("other"));
    let resolved = resolve(vec![other, app_lib]);
    resolved.assert_only(ResolverErrorCode::IllegalAccessToPrivateMember);
}

#[test]
fn test_inherited_private_member_of_other_library() {
    let o = AstBuilder::new(SourceId(2));
    let base = o
        .class("Base")
        .with_fields(o.field_list(Modifiers::empty(), "_secret", Some(o.int(1))))
        .with_fields(o.field_list(Modifiers::empty(), "shown", Some(o.int(2))))
        .with_method(o.method("_hidden", Vec::new(), Vec::new()));
    let other = library(&o, "other", vec![TopLevelDecl::Class(base)]);

    let b = app();
    let body = vec![
        print(&b, b.prop(b.this(), "_secret")),
        print(&b, b.prop(b.this(), "shown")),
        b.expr_stmt(b.method_call(b.super_expr(), "_hidden", Vec::new())),
        b.expr_stmt(b.method_call(b.this(), "_hidden", Vec::new())),
    ];
    let child = b
        .class("Child")
        .with_superclass(b.ty("Base"))
        .with_method(b.method("peek", Vec::new(), body));
    let app_lib = library(&b, APP, vec![TopLevelDecl::Class(child)]).with_import(b.import("other"));
    let resolved = resolve(vec![other, app_lib]);
    assert_eq!(resolved.count(ResolverErrorCode::IllegalAccessToPrivateMember), 3);
    resolved.assert_only(ResolverErrorCode::IllegalAccessToPrivateMember);
}

#[test]
fn test_type_variable_used_as_value() {
    let b = app();
    let class = b
        .class("G")
        .with_type_param(b.type_param("T", None))
        .with_method(b.method("m", Vec::new(), vec![print(&b, b.id("T"))]));
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    resolved.assert_only(ResolverErrorCode::TypeVariableNotAllowedInIdentifier);
}

#[test]
fn test_assignment_targets() {
    let b = app();
    let body = vec![
        b.var_decl(Modifiers::FINAL, None, "fixed", Some(b.int(1))),
        b.expr_stmt(b.assign(b.id("fixed"), b.int(2))),
    ];
    let resolved = resolve_app(&b, vec![main_with(&b, body)]);
    resolved.assert_only(ResolverErrorCode::CannotAssignToFinal);

    let b = app();
    let resolved = resolve_app(
        &b,
        vec![
            TopLevelDecl::Function(b.method("f", Vec::new(), Vec::new())),
            main_with(&b, vec![b.expr_stmt(b.assign(b.id("f"), b.int(1)))]),
        ],
    );
    resolved.assert_only(ResolverErrorCode::CannotAssignToMethod);

    let b = app();
    let resolved = resolve_app(
        &b,
        vec![
            TopLevelDecl::Class(b.class("A")),
            main_with(&b, vec![b.expr_stmt(b.assign(b.id("A"), b.int(1)))]),
        ],
    );
    resolved.assert_only(ResolverErrorCode::CannotAssignTo);

    let b = app();
    let class = b.class("A").with_method(b.method("m", Vec::new(), vec![b.expr_stmt(b.assign(b.this(), b.null()))]));
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    resolved.assert_only(ResolverErrorCode::CannotAssignTo);
}

#[test]
fn test_final_field_and_getter_assignment() {
    let b = app();
    let class = b
        .class("A")
        .with_fields(b.field_list(Modifiers::FINAL, "id", Some(b.int(1))))
        .with_method(b.getter("name", vec![b.ret(Some(b.string("a")))]))
        .with_method(b.method(
            "reset",
            Vec::new(),
            vec![b.expr_stmt(b.assign(b.id("id"), b.int(0))), b.expr_stmt(b.assign(b.id("name"), b.string("b")))],
        ));
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(class)]);
    assert_eq!(resolved.count(ResolverErrorCode::CannotAssignToFinal), 1);
    assert_eq!(resolved.count(ResolverErrorCode::FieldDoesNotHaveASetter), 1);
}

#[test]
fn test_calling_a_class() {
    let b = app();
    let resolved = resolve_app(
        &b,
        vec![TopLevelDecl::Class(b.class("A")), main_with(&b, vec![b.expr_stmt(b.call("A", Vec::new()))])],
    );
    resolved.assert_only(ResolverErrorCode::DidYouMeanNew);
}

#[test]
fn test_local_variable_rules() {
    let b = app();
    let body = vec![b.var("x", Some(b.binary(sable_syntax::BinaryOperator::Add, b.id("x"), b.int(1))))];
    let resolved = resolve_app(&b, vec![main_with(&b, body)]);
    resolved.assert_only(ResolverErrorCode::VariableReferencesSameNameInInitializer);

    let b = app();
    let body = vec![print(&b, b.id("later")), b.var("later", Some(b.int(1)))];
    let resolved = resolve_app(&b, vec![main_with(&b, body)]);
    resolved.assert_only(ResolverErrorCode::UsingLocalVariableBeforeDeclaration);

    let b = app();
    let body = vec![b.var("a", None), b.var("a", None)];
    let resolved = resolve_app(&b, vec![main_with(&b, body)]);
    resolved.assert_only(ResolverErrorCode::DuplicateLocalVariable);
}

#[test]
fn test_shadowing_is_a_warning() {
    let b = app();
    let body = vec![b.var("a", Some(b.int(1))), b.block_stmt(vec![b.var("a", Some(b.int(2)))])];
    let resolved = resolve_app(&b, vec![main_with(&b, body)]);
    resolved.assert_only(ResolverErrorCode::ShadowedLocalVariable);
    assert!(!resolved.listener.has_errors());

    let b = app();
    let resolved = resolve_app(
        &b,
        vec![TopLevelDecl::Function(b.method("f", vec![b.param("a")], vec![b.var("a", None)]))],
    );
    resolved.assert_only(ResolverErrorCode::ShadowedLocalVariable);
}

#[test]
fn test_local_function_can_recurse() {
    let b = app();
    let body = vec![b.local_function(
        "countdown",
        vec![b.param("n")],
        vec![b.expr_stmt(b.call("countdown", vec![b.id("n")]))],
    )];
    let resolved = resolve_app(&b, vec![main_with(&b, body)]);
    resolved.assert_clean();
}

#[test]
fn test_loops_and_catch_declare_their_variables() {
    let b = app();
    let body = vec![
        b.for_in("item", b.array(vec![b.int(1), b.int(2)]), b.block_stmt(vec![print(&b, b.id("item"))])),
        b.for_stmt(
            Some(b.var("i", Some(b.int(0)))),
            Some(b.binary(sable_syntax::BinaryOperator::LessThan, b.id("i"), b.int(3))),
            vec![b.unary(sable_syntax::UnaryOperator::PostfixIncrement, b.id("i"))],
            b.block_stmt(vec![print(&b, b.id("i"))]),
        ),
        b.try_catch(vec![b.throw(Some(b.string("boom")))], "e", vec![print(&b, b.id("e")), b.throw(None)]),
    ];
    let resolved = resolve_app(&b, vec![main_with(&b, body)]);
    resolved.assert_clean();
}

#[test]
fn test_rethrow_outside_catch() {
    let b = app();
    let resolved = resolve_app(&b, vec![main_with(&b, vec![b.throw(None)])]);
    resolved.assert_only(ResolverErrorCode::RethrowNotInCatch);
}

#[test]
fn test_labels() {
    let b = app();
    let body = vec![b.labeled(
        "outer",
        b.while_stmt(b.bool(true), b.block_stmt(vec![b.break_stmt(Some("outer")), b.continue_stmt(Some("outer"))])),
    )];
    let resolved = resolve_app(&b, vec![main_with(&b, body)]);
    resolved.assert_clean();

    let b = app();
    let resolved = resolve_app(&b, vec![main_with(&b, vec![b.break_stmt(Some("nowhere"))])]);
    resolved.assert_only(ResolverErrorCode::CannotResolveLabel);

    let b = app();
    let body = vec![b.labeled(
        "outer",
        b.block_stmt(vec![b.expr_stmt(b.function(Vec::new(), vec![b.break_stmt(Some("outer"))]))]),
    )];
    let resolved = resolve_app(&b, vec![main_with(&b, body)]);
    resolved.assert_only(ResolverErrorCode::CannotResolveLabel);

    let b = app();
    let body = vec![b.labeled("outer", b.block_stmt(vec![b.expr_stmt(b.call("outer", Vec::new()))]))];
    let resolved = resolve_app(&b, vec![main_with(&b, body)]);
    resolved.assert_only(ResolverErrorCode::CannotCallLabel);
}

#[test]
fn test_switch_labels() {
    let b = app();
    let body = vec![b.switch(
        b.int(1),
        vec![
            b.case(&["first"], Some(b.int(1)), vec![b.continue_stmt(Some("second"))]),
            b.case(&["second"], Some(b.int(2)), vec![b.break_stmt(None)]),
        ],
    )];
    let resolved = resolve_app(&b, vec![main_with(&b, body)]);
    resolved.assert_clean();

    let b = app();
    let body = vec![b.switch(
        b.int(1),
        vec![b.case(&["dup"], Some(b.int(1)), Vec::new()), b.case(&["dup"], Some(b.int(2)), Vec::new())],
    )];
    let resolved = resolve_app(&b, vec![main_with(&b, body)]);
    resolved.assert_only(ResolverErrorCode::DuplicateLabelInSwitch);
}

#[test]
fn test_return_value_in_generative_constructor() {
    let b = app();
    let ctor = b.constructor("A", Vec::new()).with_body(b.block(vec![b.ret(Some(b.int(1)))]));
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(b.class("A").with_method(ctor))]);
    resolved.assert_only(ResolverErrorCode::InvalidReturnInConstructor);

    let b = app();
    let ctor = b.constructor("A", Vec::new()).with_body(b.block(vec![b.ret(None)]));
    let resolved = resolve_app(&b, vec![TopLevelDecl::Class(b.class("A").with_method(ctor))]);
    resolved.assert_clean();
}

#[test]
fn test_duplicate_named_arguments() {
    let b = app();
    let args = Arguments {
        positional: Vec::new(),
        named: vec![b.named_arg("size", b.int(1)), b.named_arg("size", b.int(2))],
    };
    let resolved = resolve_app(
        &b,
        vec![
            TopLevelDecl::Function(b.method("draw", vec![b.named_param("size", Some(b.int(0)))], Vec::new())),
            main_with(&b, vec![b.expr_stmt(b.call_with("draw", args))]),
        ],
    );
    resolved.assert_only(ResolverErrorCode::DuplicateNamedArgument);
}
