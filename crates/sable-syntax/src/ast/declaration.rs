//! Declaration AST nodes
//!
//! This module defines everything that introduces a name:
//! - Libraries, compilation units and their import/export directives
//! - Classes and interfaces, with their `default` clause
//! - Methods, constructors, getters, setters and operators
//! - Fields, parameters and function type aliases

use super::*;
use crate::span::{SourceId, Span};
use std::fmt;

// ============================================================================
// Libraries
// ============================================================================

/// A library: one or more compilation units sharing a top-level scope
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryUnit {
    /// Library name, also the string used by `import` directives
    pub name: String,
    pub units: Vec<CompilationUnit>,
    pub imports: Vec<ImportDirective>,
    pub exports: Vec<ExportDirective>,
}

impl LibraryUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            units: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
        }
    }

    pub fn with_unit(mut self, unit: CompilationUnit) -> Self {
        self.units.push(unit);
        self
    }

    pub fn with_import(mut self, import: ImportDirective) -> Self {
        self.imports.push(import);
        self
    }

    pub fn with_export(mut self, export: ExportDirective) -> Self {
        self.exports.push(export);
        self
    }
}

/// One source file
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationUnit {
    pub source: SourceId,
    /// File path; core-library sources are recognized by its suffix
    pub path: String,
    pub declarations: Vec<TopLevelDecl>,
}

/// `show`/`hide` filters on an import or export
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Combinators {
    pub show: Vec<Identifier>,
    pub hide: Vec<Identifier>,
}

impl Combinators {
    /// Whether `name` passes both filters
    pub fn allows(&self, name: &str) -> bool {
        if !self.show.is_empty() && !self.show.iter().any(|i| i.name == name) {
            return false;
        }
        !self.hide.iter().any(|i| i.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &Identifier> {
        self.show.iter().chain(self.hide.iter())
    }
}

/// import 'lib' as p show a, b hide c;
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDirective {
    pub library: String,
    pub prefix: Option<Identifier>,
    pub combinators: Combinators,
    pub span: Span,
}

/// export 'lib' show a hide b;
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDirective {
    pub library: String,
    pub combinators: Combinators,
    pub span: Span,
}

/// Declaration directly inside a compilation unit
#[derive(Debug, Clone, PartialEq)]
pub enum TopLevelDecl {
    Class(ClassDecl),
    Function(MethodDecl),
    Fields(FieldList),
    TypeAlias(FunctionTypeAlias),
}

impl TopLevelDecl {
    pub fn span(&self) -> &Span {
        match self {
            TopLevelDecl::Class(d) => &d.span,
            TopLevelDecl::Function(d) => &d.span,
            TopLevelDecl::Fields(d) => &d.span,
            TopLevelDecl::TypeAlias(d) => &d.span,
        }
    }
}

// ============================================================================
// Classes
// ============================================================================

/// Class or interface declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub id: NodeId,
    pub name: Identifier,
    /// ABSTRACT and NATIVE are meaningful here
    pub modifiers: Modifiers,
    pub is_interface: bool,
    pub type_params: Vec<TypeParameter>,
    /// `extends` of a class (interfaces list their super-interfaces in `interfaces`)
    pub superclass: Option<TypeNode>,
    /// `implements` of a class, `extends` of an interface
    pub interfaces: Vec<TypeNode>,
    pub default_clause: Option<DefaultClause>,
    pub members: Vec<ClassMember>,
    pub span: Span,
}

impl ClassDecl {
    pub fn with_superclass(mut self, superclass: TypeNode) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn with_interface(mut self, interface: TypeNode) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn with_type_param(mut self, param: TypeParameter) -> Self {
        self.type_params.push(param);
        self
    }

    pub fn with_default(mut self, clause: DefaultClause) -> Self {
        self.default_clause = Some(clause);
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers |= modifiers;
        self
    }

    pub fn with_method(mut self, method: MethodDecl) -> Self {
        self.members.push(ClassMember::Method(method));
        self
    }

    pub fn with_fields(mut self, fields: FieldList) -> Self {
        self.members.push(ClassMember::Fields(fields));
        self
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|m| match m {
            ClassMember::Method(method) => Some(method),
            ClassMember::Fields(_) => None,
        })
    }

    pub fn field_lists(&self) -> impl Iterator<Item = &FieldList> {
        self.members.iter().filter_map(|m| match m {
            ClassMember::Fields(fields) => Some(fields),
            ClassMember::Method(_) => None,
        })
    }
}

/// interface I<T> default C<T>
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultClause {
    pub id: NodeId,
    pub class: TypeNode,
    /// Type parameters as written after the default class name
    pub type_params: Vec<TypeParameter>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassMember {
    Method(MethodDecl),
    Fields(FieldList),
}

// ============================================================================
// Fields
// ============================================================================

/// static final int a = 1, b;
#[derive(Debug, Clone, PartialEq)]
pub struct FieldList {
    pub modifiers: Modifiers,
    pub type_annotation: Option<TypeNode>,
    pub fields: Vec<FieldDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub id: NodeId,
    pub name: Identifier,
    pub initializer: Option<Expression>,
    pub span: Span,
}

// ============================================================================
// Methods
// ============================================================================

/// Method or constructor name
#[derive(Debug, Clone, PartialEq)]
pub enum MethodName {
    /// foo, A, operator symbols
    Simple(Identifier),
    /// A.named
    Qualified {
        qualifier: Identifier,
        name: Identifier,
    },
}

impl MethodName {
    /// The identifier naming the method itself
    pub fn identifier(&self) -> &Identifier {
        match self {
            MethodName::Simple(name) => name,
            MethodName::Qualified { name, .. } => name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            MethodName::Simple(name) => name.span,
            MethodName::Qualified { qualifier, name } => qualifier.span.merge(&name.span),
        }
    }
}

impl fmt::Display for MethodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodName::Simple(name) => write!(f, "{}", name.name),
            MethodName::Qualified { qualifier, name } => {
                write!(f, "{}.{}", qualifier.name, name.name)
            }
        }
    }
}

/// Function, method, constructor, getter, setter or operator
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub id: NodeId,
    pub name: MethodName,
    pub modifiers: Modifiers,
    pub return_type: Option<TypeNode>,
    pub params: Vec<Parameter>,
    /// Constructor initializer list
    pub initializers: Vec<Initializer>,
    /// Target of a redirecting factory: factory A() = B.named;
    pub redirect: Option<ConstructorRef>,
    /// None for abstract and interface members
    pub body: Option<FunctionBody>,
    pub span: Span,
}

impl MethodDecl {
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers |= modifiers;
        self
    }

    pub fn with_param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_return_type(mut self, ty: TypeNode) -> Self {
        self.return_type = Some(ty);
        self
    }

    pub fn with_initializer(mut self, initializer: Initializer) -> Self {
        self.initializers.push(initializer);
        self
    }

    pub fn with_redirect(mut self, target: ConstructorRef) -> Self {
        self.redirect = Some(target);
        self.body = None;
        self
    }

    pub fn with_body(mut self, body: Block) -> Self {
        self.body = Some(FunctionBody::Block(body));
        self
    }

    pub fn without_body(mut self) -> Self {
        self.body = None;
        self
    }

    pub fn with_native_body(mut self) -> Self {
        self.body = Some(FunctionBody::Native(self.span));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    Block(Block),
    /// The `native;` passthrough marker
    Native(Span),
}

/// Formal parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub id: NodeId,
    pub name: Identifier,
    /// FINAL, CONST, NAMED, OPTIONAL
    pub modifiers: Modifiers,
    pub type_annotation: Option<TypeNode>,
    /// this.x
    pub field_initializer: bool,
    pub default_value: Option<Expression>,
    pub span: Span,
}

impl Parameter {
    pub fn with_type(mut self, ty: TypeNode) -> Self {
        self.type_annotation = Some(ty);
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers |= modifiers;
        self
    }

    pub fn with_default(mut self, value: Expression) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// Constructor initializer list entry
#[derive(Debug, Clone, PartialEq)]
pub enum Initializer {
    /// x = expr
    Field(FieldInitializer),
    /// super(...) / super.named(...)
    Super(ConstructorCall),
    /// this(...) / this.named(...)
    Redirect(ConstructorCall),
}

impl Initializer {
    pub fn span(&self) -> &Span {
        match self {
            Initializer::Field(init) => &init.span,
            Initializer::Super(call) | Initializer::Redirect(call) => &call.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInitializer {
    pub id: NodeId,
    pub name: Identifier,
    pub value: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorCall {
    pub id: NodeId,
    pub name: Option<Identifier>,
    pub args: Arguments,
    pub span: Span,
}

/// typedef R Name<T>(params);
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionTypeAlias {
    pub id: NodeId,
    pub name: Identifier,
    pub type_params: Vec<TypeParameter>,
    pub return_type: Option<TypeNode>,
    pub params: Vec<Parameter>,
    pub span: Span,
}
