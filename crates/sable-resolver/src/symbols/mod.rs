//! Symbol model
//!
//! Every named program entity is a [`Symbol`] stored in the [`SymbolTable`]
//! arena and referred to by a [`SymbolId`]. Relationships between symbols
//! (enclosing declaration, members, supertypes, redirect targets) are
//! handles into the same arena, so cyclic graphs need no shared ownership.

mod class;

pub use class::{ClassSymbol, MemberMap, SupertypeClosure};

use crate::error::{InternalError, ResolveResult};
use crate::scope::ScopeId;
use crate::types::{TypeId, TypeStore};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use sable_syntax::{is_private_name, Modifiers, NodeId, SourceId, Span};

/// Handle to a symbol in the [`SymbolTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SymbolId(pub u32);

impl SymbolId {
    /// "Not found" sentinel returned by lookups
    pub const NONE: SymbolId = SymbolId(0);
    pub const DYNAMIC: SymbolId = SymbolId(1);
    pub const VOID: SymbolId = SymbolId(2);

    pub fn found(self) -> Option<SymbolId> {
        (self != SymbolId::NONE).then_some(self)
    }

    pub fn is_none(self) -> bool {
        self == SymbolId::NONE
    }
}

/// Closed set of symbol kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Class,
    Constructor,
    Duplicate,
    Dynamic,
    Field,
    FunctionTypeAlias,
    Label,
    Library,
    LibraryPrefix,
    Method,
    None,
    Parameter,
    Super,
    TypeVariable,
    Variable,
    Void,
}

/// A cell that may be written once and read many times
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignOnce<T>(Option<T>);

impl<T: Copy> AssignOnce<T> {
    pub fn get(&self) -> Option<T> {
        self.0
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    /// Write the cell; a second write is an internal error
    pub fn set(&mut self, value: T, what: &'static str, symbol: SymbolId) -> ResolveResult<()> {
        if self.0.is_some() {
            return Err(InternalError::AssignedTwice { what, symbol });
        }
        self.0 = Some(value);
        Ok(())
    }
}

impl<T> Default for AssignOnce<T> {
    fn default() -> Self {
        AssignOnce(None)
    }
}

/// A named program entity
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub modifiers: Modifiers,
    /// Declaration that lexically contains this one
    pub enclosing: Option<SymbolId>,
    /// Source location of the declaring name
    pub span: Option<Span>,
    /// Declaring syntax node
    pub node: Option<NodeId>,
    ty: AssignOnce<TypeId>,
    pub data: SymbolData,
}

impl Symbol {
    pub fn new(name: impl Into<String>, data: SymbolData) -> Self {
        Symbol {
            name: name.into(),
            modifiers: Modifiers::empty(),
            enclosing: None,
            span: None,
            node: None,
            ty: AssignOnce::default(),
            data,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_enclosing(mut self, enclosing: SymbolId) -> Self {
        self.enclosing = Some(enclosing);
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }

    pub fn kind(&self) -> SymbolKind {
        match &self.data {
            SymbolData::Class(_) => SymbolKind::Class,
            SymbolData::Constructor(_) => SymbolKind::Constructor,
            SymbolData::Duplicate(_) => SymbolKind::Duplicate,
            SymbolData::Dynamic => SymbolKind::Dynamic,
            SymbolData::Field(_) => SymbolKind::Field,
            SymbolData::FunctionTypeAlias(_) => SymbolKind::FunctionTypeAlias,
            SymbolData::Label(_) => SymbolKind::Label,
            SymbolData::Library(_) => SymbolKind::Library,
            SymbolData::LibraryPrefix(_) => SymbolKind::LibraryPrefix,
            SymbolData::Method(_) => SymbolKind::Method,
            SymbolData::None => SymbolKind::None,
            SymbolData::Parameter(_) => SymbolKind::Parameter,
            SymbolData::Super(_) => SymbolKind::Super,
            SymbolData::TypeVariable(_) => SymbolKind::TypeVariable,
            SymbolData::Variable => SymbolKind::Variable,
            SymbolData::Void => SymbolKind::Void,
        }
    }

    /// Declared type; Dynamic until a builder assigns one
    pub fn ty(&self) -> TypeId {
        self.ty.get().unwrap_or(TypeId::DYNAMIC)
    }

    pub fn has_type(&self) -> bool {
        self.ty.is_set()
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }

    pub fn is_private(&self) -> bool {
        is_private_name(&self.name)
    }
}

/// Kind-specific symbol data
#[derive(Debug, Clone)]
pub enum SymbolData {
    Class(ClassSymbol),
    Constructor(ConstructorSymbol),
    /// Two or more imported symbols sharing one name
    Duplicate(DuplicateSymbol),
    Dynamic,
    Field(FieldSymbol),
    FunctionTypeAlias(FunctionTypeAliasSymbol),
    Label(LabelSymbol),
    Library(LibrarySymbol),
    LibraryPrefix(LibraryPrefixSymbol),
    Method(MethodSymbol),
    None,
    Parameter(ParameterSymbol),
    /// `super` seen from inside a class
    Super(SuperSymbol),
    TypeVariable(TypeVariableSymbol),
    Variable,
    Void,
}

/// Method, getter, setter, operator, top-level or local function
#[derive(Debug, Clone, Default)]
pub struct MethodSymbol {
    pub parameters: Vec<SymbolId>,
    pub return_type: TypeId,
    /// Supertype members this method overrides
    pub overridden: Vec<SymbolId>,
}

#[derive(Debug, Clone, Default)]
pub struct ConstructorSymbol {
    pub method: MethodSymbol,
    /// Class the constructor constructs; differs from the enclosing class
    /// for factories declared on behalf of an interface
    pub constructor_type: SymbolId,
    /// `""` for the unnamed constructor, `"x"` for `A.x`
    pub raw_name: String,
    /// Interface constructor → matching constructor of the default class
    pub default_constructor: Option<SymbolId>,
    /// Target of a redirecting factory `factory A() = B.x;`
    pub redirecting_factory: Option<SymbolId>,
    /// Target of a `this(...)` initializer
    pub redirect_target: Option<SymbolId>,
    /// Explicit or implicit super constructor
    pub super_target: Option<SymbolId>,
}

#[derive(Debug, Clone, Default)]
pub struct FieldSymbol {
    /// Getter of an accessor field
    pub getter: Option<SymbolId>,
    /// Setter of an accessor field
    pub setter: Option<SymbolId>,
    /// Type inferred from the constant initializer
    pub constant_type: AssignOnce<TypeId>,
    pub overridden: Vec<SymbolId>,
}

impl FieldSymbol {
    /// Fields synthesized from accessors are never plain storage
    pub fn is_accessor(&self) -> bool {
        self.getter.is_some() || self.setter.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParameterSymbol {
    /// Field assigned by a `this.x` parameter
    pub initialized_field: Option<SymbolId>,
    pub has_default: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TypeVariableSymbol {
    pub bound: AssignOnce<TypeId>,
}

#[derive(Debug, Clone, Default)]
pub struct FunctionTypeAliasSymbol {
    pub type_parameters: Vec<SymbolId>,
    /// Aliased function type, filled by the member builder
    pub function_type: Option<TypeId>,
}

#[derive(Debug, Clone, Default)]
pub struct LabelSymbol {
    /// Function whose body declares the label
    pub function: Option<SymbolId>,
}

#[derive(Debug, Clone)]
pub struct LibrarySymbol {
    pub import_scope: ScopeId,
    pub scope: ScopeId,
    /// Names re-exported through `export` directives
    pub exports: IndexMap<String, SymbolId>,
    pub exports_computed: bool,
    /// Top-level `main`
    pub entry_point: Option<SymbolId>,
    pub is_core: bool,
    pub sources: Vec<SourceId>,
}

#[derive(Debug, Clone)]
pub struct LibraryPrefixSymbol {
    pub scope: ScopeId,
    /// Libraries imported under this prefix
    pub libraries: Vec<SymbolId>,
}

#[derive(Debug, Clone, Copy)]
pub struct SuperSymbol {
    pub class: SymbolId,
}

#[derive(Debug, Clone, Default)]
pub struct DuplicateSymbol {
    pub symbols: Vec<SymbolId>,
}

/// Arena of all symbols in a program
#[derive(Debug, Clone)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    /// Class → classes naming it as superclass or interface
    subtypes: FxHashMap<SymbolId, Vec<SymbolId>>,
    super_symbols: FxHashMap<SymbolId, SymbolId>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut table = SymbolTable {
            symbols: Vec::new(),
            subtypes: FxHashMap::default(),
            super_symbols: FxHashMap::default(),
        };
        table.symbols.push(Symbol::new("<none>", SymbolData::None));
        let mut dynamic = Symbol::new("Dynamic", SymbolData::Dynamic);
        dynamic.ty = AssignOnce(Some(TypeId::DYNAMIC));
        table.symbols.push(dynamic);
        let mut void = Symbol::new("void", SymbolData::Void);
        void.ty = AssignOnce(Some(TypeId::VOID));
        table.symbols.push(void);
        table
    }

    pub fn add(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(symbol);
        id
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols.iter().enumerate().map(|(i, s)| (SymbolId(i as u32), s))
    }

    pub fn kind(&self, id: SymbolId) -> SymbolKind {
        self.get(id).kind()
    }

    pub fn name(&self, id: SymbolId) -> &str {
        &self.get(id).name
    }

    pub fn modifiers(&self, id: SymbolId) -> Modifiers {
        self.get(id).modifiers
    }

    pub fn ty(&self, id: SymbolId) -> TypeId {
        self.get(id).ty()
    }

    /// Assign the declared type of a symbol
    pub fn set_type(&mut self, id: SymbolId, ty: TypeId) -> ResolveResult<()> {
        self.get_mut(id).ty.set(ty, "type", id)
    }

    pub fn class(&self, id: SymbolId) -> Option<&ClassSymbol> {
        match &self.get(id).data {
            SymbolData::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn class_mut(&mut self, id: SymbolId) -> Option<&mut ClassSymbol> {
        match &mut self.get_mut(id).data {
            SymbolData::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Class data, or an internal error if `id` is not a class
    pub fn expect_class(&self, id: SymbolId) -> ResolveResult<&ClassSymbol> {
        self.class(id).ok_or(InternalError::UnexpectedKind { symbol: id, expected: "class" })
    }

    /// Method data of a method or constructor
    pub fn method(&self, id: SymbolId) -> Option<&MethodSymbol> {
        match &self.get(id).data {
            SymbolData::Method(method) => Some(method),
            SymbolData::Constructor(constructor) => Some(&constructor.method),
            _ => None,
        }
    }

    pub fn method_mut(&mut self, id: SymbolId) -> Option<&mut MethodSymbol> {
        match &mut self.get_mut(id).data {
            SymbolData::Method(method) => Some(method),
            SymbolData::Constructor(constructor) => Some(&mut constructor.method),
            _ => None,
        }
    }

    pub fn constructor(&self, id: SymbolId) -> Option<&ConstructorSymbol> {
        match &self.get(id).data {
            SymbolData::Constructor(constructor) => Some(constructor),
            _ => None,
        }
    }

    pub fn constructor_mut(&mut self, id: SymbolId) -> ResolveResult<&mut ConstructorSymbol> {
        match &mut self.get_mut(id).data {
            SymbolData::Constructor(constructor) => Ok(constructor),
            _ => Err(InternalError::UnexpectedKind { symbol: id, expected: "constructor" }),
        }
    }

    pub fn field(&self, id: SymbolId) -> Option<&FieldSymbol> {
        match &self.get(id).data {
            SymbolData::Field(field) => Some(field),
            _ => None,
        }
    }

    pub fn field_mut(&mut self, id: SymbolId) -> ResolveResult<&mut FieldSymbol> {
        match &mut self.get_mut(id).data {
            SymbolData::Field(field) => Ok(field),
            _ => Err(InternalError::UnexpectedKind { symbol: id, expected: "field" }),
        }
    }

    pub fn parameter(&self, id: SymbolId) -> Option<&ParameterSymbol> {
        match &self.get(id).data {
            SymbolData::Parameter(parameter) => Some(parameter),
            _ => None,
        }
    }

    pub fn type_variable_mut(&mut self, id: SymbolId) -> ResolveResult<&mut TypeVariableSymbol> {
        match &mut self.get_mut(id).data {
            SymbolData::TypeVariable(tv) => Ok(tv),
            _ => Err(InternalError::UnexpectedKind { symbol: id, expected: "type variable" }),
        }
    }

    pub fn type_variable(&self, id: SymbolId) -> Option<&TypeVariableSymbol> {
        match &self.get(id).data {
            SymbolData::TypeVariable(tv) => Some(tv),
            _ => None,
        }
    }

    pub fn alias(&self, id: SymbolId) -> Option<&FunctionTypeAliasSymbol> {
        match &self.get(id).data {
            SymbolData::FunctionTypeAlias(alias) => Some(alias),
            _ => None,
        }
    }

    pub fn alias_mut(&mut self, id: SymbolId) -> ResolveResult<&mut FunctionTypeAliasSymbol> {
        match &mut self.get_mut(id).data {
            SymbolData::FunctionTypeAlias(alias) => Ok(alias),
            _ => Err(InternalError::UnexpectedKind { symbol: id, expected: "function type alias" }),
        }
    }

    pub fn label(&self, id: SymbolId) -> Option<&LabelSymbol> {
        match &self.get(id).data {
            SymbolData::Label(label) => Some(label),
            _ => None,
        }
    }

    pub fn library(&self, id: SymbolId) -> Option<&LibrarySymbol> {
        match &self.get(id).data {
            SymbolData::Library(library) => Some(library),
            _ => None,
        }
    }

    pub fn library_mut(&mut self, id: SymbolId) -> ResolveResult<&mut LibrarySymbol> {
        match &mut self.get_mut(id).data {
            SymbolData::Library(library) => Ok(library),
            _ => Err(InternalError::UnexpectedKind { symbol: id, expected: "library" }),
        }
    }

    pub fn prefix(&self, id: SymbolId) -> Option<&LibraryPrefixSymbol> {
        match &self.get(id).data {
            SymbolData::LibraryPrefix(prefix) => Some(prefix),
            _ => None,
        }
    }

    pub fn prefix_mut(&mut self, id: SymbolId) -> ResolveResult<&mut LibraryPrefixSymbol> {
        match &mut self.get_mut(id).data {
            SymbolData::LibraryPrefix(prefix) => Ok(prefix),
            _ => Err(InternalError::UnexpectedKind { symbol: id, expected: "library prefix" }),
        }
    }

    pub fn duplicate(&self, id: SymbolId) -> Option<&DuplicateSymbol> {
        match &self.get(id).data {
            SymbolData::Duplicate(duplicate) => Some(duplicate),
            _ => None,
        }
    }

    pub fn duplicate_mut(&mut self, id: SymbolId) -> ResolveResult<&mut DuplicateSymbol> {
        match &mut self.get_mut(id).data {
            SymbolData::Duplicate(duplicate) => Ok(duplicate),
            _ => Err(InternalError::UnexpectedKind { symbol: id, expected: "duplicate" }),
        }
    }

    /// Library that (transitively) encloses `id`
    pub fn library_of(&self, id: SymbolId) -> Option<SymbolId> {
        let mut current = Some(id);
        while let Some(symbol) = current {
            if self.kind(symbol) == SymbolKind::Library {
                return Some(symbol);
            }
            current = self.get(symbol).enclosing;
        }
        None
    }

    /// Nearest enclosing class of `id`, excluding `id` itself
    pub fn enclosing_class(&self, id: SymbolId) -> Option<SymbolId> {
        let mut current = self.get(id).enclosing;
        while let Some(symbol) = current {
            if self.kind(symbol) == SymbolKind::Class {
                return Some(symbol);
            }
            current = self.get(symbol).enclosing;
        }
        None
    }

    /// Whether `id` is a member declared directly in a class
    pub fn is_class_member(&self, id: SymbolId) -> bool {
        self.get(id)
            .enclosing
            .is_some_and(|enclosing| self.kind(enclosing) == SymbolKind::Class)
    }

    /// Whether `id` is an instance field or instance method
    pub fn is_instance_member(&self, id: SymbolId) -> bool {
        self.is_class_member(id)
            && !self.get(id).is_static()
            && matches!(self.kind(id), SymbolKind::Field | SymbolKind::Method)
    }

    /// Whether `id` is private to a library other than `from_library`
    pub fn is_private_to_other(&self, id: SymbolId, from_library: SymbolId) -> bool {
        self.get(id).is_private() && self.library_of(id) != Some(from_library)
    }

    /// The `super` pseudo-symbol of a class, created on first use
    pub fn super_symbol(&mut self, class: SymbolId) -> SymbolId {
        if let Some(&id) = self.super_symbols.get(&class) {
            return id;
        }
        let id = self.add(Symbol::new("super", SymbolData::Super(SuperSymbol { class })).with_enclosing(class));
        self.super_symbols.insert(class, id);
        id
    }

    /// Classes that directly extend or implement `class`
    pub fn subtypes(&self, class: SymbolId) -> &[SymbolId] {
        self.subtypes.get(&class).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Set the superclass, keeping the subtype relation in sync
    pub fn set_supertype(&mut self, class: SymbolId, supertype: Option<TypeId>, types: &TypeStore) -> ResolveResult<()> {
        let new_class = supertype.and_then(|t| types.class_of(t));
        let data = self
            .class_mut(class)
            .ok_or(InternalError::UnexpectedKind { symbol: class, expected: "class" })?;
        let old_class = data.superclass;
        data.supertype = supertype;
        data.superclass = new_class;
        if let Some(old) = old_class {
            if let Some(subs) = self.subtypes.get_mut(&old) {
                subs.retain(|&s| s != class);
            }
        }
        if let Some(new) = new_class {
            self.subtypes.entry(new).or_default().push(class);
        }
        Ok(())
    }

    /// Append an implemented interface, keeping the subtype relation in sync
    pub fn add_interface(&mut self, class: SymbolId, interface: TypeId, types: &TypeStore) -> ResolveResult<()> {
        let target = types.class_of(interface);
        let data = self
            .class_mut(class)
            .ok_or(InternalError::UnexpectedKind { symbol: class, expected: "class" })?;
        data.interfaces.push(interface);
        if let Some(target) = target {
            data.interface_classes.push(target);
            self.subtypes.entry(target).or_default().push(class);
        }
        Ok(())
    }

    /// Constructor of `class` with the given raw name constructing `constructor_type`
    pub fn find_constructor(&self, class: SymbolId, raw_name: &str, constructor_type: SymbolId) -> Option<SymbolId> {
        self.class(class)?.constructors.iter().copied().find(|&c| {
            self.constructor(c)
                .is_some_and(|data| data.raw_name == raw_name && data.constructor_type == constructor_type)
        })
    }
}
