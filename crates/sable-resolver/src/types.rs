//! Resolved types and type interning
//!
//! Types are interned in a [`TypeStore`] so identical types share a
//! [`TypeId`] and equality is a handle comparison.

use crate::error::{InternalError, ResolveResult};
use crate::scope::ScopeTable;
use crate::symbols::{SymbolId, SymbolKind, SymbolTable};
use rustc_hash::FxHashMap;

/// Handle to an interned type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const DYNAMIC: TypeId = TypeId(0);
    pub const VOID: TypeId = TypeId(1);
}

/// A resolved type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// The unchecked top type; also the result of unresolvable annotations
    Dynamic,
    Void,
    /// Class or interface instantiated with type arguments
    Interface { class: SymbolId, args: Vec<TypeId> },
    /// Reference to a type variable
    Variable(SymbolId),
    Function(FunctionType),
    /// Function type alias instantiated with type arguments
    Alias { alias: SymbolId, args: Vec<TypeId> },
}

/// Signature of a method, constructor or function literal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FunctionType {
    pub params: Vec<TypeId>,
    pub optional: Vec<TypeId>,
    pub named: Vec<(String, TypeId)>,
    pub return_type: TypeId,
}

impl Default for TypeId {
    fn default() -> Self {
        TypeId::DYNAMIC
    }
}

/// Interning store for all types of a program
#[derive(Debug, Clone)]
pub struct TypeStore {
    types: Vec<Type>,
    type_to_id: FxHashMap<Type, TypeId>,
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeStore {
    pub fn new() -> Self {
        let mut store = TypeStore {
            types: Vec::new(),
            type_to_id: FxHashMap::default(),
        };
        store.intern(Type::Dynamic);
        store.intern(Type::Void);
        store
    }

    /// Intern a type, returning its TypeId
    pub fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(&id) = self.type_to_id.get(&ty) {
            return id;
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty.clone());
        self.type_to_id.insert(ty, id);
        id
    }

    /// Get a type by its TypeId; ids always come from this store
    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn interface(&mut self, class: SymbolId, args: Vec<TypeId>) -> TypeId {
        self.intern(Type::Interface { class, args })
    }

    pub fn variable(&mut self, symbol: SymbolId) -> TypeId {
        self.intern(Type::Variable(symbol))
    }

    pub fn function(&mut self, function: FunctionType) -> TypeId {
        self.intern(Type::Function(function))
    }

    pub fn alias(&mut self, alias: SymbolId, args: Vec<TypeId>) -> TypeId {
        self.intern(Type::Alias { alias, args })
    }

    pub fn as_interface(&self, id: TypeId) -> Option<(SymbolId, &[TypeId])> {
        match self.get(id) {
            Type::Interface { class, args } => Some((*class, args.as_slice())),
            _ => None,
        }
    }

    /// Class symbol of an interface type
    pub fn class_of(&self, id: TypeId) -> Option<SymbolId> {
        self.as_interface(id).map(|(class, _)| class)
    }

    pub fn as_function(&self, id: TypeId) -> Option<&FunctionType> {
        match self.get(id) {
            Type::Function(function) => Some(function),
            _ => None,
        }
    }

    /// First type variable mentioned anywhere in `id`
    pub fn find_type_variable(&self, id: TypeId) -> Option<SymbolId> {
        match self.get(id) {
            Type::Variable(symbol) => Some(*symbol),
            Type::Interface { args, .. } | Type::Alias { args, .. } => {
                args.iter().find_map(|&arg| self.find_type_variable(arg))
            }
            Type::Function(function) => function
                .params
                .iter()
                .chain(&function.optional)
                .chain(function.named.iter().map(|(_, ty)| ty))
                .chain(std::iter::once(&function.return_type))
                .find_map(|&ty| self.find_type_variable(ty)),
            Type::Dynamic | Type::Void => None,
        }
    }

    /// Replace each of `params` with the matching entry of `args`
    ///
    /// With no `args` the type is raw and every parameter becomes Dynamic.
    pub fn substitute(&mut self, id: TypeId, args: &[TypeId], params: &[TypeId]) -> TypeId {
        if params.is_empty() {
            return id;
        }
        match self.get(id).clone() {
            Type::Variable(_) => match params.iter().position(|&p| p == id) {
                Some(index) => args.get(index).copied().unwrap_or(TypeId::DYNAMIC),
                None => id,
            },
            Type::Interface { class, args: own } => {
                let own = own.iter().map(|&a| self.substitute(a, args, params)).collect();
                self.interface(class, own)
            }
            Type::Alias { alias, args: own } => {
                let own = own.iter().map(|&a| self.substitute(a, args, params)).collect();
                self.alias(alias, own)
            }
            Type::Function(function) => {
                let substituted = FunctionType {
                    params: function.params.iter().map(|&t| self.substitute(t, args, params)).collect(),
                    optional: function.optional.iter().map(|&t| self.substitute(t, args, params)).collect(),
                    named: function
                        .named
                        .iter()
                        .map(|(name, t)| (name.clone(), self.substitute(*t, args, params)))
                        .collect(),
                    return_type: self.substitute(function.return_type, args, params),
                };
                self.function(substituted)
            }
            Type::Dynamic | Type::Void => id,
        }
    }

    /// Render a type the way it would be written in source
    pub fn display(&self, id: TypeId, symbols: &SymbolTable) -> String {
        match self.get(id) {
            Type::Dynamic => "Dynamic".to_string(),
            Type::Void => "void".to_string(),
            Type::Variable(symbol) => symbols.name(*symbol).to_string(),
            Type::Interface { class: name, args } | Type::Alias { alias: name, args } => {
                let mut out = symbols.name(*name).to_string();
                if !args.is_empty() {
                    let args: Vec<String> = args.iter().map(|&a| self.display(a, symbols)).collect();
                    out.push('<');
                    out.push_str(&args.join(", "));
                    out.push('>');
                }
                out
            }
            Type::Function(function) => {
                let mut parts: Vec<String> = function.params.iter().map(|&p| self.display(p, symbols)).collect();
                if !function.optional.is_empty() {
                    let optional: Vec<String> = function.optional.iter().map(|&p| self.display(p, symbols)).collect();
                    parts.push(format!("[{}]", optional.join(", ")));
                }
                if !function.named.is_empty() {
                    let named: Vec<String> = function
                        .named
                        .iter()
                        .map(|(name, t)| format!("{}: {}", name, self.display(*t, symbols)))
                        .collect();
                    parts.push(format!("{{{}}}", named.join(", ")));
                }
                format!("({}) -> {}", parts.join(", "), self.display(function.return_type, symbols))
            }
        }
    }
}

/// A core class and its declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreType {
    pub class: SymbolId,
    pub ty: TypeId,
}

/// Types the resolver needs from the core library
#[derive(Debug, Clone, Copy)]
pub struct CoreTypes {
    pub object: CoreType,
    pub num: CoreType,
    pub int: CoreType,
    pub double: CoreType,
    pub bool: CoreType,
    pub string: CoreType,
    pub function: CoreType,
    pub list: CoreType,
    pub map: CoreType,
    pub iterator: CoreType,
}

impl CoreTypes {
    /// Look each core type up by name in the core library's scope
    pub fn lookup(symbols: &SymbolTable, scopes: &ScopeTable, core_scope: crate::scope::ScopeId) -> ResolveResult<Self> {
        let find = |name: &str| -> ResolveResult<CoreType> {
            match scopes.local(core_scope, name) {
                Some(class) if symbols.kind(class) == SymbolKind::Class => Ok(CoreType {
                    class,
                    ty: symbols.get(class).ty(),
                }),
                _ => Err(InternalError::MissingCoreType { name: name.to_string() }),
            }
        };
        Ok(CoreTypes {
            object: find("Object")?,
            num: find("num")?,
            int: find("int")?,
            double: find("double")?,
            bool: find("bool")?,
            string: find("String")?,
            function: find("Function")?,
            list: find("List")?,
            map: find("Map")?,
            iterator: find("Iterator")?,
        })
    }

    pub fn is_numeric(&self, ty: TypeId) -> bool {
        ty == self.num.ty || ty == self.int.ty || ty == self.double.ty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{ClassSymbol, Symbol, SymbolData, TypeVariableSymbol};

    fn class_with_params(symbols: &mut SymbolTable, types: &mut TypeStore, name: &str, params: &[&str]) -> (SymbolId, Vec<TypeId>) {
        let class = symbols.add(Symbol::new(name, SymbolData::Class(ClassSymbol::new(SymbolId::NONE, false))));
        let mut vars = Vec::new();
        for param in params {
            let tv = symbols.add(Symbol::new(*param, SymbolData::TypeVariable(TypeVariableSymbol::default())));
            vars.push(types.variable(tv));
        }
        (class, vars)
    }

    #[test]
    fn test_interning_shares_ids() {
        let mut symbols = SymbolTable::new();
        let mut types = TypeStore::new();
        let (a, _) = class_with_params(&mut symbols, &mut types, "A", &[]);
        let first = types.interface(a, vec![]);
        let second = types.interface(a, vec![]);
        assert_eq!(first, second);
        assert_eq!(types.get(TypeId::DYNAMIC), &Type::Dynamic);
        assert_eq!(types.get(TypeId::VOID), &Type::Void);
    }

    #[test]
    fn test_substitute_and_display() {
        let mut symbols = SymbolTable::new();
        let mut types = TypeStore::new();
        let (map, params) = class_with_params(&mut symbols, &mut types, "Map", &["K", "V"]);
        let (string, _) = class_with_params(&mut symbols, &mut types, "String", &[]);
        let (list, _) = class_with_params(&mut symbols, &mut types, "List", &[]);
        let string_ty = types.interface(string, vec![]);

        // List<V> with V := String
        let list_of_v = types.interface(list, vec![params[1]]);
        let substituted = types.substitute(list_of_v, &[string_ty, string_ty], &params);
        assert_eq!(types.display(substituted, &symbols), "List<String>");

        // raw substitution maps every parameter to Dynamic
        let raw = types.substitute(list_of_v, &[], &params);
        assert_eq!(types.display(raw, &symbols), "List<Dynamic>");

        let map_ty = types.interface(map, params.clone());
        assert_eq!(types.display(map_ty, &symbols), "Map<K, V>");
        assert_eq!(types.find_type_variable(map_ty).map(|s| symbols.name(s).to_string()), Some("K".to_string()));
    }

    #[test]
    fn test_function_display() {
        let mut symbols = SymbolTable::new();
        let mut types = TypeStore::new();
        let (int, _) = class_with_params(&mut symbols, &mut types, "int", &[]);
        let int_ty = types.interface(int, vec![]);
        let function = types.function(FunctionType {
            params: vec![int_ty],
            optional: vec![],
            named: vec![("flag".to_string(), TypeId::DYNAMIC)],
            return_type: TypeId::VOID,
        });
        assert_eq!(types.display(function, &symbols), "(int, {flag: Dynamic}) -> void");
    }
}
