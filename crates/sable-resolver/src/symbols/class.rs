//! Class symbols and the all-supertypes closure

use super::{SymbolId, SymbolKind, SymbolTable};
use crate::error::CyclicDeclarationError;
use crate::types::{TypeId, TypeStore};
use indexmap::IndexMap;
use sable_syntax::SourceId;

/// Members of a class keyed by normalized name
///
/// Keys are the plain name for fields, methods and accessor fields (a getter
/// and setter of one name share a single field) and `"operator +"` for
/// operators. A key may hold more than one member (unary and binary `-`).
#[derive(Debug, Clone, Default)]
pub struct MemberMap {
    entries: IndexMap<String, Vec<SymbolId>>,
}

impl MemberMap {
    /// First member under `key`
    pub fn get(&self, key: &str) -> Option<SymbolId> {
        self.entries.get(key).and_then(|members| members.first().copied())
    }

    pub fn get_all(&self, key: &str) -> &[SymbolId] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn insert(&mut self, key: impl Into<String>, member: SymbolId) {
        self.entries.entry(key.into()).or_default().push(member);
    }

    /// Drop `member` from `key`, removing the key once empty
    pub fn remove(&mut self, key: &str, member: SymbolId) {
        if let Some(members) = self.entries.get_mut(key) {
            members.retain(|&m| m != member);
            if members.is_empty() {
                self.entries.shift_remove(key);
            }
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Every (key, member) pair in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, SymbolId)> {
        self.entries
            .iter()
            .flat_map(|(key, members)| members.iter().map(move |&m| (key.as_str(), m)))
    }

    pub fn values(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.iter().map(|(_, member)| member)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Memoization state of a class's all-supertypes closure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SupertypeClosure {
    #[default]
    Unvisited,
    InProgress,
    Done(Vec<TypeId>),
}

#[derive(Debug, Clone)]
pub struct ClassSymbol {
    pub library: SymbolId,
    pub is_interface: bool,
    pub type_parameters: Vec<SymbolId>,
    /// `extends` type; None only for the root class and unresolved supertypes
    pub supertype: Option<TypeId>,
    pub superclass: Option<SymbolId>,
    pub interfaces: Vec<TypeId>,
    pub interface_classes: Vec<SymbolId>,
    /// Default implementation class of an interface
    pub default_class: Option<TypeId>,
    pub members: MemberMap,
    pub constructors: Vec<SymbolId>,
    pub source: Option<SourceId>,
    pub closure: SupertypeClosure,
}

impl ClassSymbol {
    pub fn new(library: SymbolId, is_interface: bool) -> Self {
        ClassSymbol {
            library,
            is_interface,
            type_parameters: Vec::new(),
            supertype: None,
            superclass: None,
            interfaces: Vec::new(),
            interface_classes: Vec::new(),
            default_class: None,
            members: MemberMap::default(),
            constructors: Vec::new(),
            source: None,
            closure: SupertypeClosure::Unvisited,
        }
    }

    /// Direct supertypes: the superclass first, then interfaces in order
    pub fn direct_supertypes(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.superclass.into_iter().chain(self.interface_classes.iter().copied())
    }
}

impl SymbolTable {
    /// All supertypes of `class`, transitively, with type arguments substituted
    ///
    /// Order: the superclass, then its closure, then each interface followed
    /// by its closure. When the same class is reached along several paths the
    /// last instantiation wins but the first position is kept. Results are
    /// memoized; a cycle is reported as an error and is not memoized.
    pub fn all_supertypes(&mut self, class: SymbolId, types: &mut TypeStore) -> Result<Vec<TypeId>, CyclicDeclarationError> {
        let (supertype, interfaces) = match self.class(class) {
            None => return Ok(Vec::new()),
            Some(data) => match &data.closure {
                SupertypeClosure::Done(closure) => return Ok(closure.clone()),
                SupertypeClosure::InProgress => return Err(CyclicDeclarationError { class }),
                SupertypeClosure::Unvisited => (data.supertype, data.interfaces.clone()),
            },
        };

        self.set_closure(class, SupertypeClosure::InProgress);
        let result = self.compute_supertypes(supertype, interfaces, types);
        let state = match &result {
            Ok(closure) => SupertypeClosure::Done(closure.clone()),
            Err(_) => SupertypeClosure::Unvisited,
        };
        self.set_closure(class, state);
        result
    }

    fn compute_supertypes(
        &mut self,
        supertype: Option<TypeId>,
        interfaces: Vec<TypeId>,
        types: &mut TypeStore,
    ) -> Result<Vec<TypeId>, CyclicDeclarationError> {
        let mut closure: IndexMap<SymbolId, TypeId> = IndexMap::new();
        for direct in supertype.into_iter().chain(interfaces) {
            let Some((element, args)) = types.as_interface(direct).map(|(c, a)| (c, a.to_vec())) else {
                continue;
            };
            closure.insert(element, direct);
            let params = self.type_parameter_types(element);
            for inherited in self.all_supertypes(element, types)? {
                let substituted = types.substitute(inherited, &args, &params);
                if let Some(owner) = types.class_of(substituted) {
                    closure.insert(owner, substituted);
                }
            }
        }
        Ok(closure.into_values().collect())
    }

    fn set_closure(&mut self, class: SymbolId, state: SupertypeClosure) {
        if let Some(data) = self.class_mut(class) {
            data.closure = state;
        }
    }

    /// Types of the type parameters a class declares
    pub fn type_parameter_types(&self, class: SymbolId) -> Vec<TypeId> {
        match self.class(class) {
            Some(data) => data.type_parameters.iter().map(|&tv| self.ty(tv)).collect(),
            None => Vec::new(),
        }
    }

    /// Whether `sub` is `sup` or has it among its supertypes
    pub fn is_subclass_of(&self, sub: SymbolId, sup: SymbolId) -> bool {
        let mut stack = vec![sub];
        let mut seen = rustc_hash::FxHashSet::default();
        while let Some(class) = stack.pop() {
            if class == sup {
                return true;
            }
            if !seen.insert(class) {
                continue;
            }
            if let Some(data) = self.class(class) {
                stack.extend(data.direct_supertypes());
            }
        }
        false
    }

    /// Member `key` declared by `class` or inherited from its supertypes
    pub fn lookup_member(&self, class: SymbolId, key: &str) -> Option<SymbolId> {
        let mut stack = vec![class];
        let mut seen = rustc_hash::FxHashSet::default();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            let Some(data) = self.class(current) else { continue };
            if let Some(member) = data.members.get(key) {
                if self.kind(member) != SymbolKind::TypeVariable {
                    return Some(member);
                }
            }
            let supers: Vec<SymbolId> = data.direct_supertypes().collect();
            stack.extend(supers.into_iter().rev());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{MethodSymbol, Symbol, SymbolData, TypeVariableSymbol};
    use pretty_assertions::assert_eq;

    struct Fixture {
        symbols: SymbolTable,
        types: TypeStore,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture { symbols: SymbolTable::new(), types: TypeStore::new() }
        }

        fn class(&mut self, name: &str, params: &[&str]) -> SymbolId {
            let class = self.symbols.add(Symbol::new(name, SymbolData::Class(ClassSymbol::new(SymbolId::NONE, false))));
            let mut args = Vec::new();
            for param in params {
                let tv = self.symbols.add(
                    Symbol::new(*param, SymbolData::TypeVariable(TypeVariableSymbol::default())).with_enclosing(class),
                );
                let ty = self.types.variable(tv);
                self.symbols.set_type(tv, ty).unwrap();
                self.symbols.class_mut(class).unwrap().type_parameters.push(tv);
                args.push(ty);
            }
            let ty = self.types.interface(class, args);
            self.symbols.set_type(class, ty).unwrap();
            class
        }

        fn extend(&mut self, class: SymbolId, sup: SymbolId, args: Vec<TypeId>) {
            let ty = self.types.interface(sup, args);
            self.symbols.set_supertype(class, Some(ty), &self.types).unwrap();
        }

        fn implement(&mut self, class: SymbolId, sup: SymbolId, args: Vec<TypeId>) {
            let ty = self.types.interface(sup, args);
            self.symbols.add_interface(class, ty, &self.types).unwrap();
        }

        fn closure(&mut self, class: SymbolId) -> Result<Vec<String>, CyclicDeclarationError> {
            let closure = self.symbols.all_supertypes(class, &mut self.types)?;
            Ok(closure.iter().map(|&t| self.types.display(t, &self.symbols)).collect())
        }
    }

    #[test]
    fn test_closure_order_and_substitution() {
        let mut fx = Fixture::new();
        let object = fx.class("Object", &[]);
        let iterable = fx.class("Iterable", &["E"]);
        let list = fx.class("List", &["T"]);
        let string = fx.class("String", &[]);
        let names = fx.class("Names", &[]);

        fx.extend(iterable, object, vec![]);
        let t = fx.symbols.ty(fx.symbols.class(list).unwrap().type_parameters[0]);
        fx.extend(list, object, vec![]);
        fx.implement(list, iterable, vec![t]);
        let string_ty = fx.symbols.ty(string);
        fx.extend(names, object, vec![]);
        fx.implement(names, list, vec![string_ty]);

        assert_eq!(
            fx.closure(names).unwrap(),
            vec!["Object".to_string(), "List<String>".to_string(), "Iterable<String>".to_string()]
        );
        let memoized = fx.symbols.all_supertypes(names, &mut fx.types).unwrap();
        assert_eq!(fx.symbols.class(names).unwrap().closure, SupertypeClosure::Done(memoized));
    }

    #[test]
    fn test_cycle_is_reported_and_not_memoized() {
        let mut fx = Fixture::new();
        let a = fx.class("A", &[]);
        let b = fx.class("B", &[]);
        fx.extend(a, b, vec![]);
        fx.extend(b, a, vec![]);

        assert_eq!(fx.closure(a), Err(CyclicDeclarationError { class: a }));
        assert_eq!(fx.symbols.class(a).unwrap().closure, SupertypeClosure::Unvisited);
        assert_eq!(fx.symbols.class(b).unwrap().closure, SupertypeClosure::Unvisited);
        assert_eq!(fx.closure(b), Err(CyclicDeclarationError { class: b }));
    }

    #[test]
    fn test_class_depending_on_cycle_fails_with_cycle_member() {
        let mut fx = Fixture::new();
        let a = fx.class("A", &[]);
        let b = fx.class("B", &[]);
        let c = fx.class("C", &[]);
        fx.extend(a, b, vec![]);
        fx.extend(b, a, vec![]);
        fx.extend(c, a, vec![]);
        assert_eq!(fx.closure(c), Err(CyclicDeclarationError { class: a }));
    }

    #[test]
    fn test_lookup_member_prefers_superclass_over_interfaces() {
        let mut fx = Fixture::new();
        let base = fx.class("Base", &[]);
        let iface = fx.class("Iface", &[]);
        let sub = fx.class("Sub", &[]);
        fx.extend(sub, base, vec![]);
        fx.implement(sub, iface, vec![]);
        let from_base = fx.symbols.add(Symbol::new("run", SymbolData::Method(MethodSymbol::default())).with_enclosing(base));
        let from_iface = fx.symbols.add(Symbol::new("run", SymbolData::Method(MethodSymbol::default())).with_enclosing(iface));
        fx.symbols.class_mut(base).unwrap().members.insert("run", from_base);
        fx.symbols.class_mut(iface).unwrap().members.insert("run", from_iface);

        assert_eq!(fx.symbols.lookup_member(sub, "run"), Some(from_base));
        assert!(fx.symbols.is_subclass_of(sub, iface));
        assert!(!fx.symbols.is_subclass_of(base, sub));
    }

    #[test]
    fn test_member_map_shared_keys() {
        let mut members = MemberMap::default();
        members.insert("operator -", SymbolId(10));
        members.insert("operator -", SymbolId(11));
        members.insert("x", SymbolId(12));
        assert_eq!(members.get("operator -"), Some(SymbolId(10)));
        assert_eq!(members.get_all("operator -"), &[SymbolId(10), SymbolId(11)]);
        assert_eq!(members.len(), 3);
        members.remove("x", SymbolId(12));
        assert!(!members.contains_key("x"));
    }
}
