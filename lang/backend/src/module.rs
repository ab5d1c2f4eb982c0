use quill_lang_ast::HashMap;

use crate::result::BackendError;

/// What kind of generated object a symbol is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Function,
    Global,
}

/// A reference from one generated symbol to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Symbol(String),
    /// An inert stand-in left behind when the referenced symbol was
    /// removed: an undefined value for globals, an empty function for
    /// calls.
    Placeholder(SymbolKind),
}

/// One generated code object.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Internal linkage; initialization helpers and module initializers.
    pub internal: bool,
    /// Outgoing references to other symbols.
    pub refs: Vec<Reference>,
}

/// The generated-code module of a session: every emitted symbol,
/// addressable by mangled name.
#[derive(Debug, Default)]
pub struct CodeModule {
    symbols: HashMap<String, Symbol>,
}

impl CodeModule {
    pub fn define_function(
        &mut self,
        name: &str,
        internal: bool,
        refs: Vec<String>,
    ) -> Result<(), BackendError> {
        self.define(Symbol {
            name: name.to_owned(),
            kind: SymbolKind::Function,
            internal,
            refs: refs.into_iter().map(Reference::Symbol).collect(),
        })
    }

    pub fn define_global(&mut self, name: &str, refs: Vec<String>) -> Result<(), BackendError> {
        self.define(Symbol {
            name: name.to_owned(),
            kind: SymbolKind::Global,
            internal: false,
            refs: refs.into_iter().map(Reference::Symbol).collect(),
        })
    }

    fn define(&mut self, symbol: Symbol) -> Result<(), BackendError> {
        if self.symbols.contains_key(&symbol.name) {
            return Err(BackendError::SymbolRedefined(symbol.name));
        }
        self.symbols.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    /// Append a reference from an already-defined symbol.
    pub fn add_reference(&mut self, from: &str, to: &str) {
        if let Some(symbol) = self.symbols.get_mut(from) {
            symbol.refs.push(Reference::Symbol(to.to_owned()));
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// The names of all symbols that reference `name`, sorted for
    /// deterministic processing order.
    pub fn users_of(&self, name: &str) -> Vec<String> {
        let mut users: Vec<String> = self
            .symbols
            .values()
            .filter(|symbol| {
                symbol.refs.iter().any(|r| matches!(r, Reference::Symbol(n) if n == name))
            })
            .map(|symbol| symbol.name.clone())
            .collect();
        users.sort();
        users
    }

    /// Drop the outgoing references of `name`.
    pub fn drop_references(&mut self, name: &str) {
        if let Some(symbol) = self.symbols.get_mut(name) {
            symbol.refs.clear();
        }
    }

    /// Replace every remaining reference to `name` with an inert
    /// placeholder of its kind, so nothing is left dangling.
    pub fn replace_uses_with_placeholder(&mut self, name: &str) {
        let Some(kind) = self.symbols.get(name).map(|symbol| symbol.kind) else {
            return;
        };
        for symbol in self.symbols.values_mut() {
            for reference in &mut symbol.refs {
                if matches!(reference, Reference::Symbol(n) if n == name) {
                    *reference = Reference::Placeholder(kind);
                }
            }
        }
    }

    pub fn erase(&mut self, name: &str) -> Option<Symbol> {
        self.symbols.remove(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// All symbol names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.symbols.keys().map(String::as_str).collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redefinition_is_an_error() {
        let mut module = CodeModule::default();
        module.define_global("g", vec![]).unwrap();
        assert!(matches!(
            module.define_global("g", vec![]),
            Err(BackendError::SymbolRedefined(_))
        ));
    }

    #[test]
    fn users_are_found_and_replaced() {
        let mut module = CodeModule::default();
        module.define_global("g", vec![]).unwrap();
        module.define_function("f", false, vec!["g".to_owned()]).unwrap();

        assert_eq!(module.users_of("g"), vec!["f".to_owned()]);

        module.replace_uses_with_placeholder("g");
        module.erase("g").unwrap();
        assert_eq!(module.users_of("g"), Vec::<String>::new());
        assert_eq!(module.get("f").unwrap().refs, vec![Reference::Placeholder(SymbolKind::Global)]);
    }

    #[test]
    fn erase_is_a_noop_for_unknown_symbols() {
        let mut module = CodeModule::default();
        assert!(module.erase("missing").is_none());
        assert!(module.is_empty());
    }
}
