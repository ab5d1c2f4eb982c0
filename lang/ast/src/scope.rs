use crate::{HashMap, HashSet};

use crate::arena::DeclId;
use crate::ident::Ident;

/// One active interactive scope.
#[derive(Debug, Default)]
pub struct Scope {
    decls: HashSet<DeclId>,
}

impl Scope {
    pub fn add(&mut self, decl: DeclId) {
        self.decls.insert(decl);
    }

    pub fn remove(&mut self, decl: DeclId) -> bool {
        self.decls.remove(&decl)
    }

    pub fn contains(&self, decl: DeclId) -> bool {
        self.decls.contains(&decl)
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

/// Index of the declarations visible on the scope chain, by name.
///
/// A declaration that was removed from its container must also disappear
/// from here, otherwise identifier resolution would still find it.
#[derive(Debug, Default)]
pub struct IdResolver {
    names: HashMap<Ident, Vec<DeclId>>,
}

impl IdResolver {
    pub fn add(&mut self, name: Ident, decl: DeclId) {
        self.names.entry(name).or_default().push(decl);
    }

    /// Remove `decl` from the entry for `name`, erasing the entry if it
    /// becomes empty. Returns whether anything was removed.
    pub fn remove(&mut self, name: &Ident, decl: DeclId) -> bool {
        let Some(decls) = self.names.get_mut(name) else {
            return false;
        };
        let before = decls.len();
        decls.retain(|d| *d != decl);
        let removed = decls.len() != before;
        if decls.is_empty() {
            self.names.remove(name);
        }
        removed
    }

    pub fn contains(&self, name: &Ident, decl: DeclId) -> bool {
        self.names.get(name).is_some_and(|decls| decls.contains(&decl))
    }

    /// Whether any declaration is still visible under `name`.
    pub fn resolves(&self, name: &Ident) -> bool {
        self.names.contains_key(name)
    }
}
