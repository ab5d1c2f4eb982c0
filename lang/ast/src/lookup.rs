use crate::HashMap;
use crate::arena::DeclId;
use crate::ident::Ident;

/// The name lookup table of one container.
///
/// Maps a name to the declarations visible under it. The first entry of a
/// list is what legacy single-result lookup returns, so it is kept
/// pointing at the most recent redeclaration of the entity.
#[derive(Debug, Clone, Default)]
pub struct LookupTable {
    map: HashMap<Ident, Vec<DeclId>>,
}

impl LookupTable {
    pub fn add(&mut self, name: Ident, decl: DeclId) {
        self.map.entry(name).or_default().push(decl);
    }

    /// Remove every occurrence of `decl` under `name`, erasing the entry
    /// if it becomes empty. Returns whether anything was removed.
    pub fn remove(&mut self, name: &Ident, decl: DeclId) -> bool {
        let Some(decls) = self.map.get_mut(name) else {
            return false;
        };
        let before = decls.len();
        decls.retain(|d| *d != decl);
        let removed = decls.len() != before;
        if decls.is_empty() {
            self.map.remove(name);
        }
        removed
    }

    /// Replace the occurrence of `old` under `name` with `new`, unless
    /// `new` is already present in the entry.
    pub fn retarget(&mut self, name: &Ident, old: DeclId, new: DeclId) -> bool {
        let Some(decls) = self.map.get_mut(name) else {
            return false;
        };
        if decls.contains(&new) {
            return false;
        }
        match decls.iter().position(|d| *d == old) {
            Some(idx) => {
                decls[idx] = new;
                true
            }
            None => false,
        }
    }

    pub fn lookup(&self, name: &Ident) -> &[DeclId] {
        self.map.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Legacy single-result lookup: the first entry is the canonical one.
    pub fn resolve(&self, name: &Ident) -> Option<DeclId> {
        self.lookup(name).first().copied()
    }

    pub fn contains(&self, name: &Ident, decl: DeclId) -> bool {
        self.lookup(name).contains(&decl)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &Ident> {
        self.map.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::DeclArena;
    use crate::decls::{Decl, DeclKind};
    use crate::source::Loc;

    fn ids(n: usize) -> Vec<DeclId> {
        // Lookup tables only compare ids, so any arena-made ids will do.
        let mut arena = DeclArena::default();
        (0..n)
            .map(|_| {
                arena.insert_with_key(|key| Decl {
                    name: None,
                    loc: Loc::builtin(),
                    lexical_parent: None,
                    semantic_parent: None,
                    previous: None,
                    most_recent: key,
                    kind: DeclKind::Other,
                })
            })
            .collect()
    }

    #[test]
    fn remove_erases_empty_entries() {
        let decls = ids(1);
        let name = Ident::from_string("x");
        let mut table = LookupTable::default();
        table.add(name.clone(), decls[0]);
        assert!(table.remove(&name, decls[0]));
        assert!(table.is_empty());
        assert!(!table.remove(&name, decls[0]));
    }

    #[test]
    fn retarget_replaces_unless_present() {
        let decls = ids(3);
        let name = Ident::from_string("f");
        let mut table = LookupTable::default();
        table.add(name.clone(), decls[0]);
        assert!(table.retarget(&name, decls[0], decls[1]));
        assert_eq!(table.resolve(&name), Some(decls[1]));
        // the successor is already in the entry: nothing to do
        table.add(name.clone(), decls[2]);
        assert!(!table.retarget(&name, decls[2], decls[1]));
        assert_eq!(table.lookup(&name), &[decls[1], decls[2]]);
    }
}
