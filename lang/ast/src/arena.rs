use std::ops::{Index, IndexMut};

use slotmap::{SlotMap, new_key_type};

use crate::decls::Decl;

new_key_type! {
    /// Stable identifier of a declaration in the arena.
    ///
    /// All cross-links in the graph (redeclaration chains, shadow lists,
    /// specialization sets) are non-owning `DeclId`s and must be
    /// validated before dereferencing.
    pub struct DeclId;
}

/// Arena ownership of every declaration of one session.
#[derive(Debug)]
pub struct DeclArena {
    decls: SlotMap<DeclId, Decl>,
}

impl Default for DeclArena {
    fn default() -> Self {
        DeclArena { decls: SlotMap::with_key() }
    }
}

impl DeclArena {
    /// Allocate a declaration. The closure receives the id under which it
    /// will be stored, so self-referential fields (e.g. the cached chain
    /// head of a fresh declaration) can be initialized in one step.
    pub fn insert_with_key(&mut self, f: impl FnOnce(DeclId) -> Decl) -> DeclId {
        self.decls.insert_with_key(f)
    }

    pub fn get(&self, id: DeclId) -> Option<&Decl> {
        self.decls.get(id)
    }

    pub fn get_mut(&mut self, id: DeclId) -> Option<&mut Decl> {
        self.decls.get_mut(id)
    }

    /// Release a declaration's storage. Returns `None` if the slot was
    /// already released.
    pub fn remove(&mut self, id: DeclId) -> Option<Decl> {
        self.decls.remove(id)
    }

    pub fn contains(&self, id: DeclId) -> bool {
        self.decls.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

impl Index<DeclId> for DeclArena {
    type Output = Decl;

    fn index(&self, id: DeclId) -> &Decl {
        &self.decls[id]
    }
}

impl IndexMut<DeclId> for DeclArena {
    fn index_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id]
    }
}
