use crate::arena::{DeclArena, DeclId};
use crate::decls::{Decl, DeclKind, SpecializationLink, TemplateArgs, VarData};
use crate::ident::Ident;
use crate::scope::{IdResolver, Scope};
use crate::source::Loc;

/// The declaration graph of one compiler session, together with the
/// scope-chain bookkeeping that identifier resolution depends on.
///
/// The graph is rooted in a translation-unit container. Everything else
/// hangs off it through child lists; cross-links (chains, shadows,
/// specializations) are non-owning ids.
pub struct DeclGraph {
    pub arena: DeclArena,
    pub root: DeclId,
    scopes: Vec<Scope>,
    id_resolver: IdResolver,
}

impl Default for DeclGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclGraph {
    pub fn new() -> Self {
        let mut arena = DeclArena::default();
        let root = arena.insert_with_key(|key| Decl {
            name: None,
            loc: Loc::builtin(),
            lexical_parent: None,
            semantic_parent: None,
            previous: None,
            most_recent: key,
            kind: DeclKind::TranslationUnit(Default::default()),
        });
        DeclGraph { arena, root, scopes: vec![Scope::default()], id_resolver: IdResolver::default() }
    }

    // Introducing declarations
    //
    //

    /// Declare a new entity inside `parent`, registering it in the child
    /// list, the lookup table, the current scope, and the identifier
    /// resolver.
    pub fn declare(
        &mut self,
        parent: DeclId,
        name: Option<Ident>,
        loc: Loc,
        kind: DeclKind,
    ) -> DeclId {
        self.declare_out_of_line(parent, parent, name, loc, kind)
    }

    /// Declare with distinct lexical and semantic containers, as for
    /// out-of-line member definitions: the child list entry goes to the
    /// lexical parent, the lookup entry to the semantic one.
    pub fn declare_out_of_line(
        &mut self,
        lexical: DeclId,
        semantic: DeclId,
        name: Option<Ident>,
        loc: Loc,
        kind: DeclKind,
    ) -> DeclId {
        let id = self.alloc(Some(lexical), Some(semantic), name.clone(), loc, kind);
        debug_assert!(
            self.arena[lexical].is_container(),
            "lexical parent must be a container"
        );
        if let Some(container) = self.arena.get_mut(lexical).and_then(|d| d.container_mut()) {
            container.children.push(id);
        }
        if let Some(name) = name {
            if let Some(container) = self.arena.get_mut(semantic).and_then(|d| d.container_mut()) {
                container.lookup.add(name.clone(), id);
            }
            self.scope_register(name, id);
        }
        id
    }

    /// Allocate a declaration that is not attached to any child list or
    /// lookup table, e.g. the templated pattern owned by a template
    /// declaration.
    pub fn declare_detached(
        &mut self,
        lexical: DeclId,
        semantic: DeclId,
        name: Option<Ident>,
        loc: Loc,
        kind: DeclKind,
    ) -> DeclId {
        self.alloc(Some(lexical), Some(semantic), name, loc, kind)
    }

    /// Declare a local of a function body. Locals are reachable only
    /// through the function, never through lookup tables.
    pub fn declare_local(
        &mut self,
        func: DeclId,
        name: Option<Ident>,
        loc: Loc,
        var: VarData,
    ) -> DeclId {
        let id = self.alloc(Some(func), Some(func), name, loc, DeclKind::Var(var));
        match &mut self.arena[func].kind {
            DeclKind::Function(f) | DeclKind::Constructor(f) => f.body_locals.push(id),
            _ => debug_assert!(false, "locals belong to function bodies"),
        }
        id
    }

    /// Introduce a redeclaration of an existing entity: the new node
    /// becomes the chain head and takes over the lookup entry.
    pub fn redeclare(&mut self, prev: DeclId, loc: Loc, kind: DeclKind) -> DeclId {
        let old_head = self.most_recent(prev);
        let (name, lexical, semantic) = {
            let p = &self.arena[prev];
            (p.name.clone(), p.lexical_parent, p.semantic_parent)
        };
        let id = self.arena.insert_with_key(|key| Decl {
            name: name.clone(),
            loc,
            lexical_parent: lexical,
            semantic_parent: semantic,
            previous: Some(old_head),
            most_recent: key,
            kind,
        });
        self.recache_chain_head(old_head, id);
        if let Some(lexical) = lexical {
            if let Some(container) = self.arena.get_mut(lexical).and_then(|d| d.container_mut()) {
                container.children.push(id);
            }
        }
        if let Some(name) = name {
            if let Some(semantic) = semantic {
                if let Some(container) =
                    self.arena.get_mut(semantic).and_then(|d| d.container_mut())
                {
                    if !container.lookup.retarget(&name, old_head, id) {
                        container.lookup.add(name.clone(), id);
                    }
                }
            }
            self.scope_register(name, id);
        }
        id
    }

    /// Attach the implicit self-reference companion of a record: a child
    /// of the record, chain-linked to it as the newer member.
    pub fn declare_injected_self_ref(&mut self, record: DeclId, loc: Loc) -> DeclId {
        let name = self.arena[record].name.clone();
        let old_head = self.most_recent(record);
        let id = self.arena.insert_with_key(|key| Decl {
            name: name.clone(),
            loc,
            lexical_parent: Some(record),
            semantic_parent: Some(record),
            previous: Some(old_head),
            most_recent: key,
            kind: DeclKind::Record(crate::decls::RecordData {
                container: Default::default(),
                injected_self_ref: true,
            }),
        });
        self.recache_chain_head(old_head, id);
        if let Some(container) = self.arena.get_mut(record).and_then(|d| d.container_mut()) {
            container.children.push(id);
            if let Some(name) = name {
                container.lookup.add(name, id);
            }
        }
        id
    }

    fn alloc(
        &mut self,
        lexical: Option<DeclId>,
        semantic: Option<DeclId>,
        name: Option<Ident>,
        loc: Loc,
        kind: DeclKind,
    ) -> DeclId {
        self.arena.insert_with_key(|key| Decl {
            name,
            loc,
            lexical_parent: lexical,
            semantic_parent: semantic,
            previous: None,
            most_recent: key,
            kind,
        })
    }

    fn recache_chain_head(&mut self, old_head: DeclId, new_head: DeclId) {
        let mut cur = Some(old_head);
        while let Some(id) = cur {
            let Some(decl) = self.arena.get_mut(id) else { break };
            decl.most_recent = new_head;
            cur = decl.previous;
        }
    }

    // Redeclaration chains
    //
    //

    /// The chain head, read from the cache.
    pub fn most_recent(&self, id: DeclId) -> DeclId {
        self.arena[id].most_recent
    }

    /// The first-declared chain member.
    pub fn canonical(&self, id: DeclId) -> DeclId {
        let mut cur = id;
        while let Some(prev) = self.arena[cur].previous {
            cur = prev;
        }
        cur
    }

    pub fn is_canonical(&self, id: DeclId) -> bool {
        self.arena[id].previous.is_none()
    }

    /// All chain members, newest first.
    pub fn chain_members(&self, id: DeclId) -> Vec<DeclId> {
        let mut members = Vec::new();
        let mut cur = Some(self.most_recent(id));
        while let Some(id) = cur {
            members.push(id);
            cur = self.arena.get(id).and_then(|d| d.previous);
        }
        members
    }

    // Containers and lookup
    //
    //

    /// Remove a declaration from its lexical container's child list.
    pub fn detach_from_parent(&mut self, id: DeclId) {
        let Some(parent) = self.arena.get(id).and_then(|d| d.lexical_parent) else {
            return;
        };
        if let Some(container) = self.arena.get_mut(parent).and_then(|d| d.container_mut()) {
            container.children.retain(|child| *child != id);
        }
    }

    pub fn children(&self, container: DeclId) -> &[DeclId] {
        self.arena
            .get(container)
            .and_then(|d| d.container())
            .map(|c| c.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn lookup_in(&self, container: DeclId, name: &Ident) -> &[DeclId] {
        self.arena
            .get(container)
            .and_then(|d| d.container())
            .map(|c| c.lookup.lookup(name))
            .unwrap_or(&[])
    }

    pub fn resolve_in(&self, container: DeclId, name: &Ident) -> Option<DeclId> {
        self.lookup_in(container, name).first().copied()
    }

    // Templates
    //
    //

    /// Register a function-template specialization. Only the canonical
    /// declaration ends up in the template's specialization set.
    pub fn register_function_specialization(
        &mut self,
        template: DeclId,
        args: TemplateArgs,
        spec: DeclId,
    ) {
        debug_assert!(self.is_canonical(spec), "only canonical declarations are registered");
        if let DeclKind::Function(f) = &mut self.arena[spec].kind {
            f.specialization = Some(SpecializationLink { template, args: args.clone() });
        }
        if let Some(set) = self.arena[template].specializations_mut() {
            set.insert(args, spec);
        }
    }

    /// Register a class-template specialization under its own argument
    /// list, keyed canonically.
    pub fn register_class_specialization(&mut self, template: DeclId, spec: DeclId) {
        let canonical = self.canonical(spec);
        let args = match &self.arena[spec].kind {
            DeclKind::ClassTemplateSpecialization(s) => s.args.clone(),
            _ => {
                debug_assert!(false, "not a class template specialization");
                return;
            }
        };
        if let Some(set) = self.arena[template].specializations_mut() {
            set.insert(args, canonical);
        }
    }

    /// Record that `shadow` was introduced by `using_decl`.
    pub fn register_shadow(&mut self, using_decl: DeclId, shadow: DeclId) {
        if let DeclKind::Using(u) = &mut self.arena[using_decl].kind {
            u.shadows.push(shadow);
        } else {
            debug_assert!(false, "shadows belong to using-declarations");
        }
    }

    // Scope chain
    //
    //

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
        debug_assert!(!self.scopes.is_empty(), "popped the outermost scope");
    }

    fn scope_register(&mut self, name: Ident, id: DeclId) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.add(id);
        }
        self.id_resolver.add(name, id);
    }

    /// Remove a declaration from every active scope.
    pub fn scopes_remove(&mut self, id: DeclId) {
        for scope in &mut self.scopes {
            scope.remove(id);
        }
    }

    pub fn in_any_scope(&self, id: DeclId) -> bool {
        self.scopes.iter().any(|scope| scope.contains(id))
    }

    /// Whether identifier resolution still reaches this declaration.
    pub fn on_scope_chain(&self, id: DeclId) -> bool {
        let Some(decl) = self.arena.get(id) else {
            return false;
        };
        let Some(name) = &decl.name else {
            return false;
        };
        self.id_resolver.contains(name, id)
    }

    pub fn id_resolver(&self) -> &IdResolver {
        &self.id_resolver
    }

    pub fn id_resolver_remove(&mut self, name: &Ident, id: DeclId) -> bool {
        self.id_resolver.remove(name, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decls::{ContainerData, FunctionData};
    use crate::source::FileId;

    fn loc(offset: u32) -> Loc {
        Loc::new(FileId(0), offset)
    }

    fn name(s: &str) -> Ident {
        Ident::from_string(s)
    }

    #[test]
    fn redeclare_keeps_the_chain_head_cached() {
        let mut graph = DeclGraph::new();
        let root = graph.root;
        let d1 = graph.declare(
            root,
            Some(name("f")),
            loc(0),
            DeclKind::Function(FunctionData::default()),
        );
        let d2 = graph.redeclare(d1, loc(10), DeclKind::Function(FunctionData::default()));
        let d3 = graph.redeclare(d1, loc(20), DeclKind::Function(FunctionData::default()));

        assert_eq!(graph.most_recent(d1), d3);
        assert_eq!(graph.most_recent(d2), d3);
        assert_eq!(graph.canonical(d3), d1);
        assert_eq!(graph.chain_members(d1), vec![d3, d2, d1]);
        // the lookup entry follows the chain head
        assert_eq!(graph.resolve_in(root, &name("f")), Some(d3));
    }

    #[test]
    fn out_of_line_declarations_split_their_parents() {
        let mut graph = DeclGraph::new();
        let root = graph.root;
        let ns = graph.declare(
            root,
            Some(name("outer")),
            loc(0),
            DeclKind::Namespace(ContainerData::default()),
        );
        let f = graph.declare_out_of_line(
            root,
            ns,
            Some(name("f")),
            loc(5),
            DeclKind::Function(FunctionData::default()),
        );
        assert!(graph.children(root).contains(&f));
        assert!(!graph.children(ns).contains(&f));
        assert_eq!(graph.resolve_in(ns, &name("f")), Some(f));
        assert_eq!(graph.resolve_in(root, &name("f")), None);
    }

    #[test]
    fn injected_self_ref_joins_the_chain() {
        let mut graph = DeclGraph::new();
        let root = graph.root;
        let record = graph.declare(
            root,
            Some(name("C")),
            loc(0),
            DeclKind::Record(Default::default()),
        );
        let injected = graph.declare_injected_self_ref(record, loc(1));
        assert!(graph.arena[injected].is_injected_self_ref());
        assert_eq!(graph.most_recent(record), injected);
        assert_eq!(graph.arena[injected].previous, Some(record));
        assert!(graph.children(record).contains(&injected));
    }
}
