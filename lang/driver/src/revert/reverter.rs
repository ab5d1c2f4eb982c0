use quill_lang_ast::{DeclId, DeclKind, DeclTag, FileId, HashSet, Loc};

use crate::session::Session;
use crate::transaction::MacroEvent;

/// Does the actual work of removing a declaration and resetting the
/// session's internal structures.
///
/// Each `revert_*` method implements the removal protocol of one
/// declaration variant by composing the protocols of the structural
/// capabilities it has (named, container, redeclarable, templated).
/// Generated-symbol removal always runs before chain and lookup repair,
/// because mangled-name computation may still need the links about to be
/// severed.
pub(crate) struct DeclReverter<'a> {
    pub(super) sess: &'a mut Session,
    /// First buffer the transaction introduced; earlier files are never
    /// uncached.
    pub(super) buffer_origin: FileId,
    /// Whether the transaction was committed with generated code.
    pub(super) codegen_active: bool,
    /// Files the reverted declarations came from. Their cached content is
    /// dropped once the revert completes, so an edited and re-submitted
    /// file is re-read instead of served stale.
    files_to_uncache: HashSet<FileId>,
}

impl<'a> DeclReverter<'a> {
    pub(crate) fn new(sess: &'a mut Session, buffer_origin: FileId, codegen_active: bool) -> Self {
        DeclReverter { sess, buffer_origin, codegen_active, files_to_uncache: HashSet::default() }
    }

    /// The files whose caches must be invalidated, in id order.
    pub(crate) fn finish(self) -> Vec<FileId> {
        let mut files: Vec<FileId> = self.files_to_uncache.into_iter().collect();
        files.sort();
        files
    }

    fn collect_file_to_uncache(&mut self, loc: Loc) {
        if loc.file >= self.buffer_origin {
            self.files_to_uncache.insert(loc.file);
        }
    }

    /// Revert a single declaration, dispatching on its kind.
    pub(crate) fn revert_decl(&mut self, id: DeclId) -> bool {
        let Some(tag) = self.sess.graph.arena.get(id).map(|d| d.kind.tag()) else {
            log::debug!("Skipping revert of unknown declaration");
            return false;
        };
        log::trace!("Reverting {tag:?} declaration");
        match tag {
            DeclTag::TranslationUnit => {
                debug_assert!(false, "cannot revert the translation unit");
                false
            }
            DeclTag::Other => {
                let success = self.revert_plain(id);
                self.release(id);
                success
            }
            DeclTag::Typedef => self.revert_typedef(id),
            DeclTag::Using => self.revert_using(id),
            DeclTag::UsingShadow => self.revert_using_shadow(id),
            DeclTag::Var => self.revert_var(id),
            DeclTag::Function => self.revert_function(id),
            DeclTag::Constructor => self.revert_constructor(id),
            DeclTag::Namespace | DeclTag::Tag => self.revert_container_decl(id),
            DeclTag::Record => self.revert_record(id),
            DeclTag::FunctionTemplate | DeclTag::ClassTemplate => self.revert_template_decl(id),
            DeclTag::ClassTemplateSpecialization => self.revert_class_specialization(id),
        }
    }

    // Structural capabilities
    //
    //

    /// Remove the declaration from its lexical container only.
    fn revert_plain(&mut self, id: DeclId) -> bool {
        let loc = self.sess.graph.arena[id].loc;
        self.collect_file_to_uncache(loc);
        self.sess.graph.detach_from_parent(id);
        true
    }

    /// Remove the declaration from the lookup chains and from its
    /// container. Anonymous declarations participate in no lookup table.
    fn revert_named(&mut self, id: DeclId) -> bool {
        let success = self.revert_plain(id);
        let (name, semantic) = {
            let decl = &self.sess.graph.arena[id];
            (decl.name.clone(), decl.semantic_parent)
        };
        let Some(name) = name else {
            return success;
        };

        if success {
            self.sess.graph.scopes_remove(id);
            if self.sess.graph.on_scope_chain(id) {
                self.sess.graph.id_resolver_remove(&name, id);
            }
        }

        if let Some(semantic) = semantic {
            if let Some(container) =
                self.sess.graph.arena.get_mut(semantic).and_then(|d| d.container_mut())
            {
                container.lookup.remove(&name, id);
                debug_assert!(
                    !container.lookup.contains(&name, id),
                    "lookup entry still exists"
                );
            }
        }
        success
    }

    /// Release the node's arena storage. Last step of every protocol.
    fn release(&mut self, id: DeclId) {
        let removed = self.sess.graph.arena.remove(id);
        debug_assert!(removed.is_some(), "released a declaration twice");
    }

    /// Revert the children of a container. The snapshot is taken first:
    /// removal invalidates live iteration over the child list.
    fn revert_children(&mut self, id: DeclId) -> bool {
        let snapshot: Vec<DeclId> = self.sess.graph.children(id).to_vec();
        let mut success = true;
        for child in snapshot {
            success = self.revert_decl(child) && success;
        }
        success
    }

    // Per-kind protocols
    //
    //

    fn revert_using(&mut self, id: DeclId) -> bool {
        let success = self.revert_named(id);
        self.release(id);
        success
    }

    fn revert_using_shadow(&mut self, id: DeclId) -> bool {
        let success = self.revert_named(id);
        // unregister from the using-declaration it shadows
        let using_decl = match &self.sess.graph.arena[id].kind {
            DeclKind::UsingShadow(u) => Some(u.using_decl),
            _ => None,
        };
        if let Some(using) = using_decl.and_then(|u| self.sess.graph.arena.get_mut(u)) {
            if let DeclKind::Using(u) = &mut using.kind {
                u.shadows.retain(|shadow| *shadow != id);
            }
        }
        self.release(id);
        success
    }

    fn revert_typedef(&mut self, id: DeclId) -> bool {
        let semantic = self.sess.graph.arena[id].semantic_parent;
        let mut success = self.repair_chain(id, semantic);
        success &= self.revert_named(id);
        self.release(id);
        success
    }

    fn revert_var(&mut self, id: DeclId) -> bool {
        let (is_parameter, in_templated_context, semantic) = {
            let decl = &self.sess.graph.arena[id];
            let DeclKind::Var(v) = &decl.kind else { return false };
            (v.is_parameter, v.in_templated_context, decl.semantic_parent)
        };
        // The module contains no symbols for parameters or for variables
        // in templated contexts. Symbol removal goes first: it may still
        // need the graph state removed below.
        if !is_parameter && !in_templated_context {
            self.maybe_remove_from_module(id);
        }
        let mut success = self.repair_chain(id, semantic);
        success &= self.revert_named(id);
        self.release(id);
        success
    }

    fn revert_function(&mut self, id: DeclId) -> bool {
        let (is_ctor, locals, semantic) = {
            let decl = &self.sess.graph.arena[id];
            match &decl.kind {
                DeclKind::Function(f) => (false, f.body_locals.clone(), decl.semantic_parent),
                DeclKind::Constructor(f) => (true, f.body_locals.clone(), decl.semantic_parent),
                _ => return false,
            }
        };
        // Constructors were already handled variant by variant.
        if !is_ctor {
            self.maybe_remove_from_module(id);
            // Function-local statics lower to qualified globals; those
            // symbols go away with the function.
            for &local in &locals {
                let is_static = self
                    .sess
                    .graph
                    .arena
                    .get(local)
                    .is_some_and(|d| matches!(&d.kind, DeclKind::Var(v) if v.is_static_local));
                if is_static {
                    self.maybe_remove_from_module(local);
                }
            }
        }
        // Parameters are children of the function and are removed while
        // the redeclaration chain is still in place.
        let mut success = self.revert_children(id);
        success &= self.repair_chain(id, semantic);
        success &= self.revert_named(id);
        self.excise_function_specialization(id);
        for local in locals {
            self.sess.graph.arena.remove(local);
        }
        self.release(id);
        success
    }

    fn revert_constructor(&mut self, id: DeclId) -> bool {
        // A source constructor may have lowered to any subset of its
        // entry-point variants; attempt removal for all of them.
        for variant in quill_lang_backend::mangle::CtorVariant::ALL {
            self.maybe_remove_ctor_from_module(id, variant);
        }
        self.revert_function(id)
    }

    /// The canonical declaration of a function-template specialization is
    /// the one registered in the template's specialization set; excise it
    /// when it goes away.
    fn excise_function_specialization(&mut self, id: DeclId) {
        let link = match self.sess.graph.arena.get(id) {
            Some(decl) => match &decl.kind {
                DeclKind::Function(f) => f.specialization.clone(),
                _ => None,
            },
            None => None,
        };
        let Some(link) = link else { return };
        if !self.sess.graph.is_canonical(id) {
            return;
        }
        if let Some(template) = self.sess.graph.arena.get_mut(link.template) {
            if let Some(set) = template.specializations_mut() {
                if set.get(&link.args) == Some(id) {
                    set.remove(&link.args);
                }
                debug_assert!(
                    set.get(&link.args) != Some(id),
                    "finds the removed specialization again"
                );
            }
        }
    }

    /// Namespaces and tag types: chain repair, then the children, then
    /// the named-declaration cleanup of the container itself.
    fn revert_container_decl(&mut self, id: DeclId) -> bool {
        let semantic = self.sess.graph.arena[id].semantic_parent;
        let mut success = self.repair_chain(id, semantic);
        success &= self.revert_children(id);
        success &= self.revert_named(id);
        self.release(id);
        success
    }

    fn revert_record(&mut self, id: DeclId) -> bool {
        // The injected self-reference is removed together with its owner.
        if self.sess.graph.arena[id].is_injected_self_ref() {
            return true;
        }
        let injected = self.find_injected_companion(id);
        let mut success = true;
        if let Some(companion) = injected {
            debug_assert!(self.sess.graph.arena[companion].is_injected_self_ref());
            let semantic = self.sess.graph.arena[companion].semantic_parent;
            success &= self.repair_chain(companion, semantic);
        }
        let semantic = self.sess.graph.arena[id].semantic_parent;
        success &= self.repair_chain(id, semantic);
        success &= self.revert_children(id);
        success &= self.revert_named(id);
        if let Some(companion) = injected {
            self.release(companion);
        }
        self.release(id);
        success
    }

    /// The injected self-reference can sit on either side of its record
    /// in the redeclaration chain.
    fn find_injected_companion(&self, id: DeclId) -> Option<DeclId> {
        let graph = &self.sess.graph;
        if let Some(prev) = graph.arena[id].previous {
            if graph.arena.get(prev).is_some_and(|d| d.is_injected_self_ref()) {
                return Some(prev);
            }
        }
        let mut cur = Some(graph.most_recent(id));
        while let Some(member) = cur {
            let decl = graph.arena.get(member)?;
            if decl.is_injected_self_ref() && decl.previous == Some(id) {
                return Some(member);
            }
            cur = decl.previous;
        }
        None
    }

    /// Function and class templates: the registered specializations go
    /// first (they are mutually independent), then the template itself,
    /// then the generic declaration it parameterizes.
    fn revert_template_decl(&mut self, id: DeclId) -> bool {
        let (templated, specs) = match &self.sess.graph.arena[id].kind {
            DeclKind::FunctionTemplate(t) | DeclKind::ClassTemplate(t) => {
                (t.templated, t.specializations.decls().collect::<Vec<_>>())
            }
            _ => return false,
        };
        let mut success = true;
        for spec in specs {
            success = self.revert_decl(spec) && success;
        }
        let semantic = self.sess.graph.arena[id].semantic_parent;
        success &= self.repair_chain(id, semantic);
        success &= self.revert_named(id);
        if self.sess.graph.arena.contains(templated) {
            success &= self.revert_decl(templated);
        }
        self.release(id);
        success
    }

    fn revert_class_specialization(&mut self, id: DeclId) -> bool {
        // Specializations are only ever registered canonically.
        let (template, args) = match &self.sess.graph.arena[id].kind {
            DeclKind::ClassTemplateSpecialization(s) => (s.template, s.args.clone()),
            _ => return false,
        };
        let canonical = self.sess.graph.canonical(id);
        if let Some(template) = self.sess.graph.arena.get_mut(template) {
            if let Some(set) = template.specializations_mut() {
                if set.get(&args) == Some(canonical) {
                    set.remove(&args);
                }
            }
        }
        // A class template specialization is a record.
        self.revert_record(id)
    }

    // Macros
    //
    //

    /// Detach one macro directive from the preprocessor. Reverting a
    /// directive that carries no definition, or one that is already gone,
    /// is a no-op failure.
    pub(crate) fn revert_macro(&mut self, event: &MacroEvent) -> bool {
        self.collect_file_to_uncache(event.directive.loc);
        if event.directive.info.is_none() {
            return false;
        }
        let removed = self.sess.macros.remove_directive(&event.name, &event.directive);
        if !removed {
            log::debug!("Macro directive for '{}' was not in the preprocessor", event.name);
        }
        removed
    }
}
