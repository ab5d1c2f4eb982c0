use quill_lang_ast::DeclId;
use quill_lang_backend::mangle::{
    self, CtorVariant, MODULE_INIT_PREFIX, STATIC_INIT_PREFIX,
};

use super::reverter::DeclReverter;

impl DeclReverter<'_> {
    /// Remove the generated symbol for a declaration, if any.
    ///
    /// This has to happen before the declaration graph is repaired,
    /// because mangled-name computation walks the redeclaration chain and
    /// the semantic-parent spine.
    pub(super) fn maybe_remove_from_module(&mut self, id: DeclId) {
        // parse-only transactions never generated code
        if !self.codegen_active {
            return;
        }
        let Some(mangled) = mangle::mangled_name(&self.sess.graph, id) else {
            return;
        };
        self.remove_named_symbol(&mangled);
    }

    pub(super) fn maybe_remove_ctor_from_module(&mut self, id: DeclId, variant: CtorVariant) {
        if !self.codegen_active {
            return;
        }
        let Some(mangled) = mangle::mangled_ctor_name(&self.sess.graph, id, variant) else {
            return;
        };
        self.remove_named_symbol(&mangled);
    }

    /// Excise one symbol from the generated module and the engine map.
    fn remove_named_symbol(&mut self, mangled: &str) {
        // May never have been emitted, e.g. if unreferenced.
        if !self.sess.module.contains(mangled) {
            return;
        }
        log::trace!("Removing generated symbol: {mangled}");

        // Initialization helpers run at most once and have already run;
        // any reference they hold can be discarded together with them.
        for user in self.sess.module.users_of(mangled) {
            if user.starts_with(STATIC_INIT_PREFIX) {
                self.remove_static_init(&user);
            }
        }

        self.sess.engine.invalidate(mangled);
        self.sess.module.drop_references(mangled);
        self.sess.module.replace_uses_with_placeholder(mangled);
        let erased = self.sess.module.erase(mangled);
        debug_assert!(erased.is_some());
    }

    /// Erase an initialization helper and the module initializer that
    /// calls it.
    fn remove_static_init(&mut self, helper: &str) {
        debug_assert!(helper.starts_with(STATIC_INIT_PREFIX), "not an init helper");
        for user in self.sess.module.users_of(helper) {
            if user.starts_with(MODULE_INIT_PREFIX) {
                self.sess.engine.invalidate(&user);
                self.sess.module.erase(&user);
            }
        }
        self.sess.engine.invalidate(helper);
        self.sess.module.erase(helper);
    }
}
