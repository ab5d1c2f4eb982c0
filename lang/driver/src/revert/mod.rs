//! Reversion of committed transactions.
//!
//! Undoing a compilation step is harder than performing one: entities are
//! cross-linked through redeclaration chains, shadow lists,
//! specialization sets, lookup tables and generated-code references, and
//! removal order matters. The [`DeclReverter`] implements the
//! per-declaration-kind removal protocol; this module drives it over a
//! whole transaction, in reverse chronological order.

mod chain;
mod reverter;
mod symbols;

pub(crate) use reverter::DeclReverter;

use crate::session::Session;
use crate::transaction::{CallbackKind, MacroEvent, Transaction, TransactionState};

impl Session {
    /// Revert everything `txn` introduced: declarations, lookup entries,
    /// chain links, specialization registrations, macro definitions and
    /// generated code. Processing continues past individual failures;
    /// the transaction ends in [`TransactionState::RolledBack`] or
    /// [`TransactionState::RolledBackWithErrors`] and is never
    /// re-attempted automatically.
    pub fn revert_transaction(&mut self, txn: &mut Transaction) -> bool {
        log::debug!(
            "Reverting transaction: {} declaration groups, {} macro events",
            txn.events().len(),
            txn.macro_events().len()
        );
        let codegen_active =
            txn.state() == TransactionState::Committed && txn.emitted_code();
        let mut reverter = DeclReverter::new(self, txn.buffer_origin(), codegen_active);
        let mut success = true;

        for event in txn.events().iter().rev() {
            if event.callback != CallbackKind::TopLevelDecl {
                continue;
            }
            for &decl in event.group.iter().rev() {
                // Get rid of the declaration. If it has a name the lookup
                // tables are healed as well.
                success = reverter.revert_decl(decl) && success;
            }
        }

        for event in txn.macro_events().iter().rev() {
            success = reverter.revert_macro(event) && success;
        }

        let files = reverter.finish();
        for file in files {
            if let Some(uri) = self.sources.uri(file) {
                log::debug!("Uncaching file: {uri}");
            }
            self.sources.uncache(file);
        }

        // Deferred instantiations referencing reverted declarations are
        // meaningless now.
        self.pending_instantiations.clear();
        self.pending_local_instantiations.clear();
        self.diagnostics.reset();

        txn.set_state(if success {
            TransactionState::RolledBack
        } else {
            TransactionState::RolledBackWithErrors
        });
        success
    }

    /// Undo a single macro directive outside a full transaction revert.
    pub fn revert_macro(&mut self, event: &MacroEvent) -> bool {
        let origin = event.directive.loc.file;
        let mut reverter = DeclReverter::new(self, origin, false);
        let success = reverter.revert_macro(event);
        let files = reverter.finish();
        for file in files {
            self.sources.uncache(file);
        }
        success
    }
}
