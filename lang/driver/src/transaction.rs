use quill_lang_ast::{DeclId, FileId, Ident, MacroDirective};

/// Which compiler callback produced a declaration group. Only top-level
/// declarations are independently reverted; the other kinds are side
/// effects of instantiation bookkeeping and go away with their owners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKind {
    TopLevelDecl,
    TagDefinition,
    ImplicitInstantiation,
    StaticMemberInstantiation,
}

/// One recorded declaration group.
#[derive(Debug, Clone)]
pub struct InsertionEvent {
    pub group: Vec<DeclId>,
    pub callback: CallbackKind,
}

/// One recorded macro directive.
#[derive(Debug, Clone)]
pub struct MacroEvent {
    pub name: Ident,
    pub directive: MacroDirective,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Collecting,
    Committed,
    RolledBack,
    RolledBackWithErrors,
}

/// One incrementally compiled batch of top-level input, trackable and
/// revertible as a unit.
///
/// The transaction is an ordered log of what compilation inserted; the
/// rollback engine assumes the log is correct and complete.
#[derive(Debug)]
pub struct Transaction {
    events: Vec<InsertionEvent>,
    macros: Vec<MacroEvent>,
    state: TransactionState,
    /// The first source buffer this transaction introduced. Buffers
    /// before it are never uncached on rollback.
    buffer_origin: FileId,
    emitted_code: bool,
}

impl Transaction {
    pub fn new(buffer_origin: FileId) -> Self {
        Transaction {
            events: Vec::new(),
            macros: Vec::new(),
            state: TransactionState::Collecting,
            buffer_origin,
            emitted_code: false,
        }
    }

    pub fn record_decls(&mut self, callback: CallbackKind, group: Vec<DeclId>) {
        debug_assert!(self.state == TransactionState::Collecting, "transaction already finalized");
        self.events.push(InsertionEvent { group, callback });
    }

    pub fn record_top_level(&mut self, group: Vec<DeclId>) {
        self.record_decls(CallbackKind::TopLevelDecl, group);
    }

    pub fn record_macro(&mut self, name: Ident, directive: MacroDirective) {
        debug_assert!(self.state == TransactionState::Collecting, "transaction already finalized");
        self.macros.push(MacroEvent { name, directive });
    }

    pub fn events(&self) -> &[InsertionEvent] {
        &self.events
    }

    pub fn macro_events(&self) -> &[MacroEvent] {
        &self.macros
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.macros.is_empty()
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: TransactionState) {
        self.state = state;
    }

    pub fn buffer_origin(&self) -> FileId {
        self.buffer_origin
    }

    /// Whether code generation ran for this transaction. Parse-only
    /// transactions have no generated symbols to remove.
    pub fn emitted_code(&self) -> bool {
        self.emitted_code
    }

    pub(crate) fn set_emitted(&mut self) {
        self.emitted_code = true;
    }
}
