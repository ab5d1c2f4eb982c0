use std::path::Path;

use url::Url;

use quill_lang_ast::{
    DeclGraph, DeclId, DeclKind, FileId, FileSource, FileSystemSource, InMemorySource, Loc,
    MacroRegistry, SourceManager, TemplateArgs,
};
use quill_lang_backend::mangle::{self, CtorVariant};
use quill_lang_backend::{CodeModule, ExecutionEngine};

use crate::result::{DriverError, Error};
use crate::transaction::{CallbackKind, Transaction, TransactionState};

/// Error and warning bookkeeping for the current interactive line.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: usize,
    warnings: usize,
}

impl Diagnostics {
    pub fn report_error(&mut self) {
        self.errors += 1;
    }

    pub fn report_warning(&mut self) {
        self.warnings += 1;
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    pub fn reset(&mut self) {
        *self = Diagnostics::default();
    }
}

/// A template instantiation that was deferred during compilation.
#[derive(Debug, Clone)]
pub struct PendingInstantiation {
    pub template: DeclId,
    pub args: TemplateArgs,
    pub loc: Loc,
}

/// Whether finalizing a transaction runs code generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    ParseOnly,
    Codegen,
}

/// One interactive compiler session.
///
/// The session owns every piece of process-wide state the rollback engine
/// mutates: the declaration graph, the macro registry, the source
/// manager, the generated-code module, the execution-engine map, the
/// diagnostics counters and the pending-instantiation queues. Multiple
/// independent sessions can coexist in one process.
pub struct Session {
    pub graph: DeclGraph,
    pub macros: MacroRegistry,
    pub sources: SourceManager,
    pub module: CodeModule,
    pub engine: ExecutionEngine,
    pub diagnostics: Diagnostics,
    pub pending_instantiations: Vec<PendingInstantiation>,
    pub pending_local_instantiations: Vec<PendingInstantiation>,
    next_init_ordinal: usize,
}

impl Session {
    // Creation
    //
    // The following methods provide various means to construct a session.

    /// Create a new session that only keeps files in memory
    pub fn in_memory() -> Self {
        Self::from_source(InMemorySource::new())
    }

    /// Create a new session with the given source
    pub fn from_source(source: impl FileSource + 'static) -> Self {
        Session {
            graph: DeclGraph::new(),
            macros: MacroRegistry::default(),
            sources: SourceManager::new(source),
            module: CodeModule::default(),
            engine: ExecutionEngine::default(),
            diagnostics: Diagnostics::default(),
            pending_instantiations: Vec::new(),
            pending_local_instantiations: Vec::new(),
            next_init_ordinal: 0,
        }
    }

    /// Create a new session reading files from the given directory
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        Self::from_source(FileSystemSource::new(path))
    }

    // Sources
    //
    //

    /// Load a source buffer into the session's cache.
    pub fn intern_source(&mut self, uri: &Url) -> Result<FileId, Error> {
        log::debug!("Interning source: {uri}");
        Ok(self.sources.intern(uri)?)
    }

    // Transactions
    //
    //

    /// Begin collecting a new transaction. Buffers interned from now on
    /// belong to it for cache-invalidation purposes.
    pub fn begin_transaction(&self) -> Transaction {
        Transaction::new(self.sources.next_file_id())
    }

    /// Finalize a collected transaction. With [`CommitMode::Codegen`],
    /// also emit symbols and engine addresses for its top-level
    /// declarations, in callback order.
    pub fn commit_transaction(
        &mut self,
        txn: &mut Transaction,
        mode: CommitMode,
    ) -> Result<(), Error> {
        if txn.state() != TransactionState::Collecting {
            return Err(DriverError::NotCollecting.into());
        }
        txn.set_state(TransactionState::Committed);
        if mode == CommitMode::Codegen {
            log::debug!("Emitting code for transaction");
            let groups: Vec<Vec<DeclId>> = txn
                .events()
                .iter()
                .filter(|event| event.callback == CallbackKind::TopLevelDecl)
                .map(|event| event.group.clone())
                .collect();
            let mut init_fn = None;
            for group in groups {
                for decl in group {
                    self.emit_decl(decl, &mut init_fn)?;
                }
            }
            txn.set_emitted();
        }
        Ok(())
    }

    // Code generation
    //
    // A deliberately small stand-in for the backend callback: one symbol
    // per function or global, up to three per constructor, plus the
    // initialization scaffolding for globals with dynamic initializers.

    fn emit_decl(&mut self, id: DeclId, init_fn: &mut Option<String>) -> Result<(), Error> {
        let Some(decl) = self.graph.arena.get(id) else {
            return Ok(());
        };
        match &decl.kind {
            DeclKind::Var(v) => {
                if v.is_parameter || v.in_templated_context {
                    return Ok(());
                }
                let has_initializer = v.has_initializer;
                let Some(name) = mangle::mangled_name(&self.graph, id) else {
                    return Ok(());
                };
                self.module.define_global(&name, vec![])?;
                self.engine.map_symbol(&name);
                if has_initializer {
                    self.emit_var_init(&name, init_fn)?;
                }
            }
            DeclKind::Function(f) => {
                let locals = f.body_locals.clone();
                if let Some(name) = mangle::mangled_name(&self.graph, id) {
                    let mut refs = Vec::new();
                    for local in &locals {
                        let is_static = self.graph.arena.get(*local).is_some_and(|d| {
                            matches!(&d.kind, DeclKind::Var(v) if v.is_static_local)
                        });
                        if !is_static {
                            continue;
                        }
                        if let Some(local_name) = mangle::mangled_name(&self.graph, *local) {
                            self.module.define_global(&local_name, vec![])?;
                            self.engine.map_symbol(&local_name);
                            refs.push(local_name);
                        }
                    }
                    self.module.define_function(&name, false, refs)?;
                    self.engine.map_symbol(&name);
                }
            }
            DeclKind::Constructor(_) => {
                // The allocating variant is only emitted on demand and is
                // usually absent.
                for variant in [CtorVariant::Complete, CtorVariant::Base] {
                    if let Some(name) = mangle::mangled_ctor_name(&self.graph, id, variant) {
                        self.module.define_function(&name, false, vec![])?;
                        self.engine.map_symbol(&name);
                    }
                }
            }
            DeclKind::TranslationUnit(_)
            | DeclKind::Namespace(_)
            | DeclKind::Tag(_)
            | DeclKind::Record(_)
            | DeclKind::ClassTemplateSpecialization(_) => {
                let children = self.graph.children(id).to_vec();
                for child in children {
                    self.emit_decl(child, init_fn)?;
                }
            }
            DeclKind::FunctionTemplate(t) | DeclKind::ClassTemplate(t) => {
                let specs: Vec<DeclId> = t.specializations.decls().collect();
                for spec in specs {
                    self.emit_decl(spec, init_fn)?;
                }
            }
            DeclKind::Typedef | DeclKind::Using(_) | DeclKind::UsingShadow(_) | DeclKind::Other => {
            }
        }
        Ok(())
    }

    /// Emit the initialization helper for one global and hook it into the
    /// per-transaction module initializer.
    fn emit_var_init(&mut self, global: &str, init_fn: &mut Option<String>) -> Result<(), Error> {
        let helper = format!("{}{global}", mangle::STATIC_INIT_PREFIX);
        self.module.define_function(&helper, true, vec![global.to_owned()])?;
        self.engine.map_symbol(&helper);
        let init = match init_fn {
            Some(name) => name.clone(),
            None => {
                let name = format!("{}{}", mangle::MODULE_INIT_PREFIX, self.next_init_ordinal);
                self.next_init_ordinal += 1;
                self.module.define_function(&name, true, vec![])?;
                self.engine.map_symbol(&name);
                *init_fn = Some(name.clone());
                name
            }
        };
        self.module.add_reference(&init, &helper);
        Ok(())
    }
}
