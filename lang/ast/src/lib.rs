//! The declaration graph of an interactive compiler session, together with
//! the compiler state that name lookup and incremental reversion depend on:
//! lookup tables, redeclaration chains, template specialization sets, the
//! interactive scope chain, the preprocessor's macro registry, and the
//! source manager with its per-file content cache.

pub mod arena;
pub mod decls;
pub mod graph;
pub mod ident;
pub mod lookup;
pub mod macros;
pub mod scope;
pub mod source;

pub use arena::{DeclArena, DeclId};
pub use decls::*;
pub use graph::DeclGraph;
pub use ident::Ident;
pub use lookup::LookupTable;
pub use macros::{MacroDirective, MacroInfo, MacroRegistry};
pub use scope::{IdResolver, Scope};
pub use source::{
    FileId, FileSource, FileSystemSource, InMemorySource, Loc, SourceError, SourceManager,
};

pub type HashMap<K, V> = fxhash::FxHashMap<K, V>;
pub type HashSet<V> = fxhash::FxHashSet<V>;
