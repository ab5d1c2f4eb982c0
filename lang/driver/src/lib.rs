//! The interactive session driver: owns the declaration graph, the
//! preprocessor state, the source manager, the generated-code module and
//! the execution-engine map, tracks incrementally compiled transactions,
//! and can surgically revert one transaction without disturbing the rest.

mod result;
mod revert;
mod session;
mod transaction;

pub use result::*;
pub use session::{CommitMode, Diagnostics, PendingInstantiation, Session};
pub use transaction::{
    CallbackKind, InsertionEvent, MacroEvent, Transaction, TransactionState,
};
