use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug, Clone)]
pub enum BackendError {
    #[error("Symbol already defined in module: {0}")]
    SymbolRedefined(String),
}
