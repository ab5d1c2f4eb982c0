use miette::Diagnostic;
use thiserror::Error;

use quill_lang_ast::SourceError;
use quill_lang_backend::BackendError;

#[derive(Error, Diagnostic, Debug, Clone)]
#[error(transparent)]
#[diagnostic(transparent)]
pub enum Error {
    Source(#[from] SourceError),
    Backend(#[from] BackendError),
    Driver(#[from] DriverError),
}

#[derive(Error, Diagnostic, Debug, Clone)]
pub enum DriverError {
    #[error("Transaction is not collecting")]
    NotCollecting,
}
