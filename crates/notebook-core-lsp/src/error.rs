use notebook_core::TranslateError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors produced while fetching or resolving completions.
pub enum CompletionError {
    #[error("language server request failed: {0}")]
    /// The request failed or timed out on the server side.
    Protocol(String),

    #[error(transparent)]
    /// A position could not be translated between coordinate spaces.
    Translate(#[from] TranslateError),

    #[error("no language server connection for {0}")]
    /// No connection serves the virtual document.
    NoConnection(String),

    #[error("completion request went stale: {0}")]
    /// The addressed editor or document changed while the request was in flight.
    Stale(String),
}

#[derive(Debug, Error)]
/// Failures that abort one diagnostics reconciliation cycle.
pub enum ReconcileError {
    #[error(transparent)]
    /// The target virtual document is not part of the index.
    Translate(#[from] TranslateError),

    #[error("failed to serialize diagnostic group: {0}")]
    /// The group identity could not be serialized.
    Hash(#[from] serde_json::Error),
}
