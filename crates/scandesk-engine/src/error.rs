//! Error types for the scan engine.
//!
//! Each component has its own error enum. `PipelineError` gathers the ones a
//! scan pipeline can hit and maps them onto the [`ErrorKind`] stored in a
//! failed entry.

use scandesk_core::types::{ActionId, ErrorKind, HumanId, PromptKind, ScanId, ScanStatus};
use serde::{Deserialize, Serialize};

/// Failure of a single call to the remote request service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Malformed response: {0}")]
    Decode(String),
}

/// Errors from resolving a human identifier.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("No request found for {0}")]
    NotFound(HumanId),
    #[error("{count} requests found for {hrid}")]
    Ambiguous { hrid: HumanId, count: usize },
    #[error("Lookup failed: {0}")]
    Remote(#[from] BackendError),
}

/// Errors from the operator prompt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromptError {
    #[error("Another prompt is already open ({open})")]
    Busy { open: PromptKind },
    #[error("Prompt dismissed")]
    Dismissed,
    #[error("No prompt is open")]
    NoPending,
    #[error("Prompt was abandoned before the value was delivered")]
    Abandoned,
}

/// Errors from performing a transition.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    #[error("Action {action} is not valid in state {}", .state.as_deref().unwrap_or("unknown"))]
    InvalidForState {
        action: ActionId,
        state: Option<String>,
    },
    #[error("Transition failed: {0}")]
    Transition(#[source] BackendError),
    #[error("Refresh after transition failed: {0}")]
    Refresh(#[source] BackendError),
}

/// Errors from scan store mutation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Scan not found: {0}")]
    UnknownScan(ScanId),
    #[error("Invalid status transition: {0} -> {1}")]
    InvalidTransition(ScanStatus, ScanStatus),
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),
    #[error("Store lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Errors from reading the action catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Could not read action settings: {0}")]
    Settings(#[from] BackendError),
}

/// Any failure that ends a scan pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    Execute(#[from] ExecuteError),
}

impl PipelineError {
    /// Classification stored with the failed entry.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Resolve(ResolveError::NotFound(_)) => ErrorKind::NotFound,
            PipelineError::Resolve(ResolveError::Ambiguous { .. }) => ErrorKind::Ambiguous,
            PipelineError::Resolve(ResolveError::Remote(_)) => ErrorKind::RemoteFailure,
            PipelineError::Prompt(PromptError::Busy { .. }) => ErrorKind::Busy,
            PipelineError::Prompt(_) => ErrorKind::Dismissed,
            PipelineError::Execute(ExecuteError::InvalidForState { .. }) => {
                ErrorKind::InvalidForState
            }
            PipelineError::Execute(_) => ErrorKind::RemoteFailure,
        }
    }

    pub fn detail(&self) -> ErrorDetail {
        ErrorDetail {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// What a failed entry records about its failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub message: String,
}
