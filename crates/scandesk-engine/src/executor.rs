//! Transition execution against a resolved record.

use std::sync::Arc;

use scandesk_core::types::{ActionId, ActionParams, RemoteRecord};

use crate::backend::RequestBackend;
use crate::error::ExecuteError;

/// Validates and performs one transition, then re-reads the record.
pub struct ActionExecutor {
    backend: Arc<dyn RequestBackend>,
}

impl ActionExecutor {
    pub fn new(backend: Arc<dyn RequestBackend>) -> Self {
        Self { backend }
    }

    /// Perform `action` on `record` and return the refreshed record.
    ///
    /// The record's advertised valid actions are checked first, so an action
    /// the record does not allow never reaches the network. There is no retry:
    /// once the transition call has been sent it may already have taken
    /// effect remotely.
    pub async fn perform(
        &self,
        record: &RemoteRecord,
        action: &ActionId,
        params: ActionParams,
    ) -> Result<RemoteRecord, ExecuteError> {
        if !record.allows(action) {
            return Err(ExecuteError::InvalidForState {
                action: action.clone(),
                state: record.state_code().map(str::to_string),
            });
        }

        tracing::debug!(record = %record.id, action = %action, "Performing transition");
        self.backend
            .perform_action(&record.id, action, &params)
            .await
            .map_err(ExecuteError::Transition)?;

        self.backend
            .fetch(&record.id)
            .await
            .map_err(ExecuteError::Refresh)
    }
}
