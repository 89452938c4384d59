//! Human identifier resolution.

use std::sync::Arc;

use scandesk_core::types::{HumanId, RemoteRecord};

use crate::backend::RequestBackend;
use crate::error::ResolveError;

/// Resolves an operator-entered identifier to exactly one remote record.
pub struct RequestResolver {
    backend: Arc<dyn RequestBackend>,
}

impl RequestResolver {
    pub fn new(backend: Arc<dyn RequestBackend>) -> Self {
        Self { backend }
    }

    /// Look up `hrid` with a single remote query.
    ///
    /// Zero matches is `NotFound`. More than one is `Ambiguous`, which should
    /// not happen against a real tenant but does when requester and supplier
    /// live on the same one.
    pub async fn lookup(&self, hrid: &HumanId) -> Result<RemoteRecord, ResolveError> {
        if hrid.is_empty() {
            return Err(ResolveError::NotFound(hrid.clone()));
        }

        let mut matches = self.backend.find_by_hrid(hrid).await?;
        match matches.len() {
            1 => Ok(matches.remove(0)),
            0 => Err(ResolveError::NotFound(hrid.clone())),
            count => {
                tracing::warn!(hrid = %hrid, count, "Multiple requests share one HRID");
                Err(ResolveError::Ambiguous {
                    hrid: hrid.clone(),
                    count,
                })
            }
        }
    }
}
