//! Seams to the remote request service.
//!
//! The engine only talks to the outside world through these traits. The
//! HTTP implementation lives in `scandesk-remote`; tests use in-memory fakes.

use async_trait::async_trait;
use scandesk_core::types::{ActionId, ActionParams, AppSetting, HumanId, RecordId, RemoteRecord};

use crate::error::BackendError;

/// Request collection operations used by a scan pipeline.
#[async_trait]
pub trait RequestBackend: Send + Sync {
    /// All records whose human identifier equals `hrid`.
    async fn find_by_hrid(&self, hrid: &HumanId) -> Result<Vec<RemoteRecord>, BackendError>;

    /// Apply `action` to the record `id`. Success means the call returned
    /// without error; the resulting record is fetched separately.
    async fn perform_action(
        &self,
        id: &RecordId,
        action: &ActionId,
        params: &ActionParams,
    ) -> Result<(), BackendError>;

    /// The canonical record for `id`.
    async fn fetch(&self, id: &RecordId) -> Result<RemoteRecord, BackendError>;
}

/// Read access to remote app settings.
#[async_trait]
pub trait SettingsSource: Send + Sync {
    /// Every setting in `section`.
    async fn app_settings(&self, section: &str) -> Result<Vec<AppSetting>, BackendError>;
}
