//! Scan entries and the partial updates merged into them.

use scandesk_core::types::{ActionId, HumanId, RemoteRecord, ScanId, ScanStatus, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::ErrorDetail;

/// One scan as the operator sees it in the list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanEntry {
    pub scan_id: ScanId,
    pub hrid: HumanId,
    pub action: ActionId,
    pub status: ScanStatus,
    pub resolved_request: Option<RemoteRecord>,
    pub error_detail: Option<ErrorDetail>,
    pub created_at: Timestamp,
}

impl ScanEntry {
    pub(crate) fn pending(scan_id: ScanId, hrid: HumanId, action: ActionId) -> Self {
        Self {
            scan_id,
            hrid,
            action,
            status: ScanStatus::Pending,
            resolved_request: None,
            error_detail: None,
            created_at: Timestamp::now(),
        }
    }
}

/// A field-level patch for a [`ScanEntry`].
///
/// `None` leaves the stored field untouched, so two patches written by
/// different pipeline steps compose instead of overwriting each other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryUpdate {
    pub status: Option<ScanStatus>,
    pub resolved_request: Option<RemoteRecord>,
    pub error_detail: Option<ErrorDetail>,
}

impl EntryUpdate {
    /// The record was resolved; status is unchanged.
    pub fn resolved(record: RemoteRecord) -> Self {
        Self {
            resolved_request: Some(record),
            ..Self::default()
        }
    }

    /// The transition went through; carries the refreshed record.
    pub fn succeeded(record: RemoteRecord) -> Self {
        Self {
            status: Some(ScanStatus::Success),
            resolved_request: Some(record),
            error_detail: None,
        }
    }

    pub fn failed(detail: ErrorDetail) -> Self {
        Self {
            status: Some(ScanStatus::Fail),
            resolved_request: None,
            error_detail: Some(detail),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.resolved_request.is_none() && self.error_detail.is_none()
    }
}
