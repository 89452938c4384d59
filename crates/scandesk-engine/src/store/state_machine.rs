//! Scan status transitions.
//!
//! Pending -> Success
//! Pending -> Fail
//!
//! Terminal statuses never change.

use scandesk_core::types::ScanStatus;

use crate::error::StoreError;

/// Validate that a status change is allowed. Re-asserting `Pending` is a no-op.
pub fn validate_transition(from: ScanStatus, to: ScanStatus) -> Result<(), StoreError> {
    let valid = matches!(
        (from, to),
        (ScanStatus::Pending, ScanStatus::Pending)
            | (ScanStatus::Pending, ScanStatus::Success)
            | (ScanStatus::Pending, ScanStatus::Fail)
    );

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidTransition(from, to))
    }
}
