use serde::{Deserialize, Serialize};

use crate::types::{ActionId, HumanId, ScanId, ScanStatus, Timestamp};

/// Change notifications published by the scan store.
///
/// Consumed by whatever renders the scan list and detail pane. Events only
/// say *what* changed; readers fetch the current entry from the store.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ScanEvent {
    /// A new entry was added at the front of the list.
    ScanCreated {
        scan_id: ScanId,
        hrid: HumanId,
        action: ActionId,
        timestamp: Timestamp,
    },

    /// Fields of an existing entry were merged.
    ScanUpdated {
        scan_id: ScanId,
        status: ScanStatus,
        timestamp: Timestamp,
    },

    /// The selected entry changed.
    SelectionChanged {
        scan_id: Option<ScanId>,
        timestamp: Timestamp,
    },

    /// All entries were discarded.
    ScansCleared { timestamp: Timestamp },
}

impl ScanEvent {
    /// Returns the timestamp of the event.
    pub fn timestamp(&self) -> Timestamp {
        match self {
            ScanEvent::ScanCreated { timestamp, .. }
            | ScanEvent::ScanUpdated { timestamp, .. }
            | ScanEvent::SelectionChanged { timestamp, .. }
            | ScanEvent::ScansCleared { timestamp } => *timestamp,
        }
    }

    /// Returns a short event name for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            ScanEvent::ScanCreated { .. } => "scan_created",
            ScanEvent::ScanUpdated { .. } => "scan_updated",
            ScanEvent::SelectionChanged { .. } => "selection_changed",
            ScanEvent::ScansCleared { .. } => "scans_cleared",
        }
    }

    /// The entry this event concerns, if any.
    pub fn scan_id(&self) -> Option<ScanId> {
        match self {
            ScanEvent::ScanCreated { scan_id, .. } | ScanEvent::ScanUpdated { scan_id, .. } => {
                Some(*scan_id)
            }
            ScanEvent::SelectionChanged { scan_id, .. } => *scan_id,
            ScanEvent::ScansCleared { .. } => None,
        }
    }
}
