//! In-memory scan list.
//!
//! Holds every scan of the session, newest first, plus the operator's
//! selection. Pipelines write through [`ScanStore::merge`], which patches the
//! live entry field by field so concurrent pipelines never lose each other's
//! writes.

pub mod state_machine;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use scandesk_core::events::ScanEvent;
use scandesk_core::types::{ActionId, HumanId, ScanId, ScanStatus, Timestamp};
use tokio::sync::broadcast;

use crate::error::StoreError;
use crate::store::state_machine::validate_transition;
use crate::types::{EntryUpdate, ScanEntry};

const EVENT_CAPACITY: usize = 256;

#[derive(Default)]
struct StoreState {
    /// Newest first.
    order: Vec<ScanId>,
    entries: HashMap<ScanId, ScanEntry>,
    selected: Option<ScanId>,
    /// Last id handed out. Survives `clear`.
    last_id: u64,
}

impl StoreState {
    /// Allocate an id and insert a pending entry at the front.
    fn insert(&mut self, hrid: HumanId, action: ActionId) -> ScanEntry {
        self.last_id += 1;
        let scan_id = ScanId(self.last_id);
        let entry = ScanEntry::pending(scan_id, hrid, action);
        self.order.insert(0, scan_id);
        self.entries.insert(scan_id, entry.clone());
        entry
    }
}

/// Ordered scan entries with field-level merge.
pub struct ScanStore {
    state: Mutex<StoreState>,
    events: broadcast::Sender<ScanEvent>,
}

impl ScanStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Mutex::new(StoreState::default()),
            events,
        }
    }

    /// Insert a pending entry at the front and return its id.
    pub fn create(&self, hrid: HumanId, action: ActionId) -> Result<ScanId, StoreError> {
        let entry = self.lock()?.insert(hrid, action);
        self.publish_created(entry.clone());
        Ok(entry.scan_id)
    }

    /// Insert a pending entry at the front and select it in one step.
    pub fn create_selected(&self, hrid: HumanId, action: ActionId) -> Result<ScanId, StoreError> {
        let entry = {
            let mut state = self.lock()?;
            let entry = state.insert(hrid, action);
            state.selected = Some(entry.scan_id);
            entry
        };

        let scan_id = entry.scan_id;
        let timestamp = entry.created_at;
        self.publish_created(entry);
        self.publish(ScanEvent::SelectionChanged {
            scan_id: Some(scan_id),
            timestamp,
        });
        Ok(scan_id)
    }

    /// Apply `update` to the stored entry and return the merged result.
    ///
    /// Fields left `None` keep their stored value, so a refreshed record can
    /// land on a terminal entry. Status changes go through the state machine,
    /// and an error detail is only accepted on a `Fail` entry.
    pub fn merge(&self, scan_id: ScanId, update: EntryUpdate) -> Result<ScanEntry, StoreError> {
        let merged = {
            let mut state = self.lock()?;
            let entry = state
                .entries
                .get_mut(&scan_id)
                .ok_or(StoreError::UnknownScan(scan_id))?;

            if update.is_empty() {
                return Ok(entry.clone());
            }

            let status = match update.status {
                Some(to) if to != entry.status => {
                    validate_transition(entry.status, to)?;
                    to
                }
                _ => entry.status,
            };
            if update.error_detail.is_some() && status != ScanStatus::Fail {
                return Err(StoreError::InvalidUpdate(format!(
                    "error detail on a {} entry",
                    status
                )));
            }

            entry.status = status;
            if let Some(record) = update.resolved_request {
                entry.resolved_request = Some(record);
            }
            if let Some(detail) = update.error_detail {
                entry.error_detail = Some(detail);
            }
            entry.clone()
        };

        self.publish(ScanEvent::ScanUpdated {
            scan_id,
            status: merged.status,
            timestamp: Timestamp::now(),
        });
        Ok(merged)
    }

    /// Set the selection. A `Some` id must exist in the store.
    pub fn select(&self, scan_id: Option<ScanId>) -> Result<(), StoreError> {
        {
            let mut state = self.lock()?;
            if let Some(id) = scan_id {
                if !state.entries.contains_key(&id) {
                    return Err(StoreError::UnknownScan(id));
                }
            }
            state.selected = scan_id;
        }

        self.publish(ScanEvent::SelectionChanged {
            scan_id,
            timestamp: Timestamp::now(),
        });
        Ok(())
    }

    pub fn get(&self, scan_id: ScanId) -> Result<ScanEntry, StoreError> {
        self.lock()?
            .entries
            .get(&scan_id)
            .cloned()
            .ok_or(StoreError::UnknownScan(scan_id))
    }

    /// All entries, newest first.
    pub fn list(&self) -> Result<Vec<ScanEntry>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.entries.get(id).cloned())
            .collect())
    }

    pub fn selected(&self) -> Result<Option<ScanId>, StoreError> {
        Ok(self.lock()?.selected)
    }

    pub fn selected_entry(&self) -> Result<Option<ScanEntry>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .selected
            .and_then(|id| state.entries.get(&id).cloned()))
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.order.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Drop every entry and the selection. Ids are never reused.
    pub fn clear(&self) -> Result<(), StoreError> {
        {
            let mut state = self.lock()?;
            state.order.clear();
            state.entries.clear();
            state.selected = None;
        }
        self.publish(ScanEvent::ScansCleared {
            timestamp: Timestamp::now(),
        });
        Ok(())
    }

    /// Receive a [`ScanEvent`] for every change from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.events.subscribe()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, StoreError> {
        self.state
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn publish_created(&self, entry: ScanEntry) {
        self.publish(ScanEvent::ScanCreated {
            scan_id: entry.scan_id,
            hrid: entry.hrid,
            action: entry.action,
            timestamp: entry.created_at,
        });
    }

    fn publish(&self, event: ScanEvent) {
        tracing::trace!(event = event.event_name(), scan_id = ?event.scan_id(), "Store event");
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl Default for ScanStore {
    fn default() -> Self {
        Self::new()
    }
}
