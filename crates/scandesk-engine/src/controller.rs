//! Scan orchestration.
//!
//! [`ScanController::submit`] records a pending entry and returns at once.
//! The rest of the scan runs as its own spawned pipeline:
//!
//! 1. resolve the human id and merge the record into the entry
//! 2. ask the operator for input if the action needs it
//! 3. perform the transition and re-read the record
//! 4. merge the outcome
//!
//! Pipelines share nothing but the store, and every failure is caught at the
//! pipeline boundary and written to its own entry.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use scandesk_core::types::{ActionId, ActionParams, HumanId, RemoteRecord, ScanId};
use tokio::sync::Notify;
use tracing::Instrument;

use crate::backend::RequestBackend;
use crate::error::{PipelineError, StoreError};
use crate::executor::ActionExecutor;
use crate::prompt::PromptBroker;
use crate::registry::ActionRegistry;
use crate::resolver::RequestResolver;
use crate::store::ScanStore;
use crate::types::EntryUpdate;

struct Inner {
    resolver: RequestResolver,
    executor: ActionExecutor,
    prompts: Arc<PromptBroker>,
    registry: ActionRegistry,
    store: Arc<ScanStore>,
    current_action: Mutex<Option<ActionId>>,
    in_flight: AtomicUsize,
    idle: Notify,
}

/// Entry point for scans. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct ScanController {
    inner: Arc<Inner>,
}

impl ScanController {
    pub fn new(
        backend: Arc<dyn RequestBackend>,
        prompts: Arc<PromptBroker>,
        registry: ActionRegistry,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                resolver: RequestResolver::new(Arc::clone(&backend)),
                executor: ActionExecutor::new(backend),
                prompts,
                registry,
                store: Arc::new(ScanStore::new()),
                current_action: Mutex::new(None),
                in_flight: AtomicUsize::new(0),
                idle: Notify::new(),
            }),
        }
    }

    /// Record a scan of `hrid` for `action` and start its pipeline.
    ///
    /// Returns the new entry's id as soon as the entry exists; the entry is
    /// also selected. Once the entry exists its pipeline always starts.
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, hrid: HumanId, action: ActionId) -> Result<ScanId, StoreError> {
        let scan_id = self
            .inner
            .store
            .create_selected(hrid.clone(), action.clone())?;

        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlight(Arc::clone(&self.inner));
        let span = tracing::info_span!("scan", scan_id = %scan_id, hrid = %hrid, action = %action);

        tokio::spawn(
            async move {
                guard.0.drive(scan_id, hrid, action).await;
                drop(guard);
            }
            .instrument(span),
        );

        Ok(scan_id)
    }

    /// Action used for new scans, if one has been chosen.
    pub fn current_action(&self) -> Option<ActionId> {
        self.inner.action_slot().clone()
    }

    /// Switch the action for new scans.
    ///
    /// A different action discards every existing scan; returns whether that
    /// happened. Pipelines still running for discarded scans finish without
    /// touching the store.
    pub fn set_action(&self, action: ActionId) -> Result<bool, StoreError> {
        let mut current = self.inner.action_slot();
        if current.as_ref() == Some(&action) {
            return Ok(false);
        }
        let had_action = current.replace(action.clone()).is_some();
        drop(current);

        if had_action {
            self.inner.store.clear()?;
        }
        tracing::info!(action = %action, "Action selected");
        Ok(true)
    }

    pub fn select(&self, scan_id: Option<ScanId>) -> Result<(), StoreError> {
        self.inner.store.select(scan_id)
    }

    pub fn store(&self) -> &Arc<ScanStore> {
        &self.inner.store
    }

    pub fn prompts(&self) -> &Arc<PromptBroker> {
        &self.inner.prompts
    }

    /// Number of pipelines still running.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Wait until no pipeline is running.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Inner {
    async fn drive(&self, scan_id: ScanId, hrid: HumanId, action: ActionId) {
        let update = match self.run(scan_id, &hrid, &action).await {
            Ok(record) => {
                tracing::info!(state = record.state_code().unwrap_or("unknown"), "Scan succeeded");
                EntryUpdate::succeeded(record)
            }
            Err(e) => {
                tracing::warn!(error = %e, kind = %e.kind(), "Scan failed");
                EntryUpdate::failed(e.detail())
            }
        };
        self.apply(scan_id, update);
    }

    async fn run(
        &self,
        scan_id: ScanId,
        hrid: &HumanId,
        action: &ActionId,
    ) -> Result<RemoteRecord, PipelineError> {
        let record = self.resolver.lookup(hrid).await?;
        tracing::debug!(record = %record.id, "Request resolved");
        self.apply(scan_id, EntryUpdate::resolved(record.clone()));

        let params = match self.registry.prompt_for(action) {
            Some(kind) => {
                let value = self.prompts.request_input(kind).await?;
                ActionRegistry::params_for(kind, value)
            }
            None => ActionParams::empty(),
        };

        Ok(self.executor.perform(&record, action, params).await?)
    }

    fn apply(&self, scan_id: ScanId, update: EntryUpdate) {
        match self.store.merge(scan_id, update) {
            Ok(_) => {}
            Err(StoreError::UnknownScan(_)) => {
                tracing::debug!("Scan was cleared, dropping update");
            }
            Err(e) => tracing::error!(error = %e, "Failed to update scan"),
        }
    }

    fn action_slot(&self) -> MutexGuard<'_, Option<ActionId>> {
        self.current_action
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Counts a running pipeline; wakes `wait_idle` when the last one ends.
struct InFlight(Arc<Inner>);

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.0.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}
