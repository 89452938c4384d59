//! In-memory backend fakes shared by the engine's unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use scandesk_core::types::{ActionId, ActionParams, AppSetting, HumanId, RecordId, RemoteRecord};

use crate::backend::{RequestBackend, SettingsSource};
use crate::error::BackendError;

/// Record fixture with the given id, hrid and valid actions.
pub(crate) fn record(id: &str, hrid: &str, actions: &[&str]) -> RemoteRecord {
    RemoteRecord::new(id)
        .with_hrid(hrid)
        .with_valid_actions(actions.iter().copied())
        .with_state("RES_NEW_AWAIT_PULL_SLIP")
}

/// A transition the fake backend received.
#[derive(Debug, Clone)]
pub(crate) struct RecordedTransition {
    pub id: RecordId,
    pub action: ActionId,
    pub params: ActionParams,
}

/// Scriptable [`RequestBackend`] that records every call it receives.
#[derive(Default)]
pub(crate) struct MockBackend {
    matches: Mutex<HashMap<String, Vec<RemoteRecord>>>,
    refreshed: Mutex<HashMap<RecordId, RemoteRecord>>,
    latency: Mutex<HashMap<String, Duration>>,
    failing_transitions: Mutex<HashSet<RecordId>>,
    transitions: Mutex<Vec<RecordedTransition>>,
    lookups: AtomicUsize,
    fetches: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// `hrid` resolves to exactly `records`.
    pub fn with_matches(self, hrid: &str, records: Vec<RemoteRecord>) -> Self {
        self.matches
            .lock()
            .unwrap()
            .insert(hrid.to_string(), records);
        self
    }

    /// `hrid` resolves to a single record.
    pub fn with_record(self, hrid: &str, record: RemoteRecord) -> Self {
        self.with_matches(hrid, vec![record])
    }

    /// Fetching `record.id` returns `record`.
    pub fn with_refreshed(self, record: RemoteRecord) -> Self {
        self.refreshed
            .lock()
            .unwrap()
            .insert(record.id.clone(), record);
        self
    }

    /// Lookups for `hrid` sleep for `delay` before answering.
    pub fn with_latency(self, hrid: &str, delay: Duration) -> Self {
        self.latency
            .lock()
            .unwrap()
            .insert(hrid.to_string(), delay);
        self
    }

    /// Transitions on `id` fail with a 500.
    pub fn with_failing_transition(self, id: &str) -> Self {
        self.failing_transitions
            .lock()
            .unwrap()
            .insert(RecordId::from(id));
        self
    }

    pub fn transitions(&self) -> Vec<RecordedTransition> {
        self.transitions.lock().unwrap().clone()
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RequestBackend for MockBackend {
    async fn find_by_hrid(&self, hrid: &HumanId) -> Result<Vec<RemoteRecord>, BackendError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let delay = self.latency.lock().unwrap().get(hrid.as_str()).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self
            .matches
            .lock()
            .unwrap()
            .get(hrid.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn perform_action(
        &self,
        id: &RecordId,
        action: &ActionId,
        params: &ActionParams,
    ) -> Result<(), BackendError> {
        self.transitions.lock().unwrap().push(RecordedTransition {
            id: id.clone(),
            action: action.clone(),
            params: params.clone(),
        });
        if self.failing_transitions.lock().unwrap().contains(id) {
            return Err(BackendError::Status {
                status: 500,
                body: "transition rejected".to_string(),
            });
        }
        Ok(())
    }

    async fn fetch(&self, id: &RecordId) -> Result<RemoteRecord, BackendError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.refreshed
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| BackendError::Status {
                status: 404,
                body: format!("no record {}", id),
            })
    }
}

/// [`SettingsSource`] serving a fixed list, optionally failing.
#[derive(Default)]
pub(crate) struct MockSettings {
    settings: Mutex<Vec<AppSetting>>,
    failing: Mutex<bool>,
    reads: AtomicUsize,
}

impl MockSettings {
    pub fn new(settings: Vec<AppSetting>) -> Self {
        Self {
            settings: Mutex::new(settings),
            ..Self::default()
        }
    }

    pub fn set(&self, settings: Vec<AppSetting>) {
        *self.settings.lock().unwrap() = settings;
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SettingsSource for MockSettings {
    async fn app_settings(&self, _section: &str) -> Result<Vec<AppSetting>, BackendError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if *self.failing.lock().unwrap() {
            return Err(BackendError::Transport("settings unavailable".to_string()));
        }
        Ok(self.settings.lock().unwrap().clone())
    }
}

/// Poll `check` until it holds, failing the test after two seconds.
pub(crate) async fn wait_until<F>(mut check: F)
where
    F: FnMut() -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition not reached within timeout");
}
