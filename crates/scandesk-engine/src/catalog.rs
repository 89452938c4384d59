//! Action catalog derived from tenant settings.
//!
//! Which actions the operator may pick depends on two toggles in the
//! `state_action_config` settings section. The mapping itself is pure
//! ([`actions_from_settings`]); [`ActionCatalog`] adds the remote read and a
//! freshness window on top.

use std::sync::Arc;
use std::time::{Duration, Instant};

use scandesk_core::config::CatalogConfig;
use scandesk_core::types::{ActionId, AppSetting};
use tokio::sync::Mutex;

use crate::backend::SettingsSource;
use crate::error::CatalogError;

/// Toggle: fill and ship in a single scan.
pub const COMBINE_FILL_AND_SHIP: &str = "combine_fill_and_ship";
/// Toggle: patron return and return shipment in a single scan.
pub const COMBINE_RETURNED_AND_SHIP: &str = "combine_returned_by_patron_and_return_ship";

fn toggle(settings: &[AppSetting], key: &str) -> bool {
    settings
        .iter()
        .find(|setting| setting.key == key)
        .is_some_and(AppSetting::is_enabled)
}

/// Ordered list of actions offered for the given settings snapshot.
pub fn actions_from_settings(settings: &[AppSetting]) -> Vec<ActionId> {
    let mut actions = Vec::with_capacity(6);

    if toggle(settings, COMBINE_FILL_AND_SHIP) {
        actions.push("supplierCheckInToReshareAndSupplierMarkShipped");
    } else {
        actions.push("supplierCheckInToReshare");
        actions.push("supplierMarkShipped");
    }

    actions.push("supplierCheckOutOfReshare");
    actions.push("requesterReceived");

    if toggle(settings, COMBINE_RETURNED_AND_SHIP) {
        actions.push("patronReturnedItemAndShippedReturn");
    } else {
        actions.push("patronReturnedItem");
        actions.push("shippedReturn");
    }

    actions.into_iter().map(ActionId::new).collect()
}

struct Cached {
    actions: Vec<ActionId>,
    fetched_at: Instant,
}

/// Cached view of the available actions.
pub struct ActionCatalog {
    source: Arc<dyn SettingsSource>,
    section: String,
    stale_after: Duration,
    cache: Mutex<Option<Cached>>,
}

impl ActionCatalog {
    pub fn new(source: Arc<dyn SettingsSource>, config: &CatalogConfig) -> Self {
        Self::with_window(
            source,
            config.section.clone(),
            Duration::from_secs(config.stale_secs),
        )
    }

    pub fn with_window(
        source: Arc<dyn SettingsSource>,
        section: impl Into<String>,
        stale_after: Duration,
    ) -> Self {
        Self {
            source,
            section: section.into(),
            stale_after,
            cache: Mutex::new(None),
        }
    }

    /// Current action list, refetching once the cached one is stale.
    ///
    /// A failed refresh falls back to the previous list when there is one.
    pub async fn actions(&self) -> Result<Vec<ActionId>, CatalogError> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            if cached.fetched_at.elapsed() < self.stale_after {
                return Ok(cached.actions.clone());
            }
        }

        match self.source.app_settings(&self.section).await {
            Ok(settings) => {
                let actions = actions_from_settings(&settings);
                tracing::debug!(count = actions.len(), "Action catalog refreshed");
                *cache = Some(Cached {
                    actions: actions.clone(),
                    fetched_at: Instant::now(),
                });
                Ok(actions)
            }
            Err(e) => match cache.as_ref() {
                Some(cached) => {
                    tracing::warn!(error = %e, "Settings refresh failed, serving cached actions");
                    Ok(cached.actions.clone())
                }
                None => Err(e.into()),
            },
        }
    }

    /// Drop the cached list so the next read goes to the remote service.
    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }
}
