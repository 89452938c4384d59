//! HTTP client for the request service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use scandesk_core::config::RemoteConfig;
use scandesk_core::types::{ActionId, ActionParams, AppSetting, HumanId, RecordId, RemoteRecord};
use scandesk_engine::{BackendError, RequestBackend, SettingsSource};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Page size for settings reads. The action toggles fit in one page.
const SETTINGS_PAGE: &str = "1000";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PerformActionBody<'a> {
    action: &'a ActionId,
    action_params: &'a ActionParams,
}

/// [`RequestBackend`] and [`SettingsSource`] over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpBackend {
    pub fn new(config: &RemoteConfig) -> Result<Self, BackendError> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| BackendError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = normalize_base_url(&config.base_url);
        tracing::info!(base_url = %base_url, timeout_secs = ?config.timeout_secs, "HTTP backend ready");
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a service path such as `rs/patronrequests`.
    pub fn build_url(&self, path: impl AsRef<str>) -> String {
        format!("{}/{}", self.base_url, path.as_ref().trim_start_matches('/'))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RequestBackend for HttpBackend {
    async fn find_by_hrid(&self, hrid: &HumanId) -> Result<Vec<RemoteRecord>, BackendError> {
        let filter = format!("hrid=={}", hrid);
        let request = self
            .client
            .get(self.build_url("rs/patronrequests"))
            .query(&[("fullRecord", "true"), ("filters", filter.as_str())]);
        let records: Vec<RemoteRecord> = self.get_json(request).await?;
        tracing::debug!(hrid = %hrid, matches = records.len(), "Looked up request");
        Ok(records)
    }

    async fn perform_action(
        &self,
        id: &RecordId,
        action: &ActionId,
        params: &ActionParams,
    ) -> Result<(), BackendError> {
        let url = self.build_url(format!("rs/patronrequests/{}/performAction", id));
        let body = PerformActionBody {
            action,
            action_params: params,
        };
        self.send(self.client.post(url).json(&body)).await?;
        Ok(())
    }

    async fn fetch(&self, id: &RecordId) -> Result<RemoteRecord, BackendError> {
        let url = self.build_url(format!("rs/patronrequests/{}", id));
        self.get_json(self.client.get(url)).await
    }
}

#[async_trait]
impl SettingsSource for HttpBackend {
    async fn app_settings(&self, section: &str) -> Result<Vec<AppSetting>, BackendError> {
        let filter = format!("section=={}", section);
        let request = self
            .client
            .get(self.build_url("rs/settings/appSettings"))
            .query(&[("filters", filter.as_str()), ("perPage", SETTINGS_PAGE)]);
        self.get_json(request).await
    }
}

fn transport(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Transport(format!("Request timed out: {}", e))
    } else {
        BackendError::Transport(e.to_string())
    }
}

/// Add a missing scheme and drop trailing slashes.
fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}
