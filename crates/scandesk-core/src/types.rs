use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Enums
// =============================================================================

/// Lifecycle status of a scan entry.
///
/// Every entry starts `Pending` and moves exactly once to `Success` or `Fail`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Pending,
    Success,
    Fail,
}

impl ScanStatus {
    /// Whether the status is final.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ScanStatus::Pending)
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanStatus::Pending => write!(f, "pending"),
            ScanStatus::Success => write!(f, "success"),
            ScanStatus::Fail => write!(f, "fail"),
        }
    }
}

impl std::str::FromStr for ScanStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ScanStatus::Pending),
            "success" => Ok(ScanStatus::Success),
            "fail" => Ok(ScanStatus::Fail),
            _ => Err(format!("Unknown scan status: {}", s)),
        }
    }
}

/// What kind of extra value a prompt asks the operator for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    /// Barcode of the physical item being checked in.
    ItemBarcode,
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptKind::ItemBarcode => write!(f, "item_barcode"),
        }
    }
}

/// Classification of a failed scan, stored alongside the message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No record matched the human identifier.
    NotFound,
    /// More than one record matched the human identifier.
    Ambiguous,
    /// The record does not currently permit the requested action.
    InvalidForState,
    /// The operator dismissed the prompt.
    Dismissed,
    /// Another prompt was already open.
    Busy,
    /// A remote call failed.
    RemoteFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "not_found"),
            ErrorKind::Ambiguous => write!(f, "ambiguous"),
            ErrorKind::InvalidForState => write!(f, "invalid_for_state"),
            ErrorKind::Dismissed => write!(f, "dismissed"),
            ErrorKind::Busy => write!(f, "busy"),
            ErrorKind::RemoteFailure => write!(f, "remote_failure"),
        }
    }
}

// =============================================================================
// Newtype Wrappers - Identity
// =============================================================================

/// Identifier of a scan entry, allocated from a monotonic counter.
///
/// Higher ids were created later, so ordering by id is ordering by recency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanId(pub u64);

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ScanId {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .trim_start_matches('#')
            .parse::<u64>()
            .map(ScanId)
            .map_err(|_| format!("Invalid scan id: {}", s))
    }
}

/// Operator-entered human identifier (HRID). Surrounding whitespace is
/// stripped on creation, since scanners often append a newline or tab.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct HumanId(String);

impl HumanId {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self(raw.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for HumanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HumanId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for HumanId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Name of a state transition, e.g. `supplierMarkShipped`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(String);

impl ActionId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ActionId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Canonical id of a remote request record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// =============================================================================
// Newtype Wrappers - Temporal
// =============================================================================

/// Unix timestamp in seconds since epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0, 0).unwrap_or_default()
    }
}

// =============================================================================
// Remote wire shapes
// =============================================================================

/// Current state of a remote record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordState {
    pub code: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A resource-sharing request as returned by the backend (full record form).
///
/// Only the fields the console reads are typed; everything else is kept in
/// `extra` so a refreshed record can be passed on without loss.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRecord {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hrid: Option<String>,
    #[serde(default)]
    pub valid_actions: Vec<ActionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<RecordState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requesting_institution_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplying_institution_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_requester: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RemoteRecord {
    /// Bare record with only an id. Mostly useful for tests and fixtures.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: RecordId(id.into()),
            hrid: None,
            valid_actions: Vec::new(),
            state: None,
            title: None,
            requesting_institution_symbol: None,
            supplying_institution_symbol: None,
            is_requester: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_hrid(mut self, hrid: impl Into<String>) -> Self {
        self.hrid = Some(hrid.into());
        self
    }

    pub fn with_valid_actions<I, A>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<ActionId>,
    {
        self.valid_actions = actions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_state(mut self, code: impl Into<String>) -> Self {
        self.state = Some(RecordState {
            code: code.into(),
            extra: serde_json::Map::new(),
        });
        self
    }

    /// Whether the record currently advertises `action` as valid.
    pub fn allows(&self, action: &ActionId) -> bool {
        self.valid_actions.iter().any(|a| a == action)
    }

    pub fn state_code(&self) -> Option<&str> {
        self.state.as_ref().map(|s| s.code.as_str())
    }
}

/// Parameters sent with a transition as `actionParams`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionParams(pub serde_json::Value);

impl ActionParams {
    /// The empty object, sent by actions that take no extra input.
    pub fn empty() -> Self {
        Self(serde_json::Value::Object(serde_json::Map::new()))
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }
}

impl Default for ActionParams {
    fn default() -> Self {
        Self::empty()
    }
}

/// One key/value toggle from the remote app settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSetting {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl AppSetting {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// Settings toggles are stored as `"yes"` / `"no"` strings.
    pub fn is_enabled(&self) -> bool {
        self.value.as_deref() == Some("yes")
    }
}

// =============================================================================
// Tests
// =============================================================================
