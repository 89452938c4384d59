//! Scan action engine for Scandesk.
//!
//! Turns a scanned human-readable request id into a workflow transition on
//! the remote request service. Each scan becomes an entry in the
//! [`ScanStore`] and runs its own pipeline (resolve, optional operator
//! prompt, transition, refresh) driven by the [`ScanController`].

pub mod backend;
pub mod catalog;
pub mod controller;
pub mod error;
pub mod executor;
pub mod prompt;
pub mod registry;
pub mod resolver;
pub mod store;
pub mod types;

#[cfg(test)]
mod testing;

pub use backend::{RequestBackend, SettingsSource};
pub use catalog::{actions_from_settings, ActionCatalog};
pub use controller::ScanController;
pub use error::{
    BackendError, CatalogError, ErrorDetail, ExecuteError, PipelineError, PromptError,
    ResolveError, StoreError,
};
pub use executor::ActionExecutor;
pub use prompt::PromptBroker;
pub use registry::{ActionRegistry, ActionSpec};
pub use resolver::RequestResolver;
pub use store::ScanStore;
pub use types::{EntryUpdate, ScanEntry};
