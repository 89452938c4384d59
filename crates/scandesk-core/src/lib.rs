pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::ScandeskConfig;
pub use error::{Result, ScandeskError};
pub use events::ScanEvent;
pub use types::*;
