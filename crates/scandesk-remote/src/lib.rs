//! HTTP implementation of the scan engine's backend seams.
//!
//! Talks to the resource-sharing request service: record lookup by human id,
//! workflow transitions, record refresh and the app settings that drive the
//! action catalog.

pub mod client;

pub use client::HttpBackend;
