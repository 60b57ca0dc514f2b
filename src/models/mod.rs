//! Data models for versioned asset deploys.
//!
//! Everything here is built fresh per command; durable state lives only in
//! the remote bucket and the injected bundle config.

pub mod distribution;
pub mod listing;
pub mod manifest;
pub mod version;
