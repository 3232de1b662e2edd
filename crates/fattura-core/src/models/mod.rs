//! Data models: flat records and configuration.

pub mod config;
pub mod record;
