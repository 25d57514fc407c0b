//! Infrastructure layer - adapters for crypto, persistence and telemetry

pub mod api_key;
pub mod auth;
pub mod logging;
pub mod observability;
pub mod storage;
pub mod usage;
