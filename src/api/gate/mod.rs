//! API key gate
//!
//! Credential extraction, the usage-metered gate and its axum middleware.

mod credential;
mod layer;
mod usage_gate;

pub use credential::{
    extract_credential, CredentialSource, RequestMetadata, API_KEY_HEADER, API_KEY_QUERY_PARAM,
};
pub use layer::{api_key_gate, GatedKey};
pub use usage_gate::{GateError, GateRejection, GatedResponse, UsageGate};
