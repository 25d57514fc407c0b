//! API layer - HTTP endpoints and middleware

pub mod admin;
pub mod gate;
pub mod health;
pub mod keys;
pub mod middleware;
pub mod router;
pub mod state;
pub mod types;
pub mod v1;

pub use gate::{GatedKey, UsageGate};
pub use middleware::RequireAdmin;
pub use router::create_router;
pub use state::AppState;
