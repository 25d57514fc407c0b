//! Authentication infrastructure module
//!
//! JWT handling for the administrative surface.

mod jwt;

pub use jwt::{JwtClaims, JwtConfig, JwtService, ADMIN_ROLE};
