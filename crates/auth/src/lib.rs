//! `sapitos-auth` — pure authentication boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it models
//! claims and validates tokens, nothing more. Session management lives in an
//! external identity service.

pub mod claims;
pub mod jwt;
pub mod roles;

pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use jwt::{Hs256JwtValidator, JwtError, JwtValidator};
pub use roles::Role;
