//! `sapitos-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod org;

pub use error::{DomainError, DomainResult};
pub use id::{ArticleId, InventoryId, LocationId, OrderId, UserId};
pub use org::Organization;
