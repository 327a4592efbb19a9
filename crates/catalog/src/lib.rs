//! `sapitos-catalog` — reference data: articles and locations.
//!
//! Catalog entries are immutable reference data from the order flow's point
//! of view; they are created and maintained by catalog administration.

pub mod article;
pub mod location;

pub use article::Article;
pub use location::{Location, LocationKind};
