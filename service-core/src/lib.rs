//! service-core: Shared infrastructure for the inventory workspace.
pub mod config;
pub mod error;
pub mod observability;

pub use reqwest;
pub use serde;
pub use serde_json;
pub use tracing;
