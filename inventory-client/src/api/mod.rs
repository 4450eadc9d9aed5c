//! REST access to `/api/v1/{resource}`.

pub mod auth;
pub mod client;
pub mod error;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use auth::token_from_cookie;
pub use client::ApiClient;
pub use error::{ApiError, ApiResult, ErrorBody, FieldMessage};

/// Anything the client caches and matches by server id.
pub trait Entity: Clone + Send + Sync + 'static {
    fn id(&self) -> Option<&str>;
}

/// An entity served under `/api/v1/{PATH}`.
pub trait Resource: Entity + Serialize + DeserializeOwned {
    const PATH: &'static str;
}

/// The five uniform operations every resource supports.
#[async_trait]
pub trait CrudApi<T: Resource>: Send + Sync {
    async fn list(&self) -> ApiResult<Vec<T>>;
    async fn get(&self, id: &str) -> ApiResult<T>;
    async fn create(&self, item: &T) -> ApiResult<T>;
    async fn update(&self, id: &str, item: &T) -> ApiResult<T>;
    async fn delete(&self, id: &str) -> ApiResult<()>;
}
