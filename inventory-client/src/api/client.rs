use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::{Client, Method, Response, Url};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::Serialize;
use service_core::observability::TracedClientExt;

use super::auth::token_from_cookie;
use super::error::{ApiError, ApiResult};
use super::{CrudApi, Resource};
use crate::config::ApiSettings;

/// HTTP client for the inventory backend.
///
/// Every call resolves to `Ok(payload)` or `Err(ApiError)`; nothing is
/// retried automatically.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    settings: ApiSettings,
    token: Option<Secret<String>>,
}

impl ApiClient {
    pub fn new(settings: ApiSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
            token: None,
        }
    }

    pub fn with_token(mut self, token: Secret<String>) -> Self {
        self.token = Some(token);
        self
    }

    /// Authenticate with the token stored in the session cookie named by
    /// `ApiSettings::token_cookie`. Leaves the client anonymous when absent.
    pub fn with_session_cookie(mut self, cookie: &str) -> Self {
        self.token = token_from_cookie(cookie, &self.settings.token_cookie);
        if self.token.is_none() {
            tracing::debug!(cookie_name = %self.settings.token_cookie, "No session token in cookie");
        }
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.settings.base_url
    }

    /// `{base_url}/api/v1/{segments..}`. Each segment is percent-encoded, so
    /// an id containing `/`, `?` or `#` stays a single segment.
    fn url(&self, segments: &[&str]) -> ApiResult<Url> {
        let invalid = || ApiError::InvalidUrl(self.settings.base_url.clone());
        let mut url = Url::parse(&self.settings.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(["api", "v1"])
            .extend(segments);
        Ok(url)
    }

    async fn execute<B>(
        &self,
        method: Method,
        resource: &'static str,
        segments: &[&str],
        body: Option<&B>,
    ) -> ApiResult<Response>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = self.url(segments)?;
        let mut request = self.client.traced(method.clone(), url.as_str());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(secs) = self.settings.timeout_secs {
            request = request.timeout(Duration::from_secs(secs));
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let request_id = request.request_id().to_string();

        let start = Instant::now();
        let result = request.send().await;
        let elapsed = start.elapsed();

        let outcome = match &result {
            Ok(response) => response.status().as_u16().to_string(),
            Err(_) => "transport_error".to_string(),
        };
        let labels = [
            ("resource", resource.to_string()),
            ("method", method.to_string()),
            ("outcome", outcome),
        ];
        counter!("inventory_api_requests_total", &labels).increment(1);
        histogram!("inventory_api_request_duration_seconds", &labels)
            .record(elapsed.as_secs_f64());

        match result {
            Ok(response) if response.status().is_success() => Ok(response),
            Ok(response) => {
                let error = ApiError::from_response(response).await;
                tracing::warn!(%method, %url, %request_id, error = %error, "API request rejected");
                Err(error)
            }
            Err(e) => {
                tracing::error!(%method, %url, %request_id, "API request failed: {}", e);
                Err(ApiError::Transport(e.to_string()))
            }
        }
    }

    async fn decode<R: DeserializeOwned>(response: Response) -> ApiResult<R> {
        response
            .json::<R>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `POST /api/v1/{resource}/:id/{sub}`
    pub async fn post_nested<B, R>(
        &self,
        resource: &'static str,
        id: &str,
        sub: &str,
        body: &B,
    ) -> ApiResult<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .execute(Method::POST, resource, &[resource, id, sub], Some(body))
            .await?;
        Self::decode(response).await
    }
}

#[async_trait]
impl<T: Resource> CrudApi<T> for ApiClient {
    #[tracing::instrument(skip(self), fields(resource = T::PATH))]
    async fn list(&self) -> ApiResult<Vec<T>> {
        let response = self
            .execute::<()>(Method::GET, T::PATH, &[T::PATH], None)
            .await?;
        Self::decode(response).await
    }

    #[tracing::instrument(skip(self), fields(resource = T::PATH))]
    async fn get(&self, id: &str) -> ApiResult<T> {
        let response = self
            .execute::<()>(Method::GET, T::PATH, &[T::PATH, id], None)
            .await?;
        Self::decode(response).await
    }

    #[tracing::instrument(skip(self, item), fields(resource = T::PATH))]
    async fn create(&self, item: &T) -> ApiResult<T> {
        let response = self
            .execute(Method::POST, T::PATH, &[T::PATH], Some(item))
            .await?;
        Self::decode(response).await
    }

    #[tracing::instrument(skip(self, item), fields(resource = T::PATH))]
    async fn update(&self, id: &str, item: &T) -> ApiResult<T> {
        let response = self
            .execute(Method::PUT, T::PATH, &[T::PATH, id], Some(item))
            .await?;
        Self::decode(response).await
    }

    #[tracing::instrument(skip(self), fields(resource = T::PATH))]
    async fn delete(&self, id: &str) -> ApiResult<()> {
        self.execute::<()>(Method::DELETE, T::PATH, &[T::PATH, id], None)
            .await?;
        Ok(())
    }
}
