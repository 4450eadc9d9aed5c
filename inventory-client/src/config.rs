use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    #[serde(default)]
    pub api: ApiSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    /// Origin of the backend, without the `/api/v1` prefix.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Cookie holding the bearer token.
    #[serde(default = "default_token_cookie")]
    pub token_cookie: String,
    /// Per-request timeout. Requests wait indefinitely when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_token_cookie() -> String {
    "token".to_string()
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_cookie: default_token_cookie(),
            timeout_secs: None,
        }
    }
}

impl ApiSettings {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

impl InventoryConfig {
    /// Read `configuration.*` and `APP__*` variables, e.g.
    /// `APP__API__BASE_URL=https://inventory.example.com`.
    pub fn load() -> Result<Self, AppError> {
        core_config::load()
    }
}
