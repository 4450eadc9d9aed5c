pub mod api;
pub mod config;
pub mod draft;
pub mod forms;
pub mod inventory;
pub mod models;
pub mod reports;
pub mod store;
pub mod submit;

pub use api::{ApiClient, ApiError, ApiResult, CrudApi};
pub use self::config::{ApiSettings, InventoryConfig};
pub use draft::{DraftError, DraftOrder, DraftParty, LineItem, NewLineItem, StockLedger};
pub use forms::{classify, FieldErrors, FormFeedback};
pub use inventory::{InventoryError, ProductApi};
pub use store::{EntityStore, LoadingKey, StoreAction};
pub use submit::{submit, FormTarget, SubmitError, Submitted};

use service_core::error::AppError;
use service_core::observability::init_tracing;

/// Load configuration, install tracing and build an [`ApiClient`]
/// authenticated from `cookie` when one is given.
///
/// Async because the OTLP batch exporter installed when `otlp_endpoint` is
/// set spawns onto the running Tokio runtime.
pub async fn bootstrap(cookie: Option<&str>) -> Result<(InventoryConfig, ApiClient), AppError> {
    let config = InventoryConfig::load()?;
    init_tracing(
        &config.common.service_name,
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    )?;

    let mut client = ApiClient::new(config.api.clone());
    if let Some(cookie) = cookie {
        client = client.with_session_cookie(cookie);
    }
    tracing::info!(
        base_url = %client.base_url(),
        authenticated = client.is_authenticated(),
        "Inventory client ready"
    );
    Ok((config, client))
}
