//! Product sub-resources: variants and stock transfers between warehouses.

use async_trait::async_trait;
use thiserror::Error;
use validator::Validate;

use crate::api::{ApiClient, ApiError, ApiResult, CrudApi, Resource};
use crate::forms::{classify, FieldErrors, FormFeedback};
use crate::models::{NewVariant, Product, StockTransfer, Variant};
use crate::store::{EntityStore, StoreAction};

/// Product endpoints beyond the uniform CRUD set.
#[async_trait]
pub trait ProductApi: CrudApi<Product> {
    /// `POST /api/v1/products/:id/variants`
    async fn add_variant(&self, product_id: &str, variant: &NewVariant) -> ApiResult<Variant>;

    /// `POST /api/v1/products/:id/transfers`, answered with the updated product.
    async fn transfer_stock(&self, product_id: &str, transfer: &StockTransfer)
        -> ApiResult<Product>;
}

#[async_trait]
impl ProductApi for ApiClient {
    #[tracing::instrument(skip(self, variant))]
    async fn add_variant(&self, product_id: &str, variant: &NewVariant) -> ApiResult<Variant> {
        self.post_nested(Product::PATH, product_id, "variants", variant)
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn transfer_stock(
        &self,
        product_id: &str,
        transfer: &StockTransfer,
    ) -> ApiResult<Product> {
        self.post_nested(Product::PATH, product_id, "transfers", transfer)
            .await
    }
}

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Invalid request")]
    Invalid(FieldErrors),

    #[error("Only {available} in stock, {requested} requested")]
    InsufficientStock { available: i64, requested: i64 },

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl InventoryError {
    pub fn feedback(&self) -> FormFeedback {
        match self {
            InventoryError::Invalid(fields) => FormFeedback::Fields(fields.clone()),
            InventoryError::InsufficientStock { .. } => {
                let mut fields = FieldErrors::new();
                fields.insert("quantity", self.to_string());
                FormFeedback::Fields(fields)
            }
            InventoryError::Api(error) => classify(error, "name"),
        }
    }
}

fn check(request: &impl Validate) -> Result<(), InventoryError> {
    request
        .validate()
        .map_err(|e| InventoryError::Invalid(FieldErrors::from(&e)))
}

/// Move stock between two warehouses and cache the product the server
/// returns. When the product is cached, a transfer larger than the source
/// bucket is refused without a request.
#[tracing::instrument(skip(api, products))]
pub async fn transfer_stock(
    api: &impl ProductApi,
    products: &mut EntityStore<Product>,
    product_id: &str,
    transfer: &StockTransfer,
) -> Result<Product, InventoryError> {
    check(transfer)?;

    if let Some(cached) = products.find(product_id) {
        let available = cached.stock_at(Some(&transfer.from), transfer.variant.as_deref());
        if available < transfer.quantity {
            return Err(InventoryError::InsufficientStock {
                available,
                requested: transfer.quantity,
            });
        }
    }

    let updated = api.transfer_stock(product_id, transfer).await?;
    products.reduce(StoreAction::Updated(updated.clone()));
    tracing::info!(product_id, quantity = transfer.quantity, "Stock transferred");
    Ok(updated)
}

/// Create a variant under `product_id` and add it to the cached variants.
#[tracing::instrument(skip(api, variants))]
pub async fn add_variant(
    api: &impl ProductApi,
    variants: &mut EntityStore<Variant>,
    product_id: &str,
    variant: &NewVariant,
) -> Result<Variant, InventoryError> {
    check(variant)?;

    let created = api.add_variant(product_id, variant).await?;
    variants.reduce(StoreAction::Created(created.clone()));
    Ok(created)
}
