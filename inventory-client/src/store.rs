//! Cached per-entity state.
//!
//! State only changes through [`EntityStore::reduce`]. The async helpers call
//! the API and dispatch whatever the server answered, so the most recent
//! response always wins.

use std::collections::BTreeSet;

use crate::api::{ApiResult, CrudApi, Entity, Resource};
use crate::draft::StockLedger;
use crate::models::Product;

/// Identifies an in-flight request.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum LoadingKey {
    List,
    Item(String),
    Create,
    Update(String),
    Delete(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreAction<T> {
    Begin(LoadingKey),
    Settle(LoadingKey),
    Listed(Vec<T>),
    Fetched(T),
    Created(T),
    Updated(T),
    Deleted(String),
    Select(Option<T>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityStore<T> {
    items: Option<Vec<T>>,
    selected: Option<T>,
    loading: BTreeSet<LoadingKey>,
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self {
            items: None,
            selected: None,
            loading: BTreeSet::new(),
        }
    }
}

impl<T: Entity> EntityStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` until the list has been fetched once.
    pub fn items(&self) -> Option<&[T]> {
        self.items.as_deref()
    }

    pub fn selected(&self) -> Option<&T> {
        self.selected.as_ref()
    }

    pub fn is_loading(&self, key: &LoadingKey) -> bool {
        self.loading.contains(key)
    }

    pub fn is_busy(&self) -> bool {
        !self.loading.is_empty()
    }

    /// Look up a cached entity in the list, falling back to the selection.
    pub fn find(&self, id: &str) -> Option<&T> {
        self.items
            .iter()
            .flatten()
            .chain(self.selected.iter())
            .find(|item| item.id() == Some(id))
    }

    pub fn reduce(&mut self, action: StoreAction<T>) {
        match action {
            StoreAction::Begin(key) => {
                self.loading.insert(key);
            }
            StoreAction::Settle(key) => {
                self.loading.remove(&key);
            }
            StoreAction::Listed(items) => self.items = Some(items),
            StoreAction::Fetched(item) => {
                self.replace(&item);
                self.selected = Some(item);
            }
            StoreAction::Created(item) => {
                // An unfetched list stays unfetched; the next list call brings
                // the new record along.
                if let Some(items) = self.items.as_mut() {
                    items.push(item);
                }
            }
            StoreAction::Updated(item) => {
                self.replace(&item);
                let same = self
                    .selected
                    .as_ref()
                    .is_some_and(|selected| selected.id().is_some() && selected.id() == item.id());
                if same {
                    self.selected = Some(item);
                }
            }
            StoreAction::Deleted(id) => {
                if let Some(items) = self.items.as_mut() {
                    items.retain(|item| item.id() != Some(id.as_str()));
                }
                if self
                    .selected
                    .as_ref()
                    .is_some_and(|selected| selected.id() == Some(id.as_str()))
                {
                    self.selected = None;
                }
            }
            StoreAction::Select(item) => self.selected = item,
        }
    }

    fn replace(&mut self, item: &T) {
        let Some(id) = item.id() else { return };
        if let Some(items) = self.items.as_mut() {
            for existing in items.iter_mut().filter(|existing| existing.id() == Some(id)) {
                *existing = item.clone();
            }
        }
    }
}

impl<T: Resource> EntityStore<T> {
    /// Failed calls leave the list as it was.
    #[tracing::instrument(skip_all, fields(resource = T::PATH))]
    pub async fn fetch_all(&mut self, api: &impl CrudApi<T>) -> ApiResult<()> {
        self.reduce(StoreAction::Begin(LoadingKey::List));
        let result = api.list().await;
        self.reduce(StoreAction::Settle(LoadingKey::List));

        let items = result?;
        tracing::debug!(count = items.len(), "List refreshed");
        self.reduce(StoreAction::Listed(items));
        Ok(())
    }

    #[tracing::instrument(skip(self, api), fields(resource = T::PATH))]
    pub async fn fetch_one(&mut self, api: &impl CrudApi<T>, id: &str) -> ApiResult<T> {
        let key = LoadingKey::Item(id.to_string());
        self.reduce(StoreAction::Begin(key.clone()));
        let result = api.get(id).await;
        self.reduce(StoreAction::Settle(key));

        let item = result?;
        self.reduce(StoreAction::Fetched(item.clone()));
        Ok(item)
    }

    #[tracing::instrument(skip_all, fields(resource = T::PATH))]
    pub async fn create(&mut self, api: &impl CrudApi<T>, item: &T) -> ApiResult<T> {
        self.reduce(StoreAction::Begin(LoadingKey::Create));
        let result = api.create(item).await;
        self.reduce(StoreAction::Settle(LoadingKey::Create));

        let created = result?;
        self.reduce(StoreAction::Created(created.clone()));
        Ok(created)
    }

    #[tracing::instrument(skip(self, api, item), fields(resource = T::PATH))]
    pub async fn update(&mut self, api: &impl CrudApi<T>, id: &str, item: &T) -> ApiResult<T> {
        let key = LoadingKey::Update(id.to_string());
        self.reduce(StoreAction::Begin(key.clone()));
        let result = api.update(id, item).await;
        self.reduce(StoreAction::Settle(key));

        let updated = result?;
        self.reduce(StoreAction::Updated(updated.clone()));
        Ok(updated)
    }

    #[tracing::instrument(skip(self, api), fields(resource = T::PATH))]
    pub async fn remove(&mut self, api: &impl CrudApi<T>, id: &str) -> ApiResult<()> {
        let key = LoadingKey::Delete(id.to_string());
        self.reduce(StoreAction::Begin(key.clone()));
        let result = api.delete(id).await;
        self.reduce(StoreAction::Settle(key));

        result?;
        self.reduce(StoreAction::Deleted(id.to_string()));
        Ok(())
    }
}

impl StockLedger for EntityStore<Product> {
    fn adjust(
        &mut self,
        product: &str,
        warehouse: Option<&str>,
        variant: Option<&str>,
        delta: i64,
    ) -> bool {
        let Some(mut cached) = self.find(product).cloned() else {
            tracing::debug!(product, "Product not cached, stock left untouched");
            return false;
        };
        cached.adjust_stock(warehouse, variant, delta);
        self.reduce(StoreAction::Updated(cached));
        true
    }
}
