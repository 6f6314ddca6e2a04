//! Read-only access to the product catalog.
//!
//! The order service only ever resolves a product variant into the attributes
//! it snapshots onto an item. Product management lives elsewhere.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::{ProductId, VariantId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::order::{ItemSnapshot, Money};

/// Errors returned by a catalog lookup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// The product or the variant does not exist.
    #[error("Catalog entry not found: product {product_id}, variant {variant_id}")]
    NotFound {
        product_id: ProductId,
        variant_id: VariantId,
    },

    /// The catalog could not be reached.
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

/// A product variant as currently listed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub product_name: String,
    pub category: String,
    pub sku: String,
    pub variant_name: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    pub price: Money,
    #[serde(default)]
    pub time_to_craft: Duration,
}

impl CatalogEntry {
    /// Creates an entry with fresh ids.
    pub fn new(
        product_name: impl Into<String>,
        variant_name: impl Into<String>,
        category: impl Into<String>,
        price: Money,
    ) -> Self {
        let category = category.into();
        Self {
            product_id: ProductId::new(),
            variant_id: VariantId::new(),
            product_name: product_name.into(),
            sku: format!("{category}-001"),
            category,
            variant_name: variant_name.into(),
            options: BTreeMap::new(),
            price,
            time_to_craft: Duration::ZERO,
        }
    }

    /// Sets a variant option such as size or color.
    pub fn option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    /// Sets the estimated crafting time.
    pub fn time_to_craft(mut self, duration: Duration) -> Self {
        self.time_to_craft = duration;
        self
    }

    /// Copies the attributes an order item keeps.
    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            product_name: self.product_name.clone(),
            category: self.category.clone(),
            sku: self.sku.clone(),
            variant_name: self.variant_name.clone(),
            options: self.options.clone(),
            price: self.price,
            time_to_craft: self.time_to_craft,
        }
    }
}

/// Resolves product variants for order items.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Returns the current catalog entry for a product variant.
    async fn resolve(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
    ) -> Result<CatalogEntry, CatalogError>;
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    entries: HashMap<(ProductId, VariantId), CatalogEntry>,
    delay: Option<Duration>,
}

/// In-memory catalog for tests and local wiring.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    state: Arc<RwLock<InMemoryCatalogState>>,
    lookups: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an entry.
    pub async fn insert(&self, entry: CatalogEntry) {
        let mut state = self.state.write().await;
        state
            .entries
            .insert((entry.product_id, entry.variant_id), entry);
    }

    /// Edits a listed variant in place. Returns false if it is not listed.
    pub async fn update_variant<F>(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
        edit: F,
    ) -> bool
    where
        F: FnOnce(&mut CatalogEntry),
    {
        let mut state = self.state.write().await;
        match state.entries.get_mut(&(product_id, variant_id)) {
            Some(entry) => {
                edit(entry);
                true
            }
            None => false,
        }
    }

    /// Removes a variant from the catalog.
    pub async fn remove(&self, product_id: ProductId, variant_id: VariantId) {
        self.state
            .write()
            .await
            .entries
            .remove(&(product_id, variant_id));
    }

    /// Delays every lookup by `delay`.
    pub async fn set_delay(&self, delay: Option<Duration>) {
        self.state.write().await.delay = delay;
    }

    /// Makes every lookup fail with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns the number of lookups served so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogLookup for InMemoryCatalog {
    async fn resolve(
        &self,
        product_id: ProductId,
        variant_id: VariantId,
    ) -> Result<CatalogEntry, CatalogError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        let delay = self.state.read().await.delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CatalogError::Unavailable("catalog offline".to_string()));
        }

        self.state
            .read()
            .await
            .entries
            .get(&(product_id, variant_id))
            .cloned()
            .ok_or(CatalogError::NotFound {
                product_id,
                variant_id,
            })
    }
}
