//! Seams to the downstream catalog and marketplace credentials.

use std::{collections::HashMap, sync::RwLock};

use async_trait::async_trait;

use crate::{
    foundation::core::{ListingId, ProductId},
    foundation::error::{MockupError, MockupResult},
};

/// Marketplace listing a product is published as.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LinkedListing {
    pub listing_id: ListingId,
    pub published: bool,
}

/// Resolves products to their marketplace listing.
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn listing_for(&self, product_id: ProductId) -> MockupResult<Option<LinkedListing>>;
}

/// Supplies a marketplace access token. Refresh is the implementor's concern.
#[async_trait]
pub trait MarketplaceAuth: Send + Sync {
    async fn access_token(&self) -> MockupResult<String>;
}

/// Fixed token, e.g. from the environment.
#[derive(Clone, Debug)]
pub struct StaticToken(pub String);

#[async_trait]
impl MarketplaceAuth for StaticToken {
    async fn access_token(&self) -> MockupResult<String> {
        if self.0.is_empty() {
            return Err(MockupError::external("no marketplace token configured"));
        }
        Ok(self.0.clone())
    }
}

/// In-process catalog keyed by product id.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    listings: RwLock<HashMap<ProductId, LinkedListing>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn link(&self, product_id: ProductId, listing: LinkedListing) {
        if let Ok(mut listings) = self.listings.write() {
            listings.insert(product_id, listing);
        }
    }
}

#[async_trait]
impl CatalogService for InMemoryCatalog {
    async fn listing_for(&self, product_id: ProductId) -> MockupResult<Option<LinkedListing>> {
        let listings = self
            .listings
            .read()
            .map_err(|_| MockupError::external("catalog lock poisoned"))?;
        Ok(listings.get(&product_id).cloned())
    }
}
