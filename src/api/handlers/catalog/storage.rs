//! Catalog persistence.
//!
//! Handlers only see `CatalogStore`; the in-memory implementation keeps rows
//! in `BTreeMap`s keyed by v7 UUIDs, so iteration order is insertion order.

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::error;
use uuid::Uuid;

use super::{
    super::auth::{session::VALIDATION_ERROR_CODE, ErrorBody},
    types::{Banner, Product},
};

#[derive(Debug)]
pub enum CatalogError {
    BadRequest(&'static str),
    NotFound,
    Conflict(&'static str),
    Storage(anyhow::Error),
}

impl From<anyhow::Error> for CatalogError {
    fn from(err: anyhow::Error) -> Self {
        Self::Storage(err)
    }
}

impl IntoResponse for CatalogError {
    /// Storage failures are logged and surfaced as a bare `500`.
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody::new(message, VALIDATION_ERROR_CODE)),
            )
                .into_response(),
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                Json(ErrorBody::new("Not found", "NOT_FOUND")),
            )
                .into_response(),
            Self::Conflict(message) => (
                StatusCode::CONFLICT,
                Json(ErrorBody::new(message, "CONFLICT")),
            )
                .into_response(),
            Self::Storage(err) => {
                error!("Catalog storage error: {err:#}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>>;
    async fn get_product(&self, id: Uuid) -> Result<Option<Product>>;
    /// Insert or replace by id.
    async fn save_product(&self, product: Product) -> Result<()>;
    async fn delete_product(&self, id: Uuid) -> Result<bool>;

    /// Banners ordered by `position`.
    async fn list_banners(&self) -> Result<Vec<Banner>>;
    async fn get_banner(&self, id: Uuid) -> Result<Option<Banner>>;
    async fn save_banner(&self, banner: Banner) -> Result<()>;
    async fn delete_banner(&self, id: Uuid) -> Result<bool>;
}

#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    products: RwLock<BTreeMap<Uuid, Product>>,
    banners: RwLock<BTreeMap<Uuid, Banner>>,
}

impl MemoryCatalogStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn list_products(&self) -> Result<Vec<Product>> {
        Ok(self.products.read().await.values().cloned().collect())
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn save_product(&self, product: Product) -> Result<()> {
        self.products.write().await.insert(product.id, product);
        Ok(())
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool> {
        Ok(self.products.write().await.remove(&id).is_some())
    }

    async fn list_banners(&self) -> Result<Vec<Banner>> {
        let mut banners: Vec<Banner> = self.banners.read().await.values().cloned().collect();
        // Stable sort keeps insertion order between equal positions.
        banners.sort_by_key(|banner| banner.position);
        Ok(banners)
    }

    async fn get_banner(&self, id: Uuid) -> Result<Option<Banner>> {
        Ok(self.banners.read().await.get(&id).cloned())
    }

    async fn save_banner(&self, banner: Banner) -> Result<()> {
        self.banners.write().await.insert(banner.id, banner);
        Ok(())
    }

    async fn delete_banner(&self, id: Uuid) -> Result<bool> {
        Ok(self.banners.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn banner(title: &str, position: i32) -> Banner {
        Banner {
            id: Uuid::now_v7(),
            title: title.to_string(),
            subtitle: None,
            link_url: None,
            image_url: None,
            position,
            active: true,
        }
    }

    #[tokio::test]
    async fn banners_list_by_position() -> Result<()> {
        let store = MemoryCatalogStore::new();
        store.save_banner(banner("third", 3)).await?;
        store.save_banner(banner("first", 1)).await?;
        store.save_banner(banner("second", 2)).await?;

        let titles: Vec<String> = store
            .list_banners()
            .await?
            .into_iter()
            .map(|banner| banner.title)
            .collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
        Ok(())
    }

    #[tokio::test]
    async fn products_save_replace_and_delete() -> Result<()> {
        let store = MemoryCatalogStore::new();
        let product = Product {
            id: Uuid::now_v7(),
            name: "Shoe".to_string(),
            slug: "shoe".to_string(),
            description: String::new(),
            price_cents: None,
            image_url: None,
            published: true,
        };
        let id = product.id;
        store.save_product(product.clone()).await?;
        store
            .save_product(Product {
                published: false,
                ..product
            })
            .await?;

        let stored = store.get_product(id).await?;
        assert_eq!(stored.map(|product| product.published), Some(false));
        assert_eq!(store.list_products().await?.len(), 1);
        assert!(store.delete_product(id).await?);
        assert!(!store.delete_product(id).await?);
        Ok(())
    }
}
