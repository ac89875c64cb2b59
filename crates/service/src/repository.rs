use async_trait::async_trait;

use crate::errors::ServiceError;
use crate::file::cart_store::Cart;
use crate::file::product_store::{Product, ProductFields};

/// Trait abstraction for product storage.
///
/// `Ok(None)` / `Ok(false)` mean not found; `Err` means the backing storage failed.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list(&self) -> Vec<Product>;
    async fn get(&self, id: u64) -> Result<Option<Product>, ServiceError>;
    async fn add(&self, fields: ProductFields) -> Result<Product, ServiceError>;
    async fn add_unique_title(&self, fields: ProductFields) -> Result<Product, ServiceError>;
    async fn update(&self, id: u64, fields: ProductFields) -> Result<Option<Product>, ServiceError>;
    async fn delete(&self, id: u64) -> Result<bool, ServiceError>;
}

/// Trait abstraction for cart storage.
#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn list(&self) -> Vec<Cart>;
    async fn get(&self, cart_id: u64) -> Result<Option<Cart>, ServiceError>;
    async fn create(&self) -> Result<Cart, ServiceError>;
    async fn add_item(&self, cart_id: u64, product_id: u64, quantity: u64) -> Result<(), ServiceError>;
}
